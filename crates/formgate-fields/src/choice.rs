//! Pool-based fields: select, radio and checkboxes
//!
//! All three offer a fixed pool of values. Submitted values outside the pool
//! are rejected; the pool itself, the null sentinel and the defaults are
//! checked once at setup time.

use crate::normalizer::scalar;
use crate::{email, Checked, FieldValidator, SetupContext, ValidationContext};
use formgate_core::{
    CheckboxOptions, EmailTarget, FieldProblem, FieldSpec, FieldValue, ProblemKind, RadioOptions,
    RawComponents, RawPool, RawValue, Representation, Representations, Required, SelectOptions,
    SetupErrorKind, SetupReport, ValuePool,
};

/// Map values that leave a checkbox unchecked
const UNCHECKED: [&str; 4] = ["", "0", "false", "off"];

fn resolve(values: &Option<RawPool>, force_associative: bool) -> ValuePool {
    values
        .as_ref()
        .map(|raw| raw.resolve(force_associative))
        .unwrap_or(ValuePool {
            entries: Vec::new(),
            associative: false,
        })
}

/// Checks shared by every pool-based type.
fn pool_checks<'d>(
    spec: &FieldSpec,
    values: &Option<RawPool>,
    pool: &ValuePool,
    null_option: Option<&str>,
    defaults: impl Iterator<Item = &'d String>,
    report: &mut SetupReport,
) {
    if values.is_none() {
        report.add(
            SetupErrorKind::MissingRequiredArgument,
            format!("field '{}' ({}) needs a 'values' pool", spec.name, spec.field_type()),
        );
        return;
    }
    if pool.is_empty() {
        report.add(
            SetupErrorKind::EmptyValuePool,
            format!("field '{}' offers no values", spec.name),
        );
    }
    if let Some(sentinel) = null_option {
        if pool.contains(sentinel) {
            report.add(
                SetupErrorKind::SentinelCollision,
                format!(
                    "field '{}': null option '{}' is also an offered value",
                    spec.name, sentinel
                ),
            );
        } else if pool.entries.iter().any(|e| e.label == sentinel) {
            report.add(
                SetupErrorKind::SentinelCollision,
                format!(
                    "field '{}': null option '{}' is also the label of an offered value",
                    spec.name, sentinel
                ),
            );
        }
    }
    for default in defaults {
        if !pool.contains(default) {
            report.add(
                SetupErrorKind::DefaultNotInPool,
                format!(
                    "field '{}': default '{}' is not one of the offered values",
                    spec.name, default
                ),
            );
        }
    }
}

fn required_count_check(spec: &FieldSpec, report: &mut SetupReport) {
    if let Required::Invalid(given) = &spec.required {
        report.add(
            SetupErrorKind::ThresholdMismatch,
            format!(
                "field '{}': required must be true, false or a whole number ({} given)",
                spec.name, given
            ),
        );
    }
}

/// Email suitability of a pool: explicit suffix, or every value an address.
fn pool_email_target(pool: &ValuePool, suffix: Option<&str>) -> EmailTarget {
    if suffix.is_some() {
        EmailTarget::Suffix
    } else if !pool.is_empty() && pool.values().all(email::is_valid) {
        EmailTarget::Yes
    } else {
        EmailTarget::No
    }
}

fn not_in_pool(spec: &FieldSpec, value: &str) -> FieldProblem {
    FieldProblem::new(
        ProblemKind::ValueNotInPool,
        format!("{}: '{}' is not one of the offered values.", spec.display_title(), value),
    )
}

/// Flags over the whole pool, the joined values and the joined labels.
fn derive(pool: &ValuePool, selected: &[String]) -> Representations {
    let flags = pool
        .values()
        .map(|v| (v.to_string(), selected.iter().any(|s| s == v)))
        .collect();
    let compiled = selected.join(",");
    let presented = selected
        .iter()
        .map(|v| pool.label_of(v))
        .collect::<Vec<_>>()
        .join(", ");

    Representations {
        rawcomponents: Some(RawComponents::Flags(flags)),
        compiled: Some(compiled),
        presented: Some(presented),
    }
}

fn submitted_list(raw: Option<&RawValue>) -> Vec<String> {
    match raw {
        Some(RawValue::Text(s)) => vec![s.clone()],
        Some(RawValue::List(items)) => items.clone(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Select
// ============================================================================

pub struct SelectField<'a>(pub &'a SelectOptions);

impl SelectField<'_> {
    fn pool(&self) -> ValuePool {
        resolve(&self.0.values, self.0.force_associative)
    }
}

impl FieldValidator for SelectField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Selection(self.0.default.clone())
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        let pool = self.pool();
        pool_checks(
            spec,
            &self.0.values,
            &pool,
            self.0.null_option.as_deref(),
            self.0.default.iter(),
            report,
        );
        required_count_check(spec, report);

        let minimum = spec.required.minimum() as usize;
        if minimum > 1 && !self.0.multiple {
            report.add(
                SetupErrorKind::ThresholdMismatch,
                format!(
                    "field '{}' requires {} selections but allows only one",
                    spec.name, minimum
                ),
            );
        } else if self.0.values.is_some() && minimum > pool.len() {
            report.add(
                SetupErrorKind::ThresholdMismatch,
                format!(
                    "field '{}' requires {} selections but offers {} values",
                    spec.name,
                    minimum,
                    pool.len()
                ),
            );
        }
        if !self.0.multiple && self.0.default.len() > 1 {
            report.add(
                SetupErrorKind::ThresholdMismatch,
                format!("field '{}' has several defaults but allows one selection", spec.name),
            );
        }
    }

    fn produces(&self, _representation: Representation) -> bool {
        true
    }

    fn email_target(&self) -> EmailTarget {
        if self.0.multiple {
            return EmailTarget::No;
        }
        pool_email_target(&self.pool(), self.0.email_suffix.as_deref())
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, _ctx: &ValidationContext<'_>) -> Checked {
        let pool = self.pool();
        let null_option = self.0.null_option.as_deref();

        let mut submitted: Vec<String> = Vec::new();
        for value in submitted_list(raw) {
            let value = value.trim().to_string();
            if value.is_empty() || Some(value.as_str()) == null_option || submitted.contains(&value) {
                continue;
            }
            submitted.push(value);
        }

        let mut problems = Vec::new();
        let mut selected = Vec::new();
        for value in submitted {
            if pool.contains(&value) {
                selected.push(value);
            } else {
                problems.push(not_in_pool(spec, &value));
            }
        }

        let minimum = spec.required.minimum() as usize;
        if !self.0.multiple && selected.len() > 1 {
            problems.push(FieldProblem::new(
                ProblemKind::TooManySelections,
                format!("{}: please choose only one value.", spec.display_title()),
            ));
        } else if !selected.is_empty() && selected.len() < minimum {
            problems.push(FieldProblem::new(
                ProblemKind::InsufficientSelections,
                format!(
                    "{}: please choose at least {} values.",
                    spec.display_title(),
                    minimum
                ),
            ));
        }

        Checked {
            sticky: FieldValue::Selection(selected.clone()),
            normalized: FieldValue::Selection(selected.clone()),
            empty: selected.is_empty(),
            representations: derive(&pool, &selected),
            problems,
        }
    }
}

// ============================================================================
// Radio
// ============================================================================

pub struct RadioField<'a>(pub &'a RadioOptions);

impl RadioField<'_> {
    fn pool(&self) -> ValuePool {
        resolve(&self.0.values, self.0.force_associative)
    }
}

impl FieldValidator for RadioField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Text(self.0.default.clone().unwrap_or_default())
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        let pool = self.pool();
        pool_checks(
            spec,
            &self.0.values,
            &pool,
            self.0.null_option.as_deref(),
            self.0.default.iter(),
            report,
        );
    }

    fn produces(&self, representation: Representation) -> bool {
        representation != Representation::RawComponents
    }

    fn email_target(&self) -> EmailTarget {
        pool_email_target(&self.pool(), self.0.email_suffix.as_deref())
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let pool = self.pool();
        let mut value = scalar(raw, ctx.settings);
        if Some(value.as_str()) == self.0.null_option.as_deref() {
            value.clear();
        }

        let mut problems = Vec::new();
        if !value.is_empty() && !pool.contains(&value) {
            problems.push(not_in_pool(spec, &value));
            value.clear();
        }

        let presented = pool.label_of(&value).to_string();
        Checked {
            sticky: FieldValue::Text(value.clone()),
            normalized: FieldValue::Text(value.clone()),
            empty: value.is_empty(),
            representations: Representations {
                rawcomponents: None,
                compiled: Some(value),
                presented: Some(presented),
            },
            problems,
        }
    }
}

// ============================================================================
// Checkboxes
// ============================================================================

pub struct CheckboxField<'a>(pub &'a CheckboxOptions);

impl CheckboxField<'_> {
    fn pool(&self) -> ValuePool {
        resolve(&self.0.values, self.0.force_associative)
    }
}

impl FieldValidator for CheckboxField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Selection(self.0.default.clone())
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        let pool = self.pool();
        pool_checks(spec, &self.0.values, &pool, None, self.0.default.iter(), report);
        required_count_check(spec, report);

        let minimum = spec.required.minimum();
        if self.0.values.is_some() && minimum as usize > pool.len() {
            report.add(
                SetupErrorKind::ThresholdMismatch,
                format!(
                    "field '{}' requires {} checked boxes but offers {}",
                    spec.name,
                    minimum,
                    pool.len()
                ),
            );
        }
        if let Some(max) = self.0.max {
            if max < minimum || max == 0 {
                report.add(
                    SetupErrorKind::ThresholdMismatch,
                    format!(
                        "field '{}': maximum {} is below the required minimum {}",
                        spec.name, max, minimum
                    ),
                );
            }
        }
    }

    fn produces(&self, _representation: Representation) -> bool {
        true
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, _ctx: &ValidationContext<'_>) -> Checked {
        let pool = self.pool();
        let checked: Vec<String> = match raw {
            Some(RawValue::Map(boxes)) => boxes
                .iter()
                .filter(|(_, state)| !UNCHECKED.contains(&state.trim()))
                .map(|(value, _)| value.clone())
                .collect(),
            other => submitted_list(other)
                .into_iter()
                .filter(|v| !v.trim().is_empty())
                .collect(),
        };

        let mut problems = Vec::new();
        for value in checked.iter().filter(|v| !pool.contains(v)) {
            problems.push(not_in_pool(spec, value));
        }

        // pool order, unknown values dropped
        let selected: Vec<String> = pool
            .values()
            .filter(|v| checked.iter().any(|c| c == *v))
            .map(str::to_string)
            .collect();

        let minimum = spec.required.minimum() as usize;
        if !selected.is_empty() && selected.len() < minimum {
            problems.push(FieldProblem::new(
                ProblemKind::InsufficientSelections,
                format!("{}: please check at least {} boxes.", spec.display_title(), minimum),
            ));
        }
        if let Some(max) = self.0.max {
            if selected.len() > max as usize {
                problems.push(FieldProblem::new(
                    ProblemKind::TooManySelections,
                    format!("{}: please check at most {} boxes.", spec.display_title(), max),
                ));
            }
        }

        Checked {
            sticky: FieldValue::Selection(selected.clone()),
            normalized: FieldValue::Selection(selected.clone()),
            empty: selected.is_empty(),
            representations: derive(&pool, &selected),
            problems,
        }
    }
}
