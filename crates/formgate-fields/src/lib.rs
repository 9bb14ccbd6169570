//! formgate-fields: one validator per field type
//!
//! Every field type implements the same contract: normalize the raw value,
//! run its type-specific checks, decide emptiness and derive the
//! representations. The shared steps (required-but-empty, initial display)
//! live here so the per-type modules only carry their own policy.
//!
//! # Example
//!
//! ```ignore
//! use formgate_fields::{validate_field, ValidationContext};
//!
//! let state = validate_field(&spec, payload.get(&spec.name), &ctx);
//! if !state.is_acceptable() {
//!     for problem in &state.problems {
//!         println!("{}: {}", spec.display_title(), problem.message);
//!     }
//! }
//! ```

pub mod choice;
pub mod date;
pub mod email;
pub mod normalizer;
pub mod plain;
pub mod text;
pub mod textarea;
pub mod upload;

use chrono::NaiveDate;
use formgate_core::{
    EmailTarget, EnvironmentFacts, FieldKind, FieldProblem, FieldSpec, FieldState, FieldValue,
    FormSettings, RawValue, Representation, Representations, Required, SetupErrorKind,
    SetupReport, UploadStore,
};

pub use choice::{CheckboxField, RadioField, SelectField};
pub use date::{expand_year, parse_time, DateField};
pub use plain::{HeadingField, HiddenField};
pub use text::{EmailField, TextField};
pub use textarea::TextareaField;
pub use upload::{store_uploads, UploadField, UploadReport};

/// Inputs shared by every validator during one request.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub settings: &'a FormSettings,
    pub environment: &'a EnvironmentFacts,
    /// Date used for `today` defaults
    pub today: NaiveDate,
}

/// Inputs of the field-local setup checks.
#[derive(Clone, Copy)]
pub struct SetupContext<'a> {
    pub environment: &'a EnvironmentFacts,
    pub uploads: Option<&'a dyn UploadStore>,
}

/// Result of the type-specific part of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub sticky: FieldValue,
    pub normalized: FieldValue,
    pub problems: Vec<FieldProblem>,
    /// Empty by the type's own definition of empty
    pub empty: bool,
    pub representations: Representations,
}

impl Checked {
    /// A scalar text value with compiled == presented.
    pub fn text(value: String, problems: Vec<FieldProblem>) -> Self {
        Self {
            sticky: FieldValue::Text(value.clone()),
            normalized: FieldValue::Text(value.clone()),
            empty: value.is_empty(),
            representations: Representations::text(&value),
            problems,
        }
    }
}

/// Contract every field type implements.
pub trait FieldValidator {
    /// Sticky value before the form has been submitted: the configured
    /// default, shown as-is even when it would not validate.
    fn initial_value(&self, ctx: &ValidationContext<'_>) -> FieldValue;

    /// Configuration checks that only concern this field.
    fn setup_checks(&self, _spec: &FieldSpec, _setup: &SetupContext<'_>, _report: &mut SetupReport) {}

    /// Whether this field ever computes the given representation.
    fn produces(&self, representation: Representation) -> bool;

    fn email_target(&self) -> EmailTarget {
        EmailTarget::No
    }

    /// Normalize, check and derive.
    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked;
}

/// Validator for a field kind.
pub fn validator(kind: &FieldKind) -> Box<dyn FieldValidator + '_> {
    match kind {
        FieldKind::Text(opts) => Box::new(TextField::plain(opts)),
        FieldKind::Password(opts) => Box::new(TextField::secret(opts)),
        FieldKind::Email(opts) => Box::new(EmailField(opts)),
        FieldKind::Textarea(opts) => Box::new(TextareaField(opts)),
        FieldKind::Select(opts) => Box::new(SelectField(opts)),
        FieldKind::Radio(opts) => Box::new(RadioField(opts)),
        FieldKind::Checkbox(opts) => Box::new(CheckboxField(opts)),
        FieldKind::Date(opts) => Box::new(DateField(opts)),
        FieldKind::Upload(opts) => Box::new(UploadField(opts)),
        FieldKind::Hidden(opts) => Box::new(HiddenField(opts)),
        FieldKind::Heading(opts) => Box::new(HeadingField(opts)),
    }
}

/// State of a field on a request that carries no submission.
pub fn initial_state(spec: &FieldSpec, ctx: &ValidationContext<'_>) -> FieldState {
    let validator = validator(&spec.kind);
    FieldState::initial(
        spec.name.clone(),
        validator.initial_value(ctx),
        validator.email_target(),
    )
}

/// Run the full pipeline for one submitted field.
pub fn validate_field(
    spec: &FieldSpec,
    raw: Option<&RawValue>,
    ctx: &ValidationContext<'_>,
) -> FieldState {
    let validator = validator(&spec.kind);
    let checked = validator.check(spec, raw, ctx);

    let required_but_empty = match spec.kind {
        FieldKind::Hidden(_) | FieldKind::Heading(_) => false,
        _ => spec.required.is_required() && checked.empty,
    };

    tracing::debug!(
        field = %spec.name,
        kind = %spec.field_type(),
        problems = checked.problems.len(),
        required_but_empty,
        "validated field"
    );

    FieldState {
        name: spec.name.clone(),
        sticky: checked.sticky,
        normalized: checked.normalized,
        problems: checked.problems,
        required_but_empty,
        representations: checked.representations,
        email_target: validator.email_target(),
    }
}

/// Field-local setup checks of one field.
pub fn setup_checks(spec: &FieldSpec, setup: &SetupContext<'_>, report: &mut SetupReport) {
    validator(&spec.kind).setup_checks(spec, setup, report);
    if !matches!(
        spec.kind,
        FieldKind::Select(_) | FieldKind::Checkbox(_) | FieldKind::Upload(_)
    ) {
        single_value_required(spec, report);
    }
}

// Only select, checkbox and upload count; everything else holds one value.
fn single_value_required(spec: &FieldSpec, report: &mut SetupReport) {
    let given = match &spec.required {
        Required::Invalid(given) => given.clone(),
        Required::AtLeast(n) if *n > 1 => n.to_string(),
        _ => return,
    };
    report.add(
        SetupErrorKind::ThresholdMismatch,
        format!(
            "field '{}' ({}) is either required or not ({} given)",
            spec.name,
            spec.field_type(),
            given
        ),
    );
}

pub fn produces(spec: &FieldSpec, representation: Representation) -> bool {
    validator(&spec.kind).produces(representation)
}

pub fn email_target(spec: &FieldSpec) -> EmailTarget {
    validator(&spec.kind).email_target()
}
