//! Setup validation
//!
//! Runs every configuration check and accumulates the findings; no check
//! short-circuits another. A non-empty report disables the whole form.
//! Running it twice over the same inputs yields the same report.

use crate::{channels, matrix, template};
use formgate_core::{
    Channel, EnvironmentFacts, FieldKind, FieldSpec, FileSink, FormDefinition, Representation,
    SetupErrorKind, SetupReport, UploadStore, HEADING_PREFIX, INTERNAL_PREFIX,
};
use formgate_fields::SetupContext;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    /// Legal form identifiers
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Collaborators consulted while validating a definition.
#[derive(Clone, Copy)]
pub struct SetupEnvironment<'a> {
    pub facts: &'a EnvironmentFacts,
    pub uploads: Option<&'a dyn UploadStore>,
    pub file_sink: Option<&'a dyn FileSink>,
}

impl<'a> SetupEnvironment<'a> {
    pub fn new(facts: &'a EnvironmentFacts) -> Self {
        Self {
            facts,
            uploads: None,
            file_sink: None,
        }
    }

    pub fn with_uploads(mut self, uploads: &'a dyn UploadStore) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn with_file_sink(mut self, file_sink: &'a dyn FileSink) -> Self {
        self.file_sink = Some(file_sink);
        self
    }
}

/// Validate a form definition.
pub fn validate(form: &FormDefinition, environment: &SetupEnvironment<'_>) -> SetupReport {
    let mut report = SetupReport::new();

    check_identifier(&form.identifier, &mut report);
    if form.settings.year_cutoff > 99 {
        report.add(
            SetupErrorKind::ThresholdMismatch,
            format!(
                "form '{}': year_cutoff must be below 100 ({} given)",
                form.identifier, form.settings.year_cutoff
            ),
        );
    }
    if form.value_fields().next().is_none() {
        report.add(
            SetupErrorKind::FormEmpty,
            format!("form '{}' has no fields", form.identifier),
        );
    }
    check_names(&form.fields, &mut report);

    let context = SetupContext {
        environment: environment.facts,
        uploads: environment.uploads,
    };
    for spec in &form.fields {
        formgate_fields::setup_checks(spec, &context, &mut report);
        check_output(spec, &mut report);
    }

    if let Some(settings) = &form.settings.template {
        template::check(form, settings, &mut report);
    }
    channels::check(form, environment.file_sink, &mut report);

    if report.is_empty() {
        tracing::debug!(form = %form.identifier, "setup ok");
    } else {
        tracing::warn!(
            form = %form.identifier,
            errors = report.len(),
            "form disabled by setup errors"
        );
    }
    report
}

fn check_identifier(identifier: &str, report: &mut SetupReport) {
    if !IDENTIFIER.is_match(identifier) {
        report.add(
            SetupErrorKind::IllegalFormIdentifier,
            format!(
                "form identifier '{}' may only contain letters, digits, '_' and '-'",
                identifier
            ),
        );
    }
}

fn check_names(fields: &[FieldSpec], report: &mut SetupReport) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

    for (index, spec) in fields.iter().enumerate() {
        let is_heading = matches!(spec.kind, FieldKind::Heading(_));
        if spec.name.is_empty() {
            report.add(
                SetupErrorKind::MissingRequiredArgument,
                format!("field #{} ({}) has no name", index + 1, spec.field_type()),
            );
            continue;
        }

        *seen.entry(spec.name.as_str()).or_default() += 1;

        if spec.name.starts_with(INTERNAL_PREFIX) {
            report.add(
                SetupErrorKind::ReservedNameCollision,
                format!("field name '{}' uses the reserved prefix '{}'", spec.name, INTERNAL_PREFIX),
            );
        } else if spec.name.starts_with(HEADING_PREFIX) && !is_heading {
            report.add(
                SetupErrorKind::ReservedNameCollision,
                format!("field name '{}' uses the heading prefix '{}'", spec.name, HEADING_PREFIX),
            );
        }
    }

    for (name, count) in seen.into_iter().filter(|(_, count)| *count > 1) {
        report.add(
            SetupErrorKind::DuplicateName,
            format!("field name '{}' is used {} times", name, count),
        );
    }
}

/// `output:` overrides must name a channel and a representation the
/// matrix allows for this type, and the field must produce it.
fn check_output(spec: &FieldSpec, report: &mut SetupReport) {
    for (key, name) in &spec.output {
        let (Some(channel), Some(representation)) = (Channel::parse(key), Representation::parse(name))
        else {
            report.add(
                SetupErrorKind::InvalidOutputSpec,
                format!("field '{}': '{}: {}' is not a channel and representation", spec.name, key, name),
            );
            continue;
        };

        let permitted = matrix::allowed(spec.field_type(), channel).contains(&representation);
        if !permitted || !formgate_fields::produces(spec, representation) {
            report.add(
                SetupErrorKind::UnsupportedOutputForType,
                format!(
                    "field '{}': {} fields cannot deliver {} on the {} channel",
                    spec.name,
                    spec.field_type(),
                    representation,
                    channel
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(yaml: &str) -> SetupReport {
        let form = FormDefinition::from_yaml(yaml).unwrap();
        let facts = EnvironmentFacts::default();
        validate(&form, &SetupEnvironment::new(&facts))
    }

    #[test]
    fn test_valid_form() {
        assert!(report("identifier: ok\nfields:\n  - {name: a, type: text}\n").is_empty());
    }

    #[test]
    fn test_duplicate_names_listed_once() {
        let r = report(
            "identifier: d\nfields:\n  - {name: a, type: text}\n  - {name: a, type: email}\n  - {name: a, type: text}\n",
        );
        assert_eq!(r.messages(SetupErrorKind::DuplicateName).len(), 1);
        assert!(r.messages(SetupErrorKind::DuplicateName)[0].contains("3 times"));
    }

    #[test]
    fn test_form_year_cutoff_range() {
        let fields = "fields:\n  - {name: born, type: date}\n";
        let r = report(&format!("identifier: y\nsettings:\n  year_cutoff: 150\n{}", fields));
        assert!(r.contains(SetupErrorKind::ThresholdMismatch));
        assert!(report(&format!("identifier: y\nsettings:\n  year_cutoff: 30\n{}", fields)).is_empty());
    }

    #[test]
    fn test_empty_form() {
        let r = report("identifier: e\nfields:\n  - {type: heading, title: Only a heading}\n");
        assert!(r.contains(SetupErrorKind::FormEmpty));
    }

    #[test]
    fn test_identifier_and_reserved_names() {
        let r = report(
            "identifier: 'bad id'\nfields:\n  - {name: _heading_9, type: text}\n  - {name: _fg_x, type: text}\n  - {name: _heading_1, type: heading}\n",
        );
        assert!(r.contains(SetupErrorKind::IllegalFormIdentifier));
        assert_eq!(r.messages(SetupErrorKind::ReservedNameCollision).len(), 2);
    }

    #[test]
    fn test_unnamed_field() {
        let r = report("identifier: u\nfields:\n  - {type: text}\n");
        assert!(r.contains(SetupErrorKind::MissingRequiredArgument));
    }

    #[test]
    fn test_output_overrides() {
        let r = report(
            "identifier: o\nfields:\n  - {name: p, type: password, output: {confirmation_email: compiled}}\n  - {name: m, type: textarea, output: {file: rawcomponents}}\n  - {name: t, type: text, output: {fax: compiled}}\n  - {name: u, type: text, output: {file: shouted}}\n",
        );
        assert_eq!(r.messages(SetupErrorKind::UnsupportedOutputForType).len(), 2);
        assert_eq!(r.messages(SetupErrorKind::InvalidOutputSpec).len(), 2);
    }
}
