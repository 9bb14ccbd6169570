//! Integration tests for setup validation with the fixture forms.

use formgate_core::{EnvironmentFacts, FileSink, FormDefinition, FormError, SetupErrorKind};
use formgate_policy::{validate, SetupEnvironment};

/// Path to the fixture forms relative to the workspace root
const FORMS_DIR: &str = "testing/fixtures/forms";

fn load(name: &str) -> FormDefinition {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let path = workspace_root.join(FORMS_DIR).join(name);
    FormDefinition::load(&path.to_string_lossy()).unwrap()
}

struct WritableSink;

impl FileSink for WritableSink {
    fn is_writable(&self) -> bool {
        true
    }

    fn contains_submitter(&self, _submitter: &str) -> Result<bool, FormError> {
        Ok(false)
    }

    fn append(&self, _header: &[String], _row: &[String]) -> Result<(), FormError> {
        Ok(())
    }
}

// =============================================================================
// Valid fixtures
// =============================================================================

#[test]
fn test_registration_is_operable() {
    let form = load("registration.yaml");
    let facts = EnvironmentFacts::default();
    let sink = WritableSink;
    let report = validate(&form, &SetupEnvironment::new(&facts).with_file_sink(&sink));
    assert!(report.is_empty(), "unexpected setup errors:\n{}", report);
}

#[test]
fn test_contact_is_operable() {
    let form = load("contact.yaml");
    let facts = EnvironmentFacts::default();
    let report = validate(&form, &SetupEnvironment::new(&facts));
    assert!(report.is_empty(), "unexpected setup errors:\n{}", report);
}

#[test]
fn test_registration_without_sink_or_uploads() {
    let form = load("registration.yaml");
    let facts = EnvironmentFacts {
        uploads_enabled: false,
        max_upload_bytes: None,
    };
    let report = validate(&form, &SetupEnvironment::new(&facts));
    assert!(report.contains(SetupErrorKind::InvalidChannelConfig));
    assert!(report.contains(SetupErrorKind::UnsupportedEnvironment));
}

// =============================================================================
// Broken fixture
// =============================================================================

#[test]
fn test_broken_form_reports_everything() {
    let form = load("broken.yaml");
    let facts = EnvironmentFacts::default();
    let report = validate(&form, &SetupEnvironment::new(&facts));

    let expected = [
        SetupErrorKind::IllegalFormIdentifier,
        SetupErrorKind::DuplicateName,
        SetupErrorKind::MissingRequiredArgument,
        SetupErrorKind::DefaultNotInPool,
        SetupErrorKind::ReservedNameCollision,
        SetupErrorKind::ThresholdMismatch,
        SetupErrorKind::InvalidOutputSpec,
        SetupErrorKind::UnsupportedOutputForType,
    ];
    for kind in expected {
        assert!(report.contains(kind), "missing {}:\n{}", kind, report);
    }
    assert_eq!(report.messages(SetupErrorKind::DuplicateName).len(), 1);
    assert_eq!(report.messages(SetupErrorKind::ReservedNameCollision).len(), 2);
    assert_eq!(report.messages(SetupErrorKind::UnsupportedOutputForType).len(), 2);
}

#[test]
fn test_setup_is_idempotent() {
    let form = load("broken.yaml");
    let facts = EnvironmentFacts::default();
    let environment = SetupEnvironment::new(&facts);

    let first = validate(&form, &environment);
    let second = validate(&form, &environment);
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
