//! Integration tests for the field validators against the fixture forms.

use chrono::NaiveDate;
use formgate_core::{
    EnvironmentFacts, FieldValue, FormDefinition, FormSettings, ProblemKind, RawComponents,
    RawValue, SubmissionPayload,
};
use formgate_fields::{initial_state, validate_field, ValidationContext};

/// Path to the fixture forms relative to the workspace root
const FORMS_DIR: &str = "testing/fixtures/forms";

fn load(name: &str) -> FormDefinition {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let path = workspace_root.join(FORMS_DIR).join(name);
    FormDefinition::load(&path.to_string_lossy()).unwrap()
}

fn context<'a>(settings: &'a FormSettings, environment: &'a EnvironmentFacts) -> ValidationContext<'a> {
    ValidationContext {
        settings,
        environment,
        today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    }
}

fn date(year: &str, month: &str, day: &str) -> RawValue {
    RawValue::Map(
        [("year", year), ("month", month), ("day", day)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

// =============================================================================
// Whole-form validation
// =============================================================================

#[test]
fn test_valid_registration_has_no_problems() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);

    let payload = SubmissionPayload::new()
        .with_text("name", "Ada Lovelace")
        .with_text("email", "ada@example.com")
        .with_text("pin", "1815")
        .with("born", date("15", "12", "10"))
        .with_text("track", "ops")
        .with_text("size", "M")
        .with_list("workshops", &["rust"])
        .with_text("venue_points", "51.5 -0.12\n48.85 2.35")
        .with_map("campaign", &[("source", "newsletter")]);

    for spec in form.value_fields() {
        let state = validate_field(spec, payload.get(&spec.name), &ctx);
        assert!(state.is_acceptable(), "{} has problems: {:?}", spec.name, state.problems);
    }
}

#[test]
fn test_every_problem_is_collected() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);

    let payload = SubmissionPayload::new()
        .with_text("email", "ada-at-example")
        .with_text("pin", "12")
        .with("born", date("2023", "02", "30"))
        .with_text("track", "marketing")
        .with_list("workshops", &["rust", "wasm", "embedded"]);

    let problem = |name: &str| {
        let spec = form.field(name).unwrap();
        validate_field(spec, payload.get(name), &ctx).problems[0].kind
    };

    assert_eq!(problem("email"), ProblemKind::InvalidEmailSyntax);
    assert_eq!(problem("pin"), ProblemKind::FailsPattern);
    assert_eq!(problem("born"), ProblemKind::InvalidDateCalendar);
    assert_eq!(problem("track"), ProblemKind::ValueNotInPool);
    assert_eq!(problem("workshops"), ProblemKind::TooManySelections);

    let name = form.field("name").unwrap();
    assert!(validate_field(name, payload.get("name"), &ctx).required_but_empty);
}

// =============================================================================
// Documented behaviours
// =============================================================================

#[test]
fn test_year_expansion_with_form_cutoff() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);
    let born = form.field("born").unwrap();

    let state = validate_field(born, Some(&date("05", "3", "5")), &ctx);
    assert_eq!(state.representations.compiled.as_deref(), Some("2005-03-05"));

    let state = validate_field(born, Some(&date("75", "3", "5")), &ctx);
    assert_eq!(state.representations.compiled.as_deref(), Some("1975-03-05"));
}

#[test]
fn test_empty_date_is_required_but_empty_only_when_required() {
    let form = FormDefinition::from_yaml(
        "identifier: d\nfields:\n  - {name: a, type: date, required: true}\n  - {name: b, type: date}\n",
    )
    .unwrap();
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);

    for spec in &form.fields {
        let state = validate_field(spec, Some(&date("", "", "")), &ctx);
        assert!(state.problems.is_empty());
        assert_eq!(state.required_but_empty, spec.required.is_required());
    }
}

#[test]
fn test_checkbox_components_complete_with_nothing_checked() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);
    let workshops = form.field("workshops").unwrap();

    let state = validate_field(workshops, None, &ctx);
    let Some(RawComponents::Flags(flags)) = state.representations.rawcomponents else {
        panic!("checkboxes always produce flags");
    };
    let values: Vec<&str> = flags.iter().map(|(v, _)| v.as_str()).collect();
    assert_eq!(values, vec!["rust", "wasm", "embedded"]);
    assert!(flags.iter().all(|(_, on)| !on));
}

#[test]
fn test_coordinates_flag_second_line() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);
    let points = form.field("venue_points").unwrap();

    let raw = RawValue::Text("1 2\n3\n4 5".to_string());
    let state = validate_field(points, Some(&raw), &ctx);
    assert_eq!(state.problems.len(), 1);
    assert!(state.problems[0].message.contains("line 2"));
}

#[test]
fn test_initial_states_show_defaults() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let ctx = context(&form.settings, &environment);

    let track = initial_state(form.field("track").unwrap(), &ctx);
    assert_eq!(track.sticky, FieldValue::Selection(vec!["dev".to_string()]));
    assert!(track.problems.is_empty());

    let slides = initial_state(form.field("slides").unwrap(), &ctx);
    assert_eq!(slides.sticky, FieldValue::Empty);
}

#[test]
fn test_whitespace_policy_on_required_text() {
    let form = load("registration.yaml");
    let environment = EnvironmentFacts::default();
    let name = form.field("name").unwrap();
    let raw = RawValue::Text("   ".to_string());

    for cheat in [false, true] {
        let settings = FormSettings {
            trim_values: true,
            whitespace_is_empty: cheat,
            ..FormSettings::default()
        };
        let ctx = context(&settings, &environment);
        let state = validate_field(name, Some(&raw), &ctx);
        assert!(state.required_but_empty, "cheat = {}", cheat);
        assert_eq!(state.normalized, FieldValue::Text(String::new()));
    }
}
