//! Template display mode checks
//!
//! In template mode the host substitutes placeholders built from three
//! patterns (`%s` stands for a name). Every visible field's widget
//! placeholder and each special placeholder must occur exactly once.

use formgate_core::{FieldKind, FormDefinition, SetupErrorKind, SetupReport, TemplateSettings};

/// Placeholders every template needs besides the field widgets
pub const SPECIAL_PLACEHOLDERS: [&str; 3] = ["problems", "submit", "required"];

const NAME_MARKER: &str = "%s";

/// Placeholder text of `name` under `pattern`.
pub fn placeholder(pattern: &str, name: &str) -> String {
    pattern.replace(NAME_MARKER, name)
}

pub fn check(form: &FormDefinition, settings: &TemplateSettings, report: &mut SetupReport) {
    let patterns = [
        ("widget_pattern", settings.widget_pattern.as_str()),
        ("label_pattern", settings.label_pattern.as_str()),
        ("special_pattern", settings.special_pattern.as_str()),
    ];

    for (option, pattern) in patterns {
        if !pattern.contains(NAME_MARKER) {
            report.add(
                SetupErrorKind::TemplatePatternCollision,
                format!("{} '{}' does not contain {}", option, pattern, NAME_MARKER),
            );
        }
    }
    for (i, (option_a, a)) in patterns.iter().enumerate() {
        for (option_b, b) in patterns.iter().skip(i + 1) {
            if a == b {
                report.add(
                    SetupErrorKind::TemplatePatternCollision,
                    format!("{} and {} are both '{}'", option_a, option_b, a),
                );
            }
        }
    }

    let widgets = form
        .fields
        .iter()
        .filter(|f| !matches!(f.kind, FieldKind::Hidden(_) | FieldKind::Heading(_)))
        .map(|f| placeholder(&settings.widget_pattern, &f.name));
    let specials = SPECIAL_PLACEHOLDERS
        .iter()
        .map(|name| placeholder(&settings.special_pattern, name));

    for expected in widgets.chain(specials) {
        let count = settings.text.matches(expected.as_str()).count();
        if count != 1 {
            report.add(
                SetupErrorKind::TemplatePlaceholderMissing,
                format!("template must contain '{}' exactly once (found {})", expected, count),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_yaml(yaml: &str) -> SetupReport {
        let form = FormDefinition::from_yaml(yaml).unwrap();
        let mut report = SetupReport::new();
        check(&form, form.settings.template.as_ref().unwrap(), &mut report);
        report
    }

    const FIELDS: &str = "fields:\n  - {name: name, type: text}\n  - {name: ref, type: hidden}\n";

    #[test]
    fn test_complete_template() {
        let yaml = format!(
            "identifier: t\nsettings:\n  template:\n    text: '{{{{#problems}}}} {{{{name.label}}}} {{{{name}}}} {{{{#required}}}} {{{{#submit}}}}'\n{}",
            FIELDS
        );
        assert!(check_yaml(&yaml).is_empty());
    }

    #[test]
    fn test_missing_and_repeated_placeholders() {
        let yaml = format!(
            "identifier: t\nsettings:\n  template:\n    text: '{{{{#problems}}}} {{{{#problems}}}} {{{{#submit}}}}'\n{}",
            FIELDS
        );
        let report = check_yaml(&yaml);
        // name widget, required special, doubled problems
        assert_eq!(report.messages(SetupErrorKind::TemplatePlaceholderMissing).len(), 3);
    }

    #[test]
    fn test_pattern_collision() {
        let yaml = format!(
            "identifier: t\nsettings:\n  template:\n    text: ''\n    widget_pattern: '[%s]'\n    label_pattern: '[%s]'\n    special_pattern: '<special>'\n{}",
            FIELDS
        );
        let report = check_yaml(&yaml);
        assert_eq!(report.messages(SetupErrorKind::TemplatePatternCollision).len(), 2);
    }
}
