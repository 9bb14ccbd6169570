//! Value normalization shared by the scalar field types.
//!
//! - Picking a scalar out of whatever shape was submitted
//! - Trimming and the whitespace-is-empty policy
//! - Numeric coercion
//! - Newline normalization

use formgate_core::{FieldProblem, FormSettings, ProblemKind, RawValue, SetupErrorKind, SetupReport};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Everything a numeric value may not contain
    static ref NON_NUMERIC: Regex = Regex::new(r"[^-0-9.\n\t ]").unwrap();

    /// Runs of horizontal whitespace
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();

    /// Newlines separated only by blanks
    static ref BLANK_LINES: Regex = Regex::new(r"\n(?:[ \t]*\n)+").unwrap();
}

/// Scalar text of a submitted value, normalized by the form settings.
///
/// A list contributes its first element; any other non-text shape is
/// treated as absent.
pub fn scalar(raw: Option<&RawValue>, settings: &FormSettings) -> String {
    let value = match raw {
        Some(RawValue::Text(s)) => s.as_str(),
        Some(RawValue::List(items)) => items.first().map(String::as_str).unwrap_or(""),
        _ => "",
    };
    apply_whitespace_policy(value, settings)
}

/// Trim and/or collapse whitespace-only values according to the settings.
pub fn apply_whitespace_policy(value: &str, settings: &FormSettings) -> String {
    let value = if settings.trim_values { value.trim() } else { value };
    if settings.whitespace_is_empty && value.trim().is_empty() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Keep digits, signs, dots and whitespace; collapse blank runs and lines.
pub fn coerce_numeric(value: &str) -> String {
    let kept = NON_NUMERIC.replace_all(value, "");
    let spaced = HORIZONTAL_SPACE.replace_all(&kept, " ");
    let lines = BLANK_LINES.replace_all(&spaced, "\n");
    lines.trim().to_string()
}

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

/// Length limit in characters; `None` when the value fits.
pub fn length_problem(title: &str, value: &str, maxlength: Option<usize>) -> Option<FieldProblem> {
    let limit = maxlength?;
    let length = value.chars().count();
    (length > limit).then(|| {
        FieldProblem::new(
            ProblemKind::TooLong,
            format!(
                "{} may be at most {} characters long ({} given).",
                title, limit, length
            ),
        )
    })
}

/// Compile an author-supplied pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Record an `InvalidPattern` setup error when `pattern` does not compile.
pub fn check_pattern(field: &str, option: &str, pattern: Option<&str>, report: &mut SetupReport) {
    if let Some(pattern) = pattern {
        if let Err(e) = compile_pattern(pattern) {
            report.add(
                SetupErrorKind::InvalidPattern,
                format!("field '{}': {} does not compile: {}", field, option, e),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(trim: bool, cheat: bool) -> FormSettings {
        FormSettings {
            trim_values: trim,
            whitespace_is_empty: cheat,
            ..FormSettings::default()
        }
    }

    #[test]
    fn test_scalar_shapes() {
        let s = FormSettings::default();
        assert_eq!(scalar(Some(&RawValue::Text(" a ".into())), &s), "a");
        assert_eq!(
            scalar(Some(&RawValue::List(vec!["x".into(), "y".into()])), &s),
            "x"
        );
        assert_eq!(scalar(None, &s), "");
        assert_eq!(scalar(Some(&RawValue::Map(Default::default())), &s), "");
    }

    #[test]
    fn test_whitespace_policy() {
        assert_eq!(apply_whitespace_policy("  ", &settings(false, false)), "  ");
        assert_eq!(apply_whitespace_policy("  ", &settings(false, true)), "");
        assert_eq!(apply_whitespace_policy(" a ", &settings(false, true)), " a ");
        assert_eq!(apply_whitespace_policy(" a ", &settings(true, false)), "a");
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("EUR 1.234,50"), "1.23450");
        assert_eq!(coerce_numeric("  -12\t\t 7 "), "-12 7");
        assert_eq!(coerce_numeric("1\n \n\n2"), "1\n2");
        assert_eq!(coerce_numeric("abc"), "");
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_length_problem_counts_chars() {
        assert!(length_problem("Name", "äöü", Some(3)).is_none());
        let problem = length_problem("Name", "äöüx", Some(3)).unwrap();
        assert_eq!(problem.kind, ProblemKind::TooLong);
        assert!(length_problem("Name", "anything", None).is_none());
    }

    #[test]
    fn test_check_pattern() {
        let mut report = SetupReport::new();
        check_pattern("zip", "regexp", Some(r"^\d{5}$"), &mut report);
        assert!(report.is_empty());
        check_pattern("zip", "regexp", Some("(unclosed"), &mut report);
        assert!(report.contains(SetupErrorKind::InvalidPattern));
    }
}
