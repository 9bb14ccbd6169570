//! Multi-line text: normal, line-list and coordinate-pair modes
use crate::normalizer::{
    apply_whitespace_policy, check_pattern, compile_pattern, length_problem, normalize_newlines,
};
use crate::{Checked, FieldValidator, SetupContext, ValidationContext};
use formgate_core::{
    FieldProblem, FieldSpec, FieldValue, ProblemKind, RawComponents, RawValue, Representation,
    Representations, SetupReport, TextareaMode, TextareaOptions,
};
use regex::Regex;

pub struct TextareaField<'a>(pub &'a TextareaOptions);

impl FieldValidator for TextareaField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Text(self.0.default.clone().unwrap_or_default())
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        check_pattern(&spec.name, "line_regexp", self.0.line_regexp.as_deref(), report);
    }

    fn produces(&self, representation: Representation) -> bool {
        match representation {
            Representation::RawComponents => self.0.mode != TextareaMode::Normal,
            _ => true,
        }
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let text = match raw {
            Some(RawValue::Text(s)) => normalize_newlines(s),
            _ => String::new(),
        };
        let value = apply_whitespace_policy(&text, ctx.settings);

        let mut problems = Vec::new();
        if let Some(problem) = length_problem(spec.display_title(), &value, self.0.maxlength) {
            problems.push(problem);
        }

        let rawcomponents = match self.0.mode {
            TextareaMode::Normal => None,
            TextareaMode::Lines => Some(RawComponents::Lines(split_lines(&value))),
            TextareaMode::Coordinates => {
                let line_pattern = self
                    .0
                    .line_regexp
                    .as_deref()
                    .and_then(|p| compile_pattern(p).ok());
                let (pairs, bad_lines) = coordinate_pairs(&value, line_pattern.as_ref());
                if !bad_lines.is_empty() {
                    problems.push(FieldProblem::new(
                        ProblemKind::InvalidCoordinates,
                        coordinates_message(spec.display_title(), &bad_lines),
                    ));
                }
                Some(RawComponents::Coordinates(pairs))
            }
        };

        Checked {
            sticky: FieldValue::Text(value.clone()),
            normalized: FieldValue::Text(value.clone()),
            empty: value.is_empty(),
            representations: Representations {
                rawcomponents,
                compiled: Some(value.clone()),
                presented: Some(value),
            },
            problems,
        }
    }
}

fn split_lines(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split('\n').map(str::to_string).collect()
}

/// Split every non-blank line at its first whitespace run.
///
/// Returns the accepted pairs and the 1-based numbers of rejected lines.
pub fn coordinate_pairs(value: &str, line_pattern: Option<&Regex>) -> (Vec<(String, String)>, Vec<usize>) {
    let mut pairs = Vec::new();
    let mut bad_lines = Vec::new();

    for (index, line) in value.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let matches_pattern = line_pattern.map_or(true, |p| p.is_match(line));
        match line.split_once(char::is_whitespace) {
            Some((x, y)) if matches_pattern => pairs.push((x.to_string(), y.trim().to_string())),
            _ => bad_lines.push(index + 1),
        }
    }

    (pairs, bad_lines)
}

fn coordinates_message(title: &str, bad_lines: &[usize]) -> String {
    let numbers = bad_lines
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if bad_lines.len() == 1 {
        format!("{}: line {} is not a valid coordinate pair.", title, numbers)
    } else {
        format!("{}: lines {} are not valid coordinate pairs.", title, numbers)
    }
}
