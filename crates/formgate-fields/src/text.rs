//! Single-line text, password and email fields
use crate::normalizer::{check_pattern, coerce_numeric, compile_pattern, length_problem, scalar};
use crate::{email, Checked, FieldValidator, SetupContext, ValidationContext};
use formgate_core::{
    EmailOptions, EmailTarget, FieldProblem, FieldSpec, FieldValue, ProblemKind, RawValue,
    Representation, Representations, SetupReport, TextOptions,
};

/// Text or password field.
pub struct TextField<'a> {
    opts: &'a TextOptions,
    secret: bool,
}

impl<'a> TextField<'a> {
    pub fn plain(opts: &'a TextOptions) -> Self {
        Self { opts, secret: false }
    }

    /// Password: redisplayed as typed, presented masked.
    pub fn secret(opts: &'a TextOptions) -> Self {
        Self { opts, secret: true }
    }
}

impl FieldValidator for TextField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Text(self.opts.default.clone().unwrap_or_default())
    }

    fn setup_checks(&self, spec: &FieldSpec, _setup: &SetupContext<'_>, report: &mut SetupReport) {
        check_pattern(&spec.name, "regexp", self.opts.regexp.as_deref(), report);
    }

    fn produces(&self, representation: Representation) -> bool {
        representation != Representation::RawComponents
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let mut value = scalar(raw, ctx.settings);
        if self.opts.numeric {
            value = coerce_numeric(&value);
        }

        let mut problems = Vec::new();
        if let Some(problem) = length_problem(spec.display_title(), &value, self.opts.maxlength) {
            problems.push(problem);
        }

        if !value.is_empty() {
            if let Some(Ok(pattern)) = self.opts.regexp.as_deref().map(compile_pattern) {
                if !pattern.is_match(&value) {
                    let message = self.opts.regexp_message.clone().unwrap_or_else(|| {
                        format!("{} does not have the expected format.", spec.display_title())
                    });
                    problems.push(FieldProblem::new(ProblemKind::FailsPattern, message));
                }
            }
        }

        if !self.secret {
            return Checked::text(value, problems);
        }

        let masked = "*".repeat(value.chars().count());
        Checked {
            sticky: FieldValue::Text(value.clone()),
            normalized: FieldValue::Text(value.clone()),
            empty: value.is_empty(),
            representations: Representations {
                rawcomponents: None,
                compiled: Some(value),
                presented: Some(masked),
            },
            problems,
        }
    }
}

/// Email address field.
pub struct EmailField<'a>(pub &'a EmailOptions);

impl FieldValidator for EmailField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Text(self.0.default.clone().unwrap_or_default())
    }

    fn produces(&self, representation: Representation) -> bool {
        representation != Representation::RawComponents
    }

    fn email_target(&self) -> EmailTarget {
        EmailTarget::Syntax
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let value = scalar(raw, ctx.settings);

        let mut problems = Vec::new();
        if let Some(problem) = length_problem(spec.display_title(), &value, self.0.maxlength) {
            problems.push(problem);
        }
        if !value.is_empty() && !email::is_valid(&value) {
            problems.push(FieldProblem::new(
                ProblemKind::InvalidEmailSyntax,
                format!("{} is not a valid email address.", spec.display_title()),
            ));
        }

        Checked::text(value, problems)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use formgate_core::{EmailTarget, FieldValue, ProblemKind, SetupErrorKind, SetupReport};

    #[test]
    fn test_text_maxlength() {
        let spec = spec("name: zip\ntype: text\nmaxlength: 5\n");
        let state = run(&spec, text("123456"), &settings());
        assert!(state.has_problem(ProblemKind::TooLong));
        assert!(run(&spec, text("12345"), &settings()).is_acceptable());
    }

    #[test]
    fn test_text_regexp_with_message() {
        let spec = spec(
            "name: zip\ntype: text\nregexp: '^[0-9]{5}$'\nregexp_message: Five digits please\n",
        );
        let state = run(&spec, text("12a45"), &settings());
        assert_eq!(state.problems.len(), 1);
        assert_eq!(state.problems[0].kind, ProblemKind::FailsPattern);
        assert_eq!(state.problems[0].message, "Five digits please");

        // empty values are not matched
        assert!(run(&spec, text(""), &settings()).problems.is_empty());
    }

    #[test]
    fn test_numeric_coercion() {
        let spec = spec("name: amount\ntype: text\nnumeric: true\n");
        let state = run(&spec, text("EUR 12.50"), &settings());
        assert_eq!(state.normalized, FieldValue::Text("12.50".into()));
    }

    #[test]
    fn test_invalid_regexp_is_setup_error() {
        let spec = spec("name: zip\ntype: text\nregexp: '[0-9'\n");
        let mut report = SetupReport::new();
        let environment = formgate_core::EnvironmentFacts::default();
        let setup = crate::SetupContext { environment: &environment, uploads: None };
        crate::setup_checks(&spec, &setup, &mut report);
        assert!(report.contains(SetupErrorKind::InvalidPattern));
    }

    #[test]
    fn test_password_masked_but_sticky() {
        let spec = spec("name: pin\ntype: password\n");
        let state = run(&spec, text("s3cret"), &settings());
        assert_eq!(state.sticky, FieldValue::Text("s3cret".into()));
        assert_eq!(state.representations.presented.as_deref(), Some("******"));
        assert_eq!(state.representations.compiled.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_email_syntax() {
        let spec = spec("name: mail\ntype: email\n");
        assert!(run(&spec, text("not-an-address"), &settings())
            .has_problem(ProblemKind::InvalidEmailSyntax));
        let ok = run(&spec, text(" ada@example.com "), &settings());
        assert!(ok.is_acceptable());
        assert_eq!(ok.normalized, FieldValue::Text("ada@example.com".into()));
        assert_eq!(ok.email_target, EmailTarget::Syntax);
    }
}
