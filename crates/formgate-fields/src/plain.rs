//! Hidden fields and headings
use crate::{Checked, FieldValidator, ValidationContext};
use formgate_core::{
    FieldProblem, FieldSpec, FieldValue, HeadingOptions, HiddenOptions, ProblemKind,
    RawComponents, RawValue, Representation, Representations,
};
use std::collections::BTreeMap;

/// Hidden field: an associative map carried through the form unchanged.
pub struct HiddenField<'a>(pub &'a HiddenOptions);

impl FieldValidator for HiddenField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Map(self.0.values.clone())
    }

    fn produces(&self, representation: Representation) -> bool {
        representation != Representation::Compiled
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, _ctx: &ValidationContext<'_>) -> Checked {
        let (map, problems) = match raw {
            Some(RawValue::Map(map)) => (map.clone(), Vec::new()),
            None => (BTreeMap::new(), Vec::new()),
            Some(_) => (
                BTreeMap::new(),
                vec![FieldProblem::new(
                    ProblemKind::MalformedHidden,
                    format!("{}: hidden data was altered.", spec.display_title()),
                )],
            ),
        };

        Checked {
            sticky: FieldValue::Map(map.clone()),
            normalized: FieldValue::Map(map.clone()),
            problems,
            empty: map.is_empty(),
            representations: Representations {
                rawcomponents: Some(RawComponents::Map(map)),
                compiled: None,
                presented: Some(String::new()),
            },
        }
    }
}

/// Heading: layout only, never carries a value.
pub struct HeadingField<'a>(pub &'a HeadingOptions);

impl FieldValidator for HeadingField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Empty
    }

    fn produces(&self, _representation: Representation) -> bool {
        false
    }

    fn check(&self, _spec: &FieldSpec, _raw: Option<&RawValue>, _ctx: &ValidationContext<'_>) -> Checked {
        Checked {
            sticky: FieldValue::Empty,
            normalized: FieldValue::Empty,
            problems: Vec::new(),
            empty: true,
            representations: Representations::default(),
        }
    }
}
