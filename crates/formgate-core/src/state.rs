//! Field State: valores derivados por submissão
//!
//! Created fresh for every submission, never persisted, discarded once the
//! output channels have been served.

use crate::channel::Representation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field value in one of the shapes the widgets produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Empty,
    Text(String),
    Selection(Vec<String>),
    Date(DateParts),
    Files(Vec<Option<String>>),
    Map(BTreeMap<String, String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Separate parts of a date/time widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
    #[serde(default)]
    pub time: String,
}

impl DateParts {
    pub fn new(year: &str, month: &str, day: &str) -> Self {
        Self {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
            time: String::new(),
        }
    }

    pub fn date_is_blank(&self) -> bool {
        self.year.is_empty() && self.month.is_empty() && self.day.is_empty()
    }
}

/// Structured form of a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawComponents {
    Lines(Vec<String>),
    Coordinates(Vec<(String, String)>),
    /// Every pool value with its selected state
    Flags(Vec<(String, bool)>),
    Date(DateParts),
    /// Per upload slot: the filename, or none
    Slots(Vec<Option<String>>),
    Map(BTreeMap<String, String>),
}

impl RawComponents {
    /// Single-line text for sinks that only take strings.
    pub fn flatten(&self) -> String {
        match self {
            RawComponents::Lines(lines) => lines.join("\n"),
            RawComponents::Coordinates(pairs) => pairs
                .iter()
                .map(|(x, y)| format!("{} {}", x, y))
                .collect::<Vec<_>>()
                .join("\n"),
            RawComponents::Flags(flags) => flags
                .iter()
                .map(|(value, on)| format!("{}={}", value, if *on { 1 } else { 0 }))
                .collect::<Vec<_>>()
                .join(", "),
            RawComponents::Date(parts) => {
                let date = format!("{}-{}-{}", parts.year, parts.month, parts.day);
                if parts.time.is_empty() {
                    date
                } else {
                    format!("{} {}", date, parts.time)
                }
            }
            RawComponents::Slots(slots) => slots
                .iter()
                .map(|s| s.as_deref().unwrap_or("-"))
                .collect::<Vec<_>>()
                .join(", "),
            RawComponents::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The up-to-three derived forms of a field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Representations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rawcomponents: Option<RawComponents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiled: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presented: Option<String>,
}

impl Representations {
    /// compiled == presented == value
    pub fn text(value: &str) -> Self {
        Self {
            rawcomponents: None,
            compiled: Some(value.to_string()),
            presented: Some(value.to_string()),
        }
    }

    pub fn get(&self, representation: Representation) -> Option<ResolvedValue> {
        match representation {
            Representation::RawComponents => self
                .rawcomponents
                .clone()
                .map(ResolvedValue::Components),
            Representation::Compiled => self.compiled.clone().map(ResolvedValue::Text),
            Representation::Presented => self.presented.clone().map(ResolvedValue::Text),
        }
    }
}

/// The representation a channel receives for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Text(String),
    Components(RawComponents),
}

impl ResolvedValue {
    pub fn to_text(&self) -> String {
        match self {
            ResolvedValue::Text(s) => s.clone(),
            ResolvedValue::Components(c) => c.flatten(),
        }
    }
}

/// Whether a field's value can address an outgoing email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTarget {
    #[default]
    No,
    /// Every offered value is an address
    Yes,
    /// The value is a syntax-checked address
    Syntax,
    /// The value becomes an address with the field's suffix
    Suffix,
}

impl EmailTarget {
    pub fn is_suitable(&self) -> bool {
        !matches!(self, EmailTarget::No)
    }
}

/// Stable kinds of per-field problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    TooLong,
    FailsPattern,
    InvalidEmailSyntax,
    InvalidCoordinates,
    ValueNotInPool,
    InsufficientSelections,
    TooManySelections,
    IncompleteDateParts,
    MalformedDate,
    InvalidDateCalendar,
    InvalidTimeFormat,
    ExtensionDisallowed,
    ExtensionRequired,
    FileTooLarge,
    BelowMinimumUploads,
    TooManyUploads,
    MalformedHidden,
    /// The submitted value has no shape any widget produces
    MalformedValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldProblem {
    pub kind: ProblemKind,
    pub message: String,
}

impl FieldProblem {
    pub fn new(kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Problems that concern the submission as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericProblemKind {
    IncompleteRequiredFields,
    ReselectUploadsRequired,
    SecurityTamperDetected,
    DuplicateSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericProblem {
    pub kind: GenericProblemKind,
    pub message: String,
}

impl GenericProblem {
    pub fn new(kind: GenericProblemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything computed for one field during one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    pub name: String,
    /// What to redisplay
    pub sticky: FieldValue,
    pub normalized: FieldValue,
    pub problems: Vec<FieldProblem>,
    pub required_but_empty: bool,
    pub representations: Representations,
    pub email_target: EmailTarget,
}

impl FieldState {
    /// State of a field that has not been submitted yet.
    pub fn initial(name: impl Into<String>, sticky: FieldValue, email_target: EmailTarget) -> Self {
        Self {
            name: name.into(),
            sticky,
            normalized: FieldValue::Empty,
            problems: Vec::new(),
            required_but_empty: false,
            representations: Representations::default(),
            email_target,
        }
    }

    /// No problems and nothing required left empty.
    pub fn is_acceptable(&self) -> bool {
        self.problems.is_empty() && !self.required_but_empty
    }

    pub fn has_problem(&self, kind: ProblemKind) -> bool {
        self.problems.iter().any(|p| p.kind == kind)
    }
}
