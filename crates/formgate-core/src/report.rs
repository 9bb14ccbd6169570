//! Setup report: configuration defects that disable a form
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of setup errors. Any one of them blocks the whole form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupErrorKind {
    DuplicateName,
    FormEmpty,
    MissingRequiredArgument,
    ThresholdMismatch,
    InvalidOutputSpec,
    UnsupportedOutputForType,
    ReservedNameCollision,
    IllegalFormIdentifier,
    TemplatePlaceholderMissing,
    TemplatePatternCollision,
    EmptyValuePool,
    SentinelCollision,
    DefaultNotInPool,
    InvalidPattern,
    InvalidUploadConfig,
    IllegalExtensionPolicy,
    DirectoryNotWritable,
    UnsupportedEnvironment,
    InvalidChannelConfig,
}

impl fmt::Display for SetupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Every setup error found, grouped by kind in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SetupReport {
    errors: BTreeMap<SetupErrorKind, Vec<String>>,
}

impl SetupReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: SetupErrorKind, message: impl Into<String>) {
        self.errors.entry(kind).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of individual messages.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn contains(&self, kind: SetupErrorKind) -> bool {
        self.errors.contains_key(&kind)
    }

    pub fn messages(&self, kind: SetupErrorKind) -> &[String] {
        self.errors.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (SetupErrorKind, &str)> {
        self.errors
            .iter()
            .flat_map(|(kind, messages)| messages.iter().map(move |m| (*kind, m.as_str())))
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (kind, message) in self.iter() {
            writeln!(f, "{}: {}", kind, message)?;
        }
        Ok(())
    }
}
