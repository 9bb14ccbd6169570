//! Terminal states of one request
use formgate_core::{FieldState, FormError, GenericProblem, GenericProblemKind, SetupReport};
use formgate_fields::UploadReport;
use formgate_out::DataSet;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    /// No payload for the form: fields carry their defaults.
    NotSubmitted { fields: Vec<FieldState> },

    /// The definition is defective; nothing else ran.
    BlockedBySetup { setup: SetupReport },

    /// The submission must be corrected and sent again.
    BlockedByProblems {
        problems: Vec<GenericProblem>,
        fields: Vec<FieldState>,
    },

    /// Values were routed to every active channel.
    Completed {
        fields: Vec<FieldState>,
        channels: ChannelResults,
    },
}

impl Outcome {
    pub fn state_name(&self) -> &'static str {
        match self {
            Outcome::NotSubmitted { .. } => "not_submitted",
            Outcome::BlockedBySetup { .. } => "blocked_by_setup",
            Outcome::BlockedByProblems { .. } => "blocked_by_problems",
            Outcome::Completed { .. } => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    pub fn fields(&self) -> &[FieldState] {
        match self {
            Outcome::NotSubmitted { fields }
            | Outcome::BlockedByProblems { fields, .. }
            | Outcome::Completed { fields, .. } => fields,
            Outcome::BlockedBySetup { .. } => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn problems(&self) -> &[GenericProblem] {
        match self {
            Outcome::BlockedByProblems { problems, .. } => problems,
            _ => &[],
        }
    }

    pub fn has_problem(&self, kind: GenericProblemKind) -> bool {
        self.problems().iter().any(|p| p.kind == kind)
    }

    pub fn setup_report(&self) -> Option<&SetupReport> {
        match self {
            Outcome::BlockedBySetup { setup } => Some(setup),
            _ => None,
        }
    }

    pub fn channels(&self) -> Option<&ChannelResults> {
        match self {
            Outcome::Completed { channels, .. } => Some(channels),
            _ => None,
        }
    }
}

/// What each channel did with a completed submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_email: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<DataSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<DataSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<UploadReport>,
}

impl ChannelResults {
    /// Deliveries that were attempted and failed.
    pub fn failures(&self) -> Vec<(&'static str, &Delivery)> {
        [
            ("file", &self.file),
            ("email", &self.email),
            ("confirmation_email", &self.confirmation_email),
        ]
        .into_iter()
        .filter_map(|(name, d)| d.as_ref().map(|d| (name, d)))
        .filter(|(_, d)| d.status == DeliveryStatus::Failed)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Delivery {
    pub fn delivered() -> Self {
        Self {
            status: DeliveryStatus::Delivered,
            detail: None,
        }
    }

    pub fn failed(error: &FormError) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            detail: Some(error.to_string()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Skipped,
            detail: Some(reason.into()),
        }
    }

    pub fn from_result(result: Result<(), FormError>) -> Self {
        match result {
            Ok(()) => Self::delivered(),
            Err(e) => Self::failed(&e),
        }
    }
}
