//! Submission Context: estado compartilhado durante uma requisição
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub form: String,
    pub trace_id: String,
    pub submitter: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl SubmissionContext {
    pub fn new(form: impl Into<String>, submitter: Option<String>) -> Self {
        Self {
            form: form.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
            submitter,
            received_at: Utc::now(),
        }
    }

    /// Pin the clock (date defaults such as `today` depend on it).
    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.received_at.date_naive()
    }
}
