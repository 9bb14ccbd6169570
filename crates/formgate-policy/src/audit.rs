//! Audit trail generation
//!
//! Records security-relevant submission decisions: forms disabled by setup
//! errors, identity tampering, duplicate submissions and accepted
//! submissions.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: String,

    /// Timestamp (Unix ms)
    pub timestamp: u64,

    /// Type of audit event
    pub event_type: AuditEventType,

    /// Form identifier
    pub form: String,

    /// Human-readable description of the decision
    pub detail: String,

    /// Submitter, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,

    /// Trace ID of the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType, form: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: generate_audit_id(),
            timestamp: current_timestamp(),
            event_type,
            form: form.into(),
            detail: detail.into(),
            submitter: None,
            trace_id: None,
        }
    }

    /// Set the submitter
    pub fn with_submitter(mut self, submitter: Option<String>) -> Self {
        self.submitter = submitter;
        self
    }

    /// Set the trace ID
    pub fn with_trace(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// Type of audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Form refused to operate because of setup errors
    SetupBlocked,
    /// Echoed identity did not match the current submitter
    TamperDetected,
    /// Submitter already has a stored submission
    DuplicateSubmission,
    /// Submission completed
    SubmissionAccepted,
}

/// Destination of audit entries.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// In-memory audit log collector
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    max_entries: usize,
}

impl AuditLog {
    /// Create a new audit log
    pub fn new() -> Self {
        Self::with_max_entries(10000)
    }

    /// Create with a custom max size
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            max_entries: max,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log an entry
    pub fn log(&self, entry: AuditEntry) {
        let mut entries = self.lock();
        entries.push(entry);

        // Trim if over limit
        if entries.len() > self.max_entries {
            let drain_count = entries.len() - self.max_entries;
            entries.drain(0..drain_count);
        }
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    /// Entries of one event type
    pub fn entries_of(&self, event_type: AuditEventType) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Get statistics
    pub fn stats(&self) -> AuditStats {
        let entries = self.lock();
        let count = |kind: AuditEventType| entries.iter().filter(|e| e.event_type == kind).count();

        let total = entries.len();
        let accepted = count(AuditEventType::SubmissionAccepted);
        let rejected = total - accepted;

        AuditStats {
            total,
            setup_blocked: count(AuditEventType::SetupBlocked),
            tampered: count(AuditEventType::TamperDetected),
            duplicates: count(AuditEventType::DuplicateSubmission),
            accepted,
            rejection_rate: if total > 0 { rejected as f64 / total as f64 } else { 0.0 },
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: AuditEntry) {
        self.log(entry);
    }
}

/// Audit sink that only writes to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, entry: AuditEntry) {
        match entry.event_type {
            AuditEventType::SubmissionAccepted => tracing::info!(
                audit_id = %entry.id,
                form = %entry.form,
                submitter = ?entry.submitter,
                "{}", entry.detail
            ),
            _ => tracing::warn!(
                audit_id = %entry.id,
                event = ?entry.event_type,
                form = %entry.form,
                submitter = ?entry.submitter,
                "{}", entry.detail
            ),
        }
    }
}

/// Statistics about audit entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total: usize,
    pub setup_blocked: usize,
    pub tampered: usize,
    pub duplicates: usize,
    pub accepted: usize,
    pub rejection_rate: f64,
}

fn generate_audit_id() -> String {
    format!("aud_{}", Uuid::new_v4().simple())
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
