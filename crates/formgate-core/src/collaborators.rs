//! Collaborator contracts: everything outside the validation core
//!
//! The engine never touches mail servers, files or sessions itself. Hosts
//! plug implementations of these traits in; `formgate-out` ships reference
//! implementations.

use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supplies the authenticated submitter, if any.
pub trait Identity: Send + Sync {
    fn submitter(&self) -> Option<String>;
}

/// Identity known up front (tests, hosts that resolved it already).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }
}

impl Identity for StaticIdentity {
    fn submitter(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A composed outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
}

/// Delivers email.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), FormError>;
}

/// Durable append-only store of one row per submission.
pub trait FileSink: Send + Sync {
    fn is_writable(&self) -> bool;

    /// Whether a row with this submitter already exists.
    ///
    /// Callers pair this with `append`; nothing serializes the two, so two
    /// overlapping submissions of the same submitter can both pass.
    fn contains_submitter(&self, submitter: &str) -> Result<bool, FormError>;

    /// Append `row`; write `header` first when the store is new.
    fn append(&self, header: &[String], row: &[String]) -> Result<(), FormError>;
}

/// Moves uploaded bytes from the host's temporary area to their target.
pub trait UploadStore: Send + Sync {
    fn is_writable(&self, directory: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool;

    /// Checksum of an already stored file.
    fn checksum_stored(&self, path: &Path) -> Result<String, FormError>;

    /// Checksum of a pending upload.
    fn checksum_upload(&self, temp_ref: &str) -> Result<String, FormError>;

    /// Size in bytes of a pending upload, as stored by the host.
    fn pending_size(&self, temp_ref: &str) -> Result<u64, FormError>;

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FormError>;

    fn copy(&self, temp_ref: &str, target: &Path) -> Result<(), FormError>;
}

/// Capabilities of the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentFacts {
    pub uploads_enabled: bool,
    #[serde(default)]
    pub max_upload_bytes: Option<u64>,
}

impl Default for EnvironmentFacts {
    fn default() -> Self {
        Self {
            uploads_enabled: true,
            max_upload_bytes: None,
        }
    }
}
