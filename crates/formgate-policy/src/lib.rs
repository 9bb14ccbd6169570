//! formgate Policy: setup validation, presentation matrix and audit trail
//!
//! Everything that decides whether a form may operate at all, and which
//! representation of a value each output channel receives.
//!
//! # Architecture
//!
//! ```text
//! FormDefinition → identifier / names / reserved prefixes
//!                → per-field checks (formgate-fields)
//!                → output overrides ↔ PresentationMatrix
//!                → template placeholders
//!                → channel routing
//!                        ↓
//!                   SetupReport (empty = operable)
//! ```
//!
//! # Example
//!
//! ```
//! use formgate_core::{EnvironmentFacts, FormDefinition};
//! use formgate_policy::{validate, SetupEnvironment};
//!
//! let form = FormDefinition::from_yaml(
//!     "identifier: demo\nfields:\n  - {name: a, type: text}\n  - {name: a, type: text}\n",
//! ).unwrap();
//!
//! let facts = EnvironmentFacts::default();
//! let report = validate(&form, &SetupEnvironment::new(&facts));
//! assert!(!report.is_empty());
//! println!("{}", report);
//! ```

pub mod audit;
pub mod channels;
pub mod matrix;
pub mod setup;
pub mod template;

pub use audit::{AuditEntry, AuditEventType, AuditLog, AuditSink, AuditStats, TracingAudit};
pub use matrix::{allowed, resolve};
pub use setup::{validate, SetupEnvironment};
