//! formgate-out: what leaves the engine after a completed submission
//!
//! - `DataSet`: the resolved values one channel receives
//! - `EmailComposer`: Handlebars subject/body composition and recipient resolution
//! - Reference collaborators: `CsvFileSink`, `FsUploadStore`,
//!   `RecordingTransport`, `TracingTransport`
//!
//! # Example
//!
//! ```ignore
//! use formgate_out::{CsvFileSink, EmailComposer};
//!
//! let sink = CsvFileSink::new("submissions.csv");
//! let composer = EmailComposer::new();
//! let message = composer.notification(&form, channel, &data, &states)?;
//! ```

pub mod csv;
pub mod dataset;
pub mod mail;
pub mod renderer;
pub mod transport;
pub mod uploads;

pub use csv::CsvFileSink;
pub use dataset::{DataEntry, DataSet};
pub use mail::EmailComposer;
pub use renderer::MailRenderer;
pub use transport::{RecordingTransport, TracingTransport};
pub use uploads::FsUploadStore;
