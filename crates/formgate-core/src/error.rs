//! Unified Error Model
use thiserror::Error;

/// Failures of loading and of the external collaborators. Setup errors and
/// field problems are values (`SetupReport`, `FieldProblem`), not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("CONFIG/{0}")]
    Config(String),

    #[error("IO/{0}")]
    Io(String),

    #[error("SINK/{0}")]
    Sink(String),

    #[error("MAIL/{0}")]
    Mail(String),

    #[error("UPLOAD/{0}")]
    Upload(String),

    #[error("TEMPLATE/{0}")]
    Template(String),
}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        FormError::Io(err.to_string())
    }
}
