//! formgate Core: Data Model, Collaborators e Error Model
//!
//! Núcleo compartilhado: configuração imutável do formulário, estado por
//! submissão e contratos dos colaboradores externos.

pub mod channel;
pub mod collaborators;
pub mod context;
pub mod definition;
pub mod error;
pub mod payload;
pub mod report;
pub mod spec;
pub mod state;

pub use channel::{Channel, Representation};
pub use collaborators::{
    EmailMessage, EmailTransport, EnvironmentFacts, FileSink, Identity, StaticIdentity,
    UploadStore,
};
pub use context::SubmissionContext;
pub use definition::{
    ChannelSettings, ConfirmationChannel, EmailChannel, FileChannel, FormDefinition,
    FormSettings, HeaderStyle, TemplateSettings,
};
pub use error::FormError;
pub use payload::{FileDescriptor, RawValue, SubmissionPayload};
pub use report::{SetupErrorKind, SetupReport};
pub use spec::{
    CheckboxOptions, DateLevel, DateOptions, EmailOptions, FieldKind, FieldSpec, FieldType,
    HeadingOptions, HiddenOptions, PoolEntry, RadioOptions, RawPool, Required, SelectOptions,
    TextOptions, TextareaMode, TextareaOptions, UploadOptions, ValuePool,
};
pub use state::{
    DateParts, EmailTarget, FieldProblem, FieldState, FieldValue, GenericProblem,
    GenericProblemKind, ProblemKind, RawComponents, Representations, ResolvedValue,
};

/// Versão do motor formgate
pub const FORMGATE_VERSION: &str = "1.0.0";

/// Prefix of generated heading names; only heading fields may use it.
pub const HEADING_PREFIX: &str = "_heading_";

/// Prefix reserved for internal control fields carried in the payload.
pub const INTERNAL_PREFIX: &str = "_fg_";

/// Payload key holding the identity echoed back by the rendered form.
pub const IDENTITY_FIELD: &str = "_fg_identity";
