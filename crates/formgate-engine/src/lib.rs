//! formgate-engine: one request in, one outcome out
//!
//! # Submission Flow
//!
//! ```text
//! FormDefinition ─→ Setup ──(errors)──→ BlockedBySetup
//!                     │
//!              payload present? ──(no)──→ NotSubmitted
//!                     │
//!              identity echo ──(mismatch)──→ BlockedByProblems (tamper)
//!                     │
//!              field validators ──(problems)──→ BlockedByProblems
//!                     │
//!              unique submitter ──(seen)──→ BlockedByProblems (duplicate)
//!                     │
//!              uploads → matrix → channels ──→ Completed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use formgate_engine::{Collaborators, Form};
//! use formgate_core::{StaticIdentity, SubmissionPayload};
//! use formgate_policy::TracingAudit;
//!
//! let form = Form::load("forms/contact.yaml")?;
//! let identity = StaticIdentity::anonymous();
//! let collaborators = Collaborators::new(&identity, &TracingAudit);
//! let payload = SubmissionPayload::new().with_text("name", "Ada");
//!
//! let outcome = form.process(Some(&payload), &form.context(&identity), &collaborators);
//! println!("{}", outcome.state_name());
//! ```

pub mod outcome;
pub mod routing;

pub use outcome::{ChannelResults, Delivery, DeliveryStatus, Outcome};

use formgate_core::{
    Channel, EmailTransport, EnvironmentFacts, FieldKind, FieldProblem, FieldState, FileSink,
    FormDefinition, FormError, GenericProblem, GenericProblemKind, Identity, ProblemKind, RawValue,
    SetupReport, SubmissionContext, SubmissionPayload, UploadStore, IDENTITY_FIELD,
};
use formgate_fields::{initial_state, store_uploads, validate_field, ValidationContext};
use formgate_out::EmailComposer;
use formgate_policy::{validate, AuditEntry, AuditEventType, AuditSink, SetupEnvironment};

// ============================================================================
// Collaborators
// ============================================================================

/// Everything outside the engine a request may touch.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub identity: &'a dyn Identity,
    pub audit: &'a dyn AuditSink,
    pub email: Option<&'a dyn EmailTransport>,
    pub file: Option<&'a dyn FileSink>,
    pub uploads: Option<&'a dyn UploadStore>,
    pub environment: &'a EnvironmentFacts,
}

static DEFAULT_ENVIRONMENT: EnvironmentFacts = EnvironmentFacts {
    uploads_enabled: true,
    max_upload_bytes: None,
};

impl<'a> Collaborators<'a> {
    pub fn new(identity: &'a dyn Identity, audit: &'a dyn AuditSink) -> Self {
        Self {
            identity,
            audit,
            email: None,
            file: None,
            uploads: None,
            environment: &DEFAULT_ENVIRONMENT,
        }
    }

    pub fn with_email(mut self, email: &'a dyn EmailTransport) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_file_sink(mut self, file: &'a dyn FileSink) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_uploads(mut self, uploads: &'a dyn UploadStore) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn with_environment(mut self, environment: &'a EnvironmentFacts) -> Self {
        self.environment = environment;
        self
    }

    fn setup_environment(&self) -> SetupEnvironment<'a> {
        SetupEnvironment {
            facts: self.environment,
            uploads: self.uploads,
            file_sink: self.file,
        }
    }
}

// ============================================================================
// Form
// ============================================================================

/// An immutable form definition plus the request pipeline.
#[derive(Debug, Clone)]
pub struct Form {
    definition: FormDefinition,
}

impl Form {
    pub fn new(definition: FormDefinition) -> Self {
        Self { definition }
    }

    pub fn load(path: &str) -> Result<Self, FormError> {
        Ok(Self::new(FormDefinition::load(path)?))
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn identifier(&self) -> &str {
        &self.definition.identifier
    }

    /// Context of a request made by whoever `identity` names.
    pub fn context(&self, identity: &dyn Identity) -> SubmissionContext {
        SubmissionContext::new(self.identifier(), identity.submitter())
    }

    pub fn setup_report(&self, collaborators: &Collaborators<'_>) -> SetupReport {
        validate(&self.definition, &collaborators.setup_environment())
    }

    /// Fields as shown before anything was submitted.
    pub fn initial_states(&self, ctx: &SubmissionContext, environment: &EnvironmentFacts) -> Vec<FieldState> {
        let validation = self.validation_context(ctx, environment);
        self.definition
            .fields
            .iter()
            .map(|spec| initial_state(spec, &validation))
            .collect()
    }

    fn validation_context<'a>(
        &'a self,
        ctx: &SubmissionContext,
        environment: &'a EnvironmentFacts,
    ) -> ValidationContext<'a> {
        ValidationContext {
            settings: &self.definition.settings,
            environment,
            today: ctx.today(),
        }
    }

    fn audit(&self, collaborators: &Collaborators<'_>, ctx: &SubmissionContext, kind: AuditEventType, detail: impl Into<String>) {
        collaborators.audit.record(
            AuditEntry::new(kind, self.identifier(), detail)
                .with_submitter(ctx.submitter.clone())
                .with_trace(ctx.trace_id.clone()),
        );
    }

    /// Run one request through the pipeline.
    pub fn process(
        &self,
        payload: Option<&SubmissionPayload>,
        ctx: &SubmissionContext,
        collaborators: &Collaborators<'_>,
    ) -> Outcome {
        let setup = self.setup_report(collaborators);
        if !setup.is_empty() {
            self.audit(
                collaborators,
                ctx,
                AuditEventType::SetupBlocked,
                format!("{} setup errors", setup.len()),
            );
            return Outcome::BlockedBySetup { setup };
        }

        let Some(payload) = payload else {
            return Outcome::NotSubmitted {
                fields: self.initial_states(ctx, collaborators.environment),
            };
        };

        if let Some(outcome) = self.check_identity(payload, ctx, collaborators) {
            return outcome;
        }

        let measured = collaborators
            .uploads
            .and_then(|store| measure_uploads(payload, store));
        let payload = measured.as_ref().unwrap_or(payload);

        let validation = self.validation_context(ctx, collaborators.environment);
        let mut fields: Vec<FieldState> = self
            .definition
            .fields
            .iter()
            .map(|spec| {
                let mut state = validate_field(spec, payload.get(&spec.name), &validation);
                if payload.is_malformed(&spec.name) {
                    state.problems.push(FieldProblem::new(
                        ProblemKind::MalformedValue,
                        format!("{}: the submitted value could not be read.", spec.display_title()),
                    ));
                }
                state
            })
            .collect();

        if !fields.iter().all(FieldState::is_acceptable) {
            let problems = self.generic_problems(payload, &fields);
            tracing::info!(
                form = %self.identifier(),
                trace_id = %ctx.trace_id,
                problems = problems.len(),
                "submission has problems"
            );
            return Outcome::BlockedByProblems { problems, fields };
        }

        if let Some(outcome) = self.check_duplicate(ctx, collaborators, &fields) {
            return outcome;
        }

        let channels = self.complete(payload, &mut fields, ctx, collaborators);
        self.audit(collaborators, ctx, AuditEventType::SubmissionAccepted, "submission completed");
        tracing::info!(
            form = %self.identifier(),
            trace_id = %ctx.trace_id,
            failures = channels.failures().len(),
            "submission completed"
        );
        Outcome::Completed { fields, channels }
    }

    // The echoed identity must be the current submitter.
    fn check_identity(
        &self,
        payload: &SubmissionPayload,
        ctx: &SubmissionContext,
        collaborators: &Collaborators<'_>,
    ) -> Option<Outcome> {
        if !self.definition.settings.identity_check {
            return None;
        }

        let echoed = match payload.get(IDENTITY_FIELD) {
            Some(RawValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        };
        if echoed == ctx.submitter.as_deref() {
            return None;
        }

        tracing::warn!(
            form = %self.identifier(),
            trace_id = %ctx.trace_id,
            submitter = ?ctx.submitter,
            echoed = ?echoed,
            "identity mismatch"
        );
        self.audit(
            collaborators,
            ctx,
            AuditEventType::TamperDetected,
            format!("echoed identity {:?} does not match the submitter", echoed),
        );
        Some(Outcome::BlockedByProblems {
            problems: vec![GenericProblem::new(
                GenericProblemKind::SecurityTamperDetected,
                "The submission could not be verified. Please reload the form and try again.",
            )],
            fields: self.initial_states(ctx, collaborators.environment),
        })
    }

    fn generic_problems(&self, payload: &SubmissionPayload, fields: &[FieldState]) -> Vec<GenericProblem> {
        let mut problems = Vec::new();
        let missing: Vec<&str> = self
            .definition
            .fields
            .iter()
            .zip(fields)
            .filter(|(_, state)| state.required_but_empty)
            .map(|(spec, _)| spec.display_title())
            .collect();
        if !missing.is_empty() {
            problems.push(GenericProblem::new(
                GenericProblemKind::IncompleteRequiredFields,
                format!("Please fill in the required fields: {}.", missing.join(", ")),
            ));
        }

        let had_files = self
            .definition
            .fields
            .iter()
            .filter(|spec| matches!(spec.kind, FieldKind::Upload(_)))
            .any(|spec| carries_files(payload.get(&spec.name)));
        if had_files {
            problems.push(GenericProblem::new(
                GenericProblemKind::ReselectUploadsRequired,
                "Please select your files again.",
            ));
        }

        problems
    }

    // Read-then-append: two overlapping submissions of one submitter can both
    // pass. Closing that window belongs to the sink.
    fn check_duplicate(
        &self,
        ctx: &SubmissionContext,
        collaborators: &Collaborators<'_>,
        fields: &[FieldState],
    ) -> Option<Outcome> {
        let channel = self.definition.channels.file.as_ref()?;
        if !channel.unique_submitter {
            return None;
        }
        let submitter = ctx.submitter.as_deref()?;
        let sink = collaborators.file?;

        match sink.contains_submitter(submitter) {
            Ok(false) => None,
            Ok(true) => {
                tracing::info!(form = %self.identifier(), submitter, "duplicate submission");
                self.audit(
                    collaborators,
                    ctx,
                    AuditEventType::DuplicateSubmission,
                    "submitter already has a stored submission",
                );
                Some(Outcome::BlockedByProblems {
                    problems: vec![GenericProblem::new(
                        GenericProblemKind::DuplicateSubmission,
                        "You have already submitted this form.",
                    )],
                    fields: fields.to_vec(),
                })
            }
            Err(e) => {
                tracing::warn!(form = %self.identifier(), error = %e, "earlier submissions could not be read");
                None
            }
        }
    }

    fn complete(
        &self,
        payload: &SubmissionPayload,
        fields: &mut [FieldState],
        ctx: &SubmissionContext,
        collaborators: &Collaborators<'_>,
    ) -> ChannelResults {
        let mut results = ChannelResults::default();
        let form = &self.definition;

        for (spec, state) in form.fields.iter().zip(fields.iter_mut()) {
            let FieldKind::Upload(opts) = &spec.kind else {
                continue;
            };
            let raw = payload.get(&spec.name);
            if !carries_files(raw) {
                continue;
            }
            let Some(store) = collaborators.uploads else {
                tracing::warn!(field = %spec.name, "no upload store, files dropped");
                continue;
            };
            let report = store_uploads(spec, opts, raw, store);
            report.apply(state);
            results.uploads.push(report);
        }
        let fields: &[FieldState] = fields;

        if let Some(channel) = &form.channels.file {
            let data = routing::data_set(form, fields, Channel::File);
            let (header, row) = routing::file_record(channel, &data, ctx);
            results.file = Some(match collaborators.file {
                Some(sink) => Delivery::from_result(sink.append(&header, &row)),
                None => Delivery::skipped("no file sink"),
            });
        }

        let composer = EmailComposer::new();
        if let Some(channel) = &form.channels.email {
            let data = routing::data_set(form, fields, Channel::Email);
            results.email = Some(self.deliver(
                collaborators,
                composer.notification(form, channel, &data, fields),
            ));
        }
        if let Some(channel) = &form.channels.confirmation_email {
            let data = routing::data_set(form, fields, Channel::ConfirmationEmail);
            results.confirmation_email = Some(self.deliver(
                collaborators,
                composer.confirmation(form, channel, &data, fields),
            ));
        }

        if form.channels.screen {
            results.screen = Some(routing::data_set(form, fields, Channel::Screen));
        }
        if form.channels.processing {
            results.processing = Some(routing::data_set(form, fields, Channel::Processing));
        }

        for (channel, delivery) in results.failures() {
            tracing::warn!(
                form = %self.identifier(),
                channel,
                detail = ?delivery.detail,
                "channel delivery failed"
            );
        }
        results
    }

    fn deliver(
        &self,
        collaborators: &Collaborators<'_>,
        message: Result<formgate_core::EmailMessage, FormError>,
    ) -> Delivery {
        let Some(transport) = collaborators.email else {
            return Delivery::skipped("no email transport");
        };
        match message {
            Ok(message) => Delivery::from_result(transport.send(&message)),
            Err(e) => Delivery::failed(&e),
        }
    }
}

/// Copy of `payload` whose file sizes are read from the pending uploads
/// themselves; `None` when it carries no files.
fn measure_uploads(payload: &SubmissionPayload, store: &dyn UploadStore) -> Option<SubmissionPayload> {
    let mut measured = payload.clone();
    let mut any = false;
    for file in measured.files_mut() {
        any = true;
        match store.pending_size(&file.temp_ref) {
            Ok(size) => file.size = size,
            Err(e) => tracing::warn!(file = %file.filename, error = %e, "pending upload not measured"),
        }
    }
    any.then_some(measured)
}

fn carries_files(raw: Option<&RawValue>) -> bool {
    match raw {
        Some(RawValue::Files(files)) => files
            .iter()
            .flatten()
            .any(|f| !f.filename.trim().is_empty()),
        Some(RawValue::File(file)) => !file.filename.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_core::{FileDescriptor, StaticIdentity};
    use formgate_policy::AuditLog;

    const FORM: &str = r#"
identifier: quick
settings:
  identity_check: true
fields:
  - {name: name, type: text, required: true}
  - {name: cv, type: upload, directory: /tmp}
"#;

    fn form() -> Form {
        Form::new(FormDefinition::from_yaml(FORM).unwrap())
    }

    #[test]
    fn test_not_submitted_shows_defaults() {
        let form = form();
        let identity = StaticIdentity::anonymous();
        let audit = AuditLog::new();
        let collaborators = Collaborators::new(&identity, &audit);

        let outcome = form.process(None, &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "not_submitted");
        assert_eq!(outcome.fields().len(), 2);
        assert!(audit.is_empty());
    }

    #[test]
    fn test_identity_mismatch_is_tamper() {
        let form = form();
        let identity = StaticIdentity::user("ada");
        let audit = AuditLog::new();
        let collaborators = Collaborators::new(&identity, &audit);
        let payload = SubmissionPayload::new()
            .with_text(IDENTITY_FIELD, "mallory")
            .with_text("name", "Ada");

        let outcome = form.process(Some(&payload), &form.context(&identity), &collaborators);
        assert!(outcome.has_problem(GenericProblemKind::SecurityTamperDetected));
        assert_eq!(audit.entries_of(AuditEventType::TamperDetected).len(), 1);
        // Field validation did not run
        assert!(outcome.fields().iter().all(|f| f.problems.is_empty()));
    }

    #[test]
    fn test_problems_ask_to_reselect_files() {
        let form = form();
        let identity = StaticIdentity::user("ada");
        let audit = AuditLog::new();
        let collaborators = Collaborators::new(&identity, &audit);
        let payload = SubmissionPayload::new()
            .with_text(IDENTITY_FIELD, "ada")
            .with_text("name", "  ")
            .with(
                "cv",
                RawValue::File(FileDescriptor {
                    filename: "cv.pdf".into(),
                    mime_type: "application/pdf".into(),
                    temp_ref: "t1".into(),
                    size: 10,
                }),
            );

        let outcome = form.process(Some(&payload), &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "blocked_by_problems");
        assert!(outcome.has_problem(GenericProblemKind::IncompleteRequiredFields));
        assert!(outcome.has_problem(GenericProblemKind::ReselectUploadsRequired));
        assert!(outcome.problems()[0].message.contains("name"));
    }

    /// Store that reports every pending upload with one fixed size.
    struct SizedStore(u64);

    impl UploadStore for SizedStore {
        fn is_writable(&self, _directory: &std::path::Path) -> bool {
            true
        }

        fn exists(&self, _path: &std::path::Path) -> bool {
            false
        }

        fn checksum_stored(&self, _path: &std::path::Path) -> Result<String, FormError> {
            Err(FormError::Upload("nothing stored".into()))
        }

        fn checksum_upload(&self, _temp_ref: &str) -> Result<String, FormError> {
            Err(FormError::Upload("not hashed".into()))
        }

        fn pending_size(&self, _temp_ref: &str) -> Result<u64, FormError> {
            Ok(self.0)
        }

        fn rename(&self, _from: &std::path::Path, _to: &std::path::Path) -> Result<(), FormError> {
            Ok(())
        }

        fn copy(&self, _temp_ref: &str, _target: &std::path::Path) -> Result<(), FormError> {
            Ok(())
        }
    }

    #[test]
    fn test_file_size_comes_from_the_store() {
        let form = Form::new(
            FormDefinition::from_yaml(
                "identifier: sized\nfields:\n  - {name: cv, type: upload, directory: /tmp, max_size: 100}\n",
            )
            .unwrap(),
        );
        let identity = StaticIdentity::anonymous();
        let audit = AuditLog::new();
        let store = SizedStore(5_000);
        let collaborators = Collaborators::new(&identity, &audit).with_uploads(&store);
        let payload = SubmissionPayload::new().with(
            "cv",
            RawValue::File(FileDescriptor {
                filename: "cv.pdf".into(),
                mime_type: "application/pdf".into(),
                temp_ref: "t1".into(),
                size: 10,
            }),
        );

        let outcome = form.process(Some(&payload), &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "blocked_by_problems");
        assert!(outcome.field("cv").unwrap().has_problem(ProblemKind::FileTooLarge));

        let small = SizedStore(50);
        let collaborators = Collaborators::new(&identity, &audit).with_uploads(&small);
        let outcome = form.process(Some(&payload), &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "completed");
    }

    #[test]
    fn test_unreadable_value_is_a_field_problem() {
        let form = Form::new(
            FormDefinition::from_yaml(
                "identifier: c\nfields:\n  - {name: name, type: text}\n  - {name: age, type: text}\n",
            )
            .unwrap(),
        );
        let identity = StaticIdentity::anonymous();
        let audit = AuditLog::new();
        let collaborators = Collaborators::new(&identity, &audit);
        let request = serde_json::json!({ "c": { "name": "", "age": { "years": [42] } } });
        let payload = SubmissionPayload::from_request(&request, "c");

        let outcome = form.process(payload.as_ref(), &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "blocked_by_problems");
        assert!(outcome.field("age").unwrap().has_problem(ProblemKind::MalformedValue));
        assert!(outcome.field("name").unwrap().problems.is_empty());
    }

    #[test]
    fn test_numbers_are_submitted_values() {
        let form = Form::new(
            FormDefinition::from_yaml(
                "identifier: c\nfields:\n  - {name: name, type: text, required: true}\n  - {name: age, type: text}\n",
            )
            .unwrap(),
        );
        let identity = StaticIdentity::anonymous();
        let audit = AuditLog::new();
        let collaborators = Collaborators::new(&identity, &audit);
        let request = serde_json::json!({ "c": { "name": "", "age": 42 } });
        let payload = SubmissionPayload::from_request(&request, "c");

        let outcome = form.process(payload.as_ref(), &form.context(&identity), &collaborators);
        assert_eq!(outcome.state_name(), "blocked_by_problems");
        assert!(outcome.has_problem(GenericProblemKind::IncompleteRequiredFields));
        assert_eq!(outcome.field("age").unwrap().representations.compiled.as_deref(), Some("42"));
    }

    #[test]
    fn test_carries_files() {
        assert!(!carries_files(None));
        assert!(!carries_files(Some(&RawValue::Files(vec![None, None]))));
        assert!(!carries_files(Some(&RawValue::Text("cv.pdf".into()))));
    }
}
