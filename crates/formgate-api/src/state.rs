//! Shared server state: the form catalog and its collaborators
use crate::config::ApiConfig;
use crate::error::LoadError;
use crate::metrics::Metrics;
use formgate_core::{EmailTransport, EnvironmentFacts, FormDefinition};
use formgate_engine::{Collaborators, Form};
use formgate_out::{CsvFileSink, FsUploadStore, TracingTransport};
use formgate_policy::AuditLog;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A form together with the sink of its file channel.
pub struct HostedForm {
    pub form: Form,
    pub sink: Option<CsvFileSink>,
}

impl HostedForm {
    pub fn new(definition: FormDefinition, data_dir: &Path) -> Self {
        let sink = definition
            .channels
            .file
            .as_ref()
            .map(|file| CsvFileSink::new(data_dir.join(&file.path)));
        Self {
            form: Form::new(definition),
            sink,
        }
    }
}

pub struct AppState {
    pub forms: BTreeMap<String, HostedForm>,
    pub transport: Arc<dyn EmailTransport>,
    pub uploads: FsUploadStore,
    pub audit: AuditLog,
    pub environment: EnvironmentFacts,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(metrics: Metrics, data_dir: &Path) -> Self {
        Self {
            forms: BTreeMap::new(),
            transport: Arc::new(TracingTransport),
            uploads: FsUploadStore::new()
                .with_root(data_dir)
                .with_temp_dir(data_dir.join("incoming")),
            audit: AuditLog::new(),
            environment: EnvironmentFacts::default(),
            metrics,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn EmailTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Directory pending uploads are read from; nothing outside it is.
    pub fn with_temp_dir(mut self, dir: &Path) -> Self {
        self.uploads = self.uploads.with_temp_dir(dir);
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentFacts) -> Self {
        self.environment = environment;
        self
    }

    /// Register a form; identifiers are unique.
    pub fn add_form(&mut self, hosted: HostedForm) -> Result<(), LoadError> {
        let id = hosted.form.identifier().to_string();
        if self.forms.contains_key(&id) {
            return Err(LoadError::DuplicateIdentifier(id));
        }
        self.forms.insert(id, hosted);
        Ok(())
    }

    /// Load every `*.yaml`/`*.yml` definition under the configured directory.
    pub fn from_config(config: &ApiConfig, metrics: Metrics) -> Result<Self, LoadError> {
        let mut state = Self::new(metrics, &config.data_dir)
            .with_temp_dir(&config.temp_dir)
            .with_environment(EnvironmentFacts {
                uploads_enabled: true,
                max_upload_bytes: config.max_upload_bytes,
            });

        let mut paths: Vec<_> = std::fs::read_dir(&config.forms_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        for path in paths {
            let file = path.to_string_lossy().into_owned();
            let definition =
                FormDefinition::load(&file).map_err(|source| LoadError::Form { file, source })?;
            state.add_form(HostedForm::new(definition, &config.data_dir))?;
        }

        tracing::info!(forms = state.forms.len(), dir = %config.forms_dir.display(), "form catalog loaded");
        Ok(state)
    }

    /// Collaborators of one form for one request.
    pub fn collaborators<'a>(
        &'a self,
        hosted: &'a HostedForm,
        identity: &'a dyn formgate_core::Identity,
    ) -> Collaborators<'a> {
        let mut collaborators = Collaborators::new(identity, &self.audit)
            .with_email(self.transport.as_ref())
            .with_uploads(&self.uploads)
            .with_environment(&self.environment);
        if let Some(sink) = &hosted.sink {
            collaborators = collaborators.with_file_sink(sink);
        }
        collaborators
    }
}
