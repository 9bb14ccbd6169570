//! File upload fields
//!
//! Validation only looks at the descriptors the host handed over. Storing
//! happens after a submission is accepted, through the `UploadStore`
//! collaborator, and its result is folded back into the representations.

use crate::{Checked, FieldValidator, SetupContext, ValidationContext};
use formgate_core::{
    FieldProblem, FieldSpec, FieldState, FieldValue, FileDescriptor, FormError, ProblemKind,
    RawComponents, RawValue, Representation, Representations, Required, SetupErrorKind,
    SetupReport, UploadOptions, UploadStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Checksum characters used in a versioned filename
const VERSION_PREFIX_LEN: usize = 8;

fn slots(raw: Option<&RawValue>) -> Vec<Option<FileDescriptor>> {
    match raw {
        Some(RawValue::Files(files)) => files
            .iter()
            .map(|f| f.clone().filter(|f| !f.filename.trim().is_empty()))
            .collect(),
        Some(RawValue::File(file)) if !file.filename.trim().is_empty() => vec![Some(file.clone())],
        _ => Vec::new(),
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Last path component, restricted to `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<stem>-<checksum prefix>.<ext>` next to `path`.
pub fn versioned_path(path: &Path, checksum: &str) -> PathBuf {
    let prefix: String = checksum.chars().take(VERSION_PREFIX_LEN).collect();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, prefix, ext.to_string_lossy()),
        None => format!("{}-{}", stem, prefix),
    };
    path.with_file_name(name)
}

pub struct UploadField<'a>(pub &'a UploadOptions);

impl UploadField<'_> {
    fn file_problems(&self, title: &str, file: &FileDescriptor, limit: Option<u64>) -> Vec<FieldProblem> {
        let mut problems = Vec::new();
        let extension = extension_of(&file.filename);

        if self.0.require_extension && extension.is_none() {
            problems.push(FieldProblem::new(
                ProblemKind::ExtensionRequired,
                format!("{}: '{}' has no file extension.", title, file.filename),
            ));
        }

        let allowed = &self.0.allowed_extensions;
        let disallowed = &self.0.disallowed_extensions;
        let rejected = match &extension {
            Some(ext) => {
                (!allowed.is_empty() && !allowed.iter().any(|a| normalize_extension(a) == *ext))
                    || disallowed.iter().any(|d| normalize_extension(d) == *ext)
            }
            None => !allowed.is_empty(),
        };
        if rejected {
            problems.push(FieldProblem::new(
                ProblemKind::ExtensionDisallowed,
                format!("{}: files like '{}' are not accepted.", title, file.filename),
            ));
        }

        if let Some(limit) = limit {
            if file.size > limit {
                problems.push(FieldProblem::new(
                    ProblemKind::FileTooLarge,
                    format!(
                        "{}: '{}' is larger than {} bytes.",
                        title, file.filename, limit
                    ),
                ));
            }
        }

        problems
    }
}

impl FieldValidator for UploadField<'_> {
    fn initial_value(&self, _ctx: &ValidationContext<'_>) -> FieldValue {
        FieldValue::Empty
    }

    fn setup_checks(&self, spec: &FieldSpec, setup: &SetupContext<'_>, report: &mut SetupReport) {
        if !setup.environment.uploads_enabled {
            report.add(
                SetupErrorKind::UnsupportedEnvironment,
                format!("field '{}': the host does not accept file uploads", spec.name),
            );
        }

        match &self.0.directory {
            None => report.add(
                SetupErrorKind::MissingRequiredArgument,
                format!("field '{}' (upload) needs a 'directory'", spec.name),
            ),
            Some(directory) => {
                if let Some(store) = setup.uploads {
                    if !store.is_writable(Path::new(directory)) {
                        report.add(
                            SetupErrorKind::DirectoryNotWritable,
                            format!("field '{}': directory '{}' is not writable", spec.name, directory),
                        );
                    }
                }
            }
        }

        let subfields_valid = match self.0.subfields {
            Some(n) if n.fract() != 0.0 || n < 1.0 => {
                report.add(
                    SetupErrorKind::InvalidUploadConfig,
                    format!("field '{}': subfields must be a whole number of at least 1 ({} given)", spec.name, n),
                );
                false
            }
            _ => true,
        };
        if let Required::Invalid(given) = &spec.required {
            report.add(
                SetupErrorKind::InvalidUploadConfig,
                format!("field '{}': required must be a whole number ({} given)", spec.name, given),
            );
        } else if subfields_valid && spec.required.minimum() as usize > self.0.slot_count() {
            report.add(
                SetupErrorKind::InvalidUploadConfig,
                format!(
                    "field '{}' requires {} files but offers {} slots",
                    spec.name,
                    spec.required.minimum(),
                    self.0.slot_count()
                ),
            );
        }

        if !self.0.allowed_extensions.is_empty()
            && (!self.0.disallowed_extensions.is_empty() || self.0.require_extension)
        {
            report.add(
                SetupErrorKind::IllegalExtensionPolicy,
                format!(
                    "field '{}': an allow-list cannot be combined with a deny-list or require_extension",
                    spec.name
                ),
            );
        }
    }

    fn produces(&self, _representation: Representation) -> bool {
        true
    }

    fn check(&self, spec: &FieldSpec, raw: Option<&RawValue>, ctx: &ValidationContext<'_>) -> Checked {
        let title = spec.display_title();
        let mut slots = slots(raw);
        let mut problems = Vec::new();

        let slot_count = self.0.slot_count();
        while slots.len() > slot_count && matches!(slots.last(), Some(None)) {
            slots.pop();
        }
        if slots.iter().flatten().count() > slot_count {
            problems.push(FieldProblem::new(
                ProblemKind::TooManyUploads,
                format!("{}: at most {} files can be sent.", title, slot_count),
            ));
        }

        let limit = match (self.0.max_size, ctx.environment.max_upload_bytes) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        for file in slots.iter().flatten() {
            problems.extend(self.file_problems(title, file, limit));
        }

        let names: Vec<Option<String>> = slots
            .iter()
            .map(|slot| slot.as_ref().map(|f| f.filename.clone()))
            .collect();
        let count = names.iter().flatten().count();
        let minimum = spec.required.minimum() as usize;
        if count > 0 && count < minimum {
            problems.push(FieldProblem::new(
                ProblemKind::BelowMinimumUploads,
                format!("{}: please send at least {} files.", title, minimum),
            ));
        }

        slots.resize(slot_count.max(slots.len()), None);
        let components = slots
            .iter()
            .map(|slot| slot.as_ref().map(|f| f.filename.clone()))
            .collect();

        Checked {
            sticky: FieldValue::Empty,
            normalized: FieldValue::Files(names),
            problems,
            empty: count == 0,
            representations: Representations {
                rawcomponents: Some(RawComponents::Slots(components)),
                compiled: Some(String::new()),
                presented: Some(String::new()),
            },
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// What happened to the files of one upload field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadReport {
    pub field: String,
    /// Files the submission carried
    pub apparent: usize,
    /// Stored filenames
    pub stored: Vec<String>,
    /// Filename and reason for every file that could not be stored
    pub failed: Vec<(String, String)>,
}

impl UploadReport {
    /// Human-readable summary.
    pub fn summary(&self) -> String {
        if self.apparent == 0 {
            return String::new();
        }
        let mut summary = format!("{} of {} files stored", self.stored.len(), self.apparent);
        if !self.stored.is_empty() {
            summary.push_str(&format!(": {}", self.stored.join(", ")));
        }
        if !self.failed.is_empty() {
            let names: Vec<&str> = self.failed.iter().map(|(name, _)| name.as_str()).collect();
            summary.push_str(&format!(" (failed: {})", names.join(", ")));
        }
        summary
    }

    /// Write compiled (stored names) and presented (summary) into the state.
    pub fn apply(&self, state: &mut FieldState) {
        state.representations.compiled = Some(self.stored.join(", "));
        state.representations.presented = Some(self.summary());
    }
}

/// Copy every submitted file of an upload field into its directory.
///
/// A slot that fails is recorded in the report; the others proceed.
pub fn store_uploads(
    spec: &FieldSpec,
    opts: &UploadOptions,
    raw: Option<&RawValue>,
    store: &dyn UploadStore,
) -> UploadReport {
    let mut report = UploadReport {
        field: spec.name.clone(),
        ..UploadReport::default()
    };
    let Some(directory) = opts.directory.as_deref() else {
        return report;
    };

    for file in slots(raw).into_iter().flatten() {
        report.apparent += 1;
        let name = sanitize_filename(&file.filename);
        let target = Path::new(directory).join(&name);

        match store_one(&file, &target, opts.version_control, store) {
            Ok(()) => {
                tracing::debug!(field = %spec.name, file = %name, "stored upload");
                report.stored.push(name);
            }
            Err(e) => {
                tracing::warn!(field = %spec.name, file = %name, error = %e, "upload not stored");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    report
}

fn store_one(
    file: &FileDescriptor,
    target: &Path,
    version_control: bool,
    store: &dyn UploadStore,
) -> Result<(), FormError> {
    if store.exists(target) {
        let existing = store.checksum_stored(target)?;
        let incoming = store.checksum_upload(&file.temp_ref)?;
        if existing == incoming {
            return Ok(());
        }
        if version_control {
            store.rename(target, &versioned_path(target, &existing))?;
        }
    }
    store.copy(&file.temp_ref, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use formgate_core::{EnvironmentFacts, FieldKind};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn file(name: &str, size: u64) -> FileDescriptor {
        FileDescriptor {
            filename: name.to_string(),
            mime_type: String::new(),
            temp_ref: format!("/tmp/{}", name),
            size,
        }
    }

    fn files(names: &[&str]) -> Option<RawValue> {
        Some(RawValue::Files(names.iter().map(|n| Some(file(n, 10))).collect()))
    }

    fn setup(field: &FieldSpec, environment: &EnvironmentFacts) -> SetupReport {
        let context = SetupContext {
            environment,
            uploads: None,
        };
        let mut report = SetupReport::new();
        crate::setup_checks(field, &context, &mut report);
        report
    }

    /// Upload store over an in-memory map of path -> content.
    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, String>>,
        uploads: HashMap<String, String>,
    }

    impl UploadStore for MemoryStore {
        fn is_writable(&self, _directory: &Path) -> bool {
            true
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn checksum_stored(&self, path: &Path) -> Result<String, FormError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .map(|c| blake_like(c))
                .ok_or_else(|| FormError::Upload("missing".into()))
        }

        fn checksum_upload(&self, temp_ref: &str) -> Result<String, FormError> {
            self.uploads
                .get(temp_ref)
                .map(|c| blake_like(c))
                .ok_or_else(|| FormError::Upload("missing upload".into()))
        }

        fn pending_size(&self, temp_ref: &str) -> Result<u64, FormError> {
            self.uploads
                .get(temp_ref)
                .map(|c| c.len() as u64)
                .ok_or_else(|| FormError::Upload("missing upload".into()))
        }

        fn rename(&self, from: &Path, to: &Path) -> Result<(), FormError> {
            let mut files = self.files.lock().unwrap();
            let content = files.remove(from).ok_or_else(|| FormError::Upload("gone".into()))?;
            files.insert(to.to_path_buf(), content);
            Ok(())
        }

        fn copy(&self, temp_ref: &str, target: &Path) -> Result<(), FormError> {
            let content = self
                .uploads
                .get(temp_ref)
                .cloned()
                .ok_or_else(|| FormError::Upload(format!("no such upload {}", temp_ref)))?;
            self.files.lock().unwrap().insert(target.to_path_buf(), content);
            Ok(())
        }
    }

    fn blake_like(content: &str) -> String {
        format!("{:0>16}", content.len().to_string() + content)
    }

    #[test]
    fn test_extension_policies() {
        let field = spec("name: cv\ntype: upload\ndirectory: /srv\nallowed_extensions: [pdf, .DOC]\n");
        assert!(run(&field, files(&["cv.PDF"]), &settings()).is_acceptable());
        assert!(run(&field, files(&["cv.doc"]), &settings()).is_acceptable());
        assert!(run(&field, files(&["cv.exe"]), &settings()).has_problem(ProblemKind::ExtensionDisallowed));

        let deny = spec("name: cv\ntype: upload\ndirectory: /srv\ndisallowed_extensions: [exe]\nrequire_extension: true\n");
        assert!(setup(&deny, &EnvironmentFacts::default()).is_empty());
        assert!(run(&deny, files(&["README"]), &settings()).has_problem(ProblemKind::ExtensionRequired));
        assert!(run(&deny, files(&["x.EXE"]), &settings()).has_problem(ProblemKind::ExtensionDisallowed));
    }

    #[test]
    fn test_slots_and_minimum() {
        let field = spec("name: photos\ntype: upload\ndirectory: /srv\nsubfields: 3\nrequired: 2\n");
        let one = run(&field, files(&["a.png"]), &settings());
        assert!(one.has_problem(ProblemKind::BelowMinimumUploads));
        assert_eq!(
            one.representations.rawcomponents,
            Some(RawComponents::Slots(vec![Some("a.png".into()), None, None]))
        );

        let four = run(&field, files(&["a", "b", "c", "d"]), &settings());
        assert!(four.has_problem(ProblemKind::TooManyUploads));

        // Unused trailing slots of a larger widget are not files
        let sparse = Some(RawValue::Files(vec![Some(file("a.png", 10)), None, Some(file("b.png", 10)), None]));
        let sparse = run(&field, sparse, &settings());
        assert!(sparse.is_acceptable());
        assert_eq!(
            sparse.representations.rawcomponents,
            Some(RawComponents::Slots(vec![Some("a.png".into()), None, Some("b.png".into())]))
        );

        let none = run(&field, None, &settings());
        assert!(none.required_but_empty);
        assert_eq!(none.sticky, FieldValue::Empty);
    }

    #[test]
    fn test_size_limit() {
        let field = spec("name: cv\ntype: upload\ndirectory: /srv\nmax_size: 100\n");
        let big = Some(RawValue::File(file("cv.pdf", 101)));
        assert!(run(&field, big, &settings()).has_problem(ProblemKind::FileTooLarge));
    }

    #[test]
    fn test_setup_checks() {
        let env = EnvironmentFacts::default();
        assert!(setup(&spec("name: f\ntype: upload\n"), &env)
            .contains(SetupErrorKind::MissingRequiredArgument));
        assert!(setup(&spec("name: f\ntype: upload\ndirectory: d\nsubfields: 1.5\n"), &env)
            .contains(SetupErrorKind::InvalidUploadConfig));
        assert!(setup(&spec("name: f\ntype: upload\ndirectory: d\nrequired: 2\n"), &env)
            .contains(SetupErrorKind::InvalidUploadConfig));
        assert!(setup(
            &spec("name: f\ntype: upload\ndirectory: d\nallowed_extensions: [a]\ndisallowed_extensions: [b]\n"),
            &env
        )
        .contains(SetupErrorKind::IllegalExtensionPolicy));

        let disabled = EnvironmentFacts {
            uploads_enabled: false,
            max_upload_bytes: None,
        };
        assert!(setup(&spec("name: f\ntype: upload\ndirectory: d\n"), &disabled)
            .contains(SetupErrorKind::UnsupportedEnvironment));
    }

    #[test]
    fn test_sanitize_and_version_names() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my cv.pdf"), "my_cv.pdf");
        assert_eq!(sanitize_filename(".."), "upload");
        assert_eq!(
            versioned_path(Path::new("/srv/cv.pdf"), "abcdef0123456789"),
            PathBuf::from("/srv/cv-abcdef01.pdf")
        );
    }

    #[test]
    fn test_store_with_version_control() {
        let field = spec("name: cv\ntype: upload\ndirectory: /srv\nversion_control: true\n");
        let FieldKind::Upload(opts) = &field.kind else { panic!("not an upload") };

        let mut store = MemoryStore::default();
        store.uploads.insert("/tmp/cv.pdf".into(), "new".into());
        store
            .files
            .lock()
            .unwrap()
            .insert(PathBuf::from("/srv/cv.pdf"), "old".into());

        let report = store_uploads(&field, opts, files(&["cv.pdf"]).as_ref(), &store);
        assert_eq!(report.stored, vec!["cv.pdf".to_string()]);
        assert_eq!(store.files.lock().unwrap().len(), 2);
        assert_eq!(report.summary(), "1 of 1 files stored: cv.pdf");
    }

    #[test]
    fn test_store_identical_file_is_not_copied_again() {
        let field = spec("name: cv\ntype: upload\ndirectory: /srv\n");
        let FieldKind::Upload(opts) = &field.kind else { panic!("not an upload") };

        let mut store = MemoryStore::default();
        store.uploads.insert("/tmp/cv.pdf".into(), "same".into());
        store
            .files
            .lock()
            .unwrap()
            .insert(PathBuf::from("/srv/cv.pdf"), "same".into());

        let report = store_uploads(&field, opts, files(&["cv.pdf", "missing.pdf"]).as_ref(), &store);
        assert_eq!(report.apparent, 2);
        assert_eq!(report.stored.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.files.lock().unwrap().len(), 1);
        assert!(report.summary().contains("(failed: missing.pdf)"));
    }
}
