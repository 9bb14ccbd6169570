//! Filesystem upload store
//!
//! Copies pending uploads (the host's temporary files) into their target
//! directory. Checksums are blake3 hex digests.
//!
//! Temporary references arrive with the submission, so they are only ever
//! resolved as plain relative paths under the configured temporary
//! directory. Without one, no pending upload can be read.

use formgate_core::{FormError, UploadStore};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct FsUploadStore {
    root: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
}

impl FsUploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative upload directories against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Resolve relative temporary references against `dir`.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn target(&self, path: &Path) -> PathBuf {
        join(self.root.as_deref(), path)
    }

    fn pending(&self, temp_ref: &str) -> Result<PathBuf, FormError> {
        let relative = Path::new(temp_ref);
        let plain = !temp_ref.trim().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(FormError::Upload(format!(
                "temporary reference '{}' is outside the upload area",
                temp_ref
            )));
        }

        let dir = self.temp_dir.as_deref().ok_or_else(|| {
            FormError::Upload("no temporary upload directory configured".to_string())
        })?;
        let base = dir
            .canonicalize()
            .map_err(|e| FormError::Upload(format!("cannot open {}: {}", dir.display(), e)))?;
        let path = base
            .join(relative)
            .canonicalize()
            .map_err(|e| FormError::Upload(format!("pending upload {} missing: {}", temp_ref, e)))?;

        // Symlinks inside the temporary directory may still point elsewhere.
        if !path.starts_with(&base) {
            return Err(FormError::Upload(format!(
                "temporary reference '{}' is outside the upload area",
                temp_ref
            )));
        }
        Ok(path)
    }
}

fn join(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn checksum(path: &Path) -> Result<String, FormError> {
    let mut file = File::open(path)
        .map_err(|e| FormError::Upload(format!("cannot read {}: {}", path.display(), e)))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| FormError::Upload(format!("cannot hash {}: {}", path.display(), e)))?;
    Ok(hasher.finalize().to_hex().to_string())
}

impl UploadStore for FsUploadStore {
    fn is_writable(&self, directory: &Path) -> bool {
        fs::metadata(self.target(directory))
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }

    fn exists(&self, path: &Path) -> bool {
        self.target(path).is_file()
    }

    fn checksum_stored(&self, path: &Path) -> Result<String, FormError> {
        checksum(&self.target(path))
    }

    fn checksum_upload(&self, temp_ref: &str) -> Result<String, FormError> {
        checksum(&self.pending(temp_ref)?)
    }

    fn pending_size(&self, temp_ref: &str) -> Result<u64, FormError> {
        let path = self.pending(temp_ref)?;
        fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| FormError::Upload(format!("cannot stat {}: {}", path.display(), e)))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FormError> {
        let (from, to) = (self.target(from), self.target(to));
        fs::rename(&from, &to).map_err(|e| {
            FormError::Upload(format!(
                "cannot rename {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })
    }

    fn copy(&self, temp_ref: &str, target: &Path) -> Result<(), FormError> {
        let source = self.pending(temp_ref)?;
        let target = self.target(target);

        let mut input = File::open(&source)
            .map_err(|e| FormError::Upload(format!("pending upload {} missing: {}", temp_ref, e)))?;
        let mut output = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&target)
            .map_err(|e| FormError::Upload(format!("cannot create {}: {}", target.display(), e)))?;
        io::copy(&mut input, &mut output)
            .map_err(|e| FormError::Upload(format!("cannot copy to {}: {}", target.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_and_checksum() {
        let temp = tempfile::tempdir().unwrap();
        let pending = temp.path().join("incoming");
        let target = temp.path().join("stored");
        fs::create_dir(&pending).unwrap();
        fs::create_dir(&target).unwrap();
        fs::write(pending.join("upload-1"), b"slides").unwrap();

        let store = FsUploadStore::new()
            .with_root(&target)
            .with_temp_dir(&pending);

        assert!(store.is_writable(Path::new(".")));
        assert!(!store.exists(Path::new("talk.pdf")));
        store.copy("upload-1", Path::new("talk.pdf")).unwrap();
        assert!(store.exists(Path::new("talk.pdf")));

        assert_eq!(
            store.checksum_stored(Path::new("talk.pdf")).unwrap(),
            store.checksum_upload("upload-1").unwrap()
        );
        assert_eq!(
            store.checksum_upload("upload-1").unwrap(),
            blake3::hash(b"slides").to_hex().to_string()
        );
    }

    #[test]
    fn test_pending_size_reads_the_file() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("upload-1"), b"twelve bytes").unwrap();
        let store = FsUploadStore::new().with_temp_dir(temp.path());

        assert_eq!(store.pending_size("upload-1").unwrap(), 12);
        assert!(store.pending_size("upload-2").is_err());
    }

    #[test]
    fn test_references_cannot_leave_the_temp_dir() {
        let temp = tempfile::tempdir().unwrap();
        let pending = temp.path().join("incoming");
        let stored = temp.path().join("stored");
        fs::create_dir(&pending).unwrap();
        fs::create_dir(&stored).unwrap();
        fs::write(temp.path().join("secret.txt"), b"server secret").unwrap();

        let store = FsUploadStore::new()
            .with_root(&stored)
            .with_temp_dir(&pending);

        let absolute = temp.path().join("secret.txt");
        let absolute = absolute.to_string_lossy();
        for temp_ref in [&*absolute, "../secret.txt", "./../secret.txt", ""] {
            let err = store.copy(temp_ref, Path::new("a.txt")).unwrap_err();
            assert!(err.to_string().starts_with("UPLOAD/"), "{}", temp_ref);
            assert!(store.checksum_upload(temp_ref).is_err());
            assert!(store.pending_size(temp_ref).is_err());
        }
        assert!(!stored.join("a.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_temp_dir_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let pending = temp.path().join("incoming");
        fs::create_dir(&pending).unwrap();
        fs::write(temp.path().join("secret.txt"), b"server secret").unwrap();
        std::os::unix::fs::symlink(temp.path().join("secret.txt"), pending.join("link")).unwrap();

        let store = FsUploadStore::new()
            .with_root(temp.path())
            .with_temp_dir(&pending);
        assert!(store.copy("link", Path::new("b.txt")).is_err());
        assert!(!temp.path().join("b.txt").exists());
    }

    #[test]
    fn test_no_temp_dir_reads_nothing() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("upload-1"), b"x").unwrap();
        let store = FsUploadStore::new().with_root(temp.path());
        assert!(store.copy("upload-1", Path::new("x.pdf")).is_err());
    }

    #[test]
    fn test_missing_upload_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let store = FsUploadStore::new().with_root(temp.path());
        let err = store.copy("/nonexistent/upload", Path::new("x.pdf")).unwrap_err();
        assert!(err.to_string().starts_with("UPLOAD/"));
    }
}
