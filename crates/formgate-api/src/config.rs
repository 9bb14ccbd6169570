//! Server configuration from the environment
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address (`FORMGATE_ADDR`)
    pub addr: String,
    /// Directory of form definitions (`FORMGATE_FORMS`)
    pub forms_dir: PathBuf,
    /// Base of relative CSV and upload paths (`FORMGATE_DATA`)
    pub data_dir: PathBuf,
    /// Where the fronting proxy leaves uploaded files (`FORMGATE_TEMP`,
    /// default `<data_dir>/incoming`)
    pub temp_dir: PathBuf,
    /// Per-file upload limit of the host (`FORMGATE_MAX_UPLOAD`)
    pub max_upload_bytes: Option<u64>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir: PathBuf = var("FORMGATE_DATA").unwrap_or_else(|| ".".into()).into();
        let temp_dir = var("FORMGATE_TEMP")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("incoming"));

        Self {
            addr: var("FORMGATE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            forms_dir: var("FORMGATE_FORMS").unwrap_or_else(|| "forms".into()).into(),
            data_dir,
            temp_dir,
            max_upload_bytes: var("FORMGATE_MAX_UPLOAD").and_then(|v| v.trim().parse().ok()),
        }
    }
}
