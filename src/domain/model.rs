use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 已確認存在的 APK。只能經由 `core::locator::locate` 取得。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    file_name: String,
}

impl Artifact {
    pub(crate) fn new(path: PathBuf, file_name: String) -> Self {
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The folder served in local mode.
    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareMode {
    #[default]
    LocalServer,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadBackend {
    #[default]
    Curl,
    Http,
}

impl UploadBackend {
    pub const NAMES: [&'static str; 2] = ["curl", "http"];
}

impl FromStr for UploadBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "curl" => Ok(UploadBackend::Curl),
            "http" => Ok(UploadBackend::Http),
            other => Err(format!("unknown upload backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShareOutcome {
    pub mode: ShareMode,
    pub url: String,
    pub artifact: Artifact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_directory() {
        let artifact = Artifact::new(
            PathBuf::from("app/build/outputs/apk/debug/app-debug.apk"),
            "app-debug.apk".to_string(),
        );
        assert_eq!(artifact.directory(), Path::new("app/build/outputs/apk/debug"));

        let bare = Artifact::new(PathBuf::from("app-debug.apk"), "app-debug.apk".to_string());
        assert_eq!(bare.directory(), Path::new("."));
    }

    #[test]
    fn test_upload_backend_from_str() {
        assert_eq!("curl".parse::<UploadBackend>(), Ok(UploadBackend::Curl));
        assert_eq!("http".parse::<UploadBackend>(), Ok(UploadBackend::Http));
        assert!("wget".parse::<UploadBackend>().is_err());
    }
}
