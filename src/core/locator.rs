use crate::domain::model::Artifact;
use crate::utils::error::{Result, ShareError};
use std::path::Path;

pub const DEFAULT_ARTIFACT_PATH: &str = "app/build/outputs/apk/debug/app-debug.apk";
pub const DEFAULT_BUILD_HINT: &str = "./gradlew assembleDebug";

/// 確認 APK 存在；不存在時回傳 `ArtifactNotFound`，不重試
pub fn locate(path: &Path, build_hint: &str) -> Result<Artifact> {
    if !path.is_file() {
        tracing::debug!("No artifact at {}", path.display());
        return Err(ShareError::ArtifactNotFound {
            path: path.to_path_buf(),
            hint: build_hint.to_string(),
        });
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ShareError::InvalidConfigValue {
            field: "artifact.path".to_string(),
            value: path.display().to_string(),
            reason: "File name is not valid UTF-8".to_string(),
        })?
        .to_string();

    tracing::debug!("Found artifact {} at {}", file_name, path.display());
    Ok(Artifact::new(path.to_path_buf(), file_name))
}
