use crate::domain::model::{Artifact, ShareMode, UploadBackend};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use url::Url;

pub trait ConfigProvider: Send + Sync {
    fn artifact_path(&self) -> &Path;
    fn build_hint(&self) -> &str;
    fn port(&self) -> u16;
    fn ip_probe(&self) -> &str;
    fn upload_endpoint(&self) -> &str;
    fn upload_backend(&self) -> UploadBackend;
    fn qr_border(&self) -> u32;
    fn mode(&self) -> ShareMode;
}

/// 上傳 APK 並回傳服務端的原始文字輸出
#[async_trait]
pub trait Uploader: Send + Sync {
    fn endpoint(&self) -> &Url;
    async fn upload(&self, artifact: &Artifact) -> Result<String>;
}
