use crate::domain::model::{Artifact, UploadBackend};
use crate::domain::ports::Uploader;
use crate::utils::error::{Result, ShareError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tokio::process::Command;
use url::Url;

pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://transfer.sh";

/// 上傳目標：`<endpoint>/<file-name>`
pub fn upload_target(endpoint: &Url, file_name: &str) -> Result<Url> {
    let mut target = endpoint.clone();
    target
        .path_segments_mut()
        .map_err(|_| ShareError::InvalidConfigValue {
            field: "upload.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: "Endpoint cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .push(file_name);
    Ok(target)
}

/// First `http(s)://<authority>/...` link in `output`, where `authority` is
/// the upload host (with port, if the endpoint has one).
pub fn extract_upload_url(authority: &str, output: &str) -> Option<String> {
    let pattern = format!(r"https?://{}/\S+", regex::escape(authority));
    let re = Regex::new(&pattern).ok()?;
    re.find(output).map(|m| m.as_str().to_string())
}

pub async fn upload_and_extract<U: Uploader + ?Sized>(
    uploader: &U,
    artifact: &Artifact,
) -> Result<String> {
    let authority = uploader.endpoint().authority().to_string();
    tracing::info!("📤 Uploading {} to {}", artifact.file_name(), authority);

    let output = uploader.upload(artifact).await?;
    tracing::debug!("Uploader output: {}", output.trim());

    match extract_upload_url(&authority, &output) {
        Some(url) => {
            tracing::info!("✅ Upload complete: {}", url);
            Ok(url)
        }
        None => Err(ShareError::UploadUrlNotFound {
            host: authority,
            output,
        }),
    }
}

pub fn build_uploader(backend: UploadBackend, endpoint: &str) -> Result<Box<dyn Uploader>> {
    let endpoint = Url::parse(endpoint)?;
    let uploader: Box<dyn Uploader> = match backend {
        UploadBackend::Curl => Box::new(CurlUploader::new(endpoint)),
        UploadBackend::Http => Box::new(HttpUploader::new(endpoint)),
    };
    Ok(uploader)
}

/// 呼叫外部 curl，以 stdout 作為輸出
#[derive(Debug, Clone)]
pub struct CurlUploader {
    endpoint: Url,
    program: String,
}

impl CurlUploader {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            program: "curl".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl Uploader for CurlUploader {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn upload(&self, artifact: &Artifact) -> Result<String> {
        let target = upload_target(&self.endpoint, artifact.file_name())?;
        tracing::debug!("Running {} --upload-file {} {}", self.program, artifact.path().display(), target);

        let output = Command::new(&self.program)
            .arg("--silent")
            .arg("--show-error")
            .arg("--upload-file")
            .arg(artifact.path())
            .arg(target.as_str())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ShareError::UploadToolMissing {
                    program: self.program.clone(),
                },
                _ => ShareError::Network(e),
            })?;

        if !output.status.success() {
            return Err(ShareError::UploadCommand {
                host: self.endpoint.authority().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 不依賴 curl 的 HTTP PUT 版本
#[derive(Debug, Clone)]
pub struct HttpUploader {
    endpoint: Url,
    client: Client,
}

impl HttpUploader {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn upload(&self, artifact: &Artifact) -> Result<String> {
        let target = upload_target(&self.endpoint, artifact.file_name())?;
        let body = tokio::fs::read(artifact.path())
            .await
            .map_err(|source| ShareError::ArtifactUnreadable {
                path: artifact.path().to_path_buf(),
                source,
            })?;
        tracing::debug!("PUT {} ({} bytes)", target, body.len());

        let response = self.client.put(target).body(body).send().await?;
        tracing::debug!("Upload response status: {}", response.status());

        let text = response.error_for_status()?.text().await?;
        Ok(text)
    }
}
