use crate::config::ShareConfig;
use crate::domain::model::UploadBackend;
use crate::utils::error::{Result, ShareError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `serve-apk.toml`：每個區段與欄位都是選填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub artifact: Option<ArtifactConfig>,
    pub server: Option<ServerConfig>,
    pub upload: Option<UploadConfig>,
    pub qr: Option<QrConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    pub path: Option<PathBuf>,
    pub build_hint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub ip_probe: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    pub endpoint: Option<String>,
    pub backend: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QrConfig {
    pub border: Option<u32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ShareError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ShareError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPLOAD_HOST})，未設定的保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ShareError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn upload_backend(&self) -> Result<Option<UploadBackend>> {
        let Some(name) = self.upload.as_ref().and_then(|u| u.backend.as_deref()) else {
            return Ok(None);
        };
        validation::validate_one_of("upload.backend", name, &UploadBackend::NAMES)?;
        name.parse::<UploadBackend>()
            .map(Some)
            .map_err(|message| ShareError::ConfigError { message })
    }

    /// 將有設定的欄位覆寫到 `config`
    pub fn apply_to(&self, config: &mut ShareConfig) -> Result<()> {
        self.validate()?;

        if let Some(artifact) = &self.artifact {
            if let Some(path) = &artifact.path {
                config.artifact_path = path.clone();
            }
            if let Some(hint) = &artifact.build_hint {
                config.build_hint = hint.clone();
            }
        }
        if let Some(server) = &self.server {
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(probe) = &server.ip_probe {
                config.ip_probe = probe.clone();
            }
        }
        if let Some(endpoint) = self.upload.as_ref().and_then(|u| u.endpoint.as_ref()) {
            config.upload_endpoint = endpoint.clone();
        }
        if let Some(backend) = self.upload_backend()? {
            config.upload_backend = backend;
        }
        if let Some(border) = self.qr.as_ref().and_then(|q| q.border) {
            config.qr_border = border;
        }
        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(artifact) = &self.artifact {
            if let Some(path) = &artifact.path {
                validation::validate_artifact_path("artifact.path", path)?;
            }
            if let Some(hint) = &artifact.build_hint {
                validation::validate_non_empty_string("artifact.build_hint", hint)?;
            }
        }
        if let Some(server) = &self.server {
            if let Some(port) = server.port {
                validation::validate_range("server.port", port, 1, u16::MAX)?;
            }
            if let Some(probe) = &server.ip_probe {
                validation::validate_socket_addr("server.ip_probe", probe)?;
            }
        }
        if let Some(upload) = &self.upload {
            if let Some(endpoint) = &upload.endpoint {
                validation::validate_endpoint("upload.endpoint", endpoint)?;
            }
        }
        self.upload_backend()?;
        if let Some(border) = self.qr.as_ref().and_then(|q| q.border) {
            validation::validate_range("qr.border", border, 0, 16)?;
        }
        Ok(())
    }
}
