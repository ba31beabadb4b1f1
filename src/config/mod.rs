pub mod toml_config;

use crate::core::locator::{DEFAULT_ARTIFACT_PATH, DEFAULT_BUILD_HINT};
use crate::core::network::{DEFAULT_IP_PROBE, DEFAULT_PORT};
use crate::core::qr::DEFAULT_BORDER;
use crate::core::uploader::DEFAULT_UPLOAD_ENDPOINT;
use crate::core::ConfigProvider;
use crate::domain::model::{ShareMode, UploadBackend};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml_config::TomlConfig;

/// 未指定 `--config` 時，工作目錄下若有此檔會自動載入
pub const DEFAULT_CONFIG_FILE: &str = "serve-apk.toml";

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "serve-apk")]
#[command(about = "Share a debug APK with a nearby device through a QR code")]
pub struct CliConfig {
    /// Upload to a temporary public host instead of serving on the local network
    #[arg(long)]
    pub upload: bool,

    /// TOML file overriding the built-in defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn share_config(&self) -> Result<ShareConfig> {
        ShareConfig::load(self.config.as_deref(), self.upload)
    }
}

/// Effective settings after defaults, TOML overrides and flags are merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    pub artifact_path: PathBuf,
    pub build_hint: String,
    pub port: u16,
    pub ip_probe: String,
    pub upload_endpoint: String,
    pub upload_backend: UploadBackend,
    pub qr_border: u32,
    pub mode: ShareMode,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            build_hint: DEFAULT_BUILD_HINT.to_string(),
            port: DEFAULT_PORT,
            ip_probe: DEFAULT_IP_PROBE.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            upload_backend: UploadBackend::default(),
            qr_border: DEFAULT_BORDER,
            mode: ShareMode::default(),
        }
    }
}

impl ShareConfig {
    /// 優先順序：內建預設 < TOML 檔 < 命令列
    pub fn load(config_path: Option<&Path>, upload: bool) -> Result<Self> {
        let mut config = Self::default();

        let toml = match config_path {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Some(TomlConfig::from_file(DEFAULT_CONFIG_FILE)?)
            }
            None => None,
        };
        if let Some(toml) = toml {
            tracing::debug!("Applying configuration overrides: {:?}", toml);
            toml.apply_to(&mut config)?;
        }

        if upload {
            config.mode = ShareMode::Upload;
        }
        Ok(config)
    }
}

impl ConfigProvider for ShareConfig {
    fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    fn build_hint(&self) -> &str {
        &self.build_hint
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn ip_probe(&self) -> &str {
        &self.ip_probe
    }

    fn upload_endpoint(&self) -> &str {
        &self.upload_endpoint
    }

    fn upload_backend(&self) -> UploadBackend {
        self.upload_backend
    }

    fn qr_border(&self) -> u32 {
        self.qr_border
    }

    fn mode(&self) -> ShareMode {
        self.mode
    }
}

impl Validate for ShareConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_artifact_path("artifact.path", &self.artifact_path)?;
        validation::validate_non_empty_string("artifact.build_hint", &self.build_hint)?;
        validation::validate_range("server.port", self.port, 1, u16::MAX)?;
        validation::validate_socket_addr("server.ip_probe", &self.ip_probe)?;
        validation::validate_endpoint("upload.endpoint", &self.upload_endpoint)?;
        validation::validate_range("qr.border", self.qr_border, 0, 16)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ShareConfig::default();
        assert_eq!(
            config.artifact_path,
            PathBuf::from("app/build/outputs/apk/debug/app-debug.apk")
        );
        assert_eq!(config.port, 8000);
        assert_eq!(config.ip_probe, "8.8.8.8:80");
        assert_eq!(config.upload_endpoint, "https://transfer.sh");
        assert_eq!(config.upload_backend, UploadBackend::Curl);
        assert_eq!(config.qr_border, 2);
        assert_eq!(config.mode, ShareMode::LocalServer);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_with_file_and_upload_flag() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[server]
port = 9000

[upload]
backend = "http"
"#,
            )
            .unwrap();

        let config = ShareConfig::load(Some(temp_file.path()), true).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.upload_backend, UploadBackend::Http);
        assert_eq!(config.mode, ShareMode::Upload);
        assert_eq!(config.qr_border, 2);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(ShareConfig::load(Some(&missing), false).is_err());
    }

    #[test]
    fn test_validation_rejects_port_zero() {
        let config = ShareConfig {
            port: 0,
            ..ShareConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_flags() {
        let cli = CliConfig::try_parse_from(["serve-apk", "--upload", "-v"]).unwrap();
        assert!(cli.upload);
        assert!(cli.verbose);
        assert!(cli.config.is_none());

        let cli = CliConfig::try_parse_from(["serve-apk"]).unwrap();
        assert!(!cli.upload);
        assert!(CliConfig::try_parse_from(["serve-apk", "--port", "1"]).is_err());
    }
}
