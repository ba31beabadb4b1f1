use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("APK not found at {}. Build it with {hint} first.", path.display())]
    ArtifactNotFound { path: PathBuf, hint: String },

    #[error("Upload failed: no {host} URL in uploader output")]
    UploadUrlNotFound { host: String, output: String },

    #[error("Cannot read {}: {source}", path.display())]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload tool '{program}' is not installed")]
    UploadToolMissing { program: String },

    #[error("Upload to {host} exited with {status}: {stderr}")]
    UploadCommand {
        host: String,
        status: String,
        stderr: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("QR encoding failed: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Artifact,
    Upload,
    Network,
    Rendering,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ShareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ShareError::ArtifactNotFound { .. } | ShareError::ArtifactUnreadable { .. } => {
                ErrorCategory::Artifact
            }
            ShareError::UploadUrlNotFound { .. }
            | ShareError::UploadToolMissing { .. }
            | ShareError::UploadCommand { .. }
            | ShareError::Http(_) => ErrorCategory::Upload,
            ShareError::Network(_) => ErrorCategory::Network,
            ShareError::QrEncode(_) => ErrorCategory::Rendering,
            ShareError::UrlParse(_)
            | ShareError::ConfigError { .. }
            | ShareError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ShareError::QrEncode(_) => ErrorSeverity::Medium,
            ShareError::ArtifactNotFound { .. }
            | ShareError::ArtifactUnreadable { .. }
            | ShareError::UploadUrlNotFound { .. }
            | ShareError::UploadToolMissing { .. }
            | ShareError::UploadCommand { .. }
            | ShareError::Http(_) => ErrorSeverity::High,
            ShareError::UrlParse(_)
            | ShareError::ConfigError { .. }
            | ShareError::InvalidConfigValue { .. } => ErrorSeverity::High,
            ShareError::Network(_) => ErrorSeverity::Critical,
        }
    }

    /// 每一種失敗都以狀態碼 1 結束，Ctrl+C 不算錯誤
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ShareError::ArtifactNotFound { hint, .. } => {
                format!("APK not found. Build it with {} first.", hint)
            }
            ShareError::UploadUrlNotFound { output, .. } => {
                format!("Upload failed: {}", output.trim())
            }
            ShareError::UploadToolMissing { program } => {
                format!("Upload failed: '{}' was not found on PATH", program)
            }
            ShareError::UploadCommand { stderr, .. } => {
                format!("Upload failed: {}", stderr.trim())
            }
            ShareError::Network(e) => format!("Network operation failed: {}", e),
            ShareError::Http(e) => format!("Upload request failed: {}", e),
            ShareError::QrEncode(e) => format!("Could not build a QR code for this URL: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ShareError::ArtifactNotFound { path, hint } => format!(
                "Run `{}` and check that {} exists",
                hint,
                path.display()
            ),
            ShareError::UploadUrlNotFound { host, .. } => format!(
                "Check that {} is reachable, or share over the local network without --upload",
                host
            ),
            ShareError::ArtifactUnreadable { path, .. } => {
                format!("Check the read permissions of {}", path.display())
            }
            ShareError::UploadToolMissing { program } => format!(
                "Install {}, or set upload.backend = \"http\" in serve-apk.toml",
                program
            ),
            ShareError::UploadCommand { host, .. } => format!(
                "Check that {} accepts uploads; the error above came from the upload tool",
                host
            ),
            ShareError::Network(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                "Another process is using the port; stop it or change server.port".to_string()
            }
            ShareError::Network(_) => {
                "Check that this machine is connected to a network".to_string()
            }
            ShareError::Http(_) => "Check your internet connection and retry".to_string(),
            ShareError::QrEncode(_) => "Use a shorter file name or endpoint".to_string(),
            ShareError::UrlParse(_)
            | ShareError::ConfigError { .. }
            | ShareError::InvalidConfigValue { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_message() {
        let err = ShareError::ArtifactNotFound {
            path: PathBuf::from("app/build/outputs/apk/debug/app-debug.apk"),
            hint: "./gradlew assembleDebug".to_string(),
        };

        assert_eq!(
            err.user_friendly_message(),
            "APK not found. Build it with ./gradlew assembleDebug first."
        );
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.category(), ErrorCategory::Artifact);
        assert!(err.to_string().contains("app-debug.apk"));
    }

    #[test]
    fn test_upload_url_not_found_keeps_output() {
        let err = ShareError::UploadUrlNotFound {
            host: "transfer.sh".to_string(),
            output: "503 Service Unavailable\n".to_string(),
        };

        assert_eq!(err.user_friendly_message(), "Upload failed: 503 Service Unavailable");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("transfer.sh"));
    }

    #[test]
    fn test_missing_upload_tool_suggestion() {
        let err = ShareError::UploadToolMissing {
            program: "curl".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Upload);
        assert_eq!(err.user_friendly_message(), "Upload failed: 'curl' was not found on PATH");
        assert!(err.recovery_suggestion().contains("Install curl"));
        assert!(err.recovery_suggestion().contains("upload.backend"));
    }

    #[test]
    fn test_upload_command_suggestion_names_host() {
        let err = ShareError::UploadCommand {
            host: "transfer.sh".to_string(),
            status: "exit status: 6".to_string(),
            stderr: "curl: (6) Could not resolve host: transfer.sh\n".to_string(),
        };
        assert_eq!(
            err.user_friendly_message(),
            "Upload failed: curl: (6) Could not resolve host: transfer.sh"
        );
        assert!(err.recovery_suggestion().contains("transfer.sh"));
        assert!(!err.recovery_suggestion().contains("Install"));
    }

    #[test]
    fn test_address_in_use_suggestion() {
        let err = ShareError::from(std::io::Error::from(std::io::ErrorKind::AddrInUse));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.recovery_suggestion().contains("server.port"));
    }
}
