use crate::utils::error::{Result, ShareError};
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ShareError {
    ShareError::InvalidConfigValue {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 上傳端點：http(s)，且能在路徑後面接上檔名
pub fn validate_endpoint(field_name: &str, endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| invalid(field_name, endpoint, format!("Invalid URL format: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            endpoint,
            format!("Unsupported URL scheme: {}", url.scheme()),
        ));
    }
    if url.host_str().is_none() || url.cannot_be_a_base() {
        return Err(invalid(field_name, endpoint, "Endpoint needs a host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            endpoint,
            "The file name is appended to the path; drop the query or fragment",
        ));
    }
    Ok(url)
}

pub fn validate_artifact_path(field_name: &str, path: &Path) -> Result<()> {
    let shown = path.display();
    if path.as_os_str().is_empty() {
        return Err(invalid(field_name, shown, "Path cannot be empty"));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(invalid(field_name, shown, "Path contains null bytes"));
    }
    if path.file_name().is_none() {
        return Err(invalid(field_name, shown, "Path must name the APK file"));
    }
    Ok(())
}

pub fn validate_socket_addr(field_name: &str, addr: &str) -> Result<SocketAddr> {
    addr.parse::<SocketAddr>()
        .map_err(|e| invalid(field_name, addr, format!("Expected ip:port ({})", e)))
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(invalid(
        field_name,
        value,
        format!("Expected one of: {}", allowed.join(", ")),
    ))
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
