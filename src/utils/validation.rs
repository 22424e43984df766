use crate::utils::error::{Result, SeatChartError};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SeatChartError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.iter().all(|v| v.trim().is_empty()) {
        return Err(SeatChartError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SeatChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("public_url", "https://example.com").is_ok());
        assert!(validate_url("public_url", "http://localhost:5055").is_ok());
        assert!(validate_url("public_url", "").is_err());
        assert!(validate_url("public_url", "invalid-url").is_err());
        assert!(validate_url("public_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = ["xlsx", "csv"];
        assert!(validate_file_extension("input", "2025mt.xlsx", &allowed).is_ok());
        assert!(validate_file_extension("input", "ROSTER.XLSX", &allowed).is_ok());
        assert!(validate_file_extension("input", "data.txt", &allowed).is_err());
        assert!(validate_file_extension("input", "noext", &allowed).is_err());
    }

    #[test]
    fn test_validate_range_and_lists() {
        assert!(validate_range("seat_count", 48u8, 1, 99).is_ok());
        assert!(validate_range("seat_count", 0u8, 1, 99).is_err());
        assert!(validate_non_empty_list("name_columns", &["姓名".to_string()]).is_ok());
        assert!(validate_non_empty_list("name_columns", &[" ".to_string()]).is_err());
        assert!(validate_non_empty_string("file_prefix", "  ").is_err());
    }
}
