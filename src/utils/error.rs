use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeatChartError {
    #[error("Cannot resolve required columns (missing: {missing}); available columns: {available:?}")]
    SchemaResolution {
        missing: String,
        available: Vec<String>,
    },

    #[error("Identifier {identifier} is not a 9-digit number")]
    InvalidIdentifierFormat { identifier: i64 },

    #[error("Required file(s) not found: {}", .paths.join(", "))]
    MissingRequiredFile { paths: Vec<String> },

    #[error("Template token {token} for seat {seat} not found")]
    TemplateTokenNotFound { seat: u8, token: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Seat database has several claims for student id(s): {}", .student_ids.join(", "))]
    DuplicateClaims { student_ids: Vec<String> },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, SeatChartError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Record,
    Template,
    Storage,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SeatChartError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SchemaResolution { .. }
            | Self::MissingRequiredFile { .. }
            | Self::CsvError(_)
            | Self::SpreadsheetError(_) => ErrorCategory::Input,
            Self::InvalidIdentifierFormat { .. } => ErrorCategory::Record,
            Self::TemplateTokenNotFound { .. } => ErrorCategory::Template,
            Self::IoError(_)
            | Self::XlsxWriteError(_)
            | Self::DatabaseError(_)
            | Self::DuplicateClaims { .. }
            | Self::ZipError(_) => ErrorCategory::Storage,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆記錄或單一座位的問題：記錄後繼續
            Self::InvalidIdentifierFormat { .. } | Self::TemplateTokenNotFound { .. } => {
                ErrorSeverity::Low
            }
            Self::ZipError(_) | Self::SerializationError(_) => ErrorSeverity::Medium,
            Self::SchemaResolution { .. }
            | Self::MissingRequiredFile { .. }
            | Self::CsvError(_)
            | Self::SpreadsheetError(_)
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::DuplicateClaims { .. }
            | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::XlsxWriteError(_) | Self::DatabaseError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 是否必須中止整個批次
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::SchemaResolution { .. } => {
                "Rename the spreadsheet header to one of the accepted name/identifier column names, or list the header in the config file".to_string()
            }
            Self::MissingRequiredFile { paths } => {
                format!("Make sure these files exist: {}", paths.join(", "))
            }
            Self::InvalidIdentifierFormat { .. } => {
                "Check that the identifier column holds 9-digit numbers without dropped leading zeros".to_string()
            }
            Self::TemplateTokenNotFound { token, .. } => {
                format!("Add {} to the template or check its spacing", token)
            }
            Self::CsvError(_) | Self::SpreadsheetError(_) => {
                "Open the input file and check that it is a valid spreadsheet".to_string()
            }
            Self::IoError(_) | Self::ZipError(_) => {
                "Check file permissions and free disk space in the output directory".to_string()
            }
            Self::XlsxWriteError(_) => "Retry the export".to_string(),
            Self::DuplicateClaims { student_ids } => format!(
                "Delete the extra rows for {} from the students table, or start with a new --db file",
                student_ids.join(", ")
            ),
            Self::DatabaseError(_) => {
                "Check that the database file is writable and not locked by another process"
                    .to_string()
            }
            Self::SerializationError(_) | Self::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the log".to_string()
            }
            Self::ConfigValidationError { field, .. }
            | Self::InvalidConfigValueError { field, .. }
            | Self::MissingConfigError { field } => {
                format!("Fix the `{}` setting", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::SchemaResolution { missing, available } => format!(
                "找不到{}欄位，可用欄位: {}",
                missing,
                available.join(", ")
            ),
            Self::MissingRequiredFile { paths } => {
                format!("以下必要檔案不存在: {}", paths.join(", "))
            }
            Self::InvalidIdentifierFormat { identifier } => {
                format!("考號 {} 不是9位數", identifier)
            }
            Self::TemplateTokenNotFound { seat, .. } => {
                format!("未找到座位號 {} 的模板位置", seat)
            }
            Self::DuplicateClaims { student_ids } => {
                format!("選座資料庫中以下學號重複選座: {}", student_ids.join(", "))
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let missing = SeatChartError::MissingRequiredFile {
            paths: vec!["a.cls".to_string()],
        };
        assert!(missing.is_fatal());
        assert_eq!(missing.category(), ErrorCategory::Input);

        let bad_id = SeatChartError::InvalidIdentifierFormat { identifier: 12345 };
        assert!(!bad_id.is_fatal());
        assert_eq!(bad_id.category(), ErrorCategory::Record);

        let token = SeatChartError::TemplateTokenNotFound {
            seat: 5,
            token: "<name>192.168.19.5</name>".to_string(),
        };
        assert!(!token.is_fatal());
        assert!(token.recovery_suggestion().contains("192.168.19.5"));
    }

    #[test]
    fn test_duplicate_claims_names_each_student() {
        let err = SeatChartError::DuplicateClaims {
            student_ids: vec!["S001".to_string(), "S007".to_string()],
        };
        assert!(err.is_fatal());
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.to_string().contains("S001, S007"));
        assert!(err.recovery_suggestion().contains("S007"));
    }

    #[test]
    fn test_missing_file_message_lists_every_path() {
        let err = SeatChartError::MissingRequiredFile {
            paths: vec!["2025mt.xlsx".to_string(), "a.cls".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2025mt.xlsx"));
        assert!(msg.contains("a.cls"));
    }
}
