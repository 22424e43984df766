use crate::config::INPUT_EXTENSIONS;
use crate::core::ConfigProvider;
use crate::domain::schema::ColumnCandidates;
use crate::domain::template::TokenFormat;
use crate::utils::error::{Result, SeatChartError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub template: TemplateConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub sheet: Option<String>,
    pub name_columns: Option<Vec<String>>,
    pub id_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub path: String,
    pub open_tag: Option<String>,
    pub close_tag: Option<String>,
    pub address_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub file_prefix: Option<String>,
    pub extension: Option<String>,
    pub bundle: Option<String>,
    pub report: Option<String>,
}

const DEFAULT_FILE_PREFIX: &str = "class_";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SeatChartError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SeatChartError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ROSTER_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SeatChartError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, INPUT_EXTENSIONS)?;
        validation::validate_path("template.path", &self.template.path)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(columns) = &self.input.name_columns {
            validation::validate_non_empty_list("input.name_columns", columns)?;
        }
        if let Some(columns) = &self.input.id_columns {
            validation::validate_non_empty_list("input.id_columns", columns)?;
        }
        if let Some(prefix) = &self.output.file_prefix {
            validation::validate_non_empty_string("output.file_prefix", prefix)?;
        }
        if let Some(bundle) = &self.output.bundle {
            validation::validate_file_extension("output.bundle", bundle, &["zip"])?;
        }
        if let Some(report) = &self.output.report {
            validation::validate_file_extension("output.report", report, &["json"])?;
        }
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn sheet_name(&self) -> Option<&str> {
        self.input.sheet.as_deref()
    }

    fn template_path(&self) -> &str {
        &self.template.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn column_candidates(&self) -> ColumnCandidates {
        let defaults = ColumnCandidates::default();
        ColumnCandidates {
            name: self.input.name_columns.clone().unwrap_or(defaults.name),
            identifier: self.input.id_columns.clone().unwrap_or(defaults.identifier),
        }
    }

    fn token_format(&self) -> TokenFormat {
        let defaults = TokenFormat::default();
        TokenFormat {
            open_tag: self.template.open_tag.clone().unwrap_or(defaults.open_tag),
            close_tag: self.template.close_tag.clone().unwrap_or(defaults.close_tag),
            address_prefix: self
                .template
                .address_prefix
                .clone()
                .unwrap_or(defaults.address_prefix),
        }
    }

    fn file_prefix(&self) -> &str {
        self.output
            .file_prefix
            .as_deref()
            .unwrap_or(DEFAULT_FILE_PREFIX)
    }

    fn output_extension(&self) -> Option<&str> {
        self.output.extension.as_deref()
    }

    fn bundle_name(&self) -> Option<&str> {
        self.output.bundle.as_deref()
    }

    fn report_name(&self) -> Option<&str> {
        self.output.report.as_deref()
    }
}
