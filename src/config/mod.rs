pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::schema::ColumnCandidates;
#[cfg(feature = "cli")]
use crate::domain::template::TokenFormat;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// 輸入檔可接受的副檔名
pub const INPUT_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "tsv"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "seat-chart")]
#[command(about = "Generate per-class seat charts from a student roster and a template")]
pub struct CliConfig {
    /// Roster spreadsheet (xlsx/xls/ods/csv/tsv)
    #[arg(long, default_value = "2025mt.xlsx")]
    pub input: String,

    /// Sheet to read; defaults to the first sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Template document with <name>192.168.19.N</name> placeholders
    #[arg(long, default_value = "a.cls")]
    pub template: String,

    #[arg(long = "output-dir", default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = "class_")]
    pub file_prefix: String,

    /// Output extension; defaults to the template's extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Also pack every generated file into this zip archive
    #[arg(long)]
    pub bundle: Option<String>,

    /// Write a JSON run report with this file name
    #[arg(long)]
    pub report: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub name_columns: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub id_columns: Vec<String>,

    #[arg(long, default_value = "<name>")]
    pub open_tag: String,

    #[arg(long, default_value = "</name>")]
    pub close_tag: String,

    #[arg(long, default_value = "192.168.19.")]
    pub address_prefix: String,

    /// Load settings from a TOML file instead of flags
    #[arg(short, long)]
    pub config: Option<String>,

    /// Decode and render without writing any file
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, INPUT_EXTENSIONS)?;
        validation::validate_path("template", &self.template)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_string("file_prefix", &self.file_prefix)?;
        validation::validate_non_empty_string("open_tag", &self.open_tag)?;
        validation::validate_non_empty_string("close_tag", &self.close_tag)?;
        if let Some(bundle) = &self.bundle {
            validation::validate_file_extension("bundle", bundle, &["zip"])?;
        }
        if let Some(report) = &self.report {
            validation::validate_file_extension("report", report, &["json"])?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    fn template_path(&self) -> &str {
        &self.template
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn column_candidates(&self) -> ColumnCandidates {
        let defaults = ColumnCandidates::default();
        ColumnCandidates {
            name: if self.name_columns.is_empty() {
                defaults.name
            } else {
                self.name_columns.clone()
            },
            identifier: if self.id_columns.is_empty() {
                defaults.identifier
            } else {
                self.id_columns.clone()
            },
        }
    }

    fn token_format(&self) -> TokenFormat {
        TokenFormat {
            open_tag: self.open_tag.clone(),
            close_tag: self.close_tag.clone(),
            address_prefix: self.address_prefix.clone(),
        }
    }

    fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    fn output_extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    fn bundle_name(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn report_name(&self) -> Option<&str> {
        self.report.as_deref()
    }
}
