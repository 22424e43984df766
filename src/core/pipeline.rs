use crate::adapters::tabular::{read_table, IdentifierCell};
use crate::core::{ConfigProvider, ExtractResult, Pipeline, RunReport, Storage, TransformResult};
use crate::domain::decoder::decode;
use crate::domain::model::{
    ClassGroup, ClassReport, RenderedClass, SkipReason, SkippedRecord, StudentRecord,
};
use crate::domain::schema::resolve_columns;
use crate::domain::template::render;
use crate::utils::error::{Result, SeatChartError};
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

const DEFAULT_OUTPUT_EXTENSION: &str = "cls";

pub struct SeatChartPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> SeatChartPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    /// 輸出檔名：前綴 + 兩位班級號 + 副檔名
    pub fn output_file_name(&self, class_number: u8) -> String {
        let extension = self
            .config
            .output_extension()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .or_else(|| {
                Path::new(self.config.template_path())
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.to_string())
            })
            .unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());

        format!("{}{:02}.{}", self.config.file_prefix(), class_number, extension)
    }

    fn build_bundle(&self, files: &[(String, &str)]) -> Result<Vec<u8>> {
        // 固定時間戳，重跑時壓縮檔內容一致
        let options =
            SimpleFileOptions::default().last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, text) in files {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(text.as_bytes())?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SeatChartPipeline<S, C> {
    async fn preflight(&self) -> Result<()> {
        let missing: Vec<String> = [self.config.input_path(), self.config.template_path()]
            .into_iter()
            .filter(|path| !Path::new(path).is_file())
            .map(|path| path.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SeatChartError::MissingRequiredFile { paths: missing });
        }
        Ok(())
    }

    async fn extract(&self) -> Result<ExtractResult> {
        tracing::debug!("Reading roster from: {}", self.config.input_path());
        let table = read_table(self.config.input_path(), self.config.sheet_name())?;
        tracing::info!("📄 Read {} student rows", table.rows.len());
        tracing::debug!("Columns: {:?}", table.headers);

        let columns = resolve_columns(&table.headers, &self.config.column_candidates())?;
        tracing::info!(
            "Using name column '{}' and identifier column '{}'",
            columns.name_header,
            columns.identifier_header
        );

        let mut result = ExtractResult {
            total_rows: table.rows.len(),
            ..ExtractResult::default()
        };

        for index in 0..table.rows.len() {
            let row = index + 1;
            let name = table.cell(index, columns.name_index).as_display();
            let identifier = table.cell(index, columns.identifier_index).as_identifier();

            let skip = match (name, identifier) {
                (None, _) => SkipReason::MissingName,
                (Some(_), IdentifierCell::Missing) => SkipReason::MissingIdentifier,
                (Some(_), IdentifierCell::NonNumeric(raw)) => {
                    SkipReason::NonNumericIdentifier { raw }
                }
                (Some(display_name), IdentifierCell::Value(identifier)) => {
                    result.records.push(StudentRecord {
                        row,
                        display_name,
                        identifier,
                    });
                    continue;
                }
            };

            tracing::warn!("⚠️ Skipping row {}: {:?}", row, skip);
            result.skipped.push(SkippedRecord { row, reason: skip });
        }

        Ok(result)
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let ExtractResult {
            total_rows,
            records,
            mut skipped,
        } = data;

        let mut decoded = Vec::with_capacity(records.len());
        for record in records {
            match decode(record.identifier) {
                Ok(id) => decoded.push((record, id)),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping row {}: {}", record.row, e);
                    skipped.push(SkippedRecord {
                        row: record.row,
                        reason: SkipReason::InvalidIdentifierFormat {
                            identifier: record.identifier,
                        },
                    });
                }
            }
        }

        let groups = ClassGroup::group_by_class(decoded);
        tracing::info!("Grouped students into {} classes", groups.len());

        let template = tokio::fs::read_to_string(self.config.template_path()).await?;
        let format = self.config.token_format();

        let mut classes = Vec::with_capacity(groups.len());
        for (class_number, group) in groups {
            for duplicate in &group.duplicates {
                tracing::warn!(
                    "⚠️ Class {:02} seat {:02}: row {} ({}) replaced by row {} ({})",
                    class_number,
                    duplicate.seat_number,
                    duplicate.replaced.row,
                    duplicate.replaced.display_name,
                    duplicate.kept.row,
                    duplicate.kept.display_name
                );
            }

            let outcome = render(&template, &group.seat_to_name(), &format);

            for seat in &outcome.unmatched {
                let issue = SeatChartError::TemplateTokenNotFound {
                    seat: seat.seat_number,
                    token: seat.expected_token.clone(),
                };
                match &seat.near_miss {
                    Some(raw) => tracing::warn!(
                        "⚠️ Class {:02}: {} (expected {:?}, template has {:?})",
                        class_number,
                        issue,
                        seat.expected_token,
                        raw
                    ),
                    None => tracing::warn!("⚠️ Class {:02}: {}", class_number, issue),
                }
            }
            if outcome.matched.is_empty() {
                tracing::warn!("⚠️ Class {:02}: no seat matched the template", class_number);
            }

            classes.push(RenderedClass {
                class_number,
                file_name: self.output_file_name(class_number),
                student_count: group.seats.len(),
                outcome,
                duplicates: group.duplicates,
            });
        }

        Ok(TransformResult {
            total_rows,
            skipped,
            classes,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunReport> {
        let mut report = RunReport {
            total_rows: result.total_rows,
            skipped: result.skipped,
            ..RunReport::default()
        };
        let mut written: Vec<(String, &str)> = Vec::new();

        for class in &result.classes {
            let write = self
                .storage
                .write_file(&class.file_name, class.outcome.text.as_bytes())
                .await;

            let (output_file, write_error) = match write {
                Ok(()) => {
                    tracing::debug!("Wrote {}", class.file_name);
                    written.push((class.file_name.clone(), class.outcome.text.as_str()));
                    report
                        .generated_files
                        .push(self.storage.display_path(&class.file_name));
                    (Some(class.file_name.clone()), None)
                }
                Err(e) => {
                    tracing::error!("❌ Failed to write {}: {}", class.file_name, e);
                    (None, Some(e.to_string()))
                }
            };

            report.classes.push(ClassReport {
                class_number: class.class_number,
                student_count: class.student_count,
                matched: class.outcome.matched.iter().copied().collect(),
                unmatched: class.outcome.unmatched.clone(),
                duplicate_seats: class.duplicates.iter().map(|d| d.seat_number).collect(),
                output_file,
                write_error,
            });
        }

        if let Some(bundle_name) = self.config.bundle_name() {
            if written.is_empty() {
                tracing::warn!("No class files were written, skipping bundle {}", bundle_name);
            } else {
                let zip_data = self.build_bundle(&written)?;
                tracing::debug!("Writing bundle ({} bytes) to storage", zip_data.len());
                self.storage.write_file(bundle_name, &zip_data).await?;
                report.bundle = Some(self.storage.display_path(bundle_name));
            }
        }

        if let Some(report_name) = self.config.report_name() {
            let json = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(report_name, &json).await?;
            tracing::debug!("Run report saved to {}", report_name);
        }

        Ok(report)
    }
}
