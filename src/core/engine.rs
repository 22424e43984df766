use crate::core::{Pipeline, RunReport, TransformResult};
use crate::utils::error::Result;
use std::time::Instant;

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 執行整個批次。必要檔案缺失或欄位無法辨識時在產生任何輸出前中止。
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        tracing::info!("🚀 Starting seat chart generation");

        self.pipeline.preflight().await?;

        tracing::info!("Extracting student records...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} records ({} skipped)",
            extracted.records.len(),
            extracted.skipped.len()
        );

        tracing::info!("Rendering class templates...");
        let transformed = self.pipeline.transform(extracted).await?;

        tracing::info!("Writing output files...");
        let report = self.pipeline.load(transformed).await?;

        for class in &report.classes {
            match (&class.output_file, &class.write_error) {
                (Some(file), _) => tracing::info!(
                    "  班級 {:02}: {} students, {} seats replaced, {} unmatched -> {}",
                    class.class_number,
                    class.student_count,
                    class.matched.len(),
                    class.unmatched.len(),
                    file
                ),
                (None, error) => tracing::error!(
                    "  班級 {:02}: not written ({})",
                    class.class_number,
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }

        tracing::info!(
            "✅ Generated {} files in {:.2?} ({} skipped records, {} unmatched seats)",
            report.generated_files.len(),
            started.elapsed(),
            report.skipped.len(),
            report.unmatched_total()
        );

        Ok(report)
    }

    /// Dry run: everything up to rendering, nothing is written.
    pub async fn plan(&self) -> Result<TransformResult> {
        self.pipeline.preflight().await?;
        let extracted = self.pipeline.extract().await?;
        self.pipeline.transform(extracted).await
    }
}
