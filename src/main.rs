use clap::Parser;
use seat_chart::core::{ConfigProvider, RunReport, TransformResult};
use seat_chart::utils::error::ErrorSeverity;
use seat_chart::utils::{logger, validation::Validate};
use seat_chart::{
    BatchEngine, CliConfig, LocalStorage, SeatChartError, SeatChartPipeline, TomlConfig,
};

enum Outcome {
    Generated(RunReport),
    Planned(TransformResult),
}

async fn run_with<C>(config: C, dry_run: bool) -> Result<Outcome, SeatChartError>
where
    C: ConfigProvider + Validate,
{
    config.validate()?;

    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = BatchEngine::new(SeatChartPipeline::new(storage, config));

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        return engine.plan().await.map(Outcome::Planned);
    }
    engine.run().await.map(Outcome::Generated)
}

fn print_plan(plan: &TransformResult) {
    println!("🔍 Dry Run Analysis:");
    println!("  Rows read: {}", plan.total_rows);
    println!("  Rows skipped: {}", plan.skipped.len());
    for class in &plan.classes {
        println!(
            "  班級 {:02} -> {}: {} students, {} seats matched, {} unmatched",
            class.class_number,
            class.file_name,
            class.student_count,
            class.outcome.matched.len(),
            class.outcome.unmatched.len()
        );
        for seat in &class.outcome.unmatched {
            match &seat.near_miss {
                Some(raw) => println!("    ⚠️ {} (template has {})", seat.expected_token, raw),
                None => println!("    ⚠️ {} not found", seat.expected_token),
            }
        }
    }
}

fn print_report(report: &RunReport) {
    println!(
        "✅ 處理完成！共生成 {} 個座位表文件:",
        report.generated_files.len()
    );
    for file in &report.generated_files {
        println!("  - {}", file);
    }
    if let Some(bundle) = &report.bundle {
        println!("📦 {}", bundle);
    }
    if !report.skipped.is_empty() {
        println!("⚠️ 跳過 {} 筆記錄", report.skipped.len());
    }
    if report.unmatched_total() > 0 {
        println!("⚠️ {} 個座位未在模板中找到", report.unmatched_total());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("=== Seat chart generator ===");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let dry_run = cli.dry_run;
    let outcome = match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(&path) {
                Ok(config) => run_with(config, dry_run).await,
                Err(e) => Err(e),
            }
        }
        None => run_with(cli, dry_run).await,
    };

    match outcome {
        Ok(Outcome::Planned(plan)) => print_plan(&plan),
        Ok(Outcome::Generated(report)) => {
            print_report(&report);
            if report.failed_classes().next().is_some() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Seat chart generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
