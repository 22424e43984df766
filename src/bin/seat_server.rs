use anyhow::Context;
use clap::Parser;
use seat_chart::seats::routes::create_seat_router;
use seat_chart::seats::{SeatDb, DEFAULT_SEAT_COUNT};
use seat_chart::utils::{logger, validation};
use seat_chart::utils::validation::Validate;

#[derive(Debug, Parser)]
#[command(name = "seat-server")]
#[command(about = "Seat claim service: students pick a seat, admins export the table")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:5055")]
    bind: String,

    /// SQLite database file
    #[arg(long, default_value = "seat_selection.db")]
    db: String,

    /// Number of seats offered (01..N)
    #[arg(long, default_value_t = DEFAULT_SEAT_COUNT)]
    seat_count: u8,

    /// Link shown to students in the startup banner
    #[arg(long, default_value = "http://localhost:5055")]
    public_url: String,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Validate for Args {
    fn validate(&self) -> seat_chart::Result<()> {
        validation::validate_non_empty_string("bind", &self.bind)?;
        validation::validate_path("db", &self.db)?;
        validation::validate_range("seat_count", self.seat_count, 1, 99)?;
        validation::validate_url("public_url", &self.public_url)?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_server_logger(args.verbose, args.json_logs);

    if let Err(e) = args.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 初始化資料庫
    let db = SeatDb::new(&args.db, args.seat_count);
    db.connect().context("failed to open seat database")?;
    tracing::info!("📁 Using database {}", db.path().display());

    let app = create_seat_router(db);
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    let base = args.public_url.trim_end_matches('/');
    println!("{}", "=".repeat(50));
    println!("学生选座系统启动中...");
    println!("请将以下链接发送给学生：{}", base);
    println!("管理接口：{}/api/claims", base);
    println!("{}", "=".repeat(50));
    tracing::info!("🚀 Listening on {}", args.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
