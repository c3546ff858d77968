//! Analytics dashboard API server

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use etsy_analytics::config::AppConfig;
use etsy_analytics::server::{self, AppState};
use etsy_analytics::warehouse::WarehouseRepository;

#[derive(Parser)]
#[command(name = "dashboard", about = "Etsy seller analytics dashboard API")]
struct Args {
    /// Path to a TOML config file; environment overrides still apply
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address, e.g. 0.0.0.0:8001
    #[arg(short, long)]
    bind: Option<String>,

    /// Create warehouse tables and indexes before serving
    #[arg(long)]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load config {path}: {e}"))?,
        None => AppConfig::from_env(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let pool = WarehouseRepository::create_pool(&config.database_url)
        .await
        .context("failed to connect to the warehouse")?;
    let repository = WarehouseRepository::new(pool.clone());
    repository.ping().await.context("warehouse ping failed")?;

    if args.init_schema {
        repository.init_schema().await?;
        info!("warehouse schema initialized");
    }

    let app = server::router(AppState::new(pool));
    info!("dashboard API listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
