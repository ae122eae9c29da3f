use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use scan_station::api::ApiClient;
use scan_station::dispatch::{Committer, StationEvent};
use scan_station::handlers::{self, Station};
use scan_station::{config, db};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/station.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let client = ApiClient::from_config(&cfg)?;
    let committer = Committer::new();

    // Refresh the pending listing whenever a commit or purge changes it.
    let mut events = committer.subscribe();
    let listing_client = client.clone();
    tokio::spawn(async move {
        use scan_station::api::OrderService;
        while let Ok(event) = events.recv().await {
            match event {
                StationEvent::PendingInvalidated => match listing_client.list_pending().await {
                    Ok(orders) => info!(pending = orders.len(), "pending orders refreshed"),
                    Err(err) => error!(?err, "failed to refresh pending orders"),
                },
            }
        }
    });

    let mut station = Station::new(cfg.app.operator.clone());
    info!(operator = %cfg.app.operator, "scan station ready; scan an order code");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handlers::handle_input(&mut station, &client, &pool, &committer, &line).await {
            Ok(replies) => {
                for reply in replies {
                    println!("{reply}");
                }
            }
            Err(err) => error!(?err, "failed to handle input"),
        }
    }

    Ok(())
}
