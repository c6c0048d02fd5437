use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use excuses::config::{ServerCli, ServerSettings};
use excuses::handler::QuoteService;
use excuses::logging::{LOG_DIR, init_server_logging};
use excuses::metrics::{Metrics, REPORT_INTERVAL, report_periodically};
use excuses::network::serve;
use excuses::scrape::ExcuseSite;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ServerCli::parse();
    let settings = ServerSettings::load(&cli).context("Could not load configuration")?;

    init_server_logging(Path::new(LOG_DIR), settings.debug)?;

    let source = ExcuseSite::new(&settings.base_url).context("Invalid baseURL")?;
    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(QuoteService::new(source, metrics.clone()));

    let listener = TcpListener::bind(("0.0.0.0", settings.port))
        .await
        .with_context(|| format!("Failed to start listener on port {}", settings.port))?;

    tracing::info!(port = settings.port, base_url = %settings.base_url, "Server starting");
    tokio::spawn(report_periodically(metrics, REPORT_INTERVAL));

    serve(listener, service).await.context("Server failed")?;
    Ok(())
}
