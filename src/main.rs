//! News Analyzer Server — Binary Entrypoint
//! Boots the TCP ingestion server, the periodic summary reporter and (when
//! configured) the metrics endpoint. Ctrl-C stops everything gracefully.

use std::sync::Arc;

use anyhow::Context;
use news_analyzer::metrics::{spawn_metrics_server, Metrics};
use news_analyzer::{report_task, telemetry, NewsAnalyzerServer, NewsItemStorage, Settings};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init();

    let settings = Settings::load_default().context("loading settings")?;
    info!(?settings, "resolved settings");

    let _metrics_endpoint = match settings.metrics.addr {
        Some(addr) => {
            let metrics = Metrics::init()?;
            Some(spawn_metrics_server(&metrics, addr))
        }
        None => None,
    };

    let storage = Arc::new(NewsItemStorage::new());

    let reporter = report_task(&settings, Arc::clone(&storage));
    reporter.start();

    let server = Arc::new(NewsAnalyzerServer::new(settings.server.clone(), storage));
    let mut serving = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.start().await }
    });

    // A bind failure ends the server task on its own; otherwise wait for ctrl-c.
    let served = tokio::select! {
        joined = &mut serving => joined,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown requested");
            server.stop();
            serving.await
        }
    };

    let served = served.context("server task panicked")?;
    reporter.stop().await;
    served.context("news analyzer server")?;
    Ok(())
}
