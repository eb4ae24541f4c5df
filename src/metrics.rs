use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tracing::{info, warn};

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_lines_total", "Protocol lines read from clients.");
        describe_counter!(
            "news_stored_total",
            "Positive news items inserted into storage."
        );
        describe_counter!(
            "news_discarded_total",
            "Well-formed news items dropped by the sentiment filter."
        );
        describe_counter!("news_malformed_total", "Lines rejected by the decoder.");
        describe_counter!("news_connections_total", "Accepted client connections.");
        describe_gauge!(
            "news_connections_active",
            "Client connections currently being handled."
        );
        describe_counter!("news_reports_total", "Completed summary reports.");
        describe_gauge!(
            "news_report_total_items",
            "Items covered by the most recent summary report."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` (Prometheus text format) and `/health`.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            )
    }
}

/// Serve the metrics router on `addr` until the task is dropped.
pub fn spawn_metrics_server(metrics: &Metrics, addr: SocketAddr) -> tokio::task::JoinHandle<()> {
    let router = metrics.router();
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, %addr, "metrics endpoint disabled: bind failed");
                return;
            }
        };
        info!(%addr, "metrics endpoint listening");
        if let Err(e) = axum::serve(listener, router).await {
            warn!(error = %e, "metrics endpoint stopped");
        }
    })
}
