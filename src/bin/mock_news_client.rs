//! Demo feed: streams generated headlines to the news analyzer server,
//! reconnecting on failure. Ctrl-C stops it.

use anyhow::Context;
use news_analyzer::feed::{MockNewsClient, NewsContentGenerator};
use news_analyzer::{telemetry, Settings};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init();

    let settings = Settings::load_default().context("loading settings")?;
    let client = MockNewsClient::new(settings.client, NewsContentGenerator::new());

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        }
    });

    let sent = client.run(shutdown).await;
    println!("mock-news-client done, {sent} item(s) sent");
    Ok(())
}
