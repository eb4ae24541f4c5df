// src/feed/client.rs
//! Demo client: connects to the server and streams generated news items,
//! reconnecting whenever the connection is lost.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ClientSettings;
use crate::feed::generator::NewsContentGenerator;
use crate::protocol;

pub struct MockNewsClient {
    config: ClientSettings,
    generator: NewsContentGenerator,
}

impl MockNewsClient {
    pub fn new(config: ClientSettings, generator: NewsContentGenerator) -> Self {
        Self { config, generator }
    }

    /// Send one item per message interval until `shutdown` fires.
    /// Returns the number of lines written.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        let mut sent = 0u64;

        'session: loop {
            let Some(mut stream) = self.connect(&shutdown).await else {
                break;
            };

            let mut ticker = interval(self.config.message_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break 'session,
                    _ = ticker.tick() => {}
                }

                let line = protocol::encode(&self.generator.generate_item());
                let write = async {
                    stream.write_all(line.as_bytes()).await?;
                    stream.write_all(b"\n").await
                };
                match write.await {
                    Ok(()) => {
                        sent += 1;
                        info!(line = %line, "sent news item");
                    }
                    Err(e) => {
                        error!(error = %e, "error sending news item");
                        warn!("lost connection, retrying");
                        continue 'session;
                    }
                }
            }
        }

        info!(sent, "mock news client stopped");
        sent
    }

    /// Retry until connected; `None` if shut down first.
    async fn connect(&self, shutdown: &CancellationToken) -> Option<TcpStream> {
        let addr = self.config.server_addr();
        loop {
            info!(%addr, "attempting to connect to news analyzer server");
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                res = TcpStream::connect(&addr) => match res {
                    Ok(stream) => {
                        info!(%addr, "connected to the server");
                        return Some(stream);
                    }
                    Err(e) => {
                        error!(
                            error = %e,
                            retry_ms = self.config.connect_retry_ms,
                            "failed to connect to the server, retrying"
                        );
                    }
                },
            }

            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(self.config.connect_retry()) => {}
            }
        }
    }
}
