// src/config/settings.rs
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}
fn default_server_port() -> u16 {
    5000
}
fn default_pool_size() -> usize {
    10
}
fn default_shutdown_grace_secs() -> u64 {
    5
}
fn default_report_period_secs() -> u64 {
    10
}
fn default_report_initial_delay_secs() -> u64 {
    10
}
fn default_client_host() -> String {
    "localhost".to_string()
}
fn default_message_interval_ms() -> u64 {
    3000
}
fn default_connect_retry_ms() -> u64 {
    3000
}

/// Process-wide settings, resolved once at startup and passed into constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub reporter: ReporterSettings,
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound on concurrently handled connections; excess connections queue.
    #[serde(default = "default_pool_size")]
    pub connections_pool_size: usize,
    /// How long `stop()` waits for in-flight handlers before cancelling them.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            connections_pool_size: default_pool_size(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl ServerSettings {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterSettings {
    #[serde(default = "default_report_period_secs")]
    pub period_secs: u64,
    #[serde(default = "default_report_initial_delay_secs")]
    pub initial_delay_secs: u64,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            period_secs: default_report_period_secs(),
            initial_delay_secs: default_report_initial_delay_secs(),
        }
    }
}

impl ReporterSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_client_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    #[serde(default = "default_message_interval_ms")]
    pub message_interval_ms: u64,
    #[serde(default = "default_connect_retry_ms")]
    pub connect_retry_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_host: default_client_host(),
            server_port: default_server_port(),
            message_interval_ms: default_message_interval_ms(),
            connect_retry_ms: default_connect_retry_ms(),
        }
    }
}

impl ClientSettings {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn message_interval(&self) -> Duration {
        Duration::from_millis(self.message_interval_ms)
    }

    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// When set, `/metrics` and `/health` are served on this address.
    #[serde(default)]
    pub addr: Option<SocketAddr>,
}

impl Settings {
    /// Replace values that would stall the server with their defaults.
    pub(crate) fn sanitize(&mut self) {
        if self.server.connections_pool_size == 0 {
            self.server.connections_pool_size = default_pool_size();
        }
        if self.reporter.period_secs == 0 {
            self.reporter.period_secs = default_report_period_secs();
        }
        if self.client.message_interval_ms == 0 {
            self.client.message_interval_ms = default_message_interval_ms();
        }
        if self.client.connect_retry_ms == 0 {
            self.client.connect_retry_ms = default_connect_retry_ms();
        }
    }
}
