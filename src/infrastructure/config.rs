use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub firebase: FirebaseSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("Invalid server.bind address '{}'", self.bind))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseSettings {
    pub project_id: String,
    pub api_key: String,
    #[serde(default = "default_database")]
    pub database: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub history_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            history_dir: "data/history".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,
    #[serde(default = "default_records_page_size")]
    pub records_page_size: usize,
}

impl DashboardSettings {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            notice_ttl_secs: default_notice_ttl_secs(),
            records_page_size: default_records_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub session_idle_secs: i64,
}

impl AuthSettings {
    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_idle_secs)
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_idle_secs: 7 * 24 * 60 * 60,
        }
    }
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_notice_ttl_secs() -> u64 {
    5
}

fn default_records_page_size() -> usize {
    5
}

/// `config/traqueur.toml`, overridden by `TRAQUEUR__SECTION__KEY` variables
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/traqueur").required(false))
        .add_source(
            config::Environment::with_prefix("TRAQUEUR")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings
        .try_deserialize()
        .context("Invalid le-traqueur configuration")
}
