use std::path::PathBuf;

use config::{Config, ConfigError};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct CustbookConfig {
    pub server: Server,
    pub client: Client,
    pub logger: Logger,
}

impl CustbookConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0:8080")?
            .set_default("server.data_file", "data/customers.csv")?
            .set_default("server.static_dir", "static")?
            .set_default("client.url", "http://localhost:8080")?
            .set_default("logger.level", "INFO")?
            .add_source(config::File::with_name("custbook.toml").required(false))
            .add_source(
                config::Environment::with_prefix("CUSTBOOK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<CustbookConfig>()
    }
}

impl Default for CustbookConfig {
    fn default() -> Self {
        Self {
            server: Server {
                address: "0.0.0.0:8080".to_owned(),
                data_file: PathBuf::from("data/customers.csv"),
                static_dir: Some(PathBuf::from("static")),
                tls: None,
            },
            client: Client {
                url: "http://localhost:8080".to_owned(),
            },
            logger: Logger { level: Level::INFO },
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub address: String,
    pub data_file: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub tls: Option<Tls>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Tls {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Client {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}
