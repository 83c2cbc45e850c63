use std::{path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use url::Url;
use yamdb_types::config::BackendConfig;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "YAMDB_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "YAMDB_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "YAMDB_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of server, as visible to users"
    )]
    pub base_url: Url,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "YAMDB_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Access token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(
        long,
        env = "YAMDB_CODE_VALIDITY",
        default_value = "3 days",
        help = "Confirmation code validity in human friendly format",
        value_parser = humantime::parse_duration
    )]
    pub code_validity: Duration,

    #[arg(
        long,
        env = "YAMDB_DEFAULT_PAGE_SIZE",
        default_value = "10",
        help = "Default page size"
    )]
    pub default_page_size: u32,

    #[arg(
        long,
        env = "YAMDB_MAIL_DIR",
        help = "Directory where outgoing mails are stored as files, if not set mails are only logged"
    )]
    pub mail_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "YAMDB_MAIL_FROM",
        default_value = "noreply@yamdb.local",
        help = "Sender address of outgoing mails"
    )]
    pub mail_from: String,

    #[arg(long, env = "YAMDB_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.backend.data_dir()
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }
}
