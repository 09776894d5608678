use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MedChart";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_TOKEN_URL: &str = "https://icdaccessmanagement.who.int/connect/token";
pub const DEFAULT_SEARCH_URL: &str = "https://id.who.int/icd/release/11/2024-01/mms/search";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Timeout applied to both the token and search requests.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

const ENV_CLIENT_ID: &str = "MEDCHART_ICD_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "MEDCHART_ICD_CLIENT_SECRET";
const ENV_TOKEN_URL: &str = "MEDCHART_ICD_TOKEN_URL";
const ENV_SEARCH_URL: &str = "MEDCHART_ICD_SEARCH_URL";
const ENV_LANGUAGE: &str = "MEDCHART_ICD_LANGUAGE";
const ENV_API_VERSION: &str = "MEDCHART_ICD_API_VERSION";
const ENV_DB_PATH: &str = "MEDCHART_DB_PATH";
const ENV_BIND_ADDR: &str = "MEDCHART_BIND_ADDR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Cannot determine home directory; set {0}")]
    NoDataDir(&'static str),
}

/// Get the application data directory
/// ~/MedChart/ on all platforms
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default location of the SQLite database.
pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("medchart.db"))
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medchart_lib=info,medchart=info,tower_http=warn"
}

/// Runtime configuration, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub search_url: String,
    pub language: String,
    pub api_version: String,
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("search_url", &self.search_url)
            .field("language", &self.language)
            .field("api_version", &self.api_version)
            .field("db_path", &self.db_path)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let client_id = get(ENV_CLIENT_ID).ok_or(ConfigError::Missing(ENV_CLIENT_ID))?;
        let client_secret =
            get(ENV_CLIENT_SECRET).ok_or(ConfigError::Missing(ENV_CLIENT_SECRET))?;

        let db_path = match get(ENV_DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => default_db_path().ok_or(ConfigError::NoDataDir(ENV_DB_PATH))?,
        };

        let bind_raw = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: ENV_BIND_ADDR,
            value: bind_raw.clone(),
        })?;

        Ok(Self {
            client_id,
            client_secret,
            token_url: get(ENV_TOKEN_URL).unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            search_url: get(ENV_SEARCH_URL).unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            language: get(ENV_LANGUAGE).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            api_version: get(ENV_API_VERSION).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            db_path,
            bind_addr,
        })
    }
}
