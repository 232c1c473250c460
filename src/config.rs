use std::env;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_ERROR_LOG_PATH: &str = "error_log.txt";
const DEFAULT_REPORT_YEAR: i32 = 2021;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub error_log_path: PathBuf,
    pub report_year: i32,
    pub max_upload_bytes: usize,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Settings {
    /// Reads settings from the process environment. Call `dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        // Hosted platforms hand out a port and expect every interface.
        let bind_address = match (lookup("BIND_ADDRESS"), lookup("PORT")) {
            (Some(address), _) => address,
            (None, Some(port)) => {
                let port: u16 = parse("PORT", port)?;
                format!("0.0.0.0:{}", port)
            }
            (None, None) => DEFAULT_BIND_ADDRESS.to_string(),
        };

        let error_log_path = lookup("ERROR_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_LOG_PATH));

        let report_year = match lookup("REPORT_YEAR") {
            Some(value) => parse("REPORT_YEAR", value)?,
            None => DEFAULT_REPORT_YEAR,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(value) => parse("MAX_UPLOAD_BYTES", value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Settings {
            database_url,
            bind_address,
            error_log_path,
            report_year,
            max_upload_bytes,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
