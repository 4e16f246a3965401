use std::env;
use std::time::Duration;

use crate::importers::ReportingPeriod;
use crate::uploads::DEFAULT_SESSION_IDLE_TIMEOUT;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub reporting_period: ReportingPeriod,
    pub max_upload_bytes: usize,
    pub output_file_name: String,
    pub session_idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let reporting_period = match env::var("REPORTING_YEARS") {
            Ok(raw) => parse_reporting_years(&raw)?,
            Err(_) => ReportingPeriod::default(),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            reporting_period,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            output_file_name: env::var("OUTPUT_FILE_NAME")
                .unwrap_or_else(|_| "readings.json".to_string()),
            session_idle_timeout: env::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|minutes| Duration::from_secs(minutes * 60))
                .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            reporting_period: ReportingPeriod::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            output_file_name: "readings.json".to_string(),
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}

/// Parse a comma-separated year list such as "2024,2025"
pub fn parse_reporting_years(raw: &str) -> Result<ReportingPeriod, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        var: "REPORTING_YEARS",
        value: raw.to_string(),
    };

    let years = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token.len() == 4 {
                token.parse::<u16>().map_err(|_| invalid())
            } else {
                Err(invalid())
            }
        })
        .collect::<Result<Vec<u16>, ConfigError>>()?;

    if years.is_empty() {
        return Err(invalid());
    }

    Ok(ReportingPeriod::new(years))
}
