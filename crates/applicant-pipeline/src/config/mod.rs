use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::applicants::ShortlistCriteria;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: StoreConfig,
    pub shortlist: ShortlistCriteria,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let snapshot_path = env::var("PIPELINE_STORE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig { snapshot_path },
            shortlist: load_shortlist_criteria()?,
        })
    }
}

fn load_shortlist_criteria() -> Result<ShortlistCriteria, ConfigError> {
    let defaults = ShortlistCriteria::default();

    let min_experience_years = read_decimal(
        "SHORTLIST_MIN_EXPERIENCE_YEARS",
        defaults.min_experience_years,
    )?;
    let max_hourly_rate_reference_currency = read_decimal(
        "SHORTLIST_MAX_HOURLY_RATE_USD",
        defaults.max_hourly_rate_reference_currency,
    )?;

    let approved_location_classes = match env::var("SHORTLIST_APPROVED_LOCATIONS") {
        Ok(raw) => {
            let classes: BTreeSet<String> = raw
                .split(',')
                .map(|value| value.trim().to_uppercase())
                .filter(|value| !value.is_empty())
                .collect();
            if classes.is_empty() {
                return Err(ConfigError::EmptyLocationList);
            }
            classes
        }
        Err(_) => defaults.approved_location_classes,
    };

    Ok(ShortlistCriteria {
        min_experience_years,
        max_hourly_rate_reference_currency,
        approved_location_classes,
    })
}

fn read_decimal(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or(ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the record store snapshot lives between runs. `None` keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    EmptyLocationList,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative number")
            }
            ConfigError::EmptyLocationList => write!(
                f,
                "SHORTLIST_APPROVED_LOCATIONS must name at least one location class"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::EmptyLocationList => None,
        }
    }
}
