use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub screening: ScreeningConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8084".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening: ScreeningConfig::from_env()?,
        })
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

/// Index refresh and query defaults.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    /// Directory holding the list files read by the CSV loader.
    pub data_dir: Option<PathBuf>,
    /// `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
    pub default_limit: usize,
    pub max_limit: usize,
    pub min_match: f64,
    pub query_timeout: Duration,
    pub build_workers: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            refresh_interval: Some(Duration::from_secs(12 * 60 * 60)),
            default_limit: 10,
            max_limit: 100,
            min_match: 0.0,
            query_timeout: Duration::from_millis(5_000),
            build_workers: default_workers(),
        }
    }
}

impl ScreeningConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = env::var("WATCHLIST_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let refresh_secs = parse_var::<u64>("WATCHLIST_REFRESH_INTERVAL_SECS")?;
        let refresh_interval = match refresh_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.refresh_interval,
        };

        let default_limit = parse_var::<usize>("WATCHLIST_DEFAULT_LIMIT")?
            .unwrap_or(defaults.default_limit);
        let max_limit = parse_var::<usize>("WATCHLIST_MAX_LIMIT")?.unwrap_or(defaults.max_limit);
        if default_limit == 0 || max_limit == 0 || default_limit > max_limit {
            return Err(ConfigError::InvalidLimits {
                default_limit,
                max_limit,
            });
        }

        let min_match = parse_var::<f64>("WATCHLIST_MIN_MATCH")?.unwrap_or(defaults.min_match);
        if !(0.0..=1.0).contains(&min_match) {
            return Err(ConfigError::InvalidMinMatch(min_match));
        }

        let query_timeout = parse_var::<u64>("WATCHLIST_QUERY_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.query_timeout);

        let build_workers = parse_var::<usize>("WATCHLIST_BUILD_WORKERS")?
            .filter(|workers| *workers > 0)
            .unwrap_or(defaults.build_workers);

        Ok(Self {
            data_dir,
            refresh_interval,
            default_limit,
            max_limit,
            min_match,
            query_timeout,
            build_workers,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        _ => Ok(None),
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidLimits { default_limit: usize, max_limit: usize },
    InvalidMinMatch(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a number (found '{value}')")
            }
            ConfigError::InvalidLimits {
                default_limit,
                max_limit,
            } => write!(
                f,
                "result limits must satisfy 0 < default ({default_limit}) <= max ({max_limit})"
            ),
            ConfigError::InvalidMinMatch(value) => {
                write!(f, "WATCHLIST_MIN_MATCH must be within 0.0..=1.0 (found {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
