use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_PORT: &str = "5000";
const DEFAULT_NOTIFICATION_PAGE_SIZE: usize = 50;
const DEFAULT_LIVE_UPDATE_CAPACITY: usize = 256;

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

/// Top-level configuration for the marketplace service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::Compact,
        };

        let notification_page_size =
            positive_from_env("APP_NOTIFICATION_PAGE_SIZE", DEFAULT_NOTIFICATION_PAGE_SIZE)?;
        let live_update_capacity =
            positive_from_env("APP_LIVE_UPDATE_CAPACITY", DEFAULT_LIVE_UPDATE_CAPACITY)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
            marketplace: MarketplaceConfig {
                notification_page_size,
                live_update_capacity,
            },
        })
    }
}

fn positive_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { variable: name }),
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

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat {
                value: raw.to_string(),
            }),
        }
    }
}

/// Tunables for the marketplace workflow itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Maximum number of notifications returned by a single listing.
    pub notification_page_size: usize,
    /// Buffered live-update events before slow subscribers start lagging.
    pub live_update_capacity: usize,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            notification_page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
            live_update_capacity: DEFAULT_LIVE_UPDATE_CAPACITY,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat { value: String },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat { value } => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'pretty' (found '{value}')")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat { .. }
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("APP_NOTIFICATION_PAGE_SIZE");
        env::remove_var("APP_LIVE_UPDATE_CAPACITY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.marketplace, MarketplaceConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
        reset_env();
    }

    #[test]
    fn rejects_zero_notification_page_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_NOTIFICATION_PAGE_SIZE", "0");
        let err = AppConfig::load().expect_err("zero page size rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                variable: "APP_NOTIFICATION_PAGE_SIZE"
            }
        ));
        reset_env();
    }

    #[test]
    fn reads_marketplace_tunables() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_NOTIFICATION_PAGE_SIZE", "20");
        env::set_var("APP_LIVE_UPDATE_CAPACITY", "8");
        env::set_var("APP_LOG_FORMAT", "pretty");
        env::set_var("APP_ENV", "prod");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.marketplace.notification_page_size, 20);
        assert_eq!(config.marketplace.live_update_capacity, 8);
        assert_eq!(config.telemetry.format, LogFormat::Pretty);
        reset_env();
    }
}
