use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Origins allowed to call the API when `CORS_ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:8080",
    "https://sonafaculty-idcard-portal.netlify.app",
];

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
    pub store: StoreConfig,
    pub workflow: WorkflowConfig,
    pub cors: CorsConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let store = StoreConfig {
            uri: env::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string()),
            database: env::var("MONGO_DB").ok().filter(|name| !name.trim().is_empty()),
            server_selection_timeout: millis_var("MONGO_SERVER_SELECTION_TIMEOUT_MS", 5_000)?,
            max_pool_size: env::var("MONGO_MAX_POOL_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "MONGO_MAX_POOL_SIZE",
                })?,
        };

        let workflow = WorkflowConfig {
            reject_unknown_status: bool_var("REJECT_UNKNOWN_STATUS", false)?,
            faculty_check_timeout: millis_var("FACULTY_CHECK_TIMEOUT_MS", 1_000)?,
        };

        let cors = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => CorsConfig::from_list(&raw),
            Err(_) => CorsConfig::default(),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            store,
            workflow,
            cors,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn millis_var(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

fn bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { name }),
        },
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

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    /// Falls back to the database named in the URI, then `test`.
    pub database: Option<String>,
    pub server_selection_timeout: Duration,
    pub max_pool_size: u32,
}

/// Knobs for the request transition and faculty lookup behavior.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowConfig {
    /// Refuse statuses other than `approved`/`rejected` instead of discarding the record.
    pub reject_unknown_status: bool,
    pub faculty_check_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            reject_unknown_status: false,
            faculty_check_timeout: Duration::from_secs(1),
        }
    }
}

/// Cross-origin allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_list(raw: &str) -> Self {
        let allowed_origins = raw
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/'))
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        Self { allowed_origins }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidFlag { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::InvalidFlag { name } => write!(f, "{name} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
