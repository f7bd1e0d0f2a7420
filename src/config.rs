//! Environment configuration loading and validation
//!
//! Parses process environment variables into a typed, validated
//! configuration snapshot. The loader is an explicitly owned provider
//! object: callers hold a `ConfigLoader` and pass snapshots by value.
//! Outside test mode the first successful snapshot is cached for the
//! process lifetime; every read returns a clone so callers cannot
//! mutate the cached original. In test mode every call re-validates
//! against the current variable source so tests can mutate variables
//! between calls.
//!
//! Validation is a single pass that collects ALL violations and raises
//! one aggregated `ConfigError`; there is no partial configuration.

use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Runtime environment. Selected by `NODE_ENV`; defaults to
/// `development` when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "development" => Some(Self::Development),
            "test" => Some(Self::Test),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Log severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Simple,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Self::Json),
            "simple" => Some(Self::Simple),
            _ => None,
        }
    }
}

/// Supabase connection settings. The URL is normalized by stripping a
/// trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

/// Database pool tuning. Pool-size defaults grow with the environment
/// (development < test < production).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub pool_size: u32,
    pub timeout_ms: u64,
}

/// Logging settings consumed by telemetry init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Immutable, fully-validated configuration snapshot. Once
/// constructed, every field meets its declared constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub environment: Environment,
    pub port: u16,
    pub supabase: SupabaseConfig,
    pub jwt_secret: String,
    pub cors_origin: String,
    pub allowed_origins: Vec<String>,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// One `field: message` violation from the configuration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Aggregated configuration failure. `issues` carries every violation
/// found in the pass; the message concatenates `field: message` pairs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid environment configuration: {}", summarize(.issues))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

/// Environment-selected validation schema: which variables are
/// required and what the defaults are for this environment.
#[derive(Debug, Clone, Copy)]
pub struct EnvSchema {
    environment: Environment,
    default_pool_size: u32,
    default_log_level: LogLevel,
    require_frontend_url: bool,
}

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_DB_TIMEOUT_MS: u64 = 30_000;
const MIN_JWT_SECRET_LEN: usize = 32;

impl EnvSchema {
    /// Returns the schema appropriate to the given environment.
    /// Production additionally requires `FRONTEND_URL` to be set.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                environment,
                default_pool_size: 5,
                default_log_level: LogLevel::Debug,
                require_frontend_url: false,
            },
            Environment::Test => Self {
                environment,
                default_pool_size: 10,
                default_log_level: LogLevel::Error,
                require_frontend_url: false,
            },
            Environment::Production => Self {
                environment,
                default_pool_size: 20,
                default_log_level: LogLevel::Warn,
                require_frontend_url: true,
            },
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Runs every recognized variable through the schema in a single
    /// pass, collecting all violations. Any missing or invalid
    /// required field aborts snapshot construction entirely.
    pub fn validate(&self, vars: &BTreeMap<String, String>) -> Result<EnvironmentConfig, ConfigError> {
        let mut issues = Vec::new();

        let get = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let supabase_url = match get("SUPABASE_URL") {
            None => {
                issues.push(ConfigIssue::new("SUPABASE_URL", "is required"));
                String::new()
            }
            Some(raw) => match Url::parse(raw) {
                Ok(_) => raw.trim_end_matches('/').to_string(),
                Err(_) => {
                    issues.push(ConfigIssue::new("SUPABASE_URL", "must be a valid URL"));
                    String::new()
                }
            },
        };

        let anon_key = match get("SUPABASE_ANON_KEY") {
            Some(v) => v.to_string(),
            None => {
                issues.push(ConfigIssue::new("SUPABASE_ANON_KEY", "is required"));
                String::new()
            }
        };

        let service_role_key = match get("SUPABASE_SERVICE_ROLE_KEY") {
            Some(v) => v.to_string(),
            None => {
                issues.push(ConfigIssue::new("SUPABASE_SERVICE_ROLE_KEY", "is required"));
                String::new()
            }
        };

        let jwt_secret = match get("JWT_SECRET") {
            None => {
                issues.push(ConfigIssue::new("JWT_SECRET", "is required"));
                String::new()
            }
            Some(v) if v.len() < MIN_JWT_SECRET_LEN => {
                issues.push(ConfigIssue::new(
                    "JWT_SECRET",
                    "must be at least 32 characters long",
                ));
                String::new()
            }
            Some(v) => v.to_string(),
        };

        let port = match get("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => match raw.parse::<u16>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    issues.push(ConfigIssue::new(
                        "PORT",
                        "must be an integer between 1 and 65535",
                    ));
                    DEFAULT_PORT
                }
            },
        };

        let frontend_url = get("FRONTEND_URL");
        if self.require_frontend_url && frontend_url.is_none() {
            issues.push(ConfigIssue::new("FRONTEND_URL", "is required in production"));
        }
        let cors_origin = frontend_url.unwrap_or(DEFAULT_CORS_ORIGIN).to_string();

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let pool_size = match get("DB_POOL_SIZE") {
            None => self.default_pool_size,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if (1..=100).contains(&n) => n,
                _ => {
                    issues.push(ConfigIssue::new(
                        "DB_POOL_SIZE",
                        "must be an integer between 1 and 100",
                    ));
                    self.default_pool_size
                }
            },
        };

        let timeout_ms = match get("DB_TIMEOUT") {
            None => DEFAULT_DB_TIMEOUT_MS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1000 => n,
                _ => {
                    issues.push(ConfigIssue::new(
                        "DB_TIMEOUT",
                        "must be an integer of at least 1000 milliseconds",
                    ));
                    DEFAULT_DB_TIMEOUT_MS
                }
            },
        };

        let level = match get("LOG_LEVEL") {
            None => self.default_log_level,
            Some(raw) => match LogLevel::parse(raw) {
                Some(l) => l,
                None => {
                    issues.push(ConfigIssue::new(
                        "LOG_LEVEL",
                        "must be one of error, warn, info, debug",
                    ));
                    self.default_log_level
                }
            },
        };

        let format = match get("LOG_FORMAT") {
            None => LogFormat::Json,
            Some(raw) => match LogFormat::parse(raw) {
                Some(f) => f,
                None => {
                    issues.push(ConfigIssue::new(
                        "LOG_FORMAT",
                        "must be one of json, simple",
                    ));
                    LogFormat::Json
                }
            },
        };

        if !issues.is_empty() {
            return Err(ConfigError { issues });
        }

        Ok(EnvironmentConfig {
            environment: self.environment,
            port,
            supabase: SupabaseConfig {
                url: supabase_url,
                anon_key,
                service_role_key,
            },
            jwt_secret,
            cors_origin,
            allowed_origins,
            database: DatabaseConfig {
                pool_size,
                timeout_ms,
            },
            logging: LoggingConfig { level, format },
        })
    }
}

enum VarSource {
    Process,
    Map(RwLock<BTreeMap<String, String>>),
}

impl VarSource {
    fn snapshot(&self) -> BTreeMap<String, String> {
        match self {
            Self::Process => std::env::vars().collect(),
            Self::Map(lock) => match lock.read() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            },
        }
    }
}

/// Explicitly owned configuration provider.
///
/// `caching` is a constructor parameter, not an environment sniff:
/// `from_process_env` disables it when `NODE_ENV=test` for drop-in
/// behavior, and tests construct map-backed loaders with caching off.
pub struct ConfigLoader {
    source: VarSource,
    caching: bool,
    cache: OnceLock<EnvironmentConfig>,
}

impl ConfigLoader {
    /// Loader over the real process environment. Caching is enabled
    /// except in the test environment.
    pub fn from_process_env() -> Self {
        let caching = std::env::var("NODE_ENV").as_deref() != Ok("test");
        Self {
            source: VarSource::Process,
            caching,
            cache: OnceLock::new(),
        }
    }

    /// Loader over an explicit variable map, for tests and embedding.
    pub fn with_vars<I, K, V>(vars: I, caching: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            source: VarSource::Map(RwLock::new(map)),
            caching,
            cache: OnceLock::new(),
        }
    }

    /// Overwrites a variable in a map-backed loader. Ignored for
    /// process-backed loaders.
    pub fn set_var(&self, key: &str, value: &str) {
        if let VarSource::Map(lock) = &self.source {
            let mut guard = match lock.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.insert(key.to_string(), value.to_string());
        }
    }

    /// Removes a variable in a map-backed loader.
    pub fn unset_var(&self, key: &str) {
        if let VarSource::Map(lock) = &self.source {
            let mut guard = match lock.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.remove(key);
        }
    }

    fn detect_environment(
        vars: &BTreeMap<String, String>,
    ) -> Result<Environment, ConfigError> {
        match vars.get("NODE_ENV").map(String::as_str) {
            None | Some("") => Ok(Environment::Development),
            Some(raw) => Environment::parse(raw).ok_or_else(|| ConfigError {
                issues: vec![ConfigIssue::new(
                    "NODE_ENV",
                    "must be one of development, test, production",
                )],
            }),
        }
    }

    /// Returns the validated snapshot, from cache when caching is on.
    /// The returned value is always a copy; mutating it does not
    /// affect subsequent calls.
    pub fn get_config(&self) -> Result<EnvironmentConfig, ConfigError> {
        if self.caching {
            if let Some(cached) = self.cache.get() {
                return Ok(cached.clone());
            }
        }

        let vars = self.source.snapshot();
        let environment = Self::detect_environment(&vars)?;
        let config = EnvSchema::for_environment(environment).validate(&vars)?;

        if self.caching {
            let _ = self.cache.set(config.clone());
        }
        Ok(config)
    }

    /// Startup gate: same validation as `get_config`, without caching
    /// a snapshot. Fails loudly when any required variable is absent,
    /// malformed, or out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let vars = self.source.snapshot();
        let environment = Self::detect_environment(&vars)?;
        EnvSchema::for_environment(environment)
            .validate(&vars)
            .map(|_| ())
    }
}
