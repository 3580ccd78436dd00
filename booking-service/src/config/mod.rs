use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    /// OTLP collector for span export. Unset means local JSON logs only.
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Bounds server selection at startup so a missing store is noticed quickly.
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Implicit-TLS port (SMTPS), 465 by default.
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<Secret<String>>,
    pub timeout: Duration,
}

/// Username/password pair for relay authentication. Only exists when both are set.
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: Secret<String>,
}

impl SmtpConfig {
    pub fn credentials(&self) -> Option<SmtpCredentials> {
        use secrecy::ExposeSecret;

        let username = self.user.as_deref().filter(|u| !u.is_empty())?;
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())?;

        Some(SmtpCredentials {
            username: username.to_string(),
            password: password.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: AllowedOrigins,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Parses a comma-separated origin list. A `*` entry anywhere allows every origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| o.trim_end_matches('/').to_string())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

impl BookingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Builds the service configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        Ok(BookingConfig {
            common,
            service_name: get("SERVICE_NAME", Some("booking-service"))?,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: optional_env(&lookup, "OTLP_ENDPOINT"),
            mongodb: MongoConfig {
                uri: get("MONGO_URL", Some("mongodb://localhost:27017"))?,
                database: get("DB_NAME", Some("alinew"))?,
                connect_timeout: Duration::from_secs(parse_number(
                    "MONGO_CONNECT_TIMEOUT_SECS",
                    &get("MONGO_CONNECT_TIMEOUT_SECS", Some("5"))?,
                )?),
            },
            smtp: SmtpConfig {
                host: get("SMTP_HOST", Some("smtp.titan.email"))?,
                port: parse_number("SMTP_PORT", &get("SMTP_PORT", Some("465"))?)?,
                user: optional_env(&lookup, "SMTP_USER"),
                password: optional_env(&lookup, "SMTP_PASSWORD").map(Secret::new),
                timeout: Duration::from_secs(parse_number(
                    "SMTP_TIMEOUT_SECS",
                    &get("SMTP_TIMEOUT_SECS", Some("30"))?,
                )?),
            },
            cors: CorsConfig {
                allowed_origins: AllowedOrigins::parse(
                    &lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()),
                ),
            },
        })
    }
}

fn get_env<F>(
    lookup: &F,
    key: &str,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => match default {
            // Production tolerates defaults only for non-sensitive tuning knobs.
            Some(def) if !is_prod || !REQUIRED_IN_PROD.contains(&key) => Ok(def.to_string()),
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

const REQUIRED_IN_PROD: &[&str] = &["MONGO_URL", "DB_NAME", "SMTP_HOST"];

fn optional_env<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
