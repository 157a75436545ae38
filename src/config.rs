use std::{env, ops::RangeInclusive, str::FromStr};
use thiserror::Error;

/// Secret used to sign session tokens when none is configured outside production.
pub const LOCAL_SECRET_KEY: &str = "dev-secret-key-change-in-production-12345";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;
/// Longest session lifetime accepted from the environment (one year).
pub const MAX_SESSION_TTL_SECS: i64 = 31_536_000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once at startup,
/// never mutated afterwards, and pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which secrets are mandatory.
    pub env: Env,
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    pub db_max_connections: u32,
    pub port: u16,
    // HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    pub session_ttl_secs: i64,
    // bcrypt work factor applied to new password hashes.
    pub bcrypt_cost: u32,
    // When true, `teacher` may be picked at registration. `admin` never can.
    pub allow_staff_self_registration: bool,
    // Credentials of the admin account seeded at startup.
    pub admin: AdminSeed,
}

/// AdminSeed
///
/// The default administrator created by the startup procedure when absent.
#[derive(Clone, Debug, PartialEq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@college.edu".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            department: "Administration".to_string(),
        }
    }
}

/// Env
///
/// Defines the runtime context: pretty logs and development fallbacks locally,
/// JSON logs and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    MissingSecret(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests: in-memory store and the cheapest
    /// bcrypt cost so that hashing does not dominate test time.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            port: DEFAULT_PORT,
            jwt_secret: LOCAL_SECRET_KEY.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            bcrypt_cost: 4,
            allow_staff_self_registration: false,
            admin: AdminSeed::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. In production the
    /// database URL and the signing secret are mandatory; loading fails fast
    /// rather than starting with an insecure configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        let jwt_secret = env::var("SECRET_KEY").ok().filter(|s| !s.is_empty());

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(db_url.ok_or(ConfigError::MissingSecret("DATABASE_URL"))?),
                jwt_secret.ok_or(ConfigError::MissingSecret("SECRET_KEY"))?,
            ),
            Env::Local => (
                db_url,
                jwt_secret.unwrap_or_else(|| LOCAL_SECRET_KEY.to_string()),
            ),
        };

        let admin = AdminSeed {
            password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            ..AdminSeed::default()
        };

        Ok(Self {
            env,
            db_url,
            db_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            port: parse_var("PORT", DEFAULT_PORT)?,
            jwt_secret,
            session_ttl_secs: parse_bounded(
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
                1..=MAX_SESSION_TTL_SECS,
            )?,
            bcrypt_cost: parse_bounded("BCRYPT_COST", bcrypt::DEFAULT_COST, 4..=31)?,
            allow_staff_self_registration: parse_var("ALLOW_STAFF_SELF_REGISTRATION", false)?,
            admin,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bounded<T>(
    name: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
{
    let value = parse_var(name, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}
