use std::env;
use tracing::warn;

pub const DEFAULT_DB_URL: &str = "sqlite://medical_records.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            db_url: env::var("DB_URL")
                .unwrap_or_else(|_| {
                    warn!("DB_URL not set, using default {}", DEFAULT_DB_URL);
                    DEFAULT_DB_URL.to_string()
                }),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expiry_hours: parse_or("JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY_HOURS),
            port: parse_or("PORT", DEFAULT_PORT),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|origin| !origin.trim().is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.db_url.is_empty() && !self.jwt_secret.is_empty()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
