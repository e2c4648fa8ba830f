use std::net::IpAddr;

/// Origins allowed when neither `ALLOWED_ORIGINS` nor `API_CORS_ORIGINS` is set.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_api_key: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_body_size: usize,
    pub webhook_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let admin_api_key = required("ADMIN_API_KEY")?;
        let encryption_key = required("CHATPLANE_ENCRYPTION_KEY")?;

        let host: IpAddr = or("CHATPLANE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CHATPLANE_HOST: {e}"))?;

        let port: u16 = or("CHATPLANE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid CHATPLANE_PORT: {e}"))?;

        let allowed_origins = parse_origins(
            lookup("ALLOWED_ORIGINS")
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup("API_CORS_ORIGINS"))
                .as_deref(),
        );

        let max_body_size: usize = or("CHATPLANE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid CHATPLANE_MAX_BODY_SIZE: {e}"))?;

        let webhook_timeout_secs: u64 = or("CHATPLANE_WEBHOOK_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid CHATPLANE_WEBHOOK_TIMEOUT_SECS: {e}"))?;

        let log_level = or("CHATPLANE_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            admin_api_key,
            encryption_key,
            host,
            port,
            allowed_origins,
            max_body_size,
            webhook_timeout_secs,
            log_level,
        })
    }
}

/// Split a comma separated origin list. An unset or blank value yields the
/// localhost defaults.
pub fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
    } else {
        origins
    }
}
