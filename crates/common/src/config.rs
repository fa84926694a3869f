use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// JWT secret for session tokens
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: u64,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Port the API server binds to (default: 3000)
    pub api_port: u16,

    /// Public host used to build absolute URLs in the notices feed
    pub site_domain: String,

    /// Maximum number of entries served by the notices feed (default: 20)
    pub items_per_feed: i64,

    /// Queue every notice instead of sending immediately unless told otherwise
    pub queue_all: bool,

    /// TTL of the emission lock in seconds (default: 600)
    pub emit_lock_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRY_HOURS must be a valid u64"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            site_domain: std::env::var("SITE_DOMAIN")
                .unwrap_or_else(|_| "localhost:3000".to_string()),
            items_per_feed: std::env::var("ITEMS_PER_FEED")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ITEMS_PER_FEED must be a valid integer"))?,
            queue_all: parse_flag(std::env::var("NOTIFICATION_QUEUE_ALL").ok().as_deref())?,
            emit_lock_timeout_secs: std::env::var("EMIT_LOCK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("EMIT_LOCK_TIMEOUT_SECS must be a valid u64"))?,
        })
    }
}

/// Parse a boolean environment flag. Unset means `false`.
fn parse_flag(value: Option<&str>) -> anyhow::Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v.is_empty() => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow::anyhow!(
                "NOTIFICATION_QUEUE_ALL must be a boolean, got '{}'",
                other
            )),
        },
    }
}
