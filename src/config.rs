use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Shared secret that allows self-registration with the admin role.
    pub admin_secret: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub max_page_size: i64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let admin_secret = std::env::var("DESIGNHUB_ADMIN_SECRET").ok();

        let host: IpAddr = env_or("DESIGNHUB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DESIGNHUB_HOST: {e}"))?;

        let port: u16 = env_or("DESIGNHUB_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid DESIGNHUB_PORT: {e}"))?;

        let max_body_size: usize = env_or("DESIGNHUB_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid DESIGNHUB_MAX_BODY_SIZE: {e}"))?;

        let max_page_size: i64 = env_or("DESIGNHUB_MAX_PAGE_SIZE", "100")
            .parse()
            .map_err(|e| format!("Invalid DESIGNHUB_MAX_PAGE_SIZE: {e}"))?;

        let log_level = env_or("DESIGNHUB_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            admin_secret,
            host,
            port,
            max_body_size,
            max_page_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
