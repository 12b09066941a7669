#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORAGE_BACKEND: {other}"),
        }
    }
}

/// Longest accepted token lifetime; larger values would overflow date math.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_ttl_days: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub frontend_origin: String,
    pub rate_limit_per_minute: u32,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .parse::<StorageBackend>()?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres backend");
        }

        let auth = AuthConfig {
            token_ttl_days: token_ttl_days(std::env::var("TOKEN_TTL_DAYS").ok().as_deref()),
            cookie_name: std::env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "auth_token".into()),
            cookie_secure: env_parse("AUTH_COOKIE_SECURE", false),
        };

        Ok(Self {
            backend,
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 8080),
            frontend_origin: std::env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            rate_limit_per_minute: env_parse("RATE_LIMIT_PER_MINUTE", 20),
            auth,
        })
    }

    /// Defaults for the in-memory backend; tests tweak fields from here.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_origin: "http://localhost:3000".into(),
            rate_limit_per_minute: 20,
            auth: AuthConfig {
                token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
                cookie_name: "auth_token".into(),
                cookie_secure: false,
            },
        }
    }
}

/// Values that do not parse, are not positive, or exceed
/// `MAX_TOKEN_TTL_DAYS` fall back to the default.
fn token_ttl_days(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|days| (1..=MAX_TOKEN_TTL_DAYS).contains(days))
        .unwrap_or(DEFAULT_TOKEN_TTL_DAYS)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn token_ttl_outside_the_sane_range_uses_the_default() {
        assert_eq!(token_ttl_days(None), 7);
        assert_eq!(token_ttl_days(Some("30")), 30);
        assert_eq!(token_ttl_days(Some(" 1 ")), 1);
        assert_eq!(token_ttl_days(Some("3650")), 3650);
        assert_eq!(token_ttl_days(Some("0")), 7);
        assert_eq!(token_ttl_days(Some("-3")), 7);
        assert_eq!(token_ttl_days(Some("3651")), 7);
        assert_eq!(token_ttl_days(Some("9223372036854775807")), 7);
        assert_eq!(token_ttl_days(Some("week")), 7);
    }

    #[test]
    fn in_memory_defaults_match_service_defaults() {
        let cfg = AppConfig::in_memory();
        assert_eq!(cfg.auth.token_ttl_days, 7);
        assert_eq!(cfg.auth.cookie_name, "auth_token");
        assert_eq!(cfg.rate_limit_per_minute, 20);
    }
}
