/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_PRODUCTION`: JSON logs and strict CORS (default: false)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `JWT_SECRET`: Secret key for JWT signing (required, 32+ characters)
/// - `CODE_GENERATION_ENABLED`: Whether door codes may be generated (default: true)
/// - `CODE_ALLOWED_IPS`: Comma separated shop addresses; empty accepts any
/// - `CODE_TRUST_FORWARDED_FOR`: Read the client address from `X-Forwarded-For` (default: false)
/// - `APP_UTC_OFFSET_MINUTES`: Local time offset (default: 60)
/// - `SHIFT_CYCLE_START`: Monday of week A of the shift cycle (default: 2024-01-01)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use membres_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use membres_shared::auth::voters::CodeVoter;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::IpAddr;

/// Largest offset chrono accepts, in minutes (exclusive)
const MAX_OFFSET_MINUTES: i32 = 24 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Door code rules
    pub codes: CodeConfig,

    /// Local time and shift calendar
    pub calendar: CalendarConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode
    pub production: bool,

    /// Allowed CORS origins, `*` for any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeConfig {
    pub generation_enabled: bool,

    /// Addresses of the shop; empty accepts any location
    pub allowed_ips: Vec<IpAddr>,

    /// Only enable behind a reverse proxy that overwrites the header
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Offset of local time from UTC
    pub utc_offset_minutes: i32,

    /// A Monday in week A of the four-week cycle
    pub cycle_start: NaiveDate,
}

impl CalendarConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

fn parse_bool(name: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{name} must be a boolean, got {other:?}"),
        },
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated list, dropping empty items
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_ip_list(raw: &str) -> anyhow::Result<Vec<IpAddr>> {
    parse_list(raw)
        .iter()
        .map(|item| {
            item.parse::<IpAddr>()
                .map_err(|e| anyhow::anyhow!("Invalid address {item:?} in CODE_ALLOWED_IPS: {e}"))
        })
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let production = parse_bool("API_PRODUCTION", false)?;
        let cors_origins = parse_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let generation_enabled = parse_bool("CODE_GENERATION_ENABLED", true)?;
        let allowed_ips = parse_ip_list(&env::var("CODE_ALLOWED_IPS").unwrap_or_default())?;
        let trust_forwarded_for = parse_bool("CODE_TRUST_FORWARDED_FOR", false)?;

        let utc_offset_minutes = env::var("APP_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<i32>()?;
        if utc_offset_minutes.abs() >= MAX_OFFSET_MINUTES {
            anyhow::bail!("APP_UTC_OFFSET_MINUTES must be within one day");
        }

        let cycle_start = env::var("SHIFT_CYCLE_START")
            .unwrap_or_else(|_| "2024-01-01".to_string())
            .parse::<NaiveDate>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
            },
            codes: CodeConfig {
                generation_enabled,
                allowed_ips,
                trust_forwarded_for,
            },
            calendar: CalendarConfig {
                utc_offset_minutes,
                cycle_start,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn code_voter(&self) -> CodeVoter {
        CodeVoter::new(
            self.codes.generation_enabled,
            self.codes.allowed_ips.clone(),
            self.calendar.offset(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            codes: CodeConfig {
                generation_enabled: true,
                allowed_ips: Vec::new(),
                trust_forwarded_for: false,
            },
            calendar: CalendarConfig {
                utc_offset_minutes: 60,
                cycle_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_ip_list() {
        let ips = parse_ip_list(" 10.0.0.1, ,::1 ").unwrap();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0], "10.0.0.1".parse::<IpAddr>().unwrap());

        assert!(parse_ip_list("").unwrap().is_empty());
        assert!(parse_ip_list("shop").is_err());
    }

    #[test]
    fn test_offset() {
        let config = test_config();
        assert_eq!(config.calendar.offset().local_minus_utc(), 3600);
    }
}
