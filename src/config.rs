use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// Registrations with this email become administrators.
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3001")?,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|email| !email.is_empty()),
        })
    }

    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("Invalid {key} value {value:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "secret".to_string(),
            host: host.to_string(),
            port,
            admin_email: None,
        }
    }

    #[test]
    fn address_combines_host_and_port() {
        let address = config("127.0.0.1", 8080).address().unwrap();
        assert_eq!(address.port(), 8080);
    }

    #[test]
    fn address_rejects_hostnames() {
        assert!(config("not a host", 8080).address().is_err());
    }
}
