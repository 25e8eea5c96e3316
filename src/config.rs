use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory repository.
    pub database: Option<DatabaseConfig>,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            }),
            _ => None,
        };
        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(bcrypt::DEFAULT_COST)
            .clamp(4, 31);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 8080,
        };
        Ok(Self {
            database,
            bcrypt_cost,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let cfg = AppConfig {
            database: None,
            bcrypt_cost: 4,
            host: "127.0.0.1".into(),
            port: 3000,
        };
        assert_eq!(cfg.bind_addr(), "127.0.0.1:3000");
    }
}
