use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub admin_users: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("MUSEUM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MUSEUM_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let db_path: PathBuf = std::env::var("MUSEUM_DB_PATH")
            .unwrap_or_else(|_| "museum.db".into())
            .into();
        let host = std::env::var("MUSEUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("MUSEUM_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("MUSEUM_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("MUSEUM_HOST/MUSEUM_PORT do not form a socket address")?;

        let admin_users = parse_admin_users(&std::env::var("MUSEUM_ADMIN_USERS").unwrap_or_default());

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            admin_users,
        })
    }
}

fn parse_admin_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
