use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use time::Time;

use crate::scheduling::clock::parse_clock;
use crate::scheduling::TimeGrid;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub schedule: ScheduleConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Without a URL the service runs on in-memory stores.
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub open: Time,
    pub close: Time,
    pub slot_minutes: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        // Clinic day
        let open = clock_var("CLINIC_OPEN_TIME", TimeGrid::DEFAULT_OPEN)?;
        let close = clock_var("CLINIC_CLOSE_TIME", TimeGrid::DEFAULT_CLOSE)?;
        let slot_minutes = match env::var("SLOT_MINUTES") {
            Ok(val) => val.parse().context("Failed to parse SLOT_MINUTES")?,
            Err(_) => TimeGrid::DEFAULT_SLOT_MINUTES,
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or_default();
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "Clinic Scheduler".to_string());

        let config = Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            schedule: ScheduleConfig {
                open,
                close,
                slot_minutes,
            },
            app: AppConfig {
                name: app_name,
                environment,
            },
        };
        config.time_grid()?;
        Ok(config)
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn time_grid(&self) -> Result<TimeGrid> {
        TimeGrid::new(
            self.schedule.open,
            self.schedule.close,
            self.schedule.slot_minutes,
        )
        .context("Invalid clinic schedule configuration")
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

fn clock_var(key: &str, default: Time) -> Result<Time> {
    match env::var(key) {
        Ok(val) => parse_clock(&val).with_context(|| format!("Failed to parse {key}")),
        Err(_) => Ok(default),
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Loads the configuration once; later calls return the same instance.
pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}
