use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub storage: StorageBackend,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Где живут залы, места и брони
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "STORAGE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "seat_booking=debug,tower_http=debug".to_string(),
                storage: StorageBackend::Postgres,
            },
            database: DatabaseConfig {
                url: String::new(),
                pool_size: 20,
                acquire_timeout_secs: 5,
            },
        }
    }
}

// Прочитать переменную и распарсить, иначе значение по умолчанию
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.app.storage,
        };

        // Для in-memory хранилища база не нужна
        let url = match (env::var("DATABASE_URL"), storage) {
            (Ok(url), _) => url,
            (Err(_), StorageBackend::Memory) => String::new(),
            (Err(_), StorageBackend::Postgres) => return Err(ConfigError::Missing("DATABASE_URL")),
        };

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or(defaults.app.host),
                port: parse_or("PORT", defaults.app.port)?,
                environment: env::var("ENVIRONMENT").unwrap_or(defaults.app.environment),
                rust_log: env::var("RUST_LOG").unwrap_or(defaults.app.rust_log),
                storage,
            },
            database: DatabaseConfig {
                url,
                pool_size: parse_or("DB_POOL_SIZE", defaults.database.pool_size)?,
                acquire_timeout_secs: parse_or(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    defaults.database.acquire_timeout_secs,
                )?,
            },
        })
    }
}
