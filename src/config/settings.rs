//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_HASH_ALGORITHM, DEFAULT_HASH_COST, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MIN_CONNECTIONS, MAX_BCRYPT_COST, MIN_BCRYPT_COST,
};
use crate::domain::{Argon2Hasher, BcryptHasher, PasswordHasher};
use crate::errors::{AppError, AppResult};

/// Supported password hashing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Bcrypt,
    Argon2,
}

impl FromStr for HashAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(HashAlgorithm::Bcrypt),
            "argon2" | "argon2id" => Ok(HashAlgorithm::Argon2),
            other => Err(AppError::config(format!(
                "unknown PASSWORD_HASH_ALGORITHM '{}'",
                other
            ))),
        }
    }
}

/// Database pool settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub hash_algorithm: HashAlgorithm,
    pub hash_cost: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are
    /// reported as [`AppError::Config`].
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_var("DATABASE_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?,
        };

        let hash_algorithm = env::var("PASSWORD_HASH_ALGORITHM")
            .unwrap_or_else(|_| DEFAULT_HASH_ALGORITHM.to_string())
            .parse()?;

        let config = Self {
            database,
            hash_algorithm,
            hash_cost: parse_var("PASSWORD_HASH_COST", DEFAULT_HASH_COST)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject hashing settings the primitive would refuse at save time.
    pub fn validate(&self) -> AppResult<()> {
        match self.hash_algorithm {
            HashAlgorithm::Bcrypt if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.hash_cost) => {
                Err(AppError::config(format!(
                    "PASSWORD_HASH_COST must be between {} and {} for bcrypt",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST
                )))
            }
            HashAlgorithm::Argon2 if self.hash_cost == 0 => Err(AppError::config(
                "PASSWORD_HASH_COST must be at least 1 for argon2",
            )),
            _ => Ok(()),
        }
    }

    /// Build the configured password hasher.
    pub fn hasher(&self) -> Arc<dyn PasswordHasher> {
        match self.hash_algorithm {
            HashAlgorithm::Bcrypt => Arc::new(BcryptHasher::new(self.hash_cost)),
            HashAlgorithm::Argon2 => Arc::new(Argon2Hasher::new(self.hash_cost)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            hash_algorithm: HashAlgorithm::Bcrypt,
            hash_cost: DEFAULT_HASH_COST,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{} must be a number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_parsing() {
        assert_eq!("bcrypt".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Bcrypt);
        assert_eq!(" Argon2id ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Argon2);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = Config::default();
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("postgres://"));
    }

    #[test]
    fn test_validate_hash_cost() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.hash_cost = 3;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.hash_algorithm = HashAlgorithm::Argon2;
        assert!(config.validate().is_ok());

        config.hash_cost = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_hasher_produces_bcrypt_hashes() {
        let config = Config {
            hash_cost: 4,
            ..Config::default()
        };
        let hash = config.hasher().hash("secret1").unwrap();
        assert!(hash.starts_with("$2b$04$"));
    }
}
