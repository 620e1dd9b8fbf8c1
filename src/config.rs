use crate::cli::{validate_address, CLIError, DEFAULT_ADDRESS};
use crate::errors::Result;

/// Environment variable holding the address the server listens on
pub const ADDRESS_VAR: &str = "POS_ADDRESS";
/// Environment variable holding the SQLite database path, ":memory:" for a throwaway database
pub const DATABASE_VAR: &str = "POS_DATABASE";
/// Environment variable telling whether the sample menu is loaded on startup
pub const SEED_MENU_VAR: &str = "POS_SEED_MENU";

/// Server configuration, drawn from the environment (and a .env file if there is one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub database: String,
    pub seed_menu: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: DEFAULT_ADDRESS.to_string(),
            database: ":memory:".to_string(),
            seed_menu: true,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Config> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded environment file");
        }
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(address) = lookup(ADDRESS_VAR) {
            config.address = validate_address(address.trim())?.to_string();
        }
        if let Some(database) = lookup(DATABASE_VAR) {
            if !database.trim().is_empty() {
                config.database = database.trim().to_string();
            }
        }
        if let Some(seed) = lookup(SEED_MENU_VAR) {
            config.seed_menu = match seed.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(CLIError::InvalidParameter(seed).into()),
            };
        }

        Ok(config)
    }
}
