use std::env::{self, VarError};

use thiserror::Error;

use crate::cipher::{self, CipherError};

/// Environment variable holding the symmetric key (raw string bytes).
pub const KEY_ENV: &str = "SEALED_CHAIN_KEY";

/// AES-128 demo key used when `SEALED_CHAIN_KEY` is unset.
pub const DEFAULT_KEY: &str = "examplekey123456";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SEALED_CHAIN_KEY is set but is not valid UTF-8")]
    KeyNotUnicode,
    #[error("invalid key: {0}")]
    Key(#[from] CipherError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub key: Vec<u8>,
    /// Payloads appended after genesis, in order.
    pub entries: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key: DEFAULT_KEY.as_bytes().to_vec(),
            entries: vec!["Second Block".to_string(), "Third Block".to_string()],
        }
    }
}

impl Config {
    /// Only an unset `SEALED_CHAIN_KEY` falls back to the demo key.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        match lookup(KEY_ENV) {
            Ok(key) => config.key = key.into_bytes(),
            Err(VarError::NotPresent) => {}
            Err(VarError::NotUnicode(_)) => return Err(ConfigError::KeyNotUnicode),
        }
        Ok(config)
    }

    /// Reject a key the cipher cannot use before any block is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        cipher::check_key(&self.key)?;
        Ok(())
    }
}
