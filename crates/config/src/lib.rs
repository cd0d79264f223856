//! Configuration management for evmstate
//!
//! This crate provides functionality for managing the evmstate configuration, including loading,
//! saving, updating, and deleting configuration settings.

/// Error types for the configuration module
pub mod error;

use crate::error::Error;
use clap::Parser;
use evmstate_common::utils::io::file::{delete_path, read_file, write_file};
use serde::{Deserialize, Serialize};
#[allow(deprecated)]
use std::env::home_dir;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Environment variable which, when set, overrides the location of the configuration file.
pub const CONFIG_PATH_ENV: &str = "EVMSTATE_CONFIG_PATH";

/// Command line arguments for the configuration command
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Display and edit the current configuration",
    override_usage = "evmstate config [OPTIONS]"
)]
pub struct ConfigArgs {
    /// The target key to update.
    #[clap(required = false, default_value = "")]
    key: String,

    /// The value to set the key to.
    #[clap(required = false, default_value = "")]
    value: String,
}

/// The [`Configuration`] struct represents the persistent settings of the execution-state core.
/// The cli reads from it whenever a flag is not given explicitly.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// The largest execution memory, in bytes, the growth advisor may request
    pub max_memory_size: usize,

    /// The number of workers used to build per-account storage tries during commitment
    pub commit_threads: usize,

    /// Whether trie keys are hashed with keccak-256 before insertion
    pub secure_trie: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration { max_memory_size: 32 * 1024 * 1024, commit_threads: 4, secure_trie: false }
    }
}

/// Resolves the configuration file location, honoring [`CONFIG_PATH_ENV`].
#[allow(deprecated)]
pub fn config_path() -> Result<PathBuf, Error> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let mut home = home_dir().ok_or_else(|| {
        Error::Generic(
            "failed to get home directory. does your os support `std::env::home_dir()`?"
                .to_string(),
        )
    })?;
    home.push(".evmstate");
    home.push("config.toml");
    Ok(home)
}

fn config_path_str() -> Result<String, Error> {
    config_path()?
        .to_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::Generic("failed to convert path to string".to_string()))
}

impl Configuration {
    /// Returns the current configuration, writing the defaults to disk if no file exists yet.
    pub fn load() -> Result<Self, Error> {
        let path = config_path_str()?;

        // if the config file doesn't exist, create it
        if !PathBuf::from(&path).exists() {
            debug!("no configuration found at {}, writing defaults", path);
            let config = Configuration::default();
            config.save()?;
        }

        // read the config file
        let contents = read_file(&path)
            .map_err(|e| Error::Generic(format!("failed to read config file: {e}")))?;

        // parse the config file
        toml::from_str(&contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config file: {e}")))
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> Result<(), Error> {
        write_file(
            &config_path_str()?,
            &toml::to_string(&self)
                .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))?,
        )
        .map_err(|e| Error::Generic(format!("failed to write config file: {e}")))?;

        Ok(())
    }

    /// Deletes the configuration file.
    pub fn delete() -> Result<(), Error> {
        let path = config_path_str()?;
        if !delete_path(&path) {
            return Err(Error::Generic(format!("failed to delete config file at {path}")));
        }

        Ok(())
    }

    /// Update a single key/value pair in the configuration and persist it.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        // update the key in the struct and ensure it's the correct type
        match key {
            "max_memory_size" => {
                self.max_memory_size = value.parse::<usize>().map_err(|e| {
                    Error::ParseError(format!("max_memory_size must be an integer: {e}"))
                })?;
            }
            "commit_threads" => {
                self.commit_threads = value.parse::<usize>().map_err(|e| {
                    Error::ParseError(format!("commit_threads must be an integer: {e}"))
                })?;
            }
            "secure_trie" => {
                self.secure_trie = value.parse::<bool>().map_err(|e| {
                    Error::ParseError(format!("secure_trie must be true or false: {e}"))
                })?;
            }
            _ => return Err(Error::InvalidKey(key.to_string())),
        }

        // write the updated config to disk
        self.save()?;

        Ok(())
    }
}

/// The `config` command is used to display and edit the current configuration.
pub fn config(args: ConfigArgs) -> Result<(), Error> {
    if !args.key.is_empty() {
        if !args.value.is_empty() {
            // read the config file and update the key/value pair
            let mut config = Configuration::load()?;
            config.update(&args.key, &args.value)?;
            info!("updated configuration! Set '{}' = '{}' .", &args.key, &args.value);
        } else {
            // key is set, but no value is set
            error!("found key but no value to set. Please specify a value to set, use `evmstate config --help` for more information.");
        }
    } else {
        // no key is set, print the config file
        println!("{:#?}", Configuration::load()?);
        info!("use `evmstate config <KEY> <VALUE>` to set a key/value pair.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn use_temp_config() {
        let path = std::env::temp_dir()
            .join(format!("evmstate-config-test-{}", std::process::id()))
            .join("config.toml");
        std::env::set_var(CONFIG_PATH_ENV, path);
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.max_memory_size, 33_554_432);
        assert_eq!(config.commit_threads, 4);
        assert!(!config.secure_trie);
    }

    #[test]
    #[serial]
    fn test_load_configuration() {
        use_temp_config();
        Configuration::delete().expect("failed to delete config file");
        let config = Configuration::load().expect("failed to load config file");

        assert_eq!(config, Configuration::default());
    }

    #[test]
    #[serial]
    fn test_save_configuration() {
        use_temp_config();
        Configuration::delete().expect("failed to delete config file");
        let mut config = Configuration::default();

        config.update("commit_threads", "8").expect("failed to update commit_threads");
        config.update("secure_trie", "true").expect("failed to update secure_trie");

        let loaded_config = Configuration::load().expect("failed to load config file");
        assert_eq!(loaded_config.commit_threads, 8);
        assert!(loaded_config.secure_trie);
        assert_eq!(loaded_config.max_memory_size, 33_554_432);
    }

    #[test]
    #[serial]
    fn test_update_rejects_bad_values() {
        use_temp_config();
        let mut config = Configuration::default();

        assert!(matches!(config.update("commit_threads", "many"), Err(Error::ParseError(_))));
        assert!(matches!(config.update("secure_trie", "maybe"), Err(Error::ParseError(_))));
        assert!(matches!(config.update("rpc_url", "http://localhost"), Err(Error::InvalidKey(_))));
        assert_eq!(config, Configuration::default());
    }

    #[test]
    #[serial]
    fn test_partial_file_uses_defaults() {
        use_temp_config();
        let path = config_path_str().expect("failed to resolve path");
        write_file(&path, "max_memory_size = 1024\n").expect("failed to write config");

        let config = Configuration::load().expect("failed to load config file");
        assert_eq!(config.max_memory_size, 1024);
        assert_eq!(config.commit_threads, 4);

        Configuration::delete().expect("failed to delete config file");
    }

    #[test]
    #[serial]
    fn test_delete_configuration() {
        use_temp_config();
        let mut config = Configuration::load().expect("failed to load config file");
        config.update("max_memory_size", "4096").expect("failed to update max_memory_size");

        Configuration::delete().expect("failed to delete config file");
        let config = Configuration::load().expect("failed to load config file");

        assert_eq!(config, Configuration::default());
    }
}
