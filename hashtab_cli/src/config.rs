//! Layered CLI configuration
//!
//! Priority, lowest first: built-in defaults, the TOML config file, then
//! `HASHTAB_`-prefixed environment variables (`__` separates sections, e.g.
//! `HASHTAB_CORE__BLOCK_SIZE=1048576`). Command-line flags are applied on top
//! by the caller.

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use hashtab_core::{AlgorithmSelection, CoreConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub hashing: HashingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct HashingConfig {
    /// Algorithms used when `hash` gets no `--algorithm`
    pub default_algorithms: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub default_format: OutputFormat,
    pub color_enabled: bool,
    pub progress_enabled: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            default_algorithms: vec!["crc32".to_string(), "sha256".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text,
            color_enabled: true,
            progress_enabled: true,
        }
    }
}

impl AppConfig {
    /// Apply CLI argument overrides to the configuration
    pub fn apply_cli_overrides(&mut self, block_size: Option<usize>, max_blocks: Option<usize>) {
        if let Some(size) = block_size {
            self.core.block_size = size;
        }
        if let Some(blocks) = max_blocks {
            self.core.max_allocations = blocks;
        }
    }

    /// Resolve the configured default algorithms
    pub fn default_selection(&self) -> Result<AlgorithmSelection> {
        AlgorithmSelection::from_names(&self.hashing.default_algorithms)
            .context("Invalid hashing.default_algorithms")
    }
}

/// Configuration manager that handles platform paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Self {
        Self {
            config_path: crate::paths::get_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables
        figment = figment.merge(Env::prefixed("HASHTAB_").split("__"));

        let config: AppConfig = figment.extract().context("Failed to load configuration")?;
        config
            .core
            .validate()
            .context("Invalid core configuration")?;
        Ok(config)
    }

    /// Effective configuration rendered as TOML
    pub fn show(&self) -> Result<String> {
        let config = self.load()?;
        toml::to_string_pretty(&config).context("Failed to render configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.effective_value()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        Self::render_value(current)
            .ok_or_else(|| anyhow::anyhow!("Value at '{}' is not a simple type", key))
    }

    /// Set a configuration value by key (dot notation) in the config file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed_value = Self::parse_config_value(key, value)?;

        // Load existing file or start a new one
        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut config;
        for part in sections {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{}'", part);
            };
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), parsed_value);

        // Reject files that would no longer load
        let candidate = toml::to_string_pretty(&config)?;
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(&candidate))
            .extract::<AppConfig>()
            .with_context(|| format!("Invalid value for {key}"))?
            .core
            .validate()
            .with_context(|| format!("Invalid value for {key}"))?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, candidate)?;

        Ok(())
    }

    /// List all configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = self.effective_value()?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn effective_value(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            other => {
                if let Some(rendered) = Self::render_value(other) {
                    items.push((prefix, rendered));
                }
            }
        }
    }

    fn render_value(value: &toml::Value) -> Option<String> {
        match value {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            toml::Value::Array(items) => items
                .iter()
                .map(Self::render_value)
                .collect::<Option<Vec<_>>>()
                .map(|items| items.join(",")),
            _ => None,
        }
    }

    /// Parse a value to the appropriate TOML type
    fn parse_config_value(key: &str, value: &str) -> Result<toml::Value> {
        match key {
            "core.block_size" | "core.max_allocations" | "core.progress_resolution" => {
                let num: i64 = value.parse().context("Expected integer value")?;
                if num <= 0 {
                    anyhow::bail!("{key} must be greater than 0");
                }
                Ok(toml::Value::Integer(num))
            }
            "hashing.default_algorithms" => {
                let names: Vec<&str> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                AlgorithmSelection::from_names(&names)
                    .with_context(|| format!("Invalid algorithm list '{value}'"))?;
                Ok(toml::Value::Array(
                    names
                        .into_iter()
                        .map(|name| toml::Value::String(name.to_string()))
                        .collect(),
                ))
            }
            "output.default_format" => {
                let format = OutputFormat::from_string(value)?;
                Ok(toml::Value::String(format.to_string()))
            }
            k if k.ends_with("_enabled") => {
                let bool_val: bool = value
                    .parse()
                    .context("Expected boolean value (true/false)")?;
                Ok(toml::Value::Boolean(bool_val))
            }
            _ => anyhow::bail!("Unknown configuration key: {key}"),
        }
    }
}

/// Load the configuration from the default location
pub fn get_config() -> Result<AppConfig> {
    ConfigManager::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_path(dir.path().join("config.toml"))
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = manager(&dir).load().unwrap();
        assert_eq!(config.core, CoreConfig::default());
        assert_eq!(config.hashing.default_algorithms, vec!["crc32", "sha256"]);
        assert_eq!(config.output.default_format, OutputFormat::Text);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[core]\nblock_size = 65536\n\n[hashing]\ndefault_algorithms = [\"ed2k\", \"md5\"]\n",
        )
        .unwrap();

        let config = manager(&dir).load().unwrap();
        assert_eq!(config.core.block_size, 65536);
        assert_eq!(config.core.max_allocations, CoreConfig::default().max_allocations);
        assert_eq!(config.hashing.default_algorithms, vec!["ed2k", "md5"]);
        assert_eq!(config.default_selection().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[core]\nblock_size = 0\n").unwrap();
        assert!(manager(&dir).load().is_err());
    }

    #[test]
    fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        manager.set("core.max_allocations", "32").unwrap();
        manager
            .set("hashing.default_algorithms", "blake3:512, sha1")
            .unwrap();
        manager.set("output.default_format", "json").unwrap();

        assert_eq!(manager.get("core.max_allocations").unwrap(), "32");
        assert_eq!(
            manager.get("hashing.default_algorithms").unwrap(),
            "blake3:512,sha1"
        );
        assert_eq!(manager.get("output.default_format").unwrap(), "json");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        assert!(manager.set("core.block_size", "0").is_err());
        assert!(manager.set("core.block_size", "big").is_err());
        assert!(manager.set("hashing.default_algorithms", "sha999").is_err());
        assert!(manager.set("output.color_enabled", "maybe").is_err());
        assert!(manager.set("network.timeout", "3").is_err());
        assert!(!dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_list_flattens_sections() {
        let dir = TempDir::new().unwrap();
        let items = manager(&dir).list().unwrap();
        let keys: Vec<_> = items.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"core.block_size"));
        assert!(keys.contains(&"hashing.default_algorithms"));
        assert!(keys.contains(&"output.progress_enabled"));
    }

    #[test]
    fn test_unknown_key() {
        let dir = TempDir::new().unwrap();
        assert!(manager(&dir).get("core.nope").is_err());
    }
}
