//! Config file loading and environment overlay

use crate::domain::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "TESTSCOUT_";

const CONFIG_CANDIDATES: &[&str] = &[
    "testscout.toml",
    ".testscout.toml",
    "testscout.yml",
    ".testscout.yml",
    "testscout.yaml",
    ".testscout.yaml",
];

/// Load the config file for `repo_root`.
///
/// An explicit `config_path` must parse. An auto-discovered file that fails
/// to parse is reported and ignored.
pub fn load_config(repo_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(repo_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {:#}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

/// Overlay `TESTSCOUT_*` environment variables on `config`.
///
/// Nested keys use `__`, e.g. `TESTSCOUT_INDEX__TIMEOUT_SECS=30`.
pub fn apply_env(config: Config) -> Result<Config> {
    apply_env_with_prefix(config, ENV_PREFIX)
}

pub fn apply_env_with_prefix(config: Config, prefix: &str) -> Result<Config> {
    Figment::from(Serialized::defaults(config))
        .merge(Env::prefixed(prefix).split("__"))
        .extract()
        .with_context(|| format!("Invalid {prefix}* environment configuration"))
}

/// Parse TOML config, supporting a nested `[testscout]` section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get("testscout") {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested `testscout` section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get("testscout") {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(repo_root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|c| repo_root.join(c)).find(|p| p.exists())
}
