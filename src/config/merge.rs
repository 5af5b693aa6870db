//! CLI overrides on top of file and environment configuration

use crate::domain::Config;

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub path_filters: Option<Vec<String>>,
    pub max_files: Option<usize>,
    pub fetch_concurrency: Option<usize>,
    pub index_timeout_secs: Option<u64>,
    pub api_base_url: Option<String>,
    pub debug: Option<bool>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(filters) = cli.path_filters {
        config.path_filters = filters;
    }
    if let Some(max_files) = cli.max_files {
        config.max_files = max_files;
    }
    if let Some(concurrency) = cli.fetch_concurrency {
        config.fetch_concurrency = concurrency;
    }
    if let Some(timeout) = cli.index_timeout_secs {
        config.index.timeout_secs = timeout;
    }
    if let Some(url) = cli.api_base_url {
        config.github.api_base_url = url;
    }
    if let Some(debug) = cli.debug {
        config.debug = debug;
    }
    config
}
