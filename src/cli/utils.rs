//! Shared CLI utilities.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisOptions, RunContext, UserCommand};
use crate::config::{resolve_config, CliOverrides};
use crate::domain::{AnalysisReport, Config};
use crate::render::{render_json, render_text, write_report};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options shared by the analysis subcommands.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Path to config file (testscout.toml or testscout.yaml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Comma-separated path filter rules; prefix a rule with '!' to exclude
    #[arg(long)]
    pub filter: Option<String>,

    /// Analyze at most this many changed files (0 = unlimited)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Concurrent content fetches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Seconds allowed for building the repository index (0 = no limit)
    #[arg(long)]
    pub index_timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Scope the report with a PR comment command, e.g. "generate tests src/app.ts"
    #[arg(long)]
    pub command: Option<String>,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Omit the generation timestamp from JSON output
    #[arg(long)]
    pub no_timestamp: bool,
}

impl AnalysisArgs {
    pub fn overrides(&self, api_base_url: Option<String>) -> CliOverrides {
        CliOverrides {
            path_filters: parse_csv(&self.filter),
            max_files: self.max_files,
            fetch_concurrency: self.concurrency,
            index_timeout_secs: self.index_timeout,
            api_base_url,
            debug: None,
        }
    }

    pub fn load_config(&self, repo_root: &Path, api_base_url: Option<String>) -> Result<Config> {
        resolve_config(repo_root, self.config.as_deref(), self.overrides(api_base_url))
    }

    pub fn options(&self, config: &Config) -> Result<AnalysisOptions> {
        AnalysisOptions::from_config(config).context("Invalid path filter rules")
    }

    /// Render the run's report (scoped by `--command` when given).
    pub fn emit(&self, ctx: &RunContext) -> Result<()> {
        let report = self.scoped_report(ctx)?;

        if let Some(path) = &self.output {
            write_report(path, &report, !self.no_timestamp)?;
            tracing::info!("Report written to {}", path.display());
        }

        match self.format {
            OutputFormat::Json => println!("{}", render_json(&report, !self.no_timestamp)?),
            OutputFormat::Text => print!("{}", render_text(&report)),
        }
        Ok(())
    }

    fn scoped_report(&self, ctx: &RunContext) -> Result<AnalysisReport> {
        let mut report = ctx.report();
        let Some(body) = &self.command else {
            return Ok(report);
        };

        let command = UserCommand::parse(body)
            .with_context(|| format!("Unrecognized command: {body}"))?;
        let targets = command.targets(&ctx.records, &report.tests_to_modify)?;
        tracing::info!("Command '{}' applies to {} files", command, targets.len());

        let keep: BTreeSet<String> = targets.into_iter().collect();
        report.retain_files(&keep);
        Ok(report)
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
