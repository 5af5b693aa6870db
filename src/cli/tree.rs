//! `tree` subcommand

use anyhow::{Context, Result};
use clap::Args;
use std::collections::HashSet;
use std::path::PathBuf;

use super::utils::{parse_csv, runtime};
use super::Logging;
use crate::analysis::run::build_index;
use crate::analysis::AnalysisOptions;
use crate::config::{resolve_config, CliOverrides};
use crate::fetch::{DiffSource, LocalRepository};
use crate::scan::render_tree;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Directory inside the checkout
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Path to config file (testscout.toml or testscout.yaml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Comma-separated path filter rules; prefix a rule with '!' to exclude
    #[arg(long)]
    pub filter: Option<String>,

    /// Star the files changed since this revision
    #[arg(long)]
    pub base: Option<String>,
}

pub fn run(args: TreeArgs, logging: &Logging) -> Result<()> {
    let mut repo = LocalRepository::open(&args.path)
        .with_context(|| format!("Cannot open {}", args.path.display()))?;
    if let Some(base) = &args.base {
        repo = repo.base(base.clone());
    }

    let overrides = CliOverrides { path_filters: parse_csv(&args.filter), ..CliOverrides::default() };
    let config = resolve_config(repo.root(), args.config.as_deref(), overrides)?;
    logging.apply_config(config.debug);
    let options = AnalysisOptions::from_config(&config).context("Invalid path filter rules")?;

    let rt = runtime()?;
    let (index, highlights) = rt.block_on(async {
        let index = build_index(&repo, &options).await;
        let highlights: HashSet<String> = if args.base.is_some() {
            match repo.list_changed_files().await {
                Ok(changed) => changed.into_iter().map(|c| c.path).collect(),
                Err(e) => {
                    tracing::warn!("Cannot list changed files: {}", e);
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };
        (index, highlights)
    });

    let root_name = repo
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    println!("{}", render_tree(&index, &root_name, &highlights));
    if !index.is_complete() {
        eprintln!("(partial index: traversal stopped early)");
    }
    Ok(())
}
