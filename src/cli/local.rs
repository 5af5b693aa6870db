//! `local` subcommand

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{parse_csv, runtime, AnalysisArgs};
use super::Logging;
use crate::analysis::{analyze, Sources};
use crate::fetch::LocalRepository;

#[derive(Args, Debug)]
pub struct LocalArgs {
    /// Directory inside the checkout
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Revision the changes are compared against
    #[arg(long, default_value = "HEAD")]
    pub base: String,

    /// Revision holding the changes (defaults to the working tree)
    #[arg(long)]
    pub head: Option<String>,

    /// Comma-separated changed files, instead of a git diff
    #[arg(long)]
    pub files: Option<String>,

    /// Index files ignored by .gitignore too
    #[arg(long)]
    pub no_gitignore: bool,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

pub fn run(args: LocalArgs, logging: &Logging) -> Result<()> {
    let mut repo = LocalRepository::open(&args.path)
        .with_context(|| format!("Cannot open {}", args.path.display()))?
        .base(args.base.clone())
        .head(args.head.clone())
        .respect_gitignore(!args.no_gitignore);
    if let Some(files) = parse_csv(&args.files) {
        repo = repo.changed_files(files);
    }

    let config = args.analysis.load_config(repo.root(), None)?;
    logging.apply_config(config.debug);
    let options = args.analysis.options(&config)?;

    let rt = runtime()?;
    let ctx = rt
        .block_on(analyze(Sources::from_repository(&repo), &options))
        .with_context(|| format!("Analysis of {} failed", repo.root().display()))?;

    if !ctx.skipped.is_empty() {
        tracing::info!("Skipped: {}", ctx.skipped.join(", "));
    }
    args.analysis.emit(&ctx)
}
