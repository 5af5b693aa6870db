//! `github` subcommand

use anyhow::{Context, Result};
use clap::Args;

use super::utils::{runtime, AnalysisArgs};
use super::Logging;
use crate::analysis::{analyze, Sources};
use crate::fetch::github::parse_repo_slug;
use crate::fetch::GitHubClient;

#[derive(Args, Debug)]
pub struct GithubArgs {
    /// Repository as OWNER/NAME (a github.com URL is accepted too)
    #[arg(short, long)]
    pub repo: String,

    /// Pull request number
    #[arg(long)]
    pub pr: u64,

    /// API token; defaults to the variable named by `github.token_env`
    #[arg(long)]
    pub token: Option<String>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long)]
    pub api_url: Option<String>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

pub fn run(args: GithubArgs, logging: &Logging) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = args.analysis.load_config(&cwd, args.api_url.clone())?;
    logging.apply_config(config.debug);

    let slug = parse_repo_slug(&args.repo)
        .map(|(owner, name)| format!("{owner}/{name}"))
        .with_context(|| format!("Invalid repository '{}': expected OWNER/NAME", args.repo))?;

    let token = args
        .token
        .clone()
        .or_else(|| std::env::var(&config.github.token_env).ok())
        .filter(|t| !t.trim().is_empty());
    if token.is_none() {
        tracing::warn!(
            "No GitHub token (set --token or {}); unauthenticated requests are heavily rate limited",
            config.github.token_env
        );
    }

    let mut options = args.analysis.options(&config)?;
    let rt = runtime()?;
    let ctx = rt.block_on(async {
        let client =
            GitHubClient::for_pull_request(&config.github.api_base_url, &slug, args.pr, token.as_deref())
                .await
                .with_context(|| format!("Failed to open pull request {slug}#{}", args.pr))?;
        options.reference = Some(client.head_sha().to_string());
        analyze(Sources::from_repository(&client), &options)
            .await
            .with_context(|| format!("Analysis of {slug}#{} failed", args.pr))
    })?;

    args.analysis.emit(&ctx)
}
