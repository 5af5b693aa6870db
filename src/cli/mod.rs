//! Command-line interface for testscout
//!
//! Provides `github`, `local`, `tree` and `completions` subcommands.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

mod github;
mod local;
mod tree;
mod utils;

/// Find the tests a pull request should touch
#[derive(Parser)]
#[command(name = "testscout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a GitHub pull request
    Github(Box<github::GithubArgs>),

    /// Analyze changes in a local git checkout
    Local(Box<local::LocalArgs>),

    /// Print the indexed file tree of a local checkout
    Tree(tree::TreeArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Handle to the installed log filter.
pub(crate) struct Logging {
    verbose: bool,
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl Logging {
    fn install(verbose: bool) -> Self {
        let (filter, handle) = reload::Layer::new(log_filter(verbose));
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok();
        Self { verbose, handle: installed.then_some(handle) }
    }

    /// Raise the level to DEBUG when the loaded config asks for it.
    pub(crate) fn apply_config(&self, debug: bool) {
        if !debug || self.verbose {
            return;
        }
        if let Some(handle) = &self.handle {
            if let Err(e) = handle.reload(log_filter(true)) {
                tracing::warn!("Could not raise log level: {}", e);
            }
        }
    }
}

// RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
fn log_filter(debug: bool) -> EnvFilter {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    EnvFilter::from_default_env().add_directive(level.into())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let logging = Logging::install(cli.verbose);

    match cli.command {
        Commands::Github(args) => github::run(*args, &logging),
        Commands::Local(args) => local::run(*args, &logging),
        Commands::Tree(args) => tree::run(args, &logging),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
