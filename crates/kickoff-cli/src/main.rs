mod cmd;
mod output;
mod project;
mod root;

use clap::{Parser, Subcommand};
use cmd::{agents::AgentsSubcommand, config::ConfigSubcommand};
use project::ProfileArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kickoff",
    about = "Profile a software project, resolve the agents it needs, and scaffold their configuration",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .kickoff/ or .git/)
    #[arg(long, global = true, env = "KICKOFF_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log resolution steps at info level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default settings and the built-in catalog to .kickoff/
    Init,

    /// Classify a brief or description into a project profile
    Analyze {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Resolve the ordered agent set for a project
    Resolve {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Resolve agents and write the configuration bundle
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Show what the fallback chain does for an unavailable agent
    Fallback {
        /// Agent id to treat as unavailable
        agent: String,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Inspect the agent catalog
    Agents {
        #[command(subcommand)]
        subcommand: AgentsSubcommand,
    },

    /// Validate settings and catalog
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Analyze { profile } => cmd::analyze::run(profile, cli.json),
        Commands::Resolve { profile } => cmd::resolve::run(&root, profile, cli.json),
        Commands::Generate { profile } => cmd::generate::run(&root, profile, cli.json),
        Commands::Fallback { agent, profile } => {
            cmd::fallback::run(&root, &agent, profile, cli.json)
        }
        Commands::Agents { subcommand } => cmd::agents::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
