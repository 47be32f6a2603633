//! # pressroom CLI
//!
//! Command-line interface for the pressroom content-to-site pipeline.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pressroom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "pressroom.yml", env = "PRESSROOM_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import each site's source and generate its HTML and markdown trees
    Build {
        /// Only this site (defaults to every configured site)
        #[arg(long)]
        site: Option<String>,
    },

    /// Write the YAML metadata backup
    Export {
        #[arg(long)]
        site: Option<String>,

        /// Directory to write into, one subdirectory per site
        /// (defaults to each site's markdown/meta)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import a site's source and report what was created
    Import {
        #[arg(long)]
        site: Option<String>,

        /// Import root to use instead of the configured source
        #[arg(long)]
        from: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Build one site and push it to its repository
    Publish {
        #[arg(long)]
        site: String,
    },

    /// Run the publish scheduler until interrupted
    Schedule,

    /// Convert a single embed block (YAML) to HTML
    Embed {
        /// File holding the block's YAML
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build { site } => commands::build_sites(&cli.config, site.as_deref()),
        Commands::Export { site, out } => {
            commands::export_meta(&cli.config, site.as_deref(), out.as_deref())
        }
        Commands::Import { site, from, json } => {
            commands::import_sites(&cli.config, site.as_deref(), from.as_deref(), json)
        }
        Commands::Publish { site } => commands::publish_site(&cli.config, &site).await,
        Commands::Schedule => commands::run_scheduler(&cli.config).await,
        Commands::Embed { file } => commands::convert_embed(&file),
    }
}
