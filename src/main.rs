//! CLI entry point for folio

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Content store and stylesheet checker for a markdown portfolio site", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate front-matter and the stylesheet
    #[command(alias = "c")]
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Re-check on file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List site information
    List {
        /// Type of content to list (post, resume, tag, rule, var, breakpoint)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print a document by slug
    Show {
        /// Document slug, e.g. 2024-01-01-my-post
        slug: String,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Tag to add (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Publication date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Export the content store as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Check { strict, watch } => {
            let site = folio::Site::new(&base_dir)?;
            let clean = folio::commands::check::run(&site, strict)?;

            if watch {
                folio::commands::check::watch(&site, strict).await?;
            } else if !clean {
                std::process::exit(1);
            }
        }

        Commands::List { r#type } => {
            let site = folio::Site::new(&base_dir)?;
            folio::commands::list::run(&site, &r#type)?;
        }

        Commands::Show { slug } => {
            let site = folio::Site::new(&base_dir)?;
            folio::commands::show::run(&site, &slug)?;
        }

        Commands::New { title, tags, date } => {
            let site = folio::Site::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            let path = folio::commands::new::create_post(&site, &title, &tags, date)?;
            println!("Created: {}", site.relative(&path));
        }

        Commands::Export { output } => {
            let site = folio::Site::new(&base_dir)?;
            folio::commands::export::run(&site, output.as_deref())?;
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
