//! Blog importer CLI
//!
//! One subcommand per platform, plus `relink`, `list` and `validate`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use importer::{
    error::Result,
    models::Config,
    pipeline::{self, LinkTable},
    registry::{self, ImportCommand, Platform},
    sources::ImportContext,
    storage::LocalStorage,
};

/// Import legacy blog exports into front-matter post files
#[derive(Parser, Debug)]
#[command(name = "importer", version, about = "Blog export importer")]
struct Cli {
    /// Site directory receiving _posts/, _drafts/, ... (overrides output.dest_dir)
    #[arg(short, long, global = true)]
    dest: Option<PathBuf>,

    /// Configuration file; defaults are used when it does not exist
    #[arg(short, long, global = true, default_value = "importer.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Import(ImportCommand),

    /// Rewrite internal links in already written posts
    Relink {
        /// Origin of the old blog, e.g. https://example.blogspot.com
        #[arg(long)]
        origin: Option<String>,

        /// Front-matter field holding each post's original URL
        #[arg(long, default_value = "blogger_orig_url")]
        field: String,
    },

    /// List the available importers
    List,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        log::debug!("Loading configuration from {}", cli.config.display());
        Config::load(&cli.config)?
    } else {
        log::debug!("{} not found, using defaults", cli.config.display());
        Config::default()
    };
    if let Some(dest) = &cli.dest {
        config.output.dest_dir = dest.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Import(command) => {
            config.validate()?;
            let importer = registry::importer_for(command);
            let storage = LocalStorage::new(&config.output.dest_dir);
            let ctx = ImportContext::new(&config, &storage);
            let summary = pipeline::run_import(importer.as_ref(), &ctx)?;
            if !summary.written.is_empty() {
                log::info!("Done! {} files written", summary.written.len());
            }
        }

        Command::Relink { origin, field } => {
            let storage = LocalStorage::new(&config.output.dest_dir);
            let table = LinkTable::from_written(&storage, &field)?;
            let changed = pipeline::rewrite_internal_links(&storage, origin.as_deref(), &table)?;
            log::info!("Rewrote internal links in {} posts", changed);
        }

        Command::List => {
            for platform in Platform::ALL {
                println!("{:<16} {}", platform.name(), platform.description());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("Config OK");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
