//! neon CLI - Packaging tool for Neon addons
//!
//! Commands:
//! - `neon add-platform` - Declare a platform, Rust target or preset
//! - `neon update-platforms` - Create binary packages and optional dependencies
//! - `neon list-platforms` - Print the platforms the project builds for
//! - `neon preset` - Print the platforms of a preset
//! - `neon rust-target` - Print the Rust target declared for a platform
//! - `neon current-platform` - Print the Node platform of this machine
//! - `neon show` - Print the platform catalog
//! - `neon upgrade` - Rewrite `package.json` in the current schema

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod add;
mod package;
mod query;
mod upgrade;

#[derive(Parser)]
#[command(name = "neon")]
#[command(author, version, about = "Packaging tool for Neon addons", long_about = None)]
struct Cli {
    /// Project directory containing package.json (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    cwd: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare a Node platform, Rust target or platform preset
    AddPlatform {
        /// Node platform (e.g., linux-x64-gnu), Rust target or preset name
        platform: String,

        /// Create binary packages for the new platforms in this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Generate a bundler module at this path
        #[arg(short, long)]
        bundle: Option<PathBuf>,
    },

    /// Create missing binary packages and update optionalDependencies
    UpdatePlatforms {
        /// Directory holding the binary packages
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Generate a bundler module at this path
        #[arg(short, long)]
        bundle: Option<PathBuf>,
    },

    /// Print the platforms declared in package.json
    ListPlatforms,

    /// Print the platforms of a preset
    Preset {
        /// Preset name (e.g., desktop)
        preset: String,
    },

    /// Print the Rust target declared for a Node platform
    RustTarget {
        /// Node platform (default: the current platform)
        platform: Option<String>,
    },

    /// Print the Node platform of this machine
    CurrentPlatform,

    /// Print a table from the platform catalog
    Show {
        #[arg(value_enum)]
        table: query::Table,
    },

    /// Rewrite package.json in the current schema
    Upgrade,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NEON_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::AddPlatform {
            platform,
            out_dir,
            bundle,
        } => {
            add::run(&cli.cwd, &platform, out_dir, bundle)?;
        }
        Commands::UpdatePlatforms { out_dir, bundle } => {
            package::update_platforms(&cli.cwd, out_dir, bundle)?;
        }
        Commands::ListPlatforms => {
            query::list_platforms(&cli.cwd)?;
        }
        Commands::Preset { preset } => {
            query::preset(&preset)?;
        }
        Commands::RustTarget { platform } => {
            query::rust_target(&cli.cwd, platform.as_deref())?;
        }
        Commands::CurrentPlatform => {
            query::current_platform()?;
        }
        Commands::Show { table } => {
            query::show(table)?;
        }
        Commands::Upgrade => {
            upgrade::run(&cli.cwd)?;
        }
    }

    Ok(())
}
