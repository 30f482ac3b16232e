//! CLI command definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kiln_core::DocumentFormat;

/// Kiln - Component reconciler
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version)]
#[command(about = "Converge Components into builds, images, workloads, services and routes")]
#[command(
    long_about = "Kiln reads a manifest of Components and GitSources into an in-memory cluster store and reconciles every Component into its image streams, build config, deployment config, service and route."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile every Component in a manifest and print the resulting objects
    Apply {
        /// Manifest file (JSON, YAML or TOML)
        #[arg(short, long)]
        file: PathBuf,

        /// Reconciler configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of reconciliation passes over all components
        #[arg(short, long, default_value_t = 1)]
        passes: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Seed a store from a manifest and reconcile on every change until Ctrl+C
    Serve {
        /// Manifest file (JSON, YAML or TOML)
        #[arg(short, long)]
        file: PathBuf,

        /// Reconciler configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective reconciler configuration
    Config {
        /// Reconciler configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Format for printed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl From<OutputFormat> for DocumentFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => Self::Yaml,
            OutputFormat::Json => Self::Json,
        }
    }
}
