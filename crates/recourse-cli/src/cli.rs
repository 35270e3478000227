use clap::{Parser, Subcommand};
use recourse_core::Locale;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recourse")]
#[command(author, version, about = "Classify failures and inspect Recourse configuration")]
pub struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a raw failure JSON document
    Classify {
        /// File holding the failure; reads stdin when omitted
        file: Option<PathBuf>,

        /// Call-site label attached to the error
        #[arg(short, long)]
        context: Option<String>,

        /// Message catalog (id, en)
        #[arg(short, long, default_value = "id")]
        locale: Locale,

        /// Print the full classified error as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List every error kind with its recovery and message
    Taxonomy {
        /// Message catalog (id, en)
        #[arg(short, long, default_value = "id")]
        locale: Locale,
    },

    /// Load and validate a runtime configuration file
    CheckConfig {
        /// YAML or JSON configuration file
        file: PathBuf,
    },
}
