use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Explain model decisions and analyse feature importance.
///
/// Inputs are JSON files; the result is written to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "factorlens", about = "Post-hoc explanation engine")]
pub struct CliArgs {
    /// Directory holding ExplainerConfig / ImportanceConfig documents
    /// (overrides RULES_DIR)
    #[arg(long, global = true)]
    pub rules_dir: Option<PathBuf>,

    /// Force compact JSON output
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Explain one prediction from recorded model and attribution outputs
    Explain {
        /// Request file: instance, prediction, attributions, optional history
        #[arg(long)]
        request: PathBuf,
    },
    /// Run the importance analysis over a labelled dataset
    Importance {
        /// Dataset file: feature_names, rows, targets, optional precomputed attributions
        #[arg(long)]
        dataset: PathBuf,

        /// Temporal importance file: feature name → [{timestamp, value}]
        #[arg(long)]
        temporal: Option<PathBuf>,
    },
}
