use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::ToolConfig;

/// Logging flags shared by every binary.
#[derive(Args, Clone, Debug, Default)]
pub struct LogArgs {
    #[arg(long, short = 'v', help = "Debug logging (overridden by RUST_LOG)")]
    pub verbose: bool,

    #[arg(long, short = 'q', help = "Minimal output mode: no license notice, warnings only")]
    pub quiet: bool,
}

impl LogArgs {
    /// Install the tracing subscriber. Logs go to stderr so stdout stays
    /// free for command replies and exported data.
    pub fn init_tracing(&self) {
        let default_level = if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// A recording to open plus an optional tool config file.
#[derive(Args, Clone, Debug)]
pub struct RecordingArgs {
    #[arg(help = "Recording to open (.json dump or Zarr store)")]
    pub recording: PathBuf,

    #[arg(long, short = 'c', help = "JSON config file (delimiter, expected_rates)")]
    pub config: Option<PathBuf>,
}

impl RecordingArgs {
    pub fn load_config(&self) -> Result<ToolConfig> {
        load_config(self.config.as_deref())
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ToolConfig> {
    match path {
        Some(path) => {
            let config = ToolConfig::from_file(path)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(ToolConfig::default()),
    }
}
