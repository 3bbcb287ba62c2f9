//! XDF Toolbox - interactive segment session
//!
//! Reads line commands from stdin and answers on stdout with `STATUS` /
//! `ERROR` lines, so it can be driven by hand or by a controlling process.
//! Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! xdf-toolbox recording.json
//! > CHANNELS
//! > TRIGGERS
//! > SAVE #0 #1 "Stream 1 - EDA"
//! > PROCESS --saved "Stream 1 - EDA"
//! > EXPORT 1.0 3.0 eda.csv "Stream 1 - EDA"
//! > QUIT
//! ```

use anyhow::Result;
use clap::Parser;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use xdf_segment_toolbox::cli::{load_config, LogArgs};
use xdf_segment_toolbox::commands::handle_commands;
use xdf_segment_toolbox::session::Session;

#[derive(Parser)]
#[command(name = "xdf-toolbox")]
#[command(about = "Interactive channel trimming, trigger alignment and export for LSL recordings")]
#[command(version)]
struct Args {
    /// Recording to load before reading commands
    recording: Option<PathBuf>,

    #[arg(long, short = 'c', help = "JSON config file (delimiter, expected_rates)")]
    config: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.log.quiet {
        xdf_segment_toolbox::display_license_notice("xdf-toolbox");
    }
    args.log.init_tracing();

    let config = load_config(args.config.as_deref())?;
    let mut session = Session::new(config);

    let preload = match &args.recording {
        Some(path) => format!("LOAD \"{}\"\n", path.display()),
        None => String::new(),
    };

    let stdin = io::stdin();
    let input = Cursor::new(preload).chain(stdin.lock());
    handle_commands(&mut session, input, io::stdout().lock())
}
