//! XDF Trim - one-shot segment export
//!
//! Cuts one or more channels to a window and writes one CSV per channel with
//! the triggers of that window attached to their nearest samples.
//!
//! Window bounds are seconds (`12.5`), trigger indices (`#0`), or trigger
//! labels (`stimulus_on`, first occurrence).
//!
//! # Usage
//!
//! ```bash
//! # Single channel to an explicit file
//! xdf-trim recording.json --channel "Stream 1 - EDA" --start '#0' --end '#1' -o eda.csv
//!
//! # Several channels into a directory, one file per channel
//! xdf-trim recording.json -C "Stream 2 - X" -C "Stream 2 - Y" --start 1.0 --end 3.0 --output-dir segments/
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use xdf_segment_toolbox::cli::{LogArgs, RecordingArgs};
use xdf_segment_toolbox::container::open_recording;
use xdf_segment_toolbox::export::export_paths;
use xdf_segment_toolbox::session::{Session, WindowBound};

#[derive(Parser)]
#[command(name = "xdf-trim")]
#[command(about = "Trim channels to a window and export trigger-aligned CSV segments")]
#[command(version)]
struct Args {
    #[command(flatten)]
    recording: RecordingArgs,

    #[arg(long = "channel", short = 'C', required = true, help = "Channel label (repeatable)")]
    channels: Vec<String>,

    #[arg(long, allow_hyphen_values = true, help = "Window start: seconds, #index or trigger label")]
    start: String,

    #[arg(long, allow_hyphen_values = true, help = "Window end: seconds, #index or trigger label")]
    end: String,

    #[arg(long, short = 'o', help = "Output file (single channel only)")]
    output: Option<PathBuf>,

    #[arg(long, default_value = ".", help = "Directory for per-channel files")]
    output_dir: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.log.quiet {
        xdf_segment_toolbox::display_license_notice("xdf-trim");
    }
    args.log.init_tracing();

    if args.output.is_some() && args.channels.len() > 1 {
        bail!("--output takes a single channel; use --output-dir for several");
    }

    let start: WindowBound = args.start.parse()?;
    let end: WindowBound = args.end.parse()?;

    let config = args.recording.load_config()?;
    let mut session = Session::new(config);
    let source = open_recording(&args.recording.recording)?;
    session.load(source.as_ref())?;

    let window = session.window(&start, &end)?;
    println!("Window: [{:.6}, {:.6}] s", window.start, window.end);

    // Validate every channel and output path before writing any file
    session.trim_many(&args.channels, window)?;

    let paths = match &args.output {
        Some(path) => vec![path.clone()],
        None => export_paths(&args.output_dir, &args.channels)?,
    };
    if args.output.is_none() {
        std::fs::create_dir_all(&args.output_dir)?;
    }

    for (label, path) in args.channels.iter().zip(&paths) {
        let segment = session.export_csv_file(label, window, path)?;

        println!("{}", label);
        println!("  ├─ File: {}", path.display());
        println!("  ├─ Rows: {}", segment.rows.len());
        println!(
            "  └─ Triggers: {} of {} attached",
            segment.triggers_attached, segment.triggers_in_range
        );
        for row in segment.labeled_rows() {
            println!("       {:.6} s  {}", row.time, row.trigger);
        }
    }

    Ok(())
}
