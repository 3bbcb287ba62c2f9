//! XDF Inspect - stream, channel and trigger overview
//!
//! Loads a recording the same way the interactive session does and prints
//! what the session would see: numeric streams with their channels and
//! resolved sampling rates, then the merged trigger list.
//!
//! # Usage
//!
//! ```bash
//! xdf-inspect recording.json
//! xdf-inspect recording.zarr --verbose
//! xdf-inspect recording.json --stream Wristband
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use xdf_segment_toolbox::cli::{LogArgs, RecordingArgs};
use xdf_segment_toolbox::container::open_recording;
use xdf_segment_toolbox::registry::{Channel, SourceStream};
use xdf_segment_toolbox::session::Session;
use xdf_segment_toolbox::srate::RateSource;

#[derive(Parser)]
#[command(name = "xdf-inspect")]
#[command(about = "Inspect the streams, channels and triggers of a recording")]
#[command(version)]
struct Args {
    #[command(flatten)]
    recording: RecordingArgs,

    /// Filter to specific stream name(s)
    #[arg(short, long)]
    stream: Option<Vec<String>>,

    /// Skip the trigger list
    #[arg(long)]
    no_triggers: bool,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.log.quiet {
        xdf_segment_toolbox::display_license_notice("xdf-inspect");
    }
    args.log.init_tracing();

    let config = args.recording.load_config()?;
    let mut session = Session::new(config);
    let source = open_recording(&args.recording.recording)?;
    let summary = session
        .load(source.as_ref())
        .with_context(|| format!("loading {}", args.recording.recording.display()))?;

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║              XDF Recording Inspector                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Recording: {}", summary.source);
    println!();

    let registry = session.registry()?;
    let streams: Vec<&Arc<SourceStream>> = registry
        .streams()
        .iter()
        .filter(|stream| match (&args.stream, stream.header.name.as_deref()) {
            (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();

    println!("NUMERIC STREAMS ({} found, {} channel(s) total)", streams.len(), registry.len());
    println!();

    for (idx, stream) in streams.iter().enumerate() {
        let is_last = idx + 1 == streams.len();
        let prefix = if is_last { "  └─" } else { "  ├─" };
        let indent = if is_last { "     " } else { "  │  " };

        let mut channels: Vec<&Channel> = registry
            .channels()
            .filter(|channel| Arc::ptr_eq(&channel.stream, stream))
            .collect();
        channels.sort_by_key(|channel| channel.column);

        println!(
            "{} Stream {} - {} ({})",
            prefix,
            stream.number,
            stream.header.name.as_deref().unwrap_or("unnamed"),
            stream.header.stream_type.as_deref().unwrap_or("no type")
        );
        println!("{}├─ Channels: {}", indent, stream.channel_count);

        let num_samples = stream.timestamps.len();
        println!("{}├─ Samples: {}", indent, num_samples);
        match (stream.timestamps.first(), stream.timestamps.last()) {
            (Some(first), Some(last)) if num_samples >= 2 => {
                println!("{}├─ Duration: {:.3} s", indent, last - first);
                println!("{}├─ Time Range: {:.6} → {:.6}", indent, first, last);
            }
            (Some(_), _) => println!("{}├─ Duration: single sample", indent),
            _ => println!("{}├─ Duration: no samples", indent),
        }

        if let Some(channel) = channels.first() {
            match session.resolve_rate(channel) {
                Some(resolution) => {
                    let origin = match resolution.source {
                        RateSource::Declared => "declared",
                        RateSource::Expected => "expected for type",
                    };
                    println!("{}├─ Rate: {:.3} Hz ({})", indent, resolution.rate, origin);
                    if let Some(notice) = resolution.notice {
                        println!("{}├─ NOTE: {}", indent, notice);
                    }
                }
                None => println!("{}├─ Rate: unknown", indent),
            }
        }

        println!("{}└─ Labels:", indent);
        for (c_idx, channel) in channels.iter().enumerate() {
            let branch = if c_idx + 1 == channels.len() { "└─" } else { "├─" };
            if args.log.verbose {
                println!(
                    "{}   {} {} (column {}, {} samples)",
                    indent,
                    branch,
                    channel.label,
                    channel.column,
                    channel.samples.len()
                );
            } else {
                println!("{}   {} {}", indent, branch, channel.label);
            }
        }
        println!();
    }

    if !args.no_triggers {
        let triggers = session.triggers();
        println!("TRIGGERS ({} found)", triggers.len());
        for (idx, event) in triggers.iter().enumerate() {
            let prefix = if idx + 1 == triggers.len() { "  └─" } else { "  ├─" };
            println!("{} #{} {}", prefix, idx, event);
        }
    }

    Ok(())
}
