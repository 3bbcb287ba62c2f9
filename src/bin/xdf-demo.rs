//! XDF Demo - synthetic recording generator
//!
//! Writes a small multi-stream recording for trying the other tools:
//!
//! - `Wristband` (EDA, 1 channel, declared 16 Hz against the expected 15 Hz)
//! - `Accelerometer` (ACC, 3 labeled channels X/Y/Z, 25 Hz)
//! - `PupilLabs` (PUPIL, 2 channels without descriptors, 60 Hz)
//! - `Markers` (alternating `stimulus_on` / `stimulus_off` every few seconds)
//!
//! Output format follows the extension: `.zarr` writes a Zarr store,
//! anything else a JSON dump.
//!
//! # Usage
//!
//! ```bash
//! xdf-demo --output demo.json
//! xdf-demo --output demo.zarr --duration 120 --marker-interval 10
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use ndarray::Array2;
use std::f64::consts::PI;
use std::path::PathBuf;

use xdf_segment_toolbox::container::json::write_json_recording;
use xdf_segment_toolbox::header::{ChannelDescriptor, ChannelsNode, Description, StreamHeader};
use xdf_segment_toolbox::stream::{MarkerEntry, RawPayload, RawStream};
use xdf_segment_toolbox::zarr::ZarrRecordingWriter;

#[derive(Parser)]
#[command(name = "xdf-demo")]
#[command(about = "Generate a synthetic multi-stream recording with sine channels and markers")]
#[command(version)]
struct Args {
    #[arg(long, short = 'o', default_value = "demo.json", help = "Output path (.json or .zarr)")]
    output: PathBuf,

    #[arg(long, short = 'd', default_value = "60.0", help = "Recording duration in seconds")]
    duration: f64,

    #[arg(long, default_value = "5.0", help = "Seconds between markers")]
    marker_interval: f64,

    #[arg(long, default_value = "0.0", help = "Clock value of the first sample")]
    t0: f64,

    #[arg(long, help = "Seed for the noise generator")]
    seed: Option<u64>,

    #[arg(short = 'v', long = "verbose", help = "Verbose output")]
    verbose: bool,
}

struct DemoStream {
    name: &'static str,
    stream_type: &'static str,
    rate: f64,
    declared_rate: f64,
    labels: Option<&'static [&'static str]>,
    channels: usize,
    unit: &'static str,
    /// Baseline, amplitude, frequency (Hz)
    wave: (f64, f64, f64),
}

const NUMERIC_STREAMS: [DemoStream; 3] = [
    DemoStream {
        name: "Wristband",
        stream_type: "EDA",
        rate: 15.0,
        declared_rate: 16.0,
        labels: Some(&["EDA"]),
        channels: 1,
        unit: "microsiemens",
        wave: (0.4, 0.05, 0.05),
    },
    DemoStream {
        name: "Accelerometer",
        stream_type: "ACC",
        rate: 25.0,
        declared_rate: 25.0,
        labels: Some(&["X", "Y", "Z"]),
        channels: 3,
        unit: "g",
        wave: (0.0, 1.0, 1.5),
    },
    DemoStream {
        name: "PupilLabs",
        stream_type: "PUPIL",
        rate: 60.0,
        declared_rate: 60.0,
        labels: None,
        channels: 2,
        unit: "mm",
        wave: (3.5, 0.4, 0.2),
    },
];

fn header(demo: &DemoStream) -> StreamHeader {
    StreamHeader {
        name: Some(demo.name.to_string()),
        stream_type: Some(demo.stream_type.to_string()),
        channel_count: Some(demo.channels.to_string()),
        nominal_srate: Some(demo.rate),
        effective_srate: Some(demo.declared_rate),
        channel_format: Some("float32".to_string()),
        source_id: Some(format!("demo_{}", demo.name.to_lowercase())),
        desc: demo.labels.map(|labels| Description {
            channels: Some(ChannelsNode {
                channel: labels
                    .iter()
                    .map(|label| ChannelDescriptor {
                        label: Some(label.to_string()),
                        unit: Some(demo.unit.to_string()),
                        kind: Some(demo.stream_type.to_string()),
                    })
                    .collect(),
            }),
        }),
    }
}

fn generate(demo: &DemoStream, args: &Args) -> (Vec<f64>, Array2<f64>) {
    let n = (args.duration * demo.rate).floor() as usize;
    let timestamps: Vec<f64> = (0..n).map(|i| args.t0 + i as f64 / demo.rate).collect();
    let (baseline, amplitude, freq) = demo.wave;

    let samples = Array2::from_shape_fn((n, demo.channels), |(i, c)| {
        let t = i as f64 / demo.rate;
        // Phase-shift channels so they are distinguishable
        let phase = c as f64 * PI / 3.0;
        let noise = (fastrand::f64() - 0.5) * amplitude * 0.1;
        baseline + amplitude * (2.0 * PI * freq * t + phase).sin() + noise
    });
    (timestamps, samples)
}

fn markers(args: &Args) -> (Vec<f64>, Vec<String>) {
    let mut timestamps = Vec::new();
    let mut labels = Vec::new();
    let mut t = args.marker_interval;
    while t < args.duration {
        let label = if labels.len() % 2 == 0 { "stimulus_on" } else { "stimulus_off" };
        timestamps.push(args.t0 + t);
        labels.push(label.to_string());
        t += args.marker_interval;
    }
    (timestamps, labels)
}

fn marker_header() -> StreamHeader {
    StreamHeader {
        name: Some("Markers".to_string()),
        stream_type: Some("Markers".to_string()),
        channel_count: Some("1".to_string()),
        nominal_srate: Some(0.0),
        channel_format: Some("string".to_string()),
        source_id: Some("demo_markers".to_string()),
        ..StreamHeader::default()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !(args.duration > 0.0) || !(args.marker_interval > 0.0) {
        bail!("Duration and marker interval must be positive");
    }
    if let Some(seed) = args.seed {
        fastrand::seed(seed);
    }

    println!("XDF Demo Recording Generator");
    println!("============================");
    println!("Output:\t\t{}", args.output.display());
    println!("Duration:\t{} s", args.duration);
    println!("Markers every:\t{} s", args.marker_interval);
    println!();

    let numeric: Vec<(StreamHeader, Vec<f64>, Array2<f64>)> = NUMERIC_STREAMS
        .iter()
        .map(|demo| {
            let (timestamps, samples) = generate(demo, &args);
            (header(demo), timestamps, samples)
        })
        .collect();
    let (marker_times, marker_labels) = markers(&args);

    if args.verbose {
        for (header, timestamps, samples) in &numeric {
            println!(
                "\t{}: {} samples x {} channels",
                header.name.as_deref().unwrap_or(""),
                timestamps.len(),
                samples.ncols()
            );
        }
        println!("\tMarkers: {}", marker_labels.len());
        println!();
    }

    let is_zarr = args
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zarr"));

    if is_zarr {
        if args.output.exists() {
            bail!("{} already exists", args.output.display());
        }
        let writer = ZarrRecordingWriter::create(&args.output)?;
        for (header, timestamps, samples) in &numeric {
            let group = header.name.as_deref().unwrap_or("stream");
            writer.write_numeric_stream(group, header, timestamps, samples)?;
        }
        writer.write_marker_stream("Markers", &marker_header(), &marker_times, &marker_labels)?;
    } else {
        let mut streams: Vec<RawStream> = numeric
            .into_iter()
            .map(|(header, timestamps, samples)| RawStream {
                header,
                timestamps,
                payload: RawPayload::Array(samples.into_dyn()),
            })
            .collect();
        streams.push(RawStream {
            header: marker_header(),
            timestamps: marker_times,
            payload: RawPayload::Entries(
                marker_labels
                    .into_iter()
                    .map(|label| MarkerEntry::Labels(vec![label]))
                    .collect(),
            ),
        });
        write_json_recording(&args.output, &streams)?;
    }

    println!("Done: {}", args.output.display());
    Ok(())
}
