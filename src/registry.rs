//! Channel registry
//!
//! Ingestion splits a recording's streams into marker streams (feeding the
//! trigger list) and numeric streams (one [`Channel`] per column). Every
//! channel label carries its stream number, `Stream {k} - {name}`, so labels
//! stay unique even when two streams declare the same channel names.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::LoadError;
use crate::header::StreamHeader;
use crate::metadata::channel_names_for_width;
use crate::stream::{MarkerEntry, Payload, RawStream};
use crate::triggers::{extract_triggers, TriggerEvent};

/// A numeric stream as kept by the registry. Channels share it.
#[derive(Debug)]
pub struct SourceStream {
    /// 1-based position among the recording's numeric streams.
    pub number: usize,
    pub header: StreamHeader,
    pub timestamps: Vec<f64>,
    pub channel_count: usize,
}

/// One column of a numeric stream.
#[derive(Debug, Clone)]
pub struct Channel {
    pub label: String,
    /// Channel name as resolved from the header (label without the stream prefix).
    pub name: String,
    pub stream: Arc<SourceStream>,
    pub column: usize,
    pub samples: Vec<f64>,
}

impl Channel {
    pub fn timestamps(&self) -> &[f64] {
        &self.stream.timestamps
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.stream.header.stream_type.as_deref()
    }
}

/// All channels of one loaded recording, keyed by label.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Channel>,
    streams: Vec<Arc<SourceStream>>,
}

impl ChannelRegistry {
    pub fn get(&self, label: &str) -> Option<&Channel> {
        self.channels.get(label)
    }

    /// Channels in label order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn streams(&self) -> &[Arc<SourceStream>] {
        &self.streams
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Everything one load produces.
#[derive(Debug, Default)]
pub struct Recording {
    pub registry: ChannelRegistry,
    pub triggers: Vec<TriggerEvent>,
}

struct NumericStream {
    header: StreamHeader,
    timestamps: Vec<f64>,
    samples: ndarray::Array2<f64>,
}

struct MarkerStream {
    timestamps: Vec<f64>,
    entries: Vec<MarkerEntry>,
}

/// Build a [`Recording`] from a container's streams.
///
/// Fails as a whole on the first stream whose payload is neither a numeric
/// array nor a marker sequence, or whose numeric samples do not match its
/// timestamps; nothing is built in that case.
pub fn ingest(streams: Vec<RawStream>) -> Result<Recording, LoadError> {
    let mut numeric = Vec::new();
    let mut markers = Vec::new();

    for (index, stream) in streams.into_iter().enumerate() {
        let name = stream.display_name();
        let payload = stream
            .payload
            .classify()
            .map_err(|detail| LoadError::UnrecognizedPayload {
                index,
                name: name.clone(),
                detail,
            })?;

        match payload {
            None => {
                tracing::debug!("Stream {} ({}): no time series, skipping", index, name);
            }
            Some(Payload::Numeric(samples)) => {
                if samples.nrows() != stream.timestamps.len() {
                    return Err(LoadError::LengthMismatch {
                        index,
                        name,
                        timestamps: stream.timestamps.len(),
                        samples: samples.nrows(),
                    });
                }
                tracing::debug!(
                    "Stream {} ({}): numeric, {} sample(s) x {} channel(s)",
                    index,
                    name,
                    samples.nrows(),
                    samples.ncols()
                );
                numeric.push(NumericStream {
                    header: stream.header,
                    timestamps: stream.timestamps,
                    samples,
                });
            }
            Some(Payload::Markers(entries)) => {
                if entries.len() != stream.timestamps.len() {
                    tracing::warn!(
                        "Stream {} ({}): {} marker(s) but {} timestamp(s), pairing the first {}",
                        index,
                        name,
                        entries.len(),
                        stream.timestamps.len(),
                        entries.len().min(stream.timestamps.len())
                    );
                }
                tracing::debug!("Stream {} ({}): markers, {} entries", index, name, entries.len());
                markers.push(MarkerStream {
                    timestamps: stream.timestamps,
                    entries,
                });
            }
        }
    }

    let triggers = extract_triggers(
        markers
            .iter()
            .map(|stream| (stream.timestamps.as_slice(), stream.entries.as_slice())),
    );
    let registry = build_registry(numeric);

    tracing::info!(
        "Loaded {} channel(s) from {} numeric stream(s), {} trigger(s) from {} marker stream(s)",
        registry.len(),
        registry.streams.len(),
        triggers.len(),
        markers.len()
    );

    Ok(Recording { registry, triggers })
}

fn build_registry(numeric: Vec<NumericStream>) -> ChannelRegistry {
    let mut registry = ChannelRegistry::default();

    for (idx, stream) in numeric.into_iter().enumerate() {
        let number = idx + 1;
        let width = stream.samples.ncols();
        let names = channel_names_for_width(&stream.header, number, width);

        let source = Arc::new(SourceStream {
            number,
            header: stream.header,
            timestamps: stream.timestamps,
            channel_count: width,
        });

        for (column, name) in names.into_iter().enumerate() {
            let name = unique_name(&registry, number, name, column);
            let label = format!("Stream {} - {}", number, name);
            let channel = Channel {
                label: label.clone(),
                name,
                stream: Arc::clone(&source),
                column,
                samples: stream.samples.column(column).to_vec(),
            };
            registry.channels.insert(label, channel);
        }

        registry.streams.push(source);
    }

    registry
}

/// Later columns reusing a name get their 1-based column appended,
/// `Fp1 (2)`, so every column keeps its own label.
fn unique_name(registry: &ChannelRegistry, number: usize, name: String, column: usize) -> String {
    let taken = |candidate: &str| {
        registry
            .channels
            .contains_key(&format!("Stream {} - {}", number, candidate))
    };
    if !taken(&name) {
        return name;
    }

    let mut candidate = format!("{} ({})", name, column + 1);
    let mut suffix = 1;
    while taken(&candidate) {
        suffix += 1;
        candidate = format!("{} ({}.{})", name, column + 1, suffix);
    }
    tracing::warn!(
        "Stream {}: channel name {} repeats, column {} labeled {}",
        number,
        name,
        column + 1,
        candidate
    );
    candidate
}
