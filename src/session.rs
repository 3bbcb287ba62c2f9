//! The session owns everything one loaded recording produces: the channel
//! registry, the trigger list and the saved segments. Loading replaces all
//! three at once; saving writes single entries; every other operation reads.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::align::{align_triggers, AlignedSegment};
use crate::config::ToolConfig;
use crate::container::RecordingSource;
use crate::error::{LoadError, Result, SegmentError};
use crate::export;
use crate::processing::{ProcessingInput, ProcessingOutcome, ProcessorRegistry};
use crate::registry::{ingest, Channel, ChannelRegistry};
use crate::srate::{RateOracle, RateResolution};
use crate::store::SegmentStore;
use crate::stream::RawStream;
use crate::triggers::TriggerEvent;
use crate::trim::{trim, trim_bounds, TrimResult};

/// A validated time window with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(SegmentError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }
}

/// One end of a window: a time, an index into the trigger list (`#3`), or
/// the label of a trigger (its first occurrence).
#[derive(Debug, Clone, PartialEq)]
pub enum WindowBound {
    Time(f64),
    Trigger(usize),
    Label(String),
}

impl FromStr for WindowBound {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(index) = s.strip_prefix('#') {
            return index
                .parse::<usize>()
                .map(WindowBound::Trigger)
                .map_err(|_| SegmentError::InvalidBound(s.to_string()));
        }
        if s.is_empty() {
            return Err(SegmentError::InvalidBound(s.to_string()));
        }
        Ok(s.parse::<f64>()
            .map(WindowBound::Time)
            .unwrap_or_else(|_| WindowBound::Label(s.to_string())))
    }
}

#[derive(Debug)]
pub struct LoadedRecording {
    pub source: String,
    pub registry: ChannelRegistry,
    pub triggers: Vec<TriggerEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub source: String,
    /// Numeric streams contributing channels
    pub numeric_streams: usize,
    pub channels: usize,
    pub triggers: usize,
}

/// Which series of a channel downstream processing runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessSource {
    /// The whole recorded channel.
    #[default]
    Full,
    /// The segment last saved for the channel.
    Saved,
}

/// Processing result for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub label: String,
    pub rate: Option<RateResolution>,
    /// Whether a saved segment was processed instead of the full channel.
    pub from_saved: bool,
    pub outcome: ProcessingOutcome,
}

#[derive(Debug)]
pub struct Session {
    config: ToolConfig,
    oracle: RateOracle,
    processors: ProcessorRegistry,
    recording: Option<LoadedRecording>,
    store: SegmentStore,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}

impl Session {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            oracle: RateOracle::new(config.expected_rates.clone()),
            config,
            processors: ProcessorRegistry::builtin(),
            recording: None,
            store: SegmentStore::default(),
        }
    }

    pub fn with_processors(mut self, processors: ProcessorRegistry) -> Self {
        self.processors = processors;
        self
    }

    /// Load a recording. The previous registry, triggers and saved segments
    /// are discarded first; on error the session is left empty.
    pub fn load(&mut self, source: &dyn RecordingSource) -> std::result::Result<LoadSummary, LoadError> {
        self.reset();
        let streams = source.streams()?;
        self.load_streams(&source.describe(), streams)
    }

    /// Load already-read streams under the name `source`.
    pub fn load_streams(
        &mut self,
        source: &str,
        streams: Vec<RawStream>,
    ) -> std::result::Result<LoadSummary, LoadError> {
        self.reset();
        let recording = ingest(streams)?;

        let summary = LoadSummary {
            source: source.to_string(),
            numeric_streams: recording.registry.streams().len(),
            channels: recording.registry.len(),
            triggers: recording.triggers.len(),
        };
        self.recording = Some(LoadedRecording {
            source: source.to_string(),
            registry: recording.registry,
            triggers: recording.triggers,
        });
        Ok(summary)
    }

    fn reset(&mut self) {
        self.recording = None;
        self.store = SegmentStore::default();
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn recording(&self) -> Option<&LoadedRecording> {
        self.recording.as_ref()
    }

    pub fn registry(&self) -> Result<&ChannelRegistry> {
        self.recording
            .as_ref()
            .map(|recording| &recording.registry)
            .ok_or(SegmentError::NotLoaded)
    }

    /// The sorted trigger list; empty when nothing is loaded.
    pub fn triggers(&self) -> &[TriggerEvent] {
        self.recording
            .as_ref()
            .map(|recording| recording.triggers.as_slice())
            .unwrap_or(&[])
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn channel(&self, label: &str) -> Result<&Channel> {
        self.registry()?
            .get(label)
            .ok_or_else(|| SegmentError::UnknownChannel(label.to_string()))
    }

    pub fn trigger(&self, index: usize) -> Result<&TriggerEvent> {
        self.triggers()
            .get(index)
            .ok_or_else(|| SegmentError::UnknownTrigger(format!("#{}", index)))
    }

    /// First trigger carrying `label`.
    pub fn trigger_by_label(&self, label: &str) -> Result<&TriggerEvent> {
        self.triggers()
            .iter()
            .find(|event| event.label == label)
            .ok_or_else(|| SegmentError::UnknownTrigger(label.to_string()))
    }

    pub fn resolve_bound(&self, bound: &WindowBound) -> Result<f64> {
        match bound {
            WindowBound::Time(t) => Ok(*t),
            WindowBound::Trigger(index) => Ok(self.trigger(*index)?.timestamp),
            WindowBound::Label(label) => Ok(self.trigger_by_label(label)?.timestamp),
        }
    }

    /// Resolve two bounds into a validated window.
    pub fn window(&self, start: &WindowBound, end: &WindowBound) -> Result<TimeWindow> {
        TimeWindow::new(self.resolve_bound(start)?, self.resolve_bound(end)?)
    }

    pub fn trim(&self, label: &str, window: TimeWindow) -> Result<TrimResult> {
        let channel = self.channel(label)?;
        if channel.samples.is_empty() {
            return Err(SegmentError::EmptyChannel(label.to_string()));
        }
        Ok(trim(channel.timestamps(), &channel.samples, window.start, window.end))
    }

    /// Trim with bounds exactly as typed. Text that does not read as a
    /// number leaves the channel untouched; two finite numbers must still
    /// form a valid window.
    pub fn trim_text(&self, label: &str, start: &str, end: &str) -> Result<TrimResult> {
        let channel = self.channel(label)?;
        if channel.samples.is_empty() {
            return Err(SegmentError::EmptyChannel(label.to_string()));
        }
        if let (Ok(start), Ok(end)) = (start.trim().parse::<f64>(), end.trim().parse::<f64>()) {
            if start.is_finite() && end.is_finite() {
                TimeWindow::new(start, end)?;
            }
        }
        Ok(trim_bounds(channel.timestamps(), &channel.samples, start, end))
    }

    /// Trim several channels; fails without partial results if any label is
    /// unknown or empty.
    pub fn trim_many<S: AsRef<str>>(
        &self,
        labels: &[S],
        window: TimeWindow,
    ) -> Result<Vec<(String, TrimResult)>> {
        if labels.is_empty() {
            return Err(SegmentError::EmptySelection);
        }
        labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.trim(label, window).map(|trimmed| (label.to_string(), trimmed))
            })
            .collect()
    }

    /// Trim a channel and attach the triggers that fall inside the window.
    pub fn align(&self, label: &str, window: TimeWindow) -> Result<AlignedSegment> {
        let trimmed = self.trim(label, window)?;
        Ok(align_triggers(&trimmed, self.triggers(), window.start, window.end))
    }

    pub fn export_csv<W: Write>(&self, label: &str, window: TimeWindow, writer: W) -> Result<AlignedSegment> {
        let segment = self.align(label, window)?;
        export::write_csv(writer, &segment, self.config.delimiter_byte())?;
        Ok(segment)
    }

    pub fn export_csv_file(&self, label: &str, window: TimeWindow, path: &Path) -> Result<AlignedSegment> {
        let segment = self.align(label, window)?;
        export::export_csv_file(path, &segment, self.config.delimiter_byte())?;
        Ok(segment)
    }

    /// Trim the selected channels and keep the results for processing.
    /// Returns the number of segments written.
    pub fn save<S: AsRef<str>>(&mut self, labels: &[S], window: TimeWindow) -> Result<usize> {
        let trimmed = self.trim_many(labels, window)?;
        let count = trimmed.len();
        for (label, result) in trimmed {
            if self.store.save(&label, window.start, window.end, result).is_some() {
                tracing::debug!("Replaced saved segment for {}", label);
            }
        }
        tracing::info!(
            "Saved {} segment(s) for [{:.3}, {:.3}]",
            count,
            window.start,
            window.end
        );
        Ok(count)
    }

    pub fn resolve_rate(&self, channel: &Channel) -> Option<RateResolution> {
        self.oracle
            .resolve(channel.declared_type(), channel.stream.header.effective_rate())
    }

    /// Run downstream processing on the selected channels, either on the
    /// full series or on their saved segments. Asking for saved segments
    /// fails up front if any selected channel has none. Channels without a
    /// usable sampling rate are skipped individually.
    pub fn process<S: AsRef<str>>(&self, labels: &[S], source: ProcessSource) -> Result<Vec<ChannelReport>> {
        if labels.is_empty() {
            return Err(SegmentError::EmptySelection);
        }
        let channels = labels
            .iter()
            .map(|label| -> Result<_> {
                let channel = self.channel(label.as_ref())?;
                let saved = match source {
                    ProcessSource::Full => None,
                    ProcessSource::Saved => Some(
                        self.store
                            .get(&channel.label)
                            .ok_or_else(|| SegmentError::NotSaved(channel.label.clone()))?,
                    ),
                };
                Ok((channel, saved))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut reports = Vec::with_capacity(channels.len());
        for (channel, saved) in channels {
            let rate = self.resolve_rate(channel);

            let outcome = match &rate {
                None => {
                    tracing::warn!("No valid sampling rate for {}, skipping", channel.label);
                    ProcessingOutcome::RateUnavailable
                }
                Some(resolution) => {
                    if let Some(notice) = &resolution.notice {
                        tracing::info!("{}: {}", channel.label, notice);
                    }
                    let (timestamps, samples) = match saved {
                        Some(segment) => (segment.trim.timestamps.as_slice(), segment.trim.samples.as_slice()),
                        None => (channel.timestamps(), channel.samples.as_slice()),
                    };
                    let input = ProcessingInput {
                        timestamps,
                        samples,
                        sampling_rate: resolution.rate,
                        declared_type: channel.declared_type().unwrap_or(""),
                    };
                    self.processors.dispatch(&input)
                }
            };

            if let ProcessingOutcome::Unsupported { declared_type } = &outcome {
                tracing::info!(
                    "No processing implemented for type '{}' on {}",
                    declared_type,
                    channel.label
                );
            }

            reports.push(ChannelReport {
                label: channel.label.clone(),
                rate,
                from_saved: saved.is_some(),
                outcome,
            });
        }
        Ok(reports)
    }
}
