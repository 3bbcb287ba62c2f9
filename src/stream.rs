use ndarray::{Array2, ArrayD, Axis, Ix1, Ix2};

use crate::header::StreamHeader;

/// One stream as handed over by a recording container.
#[derive(Debug, Clone)]
pub struct RawStream {
    pub header: StreamHeader,
    pub timestamps: Vec<f64>,
    pub payload: RawPayload,
}

/// Payload as the container found it, before shape classification.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// The stream carried no time series at all.
    Missing,
    /// Numeric samples, one row per sample. Any dimensionality is accepted
    /// here; only 1-D and 2-D survive classification.
    Array(ArrayD<f64>),
    /// A sequence of discrete marker entries.
    Entries(Vec<MarkerEntry>),
    /// Something the container could read but could not shape; `detail` says
    /// what it looked like.
    Unrecognized(String),
}

/// A single marker-stream sample.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEntry {
    /// A list of strings (one per marker channel).
    Labels(Vec<String>),
    /// A bare string.
    Text(String),
    /// Anything else; skipped during trigger extraction.
    Malformed,
}

impl MarkerEntry {
    /// The label this entry contributes, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            MarkerEntry::Labels(labels) => labels.first().map(String::as_str),
            MarkerEntry::Text(text) => Some(text),
            MarkerEntry::Malformed => None,
        }
    }
}

/// Classified payload. Resolved once when a recording is ingested.
#[derive(Debug, Clone)]
pub enum Payload {
    /// `[samples, channels]`.
    Numeric(Array2<f64>),
    Markers(Vec<MarkerEntry>),
}

impl RawPayload {
    /// Resolve the payload shape. `Ok(None)` for streams without data,
    /// `Err(detail)` for shapes that are neither numeric-rectangular nor a
    /// marker sequence.
    pub fn classify(self) -> Result<Option<Payload>, String> {
        match self {
            RawPayload::Missing => Ok(None),
            RawPayload::Entries(entries) => Ok(Some(Payload::Markers(entries))),
            RawPayload::Unrecognized(detail) => Err(detail),
            RawPayload::Array(array) => match array.ndim() {
                1 => array
                    .into_dimensionality::<Ix1>()
                    .map(|column| Some(Payload::Numeric(column.insert_axis(Axis(1)))))
                    .map_err(|e| e.to_string()),
                2 => array
                    .into_dimensionality::<Ix2>()
                    .map(|matrix| Some(Payload::Numeric(matrix)))
                    .map_err(|e| e.to_string()),
                n => Err(format!("{}-dimensional numeric array", n)),
            },
        }
    }
}

impl RawStream {
    /// Name used in logs and error messages.
    pub fn display_name(&self) -> String {
        self.header
            .name
            .clone()
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}
