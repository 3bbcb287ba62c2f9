use thiserror::Error;

/// Structural failures that abort a whole load. Nothing is committed to the
/// session when one of these is returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read recording: {0:#}")]
    Container(#[from] anyhow::Error),

    #[error("Stream {index} ({name}): unrecognized payload shape: {detail}")]
    UnrecognizedPayload {
        index: usize,
        name: String,
        detail: String,
    },

    #[error("Stream {index} ({name}): {timestamps} timestamps but {samples} samples")]
    LengthMismatch {
        index: usize,
        name: String,
        timestamps: usize,
        samples: usize,
    },
}

/// Failures scoped to a single operation (trim, save, export, process).
/// Session state is left untouched.
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("No recording loaded")]
    NotLoaded,

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("No channel selected")]
    EmptySelection,

    #[error("End time {end} must be greater than start time {start}")]
    InvalidWindow { start: f64, end: f64 },

    #[error("Channel {0} has no samples")]
    EmptyChannel(String),

    #[error("No saved segment for {0}")]
    NotSaved(String),

    #[error("Unknown trigger: {0}")]
    UnknownTrigger(String),

    #[error("Invalid window bound: {0:?}")]
    InvalidBound(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for SegmentError {
    fn from(err: csv::Error) -> Self {
        SegmentError::Export(err.to_string())
    }
}

impl From<std::io::Error> for SegmentError {
    fn from(err: std::io::Error) -> Self {
        SegmentError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SegmentError>;
