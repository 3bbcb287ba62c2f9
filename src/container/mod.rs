//! Recording containers
//!
//! ```text
//!  recording.json / recording.zarr
//!        │
//!        ▼
//!  ┌─────────────────┐
//!  │ RecordingSource │  read streams → Vec<RawStream>
//!  └─────────────────┘
//!        │
//!        ▼
//!  ┌──────────┐
//!  │ registry │  classify payloads → channels + triggers
//!  └──────────┘
//! ```

pub mod json;

use anyhow::{bail, Result};
use std::path::Path;

use crate::stream::RawStream;
use crate::zarr::ZarrRecording;

pub use json::JsonRecording;

/// Anything that can hand over the streams of a complete recording.
pub trait RecordingSource {
    /// Short description for logs and load summaries (usually the path).
    fn describe(&self) -> String;

    /// Read every stream. Errors here make the whole load fail.
    fn streams(&self) -> Result<Vec<RawStream>>;
}

/// Open a recording, choosing the reader by path.
///
/// * directories and `.zarr` – Zarr recording
/// * `.json` – JSON stream dump
pub fn open_recording(path: &Path) -> Result<Box<dyn RecordingSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if path.is_dir() || ext == "zarr" {
        return Ok(Box::new(ZarrRecording::open(path)?));
    }

    match ext.as_str() {
        "json" => Ok(Box::new(JsonRecording::open(path)?)),
        "xdf" => bail!(
            "{} is a raw XDF file; export it to JSON (info/time_stamps/time_series per stream) or Zarr first",
            path.display()
        ),
        other => bail!("Unsupported recording extension: .{}", other),
    }
}
