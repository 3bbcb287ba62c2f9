use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::align::AlignedSegment;
use crate::error::{Result, SegmentError};

/// Column headers of the exported table.
pub const EXPORT_HEADER: [&str; 3] = ["Time (s)", "Value", "Trigger"];

/// Write an aligned segment as delimited text: the header row, then one row
/// per trimmed sample.
pub fn write_csv<W: Write>(writer: W, segment: &AlignedSegment, delimiter: u8) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer.write_record(EXPORT_HEADER)?;
    for row in &segment.rows {
        csv_writer.write_record([
            row.time.to_string(),
            row.value.to_string(),
            row.trigger.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv_file(path: &Path, segment: &AlignedSegment, delimiter: u8) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, segment, delimiter)?;
    tracing::info!(
        "Exported {} row(s) to {} ({} of {} trigger(s) attached)",
        segment.rows.len(),
        path.display(),
        segment.triggers_attached,
        segment.triggers_in_range
    );
    Ok(())
}

/// File name for a channel's export: the label with path-hostile characters
/// replaced.
pub fn export_file_name(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.csv", stem)
}

/// One export path per label under `dir`. Labels that sanitize to the same
/// file name are rejected before anything is written.
pub fn export_paths<S: AsRef<str>>(dir: &Path, labels: &[S]) -> Result<Vec<PathBuf>> {
    let mut claimed: HashMap<String, &str> = HashMap::new();
    let mut paths = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.as_ref();
        let file_name = export_file_name(label);
        if let Some(previous) = claimed.insert(file_name.clone(), label) {
            return Err(SegmentError::Export(format!(
                "{:?} and {:?} would both be written to {}",
                previous, label, file_name
            )));
        }
        paths.push(dir.join(file_name));
    }
    Ok(paths)
}
