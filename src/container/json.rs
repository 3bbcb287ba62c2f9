//! JSON stream dumps
//!
//! One object per stream, in the shape pyxdf returns from `load_xdf`:
//!
//! ```json
//! {
//!   "streams": [
//!     {
//!       "info": { "name": ["Wristband"], "type": ["EDA"], "channel_count": ["1"] },
//!       "time_stamps": [0.0, 0.066, 0.133],
//!       "time_series": [[0.41], [0.42], [0.40]]
//!     },
//!     {
//!       "info": "<?xml version=\"1.0\"?><info><name>Markers</name>...</info>",
//!       "time_stamps": [1.5],
//!       "time_series": [["stimulus"]]
//!     }
//!   ]
//! }
//! ```
//!
//! `info` is either a header tree or the raw header XML. A bare top-level
//! array of streams is accepted too.

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use serde_json::{json, Value};
use std::path::Path;

use super::RecordingSource;
use crate::header::StreamHeader;
use crate::stream::{MarkerEntry, RawPayload, RawStream};

#[derive(Debug, Clone)]
pub struct JsonRecording {
    source: String,
    document: Value,
}

impl JsonRecording {
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading recording {}", path.display()))?;
        Self::from_text(&path.display().to_string(), &text)
    }

    pub fn from_text(source: &str, text: &str) -> Result<Self> {
        let document = serde_json::from_str(text).context("parsing recording JSON")?;
        Ok(Self::from_value(source, document))
    }

    pub fn from_value(source: &str, document: Value) -> Self {
        Self {
            source: source.to_string(),
            document,
        }
    }
}

impl RecordingSource for JsonRecording {
    fn describe(&self) -> String {
        self.source.clone()
    }

    fn streams(&self) -> Result<Vec<RawStream>> {
        let items = match &self.document {
            Value::Array(items) => items,
            Value::Object(obj) => obj
                .get("streams")
                .and_then(Value::as_array)
                .context("Recording object has no 'streams' array")?,
            _ => bail!("Expected a JSON array of streams or an object with 'streams'"),
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_stream(item).with_context(|| format!("Stream {}", i)))
            .collect()
    }
}

fn parse_stream(item: &Value) -> Result<RawStream> {
    let obj = item.as_object().context("stream is not a JSON object")?;

    let header = match obj.get("info") {
        Some(Value::String(xml)) => StreamHeader::from_xml(xml).context("parsing header XML")?,
        Some(tree) => StreamHeader::from_json(tree).context("parsing header")?,
        None => StreamHeader::default(),
    };

    let timestamps = match obj.get("time_stamps") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(j, v)| {
                v.as_f64()
                    .with_context(|| format!("time_stamps[{}]: not a number", j))
            })
            .collect::<Result<Vec<f64>>>()?,
        Some(_) => bail!("'time_stamps' is not an array"),
    };

    Ok(RawStream {
        header,
        timestamps,
        payload: decode_payload(obj.get("time_series")),
    })
}

/// Describe the `time_series` value as a raw payload. Shape problems are not
/// errors here; they become [`RawPayload::Unrecognized`] for the registry to
/// reject.
pub fn decode_payload(value: Option<&Value>) -> RawPayload {
    let items = match value {
        None | Some(Value::Null) => return RawPayload::Missing,
        Some(Value::Array(items)) => items,
        Some(other) => {
            return RawPayload::Unrecognized(format!("{} instead of a list", value_kind(other)));
        }
    };

    // An empty list carries no samples of either kind; pyxdf hands empty
    // string streams over as empty lists.
    if items.is_empty() {
        return RawPayload::Entries(Vec::new());
    }

    if let Some(array) = value.and_then(numeric_array) {
        return RawPayload::Array(array);
    }

    // Markers are strings or lists; a bare scalar means a broken numeric array
    if let Some(stray) = items
        .iter()
        .find(|item| !matches!(item, Value::String(_) | Value::Array(_)))
    {
        return RawPayload::Unrecognized(format!(
            "list mixing {} with other entries is neither numeric nor markers",
            value_kind(stray)
        ));
    }

    let entries: Vec<MarkerEntry> = items.iter().map(marker_entry).collect();
    let has_labels = entries.iter().any(|entry| entry.label().is_some());
    let all_lists = entries
        .iter()
        .all(|entry| matches!(entry, MarkerEntry::Labels(_)));
    if has_labels || all_lists {
        return RawPayload::Entries(entries);
    }

    RawPayload::Unrecognized(format!(
        "list of {} item(s) that is neither a rectangular numeric array nor a marker sequence",
        items.len()
    ))
}

fn marker_entry(value: &Value) -> MarkerEntry {
    match value {
        Value::String(text) => MarkerEntry::Text(text.clone()),
        Value::Array(items) if items.is_empty() => MarkerEntry::Labels(Vec::new()),
        Value::Array(items) if items[0].is_string() => MarkerEntry::Labels(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => MarkerEntry::Malformed,
    }
}

/// A rectangular, all-numeric nested list as an n-dimensional array.
fn numeric_array(value: &Value) -> Option<ArrayD<f64>> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }
    if shape.contains(&0) {
        return None;
    }

    let mut flat = Vec::with_capacity(shape.iter().product());
    if !flatten_into(value, &shape, &mut flat) {
        return None;
    }
    ArrayD::from_shape_vec(IxDyn(&shape), flat).ok()
}

fn flatten_into(value: &Value, shape: &[usize], out: &mut Vec<f64>) -> bool {
    match shape.split_first() {
        None => match value {
            Value::Number(n) => n.as_f64().map(|x| out.push(x)).is_some(),
            _ => false,
        },
        Some((&len, rest)) => match value {
            Value::Array(items) if items.len() == len => {
                items.iter().all(|item| flatten_into(item, rest, out))
            }
            _ => false,
        },
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Serialize streams into the JSON dump layout read by [`JsonRecording`].
pub fn to_json_document(streams: &[RawStream]) -> Result<Value> {
    let items = streams
        .iter()
        .map(|stream| {
            let mut obj = serde_json::Map::new();
            obj.insert("info".to_string(), serde_json::to_value(&stream.header)?);
            obj.insert("time_stamps".to_string(), json!(stream.timestamps));
            match &stream.payload {
                RawPayload::Missing => {}
                RawPayload::Array(array) => {
                    obj.insert("time_series".to_string(), array_to_json(array.view()));
                }
                RawPayload::Entries(entries) => {
                    let values = entries
                        .iter()
                        .map(|entry| match entry {
                            MarkerEntry::Labels(labels) => json!(labels),
                            MarkerEntry::Text(text) => json!(text),
                            MarkerEntry::Malformed => json!([Value::Null]),
                        })
                        .collect();
                    obj.insert("time_series".to_string(), Value::Array(values));
                }
                RawPayload::Unrecognized(detail) => {
                    obj.insert("time_series".to_string(), json!(detail));
                }
            }
            Ok(Value::Object(obj))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(json!({ "streams": items }))
}

pub fn write_json_recording(path: &Path, streams: &[RawStream]) -> Result<()> {
    let document = to_json_document(streams)?;
    std::fs::write(path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("writing recording {}", path.display()))?;
    Ok(())
}

fn array_to_json(view: ArrayViewD<'_, f64>) -> Value {
    if view.ndim() <= 1 {
        return Value::Array(view.iter().map(|&x| json!(x)).collect());
    }
    Value::Array(view.outer_iter().map(array_to_json).collect())
}
