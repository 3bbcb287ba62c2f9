pub mod writer;

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, IxDyn};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;
use zarrs::storage::{ReadableStorageTraits, StoreKey};

use crate::container::RecordingSource;
use crate::header::StreamHeader;
use crate::stream::{MarkerEntry, RawPayload, RawStream};

pub use writer::ZarrRecordingWriter;

/// A recording stored as one Zarr group per stream:
///
/// ```text
/// recording.zarr/
/// ├── zarr.json
/// ├── Wristband/          attributes: stream_info
/// │   ├── data            [channels, samples]
/// │   └── time            [samples]
/// └── Markers/
///     ├── data            [1, samples] (string)
///     └── time
/// ```
pub struct ZarrRecording {
    path: PathBuf,
    store: Arc<FilesystemStore>,
}

impl ZarrRecording {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            bail!("Zarr store not found: {}", path.display());
        }
        let store = Arc::new(FilesystemStore::new(path)?);
        if !group_exists(&store, "/")? {
            bail!("{} is not a Zarr group", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    /// Names of the stream groups, sorted.
    pub fn stream_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if group_exists(&self.store, &format!("/{}", name))? {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_stream(&self, name: &str) -> Result<RawStream> {
        let group_path = format!("/{}", name);
        let attrs = read_group_attributes(&self.store, &group_path)?;

        let mut header = match attrs.get("stream_info") {
            Some(info) => StreamHeader::from_json(info)?,
            None => StreamHeader::default(),
        };
        if header.name.is_none() {
            header.name = Some(name.to_string());
        }

        let time_path = format!("{}/time", group_path);
        let timestamps = if array_exists(&self.store, &time_path)? {
            read_time(&self.store, &time_path)?
        } else {
            Vec::new()
        };

        if header.effective_srate.is_none() {
            header.effective_srate = measured_rate(&timestamps);
        }

        let payload = read_payload(&self.store, &format!("{}/data", group_path))?;

        Ok(RawStream {
            header,
            timestamps,
            payload,
        })
    }
}

impl RecordingSource for ZarrRecording {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn streams(&self) -> Result<Vec<RawStream>> {
        self.stream_names()?
            .iter()
            .map(|name| {
                self.read_stream(name)
                    .with_context(|| format!("reading stream group '{}'", name))
            })
            .collect()
    }
}

/// Rate implied by the recorded timestamps, for stores without an
/// effective rate in their metadata.
pub fn measured_rate(timestamps: &[f64]) -> Option<f64> {
    let (first, last) = (timestamps.first()?, timestamps.last()?);
    let duration = last - first;
    if timestamps.len() > 1 && duration > 0.0 {
        Some((timestamps.len() - 1) as f64 / duration)
    } else {
        None
    }
}

fn read_time(store: &Arc<FilesystemStore>, path: &str) -> Result<Vec<f64>> {
    let array = Array::open(store.clone(), path)?;
    let samples = array.shape().first().copied().unwrap_or(0);
    if samples == 0 {
        return Ok(Vec::new());
    }
    let subset = ArraySubset::new_with_start_shape(vec![0], vec![samples])?;
    let values = array.retrieve_array_subset_ndarray::<f64>(&subset)?;
    Ok(values.iter().copied().collect())
}

/// Read `[channels, samples]` data as a raw payload in `[samples, channels]`
/// order. String data becomes one marker entry per sample.
fn read_payload(store: &Arc<FilesystemStore>, path: &str) -> Result<RawPayload> {
    if !array_exists(store, path)? {
        return Ok(RawPayload::Missing);
    }

    let array = Array::open(store.clone(), path)?;
    let shape = array.shape().to_vec();
    if shape.len() != 2 {
        return Ok(RawPayload::Unrecognized(format!(
            "data array with {} dimension(s)",
            shape.len()
        )));
    }
    let (channels, samples) = (shape[0], shape[1]);
    let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![channels, samples])?;

    if matches!(array.data_type(), DataType::String) {
        if samples == 0 {
            return Ok(RawPayload::Entries(Vec::new()));
        }
        let values = array.retrieve_array_subset_ndarray::<String>(&subset)?;
        let entries = values
            .axis_iter(ndarray::Axis(1))
            .map(|sample| MarkerEntry::Labels(sample.iter().cloned().collect()))
            .collect();
        return Ok(RawPayload::Entries(entries));
    }

    if samples == 0 || channels == 0 {
        let empty = ArrayD::<f64>::zeros(IxDyn(&[samples as usize, channels as usize]));
        return Ok(RawPayload::Array(empty));
    }

    macro_rules! read_as_f64 {
        ($type:ty) => {{
            array
                .retrieve_array_subset_ndarray::<$type>(&subset)?
                .mapv(|x| x as f64)
        }};
    }

    let values: ArrayD<f64> = match array.data_type() {
        DataType::Float64 => array.retrieve_array_subset_ndarray::<f64>(&subset)?,
        DataType::Float32 => read_as_f64!(f32),
        DataType::Int64 => read_as_f64!(i64),
        DataType::Int32 => read_as_f64!(i32),
        DataType::Int16 => read_as_f64!(i16),
        DataType::Int8 => read_as_f64!(i8),
        DataType::UInt16 => read_as_f64!(u16),
        DataType::UInt8 => read_as_f64!(u8),
        other => {
            return Ok(RawPayload::Unrecognized(format!(
                "unsupported data type {:?}",
                other
            )));
        }
    };

    Ok(RawPayload::Array(values.reversed_axes()))
}

/// Check if a Zarr group exists (Zarr v3 uses zarr.json with node_type)
pub(crate) fn group_exists(store: &Arc<FilesystemStore>, path: &str) -> Result<bool> {
    node_type(store, path).map(|kind| kind.as_deref() == Some("group"))
}

/// Check if a Zarr array exists
pub(crate) fn array_exists(store: &Arc<FilesystemStore>, path: &str) -> Result<bool> {
    node_type(store, path).map(|kind| kind.as_deref() == Some("array"))
}

fn metadata_key(path: &str) -> Result<StoreKey> {
    let trimmed = path.trim_end_matches('/').trim_start_matches('/');
    let metadata_path = if trimmed.is_empty() {
        "zarr.json".to_string()
    } else {
        format!("{}/zarr.json", trimmed)
    };
    Ok(StoreKey::new(&metadata_path)?)
}

fn node_type(store: &Arc<FilesystemStore>, path: &str) -> Result<Option<String>> {
    match store.get(&metadata_key(path)?) {
        Ok(Some(data)) => {
            let json: serde_json::Value = serde_json::from_slice(&data)?;
            Ok(json
                .get("node_type")
                .and_then(|v| v.as_str())
                .map(str::to_string))
        }
        _ => Ok(None),
    }
}

/// Read attributes from a group's zarr.json file (Zarr v3 format)
pub fn read_group_attributes(store: &Arc<FilesystemStore>, path: &str) -> Result<serde_json::Value> {
    let key = metadata_key(path)?;
    let zarr_bytes = store
        .get(&key)?
        .ok_or_else(|| anyhow::anyhow!("Metadata not found at {}", path))?;
    let zarr_metadata: serde_json::Value = serde_json::from_slice(&zarr_bytes)?;

    Ok(zarr_metadata
        .get("attributes")
        .cloned()
        .unwrap_or_else(|| json!({})))
}
