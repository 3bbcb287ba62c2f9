use anyhow::Result;
use ndarray::{Array1, Array2, Ix1, Ix2};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zarrs::array::codec::{BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::filesystem::FilesystemStore;
use zarrs::group::GroupBuilder;

use super::group_exists;
use crate::header::StreamHeader;

/// Samples per chunk along the time axis.
const CHUNK_SAMPLES: u64 = 100;

/// Writes complete streams into the per-stream group layout read by
/// [`super::ZarrRecording`].
pub struct ZarrRecordingWriter {
    path: PathBuf,
    store: Arc<FilesystemStore>,
}

impl ZarrRecordingWriter {
    pub fn create(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let store = Arc::new(FilesystemStore::new(path)?);

        if !group_exists(&store, "/")? {
            let root_group = GroupBuilder::new().build(store.clone(), "/")?;
            root_group.store_metadata()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a numeric stream. `samples` is `[samples, channels]`.
    pub fn write_numeric_stream(
        &self,
        group: &str,
        header: &StreamHeader,
        timestamps: &[f64],
        samples: &Array2<f64>,
    ) -> Result<()> {
        let (n_samples, n_channels) = samples.dim();
        if n_samples != timestamps.len() {
            return Err(anyhow::anyhow!(
                "{} timestamps for {} samples in stream '{}'",
                timestamps.len(),
                n_samples,
                group
            ));
        }

        let stream_path = self.create_stream_group(group, header)?;
        let data_path = format!("{}/data", stream_path);

        let data_array = ArrayBuilder::new(
            vec![n_channels as u64, n_samples as u64],
            vec![(n_channels as u64).max(1), CHUNK_SAMPLES],
            DataType::Float64,
            FillValue::from(0.0f64),
        )
        .dimension_names(Some(vec![
            Some("channels".to_string()),
            Some("samples".to_string()),
        ]))
        .bytes_to_bytes_codecs(vec![float64_codec()?])
        .build(self.store.clone(), &data_path)?;
        data_array.store_metadata()?;

        if n_samples > 0 && n_channels > 0 {
            // Channel-first layout on disk
            let channel_major = Array2::from_shape_fn((n_channels, n_samples), |(c, s)| samples[[s, c]]);
            data_array.store_array_subset_ndarray::<f64, Ix2>(&[0u64, 0], channel_major)?;
        }

        self.write_time(&stream_path, timestamps)?;
        tracing::debug!(
            "Wrote numeric stream '{}' ({} samples x {} channels)",
            group,
            n_samples,
            n_channels
        );
        Ok(())
    }

    /// Write a single-channel marker stream, one label per timestamp.
    pub fn write_marker_stream(
        &self,
        group: &str,
        header: &StreamHeader,
        timestamps: &[f64],
        labels: &[String],
    ) -> Result<()> {
        if labels.len() != timestamps.len() {
            return Err(anyhow::anyhow!(
                "{} timestamps for {} markers in stream '{}'",
                timestamps.len(),
                labels.len(),
                group
            ));
        }

        let stream_path = self.create_stream_group(group, header)?;
        let data_path = format!("{}/data", stream_path);

        // String arrays: no compression, empty string fill value
        let data_array = ArrayBuilder::new(
            vec![1, labels.len() as u64],
            vec![1, CHUNK_SAMPLES],
            DataType::String,
            FillValue::from(""),
        )
        .dimension_names(Some(vec![
            Some("channels".to_string()),
            Some("samples".to_string()),
        ]))
        .build(self.store.clone(), &data_path)?;
        data_array.store_metadata()?;

        if !labels.is_empty() {
            let values = Array2::from_shape_vec((1, labels.len()), labels.to_vec())?;
            data_array.store_array_subset_ndarray::<String, Ix2>(&[0u64, 0], values)?;
        }

        self.write_time(&stream_path, timestamps)?;
        tracing::debug!("Wrote marker stream '{}' ({} markers)", group, labels.len());
        Ok(())
    }

    fn create_stream_group(&self, group: &str, header: &StreamHeader) -> Result<String> {
        let stream_path = format!("/{}", group);
        if group_exists(&self.store, &stream_path)? {
            return Err(anyhow::anyhow!(
                "Stream group '{}' already exists in {}",
                group,
                self.path.display()
            ));
        }

        let mut stream_group = GroupBuilder::new().build(self.store.clone(), &stream_path)?;
        let mut stream_attrs = serde_json::Map::new();
        stream_attrs.insert("stream_info".to_string(), serde_json::to_value(header)?);
        stream_attrs.insert("written_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
        stream_group.attributes_mut().extend(stream_attrs);
        stream_group.store_metadata()?;

        Ok(stream_path)
    }

    fn write_time(&self, stream_path: &str, timestamps: &[f64]) -> Result<()> {
        let time_path = format!("{}/time", stream_path);
        let time_array = ArrayBuilder::new(
            vec![timestamps.len() as u64],
            vec![CHUNK_SAMPLES],
            DataType::Float64,
            FillValue::from(0.0f64),
        )
        .dimension_names(Some(vec![Some("samples".to_string())]))
        .bytes_to_bytes_codecs(vec![float64_codec()?])
        .build(self.store.clone(), &time_path)?;
        time_array.store_metadata()?;

        if !timestamps.is_empty() {
            let values = Array1::from_vec(timestamps.to_vec());
            time_array.store_array_subset_ndarray::<f64, Ix1>(&[0u64], values)?;
        }
        Ok(())
    }
}

/// Blosc LZ4 with BitShuffle, sized for float64
fn float64_codec() -> Result<Arc<BloscCodec>> {
    let compression_level = BloscCompressionLevel::try_from(5u8)
        .map_err(|e| anyhow::anyhow!("Invalid compression level: {}", e))?;
    Ok(Arc::new(BloscCodec::new(
        BloscCompressor::LZ4,
        compression_level,
        None,
        BloscShuffleMode::BitShuffle,
        Some(8),
    )?))
}
