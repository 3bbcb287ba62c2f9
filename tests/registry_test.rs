use anyhow::Result;
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use serde_json::json;
use xdf_segment_toolbox::error::LoadError;
use xdf_segment_toolbox::header::StreamHeader;
use xdf_segment_toolbox::registry::ingest;
use xdf_segment_toolbox::stream::{MarkerEntry, RawPayload, RawStream};

fn header(value: serde_json::Value) -> StreamHeader {
    StreamHeader::from_json(&value).expect("header")
}

fn numeric(name: &str, channels: usize, samples: usize) -> RawStream {
    let data = Array2::from_shape_fn((samples, channels), |(i, c)| (i * 10 + c) as f64);
    RawStream {
        header: header(json!({ "name": name, "type": "EEG", "channel_count": channels })),
        timestamps: (0..samples).map(|i| i as f64).collect(),
        payload: RawPayload::Array(data.into_dyn()),
    }
}

fn markers(timestamps: &[f64], labels: &[&str]) -> RawStream {
    RawStream {
        header: header(json!({ "name": "Markers", "type": "Markers" })),
        timestamps: timestamps.to_vec(),
        payload: RawPayload::Entries(
            labels
                .iter()
                .map(|label| MarkerEntry::Labels(vec![label.to_string()]))
                .collect(),
        ),
    }
}

#[test]
fn test_partitions_streams_into_channels_and_triggers() -> Result<()> {
    let recording = ingest(vec![
        markers(&[2.0], &["second"]),
        numeric("EEG", 2, 4),
        markers(&[1.0], &["first"]),
        numeric("EMG", 1, 3),
    ])?;

    let labels: Vec<&str> = recording.registry.labels().collect();
    assert_eq!(labels, vec!["Stream 1 - EEG 1", "Stream 1 - EEG 2", "Stream 2 - EMG"]);
    assert_eq!(recording.registry.streams().len(), 2);

    let eeg2 = recording.registry.get("Stream 1 - EEG 2").expect("channel");
    assert_eq!(eeg2.column, 1);
    assert_eq!(eeg2.name, "EEG 2");
    assert_eq!(eeg2.samples, vec![1.0, 11.0, 21.0, 31.0]);
    assert_eq!(eeg2.timestamps(), &[0.0, 1.0, 2.0, 3.0]);
    assert_eq!(eeg2.declared_type(), Some("EEG"));

    let trigger_labels: Vec<&str> = recording.triggers.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(trigger_labels, vec!["first", "second"]);
    Ok(())
}

#[test]
fn test_identical_channel_names_stay_unique() -> Result<()> {
    let recording = ingest(vec![numeric("Glove", 2, 2), numeric("Glove", 2, 2)])?;
    assert_eq!(recording.registry.len(), 4);
    assert!(recording.registry.get("Stream 1 - Glove 1").is_some());
    assert!(recording.registry.get("Stream 2 - Glove 1").is_some());
    Ok(())
}

#[test]
fn test_one_dimensional_payload_is_one_channel() -> Result<()> {
    let stream = RawStream {
        header: header(json!({ "name": ["Temperature"], "type": ["TEMP"] })),
        timestamps: vec![0.0, 0.5, 1.0],
        payload: RawPayload::Array(Array1::from(vec![30.1, 30.2, 30.3]).into_dyn()),
    };
    let recording = ingest(vec![stream])?;

    let channel = recording.registry.get("Stream 1 - Temperature").expect("channel");
    assert_eq!(channel.samples, vec![30.1, 30.2, 30.3]);
    Ok(())
}

#[test]
fn test_width_mismatch_uses_fallback_names() -> Result<()> {
    let mut stream = numeric("Device", 3, 2);
    stream.header = header(json!({
        "name": "Device",
        "desc": { "channels": { "channel": [{ "label": "A" }] } }
    }));
    let recording = ingest(vec![stream])?;

    let labels: Vec<&str> = recording.registry.labels().collect();
    assert_eq!(labels, vec!["Stream 1 - Device 1", "Stream 1 - Device 2", "Stream 1 - Device 3"]);
    Ok(())
}

#[test]
fn test_unnamed_streams_are_named_by_position() -> Result<()> {
    let mut stream = numeric("x", 2, 2);
    stream.header = StreamHeader::default();
    let recording = ingest(vec![markers(&[0.0], &["m"]), stream])?;

    let labels: Vec<&str> = recording.registry.labels().collect();
    assert_eq!(labels, vec!["Stream 1 - Stream 1 1", "Stream 1 - Stream 1 2"]);
    Ok(())
}

#[test]
fn test_streams_without_payload_are_skipped() -> Result<()> {
    let missing = RawStream {
        header: header(json!({ "name": "Empty" })),
        timestamps: Vec::new(),
        payload: RawPayload::Missing,
    };
    let recording = ingest(vec![missing, numeric("EEG", 1, 2)])?;
    assert_eq!(recording.registry.len(), 1);
    assert!(recording.registry.get("Stream 1 - EEG").is_some());
    Ok(())
}

#[test]
fn test_unrecognized_payload_aborts_the_load() {
    let bad = RawStream {
        header: header(json!({ "name": "Weird" })),
        timestamps: vec![0.0],
        payload: RawPayload::Unrecognized("a number instead of a list".to_string()),
    };
    let err = ingest(vec![numeric("EEG", 1, 2), bad]).expect_err("must fail");
    match err {
        LoadError::UnrecognizedPayload { index, name, .. } => {
            assert_eq!(index, 1);
            assert_eq!(name, "Weird");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_three_dimensional_payload_aborts_the_load() {
    let cube = RawStream {
        header: header(json!({ "name": "Cube" })),
        timestamps: vec![0.0, 1.0],
        payload: RawPayload::Array(ArrayD::zeros(IxDyn(&[2, 2, 2]))),
    };
    assert!(matches!(
        ingest(vec![cube]),
        Err(LoadError::UnrecognizedPayload { .. })
    ));
}

#[test]
fn test_numeric_length_mismatch_aborts_the_load() {
    let mut stream = numeric("EEG", 2, 4);
    stream.timestamps.pop();
    assert!(matches!(
        ingest(vec![stream]),
        Err(LoadError::LengthMismatch { timestamps: 3, samples: 4, .. })
    ));
}

#[test]
fn test_marker_length_mismatch_is_tolerated() -> Result<()> {
    let stream = markers(&[1.0, 2.0, 3.0], &["a", "b"]);
    let recording = ingest(vec![stream])?;
    assert_eq!(recording.triggers.len(), 2);
    assert!(recording.registry.is_empty());
    Ok(())
}

#[test]
fn test_malformed_marker_entries_are_skipped() -> Result<()> {
    let stream = RawStream {
        header: header(json!({ "name": "Markers" })),
        timestamps: vec![1.0, 2.0, 3.0],
        payload: RawPayload::Entries(vec![
            MarkerEntry::Text("ok".to_string()),
            MarkerEntry::Malformed,
            MarkerEntry::Labels(Vec::new()),
        ]),
    };
    let recording = ingest(vec![stream])?;
    assert_eq!(recording.triggers.len(), 1);
    assert_eq!(recording.triggers[0].label, "ok");
    Ok(())
}

#[test]
fn test_repeated_descriptor_labels_keep_every_column() -> Result<()> {
    let data = Array2::from_shape_fn((3, 3), |(i, c)| (i * 10 + c) as f64);
    let stream = RawStream {
        header: header(json!({
            "name": "EEG",
            "channel_count": 3,
            "desc": { "channels": { "channel": [{ "label": "Fp1" }, { "label": "Fp1" }, { "label": "Fp1 (2)" }] } }
        })),
        timestamps: vec![0.0, 1.0, 2.0],
        payload: RawPayload::Array(data.into_dyn()),
    };

    let recording = ingest(vec![stream])?;
    assert_eq!(recording.registry.len(), 3);
    let labels: Vec<&str> = recording.registry.labels().collect();
    assert_eq!(
        labels,
        vec!["Stream 1 - Fp1", "Stream 1 - Fp1 (2)", "Stream 1 - Fp1 (2) (3)"]
    );
    let second = recording.registry.get("Stream 1 - Fp1 (2)").expect("channel");
    assert_eq!(second.column, 1);
    assert_eq!(second.samples, vec![1.0, 11.0, 21.0]);
    Ok(())
}
