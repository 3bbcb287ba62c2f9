use anyhow::Result;
use serde_json::json;
use std::io::{Cursor, Read};
use std::path::Path;
use xdf_segment_toolbox::commands::{handle_commands, tokenize};
use xdf_segment_toolbox::session::Session;

/// One EEG channel at 100 Hz over [0, 5) and markers "A" at 1.0, "B" at 3.0.
fn write_fixture(path: &Path) -> Result<()> {
    let timestamps: Vec<f64> = (0..500).map(|i| i as f64 / 100.0).collect();
    let series: Vec<Vec<f64>> = timestamps.iter().map(|t| vec![*t]).collect();
    let document = json!([
        {
            "info": { "name": ["EEG"], "type": ["EEG"], "channel_count": ["1"], "effective_srate": 100.0 },
            "time_stamps": timestamps,
            "time_series": series
        },
        {
            "info": { "name": ["Markers"], "type": ["Markers"] },
            "time_stamps": [1.0, 3.0],
            "time_series": [["A"], ["B"]]
        }
    ]);
    std::fs::write(path, serde_json::to_string(&document)?)?;
    Ok(())
}

fn run(session: &mut Session, script: &str) -> Result<Vec<String>> {
    let mut output = Vec::new();
    handle_commands(session, Cursor::new(script.to_string()), &mut output)?;
    Ok(String::from_utf8(output)?.lines().map(str::to_string).collect())
}

#[test]
fn test_full_session_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let recording = dir.path().join("recording.json");
    let export = dir.path().join("eeg segment.csv");
    write_fixture(&recording)?;

    let script = format!(
        "LOAD \"{}\"\nCHANNELS\nTRIGGERS\nTRIM #0 #1 \"Stream 1 - EEG\"\nSAVE A B \"Stream 1 - EEG\"\nSAVED\nEXPORT 1.0 3.0 \"{}\" \"Stream 1 - EEG\"\nPROCESS --saved \"Stream 1 - EEG\"\nPROCESS \"Stream 1 - EEG\"\n",
        recording.display(),
        export.display()
    );
    let mut session = Session::default();
    let lines = run(&mut session, &script)?;

    assert_eq!(lines[0], "STATUS LOADED 1 numeric stream(s), 1 channel(s), 2 trigger(s)");
    assert!(lines[1].starts_with("CHANNEL \"Stream 1 - EEG\" type=EEG samples=500"));
    assert_eq!(lines[2], "STATUS CHANNELS 1");
    assert!(lines[3].starts_with("TRIGGER #0"));
    assert!(lines[4].starts_with("TRIGGER #1"));
    assert_eq!(lines[5], "STATUS TRIGGERS 2");
    assert_eq!(lines[6], "TRIMMED \"Stream 1 - EEG\" samples=201");
    assert_eq!(lines[7], "STATUS TRIMMED 1");
    assert_eq!(lines[8], "STATUS SAVED 1");
    assert!(lines[9].starts_with("SEGMENT \"Stream 1 - EEG\" [1.000, 3.000] samples=201"));
    assert_eq!(lines[10], "STATUS SEGMENTS 1");
    assert_eq!(lines[11], "STATUS EXPORTED 201 row(s), 2/2 trigger(s) attached");
    assert!(lines[12].starts_with("PROCESSED \"Stream 1 - EEG\" (saved)"));
    assert_eq!(lines[13], "STATUS PROCESSED 1");
    assert!(lines[14].starts_with("PROCESSED \"Stream 1 - EEG\" (full)"));
    assert_eq!(lines[15], "STATUS PROCESSED 1");
    assert_eq!(lines.len(), 16);

    assert!(export.exists());
    assert_eq!(session.store().len(), 1);
    Ok(())
}

#[test]
fn test_errors_do_not_stop_the_loop() -> Result<()> {
    let mut session = Session::default();
    let lines = run(
        &mut session,
        "FROBNICATE\nCHANNELS\nLOAD\nTRIM 3 1 x\nLOAD \"unterminated\nTRIGGERS\n",
    )?;

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("ERROR unknown command"));
    assert!(lines[1].starts_with("ERROR"));
    assert!(lines[2].starts_with("ERROR usage: LOAD"));
    assert!(lines[3].starts_with("ERROR"));
    assert!(lines[4].starts_with("ERROR unterminated quote"));
    assert_eq!(lines[5], "STATUS TRIGGERS 0");
    Ok(())
}

#[test]
fn test_preloaded_command_runs_before_piped_input() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let recording = dir.path().join("recording.json");
    write_fixture(&recording)?;

    let preload = format!("LOAD \"{}\"\n", recording.display());
    let piped = Cursor::new("TRIGGERS\nQUIT\n");
    let input = Cursor::new(preload).chain(piped);

    let mut session = Session::default();
    let mut output = Vec::new();
    handle_commands(&mut session, input, &mut output)?;
    let lines: Vec<String> = String::from_utf8(output)?.lines().map(str::to_string).collect();

    assert!(lines[0].starts_with("STATUS LOADED"));
    assert_eq!(lines[3], "STATUS TRIGGERS 2");
    assert_eq!(lines[4], "STATUS QUIT");
    Ok(())
}

#[test]
fn test_quit_stops_reading() -> Result<()> {
    let mut session = Session::default();
    let lines = run(&mut session, "\n  \nquit\nTRIGGERS\n")?;
    assert_eq!(lines, vec!["STATUS QUIT"]);
    Ok(())
}

#[test]
fn test_unknown_channel_is_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let recording = dir.path().join("recording.json");
    write_fixture(&recording)?;

    let mut session = Session::default();
    let script = format!(
        "LOAD \"{}\"\nTRIM 1 2 \"Stream 9 - Nope\"\nSAVE 1 2 \"Stream 1 - EEG\" \"Stream 9 - Nope\"\nSAVED\n",
        recording.display()
    );
    let lines = run(&mut session, &script)?;
    assert!(lines[0].starts_with("STATUS LOADED"));
    assert!(lines[1].starts_with("ERROR"));
    assert!(lines[1].contains("Stream 9 - Nope"));
    assert!(lines[2].starts_with("ERROR"));
    // Nothing is stored when one label fails
    assert_eq!(lines[3], "STATUS SEGMENTS 0");
    Ok(())
}

#[test]
fn test_preview_takes_bounds_as_typed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let recording = dir.path().join("recording.json");
    write_fixture(&recording)?;

    let mut session = Session::default();
    let script = format!(
        "LOAD \"{}\"\nPREVIEW 1.0 3.0 \"Stream 1 - EEG\"\nPREVIEW from to \"Stream 1 - EEG\"\nPREVIEW 3 1 \"Stream 1 - EEG\"\n",
        recording.display()
    );
    let lines = run(&mut session, &script)?;
    assert_eq!(lines[1], "PREVIEW \"Stream 1 - EEG\" [1.000, 3.000] samples=201");
    assert_eq!(lines[2], "STATUS PREVIEW 201");
    assert_eq!(lines[3], "PREVIEW \"Stream 1 - EEG\" [0.000, 4.990] samples=500");
    assert_eq!(lines[4], "STATUS PREVIEW 500");
    assert!(lines[5].starts_with("ERROR"));
    assert_eq!(lines.len(), 6);
    Ok(())
}

#[test]
fn test_tokenizer_keeps_quoted_runs() -> Result<()> {
    assert_eq!(
        tokenize(r#"TRIM 1.5 #2 "Stream 1 - EEG 1"  plain"#)?,
        vec!["TRIM", "1.5", "#2", "Stream 1 - EEG 1", "plain"]
    );
    assert_eq!(tokenize(r#"LOAD """#)?, vec!["LOAD", ""]);
    assert!(tokenize("   ")?.is_empty());
    assert!(tokenize(r#"EXPORT "open"#).is_err());
    Ok(())
}
