//! Line commands for the interactive session.
//!
//! One command per line; arguments containing spaces (channel labels, paths)
//! are double-quoted. Every command answers with zero or more data lines
//! followed by exactly one `STATUS ...` or `ERROR ...` line.
//!
//! ```text
//! LOAD recording.json
//! CHANNELS
//! TRIGGERS
//! TRIM <start> <end> <label>...
//! PREVIEW <start> <end> <label>
//! SAVE <start> <end> <label>...
//! SAVED
//! EXPORT <start> <end> <path> <label>
//! PROCESS [--saved] <label>...
//! QUIT
//! ```
//!
//! `<start>` and `<end>` are seconds, `#<index>` into the trigger list, or a
//! trigger label. `PREVIEW` takes its bounds as plain text instead: anything
//! that is not a number shows the channel untrimmed.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::container::open_recording;
use crate::session::{ProcessSource, Session, TimeWindow, WindowBound};

/// What the loop should do after a command.
enum Flow {
    Continue,
    Quit,
}

pub fn handle_commands<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
) -> Result<()> {
    for line_res in input.lines() {
        let line = match line_res {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("stdin read error: {}", e);
                break;
            }
        };
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        let mut reply = Vec::new();
        match execute(session, cmd, &mut reply) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => {
                write_lines(&mut output, &reply)?;
                break;
            }
            Err(e) => reply.push(format!("ERROR {:#}", e)),
        }
        write_lines(&mut output, &reply)?;
    }
    Ok(())
}

fn write_lines<W: Write>(output: &mut W, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(output, "{}", line)?;
    }
    output.flush().ok();
    Ok(())
}

fn execute(session: &mut Session, cmd: &str, reply: &mut Vec<String>) -> Result<Flow> {
    let tokens = tokenize(cmd)?;
    let Some((name, args)) = tokens.split_first() else {
        return Ok(Flow::Continue);
    };

    match name.to_ascii_uppercase().as_str() {
        "LOAD" => {
            let [path] = args else {
                bail!("usage: LOAD <path>");
            };
            let source = open_recording(Path::new(path))?;
            let summary = session.load(source.as_ref())?;
            reply.push(format!(
                "STATUS LOADED {} numeric stream(s), {} channel(s), {} trigger(s)",
                summary.numeric_streams, summary.channels, summary.triggers
            ));
        }
        "CHANNELS" => {
            let registry = session.registry()?;
            for channel in registry.channels() {
                let rate = session
                    .resolve_rate(channel)
                    .map(|r| format!("{:.3} Hz", r.rate))
                    .unwrap_or_else(|| "rate unknown".to_string());
                reply.push(format!(
                    "CHANNEL \"{}\" type={} samples={} {}",
                    channel.label,
                    channel.declared_type().unwrap_or("-"),
                    channel.samples.len(),
                    rate
                ));
            }
            reply.push(format!("STATUS CHANNELS {}", registry.len()));
        }
        "TRIGGERS" => {
            let triggers = session.triggers();
            for (i, event) in triggers.iter().enumerate() {
                reply.push(format!("TRIGGER #{} {}", i, event));
            }
            reply.push(format!("STATUS TRIGGERS {}", triggers.len()));
        }
        "TRIM" => {
            let (window, labels) = window_and_labels(session, args, "TRIM <start> <end> <label>...")?;
            let trimmed = session.trim_many(labels, window)?;
            for (label, result) in &trimmed {
                reply.push(format!("TRIMMED \"{}\" samples={}", label, result.len()));
            }
            reply.push(format!("STATUS TRIMMED {}", trimmed.len()));
        }
        "PREVIEW" => {
            let [start, end, label] = args else {
                bail!("usage: PREVIEW <start> <end> <label>");
            };
            let trimmed = session.trim_text(label, start, end)?;
            if let (Some(first), Some(last)) = (trimmed.timestamps.first(), trimmed.timestamps.last()) {
                reply.push(format!(
                    "PREVIEW \"{}\" [{:.3}, {:.3}] samples={}",
                    label,
                    first,
                    last,
                    trimmed.len()
                ));
            }
            reply.push(format!("STATUS PREVIEW {}", trimmed.len()));
        }
        "SAVE" => {
            let (window, labels) = window_and_labels(session, args, "SAVE <start> <end> <label>...")?;
            let count = session.save(labels, window)?;
            reply.push(format!("STATUS SAVED {}", count));
        }
        "SAVED" => {
            for (label, segment) in session.store().iter() {
                reply.push(format!(
                    "SEGMENT \"{}\" [{:.3}, {:.3}] samples={}",
                    label,
                    segment.start,
                    segment.end,
                    segment.trim.len()
                ));
            }
            reply.push(format!("STATUS SEGMENTS {}", session.store().len()));
        }
        "EXPORT" => {
            let [start, end, path, label] = args else {
                bail!("usage: EXPORT <start> <end> <path> <label>");
            };
            let window = parse_window(session, start, end)?;
            let segment = session.export_csv_file(label, window, Path::new(path))?;
            reply.push(format!(
                "STATUS EXPORTED {} row(s), {}/{} trigger(s) attached",
                segment.rows.len(),
                segment.triggers_attached,
                segment.triggers_in_range
            ));
        }
        "PROCESS" => {
            let (source, labels) = match args.split_first() {
                Some((flag, rest)) if flag == "--saved" => (ProcessSource::Saved, rest),
                _ => (ProcessSource::Full, args),
            };
            let reports = session.process(labels, source)?;
            for report in &reports {
                let source = if report.from_saved { "saved" } else { "full" };
                reply.push(format!(
                    "PROCESSED \"{}\" ({}) {}",
                    report.label, source, report.outcome
                ));
            }
            reply.push(format!("STATUS PROCESSED {}", reports.len()));
        }
        "QUIT" => {
            reply.push("STATUS QUIT".to_string());
            return Ok(Flow::Quit);
        }
        _ => bail!("unknown command: {}", cmd),
    }
    Ok(Flow::Continue)
}

fn parse_window(session: &Session, start: &str, end: &str) -> Result<TimeWindow> {
    let start: WindowBound = start.parse()?;
    let end: WindowBound = end.parse()?;
    Ok(session.window(&start, &end)?)
}

fn window_and_labels<'a>(
    session: &Session,
    args: &'a [String],
    usage: &str,
) -> Result<(TimeWindow, &'a [String])> {
    let [start, end, labels @ ..] = args else {
        bail!("usage: {}", usage);
    };
    let window = parse_window(session, start, end).context("invalid window")?;
    Ok((window, labels))
}

/// Split a command line on whitespace, keeping double-quoted runs together.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        bail!("unterminated quote");
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}
