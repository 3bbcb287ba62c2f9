//! XDF Segment Toolbox - channel extraction and trigger-aligned segment export
//! for multi-stream LSL recordings
//!
//! A recording holds several streams. Numeric streams carry physiological
//! signals (EDA, ECG, pupil size, accelerometry, ...); string streams carry
//! experimental event markers. This crate turns such a recording into a flat
//! set of addressable channels plus one sorted list of triggers, cuts
//! channels to time windows with interpolated boundary samples, and exports
//! the cut segments as delimited tables with triggers attached to the
//! nearest sample.
//!
//! # Command-Line Tools
//!
//! - `xdf-toolbox` - Interactive session driven by stdin commands
//!   (LOAD/CHANNELS/TRIGGERS/TRIM/PREVIEW/SAVE/EXPORT/PROCESS/QUIT)
//! - `xdf-inspect` - Stream, channel and trigger overview of a recording
//! - `xdf-trim` - One-shot trim and CSV export
//! - `xdf-demo` - Synthetic recording generator
//!
//! # Quick Start
//!
//! ```bash
//! # Generate a test recording
//! xdf-demo --output demo.json
//!
//! # Look at it
//! xdf-inspect demo.json
//!
//! # Export the EDA channel from the first trigger up to 12.5 s
//! xdf-trim demo.json --channel "Stream 1 - EDA" --start '#0' --end 12.5 -o eda.csv
//! ```
//!
//! # Recording Formats
//!
//! - JSON dumps shaped like pyxdf's `load_xdf` output (see [`container::json`])
//! - Zarr stores with one group per stream (see [`zarr`])
//!
//! # Library Usage
//!
//! - [`session`] - The session: load, trim, align, export, save, process
//! - [`registry`] - Stream partitioning and channel naming
//! - [`trim`] - Boundary-exact trimming
//! - [`align`] - Trigger-to-sample alignment
//! - [`srate`] - Sampling-rate reconciliation
//! - [`processing`] - Per-signal-type processing dispatch
//!
//! # License
//!
//! This project is licensed under the GNU General Public License v3.0.

pub mod align;
pub mod cli;
pub mod commands;
pub mod config;
pub mod container;
pub mod error;
pub mod export;
pub mod header;
pub mod metadata;
pub mod processing;
pub mod registry;
pub mod session;
pub mod srate;
pub mod store;
pub mod stream;
pub mod triggers;
pub mod trim;
pub mod zarr;

use chrono::Datelike;

/// Display GPL license notice for a program
pub fn display_license_notice(program_name: &str) {
	let version = env!("CARGO_PKG_VERSION");
	let current_year = chrono::Utc::now().year();
	let copyright_year = if current_year == 2025 {
		"2025".to_string()
	} else {
		format!("2025-{}", current_year)
	};

	eprintln!(
		"{} {} Copyright (C) {} {}",
		program_name,
		version,
		copyright_year,
		env!("CARGO_PKG_AUTHORS")
	);
	eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
	eprintln!("For details see https://www.gnu.org/licenses/gpl-3.0.html#license-text.");
	eprintln!("This is free software, and you are welcome to redistribute it under certain conditions.");
	eprintln!();
}
