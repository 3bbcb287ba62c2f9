//! Channel name resolution
//!
//! Names come from the per-channel descriptors when the header has any
//! labels at all; otherwise they are synthesized from the stream name and the
//! declared channel count.

use crate::header::StreamHeader;

/// Name prefix used when a stream has neither labels nor a name.
pub const SYNTHETIC_CHANNEL_PREFIX: &str = "Canal";

/// Resolve the ordered channel names declared by a header.
///
/// The returned list follows the header, not the data: its length may differ
/// from the stream's real width. Use [`channel_names_for_width`] when the
/// width is known.
pub fn resolve_channel_names(header: &StreamHeader) -> Vec<String> {
    if let Some(names) = names_from_descriptors(header) {
        return names;
    }

    let count = header.declared_channel_count().unwrap_or(1);
    synthesize_names(header.name.as_deref(), count)
}

/// Resolve names for a stream that is known to carry `width` channels.
///
/// If the header yields fewer names than `width`, the whole list is rebuilt
/// from the stream-level fallback (stream name, or `Stream {number}`).
/// Header names and fallback names are never mixed.
pub fn channel_names_for_width(header: &StreamHeader, number: usize, width: usize) -> Vec<String> {
    let resolved = resolve_channel_names(header);
    if resolved.len() >= width {
        return resolved.into_iter().take(width).collect();
    }

    tracing::debug!(
        "Stream {}: header declares {} channel name(s) for {} column(s), using fallback names",
        number,
        resolved.len(),
        width
    );
    let base = header
        .name
        .clone()
        .unwrap_or_else(|| format!("Stream {}", number));
    synthesize_names(Some(&base), width)
}

/// Build `count` names from an optional base name.
///
/// A single channel with a base name is just the base name.
pub fn synthesize_names(base: Option<&str>, count: usize) -> Vec<String> {
    match base {
        Some(base) if count == 1 => vec![base.to_string()],
        Some(base) => (1..=count).map(|i| format!("{} {}", base, i)).collect(),
        None => (1..=count)
            .map(|i| format!("{} {}", SYNTHETIC_CHANNEL_PREFIX, i))
            .collect(),
    }
}

fn names_from_descriptors(header: &StreamHeader) -> Option<Vec<String>> {
    let descriptors = header.channel_descriptors()?;
    if descriptors.iter().all(|descriptor| descriptor.label.is_none()) {
        return None;
    }

    // Unlabeled slots keep their position
    Some(
        descriptors
            .iter()
            .enumerate()
            .map(|(i, descriptor)| {
                descriptor
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("{} {}", SYNTHETIC_CHANNEL_PREFIX, i + 1))
            })
            .collect(),
    )
}
