use serde::Serialize;
use std::fmt;

use crate::stream::MarkerEntry;

/// A labeled event taken from a marker stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    pub timestamp: f64,
    pub label: String,
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} s - {}", self.timestamp, self.label)
    }
}

/// Build the global trigger list from every marker stream's
/// `(timestamps, entries)` pair. The result is sorted by timestamp; events
/// sharing a timestamp keep their relative input order.
pub fn extract_triggers<'a, I>(marker_streams: I) -> Vec<TriggerEvent>
where
    I: IntoIterator<Item = (&'a [f64], &'a [MarkerEntry])>,
{
    let mut triggers: Vec<TriggerEvent> = marker_streams
        .into_iter()
        .flat_map(|(timestamps, entries)| {
            timestamps
                .iter()
                .zip(entries.iter())
                .filter_map(|(&timestamp, entry)| {
                    entry.label().map(|label| TriggerEvent {
                        timestamp,
                        label: label.to_string(),
                    })
                })
        })
        .collect();

    triggers.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    triggers
}

/// Events with `start <= timestamp <= end`, from a sorted trigger list.
pub fn triggers_in_range(triggers: &[TriggerEvent], start: f64, end: f64) -> &[TriggerEvent] {
    let first = triggers.partition_point(|event| event.timestamp < start);
    let last = triggers.partition_point(|event| event.timestamp <= end);
    if first >= last {
        return &[];
    }
    &triggers[first..last]
}
