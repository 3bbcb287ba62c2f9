//! Expected sampling rates by stream type, and reconciliation with the rate a
//! recording declares.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in table, checked in order; the first pattern contained in the
/// upper-cased type wins.
const EXPECTED_RATES: &[(&[&str], f64)] = &[
    (&["ACC", "GYRO", "MAG"], 25.0),
    (&["PPG"], 25.0),
    (&["TEMP"], 7.0),
    (&["EDA"], 15.0),
];

const RATE_TOLERANCE: f64 = 1e-9;

/// Expected acquisition frequency for a declared stream type.
pub fn expected_sampling_rate(declared_type: &str) -> Option<f64> {
    let folded = declared_type.to_uppercase();
    EXPECTED_RATES
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|pattern| folded.contains(pattern)))
        .map(|(_, rate)| *rate)
}

/// A user-supplied entry that is consulted before the built-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRule {
    pub pattern: String,
    pub rate: f64,
}

/// Expected-rate lookup with optional overrides.
#[derive(Debug, Clone, Default)]
pub struct RateOracle {
    overrides: Vec<RateRule>,
}

impl RateOracle {
    pub fn new(overrides: Vec<RateRule>) -> Self {
        Self { overrides }
    }

    pub fn expected(&self, declared_type: Option<&str>) -> Option<f64> {
        let declared_type = declared_type?;
        let folded = declared_type.to_uppercase();
        self.overrides
            .iter()
            .find(|rule| folded.contains(&rule.pattern.to_uppercase()))
            .map(|rule| rule.rate)
            .or_else(|| expected_sampling_rate(declared_type))
    }

    /// Resolve the rate to process a stream at. `None` means the stream cannot
    /// take part in rate-dependent processing.
    pub fn resolve(
        &self,
        declared_type: Option<&str>,
        declared_rate: Option<f64>,
    ) -> Option<RateResolution> {
        reconcile(declared_rate, self.expected(declared_type))
    }
}

/// Which side a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Declared,
    Expected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateResolution {
    pub rate: f64,
    pub source: RateSource,
    /// Set when the declared rate disagreed with the expected one.
    pub notice: Option<RateNotice>,
}

/// Declared and expected rates disagree; the expected one was used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateNotice {
    pub declared: f64,
    pub expected: f64,
}

impl fmt::Display for RateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "declared sampling rate {} Hz differs from expected {} Hz; using {} Hz",
            self.declared, self.expected, self.expected
        )
    }
}

/// Combine a declared effective rate with the expected rate for the type.
pub fn reconcile(declared: Option<f64>, expected: Option<f64>) -> Option<RateResolution> {
    let declared = declared.filter(|rate| rate.is_finite() && *rate > 0.0);
    let expected = expected.filter(|rate| rate.is_finite() && *rate > 0.0);

    match (declared, expected) {
        (Some(declared), Some(expected)) => {
            let notice = ((declared - expected).abs() > RATE_TOLERANCE)
                .then_some(RateNotice { declared, expected });
            Some(RateResolution {
                rate: expected,
                source: RateSource::Expected,
                notice,
            })
        }
        (None, Some(expected)) => Some(RateResolution {
            rate: expected,
            source: RateSource::Expected,
            notice: None,
        }),
        (Some(declared), None) => Some(RateResolution {
            rate: declared,
            source: RateSource::Declared,
            notice: None,
        }),
        (None, None) => None,
    }
}
