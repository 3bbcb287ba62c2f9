//! Downstream signal processing
//!
//! Physiological analysis lives outside this crate. Channels are routed by
//! their declared stream type to whatever [`SignalProcessor`] the host has
//! registered for that kind; types with no kind at all are reported as
//! unsupported without any computation.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Signal families that have a processing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Eda,
    Ecg,
    Pupil,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Eda => "EDA",
            SignalKind::Ecg => "ECG",
            SignalKind::Pupil => "PUPIL",
        };
        f.write_str(name)
    }
}

impl SignalKind {
    /// Kind for a declared stream type, matched by case-folded substring in
    /// the order EDA, ECG, PUPIL.
    pub fn from_declared_type(declared_type: &str) -> Option<Self> {
        let folded = declared_type.to_uppercase();
        [SignalKind::Eda, SignalKind::Ecg, SignalKind::Pupil]
            .into_iter()
            .find(|kind| folded.contains(&kind.to_string()))
    }
}

/// What a processor receives.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingInput<'a> {
    pub timestamps: &'a [f64],
    pub samples: &'a [f64],
    pub sampling_rate: f64,
    pub declared_type: &'a str,
}

/// What a processor returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedSignal {
    pub signal: Vec<f64>,
    pub metrics: BTreeMap<String, f64>,
}

pub trait SignalProcessor {
    fn name(&self) -> &str;
    fn process(&self, input: &ProcessingInput<'_>) -> Result<ProcessedSignal>;
}

/// Per-channel result of a processing request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingOutcome {
    Processed {
        kind: SignalKind,
        processor: String,
        output: ProcessedSignal,
    },
    /// The declared type maps to no known kind; nothing was computed.
    Unsupported { declared_type: String },
    /// The kind is known but the host registered no processor for it.
    NoProcessor { kind: SignalKind },
    /// No usable sampling rate; the channel was skipped.
    RateUnavailable,
    Failed { kind: SignalKind, message: String },
}

impl fmt::Display for ProcessingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingOutcome::Processed {
                kind,
                processor,
                output,
            } => {
                write!(f, "{} via {} ({} samples", kind, processor, output.signal.len())?;
                for (name, value) in &output.metrics {
                    write!(f, ", {}={:.6}", name, value)?;
                }
                f.write_str(")")
            }
            ProcessingOutcome::Unsupported { declared_type } => {
                write!(f, "unsupported type '{}'", declared_type)
            }
            ProcessingOutcome::NoProcessor { kind } => write!(f, "no {} processor registered", kind),
            ProcessingOutcome::RateUnavailable => f.write_str("skipped: no valid sampling rate"),
            ProcessingOutcome::Failed { kind, message } => {
                write!(f, "{} processing failed: {}", kind, message)
            }
        }
    }
}

/// Attenuating placeholder for pupillometry: scales the signal by 0.95 and
/// reports its mean and standard deviation.
#[derive(Debug, Default)]
pub struct PupilProcessor;

const PUPIL_ATTENUATION: f64 = 0.95;

impl SignalProcessor for PupilProcessor {
    fn name(&self) -> &str {
        "pupil-attenuation"
    }

    fn process(&self, input: &ProcessingInput<'_>) -> Result<ProcessedSignal> {
        if input.samples.is_empty() {
            return Err(anyhow::anyhow!("no samples to process"));
        }
        let signal: Vec<f64> = input.samples.iter().map(|v| v * PUPIL_ATTENUATION).collect();

        let n = signal.len() as f64;
        let mean = signal.iter().sum::<f64>() / n;
        let variance = signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut metrics = BTreeMap::new();
        metrics.insert("mean".to_string(), mean);
        metrics.insert("std".to_string(), variance.sqrt());

        Ok(ProcessedSignal { signal, metrics })
    }
}

/// Processors by signal kind.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<SignalKind, Box<dyn SignalProcessor>>,
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.processors.keys().collect();
        kinds.sort();
        f.debug_struct("ProcessorRegistry").field("kinds", &kinds).finish()
    }
}

impl ProcessorRegistry {
    /// Registry with the processors shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(SignalKind::Pupil, Box::new(PupilProcessor));
        registry
    }

    /// Install a processor for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: SignalKind, processor: Box<dyn SignalProcessor>) {
        self.processors.insert(kind, processor);
    }

    pub fn dispatch(&self, input: &ProcessingInput<'_>) -> ProcessingOutcome {
        let Some(kind) = SignalKind::from_declared_type(input.declared_type) else {
            return ProcessingOutcome::Unsupported {
                declared_type: input.declared_type.to_string(),
            };
        };
        let Some(processor) = self.processors.get(&kind) else {
            return ProcessingOutcome::NoProcessor { kind };
        };

        match processor.process(input) {
            Ok(output) => ProcessingOutcome::Processed {
                kind,
                processor: processor.name().to_string(),
                output,
            },
            Err(e) => ProcessingOutcome::Failed {
                kind,
                message: format!("{:#}", e),
            },
        }
    }
}
