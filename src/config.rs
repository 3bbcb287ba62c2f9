use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::srate::RateRule;

/// Tunables shared by the command-line tools.
///
/// ```json
/// {
///   "delimiter": ";",
///   "expected_rates": [{ "pattern": "RESP", "rate": 50.0 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Field delimiter for CSV export (ASCII).
    pub delimiter: char,
    /// Expected rates consulted before the built-in type table.
    pub expected_rates: Vec<RateRule>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            expected_rates: Vec::new(),
        }
    }
}

impl ToolConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ToolConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(anyhow::anyhow!(
                "Delimiter must be an ASCII character, got {:?}",
                self.delimiter
            ));
        }
        if let Some(rule) = self
            .expected_rates
            .iter()
            .find(|rule| rule.pattern.is_empty() || !(rule.rate > 0.0))
        {
            return Err(anyhow::anyhow!(
                "Invalid expected rate rule: pattern {:?}, rate {}",
                rule.pattern,
                rule.rate
            ));
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}
