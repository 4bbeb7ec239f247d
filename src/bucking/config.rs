//! Per-call optimizer settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings that modify bucking behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuckingConfig {
    /// Multiplier on every sawlog price
    pub timber_price_factor: f64,
    /// Multiplier on the pulpwood price
    pub pulp_price_factor: f64,
    /// Move part of each log's volume to lower products
    pub use_downgrading: bool,
    /// Keep the section list in the result
    pub save_sections: bool,
}

impl Default for BuckingConfig {
    fn default() -> Self {
        Self {
            timber_price_factor: 1.0,
            pulp_price_factor: 1.0,
            use_downgrading: false,
            save_sections: false,
        }
    }
}

impl BuckingConfig {
    /// Load settings from JSON; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bucking config: {:?}", path))?;

        serde_json::from_str(&contents).with_context(|| "Failed to parse bucking config JSON")
    }

    pub fn with_sections(mut self) -> Self {
        self.save_sections = true;
        self
    }

    pub fn with_downgrading(mut self) -> Self {
        self.use_downgrading = true;
        self
    }
}
