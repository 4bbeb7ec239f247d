//! Price lists
//!
//! A price list holds one `Common` block (length and diameter limits, pulp,
//! cull and fuelwood prices, high-stump height) and one sawlog table per
//! species. The JSON layout follows the Mellanskog 2013 list bundled under
//! `data/`.

pub mod timber;

pub use timber::{
    DowngradeProportions, LengthCorrections, LogPart, MaxHeights, TimberPriceForDiameter,
    TimberPricelist, VolumeType,
};

use crate::error::BuckingError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Pulpwood price used when neither species nor genus is listed
pub const DEFAULT_PULPWOOD_PRICE: f64 = 200.0;

const MELLANSKOG_2013: &str = include_str!("data/mellanskog_2013.json");

/// Inclusive length range in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct LengthRange {
    pub min: f64,
    pub max: f64,
}

impl LengthRange {
    /// (min, max) rounded to whole decimetres
    pub fn to_dm(self) -> (usize, usize) {
        (
            (self.min * 10.0).round().max(0.0) as usize,
            (self.max * 10.0).round().max(0.0) as usize,
        )
    }
}

impl From<(f64, f64)> for LengthRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<LengthRange> for (f64, f64) {
    fn from(r: LengthRange) -> Self {
        (r.min, r.max)
    }
}

/// Inclusive diameter range in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct DiameterRange {
    pub min: f64,
    pub max: f64,
}

impl DiameterRange {
    pub fn contains(&self, diameter_cm: f64) -> bool {
        diameter_cm >= self.min && diameter_cm <= self.max
    }
}

impl From<(f64, f64)> for DiameterRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<DiameterRange> for (f64, f64) {
    fn from(r: DiameterRange) -> Self {
        (r.min, r.max)
    }
}

/// Species-independent part of a price list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrices {
    pub sawlog_length_range: LengthRange,
    pub pulpwood_length_range: LengthRange,
    pub pulp_log_diameter_range: DiameterRange,
    /// Smallest top diameter (cm) worth bucking
    pub top_diameter: f64,
    /// Price per m³ keyed by lower-case species or genus name
    pub pulpwood_prices: BTreeMap<String, f64>,
    #[serde(default)]
    pub pulpwood_cull_proportion: f64,
    #[serde(default)]
    pub fuelwood_proportion: f64,
    /// Cull (harvest residue) price per m³
    pub harvest_residue_price: f64,
    pub fuelwood_log_price: f64,
    /// High-stump height in metres; 0 disables high-stump accounting
    #[serde(default)]
    pub high_stump_height: f64,
}

/// Combined pulpwood and sawlog price list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pricelist {
    #[serde(rename = "Common")]
    pub common: CommonPrices,
    #[serde(flatten)]
    pub timber: BTreeMap<String, TimberPricelist>,
}

impl Pricelist {
    /// The bundled Mellanskog 2013 price list (pine and spruce)
    pub fn mellanskog_2013() -> Result<Self> {
        Self::from_json_str(MELLANSKOG_2013)
            .context("Bundled Mellanskog 2013 price list is invalid")
    }

    /// Load a price list from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read price list: {:?}", path))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse price list: {:?}", path))
    }

    /// Parse a price list document: a `Common` block plus one block per species
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut blocks: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(json).context("Price list is not a JSON object")?;

        let common_block = blocks
            .remove("Common")
            .ok_or_else(|| anyhow::anyhow!("Price data is missing the mandatory 'Common' block"))?;
        let mut common: CommonPrices =
            serde_json::from_value(common_block).context("Invalid 'Common' block")?;
        common.pulpwood_prices = common
            .pulpwood_prices
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();

        let mut timber = BTreeMap::new();
        for (species, block) in blocks {
            let prices: TimberPricelist = serde_json::from_value(block)
                .with_context(|| format!("Invalid timber prices for '{}'", species))?;
            timber.insert(species.trim().to_lowercase(), prices);
        }

        Ok(Self { common, timber })
    }

    /// Keep only the sawlog tables for `species`
    ///
    /// A species with pulpwood prices but no sawlog table is accepted.
    pub fn restricted_to(&self, species: &[&str]) -> Result<Self, BuckingError> {
        let mut timber = BTreeMap::new();
        for name in species {
            let key = name.trim().to_lowercase();
            match self.timber.get(&key) {
                Some(prices) => {
                    timber.insert(key, prices.clone());
                }
                None if self.common.pulpwood_prices.contains_key(&key) => {}
                None => return Err(BuckingError::UnknownSpecies(key)),
            }
        }
        Ok(Self {
            common: self.common.clone(),
            timber,
        })
    }

    pub fn timber_prices(&self, species: &str) -> Option<&TimberPricelist> {
        self.timber.get(species)
    }

    /// Pulpwood price per m³: full species name, then genus, then the default
    pub fn pulpwood_price(&self, species: &str) -> f64 {
        let key = species.trim().to_lowercase();
        if let Some(price) = self.common.pulpwood_prices.get(&key) {
            return *price;
        }
        let genus = key.split_whitespace().next().unwrap_or("");
        self.common
            .pulpwood_prices
            .get(genus)
            .copied()
            .unwrap_or(DEFAULT_PULPWOOD_PRICE)
    }

    /// (waste, fuel) shares of a pulp log, waste clipped so the sum stays ≤ 1
    pub fn pulpwood_waste_and_fuel(&self) -> (f64, f64) {
        let fuel = self.common.fuelwood_proportion;
        let mut waste = self.common.pulpwood_cull_proportion;
        if waste + fuel > 1.0 {
            waste = (1.0 - fuel).max(0.0);
        }
        (waste, fuel)
    }

    /// FNV-1a hash of the canonical JSON form
    ///
    /// Same on every platform and toolchain, so fingerprints written into a
    /// saved cube stay comparable.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_string(self).context("Failed to serialise price list")?;
        Ok(format!("{:016x}", fnv1a_64(canonical.as_bytes())))
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}
