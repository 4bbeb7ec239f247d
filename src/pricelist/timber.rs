//! Sawlog price tables for one species
//!
//! Prices are stored per diameter class (cm) with one value per log part.
//! Length corrections are percentages of the base price keyed by diameter
//! class and log length (dm).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sawlog part along the stem, each with its own price column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogPart {
    Butt = 0,
    Middle = 1,
    Top = 2,
}

impl LogPart {
    pub const ALL: [LogPart; 3] = [LogPart::Butt, LogPart::Middle, LogPart::Top];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// How a sawlog price is applied to a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeType {
    /// Price per m³ of a cylinder with the log's top diameter
    #[serde(rename = "m3to")]
    M3To,
    /// Price per m³ of solid log volume
    #[serde(rename = "m3fub")]
    M3Fub,
}

/// Butt, middle and top price for one diameter class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct TimberPriceForDiameter {
    pub butt: f64,
    pub middle: f64,
    pub top: f64,
}

impl TimberPriceForDiameter {
    pub fn price_for_log_part(&self, part: LogPart) -> f64 {
        match part {
            LogPart::Butt => self.butt,
            LogPart::Middle => self.middle,
            LogPart::Top => self.top,
        }
    }
}

impl From<[f64; 3]> for TimberPriceForDiameter {
    fn from([butt, middle, top]: [f64; 3]) -> Self {
        Self { butt, middle, top }
    }
}

impl From<TimberPriceForDiameter> for [f64; 3] {
    fn from(p: TimberPriceForDiameter) -> Self {
        [p.butt, p.middle, p.top]
    }
}

/// Diameter class → (length dm → percent of base price)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LengthCorrections(BTreeMap<u32, BTreeMap<u32, f64>>);

impl LengthCorrections {
    pub fn new(corrections: BTreeMap<u32, BTreeMap<u32, f64>>) -> Self {
        Self(corrections)
    }

    /// Percent for the nearest listed length at or below `length_dm`
    pub fn percent(&self, diameter_class: u32, length_dm: u32) -> Option<f64> {
        self.0
            .get(&diameter_class)?
            .range(..=length_dm)
            .next_back()
            .map(|(_, pct)| *pct)
    }

    /// Additive correction to `base_price` for a log of `length_dm`
    pub fn correction(&self, diameter_class: u32, length_dm: u32, base_price: f64) -> f64 {
        match self.percent(diameter_class, length_dm) {
            Some(pct) => base_price * (pct - 100.0) / 100.0,
            None => 0.0,
        }
    }
}

/// Share of a sawlog's volume that is downgraded to lower products
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DowngradeProportions {
    pub pulpwood: f64,
    pub fuelwood: f64,
    pub harvest_residue: f64,
}

impl DowngradeProportions {
    /// (pulp, fuel, cull) shares, with cull clipped so the total never exceeds 1
    pub fn shares(&self) -> (f64, f64, f64) {
        let pulp = self.pulpwood;
        let fuel = self.fuelwood;
        let mut cull = self.harvest_residue;
        if pulp + fuel + cull > 1.0 {
            cull = (1.0 - pulp - fuel).max(0.0);
        }
        (pulp, fuel, cull)
    }
}

/// Highest point (m above ground) each sawlog part may reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MaxHeights {
    pub butt: f64,
    pub middle: f64,
    pub top: f64,
}

impl Default for MaxHeights {
    fn default() -> Self {
        Self {
            butt: 99.9,
            middle: 99.9,
            top: 99.9,
        }
    }
}

/// Complete sawlog price list for one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimberPricelist {
    pub volume_type: VolumeType,
    pub diameter_prices: BTreeMap<u32, TimberPriceForDiameter>,
    #[serde(default, rename = "LengthCorrectionsPercent")]
    pub length_corrections: LengthCorrections,
    #[serde(default)]
    pub downgrade_proportions: DowngradeProportions,
    #[serde(default)]
    pub max_height: MaxHeights,
}

impl TimberPricelist {
    pub fn new(volume_type: VolumeType) -> Self {
        Self {
            volume_type,
            diameter_prices: BTreeMap::new(),
            length_corrections: LengthCorrections::default(),
            downgrade_proportions: DowngradeProportions::default(),
            max_height: MaxHeights::default(),
        }
    }

    pub fn set_price_for_diameter(&mut self, diameter_cm: u32, prices: TimberPriceForDiameter) {
        self.diameter_prices.insert(diameter_cm, prices);
    }

    /// Smallest priced diameter class (0 when the table is empty)
    pub fn min_diameter(&self) -> u32 {
        self.diameter_prices.keys().next().copied().unwrap_or(0)
    }

    /// Largest priced diameter class (0 when the table is empty)
    pub fn max_diameter(&self) -> u32 {
        self.diameter_prices.keys().next_back().copied().unwrap_or(0)
    }

    /// Largest diameter class not exceeding `diameter_cm`
    pub fn diameter_class(&self, diameter_cm: f64) -> Option<u32> {
        if !(diameter_cm >= 0.0) {
            return None;
        }
        self.diameter_prices
            .range(..=diameter_cm.floor() as u32)
            .next_back()
            .map(|(d, _)| *d)
    }

    /// Base price for a log part at a diameter; 0 below the smallest class
    pub fn price_for_log_part(&self, part: LogPart, diameter_cm: f64) -> f64 {
        self.diameter_class(diameter_cm)
            .and_then(|d| self.diameter_prices.get(&d))
            .map(|p| p.price_for_log_part(part))
            .unwrap_or(0.0)
    }

    /// Base price plus length correction, per the list's volume unit
    pub fn corrected_price(&self, part: LogPart, diameter_cm: f64, length_dm: u32) -> f64 {
        let base = self.price_for_log_part(part, diameter_cm);
        match self.diameter_class(diameter_cm) {
            Some(class) => base + self.length_corrections.correction(class, length_dm, base),
            None => base,
        }
    }

    pub fn max_height(&self, part: LogPart) -> f64 {
        match part {
            LogPart::Butt => self.max_height.butt,
            LogPart::Middle => self.max_height.middle,
            LogPart::Top => self.max_height.top,
        }
    }
}
