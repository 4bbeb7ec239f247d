//! Output of one bucking run

use super::quality::{QualityType, QUALITY_COUNT};
use serde::{Deserialize, Serialize};

/// Share of a section's volume sold as each product
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductShares {
    pub timber: f64,
    pub pulp: f64,
    pub cull: f64,
    pub fuelwood: f64,
}

impl ProductShares {
    pub fn timber() -> Self {
        Self {
            timber: 1.0,
            ..Self::default()
        }
    }

    pub fn cull() -> Self {
        Self {
            cull: 1.0,
            ..Self::default()
        }
    }

    /// Volume-weighted mean of two share sets
    pub fn weighted(a: &Self, wa: f64, b: &Self, wb: f64) -> Self {
        let total = wa + wb;
        if total <= 0.0 {
            return *a;
        }
        let mix = |x: f64, y: f64| (x * wa + y * wb) / total;
        Self {
            timber: mix(a.timber, b.timber),
            pulp: mix(a.pulp, b.pulp),
            cull: mix(a.cull, b.cull),
            fuelwood: mix(a.fuelwood, b.fuelwood),
        }
    }
}

/// One log in the cutting plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCutSection {
    /// Start position in dm above the stump
    pub start_point: usize,
    /// End position in dm above the stump
    pub end_point: usize,
    /// Volume in m³
    pub volume: f64,
    /// Diameter at the top end (cm)
    pub top_diameter: f64,
    /// Value contributed by this section
    pub value: f64,
    pub species_group: String,
    pub shares: ProductShares,
    pub quality: QualityType,
}

impl CrossCutSection {
    pub fn length_dm(&self) -> usize {
        self.end_point - self.start_point
    }

    /// Join with the adjacent section `upper` (which starts where `self` ends)
    ///
    /// Value and volume add up; the top diameter comes from the higher section;
    /// shares are volume-weighted.
    pub fn merge(&self, upper: &CrossCutSection) -> CrossCutSection {
        let top_diameter = if upper.end_point > self.end_point {
            upper.top_diameter
        } else {
            self.top_diameter
        };
        CrossCutSection {
            start_point: self.start_point.min(upper.start_point),
            end_point: self.end_point.max(upper.end_point),
            volume: self.volume + upper.volume,
            top_diameter,
            value: self.value + upper.value,
            species_group: self.species_group.clone(),
            shares: ProductShares::weighted(&self.shares, self.volume, &upper.shares, upper.volume),
            quality: self.quality,
        }
    }
}

/// Result of optimising one stem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuckingResult {
    pub species_group: String,
    pub total_value: f64,
    /// Share of stem volume above the last cut
    pub top_proportion: f64,
    /// Volume above the last cut (m³)
    pub top_volume: f64,
    /// Share of volume with diameter at or above the dead-wood threshold
    pub dead_wood_proportion: f64,
    pub high_stump_volume_proportion: f64,
    pub high_stump_value_proportion: f64,
    /// Height of the last cut as a share of tree height
    pub last_cut_relative_height: f64,
    /// Volume (m³) per quality grade, indexed by `QualityType::index`
    pub volume_per_quality: [f64; QUALITY_COUNT],
    /// Mean sawlog price per m³ for each sawlog grade
    pub timber_price_by_quality: [f64; QUALITY_COUNT],
    /// Volume up to the 5 cm top (m³)
    pub vol_fub_5cm: f64,
    /// Total stem volume above the stump (m³)
    pub vol_sk_ub: f64,
    pub dbh_cm: f64,
    pub height_m: f64,
    pub stump_height_m: f64,
    pub diameter_stump_cm: f64,
    pub taper_diameters_cm: Vec<f64>,
    pub taper_heights_m: Vec<f64>,
    /// Section plan, kept when `BuckingConfig::save_sections` is set
    pub sections: Option<Vec<CrossCutSection>>,
}

impl BuckingResult {
    /// Volume of all sections, if they were kept
    pub fn bucked_volume(&self) -> Option<f64> {
        self.sections
            .as_ref()
            .map(|s| s.iter().map(|sec| sec.volume).sum())
    }

    pub fn volume_for(&self, quality: QualityType) -> f64 {
        self.volume_per_quality[quality.index()]
    }

    pub fn timber_volume(&self) -> f64 {
        [QualityType::ButtLog, QualityType::MiddleLog, QualityType::TopLog]
            .iter()
            .map(|q| self.volume_for(*q))
            .sum()
    }
}
