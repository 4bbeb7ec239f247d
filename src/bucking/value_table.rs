//! Sawlog unit values precomputed per (diameter class, length, log part)

use super::quality::LogLimits;
use crate::pricelist::{LogPart, TimberPricelist, VolumeType};
use std::f64::consts::PI;

/// Flat table of sawlog values for one species
///
/// For `m3to` lists each entry already includes the top-diameter cylinder
/// volume, so it is the log's value. For `m3fub` lists entries are prices
/// per m³ and the caller multiplies by the segment volume.
#[derive(Debug, Clone)]
pub struct TimberValueTable {
    min_diameter: u32,
    max_diameter: u32,
    min_length: usize,
    max_length: usize,
    values: Vec<f64>,
}

impl TimberValueTable {
    pub fn build(prices: &TimberPricelist, limits: &LogLimits) -> Self {
        let (min_diameter, max_diameter) = limits.timber_diameter_cm;
        let (min_length, max_length) = limits.timber_length_dm;
        let n_diam = (max_diameter + 1).saturating_sub(min_diameter) as usize;
        let n_len = (max_length + 1).saturating_sub(min_length);

        let mut values = vec![0.0; n_diam * n_len * LogPart::ALL.len()];
        for d in min_diameter..=max_diameter {
            let radius_m = d as f64 / 200.0;
            for length in min_length..=max_length {
                for part in LogPart::ALL {
                    let mut value = prices.corrected_price(part, d as f64, length as u32);
                    if prices.volume_type == VolumeType::M3To {
                        value *= PI * radius_m * radius_m * (length as f64 / 10.0);
                    }
                    let idx = Self::index_of(d - min_diameter, length - min_length, n_len, part);
                    values[idx] = value;
                }
            }
        }

        Self {
            min_diameter,
            max_diameter,
            min_length,
            max_length,
            values,
        }
    }

    fn index_of(d_off: u32, len_off: usize, n_len: usize, part: LogPart) -> usize {
        (d_off as usize * n_len + len_off) * LogPart::ALL.len() + part.index()
    }

    /// Value for a log; 0 outside the table
    pub fn get(&self, diameter_class: u32, length_dm: usize, part: LogPart) -> f64 {
        if diameter_class < self.min_diameter
            || diameter_class > self.max_diameter
            || length_dm < self.min_length
            || length_dm > self.max_length
        {
            return 0.0;
        }
        let n_len = self.max_length + 1 - self.min_length;
        let idx = Self::index_of(
            diameter_class - self.min_diameter,
            length_dm - self.min_length,
            n_len,
            part,
        );
        self.values.get(idx).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
