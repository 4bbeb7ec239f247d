//! Discretised stem profile and candidate cut lengths

use super::cache::TreeCache;
use crate::error::TaperError;
use crate::taper::Taper;

/// Length that stands for an unconstrained final cut; longer than any stem
/// the optimizer discretises, so it never fits
pub const UNBOUNDED_MODULE_DM: usize = 999;

/// Stem sampled every decimetre from the stump
///
/// Index `i` is `i` dm above the stump. Volumes are cumulative from the
/// stump, so segment volumes add up exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct StemProfile {
    heights_m: Vec<f64>,
    diameters_cm: Vec<f64>,
    cumulative_volume: Vec<f64>,
}

impl StemProfile {
    /// Sample positions `0..=last` through `cache`
    pub fn sample<T: Taper + ?Sized>(
        cache: &mut TreeCache<'_, T>,
        last: usize,
    ) -> Result<Self, TaperError> {
        let mut heights_m = Vec::with_capacity(last + 1);
        let mut diameters_cm = Vec::with_capacity(last + 1);
        let mut cumulative_volume = Vec::with_capacity(last + 1);
        for i in 0..=last {
            heights_m.push(cache.height_of(i));
            diameters_cm.push(cache.diameter_at(i)?);
            cumulative_volume.push(cache.volume_to(i)?);
        }
        Ok(Self {
            heights_m,
            diameters_cm,
            cumulative_volume,
        })
    }

    /// Index of the last sampled position
    pub fn last(&self) -> usize {
        self.heights_m.len().saturating_sub(1)
    }

    pub fn height(&self, i: usize) -> f64 {
        self.heights_m[i]
    }

    pub fn diameter(&self, i: usize) -> f64 {
        self.diameters_cm[i]
    }

    /// Volume (m³) from the stump up to position `i`
    pub fn volume_to(&self, i: usize) -> f64 {
        self.cumulative_volume[i]
    }

    /// Volume (m³) between two positions
    pub fn volume(&self, left: usize, right: usize) -> f64 {
        self.cumulative_volume[right] - self.cumulative_volume[left]
    }

    /// Last position whose diameter is at least `diameter_cm` (0 if none)
    pub fn last_index_with_diameter(&self, diameter_cm: f64) -> usize {
        self.diameters_cm
            .iter()
            .rposition(|d| *d >= diameter_cm)
            .unwrap_or(0)
    }

    /// First position at or above `height_m`
    pub fn first_index_at_height(&self, height_m: f64) -> Option<usize> {
        self.heights_m.iter().position(|h| *h >= height_m - 1e-9)
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights_m
    }

    pub fn diameters(&self) -> &[f64] {
        &self.diameters_cm
    }
}

/// Candidate cut lengths (dm), ascending, ending with the unbounded sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthModules {
    lengths: Vec<usize>,
}

impl LengthModules {
    pub fn new(min_dm: usize, max_dm: usize) -> Self {
        let mut lengths: Vec<usize> = (min_dm..=max_dm).collect();
        lengths.push(UNBOUNDED_MODULE_DM);
        Self { lengths }
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}
