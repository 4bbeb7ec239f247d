//! Whole-stem volumes and plan proportions

use super::optimizer::MERCHANTABLE_TOP_CM;
use super::profile::StemProfile;
use crate::error::TaperError;
use crate::taper::Taper;

/// Breast height (m above ground)
const BREAST_HEIGHT_M: f64 = 1.3;

/// Volumes measured on the unbucked stem
#[derive(Debug, Clone, PartialEq)]
pub struct StemGeometry {
    /// Volume from the stump to the 5 cm top
    pub vol_fub_5cm: f64,
    /// Volume from the stump to the tree top
    pub vol_sk_ub: f64,
    /// Volume from the stump to the last position at or above the dead-wood diameter
    pub dead_wood_volume: f64,
    /// First position at or above the high-stump height
    pub high_stump_position: Option<usize>,
    pub high_stump_volume: f64,
    pub dbh_cm: f64,
    pub diameter_stump_cm: f64,
}

impl StemGeometry {
    pub fn measure<T: Taper + ?Sized>(
        taper: &T,
        profile: &StemProfile,
        height_m: f64,
        min_diam_dead_wood: f64,
        high_stump_height_m: f64,
    ) -> Result<Self, TaperError> {
        let fub = profile.last_index_with_diameter(MERCHANTABLE_TOP_CM);
        let vol_fub_5cm = profile.volume_to(fub);
        let vol_sk_ub = if height_m > profile.height(fub) {
            vol_fub_5cm + taper.volume_between(profile.height(fub), height_m)?
        } else {
            vol_fub_5cm
        };

        let dead = profile.last_index_with_diameter(min_diam_dead_wood);

        let high_stump_position = if high_stump_height_m > 0.0 {
            profile
                .first_index_at_height(high_stump_height_m)
                .filter(|p| *p > 0)
        } else {
            None
        };

        let dbh_cm = if height_m > BREAST_HEIGHT_M {
            taper.diameter_at_height(BREAST_HEIGHT_M)?
        } else {
            0.0
        };

        Ok(Self {
            vol_fub_5cm,
            vol_sk_ub,
            dead_wood_volume: profile.volume_to(dead),
            high_stump_position,
            high_stump_volume: high_stump_position.map_or(0.0, |p| profile.volume_to(p)),
            dbh_cm,
            diameter_stump_cm: profile.diameter(0),
        })
    }

    /// `volume` as a share of the whole stem; 0 for an empty stem
    pub fn proportion(&self, volume: f64) -> f64 {
        if self.vol_sk_ub > 0.0 {
            volume / self.vol_sk_ub
        } else {
            0.0
        }
    }

    pub fn dead_wood_proportion(&self) -> f64 {
        self.proportion(self.dead_wood_volume)
    }

    pub fn high_stump_volume_proportion(&self) -> f64 {
        self.proportion(self.high_stump_volume)
    }

    /// Volume left above a last cut with `bucked_volume` below it
    pub fn top_volume(&self, bucked_volume: f64) -> f64 {
        (self.vol_sk_ub - bucked_volume).max(0.0)
    }
}

/// Share of `total_value` earned below the high-stump position
///
/// A segment straddling the position counts pro rata by volume.
pub fn high_stump_value_share(
    segments: &[(usize, usize)],
    segment_value: impl Fn(usize) -> f64,
    profile: &StemProfile,
    high_stump_position: usize,
    total_value: f64,
) -> f64 {
    if total_value <= 0.0 {
        return 0.0;
    }
    let mut below = 0.0;
    for &(left, right) in segments {
        if right <= high_stump_position {
            below += segment_value(right);
        } else if left < high_stump_position {
            let volume = profile.volume(left, right);
            if volume > 0.0 {
                below += segment_value(right) * profile.volume(left, high_stump_position) / volume;
            }
        }
    }
    below / total_value
}
