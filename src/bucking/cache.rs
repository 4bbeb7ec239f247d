//! Per-call memo of taper lookups
//!
//! Owned by one optimisation run and dropped with it, so independent trees
//! never share state.

use crate::error::TaperError;
use crate::taper::Taper;
use rustc_hash::FxHashMap;

/// Diameter, height and volume memo keyed by discretised position (dm above
/// the stump) or by target diameter
pub struct TreeCache<'a, T: Taper + ?Sized> {
    taper: &'a T,
    stump_height_m: f64,
    diameters: FxHashMap<usize, f64>,
    heights: FxHashMap<u64, usize>,
    volumes: FxHashMap<usize, f64>,
}

impl<'a, T: Taper + ?Sized> TreeCache<'a, T> {
    pub fn new(taper: &'a T, stump_height_m: f64) -> Self {
        Self {
            taper,
            stump_height_m,
            diameters: FxHashMap::default(),
            heights: FxHashMap::default(),
            volumes: FxHashMap::default(),
        }
    }

    /// Height (m above ground) of a discretised position
    pub fn height_of(&self, position: usize) -> f64 {
        self.stump_height_m + position as f64 * 0.1
    }

    /// Diameter (cm) at a discretised position
    pub fn diameter_at(&mut self, position: usize) -> Result<f64, TaperError> {
        if let Some(d) = self.diameters.get(&position) {
            return Ok(*d);
        }
        let d = self.taper.diameter_at_height(self.height_of(position))?;
        self.diameters.insert(position, d);
        Ok(d)
    }

    /// Height (whole dm above ground, truncated) where the stem reaches `target_cm`
    pub fn height_at_diameter(&mut self, target_cm: f64) -> Result<usize, TaperError> {
        let key = target_cm.to_bits();
        if let Some(h) = self.heights.get(&key) {
            return Ok(*h);
        }
        let h_m = self.taper.height_at_diameter(target_cm)?;
        let h_dm = (h_m * 10.0 + 1e-9).floor().max(0.0) as usize;
        self.heights.insert(key, h_dm);
        Ok(h_dm)
    }

    /// Stem volume (m³) from the stump to a discretised position
    pub fn volume_to(&mut self, position: usize) -> Result<f64, TaperError> {
        if let Some(v) = self.volumes.get(&position) {
            return Ok(*v);
        }
        let v = self
            .taper
            .volume_between(self.stump_height_m, self.height_of(position))?;
        self.volumes.insert(position, v);
        Ok(v)
    }

    pub fn cached_diameters(&self) -> usize {
        self.diameters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taper::LinearTaper;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    /// Taper that counts how often it is asked for a diameter
    struct CountingTaper {
        inner: LinearTaper,
        calls: Cell<usize>,
    }

    impl Taper for CountingTaper {
        fn diameter_at_height(&self, height_m: f64) -> Result<f64, TaperError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.diameter_at_height(height_m)
        }

        fn height_at_diameter(&self, diameter_cm: f64) -> Result<f64, TaperError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.height_at_diameter(diameter_cm)
        }
    }

    #[test]
    fn test_repeated_lookups_hit_the_cache() {
        let taper = CountingTaper {
            inner: LinearTaper::new(20.0, 30.0, 5.0),
            calls: Cell::new(0),
        };
        let mut cache = TreeCache::new(&taper, 0.0);

        let d1 = cache.diameter_at(100).unwrap();
        let d2 = cache.diameter_at(100).unwrap();
        assert_relative_eq!(d1, 17.5, epsilon = 1e-12);
        assert_eq!(d1, d2);
        assert_eq!(taper.calls.get(), 1);

        assert_eq!(cache.height_at_diameter(17.5).unwrap(), 100);
        assert_eq!(cache.height_at_diameter(17.5).unwrap(), 100);
        assert_eq!(taper.calls.get(), 2);
        assert_eq!(cache.cached_diameters(), 1);
    }

    #[test]
    fn test_positions_are_relative_to_stump() {
        let taper = LinearTaper::new(20.0, 30.0, 5.0);
        let mut cache = TreeCache::new(&taper, 0.3);
        assert_relative_eq!(cache.height_of(10), 1.3, epsilon = 1e-12);
        let expected = taper.diameter_at_height(1.3).unwrap();
        assert_relative_eq!(cache.diameter_at(10).unwrap(), expected, epsilon = 1e-12);
        assert_eq!(cache.volume_to(0).unwrap(), 0.0);
    }

    #[test]
    fn test_taper_errors_propagate() {
        let taper = LinearTaper::new(5.0, 10.0, 0.0);
        let mut cache = TreeCache::new(&taper, 0.0);
        assert!(cache.diameter_at(100).is_err());
    }
}
