//! Taper models: stem diameter as a function of height
//!
//! Heights are metres above ground, diameters centimetres and volumes m³.
//! The optimizer only talks to the [`Taper`] trait; [`LinearTaper`] is the
//! straight-frustum model used by the binaries, tests and benchmarks.

use crate::error::TaperError;
use crate::tree::Tree;
use std::f64::consts::PI;

/// Number of Simpson intervals used by the default volume integration (even)
const SIMPSON_INTERVALS: usize = 20;

const HEIGHT_TOLERANCE_M: f64 = 1e-9;

/// Stem taper provider
pub trait Taper {
    /// Diameter (cm) at `height_m` above ground
    fn diameter_at_height(&self, height_m: f64) -> Result<f64, TaperError>;

    /// Height (m) at which the stem narrows to `diameter_cm`
    fn height_at_diameter(&self, diameter_cm: f64) -> Result<f64, TaperError>;

    /// Stem volume (m³) between two heights
    ///
    /// Default: numerical integration of the cross-sectional area.
    fn volume_between(&self, h1_m: f64, h2_m: f64) -> Result<f64, TaperError> {
        integrate_volume(self, h1_m, h2_m)
    }

    /// Model name, recorded in solution cubes
    fn name(&self) -> &str {
        "Taper"
    }
}

/// Integrate cross-sectional area between two heights (composite Simpson rule)
///
/// Returns 0 when `h2_m <= h1_m`.
pub fn integrate_volume<T: Taper + ?Sized>(
    taper: &T,
    h1_m: f64,
    h2_m: f64,
) -> Result<f64, TaperError> {
    if h2_m <= h1_m {
        return Ok(0.0);
    }

    let area = |h: f64| -> Result<f64, TaperError> {
        let radius_m = taper.diameter_at_height(h)? / 200.0;
        Ok(PI * radius_m * radius_m)
    };

    let step = (h2_m - h1_m) / SIMPSON_INTERVALS as f64;
    let mut sum = area(h1_m)? + area(h2_m)?;
    for i in 1..SIMPSON_INTERVALS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * area(h1_m + step * i as f64)?;
    }

    Ok(sum * step / 3.0)
}

/// Straight taper from a ground diameter to a top diameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTaper {
    height_m: f64,
    base_diameter_cm: f64,
    top_diameter_cm: f64,
}

impl LinearTaper {
    pub fn new(height_m: f64, base_diameter_cm: f64, top_diameter_cm: f64) -> Self {
        Self {
            height_m,
            base_diameter_cm,
            top_diameter_cm,
        }
    }

    /// Cone through `dbh_cm` at 1.3 m that closes at the tree top
    pub fn from_dbh(height_m: f64, dbh_cm: f64) -> Self {
        let base_diameter_cm = if height_m > 1.3 {
            dbh_cm * height_m / (height_m - 1.3)
        } else {
            dbh_cm
        };
        Self::new(height_m, base_diameter_cm, 0.0)
    }

    /// Cone through the tree's ground diameter when measured, else through DBH
    pub fn for_tree(tree: &Tree) -> Self {
        match tree.ground_diameter_cm {
            Some(ground_cm) => Self::new(tree.height_m, ground_cm, 0.0),
            None => Self::from_dbh(tree.height_m, tree.dbh_cm),
        }
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    fn check_height(&self, height_m: f64) -> Result<f64, TaperError> {
        if height_m < -HEIGHT_TOLERANCE_M || height_m > self.height_m + HEIGHT_TOLERANCE_M {
            return Err(TaperError::HeightOutOfRange {
                height: height_m,
                max: self.height_m,
            });
        }
        Ok(height_m.clamp(0.0, self.height_m))
    }
}

impl Taper for LinearTaper {
    fn diameter_at_height(&self, height_m: f64) -> Result<f64, TaperError> {
        let h = self.check_height(height_m)?;
        if self.height_m <= 0.0 {
            return Ok(self.base_diameter_cm);
        }
        let slope = (self.top_diameter_cm - self.base_diameter_cm) / self.height_m;
        Ok(self.base_diameter_cm + slope * h)
    }

    fn height_at_diameter(&self, diameter_cm: f64) -> Result<f64, TaperError> {
        if diameter_cm.is_nan() || diameter_cm < 0.0 {
            return Err(TaperError::InvalidDiameter(diameter_cm));
        }
        if diameter_cm >= self.base_diameter_cm {
            return Ok(0.0);
        }
        if diameter_cm <= self.top_diameter_cm {
            return Ok(self.height_m);
        }
        let fraction =
            (self.base_diameter_cm - diameter_cm) / (self.base_diameter_cm - self.top_diameter_cm);
        Ok(self.height_m * fraction)
    }

    fn volume_between(&self, h1_m: f64, h2_m: f64) -> Result<f64, TaperError> {
        if h2_m <= h1_m {
            return Ok(0.0);
        }
        let r1 = self.diameter_at_height(h1_m)? / 200.0;
        let r2 = self.diameter_at_height(h2_m)? / 200.0;
        let length = self.check_height(h2_m)? - self.check_height(h1_m)?;
        Ok(PI / 3.0 * length * (r1 * r1 + r1 * r2 + r2 * r2))
    }

    fn name(&self) -> &str {
        "LinearTaper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_diameter_profile() {
        let taper = LinearTaper::new(20.0, 30.0, 5.0);
        assert_relative_eq!(taper.diameter_at_height(0.0).unwrap(), 30.0);
        assert_relative_eq!(taper.diameter_at_height(10.0).unwrap(), 17.5);
        assert_relative_eq!(taper.diameter_at_height(20.0).unwrap(), 5.0);
    }

    #[test]
    fn test_height_at_diameter_inverts_profile() {
        let taper = LinearTaper::new(20.0, 30.0, 5.0);
        let h = taper.height_at_diameter(17.5).unwrap();
        assert_relative_eq!(h, 10.0, epsilon = 1e-12);

        // Clamped at both ends
        assert_eq!(taper.height_at_diameter(40.0).unwrap(), 0.0);
        assert_eq!(taper.height_at_diameter(2.0).unwrap(), 20.0);
        assert!(taper.height_at_diameter(-1.0).is_err());
    }

    #[test]
    fn test_out_of_range_height_is_an_error() {
        let taper = LinearTaper::new(20.0, 30.0, 5.0);
        let err = taper.diameter_at_height(25.0).unwrap_err();
        assert!(matches!(err, TaperError::HeightOutOfRange { .. }));
    }

    #[test]
    fn test_simpson_matches_frustum_volume() {
        let taper = LinearTaper::new(20.0, 30.0, 5.0);
        let exact = taper.volume_between(0.3, 15.0).unwrap();
        let integrated = integrate_volume(&taper, 0.3, 15.0).unwrap();
        // Area is quadratic in height, so Simpson is exact up to rounding
        assert_relative_eq!(integrated, exact, max_relative = 1e-10);
    }

    #[test]
    fn test_cylinder_volume() {
        let taper = LinearTaper::new(10.0, 20.0, 20.0);
        let v = taper.volume_between(0.0, 10.0).unwrap();
        assert_relative_eq!(v, PI * 0.1 * 0.1 * 10.0, max_relative = 1e-12);
        assert_eq!(taper.volume_between(5.0, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_for_tree_prefers_ground_diameter() {
        let tree = Tree::new("picea abies", 24.0, 20.0).unwrap();
        let from_dbh = LinearTaper::for_tree(&tree);
        assert_relative_eq!(from_dbh.diameter_at_height(1.3).unwrap(), 24.0, epsilon = 1e-9);

        let measured = tree.with_ground_diameter(32.0).unwrap();
        let taper = LinearTaper::for_tree(&measured);
        assert_relative_eq!(taper.diameter_at_height(0.0).unwrap(), 32.0);
        assert_relative_eq!(taper.diameter_at_height(20.0).unwrap(), 0.0);
        assert_relative_eq!(taper.diameter_at_height(10.0).unwrap(), 16.0);
    }

    #[test]
    fn test_cone_from_dbh() {
        let taper = LinearTaper::from_dbh(25.0, 18.0);
        assert_relative_eq!(taper.diameter_at_height(1.3).unwrap(), 18.0, epsilon = 1e-9);
        assert_relative_eq!(taper.diameter_at_height(25.0).unwrap(), 0.0, epsilon = 1e-9);
    }
}
