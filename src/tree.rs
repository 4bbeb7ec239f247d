//! Tree record consumed by the optimizer

use crate::error::BuckingError;
use serde::{Deserialize, Serialize};

/// Default stump height as a share of tree height
const STUMP_HEIGHT_SHARE: f64 = 0.01;

/// A single felled tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Lower-case species name, e.g. "pinus sylvestris"
    pub species: String,
    pub dbh_cm: f64,
    pub height_m: f64,
    pub stump_height_m: f64,
    #[serde(default)]
    pub ground_diameter_cm: Option<f64>,
}

impl Tree {
    /// New tree with the stump left at 1 % of tree height
    pub fn new(species: &str, dbh_cm: f64, height_m: f64) -> Result<Self, BuckingError> {
        let tree = Self {
            species: species.trim().to_lowercase(),
            dbh_cm,
            height_m,
            stump_height_m: STUMP_HEIGHT_SHARE * height_m,
            ground_diameter_cm: None,
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn with_stump_height(mut self, stump_height_m: f64) -> Result<Self, BuckingError> {
        self.stump_height_m = stump_height_m;
        self.validate()?;
        Ok(self)
    }

    /// Measured diameter at ground level, used by [`crate::LinearTaper::for_tree`]
    pub fn with_ground_diameter(mut self, diameter_cm: f64) -> Result<Self, BuckingError> {
        self.ground_diameter_cm = Some(diameter_cm);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), BuckingError> {
        if !(self.height_m > 0.0) {
            return Err(BuckingError::InvalidTree(format!(
                "height must be larger than 0 m: {}",
                self.height_m
            )));
        }
        if !(self.dbh_cm >= 0.0) {
            return Err(BuckingError::InvalidTree(format!(
                "diameter must be at least 0 cm: {}",
                self.dbh_cm
            )));
        }
        if !(self.stump_height_m >= 0.0 && self.stump_height_m < self.height_m) {
            return Err(BuckingError::InvalidTree(format!(
                "stump height {} m must lie in [0, {}) m",
                self.stump_height_m, self.height_m
            )));
        }
        if let Some(ground) = self.ground_diameter_cm {
            if !(ground > 0.0) {
                return Err(BuckingError::InvalidTree(format!(
                    "ground diameter must be larger than 0 cm: {}",
                    ground
                )));
            }
        }
        Ok(())
    }

    /// Genus part of the species name
    pub fn genus(&self) -> &str {
        self.species.split_whitespace().next().unwrap_or("")
    }
}
