//! Solution cube: bucking results precomputed over a grid of trees
//!
//! Every (species, DBH, height) combination on the grid is bucked once with
//! sections kept, in parallel. The cube records the fingerprint of the price
//! list it was built with so a stale cube can be rejected on load.

use crate::bucking::{buck_tree, BuckingConfig, CrossCutSection};
use crate::error::BuckingError;
use crate::pricelist::Pricelist;
use crate::taper::Taper;
use crate::tree::Tree;
use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Dead-wood threshold used for cube runs; above any real diameter
const CUBE_DEAD_WOOD_DIAMETER_CM: f64 = 99.0;

/// Grid of trees to precompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeGrid {
    pub species: Vec<String>,
    pub dbh_range_cm: (f64, f64),
    pub dbh_step_cm: f64,
    pub height_range_m: (f64, f64),
    pub height_step_m: f64,
}

impl CubeGrid {
    /// Grid with 2 cm DBH steps and 0.2 m height steps
    pub fn new(species: &[&str], dbh_range_cm: (f64, f64), height_range_m: (f64, f64)) -> Self {
        Self {
            species: species.iter().map(|s| s.trim().to_lowercase()).collect(),
            dbh_range_cm,
            dbh_step_cm: 2.0,
            height_range_m,
            height_step_m: 0.2,
        }
    }

    pub fn with_steps(mut self, dbh_step_cm: f64, height_step_m: f64) -> Self {
        self.dbh_step_cm = dbh_step_cm;
        self.height_step_m = height_step_m;
        self
    }

    fn axis((min, max): (f64, f64), step: f64) -> Vec<f64> {
        if !(step > 0.0) || max < min {
            return vec![min];
        }
        let n = ((max - min) / step + 1e-9).floor() as usize + 1;
        (0..n).map(|i| min + i as f64 * step).collect()
    }

    pub fn dbh_values(&self) -> Vec<f64> {
        Self::axis(self.dbh_range_cm, self.dbh_step_cm)
    }

    /// Heights, rounded to whole decimetres
    pub fn height_values(&self) -> Vec<f64> {
        Self::axis(self.height_range_m, self.height_step_m)
            .into_iter()
            .map(|h| (h * 10.0).round() / 10.0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.species.len() * self.dbh_values().len() * self.height_values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All grid points, species-major then DBH then height
    fn points(&self) -> Vec<(String, f64, f64)> {
        let dbhs = self.dbh_values();
        let heights = self.height_values();
        let mut points = Vec::with_capacity(self.len());
        for species in &self.species {
            for &dbh in &dbhs {
                for &height in &heights {
                    points.push((species.clone(), dbh, height));
                }
            }
        }
        points
    }
}

fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
}

/// Result for one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeEntry {
    pub species: String,
    pub dbh_cm: f64,
    pub height_m: f64,
    /// `None` when the optimizer failed for this tree
    pub total_value: Option<f64>,
    pub sections: Vec<CrossCutSection>,
}

/// Precomputed bucking results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionCube {
    pub pricelist_fingerprint: String,
    pub taper_model: String,
    pub creation_date_utc: String,
    pub grid: CubeGrid,
    pub entries: Vec<CubeEntry>,
}

impl SolutionCube {
    /// Buck every tree on `grid` in parallel
    ///
    /// `make_taper` builds the taper model for each tree. Trees the optimizer
    /// rejects are logged and stored without a value.
    pub fn generate<T, F>(
        pricelist: &Pricelist,
        taper_model: &str,
        make_taper: F,
        grid: &CubeGrid,
    ) -> Result<Self>
    where
        T: Taper,
        F: Fn(&Tree) -> T + Sync,
    {
        let pricelist_fingerprint = pricelist.fingerprint()?;
        tracing::info!(
            "Generating solution cube: {} trees, price list {}",
            grid.len(),
            pricelist_fingerprint
        );

        let config = BuckingConfig::default().with_sections();
        let entries: Vec<CubeEntry> = grid
            .points()
            .into_par_iter()
            .map(|(species, dbh_cm, height_m)| {
                let outcome = Tree::new(&species, dbh_cm, height_m).and_then(|tree| {
                    let taper = make_taper(&tree);
                    buck_tree(&tree, pricelist, &taper, CUBE_DEAD_WOOD_DIAMETER_CM, &config)
                });
                match outcome {
                    Ok(result) => CubeEntry {
                        species,
                        dbh_cm,
                        height_m,
                        total_value: Some(result.total_value),
                        sections: result.sections.unwrap_or_default(),
                    },
                    Err(e) => {
                        tracing::warn!(
                            "Bucking failed for {} DBH={} H={}: {}",
                            species,
                            dbh_cm,
                            height_m,
                            e
                        );
                        CubeEntry {
                            species,
                            dbh_cm,
                            height_m,
                            total_value: None,
                            sections: Vec::new(),
                        }
                    }
                }
            })
            .collect();

        Ok(Self {
            pricelist_fingerprint,
            taper_model: taper_model.to_string(),
            creation_date_utc: Utc::now().to_rfc3339(),
            grid: grid.clone(),
            entries,
        })
    }

    /// Entry at the grid point nearest to (`dbh_cm`, `height_m`)
    pub fn lookup(&self, species: &str, dbh_cm: f64, height_m: f64) -> Option<&CubeEntry> {
        let key = species.trim().to_lowercase();
        let s = self.grid.species.iter().position(|sp| *sp == key)?;
        let dbhs = self.grid.dbh_values();
        let heights = self.grid.height_values();
        let d = nearest_index(&dbhs, dbh_cm)?;
        let h = nearest_index(&heights, height_m)?;
        self.entries
            .get((s * dbhs.len() + d) * heights.len() + h)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create solution cube file: {:?}", path))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write solution cube: {:?}", path))?;
        tracing::info!("Saved solution cube ({} entries) to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// Load a cube, optionally checking it was built with `verify_against`
    pub fn load(path: &Path, verify_against: Option<&Pricelist>) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open solution cube: {:?}", path))?;
        let cube: SolutionCube = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse solution cube: {:?}", path))?;

        if let Some(pricelist) = verify_against {
            let found = pricelist.fingerprint()?;
            if found != cube.pricelist_fingerprint {
                return Err(BuckingError::PricelistMismatch {
                    expected: cube.pricelist_fingerprint,
                    found,
                }
                .into());
            }
            tracing::debug!("Price list fingerprint verified");
        }

        Ok(cube)
    }

    /// One row per grid point; sections are kept as a JSON string column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let species: Vec<&str> = self.entries.iter().map(|e| e.species.as_str()).collect();
        let dbh: Vec<f64> = self.entries.iter().map(|e| e.dbh_cm).collect();
        let height: Vec<f64> = self.entries.iter().map(|e| e.height_m).collect();
        let total_value: Vec<Option<f64>> = self.entries.iter().map(|e| e.total_value).collect();
        let section_count: Vec<u32> = self
            .entries
            .iter()
            .map(|e| e.sections.len() as u32)
            .collect();
        let sections = self
            .entries
            .iter()
            .map(|e| serde_json::to_string(&e.sections))
            .collect::<std::result::Result<Vec<String>, _>>()
            .context("Failed to serialise sections")?;

        let df = DataFrame::new(vec![
            Series::new("species".into(), species).into(),
            Series::new("dbh_cm".into(), dbh).into(),
            Series::new("height_m".into(), height).into(),
            Series::new("total_value".into(), total_value).into(),
            Series::new("section_count".into(), section_count).into(),
            Series::new("sections".into(), sections).into(),
        ])?;
        Ok(df)
    }

    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create parquet file: {:?}", path))?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Zstd(None))
            .finish(&mut df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taper::LinearTaper;

    fn small_cube() -> SolutionCube {
        let pricelist = Pricelist::mellanskog_2013().unwrap();
        let grid = CubeGrid::new(
            &["pinus sylvestris", "quercus robur"],
            (20.0, 24.0),
            (18.0, 18.4),
        );
        SolutionCube::generate(
            &pricelist,
            "LinearTaper",
            LinearTaper::for_tree,
            &grid,
        )
        .unwrap()
    }

    #[test]
    fn test_grid_axes() {
        let grid = CubeGrid::new(&["Pinus sylvestris"], (10.0, 16.0), (15.0, 16.0));
        assert_eq!(grid.species, vec!["pinus sylvestris".to_string()]);
        assert_eq!(grid.dbh_values(), vec![10.0, 12.0, 14.0, 16.0]);
        assert_eq!(grid.height_values(), vec![15.0, 15.2, 15.4, 15.6, 15.8, 16.0]);
        assert_eq!(grid.len(), 24);
    }

    #[test]
    fn test_generate_and_lookup() {
        let cube = small_cube();
        assert_eq!(cube.entries.len(), 2 * 3 * 3);
        assert_eq!(cube.taper_model, "LinearTaper");

        let entry = cube.lookup("pinus sylvestris", 21.9, 18.29).unwrap();
        assert_eq!(entry.dbh_cm, 22.0);
        assert_eq!(entry.height_m, 18.2);
        assert!(entry.total_value.unwrap() > 0.0);
        assert!(!entry.sections.is_empty());

        // No sawlog prices for oak: stored without a value
        let oak = cube.lookup("quercus robur", 20.0, 18.0).unwrap();
        assert_eq!(oak.total_value, None);

        assert!(cube.lookup("picea abies", 20.0, 18.0).is_none());
    }

    #[test]
    fn test_save_load_verifies_pricelist() {
        let cube = small_cube();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.json");
        cube.save(&path).unwrap();

        let pricelist = Pricelist::mellanskog_2013().unwrap();
        let loaded = SolutionCube::load(&path, Some(&pricelist)).unwrap();
        assert_eq!(loaded.grid, cube.grid);
        assert_eq!(loaded.pricelist_fingerprint, cube.pricelist_fingerprint);
        assert_eq!(loaded.entries.len(), cube.entries.len());
        for (a, b) in loaded.entries.iter().zip(&cube.entries) {
            assert_eq!(a.species, b.species);
            assert_eq!(a.sections.len(), b.sections.len());
            match (a.total_value, b.total_value) {
                (Some(x), Some(y)) => assert!((x - y).abs() <= 1e-9 * y.abs().max(1.0)),
                (x, y) => assert_eq!(x, y),
            }
        }

        let mut other = pricelist.clone();
        other.common.fuelwood_log_price += 10.0;
        let err = SolutionCube::load(&path, Some(&other)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuckingError>(),
            Some(BuckingError::PricelistMismatch { .. })
        ));
    }

    #[test]
    fn test_dataframe_export() {
        let cube = small_cube();
        let df = cube.to_dataframe().unwrap();
        assert_eq!(df.height(), 18);
        assert_eq!(df.width(), 6);
        assert_eq!(df.column("total_value").unwrap().null_count(), 9);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.parquet");
        cube.write_parquet(&path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}
