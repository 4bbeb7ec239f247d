//! Value-table optimizer (Näsberg 1985)
//!
//! The stem is discretised in decimetres from the stump. For every reachable
//! position the optimizer keeps the best cumulative value and the segment
//! that achieved it, trying every length module from every reachable start.
//!
//! Iteration is ascending in both start position and module length and the
//! update uses a strict `>`, so on ties the first assignment wins. The
//! endpoint is the first position holding the maximum value.

use super::cache::TreeCache;
use super::config::BuckingConfig;
use super::profile::{LengthModules, StemProfile};
use super::quality::{
    classify_segment, LogLimits, ProductClass, QualityType, QualityZones, QUALITY_COUNT,
};
use super::reconstruct;
use super::result::{BuckingResult, ProductShares};
use super::stats::{self, StemGeometry};
use super::value_table::TimberValueTable;
use crate::error::{BuckingError, Result};
use crate::pricelist::{LogPart, Pricelist, TimberPricelist, VolumeType};
use crate::taper::Taper;
use crate::tree::Tree;

/// Upper bound on discretised positions (40 m of stem)
pub const MAX_POSITIONS: usize = 400;

/// Diameter (cm) down to which volume counts as merchantable
pub const MERCHANTABLE_TOP_CM: f64 = 5.0;

/// Shortest module the optimizer accepts (dm)
pub const MIN_MODULE_DM: usize = 10;

/// Value at the stump; keeps position 0 reachable and above -inf
const SEED_VALUE: f64 = 1e-5;

/// Value and product split of the best segment ending at a position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentOutcome {
    pub value: f64,
    /// Sawlog value before downgrading; 0 for other products
    pub timber_value: f64,
    pub shares: ProductShares,
}

/// DP state, one entry per position
#[derive(Debug, Clone)]
pub struct ValueTable {
    pub value: Vec<f64>,
    pub predecessor: Vec<usize>,
    pub grade: Vec<QualityType>,
    pub outcome: Vec<SegmentOutcome>,
}

impl ValueTable {
    fn new(last: usize) -> Self {
        let n = last + 1;
        let mut value = vec![f64::NEG_INFINITY; n];
        value[0] = SEED_VALUE;
        Self {
            value,
            predecessor: vec![0; n],
            grade: vec![QualityType::Undefined; n],
            outcome: vec![SegmentOutcome::default(); n],
        }
    }

    /// First position holding the maximum value
    pub fn best_endpoint(&self) -> usize {
        let mut best = 0;
        for (i, v) in self.value.iter().enumerate().skip(1) {
            if *v > self.value[best] {
                best = i;
            }
        }
        best
    }

    /// Value gained between the stump and `position`
    pub fn gained(&self, position: usize) -> f64 {
        self.value[position] - self.value[0]
    }
}

/// Optimizer for one tree against one price list
pub struct Bucker<'a, T: Taper + ?Sized> {
    tree: &'a Tree,
    pricelist: &'a Pricelist,
    taper: &'a T,
    timber_prices: &'a TimberPricelist,
    limits: LogLimits,
    modules: LengthModules,
    timber_values: TimberValueTable,
    pulp_price: f64,
}

impl<'a, T: Taper + ?Sized> Bucker<'a, T> {
    /// Validate the inputs and precompute the sawlog value table
    pub fn new(tree: &'a Tree, pricelist: &'a Pricelist, taper: &'a T) -> Result<Self> {
        tree.validate()?;
        let timber_prices =
            pricelist
                .timber_prices(&tree.species)
                .ok_or_else(|| BuckingError::MissingPrices {
                    species: tree.species.clone(),
                })?;

        let common = &pricelist.common;
        let limits = LogLimits {
            timber_length_dm: common.sawlog_length_range.to_dm(),
            timber_diameter_cm: (timber_prices.min_diameter(), timber_prices.max_diameter()),
            pulp_length_dm: common.pulpwood_length_range.to_dm(),
            pulp_diameter_cm: common.pulp_log_diameter_range,
        };

        let min_len = limits.pulp_length_dm.0.min(limits.timber_length_dm.0);
        let max_len = limits.timber_length_dm.1;
        if min_len < MIN_MODULE_DM {
            return Err(BuckingError::MinLogLengthTooShort { length_dm: min_len });
        }

        let modules = LengthModules::new(min_len, max_len);
        let timber_values = TimberValueTable::build(timber_prices, &limits);
        tracing::debug!(
            "Built bucker for '{}': {} modules, {} timber values",
            tree.species,
            modules.len(),
            timber_values.len()
        );

        Ok(Self {
            tree,
            pricelist,
            taper,
            timber_prices,
            limits,
            modules,
            timber_values,
            pulp_price: pricelist.pulpwood_price(&tree.species),
        })
    }

    pub fn limits(&self) -> &LogLimits {
        &self.limits
    }

    pub fn modules(&self) -> &LengthModules {
        &self.modules
    }

    /// Find the most valuable cutting plan
    ///
    /// `min_diam_dead_wood` is the diameter (cm) above which stem volume is
    /// counted towards the dead-wood proportion.
    #[tracing::instrument(skip_all, fields(species = %self.tree.species))]
    pub fn calculate_tree_value(
        &self,
        min_diam_dead_wood: f64,
        config: &BuckingConfig,
    ) -> Result<BuckingResult> {
        let common = &self.pricelist.common;
        let stump = self.tree.stump_height_m;
        let mut cache = TreeCache::new(self.taper, stump);

        let top_diameter = common.top_diameter.max(common.pulp_log_diameter_range.min);
        let top_dm = cache.height_at_diameter(top_diameter)?;
        let usable_dm = (top_dm as f64 - stump * 10.0) as i64;
        let last = usable_dm.clamp(0, MAX_POSITIONS as i64) as usize;

        let profile = StemProfile::sample(&mut cache, last)?;
        let geometry = StemGeometry::measure(
            self.taper,
            &profile,
            self.tree.height_m,
            min_diam_dead_wood,
            common.high_stump_height,
        )?;
        tracing::debug!(
            "Discretised stem into {} positions (top {:.1} cm at {} dm)",
            last + 1,
            top_diameter,
            top_dm
        );

        if last == 0 {
            return Ok(self.zero_result(&geometry, &profile, config));
        }

        let zones = self.quality_zones(&mut cache)?;
        let table = self.fill(&profile, &zones, config);
        let end = table.best_endpoint();
        tracing::debug!("Best endpoint at {} dm, value {:.2}", end, table.gained(end));

        if end == 0 {
            return Ok(self.zero_result(&geometry, &profile, config));
        }

        let segments = reconstruct::backtrack(&table.predecessor, end);
        let summary = reconstruct::summarise(&segments, &table, &profile);
        let total_value = table.gained(end);
        let top_volume = geometry.top_volume(profile.volume_to(end));
        let high_stump_value_proportion = match geometry.high_stump_position {
            Some(hs) => stats::high_stump_value_share(
                &segments,
                |right| table.outcome[right].value,
                &profile,
                hs,
                total_value,
            ),
            None => 0.0,
        };
        let sections = config
            .save_sections
            .then(|| reconstruct::sections(&segments, &table, &profile, &self.tree.species));

        Ok(BuckingResult {
            species_group: self.tree.species.clone(),
            total_value,
            top_proportion: geometry.proportion(top_volume),
            top_volume,
            dead_wood_proportion: geometry.dead_wood_proportion(),
            high_stump_volume_proportion: geometry.high_stump_volume_proportion(),
            high_stump_value_proportion,
            last_cut_relative_height: profile.height(end) / self.tree.height_m,
            volume_per_quality: summary.volume_per_quality,
            timber_price_by_quality: summary.timber_price_by_quality,
            vol_fub_5cm: geometry.vol_fub_5cm,
            vol_sk_ub: geometry.vol_sk_ub,
            dbh_cm: geometry.dbh_cm,
            height_m: self.tree.height_m,
            stump_height_m: stump,
            diameter_stump_cm: geometry.diameter_stump_cm,
            taper_diameters_cm: profile.diameters().to_vec(),
            taper_heights_m: profile.heights().to_vec(),
            sections,
        })
    }

    /// Zone ceilings, each capped at the height of the smallest sawlog diameter
    fn quality_zones(&self, cache: &mut TreeCache<'_, T>) -> Result<QualityZones> {
        let min_timber_cm = self.limits.timber_diameter_cm.0 as f64;
        let q_height_m = cache.height_at_diameter(min_timber_cm)? as f64 / 10.0;
        let ceilings = LogPart::ALL.map(|part| self.timber_prices.max_height(part).min(q_height_m));
        Ok(QualityZones::new(ceilings, self.tree.stump_height_m))
    }

    fn fill(
        &self,
        profile: &StemProfile,
        zones: &QualityZones,
        config: &BuckingConfig,
    ) -> ValueTable {
        let last = profile.last();
        let mut table = ValueTable::new(last);

        for left in 0..last {
            let base = table.value[left];
            if !base.is_finite() {
                continue;
            }
            for &length in self.modules.lengths() {
                let right = left + length;
                if right > last {
                    break;
                }
                let diameter_class = profile.diameter(right).max(0.0).floor() as u32;
                let grade = zones.grade_at(right);
                let class = match classify_segment(grade, length, diameter_class, &self.limits) {
                    Some(class) => class,
                    None => continue,
                };
                let outcome = self.segment_outcome(
                    class,
                    length,
                    diameter_class,
                    profile.volume(left, right),
                    config,
                );
                let candidate = base + outcome.value;
                if candidate > table.value[right] {
                    table.value[right] = candidate;
                    table.predecessor[right] = left;
                    table.grade[right] = class.into();
                    table.outcome[right] = outcome;
                }
            }
        }

        table
    }

    /// Value of one segment sold as `class`
    fn segment_outcome(
        &self,
        class: ProductClass,
        length_dm: usize,
        diameter_class: u32,
        volume: f64,
        config: &BuckingConfig,
    ) -> SegmentOutcome {
        let common = &self.pricelist.common;
        let cull_value = common.harvest_residue_price * volume;
        let fuel_value = common.fuelwood_log_price * volume;
        let pulp_value = config.pulp_price_factor * self.pulp_price * volume;

        match class {
            ProductClass::Timber(part) => {
                let mut price = self.timber_values.get(diameter_class, length_dm, part)
                    * config.timber_price_factor;
                if self.timber_prices.volume_type == VolumeType::M3Fub {
                    price *= volume;
                }
                if !config.use_downgrading {
                    return SegmentOutcome {
                        value: price,
                        timber_value: price,
                        shares: ProductShares::timber(),
                    };
                }
                let (pulp, fuel, cull) = self.timber_prices.downgrade_proportions.shares();
                let timber = 1.0 - pulp - fuel - cull;
                SegmentOutcome {
                    value: price * timber
                        + pulp * pulp_value
                        + cull * cull_value
                        + fuel * fuel_value,
                    timber_value: price,
                    shares: ProductShares {
                        timber,
                        pulp,
                        cull,
                        fuelwood: fuel,
                    },
                }
            }
            ProductClass::Pulp => {
                if !config.use_downgrading {
                    return SegmentOutcome {
                        value: pulp_value,
                        timber_value: 0.0,
                        shares: ProductShares {
                            pulp: 1.0,
                            ..ProductShares::default()
                        },
                    };
                }
                let (waste, fuel) = self.pricelist.pulpwood_waste_and_fuel();
                SegmentOutcome {
                    value: pulp_value * (1.0 - waste - fuel)
                        + fuel * fuel_value
                        + waste * cull_value,
                    timber_value: 0.0,
                    shares: ProductShares {
                        timber: 0.0,
                        pulp: 1.0 - waste - fuel,
                        cull: waste,
                        fuelwood: fuel,
                    },
                }
            }
            ProductClass::Cull => SegmentOutcome {
                value: cull_value,
                timber_value: 0.0,
                shares: ProductShares::cull(),
            },
        }
    }

    /// Well-formed result for a stem that yields nothing
    fn zero_result(
        &self,
        geometry: &StemGeometry,
        profile: &StemProfile,
        config: &BuckingConfig,
    ) -> BuckingResult {
        let top_volume = geometry.vol_sk_ub;
        BuckingResult {
            species_group: self.tree.species.clone(),
            total_value: 0.0,
            top_proportion: geometry.proportion(top_volume),
            top_volume,
            dead_wood_proportion: geometry.dead_wood_proportion(),
            high_stump_volume_proportion: geometry.high_stump_volume_proportion(),
            high_stump_value_proportion: 0.0,
            last_cut_relative_height: 0.0,
            volume_per_quality: [0.0; QUALITY_COUNT],
            timber_price_by_quality: [0.0; QUALITY_COUNT],
            vol_fub_5cm: geometry.vol_fub_5cm,
            vol_sk_ub: geometry.vol_sk_ub,
            dbh_cm: geometry.dbh_cm,
            height_m: self.tree.height_m,
            stump_height_m: self.tree.stump_height_m,
            diameter_stump_cm: geometry.diameter_stump_cm,
            taper_diameters_cm: profile.diameters().to_vec(),
            taper_heights_m: profile.heights().to_vec(),
            sections: config.save_sections.then(Vec::new),
        }
    }
}

/// Build a [`Bucker`] and run it once
pub fn buck_tree<T: Taper + ?Sized>(
    tree: &Tree,
    pricelist: &Pricelist,
    taper: &T,
    min_diam_dead_wood: f64,
    config: &BuckingConfig,
) -> Result<BuckingResult> {
    Bucker::new(tree, pricelist, taper)?.calculate_tree_value(min_diam_dead_wood, config)
}
