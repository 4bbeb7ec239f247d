//! Bucking Integration Tests
//!
//! Runs the optimizer end to end on the reference 20 m stem and on seeded
//! random trees, checking plan consistency, determinism and boundary cases.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stem_bucking::{
    buck_tree, logging, Bucker, BuckingConfig, BuckingError, BuckingResult, LinearTaper, Pricelist,
    QualityType, TaperError, Tree,
};

/// Sawlog prices for 15-28 cm, flat pulp price, no length corrections
const SCENARIO_PRICES: &str = r#"{
  "Common": {
    "SawlogLengthRange": [3.4, 5.5],
    "PulpwoodLengthRange": [2.7, 5.5],
    "PulpLogDiameterRange": [5, 60],
    "TopDiameter": 5,
    "PulpwoodPrices": {"pinus sylvestris": 250},
    "HarvestResiduePrice": 50,
    "FuelwoodLogPrice": 25,
    "HighStumpHeight": 4
  },
  "pinus sylvestris": {
    "VolumeType": "m3to",
    "DiameterPrices": {
      "15": [450, 450, 450],
      "18": [500, 500, 500],
      "22": [600, 600, 600],
      "26": [650, 650, 650],
      "28": [700, 700, 700]
    }
  }
}"#;

const DEAD_WOOD_CM: f64 = 10.0;

fn scenario_tree() -> (Tree, LinearTaper) {
    let tree = Tree::new("pinus sylvestris", 28.4, 20.0)
        .unwrap()
        .with_stump_height(0.3)
        .unwrap();
    (tree, LinearTaper::new(20.0, 30.0, 5.0))
}

fn scenario_prices() -> Pricelist {
    Pricelist::from_json_str(SCENARIO_PRICES).unwrap()
}

fn section_value_sum(result: &BuckingResult) -> f64 {
    result.sections.as_ref().unwrap().iter().map(|s| s.value).sum()
}

#[test]
fn test_scenario_sawlogs_at_base_pulp_above() {
    logging::init_test();
    let (tree, taper) = scenario_tree();
    let pricelist = scenario_prices();
    let config = BuckingConfig::default().with_sections();
    let result = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();

    let sections = result.sections.as_ref().unwrap();
    assert!(sections.len() >= 2);
    assert!(sections[0].quality.is_timber());
    assert_eq!(sections.last().unwrap().quality, QualityType::Pulp);

    // Sawlogs stay below 12 m, where the stem narrows to 15 cm
    for s in sections.iter().filter(|s| s.quality.is_timber()) {
        assert!(s.end_point <= 116, "sawlog ends at {} dm", s.end_point);
        assert!(s.top_diameter >= 15.0);
    }

    assert_relative_eq!(result.total_value, section_value_sum(&result), max_relative = 1e-9);

    let bucked = result.bucked_volume().unwrap();
    assert_relative_eq!(bucked + result.top_volume, result.vol_sk_ub, max_relative = 1e-9);
    assert_relative_eq!(
        result.top_proportion,
        result.top_volume / result.vol_sk_ub,
        max_relative = 1e-9
    );

    let last_end = sections.last().unwrap().end_point;
    assert_relative_eq!(
        result.last_cut_relative_height,
        (0.3 + last_end as f64 * 0.1) / 20.0,
        epsilon = 1e-9
    );

    // Per-grade volumes match the section list
    let per_grade: f64 = result.volume_per_quality.iter().sum();
    assert_relative_eq!(per_grade, bucked, max_relative = 1e-9);
    assert!(result.timber_price_by_quality[QualityType::ButtLog.index()] > 0.0);
    assert_eq!(result.timber_price_by_quality[QualityType::Pulp.index()], 0.0);
}

#[test]
fn test_scenario_high_stump_and_dead_wood() {
    let (tree, taper) = scenario_tree();
    let pricelist = scenario_prices();
    let config = BuckingConfig::default();
    let result = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();

    assert!(result.sections.is_none());
    assert!(result.high_stump_volume_proportion > 0.0);
    assert!(result.high_stump_volume_proportion < 1.0);
    assert!(result.high_stump_value_proportion > 0.0);
    assert!(result.high_stump_value_proportion < 1.0);
    // Thicker part of the stem carries most of the volume
    assert!(result.dead_wood_proportion > 0.5);
    assert!(result.dead_wood_proportion <= 1.0);
    assert_relative_eq!(result.dbh_cm, 30.0 - 1.25 * 1.3, epsilon = 1e-9);
}

#[test]
fn test_zero_sawlog_prices_yield_no_sawlogs() {
    let (tree, taper) = scenario_tree();
    let mut pricelist = Pricelist::mellanskog_2013().unwrap();
    let config = BuckingConfig::default().with_sections();
    let priced = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();
    assert!(priced.sections.as_ref().unwrap().iter().any(|s| s.quality.is_timber()));

    for prices in pricelist.timber.values_mut() {
        for row in prices.diameter_prices.values_mut() {
            *row = [0.0, 0.0, 0.0].into();
        }
    }
    let result = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();

    let sections = result.sections.as_ref().unwrap();
    assert!(!sections.is_empty());
    assert!(sections.iter().all(|s| !s.quality.is_timber()));
    assert!(sections
        .iter()
        .all(|s| matches!(s.quality, QualityType::Pulp | QualityType::LogCull)));
    assert!(sections.iter().any(|s| s.quality == QualityType::Pulp));
    assert_eq!(result.timber_volume(), 0.0);
    assert!(result.timber_price_by_quality.iter().all(|p| *p == 0.0));

    assert_relative_eq!(result.total_value, section_value_sum(&result), max_relative = 1e-9);
    assert!(result.total_value > 0.0);
    assert!(result.total_value <= priced.total_value);
}

#[test]
fn test_random_trees_keep_plan_invariants() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let config = BuckingConfig::default().with_sections();

    for _ in 0..40 {
        let species = if rng.gen_bool(0.5) { "pinus sylvestris" } else { "picea abies" };
        let height: f64 = rng.gen_range(6.0..32.0);
        let dbh: f64 = rng.gen_range(6.0..45.0);
        let tree = Tree::new(species, dbh, height).unwrap();
        let taper = LinearTaper::from_dbh(height, dbh);
        let bucker = Bucker::new(&tree, &pricelist, &taper).unwrap();

        let result = bucker.calculate_tree_value(DEAD_WOOD_CM, &config).unwrap();
        let sections = result.sections.as_ref().unwrap();

        assert_relative_eq!(
            result.total_value,
            section_value_sum(&result),
            epsilon = 1e-9,
            max_relative = 1e-9
        );
        let bucked: f64 = sections.iter().map(|s| s.volume).sum();
        assert!(bucked <= result.vol_sk_ub + 1e-9);
        assert_relative_eq!(
            bucked + result.top_volume,
            result.vol_sk_ub,
            epsilon = 1e-9,
            max_relative = 1e-9
        );
        assert!(sections.windows(2).all(|w| w[0].end_point == w[1].start_point));
        assert!(sections.windows(2).all(|w| w[0].quality != w[1].quality));

        // Same inputs, same plan
        let again = bucker.calculate_tree_value(DEAD_WOOD_CM, &config).unwrap();
        assert_eq!(again, result);

        // A higher pulp price never lowers the optimum
        let richer = BuckingConfig {
            pulp_price_factor: 1.3,
            ..config
        };
        let boosted = bucker.calculate_tree_value(DEAD_WOOD_CM, &richer).unwrap();
        assert!(boosted.total_value >= result.total_value - 1e-9);
    }
}

#[test]
fn test_tree_shorter_than_pulp_log_has_no_value() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    let tree = Tree::new("pinus sylvestris", 8.0, 2.0).unwrap();
    let taper = LinearTaper::new(2.0, 10.0, 4.0);
    let config = BuckingConfig::default().with_sections();
    let result = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();

    assert_eq!(result.total_value, 0.0);
    assert_eq!(result.sections, Some(Vec::new()));
    assert_eq!(result.last_cut_relative_height, 0.0);
    assert_eq!(result.top_proportion, 1.0);
    assert!(result.volume_per_quality.iter().all(|v| *v == 0.0));
}

#[test]
fn test_stem_thinner_than_top_diameter_is_degenerate() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    let tree = Tree::new("picea abies", 3.0, 5.0).unwrap();
    let taper = LinearTaper::new(5.0, 4.0, 0.0);
    let config = BuckingConfig::default();
    let result = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();

    assert_eq!(result.total_value, 0.0);
    assert_eq!(result.taper_heights_m.len(), 1);
    assert!(result.vol_sk_ub > 0.0);
    assert_eq!(result.top_proportion, 1.0);
    assert_eq!(result.dead_wood_proportion, 0.0);
}

#[test]
fn test_configuration_errors_fail_before_bucking() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    let taper = LinearTaper::from_dbh(18.0, 20.0);

    let birch = Tree::new("betula pendula", 20.0, 18.0).unwrap();
    assert!(matches!(
        Bucker::new(&birch, &pricelist, &taper),
        Err(BuckingError::MissingPrices { .. })
    ));

    let mut short = pricelist.clone();
    short.common.sawlog_length_range.min = 0.9;
    let pine = Tree::new("pinus sylvestris", 20.0, 18.0).unwrap();
    assert!(matches!(
        Bucker::new(&pine, &short, &taper),
        Err(BuckingError::MinLogLengthTooShort { length_dm: 9 })
    ));
}

#[test]
fn test_taper_errors_propagate() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    // Taper model ends at 10 m but the tree is 25 m tall
    let taper = LinearTaper::new(10.0, 30.0, 5.0);
    let tree = Tree::new("pinus sylvestris", 28.0, 25.0).unwrap();
    let config = BuckingConfig::default();
    let err = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap_err();
    assert!(matches!(err, BuckingError::Taper(TaperError::HeightOutOfRange { .. })));
}

#[test]
fn test_restricted_pricelist_matches_full() {
    let pricelist = Pricelist::mellanskog_2013().unwrap();
    let pine_only = pricelist.restricted_to(&["pinus sylvestris"]).unwrap();
    let tree = Tree::new("pinus sylvestris", 24.0, 21.0).unwrap();
    let taper = LinearTaper::from_dbh(21.0, 24.0);
    let config = BuckingConfig::default();

    let full = buck_tree(&tree, &pricelist, &taper, DEAD_WOOD_CM, &config).unwrap();
    let restricted = buck_tree(&tree, &pine_only, &taper, DEAD_WOOD_CM, &config).unwrap();
    assert_eq!(full, restricted);
}
