//! Buck a single tree against the bundled Mellanskog 2013 price list
//!
//! Usage:
//!   cargo run --bin buck_tree -- [species] [dbh_cm] [height_m] [ground_diameter_cm]
//!
//! The taper is a cone through the ground diameter when given, else through
//! DBH.
//!
//! Defaults to a 20 m Scots pine with a straight 30 → 5 cm taper and a
//! 0.3 m stump. Set BUCKING_CONFIG to a JSON file to override the
//! optimizer settings; sections are always printed.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

use stem_bucking::{logging, Bucker, BuckingConfig, LinearTaper, Pricelist, QualityType, Tree};

const DEAD_WOOD_DIAMETER_CM: f64 = 10.0;

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let species = args.first().map(String::as_str).unwrap_or("pinus sylvestris");
    let (tree, taper) = match (args.get(1), args.get(2)) {
        (Some(dbh), Some(height)) => {
            let dbh: f64 = dbh.parse().with_context(|| format!("Invalid DBH: {}", dbh))?;
            let height: f64 = height
                .parse()
                .with_context(|| format!("Invalid height: {}", height))?;
            let mut tree = Tree::new(species, dbh, height)?;
            if let Some(ground) = args.get(3) {
                let ground: f64 = ground
                    .parse()
                    .with_context(|| format!("Invalid ground diameter: {}", ground))?;
                tree = tree.with_ground_diameter(ground)?;
            }
            let taper = LinearTaper::for_tree(&tree);
            (tree, taper)
        }
        _ => {
            let taper = LinearTaper::new(20.0, 30.0, 5.0);
            let tree = Tree::new(species, 28.4, 20.0)?.with_stump_height(0.3)?;
            (tree, taper)
        }
    };

    let config = match std::env::var("BUCKING_CONFIG") {
        Ok(path) => BuckingConfig::load(Path::new(&path))?,
        Err(_) => BuckingConfig::default(),
    }
    .with_sections();

    let pricelist = Pricelist::mellanskog_2013()?;

    println!("\n{}", "=".repeat(70));
    println!("STEM BUCKING: {}", tree.species);
    println!("{}", "=".repeat(70));
    println!(
        "  DBH {:.1} cm, height {:.1} m, stump {:.2} m",
        tree.dbh_cm, tree.height_m, tree.stump_height_m
    );

    let start = Instant::now();
    let bucker = Bucker::new(&tree, &pricelist, &taper)?;
    let result = bucker.calculate_tree_value(DEAD_WOOD_DIAMETER_CM, &config)?;
    let elapsed = start.elapsed();

    println!(
        "\n{:>8} {:>8} {:>10} {:>10} {:>10}  {}",
        "from dm", "to dm", "top cm", "vol m3", "value", "grade"
    );
    for section in result.sections.as_deref().unwrap_or_default() {
        println!(
            "{:>8} {:>8} {:>10.1} {:>10.4} {:>10.2}  {:?}",
            section.start_point,
            section.end_point,
            section.top_diameter,
            section.volume,
            section.value,
            section.quality
        );
    }

    println!("\nTotal value:          {:.2}", result.total_value);
    println!("Stem volume (sk):     {:.4} m3", result.vol_sk_ub);
    println!("Sawlog volume:        {:.4} m3", result.timber_volume());
    println!("Pulpwood volume:      {:.4} m3", result.volume_for(QualityType::Pulp));
    println!("Top loss:             {:.1} %", result.top_proportion * 100.0);
    println!("Last cut at:          {:.1} % of height", result.last_cut_relative_height * 100.0);
    println!("High-stump volume:    {:.1} %", result.high_stump_volume_proportion * 100.0);
    println!("Solved in {:?}", elapsed);

    Ok(())
}
