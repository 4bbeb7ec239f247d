//! Generate a solution cube for pine and spruce
//!
//! Bucks every tree on a DBH × height grid with a cone taper through DBH and
//! writes the cube as JSON (for lookups) and Parquet (for analysis).
//!
//! Output: $OUTPUT_DIR/solution_cube.{json,parquet} (default: cube_output/)

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Instant;

use stem_bucking::{logging, CubeGrid, LinearTaper, Pricelist, SolutionCube};

fn main() -> Result<()> {
    logging::init();

    let output_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "cube_output".to_string());
    let output_dir = Path::new(&output_dir);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let pricelist = Pricelist::mellanskog_2013()?;
    let grid = CubeGrid::new(&["pinus sylvestris", "picea abies"], (10.0, 40.0), (10.0, 30.0));

    println!("\n{}", "=".repeat(70));
    println!("SOLUTION CUBE GENERATOR");
    println!("{}", "=".repeat(70));
    println!("  Species: {:?}", grid.species);
    println!("  Trees:   {}", grid.len());

    let start = Instant::now();
    let cube = SolutionCube::generate(
        &pricelist,
        "LinearTaper",
        LinearTaper::for_tree,
        &grid,
    )?;
    let failed = cube.entries.iter().filter(|e| e.total_value.is_none()).count();
    println!(
        "  Bucked {} trees in {:.1}s ({} failed)",
        cube.entries.len(),
        start.elapsed().as_secs_f64(),
        failed
    );

    let json_path = output_dir.join("solution_cube.json");
    cube.save(&json_path)?;
    let parquet_path = output_dir.join("solution_cube.parquet");
    cube.write_parquet(&parquet_path)?;

    println!("  JSON:    {}", json_path.display());
    println!("  Parquet: {}", parquet_path.display());
    println!("  Price list fingerprint: {}", cube.pricelist_fingerprint);

    Ok(())
}
