//! Optimal bucking of a single stem
//!
//! Each concern lives in its own module:
//! - `cache`/`profile`: discretised stem geometry and memoised taper lookups
//! - `quality`: quality zones and segment classification
//! - `value_table`/`optimizer`: sawlog value lookup and the DP fill
//! - `reconstruct`/`stats`: cutting plan and summary proportions

pub mod cache;
pub mod config;
pub mod optimizer;
pub mod profile;
pub mod quality;
pub mod reconstruct;
pub mod result;
pub mod stats;
pub mod value_table;

// Re-export the public surface
pub use cache::TreeCache;
pub use config::BuckingConfig;
pub use optimizer::{
    buck_tree, Bucker, SegmentOutcome, ValueTable, MAX_POSITIONS, MERCHANTABLE_TOP_CM,
};
pub use profile::{LengthModules, StemProfile, UNBOUNDED_MODULE_DM};
pub use quality::{
    classify_segment, LogLimits, ProductClass, QualityType, QualityZones, QUALITY_COUNT,
};
pub use reconstruct::PlanSummary;
pub use result::{BuckingResult, CrossCutSection, ProductShares};
pub use stats::StemGeometry;
pub use value_table::TimberValueTable;
