//! Optimal stem bucking
//!
//! Cross-cuts one felled stem into sawlogs, pulpwood and cull so that the
//! total value under a price list is maximised (Näsberg 1985 dynamic
//! programming over decimetre positions).
//!
//! - `bucking/`: the optimizer, its configuration and result types
//! - `pricelist/`: price lists and the bundled Mellanskog 2013 list
//! - `taper`/`tree`: stem geometry and tree records
//! - `solution_cube`: precomputed results over a grid of trees

pub mod bucking;
pub mod error;
pub mod logging;
pub mod pricelist;
pub mod solution_cube;
pub mod taper;
pub mod tree;

// Re-export commonly used types
pub use bucking::{buck_tree, Bucker, BuckingConfig, BuckingResult, CrossCutSection, QualityType};
pub use error::{BuckingError, TaperError};
pub use pricelist::Pricelist;
pub use solution_cube::{CubeGrid, SolutionCube};
pub use taper::{LinearTaper, Taper};
pub use tree::Tree;
