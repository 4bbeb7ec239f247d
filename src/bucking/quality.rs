//! Quality grades and segment classification
//!
//! A segment's grade depends only on where it ends along the stem and on the
//! configured length/diameter limits, so classification is a pure function.

use crate::pricelist::{DiameterRange, LogPart};
use serde::{Deserialize, Serialize};

/// Product grade of a bucked section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityType {
    #[default]
    Undefined = 0,
    ButtLog = 1,
    MiddleLog = 2,
    TopLog = 3,
    Pulp = 4,
    LogCull = 5,
    Fuelwood = 6,
}

/// Number of grades, for per-grade summary arrays
pub const QUALITY_COUNT: usize = 7;

impl QualityType {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Sawlog part priced for this grade, if it is a sawlog grade
    pub fn log_part(self) -> Option<LogPart> {
        match self {
            QualityType::ButtLog => Some(LogPart::Butt),
            QualityType::MiddleLog => Some(LogPart::Middle),
            QualityType::TopLog => Some(LogPart::Top),
            _ => None,
        }
    }

    pub fn is_timber(self) -> bool {
        self.log_part().is_some()
    }
}

impl From<LogPart> for QualityType {
    fn from(part: LogPart) -> Self {
        match part {
            LogPart::Butt => QualityType::ButtLog,
            LogPart::Middle => QualityType::MiddleLog,
            LogPart::Top => QualityType::TopLog,
        }
    }
}

/// Sawlog quality zones as inclusive position limits (dm above the stump)
///
/// Limits may be negative when a zone ceiling lies below the stump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityZones {
    butt: i64,
    middle: i64,
    top: i64,
}

impl QualityZones {
    /// `ceilings_m` are butt/middle/top heights above ground, already capped
    /// at the height of the smallest sawlog diameter
    pub fn new(ceilings_m: [f64; 3], stump_height_m: f64) -> Self {
        let to_position = |h: f64| ((h - stump_height_m) * 10.0 - 1e-7).floor() as i64;
        Self {
            butt: to_position(ceilings_m[0]),
            middle: to_position(ceilings_m[1]),
            top: to_position(ceilings_m[2]),
        }
    }

    /// Grade for a cut ending at `position`
    pub fn grade_at(&self, position: usize) -> QualityType {
        let p = position as i64;
        if p <= self.butt {
            QualityType::ButtLog
        } else if p <= self.middle {
            QualityType::MiddleLog
        } else if p <= self.top {
            QualityType::TopLog
        } else {
            QualityType::Pulp
        }
    }
}

/// Length (dm) and diameter (cm) limits for sawlogs and pulpwood
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogLimits {
    pub timber_length_dm: (usize, usize),
    pub timber_diameter_cm: (u32, u32),
    pub pulp_length_dm: (usize, usize),
    pub pulp_diameter_cm: DiameterRange,
}

/// Product a candidate segment qualifies for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductClass {
    Timber(LogPart),
    Pulp,
    Cull,
}

impl From<ProductClass> for QualityType {
    fn from(class: ProductClass) -> Self {
        match class {
            ProductClass::Timber(part) => part.into(),
            ProductClass::Pulp => QualityType::Pulp,
            ProductClass::Cull => QualityType::LogCull,
        }
    }
}

/// Classify a segment of `length_dm` whose top has diameter class `top_diameter_cm`
///
/// Timber is tried first, then pulpwood, then cull; `None` means infeasible.
pub fn classify_segment(
    end_grade: QualityType,
    length_dm: usize,
    top_diameter_cm: u32,
    limits: &LogLimits,
) -> Option<ProductClass> {
    let (min_tl, max_tl) = limits.timber_length_dm;
    let (min_td, max_td) = limits.timber_diameter_cm;
    if let Some(part) = end_grade.log_part() {
        if (min_tl..=max_tl).contains(&length_dm) && (min_td..=max_td).contains(&top_diameter_cm) {
            return Some(ProductClass::Timber(part));
        }
    }

    let (min_pl, max_pl) = limits.pulp_length_dm;
    if (min_pl..=max_pl).contains(&length_dm)
        && limits.pulp_diameter_cm.contains(top_diameter_cm as f64)
    {
        return Some(ProductClass::Pulp);
    }

    if 2 * length_dm >= min_pl {
        return Some(ProductClass::Cull);
    }

    None
}
