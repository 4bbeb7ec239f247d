//! Backtracking the value table into a cutting plan

use super::optimizer::ValueTable;
use super::profile::StemProfile;
use super::quality::QUALITY_COUNT;
use super::result::CrossCutSection;
use smallvec::SmallVec;

/// (start, end) positions of each cut, bottom-up
pub type Segments = SmallVec<[(usize, usize); 16]>;

/// Walk predecessors from `end` down to the stump
///
/// `end` must be reachable, so every predecessor lies strictly below it.
pub fn backtrack(predecessor: &[usize], end: usize) -> Segments {
    let mut segments = Segments::new();
    let mut position = end;
    while position > 0 {
        let previous = predecessor[position];
        segments.push((previous, position));
        position = previous;
    }
    segments.reverse();
    segments
}

/// Per-grade totals of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub volume_per_quality: [f64; QUALITY_COUNT],
    /// Mean sawlog value per m³ for sawlog grades, 0 elsewhere
    pub timber_price_by_quality: [f64; QUALITY_COUNT],
}

pub fn summarise(
    segments: &[(usize, usize)],
    table: &ValueTable,
    profile: &StemProfile,
) -> PlanSummary {
    let mut volume_per_quality = [0.0; QUALITY_COUNT];
    let mut timber_value = [0.0; QUALITY_COUNT];
    for &(left, right) in segments {
        let grade = table.grade[right];
        volume_per_quality[grade.index()] += profile.volume(left, right);
        if grade.is_timber() {
            timber_value[grade.index()] += table.outcome[right].timber_value;
        }
    }

    let mut timber_price_by_quality = [0.0; QUALITY_COUNT];
    for (i, price) in timber_price_by_quality.iter_mut().enumerate() {
        if timber_value[i] != 0.0 && volume_per_quality[i] > 0.0 {
            *price = timber_value[i] / volume_per_quality[i];
        }
    }

    PlanSummary {
        volume_per_quality,
        timber_price_by_quality,
    }
}

/// Sections of the plan with adjacent same-grade cuts merged
pub fn sections(
    segments: &[(usize, usize)],
    table: &ValueTable,
    profile: &StemProfile,
    species: &str,
) -> Vec<CrossCutSection> {
    let mut merged: Vec<CrossCutSection> = Vec::with_capacity(segments.len());
    for &(left, right) in segments {
        let outcome = &table.outcome[right];
        let section = CrossCutSection {
            start_point: left,
            end_point: right,
            volume: profile.volume(left, right),
            top_diameter: profile.diameter(right),
            value: outcome.value,
            species_group: species.to_string(),
            shares: outcome.shares,
            quality: table.grade[right],
        };
        match merged.last_mut() {
            Some(last)
                if last.quality == section.quality && last.end_point == section.start_point =>
            {
                *last = last.merge(&section);
            }
            _ => merged.push(section),
        }
    }
    merged
}
