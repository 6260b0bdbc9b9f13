//! Bar selection for a single required length.
//!
//! Every search ranks candidates by waste, then bar count, then the catalog
//! indices of the bars used (earlier declarations first). Indices refer to
//! the `lengths` slice the caller passes in.

use crate::error::{PlanError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarCombination {
    /// Catalog indices, non-decreasing.
    pub bars: Vec<usize>,
    pub total: u64,
}

impl BarCombination {
    pub fn waste(&self, required: u32) -> u64 {
        self.total - required as u64
    }
}

type Rank = (u64, usize, Vec<usize>);

fn rank(bars: &[usize], total: u64, required: u32) -> Rank {
    (total - required as u64, bars.len(), bars.to_vec())
}

/// Tier 1: the shortest bar that holds `required` on its own.
pub fn single_bar(lengths: &[u32], required: u32) -> Option<usize> {
    lengths
        .iter()
        .enumerate()
        .filter(|&(_, &len)| len >= required)
        .min_by_key(|&(i, &len)| (len - required, i))
        .map(|(i, _)| i)
}

/// Longest total the exact-combination search tabulates, in mm.
pub const MAX_COMBINATION_LENGTH: u64 = 1_000_000;

/// Tier 2: bars whose lengths add up to `required`, or overshoot it by at
/// most `tolerance`, using at most `max_depth` bars.
///
/// Tabulates, for every total up to `required + tolerance`, the fewest bars
/// reaching it exactly (lowest indices on ties), then takes the smallest
/// total in range.
pub fn exact_combination(
    lengths: &[u32],
    required: u32,
    max_depth: usize,
    tolerance: u32,
) -> Result<BarCombination> {
    let exhausted = || PlanError::RecursionLimitExceeded {
        length: required,
        depth: max_depth,
    };
    let target = required as u64;
    let upper = target + tolerance as u64;
    let longest = lengths.iter().copied().max().unwrap_or(0) as u64;
    if longest == 0 || (max_depth as u64) * longest < target || upper > MAX_COMBINATION_LENGTH {
        return Err(exhausted());
    }

    let size = upper as usize + 1;
    let mut best: Vec<Option<Vec<usize>>> = vec![None; size];
    best[0] = Some(Vec::new());
    for sum in 1..size {
        let mut choice: Option<Vec<usize>> = None;
        for (idx, &len) in lengths.iter().enumerate() {
            let len = len as usize;
            if len == 0 || len > sum {
                continue;
            }
            let Some(prev) = &best[sum - len] else {
                continue;
            };
            if prev.len() >= max_depth
                || choice.as_ref().is_some_and(|c| c.len() < prev.len() + 1)
            {
                continue;
            }
            let mut bars = prev.clone();
            bars.insert(bars.partition_point(|&b| b <= idx), idx);
            if choice
                .as_ref()
                .is_none_or(|c| (bars.len(), &bars) < (c.len(), c))
            {
                choice = Some(bars);
            }
        }
        best[sum] = choice;
    }

    (target as usize..size)
        .find_map(|sum| {
            best[sum].take().map(|bars| BarCombination {
                bars,
                total: sum as u64,
            })
        })
        .ok_or_else(exhausted)
}

/// Tier 3: two bars, equal or not, joined to reach `required`.
pub fn spliced_pair(lengths: &[u32], required: u32) -> Option<BarCombination> {
    let mut best: Option<Rank> = None;
    for i in 0..lengths.len() {
        for j in i..lengths.len() {
            let total = lengths[i] as u64 + lengths[j] as u64;
            if total < required as u64 {
                continue;
            }
            let candidate = rank(&[i, j], total, required);
            if best.as_ref().is_none_or(|b| candidate < *b) {
                best = Some(candidate);
            }
        }
    }
    best.map(|(waste, _, bars)| BarCombination {
        bars,
        total: required as u64 + waste,
    })
}
