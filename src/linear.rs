//! Covering lengths with bars.
//!
//! Each unit of a requirement is resolved once against the catalog lengths
//! of its category: a single bar, an exact combination of whole bars, two
//! bars joined, or whole longest bars plus a remainder. Whole bars go in as
//! they are. The one cut segment per unit is taken from remnants where
//! possible and the rest are packed onto fresh bars.

use std::cmp::Reverse;

use tracing::debug;

use crate::catalog::{MaterialFamily, StockItem};
use crate::config::PlanOptions;
use crate::error::{PlanError, Result};
use crate::extract::RequiredPiece;
use crate::packing::{Packing, fill_bars};
use crate::plan::{BarCut, BarSource, CutSource, CuttingPlan, Tier};
use crate::pool::RemnantPool;
use crate::tiers::{BarCombination, exact_combination, single_bar, spliced_pair};
use crate::types::{Shape, StockKind};

/// How one unit is covered. Indices refer to the candidate bar list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnitCover {
    tier: Tier,
    whole: Vec<usize>,
    segment: Option<u32>,
}

impl UnitCover {
    fn pieces(&self) -> u32 {
        self.whole.len() as u32 + u32::from(self.segment.is_some())
    }
}

pub struct LinearPlanner<'a> {
    family: &'a MaterialFamily,
    depth: usize,
    tolerance: u32,
}

impl<'a> LinearPlanner<'a> {
    pub fn new(family: &'a MaterialFamily, options: &PlanOptions) -> Self {
        Self {
            family,
            depth: options.combination_depth,
            tolerance: options.combination_tolerance,
        }
    }

    pub fn plan(&self, piece: &RequiredPiece, pool: &mut RemnantPool) -> Result<CuttingPlan> {
        let length = piece
            .shape
            .length()
            .ok_or_else(|| PlanError::UnsupportedMeasurement {
                family: self.family.name.clone(),
                measurement: "an area".to_string(),
            })?;
        let bars: Vec<(&StockItem, u32)> = self
            .family
            .sizes_for(&piece.category, piece.variant.as_deref(), piece.stock.as_deref())?
            .into_iter()
            .filter_map(|item| item.size.length().map(|len| (item, len)))
            .collect();
        let lengths: Vec<u32> = bars.iter().map(|&(_, len)| len).collect();

        let cover = self.cover_unit(&lengths, length, piece)?;
        debug!(
            requirement = %piece.id,
            length,
            tier = ?cover.tier,
            bars = cover.pieces(),
            "resolved linear unit"
        );

        let quantity = piece.quantity;
        let mut plan = CuttingPlan::new(piece, StockKind::Linear);
        for &idx in &cover.whole {
            plan.add_stock(bars[idx].0, quantity, 0);
        }
        plan.joints = (cover.pieces() - 1) * quantity;
        plan.add_cut(
            piece.shape,
            quantity,
            CutSource::Tiered {
                tier: cover.tier,
                whole: cover.whole.iter().map(|&idx| bars[idx].0.id.clone()).collect(),
                segment: cover.segment,
            },
        );

        if let Some(segment) = cover.segment {
            let unmet = self.cut_from_remnants(&mut plan, pool, vec![segment; quantity as usize]);
            self.cut_from_stock(&mut plan, pool, &bars, &unmet)?;
        }
        Ok(plan)
    }

    fn cover_unit(&self, lengths: &[u32], length: u32, piece: &RequiredPiece) -> Result<UnitCover> {
        if single_bar(lengths, length).is_some() {
            return Ok(UnitCover {
                tier: Tier::SingleBar,
                whole: Vec::new(),
                segment: Some(length),
            });
        }
        if !self.family.allow_joints {
            return Err(PlanError::NoFittingStock {
                category: piece.category.to_string(),
                length,
            });
        }

        match exact_combination(lengths, length, self.depth, self.tolerance) {
            Ok(combo) => return Ok(split(Tier::ExactCombination, combo, lengths, length)),
            Err(e) => debug!(requirement = %piece.id, error = %e, "trying a spliced pair"),
        }
        if let Some(pair) = spliced_pair(lengths, length) {
            return Ok(split(Tier::Spliced, pair, lengths, length));
        }

        let (longest_idx, &longest) = lengths
            .iter()
            .enumerate()
            .max_by_key(|&(i, &len)| (len, Reverse(i)))
            .ok_or_else(|| PlanError::NoFittingStock {
                category: piece.category.to_string(),
                length,
            })?;
        let rest = length % longest;
        Ok(UnitCover {
            tier: Tier::Decomposed,
            whole: vec![longest_idx; (length / longest) as usize],
            segment: (rest > 0).then_some(rest),
        })
    }

    /// Cuts segments from remnants, longest first. A remnant opened for one
    /// segment stays available to the following ones until its remaining
    /// length drops below the usable threshold. Returns the segments no
    /// remnant could take.
    fn cut_from_remnants(
        &self,
        plan: &mut CuttingPlan,
        pool: &mut RemnantPool,
        mut segments: Vec<u32>,
    ) -> Vec<u32> {
        segments.sort_unstable_by(|a, b| b.cmp(a));
        let mut open: Vec<BarCut> = Vec::new();
        let mut unmet = Vec::new();

        for segment in segments {
            let from_open = open
                .iter()
                .enumerate()
                .filter(|(_, bar)| bar.leftover >= segment)
                .filter(|(_, bar)| self.family.is_usable(&Shape::bar(bar.leftover)))
                .min_by_key(|&(i, bar)| (bar.leftover - segment, i))
                .map(|(i, bar)| (i, bar.leftover - segment));
            let from_pool = pool
                .find_usable(&Shape::bar(segment), self.family, &plan.category, false)
                .and_then(|id| {
                    let length = pool.get(id)?.shape.length()?;
                    Some((id, length - segment))
                });

            match (from_open, from_pool) {
                (Some((i, left)), pooled) if pooled.is_none_or(|(_, p)| left <= p) => {
                    let bar = &mut open[i];
                    bar.segments.push(segment);
                    bar.leftover = left;
                }
                (_, Some((id, _))) => {
                    let Some(length) = pool
                        .consume(id, &plan.requirement)
                        .and_then(|r| r.shape.length())
                    else {
                        unmet.push(segment);
                        continue;
                    };
                    debug!(
                        requirement = %plan.requirement,
                        remnant = id,
                        segment,
                        "segment from remnant"
                    );
                    plan.record_consumed(pool, id, Shape::bar(length));
                    open.push(BarCut {
                        source: BarSource::Remnant { remnant: id },
                        length,
                        segments: vec![segment],
                        leftover: length - segment,
                        kept_as: None,
                    });
                }
                _ => unmet.push(segment),
            }
        }

        for mut bar in open {
            bar.kept_as = plan.keep_or_scrap(pool, self.family, Shape::bar(bar.leftover));
            plan.bars.push(bar);
        }
        unmet
    }

    /// Packs segments onto fresh bars, choosing the bar length with the
    /// least leftover, then the fewest bars, then catalog order.
    fn cut_from_stock(
        &self,
        plan: &mut CuttingPlan,
        pool: &mut RemnantPool,
        bars: &[(&StockItem, u32)],
        segments: &[u32],
    ) -> Result<()> {
        let Some(&longest) = segments.iter().max() else {
            return Ok(());
        };

        let mut best: Option<(Packing, (u64, usize, usize))> = None;
        for (idx, &(_, bar_length)) in bars.iter().enumerate() {
            let Some(packing) = fill_bars(segments, bar_length) else {
                continue;
            };
            let key = (packing.waste(), packing.bars.len(), idx);
            if best.as_ref().is_none_or(|(_, best_key)| key < *best_key) {
                best = Some((packing, key));
            }
        }
        let Some((packing, (_, count, idx))) = best else {
            return Err(PlanError::NoFittingStock {
                category: plan.category.to_string(),
                length: longest,
            });
        };

        let item = bars[idx].0;
        plan.add_stock(item, 0, count as u32);
        let Packing { bar_length, bars: packed } = packing;
        for segments in packed {
            let leftover = bar_length - segments.iter().sum::<u32>();
            let kept_as = plan.keep_or_scrap(pool, self.family, Shape::bar(leftover));
            plan.bars.push(BarCut {
                source: BarSource::Stock {
                    stock: item.id.clone(),
                },
                length: bar_length,
                segments,
                leftover,
                kept_as,
            });
        }
        Ok(())
    }
}

/// Whole bars of a combination, with the overshoot taken off the last one.
fn split(tier: Tier, combo: BarCombination, lengths: &[u32], length: u32) -> UnitCover {
    let waste = combo.waste(length) as u32;
    let mut whole = combo.bars;
    let segment = match waste {
        0 => None,
        _ => whole.pop().map(|last| lengths[last] - waste),
    };
    UnitCover {
        tier,
        whole,
        segment,
    }
}
