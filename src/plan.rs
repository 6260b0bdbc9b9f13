//! Per-requirement cutting plans.

use serde::Serialize;

use crate::catalog::{Category, MaterialFamily, StockItem};
use crate::extract::RequiredPiece;
use crate::pool::{RemnantId, RemnantPool};
use crate::types::{Shape, StockKind};

/// How a linear unit was covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    SingleBar,
    ExactCombination,
    Spliced,
    Decomposed,
}

/// Where a group of cut pieces came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CutSource {
    /// Fresh panels, several identical pieces nested per panel.
    NewStock {
        stock: String,
        pieces_per_unit: u32,
        units: u32,
    },
    /// A remnant already in the pool when the piece was planned.
    Remnant { remnant: RemnantId },
    /// An offcut produced earlier in the same plan.
    Offcut { remnant: RemnantId },
    /// A linear unit; whole bars are listed by stock id, the cut segment
    /// (if any) is placed in [`CuttingPlan::bars`].
    Tiered {
        tier: Tier,
        whole: Vec<String>,
        segment: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutAllocation {
    pub shape: Shape,
    pub count: u32,
    #[serde(flatten)]
    pub source: CutSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum BarSource {
    Stock { stock: String },
    Remnant { remnant: RemnantId },
}

/// One bar and the segments cut from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarCut {
    #[serde(flatten)]
    pub source: BarSource,
    pub length: u32,
    pub segments: Vec<u32>,
    pub leftover: u32,
    /// Remnant the leftover was kept as, if it was long enough.
    pub kept_as: Option<RemnantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockUsage {
    pub stock: String,
    pub category: Category,
    pub size: Shape,
    pub whole: u32,
    pub cut: u32,
}

impl StockUsage {
    pub fn units(&self) -> u32 {
        self.whole + self.cut
    }

    pub fn measure(&self) -> u64 {
        self.size.measure() * self.units() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemnantUse {
    pub remnant: RemnantId,
    pub shape: Shape,
    /// Registered before the current run.
    pub carried: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRemnant {
    pub remnant: RemnantId,
    pub shape: Shape,
}

/// Everything decided for one required piece.
///
/// Balances as `new stock + drawn from remnants = net + scrap + generated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuttingPlan {
    pub requirement: String,
    pub family: String,
    pub category: Category,
    pub kind: StockKind,
    pub net_required: u64,
    pub whole_units: u32,
    pub cuts: Vec<CutAllocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bars: Vec<BarCut>,
    pub stock: Vec<StockUsage>,
    pub remnants_consumed: Vec<RemnantUse>,
    pub remnants_generated: Vec<GeneratedRemnant>,
    pub scrap: u64,
    pub joints: u32,
}

impl CuttingPlan {
    pub fn new(piece: &RequiredPiece, kind: StockKind) -> Self {
        Self {
            requirement: piece.id.clone(),
            family: piece.family.clone(),
            category: piece.category.clone(),
            kind,
            net_required: piece.net_measure(),
            whole_units: 0,
            cuts: Vec::new(),
            bars: Vec::new(),
            stock: Vec::new(),
            remnants_consumed: Vec::new(),
            remnants_generated: Vec::new(),
            scrap: 0,
            joints: 0,
        }
    }

    pub fn add_stock(&mut self, item: &StockItem, whole: u32, cut: u32) {
        if whole == 0 && cut == 0 {
            return;
        }
        self.whole_units += whole;
        match self.stock.iter_mut().find(|s| s.stock == item.id) {
            Some(usage) => {
                usage.whole += whole;
                usage.cut += cut;
            }
            None => self.stock.push(StockUsage {
                stock: item.id.clone(),
                category: item.category.clone(),
                size: item.size,
                whole,
                cut,
            }),
        }
    }

    /// Adds `count` pieces to the last allocation when it has the same
    /// shape and source, otherwise starts a new one.
    pub fn add_cut(&mut self, shape: Shape, count: u32, source: CutSource) {
        if let Some(last) = self.cuts.last_mut()
            && last.shape == shape
            && last.source == source
        {
            last.count += count;
            return;
        }
        self.cuts.push(CutAllocation {
            shape,
            count,
            source,
        });
    }

    pub fn record_consumed(&mut self, pool: &RemnantPool, remnant: RemnantId, shape: Shape) {
        self.remnants_consumed.push(RemnantUse {
            remnant,
            shape,
            carried: pool.is_carried(remnant),
        });
    }

    /// Registers an offcut in the pool, or books it as scrap when it is too
    /// small to keep.
    pub fn keep_or_scrap(
        &mut self,
        pool: &mut RemnantPool,
        family: &MaterialFamily,
        shape: Shape,
    ) -> Option<RemnantId> {
        if shape.is_empty() {
            return None;
        }
        match pool.register(family, &self.category, shape, &self.requirement) {
            Some(id) => {
                self.remnants_generated.push(GeneratedRemnant { remnant: id, shape });
                Some(id)
            }
            None => {
                self.scrap += shape.measure();
                None
            }
        }
    }

    pub fn units(&self) -> u32 {
        self.stock.iter().map(|s| s.units()).sum()
    }

    pub fn new_stock_measure(&self) -> u64 {
        self.stock.iter().map(|s| s.measure()).sum()
    }

    pub fn drawn_measure(&self) -> u64 {
        self.remnants_consumed.iter().map(|r| r.shape.measure()).sum()
    }

    pub fn carried_measure(&self) -> u64 {
        self.remnants_consumed
            .iter()
            .filter(|r| r.carried)
            .map(|r| r.shape.measure())
            .sum()
    }

    pub fn generated_measure(&self) -> u64 {
        self.remnants_generated.iter().map(|r| r.shape.measure()).sum()
    }

    /// New material beyond the net requirement; negative when remnants
    /// covered part of it.
    pub fn excess(&self) -> i64 {
        self.new_stock_measure() as i64 - self.net_required as i64
    }

    pub fn is_balanced(&self) -> bool {
        self.new_stock_measure() + self.drawn_measure()
            == self.net_required + self.scrap + self.generated_measure()
    }
}
