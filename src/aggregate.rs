//! Material totals over a run.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Category;
use crate::plan::CuttingPlan;
use crate::types::{Shape, StockKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockTotal {
    pub stock: String,
    pub family: String,
    pub category: Category,
    pub size: Shape,
    pub whole: u32,
    pub cut: u32,
}

impl StockTotal {
    pub fn units(&self) -> u32 {
        self.whole + self.cut
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub family: String,
    pub category: Category,
    pub kind: StockKind,
    pub units: u32,
    pub new_stock: u64,
    /// Drawn from remnants registered before this run.
    pub carried_in: u64,
    pub net_required: u64,
    pub scrap: u64,
    pub remnants_generated: u64,
    pub joints: u32,
    pub waste_percent: f64,
}

impl CategoryTotal {
    pub fn consumed(&self) -> u64 {
        self.new_stock + self.carried_in
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialTotals {
    pub stock: Vec<StockTotal>,
    pub categories: Vec<CategoryTotal>,
    /// Over all panel categories, `None` when no panel material was used.
    pub area_waste_percent: Option<f64>,
    /// Over all linear categories.
    pub length_waste_percent: Option<f64>,
}

/// Share of consumed material that did not end up in a required piece.
///
/// A category whose requirements were covered by remnants of another
/// category can consume less than it needs; that never counts as negative
/// waste.
pub fn waste_percent(consumed: u64, net: u64) -> f64 {
    if consumed == 0 {
        return 0.0;
    }
    consumed.saturating_sub(net) as f64 / consumed as f64 * 100.0
}

pub fn aggregate<'a>(plans: impl IntoIterator<Item = &'a CuttingPlan>) -> MaterialTotals {
    let mut stock: BTreeMap<String, StockTotal> = BTreeMap::new();
    let mut categories: BTreeMap<(String, Category), CategoryTotal> = BTreeMap::new();

    for plan in plans {
        for usage in &plan.stock {
            let total = stock
                .entry(usage.stock.clone())
                .or_insert_with(|| StockTotal {
                    stock: usage.stock.clone(),
                    family: plan.family.clone(),
                    category: usage.category.clone(),
                    size: usage.size,
                    whole: 0,
                    cut: 0,
                });
            total.whole += usage.whole;
            total.cut += usage.cut;
        }

        let total = categories
            .entry((plan.family.clone(), plan.category.clone()))
            .or_insert_with(|| CategoryTotal {
                family: plan.family.clone(),
                category: plan.category.clone(),
                kind: plan.kind,
                units: 0,
                new_stock: 0,
                carried_in: 0,
                net_required: 0,
                scrap: 0,
                remnants_generated: 0,
                joints: 0,
                waste_percent: 0.0,
            });
        total.units += plan.units();
        total.new_stock += plan.new_stock_measure();
        total.carried_in += plan.carried_measure();
        total.net_required += plan.net_required;
        total.scrap += plan.scrap;
        total.remnants_generated += plan.generated_measure();
        total.joints += plan.joints;
    }

    let mut categories: Vec<CategoryTotal> = categories.into_values().collect();
    for total in &mut categories {
        total.waste_percent = waste_percent(total.consumed(), total.net_required);
    }
    let overall = |kind: StockKind| {
        let (consumed, net) = categories
            .iter()
            .filter(|c| c.kind == kind)
            .fold((0, 0), |(c, n), t| (c + t.consumed(), n + t.net_required));
        (consumed > 0).then(|| waste_percent(consumed, net))
    };

    MaterialTotals {
        area_waste_percent: overall(StockKind::Panel),
        length_waste_percent: overall(StockKind::Linear),
        stock: stock.into_values().collect(),
        categories,
    }
}
