//! Covering a rectangular area with panels.
//!
//! The area is cut into full-width bands of panel width. Each band takes
//! whole panels up to the last full row, leaving a strip of height
//! remainder at the top; the narrow band left at the side takes strips of
//! full panel height; the two remainders meet in a corner piece. Cut pieces
//! come from remnants when the pool has one, otherwise from fresh panels
//! nested as densely as the layout table allows.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{MaterialFamily, StockItem};
use crate::error::{PlanError, Result};
use crate::extract::RequiredPiece;
use crate::guillotine::{grid_residues, split_residues};
use crate::layouts::{Nesting, NestingTable};
use crate::plan::{CutSource, CuttingPlan};
use crate::pool::{RemnantId, RemnantPool};
use crate::types::{Rect, Shape, StockKind};

/// Band decomposition of an area for one panel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandLayout {
    pub panel: Rect,
    pub bands: u32,
    pub remainder_width: u32,
    pub rows: u32,
    pub remainder_height: u32,
}

impl BandLayout {
    pub fn new(area: Rect, panel: Rect) -> Self {
        Self {
            panel,
            bands: area.w / panel.w,
            remainder_width: area.w % panel.w,
            rows: area.h / panel.h,
            remainder_height: area.h % panel.h,
        }
    }

    /// The remainder band is narrower than a panel, so only full bands
    /// take whole panels.
    pub fn whole_panels(&self) -> u32 {
        self.bands * self.rows
    }

    /// Panel-wide strips topping each full band.
    pub fn band_pieces(&self) -> Option<(Rect, u32)> {
        (self.remainder_height > 0 && self.bands > 0)
            .then(|| (Rect::new(self.panel.w, self.remainder_height), self.bands))
    }

    /// Full-height strips filling the remainder band.
    pub fn strip_pieces(&self) -> Option<(Rect, u32)> {
        (self.remainder_width > 0 && self.rows > 0)
            .then(|| (Rect::new(self.remainder_width, self.panel.h), self.rows))
    }

    pub fn corner(&self) -> Option<Rect> {
        (self.remainder_width > 0 && self.remainder_height > 0)
            .then(|| Rect::new(self.remainder_width, self.remainder_height))
    }
}

pub struct PanelPlanner<'a> {
    family: &'a MaterialFamily,
    layouts: &'a NestingTable,
}

impl<'a> PanelPlanner<'a> {
    pub fn new(family: &'a MaterialFamily, layouts: &'a NestingTable) -> Self {
        Self { family, layouts }
    }

    /// Plans `piece` against every panel size of its category on a copy of
    /// the pool and commits the best: least excess material, then fewest
    /// panels, then catalog order.
    pub fn plan(&self, piece: &RequiredPiece, pool: &mut RemnantPool) -> Result<CuttingPlan> {
        let area = piece
            .shape
            .as_rect()
            .ok_or_else(|| PlanError::UnsupportedMeasurement {
                family: self.family.name.clone(),
                measurement: "a length".to_string(),
            })?;
        let candidates = self.family.sizes_for(
            &piece.category,
            piece.variant.as_deref(),
            piece.stock.as_deref(),
        )?;

        let mut best: Option<(CuttingPlan, RemnantPool, (i64, u32, usize))> = None;
        let mut last_err = None;
        for (idx, item) in candidates.iter().enumerate() {
            let mut trial = pool.clone();
            let plan = match self.plan_with(piece, area, item, &mut trial) {
                Ok(plan) => plan,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };
            let key = (plan.excess(), plan.units(), idx);
            debug!(
                requirement = %piece.id,
                stock = %item.id,
                excess = key.0,
                units = key.1,
                "panel candidate"
            );
            if best.as_ref().is_none_or(|(_, _, best_key)| key < *best_key) {
                best = Some((plan, trial, key));
            }
        }

        match best {
            Some((plan, trial, _)) => {
                *pool = trial;
                Ok(plan)
            }
            None => Err(last_err.unwrap_or_else(|| PlanError::UnknownMaterialCategory {
                family: self.family.name.clone(),
                category: piece.category.to_string(),
            })),
        }
    }

    fn plan_with(
        &self,
        piece: &RequiredPiece,
        area: Rect,
        item: &StockItem,
        pool: &mut RemnantPool,
    ) -> Result<CuttingPlan> {
        let panel = self.panel_rect(item)?;
        let layout = BandLayout::new(area, panel);
        let mut plan = CuttingPlan::new(piece, StockKind::Panel);
        for _ in 0..piece.quantity {
            self.plan_unit(&layout, item, pool, &mut plan)?;
        }
        Ok(plan)
    }

    fn plan_unit(
        &self,
        layout: &BandLayout,
        item: &StockItem,
        pool: &mut RemnantPool,
        plan: &mut CuttingPlan,
    ) -> Result<()> {
        plan.add_stock(item, layout.whole_panels(), 0);

        let height_offcuts = match layout.band_pieces() {
            Some((piece, count)) => self.cut_group(plan, pool, item, piece, count)?,
            None => Vec::new(),
        };
        let width_offcuts = match layout.strip_pieces() {
            Some((piece, count)) => self.cut_group(plan, pool, item, piece, count)?,
            None => Vec::new(),
        };
        if let Some(corner) = layout.corner() {
            self.cut_corner(plan, pool, item, corner, &width_offcuts, &height_offcuts)?;
        }
        Ok(())
    }

    /// Cuts `count` identical pieces, remnants first. Returns the offcuts
    /// left on the fresh panels.
    fn cut_group(
        &self,
        plan: &mut CuttingPlan,
        pool: &mut RemnantPool,
        item: &StockItem,
        piece: Rect,
        count: u32,
    ) -> Result<Vec<RemnantId>> {
        let shape = Shape::Panel(piece);
        let allow_rotation = self.family.allow_rotation;

        let mut remaining = count;
        while remaining > 0 {
            let Some(id) = pool.find_usable(&shape, self.family, &plan.category, allow_rotation)
            else {
                break;
            };
            if !self.cut_from_remnant(plan, pool, id, piece) {
                break;
            }
            remaining -= 1;
        }
        if remaining == 0 {
            return Ok(Vec::new());
        }

        let panel = self.panel_rect(item)?;
        let nesting = self
            .layouts
            .nesting(panel, piece, allow_rotation)
            .ok_or_else(|| PlanError::NoFittingStock {
                category: plan.category.to_string(),
                length: piece.w.max(piece.h),
            })?;
        let per_panel = nesting.per_panel();
        let units = remaining.div_ceil(per_panel);
        plan.add_stock(item, 0, units);
        plan.add_cut(
            shape,
            remaining,
            CutSource::NewStock {
                stock: item.id.clone(),
                pieces_per_unit: per_panel,
                units,
            },
        );

        let mut offcuts = Vec::new();
        match nesting {
            Nesting::Grid {
                piece: oriented,
                cols,
                rows,
            } => {
                let full = remaining / per_panel;
                let last = remaining % per_panel;
                let fills = std::iter::repeat_n(per_panel, full as usize)
                    .chain((last > 0).then_some(last));
                for fill in fills {
                    for residue in grid_residues(panel, oriented, cols, rows, fill) {
                        let kept = plan.keep_or_scrap(pool, self.family, Shape::Panel(residue));
                        offcuts.extend(kept);
                    }
                }
            }
            Nesting::Tabulated { .. } => {
                plan.scrap += units as u64 * panel.area() - remaining as u64 * piece.area();
            }
        }
        Ok(offcuts)
    }

    /// Corner piece: the remainder-width offcut, then the height-remainder
    /// offcut, then any pool remnant, then a panel of its own.
    fn cut_corner(
        &self,
        plan: &mut CuttingPlan,
        pool: &mut RemnantPool,
        item: &StockItem,
        corner: Rect,
        width_offcuts: &[RemnantId],
        height_offcuts: &[RemnantId],
    ) -> Result<()> {
        let shape = Shape::Panel(corner);
        let allow_rotation = self.family.allow_rotation;
        let category = &plan.category;
        let find_in = |ids: &[RemnantId]| {
            pool.find_usable_in(ids, &shape, self.family, category, allow_rotation)
        };
        let found = find_in(width_offcuts)
            .or_else(|| find_in(height_offcuts))
            .or_else(|| pool.find_usable(&shape, self.family, category, allow_rotation));
        if let Some(id) = found
            && self.cut_from_remnant(plan, pool, id, corner)
        {
            return Ok(());
        }

        let panel = self.panel_rect(item)?;
        let oriented = corner
            .oriented_in(&panel, allow_rotation)
            .ok_or_else(|| PlanError::NoFittingStock {
                category: plan.category.to_string(),
                length: corner.w.max(corner.h),
            })?;
        plan.add_stock(item, 0, 1);
        plan.add_cut(
            shape,
            1,
            CutSource::NewStock {
                stock: item.id.clone(),
                pieces_per_unit: 1,
                units: 1,
            },
        );
        for residue in split_residues(panel, oriented) {
            plan.keep_or_scrap(pool, self.family, Shape::Panel(residue));
        }
        Ok(())
    }

    fn cut_from_remnant(
        &self,
        plan: &mut CuttingPlan,
        pool: &mut RemnantPool,
        id: RemnantId,
        piece: Rect,
    ) -> bool {
        let Some(remnant) = pool.consume(id, &plan.requirement) else {
            return false;
        };
        let Some(stock) = remnant.shape.as_rect() else {
            return false;
        };
        let Some(oriented) = piece.oriented_in(&stock, self.family.allow_rotation) else {
            return false;
        };

        let in_plan = plan.remnants_generated.iter().any(|g| g.remnant == id);
        let source = if in_plan {
            CutSource::Offcut { remnant: id }
        } else {
            CutSource::Remnant { remnant: id }
        };
        debug!(
            requirement = %plan.requirement,
            remnant = id,
            piece = %piece,
            "panel piece from remnant"
        );

        plan.record_consumed(pool, id, remnant.shape);
        plan.add_cut(Shape::Panel(piece), 1, source);
        for residue in split_residues(stock, oriented) {
            plan.keep_or_scrap(pool, self.family, Shape::Panel(residue));
        }
        true
    }

    fn panel_rect(&self, item: &StockItem) -> Result<Rect> {
        item.size.as_rect().ok_or_else(|| PlanError::UnknownMaterialCategory {
            family: self.family.name.clone(),
            category: item.category.to_string(),
        })
    }
}
