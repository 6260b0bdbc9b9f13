//! How many identical cut pieces come out of one panel.

use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// A hand-checked layout that beats the plain grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownLayout {
    pub stock: Rect,
    pub piece: Rect,
    pub pieces: u32,
    /// Layout mixes upright and rotated pieces.
    #[serde(default)]
    pub mixed_orientation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// `piece` is the orientation actually laid out.
    Grid { piece: Rect, cols: u32, rows: u32 },
    Tabulated { pieces: u32 },
}

impl Nesting {
    pub fn per_panel(&self) -> u32 {
        match self {
            Nesting::Grid { cols, rows, .. } => cols * rows,
            Nesting::Tabulated { pieces } => *pieces,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestingTable {
    layouts: Vec<KnownLayout>,
}

impl NestingTable {
    pub fn new(layouts: Vec<KnownLayout>) -> Self {
        Self { layouts }
    }

    pub fn builtin() -> Self {
        let board = Rect::new(1200, 2400);
        Self::new(vec![
            // 6 rotated in the lower 1200x1800, 1 upright in the top 1200x600
            KnownLayout {
                stock: board,
                piece: Rect::new(900, 400),
                pieces: 7,
                mixed_orientation: true,
            },
            // 8 upright in the lower 1200x1800, 2 rotated in the top 1200x600
            KnownLayout {
                stock: board,
                piece: Rect::new(300, 900),
                pieces: 10,
                mixed_orientation: true,
            },
        ])
    }

    pub fn extend(&mut self, layouts: impl IntoIterator<Item = KnownLayout>) {
        self.layouts.extend(layouts);
    }

    fn lookup(&self, stock: Rect, piece: Rect, allow_rotation: bool) -> Option<u32> {
        self.layouts
            .iter()
            .filter(|l| allow_rotation || !l.mixed_orientation)
            .filter(|l| l.stock == stock)
            .filter(|l| l.piece == piece || (allow_rotation && l.piece == piece.rotated()))
            .map(|l| l.pieces)
            .max()
    }

    /// Best nesting of `piece` in `stock`. A tabulated layout is used only
    /// when it beats the grid, since the grid also yields reusable offcuts.
    /// Returns `None` when the piece does not fit at all.
    pub fn nesting(&self, stock: Rect, piece: Rect, allow_rotation: bool) -> Option<Nesting> {
        let mut grid = grid_of(stock, piece);
        if allow_rotation
            && let Some(rotated) = grid_of(stock, piece.rotated())
            && grid.is_none_or(|g| rotated.per_panel() > g.per_panel())
        {
            grid = Some(rotated);
        }

        let grid_count = grid.map_or(0, |g| g.per_panel());
        match self.lookup(stock, piece, allow_rotation) {
            Some(pieces) if pieces > grid_count => Some(Nesting::Tabulated { pieces }),
            _ => grid,
        }
    }
}

fn grid_of(stock: Rect, piece: Rect) -> Option<Nesting> {
    if piece.is_empty() {
        return None;
    }
    let cols = stock.w / piece.w;
    let rows = stock.h / piece.h;
    (cols > 0 && rows > 0).then_some(Nesting::Grid { piece, cols, rows })
}
