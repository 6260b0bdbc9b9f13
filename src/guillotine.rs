//! Guillotine splits: the rectangles left over when pieces are cut from a
//! panel with edge-to-edge cuts.

use crate::types::Rect;

/// Offcuts left after cutting `placed` from the corner of `stock`.
///
/// When material remains on both sides, the split runs along the shorter
/// leftover axis so the longer offcut keeps the full stock dimension.
pub fn split_residues(stock: Rect, placed: Rect) -> Vec<Rect> {
    debug_assert!(placed.fits_in(&stock));
    let right_w = stock.w - placed.w;
    let bottom_h = stock.h - placed.h;

    let residues = if right_w > 0 && bottom_h > 0 {
        if right_w < bottom_h {
            // right strip beside the piece, bottom strip spans full width
            [Rect::new(right_w, placed.h), Rect::new(stock.w, bottom_h)]
        } else {
            // right strip spans full height, bottom strip under the piece
            [Rect::new(right_w, stock.h), Rect::new(placed.w, bottom_h)]
        }
    } else if right_w > 0 {
        [Rect::new(right_w, stock.h), Rect::new(0, 0)]
    } else {
        [Rect::new(stock.w, bottom_h), Rect::new(0, 0)]
    };

    residues.into_iter().filter(|r| !r.is_empty()).collect()
}

/// Offcuts left after nesting `count` pieces row by row in a
/// `cols` × `rows` grid anchored at the stock's corner.
pub fn grid_residues(stock: Rect, piece: Rect, cols: u32, rows: u32, count: u32) -> Vec<Rect> {
    debug_assert!(count <= cols * rows && count > 0);
    debug_assert!(cols * piece.w <= stock.w && rows * piece.h <= stock.h);
    let used_rows = count.div_ceil(cols);
    let last_row = count - (used_rows - 1) * cols;

    let residues = [
        // beside the used rows
        Rect::new(stock.w - cols * piece.w, used_rows * piece.h),
        // above the used rows, full width
        Rect::new(stock.w, stock.h - used_rows * piece.h),
        // gap at the end of a partly filled last row
        Rect::new((cols - last_row) * piece.w, piece.h),
    ];
    residues.into_iter().filter(|r| !r.is_empty()).collect()
}
