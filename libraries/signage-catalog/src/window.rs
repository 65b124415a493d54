//! Windowed access helpers
//!
//! The catalog renders only rows that intersect the viewport. Row `i`
//! occupies `[i * row_height, (i + 1) * row_height)`.

use std::ops::Range;

/// Minimal contiguous range of rows intersecting the viewport.
///
/// Degenerate geometry (no rows, non-positive sizes, non-finite offsets)
/// yields an empty range.
pub fn visible_range(
    scroll_offset: f32,
    row_height: f32,
    viewport_height: f32,
    total: usize,
) -> Range<usize> {
    if total == 0
        || !scroll_offset.is_finite()
        || !row_height.is_finite()
        || !viewport_height.is_finite()
        || row_height <= 0.0
        || viewport_height <= 0.0
    {
        return 0..0;
    }

    let scroll = scroll_offset.max(0.0);
    let first = (scroll / row_height).floor() as usize;
    if first >= total {
        return total..total;
    }
    let end = ((scroll + viewport_height) / row_height).ceil() as usize;
    first..end.min(total)
}

/// Pages (zero-based) that hold the rows in `range`
pub fn pages_for_range(range: &Range<usize>, page_size: usize) -> Vec<usize> {
    if range.is_empty() || page_size == 0 {
        return Vec::new();
    }
    (range.start / page_size..=(range.end - 1) / page_size).collect()
}
