use super::{LayoutError, LayoutSystem, check_builtin_inputs, slice};
use crate::layout_engine::graph::Orientation;
use crate::sys::geometry::Rect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnsLayout;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowsLayout;

impl LayoutSystem for ColumnsLayout {
    fn calculate_zones(&self, work_area: Rect, zone_count: usize, spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        stripes(Orientation::Horizontal, work_area, zone_count, spacing)
    }
}

impl LayoutSystem for RowsLayout {
    fn calculate_zones(&self, work_area: Rect, zone_count: usize, spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        stripes(Orientation::Vertical, work_area, zone_count, spacing)
    }
}

/// Equal cells along `orientation`, with `spacing` gutters between cells and
/// at both margins.
fn stripes(
    orientation: Orientation,
    work_area: Rect,
    zone_count: usize,
    spacing: i32,
) -> Result<Vec<Rect>, LayoutError> {
    check_builtin_inputs(work_area, zone_count)?;

    let s = i64::from(spacing);
    let (along, across) = match orientation {
        Orientation::Horizontal => (work_area.width(), work_area.height()),
        Orientation::Vertical => (work_area.height(), work_area.width()),
    };
    let total_along = (i64::from(along) - s * (zone_count as i64 + 1)).max(0);
    let total_across = (i64::from(across) - 2 * s).max(0);

    let mut start = s;
    let mut rects = Vec::with_capacity(zone_count);
    for k in 0..zone_count {
        let end = start + slice(total_along, k, zone_count);
        let rect = match orientation {
            Orientation::Horizontal => Rect::new(start as i32, spacing, end as i32, (total_across + s) as i32),
            Orientation::Vertical => Rect::new(spacing, start as i32, (total_across + s) as i32, end as i32),
        };
        rects.push(rect);
        start = end + s;
    }
    Ok(rects)
}
