use super::{LayoutError, LayoutSystem, check_builtin_inputs};
use crate::sys::geometry::Rect;

/// Overlapping cascade of half-size windows.
///
/// The first zone sits at 10%/10% of the work area. Each following zone is
/// shifted so the whole cascade spans another 20% on both axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusLayout;

impl LayoutSystem for FocusLayout {
    fn calculate_zones(
        &self,
        work_area: Rect,
        zone_count: usize,
        _spacing: i32,
    ) -> Result<Vec<Rect>, LayoutError> {
        check_builtin_inputs(work_area, zone_count)?;

        let (w, h) = (f64::from(work_area.width()), f64::from(work_area.height()));
        let (step_x, step_y) = if zone_count <= 1 {
            (0.0, 0.0)
        } else {
            let steps = (zone_count - 1) as f64;
            (w * 0.2 / steps, h * 0.2 / steps)
        };
        let (width, height) = ((w * 0.5) as i32, (h * 0.5) as i32);

        Ok((0..zone_count)
            .map(|i| {
                let left = (w * 0.1 + step_x * i as f64) as i32;
                let top = (h * 0.1 + step_y * i as f64) as i32;
                Rect::from_origin_size(left, top, width, height)
            })
            .collect())
    }
}
