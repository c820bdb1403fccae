use serde::{Deserialize, Serialize};

use super::{LayoutError, LayoutSystem, check_work_area};
use crate::sys::geometry::Rect;

/// One free-form zone, in pixels at the layout's reference resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasZone {
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Absolute rectangles authored at `ref_width`x`ref_height`, rescaled onto
/// whatever work area the layout is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CanvasLayoutInfo {
    pub ref_width: i32,
    pub ref_height: i32,
    pub zones: Vec<CanvasZone>,
}

fn scale(value: i32, live: i32, reference: i32) -> i32 {
    if reference <= 0 {
        return value;
    }
    let scaled = i64::from(value) * i64::from(live) / i64::from(reference);
    scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl CanvasZone {
    /// Far edges as `(right, bottom)`, or `None` when they leave the `i32` range.
    pub fn far_edges(&self) -> Option<(i32, i32)> {
        Some((self.x.checked_add(self.width)?, self.y.checked_add(self.height)?))
    }
}

impl CanvasLayoutInfo {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if let Some(bad) = self.zones.iter().find(|z| z.width < 0 || z.height < 0) {
            return Err(LayoutError::MalformedCanvas(format!("negative zone size {bad:?}")));
        }
        if let Some(bad) = self.zones.iter().find(|z| z.far_edges().is_none()) {
            return Err(LayoutError::MalformedCanvas(format!("zone out of range {bad:?}")));
        }
        Ok(())
    }
}

impl LayoutSystem for CanvasLayoutInfo {
    fn calculate_zones(&self, work_area: Rect, _zone_count: usize, _spacing: i32) -> Result<Vec<Rect>, LayoutError> {
        check_work_area(work_area)?;
        self.validate()?;

        let (w, h) = (work_area.width(), work_area.height());
        Ok(self
            .zones
            .iter()
            .map(|z| {
                Rect::from_origin_size(
                    scale(z.x, w, self.ref_width),
                    scale(z.y, h, self.ref_height),
                    scale(z.width, w, self.ref_width),
                    scale(z.height, h, self.ref_height),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn info(ref_width: i32, ref_height: i32) -> CanvasLayoutInfo {
        CanvasLayoutInfo {
            ref_width,
            ref_height,
            zones: vec![
                CanvasZone { x: 0, y: 0, width: 960, height: 1080 },
                CanvasZone { x: 960, y: 540, width: 960, height: 540 },
            ],
        }
    }

    #[test]
    fn rescales_each_axis_independently() {
        let rects = info(1920, 1080).calculate_zones(Rect::new(0, 0, 3840, 1080), 0, 0).unwrap();
        assert_eq!(rects, vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 540, 3840, 1080)]);
    }

    #[test]
    fn zero_reference_keeps_pixels() {
        let rects = info(0, 1080).calculate_zones(Rect::new(0, 0, 3840, 2160), 0, 0).unwrap();
        assert_eq!(rects[1], Rect::new(960, 1080, 1920, 2160));
    }

    #[test]
    fn rejects_negative_sizes() {
        let mut bad = info(1920, 1080);
        bad.zones[0].width = -1;
        assert!(matches!(
            bad.calculate_zones(Rect::new(0, 0, 100, 100), 0, 0),
            Err(LayoutError::MalformedCanvas(_))
        ));
    }

    #[test]
    fn rejects_zones_past_i32_range() {
        let mut bad = info(1920, 1080);
        bad.zones[1] = CanvasZone { x: 2_147_483_000, y: 0, width: 2000, height: 1080 };
        assert!(matches!(
            bad.calculate_zones(Rect::new(0, 0, 1920, 1080), 0, 0),
            Err(LayoutError::MalformedCanvas(_))
        ));
    }

    #[test]
    fn upscaled_zones_saturate() {
        let big = CanvasLayoutInfo {
            ref_width: 1,
            ref_height: 1,
            zones: vec![CanvasZone { x: 1_000_000, y: 0, width: 1_000_000, height: 1 }],
        };
        let rects = big.calculate_zones(Rect::new(0, 0, 1_000_000, 100), 0, 0).unwrap();
        assert_eq!(rects, vec![Rect::new(i32::MAX, 0, i32::MAX, 100)]);
    }

    #[test]
    fn reads_editor_json() {
        let json = r#"{"ref-width": 1920, "ref-height": 1080,
                       "zones": [{"X": 10, "Y": 20, "width": 300, "height": 400}]}"#;
        let info: CanvasLayoutInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.zones, vec![CanvasZone { x: 10, y: 20, width: 300, height: 400 }]);
    }
}
