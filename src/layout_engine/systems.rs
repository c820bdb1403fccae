use enum_dispatch::enum_dispatch;
use thiserror::Error;

use crate::model::device::CustomLayout;
use crate::model::zone_set::LayoutType;
use crate::sys::geometry::Rect;

/// Upper bound on generated zones; anything above is almost certainly a typo.
pub const MAX_ZONE_COUNT: usize = 128;

/// Percent values in grid layouts are fixed-point with this multiplier.
pub const C_MULTIPLIER: i64 = 10000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("work area {0:?} has no area")]
    EmptyWorkArea(Rect),
    #[error("layout needs between 1 and {MAX_ZONE_COUNT} zones, got {0}")]
    ZoneCount(usize),
    #[error("malformed grid layout: {0}")]
    MalformedGrid(String),
    #[error("malformed canvas layout: {0}")]
    MalformedCanvas(String),
    #[error("no custom layout stored for zone set {0}")]
    MissingCustomLayout(String),
}

/// A zone layout family.
///
/// Rects are returned in zone-id order and are relative to the work area's
/// top-left corner.
#[enum_dispatch]
pub trait LayoutSystem {
    fn calculate_zones(
        &self,
        work_area: Rect,
        zone_count: usize,
        spacing: i32,
    ) -> Result<Vec<Rect>, LayoutError>;
}

mod canvas;
pub use canvas::{CanvasLayoutInfo, CanvasZone};
mod focus;
pub use focus::FocusLayout;
mod grid;
pub use grid::{GridLayout, GridLayoutInfo, PriorityGridLayout};
mod stripes;
pub use stripes::{ColumnsLayout, RowsLayout};

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(LayoutSystem)]
pub enum LayoutSystemKind {
    Focus(FocusLayout),
    Columns(ColumnsLayout),
    Rows(RowsLayout),
    Grid(GridLayout),
    PriorityGrid(PriorityGridLayout),
    Canvas(CanvasLayoutInfo),
    CustomGrid(GridLayoutInfo),
}

impl LayoutSystemKind {
    /// The generator for a built-in layout. `None` for [`LayoutType::Custom`],
    /// whose geometry comes from a stored custom layout.
    pub fn builtin(layout: LayoutType) -> Option<Self> {
        Some(match layout {
            LayoutType::Focus => FocusLayout.into(),
            LayoutType::Columns => ColumnsLayout.into(),
            LayoutType::Rows => RowsLayout.into(),
            LayoutType::Grid => GridLayout.into(),
            LayoutType::PriorityGrid => PriorityGridLayout.into(),
            LayoutType::Custom => return None,
        })
    }

    pub fn custom(layout: &CustomLayout) -> Self {
        match layout {
            CustomLayout::Canvas(info) => info.clone().into(),
            CustomLayout::Grid(info) => info.clone().into(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, LayoutSystemKind::Canvas(_) | LayoutSystemKind::CustomGrid(_))
    }
}

/// Checks shared by every built-in generator.
pub(crate) fn check_builtin_inputs(work_area: Rect, zone_count: usize) -> Result<(), LayoutError> {
    check_work_area(work_area)?;
    if zone_count == 0 || zone_count > MAX_ZONE_COUNT {
        return Err(LayoutError::ZoneCount(zone_count));
    }
    Ok(())
}

pub(crate) fn check_work_area(work_area: Rect) -> Result<(), LayoutError> {
    if work_area.is_empty() {
        return Err(LayoutError::EmptyWorkArea(work_area));
    }
    Ok(())
}

/// `k`-th of `n` integer slices of `total`. The slices always sum to `total`.
pub(crate) fn slice(total: i64, k: usize, n: usize) -> i64 {
    let (k, n) = (k as i64, n as i64);
    (k + 1) * total / n - k * total / n
}
