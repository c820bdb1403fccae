pub(crate) mod graph;
pub mod navigation;
pub mod systems;

pub use graph::{Direction, Orientation};
pub use navigation::{choose_next_zone_by_position, prepare_rect_for_cycling};
pub use systems::{
    CanvasLayoutInfo, CanvasZone, GridLayoutInfo, LayoutError, LayoutSystem, LayoutSystemKind,
    MAX_ZONE_COUNT,
};
