use serde::{Deserialize, Serialize};

use crate::common::collections::HashSet;
use crate::sys::geometry::{Point, Rect};
use crate::sys::window::WindowId;

/// One rectangle of a zone set and the windows stamped into it.
///
/// `id` is 1-based and owned by the containing [`ZoneSet`](super::zone_set::ZoneSet),
/// which renumbers every zone whenever the sequence changes. A detached zone
/// reports id 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    id: usize,
    rect: Rect,
    #[serde(skip)]
    windows: HashSet<WindowId>,
}

impl Zone {
    pub fn new(rect: Rect) -> Self {
        Self {
            id: 0,
            rect,
            windows: HashSet::default(),
        }
    }

    pub fn id(&self) -> usize { self.id }

    pub(super) fn set_id(&mut self, id: usize) { self.id = id; }

    pub fn rect(&self) -> Rect { self.rect }

    /// Empty and inverted zones never hit-test.
    pub fn contains_point(&self, pt: Point) -> bool { !self.rect.is_empty() && self.rect.contains(pt) }

    pub fn contains_window(&self, window: WindowId) -> bool { self.windows.contains(&window) }

    pub fn add_window(&mut self, window: WindowId) -> bool { self.windows.insert(window) }

    pub fn remove_window(&mut self, window: WindowId) -> bool { self.windows.remove(&window) }

    pub fn windows(&self) -> impl Iterator<Item = WindowId> + '_ { self.windows.iter().copied() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_zone_never_hits() {
        let zone = Zone::new(Rect::new(10, 10, 10, 50));
        assert!(!zone.contains_point(Point::new(10, 20)));
    }

    #[test]
    fn membership() {
        let w = WindowId::new(3).unwrap();
        let mut zone = Zone::new(Rect::new(0, 0, 10, 10));
        assert!(zone.is_empty());
        assert!(zone.add_window(w));
        assert!(!zone.add_window(w));
        assert!(zone.contains_window(w));
        assert!(zone.remove_window(w));
        assert!(zone.is_empty());
    }
}
