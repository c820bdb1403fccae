use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, trace};
use uuid::Uuid;

use super::device::{CustomLayout, braced_upper};
use super::zone::Zone;
use crate::layout_engine::{
    CanvasLayoutInfo, CanvasZone, Direction, LayoutError, LayoutSystem, LayoutSystemKind,
    choose_next_zone_by_position, prepare_rect_for_cycling,
};
use crate::sys::geometry::{Point, Rect, bounding_rect};
use crate::sys::window::{WindowHost, WindowId, zone_stamp};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LayoutType {
    Focus,
    Columns,
    Rows,
    Grid,
    #[default]
    PriorityGrid,
    Custom,
}

impl LayoutType {
    /// Numeric id used by the legacy store and the editor entry point.
    pub fn layout_id(self) -> u16 {
        match self {
            LayoutType::Focus => 0xFFFF,
            LayoutType::Rows => 0xFFFE,
            LayoutType::Columns => 0xFFFD,
            LayoutType::Grid => 0xFFFC,
            LayoutType::PriorityGrid => 0xFFFB,
            LayoutType::Custom => 0,
        }
    }

    pub fn from_layout_id(id: u16) -> Self {
        match id {
            0xFFFF => LayoutType::Focus,
            0xFFFE => LayoutType::Rows,
            0xFFFD => LayoutType::Columns,
            0xFFFC => LayoutType::Grid,
            0xFFFB => LayoutType::PriorityGrid,
            _ => LayoutType::Custom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSetConfig {
    pub id: Uuid,
    pub layout: LayoutType,
    pub work_area_key: String,
    pub zone_count: usize,
    pub is_custom: bool,
    pub sensitivity_radius: i32,
}

impl ZoneSetConfig {
    pub fn new(id: Uuid, layout: LayoutType, work_area_key: impl Into<String>, zone_count: usize) -> Self {
        Self {
            id,
            layout,
            work_area_key: work_area_key.into(),
            zone_count,
            is_custom: layout == LayoutType::Custom,
            sensitivity_radius: super::device::DEFAULT_SENSITIVITY_RADIUS,
        }
    }

    pub fn with_sensitivity_radius(mut self, radius: i32) -> Self {
        self.sensitivity_radius = radius;
        self
    }
}

/// The zones of one work area and the windows placed in them.
///
/// Zone rects are relative to the work area. [`ZoneSet::work_area`] keeps the
/// screen rect they were calculated for so placements can be translated back
/// into screen coordinates. Indices in this API are 0-based positions; zone ids
/// are `index + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSet {
    config: ZoneSetConfig,
    work_area: Rect,
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(config: ZoneSetConfig) -> Self {
        Self {
            config,
            work_area: Rect::default(),
            zones: Vec::new(),
        }
    }

    pub fn config(&self) -> &ZoneSetConfig { &self.config }

    pub fn id(&self) -> Uuid { self.config.id }

    /// Braced upper-case form used in the JSON document.
    pub fn uuid_string(&self) -> String { braced_upper(&self.config.id) }

    pub fn layout(&self) -> LayoutType { self.config.layout }

    pub fn work_area(&self) -> Rect { self.work_area }

    pub fn zones(&self) -> &[Zone] { &self.zones }

    pub fn zone(&self, index: usize) -> Option<&Zone> { self.zones.get(index) }

    pub fn len(&self) -> usize { self.zones.len() }

    pub fn is_empty(&self) -> bool { self.zones.is_empty() }

    /// Regenerates every zone for `work_area` (screen coordinates). On error the
    /// current zones are kept.
    pub fn calculate_zones(
        &mut self,
        work_area: Rect,
        spacing: i32,
        custom: Option<&CustomLayout>,
    ) -> Result<(), LayoutError> {
        let system = match (LayoutSystemKind::builtin(self.config.layout), custom) {
            (Some(system), _) => system,
            (None, Some(custom)) => LayoutSystemKind::custom(custom),
            (None, None) => return Err(LayoutError::MissingCustomLayout(self.uuid_string())),
        };

        let rects = system.calculate_zones(work_area, self.config.zone_count, spacing)?;
        debug!(
            zone_set = %self.uuid_string(),
            layout = %self.config.layout,
            zones = rects.len(),
            "calculated zones"
        );
        self.work_area = work_area;
        self.config.zone_count = rects.len();
        self.zones = rects.into_iter().map(Zone::new).collect();
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, zone) in self.zones.iter_mut().enumerate() {
            zone.set_id(i + 1);
        }
    }

    fn index_of_id(&self, id: usize) -> Option<usize> {
        id.checked_sub(1).filter(|i| *i < self.zones.len())
    }

    /// Inserts `zone` and returns its id.
    pub fn add_zone(&mut self, zone: Zone, front: bool) -> usize {
        if front {
            self.zones.insert(0, zone);
        } else {
            self.zones.push(zone);
        }
        self.renumber();
        if front { 1 } else { self.zones.len() }
    }

    pub fn remove_zone(&mut self, id: usize) -> Option<Zone> {
        let index = self.index_of_id(id)?;
        let zone = self.zones.remove(index);
        self.renumber();
        Some(zone)
    }

    pub fn move_zone_to_front(&mut self, id: usize) -> bool {
        let Some(index) = self.index_of_id(id) else { return false };
        self.zones[..=index].rotate_right(1);
        self.renumber();
        true
    }

    pub fn move_zone_to_back(&mut self, id: usize) -> bool {
        let Some(index) = self.index_of_id(id) else { return false };
        self.zones[index..].rotate_left(1);
        self.renumber();
        true
    }

    /// The smallest zone containing `pt` (work-area coordinates). Equal areas
    /// go to the zone that comes first.
    pub fn zone_from_point(&self, pt: Point) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (i, zone) in self.zones.iter().enumerate() {
            if !zone.contains_point(pt) {
                continue;
            }
            let area = zone.rect().area();
            if best.is_none_or(|(_, smallest)| area < smallest) {
                best = Some((i, area));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Zones to highlight for a cursor at `pt`, applying the sensitivity radius.
    pub fn zones_from_point(&self, pt: Point) -> Vec<usize> {
        let radius = self.config.sensitivity_radius;
        let mut strictly_captured = false;
        let captured: Vec<usize> = self
            .zones
            .iter()
            .enumerate()
            .filter(|(_, zone)| !zone.rect().is_empty())
            .filter(|(_, zone)| {
                strictly_captured |= zone.contains_point(pt);
                zone.rect().contains_within(pt, radius)
            })
            .map(|(i, _)| i)
            .collect();

        if captured.len() == 1 && !strictly_captured {
            return Vec::new();
        }

        let rect = |i: usize| self.zones[i].rect();
        let overlap = captured.iter().enumerate().any(|(n, &a)| {
            captured[n + 1..].iter().any(|&b| rect(a).overlaps(&rect(b), radius))
        });
        if !overlap {
            return captured;
        }

        let smallest = captured
            .iter()
            .copied()
            .reduce(|best, i| if rect(i).area() <= rect(best).area() { i } else { best });
        smallest.into_iter().collect()
    }

    pub fn zone_from_window(&self, window: WindowId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains_window(window))
    }

    pub fn zone_index_from_window(&self, window: WindowId) -> Option<usize> {
        self.zones.iter().position(|z| z.contains_window(window))
    }

    pub fn window_zone_indices(&self, window: WindowId) -> Vec<usize> {
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.contains_window(window))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_zone_empty(&self, index: usize) -> bool { self.zones.get(index).is_none_or(Zone::is_empty) }

    /// Every zone inside the bounding rect of `initial` and `last` together.
    pub fn combined_zone_range(&self, initial: &[usize], last: &[usize]) -> Vec<usize> {
        let picked = initial.iter().chain(last).filter_map(|i| self.zones.get(*i)).map(|z| z.rect());
        let rects: Vec<Rect> = picked.collect();
        let Some(bounds) = bounding_rect(&rects) else {
            return Vec::new();
        };
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| bounds.contains_rect(&z.rect()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Drops `window` from every zone. Returns whether it was in any.
    fn detach_window(&mut self, window: WindowId) -> bool {
        let mut found = false;
        for zone in &mut self.zones {
            found |= zone.remove_window(window);
        }
        found
    }

    /// Places `window` over the union of `indices`. Invalid indices are
    /// skipped; if none is valid the window ends up unzoned. Returns the
    /// indices the window now occupies.
    pub fn move_window_into_zones(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        indices: &[usize],
    ) -> Vec<usize> {
        if self.zones.is_empty() {
            return Vec::new();
        }
        self.detach_window(window);

        let mut placed: Vec<usize> = indices.iter().copied().filter(|i| *i < self.zones.len()).collect();
        placed.sort_unstable();
        placed.dedup();

        let rects: Vec<Rect> = placed.iter().map(|i| self.zones[*i].rect()).collect();
        let Some(target) = bounding_rect(&rects) else {
            host.stamp_window(window, 0);
            return placed;
        };

        for i in &placed {
            self.zones[*i].add_window(window);
        }
        let origin = self.work_area.origin();
        host.save_window_size(window);
        host.size_window_to_rect(window, target.offset(origin.x, origin.y));
        host.stamp_window(window, zone_stamp(placed.iter().map(|i| i + 1)));
        trace!(?window, zones = ?placed, "placed window");
        placed
    }

    /// Out-of-range indices wrap to the first zone.
    pub fn move_window_into_zone_by_index(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        index: usize,
    ) {
        if self.zones.is_empty() {
            return;
        }
        let index = if index < self.zones.len() { index } else { 0 };
        self.move_window_into_zones(host, window, &[index]);
    }

    /// Moves the window to the neighbouring zone in sequence order.
    ///
    /// Only `Left` and `Right` have a meaning here. An unzoned window goes to
    /// the first zone on `Right` and to the last on `Left`. At either end the
    /// window wraps when `cycle` is set and is unzoned otherwise. Returns
    /// whether the window ended up in a zone.
    pub fn move_window_into_zone_by_direction(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        direction: Direction,
        cycle: bool,
    ) -> bool {
        let n = self.zones.len();
        if n == 0 {
            return false;
        }

        let current = self.zone_index_from_window(window);
        let target = match (direction, current) {
            (Direction::Up | Direction::Down, _) => return false,
            (Direction::Right, None) => Some(0),
            (Direction::Left, None) => Some(n - 1),
            (Direction::Right, Some(i)) if i + 1 < n => Some(i + 1),
            (Direction::Left, Some(i)) if i > 0 => Some(i - 1),
            (Direction::Right, Some(_)) => cycle.then_some(0),
            (Direction::Left, Some(_)) => cycle.then_some(n - 1),
        };

        match target {
            Some(index) => !self.move_window_into_zones(host, window, &[index]).is_empty(),
            None => {
                self.move_window_into_zones(host, window, &[]);
                false
            }
        }
    }

    /// Moves the window to the zone that lies in `direction` from
    /// `window_rect` (screen coordinates), skipping zones it already occupies.
    /// With `cycle`, a miss retries from the far side of the work area over all
    /// zones.
    pub fn move_window_into_zone_by_position(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        window_rect: Rect,
        direction: Direction,
        cycle: bool,
    ) -> bool {
        if self.zones.is_empty() {
            return false;
        }
        let window_rect = window_rect.relative_to(self.work_area.origin());

        let free: Vec<usize> =
            (0..self.zones.len()).filter(|i| !self.zones[*i].contains_window(window)).collect();
        let free_rects: Vec<Rect> = free.iter().map(|i| self.zones[*i].rect()).collect();
        if let Some(pick) = choose_next_zone_by_position(direction, &window_rect, &free_rects) {
            self.move_window_into_zones(host, window, &[free[pick]]);
            return true;
        }
        if !cycle {
            return false;
        }

        let all_rects: Vec<Rect> = self.zones.iter().map(Zone::rect).collect();
        let shifted =
            prepare_rect_for_cycling(window_rect, Rect::from_size(self.work_area.size()), direction);
        match choose_next_zone_by_position(direction, &shifted, &all_rects) {
            Some(pick) => {
                self.move_window_into_zones(host, window, &[pick]);
                true
            }
            None => false,
        }
    }

    /// Finishes a drag released at `pt` (work-area coordinates): the window
    /// leaves its zones and, unless maximized, gets its pre-zone size back,
    /// then lands in the zone under `pt` if there is one.
    pub fn move_size_end(&mut self, host: &mut impl WindowHost, window: WindowId, pt: Point) -> Option<usize> {
        if self.detach_window(window) && !host.is_maximized(window) {
            host.restore_window_size(window);
        }
        match self.zone_from_point(pt) {
            Some(index) => {
                self.move_window_into_zones(host, window, &[index]);
                Some(index)
            }
            None => {
                host.stamp_window(window, 0);
                None
            }
        }
    }

    /// Copy of the zone geometry under a fresh id, marked custom. Window
    /// membership is not copied.
    pub fn make_custom_clone(&self) -> ZoneSet {
        let mut config = self.config.clone();
        config.id = Uuid::now_v7();
        config.is_custom = true;
        ZoneSet {
            config,
            work_area: self.work_area,
            zones: self.zones.iter().map(|z| Zone::new(z.rect())).collect(),
        }
        .renumbered()
    }

    fn renumbered(mut self) -> Self {
        self.renumber();
        self
    }

    /// The current geometry as a canvas layout at the work area's resolution.
    pub fn to_custom_layout(&self) -> CustomLayout {
        CustomLayout::Canvas(CanvasLayoutInfo {
            ref_width: self.work_area.width(),
            ref_height: self.work_area.height(),
            zones: self
                .zones
                .iter()
                .map(|z| {
                    let r = z.rect();
                    CanvasZone { x: r.left, y: r.top, width: r.width(), height: r.height() }
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::sys::screen::MonitorId;
    use crate::sys::virtual_host::{VirtualHost, VirtualWindow};

    fn wid(raw: u64) -> WindowId { WindowId::new(raw).unwrap() }

    fn config(layout: LayoutType, zone_count: usize) -> ZoneSetConfig {
        ZoneSetConfig::new(Uuid::nil(), layout, "work-area", zone_count)
    }

    fn with_rects(rects: &[Rect]) -> ZoneSet {
        let mut set = ZoneSet::new(config(LayoutType::Custom, rects.len()));
        for r in rects {
            set.add_zone(Zone::new(*r), false);
        }
        set
    }

    fn columns(work_area: Rect, n: usize) -> ZoneSet {
        let mut set = ZoneSet::new(config(LayoutType::Columns, n));
        set.calculate_zones(work_area, 0, None).unwrap();
        set
    }

    fn host_with(window: WindowId, rect: Rect) -> VirtualHost {
        let mut host = VirtualHost::new();
        host.add_window(window, VirtualWindow::new(rect, MonitorId::new(1)));
        host
    }

    fn ids(set: &ZoneSet) -> Vec<usize> { set.zones().iter().map(Zone::id).collect() }

    #[test]
    fn layout_ids_round_trip() {
        for (layout, id) in [
            (LayoutType::Focus, 0xFFFF),
            (LayoutType::Columns, 0xFFFD),
            (LayoutType::Rows, 0xFFFE),
            (LayoutType::Grid, 0xFFFC),
            (LayoutType::PriorityGrid, 0xFFFB),
        ] {
            assert_eq!(layout.layout_id(), id);
            assert_eq!(LayoutType::from_layout_id(id), layout);
        }
        assert_eq!(LayoutType::from_layout_id(0xFFFA), LayoutType::Custom);
        assert_eq!(LayoutType::from_layout_id(0), LayoutType::Custom);
        assert_eq!(LayoutType::Custom.layout_id(), 0);
        assert_eq!(LayoutType::from_str("priority-grid").unwrap(), LayoutType::PriorityGrid);
        assert_eq!(LayoutType::PriorityGrid.to_string(), "priority-grid");
    }

    #[test]
    fn ids_stay_contiguous() {
        let mut set = with_rects(&[Rect::new(0, 0, 10, 10), Rect::new(10, 0, 20, 10)]);
        assert_eq!(set.add_zone(Zone::new(Rect::new(20, 0, 30, 10)), true), 1);
        assert_eq!(set.zone(0).map(Zone::rect), Some(Rect::new(20, 0, 30, 10)));
        assert_eq!(ids(&set), vec![1, 2, 3]);

        assert!(set.move_zone_to_back(1));
        assert_eq!(set.zone(2).map(Zone::rect), Some(Rect::new(20, 0, 30, 10)));
        assert!(set.move_zone_to_front(3));
        assert_eq!(set.zone(0).map(Zone::rect), Some(Rect::new(20, 0, 30, 10)));
        assert_eq!(ids(&set), vec![1, 2, 3]);

        assert!(set.remove_zone(2).is_some());
        assert!(set.remove_zone(0).is_none());
        assert!(set.remove_zone(7).is_none());
        assert!(!set.move_zone_to_front(9));
        assert_eq!(ids(&set), vec![1, 2]);
    }

    #[test]
    fn smallest_zone_wins() {
        let set = with_rects(&[Rect::new(0, 0, 100, 100), Rect::new(10, 10, 90, 90)]);
        assert_eq!(set.zone_from_point(Point::new(50, 50)), Some(1));
        assert_eq!(set.zone_from_point(Point::new(50, 50)), Some(1));
        assert_eq!(set.zone_from_point(Point::new(5, 5)), Some(0));
        assert_eq!(set.zone_from_point(Point::new(100, 50)), None);
    }

    #[test]
    fn overlapping_focus_zones_prefer_first_on_tie() {
        let mut set = ZoneSet::new(config(LayoutType::Focus, 3));
        set.calculate_zones(Rect::new(0, 0, 1000, 1000), 0, None).unwrap();
        // All three focus zones have the same size and cover this point.
        assert_eq!(set.zone_from_point(Point::new(350, 350)), Some(0));
        assert_eq!(set.zone_from_point(Point::new(650, 650)), Some(1));
        assert_eq!(set.zone_from_point(Point::new(750, 750)), Some(2));
    }

    #[test]
    fn sensitivity_radius() {
        let set = with_rects(&[Rect::new(0, 0, 100, 100), Rect::new(100, 0, 200, 100)]);
        // Near the shared edge both zones are captured and they don't overlap.
        assert_eq!(set.zones_from_point(Point::new(95, 50)), vec![0, 1]);
        // Outside every zone, only one within reach: nothing.
        assert_eq!(set.zones_from_point(Point::new(-10, 50)), Vec::<usize>::new());
        assert_eq!(set.zones_from_point(Point::new(30, 50)), vec![0]);

        let nested = with_rects(&[Rect::new(0, 0, 200, 200), Rect::new(50, 50, 150, 150)]);
        assert_eq!(nested.zones_from_point(Point::new(100, 100)), vec![1]);
    }

    #[test]
    fn index_wraps_to_first_zone() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(0, 0, 300, 100), 3);

        set.move_window_into_zone_by_index(&mut host, w, 100);
        let wrapped = host.window_rect(w);
        set.move_window_into_zone_by_index(&mut host, w, 0);
        assert_eq!(host.window_rect(w), wrapped);
        assert_eq!(set.zone_index_from_window(w), Some(0));
        assert_eq!(host.window(w).unwrap().stamp, 0b10);

        let mut empty = ZoneSet::new(config(LayoutType::Custom, 0));
        empty.move_window_into_zone_by_index(&mut host, w, 0);
        assert_eq!(empty.zone_index_from_window(w), None);
    }

    #[test]
    fn placement_is_in_screen_coordinates() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(1920, 40, 2520, 640), 2);

        set.move_window_into_zone_by_index(&mut host, w, 1);
        assert_eq!(host.window_rect(w), Some(Rect::new(2220, 40, 2520, 640)));
        assert_eq!(host.window(w).unwrap().saved_rect, Some(Rect::new(0, 0, 50, 50)));
    }

    #[test]
    fn direction_cycles_through_every_zone() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(0, 0, 400, 100), 4);

        assert!(set.move_window_into_zone_by_direction(&mut host, w, Direction::Right, true));
        assert_eq!(set.zone_index_from_window(w), Some(0));
        for _ in 0..set.len() {
            assert!(set.move_window_into_zone_by_direction(&mut host, w, Direction::Right, true));
        }
        assert_eq!(set.zone_index_from_window(w), Some(0));

        assert!(set.move_window_into_zone_by_direction(&mut host, w, Direction::Left, true));
        assert_eq!(set.zone_index_from_window(w), Some(3));
        assert_eq!(set.window_zone_indices(w), vec![3]);
        assert!(!set.move_window_into_zone_by_direction(&mut host, w, Direction::Up, true));
        assert_eq!(set.zone_index_from_window(w), Some(3));
    }

    #[test]
    fn direction_without_cycle_unzones_at_edge() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(0, 0, 200, 100), 2);

        assert!(set.move_window_into_zone_by_direction(&mut host, w, Direction::Left, false));
        assert_eq!(set.zone_index_from_window(w), Some(1));
        assert!(!set.move_window_into_zone_by_direction(&mut host, w, Direction::Right, false));
        assert_eq!(set.zone_index_from_window(w), None);
        assert_eq!(host.window(w).unwrap().stamp, 0);
    }

    #[test]
    fn position_navigation_and_cycling() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(100, 0, 400, 100), 3);

        set.move_window_into_zone_by_index(&mut host, w, 1);
        let rect = host.window_rect(w).unwrap();
        assert!(set.move_window_into_zone_by_position(&mut host, w, rect, Direction::Right, false));
        assert_eq!(set.zone_index_from_window(w), Some(2));

        let rect = host.window_rect(w).unwrap();
        assert!(!set.move_window_into_zone_by_position(&mut host, w, rect, Direction::Right, false));
        assert!(set.move_window_into_zone_by_position(&mut host, w, rect, Direction::Right, true));
        assert_eq!(set.zone_index_from_window(w), Some(0));
    }

    #[test]
    fn multi_zone_placement_uses_union() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(0, 0, 300, 100), 3);

        let placed = set.move_window_into_zones(&mut host, w, &[2, 0, 9]);
        assert_eq!(placed, vec![0, 2]);
        assert_eq!(host.window_rect(w), Some(Rect::new(0, 0, 300, 100)));
        assert_eq!(host.window(w).unwrap().stamp, 0b1010);
        assert!(!set.is_zone_empty(0));
        assert!(set.is_zone_empty(1));
        assert!(set.is_zone_empty(42));
    }

    #[test]
    fn combined_range_fills_the_bounding_box() {
        let set = with_rects(&[
            Rect::new(0, 0, 100, 100),
            Rect::new(100, 0, 200, 100),
            Rect::new(0, 100, 100, 200),
            Rect::new(100, 100, 200, 200),
        ]);
        assert_eq!(set.combined_zone_range(&[0], &[3]), vec![0, 1, 2, 3]);
        assert_eq!(set.combined_zone_range(&[0], &[1]), vec![0, 1]);
        assert_eq!(set.combined_zone_range(&[], &[]), Vec::<usize>::new());
    }

    #[test]
    fn drop_restores_size_then_zones() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 40));
        let mut set = columns(Rect::new(0, 0, 200, 100), 2);

        set.move_window_into_zone_by_index(&mut host, w, 0);
        assert_eq!(set.move_size_end(&mut host, w, Point::new(150, 50)), Some(1));
        assert_eq!(set.window_zone_indices(w), vec![1]);
        assert_eq!(host.window_rect(w), Some(Rect::new(100, 0, 200, 100)));

        assert_eq!(set.move_size_end(&mut host, w, Point::new(500, 500)), None);
        assert_eq!(set.zone_index_from_window(w), None);
        assert_eq!(host.window(w).unwrap().stamp, 0);
        assert_eq!(host.window_rect(w).map(|r| (r.width(), r.height())), Some((50, 40)));
    }

    #[test]
    fn custom_clone_copies_geometry_only() {
        let w = wid(1);
        let mut host = host_with(w, Rect::new(0, 0, 50, 50));
        let mut set = columns(Rect::new(0, 0, 300, 100), 3);
        set.move_window_into_zone_by_index(&mut host, w, 1);

        let clone = set.make_custom_clone();
        assert_ne!(clone.id(), set.id());
        assert!(clone.config().is_custom);
        assert_eq!(ids(&clone), vec![1, 2, 3]);
        assert_eq!(
            clone.zones().iter().map(Zone::rect).collect::<Vec<_>>(),
            set.zones().iter().map(Zone::rect).collect::<Vec<_>>()
        );
        assert_eq!(clone.zone_index_from_window(w), None);

        let CustomLayout::Canvas(info) = clone.to_custom_layout() else { panic!("canvas expected") };
        assert_eq!((info.ref_width, info.ref_height), (300, 100));
        assert_eq!(info.zones[1], CanvasZone { x: 100, y: 0, width: 100, height: 100 });
    }

    #[test]
    fn custom_layout_needs_geometry() {
        let mut set = ZoneSet::new(config(LayoutType::Custom, 0));
        assert!(matches!(
            set.calculate_zones(Rect::new(0, 0, 100, 100), 0, None),
            Err(LayoutError::MissingCustomLayout(_))
        ));
        let custom = CustomLayout::Canvas(CanvasLayoutInfo {
            ref_width: 100,
            ref_height: 100,
            zones: vec![CanvasZone { x: 0, y: 0, width: 50, height: 50 }],
        });
        set.calculate_zones(Rect::new(0, 0, 200, 200), 0, Some(&custom)).unwrap();
        assert_eq!(set.zone(0).map(Zone::rect), Some(Rect::new(0, 0, 100, 100)));
        assert_eq!(set.config().zone_count, 1);
    }
}
