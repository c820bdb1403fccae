use tracing::{debug, warn};
use uuid::Uuid;

use super::device::{CustomZoneSetData, DeviceIdData, DeviceInfoData};
use super::zone_set::{LayoutType, ZoneSet, ZoneSetConfig};
use crate::common::collections::BTreeMap;
use crate::layout_engine::{Direction, LayoutError};
use crate::sys::geometry::{Point, Rect};
use crate::sys::screen::MonitorId;
use crate::sys::window::{WindowHost, WindowId};

/// One monitor's usable area on the current virtual desktop, with its active
/// zone set and the highlight state of an ongoing drag.
#[derive(Debug, Clone)]
pub struct WorkArea {
    monitor: MonitorId,
    device_id: DeviceIdData,
    rect: Rect,
    active_zone_set: Option<ZoneSet>,
    highlighted: Vec<usize>,
    initial_highlight: Vec<usize>,
    visible: bool,
    window_move_size: Option<WindowId>,
}

impl WorkArea {
    pub fn new(monitor: MonitorId, device_id: DeviceIdData, rect: Rect) -> Self {
        Self {
            monitor,
            device_id,
            rect,
            active_zone_set: None,
            highlighted: Vec::new(),
            initial_highlight: Vec::new(),
            visible: false,
            window_move_size: None,
        }
    }

    pub fn monitor(&self) -> MonitorId { self.monitor }

    pub fn device_id(&self) -> &DeviceIdData { &self.device_id }

    /// Key under which this work area's state is persisted.
    pub fn unique_id(&self) -> String { self.device_id.to_string() }

    pub fn rect(&self) -> Rect { self.rect }

    pub fn active_zone_set(&self) -> Option<&ZoneSet> { self.active_zone_set.as_ref() }

    pub fn active_zone_set_mut(&mut self) -> Option<&mut ZoneSet> { self.active_zone_set.as_mut() }

    pub fn set_zone_set(&mut self, zone_set: Option<ZoneSet>) {
        self.active_zone_set = zone_set;
        self.highlighted.clear();
        self.initial_highlight.clear();
    }

    pub fn highlighted_zones(&self) -> &[usize] { &self.highlighted }

    pub fn is_visible(&self) -> bool { self.visible }

    pub fn dragged_window(&self) -> Option<WindowId> { self.window_move_size }

    /// Builds the active zone set from persisted device state.
    pub fn update_active_zone_set(
        &mut self,
        info: &DeviceInfoData,
        custom_zone_sets: &BTreeMap<String, CustomZoneSetData>,
    ) -> Result<(), LayoutError> {
        let data = &info.active_zone_set;
        let id = Uuid::parse_str(&data.uuid).unwrap_or_else(|_| {
            warn!(uuid = %data.uuid, "unparsable zone set uuid, generating a new one");
            Uuid::now_v7()
        });
        let zone_count = data.zone_count.unwrap_or(info.zone_count);
        let config = ZoneSetConfig::new(id, data.layout_type, self.unique_id(), zone_count)
            .with_sensitivity_radius(info.sensitivity_radius);

        let custom = match data.layout_type {
            LayoutType::Custom => Some(
                &custom_zone_sets
                    .get(&data.uuid)
                    .ok_or_else(|| LayoutError::MissingCustomLayout(data.uuid.clone()))?
                    .layout,
            ),
            _ => None,
        };

        let mut zone_set = ZoneSet::new(config);
        zone_set.calculate_zones(self.rect, info.effective_spacing(), custom)?;
        debug!(work_area = %self.unique_id(), zones = zone_set.len(), "activated zone set");
        self.set_zone_set(Some(zone_set));
        Ok(())
    }

    pub fn show(&mut self) { self.visible = true; }

    pub fn hide(&mut self) {
        self.visible = false;
        self.highlighted.clear();
        self.initial_highlight.clear();
    }

    pub fn clear_selected_zones(&mut self) {
        self.highlighted.clear();
        self.initial_highlight.clear();
    }

    pub fn move_size_enter(&mut self, window: WindowId) {
        self.window_move_size = Some(window);
        self.clear_selected_zones();
        self.show();
    }

    /// Re-derives the highlight for a cursor at `pt` (screen coordinates).
    /// Returns whether the highlighted zones changed.
    pub fn move_size_update(&mut self, pt: Point, drag_enabled: bool, select_many: bool) -> bool {
        if !drag_enabled {
            let changed = !self.highlighted.is_empty();
            self.highlighted.clear();
            return changed;
        }
        let Some(zone_set) = &self.active_zone_set else {
            return false;
        };

        let local = pt.offset(-self.rect.left, -self.rect.top);
        let mut highlight = zone_set.zones_from_point(local);
        if select_many {
            if self.initial_highlight.is_empty() {
                self.initial_highlight = highlight.clone();
            } else {
                highlight = zone_set.combined_zone_range(&self.initial_highlight, &highlight);
            }
        } else {
            self.initial_highlight.clear();
        }

        let changed = highlight != self.highlighted;
        self.highlighted = highlight;
        changed
    }

    /// Drops `window` at `pt` (screen coordinates). Returns the zones it landed
    /// in, or `None` if `window` is not the one being dragged over this area.
    pub fn move_size_end(&mut self, host: &mut impl WindowHost, window: WindowId, pt: Point) -> Option<Vec<usize>> {
        if self.window_move_size != Some(window) {
            return None;
        }
        let highlighted = std::mem::take(&mut self.highlighted);
        let zoned = match &mut self.active_zone_set {
            Some(zone_set) if highlighted.len() > 1 => {
                zone_set.move_window_into_zones(host, window, &highlighted)
            }
            Some(zone_set) => {
                let local = pt.offset(-self.rect.left, -self.rect.top);
                zone_set.move_size_end(host, window, local).into_iter().collect()
            }
            None => Vec::new(),
        };
        self.hide();
        self.window_move_size = None;
        Some(zoned)
    }

    pub fn move_window_into_zone_by_index(&mut self, host: &mut impl WindowHost, window: WindowId, index: usize) {
        if let Some(zone_set) = &mut self.active_zone_set {
            zone_set.move_window_into_zone_by_index(host, window, index);
        }
    }

    /// Arrow-key move. `by_position` picks the geometric navigator over plain
    /// sequence order.
    pub fn move_window_into_zone_by_direction(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        direction: Direction,
        cycle: bool,
        by_position: bool,
    ) -> bool {
        let Some(zone_set) = &mut self.active_zone_set else {
            return false;
        };
        if by_position {
            let Some(rect) = host.window_rect(window) else {
                return false;
            };
            zone_set.move_window_into_zone_by_position(host, window, rect, direction, cycle)
        } else {
            zone_set.move_window_into_zone_by_direction(host, window, direction, cycle)
        }
    }
}
