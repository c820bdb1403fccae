//! The zone controller owns the work areas, the drag handler and the zone
//! store, and applies host events to them one at a time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::window_move::{MoveSizeOutcome, WindowMoveHandler, WorkAreas};
use crate::actor;
use crate::common::config::{Config, ZoneSettings};
use crate::layout_engine::Direction;
use crate::model::device::braced_upper;
use crate::model::{
    AppZoneHistoryData, CustomZoneSetData, DeviceIdData, DeviceInfoData, LayoutType, WorkArea, ZoneSetData,
};
use crate::persistence::PersistenceStore;
use crate::sys::geometry::{Point, Rect};
use crate::sys::screen::{MonitorId, MonitorInfo, order_monitors};
use crate::sys::window::{Modifiers, WindowHost, WindowId, is_candidate_for_zoning};

pub type Sender = actor::Sender<Event>;
type Receiver = actor::Receiver<Event>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// The monitor set, a work area or the virtual desktop changed.
    MonitorsChanged { monitors: Vec<MonitorInfo>, virtual_desktop: Uuid },
    MoveSizeStart { window: WindowId, monitor: MonitorId, point: Point },
    MoveSizeUpdate { monitor: MonitorId, point: Point },
    MoveSizeEnd { window: WindowId, point: Point },
    CancelDrag,
    ModifiersChanged(Modifiers),
    SecondaryMouseButton,
    /// A new top-level window; goes back to where its app was last zoned.
    WindowCreated(WindowId),
    MoveWindowToZone { window: WindowId, index: usize },
    MoveWindowByDirection { window: WindowId, direction: Direction },
    SetLayout { monitor: MonitorId, layout: LayoutType, zone_count: usize },
    ApplyCustomLayout { monitor: MonitorId, uuid: String },
    /// Stores the monitor's current zones as a new custom layout and
    /// switches to it.
    SaveLayoutAsCustom { monitor: MonitorId, name: String },
    /// The editor exited; pick up whatever it handed off.
    EditorClosed,
    ConfigUpdated(Config),
}

/// Where the editor drops its hand-off files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandOffFiles {
    pub device: PathBuf,
    pub custom_zone_sets: PathBuf,
    pub deleted_custom_zone_sets: PathBuf,
}

impl HandOffFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            device: dir.join("zonal-device.json"),
            custom_zone_sets: dir.join("zonal-custom-zone-sets.json"),
            deleted_custom_zone_sets: dir.join("zonal-deleted-custom-zone-sets.json"),
        }
    }
}

pub struct ZoneController<H> {
    settings: ZoneSettings,
    host: H,
    store: PersistenceStore,
    hand_off: HandOffFiles,
    work_areas: WorkAreas,
    monitor_order: Vec<MonitorId>,
    handler: WindowMoveHandler,
    receiver: Receiver,
}

impl<H: WindowHost> ZoneController<H> {
    pub fn new(config: Config, host: H, store: PersistenceStore, hand_off: HandOffFiles) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Self {
            handler: WindowMoveHandler::new(config.settings.clone()),
            settings: config.settings,
            host,
            store,
            hand_off,
            work_areas: WorkAreas::default(),
            monitor_order: Vec::new(),
            receiver,
        };
        (this, sender)
    }

    /// Handles events until every sender is gone, then hands the controller
    /// back.
    pub async fn run(mut self) -> Self {
        while let Some((span, event)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        self
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn store(&self) -> &PersistenceStore { &self.store }

    pub fn work_areas(&self) -> &WorkAreas { &self.work_areas }

    pub fn work_area(&self, monitor: MonitorId) -> Option<&WorkArea> { self.work_areas.get(&monitor) }

    /// Monitors left to right, top to bottom.
    pub fn monitor_order(&self) -> &[MonitorId] { &self.monitor_order }

    #[instrument(name = "zone_controller::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        use self::Event::*;
        match event {
            MonitorsChanged { monitors, virtual_desktop } => self.monitors_changed(monitors, virtual_desktop),
            MoveSizeStart { window, monitor, point } => {
                self.handler.move_size_start(&mut self.host, window, monitor, point, &mut self.work_areas)
            }
            MoveSizeUpdate { monitor, point } => {
                self.handler.move_size_update(&mut self.host, monitor, point, &mut self.work_areas)
            }
            MoveSizeEnd { window, point } => {
                let outcome = self.handler.move_size_end(&mut self.host, window, point, &mut self.work_areas);
                match outcome {
                    MoveSizeOutcome::Zoned { monitor, indices } => self.remember_zones(window, monitor, indices),
                    MoveSizeOutcome::Unzoned { monitor: Some(monitor) } => {
                        self.remember_zones(window, monitor, Vec::new())
                    }
                    MoveSizeOutcome::Unzoned { monitor: None }
                    | MoveSizeOutcome::Aborted
                    | MoveSizeOutcome::Ignored => {}
                }
            }
            CancelDrag => self.handler.cancel(&mut self.host, &mut self.work_areas),
            ModifiersChanged(modifiers) => self.handler.set_modifiers(modifiers),
            SecondaryMouseButton => self.handler.secondary_mouse_button(),
            WindowCreated(window) => self.restore_app_zone(window),
            MoveWindowToZone { window, index } => {
                let Some(monitor) = self.host.monitor_for_window(window) else {
                    return;
                };
                let Some(area) = self.work_areas.get_mut(&monitor) else {
                    return;
                };
                area.move_window_into_zone_by_index(&mut self.host, window, index);
                self.remember_current_zones(window, monitor);
            }
            MoveWindowByDirection { window, direction } => self.move_by_direction(window, direction),
            SetLayout { monitor, layout, zone_count } => {
                if layout == LayoutType::Custom {
                    warn!(?monitor, "custom layouts are applied by uuid");
                    return;
                }
                let zone_set = ZoneSetData::new(braced_upper(&Uuid::now_v7()), layout, zone_count);
                self.activate(monitor, zone_set);
            }
            ApplyCustomLayout { monitor, uuid } => {
                if self.store.custom_zone_set(&uuid).is_none() {
                    warn!(?monitor, %uuid, "unknown custom layout");
                    return;
                }
                self.activate(monitor, ZoneSetData::new(uuid, LayoutType::Custom, 0));
            }
            SaveLayoutAsCustom { monitor, name } => self.save_layout_as_custom(monitor, name),
            EditorClosed => self.import_editor_files(),
            ConfigUpdated(config) => {
                let issues = config.validate();
                if !issues.is_empty() {
                    warn!(?issues, "ignoring invalid config update");
                    return;
                }
                self.handler.update_settings(config.settings.clone());
                self.settings = config.settings;
                debug!("settings updated");
            }
        }
    }

    fn save(&mut self) {
        if let Err(err) = self.store.save() {
            error!(%err, "could not save zone data");
        }
    }

    fn default_device_info(&self) -> DeviceInfoData {
        let s = &self.settings;
        DeviceInfoData {
            spacing: s.default_spacing,
            zone_count: s.default_zone_count,
            sensitivity_radius: s.sensitivity_radius,
            ..DeviceInfoData::new(ZoneSetData::new(
                braced_upper(&Uuid::now_v7()),
                s.default_layout,
                s.default_zone_count,
            ))
        }
    }

    fn device_info(&self, key: &str) -> DeviceInfoData {
        self.store.device(key).cloned().unwrap_or_else(|| self.default_device_info())
    }

    fn monitors_changed(&mut self, monitors: Vec<MonitorInfo>, virtual_desktop: Uuid) {
        self.handler.cancel(&mut self.host, &mut self.work_areas);

        let mut ordered: Vec<(MonitorInfo, Rect)> = monitors
            .into_iter()
            .map(|m| {
                let bounds = m.bounds;
                (m, bounds)
            })
            .collect();
        order_monitors(&mut ordered);

        let mut previous = std::mem::take(&mut self.work_areas);
        self.monitor_order.clear();
        for (monitor, _) in ordered {
            let device = DeviceIdData::from_device_path(
                &monitor.device_path,
                monitor.bounds.width(),
                monitor.bounds.height(),
                virtual_desktop,
            );
            let area = match previous.remove(&monitor.id) {
                Some(area) if *area.device_id() == device && area.rect() == monitor.work_area => area,
                _ => self.materialize(monitor.id, device, monitor.work_area),
            };
            self.monitor_order.push(monitor.id);
            self.work_areas.insert(monitor.id, area);
        }
        info!(monitors = self.work_areas.len(), "work areas updated");
        if self.store.is_dirty() {
            self.save();
        }
    }

    fn materialize(&mut self, monitor: MonitorId, device: DeviceIdData, rect: Rect) -> WorkArea {
        let mut area = WorkArea::new(monitor, device, rect);
        let key = area.unique_id();
        let info = match self.store.device(&key) {
            Some(info) => info.clone(),
            None => {
                let info = self.default_device_info();
                self.store.set_device(key.clone(), info.clone());
                info
            }
        };
        if let Err(err) = area.update_active_zone_set(&info, &self.store.data().custom_zone_sets) {
            warn!(work_area = %key, %err, "no zone set for work area");
        }
        area
    }

    fn activate(&mut self, monitor: MonitorId, zone_set: ZoneSetData) {
        let Some(key) = self.work_areas.get(&monitor).map(WorkArea::unique_id) else {
            warn!(?monitor, "no work area for monitor");
            return;
        };
        let info = DeviceInfoData {
            active_zone_set: zone_set,
            ..self.device_info(&key)
        };
        let Some(area) = self.work_areas.get_mut(&monitor) else {
            return;
        };
        match area.update_active_zone_set(&info, &self.store.data().custom_zone_sets) {
            Ok(()) => {
                info!(work_area = %key, layout = %info.active_zone_set.layout_type, "layout applied");
                self.store.set_device(key, info);
                self.save();
            }
            Err(err) => warn!(work_area = %key, %err, "could not apply layout"),
        }
    }

    fn save_layout_as_custom(&mut self, monitor: MonitorId, name: String) {
        let Some(area) = self.work_areas.get_mut(&monitor) else {
            warn!(?monitor, "no work area for monitor");
            return;
        };
        let Some(clone) = area.active_zone_set().map(|set| set.make_custom_clone()) else {
            return;
        };
        let uuid = clone.uuid_string();
        let layout = clone.to_custom_layout();
        let key = area.unique_id();
        area.set_zone_set(Some(clone));

        self.store.set_custom_zone_set(uuid.clone(), CustomZoneSetData { name, layout });
        let info = DeviceInfoData {
            active_zone_set: ZoneSetData::new(uuid, LayoutType::Custom, 0),
            ..self.device_info(&key)
        };
        self.store.set_device(key, info);
        self.save();
    }

    fn import_editor_files(&mut self) {
        let mut changed = self.store.import_custom_zone_sets_tmp_file(&self.hand_off.custom_zone_sets);
        changed |= self.store.import_deleted_custom_zone_sets_tmp_file(&self.hand_off.deleted_custom_zone_sets);
        changed |= self.store.import_device_tmp_file(&self.hand_off.device);
        if !changed {
            return;
        }

        for area in self.work_areas.values_mut() {
            let key = area.unique_id();
            let Some(info) = self.store.device(&key) else {
                continue;
            };
            if let Err(err) = area.update_active_zone_set(info, &self.store.data().custom_zone_sets) {
                warn!(work_area = %key, %err, "could not apply edited layout");
            }
        }
        self.save();
    }

    fn move_by_direction(&mut self, window: WindowId, direction: Direction) {
        let cycle = self.settings.cycle_zones;
        let by_position = self.settings.move_windows_based_on_position;
        let Some(monitor) = self.host.monitor_for_window(window) else {
            return;
        };
        let Some(area) = self.work_areas.get_mut(&monitor) else {
            return;
        };
        let moved = area.move_window_into_zone_by_direction(&mut self.host, window, direction, cycle, by_position);
        debug!(?window, %direction, moved, "keyboard move");
        self.remember_current_zones(window, monitor);
    }

    fn remember_current_zones(&mut self, window: WindowId, monitor: MonitorId) {
        let indices = self
            .work_areas
            .get(&monitor)
            .and_then(WorkArea::active_zone_set)
            .map(|set| set.window_zone_indices(window))
            .unwrap_or_default();
        self.remember_zones(window, monitor, indices);
    }

    /// Updates the app history of `window`'s process. An empty `indices`
    /// forgets it.
    fn remember_zones(&mut self, window: WindowId, monitor: MonitorId, indices: Vec<usize>) {
        let Some(app_path) = self.host.process_path(window) else {
            return;
        };
        let Some(area) = self.work_areas.get(&monitor) else {
            return;
        };
        let Some(zone_set) = area.active_zone_set() else {
            return;
        };
        let device_id = area.unique_id();
        let zone_set_uuid = zone_set.uuid_string();
        if indices.is_empty() {
            self.store.remove_app_last_zone(&app_path, &device_id, &zone_set_uuid);
        } else {
            self.store.set_app_last_zone(
                app_path,
                AppZoneHistoryData {
                    zone_set_uuid,
                    device_id,
                    zone_index_set: indices,
                },
            );
        }
    }

    fn restore_app_zone(&mut self, window: WindowId) {
        if !is_candidate_for_zoning(&self.host, window, &self.settings.excluded_apps) {
            return;
        }
        let Some(app_path) = self.host.process_path(window) else {
            return;
        };
        let Some(monitor) = self.host.monitor_for_window(window) else {
            return;
        };
        let Some(area) = self.work_areas.get_mut(&monitor) else {
            return;
        };
        let device_id = area.unique_id();
        let Some(zone_set) = area.active_zone_set_mut() else {
            return;
        };
        let Some(indices) = self.store.app_last_zone(&app_path, &device_id, &zone_set.uuid_string()) else {
            return;
        };
        let placed = zone_set.move_window_into_zones(&mut self.host, window, indices);
        debug!(?window, %app_path, zones = ?placed, "restored app zone");
    }
}
