//! Drag sessions: from the first move/size notification of a window to the
//! matching end notification.

use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::ZoneSettings;
use crate::model::WorkArea;
use crate::sys::geometry::Point;
use crate::sys::screen::MonitorId;
use crate::sys::window::{DRAGGED_WINDOW_ALPHA, Modifiers, WindowHost, WindowId, is_candidate_for_zoning};

pub type WorkAreas = HashMap<MonitorId, WorkArea>;

/// Window shape at drag start, compared again at drop to detect a browser
/// tab being merged back into another window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowSnapshot {
    standard: bool,
    no_visible_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DragSession {
    window: WindowId,
    origin_monitor: MonitorId,
    /// Work area currently highlighting zones for this drag. `None` while
    /// snapping is disabled.
    tracking: Option<MonitorId>,
    drag_enabled: bool,
    snapshot: WindowSnapshot,
    transparent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveSizeOutcome {
    /// Not the dragged window, or no drag in progress.
    Ignored,
    /// Dropped with snapping on. `indices` is empty when the drop missed
    /// every zone.
    Zoned { monitor: MonitorId, indices: Vec<usize> },
    /// The window maximized or stopped being a top-level window mid-drag.
    Aborted,
    /// Dropped with snapping off.
    Unzoned { monitor: Option<MonitorId> },
}

pub struct WindowMoveHandler {
    settings: ZoneSettings,
    state: DragState,
    modifiers: Modifiers,
    mouse_toggle: bool,
    elevated_warning_shown: bool,
}

impl WindowMoveHandler {
    pub fn new(settings: ZoneSettings) -> Self {
        Self {
            settings,
            state: DragState::Idle,
            modifiers: Modifiers::empty(),
            mouse_toggle: false,
            elevated_warning_shown: false,
        }
    }

    pub fn update_settings(&mut self, settings: ZoneSettings) { self.settings = settings; }

    pub fn is_dragging(&self) -> bool { matches!(self.state, DragState::Dragging(_)) }

    pub fn dragged_window(&self) -> Option<WindowId> {
        match &self.state {
            DragState::Dragging(session) => Some(session.window),
            DragState::Idle => None,
        }
    }

    pub fn origin_monitor(&self) -> Option<MonitorId> {
        match &self.state {
            DragState::Dragging(session) => Some(session.origin_monitor),
            DragState::Idle => None,
        }
    }

    /// Whether zones are currently being highlighted for the drag.
    pub fn is_drag_enabled(&self) -> bool {
        matches!(&self.state, DragState::Dragging(session) if session.drag_enabled)
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) { self.modifiers = modifiers; }

    /// A secondary mouse button went down. Flips snapping when
    /// `mouse_switch` is on and a drag is in progress.
    pub fn secondary_mouse_button(&mut self) {
        if self.settings.mouse_switch && self.is_dragging() {
            self.mouse_toggle = !self.mouse_toggle;
        }
    }

    fn drag_enabled_now(&self) -> bool {
        let toggled = self.modifiers.contains(Modifiers::DRAG) ^ self.mouse_toggle;
        if self.settings.shift_drag { toggled } else { !toggled }
    }

    fn select_many(&self) -> bool { self.modifiers.contains(Modifiers::SELECT_MANY) }

    /// True when the window runs elevated and we do not; warns once.
    fn elevation_blocks(&mut self, host: &mut impl WindowHost, window: WindowId) -> bool {
        if host.is_current_process_elevated() || !host.is_process_elevated(window) {
            return false;
        }
        if !self.elevated_warning_shown && self.settings.warn_on_elevated_drag {
            warn!(?window, "cannot snap a window running elevated");
            host.notify_cannot_drag_elevated();
            self.elevated_warning_shown = true;
        }
        true
    }

    pub fn move_size_start(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        monitor: MonitorId,
        pt: Point,
        work_areas: &mut WorkAreas,
    ) {
        if !is_candidate_for_zoning(host, window, &self.settings.excluded_apps) || host.cursor_indicates_resize() {
            trace!(?window, "not a zoning candidate");
            return;
        }
        let snapshot = WindowSnapshot {
            standard: host.is_standard_window(window),
            no_visible_owner: host.has_no_visible_owner(window),
        };
        self.state = DragState::Dragging(DragSession {
            window,
            origin_monitor: monitor,
            tracking: None,
            drag_enabled: false,
            snapshot,
            transparent: false,
        });
        debug!(?window, ?monitor, ?pt, "drag started");
        self.begin_tracking(host, monitor, work_areas);
    }

    /// Starts highlighting on `monitor` if snapping is enabled. Shared by a
    /// fresh drag and by a drag whose snapping was switched on midway.
    fn begin_tracking(&mut self, host: &mut impl WindowHost, monitor: MonitorId, work_areas: &mut WorkAreas) {
        let Some(window) = self.dragged_window() else {
            return;
        };
        if !work_areas.contains_key(&monitor) {
            return;
        }
        let blocked = self.elevation_blocks(host, window);
        let enabled = self.drag_enabled_now() && !blocked;
        let show_all = self.settings.show_zones_on_all_monitors;
        let transparent = self.settings.make_dragged_window_transparent;

        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        session.drag_enabled = enabled;
        if enabled {
            if transparent && !session.transparent {
                host.set_window_alpha(window, DRAGGED_WINDOW_ALPHA);
                session.transparent = true;
            }
            session.tracking = Some(monitor);
            if let Some(area) = work_areas.get_mut(&monitor) {
                area.move_size_enter(window);
            }
            if show_all {
                work_areas.iter_mut().filter(|(id, _)| **id != monitor).for_each(|(_, area)| area.show());
            }
        } else if session.tracking.take().is_some() {
            Self::stop_highlighting(host, session, work_areas);
        }
    }

    fn stop_highlighting(host: &mut impl WindowHost, session: &mut DragSession, work_areas: &mut WorkAreas) {
        if std::mem::take(&mut session.transparent) {
            host.reset_window_alpha(session.window);
        }
        work_areas.values_mut().for_each(WorkArea::hide);
    }

    /// Cursor moved to `pt` (screen coordinates) over `monitor`.
    pub fn move_size_update(
        &mut self,
        host: &mut impl WindowHost,
        monitor: MonitorId,
        pt: Point,
        work_areas: &mut WorkAreas,
    ) {
        let enabled = self.drag_enabled_now();
        let select_many = self.select_many();
        let show_all = self.settings.show_zones_on_all_monitors;
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };

        let tracking = session.tracking;
        match tracking {
            Some(_) if !enabled => {
                debug!(window = ?session.window, "snapping switched off");
                session.tracking = None;
                session.drag_enabled = false;
                Self::stop_highlighting(host, session, work_areas);
            }
            Some(tracked) => {
                if !work_areas.contains_key(&monitor) {
                    return;
                }
                if tracked != monitor {
                    trace!(from = ?tracked, to = ?monitor, "drag crossed monitors");
                    if let Some(previous) = work_areas.get_mut(&tracked) {
                        previous.clear_selected_zones();
                        if !show_all {
                            previous.hide();
                        }
                    }
                    if let Some(next) = work_areas.get_mut(&monitor) {
                        next.move_size_enter(session.window);
                    }
                    session.tracking = Some(monitor);
                }
                for area in work_areas.values_mut() {
                    area.move_size_update(pt, true, select_many);
                }
            }
            None if enabled => {
                self.begin_tracking(host, monitor, work_areas);
                // Still off if the window turned out to be elevated.
                if self.is_drag_enabled() {
                    self.move_size_update(host, monitor, pt, work_areas);
                }
            }
            None => {}
        }
    }

    /// Drop of `window` at `pt` (screen coordinates).
    pub fn move_size_end(
        &mut self,
        host: &mut impl WindowHost,
        window: WindowId,
        pt: Point,
        work_areas: &mut WorkAreas,
    ) -> MoveSizeOutcome {
        if self.dragged_window() != Some(window) {
            return MoveSizeOutcome::Ignored;
        }
        let DragState::Dragging(mut session) = std::mem::take(&mut self.state) else {
            return MoveSizeOutcome::Ignored;
        };
        self.mouse_toggle = false;

        let outcome = match session.tracking {
            Some(monitor) => {
                if std::mem::take(&mut session.transparent) {
                    host.reset_window_alpha(window);
                }
                let merged_tab = !host.is_standard_window(window)
                    && host.has_no_visible_owner(window)
                    && session.snapshot.standard
                    && session.snapshot.no_visible_owner;
                if merged_tab || host.is_maximized(window) {
                    debug!(?window, merged_tab, "drop aborted");
                    MoveSizeOutcome::Aborted
                } else {
                    match work_areas.get_mut(&monitor).and_then(|area| area.move_size_end(host, window, pt)) {
                        Some(indices) => MoveSizeOutcome::Zoned { monitor, indices },
                        None => MoveSizeOutcome::Aborted,
                    }
                }
            }
            None => {
                if self.settings.restore_size {
                    if host.cursor_indicates_resize() {
                        host.forget_window_size(window);
                    } else if !host.is_maximized(window) {
                        host.restore_window_size(window);
                    }
                }
                host.stamp_window(window, 0);
                MoveSizeOutcome::Unzoned { monitor: host.monitor_for_window(window) }
            }
        };

        work_areas.values_mut().for_each(WorkArea::hide);
        debug!(?window, ?outcome, "drag ended");
        outcome
    }

    /// Abandons the drag without placing the window.
    pub fn cancel(&mut self, host: &mut impl WindowHost, work_areas: &mut WorkAreas) {
        if let DragState::Dragging(mut session) = std::mem::take(&mut self.state) {
            debug!(window = ?session.window, "drag cancelled");
            Self::stop_highlighting(host, &mut session, work_areas);
        }
        self.mouse_toggle = false;
    }
}
