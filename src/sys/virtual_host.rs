//! An in-memory [`WindowHost`]. Drives the replay tool and the tests.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::geometry::Rect;
use super::screen::MonitorId;
use super::window::{WindowHost, WindowId};
use crate::common::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualWindow {
    pub rect: Rect,
    pub monitor: Option<MonitorId>,
    #[serde(default)]
    pub process_path: Option<String>,
    #[serde(default = "yes")]
    pub standard: bool,
    #[serde(default = "yes")]
    pub no_visible_owner: bool,
    #[serde(default)]
    pub maximized: bool,
    #[serde(default)]
    pub elevated: bool,
    #[serde(default)]
    pub saved_rect: Option<Rect>,
    #[serde(default)]
    pub stamp: u64,
    #[serde(default)]
    pub alpha: Option<u8>,
}

impl VirtualWindow {
    pub fn new(rect: Rect, monitor: MonitorId) -> Self {
        Self {
            rect,
            monitor: Some(monitor),
            process_path: None,
            standard: true,
            no_visible_owner: true,
            maximized: false,
            elevated: false,
            saved_rect: None,
            stamp: 0,
            alpha: None,
        }
    }

    pub fn with_process_path(mut self, path: impl Into<String>) -> Self {
        self.process_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualHost {
    #[serde(default)]
    pub windows: BTreeMap<WindowId, VirtualWindow>,
    #[serde(default)]
    pub elevated: bool,
    #[serde(default)]
    pub resize_cursor: bool,
    #[serde(skip)]
    pub elevated_warnings: usize,
}

impl VirtualHost {
    pub fn new() -> Self { Self::default() }

    pub fn add_window(&mut self, window: WindowId, state: VirtualWindow) {
        self.windows.insert(window, state);
    }

    pub fn window(&self, window: WindowId) -> Option<&VirtualWindow> { self.windows.get(&window) }

    pub fn window_mut(&mut self, window: WindowId) -> Option<&mut VirtualWindow> {
        self.windows.get_mut(&window)
    }
}

impl WindowHost for VirtualHost {
    fn window_rect(&self, window: WindowId) -> Option<Rect> { self.window(window).map(|w| w.rect) }

    fn monitor_for_window(&self, window: WindowId) -> Option<MonitorId> {
        self.window(window).and_then(|w| w.monitor)
    }

    fn process_path(&self, window: WindowId) -> Option<String> {
        self.window(window).and_then(|w| w.process_path.clone())
    }

    fn is_standard_window(&self, window: WindowId) -> bool {
        self.window(window).is_some_and(|w| w.standard)
    }

    fn has_no_visible_owner(&self, window: WindowId) -> bool {
        self.window(window).is_some_and(|w| w.no_visible_owner)
    }

    fn is_maximized(&self, window: WindowId) -> bool {
        self.window(window).is_some_and(|w| w.maximized)
    }

    fn is_process_elevated(&self, window: WindowId) -> bool {
        self.window(window).is_some_and(|w| w.elevated)
    }

    fn is_current_process_elevated(&self) -> bool { self.elevated }

    fn cursor_indicates_resize(&self) -> bool { self.resize_cursor }

    fn size_window_to_rect(&mut self, window: WindowId, rect: Rect) {
        if let Some(w) = self.window_mut(window) {
            trace!(?window, ?rect, "size window");
            w.rect = rect;
            w.maximized = false;
        }
    }

    fn save_window_size(&mut self, window: WindowId) {
        if let Some(w) = self.window_mut(window) {
            w.saved_rect.get_or_insert(w.rect);
        }
    }

    fn restore_window_size(&mut self, window: WindowId) {
        if let Some(w) = self.window_mut(window) {
            if let Some(saved) = w.saved_rect.take() {
                // Size comes back, position stays where the window was dropped.
                w.rect = Rect::from_origin_size(w.rect.left, w.rect.top, saved.width(), saved.height());
            }
        }
    }

    fn forget_window_size(&mut self, window: WindowId) {
        if let Some(w) = self.window_mut(window) {
            w.saved_rect = None;
        }
    }

    fn stamp_window(&mut self, window: WindowId, stamp: u64) {
        if let Some(w) = self.window_mut(window) {
            w.stamp = stamp;
        }
    }

    fn set_window_alpha(&mut self, window: WindowId, alpha: u8) {
        if let Some(w) = self.window_mut(window) {
            w.alpha = Some(alpha);
        }
    }

    fn reset_window_alpha(&mut self, window: WindowId) {
        if let Some(w) = self.window_mut(window) {
            w.alpha = None;
        }
    }

    fn notify_cannot_drag_elevated(&mut self) { self.elevated_warnings += 1; }
}

fn yes() -> bool { true }
