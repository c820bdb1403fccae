use std::fmt;
use std::num::NonZeroU64;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::screen::MonitorId;

/// Opaque platform window handle.
///
/// The engine only stores and compares these; it never dereferences one. A
/// null handle is not representable, so lookups with "no window" are
/// expressed with `Option<WindowId>` at the edges.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowId(NonZeroU64);

impl WindowId {
    pub fn new(raw: u64) -> Option<WindowId> { NonZeroU64::new(raw).map(WindowId) }

    pub fn get(&self) -> u64 { self.0.get() }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "WindowId({:#x})", self.get()) }
}

bitflags! {
    /// Modifier state reported by the input hooks while a drag is in progress.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        /// Toggles drag-to-zone (shift).
        const DRAG = 1 << 0;
        /// Extends the selection over several zones (ctrl).
        const SELECT_MANY = 1 << 1;
    }
}

/// Alpha applied to the window being dragged: 50% of opaque.
pub const DRAGGED_WINDOW_ALPHA: u8 = ((255u32 * 50) / 100) as u8;

/// Bitmask attached to a zoned window: bit `id` is set for each zone id below 64.
pub fn zone_stamp(zone_ids: impl IntoIterator<Item = usize>) -> u64 {
    zone_ids
        .into_iter()
        .filter(|id| *id < u64::BITS as usize)
        .fold(0, |mask, id| mask | (1u64 << id))
}

/// Platform collaborator the engine drives windows through.
///
/// Implementations live outside the engine (OS bindings, the in-memory
/// virtual host). Queries take `&self`; anything that changes a window takes
/// `&mut self`.
pub trait WindowHost {
    /// Screen rect of the window, if it still exists.
    fn window_rect(&self, window: WindowId) -> Option<Rect>;
    fn monitor_for_window(&self, window: WindowId) -> Option<MonitorId>;
    fn process_path(&self, window: WindowId) -> Option<String>;

    /// Top-level, visible, non-tool, non-popup.
    fn is_standard_window(&self, window: WindowId) -> bool;
    fn has_no_visible_owner(&self, window: WindowId) -> bool;
    fn is_maximized(&self, window: WindowId) -> bool;
    fn is_process_elevated(&self, window: WindowId) -> bool;
    fn is_current_process_elevated(&self) -> bool;
    /// The cursor shape shows a resize rather than a move.
    fn cursor_indicates_resize(&self) -> bool;

    fn size_window_to_rect(&mut self, window: WindowId, rect: Rect);
    /// Remembers the current size unless one is already saved.
    fn save_window_size(&mut self, window: WindowId);
    /// Puts back the saved size and forgets it. No-op if nothing was saved.
    fn restore_window_size(&mut self, window: WindowId);
    fn forget_window_size(&mut self, window: WindowId);
    /// `0` clears the stamp.
    fn stamp_window(&mut self, window: WindowId, stamp: u64);
    fn set_window_alpha(&mut self, window: WindowId, alpha: u8);
    fn reset_window_alpha(&mut self, window: WindowId);

    /// One-time warning that an elevated window cannot be zoned.
    fn notify_cannot_drag_elevated(&mut self);
}

/// Whether `process_path` matches any entry of the exclusion list.
pub fn is_excluded_app(process_path: &str, excluded_apps: &[String]) -> bool {
    let path = process_path.to_uppercase();
    excluded_apps
        .iter()
        .map(|app| app.trim())
        .filter(|app| !app.is_empty())
        .any(|app| path.contains(&app.to_uppercase()))
}

/// Zonability filter applied when a drag starts.
pub fn is_candidate_for_zoning(
    host: &impl WindowHost,
    window: WindowId,
    excluded_apps: &[String],
) -> bool {
    if !host.is_standard_window(window) {
        return false;
    }
    match host.process_path(window) {
        Some(path) => !is_excluded_app(&path, excluded_apps),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_window_is_unrepresentable() {
        assert!(WindowId::new(0).is_none());
        assert_eq!(WindowId::new(7).map(|w| w.get()), Some(7));
    }

    #[test]
    fn stamp_sets_bits_for_small_ids() {
        assert_eq!(zone_stamp([1, 3]), 0b1010);
        assert_eq!(zone_stamp([64, 1]), 0b10);
        assert_eq!(zone_stamp(std::iter::empty()), 0);
    }

    #[test]
    fn exclusion_is_case_insensitive_substring() {
        let excluded = vec!["notepad.exe".to_string(), "  ".to_string()];
        assert!(is_excluded_app(r"C:\Windows\NOTEPAD.EXE", &excluded));
        assert!(!is_excluded_app(r"C:\Windows\explorer.exe", &excluded));
        assert!(!is_excluded_app("anything", &[]));
    }

    #[test]
    fn dragged_alpha_is_half() {
        assert_eq!(DRAGGED_WINDOW_ALPHA, 127);
    }
}
