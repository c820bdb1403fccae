use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::geometry::Rect;

/// Opaque platform monitor handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MonitorId(u64);

impl MonitorId {
    pub const fn new(raw: u64) -> MonitorId { MonitorId(raw) }

    pub fn get(&self) -> u64 { self.0 }
}

impl fmt::Debug for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "MonitorId({:#x})", self.0) }
}

/// What the platform reports for one monitor on the current virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub id: MonitorId,
    /// Full monitor bounds in screen coordinates.
    pub bounds: Rect,
    /// Usable area (taskbars excluded) in screen coordinates.
    pub work_area: Rect,
    /// Raw platform device path, e.g. `\\?\DISPLAY#DELA026#5&10a58c63&0&UID16777488#{...}`.
    pub device_path: String,
}

pub const FALLBACK_DEVICE: &str = "FallbackDevice";

/// Keeps the unique part of a device path: everything between the first and
/// the last `#`.
pub fn trim_device_id(device_path: &str) -> String {
    match (device_path.find('#'), device_path.rfind('#')) {
        (Some(start), Some(end)) if start != end => device_path[start + 1..end].to_string(),
        _ => FALLBACK_DEVICE.to_string(),
    }
}

/// Orders monitors left-to-right, top-to-bottom.
///
/// Monitor `i` blocks `j` when it sits above and to the left of `j` with some
/// overlap. The result is a greedy topological sort over that relation,
/// breaking ties by `(top, left)`. Cyclic or degenerate inputs fall back to all
/// unplaced monitors so the sort always terminates.
pub fn order_monitors<T>(monitors: &mut Vec<(T, Rect)>) {
    let n = monitors.len();
    if n < 2 {
        return;
    }

    let mut blocking = vec![vec![false; n]; n];
    let mut blocking_count = vec![0usize; n];
    for i in 0..n {
        for j in 0..n {
            let (a, b) = (&monitors[i].1, &monitors[j].1);
            if i != j && a.top < b.bottom && a.left < b.right {
                blocking[i][j] = true;
                blocking_count[j] += 1;
            }
        }
    }

    let mut used = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let mut candidates: Vec<usize> =
            (0..n).filter(|&i| !used[i] && blocking_count[i] == 0).collect();
        if candidates.is_empty() {
            candidates = (0..n).filter(|&i| !used[i]).collect();
        }

        let key = |i: usize| (monitors[i].1.top, monitors[i].1.left);
        let Some(smallest) = candidates.into_iter().reduce(|best, i| if key(i) < key(best) { i } else { best })
        else {
            break;
        };

        used[smallest] = true;
        order.push(smallest);
        for j in 0..n {
            if blocking[smallest][j] {
                blocking_count[j] = blocking_count[j].saturating_sub(1);
            }
        }
    }
    trace!(?order, "ordered monitors");

    let mut slots: Vec<Option<(T, Rect)>> = monitors.drain(..).map(Some).collect();
    monitors.extend(order.into_iter().filter_map(|i| slots[i].take()));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ordered(rects: &[Rect]) -> Vec<usize> {
        let mut monitors: Vec<(usize, Rect)> = rects.iter().copied().enumerate().collect();
        order_monitors(&mut monitors);
        monitors.into_iter().map(|(i, _)| i).collect()
    }

    #[test]
    fn side_by_side_is_left_to_right() {
        let rects = [
            Rect::new(1920, 0, 3840, 1080),
            Rect::new(0, 0, 1920, 1080),
            Rect::new(-1280, 0, 0, 1024),
        ];
        assert_eq!(ordered(&rects), vec![2, 1, 0]);
    }

    #[test]
    fn stacked_is_top_to_bottom() {
        let rects = [Rect::new(0, 1080, 1920, 2160), Rect::new(0, 0, 1920, 1080)];
        assert_eq!(ordered(&rects), vec![1, 0]);
    }

    #[test]
    fn blocking_monitor_comes_first() {
        // The tall left monitor starts lower than the right one but overlaps
        // it vertically, so it still blocks it.
        let rects = [Rect::new(1920, 0, 3840, 1080), Rect::new(0, 200, 1920, 1280)];
        assert_eq!(ordered(&rects), vec![1, 0]);
    }

    #[test]
    fn identical_rects_terminate() {
        let r = Rect::new(0, 0, 100, 100);
        let order = ordered(&[r, r, r]);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn result_is_a_topological_order() {
        let rects = [
            Rect::new(0, 500, 800, 1100),
            Rect::new(800, 0, 1600, 600),
            Rect::new(1600, 300, 2400, 900),
            Rect::new(0, -600, 800, 0),
        ];
        let order = ordered(&rects);
        let pos = |i: usize| order.iter().position(|&o| o == i).unwrap();
        for (i, a) in rects.iter().enumerate() {
            for (j, b) in rects.iter().enumerate() {
                let strictly_blocks = i != j
                    && a.top < b.bottom
                    && a.left < b.right
                    && !(b.top < a.bottom && b.left < a.right);
                if strictly_blocks {
                    assert!(pos(i) < pos(j), "{i} should precede {j} in {order:?}");
                }
            }
        }
    }

    #[test]
    fn trims_device_path() {
        assert_eq!(
            trim_device_id(r"\\?\DISPLAY#DELA026#5&10a58c63&0&UID16777488#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}"),
            "DELA026#5&10a58c63&0&UID16777488"
        );
        assert_eq!(trim_device_id(""), FALLBACK_DEVICE);
        assert_eq!(trim_device_id("no-hash"), FALLBACK_DEVICE);
        assert_eq!(trim_device_id("one#only"), FALLBACK_DEVICE);
        assert_eq!(trim_device_id(r"\\?\DISPLAY#LOCALDISPLAY#"), "LOCALDISPLAY");
    }
}
