//! Keyboard navigation between zones by geometric position.
//!
//! Candidates are scored by projecting the vector from the window center to
//! each zone center onto the arrow direction and dividing by how far an ellipse
//! stretched along that direction reaches at the candidate's angle. Zones
//! straight ahead win over closer zones that sit off to the side.

use tracing::trace;

use super::graph::Direction;
use crate::sys::geometry::Rect;

/// Stretch of the scoring ellipse along the direction of travel.
const ECCENTRICITY: f64 = 2.0;
/// Candidates more than ~84 degrees off-axis are never chosen.
const MAX_TAN: f64 = 10.0;
/// Per-index nudge so overlapping zones with equal centers stay ordered.
const TIE_BREAK_STEP: f64 = 0.001;

/// Picks the zone to move to when pressing `direction` with the window at
/// `window_rect`. Returns an index into `zone_rects`.
pub fn choose_next_zone_by_position(
    direction: Direction,
    window_rect: &Rect,
    zone_rects: &[Rect],
) -> Option<usize> {
    let (wx, wy) = window_rect.center();
    let (dx, dy) = direction.unit_vector();

    let mut best: Option<(usize, f64)> = None;
    for (i, zone) in zone_rects.iter().enumerate() {
        let (cx, cy) = zone.center();
        let vx = cx + TIE_BREAK_STEP * (i + 1) as f64 - wx;
        let vy = cy - wy;

        let Some(score) = score_candidate(vx, vy, dx, dy) else {
            continue;
        };
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((i, score));
        }
    }

    trace!(?direction, ?best, "navigation candidate");
    best.map(|(i, _)| i)
}

fn score_candidate(vx: f64, vy: f64, dx: f64, dy: f64) -> Option<f64> {
    let dot = vx * dx + vy * dy;
    if dot <= 0.0 {
        return None;
    }

    let len = vx.hypot(vy);
    let cos = (dot / len).clamp(-1.0, 1.0);
    let tan = cos.acos().tan().abs();
    if !tan.is_finite() || tan > MAX_TAN {
        return None;
    }

    let e2 = ECCENTRICITY * ECCENTRICITY;
    let intersect = 2.0 * ECCENTRICITY / (1.0 + e2 * tan * tan);
    let score = dot / intersect;
    score.is_finite().then_some(score)
}

/// Moves `window_rect` one work-area extent against `direction`, so a second
/// navigation attempt wraps around to the far side of the work area.
pub fn prepare_rect_for_cycling(window_rect: Rect, work_area: Rect, direction: Direction) -> Rect {
    let (w, h) = (work_area.width(), work_area.height());
    match direction {
        Direction::Up => window_rect.offset(0, h),
        Direction::Down => window_rect.offset(0, -h),
        Direction::Left => window_rect.offset(w, 0),
        Direction::Right => window_rect.offset(-w, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Rect> {
        vec![
            Rect::new(0, 0, 100, 100),
            Rect::new(100, 0, 200, 100),
            Rect::new(200, 0, 300, 100),
        ]
    }

    #[test]
    fn picks_nearest_in_direction() {
        let zones = columns();
        let window = zones[1];
        assert_eq!(choose_next_zone_by_position(Direction::Right, &window, &zones), Some(2));
        assert_eq!(choose_next_zone_by_position(Direction::Left, &window, &zones), Some(0));
    }

    #[test]
    fn nothing_behind_or_orthogonal() {
        let zones = columns();
        assert_eq!(choose_next_zone_by_position(Direction::Right, &zones[2], &zones), None);
        assert_eq!(choose_next_zone_by_position(Direction::Up, &zones[1], &zones), None);
        assert_eq!(choose_next_zone_by_position(Direction::Down, &zones[1], &[]), None);
    }

    #[test]
    fn prefers_aligned_over_closer_diagonal() {
        let window = Rect::new(0, 0, 100, 100);
        let zones = [
            // Close, but 45 degrees off-axis.
            Rect::new(100, 100, 200, 200),
            // Further away, straight to the right.
            Rect::new(250, 0, 350, 100),
        ];
        assert_eq!(choose_next_zone_by_position(Direction::Right, &window, &zones), Some(1));
    }

    #[test]
    fn equal_centers_prefer_first() {
        let window = Rect::new(0, 0, 100, 100);
        let zone = Rect::new(200, 0, 300, 100);
        assert_eq!(choose_next_zone_by_position(Direction::Right, &window, &[zone, zone]), Some(0));
    }

    #[test]
    fn cycling_shifts_against_direction() {
        let work_area = Rect::new(0, 0, 300, 200);
        let window = Rect::new(200, 0, 300, 100);
        let shifted = prepare_rect_for_cycling(window, work_area, Direction::Right);
        assert_eq!(shifted, Rect::new(-100, 0, 0, 100));
        assert_eq!(choose_next_zone_by_position(Direction::Right, &shifted, &columns()), Some(0));
        assert_eq!(
            prepare_rect_for_cycling(window, work_area, Direction::Up),
            Rect::new(200, 200, 300, 300)
        );
    }
}
