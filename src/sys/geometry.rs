use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }

    pub fn offset(self, dx: i32, dy: i32) -> Self { Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self { Self { width, height } }

    pub fn is_portrait(self) -> bool { self.height > self.width }
}

/// Edge-based rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Far edges saturate at the `i32` range.
    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// A rect of the given size anchored at the origin.
    pub const fn from_size(size: Size) -> Self { Self::new(0, 0, size.width, size.height) }

    pub fn width(&self) -> i32 { self.right.saturating_sub(self.left) }

    pub fn height(&self) -> i32 { self.bottom.saturating_sub(self.top) }

    pub fn size(&self) -> Size { Size::new(self.width(), self.height()) }

    pub fn origin(&self) -> Point { Point::new(self.left, self.top) }

    pub fn area(&self) -> i64 {
        (i64::from(self.right) - i64::from(self.left)).saturating_mul(i64::from(self.bottom) - i64::from(self.top))
    }

    /// Zero-sized and inverted rects are empty and never hit-test.
    pub fn is_empty(&self) -> bool { self.right <= self.left || self.bottom <= self.top }

    pub fn is_normalized(&self) -> bool { self.right >= self.left && self.bottom >= self.top }

    pub fn normalized(&self) -> Rect {
        Rect::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, pt: Point) -> bool {
        self.left <= pt.x && pt.x < self.right && self.top <= pt.y && pt.y < self.bottom
    }

    /// Closed containment grown by `radius` on every side.
    pub fn contains_within(&self, pt: Point, radius: i32) -> bool {
        self.left.saturating_sub(radius) <= pt.x
            && pt.x <= self.right.saturating_add(radius)
            && self.top.saturating_sub(radius) <= pt.y
            && pt.y <= self.bottom.saturating_add(radius)
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.left <= other.left
            && other.right <= self.right
            && self.top <= other.top
            && other.bottom <= self.bottom
    }

    /// True when the two rects share more than `slack` pixels on both axes.
    pub fn overlaps(&self, other: &Rect, slack: i32) -> bool {
        self.top.max(other.top).saturating_add(slack) < self.bottom.min(other.bottom)
            && self.left.max(other.left).saturating_add(slack) < self.right.min(other.right)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
        )
    }

    /// Re-expresses a screen rect relative to `origin`.
    pub fn relative_to(&self, origin: Point) -> Rect { self.offset(origin.x.saturating_neg(), origin.y.saturating_neg()) }

    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * f64::from(self.left) + 0.5 * f64::from(self.right),
            0.5 * f64::from(self.top) + 0.5 * f64::from(self.bottom),
        )
    }
}

/// Bounding rect of every rect yielded, or `None` for an empty iterator.
pub fn bounding_rect<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    rects.into_iter().fold(None, |acc, r| match acc {
        None => Some(*r),
        Some(b) => Some(b.union(r)),
    })
}
