use crate::foundation::core::Point;

/// Inclusive integer rectangle `(x1, y1)..=(x2, y2)`.
///
/// Constructors normalize so that `x1 <= x2` and `y1 <= y2`. A one-pixel area has
/// `x1 == x2`. Empty results of set operations are expressed as `None`, never as an
/// inverted area.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Area {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Top edge (inclusive).
    pub y1: i32,
    /// Right edge (inclusive).
    pub x2: i32,
    /// Bottom edge (inclusive).
    pub y2: i32,
}

impl Area {
    /// Build a normalized area from two corners.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Area of `w x h` pixels with its top-left corner at `(x, y)`.
    ///
    /// `w` and `h` are clamped to at least one pixel.
    pub fn from_size(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x.saturating_add(w.max(1) - 1),
            y2: y.saturating_add(h.max(1) - 1),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.x2 - self.x1 + 1
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.y2 - self.y1 + 1
    }

    /// Number of pixels covered.
    pub fn size(&self) -> u64 {
        (self.width() as u64) * (self.height() as u64)
    }

    /// Keep `x1`, move `x2` so the width becomes `w` (at least one pixel).
    pub fn set_width(&mut self, w: i32) {
        self.x2 = self.x1 + w.max(1) - 1;
    }

    /// Keep `y1`, move `y2` so the height becomes `h` (at least one pixel).
    pub fn set_height(&mut self, h: i32) {
        self.y2 = self.y1 + h.max(1) - 1;
    }

    /// Shared region of two areas, `None` when they do not overlap.
    pub fn intersect(&self, other: &Area) -> Option<Area> {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x1 > x2 || y1 > y2 {
            return None;
        }
        Some(Area { x1, y1, x2, y2 })
    }

    /// Smallest area containing both inputs.
    pub fn union(&self, other: &Area) -> Area {
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Shift by `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Area {
        Area {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Grow (or shrink, with negative values) on every side.
    ///
    /// Returns `None` when shrinking would invert the area.
    pub fn grow(&self, dx: i32, dy: i32) -> Option<Area> {
        let a = Area {
            x1: self.x1 - dx,
            y1: self.y1 - dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        };
        (a.x1 <= a.x2 && a.y1 <= a.y2).then_some(a)
    }

    /// `true` when `p` lies inside (edges included).
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// `true` when `other` lies fully inside `self`.
    pub fn contains(&self, other: &Area) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    /// `true` when the two areas share at least one pixel.
    pub fn is_on(&self, other: &Area) -> bool {
        self.intersect(other).is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/area.rs"]
mod tests;
