/*
 * Geometry Module
 *
 * Axis-aligned rectangles in centre + full-extent form, and the toroidal
 * helpers every steering and collision calculation goes through.
 */

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle: centre (x, y) plus full width and height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Square window of half-size `r` around `centre`
    pub fn around(centre: DVec2, r: f64) -> Self {
        Self::new(centre.x, centre.y, 2.0 * r, 2.0 * r)
    }

    pub fn from_corners(min: DVec2, max: DVec2) -> Self {
        let centre = (min + max) * 0.5;
        Self::new(centre.x, centre.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x - self.w / 2.0, self.y - self.h / 2.0)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Boundary-inclusive point test
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        let hw = self.w / 2.0;
        let hh = self.h / 2.0;
        point.x >= self.x - hw
            && point.x <= self.x + hw
            && point.y >= self.y - hh
            && point.y <= self.y + hh
    }

    /// Boundary-inclusive AABB overlap; touching edges count
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x - other.w / 2.0 > self.x + self.w / 2.0
            || other.x + other.w / 2.0 < self.x - self.w / 2.0
            || other.y - other.h / 2.0 > self.y + self.h / 2.0
            || other.y + other.h / 2.0 < self.y - self.h / 2.0)
    }

    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }
}

/// Per-axis toroidal wrap flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wrap {
    pub x: bool,
    pub y: bool,
}

impl Wrap {
    pub const BOTH: Wrap = Wrap { x: true, y: true };
    pub const NONE: Wrap = Wrap { x: false, y: false };

    pub fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }
}

#[inline]
fn shortest(d: f64, extent: f64, wraps: bool) -> f64 {
    if wraps && d.abs() > extent / 2.0 {
        d - d.signum() * extent
    } else {
        d
    }
}

/// Shortest `a - b` on the torus described by `size` and `wrap`
#[inline]
pub fn toroidal_delta(a: DVec2, b: DVec2, size: DVec2, wrap: Wrap) -> DVec2 {
    DVec2::new(
        shortest(a.x - b.x, size.x, wrap.x),
        shortest(a.y - b.y, size.y, wrap.y),
    )
}

#[inline]
pub fn toroidal_distance(a: DVec2, b: DVec2, size: DVec2, wrap: Wrap) -> f64 {
    toroidal_delta(a, b, size, wrap).length()
}

/// Fold a position back into the domain on wrapping axes only
pub fn wrap_position(p: DVec2, size: DVec2, wrap: Wrap) -> DVec2 {
    DVec2::new(
        if wrap.x { p.x.rem_euclid(size.x) } else { p.x },
        if wrap.y { p.y.rem_euclid(size.y) } else { p.y },
    )
}

/// Domain extent plus wrap flags; the frame every agent-to-agent delta is taken in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    pub size: DVec2,
    pub wrap: Wrap,
}

impl Torus {
    pub fn new(width: f64, height: f64, wrap: Wrap) -> Self {
        Self {
            size: DVec2::new(width, height),
            wrap,
        }
    }

    #[inline]
    pub fn delta(&self, a: DVec2, b: DVec2) -> DVec2 {
        toroidal_delta(a, b, self.size, self.wrap)
    }

    #[inline]
    pub fn distance(&self, a: DVec2, b: DVec2) -> f64 {
        self.delta(a, b).length()
    }

    pub fn wrap_position(&self, p: DVec2) -> DVec2 {
        wrap_position(p, self.size, self.wrap)
    }

    /// The whole domain as a rectangle
    pub fn rect(&self) -> Rect {
        Rect::new(self.size.x / 2.0, self.size.y / 2.0, self.size.x, self.size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_boundary_inclusive() {
        let r = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert!(r.contains(DVec2::new(0.0, 0.0)));
        assert!(r.contains(DVec2::new(100.0, 100.0)));
        assert!(r.contains(DVec2::new(50.0, 100.0)));
        assert!(!r.contains(DVec2::new(100.000001, 50.0)));
        assert!(!r.contains(DVec2::new(-0.5, 50.0)));
    }

    #[test]
    fn touching_rectangles_intersect() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(2.0, 0.0, 2.0, 2.0);
        let c = Rect::new(2.5, 0.0, 0.5, 2.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn wrapped_axis_takes_short_way_round() {
        let size = DVec2::new(100.0, 100.0);
        let a = DVec2::new(1.0, 50.0);
        let b = DVec2::new(99.0, 50.0);
        let d = toroidal_delta(a, b, size, Wrap::new(true, false));
        assert_eq!(d.x, 2.0);
        assert_eq!(d.y, 0.0);
        assert_eq!(toroidal_delta(b, a, size, Wrap::BOTH).x, -2.0);
    }

    #[test]
    fn unwrapped_axis_keeps_raw_delta() {
        let size = DVec2::new(100.0, 100.0);
        let a = DVec2::new(1.0, 1.0);
        let b = DVec2::new(99.0, 99.0);
        let d = toroidal_delta(a, b, size, Wrap::new(false, true));
        assert_eq!(d.x, -98.0);
        assert_eq!(d.y, 2.0);
    }

    #[test]
    fn wrap_position_folds_only_wrapping_axes() {
        let size = DVec2::new(100.0, 50.0);
        let p = wrap_position(DVec2::new(-3.0, 60.0), size, Wrap::new(true, false));
        assert_eq!(p, DVec2::new(97.0, 60.0));
        let q = wrap_position(DVec2::new(104.0, -1.0), size, Wrap::BOTH);
        assert_eq!(q, DVec2::new(4.0, 49.0));
    }
}
