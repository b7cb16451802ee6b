/// Grid ↔ world coordinate mapping.
///
/// Level layouts are authored on a half-tile grid so walls and floor
/// segments can sit on tile boundaries while characters stand on tile
/// centers. The mapping is the affine function
///
///   world = (2 + grid) * tile_size / 2
///
/// on both axes. The `2 +` offset skips the perimeter wall column/row,
/// so grid (0, 0) is the center of the first interior tile. World space is
/// y-down.

use std::ops::RangeInclusive;

use serde::Deserialize;

/// Logical position on the half-tile level grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        GridCoord { x, y }
    }
}

/// Continuous world-space position (entity center).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub const fn new(x: f64, y: f64) -> Self {
        WorldPos { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        WorldPos { x: self.x + dx, y: self.y + dy }
    }
}

/// Map a grid coordinate to the world position of its center.
/// Total over all integers; never clamps.
#[inline]
pub fn map_to_world(coord: GridCoord, tile_size: u32) -> WorldPos {
    let t = tile_size as f64;
    let axis = |v: i32| (2 + v as i64) as f64 * t / 2.0;
    WorldPos { x: axis(coord.x), y: axis(coord.y) }
}

/// Inverse of [`map_to_world`]. Exact for any position produced by it.
#[inline]
pub fn world_to_grid(pos: WorldPos, tile_size: u32) -> GridCoord {
    let t = tile_size as f64;
    let axis = |v: f64| ((v * 2.0 / t).round() as i64 - 2).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    GridCoord { x: axis(pos.x), y: axis(pos.y) }
}

/// World position of a whole tile cell (used for the perimeter, which is
/// tile-aligned rather than grid-addressed).
#[inline]
pub fn tile_to_world(col: i32, row: i32, tile_size: u32) -> WorldPos {
    let t = tile_size as f64;
    WorldPos { x: col as f64 * t, y: row as f64 * t }
}

/// Axis-aligned rectangle in world space, stored as center + half extents.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub center: WorldPos,
    pub half_w: f64,
    pub half_h: f64,
}

impl Rect {
    pub fn new(center: WorldPos, half_w: f64, half_h: f64) -> Self {
        Rect { center, half_w, half_h }
    }

    /// Square of side `size` centered on `center`.
    pub fn square(center: WorldPos, size: f64) -> Self {
        Rect { center, half_w: size / 2.0, half_h: size / 2.0 }
    }

    pub fn left(&self) -> f64 { self.center.x - self.half_w }
    pub fn right(&self) -> f64 { self.center.x + self.half_w }
    pub fn top(&self) -> f64 { self.center.y - self.half_h }
    pub fn bottom(&self) -> f64 { self.center.y + self.half_h }

    /// Strict overlap: rectangles that merely share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect { center: self.center.offset(dx, dy), ..*self }
    }
}

/// Addressable grid bounds for a floor of `width × height` tiles.
///
/// The interior spans tile columns `1..=width-2` and rows `1..=height-1`
/// (row `height` is the needle row).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridBounds {
    pub max_x: i32,
    pub max_y: i32,
}

/// Floor dimensions accepted by level validation, in tiles.
pub const FLOOR_WIDTHS: RangeInclusive<i32> = 3..=1024;
pub const FLOOR_HEIGHTS: RangeInclusive<i32> = 3..=1024;

impl GridBounds {
    /// Saturates rather than overflowing; callers reject dimensions outside
    /// [`FLOOR_WIDTHS`] / [`FLOOR_HEIGHTS`] first.
    pub fn for_floor(width: i32, height: i32) -> Self {
        GridBounds {
            max_x: width.saturating_sub(3).saturating_mul(2),
            max_y: height.saturating_sub(2).saturating_mul(2),
        }
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        (0..=self.max_x).contains(&c.x) && (0..=self.max_y).contains(&c.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn origin_maps_to_first_interior_tile() {
        let p = map_to_world(GridCoord::new(0, 0), 32);
        assert_eq!(p, WorldPos::new(32.0, 32.0));
    }

    #[test]
    fn odd_grid_lands_on_tile_boundary() {
        let p = map_to_world(GridCoord::new(1, 3), 32);
        assert_eq!(p, WorldPos::new(48.0, 80.0));
    }

    #[test]
    fn negative_coords_are_not_clamped() {
        let p = map_to_world(GridCoord::new(-4, -2), 32);
        assert_eq!(p, WorldPos::new(-32.0, 0.0));
    }

    #[test]
    fn bounds_for_default_floor() {
        let b = GridBounds::for_floor(17, 12);
        assert_eq!(b, GridBounds { max_x: 28, max_y: 20 });
        assert!(b.contains(GridCoord::new(0, 0)));
        assert!(b.contains(GridCoord::new(28, 20)));
        assert!(!b.contains(GridCoord::new(29, 0)));
        assert!(!b.contains(GridCoord::new(0, -1)));
        // rightmost interior tile center
        assert_eq!(map_to_world(GridCoord::new(28, 0), 32).x, 15.0 * 32.0);
    }

    #[test]
    fn extreme_coords_round_trip() {
        for c in [
            GridCoord::new(i32::MAX, i32::MIN),
            GridCoord::new(i32::MIN, i32::MAX),
            GridCoord::new(i32::MAX - 2, -2),
        ] {
            for t in [1, 32, u32::MAX] {
                assert_eq!(world_to_grid(map_to_world(c, t), t), c);
            }
        }
    }

    #[test]
    fn neighbours_above_two_pow_24_stay_distinct() {
        let a = map_to_world(GridCoord::new(33_554_433, 0), 1);
        let b = map_to_world(GridCoord::new(33_554_434, 0), 1);
        assert_ne!(a, b);
        assert_eq!(b.x - a.x, 0.5);
    }

    #[test]
    fn huge_floor_bounds_saturate() {
        let b = GridBounds::for_floor(i32::MAX, i32::MAX);
        assert_eq!(b, GridBounds { max_x: i32::MAX, max_y: i32::MAX });
        let b = GridBounds::for_floor(i32::MIN, i32::MIN);
        assert!(!b.contains(GridCoord::new(0, 0)));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::square(WorldPos::new(0.0, 0.0), 10.0);
        let b = Rect::square(WorldPos::new(10.0, 0.0), 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&b.translated(-0.5, 0.0)));
    }

    proptest! {
        #[test]
        fn grid_round_trip(x in any::<i32>(), y in any::<i32>(), t in 1u32..=u32::MAX) {
            let c = GridCoord::new(x, y);
            prop_assert_eq!(world_to_grid(map_to_world(c, t), t), c);
        }

        #[test]
        fn mapping_is_injective(
            a in (any::<i32>(), any::<i32>()),
            b in (any::<i32>(), any::<i32>()),
            t in 1u32..=u32::MAX,
        ) {
            let ca = GridCoord::new(a.0, a.1);
            let cb = GridCoord::new(b.0, b.1);
            prop_assume!(ca != cb);
            prop_assert_ne!(map_to_world(ca, t), map_to_world(cb, t));
        }
    }
}
