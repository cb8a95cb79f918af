//! Small geometry types shared by the dungeon crates (float points, block positions, boxes).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Horizontal distance, ignoring height.
    #[inline]
    pub fn distance_xz(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }

    /// The block cell containing this point.
    #[inline]
    pub fn cell(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Integer world-space cell coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Point at the bottom centre of the cell (where something standing in it has its feet).
    #[inline]
    pub fn floor_center(self) -> Vec3 {
        Vec3::new(self.x as f32 + 0.5, self.y as f32, self.z as f32 + 0.5)
    }

    #[inline]
    pub fn distance_sq_xz(self, other: BlockPos) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Axis-aligned box of cells, `min` inclusive and `max` exclusive on every axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockBox {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockBox {
    #[inline]
    pub const fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    /// Box from an origin and a size; negative sizes produce an empty box.
    pub fn from_origin_size(origin: BlockPos, sx: i32, sy: i32, sz: i32) -> Self {
        Self {
            min: origin,
            max: origin.offset(sx.max(0), sy.max(0), sz.max(0)),
        }
    }

    #[inline]
    pub fn size_x(&self) -> i32 {
        (self.max.x - self.min.x).max(0)
    }

    #[inline]
    pub fn size_y(&self) -> i32 {
        (self.max.y - self.min.y).max(0)
    }

    #[inline]
    pub fn size_z(&self) -> i32 {
        (self.max.z - self.min.z).max(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size_x() == 0 || self.size_y() == 0 || self.size_z() == 0
    }

    #[inline]
    pub fn volume(&self) -> i64 {
        i64::from(self.size_x()) * i64::from(self.size_y()) * i64::from(self.size_z())
    }

    #[inline]
    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }

    #[inline]
    pub fn contains_xz(&self, x: i32, z: i32) -> bool {
        x >= self.min.x && x < self.max.x && z >= self.min.z && z < self.max.z
    }

    pub fn intersects(&self, other: &BlockBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }

    /// Grow (or shrink, for negative `by`) horizontally on every side.
    pub fn expand_xz(&self, by: i32) -> BlockBox {
        BlockBox {
            min: self.min.offset(-by, 0, -by),
            max: self.max.offset(by, 0, by),
        }
    }

    pub fn translate(&self, dx: i32, dy: i32, dz: i32) -> BlockBox {
        BlockBox {
            min: self.min.offset(dx, dy, dz),
            max: self.max.offset(dx, dy, dz),
        }
    }

    pub fn union(&self, other: &BlockBox) -> BlockBox {
        BlockBox {
            min: BlockPos::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: BlockPos::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Centre cell of the floor layer (rounded toward `min`).
    pub fn floor_center(&self) -> BlockPos {
        BlockPos::new(
            self.min.x + self.size_x() / 2,
            self.min.y,
            self.min.z + self.size_z() / 2,
        )
    }

    /// Every (x, z) column covered by the box.
    pub fn columns(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (x0, x1) = (self.min.x, self.max.x);
        (self.min.z..self.max.z).flat_map(move |z| (x0..x1).map(move |x| (x, z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_never_intersects() {
        let a = BlockBox::from_origin_size(BlockPos::new(0, 0, 0), 4, 0, 4);
        let b = BlockBox::from_origin_size(BlockPos::new(0, 0, 0), 4, 4, 4);
        assert!(a.is_empty());
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = BlockBox::from_origin_size(BlockPos::new(0, 0, 0), 4, 4, 4);
        let b = BlockBox::from_origin_size(BlockPos::new(4, 0, 0), 4, 4, 4);
        assert!(!a.intersects(&b));
        assert!(a.expand_xz(1).intersects(&b));
    }

    #[test]
    fn columns_cover_footprint_once() {
        let b = BlockBox::from_origin_size(BlockPos::new(-2, 5, 3), 3, 2, 4);
        let cols: Vec<_> = b.columns().collect();
        assert_eq!(cols.len(), 12);
        assert!(cols.contains(&(-2, 3)));
        assert!(cols.contains(&(0, 6)));
        assert!(!cols.contains(&(1, 3)));
    }

    #[test]
    fn cell_floors_negative_coordinates() {
        assert_eq!(Vec3::new(-0.5, 1.99, 2.0).cell(), BlockPos::new(-1, 1, 2));
    }

    proptest::proptest! {
        #[test]
        fn tuple_conversion_and_self_distance(p in proptest::prelude::any::<BlockPos>()) {
            proptest::prop_assert_eq!(BlockPos::from((p.x, p.y, p.z)), p);
            proptest::prop_assert_eq!(p.distance_sq_xz(p), 0);
        }
    }
}
