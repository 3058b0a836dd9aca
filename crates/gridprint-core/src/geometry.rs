//! Points, boxes, and the running extent of a blueprint.
//!
//! Blueprint coordinates are in tiles with `+x` east and `+y` south. Entity
//! positions are the centre of the entity; tile positions are the integer
//! top-left corner of the tile.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::BlueprintError;

/// The largest width or height, in tiles, a blueprint may span.
pub const MAX_BLUEPRINT_DIMENSION: u32 = 10_000;

/// Tolerance used when comparing floating-point positions.
pub const POSITION_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Vector
// ---------------------------------------------------------------------------

/// A floating-point position or offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vector) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Equality within [`POSITION_EPSILON`] on both axes.
    pub fn approx_eq(self, other: Vector) -> bool {
        (self.x - other.x).abs() < POSITION_EPSILON && (self.y - other.y).abs() < POSITION_EPSILON
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vector {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<IntPosition> for Vector {
    fn from(pos: IntPosition) -> Self {
        Self::new(pos.x as f64, pos.y as f64)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// IntPosition
// ---------------------------------------------------------------------------

/// An integer grid coordinate, used for tiles and snapping metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntPosition {
    pub x: i32,
    pub y: i32,
}

impl IntPosition {
    pub const ZERO: IntPosition = IntPosition { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl From<(i32, i32)> for IntPosition {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl Sub for IntPosition {
    type Output = IntPosition;

    fn sub(self, rhs: IntPosition) -> IntPosition {
        IntPosition::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for IntPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vector,
    pub max: Vector,
}

impl Aabb {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Vector::new(min_x, min_y),
            max: Vector::new(max_x, max_y),
        }
    }

    /// A box of half-extent `half` on both axes, centred on the origin.
    pub const fn square(half: f64) -> Self {
        Self::new(-half, -half, half, half)
    }

    pub fn translated(&self, offset: Vector) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Rotate a quarter turn clockwise about the origin.
    pub fn rotated_quarter(&self) -> Self {
        Self::new(-self.max.y, self.min.x, -self.min.y, self.max.x)
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x - POSITION_EPSILON
            && other.min.x < self.max.x - POSITION_EPSILON
            && self.min.y < other.max.y - POSITION_EPSILON
            && other.min.y < self.max.y - POSITION_EPSILON
    }

    pub fn contains_point(&self, point: Vector) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vector {
        Vector::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    /// Whole-tile dimensions `(width, height)`, rounding partial tiles up.
    pub fn dimensions(&self) -> (u32, u32) {
        (ceil_tiles(self.width()), ceil_tiles(self.height()))
    }
}

fn ceil_tiles(span: f64) -> u32 {
    let tiles = span.ceil();
    if tiles <= 0.0 {
        0
    } else if tiles >= u32::MAX as f64 {
        u32::MAX
    } else {
        tiles as u32
    }
}

// ---------------------------------------------------------------------------
// Extent
// ---------------------------------------------------------------------------

/// Running bounding box and tile dimensions of everything in a blueprint.
///
/// `area` only ever grows as objects are added; removals leave it stale
/// until it is recomputed from scratch with [`Extent::from_boxes`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    area: Option<Aabb>,
    tile_width: u32,
    tile_height: u32,
}

impl Extent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute an extent covering every box. Does not enforce the size limit.
    pub fn from_boxes(boxes: impl IntoIterator<Item = Aabb>) -> Self {
        let area = boxes.into_iter().reduce(|acc, b| acc.union(&b));
        let (tile_width, tile_height) = area.map(|a| a.dimensions()).unwrap_or((0, 0));
        Self {
            area,
            tile_width,
            tile_height,
        }
    }

    pub fn area(&self) -> Option<Aabb> {
        self.area
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Grow to cover `aabb`.
    ///
    /// If the grown extent would exceed [`MAX_BLUEPRINT_DIMENSION`] on either
    /// axis the extent is left unchanged and the size error is returned.
    pub fn extend(&mut self, aabb: Aabb) -> Result<(), BlueprintError> {
        let area = match self.area {
            Some(current) => current.union(&aabb),
            None => aabb,
        };
        let (tile_width, tile_height) = area.dimensions();
        check_dimensions(tile_width, tile_height)?;
        self.area = Some(area);
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        Ok(())
    }

    pub fn check(&self) -> Result<(), BlueprintError> {
        check_dimensions(self.tile_width, self.tile_height)
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), BlueprintError> {
    if width > MAX_BLUEPRINT_DIMENSION || height > MAX_BLUEPRINT_DIMENSION {
        return Err(BlueprintError::UnreasonablySized { width, height });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
