//! Integer grid points and offsets.

use std::fmt;

use nalgebra::{Point3, Vector3};

/// A discrete 3D point in grid space.
///
/// The same type doubles as a neighbor offset (Δx, Δy, Δz) in connectivity
/// tables, so coordinates are signed.
///
/// # Example
///
/// ```
/// use ce_grid::Point;
///
/// let p = Point::new(1, 2, 3);
/// assert_eq!(p.as_array(), [1, 2, 3]);
///
/// let step = Point::new(0, -1, 0);
/// assert_eq!(p.checked_add(step), Some(Point::new(1, 1, 3)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate (first, fastest-varying axis).
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate (slowest-varying axis).
    pub z: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The origin (0, 0, 0).
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the coordinates as an array.
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns `true` for the zero offset.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0
    }

    /// Converts to a floating-point point in grid units.
    #[must_use]
    pub fn to_point(self) -> Point3<f64> {
        Point3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Converts to a floating-point vector in grid units.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Converts to a vector in physical units, scaling each axis by the
    /// matching voxel dimension.
    ///
    /// # Example
    ///
    /// ```
    /// use ce_grid::Point;
    ///
    /// let v = Point::new(1, 1, 2).scaled(&[0.5, 1.0, 2.0]);
    /// assert!((v.z - 4.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn scaled(self, voxel_dimensions: &[f64; 3]) -> Vector3<f64> {
        self.to_vector().component_mul(&Vector3::from(*voxel_dimensions))
    }

    /// Adds an offset, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(other.x)?,
            self.y.checked_add(other.y)?,
            self.z.checked_add(other.z)?,
        ))
    }

    /// Subtracts an offset, returning `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_sub(other.x)?,
            self.y.checked_sub(other.y)?,
            self.z.checked_sub(other.z)?,
        ))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Point {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[i32; 3]> for Point {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point> for [i32; 3] {
    fn from(p: Point) -> Self {
        p.as_array()
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x.wrapping_sub(other.x),
            self.y.wrapping_sub(other.y),
            self.z.wrapping_sub(other.z),
        )
    }
}

impl std::ops::Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(
            self.x.wrapping_neg(),
            self.y.wrapping_neg(),
            self.z.wrapping_neg(),
        )
    }
}
