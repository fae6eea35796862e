//! Linear indexing over a dense M×N×O voxel grid.

use crate::error::GridError;
use crate::point::Point;

/// Extent of a dense voxel grid and the bijection between points and
/// linear indices.
///
/// Indices are column-major and 0-based: `index = x + y·M + z·M·N`.
/// Every accessor is bounds-checked; invalid points and indices map to
/// `None` instead of wrapping.
///
/// # Example
///
/// ```
/// use ce_grid::{GridMesh, Point};
///
/// let mesh = GridMesh::new(4, 3, 2).unwrap();
/// assert_eq!(mesh.len(), 24);
///
/// let p = Point::new(1, 2, 1);
/// let index = mesh.sub2ind(p).unwrap();
/// assert_eq!(index, 1 + 2 * 4 + 4 * 3);
/// assert_eq!(mesh.ind2sub(index), Some(p));
///
/// assert!(!mesh.is_valid(Point::new(4, 0, 0)));
/// assert_eq!(mesh.sub2ind(Point::new(-1, 0, 0)), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridMesh {
    m: usize,
    n: usize,
    o: usize,
}

impl GridMesh {
    /// Creates a grid of `m × n × o` voxels.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if any extent is zero or does
    /// not fit in an `i32` coordinate, and [`GridError::IndexOverflow`] if
    /// the voxel count overflows `usize`.
    pub fn new(m: usize, n: usize, o: usize) -> Result<Self, GridError> {
        let fits = |extent: usize| extent > 0 && i32::try_from(extent).is_ok();
        if !(fits(m) && fits(n) && fits(o)) {
            return Err(GridError::InvalidDimensions { m, n, o });
        }
        m.checked_mul(n)
            .and_then(|mn| mn.checked_mul(o))
            .ok_or(GridError::IndexOverflow { m, n, o })?;
        Ok(Self { m, n, o })
    }

    /// Returns the extents as `(M, N, O)`.
    #[must_use]
    pub const fn dims(&self) -> (usize, usize, usize) {
        (self.m, self.n, self.o)
    }

    /// Total number of voxels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.m * self.n * self.o
    }

    /// A grid always holds at least one voxel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` iff `p` lies inside `[0,M)×[0,N)×[0,O)`.
    #[must_use]
    pub fn is_valid(&self, p: Point) -> bool {
        Self::axis(p.x, self.m).is_some()
            && Self::axis(p.y, self.n).is_some()
            && Self::axis(p.z, self.o).is_some()
    }

    /// Converts a point to its linear index, or `None` outside the grid.
    #[must_use]
    pub fn sub2ind(&self, p: Point) -> Option<usize> {
        let x = Self::axis(p.x, self.m)?;
        let y = Self::axis(p.y, self.n)?;
        let z = Self::axis(p.z, self.o)?;
        Some(x + y * self.m + z * self.m * self.n)
    }

    /// Converts a linear index back to its point, or `None` if the index is
    /// not below [`len`](Self::len).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn ind2sub(&self, index: usize) -> Option<Point> {
        if index >= self.len() {
            return None;
        }
        let plane = self.m * self.n;
        let z = index / plane;
        let rest = index - z * plane;
        let y = rest / self.m;
        let x = rest - y * self.m;
        // Extents were checked to fit in i32 on construction.
        Some(Point::new(x as i32, y as i32, z as i32))
    }

    /// Applies an offset to a point, returning `None` when the result leaves
    /// the grid or overflows.
    #[must_use]
    pub fn step(&self, p: Point, offset: Point) -> Option<Point> {
        p.checked_add(offset).filter(|q| self.is_valid(*q))
    }

    /// Checks a point, turning an invalid one into an error.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if `p` is outside the grid.
    pub fn require(&self, p: Point) -> Result<usize, GridError> {
        self.sub2ind(p).ok_or(GridError::OutOfBounds { point: p })
    }

    /// Iterates over every point in linear-index order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(|i| self.ind2sub(i))
    }

    fn axis(value: i32, extent: usize) -> Option<usize> {
        usize::try_from(value).ok().filter(|&v| v < extent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_extent() {
        assert!(matches!(
            GridMesh::new(0, 1, 1),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(GridMesh::new(1, 1, 1).is_ok());
    }

    #[test]
    fn test_rejects_overflow() {
        let huge = usize::try_from(i32::MAX).unwrap();
        let result = GridMesh::new(huge, huge, huge);
        // On 64-bit targets the product overflows.
        if usize::BITS == 64 {
            assert!(matches!(result, Err(GridError::IndexOverflow { .. })));
        }
    }

    #[test]
    fn test_sub2ind_layout() {
        let mesh = GridMesh::new(5, 5, 1).unwrap();
        assert_eq!(mesh.sub2ind(Point::new(0, 0, 0)), Some(0));
        assert_eq!(mesh.sub2ind(Point::new(4, 0, 0)), Some(4));
        assert_eq!(mesh.sub2ind(Point::new(0, 1, 0)), Some(5));
        assert_eq!(mesh.sub2ind(Point::new(4, 4, 0)), Some(24));
        assert_eq!(mesh.sub2ind(Point::new(0, 0, 1)), None);
    }

    #[test]
    fn test_round_trip_all_indices() {
        let mesh = GridMesh::new(3, 4, 5).unwrap();
        for index in 0..mesh.len() {
            let p = mesh.ind2sub(index).unwrap();
            assert_eq!(mesh.sub2ind(p), Some(index));
        }
        assert_eq!(mesh.ind2sub(mesh.len()), None);
    }

    #[test]
    fn test_validity_per_axis() {
        let mesh = GridMesh::new(2, 3, 4).unwrap();
        assert!(mesh.is_valid(Point::new(1, 2, 3)));
        assert!(!mesh.is_valid(Point::new(2, 0, 0)));
        assert!(!mesh.is_valid(Point::new(0, 3, 0)));
        assert!(!mesh.is_valid(Point::new(0, 0, 4)));
        assert!(!mesh.is_valid(Point::new(0, -1, 0)));
    }

    #[test]
    fn test_step() {
        let mesh = GridMesh::new(3, 3, 3).unwrap();
        let p = Point::new(2, 1, 1);
        assert_eq!(mesh.step(p, Point::new(-1, 0, 0)), Some(Point::new(1, 1, 1)));
        assert_eq!(mesh.step(p, Point::new(1, 0, 0)), None);
    }

    #[test]
    fn test_require() {
        let mesh = GridMesh::new(2, 2, 2).unwrap();
        assert_eq!(mesh.require(Point::new(1, 1, 1)), Ok(7));
        assert!(matches!(
            mesh.require(Point::new(2, 0, 0)),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_points_order() {
        let mesh = GridMesh::new(2, 2, 1).unwrap();
        let points: Vec<_> = mesh.points().collect();
        assert_eq!(
            points,
            vec![
                Point::new(0, 0, 0),
                Point::new(1, 0, 0),
                Point::new(0, 1, 0),
                Point::new(1, 1, 0),
            ]
        );
    }
}
