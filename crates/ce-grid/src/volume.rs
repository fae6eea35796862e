//! Dense per-voxel arrays bound to a [`GridMesh`].

use nalgebra::Point3;

use crate::error::GridError;
use crate::mesh::GridMesh;
use crate::point::Point;

/// A dense array holding one value per voxel, stored in linear-index order.
///
/// # Example
///
/// ```
/// use ce_grid::{GridMesh, Point, Volume};
///
/// let mesh = GridMesh::new(2, 2, 1).unwrap();
/// let mut volume = Volume::filled(mesh, 0.0_f64);
/// *volume.get_mut(Point::new(1, 1, 0)).unwrap() = 3.5;
///
/// assert_eq!(volume.get(Point::new(1, 1, 0)), Some(&3.5));
/// assert_eq!(volume.get(Point::new(2, 0, 0)), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Volume<T> {
    mesh: GridMesh,
    values: Vec<T>,
}

impl<T> Volume<T> {
    /// Wraps a buffer laid out as `x + y·M + z·M·N`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SizeMismatch`] if the buffer length differs from
    /// the number of voxels.
    pub fn from_vec(mesh: GridMesh, values: Vec<T>) -> Result<Self, GridError> {
        if values.len() != mesh.len() {
            return Err(GridError::SizeMismatch {
                expected: mesh.len(),
                actual: values.len(),
            });
        }
        Ok(Self { mesh, values })
    }

    /// Builds a volume by evaluating `f` at every point.
    pub fn from_fn(mesh: GridMesh, mut f: impl FnMut(Point) -> T) -> Self {
        let values = mesh.points().map(&mut f).collect();
        Self { mesh, values }
    }

    /// The grid this volume is laid out on.
    #[must_use]
    pub const fn mesh(&self) -> &GridMesh {
        &self.mesh
    }

    /// Bounds-checked access by point.
    #[must_use]
    pub fn get(&self, p: Point) -> Option<&T> {
        self.mesh.sub2ind(p).and_then(|i| self.values.get(i))
    }

    /// Bounds-checked mutable access by point.
    pub fn get_mut(&mut self, p: Point) -> Option<&mut T> {
        self.mesh.sub2ind(p).and_then(|i| self.values.get_mut(i))
    }

    /// Bounds-checked access by linear index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Bounds-checked mutable access by linear index.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.values.get_mut(index)
    }

    /// The raw buffer in linear-index order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Consumes the volume, returning the raw buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }

    /// Iterates over `(point, value)` pairs in linear-index order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> + '_ {
        self.mesh.points().zip(self.values.iter())
    }
}

impl<T: Clone> Volume<T> {
    /// Creates a volume with every voxel set to `value`.
    #[must_use]
    pub fn filled(mesh: GridMesh, value: T) -> Self {
        Self {
            mesh,
            values: vec![value; mesh.len()],
        }
    }
}

impl Volume<f64> {
    /// Smallest value in the volume.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Trilinear interpolation at a continuous position in grid units.
    ///
    /// Positions outside the grid are clamped to its extent, so the
    /// boundary values extend outwards.
    ///
    /// # Example
    ///
    /// ```
    /// use ce_grid::{GridMesh, Volume};
    /// use nalgebra::Point3;
    ///
    /// let mesh = GridMesh::new(2, 1, 1).unwrap();
    /// let volume = Volume::from_vec(mesh, vec![0.0, 2.0]).unwrap();
    /// let v = volume.sample_linear(&Point3::new(0.25, 0.0, 0.0));
    /// assert!((v - 0.5).abs() < 1e-12);
    /// ```
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::many_single_char_names
    )]
    pub fn sample_linear(&self, position: &Point3<f64>) -> f64 {
        let (m, n, o) = self.mesh.dims();
        let extents = [m, n, o];
        let mut base = [0_usize; 3];
        let mut frac = [0.0_f64; 3];
        for axis in 0..3 {
            let upper = (extents[axis] - 1) as f64;
            let c = position[axis].clamp(0.0, upper);
            let floor = c.floor();
            base[axis] = floor as usize;
            frac[axis] = c - floor;
        }

        let value = |dx: usize, dy: usize, dz: usize| -> f64 {
            let x = (base[0] + dx).min(m - 1);
            let y = (base[1] + dy).min(n - 1);
            let z = (base[2] + dz).min(o - 1);
            self.values[x + y * m + z * m * n]
        };

        let [fx, fy, fz] = frac;
        let lerp = |a: f64, b: f64, t: f64| (b - a).mul_add(t, a);

        let c00 = lerp(value(0, 0, 0), value(1, 0, 0), fx);
        let c10 = lerp(value(0, 1, 0), value(1, 1, 0), fx);
        let c01 = lerp(value(0, 0, 1), value(1, 0, 1), fx);
        let c11 = lerp(value(0, 1, 1), value(1, 1, 1), fx);
        let c0 = lerp(c00, c10, fy);
        let c1 = lerp(c01, c11, fy);
        lerp(c0, c1, fz)
    }
}

/// Class of a voxel in a [`MeshMask`].
///
/// The numeric codes match the mask encoding accepted by
/// [`MeshMask::from_codes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoxelClass {
    /// Not searchable (code 0).
    Excluded,
    /// Searchable (code 1).
    #[default]
    Free,
    /// Searchable and part of the start set (code 2).
    Source,
    /// Searchable and part of the end set (code 3).
    Sink,
}

impl VoxelClass {
    /// Decodes a raw mask code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Excluded),
            1 => Some(Self::Free),
            2 => Some(Self::Source),
            3 => Some(Self::Sink),
            _ => None,
        }
    }

    /// The raw mask code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Excluded => 0,
            Self::Free => 1,
            Self::Source => 2,
            Self::Sink => 3,
        }
    }

    /// Whether the graph may contain this voxel.
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        !matches!(self, Self::Excluded)
    }
}

/// Per-voxel searchability flags.
///
/// # Example
///
/// ```
/// use ce_grid::{GridMesh, MeshMask, Point};
///
/// let mesh = GridMesh::new(3, 1, 1).unwrap();
/// let mask = MeshMask::from_codes(mesh, vec![2, 0, 3]).unwrap();
///
/// assert!(!mask.is_traversable(Point::new(1, 0, 0)));
/// assert!(!mask.is_traversable(Point::new(5, 0, 0)));
/// assert_eq!(mask.sources(), vec![Point::new(0, 0, 0)]);
/// assert_eq!(mask.sinks(), vec![Point::new(2, 0, 0)]);
/// ```
pub type MeshMask = Volume<VoxelClass>;

impl Volume<VoxelClass> {
    /// A mask where every voxel is [`VoxelClass::Free`].
    #[must_use]
    pub fn all_free(mesh: GridMesh) -> Self {
        Self::filled(mesh, VoxelClass::Free)
    }

    /// Decodes a raw 0/1/2/3 mask buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SizeMismatch`] for a wrong buffer length and
    /// [`GridError::UnknownMaskCode`] for any code above 3.
    pub fn from_codes(mesh: GridMesh, codes: Vec<u8>) -> Result<Self, GridError> {
        let classes = codes
            .into_iter()
            .enumerate()
            .map(|(index, code)| {
                VoxelClass::from_code(code).ok_or(GridError::UnknownMaskCode { code, index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_vec(mesh, classes)
    }

    /// Builds a mask from a boolean traversability buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SizeMismatch`] for a wrong buffer length.
    pub fn from_flags(mesh: GridMesh, flags: &[bool]) -> Result<Self, GridError> {
        let classes = flags
            .iter()
            .map(|&f| {
                if f {
                    VoxelClass::Free
                } else {
                    VoxelClass::Excluded
                }
            })
            .collect();
        Self::from_vec(mesh, classes)
    }

    /// Whether `p` is inside the grid and not excluded.
    #[must_use]
    pub fn is_traversable(&self, p: Point) -> bool {
        self.get(p).is_some_and(|c| c.is_traversable())
    }

    /// Whether the voxel at a linear index is traversable.
    #[must_use]
    pub fn is_traversable_index(&self, index: usize) -> bool {
        self.at(index).is_some_and(|c| c.is_traversable())
    }

    /// Marks a voxel, returning the previous class, or `None` outside the grid.
    pub fn set(&mut self, p: Point, class: VoxelClass) -> Option<VoxelClass> {
        self.get_mut(p).map(|slot| std::mem::replace(slot, class))
    }

    /// All voxels marked [`VoxelClass::Source`].
    #[must_use]
    pub fn sources(&self) -> Vec<Point> {
        self.points_of(VoxelClass::Source)
    }

    /// All voxels marked [`VoxelClass::Sink`].
    #[must_use]
    pub fn sinks(&self) -> Vec<Point> {
        self.points_of(VoxelClass::Sink)
    }

    fn points_of(&self, class: VoxelClass) -> Vec<Point> {
        self.iter()
            .filter(|(_, c)| **c == class)
            .map(|(p, _)| p)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mesh(m: usize, n: usize, o: usize) -> GridMesh {
        GridMesh::new(m, n, o).unwrap()
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = Volume::from_vec(mesh(2, 2, 2), vec![0.0; 7]);
        assert_eq!(
            result,
            Err(GridError::SizeMismatch {
                expected: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_from_fn_matches_points() {
        let volume = Volume::from_fn(mesh(3, 2, 2), |p| p.x + 10 * p.y + 100 * p.z);
        assert_eq!(volume.get(Point::new(2, 1, 1)), Some(&112));
        assert_eq!(volume.at(0), Some(&0));
    }

    #[test]
    fn test_min_value() {
        let volume = Volume::from_vec(mesh(3, 1, 1), vec![2.0, -1.0, 4.0]).unwrap();
        assert_eq!(volume.min_value(), -1.0);
    }

    #[test]
    fn test_sample_linear_at_voxels() {
        let volume = Volume::from_fn(mesh(3, 3, 3), |p| f64::from(p.x + 2 * p.y + 3 * p.z));
        for (p, v) in volume.iter() {
            assert_relative_eq!(volume.sample_linear(&p.to_point()), *v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sample_linear_is_exact_for_affine_fields() {
        let volume = Volume::from_fn(mesh(3, 3, 3), |p| f64::from(p.x + 2 * p.y + 3 * p.z));
        let v = volume.sample_linear(&Point3::new(0.5, 1.25, 1.5));
        assert_relative_eq!(v, 0.5 + 2.5 + 4.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_linear_clamps() {
        let volume = Volume::from_vec(mesh(2, 1, 1), vec![1.0, 3.0]).unwrap();
        assert_relative_eq!(volume.sample_linear(&Point3::new(-4.0, 0.0, 0.0)), 1.0);
        assert_relative_eq!(volume.sample_linear(&Point3::new(9.0, 2.0, -1.0)), 3.0);
    }

    #[test]
    fn test_mask_codes() {
        let mask = MeshMask::from_codes(mesh(4, 1, 1), vec![0, 1, 2, 3]).unwrap();
        assert!(!mask.is_traversable(Point::new(0, 0, 0)));
        assert!(mask.is_traversable(Point::new(1, 0, 0)));
        assert!(mask.is_traversable(Point::new(2, 0, 0)));
        assert!(mask.is_traversable(Point::new(3, 0, 0)));
        for code in 0..4 {
            assert_eq!(VoxelClass::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_mask_unknown_code() {
        let result = MeshMask::from_codes(mesh(2, 1, 1), vec![1, 9]);
        assert_eq!(result, Err(GridError::UnknownMaskCode { code: 9, index: 1 }));
    }

    #[test]
    fn test_mask_from_flags_and_set() {
        let mut mask = MeshMask::from_flags(mesh(2, 1, 1), &[true, false]).unwrap();
        assert!(!mask.is_traversable_index(1));
        assert_eq!(
            mask.set(Point::new(1, 0, 0), VoxelClass::Sink),
            Some(VoxelClass::Excluded)
        );
        assert_eq!(mask.sinks(), vec![Point::new(1, 0, 0)]);
        assert_eq!(mask.set(Point::new(3, 0, 0), VoxelClass::Free), None);
    }
}
