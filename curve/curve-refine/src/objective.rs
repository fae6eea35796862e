//! Objectives minimized by the descent methods.
//!
//! [`CurveEnergy`] is the continuous counterpart of the discrete search
//! cost: the polyline's interior vertices move freely while its endpoints
//! stay fixed, and the data term is always the line integral of the
//! trilinearly interpolated volume.

use ce_grid::{Point, Point3, Vector3, Volume};
use curve_search::cost::{LinearInterpolation, Weights, dihedral_angle, regularize, turning_angle};
use curve_types::InstanceSettings;
use nalgebra::DVector;

/// A smooth-enough scalar function of a vector.
pub trait Objective {
    /// Number of variables.
    fn dim(&self) -> usize;

    /// Objective value at `x`.
    fn value(&self, x: &DVector<f64>) -> f64;

    /// Gradient at `x`, by central differences unless overridden.
    fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut probe = x.clone();
        DVector::from_fn(x.len(), |i, _| {
            let h = 1e-6 * x[i].abs().max(1.0);
            probe[i] = x[i] + h;
            let forward = self.value(&probe);
            probe[i] = x[i] - h;
            let backward = self.value(&probe);
            probe[i] = x[i];
            (forward - backward) / (2.0 * h)
        })
    }
}

/// Data, length, curvature, and torsion energy of a polyline with fixed
/// endpoints.
///
/// Variables are the interior vertices in grid coordinates, packed as
/// `[x1, y1, z1, x2, y2, z2, ...]`.
///
/// # Example
///
/// ```
/// use curve_refine::CurveEnergy;
/// use curve_types::InstanceSettings;
/// use ce_grid::{GridMesh, Point3, Volume};
///
/// let mesh = GridMesh::new(4, 1, 1).unwrap();
/// let data = Volume::filled(mesh, 0.0);
/// let settings = InstanceSettings::new().with_length_penalty(1.0);
///
/// let path = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(3.0, 0.0, 0.0),
/// ];
/// let energy = CurveEnergy::new(&data, &settings, &path);
/// assert!((energy.energy(&path) - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CurveEnergy<'a> {
    data: LinearInterpolation<'a>,
    weights: Weights,
    voxel_dimensions: [f64; 3],
    start: Point3<f64>,
    end: Point3<f64>,
    interior: usize,
}

impl<'a> CurveEnergy<'a> {
    /// An energy for polylines shaped like `path` (same length, same
    /// endpoints).
    ///
    /// `path` should have at least two points; shorter paths have no
    /// segments and zero energy.
    #[must_use]
    pub fn new(data: &'a Volume<f64>, settings: &InstanceSettings, path: &[Point3<f64>]) -> Self {
        let start = path.first().copied().unwrap_or_else(Point3::origin);
        let end = path.last().copied().unwrap_or(start);
        Self {
            data: LinearInterpolation::new(data),
            weights: Weights::from_settings(settings),
            voxel_dimensions: *settings.voxel_dimensions(),
            start,
            end,
            interior: path.len().saturating_sub(2),
        }
    }

    /// Like [`CurveEnergy::new`], from grid points.
    #[must_use]
    pub fn from_grid_path(
        data: &'a Volume<f64>,
        settings: &InstanceSettings,
        path: &[Point],
    ) -> (Self, Vec<Point3<f64>>) {
        let points: Vec<Point3<f64>> = path.iter().map(|p| p.to_point()).collect();
        (Self::new(data, settings, &points), points)
    }

    /// Number of free interior vertices.
    #[must_use]
    pub const fn interior_count(&self) -> usize {
        self.interior
    }

    /// Packs the interior vertices of `path` into a variable vector.
    #[must_use]
    pub fn pack(&self, path: &[Point3<f64>]) -> DVector<f64> {
        let interior = path.iter().skip(1).take(self.interior);
        DVector::from_iterator(
            self.interior * 3,
            interior.flat_map(|p| [p.x, p.y, p.z]),
        )
    }

    /// Rebuilds the full polyline from a variable vector.
    #[must_use]
    pub fn unpack(&self, x: &DVector<f64>) -> Vec<Point3<f64>> {
        let mut points = Vec::with_capacity(self.interior + 2);
        points.push(self.start);
        points.extend(
            x.as_slice()
                .chunks_exact(3)
                .map(|c| Point3::new(c[0], c[1], c[2])),
        );
        if self.interior > 0 || self.start != self.end {
            points.push(self.end);
        }
        points
    }

    fn physical(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v.component_mul(&Vector3::from(self.voxel_dimensions))
    }

    /// Energy of a full polyline in grid coordinates.
    #[must_use]
    pub fn energy(&self, path: &[Point3<f64>]) -> f64 {
        let steps: Vec<Vector3<f64>> = path
            .windows(2)
            .map(|w| self.physical(&(w[1] - w[0])))
            .collect();

        let mut total = 0.0;
        for (w, step) in path.windows(2).zip(&steps) {
            let length = step.norm();
            total += length * self.data.mean_along(&w[0], &w[1]);
            total += self.weights.length * length;
        }
        for pair in steps.windows(2) {
            total += regularize(
                self.weights.curvature,
                turning_angle(&pair[0], &pair[1]),
                self.weights.curvature_power,
            );
        }
        for triple in steps.windows(3) {
            total += regularize(
                self.weights.torsion,
                dihedral_angle(&triple[0], &triple[1], &triple[2]),
                self.weights.torsion_power,
            );
        }
        total
    }
}

impl Objective for CurveEnergy<'_> {
    fn dim(&self) -> usize {
        self.interior * 3
    }

    fn value(&self, x: &DVector<f64>) -> f64 {
        self.energy(&self.unpack(x))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ce_grid::GridMesh;

    struct Bowl;

    impl Objective for Bowl {
        fn dim(&self) -> usize {
            2
        }

        fn value(&self, x: &DVector<f64>) -> f64 {
            (x[0] - 1.0).powi(2) + 3.0 * (x[1] + 2.0).powi(2)
        }
    }

    #[test]
    fn test_numeric_gradient() {
        let g = Bowl.gradient(&DVector::from_vec(vec![0.0, 0.0]));
        assert_relative_eq!(g[0], -2.0, epsilon = 1e-6);
        assert_relative_eq!(g[1], 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pack_unpack() {
        let mesh = GridMesh::new(4, 4, 1).unwrap();
        let data = Volume::filled(mesh, 1.0);
        let path = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let energy = CurveEnergy::new(&data, &InstanceSettings::new(), &path);
        let x = energy.pack(&path);
        assert_eq!(x.len(), 6);
        assert_eq!(energy.dim(), 6);
        assert_eq!(energy.unpack(&x), path.to_vec());
    }

    #[test]
    fn test_energy_terms() {
        let mesh = GridMesh::new(3, 3, 1).unwrap();
        let data = Volume::filled(mesh, 2.0);
        let settings = InstanceSettings::new()
            .with_length_penalty(1.0)
            .with_curvature_penalty(1.0)
            .with_curvature_power(1.0);
        let path = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let energy = CurveEnergy::new(&data, &settings, &path);
        // Two unit segments: data 2 + length 1 each, one right-angle turn.
        assert_relative_eq!(
            energy.energy(&path),
            6.0 + std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_single_point_path() {
        let mesh = GridMesh::new(1, 1, 1).unwrap();
        let data = Volume::filled(mesh, 1.0);
        let path = [Point3::new(0.0, 0.0, 0.0)];
        let energy = CurveEnergy::new(&data, &InstanceSettings::new(), &path);
        assert_eq!(energy.dim(), 0);
        assert_eq!(energy.unpack(&DVector::zeros(0)), path.to_vec());
        assert_relative_eq!(energy.energy(&path), 0.0);
    }
}
