//! Transition cost policies.
//!
//! The cost of a curve is the sum, over its steps, of a data term, a length
//! term, a curvature term for every turn, and a torsion term for every
//! twist. Each sub-term is a policy trait so that alternative
//! discretizations can be plugged in without touching the search:
//!
//! | Term | Trait | Default |
//! |------|-------|---------|
//! | data | [`DataCost`] | [`NearestVoxel`] or [`LinearInterpolation`] |
//! | length | [`LengthCost`] | [`EuclideanLength`] |
//! | curvature | [`CurvatureCost`] | [`TurningAngle`] |
//! | torsion | [`TorsionCost`] | [`DihedralAngle`] |
//!
//! [`CostModel`] combines them with the weights and powers of an
//! [`InstanceSettings`].
//!
//! # Example
//!
//! ```
//! use curve_search::cost::{CostModel, NearestVoxel};
//! use curve_types::InstanceSettings;
//! use ce_grid::{GridMesh, Point, Vector3, Volume};
//!
//! let mesh = GridMesh::new(3, 1, 1).unwrap();
//! let data = Volume::filled(mesh, 2.0);
//! let settings = InstanceSettings::new().with_length_penalty(1.0);
//!
//! let model = CostModel::new(NearestVoxel::new(&data), &settings);
//! let cost = model.step_cost(Point::new(0, 0, 0), Point::new(1, 0, 0), &Vector3::x());
//! assert!((cost - 3.0).abs() < 1e-12);
//! ```

use ce_grid::{Point, Point3, Vector3, Volume};
use curve_types::{CurveError, InstanceSettings};

/// Data term of a single step.
pub trait DataCost: Sync {
    /// Cost of moving from `from` to `to`; `length` is the physical step
    /// length.
    fn step_cost(&self, from: Point, to: Point, length: f64) -> f64;

    /// A lower bound on the data cost per unit of physical length, for
    /// steps no longer than `max_step`.
    fn rate_lower_bound(&self, max_step: f64) -> f64;
}

/// Length term of a single step.
pub trait LengthCost: Sync {
    /// Length of a physical step vector.
    fn length(&self, step: &Vector3<f64>) -> f64;

    /// A lower bound on length per unit of straight-line distance.
    fn rate_lower_bound(&self) -> f64 {
        0.0
    }
}

/// Curvature magnitude of a turn between two consecutive steps.
pub trait CurvatureCost: Sync {
    /// Curvature of the turn from `incoming` to `outgoing`.
    fn curvature(&self, incoming: &Vector3<f64>, outgoing: &Vector3<f64>) -> f64;
}

/// Torsion magnitude of three consecutive steps.
pub trait TorsionCost: Sync {
    /// Torsion of the steps `a`, `b`, `c`.
    fn torsion(&self, a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64;
}

/// Data value at the voxel a step lands on.
#[derive(Debug, Clone, Copy)]
pub struct NearestVoxel<'a> {
    data: &'a Volume<f64>,
    min: f64,
}

impl<'a> NearestVoxel<'a> {
    /// Wraps a data volume.
    #[must_use]
    pub fn new(data: &'a Volume<f64>) -> Self {
        Self {
            data,
            min: data.min_value(),
        }
    }
}

impl DataCost for NearestVoxel<'_> {
    fn step_cost(&self, _from: Point, to: Point, _length: f64) -> f64 {
        self.data.get(to).copied().unwrap_or(f64::INFINITY)
    }

    fn rate_lower_bound(&self, max_step: f64) -> f64 {
        if max_step > 0.0 {
            self.min.max(0.0) / max_step
        } else {
            0.0
        }
    }
}

/// Line integral of the trilinearly interpolated data along a step.
///
/// The integral is taken with the midpoint rule, two samples per voxel of
/// travel, and scaled by the physical step length.
#[derive(Debug, Clone, Copy)]
pub struct LinearInterpolation<'a> {
    data: &'a Volume<f64>,
    min: f64,
}

impl<'a> LinearInterpolation<'a> {
    /// Wraps a data volume.
    #[must_use]
    pub fn new(data: &'a Volume<f64>) -> Self {
        Self {
            data,
            min: data.min_value(),
        }
    }

    /// Mean interpolated value along the straight segment `from`–`to`, in
    /// grid coordinates.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn mean_along(&self, from: &Point3<f64>, to: &Point3<f64>) -> f64 {
        let span = (to - from).amax();
        let samples = ((span * 2.0).ceil().max(1.0)) as usize;
        let total: f64 = (0..samples)
            .map(|i| {
                let t = (i as f64 + 0.5) / samples as f64;
                self.data.sample_linear(&from.lerp(to, t))
            })
            .sum();
        total / samples as f64
    }
}

impl DataCost for LinearInterpolation<'_> {
    fn step_cost(&self, from: Point, to: Point, length: f64) -> f64 {
        length * self.mean_along(&from.to_point(), &to.to_point())
    }

    fn rate_lower_bound(&self, _max_step: f64) -> f64 {
        self.min.max(0.0)
    }
}

/// Physical Euclidean step length.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanLength;

impl LengthCost for EuclideanLength {
    fn length(&self, step: &Vector3<f64>) -> f64 {
        step.norm()
    }

    fn rate_lower_bound(&self) -> f64 {
        1.0
    }
}

/// Angle between consecutive step directions, in `[0, π]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurningAngle;

impl CurvatureCost for TurningAngle {
    fn curvature(&self, incoming: &Vector3<f64>, outgoing: &Vector3<f64>) -> f64 {
        turning_angle(incoming, outgoing)
    }
}

/// Angle between the planes of two consecutive turns, in `[0, π/2]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DihedralAngle;

impl TorsionCost for DihedralAngle {
    fn torsion(&self, a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
        dihedral_angle(a, b, c)
    }
}

/// Angle between two direction vectors, in `[0, π]`.
///
/// Zero if either vector has zero length.
///
/// # Example
///
/// ```
/// use curve_search::cost::turning_angle;
/// use ce_grid::Vector3;
///
/// let right = turning_angle(&Vector3::x(), &Vector3::y());
/// assert!((right - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// assert_eq!(turning_angle(&Vector3::x(), &Vector3::x()), 0.0);
/// ```
#[must_use]
pub fn turning_angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let norms = a.norm() * b.norm();
    if norms <= f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / norms).clamp(-1.0, 1.0).acos()
}

/// Angle between the plane of `(a, b)` and the plane of `(b, c)`, in
/// `[0, π/2]`.
///
/// Zero when either pair is collinear, and for every planar configuration.
///
/// # Example
///
/// ```
/// use curve_search::cost::dihedral_angle;
/// use ce_grid::Vector3;
///
/// // S-bend in the xy plane.
/// let planar = dihedral_angle(&Vector3::x(), &Vector3::y(), &Vector3::x());
/// assert!(planar.abs() < 1e-12);
///
/// // Leaving the plane.
/// let twisted = dihedral_angle(&Vector3::x(), &Vector3::y(), &Vector3::z());
/// assert!((twisted - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
#[must_use]
pub fn dihedral_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    const COLLINEAR: f64 = 1e-12;

    let first = a.cross(b);
    let second = b.cross(c);
    let n1 = first.norm();
    let n2 = second.norm();
    if n1 <= COLLINEAR * a.norm() * b.norm() || n2 <= COLLINEAR * b.norm() * c.norm() {
        return 0.0;
    }
    (first.dot(&second).abs() / (n1 * n2)).clamp(0.0, 1.0).acos()
}

/// `weight · max(magnitude, 0)^power`, with a zero magnitude contributing
/// zero for every power.
///
/// # Example
///
/// ```
/// use curve_search::cost::regularize;
///
/// assert_eq!(regularize(2.0, 3.0, 2.0), 18.0);
/// assert_eq!(regularize(1.0, 0.0, 0.0), 0.0);
/// assert_eq!(regularize(1.0, -1.0, 0.5), 0.0);
/// ```
#[must_use]
pub fn regularize(weight: f64, magnitude: f64, power: f64) -> f64 {
    if weight == 0.0 {
        return 0.0;
    }
    let magnitude = magnitude.max(0.0);
    if magnitude == 0.0 {
        return 0.0;
    }
    weight * magnitude.powf(power)
}

/// Checks that every data value is finite and non-negative.
///
/// # Errors
///
/// Returns [`CurveError::InvalidConfig`] naming the first offending voxel.
pub fn validate_data(data: &Volume<f64>) -> Result<(), CurveError> {
    match data.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        Some((p, v)) => Err(CurveError::invalid_config(format!(
            "data value {v} at {p} must be finite and non-negative"
        ))),
        None => Ok(()),
    }
}

/// Weights and powers copied out of the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Length weight.
    pub length: f64,
    /// Curvature weight.
    pub curvature: f64,
    /// Torsion weight.
    pub torsion: f64,
    /// Curvature exponent.
    pub curvature_power: f64,
    /// Torsion exponent.
    pub torsion_power: f64,
}

impl Weights {
    /// Reads the weights from settings.
    #[must_use]
    pub const fn from_settings(settings: &InstanceSettings) -> Self {
        Self {
            length: settings.length_penalty(),
            curvature: settings.curvature_penalty(),
            torsion: settings.torsion_penalty(),
            curvature_power: settings.curvature_power(),
            torsion_power: settings.torsion_power(),
        }
    }
}

/// A data policy combined with length, curvature, and torsion policies.
#[derive(Debug, Clone)]
pub struct CostModel<D, L = EuclideanLength, C = TurningAngle, T = DihedralAngle> {
    data: D,
    length: L,
    curvature: C,
    torsion: T,
    weights: Weights,
    voxel_dimensions: [f64; 3],
}

impl<D: DataCost> CostModel<D> {
    /// Uses the default geometric policies.
    #[must_use]
    pub const fn new(data: D, settings: &InstanceSettings) -> Self {
        Self::with_policies(
            data,
            EuclideanLength,
            TurningAngle,
            DihedralAngle,
            settings,
        )
    }
}

impl<D, L, C, T> CostModel<D, L, C, T> {
    /// Uses explicit policies for every term.
    #[must_use]
    pub const fn with_policies(
        data: D,
        length: L,
        curvature: C,
        torsion: T,
        settings: &InstanceSettings,
    ) -> Self {
        Self {
            data,
            length,
            curvature,
            torsion,
            weights: Weights::from_settings(settings),
            voxel_dimensions: *settings.voxel_dimensions(),
        }
    }

    /// The weights in use.
    #[must_use]
    pub const fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Physical size of a voxel along each axis.
    #[must_use]
    pub const fn voxel_dimensions(&self) -> &[f64; 3] {
        &self.voxel_dimensions
    }
}

impl<D, L, C, T> CostModel<D, L, C, T>
where
    D: DataCost,
    L: LengthCost,
    C: CurvatureCost,
    T: TorsionCost,
{
    /// Data plus weighted length of a step whose physical vector is `step`.
    #[must_use]
    pub fn step_cost(&self, from: Point, to: Point, step: &Vector3<f64>) -> f64 {
        let data = self.data.step_cost(from, to, step.norm());
        if self.weights.length == 0.0 {
            data
        } else {
            self.weights.length.mul_add(self.length.length(step), data)
        }
    }

    /// Weighted curvature of the turn from `incoming` to `outgoing`.
    #[must_use]
    pub fn turn_cost(&self, incoming: &Vector3<f64>, outgoing: &Vector3<f64>) -> f64 {
        if self.weights.curvature == 0.0 {
            return 0.0;
        }
        regularize(
            self.weights.curvature,
            self.curvature.curvature(incoming, outgoing),
            self.weights.curvature_power,
        )
    }

    /// Weighted torsion of the steps `a`, `b`, `c`.
    #[must_use]
    pub fn twist_cost(&self, a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
        if self.weights.torsion == 0.0 {
            return 0.0;
        }
        regularize(
            self.weights.torsion,
            self.torsion.torsion(a, b, c),
            self.weights.torsion_power,
        )
    }

    /// A lower bound on cost per unit of straight-line physical distance.
    ///
    /// `max_step` is the longest physical step in the connectivity table.
    #[must_use]
    pub fn rate_lower_bound(&self, max_step: f64) -> f64 {
        self.weights
            .length
            .mul_add(self.length.rate_lower_bound(), self.data.rate_lower_bound(max_step))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ce_grid::GridMesh;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn ramp() -> Volume<f64> {
        let mesh = GridMesh::new(5, 1, 1).unwrap();
        Volume::from_fn(mesh, |p| f64::from(p.x))
    }

    #[test]
    fn test_nearest_takes_target_value() {
        let data = ramp();
        let policy = NearestVoxel::new(&data);
        assert_eq!(policy.step_cost(Point::new(0, 0, 0), Point::new(3, 0, 0), 3.0), 3.0);
        assert_eq!(policy.step_cost(Point::origin(), Point::new(9, 0, 0), 1.0), f64::INFINITY);
    }

    #[test]
    fn test_linear_interpolation_integrates_ramp() {
        let data = ramp();
        let policy = LinearInterpolation::new(&data);
        // Mean of a linear ramp between x = 1 and x = 3 is 2.
        let cost = policy.step_cost(Point::new(1, 0, 0), Point::new(3, 0, 0), 2.0);
        assert_relative_eq!(cost, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_interpolation_scales_with_physical_length() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        let data = Volume::filled(mesh, 1.5);
        let policy = LinearInterpolation::new(&data);
        let cost = policy.step_cost(Point::new(0, 0, 0), Point::new(1, 0, 0), 0.25);
        assert_relative_eq!(cost, 0.375, epsilon = 1e-12);
    }

    #[test]
    fn test_turning_angle_range() {
        assert_relative_eq!(turning_angle(&Vector3::x(), &-Vector3::x()), PI);
        assert_relative_eq!(turning_angle(&Vector3::x(), &Vector3::y()), FRAC_PI_2);
        assert_eq!(turning_angle(&Vector3::zeros(), &Vector3::y()), 0.0);
    }

    #[test]
    fn test_dihedral_zero_when_collinear() {
        let a = Vector3::x();
        assert_eq!(dihedral_angle(&a, &a, &Vector3::z()), 0.0);
        assert_eq!(dihedral_angle(&Vector3::z(), &a, &a), 0.0);
    }

    #[test]
    fn test_dihedral_diagonal_twist() {
        let angle = dihedral_angle(&Vector3::x(), &Vector3::y(), &Vector3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(angle, PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regularize_fractional_power() {
        assert_relative_eq!(regularize(1.0, 4.0, 0.5), 2.0);
        assert_eq!(regularize(0.0, 4.0, 2.0), 0.0);
        assert_eq!(regularize(1.0, f64::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_validate_data() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        assert!(validate_data(&Volume::filled(mesh, 0.0)).is_ok());
        let bad = Volume::from_vec(mesh, vec![1.0, -0.5]).unwrap();
        assert!(validate_data(&bad).unwrap_err().is_config());
        let nan = Volume::from_vec(mesh, vec![f64::NAN, 1.0]).unwrap();
        assert!(validate_data(&nan).is_err());
    }

    #[test]
    fn test_model_terms() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        let data = Volume::filled(mesh, 0.0);
        let settings = InstanceSettings::new()
            .with_length_penalty(2.0)
            .with_curvature_penalty(3.0)
            .with_curvature_power(1.0)
            .with_torsion_penalty(1.0);
        let model = CostModel::new(NearestVoxel::new(&data), &settings);

        let step = Vector3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(model.step_cost(Point::origin(), Point::new(1, 0, 0), &step), 10.0);
        assert_relative_eq!(model.turn_cost(&Vector3::x(), &Vector3::y()), 3.0 * FRAC_PI_2);
        assert_relative_eq!(
            model.twist_cost(&Vector3::x(), &Vector3::y(), &Vector3::z()),
            FRAC_PI_2 * FRAC_PI_2
        );
        assert_relative_eq!(model.rate_lower_bound(1.0), 2.0);
    }

    #[test]
    fn test_rate_lower_bound_policies() {
        let mesh = GridMesh::new(2, 1, 1).unwrap();
        let data = Volume::from_vec(mesh, vec![3.0, 4.0]).unwrap();
        let settings = InstanceSettings::new();
        let nearest = CostModel::new(NearestVoxel::new(&data), &settings);
        let linear = CostModel::new(LinearInterpolation::new(&data), &settings);
        assert_relative_eq!(nearest.rate_lower_bound(2.0), 1.5);
        assert_relative_eq!(linear.rate_lower_bound(2.0), 3.0);
    }
}
