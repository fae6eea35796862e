//! Per-call settings for curve extraction.
//!
//! [`InstanceSettings`] is built once per call with `with_*` builders,
//! validated before any search starts, and read-only afterwards.
//!
//! # Example
//!
//! ```
//! use curve_types::{DescentMethod, InstanceSettings, RegularizationOrder};
//!
//! let settings = InstanceSettings::default()
//!     .with_length_penalty(1.0)
//!     .with_curvature_penalty(0.5)
//!     .with_use_a_star(true)
//!     .with_descent_method("nelder-mead".parse::<DescentMethod>().unwrap());
//!
//! assert!(settings.validate().is_ok());
//! assert_eq!(settings.regularization_order(), RegularizationOrder::Edge);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::CurveError;

/// Local descent algorithm used by the refinement stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescentMethod {
    /// Limited-memory BFGS quasi-Newton descent.
    #[default]
    Lbfgs,
    /// Derivative-free simplex descent.
    NelderMead,
}

impl DescentMethod {
    /// The setting string for this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lbfgs => "lbfgs",
            Self::NelderMead => "nelder-mead",
        }
    }
}

impl FromStr for DescentMethod {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lbfgs" => Ok(Self::Lbfgs),
            "nelder-mead" => Ok(Self::NelderMead),
            other => Err(CurveError::invalid_config(format!(
                "Unknown descent_method: {other}"
            ))),
        }
    }
}

impl fmt::Display for DescentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the data term of a single step is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Data value of the voxel the step lands on.
    Nearest,
    /// Line integral of the trilinearly interpolated volume along the step.
    #[default]
    LinearInterpolation,
}

impl DataType {
    /// The setting string for this data term.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::LinearInterpolation => "linear_interpolation",
        }
    }
}

impl FromStr for DataType {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "linear_interpolation" => Ok(Self::LinearInterpolation),
            other => Err(CurveError::invalid_config(format!(
                "Unknown data_type: {other}"
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which state graph a call searches, derived from the active penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegularizationOrder {
    /// States are grid nodes; data and length terms only.
    Node,
    /// States carry the incoming edge; adds curvature.
    Edge,
    /// States carry the last two edges; adds torsion.
    EdgePair,
}

/// Configuration snapshot for one segmentation call.
///
/// Defaults:
/// - regularization radius 4.0, all penalties 0.0, powers 2.0
/// - Dijkstra (no A*), no diagnostic outputs, single-goal search
/// - refinement tolerances 1e-12, 1000 iterations, L-BFGS
/// - all cores, linear-interpolation data term, unit voxels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceSettings {
    verbose: bool,
    regularization_radius: f64,
    length_penalty: f64,
    curvature_penalty: f64,
    torsion_penalty: f64,
    curvature_power: f64,
    torsion_power: f64,
    use_a_star: bool,
    store_visit_time: bool,
    store_parents: bool,
    store_distances: bool,
    compute_all_distances: bool,
    function_improvement_tolerance: f64,
    argument_improvement_tolerance: f64,
    num_threads: i32,
    maxiter: usize,
    descent_method: DescentMethod,
    data_type: DataType,
    voxel_dimensions: [f64; 3],
}

impl InstanceSettings {
    /// Creates settings with the defaults listed on the type.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            verbose: false,
            regularization_radius: 4.0,
            length_penalty: 0.0,
            curvature_penalty: 0.0,
            torsion_penalty: 0.0,
            curvature_power: 2.0,
            torsion_power: 2.0,
            use_a_star: false,
            store_visit_time: false,
            store_parents: false,
            store_distances: false,
            compute_all_distances: false,
            function_improvement_tolerance: 1e-12,
            argument_improvement_tolerance: 1e-12,
            num_threads: -1,
            maxiter: 1000,
            descent_method: DescentMethod::Lbfgs,
            data_type: DataType::LinearInterpolation,
            voxel_dimensions: [1.0, 1.0, 1.0],
        }
    }

    /// Enables progress and timing diagnostics at `info` level.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the maximum extent of curvature/torsion interactions.
    #[must_use]
    pub const fn with_regularization_radius(mut self, radius: f64) -> Self {
        self.regularization_radius = radius;
        self
    }

    /// Sets the path length weight.
    #[must_use]
    pub const fn with_length_penalty(mut self, weight: f64) -> Self {
        self.length_penalty = weight;
        self
    }

    /// Sets the curvature weight.
    #[must_use]
    pub const fn with_curvature_penalty(mut self, weight: f64) -> Self {
        self.curvature_penalty = weight;
        self
    }

    /// Sets the torsion weight.
    #[must_use]
    pub const fn with_torsion_penalty(mut self, weight: f64) -> Self {
        self.torsion_penalty = weight;
        self
    }

    /// Sets the exponent applied to the curvature magnitude.
    #[must_use]
    pub const fn with_curvature_power(mut self, power: f64) -> Self {
        self.curvature_power = power;
        self
    }

    /// Sets the exponent applied to the torsion magnitude.
    #[must_use]
    pub const fn with_torsion_power(mut self, power: f64) -> Self {
        self.torsion_power = power;
        self
    }

    /// Enables heuristic-guided (A*) search.
    #[must_use]
    pub const fn with_use_a_star(mut self, enable: bool) -> Self {
        self.use_a_star = enable;
        self
    }

    /// Requests the per-node visit order map.
    #[must_use]
    pub const fn with_store_visit_time(mut self, enable: bool) -> Self {
        self.store_visit_time = enable;
        self
    }

    /// Requests the per-node parent map (shortest path tree).
    #[must_use]
    pub const fn with_store_parents(mut self, enable: bool) -> Self {
        self.store_parents = enable;
        self
    }

    /// Requests the per-node distance map.
    #[must_use]
    pub const fn with_store_distances(mut self, enable: bool) -> Self {
        self.store_distances = enable;
        self
    }

    /// Runs the search until the frontier is exhausted instead of stopping
    /// at the goal.
    #[must_use]
    pub const fn with_compute_all_distances(mut self, enable: bool) -> Self {
        self.compute_all_distances = enable;
        self
    }

    /// Sets the refinement stopping tolerance on function improvement.
    #[must_use]
    pub const fn with_function_improvement_tolerance(mut self, tolerance: f64) -> Self {
        self.function_improvement_tolerance = tolerance;
        self
    }

    /// Sets the refinement stopping tolerance on argument change.
    #[must_use]
    pub const fn with_argument_improvement_tolerance(mut self, tolerance: f64) -> Self {
        self.argument_improvement_tolerance = tolerance;
        self
    }

    /// Sets the worker pool size; `-1` uses all available cores.
    #[must_use]
    pub const fn with_num_threads(mut self, threads: i32) -> Self {
        self.num_threads = threads;
        self
    }

    /// Sets the refinement iteration cap.
    #[must_use]
    pub const fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Sets the refinement algorithm.
    #[must_use]
    pub const fn with_descent_method(mut self, method: DescentMethod) -> Self {
        self.descent_method = method;
        self
    }

    /// Sets the data term policy.
    #[must_use]
    pub const fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Sets the physical size of a voxel along each axis.
    #[must_use]
    pub const fn with_voxel_dimensions(mut self, dimensions: [f64; 3]) -> Self {
        self.voxel_dimensions = dimensions;
        self
    }

    /// Whether progress diagnostics are enabled.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Maximum extent of curvature/torsion interactions.
    #[must_use]
    pub const fn regularization_radius(&self) -> f64 {
        self.regularization_radius
    }

    /// Path length weight.
    #[must_use]
    pub const fn length_penalty(&self) -> f64 {
        self.length_penalty
    }

    /// Curvature weight.
    #[must_use]
    pub const fn curvature_penalty(&self) -> f64 {
        self.curvature_penalty
    }

    /// Torsion weight.
    #[must_use]
    pub const fn torsion_penalty(&self) -> f64 {
        self.torsion_penalty
    }

    /// Curvature exponent.
    #[must_use]
    pub const fn curvature_power(&self) -> f64 {
        self.curvature_power
    }

    /// Torsion exponent.
    #[must_use]
    pub const fn torsion_power(&self) -> f64 {
        self.torsion_power
    }

    /// Whether A* is used.
    #[must_use]
    pub const fn use_a_star(&self) -> bool {
        self.use_a_star
    }

    /// Whether the visit order map is requested.
    #[must_use]
    pub const fn store_visit_time(&self) -> bool {
        self.store_visit_time
    }

    /// Whether the parent map is requested.
    #[must_use]
    pub const fn store_parents(&self) -> bool {
        self.store_parents
    }

    /// Whether the distance map is requested.
    #[must_use]
    pub const fn store_distances(&self) -> bool {
        self.store_distances
    }

    /// Whether the whole reachable graph is searched.
    #[must_use]
    pub const fn compute_all_distances(&self) -> bool {
        self.compute_all_distances
    }

    /// Refinement tolerance on function improvement.
    #[must_use]
    pub const fn function_improvement_tolerance(&self) -> f64 {
        self.function_improvement_tolerance
    }

    /// Refinement tolerance on argument change.
    #[must_use]
    pub const fn argument_improvement_tolerance(&self) -> f64 {
        self.argument_improvement_tolerance
    }

    /// Configured worker pool size (`-1` = all cores).
    #[must_use]
    pub const fn num_threads(&self) -> i32 {
        self.num_threads
    }

    /// Worker pool size to request from a thread pool builder, where `0`
    /// means "let the pool decide".
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        usize::try_from(self.num_threads).unwrap_or(0)
    }

    /// Refinement iteration cap.
    #[must_use]
    pub const fn maxiter(&self) -> usize {
        self.maxiter
    }

    /// Refinement algorithm.
    #[must_use]
    pub const fn descent_method(&self) -> DescentMethod {
        self.descent_method
    }

    /// Data term policy.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Physical size of a voxel along each axis.
    #[must_use]
    pub const fn voxel_dimensions(&self) -> &[f64; 3] {
        &self.voxel_dimensions
    }

    /// The state graph implied by the active penalties.
    ///
    /// Torsion needs edge-pair history, curvature needs edge history,
    /// anything else runs on plain nodes.
    #[must_use]
    pub fn regularization_order(&self) -> RegularizationOrder {
        if self.torsion_penalty > 0.0 {
            RegularizationOrder::EdgePair
        } else if self.curvature_penalty > 0.0 {
            RegularizationOrder::Edge
        } else {
            RegularizationOrder::Node
        }
    }

    /// Lists every problem with the current values.
    #[must_use]
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let non_negative = [
            ("length_penalty", self.length_penalty),
            ("curvature_penalty", self.curvature_penalty),
            ("torsion_penalty", self.torsion_penalty),
            ("curvature_power", self.curvature_power),
            ("torsion_power", self.torsion_power),
            (
                "function_improvement_tolerance",
                self.function_improvement_tolerance,
            ),
            (
                "argument_improvement_tolerance",
                self.argument_improvement_tolerance,
            ),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                issues.push(format!("{name} must be finite and non-negative, got {value}"));
            }
        }

        if !self.regularization_radius.is_finite() || self.regularization_radius <= 0.0 {
            issues.push(format!(
                "regularization_radius must be positive, got {}",
                self.regularization_radius
            ));
        }

        if self
            .voxel_dimensions
            .iter()
            .any(|d| !d.is_finite() || *d <= 0.0)
        {
            issues.push(format!(
                "voxel_dimensions must be positive, got {:?}",
                self.voxel_dimensions
            ));
        }

        if self.num_threads == 0 || self.num_threads < -1 {
            issues.push(format!(
                "num_threads must be -1 or positive, got {}",
                self.num_threads
            ));
        }

        issues
    }

    /// Fails fast on the first call with invalid settings.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidConfig`] listing every issue.
    pub fn validate(&self) -> Result<(), CurveError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CurveError::invalid_config(issues.join("; ")))
        }
    }
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = InstanceSettings::default();
        assert!(!s.verbose());
        assert_eq!(s.regularization_radius(), 4.0);
        assert_eq!(s.length_penalty(), 0.0);
        assert_eq!(s.curvature_penalty(), 0.0);
        assert_eq!(s.torsion_penalty(), 0.0);
        assert_eq!(s.curvature_power(), 2.0);
        assert_eq!(s.torsion_power(), 2.0);
        assert!(!s.use_a_star());
        assert!(!s.store_visit_time());
        assert!(!s.store_parents());
        assert!(!s.store_distances());
        assert!(!s.compute_all_distances());
        assert_eq!(s.function_improvement_tolerance(), 1e-12);
        assert_eq!(s.argument_improvement_tolerance(), 1e-12);
        assert_eq!(s.num_threads(), -1);
        assert_eq!(s.worker_threads(), 0);
        assert_eq!(s.maxiter(), 1000);
        assert_eq!(s.descent_method(), DescentMethod::Lbfgs);
        assert_eq!(s.data_type(), DataType::LinearInterpolation);
        assert_eq!(s.voxel_dimensions(), &[1.0, 1.0, 1.0]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_descent_method_parse() {
        assert_eq!("lbfgs".parse::<DescentMethod>().unwrap(), DescentMethod::Lbfgs);
        assert_eq!(
            "nelder-mead".parse::<DescentMethod>().unwrap(),
            DescentMethod::NelderMead
        );
        let error = "nelder_mead".parse::<DescentMethod>().unwrap_err();
        assert!(error.is_config());
        assert!(error.to_string().contains("Unknown descent_method"));
    }

    #[test]
    fn test_descent_method_display_round_trip() {
        for method in [DescentMethod::Lbfgs, DescentMethod::NelderMead] {
            assert_eq!(method.to_string().parse::<DescentMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_data_type_parse() {
        assert_eq!(
            "linear_interpolation".parse::<DataType>().unwrap(),
            DataType::LinearInterpolation
        );
        assert_eq!("nearest".parse::<DataType>().unwrap(), DataType::Nearest);
        assert!("cubic".parse::<DataType>().is_err());
    }

    #[test]
    fn test_regularization_order() {
        let s = InstanceSettings::default().with_length_penalty(3.0);
        assert_eq!(s.regularization_order(), RegularizationOrder::Node);

        let s = s.with_curvature_penalty(1.0);
        assert_eq!(s.regularization_order(), RegularizationOrder::Edge);

        let s = s.with_torsion_penalty(0.1);
        assert_eq!(s.regularization_order(), RegularizationOrder::EdgePair);

        let s = InstanceSettings::default().with_torsion_penalty(0.1);
        assert_eq!(s.regularization_order(), RegularizationOrder::EdgePair);
    }

    #[test]
    fn test_validate_rejects_negative_penalty() {
        let s = InstanceSettings::default().with_curvature_penalty(-1.0);
        let error = s.validate().unwrap_err();
        assert!(error.to_string().contains("curvature_penalty"));
    }

    #[test]
    fn test_validate_rejects_nan_power() {
        let s = InstanceSettings::default().with_torsion_power(f64::NAN);
        assert_eq!(s.issues().len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_threads() {
        assert!(InstanceSettings::default().with_num_threads(0).validate().is_err());
        assert!(InstanceSettings::default().with_num_threads(-2).validate().is_err());
        let s = InstanceSettings::default().with_num_threads(4);
        assert!(s.validate().is_ok());
        assert_eq!(s.worker_threads(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let s = InstanceSettings::default()
            .with_regularization_radius(0.0)
            .with_voxel_dimensions([1.0, 0.0, 1.0]);
        let issues = s.issues();
        assert_eq!(issues.len(), 2);
        assert!(s.validate().unwrap_err().to_string().contains("voxel_dimensions"));
    }
}
