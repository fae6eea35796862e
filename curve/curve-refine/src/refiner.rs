//! Refinement of a discrete curve into a continuous one.

use ce_grid::{Point3, Volume};
use curve_types::{CurveError, DescentMethod, InstanceSettings, SegmentationOutput, TimingContext};
use nalgebra::DVector;
use tracing::{debug, info};

use crate::objective::{CurveEnergy, Objective};
use crate::params::{DescentParams, Minimum};
use crate::{lbfgs, nelder_mead};

/// A continuous polyline produced from a discrete one.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    points: Vec<Point3<f64>>,
    cost: f64,
    initial_cost: f64,
    iterations: usize,
    converged: bool,
}

impl Refinement {
    /// Refined vertices in grid coordinates, endpoints unchanged.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Energy of the refined curve.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Energy of the curve the refiner started from.
    #[must_use]
    pub const fn initial_cost(&self) -> f64 {
        self.initial_cost
    }

    /// Descent iterations performed.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// `false` when the iteration cap was hit before a tolerance was met.
    /// The best iterate is still returned.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.converged
    }
}

/// A local minimizer that can polish curves.
pub trait LocalRefiner {
    /// Minimizes `objective` starting from `initial`.
    fn minimize(&self, objective: &dyn Objective, initial: DVector<f64>) -> Minimum;

    /// Moves the interior vertices of `initial` to lower `energy`.
    fn refine(&self, energy: &CurveEnergy<'_>, initial: &[Point3<f64>]) -> Refinement {
        let initial_cost = energy.energy(initial);
        let minimum = self.minimize(energy, energy.pack(initial));

        // Never hand back something worse than the input.
        let (points, cost) = if minimum.value <= initial_cost {
            (energy.unpack(&minimum.x), minimum.value)
        } else {
            (initial.to_vec(), initial_cost)
        };
        Refinement {
            points,
            cost,
            initial_cost,
            iterations: minimum.iterations,
            converged: minimum.converged,
        }
    }
}

/// L-BFGS or Nelder-Mead, chosen by [`DescentMethod`].
///
/// # Example
///
/// ```
/// use curve_refine::{DescentParams, DescentRefiner, LocalRefiner, Objective};
/// use curve_types::DescentMethod;
/// use nalgebra::DVector;
///
/// struct Parabola;
///
/// impl Objective for Parabola {
///     fn dim(&self) -> usize { 1 }
///     fn value(&self, x: &DVector<f64>) -> f64 { (x[0] - 2.0).powi(2) }
/// }
///
/// let refiner = DescentRefiner::new(DescentMethod::NelderMead, DescentParams::default());
/// let min = refiner.minimize(&Parabola, DVector::zeros(1));
/// assert!((min.x[0] - 2.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentRefiner {
    method: DescentMethod,
    params: DescentParams,
}

impl DescentRefiner {
    /// Creates a refiner.
    #[must_use]
    pub const fn new(method: DescentMethod, params: DescentParams) -> Self {
        Self { method, params }
    }

    /// Reads the method, iteration cap, and tolerances from settings.
    #[must_use]
    pub fn from_settings(settings: &InstanceSettings) -> Self {
        Self::new(
            settings.descent_method(),
            DescentParams::from_settings(settings),
        )
    }

    /// The descent method.
    #[must_use]
    pub const fn method(&self) -> DescentMethod {
        self.method
    }

    /// The stopping parameters.
    #[must_use]
    pub const fn params(&self) -> &DescentParams {
        &self.params
    }
}

impl LocalRefiner for DescentRefiner {
    fn minimize(&self, objective: &dyn Objective, initial: DVector<f64>) -> Minimum {
        match self.method {
            DescentMethod::Lbfgs => lbfgs::minimize(objective, initial, &self.params),
            DescentMethod::NelderMead => nelder_mead::minimize(objective, initial, &self.params),
        }
    }
}

/// Refines the curve of a segmentation with the method in `settings`.
///
/// The output is left untouched; the data term is always trilinear.
///
/// # Errors
///
/// Returns [`CurveError::InvalidConfig`] if the settings are invalid or the
/// output has no curve.
pub fn refine_output(
    output: &SegmentationOutput,
    data: &Volume<f64>,
    settings: &InstanceSettings,
) -> Result<Refinement, CurveError> {
    settings.validate()?;
    if output.is_empty() {
        return Err(CurveError::invalid_config(
            "cannot refine an empty curve (unreachable segmentation)",
        ));
    }

    let mut timing = TimingContext::new(settings.verbose());
    let (energy, initial) = CurveEnergy::from_grid_path(data, settings, output.points());
    let refiner = DescentRefiner::from_settings(settings);
    timing.lap("objective construction");

    let refinement = refiner.refine(&energy, &initial);
    timing.lap("descent");

    if settings.verbose() {
        info!(
            method = %refiner.method(),
            variables = energy.dim(),
            initial_cost = refinement.initial_cost(),
            cost = refinement.cost(),
            iterations = refinement.iterations(),
            converged = refinement.converged(),
            seconds = timing.total().as_secs_f64(),
            "refinement finished"
        );
    } else {
        debug!(
            method = %refiner.method(),
            cost = refinement.cost(),
            converged = refinement.converged(),
            "refinement finished"
        );
    }
    Ok(refinement)
}
