//! Stopping rules and the result of a minimization.

use curve_types::InstanceSettings;
use nalgebra::DVector;

/// Parameters shared by every descent method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentParams {
    /// Maximum number of iterations (default: 1000).
    pub max_iterations: usize,
    /// Stop when the objective improves by less than this, relative to its
    /// magnitude (default: 1e-12).
    pub function_tolerance: f64,
    /// Stop when the iterate moves by less than this, relative to its norm
    /// (default: 1e-12).
    pub argument_tolerance: f64,
    /// Number of correction pairs L-BFGS keeps (default: 7).
    pub memory: usize,
    /// Edge length of the initial Nelder-Mead simplex, in grid units
    /// (default: 0.5).
    pub initial_step: f64,
}

impl Default for DescentParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            function_tolerance: 1e-12,
            argument_tolerance: 1e-12,
            memory: 7,
            initial_step: 0.5,
        }
    }
}

impl DescentParams {
    /// Reads `maxiter` and both tolerances from settings.
    #[must_use]
    pub fn from_settings(settings: &InstanceSettings) -> Self {
        Self {
            max_iterations: settings.maxiter(),
            function_tolerance: settings.function_improvement_tolerance(),
            argument_tolerance: settings.argument_improvement_tolerance(),
            ..Self::default()
        }
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the function improvement tolerance.
    #[must_use]
    pub const fn with_function_tolerance(mut self, tolerance: f64) -> Self {
        self.function_tolerance = tolerance;
        self
    }

    /// Sets the argument change tolerance.
    #[must_use]
    pub const fn with_argument_tolerance(mut self, tolerance: f64) -> Self {
        self.argument_tolerance = tolerance;
        self
    }

    /// Sets the L-BFGS memory.
    #[must_use]
    pub const fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    /// Sets the initial simplex size.
    #[must_use]
    pub const fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    /// Whether a drop from `previous` to `current` is below the function
    /// tolerance.
    #[must_use]
    pub fn function_converged(&self, previous: f64, current: f64) -> bool {
        (previous - current).abs() <= self.function_tolerance * previous.abs().max(1.0)
    }

    /// Whether a move of length `step` from a point of norm `norm` is below
    /// the argument tolerance.
    #[must_use]
    pub fn argument_converged(&self, step: f64, norm: f64) -> bool {
        step <= self.argument_tolerance * norm.max(1.0)
    }
}

/// Best iterate found by a descent method.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// The iterate.
    pub x: DVector<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether a tolerance was met before `max_iterations`.
    pub converged: bool,
}
