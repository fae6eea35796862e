//! Limited-memory BFGS with a backtracking line search.

use std::collections::VecDeque;

use nalgebra::DVector;
use tracing::debug;

use crate::objective::Objective;
use crate::params::{DescentParams, Minimum};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Step halvings before the line search gives up.
const MAX_BACKTRACKS: usize = 60;

/// Minimizes `objective` from `x0`.
///
/// The search direction comes from the two-loop recursion over the last
/// `params.memory` correction pairs. The first step is scaled to unit
/// length. A non-descent direction falls back to steepest descent.
///
/// # Example
///
/// ```
/// use curve_refine::{DescentParams, Objective, lbfgs};
/// use nalgebra::DVector;
///
/// struct Bowl;
///
/// impl Objective for Bowl {
///     fn dim(&self) -> usize { 2 }
///     fn value(&self, x: &DVector<f64>) -> f64 {
///         (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2)
///     }
/// }
///
/// let min = lbfgs::minimize(&Bowl, DVector::zeros(2), &DescentParams::default());
/// assert!(min.converged);
/// assert!((min.x[0] - 1.0).abs() < 1e-4);
/// ```
#[must_use]
pub fn minimize(objective: &dyn Objective, x0: DVector<f64>, params: &DescentParams) -> Minimum {
    let mut x = x0;
    let mut value = objective.value(&x);
    let mut gradient = objective.gradient(&x);
    let mut history: VecDeque<(DVector<f64>, DVector<f64>, f64)> =
        VecDeque::with_capacity(params.memory);

    if x.is_empty() || gradient.norm() == 0.0 {
        return Minimum {
            x,
            value,
            iterations: 0,
            converged: true,
        };
    }

    for iteration in 1..=params.max_iterations {
        let mut direction = -two_loop(&gradient, &history);
        if history.is_empty() {
            direction /= gradient.norm();
        }
        let mut slope = gradient.dot(&direction);
        if slope >= 0.0 || slope.is_nan() {
            history.clear();
            direction = -&gradient / gradient.norm();
            slope = gradient.dot(&direction);
        }

        let (next, next_value) = match backtrack(objective, &x, value, &direction, slope) {
            Ok(accepted) => accepted,
            Err(last_step) => {
                // A stall counts as converged only if the last trial step
                // was already below the argument tolerance.
                let converged = params.argument_converged(last_step, x.norm());
                debug!(iteration, value, last_step, converged, "line search stalled");
                return Minimum {
                    x,
                    value,
                    iterations: iteration,
                    converged,
                };
            }
        };

        let next_gradient = objective.gradient(&next);
        let s = &next - &x;
        let y = &next_gradient - &gradient;
        let step = s.norm();
        let previous = value;

        let sy = s.dot(&y);
        if sy > f64::EPSILON * y.norm_squared() {
            if params.memory > 0 && history.len() == params.memory {
                history.pop_front();
            }
            if params.memory > 0 {
                history.push_back((s, y, 1.0 / sy));
            }
        }

        x = next;
        value = next_value;
        gradient = next_gradient;

        if gradient.norm() == 0.0
            || params.function_converged(previous, value)
            || params.argument_converged(step, x.norm())
        {
            return Minimum {
                x,
                value,
                iterations: iteration,
                converged: true,
            };
        }
    }

    Minimum {
        x,
        value,
        iterations: params.max_iterations,
        converged: false,
    }
}

/// Applies the inverse Hessian approximation to `gradient`.
fn two_loop(
    gradient: &DVector<f64>,
    history: &VecDeque<(DVector<f64>, DVector<f64>, f64)>,
) -> DVector<f64> {
    let mut q = gradient.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * s.dot(&q);
        q.axpy(-alpha, y, 1.0);
        alphas.push(alpha);
    }

    if let Some((s, y, _)) = history.back() {
        q *= s.dot(y) / y.norm_squared();
    }

    for ((s, y, rho), alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = rho * y.dot(&q);
        q.axpy(alpha - beta, s, 1.0);
    }
    q
}

/// Halves the step until the Armijo condition holds.
///
/// On failure returns the length of the last step tried.
fn backtrack(
    objective: &dyn Objective,
    x: &DVector<f64>,
    value: f64,
    direction: &DVector<f64>,
    slope: f64,
) -> Result<(DVector<f64>, f64), f64> {
    let mut t = 1.0;
    let mut last_step = f64::INFINITY;
    for _ in 0..MAX_BACKTRACKS {
        let candidate = x + direction * t;
        let candidate_value = objective.value(&candidate);
        if candidate_value <= (ARMIJO * t).mul_add(slope, value) {
            return Ok((candidate, candidate_value));
        }
        last_step = t * direction.norm();
        t *= 0.5;
    }
    Err(last_step)
}
