//! Derivative-free Nelder-Mead simplex descent.

use nalgebra::DVector;
use tracing::debug;

use crate::objective::Objective;
use crate::params::{DescentParams, Minimum};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimizes `objective` from `x0` with a simplex of edge
/// `params.initial_step` along each axis.
///
/// Converges when the spread of vertex values falls under the function
/// tolerance or the simplex diameter under the argument tolerance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn minimize(objective: &dyn Objective, x0: DVector<f64>, params: &DescentParams) -> Minimum {
    let n = x0.len();
    if n == 0 {
        let value = objective.value(&x0);
        return Minimum {
            x: x0,
            value,
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<(DVector<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((x0.clone(), objective.value(&x0)));
    for i in 0..n {
        let mut vertex = x0.clone();
        vertex[i] += params.initial_step;
        let value = objective.value(&vertex);
        simplex.push((vertex, value));
    }

    for iteration in 0..params.max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = simplex[0].1;
        let worst = simplex[n].1;
        let diameter = simplex[1..]
            .iter()
            .map(|(v, _)| (v - &simplex[0].0).amax())
            .fold(0.0, f64::max);
        if params.function_converged(worst, best)
            || params.argument_converged(diameter, simplex[0].0.norm())
        {
            return finish(simplex, iteration, true);
        }

        let centroid = simplex[..n]
            .iter()
            .fold(DVector::zeros(n), |acc, (v, _)| acc + v)
            / n as f64;
        let worst_vertex = simplex[n].0.clone();
        let toward = |t: f64| &centroid + (&centroid - &worst_vertex) * t;

        let reflected = toward(REFLECTION);
        let reflected_value = objective.value(&reflected);

        if reflected_value < best {
            let expanded = toward(EXPANSION);
            let expanded_value = objective.value(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < worst {
            let outside = toward(CONTRACTION);
            let value = objective.value(&outside);
            (outside, value)
        } else {
            let inside = toward(-CONTRACTION);
            let value = objective.value(&inside);
            (inside, value)
        };
        if contracted_value < reflected_value.min(worst) {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (vertex, value) in &mut simplex[1..] {
            *vertex = &anchor + (&*vertex - &anchor) * SHRINK;
            *value = objective.value(vertex);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    debug!(iterations = params.max_iterations, "simplex hit the iteration cap");
    finish(simplex, params.max_iterations, false)
}

fn finish(mut simplex: Vec<(DVector<f64>, f64)>, iterations: usize, converged: bool) -> Minimum {
    let (x, value) = simplex.swap_remove(0);
    Minimum {
        x,
        value,
        iterations,
        converged,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Bowl;

    impl Objective for Bowl {
        fn dim(&self) -> usize {
            3
        }

        fn value(&self, x: &DVector<f64>) -> f64 {
            (x[0] - 1.0).powi(2) + 2.0 * (x[1] + 0.5).powi(2) + 4.0 * x[2].powi(2)
        }
    }

    #[test]
    fn test_bowl() {
        let params = DescentParams::default()
            .with_max_iterations(5000)
            .with_function_tolerance(1e-14)
            .with_argument_tolerance(1e-8);
        let min = minimize(&Bowl, DVector::from_vec(vec![3.0, 3.0, 3.0]), &params);
        assert!(min.converged);
        assert_relative_eq!(min.x[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(min.x[1], -0.5, epsilon = 1e-5);
        assert_relative_eq!(min.x[2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_iteration_cap() {
        let start = DVector::from_vec(vec![3.0, 3.0, 3.0]);
        let params = DescentParams::default().with_max_iterations(1);
        let min = minimize(&Bowl, start.clone(), &params);
        assert!(!min.converged);
        assert_eq!(min.iterations, 1);
        assert!(min.value <= Bowl.value(&start));
    }

    struct Constant;

    impl Objective for Constant {
        fn dim(&self) -> usize {
            0
        }

        fn value(&self, _x: &DVector<f64>) -> f64 {
            7.0
        }
    }

    #[test]
    fn test_flat_objective_meets_function_tolerance() {
        let params = DescentParams::default().with_max_iterations(10);
        let min = minimize(&Constant, DVector::from_vec(vec![1.0, -2.0]), &params);
        assert!(min.converged);
        assert_eq!(min.iterations, 0);
        assert_eq!(min.value, 7.0);
    }

    #[test]
    fn test_empty_problem() {
        let min = minimize(&Constant, DVector::zeros(0), &DescentParams::default());
        assert_eq!(min.value, 7.0);
        assert!(min.converged);
        assert_eq!(min.iterations, 0);
    }
}
