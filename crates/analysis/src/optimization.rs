//! Box-constrained Nelder-Mead simplex search
//!
//! Used to choose smoothing parameters by minimising in-sample squared
//! error. Points leaving the box are clamped back onto it.

/// Tuning knobs for [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Iteration cap shared by all restarts
    pub max_iter: usize,
    /// Largest spread of objective values across the simplex at convergence
    pub tolerance: f64,
    /// Largest coordinate distance from the best vertex at convergence
    pub x_tolerance: f64,
    /// Searches rebuilt around the best point after the first converges
    pub restarts: usize,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Offset of the initial simplex vertices, relative to coordinates above one
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            x_tolerance: 1e-7,
            restarts: 3,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Best point found by [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

fn clamp_to(point: Vec<f64>, bounds: &[(f64, f64)]) -> Vec<f64> {
    point
        .into_iter()
        .enumerate()
        .map(|(i, x)| match bounds.get(i) {
            Some(&(lo, hi)) => x.clamp(lo, hi),
            None => x,
        })
        .collect()
}

// from + t * (to - from)
fn toward(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(f, x)| f + t * (x - f)).collect()
}

// Sorted simplex: both the values and the vertices have collapsed.
fn has_converged(simplex: &[Vertex], config: &NelderMeadConfig) -> bool {
    let best = &simplex[0];
    let value_spread = simplex[simplex.len() - 1].value - best.value;
    let size = simplex[1..]
        .iter()
        .flat_map(|v| v.point.iter().zip(&best.point).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max);
    value_spread <= config.tolerance && size <= config.x_tolerance
}

struct Search {
    best: Vertex,
    iterations: usize,
    converged: bool,
}

fn search<E>(
    eval: &E,
    start: &[f64],
    bounds: &[(f64, f64)],
    config: &NelderMeadConfig,
    budget: usize,
) -> Search
where
    E: Fn(Vec<f64>) -> Vertex,
{
    let dim = start.len();

    let mut simplex: Vec<Vertex> = Vec::with_capacity(dim + 1);
    simplex.push(eval(start.to_vec()));
    for i in 0..dim {
        let mut point = start.to_vec();
        let step = config.initial_step * start[i].abs().max(1.0);
        // Step inward when the start sits on the upper bound
        point[i] += match bounds.get(i) {
            Some(&(_, hi)) if point[i] + step > hi => -step,
            _ => step,
        };
        simplex.push(eval(point));
    }

    let mut iterations = 0;
    let mut converged = dim == 0;

    while !converged && iterations < budget {
        simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
        if has_converged(&simplex, config) {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|v| v.point[j]).sum::<f64>() / dim as f64)
            .collect();

        let worst = &simplex[dim];
        let reflected = eval(toward(&centroid, &worst.point, -config.reflection));

        if reflected.value < simplex[0].value {
            let expanded = eval(toward(&centroid, &reflected.point, config.expansion));
            simplex[dim] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }
        if reflected.value < simplex[dim - 1].value {
            simplex[dim] = reflected;
            continue;
        }

        let contracted = if reflected.value < worst.value {
            eval(toward(&centroid, &reflected.point, config.contraction))
        } else {
            eval(toward(&centroid, &worst.point, config.contraction))
        };
        if contracted.value < reflected.value.min(worst.value) {
            simplex[dim] = contracted;
            continue;
        }

        let best = simplex[0].point.clone();
        for vertex in simplex.iter_mut().skip(1) {
            *vertex = eval(toward(&best, &vertex.point, config.shrink));
        }
    }

    simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
    Search {
        best: simplex.swap_remove(0),
        iterations,
        converged,
    }
}

/// Minimise `objective` starting at `start`, keeping every coordinate inside
/// `bounds` (one `(min, max)` pair per coordinate; extra coordinates are free).
///
/// The search stops once both the objective values and the vertices of the
/// simplex agree within tolerance. It is then rebuilt around the best point,
/// up to `config.restarts` times, until a rebuild no longer improves the
/// value. NaN objective values are treated as worse than any finite value.
pub fn nelder_mead<F>(
    objective: F,
    start: &[f64],
    bounds: &[(f64, f64)],
    config: &NelderMeadConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |point: Vec<f64>| {
        let point = clamp_to(point, bounds);
        let value = objective(&point);
        Vertex {
            point,
            value: if value.is_nan() { f64::INFINITY } else { value },
        }
    };

    let start = clamp_to(start.to_vec(), bounds);
    let mut result = search(&eval, &start, bounds, config, config.max_iter);
    let mut iterations = result.iterations;

    for _ in 0..config.restarts {
        if !result.converged || iterations >= config.max_iter {
            break;
        }
        let budget = config.max_iter - iterations;
        let next = search(&eval, &result.best.point, bounds, config, budget);
        iterations += next.iterations;
        // The rebuilt simplex contains the previous best, so it never gets worse
        let improved = result.best.value - next.best.value > config.tolerance;
        result = next;
        if !improved {
            break;
        }
    }

    Minimum {
        point: result.best.point,
        value: result.best.value,
        iterations,
        converged: result.converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_minimum() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            &[],
            &NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert!((result.point[0] - 2.0).abs() < 1e-3);
        assert!((result.point[1] - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_minimum_outside_box_lands_on_bound() {
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.5],
            &[(0.0, 1.0)],
            &NelderMeadConfig::default(),
        );
        assert!((result.point[0] - 1.0).abs() < 1e-6);
        assert!((result.value - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_points_stay_inside_bounds() {
        let bounds = [(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)];
        let objective = |x: &[f64]| -(x[0] + x[1] + x[2]);
        let start = [0.3, 0.1, 0.1];
        let result = nelder_mead(objective, &start, &bounds, &NelderMeadConfig::default());
        for (x, (lo, hi)) in result.point.iter().zip(bounds) {
            assert!(*x >= lo && *x <= hi);
        }
        assert!(result.value < objective(&start));
    }

    #[test]
    fn test_nan_objective_is_avoided() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.2],
            &[],
            &NelderMeadConfig::default(),
        );
        assert!(result.value.is_finite());
        assert!((result.point[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_equal_values_across_minimum_keep_searching() {
        let result = nelder_mead(
            |x| (x[0] - 1.0).powi(2),
            &[0.2],
            &[],
            &NelderMeadConfig::default(),
        );
        assert!(result.converged);
        assert!((result.point[0] - 1.0).abs() < 1e-5, "x={}", result.point[0]);
        assert!(result.value < 1e-10);
    }

    #[test]
    fn test_converges_away_from_start_inside_box() {
        let bounds = [(1e-4, 0.9999), (1e-4, 0.9999), (1e-4, 0.9999)];
        let result = nelder_mead(
            |x| (x[0] - 0.4).powi(2) + 10.0 * (x[1] - 0.02).powi(2) + (x[2] - 0.95).powi(2),
            &[0.3, 0.1, 0.1],
            &bounds,
            &NelderMeadConfig::default(),
        );
        assert!(result.converged);
        for (x, target) in result.point.iter().zip([0.4, 0.02, 0.95]) {
            assert!((x - target).abs() < 1e-4, "x={} target={}", x, target);
        }
    }

    #[test]
    fn test_iterations_respect_cap() {
        let config = NelderMeadConfig {
            max_iter: 5,
            ..NelderMeadConfig::default()
        };
        let result = nelder_mead(|x| (x[0] - 3.0).powi(2), &[0.0], &[], &config);
        assert!(result.iterations <= 5);
        assert!(!result.converged);
    }
}
