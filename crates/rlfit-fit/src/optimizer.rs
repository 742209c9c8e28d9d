//! Bounded minimization over the two-dimensional search space.
//!
//! Fitting only needs one capability from an optimizer: minimize a black-box
//! objective `f(x0, x1)` inside a rectangular box, starting from a given
//! point. That capability is the [`Minimizer`] trait, so the group fitter
//! never depends on a concrete algorithm and can be handed an
//! [`UnavailableMinimizer`] when fitting must be skipped.
//!
//! # Projected spectral gradient
//!
//! [`ProjectedGradient`] is the built-in implementation:
//!
//! 1. **Gradient** - central finite differences, one-sided at active bounds
//! 2. **Direction** - `d = P(x - λ∇f) - x`, where `P` clamps into the box
//! 3. **Line search** - Armijo backtracking along `d`
//! 4. **Step length** - Barzilai-Borwein `λ = sᵀs / sᵀy` from the last move
//!
//! It stops as converged when the projected gradient's max-norm drops below
//! `gradient_tolerance`, or when the relative decrease of `f` in one
//! iteration drops below `function_tolerance`. Hitting `max_iterations`, the
//! optional time limit or a failed line search returns the best point found
//! with `converged = false`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Armijo sufficient-decrease constant.
const SUFFICIENT_DECREASE: f64 = 1e-4;
const MIN_LINE_SEARCH_STEP: f64 = 1e-12;
const MIN_SPECTRAL_STEP: f64 = 1e-10;
const MAX_SPECTRAL_STEP: f64 = 1e10;

/// A rectangular search box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: [f64; 2],
    pub upper: [f64; 2],
}

impl Default for Bounds {
    /// The box `x0 ∈ [-4, 4]`, `x1 ∈ [-2, 4]`.
    fn default() -> Self {
        Self {
            lower: [-4.0, -2.0],
            upper: [4.0, 4.0],
        }
    }
}

impl Bounds {
    /// Checks that every bound is finite and `lower <= upper`.
    pub fn validate(&self) -> Result<(), InvalidBounds> {
        for i in 0..2 {
            let (lower, upper) = (self.lower[i], self.upper[i]);
            if !lower.is_finite() || !upper.is_finite() || lower > upper {
                return Err(InvalidBounds {
                    dimension: i,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }

    /// Clamps `x` into the box.
    #[must_use]
    pub fn project(&self, x: [f64; 2]) -> [f64; 2] {
        [
            x[0].clamp(self.lower[0], self.upper[0]),
            x[1].clamp(self.lower[1], self.upper[1]),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display("bounds of dimension {dimension} are invalid: [{lower}, {upper}]")]
pub struct InvalidBounds {
    pub dimension: usize,
    pub lower: f64,
    pub upper: f64,
}

/// Returned when the minimization capability is absent.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{reason}")]
pub struct MinimizerUnavailable {
    pub reason: String,
}

/// Why a minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Termination {
    #[display("projected gradient below tolerance")]
    GradientTolerance,
    #[display("relative reduction below tolerance")]
    FunctionTolerance,
    #[display("iteration limit reached")]
    MaxIterations,
    #[display("time limit reached")]
    TimeLimit,
    #[display("line search failed")]
    LineSearchFailed,
    #[display("objective is not finite at the initial point")]
    NonFiniteObjective,
}

impl Termination {
    #[must_use]
    pub fn is_converged(self) -> bool {
        matches!(self, Self::GradientTolerance | Self::FunctionTolerance)
    }
}

/// Best point found by a minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: [f64; 2],
    pub value: f64,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
}

impl Minimum {
    #[must_use]
    pub fn converged(&self) -> bool {
        self.termination.is_converged()
    }
}

/// A bounded local minimizer.
pub trait Minimizer: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Reports whether [`minimize`](Self::minimize) can run at all.
    fn check_available(&self) -> Result<(), MinimizerUnavailable> {
        Ok(())
    }

    /// Minimizes `objective` over `bounds`, starting from `initial`
    /// (projected into the box).
    fn minimize(
        &self,
        objective: &dyn Fn([f64; 2]) -> f64,
        initial: [f64; 2],
        bounds: &Bounds,
    ) -> Result<Minimum, MinimizerUnavailable>;
}

/// Null minimizer standing in for an absent optimization capability.
#[derive(Debug, Clone)]
pub struct UnavailableMinimizer {
    reason: String,
}

impl UnavailableMinimizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> MinimizerUnavailable {
        MinimizerUnavailable {
            reason: self.reason.clone(),
        }
    }
}

impl Minimizer for UnavailableMinimizer {
    fn name(&self) -> &str {
        "none"
    }

    fn check_available(&self) -> Result<(), MinimizerUnavailable> {
        Err(self.error())
    }

    fn minimize(
        &self,
        _objective: &dyn Fn([f64; 2]) -> f64,
        _initial: [f64; 2],
        _bounds: &Bounds,
    ) -> Result<Minimum, MinimizerUnavailable> {
        Err(self.error())
    }
}

/// Stopping rules and numerical settings of [`ProjectedGradient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectedGradientSettings {
    pub max_iterations: usize,
    /// Max-norm of the projected gradient at which the search stops.
    pub gradient_tolerance: f64,
    /// Relative objective decrease per iteration at which the search stops.
    pub function_tolerance: f64,
    /// Relative step of the finite-difference gradient.
    pub finite_difference_step: f64,
    /// Wall-clock budget of one minimization, in seconds.
    pub time_limit_secs: Option<f64>,
}

impl Default for ProjectedGradientSettings {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            gradient_tolerance: 1e-5,
            function_tolerance: 2.2e-9,
            finite_difference_step: 1e-6,
            time_limit_secs: None,
        }
    }
}

impl ProjectedGradientSettings {
    pub fn validate(&self) -> Result<(), InvalidSettings> {
        let invalid = |message: &str| {
            Err(InvalidSettings {
                message: message.to_owned(),
            })
        };
        if self.max_iterations == 0 {
            return invalid("max_iterations must be positive");
        }
        let non_negative = |v: f64| !v.is_nan() && v >= 0.0;
        if !non_negative(self.gradient_tolerance) || !non_negative(self.function_tolerance) {
            return invalid("tolerances must be non-negative numbers");
        }
        if !self.finite_difference_step.is_finite() || self.finite_difference_step <= 0.0 {
            return invalid("finite_difference_step must be positive");
        }
        match self.time_limit_secs.map(Duration::try_from_secs_f64) {
            Some(Err(_)) => invalid("time_limit_secs must be a non-negative number of seconds"),
            _ => Ok(()),
        }
    }

    fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{message}")]
pub struct InvalidSettings {
    pub message: String,
}

/// Projected spectral gradient minimizer.
#[derive(Debug, Clone, Default)]
pub struct ProjectedGradient {
    settings: ProjectedGradientSettings,
}

impl ProjectedGradient {
    #[must_use]
    pub fn new(settings: ProjectedGradientSettings) -> Self {
        Self { settings }
    }
}

impl Minimizer for ProjectedGradient {
    fn name(&self) -> &str {
        "projected-gradient"
    }

    fn minimize(
        &self,
        objective: &dyn Fn([f64; 2]) -> f64,
        initial: [f64; 2],
        bounds: &Bounds,
    ) -> Result<Minimum, MinimizerUnavailable> {
        let settings = &self.settings;
        let deadline = settings.time_limit().map(|limit| Instant::now() + limit);
        let mut evaluations = 0;
        let mut eval = |x: [f64; 2]| {
            evaluations += 1;
            objective(x)
        };

        let mut x = bounds.project(initial);
        let mut f = eval(x);
        if !f.is_finite() {
            return Ok(Minimum {
                x,
                value: f,
                termination: Termination::NonFiniteObjective,
                iterations: 0,
                evaluations,
            });
        }
        let mut g = gradient(&mut eval, x, f, bounds, settings.finite_difference_step);
        let mut step = (1.0 / projected_gradient_norm(x, g, bounds))
            .clamp(MIN_SPECTRAL_STEP, MAX_SPECTRAL_STEP);

        let mut termination = Termination::MaxIterations;
        let mut iterations = 0;
        while iterations < settings.max_iterations {
            if projected_gradient_norm(x, g, bounds) <= settings.gradient_tolerance {
                termination = Termination::GradientTolerance;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                termination = Termination::TimeLimit;
                break;
            }
            iterations += 1;

            let trial = bounds.project([x[0] - step * g[0], x[1] - step * g[1]]);
            let d = [trial[0] - x[0], trial[1] - x[1]];
            let slope = dot(g, d);

            let mut t = 1.0;
            let accepted = loop {
                let candidate = bounds.project([x[0] + t * d[0], x[1] + t * d[1]]);
                let fc = eval(candidate);
                if fc.is_finite() && fc <= f + SUFFICIENT_DECREASE * t * slope {
                    break Some((candidate, fc));
                }
                t *= 0.5;
                if t < MIN_LINE_SEARCH_STEP {
                    break None;
                }
            };
            let Some((x_new, f_new)) = accepted else {
                termination = Termination::LineSearchFailed;
                break;
            };

            let g_new = gradient(&mut eval, x_new, f_new, bounds, settings.finite_difference_step);
            let s = [x_new[0] - x[0], x_new[1] - x[1]];
            let y = [g_new[0] - g[0], g_new[1] - g[1]];
            let sy = dot(s, y);
            step = if sy > 0.0 {
                (dot(s, s) / sy).clamp(MIN_SPECTRAL_STEP, MAX_SPECTRAL_STEP)
            } else {
                MAX_SPECTRAL_STEP
            };

            let reduction = f - f_new;
            let scale = f.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            f = f_new;
            g = g_new;
            if reduction <= settings.function_tolerance * scale {
                termination = Termination::FunctionTolerance;
                break;
            }
        }

        Ok(Minimum {
            x,
            value: f,
            termination,
            iterations,
            evaluations,
        })
    }
}

fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

/// Max-norm of `P(x - g) - x`; zero exactly at a bound-constrained stationary point.
fn projected_gradient_norm(x: [f64; 2], g: [f64; 2], bounds: &Bounds) -> f64 {
    let p = bounds.project([x[0] - g[0], x[1] - g[1]]);
    (p[0] - x[0]).abs().max((p[1] - x[1]).abs())
}

/// Finite-difference gradient that never evaluates outside `bounds`.
fn gradient<F>(eval: &mut F, x: [f64; 2], fx: f64, bounds: &Bounds, rel_step: f64) -> [f64; 2]
where
    F: FnMut([f64; 2]) -> f64,
{
    let mut g = [0.0; 2];
    for i in 0..2 {
        let h = rel_step * x[i].abs().max(1.0);
        let can_forward = x[i] + h <= bounds.upper[i];
        let can_backward = x[i] - h >= bounds.lower[i];
        let at = |v: f64| {
            let mut p = x;
            p[i] = v;
            p
        };
        g[i] = match (can_backward, can_forward) {
            (true, true) => (eval(at(x[i] + h)) - eval(at(x[i] - h))) / (2.0 * h),
            (false, true) => (eval(at(x[i] + h)) - fx) / h,
            (true, false) => (fx - eval(at(x[i] - h))) / h,
            (false, false) => 0.0,
        };
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(center: [f64; 2]) -> impl Fn([f64; 2]) -> f64 {
        move |x| (x[0] - center[0]).powi(2) + 10.0 * (x[1] - center[1]).powi(2) + 3.0
    }

    fn within(bounds: &Bounds, x: [f64; 2]) -> bool {
        (0..2).all(|i| bounds.lower[i] <= x[i] && x[i] <= bounds.upper[i])
    }

    #[test]
    fn test_interior_minimum() {
        let minimizer = ProjectedGradient::new(ProjectedGradientSettings {
            function_tolerance: 0.0,
            ..ProjectedGradientSettings::default()
        });
        let objective = quadratic([1.5, -0.5]);
        let min = minimizer
            .minimize(&objective, [0.0, 0.5], &Bounds::default())
            .unwrap();
        assert!(min.converged(), "{:?}", min.termination);
        assert_eq!(min.termination, Termination::GradientTolerance);
        assert!((min.x[0] - 1.5).abs() < 1e-4, "{:?}", min.x);
        assert!((min.x[1] + 0.5).abs() < 1e-4, "{:?}", min.x);
        assert!((min.value - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimum_on_active_bound() {
        let minimizer = ProjectedGradient::default();
        let objective = quadratic([9.0, -7.0]);
        let bounds = Bounds::default();
        let min = minimizer.minimize(&objective, [0.0, 0.5], &bounds).unwrap();
        assert!(min.converged(), "{:?}", min.termination);
        assert!((min.x[0] - 4.0).abs() < 1e-9, "{:?}", min.x);
        assert!((min.x[1] + 2.0).abs() < 1e-9, "{:?}", min.x);
        assert!(within(&bounds, min.x));
    }

    #[test]
    fn test_iteration_limit_is_not_converged() {
        let minimizer = ProjectedGradient::new(ProjectedGradientSettings {
            max_iterations: 1,
            function_tolerance: 0.0,
            gradient_tolerance: 0.0,
            ..ProjectedGradientSettings::default()
        });
        let objective = quadratic([1.0, 1.0]);
        let min = minimizer
            .minimize(&objective, [-3.0, -1.0], &Bounds::default())
            .unwrap();
        assert_eq!(min.termination, Termination::MaxIterations);
        assert!(!min.converged());
        assert_eq!(min.iterations, 1);
        assert!(min.value < objective([-3.0, -1.0]));
    }

    #[test]
    fn test_zero_time_limit() {
        let minimizer = ProjectedGradient::new(ProjectedGradientSettings {
            time_limit_secs: Some(0.0),
            ..ProjectedGradientSettings::default()
        });
        let min = minimizer
            .minimize(&quadratic([1.0, 1.0]), [0.0, 0.5], &Bounds::default())
            .unwrap();
        assert_eq!(min.termination, Termination::TimeLimit);
        assert_eq!(min.x, [0.0, 0.5]);
    }

    #[test]
    fn test_initial_point_is_projected() {
        let minimizer = ProjectedGradient::new(ProjectedGradientSettings {
            max_iterations: 1,
            ..ProjectedGradientSettings::default()
        });
        let seen = std::sync::Mutex::new(Vec::new());
        let objective = |x: [f64; 2]| {
            seen.lock().unwrap().push(x);
            x[0] + x[1]
        };
        let bounds = Bounds::default();
        let _ = minimizer.minimize(&objective, [100.0, -100.0], &bounds).unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen[0], [4.0, -2.0]);
        assert!(seen.iter().all(|&x| within(&bounds, x)));
    }

    #[test]
    fn test_non_finite_start() {
        let min = ProjectedGradient::default()
            .minimize(&|_| f64::NAN, [0.0, 0.0], &Bounds::default())
            .unwrap();
        assert_eq!(min.termination, Termination::NonFiniteObjective);
        assert!(!min.converged());
    }

    #[test]
    fn test_unavailable_minimizer() {
        let minimizer = UnavailableMinimizer::new("disabled by configuration");
        let err = minimizer.check_available().unwrap_err();
        assert_eq!(err.to_string(), "disabled by configuration");
        assert!(
            minimizer
                .minimize(&|_| 0.0, [0.0, 0.0], &Bounds::default())
                .is_err()
        );
    }

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::default().validate().is_ok());
        let bad = Bounds {
            lower: [0.0, 5.0],
            upper: [1.0, 4.0],
        };
        let err = bad.validate().unwrap_err();
        assert_eq!(err.dimension, 1);
        let nan = Bounds {
            lower: [f64::NAN, 0.0],
            upper: [1.0, 1.0],
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_settings_validation() {
        assert!(ProjectedGradientSettings::default().validate().is_ok());
        let bad = ProjectedGradientSettings {
            time_limit_secs: Some(-1.0),
            ..ProjectedGradientSettings::default()
        };
        assert!(bad.validate().is_err());
        let bad = ProjectedGradientSettings {
            max_iterations: 0,
            ..ProjectedGradientSettings::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: ProjectedGradientSettings =
            serde_json::from_str(r#"{ "max_iterations": 42, "time_limit_secs": 1.5 }"#).unwrap();
        assert_eq!(settings.max_iterations, 42);
        assert_eq!(settings.time_limit_secs, Some(1.5));
        assert_eq!(
            settings.gradient_tolerance,
            ProjectedGradientSettings::default().gradient_tolerance
        );
    }
}
