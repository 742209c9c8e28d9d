//! Mapping between the optimizer's search space and model parameters.
//!
//! The optimizer works on `x = [x0, x1]` and the model sees
//!
//! ```text
//! alpha = sigmoid(x0)   in (0, 1)
//! beta  = exp(x1)       in (0, +inf)
//! ```
//!
//! so every finite `x` is a valid parameter pair. The default search box
//! `x0 in [-4, 4]`, `x1 in [-2, 4]` induces `alpha in ~[0.018, 0.982]` and
//! `beta in ~[0.135, 54.6]`. That box is a calibration of plausible behavioral
//! values; parameters outside it are reachable by the model but not by a
//! search restricted to it.

use serde::{Deserialize, Serialize};

/// Learning rate and inverse temperature of the Q-learning model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Learning rate.
    pub alpha: f64,
    /// Inverse temperature.
    pub beta: f64,
}

impl ModelParams {
    #[must_use]
    pub const fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Parameters from an unconstrained search point.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlfit_model::ModelParams;
    ///
    /// let params = ModelParams::from_unconstrained([0.0, 0.0]);
    /// assert_eq!(params, ModelParams::new(0.5, 1.0));
    /// ```
    #[must_use]
    pub fn from_unconstrained(x: [f64; 2]) -> Self {
        to_constrained(x)
    }

    /// The search point mapping to these parameters.
    #[must_use]
    pub fn to_unconstrained(self) -> [f64; 2] {
        to_unconstrained(self)
    }
}

/// Maps `[x0, x1]` to `(sigmoid(x0), exp(x1))`.
#[must_use]
pub fn to_constrained([x0, x1]: [f64; 2]) -> ModelParams {
    ModelParams {
        alpha: sigmoid(x0),
        beta: x1.exp(),
    }
}

/// Maps `(alpha, beta)` to `[logit(alpha), ln(beta)]`.
#[must_use]
pub fn to_unconstrained(params: ModelParams) -> [f64; 2] {
    [logit(params.alpha), params.beta.ln()]
}

/// Logistic function, evaluated without overflow for large `|x|`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`sigmoid`].
#[must_use]
pub fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrained_domain() {
        for x0 in [-700.0, -30.0, -4.0, 0.0, 4.0, 30.0] {
            for x1 in [-30.0, -2.0, 0.0, 4.0] {
                let p = to_constrained([x0, x1]);
                assert!(p.alpha >= 0.0 && p.alpha <= 1.0);
                assert!(p.beta > 0.0);
            }
        }
        for x0 in [-4.0, 0.0, 4.0] {
            let p = to_constrained([x0, 0.0]);
            assert!(p.alpha > 0.0 && p.alpha < 1.0);
        }
    }

    #[test]
    fn test_default_box_ranges() {
        let low = to_constrained([-4.0, -2.0]);
        let high = to_constrained([4.0, 4.0]);
        assert!((low.alpha - 0.017_986).abs() < 1e-6);
        assert!((high.alpha - 0.982_014).abs() < 1e-6);
        assert!((low.beta - 0.135_335).abs() < 1e-6);
        assert!((high.beta - 54.598_150).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_over_search_box() {
        for i in 0..=16 {
            for j in 0..=12 {
                let x0 = -4.0 + 0.5 * f64::from(i);
                let x1 = -2.0 + 0.5 * f64::from(j);
                let back = to_unconstrained(to_constrained([x0, x1]));
                assert!((back[0] - x0).abs() < 1e-9, "x0={x0} back={}", back[0]);
                assert!((back[1] - x1).abs() < 1e-9, "x1={x1} back={}", back[1]);
            }
        }
    }

    #[test]
    fn test_sigmoid_symmetry() {
        for x in [0.1, 1.0, 3.5] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-15);
        }
        assert_eq!(sigmoid(0.0), 0.5);
    }
}
