//! A simulated participant following the fitted model.
//!
//! [`SoftmaxAgent`] samples choices from the same softmax policy that
//! [`simulator`](crate::simulator) scores, and learns with the same update,
//! so data it generates is exactly the model family being fitted.

use rand::Rng;

use crate::{Action, ModelParams, simulator::QTable, simulator::softmax};

#[derive(Debug, Clone)]
pub struct SoftmaxAgent {
    params: ModelParams,
    q: QTable,
}

impl SoftmaxAgent {
    /// Creates an agent with a zeroed Q-table over `n_states` states.
    #[must_use]
    pub fn new(params: ModelParams, n_states: usize) -> Self {
        Self {
            params,
            q: QTable::zeros(n_states),
        }
    }

    #[must_use]
    pub fn params(&self) -> ModelParams {
        self.params
    }

    /// Current action probabilities in `state`.
    #[must_use]
    pub fn policy(&self, state: usize) -> [f64; 2] {
        softmax(self.q.row(state), self.params.beta)
    }

    /// Samples an action in `state`.
    pub fn choose<R>(&self, state: usize, rng: &mut R) -> Action
    where
        R: Rng + ?Sized,
    {
        let [_, right] = self.policy(state);
        if rng.random_bool(right.clamp(0.0, 1.0)) {
            Action::Right
        } else {
            Action::Left
        }
    }

    /// Applies the value update for an observed outcome.
    pub fn learn(&mut self, state: usize, action: Action, reward: f64) {
        self.q.update(state, action, reward, self.params.alpha);
    }
}
