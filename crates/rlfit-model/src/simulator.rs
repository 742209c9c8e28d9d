//! Q-learning replay and negative log-likelihood.
//!
//! Replaying a [`TrialSequence`] under [`ModelParams`] walks the trials in
//! order. For each trial with state `s`, action `a` and reward `r`:
//!
//! 1. `p = softmax(beta * Q[s, :])`, stabilized by subtracting the max logit
//! 2. the trial contributes `-ln(clamp(p[a], 1e-6, 1))` to the NLL
//! 3. `Q[s, a] += alpha * (r - Q[s, a])`
//!
//! The Q-table is created zeroed for every replay and dropped at the end, so
//! evaluations never influence each other.

use crate::{Action, ModelParams, TrialSequence, sequence::Step};

/// Lower clip applied to the probability of the observed action.
pub const MIN_ACTION_PROBABILITY: f64 = 1e-6;

/// Running value estimates, one `[left, right]` row per state.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    rows: Vec<[f64; 2]>,
}

impl QTable {
    #[must_use]
    pub fn zeros(n_states: usize) -> Self {
        Self {
            rows: vec![[0.0; 2]; n_states],
        }
    }

    #[must_use]
    pub fn row(&self, state: usize) -> [f64; 2] {
        self.rows[state]
    }

    /// Moves `Q[state, action]` toward `reward` by a fraction `alpha`.
    pub fn update(&mut self, state: usize, action: Action, reward: f64, alpha: f64) {
        let q = &mut self.rows[state][action.index()];
        *q += alpha * (reward - *q);
    }
}

/// Softmax over the two action values scaled by `beta`.
///
/// # Examples
///
/// ```
/// use rlfit_model::simulator::softmax;
///
/// assert_eq!(softmax([0.3, 0.3], 10.0), [0.5, 0.5]);
/// let [left, right] = softmax([1.0, 0.0], 2.0);
/// assert!(left > right);
/// ```
#[must_use]
pub fn softmax(values: [f64; 2], beta: f64) -> [f64; 2] {
    let logits = values.map(|v| beta * v);
    let max = logits[0].max(logits[1]);
    let exp = logits.map(|l| (l - max).exp());
    let sum = exp[0] + exp[1];
    exp.map(|e| e / sum)
}

/// Per-trial output of a replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialEvaluation {
    /// Action probabilities before the update.
    pub probabilities: [f64; 2],
    /// This trial's contribution to the negative log-likelihood.
    pub nll: f64,
    /// The Q-table row of the trial's state after the update.
    pub q_after: [f64; 2],
}

/// Iterator replaying a sequence one trial at a time.
#[derive(Debug, Clone)]
pub struct Replay<'a> {
    steps: std::slice::Iter<'a, Step>,
    q: QTable,
    params: ModelParams,
}

impl Iterator for Replay<'_> {
    type Item = TrialEvaluation;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.steps.next()?;
        let probabilities = softmax(self.q.row(step.state), self.params.beta);
        let prob = probabilities[step.action.index()].clamp(MIN_ACTION_PROBABILITY, 1.0);
        self.q
            .update(step.state, step.action, step.reward, self.params.alpha);
        Some(TrialEvaluation {
            probabilities,
            nll: -prob.ln(),
            q_after: self.q.row(step.state),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

impl ExactSizeIterator for Replay<'_> {}

/// Starts a step-by-step replay of `sequence` from a zeroed Q-table.
#[must_use]
pub fn replay(sequence: &TrialSequence, params: ModelParams) -> Replay<'_> {
    Replay {
        steps: sequence.steps().iter(),
        q: QTable::zeros(sequence.n_states()),
        params,
    }
}

/// Total negative log-likelihood of `sequence` under `params`.
///
/// Deterministic, and `0.0` for an empty sequence.
#[must_use]
pub fn evaluate(sequence: &TrialSequence, params: ModelParams) -> f64 {
    replay(sequence, params).map(|e| e.nll).sum()
}
