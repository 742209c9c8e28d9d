//! Ordered, validated trial sequences.
//!
//! A [`TrialSequence`] is what the simulator replays: trials of a single
//! group, sorted by trial index, with every state and action resolved. Blank
//! state ids or actions in the source data are handled by an explicit
//! [`MissingValuePolicy`] chosen by the caller.

use serde::{Deserialize, Serialize};

use crate::{Action, Trial};

/// How to treat trials whose state id or action is missing.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
    /// Fail the sequence build on the first incomplete trial.
    #[default]
    #[display("reject")]
    Reject,
    /// Substitute state `0` and action `0` (left) for missing values.
    #[display("default-to-zero")]
    DefaultToZero,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SequenceError {
    #[display("trial {trial_index} has no state id")]
    MissingState { trial_index: u32 },
    #[display("trial {trial_index} has no action")]
    MissingAction { trial_index: u32 },
}

/// One resolved trial: the state seen, the action taken and the reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: usize,
    pub action: Action,
    pub reward: f64,
}

/// Trials of one group in ascending trial-index order.
///
/// Every step's state lies in `0..n_states()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSequence {
    steps: Vec<Step>,
    n_states: usize,
}

impl TrialSequence {
    /// Builds a sequence from the trials of one group.
    ///
    /// Trials are stably sorted by `trial_index`. `n_states` is one more than
    /// the largest state id observed, or `1` when no trial carries one.
    ///
    /// # Errors
    ///
    /// With [`MissingValuePolicy::Reject`], returns the first trial (in
    /// trial-index order) lacking a state id or an action.
    pub fn from_trials<'a, I>(trials: I, policy: MissingValuePolicy) -> Result<Self, SequenceError>
    where
        I: IntoIterator<Item = &'a Trial>,
    {
        let mut trials = trials.into_iter().collect::<Vec<_>>();
        trials.sort_by_key(|t| t.trial_index);

        let steps = trials
            .iter()
            .map(|t| resolve(t, policy))
            .collect::<Result<Vec<_>, _>>()?;
        let n_states = trials
            .iter()
            .filter_map(|t| t.state_id)
            .max()
            .map_or(1, |max| max as usize + 1);

        Ok(Self { steps, n_states })
    }

    /// Builds a sequence directly from resolved steps.
    #[must_use]
    pub fn from_steps(steps: Vec<Step>) -> Self {
        let n_states = steps.iter().map(|s| s.state + 1).max().unwrap_or(1);
        Self { steps, n_states }
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn resolve(trial: &Trial, policy: MissingValuePolicy) -> Result<Step, SequenceError> {
    let trial_index = trial.trial_index;
    let (state, action) = match policy {
        MissingValuePolicy::Reject => (
            trial
                .state_id
                .ok_or(SequenceError::MissingState { trial_index })?,
            trial
                .action
                .ok_or(SequenceError::MissingAction { trial_index })?,
        ),
        MissingValuePolicy::DefaultToZero => (
            trial.state_id.unwrap_or(0),
            trial.action.unwrap_or(Action::Left),
        ),
    };
    Ok(Step {
        state: state as usize,
        action,
        reward: trial.reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(trial_index: u32, state_id: Option<u32>, action: Option<Action>) -> Trial {
        Trial {
            participant_id: "P1".to_owned(),
            round: 1,
            trial_index,
            state_id,
            action,
            reward: 1.0,
            difficulty: "easy".to_owned(),
            liking_bin: None,
        }
    }

    #[test]
    fn test_sorted_by_trial_index() {
        let trials = [
            trial(3, Some(2), Some(Action::Right)),
            trial(1, Some(0), Some(Action::Left)),
            trial(2, Some(1), Some(Action::Right)),
        ];
        let seq = TrialSequence::from_trials(&trials, MissingValuePolicy::Reject).unwrap();
        let states = seq.steps().iter().map(|s| s.state).collect::<Vec<_>>();
        assert_eq!(states, vec![0, 1, 2]);
        assert_eq!(seq.n_states(), 3);
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_empty_sequence_has_one_state() {
        let seq = TrialSequence::from_trials([], MissingValuePolicy::Reject).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.n_states(), 1);
    }

    #[test]
    fn test_reject_missing_state() {
        let trials = [
            trial(1, Some(0), Some(Action::Left)),
            trial(2, None, Some(Action::Left)),
        ];
        let err = TrialSequence::from_trials(&trials, MissingValuePolicy::Reject).unwrap_err();
        assert_eq!(err, SequenceError::MissingState { trial_index: 2 });
        assert_eq!(err.to_string(), "trial 2 has no state id");
    }

    #[test]
    fn test_reject_missing_action() {
        let trials = [trial(5, Some(1), None)];
        let err = TrialSequence::from_trials(&trials, MissingValuePolicy::Reject).unwrap_err();
        assert_eq!(err, SequenceError::MissingAction { trial_index: 5 });
    }

    #[test]
    fn test_default_to_zero() {
        let trials = [trial(1, None, None), trial(2, Some(3), Some(Action::Right))];
        let seq = TrialSequence::from_trials(&trials, MissingValuePolicy::DefaultToZero).unwrap();
        assert_eq!(seq.steps()[0].state, 0);
        assert_eq!(seq.steps()[0].action, Action::Left);
        assert_eq!(seq.n_states(), 4);
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&MissingValuePolicy::DefaultToZero).unwrap();
        assert_eq!(json, "\"default-to-zero\"");
        let policy: MissingValuePolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, MissingValuePolicy::Reject);
    }
}
