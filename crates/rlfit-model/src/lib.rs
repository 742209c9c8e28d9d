//! Q-learning choice model for binary-choice behavioral data.
//!
//! This crate holds the model family fitted by `rlfit`: a Rescorla-Wagner
//! value update over an `n_states x 2` Q-table, paired with a softmax policy
//! scaled by an inverse temperature.
//!
//! # Architecture
//!
//! ```text
//! Trial (one row of the behavior table)
//!     ↓ grouped and validated by
//! TrialSequence (ordered, non-optional state/action)
//!     ↓ replayed by
//! simulator::evaluate(sequence, ModelParams)
//!     ↓ produces
//! Negative log-likelihood
//! ```
//!
//! [`transform`] maps the unconstrained optimization space onto
//! [`ModelParams`], and [`agent::SoftmaxAgent`] runs the same model forward
//! to generate synthetic choices.
//!
//! # Example
//!
//! ```
//! use rlfit_model::{
//!     Action, MissingValuePolicy, ModelParams, Trial, TrialSequence, simulator,
//! };
//!
//! let trials = (1..=4)
//!     .map(|i| Trial {
//!         participant_id: "P1".to_owned(),
//!         round: 1,
//!         trial_index: i,
//!         state_id: Some(0),
//!         action: Some(Action::Left),
//!         reward: 1.0,
//!         difficulty: "easy".to_owned(),
//!         liking_bin: None,
//!     })
//!     .collect::<Vec<_>>();
//! let sequence = TrialSequence::from_trials(&trials, MissingValuePolicy::Reject).unwrap();
//!
//! let nll = simulator::evaluate(&sequence, ModelParams::new(0.0, 3.0));
//! assert!((nll - 4.0 * 2.0_f64.ln()).abs() < 1e-12);
//! ```

pub use self::{
    sequence::{MissingValuePolicy, SequenceError, Step, TrialSequence},
    transform::ModelParams,
    trial::{Action, LikingBin, Trial},
};

pub mod agent;
pub mod sequence;
pub mod simulator;
pub mod transform;
pub mod trial;
