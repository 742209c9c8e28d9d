//! Maximum-likelihood fitting of the Q-learning model to grouped trials.
//!
//! This crate estimates a learning rate and an inverse temperature for every
//! group of a behavior table. Each group is fitted independently by
//! minimizing the negative log-likelihood computed by
//! [`rlfit_model::simulator`] over a bounded, unconstrained search space.
//!
//! # Architecture
//!
//! ```text
//! Trials
//!     ↓ partitioned by
//! GroupKey (participant, difficulty, liking bin, round)
//!     ↓ each group fitted by
//! GroupFitter ── Minimizer (injected)
//!     ↓ produces
//! FitResult rows, sorted by key
//! ```
//!
//! # Optimizers
//!
//! The fitter never picks an optimizer itself. Callers pass a
//! [`Minimizer`](optimizer::Minimizer):
//!
//! - [`ProjectedGradient`](optimizer::ProjectedGradient) - box-constrained
//!   spectral projected gradient with finite-difference gradients
//! - [`UnavailableMinimizer`](optimizer::UnavailableMinimizer) - stands in
//!   when no optimizer is configured; fitting then fails with
//!   [`FitError::OptimizerUnavailable`] and produces no rows
//!
//! # Example
//!
//! ```
//! use rlfit_fit::{FitOptions, GroupFitter, optimizer::ProjectedGradient};
//! use rlfit_model::{Action, Trial};
//!
//! let trials = (1..=30)
//!     .map(|i| Trial {
//!         participant_id: "P1".to_owned(),
//!         round: 1,
//!         trial_index: i,
//!         state_id: Some(0),
//!         action: Some(if i % 4 == 0 { Action::Left } else { Action::Right }),
//!         reward: if i % 3 == 0 { 0.0 } else { 1.0 },
//!         difficulty: "easy".to_owned(),
//!         liking_bin: None,
//!     })
//!     .collect::<Vec<_>>();
//!
//! let minimizer = ProjectedGradient::default();
//! let fitter = GroupFitter::new(&minimizer, FitOptions::default());
//! let results = fitter.fit_all(&trials).unwrap();
//!
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].n_trials, 30);
//! assert!(results[0].alpha_hat > 0.0 && results[0].alpha_hat < 1.0);
//! ```

pub use self::fitter::{FitError, FitOptions, FitResult, GroupFitter, GroupKey, partition};

pub mod fitter;
pub mod optimizer;
