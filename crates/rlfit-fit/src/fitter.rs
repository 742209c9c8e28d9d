//! Per-group maximum-likelihood fitting.
//!
//! [`GroupFitter`] partitions a trial table by [`GroupKey`] and fits the
//! Q-learning model to every group independently:
//!
//! ```text
//! trials ─┬─ partition by (participant, difficulty, liking, round)
//!         ↓
//! TrialSequence per group
//!         ↓ Minimizer over x, objective = evaluate(sequence, to_constrained(x))
//! Minimum { x*, f*, termination }
//!         ↓ to_constrained(x*)
//! FitResult
//! ```
//!
//! Groups are fitted on a pool of scoped worker threads. Nothing is shared
//! between groups except read-only trials, and results come back sorted by
//! key whatever order the workers finish in.

use std::{
    collections::BTreeMap,
    num::NonZeroUsize,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use rlfit_model::{
    LikingBin, MissingValuePolicy, ModelParams, Trial, TrialSequence, simulator, transform,
};
use serde::{Deserialize, Serialize};

use crate::optimizer::{Bounds, InvalidBounds, Minimizer, MinimizerUnavailable};

/// Identifies one independent model fit.
///
/// Ordering follows field order; an absent liking bin sorts first.
///
/// Trials without a liking bin are not dropped: they are fitted together as
/// their own group and reported with an empty `liking` cell. Learning curves,
/// in contrast, leave such trials out.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub participant_id: String,
    pub difficulty: String,
    pub liking_bin: Option<LikingBin>,
    pub round: u32,
}

impl GroupKey {
    #[must_use]
    pub fn of(trial: &Trial) -> Self {
        Self {
            participant_id: trial.participant_id.clone(),
            difficulty: trial.difficulty.clone(),
            liking_bin: trial.liking_bin,
            round: trial.round,
        }
    }
}

/// Estimates for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub key: GroupKey,
    /// Learning rate estimate, `NaN` when the group could not be fitted.
    pub alpha_hat: f64,
    /// Inverse temperature estimate, `NaN` when the group could not be fitted.
    pub beta_hat: f64,
    /// Negative log-likelihood at the estimate.
    pub nll: f64,
    pub converged: bool,
    pub n_trials: usize,
}

impl FitResult {
    /// A row without estimates, for groups that could not be fitted.
    #[must_use]
    pub fn unfitted(key: GroupKey, n_trials: usize) -> Self {
        Self {
            key,
            alpha_hat: f64::NAN,
            beta_hat: f64::NAN,
            nll: f64::NAN,
            converged: false,
            n_trials,
        }
    }

    #[must_use]
    pub fn params(&self) -> Option<ModelParams> {
        (!self.alpha_hat.is_nan() && !self.beta_hat.is_nan())
            .then(|| ModelParams::new(self.alpha_hat, self.beta_hat))
    }
}

/// Settings shared by every group fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitOptions {
    /// Search box in the unconstrained space.
    pub bounds: Bounds,
    /// Starting point in the unconstrained space.
    pub initial: [f64; 2],
    pub missing_values: MissingValuePolicy,
    /// Number of worker threads; all available cores when unset.
    pub workers: Option<NonZeroUsize>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            initial: [0.0, 0.5],
            missing_values: MissingValuePolicy::Reject,
            workers: None,
        }
    }
}

impl FitOptions {
    pub fn validate(&self) -> Result<(), InvalidBounds> {
        self.bounds.validate()
    }

    fn worker_count(&self, jobs: usize) -> usize {
        let workers = self
            .workers
            .or_else(|| thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get);
        workers.min(jobs).max(1)
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum FitError {
    #[display("optimizer unavailable: {_0}")]
    OptimizerUnavailable(MinimizerUnavailable),
    #[display("invalid fit options: {_0}")]
    InvalidOptions(InvalidBounds),
}

/// Splits trials into groups, sorted by key.
#[must_use]
pub fn partition(trials: &[Trial]) -> BTreeMap<GroupKey, Vec<&Trial>> {
    let mut groups = BTreeMap::<GroupKey, Vec<&Trial>>::new();
    for trial in trials {
        groups.entry(GroupKey::of(trial)).or_default().push(trial);
    }
    groups
}

/// Fits the Q-learning model group by group with an injected minimizer.
pub struct GroupFitter<'a> {
    minimizer: &'a dyn Minimizer,
    options: FitOptions,
}

impl<'a> GroupFitter<'a> {
    #[must_use]
    pub fn new(minimizer: &'a dyn Minimizer, options: FitOptions) -> Self {
        Self { minimizer, options }
    }

    /// Fits every group present in `trials`.
    ///
    /// Returns one result per distinct [`GroupKey`], in key order.
    ///
    /// # Errors
    ///
    /// Fails before fitting anything if the minimizer is unavailable or the
    /// options are invalid. A group that fails to converge or holds malformed
    /// trials does not fail the batch.
    pub fn fit_all(&self, trials: &[Trial]) -> Result<Vec<FitResult>, FitError> {
        self.options.validate()?;
        self.minimizer.check_available()?;

        let groups = partition(trials).into_iter().collect::<Vec<_>>();
        let workers = self.options.worker_count(groups.len());
        tracing::info!(
            groups = groups.len(),
            trials = trials.len(),
            workers,
            optimizer = self.minimizer.name(),
            "fitting groups"
        );

        let next = &AtomicUsize::new(0);
        let groups = &groups;
        let mut slots = thread::scope(|s| {
            let handles = (0..workers)
                .map(|_| {
                    s.spawn(move || {
                        let mut done = vec![];
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some((key, group)) = groups.get(i) else {
                                break;
                            };
                            done.push((i, self.fit_group(key, group)));
                        }
                        done
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        });
        slots.sort_by_key(|(i, _)| *i);

        let results = slots
            .into_iter()
            .map(|(_, result)| result)
            .collect::<Result<Vec<_>, _>>()?;

        let converged = results.iter().filter(|r| r.converged).count();
        tracing::info!(groups = results.len(), converged, "finished fitting groups");
        Ok(results)
    }

    /// Fits a single group.
    ///
    /// An empty group, or one rejected by the missing value policy, yields
    /// [`FitResult::unfitted`].
    ///
    /// # Errors
    ///
    /// Fails only if the minimizer is unavailable.
    pub fn fit_group(
        &self,
        key: &GroupKey,
        trials: &[&Trial],
    ) -> Result<FitResult, MinimizerUnavailable> {
        let _span = tracing::debug_span!(
            "fit_group",
            participant = %key.participant_id,
            difficulty = %key.difficulty,
            liking = ?key.liking_bin.map(LikingBin::code),
            round = key.round,
        )
        .entered();

        if trials.is_empty() {
            tracing::debug!("empty group");
            return Ok(FitResult::unfitted(key.clone(), 0));
        }

        let sequence =
            match TrialSequence::from_trials(trials.iter().copied(), self.options.missing_values) {
                Ok(sequence) => sequence,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping group with incomplete trials");
                    return Ok(FitResult::unfitted(key.clone(), trials.len()));
                }
            };

        let objective = |x: [f64; 2]| simulator::evaluate(&sequence, transform::to_constrained(x));
        let minimum =
            self.minimizer
                .minimize(&objective, self.options.initial, &self.options.bounds)?;
        let params = transform::to_constrained(minimum.x);

        if minimum.converged() {
            tracing::debug!(
                alpha = params.alpha,
                beta = params.beta,
                nll = minimum.value,
                iterations = minimum.iterations,
                "group fitted"
            );
        } else {
            tracing::warn!(
                termination = %minimum.termination,
                iterations = minimum.iterations,
                nll = minimum.value,
                "group fit did not converge"
            );
        }

        Ok(FitResult {
            key: key.clone(),
            alpha_hat: params.alpha,
            beta_hat: params.beta,
            nll: minimum.value,
            converged: minimum.converged(),
            n_trials: sequence.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64Mcg;
    use rlfit_model::{Action, agent::SoftmaxAgent};

    use super::*;
    use crate::optimizer::{ProjectedGradient, UnavailableMinimizer};

    fn trial(participant: &str, round: u32, index: u32, action: Action, reward: f64) -> Trial {
        Trial {
            participant_id: participant.to_owned(),
            round,
            trial_index: index,
            state_id: Some(index % 2),
            action: Some(action),
            reward,
            difficulty: if round == 1 { "easy" } else { "hard" }.to_owned(),
            liking_bin: Some(LikingBin::Like),
        }
    }

    /// Trials generated by a softmax agent on a two-state task where the
    /// right response is rewarded with probability `p_correct`.
    fn simulated(
        participant: &str,
        round: u32,
        params: ModelParams,
        n: u32,
        seed: u64,
    ) -> Vec<Trial> {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut agent = SoftmaxAgent::new(params, 2);
        let p_correct = 0.85;
        (1..=n)
            .map(|index| {
                let state = rng.random_range(0..2_u32);
                let action = agent.choose(state as usize, &mut rng);
                let correct = if state == 0 { Action::Right } else { Action::Left };
                let p = if action == correct { p_correct } else { 1.0 - p_correct };
                let reward = if rng.random_bool(p) { 1.0 } else { 0.0 };
                agent.learn(state as usize, action, reward);
                Trial {
                    participant_id: participant.to_owned(),
                    round,
                    trial_index: index,
                    state_id: Some(state),
                    action: Some(action),
                    reward,
                    difficulty: "easy".to_owned(),
                    liking_bin: Some(LikingBin::Dislike),
                }
            })
            .collect()
    }

    #[test]
    fn test_partition_is_sorted_and_complete() {
        let trials = vec![
            trial("P2", 2, 1, Action::Left, 1.0),
            trial("P1", 2, 1, Action::Left, 0.0),
            trial("P1", 1, 1, Action::Right, 1.0),
            trial("P1", 1, 2, Action::Right, 1.0),
        ];
        let groups = partition(&trials);
        let keys = groups
            .keys()
            .map(|k| (k.participant_id.as_str(), k.round))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![("P1", 1), ("P1", 2), ("P2", 2)]);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), trials.len());
    }

    #[test]
    fn test_absent_liking_is_its_own_group() {
        let mut trials = simulated("P1", 1, ModelParams::new(0.4, 3.0), 30, 4);
        let mut unrated = simulated("P1", 1, ModelParams::new(0.4, 3.0), 20, 5);
        for t in &mut unrated {
            t.liking_bin = None;
        }
        trials.extend(unrated);

        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        let results = fitter.fit_all(&trials).unwrap();

        let groups = results
            .iter()
            .map(|r| (r.key.liking_bin, r.n_trials))
            .collect::<Vec<_>>();
        assert_eq!(groups, vec![(None, 20), (Some(LikingBin::Dislike), 30)]);
        assert!(results[0].nll.is_finite());
    }

    #[test]
    fn test_grouping_completeness() {
        let mut trials = vec![];
        for (participant, seed) in [("P1", 1), ("P2", 2)] {
            for round in 1..=2 {
                let mut group = simulated(participant, round, ModelParams::new(0.3, 5.0), 40, seed);
                for t in &mut group {
                    t.difficulty = if round == 1 { "easy" } else { "hard" }.to_owned();
                }
                trials.extend(group);
            }
        }
        // An extra group with a different liking bin for P1 round 1.
        let mut liked = simulated("P1", 1, ModelParams::new(0.6, 2.0), 25, 9);
        for t in &mut liked {
            t.liking_bin = Some(LikingBin::Like);
        }
        trials.extend(liked);

        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        let results = fitter.fit_all(&trials).unwrap();

        let partitioned = partition(&trials);
        assert_eq!(results.len(), 5);
        assert_eq!(results.len(), partitioned.len());
        for (result, (key, group)) in results.iter().zip(&partitioned) {
            assert_eq!(&result.key, key);
            assert_eq!(result.n_trials, group.len());
            assert!(result.nll.is_finite() && result.nll >= 0.0);
            assert!(result.alpha_hat > 0.0 && result.alpha_hat < 1.0);
            assert!(result.beta_hat > 0.0);
        }
    }

    #[test]
    fn test_groups_do_not_contaminate_each_other() {
        let a = simulated("A", 1, ModelParams::new(0.2, 8.0), 60, 3);
        let b = simulated("B", 1, ModelParams::new(0.8, 1.0), 60, 4);
        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());

        let alone = fitter.fit_all(&a).unwrap();
        let together = fitter.fit_all(&[a.clone(), b].concat()).unwrap();
        assert_eq!(alone[0], together[0]);
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let trials = [
            simulated("A", 1, ModelParams::new(0.3, 4.0), 50, 5),
            simulated("B", 1, ModelParams::new(0.5, 6.0), 50, 6),
            simulated("C", 1, ModelParams::new(0.7, 2.0), 50, 7),
        ]
        .concat();
        let minimizer = ProjectedGradient::default();
        let sequential = GroupFitter::new(
            &minimizer,
            FitOptions {
                workers: NonZeroUsize::new(1),
                ..FitOptions::default()
            },
        )
        .fit_all(&trials)
        .unwrap();
        let parallel = GroupFitter::new(
            &minimizer,
            FitOptions {
                workers: NonZeroUsize::new(3),
                ..FitOptions::default()
            },
        )
        .fit_all(&trials)
        .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_fit_beats_starting_point() {
        let trials = simulated("P1", 1, ModelParams::new(0.4, 6.0), 120, 11);
        let minimizer = ProjectedGradient::default();
        let options = FitOptions::default();
        let fitter = GroupFitter::new(&minimizer, options.clone());
        let result = &fitter.fit_all(&trials).unwrap()[0];

        let refs = trials.iter().collect::<Vec<_>>();
        let sequence = TrialSequence::from_trials(refs, MissingValuePolicy::Reject).unwrap();
        let start_nll =
            simulator::evaluate(&sequence, transform::to_constrained(options.initial));
        assert!(result.converged);
        assert!(result.nll <= start_nll);
        let refit = simulator::evaluate(&sequence, result.params().unwrap());
        assert!((refit - result.nll).abs() < 1e-9);
    }

    #[test]
    fn test_parameter_recovery() {
        let truth = ModelParams::new(0.35, 6.0);
        let trials = simulated("P1", 1, truth, 600, 2024);
        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        let result = &fitter.fit_all(&trials).unwrap()[0];
        assert!(
            (result.alpha_hat - truth.alpha).abs() < 0.25,
            "alpha_hat={}",
            result.alpha_hat
        );
        assert!(
            result.beta_hat > 2.0 && result.beta_hat < 18.0,
            "beta_hat={}",
            result.beta_hat
        );
    }

    #[test]
    fn test_empty_group_yields_nan_row() {
        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        let key = GroupKey {
            participant_id: "ghost".to_owned(),
            difficulty: "hard".to_owned(),
            liking_bin: None,
            round: 3,
        };
        let result = fitter.fit_group(&key, &[]).unwrap();
        assert_eq!(result.key, key);
        assert!(result.alpha_hat.is_nan());
        assert!(result.beta_hat.is_nan());
        assert!(result.nll.is_nan());
        assert!(!result.converged);
        assert_eq!(result.n_trials, 0);
        assert_eq!(result.params(), None);
    }

    #[test]
    fn test_empty_table() {
        let minimizer = ProjectedGradient::default();
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        assert!(fitter.fit_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_minimizer_fits_nothing() {
        let trials = simulated("P1", 1, ModelParams::new(0.3, 3.0), 20, 1);
        let minimizer = UnavailableMinimizer::new("no optimizer configured");
        let fitter = GroupFitter::new(&minimizer, FitOptions::default());
        let err = fitter.fit_all(&trials).unwrap_err();
        assert!(matches!(err, FitError::OptimizerUnavailable(_)));
        assert_eq!(
            err.to_string(),
            "optimizer unavailable: no optimizer configured"
        );
    }

    #[test]
    fn test_missing_values_policy() {
        let mut trials = simulated("P1", 1, ModelParams::new(0.3, 3.0), 30, 8);
        trials[4].action = None;
        let minimizer = ProjectedGradient::default();

        let rejected = GroupFitter::new(&minimizer, FitOptions::default())
            .fit_all(&trials)
            .unwrap();
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].alpha_hat.is_nan());
        assert!(!rejected[0].converged);
        assert_eq!(rejected[0].n_trials, 30);

        let defaulted = GroupFitter::new(
            &minimizer,
            FitOptions {
                missing_values: MissingValuePolicy::DefaultToZero,
                ..FitOptions::default()
            },
        )
        .fit_all(&trials)
        .unwrap();
        assert!(!defaulted[0].alpha_hat.is_nan());
        assert_eq!(defaulted[0].n_trials, 30);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let minimizer = ProjectedGradient::default();
        let options = FitOptions {
            bounds: Bounds {
                lower: [1.0, 0.0],
                upper: [0.0, 1.0],
            },
            ..FitOptions::default()
        };
        let err = GroupFitter::new(&minimizer, options)
            .fit_all(&[])
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidOptions(_)));
    }

    #[test]
    fn test_options_json() {
        let options: FitOptions =
            serde_json::from_str(r#"{ "missing_values": "default-to-zero", "workers": 2 }"#)
                .unwrap();
        assert_eq!(options.missing_values, MissingValuePolicy::DefaultToZero);
        assert_eq!(options.workers, NonZeroUsize::new(2));
        assert_eq!(options.bounds, Bounds::default());
        assert_eq!(options.initial, [0.0, 0.5]);
    }
}
