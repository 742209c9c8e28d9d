//! Per-condition accuracy, reward and reaction time.

use std::collections::BTreeMap;

use rlfit_stats::descriptive::{nan_mean, nan_median};
use serde::Serialize;

use crate::behavior::BehaviorRecord;

/// Behavior of one participant in one round and difficulty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub participant_id: String,
    pub round: u32,
    pub difficulty: String,
    pub n_trials: usize,
    /// Fraction of correct choices among trials where correctness is known.
    pub accuracy: f64,
    /// Mean reward.
    pub reward: f64,
    /// Median reaction time in milliseconds over recorded trials.
    pub rt_ms: f64,
}

/// Summarizes behavior by `(participant, round, difficulty)`, sorted by key.
///
/// Missing correctness and reaction times are ignored; a statistic with no
/// observations is `NaN`.
#[must_use]
pub fn summarize(records: &[BehaviorRecord]) -> Vec<SummaryRow> {
    let mut groups = BTreeMap::<(&str, u32, &str), Vec<&BehaviorRecord>>::new();
    for record in records {
        let t = &record.trial;
        groups
            .entry((t.participant_id.as_str(), t.round, t.difficulty.as_str()))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|((participant_id, round, difficulty), group)| SummaryRow {
            participant_id: participant_id.to_owned(),
            round,
            difficulty: difficulty.to_owned(),
            n_trials: group.len(),
            accuracy: nan_mean(
                group
                    .iter()
                    .map(|r| r.is_correct.map_or(f64::NAN, |c| f64::from(u8::from(c)))),
            ),
            reward: nan_mean(group.iter().map(|r| r.trial.reward)),
            rt_ms: nan_median(group.iter().map(|r| r.rt_ms.unwrap_or(f64::NAN))),
        })
        .collect()
}
