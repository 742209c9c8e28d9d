//! Moving-average accuracy curves by condition.

use std::collections::BTreeMap;

use rlfit_model::LikingBin;
use rlfit_stats::rolling::rolling_mean;
use serde::Serialize;

use crate::behavior::BehaviorRecord;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_MIN_PERIODS: usize = 5;

/// One point of a learning curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub difficulty: String,
    pub liking: LikingBin,
    pub trial_index: u32,
    /// Trailing mean of correctness, `None` before enough trials are seen.
    pub moving_accuracy: Option<f64>,
}

/// Computes learning curves for every `(difficulty, liking)` condition.
///
/// Trials without a liking bin belong to no condition and are left out.
/// Within a condition, trials from all participants and rounds are pooled
/// and stably sorted by trial index; correctness is then averaged over a
/// trailing `window`, requiring at least `min_periods` known outcomes.
#[must_use]
pub fn learning_curves(
    records: &[BehaviorRecord],
    window: usize,
    min_periods: usize,
) -> Vec<CurvePoint> {
    let mut conditions = BTreeMap::<(&str, LikingBin), Vec<&BehaviorRecord>>::new();
    for record in records {
        if let Some(liking) = record.trial.liking_bin {
            conditions
                .entry((record.trial.difficulty.as_str(), liking))
                .or_default()
                .push(record);
        }
    }

    let mut points = vec![];
    for ((difficulty, liking), mut group) in conditions {
        group.sort_by_key(|r| r.trial.trial_index);
        let correctness = group
            .iter()
            .map(|r| r.is_correct.map_or(f64::NAN, |c| f64::from(u8::from(c))))
            .collect::<Vec<_>>();
        let moving = rolling_mean(&correctness, window, min_periods);
        points.extend(group.iter().zip(moving).map(|(r, moving_accuracy)| CurvePoint {
            difficulty: difficulty.to_owned(),
            liking,
            trial_index: r.trial.trial_index,
            moving_accuracy,
        }));
    }
    points
}
