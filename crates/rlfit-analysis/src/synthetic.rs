//! Synthetic behavior exports produced by a simulated participant.
//!
//! A [`SoftmaxAgent`] plays the two-round experiment:
//!
//! | Round | Difficulty | P(reward \| correct) | Stimulus groups |
//! |-------|------------|----------------------|-----------------|
//! | 1     | easy       | 0.9                  | 3               |
//! | 2     | hard       | 0.7                  | 4               |
//!
//! Each stimulus group has a hidden correct side and is shown
//! `trials_per_group` times in shuffled order. Groups are drawn so that all
//! six appear at least once across the two rounds. The agent starts every
//! round with a fresh Q-table, one state per stimulus group.
//!
//! Rows are written in the experiment's combined export layout, so they load
//! back through [`BehaviorTable`](crate::behavior::BehaviorTable).

use rand::{Rng, seq::SliceRandom as _};
use rand_distr::{Distribution as _, LogNormal, NormalError};
use rlfit_model::{Action, LikingBin, ModelParams, agent::SoftmaxAgent};
use serde::{Deserialize, Serialize};

/// A stimulus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StimulusGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub liking: LikingBin,
}

pub const STIMULUS_GROUPS: [StimulusGroup; 6] = [
    StimulusGroup {
        id: "G1",
        label: "puppies",
        liking: LikingBin::Like,
    },
    StimulusGroup {
        id: "G2",
        label: "nature",
        liking: LikingBin::Like,
    },
    StimulusGroup {
        id: "G3",
        label: "babies",
        liking: LikingBin::Like,
    },
    StimulusGroup {
        id: "G4",
        label: "alcohol",
        liking: LikingBin::Dislike,
    },
    StimulusGroup {
        id: "G5",
        label: "neutral",
        liking: LikingBin::Dislike,
    },
    StimulusGroup {
        id: "G6",
        label: "negative",
        liking: LikingBin::Dislike,
    },
];

/// One round of the experiment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSpec {
    pub round: u32,
    pub difficulty: &'static str,
    pub difficulty_round: u32,
    pub p_correct: f64,
    pub n_groups: usize,
}

pub const SCHEDULE: [RoundSpec; 2] = [
    RoundSpec {
        round: 1,
        difficulty: "easy",
        difficulty_round: 0,
        p_correct: 0.9,
        n_groups: 3,
    },
    RoundSpec {
        round: 2,
        difficulty: "hard",
        difficulty_round: 1,
        p_correct: 0.7,
        n_groups: 4,
    },
];

/// Settings of a simulated participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    pub params: ModelParams,
    pub trials_per_group: usize,
    /// Median reaction time in milliseconds.
    pub rt_median_ms: f64,
    /// Log-scale spread of reaction times.
    pub rt_sigma: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            params: ModelParams::new(0.3, 5.0),
            trials_per_group: 30,
            rt_median_ms: 550.0,
            rt_sigma: 0.35,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SyntheticError {
    #[display("invalid reaction time distribution: {_0}")]
    ReactionTime(NormalError),
    #[display("median reaction time must be positive, got {value}")]
    #[from(skip)]
    NonPositiveMedian { value: f64 },
}

/// A behavior row in the experiment export layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub record_type: &'static str,
    pub subj_id: String,
    pub round: u32,
    pub trial_in_round: u32,
    pub difficulty_round: u32,
    pub difficulty: &'static str,
    pub state: u32,
    #[serde(rename = "groupId")]
    pub group_id: &'static str,
    #[serde(rename = "groupLabel")]
    pub group_label: &'static str,
    pub liking_group: &'static str,
    pub liking: LikingBin,
    #[serde(rename = "assignedSide")]
    pub assigned_side: &'static str,
    pub action: u8,
    #[serde(rename = "responseSide")]
    pub response_side: &'static str,
    #[serde(rename = "isCorrectChoice")]
    pub is_correct_choice: u8,
    pub reward: u8,
    #[serde(rename = "feedbackPositive")]
    pub feedback_positive: u8,
    #[serde(rename = "rtMs")]
    pub rt_ms: u32,
}

/// Simulates one participant through [`SCHEDULE`].
pub fn simulate_participant<R>(
    participant_id: &str,
    config: &SyntheticConfig,
    rng: &mut R,
) -> Result<Vec<ExportRow>, SyntheticError>
where
    R: Rng + ?Sized,
{
    if config.rt_median_ms <= 0.0 || config.rt_median_ms.is_nan() {
        return Err(SyntheticError::NonPositiveMedian {
            value: config.rt_median_ms,
        });
    }
    let rt = LogNormal::new(config.rt_median_ms.ln(), config.rt_sigma)?;

    let mut rows = vec![];
    for (spec, groups) in SCHEDULE.iter().zip(assign_groups(rng)) {
        let correct_sides = groups
            .iter()
            .map(|_| {
                if rng.random_bool(0.5) {
                    Action::Left
                } else {
                    Action::Right
                }
            })
            .collect::<Vec<_>>();

        let mut order = (0..groups.len())
            .flat_map(|g| std::iter::repeat_n(g, config.trials_per_group))
            .collect::<Vec<_>>();
        order.shuffle(rng);

        let mut agent = SoftmaxAgent::new(config.params, STIMULUS_GROUPS.len());
        for (i, &g) in order.iter().enumerate() {
            let group = groups[g];
            let state = state_of(group);
            let action = agent.choose(state, rng);
            let correct = action == correct_sides[g];
            let p = if correct {
                spec.p_correct
            } else {
                1.0 - spec.p_correct
            };
            let rewarded = rng.random_bool(p);
            let reward = if rewarded { 1.0 } else { 0.0 };
            agent.learn(state, action, reward);

            rows.push(ExportRow {
                record_type: "behavior",
                subj_id: participant_id.to_owned(),
                round: spec.round,
                trial_in_round: u32::try_from(i + 1).unwrap_or(u32::MAX),
                difficulty_round: spec.difficulty_round,
                difficulty: spec.difficulty,
                state: u32::try_from(state).unwrap_or(u32::MAX),
                group_id: group.id,
                group_label: group.label,
                liking_group: match group.liking {
                    LikingBin::Like => "high",
                    LikingBin::Dislike => "low",
                },
                liking: group.liking,
                assigned_side: correct_sides[g].side(),
                action: u8::try_from(action.index()).unwrap_or(u8::MAX),
                response_side: action.side(),
                is_correct_choice: u8::from(correct),
                reward: u8::from(rewarded),
                feedback_positive: u8::from(rewarded),
                rt_ms: sample_rt(&rt, rng),
            });
        }
    }
    Ok(rows)
}

/// Picks the stimulus groups of each round so that every group is used.
fn assign_groups<R>(rng: &mut R) -> [Vec<StimulusGroup>; 2]
where
    R: Rng + ?Sized,
{
    let mut pool = STIMULUS_GROUPS;
    pool.shuffle(rng);
    let first = pool[..SCHEDULE[0].n_groups].to_vec();
    let mut second = pool[SCHEDULE[0].n_groups..].to_vec();
    let extra = SCHEDULE[1].n_groups.saturating_sub(second.len());
    second.extend_from_slice(&first[..extra.min(first.len())]);
    [first, second]
}

fn state_of(group: StimulusGroup) -> usize {
    STIMULUS_GROUPS
        .iter()
        .position(|g| g.id == group.id)
        .unwrap_or(0)
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample_rt<R>(dist: &LogNormal<f64>, rng: &mut R) -> u32
where
    R: Rng + ?Sized,
{
    dist.sample(rng).round().clamp(0.0, f64::from(u32::MAX)) as u32
}
