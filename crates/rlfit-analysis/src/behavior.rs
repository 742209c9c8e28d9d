//! Loading and normalizing behavior exports.
//!
//! The experiment exports one CSV per participant. Two schemas are in
//! circulation and both are accepted:
//!
//! | Field        | Current export          | Legacy export            |
//! |--------------|-------------------------|--------------------------|
//! | participant  | `subj_id`               | `participantId`          |
//! | trial index  | `trial_in_round`        | `trialIndex`             |
//! | difficulty   | `difficulty`            | `difficulty_round` (0/1) |
//! | reward       | `reward`                | `feedbackPositive`       |
//! | action       | `action` (0/1)          | `responseSide`           |
//! | correctness  | `isCorrectChoice`       | `assignedSide`           |
//! | liking       | `liking` (0/1 or blank) | `liking_group`           |
//! | state        | `state`                 | `groupId`                |
//!
//! Exports that combine behavior and rating rows carry a `record_type`
//! column; only `behavior` rows are kept.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use rlfit_model::{Action, LikingBin, Trial};

/// One normalized behavior row.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorRecord {
    pub trial: Trial,
    /// Whether the response matched the rewarded side, if known.
    pub is_correct: Option<bool>,
    /// Reaction time in milliseconds, if recorded.
    pub rt_ms: Option<f64>,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("failed to open behavior file {}", path.display())]
    #[from(skip)]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to read behavior CSV: {_0}")]
    Csv(csv::Error),
}

/// A normalized behavior table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorTable {
    records: Vec<BehaviorRecord>,
}

/// Reads and normalizes the behavior CSV at `path`.
pub fn load_behavior<P>(path: P) -> Result<BehaviorTable, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let table = BehaviorTable::from_reader(io::BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        trials = table.len(),
        "loaded behavior table"
    );
    Ok(table)
}

impl BehaviorTable {
    #[must_use]
    pub fn new(records: Vec<BehaviorRecord>) -> Self {
        Self { records }
    }

    /// Parses a behavior CSV with a header row.
    ///
    /// Rows are normalized as follows:
    ///
    /// - participant is `participantId`, else `subj_id`, else `"NA"`
    /// - round defaults to `1`
    /// - trial index is `trial_in_round`, else `trialIndex`, else the 1-based
    ///   position among kept rows
    /// - reward that is not numeric counts as `0`
    /// - when there is no `state` column, states come from the sorted set of
    ///   distinct `groupId`s, or failing that, the 0-based row position
    ///
    /// Unparsable or negative codes become missing values.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlfit_analysis::behavior::BehaviorTable;
    /// use rlfit_model::Action;
    ///
    /// let csv = "\
    /// participantId,trialIndex,groupId,responseSide,feedbackPositive
    /// P1,1,G4,left,1
    /// P1,2,G1,right,0
    /// ";
    /// let table = BehaviorTable::from_reader(csv.as_bytes()).unwrap();
    /// let trials = table.trials();
    /// assert_eq!(trials[0].state_id, Some(1));
    /// assert_eq!(trials[1].action, Some(Action::Right));
    /// assert_eq!(trials[1].reward, 0.0);
    /// ```
    pub fn from_reader<R>(reader: R) -> Result<Self, LoadError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = Columns::new(reader.headers()?);

        let mut rows = vec![];
        let mut skipped = 0_usize;
        for row in reader.records() {
            let row = row?;
            if columns
                .record_type
                .is_none_or(|i| row.get(i) == Some("behavior"))
            {
                rows.push(row);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "skipped non-behavior rows");
        }

        let group_states = columns.group_id.filter(|_| columns.state.is_none()).map(|_| {
            rows.iter()
                .filter_map(|row| cell(row, columns.group_id))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .enumerate()
                .map(|(i, id)| (id.to_owned(), i))
                .collect::<BTreeMap<_, _>>()
        });

        let records = rows
            .iter()
            .enumerate()
            .map(|(position, row)| columns.normalize(row, position, group_states.as_ref()))
            .collect();
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[BehaviorRecord] {
        &self.records
    }

    /// Model-facing trials, in file order.
    #[must_use]
    pub fn trials(&self) -> Vec<Trial> {
        self.records.iter().map(|r| r.trial.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Header positions of the recognized columns.
#[derive(Debug, Default)]
struct Columns {
    record_type: Option<usize>,
    participant_id: Option<usize>,
    subj_id: Option<usize>,
    round: Option<usize>,
    trial_in_round: Option<usize>,
    trial_index: Option<usize>,
    difficulty: Option<usize>,
    difficulty_round: Option<usize>,
    reward: Option<usize>,
    feedback_positive: Option<usize>,
    action: Option<usize>,
    response_side: Option<usize>,
    assigned_side: Option<usize>,
    is_correct_choice: Option<usize>,
    rt_ms: Option<usize>,
    liking: Option<usize>,
    liking_group: Option<usize>,
    state: Option<usize>,
    group_id: Option<usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            record_type: find("record_type"),
            participant_id: find("participantId"),
            subj_id: find("subj_id"),
            round: find("round"),
            trial_in_round: find("trial_in_round"),
            trial_index: find("trialIndex"),
            difficulty: find("difficulty"),
            difficulty_round: find("difficulty_round"),
            reward: find("reward"),
            feedback_positive: find("feedbackPositive"),
            action: find("action"),
            response_side: find("responseSide"),
            assigned_side: find("assignedSide"),
            is_correct_choice: find("isCorrectChoice"),
            rt_ms: find("rtMs"),
            liking: find("liking"),
            liking_group: find("liking_group"),
            state: find("state"),
            group_id: find("groupId"),
        }
    }

    fn normalize(
        &self,
        row: &StringRecord,
        position: usize,
        group_states: Option<&BTreeMap<String, usize>>,
    ) -> BehaviorRecord {
        let participant_id = cell(row, self.participant_id)
            .or_else(|| cell(row, self.subj_id))
            .unwrap_or("NA")
            .to_owned();
        let round = code(row, self.round).unwrap_or(1);
        let trial_index = code(row, self.trial_in_round)
            .or_else(|| code(row, self.trial_index))
            .unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX));

        let difficulty = cell(row, self.difficulty)
            .or_else(|| match code(row, self.difficulty_round) {
                Some(0) => Some("easy"),
                Some(1) => Some("hard"),
                _ => None,
            })
            .unwrap_or_default()
            .to_owned();

        let reward = if self.reward.is_some() {
            number(row, self.reward)
        } else {
            number(row, self.feedback_positive)
        }
        .unwrap_or(0.0);

        let action = if self.action.is_some() {
            code(row, self.action).and_then(Action::from_code)
        } else {
            cell(row, self.response_side).and_then(Action::from_side)
        };

        let is_correct = if self.is_correct_choice.is_some() {
            flag(row, self.is_correct_choice)
        } else {
            match (cell(row, self.assigned_side), cell(row, self.response_side)) {
                (Some(assigned), Some(response)) => Some(assigned == response),
                _ => None,
            }
        };

        let rt_ms = number(row, self.rt_ms);

        let liking_bin = code(row, self.liking)
            .and_then(LikingBin::from_code)
            .or_else(|| {
                self.liking_group.map(|_| {
                    if cell(row, self.liking_group) == Some("high") {
                        LikingBin::Like
                    } else {
                        LikingBin::Dislike
                    }
                })
            });

        let state_id = if self.state.is_some() {
            code(row, self.state)
        } else if let Some(states) = group_states {
            cell(row, self.group_id)
                .and_then(|id| states.get(id))
                .and_then(|&i| u32::try_from(i).ok())
        } else {
            u32::try_from(position).ok()
        };

        BehaviorRecord {
            trial: Trial {
                participant_id,
                round,
                trial_index,
                state_id,
                action,
                reward,
                difficulty,
                liking_bin,
            },
            is_correct,
            rt_ms,
        }
    }
}

/// Non-empty cell contents.
fn cell(row: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|i| row.get(i))
        .filter(|s| !s.is_empty())
}

/// Finite numeric cell.
fn number(row: &StringRecord, column: Option<usize>) -> Option<f64> {
    cell(row, column)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Non-negative integral cell, accepting float spellings such as `1.0`.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn code(row: &StringRecord, column: Option<usize>) -> Option<u32> {
    number(row, column)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

/// Boolean cell written as `0`/`1` or `true`/`false`.
fn flag(row: &StringRecord, column: Option<usize>) -> Option<bool> {
    match cell(row, column)? {
        "true" | "TRUE" | "True" => Some(true),
        "false" | "FALSE" | "False" => Some(false),
        _ => number(row, column).map(|v| v != 0.0),
    }
}
