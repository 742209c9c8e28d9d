//! Delimited output tables.

use std::io;

use rlfit_fit::FitResult;
use rlfit_model::LikingBin;
use serde::Serialize;

/// One row of the fit table.
///
/// Column order is `participant_id, difficulty, liking, round, alpha_hat,
/// beta_hat, nll, converged, n_trials`. An absent liking bin is an empty cell
/// and missing estimates are written as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitRow<'a> {
    pub participant_id: &'a str,
    pub difficulty: &'a str,
    pub liking: Option<LikingBin>,
    pub round: u32,
    pub alpha_hat: f64,
    pub beta_hat: f64,
    pub nll: f64,
    pub converged: bool,
    pub n_trials: usize,
}

impl<'a> From<&'a FitResult> for FitRow<'a> {
    fn from(result: &'a FitResult) -> Self {
        Self {
            participant_id: &result.key.participant_id,
            difficulty: &result.key.difficulty,
            liking: result.key.liking_bin,
            round: result.key.round,
            alpha_hat: result.alpha_hat,
            beta_hat: result.beta_hat,
            nll: result.nll,
            converged: result.converged,
            n_trials: result.n_trials,
        }
    }
}

/// Writes `rows` as CSV with a header derived from the row type.
pub fn write_csv<W, I, T>(writer: W, rows: I) -> Result<(), csv::Error>
where
    W: io::Write,
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes fit results in the fit table layout.
pub fn write_fits<W>(writer: W, results: &[FitResult]) -> Result<(), csv::Error>
where
    W: io::Write,
{
    write_csv(writer, results.iter().map(FitRow::from))
}
