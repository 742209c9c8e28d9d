use std::path::PathBuf;

use rlfit_analysis::learning_curve::{self, DEFAULT_MIN_PERIODS, DEFAULT_WINDOW};

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct LearningCurvesArg {
    /// Path to the behavior CSV
    behavior: PathBuf,
    /// Output CSV path (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of trials in the moving window
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,
    /// Minimum number of known outcomes in a window
    #[arg(long, default_value_t = DEFAULT_MIN_PERIODS)]
    min_periods: usize,
}

pub(crate) fn run(arg: &LearningCurvesArg) -> anyhow::Result<()> {
    let LearningCurvesArg {
        behavior,
        output,
        window,
        min_periods,
    } = arg;
    anyhow::ensure!(*window > 0, "--window must be at least 1");
    let table = util::read_behavior_file(behavior)?;
    let points = learning_curve::learning_curves(table.records(), *window, *min_periods);
    Output::save_csv(&points, output.clone())?;
    if let Some(path) = output {
        eprintln!("Learning curves saved to {}", path.display());
    }
    Ok(())
}
