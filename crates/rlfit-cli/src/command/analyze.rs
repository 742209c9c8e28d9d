//! End-to-end analysis of one behavior export
//!
//! Writes `summary.csv`, `learning_curves.csv` and `rl_fits.csv` into the
//! output directory. Fitting is the only stage that needs an optimizer; when
//! none is available the other outputs are still produced.

use std::path::{Path, PathBuf};

use rlfit_analysis::{
    learning_curve::{self, DEFAULT_MIN_PERIODS, DEFAULT_WINDOW},
    output, summary,
};
use rlfit_fit::{FitError, optimizer::Minimizer};

use super::fit;
use crate::{
    config::{FitArg, FitConfig},
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the behavior CSV
    behavior: PathBuf,
    /// Directory to save tables into
    #[arg(long, default_value = "results")]
    outdir: PathBuf,
    #[clap(flatten)]
    fit: FitArg,
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let AnalyzeArg {
        behavior,
        outdir,
        fit,
    } = arg;
    let config = fit.config()?;
    let minimizer = fit.minimizer(&config);
    analyze(behavior, outdir, minimizer.as_ref(), &config)
}

fn analyze(
    behavior: &Path,
    outdir: &Path,
    minimizer: &dyn Minimizer,
    config: &FitConfig,
) -> anyhow::Result<()> {
    let behavior_table = util::read_behavior_file(behavior)?;
    util::create_dir(outdir)?;

    let rows = summary::summarize(behavior_table.records());
    println!("Behavior summary by participant, round and difficulty");
    println!("=====================================================");
    table::print_summary(&rows);
    println!();
    let summary_path = outdir.join("summary.csv");
    Output::save_csv(&rows, Some(summary_path.clone()))?;
    eprintln!("Summary saved to {}", summary_path.display());

    let points = learning_curve::learning_curves(
        behavior_table.records(),
        DEFAULT_WINDOW,
        DEFAULT_MIN_PERIODS,
    );
    let curves_path = outdir.join("learning_curves.csv");
    Output::save_csv(&points, Some(curves_path.clone()))?;
    eprintln!("Learning curves saved to {}", curves_path.display());

    let trials = behavior_table.trials();
    match fit::fit_trials(&trials, minimizer, config) {
        Ok(results) => {
            let fits_path = outdir.join("rl_fits.csv");
            let mut out = Output::open(fits_path.clone())?;
            output::write_fits(&mut out, &results)?;
            eprintln!("RL fits saved to {}", fits_path.display());
            fit::print_results(&results);
        }
        Err(e) => match e.downcast::<FitError>() {
            Ok(FitError::OptimizerUnavailable(reason)) => {
                tracing::warn!(%reason, "skipping model fitting");
                println!("Optimizer not available ({reason}); skipping RL model fitting.");
            }
            Ok(e) => return Err(e.into()),
            Err(e) => return Err(e),
        },
    }
    Ok(())
}
