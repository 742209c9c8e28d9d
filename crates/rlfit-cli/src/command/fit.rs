use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rlfit_analysis::output::{self, FitRow};
use rlfit_fit::{FitError, FitResult, GroupFitter, optimizer::Minimizer};
use rlfit_model::Trial;
use serde::Serialize;

use crate::{
    config::{FitArg, FitConfig},
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FitCommandArg {
    /// Path to the behavior CSV
    behavior: PathBuf,
    /// Output CSV path (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write a JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,
    #[clap(flatten)]
    fit: FitArg,
}

#[derive(Debug, Serialize)]
struct FitReport<'a> {
    fitted_at: DateTime<Utc>,
    behavior: &'a Path,
    optimizer: &'a str,
    options: &'a FitConfig,
    n_trials: usize,
    n_groups: usize,
    n_converged: usize,
    results: Vec<FitRow<'a>>,
}

pub(crate) fn run(arg: &FitCommandArg) -> anyhow::Result<()> {
    let FitCommandArg {
        behavior,
        output,
        report,
        fit,
    } = arg;

    let config = fit.config()?;
    let minimizer = fit.minimizer(&config);
    let trials = util::read_behavior_file(behavior)?.trials();

    let results = fit_trials(&trials, minimizer.as_ref(), &config)?;

    let mut out = Output::from_output_path(output.clone())?;
    output::write_fits(&mut out, &results)?;
    if output.is_some() {
        eprintln!("RL fits saved to {}", out.display_path());
        print_results(&results);
    }

    if let Some(path) = report {
        let report = FitReport {
            fitted_at: Utc::now(),
            behavior,
            optimizer: minimizer.name(),
            options: &config,
            n_trials: trials.len(),
            n_groups: results.len(),
            n_converged: results.iter().filter(|r| r.converged).count(),
            results: results.iter().map(FitRow::from).collect(),
        };
        Output::save_json(&report, Some(path.clone()))?;
        eprintln!("Fit report saved to {}", path.display());
    }
    Ok(())
}

pub(super) fn fit_trials(
    trials: &[Trial],
    minimizer: &dyn Minimizer,
    config: &FitConfig,
) -> anyhow::Result<Vec<FitResult>> {
    minimizer.check_available().map_err(FitError::from)?;
    let fitter = GroupFitter::new(minimizer, config.fit.clone());
    eprintln!("Fitting {} trials with {}...", trials.len(), minimizer.name());
    let results = fitter.fit_all(trials)?;
    let converged = results.iter().filter(|r| r.converged).count();
    eprintln!("Fitted {} groups ({converged} converged)", results.len());
    Ok(results)
}

pub(super) fn print_results(results: &[FitResult]) {
    println!("RL fits");
    println!("=======");
    table::print_fits(results);
}
