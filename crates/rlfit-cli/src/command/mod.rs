use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use self::{
    analyze::AnalyzeArg, fit::FitCommandArg, generate_trials::GenerateTrialsArg,
    learning_curves::LearningCurvesArg, summarize::SummarizeArg,
};
use crate::util;

mod analyze;
mod fit;
mod generate_trials;
mod learning_curves;
mod summarize;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Default log level; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Fit the Q-learning model per participant, difficulty, liking and round
    Fit(#[clap(flatten)] FitCommandArg),
    /// Summarize accuracy, reward and reaction time per condition
    Summarize(#[clap(flatten)] SummarizeArg),
    /// Compute moving-average learning curves by difficulty and liking
    LearningCurves(#[clap(flatten)] LearningCurvesArg),
    /// Run summary, learning curves and fits into an output directory
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Generate synthetic behavior data from a simulated participant
    GenerateTrials(#[clap(flatten)] GenerateTrialsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    util::init_logging(args.log_level);
    match args.mode {
        Mode::Fit(arg) => fit::run(&arg)?,
        Mode::Summarize(arg) => summarize::run(&arg)?,
        Mode::LearningCurves(arg) => learning_curves::run(&arg)?,
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::GenerateTrials(arg) => generate_trials::run(&arg)?,
    }
    Ok(())
}
