//! Fit configuration assembled from the options file and flags.

use std::{num::NonZeroUsize, path::PathBuf};

use rlfit_fit::{
    FitOptions,
    optimizer::{Minimizer, ProjectedGradient, ProjectedGradientSettings, UnavailableMinimizer},
};
use rlfit_model::MissingValuePolicy;
use serde::{Deserialize, Serialize};

use crate::util;

/// Contents of an `--options` JSON file.
///
/// ```json
/// {
///   "fit": { "bounds": { "lower": [-4, -2], "upper": [4, 4] }, "initial": [0, 0.5] },
///   "optimizer": { "max_iterations": 200, "time_limit_secs": 5.0 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FitConfig {
    pub fit: FitOptions,
    pub optimizer: ProjectedGradientSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OptimizerKind {
    /// Box-constrained projected gradient
    ProjectedGradient,
    /// No optimizer; fitting is skipped
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum MissingValues {
    /// Leave groups with blank state or action unfitted
    Reject,
    /// Treat blank state or action as 0
    Zero,
}

impl From<MissingValues> for MissingValuePolicy {
    fn from(value: MissingValues) -> Self {
        match value {
            MissingValues::Reject => MissingValuePolicy::Reject,
            MissingValues::Zero => MissingValuePolicy::DefaultToZero,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FitArg {
    /// Optimizer used for maximum-likelihood fitting
    #[arg(long, value_enum, default_value = "projected-gradient")]
    optimizer: OptimizerKind,
    /// How to treat trials with a blank state or action [default: reject]
    #[arg(long, value_enum)]
    missing_values: Option<MissingValues>,
    /// JSON file with fit and optimizer options
    #[arg(long)]
    options: Option<PathBuf>,
    /// Number of worker threads (defaults to all cores)
    #[arg(long)]
    threads: Option<NonZeroUsize>,
    /// Maximum optimizer iterations per group
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Wall-clock limit per group fit in seconds
    #[arg(long)]
    time_limit: Option<f64>,
}

impl FitArg {
    /// Loads the options file, if any, and applies flag overrides.
    pub(crate) fn config(&self) -> anyhow::Result<FitConfig> {
        let mut config = match &self.options {
            Some(path) => util::read_json_file::<FitConfig, _>("fit options", path)?,
            None => FitConfig::default(),
        };
        if let Some(missing_values) = self.missing_values {
            config.fit.missing_values = missing_values.into();
        }
        if let Some(threads) = self.threads {
            config.fit.workers = Some(threads);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.optimizer.max_iterations = max_iterations;
        }
        if let Some(time_limit) = self.time_limit {
            config.optimizer.time_limit_secs = Some(time_limit);
        }
        config.optimizer.validate()?;
        Ok(config)
    }

    pub(crate) fn minimizer(&self, config: &FitConfig) -> Box<dyn Minimizer> {
        match self.optimizer {
            OptimizerKind::ProjectedGradient => {
                Box::new(ProjectedGradient::new(config.optimizer.clone()))
            }
            OptimizerKind::None => Box::new(UnavailableMinimizer::new(
                "no optimizer selected (--optimizer none)",
            )),
        }
    }
}
