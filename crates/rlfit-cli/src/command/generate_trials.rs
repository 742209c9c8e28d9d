use std::path::PathBuf;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use rlfit_analysis::synthetic::{self, SyntheticConfig};
use rlfit_model::ModelParams;

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateTrialsArg {
    /// Number of simulated participants
    #[arg(long, default_value_t = 1)]
    participants: usize,
    /// Learning rate of the simulated participants
    #[arg(long, default_value_t = 0.3)]
    alpha: f64,
    /// Inverse temperature of the simulated participants
    #[arg(long, default_value_t = 5.0)]
    beta: f64,
    /// Presentations of each stimulus group per round
    #[arg(long, default_value_t = 30)]
    trials_per_group: usize,
    /// Random seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Output CSV path (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateTrialsArg) -> anyhow::Result<()> {
    let GenerateTrialsArg {
        participants,
        alpha,
        beta,
        trials_per_group,
        seed,
        output,
    } = arg;
    anyhow::ensure!(
        (0.0..=1.0).contains(alpha),
        "--alpha must be within [0, 1], got {alpha}"
    );
    anyhow::ensure!(*beta >= 0.0, "--beta must be non-negative, got {beta}");

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let config = SyntheticConfig {
        params: ModelParams::new(*alpha, *beta),
        trials_per_group: *trials_per_group,
        ..SyntheticConfig::default()
    };

    let mut rows = vec![];
    for i in 1..=*participants {
        let participant_id = format!("S{i:02}");
        rows.extend(synthetic::simulate_participant(
            &participant_id,
            &config,
            &mut rng,
        )?);
    }
    tracing::info!(seed, participants, alpha, beta, "generated synthetic trials");

    Output::save_csv(&rows, output.clone())?;
    eprintln!("Generated {} trials (seed {seed})", rows.len());
    if let Some(path) = output {
        eprintln!("  Path: {}", path.display());
    }
    Ok(())
}
