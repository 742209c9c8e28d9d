//! Plain-text tables printed to stdout.

use rlfit_analysis::summary::SummaryRow;
use rlfit_fit::FitResult;

fn print_separator(width: usize) {
    println!("  {}", "-".repeat(width));
}

fn fmt_opt(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else {
        format!("{value:.precision$}")
    }
}

/// Print behavior summary rows
pub(crate) fn print_summary(rows: &[SummaryRow]) {
    println!(
        "  {:<12} {:>5} {:<10} {:>8} {:>8} {:>8} {:>10}",
        "Participant", "Round", "Difficulty", "Trials", "Acc", "Reward", "RT(ms)",
    );
    // participant(12) + round(5) + difficulty(10) + trials(8) + acc(8) + reward(8)
    // + rt(10) + spaces(6)
    print_separator(67);
    for row in rows {
        println!(
            "  {:<12} {:>5} {:<10} {:>8} {:>8} {:>8} {:>10}",
            row.participant_id,
            row.round,
            row.difficulty,
            row.n_trials,
            fmt_opt(row.accuracy, 3),
            fmt_opt(row.reward, 3),
            fmt_opt(row.rt_ms, 1),
        );
    }
}

/// Print fit results
pub(crate) fn print_fits(results: &[FitResult]) {
    println!(
        "  {:<12} {:<10} {:>6} {:>5} {:>8} {:>8} {:>10} {:>9} {:>7}",
        "Participant",
        "Difficulty",
        "Liking",
        "Round",
        "Alpha",
        "Beta",
        "NLL",
        "Converged",
        "Trials",
    );
    // participant(12) + difficulty(10) + liking(6) + round(5) + alpha(8) + beta(8)
    // + nll(10) + converged(9) + trials(7) + spaces(8)
    print_separator(83);
    for r in results {
        let liking = r
            .key
            .liking_bin
            .map_or_else(|| "-".to_owned(), |l| l.to_string());
        println!(
            "  {:<12} {:<10} {:>6} {:>5} {:>8} {:>8} {:>10} {:>9} {:>7}",
            r.key.participant_id,
            r.key.difficulty,
            liking,
            r.key.round,
            fmt_opt(r.alpha_hat, 3),
            fmt_opt(r.beta_hat, 3),
            fmt_opt(r.nll, 3),
            if r.converged { "yes" } else { "no" },
            r.n_trials,
        );
    }
}
