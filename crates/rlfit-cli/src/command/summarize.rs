use std::path::PathBuf;

use rlfit_analysis::summary;

use crate::{
    table,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummarizeArg {
    /// Path to the behavior CSV
    behavior: PathBuf,
    /// Also write the summary as CSV to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SummarizeArg) -> anyhow::Result<()> {
    let SummarizeArg { behavior, output } = arg;
    let behavior_table = util::read_behavior_file(behavior)?;
    let rows = summary::summarize(behavior_table.records());

    println!("Behavior summary by participant, round and difficulty");
    println!("=====================================================");
    table::print_summary(&rows);

    if let Some(path) = output {
        Output::save_csv(&rows, Some(path.clone()))?;
        eprintln!("Summary saved to {}", path.display());
    }
    Ok(())
}
