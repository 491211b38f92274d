//! file-external CLI: run a find-like command and list its results.

use anyhow::Result;
use clap::Parser;
use file_external::GatherOutcome;
use file_external::engine::arg_parser::Cli;
use file_external::engine::handle_run;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> Result<ExitCode> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let summary = handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(match summary.outcome {
        GatherOutcome::SpawnFailed
        | GatherOutcome::ProcessFailed { .. }
        | GatherOutcome::Failed => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
