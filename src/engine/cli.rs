//! CLI command handler: run the configured command and print what it finds.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_counter, refresh_bar, update_progress_bar};
use crate::engine::tools::resolve_root;
use crate::utils::config::PackagePaths;
use crate::utils::{apply_file_to_opts, cmd_from_env, load_config_file, setup_logging};
use crate::{GatherOutcome, GatherSummary, Opts, ResolvedEntry, gather};

/// Merge config file, environment and flags (flags win), then set up logging.
fn setup_opts(cli: &Cli, root: &Path) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_config_file(root) {
        apply_file_to_opts(&file, &mut opts);
    }
    if let Some(v) = cli.update_items {
        opts.update_items = v;
    }
    if let Some(v) = cli.first_batch {
        opts.first_batch = v;
    }
    if let Some(v) = cli.json {
        opts.json = v;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    setup_logging(opts.verbose);
    if !cli.cmd.is_empty() {
        opts.cmd = cli.cmd.clone();
    } else if opts.cmd.is_empty()
        && let Some(cmd) = cmd_from_env(root)
    {
        opts.cmd = cmd;
    }
    opts
}

fn write_entry(out: &mut impl Write, entry: &ResolvedEntry, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, entry)?;
        writeln!(out)
    } else {
        writeln!(out, "{}", entry.word)
    }
}

/// Run the search described by `cli` and print entries to stdout as batches arrive.
pub fn handle_run(cli: &Cli) -> Result<GatherSummary> {
    let root = resolve_root(&cli.dir)?;
    let opts = setup_opts(cli, &root);
    debug!("{} CONFIG:{:#?}", PackagePaths::get().pkg_name().to_uppercase(), opts);
    if opts.cmd.is_empty() {
        warn!(
            "No command given. Pass one after `--`, set `cmd` in {}, or set {}.",
            PackagePaths::get().config_filename(),
            PackagePaths::get().cmd_env_key()
        );
    }

    let stream = gather(opts.to_request(root));
    let token = stream.token();
    ctrlc::set_handler(move || {
        token.fire();
    })
    .context("set Ctrl+C handler")?;

    let bar = opts.verbose.then(|| {
        let b = create_counter("Gathering");
        refresh_bar(&b);
        b
    });

    let mut write_error = None;
    {
        let mut out = BufWriter::new(io::stdout().lock());
        for batch in stream.iter() {
            let written = batch
                .iter()
                .try_for_each(|entry| write_entry(&mut out, entry, opts.json))
                .and_then(|_| out.flush());
            if let Err(e) = written {
                stream.cancel();
                write_error = Some(e);
                break;
            }
            if let Some(bar) = &bar {
                update_progress_bar(bar, batch.len());
            }
        }
    }
    if bar.is_some() {
        eprintln!();
    }

    let summary = stream.join()?;
    match write_error {
        Some(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stdout closed; stopped early");
        }
        Some(e) => return Err(e).context("write entries to stdout"),
        None => {}
    }
    if summary.outcome == GatherOutcome::Cancelled {
        info!("Cancelled after {} entries", summary.entries);
    }
    debug!(
        "{} entries in {} batches ({} skipped)",
        summary.entries, summary.batches, summary.skipped
    );
    Ok(summary)
}
