use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

/// Crate name as it appears in log targets (`file_external::...`).
const LOG_TARGET: &str = "file_external";

/// Requested level for this crate; dependencies stay at `Warn`.
fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Module path below the crate root, e.g. `pipeline::emitter`.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(LOG_TARGET)
        .map(|rest| rest.trim_start_matches("::"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(target)
}

fn render(record: &Record) -> String {
    let name = env!("CARGO_PKG_NAME").cyan();
    let module = short_target(record.target());
    match record.level() {
        Level::Error | Level::Warn => {
            let level = if record.level() == Level::Error {
                "ERROR".red()
            } else {
                "WARN".yellow()
            };
            format!("[{} {} {}] {}", name, level, module.white(), record.args())
        }
        Level::Info => format!("[{}] {}", name, record.args()),
        Level::Debug | Level::Trace => {
            format!("[{} {}] {}", name, module.dimmed(), record.args())
        }
    }
}

/// Install the stderr logger. Safe to call more than once; later calls are ignored.
pub fn setup_logging(verbose: bool) {
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(LOG_TARGET, crate_level(verbose))
        .format(|buf, record| writeln!(buf, "{}", render(record)))
        .try_init();
}
