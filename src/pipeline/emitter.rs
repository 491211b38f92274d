//! Batch emitter: drives one external command from spawn to a closed output channel.
//!
//! Idle → Spawning → Streaming → Draining → Finalizing → Closed, with
//! Streaming → Cancelling → Finalizing when the consumer withdraws. Draining awaits the
//! exit and reports the stderr of a failed command; Cancelling terminates and reaps the
//! process without reporting anything. Every path ends with the batch sender dropped exactly
//! once, which is what tells the consumer no more batches will arrive.

use crossbeam_channel::{Sender, bounded, select};
use log::{debug, error, warn};

use crate::engine::tools::resolve_line;
use crate::utils::config::{LINE_CHANNEL_CAP, STDERR_LINE_CAP};
use crate::{Batch, GatherOutcome, GatherSummary, SearchRequest};

use super::batcher::Batcher;
use super::cancel::{CancellationToken, spawn_cancel_bridge};
use super::lines::{AbortableLines, LineError, LineSource, Overflow, spawn_line_reader};
use super::process::{ExitOutcome, spawn};
use super::stat::{Classified, classify};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitterState {
    Idle,
    Spawning,
    Streaming,
    Cancelling,
    Draining,
    Finalizing,
    Closed,
}

/// Current state plus transition logging.
struct StateTracker {
    state: EmitterState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: EmitterState::Idle,
        }
    }

    fn to(&mut self, next: EmitterState) {
        debug!("emitter: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// How the stdout loop ended.
#[derive(Debug)]
enum StreamEnd {
    Exhausted,
    Aborted,
    Failed(LineError),
}

#[derive(Debug, Default)]
struct Tally {
    batches: usize,
    entries: usize,
    skipped: usize,
}

/// Send one batch, giving up if the token fires while the consumer is not receiving.
/// A dropped receiver counts as the consumer withdrawing and fires the token.
fn enqueue(
    tx: &Sender<Batch>,
    batch: Batch,
    token: &CancellationToken,
    tally: &mut Tally,
) -> bool {
    if token.is_fired() {
        return false;
    }
    let len = batch.len();
    select! {
        send(tx, batch) -> res => match res {
            Ok(()) => {
                tally.batches += 1;
                tally.entries += len;
                debug!("enqueued batch {} ({} entries)", tally.batches, len);
                true
            }
            Err(_) => {
                debug!("batch receiver dropped; cancelling");
                token.fire();
                false
            }
        },
        recv(token.signal()) -> _ => false,
    }
}

/// Pull lines, classify, batch and enqueue until the stream ends, fails or is aborted.
fn stream_batches(
    request: &SearchRequest,
    lines: AbortableLines,
    tx: &Sender<Batch>,
    token: &CancellationToken,
    tally: &mut Tally,
) -> StreamEnd {
    let mut batcher = Batcher::new(request.first_batch_size, request.update_items);
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(LineError::Aborted) => return StreamEnd::Aborted,
            Err(e) => return StreamEnd::Failed(e),
        };
        let path = line.trim();
        if path.is_empty() {
            continue;
        }
        let abs_path = resolve_line(&request.root, path);
        match classify(&abs_path, &request.root) {
            Classified::Entry(entry) => {
                if let Some(batch) = batcher.push(entry)
                    && !enqueue(tx, batch, token, tally)
                {
                    return StreamEnd::Aborted;
                }
            }
            Classified::Skip => tally.skipped += 1,
        }
    }
    if let Some(batch) = batcher.finish()
        && !enqueue(tx, batch, token, tally)
    {
        return StreamEnd::Aborted;
    }
    StreamEnd::Exhausted
}

/// Log what the failed command wrote to stderr, one record per line. Runs after the reap,
/// so it is not tied to the request token.
fn log_stderr(program: &str, stderr: LineSource) {
    let mut lines = AbortableLines::new(stderr, CancellationToken::new());
    for line in lines.by_ref() {
        match line {
            Ok(line) => error!("{}: {}", program, line),
            Err(LineError::Aborted) => return,
            Err(e) => {
                error!("{}: reading stderr failed: {}", program, e);
                break;
            }
        }
    }
    let dropped = lines.source().dropped();
    if dropped > 0 {
        warn!("{}: {} more stderr lines were dropped", program, dropped);
    }
}

/// Run one request to completion, sending batches on `tx`.
///
/// Blocks the calling thread. `tx` is consumed and dropped before returning, whichever way
/// the run ends. Fire `token` (or drop the receiver) to cancel.
pub fn run_gather(
    request: &SearchRequest,
    tx: Sender<Batch>,
    token: &CancellationToken,
) -> GatherSummary {
    let mut state = StateTracker::new();
    state.to(EmitterState::Spawning);

    if request.cmd.is_empty() {
        debug!("no command configured; nothing to gather");
        return close(&mut state, tx, GatherSummary::empty(GatherOutcome::NoCommand));
    }
    if token.is_fired() {
        return close(&mut state, tx, GatherSummary::empty(GatherOutcome::Cancelled));
    }

    let mut process = match spawn(&request.cmd, &request.root) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            return close(&mut state, tx, GatherSummary::empty(GatherOutcome::SpawnFailed));
        }
    };
    let Some(stdout) = process.take_stdout() else {
        error!("{}: stdout is not available", process.program());
        drop(process);
        return close(&mut state, tx, GatherSummary::empty(GatherOutcome::SpawnFailed));
    };
    let stderr = process
        .take_stderr()
        .map(|s| spawn_line_reader(s, STDERR_LINE_CAP, Overflow::Drop));
    let program = process.program().to_string();
    let terminator = process.terminator();

    // Held until the process is reaped so cancellation can reach it while we wait.
    let (bridge_done, bridge_rx) = bounded::<()>(0);
    let bridge = spawn_cancel_bridge(token.clone(), terminator.clone(), bridge_rx);

    state.to(EmitterState::Streaming);
    let lines = AbortableLines::new(
        spawn_line_reader(stdout, LINE_CHANNEL_CAP, Overflow::Block),
        token.clone(),
    );
    let mut tally = Tally::default();
    let end = stream_batches(request, lines, &tx, token, &mut tally);

    let mut cancelled = false;
    let mut failed = false;
    match end {
        StreamEnd::Exhausted => state.to(EmitterState::Draining),
        StreamEnd::Aborted => {
            state.to(EmitterState::Cancelling);
            process.terminate();
            cancelled = true;
        }
        StreamEnd::Failed(e) => {
            error!("{}: reading output failed: {}", program, e);
            process.terminate();
            failed = true;
            state.to(EmitterState::Draining);
        }
    }

    let exit = match process.wait() {
        Ok(exit) => Some(exit),
        Err(e) => {
            error!("{}: waiting for exit failed: {}", program, e);
            failed = true;
            None
        }
    };
    drop(bridge_done);
    let _ = bridge.join();
    // Withdrawal while awaiting exit only counts when the signal is what ended the process.
    if !failed
        && token.is_fired()
        && terminator.was_terminated()
        && exit.is_some_and(|e| e.code.is_none())
    {
        cancelled = true;
    }

    if let (Some(ExitOutcome { success: false, .. }), false, false) = (exit, cancelled, failed)
        && let Some(stderr) = stderr
    {
        log_stderr(&program, stderr);
    }

    let outcome = match exit {
        _ if cancelled => GatherOutcome::Cancelled,
        _ if failed => GatherOutcome::Failed,
        Some(ExitOutcome {
            success: false,
            code,
        }) => GatherOutcome::ProcessFailed { code },
        _ => GatherOutcome::Completed,
    };
    let summary = GatherSummary {
        batches: tally.batches,
        entries: tally.entries,
        skipped: tally.skipped,
        outcome,
    };
    close(&mut state, tx, summary)
}

/// Finalizing → Closed: drop the only sender, closing the consumer channel.
fn close(state: &mut StateTracker, tx: Sender<Batch>, summary: GatherSummary) -> GatherSummary {
    state.to(EmitterState::Finalizing);
    drop(tx);
    state.to(EmitterState::Closed);
    debug!(
        "gather closed: {:?}, {} batches, {} entries, {} skipped",
        summary.outcome, summary.batches, summary.entries, summary.skipped
    );
    summary
}
