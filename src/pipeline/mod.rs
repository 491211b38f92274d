//! Pipeline components: process, line decoding, classification, batching, cancellation.

pub mod batcher;
pub mod cancel;
pub mod emitter;
pub mod lines;
pub mod process;
pub mod stat;

pub use batcher::{BatchMode, Batcher};
pub use cancel::{CancellationToken, spawn_cancel_bridge};
pub use emitter::{EmitterState, run_gather};
pub use lines::{
    AbortableLines, LineError, LineSource, Overflow, decode_line, spawn_line_reader,
};
pub use process::{ExitOutcome, ProcessHandle, SpawnError, Terminator, spawn};
pub use stat::{Classified, classify, display_word, entry_kind, mtime_ms};
