//! Public and internal types for the file-external API and pipeline.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::config::{DEFAULT_UPDATE_ITEMS, FIRST_BATCH_SIZE};

/// What a resolved path turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One classified path from the command's output.
///
/// `word` is the display form: relative to the request root, with a trailing `/` for
/// directories. `is_link` is read independently of `kind`, so a link to a directory is
/// `kind: Directory, is_link: true`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub word: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub is_link: bool,
    /// Size in bytes of the link target (or the entry itself).
    pub size: u64,
    /// Modification time in milliseconds since epoch, when the platform reports one.
    pub mtime_ms: Option<i64>,
}

impl ResolvedEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Directories can be expanded by tree-capable consumers.
    pub fn is_tree(&self) -> bool {
        self.is_dir()
    }

    pub fn tree_path(&self) -> &Path {
        &self.path
    }
}

/// A group of entries delivered together, in the order their lines were read.
pub type Batch = Vec<ResolvedEntry>;

/// User-facing parameters for one source: the command and the steady batch size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    /// Command argv; the first element is the executable. Empty means "do nothing".
    pub cmd: Vec<String>,
    /// Batch size after the first batch has been delivered.
    pub update_items: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            update_items: DEFAULT_UPDATE_ITEMS,
        }
    }
}

/// Everything one pipeline run needs. `root` is the command's working directory and the
/// base for resolving relative output lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub root: PathBuf,
    pub cmd: Vec<String>,
    pub first_batch_size: usize,
    pub update_items: usize,
}

impl SearchRequest {
    pub fn new(root: impl Into<PathBuf>, params: SearchParams) -> Self {
        Self {
            root: root.into(),
            cmd: params.cmd,
            first_batch_size: FIRST_BATCH_SIZE,
            update_items: params.update_items,
        }
    }

    /// Override the first batch threshold (normally [`FIRST_BATCH_SIZE`]).
    pub fn with_first_batch_size(mut self, n: usize) -> Self {
        self.first_batch_size = n;
        self
    }
}

/// How a gather ended. Only `SpawnFailed`, `ProcessFailed` and `Failed` are logged as errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatherOutcome {
    /// Command ran to a successful exit and all output was delivered.
    Completed,
    /// The request had an empty command; nothing was run.
    NoCommand,
    /// The command could not be started, or its stdout was unavailable.
    SpawnFailed,
    /// The command exited with failure; batches sent before that remain valid.
    ProcessFailed { code: Option<i32> },
    /// The consumer withdrew (explicit cancel or dropped receiver).
    Cancelled,
    /// Reading the command's output or waiting for it failed unexpectedly.
    Failed,
}

/// Counts returned when a pipeline instance reaches its closed state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatherSummary {
    pub batches: usize,
    pub entries: usize,
    /// Lines whose path could not be classified.
    pub skipped: usize,
    pub outcome: GatherOutcome,
}

impl GatherSummary {
    pub(crate) fn empty(outcome: GatherOutcome) -> Self {
        Self {
            batches: 0,
            entries: 0,
            skipped: 0,
            outcome,
        }
    }
}

/// Full options for the CLI: merged from `.file-external.toml`, the environment and flags.
/// Use [`SearchParams`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Command argv to run in the root.
    pub cmd: Vec<String>,
    /// Steady-state batch size.
    pub update_items: usize,
    /// First batch size.
    pub first_batch: usize,
    /// Print entries as JSON lines instead of display words.
    pub json: bool,
    /// Debug logging and a progress counter on stderr.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            update_items: DEFAULT_UPDATE_ITEMS,
            first_batch: FIRST_BATCH_SIZE,
            json: false,
            verbose: false,
        }
    }
}

impl Opts {
    pub fn to_request(&self, root: PathBuf) -> SearchRequest {
        SearchRequest::new(
            root,
            SearchParams {
                cmd: self.cmd.clone(),
                update_items: self.update_items,
            },
        )
        .with_first_batch_size(self.first_batch)
    }
}
