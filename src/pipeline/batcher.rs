//! Adaptive batch accumulation: a small first batch for fast feedback, then large ones.

use std::mem;

use crate::{Batch, ResolvedEntry};

/// Which threshold is in force. Moves from `First` to `Steady` exactly once, on the first flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchMode {
    First,
    Steady,
}

/// Collects entries and hands back a full batch whenever the current threshold is reached.
#[derive(Debug)]
pub struct Batcher {
    mode: BatchMode,
    first_size: usize,
    steady_size: usize,
    items: Batch,
    flushed: usize,
}

impl Batcher {
    /// Thresholds below 1 are treated as 1.
    pub fn new(first_size: usize, steady_size: usize) -> Self {
        Self {
            mode: BatchMode::First,
            first_size: first_size.max(1),
            steady_size: steady_size.max(1),
            items: Vec::new(),
            flushed: 0,
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn threshold(&self) -> usize {
        match self.mode {
            BatchMode::First => self.first_size,
            BatchMode::Steady => self.steady_size,
        }
    }

    /// Entries waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.items.len()
    }

    /// Batches handed out so far.
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    /// Add one entry; returns the batch when this entry filled it.
    pub fn push(&mut self, entry: ResolvedEntry) -> Option<Batch> {
        self.items.push(entry);
        (self.items.len() >= self.threshold()).then(|| self.take())
    }

    /// Hand out whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<Batch> {
        (!self.items.is_empty()).then(|| self.take())
    }

    fn take(&mut self) -> Batch {
        self.flushed += 1;
        self.mode = BatchMode::Steady;
        mem::take(&mut self.items)
    }
}
