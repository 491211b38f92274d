//! Threaded front end: run one request in the background and hand the consumer a stream.

use anyhow::Result;
use crossbeam_channel::{Receiver, bounded};
use std::thread::{self, JoinHandle};

use crate::pipeline::{CancellationToken, run_gather};
use crate::utils::config::BATCH_CHANNEL_CAP;
use crate::{Batch, GatherSummary, SearchRequest};

/// Consumer side of a running gather.
///
/// Batches arrive in command output order; the channel closes when the run is over.
/// Dropping the stream before that cancels the run.
pub struct GatherStream {
    batches: Receiver<Batch>,
    token: CancellationToken,
    worker: Option<JoinHandle<GatherSummary>>,
}

/// Start `request` on its own thread. Requests share nothing, so a restarted search is
/// just another call (cancel or drop the previous stream).
pub fn gather(request: SearchRequest) -> GatherStream {
    let (tx, rx) = bounded::<Batch>(BATCH_CHANNEL_CAP);
    let token = CancellationToken::new();
    let token_w = token.clone();
    let worker = thread::spawn(move || run_gather(&request, tx, &token_w));
    GatherStream {
        batches: rx,
        token,
        worker: Some(worker),
    }
}

impl GatherStream {
    pub fn receiver(&self) -> &Receiver<Batch> {
        &self.batches
    }

    /// Next batch, or `None` once the run has closed the channel.
    pub fn recv(&self) -> Option<Batch> {
        self.batches.recv().ok()
    }

    /// Blocking iterator over batches until the channel closes.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Batch> {
        self.batches.iter()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Withdraw interest: stops the run and terminates the command. Idempotent.
    pub fn cancel(&self) -> bool {
        self.token.fire()
    }

    /// Wait for the run to close. Batches not yet received are discarded.
    pub fn join(mut self) -> Result<GatherSummary> {
        for _ in self.batches.iter() {}
        let worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow::anyhow!("gather already joined"))?;
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("gather thread panicked"))
    }

    /// Receive every batch, then join.
    pub fn collect(self) -> Result<(Vec<Batch>, GatherSummary)> {
        let batches: Vec<Batch> = self.batches.iter().collect();
        let summary = self.join()?;
        Ok((batches, summary))
    }
}

impl Drop for GatherStream {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.token.fire();
        }
    }
}
