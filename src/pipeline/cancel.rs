//! One-shot cancellation shared by the line decoder, the batch enqueue and the process.
//!
//! The token is a flag plus a channel whose only sender is dropped when the token fires.
//! A disconnected channel is always ready, so any `select!` that includes
//! [`CancellationToken::signal`] wakes up immediately once the token is fired, no matter
//! which blocking point the pipeline is currently parked on.

use crossbeam_channel::{Receiver, Sender, bounded, select};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::process::Terminator;

#[derive(Debug)]
struct TokenState {
    fired: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

/// Clonable one-shot token: armed until [`fire`](Self::fire) is called once.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (trigger, signal) = bounded::<()>(0);
        Self {
            state: Arc::new(TokenState {
                fired: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fire the token. Returns `true` only for the call that actually fired it.
    pub fn fire(&self) -> bool {
        if self.state.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        let trigger = self
            .state
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(trigger);
        true
    }

    pub fn is_fired(&self) -> bool {
        self.state.fired.load(Ordering::SeqCst)
    }

    /// Channel that becomes ready (disconnected) when the token fires. Nothing is ever sent.
    pub fn signal(&self) -> &Receiver<()> {
        &self.state.signal
    }

    /// Block until the token fires.
    pub fn wait(&self) {
        let _ = self.state.signal.recv();
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminates the process when `token` fires, until `done` disconnects.
///
/// The emitter keeps the matching sender alive for as long as the process may still be
/// running (including while it blocks in `wait`), then drops it to let the watcher exit.
pub fn spawn_cancel_bridge(
    token: CancellationToken,
    terminator: Terminator,
    done: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        select! {
            recv(token.signal()) -> _ => {
                debug!("cancellation fired, terminating {}", terminator.program());
                terminator.terminate();
            }
            recv(done) -> _ => {}
        }
    })
}
