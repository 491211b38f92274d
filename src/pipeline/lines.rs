//! Line decoding for piped process output.
//!
//! A reader thread owns the pipe, splits it on `\n` and sends non-empty lines over a
//! channel. [`AbortableLines`] pulls from that channel and gives up as soon as the
//! cancellation token fires, reporting [`LineError::Aborted`] rather than a plain end of
//! stream so callers can tell "we cancelled" from "it finished".

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use std::io::{self, BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use super::cancel::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line stream aborted")]
    Aborted,

    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

/// What the reader does when the channel is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overflow {
    /// Block until the consumer catches up (stdout: backpressure reaches the process).
    Block,
    /// Count and drop the line but keep draining the pipe (stderr).
    Drop,
}

/// Receiving end of a reader thread.
pub struct LineSource {
    rx: Receiver<io::Result<String>>,
    dropped: Arc<AtomicUsize>,
    _reader: JoinHandle<()>,
}

impl LineSource {
    /// Lines discarded because the channel was full (only with [`Overflow::Drop`]).
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn receiver(&self) -> &Receiver<io::Result<String>> {
        &self.rx
    }
}

/// Strip the terminator (`\n`, and a `\r` before it) and decode. Empty lines yield `None`.
pub fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}

/// Start a thread reading `reader` line by line into a channel of `cap` lines.
/// The thread exits at end of stream, on a read error (forwarded once), or when the
/// receiver is dropped.
pub fn spawn_line_reader<R>(reader: R, cap: usize, overflow: Overflow) -> LineSource
where
    R: Read + Send + 'static,
{
    let (tx, rx) = bounded::<io::Result<String>>(cap.max(1));
    let dropped = Arc::new(AtomicUsize::new(0));
    let dropped_w = Arc::clone(&dropped);
    let handle = thread::spawn(move || read_lines(reader, tx, overflow, &dropped_w));
    LineSource {
        rx,
        dropped,
        _reader: handle,
    }
}

fn read_lines<R: Read>(
    reader: R,
    tx: Sender<io::Result<String>>,
    overflow: Overflow,
    dropped: &AtomicUsize,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let Some(line) = decode_line(&buf) else {
                    continue;
                };
                let delivered = match overflow {
                    Overflow::Block => tx.send(Ok(line)).is_ok(),
                    Overflow::Drop => match tx.try_send(Ok(line)) {
                        Ok(()) => true,
                        Err(TrySendError::Full(_)) => {
                            dropped.fetch_add(1, Ordering::Relaxed);
                            true
                        }
                        Err(TrySendError::Disconnected(_)) => false,
                    },
                };
                if !delivered {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// Iterator over a [`LineSource`] that stops promptly when `token` fires.
///
/// Yields `Ok(line)` per line, `Err(LineError::Io)` once on a read failure, and
/// `Err(LineError::Aborted)` once on cancellation; it is fused after any error.
pub struct AbortableLines {
    source: LineSource,
    token: CancellationToken,
    done: bool,
}

impl AbortableLines {
    pub fn new(source: LineSource, token: CancellationToken) -> Self {
        Self {
            source,
            token,
            done: false,
        }
    }

    pub fn source(&self) -> &LineSource {
        &self.source
    }
}

impl Iterator for AbortableLines {
    type Item = Result<String, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.token.is_fired() {
            self.done = true;
            return Some(Err(LineError::Aborted));
        }
        let (item, finished) = select! {
            recv(self.source.rx) -> msg => match msg {
                Ok(Ok(line)) => (Some(Ok(line)), false),
                Ok(Err(e)) => (Some(Err(LineError::Io(e))), true),
                Err(_) => (None, true),
            },
            recv(self.token.signal()) -> _ => (Some(Err(LineError::Aborted)), true),
        };
        self.done = finished;
        item
    }
}

impl FusedIterator for AbortableLines {}
