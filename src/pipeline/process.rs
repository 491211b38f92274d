//! External command lifecycle: spawn with a working directory, hand out the piped streams,
//! terminate on request, and reap exactly once.

use log::debug;
use std::io;
use std::path::Path;
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn `{program}` in {cwd}: {source}")]
    Spawn {
        program: String,
        cwd: String,
        #[source]
        source: io::Error,
    },
}

/// Binary exit result. `code` is `None` when the process was killed by a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

#[derive(Debug)]
struct ProcState {
    terminated: AtomicBool,
    reaped: AtomicBool,
}

/// Clonable handle that can ask the process to stop from any thread.
#[derive(Clone, Debug)]
pub struct Terminator {
    pid: u32,
    program: Arc<str>,
    state: Arc<ProcState>,
}

impl Terminator {
    /// Send a termination request. Only the first call signals, and a reaped process is
    /// never signalled (its pid may already belong to someone else).
    pub fn terminate(&self) -> bool {
        if self.state.reaped.load(Ordering::SeqCst) {
            return false;
        }
        if self.state.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        debug!("terminating {} (pid {})", self.program, self.pid);
        send_terminate(self.pid)
    }

    pub fn was_terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn mark_reaped(&self) {
        self.state.reaped.store(true, Ordering::SeqCst);
    }
}

#[cfg(unix)]
fn send_terminate(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn send_terminate(pid: u32) -> bool {
    Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Owned running process. Dropping it without [`wait`](Self::wait) terminates and reaps it.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Option<Child>,
    terminator: Terminator,
}

/// Launch `cmd[0]` with `cmd[1..]` in `cwd`, stdout and stderr piped, stdin closed.
pub fn spawn(cmd: &[String], cwd: &Path) -> Result<ProcessHandle, SpawnError> {
    let (program, args) = cmd.split_first().ok_or(SpawnError::EmptyCommand)?;
    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SpawnError::Spawn {
            program: program.clone(),
            cwd: cwd.display().to_string(),
            source,
        })?;
    debug!("spawned {} (pid {}) in {}", program, child.id(), cwd.display());
    Ok(ProcessHandle {
        terminator: Terminator {
            pid: child.id(),
            program: Arc::from(program.as_str()),
            state: Arc::new(ProcState {
                terminated: AtomicBool::new(false),
                reaped: AtomicBool::new(false),
            }),
        },
        child: Some(child),
    })
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.terminator.pid
    }

    pub fn program(&self) -> &str {
        self.terminator.program()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.as_mut().and_then(|c| c.stdout.take())
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.as_mut().and_then(|c| c.stderr.take())
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    pub fn terminate(&self) -> bool {
        self.terminator.terminate()
    }

    /// Wait for exit. Consumes the handle, so the outcome is collected exactly once.
    /// Call after stdout has been drained or abandoned.
    pub fn wait(mut self) -> io::Result<ExitOutcome> {
        let Some(mut child) = self.child.take() else {
            return Err(io::Error::other("process already reaped"));
        };
        // Any stream still held here would keep the child blocked on a full pipe.
        drop(child.stdout.take());
        let status = child.wait();
        self.terminator.mark_reaped();
        let outcome = ExitOutcome::from(status?);
        debug!(
            "{} exited (success: {}, code: {:?})",
            self.program(),
            outcome.success,
            outcome.code
        );
        Ok(outcome)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            self.terminator.terminate();
            let _ = child.wait();
            self.terminator.mark_reaped();
        }
    }
}
