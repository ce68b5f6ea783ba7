//! Spawns the engine (or a shell) and streams its standard output.

use futures::stream::{self, Stream};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::config::EngineConfig;
use super::error::EngineError;
use super::invocation::Invocation;

/// Diagnostic output is read in chunks of at most this many bytes; longer
/// lines arrive as several diagnostic events.
pub const DIAG_LINE_CHUNK: usize = 512;

/// One step of an engine run as seen by a progress consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A line of the child's standard output, without its line terminator.
    Diagnostic(String),
    /// The output stream closed. Always the last event of a run.
    Done,
}

/// Receives progress events from an engine run.
pub trait ProgressSink: Send {
    fn on_event(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent) + Send,
{
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn on_event(&mut self, event: ProgressEvent) {
        // A dropped receiver just means nobody is watching anymore
        let _ = self.send(event);
    }
}

/// What a completed run reports besides success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Exit code of the child. `None` when no child ran or it was killed by a signal.
    pub exit_code: Option<i32>,
    /// Number of diagnostic events delivered.
    pub diagnostic_lines: usize,
    /// Last diagnostic line received, handy when the engine reports an error.
    pub last_line: Option<String>,
}

impl RunOutcome {
    /// Outcome of a conversion that completed without any child process.
    pub fn without_child() -> Self {
        Self::default()
    }

    /// Whether the child exited with code zero.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A spawned child whose standard output has not been drained yet.
pub struct RunningEngine {
    child: Child,
    stdout: BufReader<ChildStdout>,
    program: String,
}

impl RunningEngine {
    /// Reads the next chunk of diagnostic output. `None` at end of stream.
    pub async fn next_line(&mut self) -> Result<Option<String>, EngineError> {
        let mut buf = Vec::with_capacity(DIAG_LINE_CHUNK);
        let read = (&mut self.stdout)
            .take((DIAG_LINE_CHUNK - 1) as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Lazy sequence of progress events: every diagnostic line, then exactly
    /// one [`ProgressEvent::Done`]. A read error ends the sequence early.
    pub fn events(&mut self) -> impl Stream<Item = Result<ProgressEvent, EngineError>> + '_ {
        stream::unfold(Some(self), |state| async move {
            let engine = state?;
            match engine.next_line().await {
                Ok(Some(line)) => Some((Ok(ProgressEvent::Diagnostic(line)), Some(engine))),
                Ok(None) => Some((Ok(ProgressEvent::Done), None)),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Reaps the child once its output is drained.
    pub async fn wait(mut self) -> Result<ExitStatus, EngineError> {
        Ok(self.child.wait().await?)
    }

    /// Kills the child and reaps it.
    pub async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("Failed to kill {}: {}", self.program, e);
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Runs invocations as child processes and streams their output.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    strict_exit_status: bool,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>, strict_exit_status: bool) -> Self {
        Self {
            timeout,
            strict_exit_status,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.timeout_secs.map(Duration::from_secs),
            config.strict_exit_status,
        )
    }

    /// Spawns the child with its standard output connected to a pipe.
    pub fn spawn(&self, invocation: &Invocation) -> Result<RunningEngine, EngineError> {
        let program = invocation.program().display().to_string();
        debug!("Running: {}", invocation);

        let mut child = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("Async command failed: {}: {}", program, e);
                EngineError::spawn(program.clone(), e)
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            EngineError::Io(std::io::Error::other("child stdout was not captured"))
        })?;

        Ok(RunningEngine {
            child,
            stdout: BufReader::new(stdout),
            program,
        })
    }

    fn timed_out(&self) -> EngineError {
        EngineError::TimedOut {
            timeout_secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }
    }

    /// Runs `invocation` to completion, forwarding every output line to
    /// `progress` and finishing with a single [`ProgressEvent::Done`].
    ///
    /// Succeeds once the child was spawned and its output drained. The exit
    /// code is only reported in the outcome unless strict exit checking is
    /// enabled. Cancelling `cancel` or hitting the timeout kills the child.
    pub async fn run(
        &self,
        invocation: &Invocation,
        mut progress: Option<&mut dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, EngineError> {
        let mut running = self.spawn(invocation)?;
        let mut emit = |event: ProgressEvent| {
            if let Some(sink) = progress.as_deref_mut() {
                sink.on_event(event);
            }
        };

        let deadline = async {
            match self.timeout {
                Some(timeout) => sleep_until(Instant::now() + timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut outcome = RunOutcome::default();
        let interrupted = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(EngineError::Cancelled),
                _ = &mut deadline => break Some(self.timed_out()),
                line = running.next_line() => match line {
                    Ok(Some(line)) => {
                        outcome.diagnostic_lines += 1;
                        outcome.last_line = Some(line.clone());
                        emit(ProgressEvent::Diagnostic(line));
                    }
                    Ok(None) => break None,
                    Err(e) => break Some(e),
                },
            }
        };
        emit(ProgressEvent::Done);

        // Errors don't always show up on the last line, but it is usually the useful one
        debug!("Last received line is={:?}", outcome.last_line);

        // A child may close stdout and keep running, so reaping still honors
        // the token and the deadline
        let waited = match interrupted {
            Some(err) => Err(err),
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(EngineError::Cancelled),
                _ = &mut deadline => Err(self.timed_out()),
                status = running.child.wait() => status.map_err(EngineError::from),
            },
        };
        let status = match waited {
            Ok(status) => status,
            Err(err) => {
                debug!("Stopping {}: {}", running.program, err);
                running.kill().await;
                return Err(err);
            }
        };

        outcome.exit_code = status.code();
        if !status.success() {
            debug!("Engine exited with {:?}", status);
            if self.strict_exit_status {
                return Err(EngineError::ExitStatus {
                    code: outcome.exit_code,
                });
            }
        }

        Ok(outcome)
    }
}
