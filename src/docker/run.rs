use std::io::BufRead;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::{DockerError, Result};
use super::types::{CancelToken, OutputLine, StreamCommand, StreamResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Spawn a docker command and return a channel that streams its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`Stderr`] as they arrive,
/// followed by exactly one [`OutputLine::Done`] carrying the final result.
pub fn spawn(cmd: StreamCommand, cancel: CancelToken) -> Result<Receiver<OutputLine>> {
    debug!(program = %cmd.program, args = ?cmd.args, "spawning streamed docker command");

    let mut child = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| DockerError::NotInstalled {
            program: cmd.program.clone(),
            source,
        })?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        orchestrate(child, stdout, stderr, tx, cancel, cmd.timeout);
    });

    Ok(rx)
}

/// Drain a streamed command, handing each output line to `on_line`.
///
/// Returns the accumulated log on success; a non-zero exit, cancellation, or
/// timeout becomes the matching [`DockerError`].
pub fn run_to_completion(
    cmd: StreamCommand,
    cancel: &CancelToken,
    on_line: &mut dyn FnMut(&str),
) -> Result<String> {
    let command = cmd.args.join(" ");
    let timeout = cmd.timeout;
    let rx = spawn(cmd, cancel.clone())?;

    let mut stderr_tail = String::new();
    for line in rx {
        match line {
            OutputLine::Stdout(l) => on_line(&l),
            OutputLine::Stderr(l) => {
                on_line(&l);
                stderr_tail.push_str(&l);
                stderr_tail.push('\n');
            }
            OutputLine::Done(result) => {
                if result.cancelled {
                    return Err(DockerError::Cancelled);
                }
                if result.timed_out {
                    warn!(%command, "streamed docker command timed out");
                    return Err(DockerError::TimedOut(timeout.as_secs()));
                }
                if !result.success {
                    return Err(DockerError::CommandFailed {
                        command,
                        code: result.exit_code,
                        stderr: stderr_tail,
                    });
                }
                return Ok(result.log);
            }
        }
    }

    // The orchestrator always sends `Done`; a closed channel means it panicked.
    Err(DockerError::CommandFailed {
        command,
        code: None,
        stderr: "output stream closed unexpectedly".into(),
    })
}

/// Output of a short docker command that ran to exit.
#[derive(Debug, Default)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run a command under its deadline and keep the two streams apart.
///
/// A non-zero exit is not an error here; the caller decides what partial
/// output is worth. Cancellation and timeout are.
pub fn capture(cmd: StreamCommand, cancel: &CancelToken) -> Result<Captured> {
    let command = cmd.args.join(" ");
    let timeout = cmd.timeout;
    let rx = spawn(cmd, cancel.clone())?;

    let mut captured = Captured::default();
    for line in rx {
        match line {
            OutputLine::Stdout(l) => {
                captured.stdout.push_str(&l);
                captured.stdout.push('\n');
            }
            OutputLine::Stderr(l) => {
                captured.stderr.push_str(&l);
                captured.stderr.push('\n');
            }
            OutputLine::Done(result) => {
                if result.cancelled {
                    return Err(DockerError::Cancelled);
                }
                if result.timed_out {
                    warn!(%command, "docker command timed out");
                    return Err(DockerError::TimedOut(timeout.as_secs()));
                }
                captured.exit_code = result.exit_code;
                return Ok(captured);
            }
        }
    }

    Err(DockerError::CommandFailed {
        command,
        code: None,
        stderr: "output stream closed unexpectedly".into(),
    })
}

fn orchestrate(
    mut child: std::process::Child,
    stdout: std::process::ChildStdout,
    stderr: std::process::ChildStderr,
    tx: Sender<OutputLine>,
    cancel: CancelToken,
    timeout: Duration,
) {
    // Accumulates all output for the final log.
    let log_buf = std::sync::Arc::new(std::sync::Mutex::new(String::new()));

    // --- reader threads ---------------------------------------------------
    let stdout_handle = spawn_reader(stdout, tx.clone(), log_buf.clone(), OutputLine::Stdout);
    let stderr_handle = spawn_reader(stderr, tx.clone(), log_buf.clone(), OutputLine::Stderr);

    // --- poll loop ---------------------------------------------------------
    let start = Instant::now();
    let mut cancelled = false;
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }

        if cancel.is_cancelled() {
            cancelled = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    // --- finalize ----------------------------------------------------------
    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let exit_code = exit_status.and_then(|s| s.code());
    let success = exit_code == Some(0);
    let log = log_buf.lock().map(|b| b.clone()).unwrap_or_default();

    let _ = tx.send(OutputLine::Done(StreamResult {
        success,
        exit_code,
        log,
        cancelled,
        timed_out,
    }));
}

fn spawn_reader<R: std::io::Read + Send + 'static>(
    pipe: R,
    tx: Sender<OutputLine>,
    buf: std::sync::Arc<std::sync::Mutex<String>>,
    wrap: fn(String) -> OutputLine,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = std::io::BufReader::new(pipe);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&raw);
                    let l = text.trim_end_matches(['\n', '\r']).to_string();
                    if let Ok(mut buf) = buf.lock() {
                        buf.push_str(&l);
                        buf.push('\n');
                    }
                    // Receiver may be dropped; ignore send errors.
                    let _ = tx.send(wrap(l));
                }
            }
        }
    })
}
