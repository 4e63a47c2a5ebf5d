use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, warn};

use aegis_config::{CANCEL_GRACE_MS, RUNNER_POLL_INTERVAL_MS};

pub type LineCallback = Box<dyn Fn(String) + Send + 'static>;
pub type ExitCallback = Box<dyn FnOnce(i32) + Send + 'static>;

/// Where a launched process reports back. Called from runner threads.
pub struct ProcessCallbacks {
    pub on_stdout: LineCallback,
    pub on_stderr: LineCallback,
    pub on_exit: ExitCallback,
}

impl ProcessCallbacks {
    /// Callbacks that discard everything.
    pub fn silent() -> Self {
        Self {
            on_stdout: Box::new(|_| {}),
            on_stderr: Box::new(|_| {}),
            on_exit: Box::new(|_| {}),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("A task is already running")]
    Busy,
    #[error("No command to run")]
    EmptyCommand,
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to start runner thread: {0}")]
    Thread(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerErrorKind {
    Busy,
    Launch,
}

impl RunnerError {
    pub fn kind(&self) -> RunnerErrorKind {
        match self {
            RunnerError::Busy => RunnerErrorKind::Busy,
            _ => RunnerErrorKind::Launch,
        }
    }
}

struct ActiveProcess {
    cancel: Arc<AtomicBool>,
    pid: u32,
}

/// Runs one external process at a time.
///
/// Share it behind an `Arc`; it is the only owner of the busy state. Each
/// process is started as the root of its own process tree, so cancelling
/// also stops whatever a wrapper script launched.
pub struct ProcessRunner {
    active: Arc<Mutex<Option<ActiveProcess>>>,
    cancel_grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::with_cancel_grace(Duration::from_millis(CANCEL_GRACE_MS))
    }
}

fn lock(active: &Mutex<Option<ActiveProcess>>) -> MutexGuard<'_, Option<ActiveProcess>> {
    active.lock().unwrap_or_else(|e| e.into_inner())
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `grace` is how long a cancelled tree may take to exit before it is
    /// killed outright.
    pub fn with_cancel_grace(grace: Duration) -> Self {
        Self {
            active: Arc::default(),
            cancel_grace: grace,
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Launch `argv[0]` with the remaining arguments.
    ///
    /// Returns once the process is spawned. `on_exit` fires exactly once, after
    /// both output pumps have drained.
    pub fn start(&self, argv: &[String], callbacks: ProcessCallbacks) -> Result<(), RunnerError> {
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;

        // Held until the watcher is registered so a fast exit cannot clear
        // the slot before it is filled.
        let mut slot = lock(&self.active);
        if slot.is_some() {
            return Err(RunnerError::Busy);
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: program.clone(),
                source,
            })?;
        let pid = child.id();
        debug!("Spawned {program} (pid {pid})");

        let ProcessCallbacks {
            on_stdout,
            on_stderr,
            on_exit,
        } = callbacks;

        let pumps = match spawn_pumps(&mut child, on_stdout, on_stderr) {
            Ok(pumps) => pumps,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunnerError::Thread(e));
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let watcher_cancel = cancel.clone();
        let active = self.active.clone();
        let grace = self.cancel_grace;
        let spawned = thread::Builder::new()
            .name("aegis-process-watch".into())
            .spawn(move || {
                let code = watch(child, &watcher_cancel, grace);
                for pump in pumps {
                    if pump.join().is_err() {
                        warn!("Output pump panicked");
                    }
                }
                lock(&active).take();
                debug!("Process {pid} finished with {code}");
                on_exit(code);
            });

        if let Err(e) = spawned {
            // The child moved into the closure and was dropped with it; its
            // pumps end when the pipes close.
            error!("Failed to start watcher for pid {pid}: {e}");
            return Err(RunnerError::Thread(e));
        }

        *slot = Some(ActiveProcess { cancel, pid });
        Ok(())
    }

    /// Ask the running process to stop. No-op when idle.
    pub fn cancel(&self) {
        if let Some(active) = lock(&self.active).as_ref() {
            if !active.cancel.swap(true, Ordering::SeqCst) {
                debug!("Cancelling pid {}", active.pid);
            }
        }
    }
}

fn spawn_pumps(
    child: &mut Child,
    on_stdout: LineCallback,
    on_stderr: LineCallback,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_pump("aegis-stdout", stdout, on_stdout)?);
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_pump("aegis-stderr", stderr, on_stderr)?);
    }
    Ok(pumps)
}

fn spawn_pump<R: Read + Send + 'static>(
    name: &str,
    stream: R,
    on_line: LineCallback,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name.into())
        .spawn(move || pump_lines(stream, on_line))
}

fn pump_lines<R: Read>(stream: R, on_line: LineCallback) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                warn!("Stopped reading process output: {e}");
                break;
            }
        }
    }
}

fn watch(mut child: Child, cancel: &AtomicBool, grace: Duration) -> i32 {
    let pid = child.id();
    let mut terminated_at: Option<Instant> = None;
    let mut forced = false;
    let code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code().unwrap_or(-1),
            Ok(None) => {}
            Err(e) => {
                error!("Failed to poll process: {e}");
                break child
                    .wait()
                    .ok()
                    .and_then(|s| s.code())
                    .unwrap_or(-1);
            }
        }
        if cancel.load(Ordering::SeqCst) {
            match terminated_at {
                None => {
                    debug!("Terminating process tree {pid}");
                    terminate_tree(pid);
                    terminated_at = Some(Instant::now());
                }
                Some(at) if !forced && at.elapsed() >= grace => {
                    warn!("Process {pid} ignored termination, killing it");
                    forced = true;
                    kill_tree(pid);
                    if let Err(e) = child.kill() {
                        debug!("Kill after grace period failed: {e}");
                    }
                }
                _ => {}
            }
        }
        thread::sleep(Duration::from_millis(RUNNER_POLL_INTERVAL_MS));
    };

    // Leftovers in the group would hold the output pipes open.
    #[cfg(unix)]
    if terminated_at.is_some() {
        kill_tree(pid);
    }
    code
}

#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // A negative pid addresses the whole process group.
    if unsafe { libc::kill(-pgid, signal) } != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("Failed to signal process group {pgid}: {err}");
        }
    }
}

#[cfg(unix)]
fn terminate_tree(pid: u32) {
    signal_group(pid, libc::SIGTERM);
}

#[cfg(unix)]
fn kill_tree(pid: u32) {
    signal_group(pid, libc::SIGKILL);
}

/// Console tools ignore polite close requests, so both steps end the tree.
#[cfg(windows)]
fn terminate_tree(pid: u32) {
    let pid = pid.to_string();
    let status = Command::new("taskkill")
        .args(["/PID", pid.as_str(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if !status.success() => debug!("taskkill for {pid} exited with {status}"),
        Ok(_) => {}
        Err(e) => warn!("Failed to run taskkill for {pid}: {e}"),
    }
}

#[cfg(windows)]
fn kill_tree(pid: u32) {
    terminate_tree(pid);
}

#[cfg(not(any(unix, windows)))]
fn terminate_tree(_pid: u32) {}

#[cfg(not(any(unix, windows)))]
fn kill_tree(_pid: u32) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    struct Captured {
        stdout: mpsc::Receiver<String>,
        stderr: mpsc::Receiver<String>,
        exit: mpsc::Receiver<i32>,
    }

    fn capture() -> (ProcessCallbacks, Captured) {
        let (out_tx, stdout) = mpsc::channel();
        let (err_tx, stderr) = mpsc::channel();
        let (exit_tx, exit) = mpsc::channel();
        let out_tx = Mutex::new(out_tx);
        let err_tx = Mutex::new(err_tx);
        let callbacks = ProcessCallbacks {
            on_stdout: Box::new(move |l| {
                let _ = out_tx.lock().unwrap().send(l);
            }),
            on_stderr: Box::new(move |l| {
                let _ = err_tx.lock().unwrap().send(l);
            }),
            on_exit: Box::new(move |c| {
                let _ = exit_tx.send(c);
            }),
        };
        (callbacks, Captured { stdout, stderr, exit })
    }

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn streams_lines_and_reports_exit_code() {
        let runner = ProcessRunner::new();
        let (cb, cap) = capture();
        runner
            .start(&sh("printf 'a\\r\\nb\\n'; echo oops >&2; exit 3"), cb)
            .expect("start");

        assert_eq!(cap.exit.recv_timeout(WAIT).unwrap(), 3);
        let out: Vec<String> = cap.stdout.try_iter().collect();
        let err: Vec<String> = cap.stderr.try_iter().collect();
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(err, vec!["oops"]);
        assert!(!runner.is_busy());
    }

    #[test]
    fn second_start_while_busy_is_rejected() {
        let runner = ProcessRunner::new();
        let (cb, cap) = capture();
        runner.start(&sh("sleep 0.3"), cb).expect("start");
        assert!(runner.is_busy());

        let err = runner
            .start(&sh("true"), ProcessCallbacks::silent())
            .unwrap_err();
        assert!(matches!(err, RunnerError::Busy));
        assert_eq!(err.kind(), RunnerErrorKind::Busy);

        assert_eq!(cap.exit.recv_timeout(WAIT).unwrap(), 0);
        assert!(!runner.is_busy());
    }

    #[test]
    fn cancel_stops_processes_started_by_a_wrapper() {
        let runner = ProcessRunner::new();
        let (cb, cap) = capture();
        runner
            .start(&sh("echo ready; sleep 30; echo finished"), cb)
            .expect("start");
        assert_eq!(cap.stdout.recv_timeout(WAIT).unwrap(), "ready");

        let cancelled = Instant::now();
        runner.cancel();
        runner.cancel();

        let code = cap.exit.recv_timeout(WAIT).expect("exit after cancel");
        assert_eq!(code, -1);
        assert!(cancelled.elapsed() < Duration::from_secs(2));
        assert_eq!(cap.stdout.try_iter().count(), 0);
        assert!(!runner.is_busy());
    }

    #[test]
    fn cancel_kills_a_tree_that_ignores_termination() {
        let runner = ProcessRunner::with_cancel_grace(Duration::from_millis(300));
        let (cb, cap) = capture();
        runner
            .start(&sh("trap '' TERM; echo ready; sleep 30; echo finished"), cb)
            .expect("start");
        assert_eq!(cap.stdout.recv_timeout(WAIT).unwrap(), "ready");

        let cancelled = Instant::now();
        runner.cancel();

        let code = cap.exit.recv_timeout(WAIT).expect("exit after kill");
        assert_eq!(code, -1);
        assert!(cancelled.elapsed() >= Duration::from_millis(300));
        assert!(cancelled.elapsed() < Duration::from_secs(5));
        assert!(!runner.is_busy());
    }

    #[test]
    fn cancel_when_idle_is_a_no_op() {
        let runner = ProcessRunner::new();
        runner.cancel();
        assert!(!runner.is_busy());
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let runner = ProcessRunner::new();
        let err = runner
            .start(
                &["/definitely/not/a/program".to_string()],
                ProcessCallbacks::silent(),
            )
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
        assert!(!runner.is_busy());
    }

    #[test]
    fn empty_argv_is_rejected() {
        let runner = ProcessRunner::new();
        assert!(matches!(
            runner.start(&[], ProcessCallbacks::silent()),
            Err(RunnerError::EmptyCommand)
        ));
    }
}
