use std::sync::Arc;

use aegis_core::{ManualOverrideSet, Profile, QueuedTask, TaskId, TaskQueue, TaskSpec, TaskTag};
use aegis_infra::{join_command, split_command, ProcessCallbacks, RunnerErrorKind};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::{self, ArgvMode, CommandError};
use crate::events::{BatchEvent, BatchRunId, BatchSummary, LogLevel, LogLine};
use crate::ports::{CommandEditPrompt, ProcessPort};

/// Exit code recorded for a task that never launched.
pub const LAUNCH_FAILED: i32 = -1;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("{config} cannot target {platform}")]
    PlatformNotAllowed { config: String, platform: String },
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("A batch is already running")]
    AlreadyRunning,
    #[error("The queue is empty")]
    EmptyQueue,
    #[error("Batch start cancelled while editing commands")]
    Declined,
    #[error("Cannot build the command for {0}")]
    CommandUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Sent from runner threads to the control thread.
#[derive(Debug)]
enum RunnerSignal {
    Output {
        run_id: BatchRunId,
        task_id: TaskId,
        stream: Stream,
        line: String,
    },
    Exited {
        run_id: BatchRunId,
        task_id: TaskId,
        code: i32,
    },
}

impl RunnerSignal {
    fn route(&self) -> (BatchRunId, TaskId) {
        match self {
            RunnerSignal::Output {
                run_id, task_id, ..
            }
            | RunnerSignal::Exited {
                run_id, task_id, ..
            } => (*run_id, *task_id),
        }
    }
}

/// Runs the queue one task at a time through a [`ProcessPort`].
///
/// All queue state lives on the thread that owns the controller. Runner
/// threads only post signals, which [`tick`](Self::tick) or
/// [`run_until_idle`](Self::run_until_idle) apply.
pub struct BatchController<R> {
    queue: TaskQueue,
    profile: Option<Profile>,
    overrides: ManualOverrideSet,
    runner: Arc<R>,

    run_id: Option<BatchRunId>,
    cancel_requested: bool,
    summary: BatchSummary,

    events: mpsc::UnboundedSender<BatchEvent>,
    signal_tx: mpsc::UnboundedSender<RunnerSignal>,
    signal_rx: mpsc::UnboundedReceiver<RunnerSignal>,
}

impl<R: ProcessPort> BatchController<R> {
    pub fn new(runner: Arc<R>) -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let controller = Self {
            queue: TaskQueue::new(),
            profile: None,
            overrides: ManualOverrideSet::new(),
            runner,
            run_id: None,
            cancel_requested: false,
            summary: BatchSummary::default(),
            events,
            signal_tx,
            signal_rx,
        };
        (controller, events_rx)
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn overrides(&self) -> &ManualOverrideSet {
        &self.overrides
    }

    pub fn is_running(&self) -> bool {
        self.run_id.is_some()
    }

    pub fn set_profile(&mut self, profile: Option<Profile>) {
        self.profile = profile;
        self.refresh_previews();
    }

    pub fn set_overrides(&mut self, overrides: ManualOverrideSet) {
        self.overrides = overrides;
        self.refresh_previews();
    }

    fn emit(&self, ev: BatchEvent) {
        let _ = self.events.send(ev);
    }

    fn log(&self, message: impl Into<String>, level: LogLevel) {
        self.emit(BatchEvent::Log(LogLine::new(message, level)));
    }

    fn render(&self, task: &QueuedTask) -> Result<String, CommandError> {
        commands::preview_command(self.profile.as_ref(), &task.spec, &self.overrides)
    }

    fn refresh_previews(&mut self) {
        let previews = self.queue.all_command_previews(|t| self.render(t));
        for (row, preview) in previews.into_iter().enumerate() {
            self.queue.set_preview(row, preview);
        }
        self.emit(BatchEvent::TasksChanged);
    }

    // Queue editing

    /// Append a task after validating it and rendering its preview.
    ///
    /// Allowed while a batch runs; the new task joins the current run.
    pub fn queue_task(
        &mut self,
        tag: TaskTag,
        config: &str,
        platform: &str,
        clean: bool,
    ) -> Result<TaskId, QueueError> {
        let config = config.trim();
        let platform = platform.trim();
        let checked = if config.is_empty() {
            Err(QueueError::MissingField("config"))
        } else if platform.is_empty() {
            Err(QueueError::MissingField("platform"))
        } else if !aegis_config::is_platform_allowed(config, platform) {
            Err(QueueError::PlatformNotAllowed {
                config: config.to_string(),
                platform: platform.to_string(),
            })
        } else {
            Ok(())
        };

        let spec = TaskSpec::new(tag, config, platform).with_clean(clean);
        let preview = checked.and_then(|()| {
            commands::preview_command(self.profile.as_ref(), &spec, &self.overrides)
                .map_err(QueueError::from)
        });
        let preview = match preview {
            Ok(preview) => preview,
            Err(e) => {
                warn!("Rejected task {}: {e}", spec.label());
                self.log(format!("[queue] {e}"), LogLevel::Error);
                return Err(e);
            }
        };

        let id = self.queue.push(spec, preview);
        debug!("Queued task {id}");
        self.emit(BatchEvent::TasksChanged);
        Ok(id)
    }

    pub fn move_task(&mut self, row: usize, delta: isize) -> bool {
        let moved = self.queue.move_task(row, delta);
        if moved {
            self.emit(BatchEvent::TasksChanged);
        }
        moved
    }

    pub fn remove_task(&mut self, row: usize) -> bool {
        let removed = self.queue.remove(row).is_some();
        if removed {
            self.emit(BatchEvent::TasksChanged);
        }
        removed
    }

    /// Set the raw command for `row`; blank or `None` reverts to the
    /// generated command.
    pub fn set_command_override(&mut self, row: usize, cmd: Option<&str>) -> bool {
        if !self.queue.set_command_override(row, cmd) {
            return false;
        }
        if self.queue.get(row).is_some_and(|t| t.command_override.is_none()) {
            let preview = self.queue.command_preview(row, |t| self.render(t));
            self.queue.set_preview(row, preview);
        }
        self.emit(BatchEvent::TasksChanged);
        true
    }

    pub fn set_edit_requested(&mut self, row: usize, requested: bool) -> bool {
        let changed = self.queue.set_edit_requested(row, requested);
        if changed {
            self.emit(BatchEvent::TasksChanged);
        }
        changed
    }

    pub fn request_edit_all(&mut self) -> usize {
        let changed = self.queue.request_edit_all();
        if changed > 0 {
            self.emit(BatchEvent::TasksChanged);
        }
        changed
    }

    pub fn task_is_editable(&self, row: usize) -> bool {
        self.queue.task_is_editable(row)
    }

    /// Override when set, otherwise the live preview. Empty on failure.
    pub fn command_preview(&self, row: usize) -> String {
        self.queue.command_preview(row, |t| self.render(t))
    }

    pub fn all_command_previews(&self) -> Vec<String> {
        self.queue.all_command_previews(|t| self.render(t))
    }

    // Execution

    /// Confirm edited commands, then launch the first task.
    ///
    /// Returns the number of tasks in the run.
    pub fn start_batch(&mut self, prompt: &mut dyn CommandEditPrompt) -> Result<usize, StartError> {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        if self.queue.is_empty() {
            return Err(StartError::EmptyQueue);
        }

        for row in self.queue.rows_pending_edit() {
            let Some(task) = self.queue.get(row) else {
                continue;
            };
            let current = match &task.command_override {
                Some(cmd) => cmd.clone(),
                None => match self.render(task) {
                    Ok(preview) => preview,
                    Err(e) => {
                        warn!("Cannot edit {}: {e}", task.label());
                        self.log(format!("[{}] {e}", task.tag()), LogLevel::Error);
                        return Err(StartError::CommandUnavailable(task.label()));
                    }
                },
            };
            let Some(edited) = prompt.edit(task, &current) else {
                info!("Batch start declined while editing {}", task.label());
                self.log("[batch] Start cancelled", LogLevel::Warning);
                self.emit(BatchEvent::TasksChanged);
                return Err(StartError::Declined);
            };
            self.set_command_override(row, Some(&edited));
        }
        self.queue.clear_edit_requests();
        self.queue.reset_states();

        let total = self.queue.len();
        let run_id = uuid::Uuid::new_v4();
        self.run_id = Some(run_id);
        self.cancel_requested = false;
        self.summary = BatchSummary {
            total,
            ..Default::default()
        };
        info!("Starting batch {run_id} with {total} task(s)");
        self.emit(BatchEvent::Started { total });
        self.emit(BatchEvent::TasksChanged);

        self.launch_from(0);
        Ok(total)
    }

    /// Stop after the running task exits. Returns `false` when idle.
    pub fn cancel_batch(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        if !self.cancel_requested {
            self.cancel_requested = true;
            info!("Cancelling batch");
            self.log("[batch] Cancelling...", LogLevel::Warning);
        }
        self.runner.cancel();
        true
    }

    /// Apply every pending runner signal. Returns how many were handled.
    pub fn tick(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signal_rx.try_recv() {
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    /// Drive the current batch to completion, cancelling when `cancel` fires.
    pub async fn run_until_idle(&mut self, cancel: &CancellationToken) {
        let mut cancel_forwarded = false;
        while self.is_running() {
            tokio::select! {
                _ = cancel.cancelled(), if !cancel_forwarded => {
                    cancel_forwarded = true;
                    self.cancel_batch();
                }
                signal = self.signal_rx.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => break,
                },
            }
        }
    }

    fn handle_signal(&mut self, signal: RunnerSignal) {
        let (run_id, task_id) = signal.route();
        if self.run_id != Some(run_id) {
            debug!("Dropping signal from stale run {run_id}");
            return;
        }
        let Some(row) = self.queue.current_index() else {
            return;
        };
        let Some(task) = self.queue.get(row) else {
            return;
        };
        if task.id != task_id {
            debug!("Dropping signal for {task_id}, current task is {}", task.id);
            return;
        }
        let tag = task.tag();

        match signal {
            RunnerSignal::Output { stream, line, .. } => {
                let level = match stream {
                    Stream::Stdout => LogLevel::Info,
                    Stream::Stderr => LogLevel::Error,
                };
                self.log(format!("[{tag}] {line}"), level);
            }
            RunnerSignal::Exited { code, .. } => {
                if self.complete(row, code) {
                    self.launch_from(row + 1);
                }
            }
        }
    }

    /// Launch tasks from `row` on until one is running or the batch ends.
    fn launch_from(&mut self, mut row: usize) {
        loop {
            if row >= self.queue.len() {
                self.finish();
                return;
            }
            self.queue.set_current_index(Some(row));
            self.queue.mark_running(row);
            self.emit(BatchEvent::TasksChanged);

            if self.launch(row) {
                return;
            }
            if !self.complete(row, LAUNCH_FAILED) {
                return;
            }
            row += 1;
        }
    }

    /// Start the process for `row`. `false` when it could not be launched.
    fn launch(&self, row: usize) -> bool {
        let Some(run_id) = self.run_id else {
            return false;
        };
        let Some(task) = self.queue.get(row) else {
            return false;
        };
        let tag = task.tag();
        let task_id = task.id;

        let resolved = match &task.command_override {
            Some(cmd) => split_command(cmd)
                .map(|argv| (argv, cmd.clone()))
                .map_err(|e| e.to_string()),
            None => commands::build_argv(
                self.profile.as_ref(),
                &task.spec,
                &self.overrides,
                ArgvMode::Execute,
            )
            .map(|argv| {
                let line = join_command(&argv);
                (argv, line)
            })
            .map_err(|e| e.to_string()),
        };
        let (argv, line) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Cannot build command for {task_id}: {e}");
                self.log(format!("[{tag}] {e}"), LogLevel::Error);
                return false;
            }
        };

        self.log(format!("[batch] {line}"), LogLevel::Info);
        let callbacks = self.callbacks(run_id, task_id);
        match self.runner.start(&argv, callbacks) {
            Ok(()) => {
                debug!("Launched {task_id}");
                true
            }
            Err(e) => {
                match e.kind() {
                    RunnerErrorKind::Busy => {
                        error!("Runner still busy when {task_id} was due to start")
                    }
                    RunnerErrorKind::Launch => warn!("Failed to launch {task_id}: {e}"),
                }
                self.log(format!("[{tag}] {e}"), LogLevel::Error);
                false
            }
        }
    }

    fn callbacks(&self, run_id: BatchRunId, task_id: TaskId) -> ProcessCallbacks {
        let line_sender = move |stream: Stream| {
            let tx = self.signal_tx.clone();
            Box::new(move |line: String| {
                let _ = tx.send(RunnerSignal::Output {
                    run_id,
                    task_id,
                    stream,
                    line,
                });
            })
        };
        let exit_tx = self.signal_tx.clone();
        ProcessCallbacks {
            on_stdout: line_sender(Stream::Stdout),
            on_stderr: line_sender(Stream::Stderr),
            on_exit: Box::new(move |code| {
                let _ = exit_tx.send(RunnerSignal::Exited {
                    run_id,
                    task_id,
                    code,
                });
            }),
        }
    }

    /// Record the outcome of `row`. Returns whether the batch should advance.
    fn complete(&mut self, row: usize, code: i32) -> bool {
        self.queue.mark_finished(row, code);
        let tag = self.queue.get(row).map(QueuedTask::tag);
        if let Some(tag) = tag {
            let level = if code == 0 {
                LogLevel::Success
            } else {
                LogLevel::Error
            };
            self.log(format!("[{tag}] exit code {code}"), level);
        }

        self.summary.completed = row + 1;
        if code == 0 {
            self.summary.succeeded += 1;
        } else {
            self.summary.failed += 1;
        }
        self.emit(BatchEvent::Progress {
            completed: row + 1,
            total: self.queue.len(),
        });
        self.emit(BatchEvent::TasksChanged);

        if self.cancel_requested {
            self.summary.cancelled = true;
            self.finish();
            return false;
        }
        true
    }

    fn finish(&mut self) {
        let mut summary = std::mem::take(&mut self.summary);
        summary.total = self.queue.len();
        info!(
            "Batch finished: {} succeeded, {} failed{}",
            summary.succeeded,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        self.queue.set_current_index(None);
        self.run_id = None;
        self.cancel_requested = false;
        self.emit(BatchEvent::Finished(summary));
        self.emit(BatchEvent::TasksChanged);
    }
}
