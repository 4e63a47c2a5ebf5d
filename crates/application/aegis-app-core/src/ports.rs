use aegis_core::{Profile, QueuedTask};
use aegis_infra::{ProcessCallbacks, ProcessRunner, RunnerError};

/// The single external process slot the batch runs through.
pub trait ProcessPort: Send + Sync + 'static {
    fn start(&self, argv: &[String], callbacks: ProcessCallbacks) -> Result<(), RunnerError>;
    fn cancel(&self);
    fn is_busy(&self) -> bool;
}

impl ProcessPort for ProcessRunner {
    fn start(&self, argv: &[String], callbacks: ProcessCallbacks) -> Result<(), RunnerError> {
        ProcessRunner::start(self, argv, callbacks)
    }

    fn cancel(&self) {
        ProcessRunner::cancel(self)
    }

    fn is_busy(&self) -> bool {
        ProcessRunner::is_busy(self)
    }
}

/// Asked once per task marked "edit before running" when a batch starts.
pub trait CommandEditPrompt {
    /// Return the command to run, or `None` to abort the whole batch.
    fn edit(&mut self, task: &QueuedTask, current: &str) -> Option<String>;
}

/// Accepts every command unchanged.
pub struct KeepCommands;

impl CommandEditPrompt for KeepCommands {
    fn edit(&mut self, _task: &QueuedTask, current: &str) -> Option<String> {
        Some(current.to_string())
    }
}

pub trait ProfilesRepo: Send + Sync + 'static {
    fn load(&self) -> anyhow::Result<Vec<Profile>>;
    fn save(&self, profiles: &[Profile]) -> anyhow::Result<()>;
}
