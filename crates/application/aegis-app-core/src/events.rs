pub type BatchRunId = uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub message: String,
    pub level: LogLevel,
}

impl LogLine {
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.completed == self.total
    }
}

/// Everything a front end needs to render a batch, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Log(LogLine),
    Started { total: usize },
    Progress { completed: usize, total: usize },
    Finished(BatchSummary),
    TasksChanged,
}
