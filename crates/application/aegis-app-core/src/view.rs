use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{BatchEvent, BatchSummary, LogLine};

/// What a front end shows for the batch: progress plus the log so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchViewState {
    pub running: bool,
    pub completed: usize,
    pub total: usize,
    pub log: Vec<LogLine>,
    pub last_summary: Option<BatchSummary>,
    /// Bumped on every tasks-changed event so views know to re-read the queue.
    pub tasks_revision: u64,
}

impl BatchViewState {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

pub fn reduce(mut state: BatchViewState, ev: BatchEvent) -> BatchViewState {
    match ev {
        BatchEvent::Log(line) => state.log.push(line),

        BatchEvent::Started { total } => {
            state.running = true;
            state.completed = 0;
            state.total = total;
            state.last_summary = None;
        }

        BatchEvent::Progress { completed, total } => {
            state.completed = completed;
            state.total = total;
        }

        BatchEvent::Finished(summary) => {
            state.running = false;
            state.total = summary.total;
            state.last_summary = Some(summary);
        }

        BatchEvent::TasksChanged => state.tasks_revision += 1,
    }
    state
}

#[derive(Clone, Default)]
pub struct BatchViewStore {
    inner: Arc<Mutex<BatchViewState>>,
}

impl BatchViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BatchViewState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> BatchViewState {
        self.lock().clone()
    }

    pub fn apply(&self, ev: BatchEvent) {
        let mut guard = self.lock();
        let next = reduce(std::mem::take(&mut *guard), ev);
        *guard = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogLevel;

    #[test]
    fn started_resets_progress_and_finished_keeps_summary() {
        let store = BatchViewStore::new();
        store.apply(BatchEvent::Started { total: 2 });
        store.apply(BatchEvent::Log(LogLine::new("[batch] echo", LogLevel::Info)));
        store.apply(BatchEvent::Progress {
            completed: 1,
            total: 2,
        });
        assert!(store.state().running);
        assert_eq!(store.state().fraction(), 0.5);

        store.apply(BatchEvent::Finished(BatchSummary {
            total: 2,
            completed: 1,
            succeeded: 1,
            failed: 0,
            cancelled: true,
        }));
        let state = store.state();
        assert!(!state.running);
        assert_eq!(state.log.len(), 1);
        assert!(state.last_summary.as_ref().is_some_and(|s| s.cancelled));

        store.apply(BatchEvent::Started { total: 1 });
        let state = store.state();
        assert_eq!(state.completed, 0);
        assert!(state.last_summary.is_none());
    }

    #[test]
    fn tasks_changed_bumps_revision() {
        let state = reduce(BatchViewState::default(), BatchEvent::TasksChanged);
        let state = reduce(state, BatchEvent::TasksChanged);
        assert_eq!(state.tasks_revision, 2);
        assert_eq!(state.fraction(), 0.0);
    }
}
