use chrono::Utc;

use crate::{QueuedTask, TaskId, TaskSpec, TaskState};

/// Ordered list of queued tasks plus the cursor of the in-flight task.
///
/// Rows at or before the cursor are locked: they have started or finished and
/// can no longer be moved, removed or overridden. Operations targeting a
/// locked row are no-ops and report `false`.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: Vec<QueuedTask>,
    current_index: Option<usize>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[QueuedTask] {
        &self.tasks
    }

    pub fn get(&self, row: usize) -> Option<&QueuedTask> {
        self.tasks.get(row)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn set_current_index(&mut self, index: Option<usize>) {
        self.current_index = index;
    }

    pub fn is_locked(&self, row: usize) -> bool {
        self.current_index.is_some_and(|cursor| row <= cursor)
    }

    /// Append a task. Appending after the cursor is always allowed.
    pub fn push(&mut self, spec: TaskSpec, preview: String) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.push(QueuedTask {
            id,
            spec,
            command_override: None,
            edit_requested: false,
            state: TaskState::Pending,
            preview,
            exit_code: None,
            finished_at: None,
        });
        id
    }

    /// Move the task at `row` by `delta` rows. Neither end may be locked.
    pub fn move_task(&mut self, row: usize, delta: isize) -> bool {
        if row >= self.tasks.len() || self.is_locked(row) {
            return false;
        }
        let Some(new_row) = row.checked_add_signed(delta) else {
            return false;
        };
        if new_row >= self.tasks.len() || self.is_locked(new_row) || new_row == row {
            return false;
        }
        let task = self.tasks.remove(row);
        self.tasks.insert(new_row, task);
        true
    }

    pub fn remove(&mut self, row: usize) -> Option<QueuedTask> {
        if row >= self.tasks.len() || self.is_locked(row) {
            return None;
        }
        Some(self.tasks.remove(row))
    }

    /// Set or clear the raw command for `row`. Blank text clears it.
    pub fn set_command_override(&mut self, row: usize, cmd: Option<&str>) -> bool {
        if self.is_locked(row) {
            return false;
        }
        let Some(task) = self.tasks.get_mut(row) else {
            return false;
        };
        if !task.is_editable() {
            return false;
        }
        task.command_override = cmd.map(str::trim).filter(|c| !c.is_empty()).map(String::from);
        if let Some(cmd) = &task.command_override {
            task.preview = cmd.clone();
        }
        true
    }

    pub fn set_preview(&mut self, row: usize, preview: String) {
        if let Some(task) = self.tasks.get_mut(row) {
            task.preview = preview;
        }
    }

    pub fn task_is_editable(&self, row: usize) -> bool {
        self.tasks.get(row).is_some_and(QueuedTask::is_editable)
    }

    pub fn set_edit_requested(&mut self, row: usize, requested: bool) -> bool {
        if self.is_locked(row) || !self.task_is_editable(row) {
            return false;
        }
        self.tasks[row].edit_requested = requested;
        true
    }

    /// Mark every editable, unlocked task for editing. Returns how many changed.
    pub fn request_edit_all(&mut self) -> usize {
        let mut changed = 0;
        for row in 0..self.tasks.len() {
            if !self.tasks[row].edit_requested && self.set_edit_requested(row, true) {
                changed += 1;
            }
        }
        changed
    }

    pub fn clear_edit_requests(&mut self) {
        for task in &mut self.tasks {
            task.edit_requested = false;
        }
    }

    /// Rows whose command should be confirmed before a batch starts.
    pub fn rows_pending_edit(&self) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.edit_requested && t.is_editable())
            .map(|(row, _)| row)
            .collect()
    }

    /// Command line shown for `row`: the override when set, else whatever
    /// `render` produces. Empty when the row is missing or rendering fails.
    pub fn command_preview<F, E>(&self, row: usize, render: F) -> String
    where
        F: FnOnce(&QueuedTask) -> Result<String, E>,
    {
        let Some(task) = self.tasks.get(row) else {
            return String::new();
        };
        if let Some(cmd) = &task.command_override {
            return cmd.clone();
        }
        render(task).unwrap_or_default()
    }

    pub fn all_command_previews<F, E>(&self, mut render: F) -> Vec<String>
    where
        F: FnMut(&QueuedTask) -> Result<String, E>,
    {
        (0..self.tasks.len())
            .map(|row| self.command_preview(row, &mut render))
            .collect()
    }

    /// Forget results from a previous run.
    pub fn reset_states(&mut self) {
        for task in &mut self.tasks {
            task.state = TaskState::Pending;
            task.exit_code = None;
            task.finished_at = None;
        }
    }

    pub fn mark_running(&mut self, row: usize) {
        if let Some(task) = self.tasks.get_mut(row) {
            task.state = TaskState::Running;
        }
    }

    pub fn mark_finished(&mut self, row: usize, code: i32) {
        if let Some(task) = self.tasks.get_mut(row) {
            task.state = if code == 0 {
                TaskState::Succeeded
            } else {
                TaskState::Failed
            };
            task.exit_code = Some(code);
            task.finished_at = Some(Utc::now());
        }
    }
}
