use aegis_core::{TaskQueue, TaskSpec, TaskTag};

fn snapshot(q: &TaskQueue) -> Vec<(u64, Option<String>)> {
    q.tasks()
        .iter()
        .map(|t| (t.id.0, t.command_override.clone()))
        .collect()
}

fn queue_with(n: usize) -> TaskQueue {
    let mut q = TaskQueue::new();
    for i in 0..n {
        let tag = TaskTag::ALL[i % 9];
        q.push(TaskSpec::new(tag, "Development", "Win64"), format!("cmd {i}"));
    }
    q
}

#[test]
fn operations_at_or_before_cursor_leave_queue_unchanged() {
    for cursor in 0..4 {
        let mut q = queue_with(5);
        q.set_current_index(Some(cursor));
        let before = snapshot(&q);

        for row in 0..=cursor {
            assert!(!q.move_task(row, 1), "move down of locked row {row}");
            assert!(!q.move_task(row, -1), "move up of locked row {row}");
            assert!(q.remove(row).is_none(), "remove of locked row {row}");
            assert!(!q.set_command_override(row, Some("x")));
            assert!(!q.set_edit_requested(row, true));
        }
        assert_eq!(snapshot(&q), before, "cursor {cursor}");
    }
}

#[test]
fn unlocked_rows_cannot_jump_over_the_cursor() {
    let mut q = queue_with(4);
    q.set_current_index(Some(1));
    assert!(!q.move_task(2, -1));
    assert!(q.move_task(3, -1));
    assert!(q.remove(3).is_some());
    assert_eq!(q.len(), 3);
}

#[test]
fn idle_queue_has_no_locked_rows() {
    let mut q = queue_with(3);
    q.set_current_index(None);
    assert!(!q.is_locked(0));
    assert!(q.move_task(0, 2));
    assert!(q.remove(0).is_some());
}
