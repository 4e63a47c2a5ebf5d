#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use aegis_app_core::{BatchController, BatchEvent, BatchViewStore, KeepCommands, LogLevel};
use aegis_core::{Profile, TaskState, TaskTag};
use aegis_infra::ProcessRunner;
use camino::Utf8PathBuf;
use tokio_util::sync::CancellationToken;

fn profile(dir: &tempfile::TempDir) -> Profile {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::create_dir_all(root.join("UE/Engine/Build/BatchFiles")).unwrap();
    std::fs::create_dir_all(root.join("MyGame")).unwrap();
    std::fs::write(root.join("MyGame/MyGame.uproject"), "").unwrap();
    Profile::new(root.join("UE"), root.join("MyGame"))
}

fn fold(events: &mut tokio::sync::mpsc::UnboundedReceiver<BatchEvent>) -> BatchViewStore {
    let store = BatchViewStore::new();
    while let Ok(ev) = events.try_recv() {
        store.apply(ev);
    }
    store
}

#[tokio::test]
async fn echo_and_override_tasks_run_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (mut controller, mut events) = BatchController::new(Arc::new(ProcessRunner::new()));
    controller.set_profile(Some(profile(&dir)));

    controller
        .queue_task(TaskTag::Echo, "Development", "Linux", false)
        .unwrap();
    controller
        .queue_task(TaskTag::Cook, "Development", "Linux", false)
        .unwrap();
    controller.set_command_override(1, Some("sh -c 'echo cooked; echo bad >&2; exit 4'"));

    controller.start_batch(&mut KeepCommands).unwrap();
    tokio::time::timeout(
        Duration::from_secs(20),
        controller.run_until_idle(&CancellationToken::new()),
    )
    .await
    .expect("batch finished in time");

    let tasks = controller.queue().tasks();
    assert_eq!(tasks[0].state, TaskState::Succeeded);
    assert_eq!(tasks[1].exit_code, Some(4));

    let state = fold(&mut events).state();
    let lines: Vec<(&str, LogLevel)> = state
        .log
        .iter()
        .map(|l| (l.message.as_str(), l.level))
        .collect();
    assert!(lines.contains(&("[echo] echo Development Linux", LogLevel::Info)));
    assert!(lines.contains(&("[cook] cooked", LogLevel::Info)));
    assert!(lines.contains(&("[cook] bad", LogLevel::Error)));
    assert!(lines.contains(&("[cook] exit code 4", LogLevel::Error)));

    let summary = state.last_summary.expect("summary");
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert!(!state.running);
    assert_eq!(state.completed, 2);
}

#[tokio::test]
async fn cancellation_token_kills_the_running_task_and_halts() {
    let dir = tempfile::tempdir().unwrap();
    let (mut controller, mut events) = BatchController::new(Arc::new(ProcessRunner::new()));
    controller.set_profile(Some(profile(&dir)));

    controller
        .queue_task(TaskTag::Stage, "Development", "Linux", false)
        .unwrap();
    controller
        .queue_task(TaskTag::Echo, "Development", "Linux", false)
        .unwrap();
    controller.set_command_override(0, Some("sh -c 'sleep 30; echo staged'"));

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    controller.start_batch(&mut KeepCommands).unwrap();
    tokio::time::timeout(Duration::from_secs(3), controller.run_until_idle(&token))
        .await
        .expect("cancel ended the batch");

    let tasks = controller.queue().tasks();
    assert_eq!(tasks[0].state, TaskState::Failed);
    assert_eq!(tasks[0].exit_code, Some(-1));
    assert_eq!(tasks[1].state, TaskState::Pending);

    let summary = fold(&mut events).state().last_summary.expect("summary");
    assert!(summary.cancelled);
    assert_eq!(summary.completed, 1);
}
