use std::io::{self, BufRead, Write};
use std::sync::Arc;

use aegis_app_core::switches::{matching_switches, switch_hint};
use aegis_app_core::{
    BatchController, BatchEvent, BatchSummary, BatchViewStore, CommandEditPrompt,
    CommandErrorKind, KeepCommands, LogLevel, LogLine, QueueError,
};
use aegis_core::{ManualOverrideSet, Profile, QueuedTask};
use aegis_infra::ProcessRunner;
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use crate::{CommandOverrideArg, TaskArg};

/// Everything `preview` and `run` need to fill the queue.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub tasks: Vec<TaskArg>,
    pub overrides: Vec<String>,
    pub command_overrides: Vec<CommandOverrideArg>,
    /// Ask for every editable command on stdin before starting.
    pub edit: bool,
}

fn build_controller(
    profile: Profile,
    req: &BatchRequest,
) -> Result<(
    BatchController<ProcessRunner>,
    UnboundedReceiver<BatchEvent>,
)> {
    let (mut controller, events) = BatchController::new(Arc::new(ProcessRunner::new()));
    controller.set_profile(Some(profile));

    let mut overrides = ManualOverrideSet::new();
    for raw in &req.overrides {
        overrides.add_raw(raw);
    }
    controller.set_overrides(overrides);

    for task in &req.tasks {
        if let Err(e) = controller.queue_task(task.tag, &task.config, &task.platform, task.clean) {
            let label = task.to_spec().label();
            return Err(match queue_hint(&e) {
                Some(hint) => anyhow!("Cannot queue {label}: {e}\n   hint: {hint}"),
                None => anyhow!("Cannot queue {label}: {e}"),
            });
        }
    }

    for ov in &req.command_overrides {
        if ov.row >= controller.queue().len() {
            return Err(anyhow!("There is no task #{}", ov.row + 1));
        }
        if !controller.set_command_override(ov.row, Some(&ov.command)) {
            return Err(anyhow!("Task #{} does not accept a custom command", ov.row + 1));
        }
    }

    if req.edit {
        controller.request_edit_all();
    }
    Ok((controller, events))
}

fn queue_hint(e: &QueueError) -> Option<&'static str> {
    match e {
        QueueError::PlatformNotAllowed { .. } => {
            Some("editor configurations only build for Win64, Linux and Mac")
        }
        QueueError::Command(e) => match e.kind() {
            CommandErrorKind::EngineNotFound => {
                Some("check the engine root of the profile with `profile show`")
            }
            CommandErrorKind::UprojectNotFound => {
                Some("the project directory must contain a .uproject file")
            }
            CommandErrorKind::NoProfile => Some("pick a profile with --profile"),
            CommandErrorKind::InvalidFlags | CommandErrorKind::Io => None,
        },
        QueueError::MissingField(_) => None,
    }
}

/// Print the command of every task and return them in queue order.
pub fn cmd_preview(profile: Profile, req: &BatchRequest) -> Result<Vec<String>> {
    let (controller, _events) = build_controller(profile, req)?;

    if !controller.overrides().is_empty() {
        println!(":: Manual overrides (cook, stage, package and DDC tasks)");
        for ov in controller.overrides().iter() {
            let shown = if ov.value.is_empty() {
                ov.switch.clone()
            } else {
                format!("{}={}", ov.switch, ov.value)
            };
            let hint = switch_hint(&ov.switch).unwrap_or("unknown switch");
            println!("   {shown:<32} {hint}");
        }
    }

    let previews = controller.all_command_previews();
    println!(":: Command preview");
    for (task, preview) in controller.queue().tasks().iter().zip(&previews) {
        println!("   {:<4} {}", task.id, task.label());
        println!("        {}", preview);
    }
    Ok(previews)
}

/// Reads replacement commands from stdin.
///
/// An empty answer keeps the shown command, `!` aborts the batch.
pub struct StdinPrompt;

impl CommandEditPrompt for StdinPrompt {
    fn edit(&mut self, task: &QueuedTask, current: &str) -> Option<String> {
        println!(":: {} {}", task.id, task.label());
        println!("   {current}");
        print!("   New command (empty keeps, ! aborts): ");
        io::stdout().flush().ok()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer).ok()?;
        match answer.trim() {
            "!" => None,
            "" => Some(current.to_string()),
            edited => Some(edited.to_string()),
        }
    }
}

fn print_line(pb: &ProgressBar, line: &LogLine) {
    let marker = match line.level {
        LogLevel::Info => "   ",
        LogLevel::Success => " + ",
        LogLevel::Warning => " ! ",
        LogLevel::Error => " x ",
    };
    pb.suspend(|| println!("{marker}{}", line.message));
}

async fn render_events(mut events: UnboundedReceiver<BatchEvent>) -> Option<BatchSummary> {
    let store = BatchViewStore::new();
    let pb = ProgressBar::new(0);
    let style =
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    while let Some(ev) = events.recv().await {
        match &ev {
            BatchEvent::Log(line) => print_line(&pb, line),
            BatchEvent::Started { total } => {
                pb.set_length(*total as u64);
                pb.set_position(0);
                pb.set_message("Running...");
            }
            BatchEvent::Progress { completed, total } => {
                pb.set_length(*total as u64);
                pb.set_position(*completed as u64);
            }
            BatchEvent::Finished(summary) => {
                let msg = if summary.cancelled {
                    "Cancelled"
                } else {
                    "Batch complete"
                };
                pb.finish_with_message(msg);
            }
            BatchEvent::TasksChanged => {}
        }
        store.apply(ev);
    }
    store.state().last_summary
}

/// Run the batch until it finishes or Ctrl-C cancels it.
pub async fn cmd_run(profile: Profile, req: &BatchRequest) -> Result<BatchSummary> {
    let (mut controller, events) = build_controller(profile, req)?;
    println!(
        ":: Running {} task(s) for {}",
        controller.queue().len(),
        controller.profile().map(Profile::display_name).unwrap_or_default()
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, cancelling batch");
                cancel.cancel();
            }
        })
    };
    let renderer = tokio::spawn(render_events(events));

    let started = if req.edit {
        controller.start_batch(&mut StdinPrompt)
    } else {
        controller.start_batch(&mut KeepCommands)
    };
    if let Err(e) = started {
        ctrl_c.abort();
        return Err(e.into());
    }

    controller.run_until_idle(&cancel).await;
    ctrl_c.abort();
    drop(controller);

    let summary = renderer
        .await
        .context("Event renderer stopped unexpectedly")?
        .ok_or_else(|| anyhow!("Batch ended without a summary"))?;

    println!("\n:: Batch Result");
    println!("   Succeeded: {}", summary.succeeded);
    println!("   Failed:    {}", summary.failed);
    if summary.cancelled {
        println!(
            "   Status:    Cancelled after {}/{} task(s)",
            summary.completed, summary.total
        );
    }
    Ok(summary)
}

pub fn cmd_switches(filter: Option<&str>) {
    let hits = matching_switches(filter.unwrap_or_default());
    if hits.is_empty() {
        println!("No matching switches.");
        return;
    }
    for (switch, hint) in hits {
        println!("{:<32} {}", switch, hint);
    }
}

pub fn cmd_defaults() {
    println!(":: Default configurations");
    for config in aegis_config::DEFAULT_CONFIGS {
        println!("   {config}");
    }
    println!(":: Default platforms");
    for platform in aegis_config::DEFAULT_PLATFORMS {
        println!("   {platform}");
    }
    println!(
        ":: Editor configurations are limited to: {}",
        aegis_config::EDITOR_PLATFORMS.join(", ")
    );
}
