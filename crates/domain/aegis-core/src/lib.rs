use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod overrides;
pub mod profile;
pub mod queue;

pub use overrides::{ManualOverride, ManualOverrideSet};
pub use profile::Profile;
pub use queue::TaskQueue;

/// Which engine executable a task is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// UnrealBuildTool via `Build.bat` / `Build.sh`.
    BuildTool,
    /// AutomationTool via `RunUAT.bat` / `RunUAT.sh`.
    AutomationTool,
    /// Plain shell echo, used by the fallback task.
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskTag {
    Build,
    Clean,
    Rebuild,
    Cook,
    Stage,
    Package,
    DdcBuild,
    DdcClean,
    DdcRebuild,
    Echo,
}

impl TaskTag {
    pub const ALL: [TaskTag; 10] = [
        TaskTag::Build,
        TaskTag::Clean,
        TaskTag::Rebuild,
        TaskTag::Cook,
        TaskTag::Stage,
        TaskTag::Package,
        TaskTag::DdcBuild,
        TaskTag::DdcClean,
        TaskTag::DdcRebuild,
        TaskTag::Echo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskTag::Build => "build",
            TaskTag::Clean => "clean",
            TaskTag::Rebuild => "rebuild",
            TaskTag::Cook => "cook",
            TaskTag::Stage => "stage",
            TaskTag::Package => "package",
            TaskTag::DdcBuild => "ddc-build",
            TaskTag::DdcClean => "ddc-clean",
            TaskTag::DdcRebuild => "ddc-rebuild",
            TaskTag::Echo => "echo",
        }
    }

    pub fn tool(self) -> Tool {
        match self {
            TaskTag::Build | TaskTag::Clean | TaskTag::Rebuild => Tool::BuildTool,
            TaskTag::Echo => Tool::Shell,
            _ => Tool::AutomationTool,
        }
    }

    /// Manual command editing is offered for every engine task.
    pub fn is_editable(self) -> bool {
        self != TaskTag::Echo
    }

    /// Manual overrides only reach AutomationTool invocations.
    pub fn accepts_manual_overrides(self) -> bool {
        self.tool() == Tool::AutomationTool
    }

    /// Cook, stage and package can wipe their output directory first.
    pub fn supports_clean(self) -> bool {
        matches!(self, TaskTag::Cook | TaskTag::Stage | TaskTag::Package)
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        TaskTag::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| anyhow::anyhow!("Unknown task kind '{}'", s.trim()))
    }
}

/// Opaque handle a front end maps to its own widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// What the user asked for when queueing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub tag: TaskTag,
    pub config: String,
    pub platform: String,
    /// Wipe the cooked/staged output before running. Cook, stage and package only.
    #[serde(default)]
    pub clean: bool,
}

impl TaskSpec {
    pub fn new(tag: TaskTag, config: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            tag,
            config: config.into(),
            platform: platform.into(),
            clean: false,
        }
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean && self.tag.supports_clean();
        self
    }

    pub fn label(&self) -> String {
        let mut label = format!("{} {} {}", self.tag, self.config, self.platform);
        if self.clean {
            label.push_str(" (clean)");
        }
        label
    }
}

#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: TaskId,
    pub spec: TaskSpec,
    pub command_override: Option<String>,
    pub edit_requested: bool,
    pub state: TaskState,
    /// Last rendered command line, shown next to the task.
    pub preview: String,
    pub exit_code: Option<i32>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueuedTask {
    pub fn tag(&self) -> TaskTag {
        self.spec.tag
    }

    pub fn is_editable(&self) -> bool {
        self.spec.tag.is_editable()
    }

    pub fn label(&self) -> String {
        self.spec.label()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TaskState::Succeeded | TaskState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_from_their_labels() {
        for tag in TaskTag::ALL {
            assert_eq!(tag.as_str().parse::<TaskTag>().unwrap(), tag);
        }
        assert_eq!(
            "DDC-Rebuild".parse::<TaskTag>().unwrap(),
            TaskTag::DdcRebuild
        );
        assert!("deploy".parse::<TaskTag>().is_err());
    }

    #[test]
    fn overrides_only_reach_automation_tool_tasks() {
        assert!(!TaskTag::Build.accepts_manual_overrides());
        assert!(!TaskTag::Rebuild.accepts_manual_overrides());
        assert!(TaskTag::Cook.accepts_manual_overrides());
        assert!(TaskTag::DdcClean.accepts_manual_overrides());
        assert!(!TaskTag::Echo.accepts_manual_overrides());
    }

    #[test]
    fn clean_is_dropped_for_tasks_without_an_output_dir() {
        let spec = TaskSpec::new(TaskTag::Build, "Development", "Win64").with_clean(true);
        assert!(!spec.clean);

        let spec = TaskSpec::new(TaskTag::Stage, "Development", "Win64").with_clean(true);
        assert!(spec.clean);
        assert_eq!(spec.label(), "stage Development Win64 (clean)");
    }
}
