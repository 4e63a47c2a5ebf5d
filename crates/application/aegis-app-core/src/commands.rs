use aegis_core::{ManualOverrideSet, Profile, TaskSpec, TaskTag};
use aegis_infra::{clean_dir, join_command, BuildCookRunFlags, ToolError, ToolErrorKind, Uat, Ubt};
use thiserror::Error;

/// Whether the argv is only shown or about to be launched.
///
/// Preview never touches the filesystem beyond path discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgvMode {
    Preview,
    Execute,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No profile loaded")]
    NoProfile,
    #[error(transparent)]
    Tool(#[from] ToolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandErrorKind {
    NoProfile,
    EngineNotFound,
    UprojectNotFound,
    InvalidFlags,
    Io,
}

impl CommandError {
    pub fn kind(&self) -> CommandErrorKind {
        match self {
            CommandError::NoProfile => CommandErrorKind::NoProfile,
            CommandError::Tool(e) => match e.kind() {
                ToolErrorKind::EngineNotFound => CommandErrorKind::EngineNotFound,
                ToolErrorKind::UprojectNotFound => CommandErrorKind::UprojectNotFound,
                ToolErrorKind::InvalidFlags => CommandErrorKind::InvalidFlags,
                ToolErrorKind::Io => CommandErrorKind::Io,
            },
        }
    }
}

/// BuildCookRun switches for the three packaging steps.
pub fn buildcookrun_flags(tag: TaskTag) -> Option<BuildCookRunFlags> {
    let flags = match tag {
        TaskTag::Cook => BuildCookRunFlags {
            cook: true,
            skip_build: true,
            ..Default::default()
        },
        TaskTag::Stage => BuildCookRunFlags {
            stage: true,
            pak: true,
            skip_build: true,
            skip_cook: true,
            ..Default::default()
        },
        TaskTag::Package => BuildCookRunFlags {
            package: true,
            skip_pak: true,
            skip_build: true,
            skip_cook: true,
            skip_stage: true,
            ..Default::default()
        },
        _ => return None,
    };
    Some(flags)
}

/// Output directory a clean cook/stage/package run starts from.
fn clean_target(profile: &Profile, tag: TaskTag) -> Option<camino::Utf8PathBuf> {
    let saved = profile.project_dir.join("Saved");
    match tag {
        TaskTag::Cook => Some(saved.join("Cooked")),
        TaskTag::Stage | TaskTag::Package => Some(saved.join("Staged")),
        _ => None,
    }
}

fn echo_argv(spec: &TaskSpec) -> Vec<String> {
    let text = format!("{} {} {}", spec.tag, spec.config, spec.platform);
    if cfg!(windows) {
        vec!["cmd".into(), "/C".into(), "echo".into(), text]
    } else {
        vec!["echo".into(), text]
    }
}

/// Compose the command line for one task.
///
/// In [`ArgvMode::Execute`] a clean cook/stage/package wipes its output
/// directory before the argv is returned.
pub fn build_argv(
    profile: Option<&Profile>,
    spec: &TaskSpec,
    overrides: &ManualOverrideSet,
    mode: ArgvMode,
) -> Result<Vec<String>, CommandError> {
    let profile = profile.ok_or(CommandError::NoProfile)?;

    let mut argv = match spec.tag {
        TaskTag::Build | TaskTag::Clean | TaskTag::Rebuild => {
            let ubt = Ubt::from_profile(profile);
            let (target, config) = ubt.guess_target(&spec.config);
            let clean = spec.tag != TaskTag::Build;
            return Ok(ubt.build_argv(&target, &spec.platform, &config, clean)?);
        }
        TaskTag::Cook | TaskTag::Stage | TaskTag::Package => {
            if spec.clean && mode == ArgvMode::Execute {
                if let Some(dir) = clean_target(profile, spec.tag) {
                    clean_dir(&dir)?;
                }
            }
            let flags = buildcookrun_flags(spec.tag).unwrap_or_default();
            Uat::from_profile(profile).buildcookrun_argv(&spec.platform, &spec.config, &flags)?
        }
        TaskTag::DdcBuild => Uat::from_profile(profile).build_ddc_argv(&spec.platform, false)?,
        TaskTag::DdcClean => Uat::from_profile(profile).build_ddc_argv(&spec.platform, true)?,
        TaskTag::DdcRebuild => Uat::from_profile(profile).rebuild_ddc_argv(&spec.platform)?,
        TaskTag::Echo => return Ok(echo_argv(spec)),
    };

    if spec.tag.accepts_manual_overrides() {
        argv.extend(overrides.manual_args());
    }
    Ok(argv)
}

/// Preview string for a task, quoted so it can be pasted back as an override.
pub fn preview_command(
    profile: Option<&Profile>,
    spec: &TaskSpec,
    overrides: &ManualOverrideSet,
) -> Result<String, CommandError> {
    build_argv(profile, spec, overrides, ArgvMode::Preview).map(|argv| join_command(&argv))
}
