use camino::Utf8PathBuf;

use aegis_core::Profile;

use super::{find_uproject, script_path, ToolError};

/// Step switches for `BuildCookRun`.
///
/// For each step the positive flag wins over its skip flag, except pak and
/// skip_pak which must not both be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCookRunFlags {
    pub build: bool,
    pub cook: bool,
    pub stage: bool,
    pub package: bool,
    pub pak: bool,
    pub skip_pak: bool,
    pub skip_build: bool,
    pub skip_cook: bool,
    pub skip_stage: bool,
}

/// Builds AutomationTool command lines.
#[derive(Debug, Clone)]
pub struct Uat {
    pub engine_root: Utf8PathBuf,
    pub project_dir: Utf8PathBuf,
}

impl Uat {
    pub fn new(engine_root: impl Into<Utf8PathBuf>, project_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            engine_root: engine_root.into(),
            project_dir: project_dir.into(),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(&profile.engine_root, &profile.project_dir)
    }

    /// `RunUAT.bat` on Windows, `RunUAT.sh` elsewhere.
    pub fn exe(&self) -> Result<Utf8PathBuf, ToolError> {
        script_path(&self.engine_root, "RunUAT.bat", "RunUAT.sh")
    }

    pub fn buildcookrun_argv(
        &self,
        platform: &str,
        config: &str,
        flags: &BuildCookRunFlags,
    ) -> Result<Vec<String>, ToolError> {
        if flags.pak && flags.skip_pak {
            return Err(ToolError::PakConflict);
        }

        let mut argv = vec![
            self.exe()?.into_string(),
            "BuildCookRun".into(),
            format!("-Project={}", find_uproject(&self.project_dir)?),
            "-NoP4".into(),
            format!("-ClientConfig={config}"),
            format!("-TargetPlatform={platform}"),
        ];

        let steps = [
            (flags.build, flags.skip_build, "-Build", "-SkipBuild"),
            (flags.cook, flags.skip_cook, "-Cook", "-SkipCook"),
            (flags.stage, flags.skip_stage, "-Stage", "-SkipStage"),
            (flags.pak, flags.skip_pak, "-Pak", "-SkipPak"),
        ];
        for (run, skip, on, off) in steps {
            if run {
                argv.push(on.into());
            } else if skip {
                argv.push(off.into());
            }
        }
        if flags.package {
            argv.push("-Package".into());
        }
        Ok(argv)
    }

    pub fn build_ddc_argv(&self, platform: &str, clean: bool) -> Result<Vec<String>, ToolError> {
        let mut argv = vec![
            self.exe()?.into_string(),
            "BuildDerivedDataCache".into(),
            format!("-Project={}", find_uproject(&self.project_dir)?),
            format!("-TargetPlatform={platform}"),
        ];
        if clean {
            argv.push("-Clean".into());
        }
        Ok(argv)
    }

    pub fn rebuild_ddc_argv(&self, platform: &str) -> Result<Vec<String>, ToolError> {
        let mut argv = self.build_ddc_argv(platform, true)?;
        argv.push("-Fill".into());
        Ok(argv)
    }
}
