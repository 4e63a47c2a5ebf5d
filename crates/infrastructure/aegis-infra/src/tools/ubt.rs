use camino::{Utf8Path, Utf8PathBuf};

use aegis_core::Profile;

use super::{find_uproject, script_path, ToolError};

/// Builds UnrealBuildTool command lines.
#[derive(Debug, Clone)]
pub struct Ubt {
    pub engine_root: Utf8PathBuf,
    pub project_dir: Utf8PathBuf,
}

impl Ubt {
    pub fn new(engine_root: impl Into<Utf8PathBuf>, project_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            engine_root: engine_root.into(),
            project_dir: project_dir.into(),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(&profile.engine_root, &profile.project_dir)
    }

    /// `Build.bat` on Windows, `Build.sh` elsewhere.
    pub fn exe(&self) -> Result<Utf8PathBuf, ToolError> {
        script_path(&self.engine_root, "Build.bat", "Build.sh")
    }

    pub fn build_argv(
        &self,
        target: &str,
        platform: &str,
        config: &str,
        clean: bool,
    ) -> Result<Vec<String>, ToolError> {
        let mut argv = vec![self.exe()?.into_string()];
        if clean {
            argv.push("-clean".into());
        }
        argv.extend([
            target.to_string(),
            platform.to_string(),
            config.to_string(),
            format!("-Project={}", find_uproject(&self.project_dir)?),
            "-WaitMutex".into(),
            "-FromMsBuild".into(),
        ]);
        Ok(argv)
    }

    /// Split a config like `DevelopmentEditor` into the build target and
    /// the bare configuration UBT expects.
    pub fn guess_target(&self, config: &str) -> (String, String) {
        let name = project_name(&self.project_dir);
        if let Some(base) = config.strip_suffix("Editor") {
            return (format!("{name}Editor"), base.to_string());
        }
        if let Some(base) = config.strip_suffix("Server") {
            return (format!("{name}Server"), base.to_string());
        }
        (name.to_string(), config.to_string())
    }
}

fn project_name(dir: &Utf8Path) -> &str {
    dir.file_name().unwrap_or_default()
}
