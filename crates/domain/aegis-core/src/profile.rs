use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Paths describing an engine installation and the project built with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub engine_root: Utf8PathBuf,
    pub project_dir: Utf8PathBuf,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_configs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_platforms: Vec<String>,
}

impl Profile {
    pub fn new(engine_root: impl Into<Utf8PathBuf>, project_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            engine_root: engine_root.into(),
            project_dir: project_dir.into(),
            nickname: String::new(),
            build_configs: Vec::new(),
            build_platforms: Vec::new(),
        }
    }

    /// Name of the project directory, which is also the default build target.
    pub fn project_name(&self) -> &str {
        self.project_dir.file_name().unwrap_or_default()
    }

    /// `nick-Project` when a nickname is set, else just `Project`.
    pub fn display_name(&self) -> String {
        let nick = self.nickname.trim();
        if nick.is_empty() {
            self.project_name().to_string()
        } else {
            format!("{nick}-{}", self.project_name())
        }
    }

    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
        let profile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse profile {path}"))?;
        Ok(profile)
    }

    pub fn save(&self, path: &Utf8Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
        Ok(())
    }
}
