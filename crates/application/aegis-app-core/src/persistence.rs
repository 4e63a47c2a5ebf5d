use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aegis_core::Profile;
use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::ports::ProfilesRepo;

const QUALIFIER: &str = "com";
const ORG: &str = "aegis";
const APP: &str = "toolbelt";

/// Profiles stored as one pretty-printed JSON array.
///
/// Defaults to `profiles.json` in the per-user config directory.
pub struct FilePersistence {
    dir: Option<PathBuf>,
}

impl Default for FilePersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl FilePersistence {
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Store files under `dir` instead of the user config directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn config_dir(&self) -> Result<PathBuf> {
        let config_dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from(QUALIFIER, ORG, APP)
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
                .config_dir()
                .to_path_buf(),
        };
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }
        Ok(config_dir)
    }

    pub fn profiles_path(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("profiles.json"))
    }

    pub fn load_profiles(&self) -> Result<Vec<Profile>> {
        let path = self.profiles_path()?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).context("Failed to read profiles")?;
        let profiles: Vec<Profile> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(profiles)
    }

    pub fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        let path = self.profiles_path()?;
        let json = serde_json::to_string_pretty(profiles)?;
        atomic_write(&path, json.as_bytes()).context("Failed to write profiles")?;
        Ok(())
    }
}

impl ProfilesRepo for FilePersistence {
    fn load(&self) -> Result<Vec<Profile>> {
        self.load_profiles()
    }

    fn save(&self, profiles: &[Profile]) -> Result<()> {
        self.save_profiles(profiles)
    }
}

/// Configurations offered for `profile`, falling back to the defaults.
pub fn profile_configs(profile: &Profile) -> Vec<String> {
    or_defaults(&profile.build_configs, aegis_config::DEFAULT_CONFIGS)
}

/// Platforms offered for `profile`, falling back to the defaults.
pub fn profile_platforms(profile: &Profile) -> Vec<String> {
    or_defaults(&profile.build_platforms, aegis_config::DEFAULT_PLATFORMS)
}

fn or_defaults(custom: &[String], defaults: &[&str]) -> Vec<String> {
    let custom: Vec<String> = custom
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if custom.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        custom
    }
}

fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file {}", tmp_path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write temp file {}", tmp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {}", tmp_path.display()))?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path)
                .with_context(|| format!("Failed to replace {}", path.display()))?;
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to rename {} to {}",
                    tmp_path.display(),
                    path.display()
                )
            });
        }
    }
    Ok(())
}
