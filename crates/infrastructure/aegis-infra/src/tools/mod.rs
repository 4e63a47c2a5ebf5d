//! Command builders for the engine's UnrealBuildTool and AutomationTool scripts.

mod uat;
mod ubt;

pub use uat::{BuildCookRunFlags, Uat};
pub use ubt::Ubt;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Could not locate Engine/Build/BatchFiles under {root}")]
    EngineNotFound { root: Utf8PathBuf },
    #[error("No .uproject file found in {dir}")]
    UprojectNotFound { dir: Utf8PathBuf },
    #[error("pak and skip_pak cannot both be set")]
    PakConflict,
    #[error("IO error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    EngineNotFound,
    UprojectNotFound,
    InvalidFlags,
    Io,
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::EngineNotFound { .. } => ToolErrorKind::EngineNotFound,
            ToolError::UprojectNotFound { .. } => ToolErrorKind::UprojectNotFound,
            ToolError::PakConflict => ToolErrorKind::InvalidFlags,
            ToolError::Io { .. } => ToolErrorKind::Io,
        }
    }
}

/// Resolve the directory holding `Build/BatchFiles`.
///
/// Accepts either the engine directory itself or the install root above it.
pub fn engine_dir(root: &Utf8Path) -> Result<Utf8PathBuf, ToolError> {
    if root.join("Build").join("BatchFiles").is_dir() {
        debug!("Using engine directory {root}");
        return Ok(root.to_path_buf());
    }
    let candidate = root.join("Engine");
    if candidate.join("Build").join("BatchFiles").is_dir() {
        debug!("Detected engine root {root}");
        return Ok(candidate);
    }
    error!("Could not locate Engine/Build/BatchFiles under {root}");
    Err(ToolError::EngineNotFound {
        root: root.to_path_buf(),
    })
}

/// First `*.uproject` in `project_dir`, by file name.
pub fn find_uproject(project_dir: &Utf8Path) -> Result<Utf8PathBuf, ToolError> {
    let not_found = || ToolError::UprojectNotFound {
        dir: project_dir.to_path_buf(),
    };
    let entries = project_dir.read_dir_utf8().map_err(|e| {
        debug!("Cannot list {project_dir}: {e}");
        not_found()
    })?;

    let mut candidates: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| path.extension() == Some("uproject") && path.is_file())
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(path) => {
            debug!("Using uproject {path}");
            Ok(path)
        }
        None => {
            error!("No .uproject file found in {project_dir}");
            Err(not_found())
        }
    }
}

/// Delete `path` recursively if present, then recreate it empty.
pub fn clean_dir(path: &Utf8Path) -> Result<(), ToolError> {
    let io_err = |source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        debug!("Wiping {path}");
        std::fs::remove_dir_all(path).map_err(io_err)?;
    }
    std::fs::create_dir_all(path).map_err(io_err)?;
    Ok(())
}

fn script_path(
    engine_root: &Utf8Path,
    windows: &str,
    unix: &str,
) -> Result<Utf8PathBuf, ToolError> {
    let script = if cfg!(windows) { windows } else { unix };
    Ok(engine_dir(engine_root)?
        .join("Build")
        .join("BatchFiles")
        .join(script))
}

#[cfg(test)]
pub(crate) mod test_support {
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    pub struct Layout {
        pub _dir: TempDir,
        pub install_root: Utf8PathBuf,
        pub project_dir: Utf8PathBuf,
    }

    impl Layout {
        pub fn batch_files(&self) -> Utf8PathBuf {
            self.install_root.join("Engine/Build/BatchFiles")
        }
    }

    /// `UE/Engine/Build/BatchFiles` plus `MyGame/MyGame.uproject`.
    pub fn engine_layout() -> Layout {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        let install_root = root.join("UE");
        std::fs::create_dir_all(install_root.join("Engine/Build/BatchFiles")).unwrap();
        let project_dir = root.join("MyGame");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("MyGame.uproject"), "").unwrap();
        Layout {
            _dir: dir,
            install_root,
            project_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::engine_layout;
    use super::*;

    #[test]
    fn engine_dir_accepts_install_root_or_engine_dir() {
        let layout = engine_layout();
        let engine = layout.install_root.join("Engine");
        assert_eq!(engine_dir(&layout.install_root).unwrap(), engine);
        assert_eq!(engine_dir(&engine).unwrap(), engine);
    }

    #[test]
    fn missing_batch_files_is_engine_not_found() {
        let layout = engine_layout();
        let err = engine_dir(&layout.project_dir).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::EngineNotFound);
    }

    #[test]
    fn uproject_discovery_picks_first_by_name() {
        let layout = engine_layout();
        std::fs::write(layout.project_dir.join("Another.uproject"), "").unwrap();
        std::fs::write(layout.project_dir.join("notes.txt"), "").unwrap();
        assert_eq!(
            find_uproject(&layout.project_dir).unwrap(),
            layout.project_dir.join("Another.uproject")
        );
    }

    #[test]
    fn missing_uproject_is_reported() {
        let layout = engine_layout();
        let err = find_uproject(&layout.install_root).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::UprojectNotFound);
        let err = find_uproject(&layout.install_root.join("nope")).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::UprojectNotFound);
    }

    #[test]
    fn clean_dir_empties_and_recreates() {
        let layout = engine_layout();
        let cooked = layout.project_dir.join("Saved/Cooked");
        std::fs::create_dir_all(cooked.join("Win64")).unwrap();
        std::fs::write(cooked.join("Win64/data.pak"), "x").unwrap();

        clean_dir(&cooked).unwrap();
        assert!(cooked.is_dir());
        assert_eq!(cooked.read_dir_utf8().unwrap().count(), 0);

        let fresh = layout.project_dir.join("Saved/Staged");
        clean_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
    }
}
