use aegis_app_core::{profile_configs, profile_platforms, FilePersistence, ProfilesRepo};
use aegis_core::Profile;
use aegis_infra::tools::{engine_dir, find_uproject};
use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

pub struct ProfileManager {
    persistence: FilePersistence,
}

impl ProfileManager {
    pub fn new() -> Self {
        Self::with_persistence(FilePersistence::new())
    }

    pub fn with_persistence(persistence: FilePersistence) -> Self {
        Self { persistence }
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        self.persistence.load()
    }

    /// Match on display name, nickname or project name, ignoring case.
    pub fn find(&self, name: &str) -> Result<Profile> {
        self.list()?
            .into_iter()
            .find(|p| matches_name(p, name))
            .ok_or_else(|| anyhow!("Profile '{}' not found", name))
    }

    /// Validate the paths and store a new profile.
    pub fn add(&self, profile: Profile) -> Result<Profile> {
        engine_dir(&profile.engine_root)?;
        find_uproject(&profile.project_dir)?;

        let mut profiles = self.list()?;
        let name = profile.display_name();
        if profiles.iter().any(|p| p.display_name().eq_ignore_ascii_case(&name)) {
            return Err(anyhow!(
                "A profile named '{}' already exists (set a nickname to tell them apart)",
                name
            ));
        }

        profiles.push(profile.clone());
        self.persistence.save(&profiles)?;
        Ok(profile)
    }

    pub fn remove(&self, name: &str) -> Result<Profile> {
        let mut profiles = self.list()?;
        let index = profiles
            .iter()
            .position(|p| matches_name(p, name))
            .ok_or_else(|| anyhow!("Profile '{}' not found", name))?;
        let removed = profiles.remove(index);
        self.persistence.save(&profiles)?;
        Ok(removed)
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_name(profile: &Profile, name: &str) -> bool {
    let name = name.trim();
    profile.display_name().eq_ignore_ascii_case(name)
        || (!profile.nickname.trim().is_empty()
            && profile.nickname.trim().eq_ignore_ascii_case(name))
        || profile.project_name().eq_ignore_ascii_case(name)
}

pub fn handle_list(mgr: &ProfileManager) -> Result<()> {
    let profiles = mgr.list()?;

    if profiles.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    println!("{:<24} {:<40} {:<40}", "NAME", "ENGINE", "PROJECT");
    println!("{:-<24} {:-<40} {:-<40}", "", "", "");
    for p in profiles {
        println!(
            "{:<24} {:<40} {:<40}",
            p.display_name(),
            p.engine_root,
            p.project_dir
        );
    }

    Ok(())
}

pub fn handle_add(
    mgr: &ProfileManager,
    engine_root: Utf8PathBuf,
    project_dir: Utf8PathBuf,
    nickname: Option<String>,
    configs: Vec<String>,
    platforms: Vec<String>,
) -> Result<()> {
    let mut profile = Profile::new(engine_root, project_dir);
    profile.nickname = nickname.unwrap_or_default();
    profile.build_configs = configs;
    profile.build_platforms = platforms;
    let p = mgr.add(profile)?;
    println!("Profile '{}' created successfully.", p.display_name());
    Ok(())
}

pub fn handle_import(mgr: &ProfileManager, path: &Utf8Path) -> Result<()> {
    let profile = Profile::load(path)?;
    let p = mgr.add(profile)?;
    println!("Profile '{}' imported from {}.", p.display_name(), path);
    Ok(())
}

pub fn handle_export(mgr: &ProfileManager, name: &str, path: &Utf8Path) -> Result<()> {
    let profile = mgr.find(name)?;
    profile
        .save(path)
        .with_context(|| format!("Failed to export profile '{name}'"))?;
    println!("Profile '{}' written to {}.", profile.display_name(), path);
    Ok(())
}

pub fn handle_remove(mgr: &ProfileManager, name: &str) -> Result<()> {
    let p = mgr.remove(name)?;
    println!("Profile '{}' removed.", p.display_name());
    Ok(())
}

pub fn handle_show(mgr: &ProfileManager, name: &str) -> Result<()> {
    let p = mgr.find(name)?;
    println!(":: {}", p.display_name());
    println!("   Engine:    {}", p.engine_root);
    println!("   Project:   {}", p.project_dir);
    match find_uproject(&p.project_dir) {
        Ok(uproject) => println!("   uproject:  {}", uproject),
        Err(e) => println!("   uproject:  ({e})"),
    }
    println!("   Configs:   {}", profile_configs(&p).join(", "));
    println!("   Platforms: {}", profile_platforms(&p).join(", "));
    Ok(())
}
