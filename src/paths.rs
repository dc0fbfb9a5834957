use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// All computed paths used by facprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// <data_dir>/facprof
    pub base_dir: PathBuf,
    /// <data_dir>/facprof/database.json
    pub database_file: PathBuf,
    /// <data_dir>/facprof/profiles
    pub profiles_dir: PathBuf,
    /// <data_dir>/facprof/profiles/global
    pub global_dir: PathBuf,
    /// Factorio's user data directory; the active profile link lives here
    pub active_link: PathBuf,
}

impl Paths {
    /// Resolve paths from the platform directories, honouring overrides.
    pub fn new(home: Option<PathBuf>, factorio_dir: Option<PathBuf>) -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;

        let base_dir = home.unwrap_or_else(|| base_dirs.data_dir().join("facprof"));
        let active_link = factorio_dir.unwrap_or_else(|| default_factorio_dir(&base_dirs));

        Ok(Self::from_base(base_dir, active_link))
    }

    /// Lay out every managed path under `base_dir`.
    pub fn from_base(base_dir: PathBuf, active_link: PathBuf) -> Self {
        let database_file = base_dir.join("database.json");
        let profiles_dir = base_dir.join("profiles");
        let global_dir = profiles_dir.join("global");

        Self {
            base_dir,
            database_file,
            profiles_dir,
            global_dir,
            active_link,
        }
    }

    /// Get the path to a resource inside the global profile
    pub fn global_resource(&self, file_name: &str) -> PathBuf {
        self.global_dir.join(file_name)
    }

    /// Check if a path is the global profile or lies within it
    pub fn is_in_global_dir(&self, path: &Path) -> bool {
        path.starts_with(&self.global_dir)
    }

    /// Ensure the data root and the global profile exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.global_dir).with_context(|| {
            format!(
                "Failed to create global profile directory: {:?}",
                self.global_dir
            )
        })?;
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn default_factorio_dir(base_dirs: &BaseDirs) -> PathBuf {
    base_dirs.data_dir().join("Factorio")
}

#[cfg(target_os = "macos")]
fn default_factorio_dir(base_dirs: &BaseDirs) -> PathBuf {
    base_dirs.data_dir().join("factorio")
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_factorio_dir(base_dirs: &BaseDirs) -> PathBuf {
    base_dirs.home_dir().join(".factorio")
}
