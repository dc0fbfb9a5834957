//! Persistent profile records and module-wide defaults.
//!
//! The core never touches the database file directly; it goes through
//! [`RecordStore`]. Every call is a whole-document read-modify-write, so
//! two calls are never transactional with respect to each other.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoContext, ProfileError, Result};
use crate::profile::Profile;
use crate::settings::ShareSettings;

const DATABASE_VERSION: &str = "1.0";

/// Module-wide defaults applied to new profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Folder under which new profiles are created; may contain placeholders
    pub new_profile_path: String,
    pub new_profile_sharing: ShareSettings,
}

/// The whole database document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub config: ModuleConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Database {
    /// The document written on first use
    pub fn initial(default_profiles_dir: &Path) -> Self {
        Self {
            version: DATABASE_VERSION.to_string(),
            updated_at: None,
            config: ModuleConfig {
                new_profile_path: default_profiles_dir.to_string_lossy().into_owned(),
                new_profile_sharing: ShareSettings::default(),
            },
            active_profile: None,
            profiles: Vec::new(),
        }
    }

    fn find(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.is_named(name))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Profile> {
        self.profiles
            .iter_mut()
            .find(|p| p.is_named(name))
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }
}

/// CRUD over profile records, module defaults and the active profile pointer
pub trait RecordStore {
    /// Read-only access to the current document
    fn load(&self) -> Result<Database>;

    /// Apply `f` to the document and persist it
    fn modify(&self, f: &mut dyn FnMut(&mut Database) -> Result<()>) -> Result<()>;

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.profiles.into_iter().map(|p| p.name).collect())
    }

    fn profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.load()?.profiles)
    }

    /// Case-insensitive lookup; `None` when nothing matches
    fn profile(&self, name: &str) -> Result<Option<Profile>> {
        Ok(self.load()?.find(name).cloned())
    }

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.profile(name)?.is_some())
    }

    fn add_profile(&self, profile: &Profile) -> Result<()> {
        self.modify(&mut |db| {
            db.profiles.push(profile.clone());
            Ok(())
        })
    }

    fn remove_profile(&self, name: &str) -> Result<()> {
        self.modify(&mut |db| {
            let before = db.profiles.len();
            db.profiles.retain(|p| !p.is_named(name));
            if db.profiles.len() == before {
                return Err(ProfileError::NotFound(name.to_string()));
            }
            Ok(())
        })
    }

    fn update_profile_name(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.modify(&mut |db| {
            db.find_mut(old_name)?.name = new_name.to_string();
            Ok(())
        })
    }

    fn update_profile_path(&self, name: &str, path: &Path) -> Result<()> {
        self.modify(&mut |db| {
            db.find_mut(name)?.path = path.to_path_buf();
            Ok(())
        })
    }

    fn update_profile_sharing(&self, name: &str, sharing: ShareSettings) -> Result<()> {
        self.modify(&mut |db| {
            db.find_mut(name)?.sharing = sharing;
            Ok(())
        })
    }

    fn default_path(&self) -> Result<String> {
        Ok(self.load()?.config.new_profile_path)
    }

    fn set_default_path(&self, path: &str) -> Result<()> {
        self.modify(&mut |db| {
            db.config.new_profile_path = path.to_string();
            Ok(())
        })
    }

    fn default_sharing(&self) -> Result<ShareSettings> {
        Ok(self.load()?.config.new_profile_sharing)
    }

    fn set_default_sharing(&self, sharing: ShareSettings) -> Result<()> {
        self.modify(&mut |db| {
            db.config.new_profile_sharing = sharing;
            Ok(())
        })
    }

    fn active_profile(&self) -> Result<Option<String>> {
        Ok(self.load()?.active_profile)
    }

    fn set_active_profile(&self, name: Option<&str>) -> Result<()> {
        self.modify(&mut |db| {
            db.active_profile = name.map(str::to_string);
            Ok(())
        })
    }
}

/// Database kept in a JSON file, locked for the duration of each call
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    default_profiles_dir: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>, default_profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_profiles_dir: default_profiles_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Database> {
        if content.trim().is_empty() {
            return Ok(Database::initial(&self.default_profiles_dir));
        }
        serde_json::from_str(content).map_err(|e| ProfileError::Store {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn open_locked(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).at("create database directory", parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .at("open database", &self.path)?;

        file.lock_exclusive().at("lock database", &self.path)?;
        Ok(file)
    }
}

impl RecordStore for JsonStore {
    fn load(&self) -> Result<Database> {
        if !self.path.exists() {
            return Ok(Database::initial(&self.default_profiles_dir));
        }
        let content = std::fs::read_to_string(&self.path).at("read database", &self.path)?;
        self.parse(&content)
    }

    fn modify(&self, f: &mut dyn FnMut(&mut Database) -> Result<()>) -> Result<()> {
        let mut file = self.open_locked()?;
        let result = self.modify_locked(&mut file, f);
        // Release the lock (ignore errors during unlock)
        let _ = FileExt::unlock(&file);
        result
    }
}

impl JsonStore {
    fn modify_locked(
        &self,
        file: &mut File,
        f: &mut dyn FnMut(&mut Database) -> Result<()>,
    ) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .at("read database", &self.path)?;

        let mut db = self.parse(&content)?;
        f(&mut db)?;
        db.updated_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(&db).map_err(|e| ProfileError::Store {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        file.set_len(0).at("truncate database", &self.path)?;
        file.seek(SeekFrom::Start(0)).at("seek database", &self.path)?;
        file.write_all(content.as_bytes())
            .at("write database", &self.path)?;
        file.sync_all().at("sync database", &self.path)
    }
}

/// In-memory store with the same contract as [`JsonStore`]
#[derive(Debug)]
pub struct MemoryStore {
    db: RefCell<Database>,
}

impl MemoryStore {
    pub fn new(default_profiles_dir: &Path) -> Self {
        Self {
            db: RefCell::new(Database::initial(default_profiles_dir)),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Database> {
        Ok(self.db.borrow().clone())
    }

    fn modify(&self, f: &mut dyn FnMut(&mut Database) -> Result<()>) -> Result<()> {
        // Mutate a copy so a failing closure leaves the store untouched.
        let mut db = self.db.borrow().clone();
        f(&mut db)?;
        db.updated_at = Some(Utc::now());
        *self.db.borrow_mut() = db;
        Ok(())
    }
}
