use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Whether a link points at a directory or a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Dir,
    File,
}

/// Resources a profile may share with the global profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Config,
    Mods,
    Saves,
    Scenarios,
    Blueprints,
}

impl Resource {
    /// All resources, in reconciliation order
    pub const ALL: [Resource; 5] = [
        Resource::Config,
        Resource::Mods,
        Resource::Saves,
        Resource::Scenarios,
        Resource::Blueprints,
    ];

    /// Name of the entry inside a profile folder
    pub fn file_name(&self) -> &'static str {
        match self {
            Resource::Config => "config",
            Resource::Mods => "mods",
            Resource::Saves => "saves",
            Resource::Scenarios => "scenarios",
            Resource::Blueprints => "blueprint-storage.dat",
        }
    }

    pub fn kind(&self) -> LinkKind {
        match self {
            Resource::Blueprints => LinkKind::File,
            _ => LinkKind::Dir,
        }
    }

    /// Location of this resource inside `profile_dir`
    pub fn path_in(&self, profile_dir: &Path) -> PathBuf {
        profile_dir.join(self.file_name())
    }

    /// Single-letter code used in compact listings
    pub fn code(&self) -> &'static str {
        match self {
            Resource::Config => "C",
            Resource::Mods => "M",
            Resource::Saves => "S",
            Resource::Scenarios => "N",
            Resource::Blueprints => "B",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::Config => "Config",
            Resource::Mods => "Mods",
            Resource::Saves => "Saves",
            Resource::Scenarios => "Scenarios",
            Resource::Blueprints => "Blueprints",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "config" => Ok(Resource::Config),
            "mods" => Ok(Resource::Mods),
            "saves" => Ok(Resource::Saves),
            "scenarios" => Ok(Resource::Scenarios),
            "blueprints" => Ok(Resource::Blueprints),
            _ => Err(format!("Unknown resource: {}", s)),
        }
    }
}

/// Which resources a profile links to the global profile.
///
/// This is a plain `Copy` value: a settings object read from the store is
/// never an alias of the stored one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShareSettings {
    pub share_config: bool,
    pub share_mods: bool,
    pub share_saves: bool,
    pub share_scenarios: bool,
    pub share_blueprints: bool,
}

impl ShareSettings {
    pub fn get(&self, resource: Resource) -> bool {
        match resource {
            Resource::Config => self.share_config,
            Resource::Mods => self.share_mods,
            Resource::Saves => self.share_saves,
            Resource::Scenarios => self.share_scenarios,
            Resource::Blueprints => self.share_blueprints,
        }
    }

    pub fn set(&mut self, resource: Resource, shared: bool) {
        match resource {
            Resource::Config => self.share_config = shared,
            Resource::Mods => self.share_mods = shared,
            Resource::Saves => self.share_saves = shared,
            Resource::Scenarios => self.share_scenarios = shared,
            Resource::Blueprints => self.share_blueprints = shared,
        }
    }

    /// Copy of `self` with `resource` set to `shared`
    pub fn with(mut self, resource: Resource, shared: bool) -> Self {
        self.set(resource, shared);
        self
    }

    /// Apply only the flags that were explicitly given
    pub fn overridden_by(mut self, overrides: &ShareOverrides) -> Self {
        for resource in Resource::ALL {
            if let Some(shared) = overrides.get(resource) {
                self.set(resource, shared);
            }
        }
        self
    }

    /// Shared resources, in reconciliation order
    pub fn shared(&self) -> Vec<Resource> {
        Resource::ALL
            .into_iter()
            .filter(|r| self.get(*r))
            .collect()
    }

    /// "Config, Mods" style summary, or "N/A" when nothing is shared
    pub fn summary(&self) -> String {
        let shared = self.shared();
        if shared.is_empty() {
            return "N/A".to_string();
        }
        shared
            .iter()
            .map(|r| r.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One letter per shared resource, e.g. "C M . . B"
    pub fn short_codes(&self) -> String {
        Resource::ALL
            .iter()
            .map(|r| if self.get(*r) { r.code() } else { "." })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Per-flag overrides given on the command line; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareOverrides {
    pub config: Option<bool>,
    pub mods: Option<bool>,
    pub saves: Option<bool>,
    pub scenarios: Option<bool>,
    pub blueprints: Option<bool>,
}

impl ShareOverrides {
    pub fn get(&self, resource: Resource) -> Option<bool> {
        match resource {
            Resource::Config => self.config,
            Resource::Mods => self.mods,
            Resource::Saves => self.saves,
            Resource::Scenarios => self.scenarios,
            Resource::Blueprints => self.blueprints,
        }
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|r| self.get(*r).is_none())
    }
}
