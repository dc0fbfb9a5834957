//! Linking a single profile resource to the global profile.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IoContext, Result};
use crate::fs_utils::{EntryKind, remove_link, remove_real_item};
use crate::settings::{LinkKind, Resource};

/// Capability for creating kind-typed filesystem links
pub trait LinkCreator {
    /// Create a link at `link` pointing at `target`
    fn create_link(&self, link: &Path, target: &Path, kind: LinkKind) -> Result<()>;
}

/// Native symbolic links
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkCreator;

impl LinkCreator for SymlinkCreator {
    fn create_link(&self, link: &Path, target: &Path, kind: LinkKind) -> Result<()> {
        #[cfg(unix)]
        {
            // Unix symlinks are untyped
            let _ = kind;
            std::os::unix::fs::symlink(target, link).at("create link", link)
        }

        #[cfg(windows)]
        {
            match kind {
                LinkKind::Dir => std::os::windows::fs::symlink_dir(target, link),
                LinkKind::File => std::os::windows::fs::symlink_file(target, link),
            }
            .at("create link", link)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Linked,
    Unlinked,
}

/// One filesystem change made while bringing a resource to its desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    pub resource: Resource,
    pub action: LinkAction,
    pub path: PathBuf,
}

/// Bring `resource` inside `profile_dir` to the requested link state.
///
/// Linking deletes whatever real file or directory is in the way; that data
/// is gone for good. Unlinking removes only the link entry and leaves nothing
/// in its place, Factorio recreates the resource on its next start.
pub fn ensure_link_state(
    links: &dyn LinkCreator,
    profile_dir: &Path,
    resource: Resource,
    should_link: bool,
    global_dir: &Path,
) -> Result<Option<LinkChange>> {
    let link_path = resource.path_in(profile_dir);
    let status = EntryKind::detect(&link_path);

    let action = match (should_link, status.is_link()) {
        (true, false) => {
            if !status.is_missing() {
                debug!(path = %link_path.display(), "deleting unshared {} before linking", resource);
                remove_real_item(&link_path)?;
            }

            let target = resource.path_in(global_dir);
            if resource.kind() == LinkKind::Dir && !target.exists() {
                fs::create_dir_all(&target).at("create directory", &target)?;
            }

            links.create_link(&link_path, &target, resource.kind())?;
            debug!(link = %link_path.display(), target = %target.display(), "linked {}", resource);
            LinkAction::Linked
        }
        (false, true) => {
            remove_link(&link_path)?;
            debug!(link = %link_path.display(), "unlinked {}", resource);
            LinkAction::Unlinked
        }
        _ => return Ok(None),
    };

    Ok(Some(LinkChange {
        resource,
        action,
        path: link_path,
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::CountingLinks;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let profile = temp_dir.path().join("profiles/vanilla");
        let global = temp_dir.path().join("profiles/global");
        fs::create_dir_all(&profile).unwrap();
        fs::create_dir_all(&global).unwrap();
        (temp_dir, profile, global)
    }

    #[test]
    fn test_link_into_empty_slot() {
        let (_temp, profile, global) = setup();

        let change = ensure_link_state(&SymlinkCreator, &profile, Resource::Mods, true, &global)
            .unwrap()
            .unwrap();

        assert_eq!(change.action, LinkAction::Linked);
        assert_eq!(
            EntryKind::detect(&profile.join("mods")).target(),
            Some(global.join("mods").as_path())
        );
        // The global directory is created so the link resolves
        assert!(global.join("mods").is_dir());
    }

    #[test]
    fn test_link_replaces_real_directory() {
        let (_temp, profile, global) = setup();
        fs::create_dir_all(profile.join("saves")).unwrap();
        fs::write(profile.join("saves/local.zip"), "local").unwrap();
        fs::create_dir_all(global.join("saves")).unwrap();
        fs::write(global.join("saves/shared.zip"), "shared").unwrap();

        ensure_link_state(&SymlinkCreator, &profile, Resource::Saves, true, &global).unwrap();

        assert!(EntryKind::detect(&profile.join("saves")).is_link());
        assert!(profile.join("saves/shared.zip").exists());
        assert!(!profile.join("saves/local.zip").exists());
    }

    #[test]
    fn test_file_link_does_not_create_target() {
        let (_temp, profile, global) = setup();

        ensure_link_state(&SymlinkCreator, &profile, Resource::Blueprints, true, &global).unwrap();

        let status = EntryKind::detect(&profile.join("blueprint-storage.dat"));
        assert!(matches!(status, EntryKind::BrokenLink { .. }));
        assert!(!global.join("blueprint-storage.dat").exists());
    }

    #[test]
    fn test_unlink_leaves_nothing_and_keeps_global() {
        let (_temp, profile, global) = setup();
        fs::create_dir_all(global.join("config")).unwrap();
        fs::write(global.join("config/config.ini"), "ini").unwrap();
        ensure_link_state(&SymlinkCreator, &profile, Resource::Config, true, &global).unwrap();

        let change = ensure_link_state(&SymlinkCreator, &profile, Resource::Config, false, &global)
            .unwrap()
            .unwrap();

        assert_eq!(change.action, LinkAction::Unlinked);
        assert!(EntryKind::detect(&profile.join("config")).is_missing());
        assert!(global.join("config/config.ini").exists());
    }

    #[test]
    fn test_already_in_state_is_noop() {
        let (_temp, profile, global) = setup();
        let links = CountingLinks::default();
        fs::create_dir_all(profile.join("scenarios")).unwrap();

        // Real content and not shared: untouched
        let change =
            ensure_link_state(&links, &profile, Resource::Scenarios, false, &global).unwrap();
        assert!(change.is_none());
        assert!(profile.join("scenarios").is_dir());

        fs::remove_dir(profile.join("scenarios")).unwrap();
        ensure_link_state(&links, &profile, Resource::Scenarios, true, &global).unwrap();
        let change =
            ensure_link_state(&links, &profile, Resource::Scenarios, true, &global).unwrap();
        assert!(change.is_none());
        assert_eq!(links.count(), 1);
    }

    #[test]
    fn test_create_failure_reports_path() {
        let (_temp, profile, global) = setup();
        let missing_profile = profile.join("does-not-exist");

        let err = ensure_link_state(&SymlinkCreator, &missing_profile, Resource::Mods, true, &global)
            .unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
