//! Applying a change of sharing settings to a profile folder.

use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::link::{LinkChange, LinkCreator, ensure_link_state};
use crate::settings::{Resource, ShareSettings};

/// Add or remove links for every flag that differs between `old` and `new`.
///
/// Resources are processed in [`Resource::ALL`] order. Unchanged flags are
/// never looked at, so applying identical settings touches nothing. A failure
/// stops the walk; links already changed in this call stay changed.
pub fn apply_settings_diff(
    links: &dyn LinkCreator,
    profile_dir: &Path,
    global_dir: &Path,
    old: ShareSettings,
    new: ShareSettings,
) -> Result<Vec<LinkChange>> {
    let mut changes = Vec::new();

    for resource in Resource::ALL {
        let wanted = new.get(resource);
        if old.get(resource) == wanted {
            continue;
        }

        debug!(%resource, shared = wanted, "sharing changed");
        if let Some(change) = ensure_link_state(links, profile_dir, resource, wanted, global_dir)? {
            changes.push(change);
        }
    }

    Ok(changes)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs_utils::EntryKind;
    use crate::link::LinkAction;
    use crate::test_utils::CountingLinks;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let profile = temp_dir.path().join("modded");
        let global = temp_dir.path().join("global");
        fs::create_dir_all(&profile).unwrap();
        fs::create_dir_all(&global).unwrap();
        (temp_dir, profile, global)
    }

    fn all_true() -> ShareSettings {
        Resource::ALL
            .into_iter()
            .fold(ShareSettings::default(), |s, r| s.with(r, true))
    }

    #[test]
    fn test_only_changed_flags_are_applied() {
        let (_temp, profile, global) = setup();
        let links = CountingLinks::default();
        let new = ShareSettings::default()
            .with(Resource::Mods, true)
            .with(Resource::Blueprints, true);

        let changes =
            apply_settings_diff(&links, &profile, &global, ShareSettings::default(), new).unwrap();

        let touched: Vec<_> = changes.iter().map(|c| c.resource).collect();
        assert_eq!(touched, vec![Resource::Mods, Resource::Blueprints]);
        assert_eq!(links.count(), 2);
        assert!(EntryKind::detect(&profile.join("config")).is_missing());
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let pairs = [
            (ShareSettings::default(), all_true()),
            (all_true(), ShareSettings::default()),
            (
                ShareSettings::default().with(Resource::Saves, true),
                ShareSettings::default().with(Resource::Config, true),
            ),
        ];

        for (old, new) in pairs {
            let (_temp, profile, global) = setup();
            let links = CountingLinks::default();
            apply_settings_diff(&links, &profile, &global, ShareSettings::default(), old).unwrap();
            apply_settings_diff(&links, &profile, &global, old, new).unwrap();
            let before = links.count();

            let second = apply_settings_diff(&links, &profile, &global, new, new).unwrap();
            assert!(second.is_empty());
            assert_eq!(links.count(), before);
        }
    }

    #[test]
    fn test_toggle_on_then_off_leaves_nothing() {
        for resource in Resource::ALL {
            let (_temp, profile, global) = setup();
            let off = ShareSettings::default();
            let on = off.with(resource, true);

            apply_settings_diff(&CountingLinks::default(), &profile, &global, off, on).unwrap();
            assert!(EntryKind::detect(&resource.path_in(&profile)).is_link());

            let changes =
                apply_settings_diff(&CountingLinks::default(), &profile, &global, on, off).unwrap();
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].action, LinkAction::Unlinked);
            assert!(EntryKind::detect(&resource.path_in(&profile)).is_missing());
        }
    }

    #[test]
    fn test_enabling_blueprints_links_existing_global_file() {
        let (_temp, profile, global) = setup();
        fs::write(global.join("blueprint-storage.dat"), "global bp").unwrap();
        fs::create_dir(profile.join("saves")).unwrap();

        let old = ShareSettings::default();
        let new = old.with(Resource::Blueprints, true);
        let changes = apply_settings_diff(&CountingLinks::default(), &profile, &global, old, new)
            .unwrap();

        assert_eq!(changes.len(), 1);
        let bp = profile.join("blueprint-storage.dat");
        assert!(matches!(EntryKind::detect(&bp), EntryKind::Link { .. }));
        assert_eq!(fs::read_to_string(&bp).unwrap(), "global bp");
        assert!(profile.join("saves").is_dir());
    }
}
