//! Diagnostics for `facprof doctor`.
//!
//! Checks, in order:
//! - the data root and the global profile exist,
//! - the database parses,
//! - Factorio's data directory is a link to a known profile,
//! - the active profile pointer names an existing profile,
//! - every profile folder exists and its resources are linked exactly when
//!   their share flag says so.
//!
//! Nothing is repaired; each step reports pass/warn/fail.

use anstyle::AnsiColor;

use crate::fs_utils::EntryKind;
use crate::paths::Paths;
use crate::profile::{Profile, names_match};
use crate::settings::Resource;
use crate::shell::{GAME_PROCESS, is_process_running};
use crate::store::{Database, RecordStore};
use crate::ui::Ui;

/// Run every check; returns `true` when no step found an issue
pub fn run_doctor(paths: &Paths, store: &dyn RecordStore, ui: &Ui) -> bool {
    ui.section("facprof Doctor");
    ui.newline();

    let mut healthy = true;

    healthy &= check_step(ui, "Directories", || {
        let mut ok = true;
        for (label, dir) in [("Data root", &paths.base_dir), ("Global profile", &paths.global_dir)] {
            if dir.is_dir() {
                ui.println(format!("  {} {} exists: {}", ui.icon_ok(), label, dir.display()));
            } else {
                ui.println(format!("  {} {} missing: {}", ui.icon_err(), label, dir.display()));
                ok = false;
            }
        }
        ok
    });

    let db = match store.load() {
        Ok(db) => {
            check_step(ui, "Database", || {
                ui.println(format!(
                    "  {} Database readable ({} profiles)",
                    ui.icon_ok(),
                    db.profiles.len()
                ));
                true
            });
            db
        }
        Err(e) => {
            check_step(ui, "Database", || {
                ui.println(format!("  {} {}", ui.icon_err(), e));
                false
            });
            // Every later check needs the records
            return false;
        }
    };

    healthy &= check_step(ui, "Active Link", || check_active_link(paths, &db, ui));
    healthy &= check_step(ui, "Active Profile", || check_pointer(&db, ui));

    healthy &= check_step(ui, "Profiles", || {
        if db.profiles.is_empty() {
            ui.println(format!("  {} No profiles found", ui.icon_warn()));
            return true;
        }

        let mut all_valid = true;
        for profile in &db.profiles {
            if !profile.path.is_dir() {
                ui.println(format!(
                    "    {} {} (folder missing: {})",
                    ui.icon_err(),
                    profile.name,
                    profile.path.display()
                ));
                all_valid = false;
                continue;
            }

            let issues = link_issues(profile, paths);
            if issues.is_empty() {
                ui.println(format!("    {} {}", ui.icon_ok(), profile.name));
            } else {
                ui.println(format!("    {} {}", ui.icon_err(), profile.name));
                for issue in issues {
                    ui.println(format!("        {}", ui.dim(issue)));
                }
                all_valid = false;
            }
        }
        all_valid
    });

    check_step(ui, "Game", || {
        if is_process_running(GAME_PROCESS) {
            ui.println(format!(
                "  {} Factorio is running; switching now takes effect on its next start",
                ui.icon_warn()
            ));
        } else {
            ui.println(format!("  {} Factorio is not running", ui.icon_info()));
        }
        true
    });

    healthy
}

fn check_active_link(paths: &Paths, db: &Database, ui: &Ui) -> bool {
    let link = &paths.active_link;
    match EntryKind::detect(link) {
        EntryKind::Missing => {
            ui.println(format!("  {} {} does not exist yet", ui.icon_info(), link.display()));
            true
        }
        EntryKind::Directory | EntryKind::File => {
            ui.println(format!(
                "  {} {} is a real folder (not managed by facprof)",
                ui.icon_warn(),
                link.display()
            ));
            true
        }
        EntryKind::Link { target } => {
            ui.println(format!("  {} Link points to: {}", ui.icon_ok(), target.display()));
            match db.profiles.iter().find(|p| p.path == target) {
                Some(profile) => {
                    ui.println(format!("  {} Target is profile '{}'", ui.icon_ok(), profile.name));
                }
                None => {
                    ui.println(format!(
                        "  {} Target is not a known profile folder",
                        ui.icon_warn()
                    ));
                }
            }
            true
        }
        EntryKind::BrokenLink { target } => {
            ui.println(format!(
                "  {} BROKEN link pointing to: {}",
                ui.icon_err(),
                target.display()
            ));
            false
        }
    }
}

fn check_pointer(db: &Database, ui: &Ui) -> bool {
    let Some(active) = &db.active_profile else {
        ui.println(format!("  {} No active profile set", ui.icon_info()));
        return true;
    };

    if db.profiles.iter().any(|p| names_match(&p.name, active)) {
        ui.println(format!("  {} Active profile: {}", ui.icon_ok(), active));
        true
    } else {
        ui.println(format!(
            "  {} Active profile '{}' does not exist",
            ui.icon_err(),
            active
        ));
        false
    }
}

/// Resources whose link state disagrees with the profile's share flags
pub fn link_issues(profile: &Profile, paths: &Paths) -> Vec<String> {
    let mut issues = Vec::new();

    for resource in Resource::ALL {
        let path = resource.path_in(&profile.path);
        let status = EntryKind::detect(&path);
        let expected = paths.global_resource(resource.file_name());

        match (profile.sharing.get(resource), &status) {
            (true, EntryKind::Link { target }) if *target != expected => issues.push(format!(
                "{} links to {} instead of {}",
                resource.display_name(),
                target.display(),
                expected.display()
            )),
            (true, EntryKind::Link { .. }) => {}
            (true, EntryKind::BrokenLink { target }) => issues.push(format!(
                "{} link is broken ({})",
                resource.display_name(),
                target.display()
            )),
            (true, _) => issues.push(format!(
                "{} is shared but not linked",
                resource.display_name()
            )),
            (false, s) if s.is_link() => issues.push(format!(
                "{} is linked but not shared",
                resource.display_name()
            )),
            (false, _) => {}
        }
    }

    issues
}

fn check_step<F>(ui: &Ui, name: &str, check_fn: F) -> bool
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
    success
}
