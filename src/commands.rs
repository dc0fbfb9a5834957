//! Handlers for each CLI subcommand.
//!
//! This is the coordination layer between the terminal and the core:
//! - `crate::ui` for output,
//! - `crate::prompt` for conflict resolution and confirmations,
//! - `crate::lifecycle`, `crate::switch` and `crate::sync` for the actual work.
//!
//! Core errors convert into `anyhow` here; hints for the user are appended
//! where a fix is obvious.

use anstyle::AnsiColor;
use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::context::Context;
use crate::doctor::run_doctor;
use crate::error::ProfileError;
use crate::lifecycle::{
    create_profile_at, destroy_profile, find_profile, move_profile, rename_profile,
    resolve_input_path, resolve_name_clash, resolve_path_clash, target_folder,
    update_sharing_settings,
};
use crate::link::LinkAction;
use crate::profile::{Profile, expand_placeholders, names_match, validate_profile_name};
use crate::prompt::{Prompter, confirm};
use crate::settings::{Resource, ShareOverrides};
use crate::shell::{GAME_PROCESS, is_process_running, open_folder};
use crate::switch::{SwitchOutcome, switch_to_profile};
use crate::sync::{SyncOutcome, sync_active};
use crate::ui::Ui;

/// List all profiles, or just the named ones
pub fn list(ctx: &Context<'_>, ui: &Ui, names: &[String]) -> Result<()> {
    let mut profiles = ctx.store.profiles()?;

    if profiles.is_empty() {
        ui.warn("No profiles found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} new <name>", ui.bold("facprof")));
        return Ok(());
    }

    if !names.is_empty() {
        for name in names {
            if !profiles.iter().any(|p| p.is_named(name)) {
                ui.warn(format!("Profile '{}' does not exist", name));
            }
        }
        profiles.retain(|p| names.iter().any(|n| p.is_named(n)));
        if profiles.is_empty() {
            return Ok(());
        }
    }
    profiles.sort_by_key(|p| p.name.to_lowercase());

    let active = ctx.store.active_profile()?;
    let is_active = |p: &Profile| active.as_deref().is_some_and(|a| names_match(a, &p.name));

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Shared"),
        ui.header_cell("Path"),
    ]);

    for profile in &profiles {
        let icon = if is_active(profile) { ui.icon_ok() } else { " " };
        let path_cell = if profile.path.is_dir() {
            ui.cell(profile.path.display().to_string())
        } else {
            ui.colored_cell(format!("{} (missing)", profile.path.display()), AnsiColor::Red)
        };

        table.add_row(vec![
            ui.cell(icon),
            ui.cell(&profile.name),
            ui.share_cell(&profile.sharing),
            path_cell,
        ]);
    }

    ui.section("Profiles");
    ui.println(table.to_string());
    let legend: Vec<String> = Resource::ALL
        .iter()
        .map(|r| format!("{}={}", r.code(), r.display_name()))
        .collect();
    ui.println(ui.dim(format!("Shared: {}", legend.join(" "))));
    Ok(())
}

/// Show the defaults for new profiles and the active profile
pub fn show_settings(ctx: &Context<'_>, ui: &Ui) -> Result<()> {
    let db = ctx.store.load()?;

    ui.section("Settings");
    ui.newline();

    let mut table = ui.simple_table();
    table.add_row(vec![
        ui.cell("New profile path:"),
        ui.cell(&db.config.new_profile_path),
    ]);
    let active = match &db.active_profile {
        Some(name) => ui.colored_cell(name, AnsiColor::Green),
        None => ui.cell("(none)"),
    };
    table.add_row(vec![ui.cell("Active profile:"), active]);
    if let Some(updated) = db.updated_at {
        table.add_row(vec![
            ui.cell("Last change:"),
            ui.cell(updated.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    ui.println(table.to_string());
    ui.newline();
    ui.println(ui.bold("Shared by default:"));
    ui.println(ui.share_table(&db.config.new_profile_sharing).to_string());
    Ok(())
}

/// Change the defaults applied to new profiles
pub fn set_settings(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    ui: &Ui,
    path: Option<&str>,
    overrides: ShareOverrides,
) -> Result<()> {
    if path.is_none() && overrides.is_empty() {
        bail!("Nothing to change.\nHint: Pass --path and/or one of the --share-* flags.");
    }

    if let Some(raw) = path {
        let Some(raw) = confirm_default_path(prompter, raw)? else {
            ui.info("Cancelled, nothing was changed");
            return Ok(());
        };
        ctx.store.set_default_path(&raw)?;
        ui.ok(format!("New profiles will be created under '{}'", raw));
    }

    if !overrides.is_empty() {
        let sharing = ctx.store.default_sharing()?.overridden_by(&overrides);
        ctx.store.set_default_sharing(sharing)?;
        ui.ok(format!("New profiles will share: {}", sharing.summary()));
    }

    Ok(())
}

/// Ask what to do while the default path does not exist on disk
fn confirm_default_path(prompter: &dyn Prompter, raw: &str) -> Result<Option<String>> {
    let mut raw = raw.to_string();

    while !expand_placeholders(&raw).is_dir() {
        let prompt = format!("The path '{}' does not exist. Do you want to:", raw);
        let options = ["Provide a new one", "Use it anyway", "Cancel"];
        match prompter.choose(&prompt, &options, 2)? {
            Some(0) => match prompter.input("Please enter a new path")? {
                Some(input) if !input.trim().is_empty() => raw = input,
                Some(_) => {}
                None => return Ok(None),
            },
            Some(1) => break,
            _ => return Ok(None),
        }
    }

    Ok(Some(raw))
}

/// Create a new profile
pub fn new_profile(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    ui: &Ui,
    name: &str,
    path: Option<&str>,
    overrides: ShareOverrides,
) -> Result<()> {
    validate_profile_name(name)?;

    let Some(name) = resolve_name_clash(ctx, prompter, name, None)? else {
        ui.info("Cancelled, nothing was changed");
        return Ok(());
    };
    let target = target_folder(ctx, &name, path)?;
    let Some(target) = resolve_path_clash(ctx, prompter, &target)? else {
        ui.info("Cancelled, nothing was changed");
        return Ok(());
    };

    let sharing = ctx.store.default_sharing()?.overridden_by(&overrides);
    let profile = create_profile_at(ctx, &name, target, sharing)?;

    ui.ok(format!("Created profile '{}'", profile.name));
    ui.println(format!("  Path:   {}", profile.path.display()));
    ui.println(format!("  Shared: {}", profile.sharing.summary()));
    ui.newline();
    ui.println("To activate it:");
    ui.println(format!("  facprof switch \"{}\"", profile.name));
    Ok(())
}

/// Rename, move and re-configure a profile, in that order
pub fn set_profile(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    ui: &Ui,
    name: &str,
    new_name: Option<&str>,
    new_path: Option<&str>,
    overrides: ShareOverrides,
) -> Result<()> {
    if new_name.is_none() && new_path.is_none() && overrides.is_empty() {
        bail!("Nothing to change.\nHint: Pass --name, --path and/or one of the --share-* flags.");
    }
    let mut profile = existing(ctx, name)?;

    if let Some(new_name) = new_name {
        validate_profile_name(new_name)?;
        let Some(new_name) = resolve_name_clash(ctx, prompter, new_name, Some(profile.name.as_str()))?
        else {
            ui.info("Cancelled, nothing was changed");
            return Ok(());
        };
        if new_name != profile.name {
            let old_name = profile.name.clone();
            rename_profile(ctx, &mut profile, &new_name)?;
            ui.ok(format!("Renamed profile '{}' to '{}'", old_name, profile.name));
        }
    }

    if let Some(raw) = new_path {
        let target = resolve_input_path(raw)?;
        if target != profile.path {
            let Some(target) = resolve_path_clash(ctx, prompter, &target)? else {
                ui.info("Cancelled, the folder was not moved");
                return Ok(());
            };
            move_profile(ctx, &mut profile, &target)?;
            ui.ok(format!("Moved profile to '{}'", profile.path.display()));
        }
    }

    if !overrides.is_empty() {
        let wanted = profile.sharing.overridden_by(&overrides);
        let changes = update_sharing_settings(ctx, &mut profile, wanted)?;
        if changes.is_empty() {
            ui.info("Sharing settings unchanged");
        }
        for change in changes {
            let verb = match change.action {
                LinkAction::Linked => "Linked",
                LinkAction::Unlinked => "Unlinked",
            };
            ui.ok(format!("{} {}", verb, change.resource.display_name()));
        }
    }

    Ok(())
}

/// Delete a profile folder and its record
pub fn remove(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    ui: &Ui,
    name: &str,
    yes: bool,
) -> Result<()> {
    let profile = existing(ctx, name)?;

    if !profile.path.exists() {
        ui.warn(format!(
            "The folder '{}' is already missing; only the record will be removed",
            profile.path.display()
        ));
    } else if !yes {
        let prompt = format!(
            "Delete profile '{}' and everything in '{}'?",
            profile.name,
            profile.path.display()
        );
        if !confirm(prompter, &prompt)? {
            ui.info("Cancelled, nothing was changed");
            return Ok(());
        }
    }

    destroy_profile(ctx, &profile)?;
    ui.ok(format!("Removed profile '{}'", profile.name));
    Ok(())
}

/// Make a profile the one Factorio starts with
pub fn switch(ctx: &Context<'_>, prompter: &dyn Prompter, ui: &Ui, name: &str) -> Result<()> {
    let profile = existing(ctx, name)?;
    warn_if_running(ui);

    match switch_to_profile(ctx, prompter, &profile)? {
        SwitchOutcome::Switched => {
            ui.ok(format!("Active profile: {}", profile.name));
            if profile.sharing.share_blueprints {
                ui.println(ui.dim("  Blueprints copied from the global profile"));
            }
        }
        SwitchOutcome::Cancelled => ui.info("Cancelled, nothing was changed"),
    }
    Ok(())
}

/// Push the active profile's blueprints to the global profile
pub fn sync(ctx: &Context<'_>, ui: &Ui) -> Result<()> {
    warn_if_running(ui);

    let spinner = ui.spinner("Syncing blueprints...");
    let (profile, outcome) = match sync_active(ctx) {
        Ok(result) => result,
        Err(e) => {
            ui.spinner_finish_err(&spinner, "Failed to sync blueprints");
            return Err(with_hint(e));
        }
    };

    let msg = match outcome {
        SyncOutcome::Pushed => format!("Blueprints of '{}' copied to the global profile", profile.name),
        SyncOutcome::AlreadyLinked => {
            format!("Blueprints of '{}' already are the global blueprints", profile.name)
        }
        SyncOutcome::NotShared => format!("Profile '{}' does not share blueprints", profile.name),
    };
    ui.spinner_finish_ok(&spinner, msg);
    Ok(())
}

/// Open a profile folder, or the global profile, in the file browser
pub fn open(ctx: &Context<'_>, ui: &Ui, name: Option<&str>, global: bool) -> Result<()> {
    let path: PathBuf = match (name, global) {
        (_, true) => ctx.paths.global_dir.clone(),
        (Some(name), false) => existing(ctx, name)?.path,
        (None, false) => bail!("Which profile?\nHint: Pass a profile name or --global."),
    };

    open_folder(&path)?;
    ui.ok(format!("Opened {}", path.display()));
    Ok(())
}

/// Run diagnostics
pub fn doctor(ctx: &Context<'_>, ui: &Ui) -> Result<()> {
    if run_doctor(ctx.paths, ctx.store, ui) {
        ui.ok("No issues found");
    } else {
        ui.warn("Some checks failed, see above");
    }
    Ok(())
}

fn existing(ctx: &Context<'_>, name: &str) -> Result<Profile> {
    find_profile(ctx, name).map_err(with_hint)
}

fn with_hint(e: ProfileError) -> anyhow::Error {
    match e {
        ProfileError::NotFound(name) => anyhow::anyhow!(
            "Profile '{}' does not exist.\nHint: Use 'facprof list' to see available profiles.",
            name
        ),
        ProfileError::Invariant(msg) => {
            anyhow::anyhow!("{}\nHint: Run 'facprof doctor' to check your setup.", msg)
        }
        other if other.is_conflict() => anyhow::anyhow!(
            "{}\nHint: Choose a different name or path, or remove the existing one first.",
            other
        ),
        other => other.into(),
    }
}

fn warn_if_running(ui: &Ui) {
    if is_process_running(GAME_PROCESS) {
        ui.warn("Factorio is running; changes take effect when it is restarted");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs_utils::EntryKind;
    use crate::store::RecordStore;
    use crate::test_utils::{Fixture, ScriptedPrompter};
    use crate::ui::ColorMode;
    use std::fs;

    fn test_ui() -> Ui {
        Ui::new(ColorMode::Never, false)
    }

    fn share(resource: Resource) -> ShareOverrides {
        let mut overrides = ShareOverrides::default();
        match resource {
            Resource::Config => overrides.config = Some(true),
            Resource::Mods => overrides.mods = Some(true),
            Resource::Saves => overrides.saves = Some(true),
            Resource::Scenarios => overrides.scenarios = Some(true),
            Resource::Blueprints => overrides.blueprints = Some(true),
        }
        overrides
    }

    #[test]
    fn test_list_empty() {
        let fx = Fixture::new();
        assert!(list(&fx.ctx(), &test_ui(), &[]).is_ok());
    }

    #[test]
    fn test_new_and_list() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        let prompter = ScriptedPrompter::default();

        new_profile(&ctx, &prompter, &ui, "modded", None, share(Resource::Mods)).unwrap();

        let profile = fx.store.profile("modded").unwrap().unwrap();
        assert!(profile.sharing.share_mods);
        assert!(list(&ctx, &ui, &["modded".to_string(), "ghost".to_string()]).is_ok());
    }

    #[test]
    fn test_new_uses_default_sharing() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        let prompter = ScriptedPrompter::default();
        let defaults_dir = fx.root().join("games");
        fs::create_dir_all(&defaults_dir).unwrap();

        set_settings(
            &ctx,
            &prompter,
            &ui,
            Some(defaults_dir.to_str().unwrap()),
            share(Resource::Saves),
        )
        .unwrap();
        new_profile(&ctx, &prompter, &ui, "p", None, ShareOverrides::default()).unwrap();

        let profile = fx.store.profile("p").unwrap().unwrap();
        assert_eq!(profile.path, defaults_dir.join("p"));
        assert!(profile.sharing.share_saves);
        assert_eq!(prompter.asked.get(), 0);
    }

    #[test]
    fn test_new_duplicate_cancelled() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        new_profile(&ctx, &ScriptedPrompter::default(), &ui, "work", None, ShareOverrides::default())
            .unwrap();

        let prompter = ScriptedPrompter::choices([Some(2)]);
        new_profile(&ctx, &prompter, &ui, "WORK", None, ShareOverrides::default()).unwrap();

        assert_eq!(prompter.asked.get(), 1);
        assert_eq!(fx.store.names().unwrap(), vec!["work".to_string()]);
    }

    #[test]
    fn test_new_in_global_profile_keeps_shared_data() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let shared_save = fx.paths.global_dir.join("saves/base.zip");
        fs::create_dir_all(shared_save.parent().unwrap()).unwrap();
        fs::write(&shared_save, b"save").unwrap();
        let global = fx.paths.global_dir.to_string_lossy().into_owned();

        let prompter = ScriptedPrompter::choices([Some(1)]);
        let result =
            new_profile(&ctx, &prompter, &test_ui(), "x", Some(&global), ShareOverrides::default());

        assert!(result.is_err());
        assert!(shared_save.is_file());
        assert!(fx.store.names().unwrap().is_empty());
    }

    #[test]
    fn test_set_missing_default_path_prompts() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        let missing = fx.root().join("not-there");

        let prompter = ScriptedPrompter::choices([Some(2)]);
        set_settings(&ctx, &prompter, &ui, missing.to_str(), ShareOverrides::default()).unwrap();
        assert_ne!(fx.store.default_path().unwrap(), missing.to_str().unwrap());

        let prompter = ScriptedPrompter::choices([Some(1)]);
        set_settings(&ctx, &prompter, &ui, missing.to_str(), ShareOverrides::default()).unwrap();
        assert_eq!(fx.store.default_path().unwrap(), missing.to_str().unwrap());
    }

    #[test]
    fn test_set_without_changes_fails() {
        let fx = Fixture::new();
        let prompter = ScriptedPrompter::default();
        let ui = test_ui();
        assert!(set_settings(&fx.ctx(), &prompter, &ui, None, ShareOverrides::default()).is_err());
        assert!(
            set_profile(&fx.ctx(), &prompter, &ui, "p", None, None, ShareOverrides::default())
                .is_err()
        );
    }

    #[test]
    fn test_set_profile_renames_then_relinks() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        let prompter = ScriptedPrompter::default();
        new_profile(&ctx, &prompter, &ui, "old", None, ShareOverrides::default()).unwrap();

        set_profile(&ctx, &prompter, &ui, "old", Some("new"), None, share(Resource::Config))
            .unwrap();

        let profile = fx.store.profile("new").unwrap().unwrap();
        assert!(profile.sharing.share_config);
        assert!(EntryKind::detect(&profile.path.join("config")).is_link());
        assert!(fx.store.profile("old").unwrap().is_none());
    }

    #[test]
    fn test_remove_with_confirmation() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        new_profile(&ctx, &ScriptedPrompter::default(), &ui, "p", None, ShareOverrides::default())
            .unwrap();

        let declined = ScriptedPrompter::choices([Some(1)]);
        remove(&ctx, &declined, &ui, "p", false).unwrap();
        assert!(fx.store.contains("p").unwrap());

        remove(&ctx, &ScriptedPrompter::default(), &ui, "p", true).unwrap();
        assert!(!fx.store.contains("p").unwrap());
    }

    #[test]
    fn test_switch_nonexistent() {
        let fx = Fixture::new();
        let err = switch(&fx.ctx(), &ScriptedPrompter::default(), &test_ui(), "nope").unwrap_err();
        assert!(err.to_string().contains("Hint"));
    }

    #[test]
    fn test_switch_then_sync() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let ui = test_ui();
        let prompter = ScriptedPrompter::default();
        assert!(sync(&ctx, &ui).is_err());

        new_profile(&ctx, &prompter, &ui, "p", None, ShareOverrides::default()).unwrap();
        switch(&ctx, &prompter, &ui, "p").unwrap();

        assert_eq!(fx.store.active_profile().unwrap().as_deref(), Some("p"));
        // Not sharing blueprints is a successful no-op
        sync(&ctx, &ui).unwrap();
    }

    #[test]
    fn test_open_requires_target() {
        let fx = Fixture::new();
        assert!(open(&fx.ctx(), &test_ui(), None, false).is_err());
        assert!(open(&fx.ctx(), &test_ui(), Some("ghost"), false).is_err());
    }

    #[test]
    fn test_show_settings_and_doctor() {
        let fx = Fixture::new();
        assert!(show_settings(&fx.ctx(), &test_ui()).is_ok());
        assert!(doctor(&fx.ctx(), &test_ui()).is_ok());
    }
}
