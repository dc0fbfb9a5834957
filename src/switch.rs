//! Profile switching logic.
//!
//! Factorio reads its user data directory at startup. Switching a profile
//! replaces that directory with a link to the profile folder:
//! - the target folder is validated before anything is touched,
//! - an old link is simply removed, a real directory only after confirmation,
//! - the new link is created and the active profile pointer recorded,
//! - shared blueprints are copied in from the global profile.
//!
//! The old link is removed before the new one is created, so there is a
//! short window with no active link at all but never two.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{IoContext, ProfileError, Result};
use crate::fs_utils::{EntryKind, remove_link, remove_real_item, same_file};
use crate::profile::{Profile, names_match};
use crate::prompt::{Prompter, confirm};
use crate::settings::{LinkKind, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// The user declined to delete a real directory at the link location
    Cancelled,
}

/// Make `profile` the active profile
pub fn switch_to_profile(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    profile: &Profile,
) -> Result<SwitchOutcome> {
    if !profile.path.is_dir() {
        return Err(ProfileError::Invariant(format!(
            "The profile folder '{}' could not be located!",
            profile.path.display()
        )));
    }

    let link = &ctx.paths.active_link;
    let status = EntryKind::detect(link);
    match &status {
        EntryKind::Missing => {}
        EntryKind::Link { .. } | EntryKind::BrokenLink { .. } => remove_link(link)?,
        EntryKind::Directory | EntryKind::File => {
            let prompt = format!(
                "'{}' is a real folder, not a profile link. Delete it and everything in it?",
                link.display()
            );
            if !confirm(prompter, &prompt)? {
                return Ok(SwitchOutcome::Cancelled);
            }
            remove_real_item(link)?;
        }
    }

    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).at("create directory", parent)?;
    }
    ctx.links.create_link(link, &profile.path, LinkKind::Dir)?;
    ctx.store.set_active_profile(Some(&profile.name))?;

    if profile.sharing.share_blueprints {
        pull_blueprints(ctx, profile)?;
    }

    info!(name = %profile.name, link = %link.display(), "switched profile");
    Ok(SwitchOutcome::Switched)
}

/// Copy the global blueprint file over the profile's own copy
fn pull_blueprints(ctx: &Context<'_>, profile: &Profile) -> Result<()> {
    let global = ctx.paths.global_resource(Resource::Blueprints.file_name());
    let local = Resource::Blueprints.path_in(&profile.path);

    if !global.is_file() {
        return Err(ProfileError::Invariant(format!(
            "Profile '{}' shares blueprints but there is no global blueprint file at '{}'",
            profile.name,
            global.display()
        )));
    }

    // Copying a file onto itself would truncate it
    if same_file(&global, &local) {
        debug!(path = %local.display(), "blueprints already linked");
        return Ok(());
    }
    if EntryKind::detect(&local).is_link() {
        remove_link(&local)?;
    }

    fs::copy(&global, &local).at("copy blueprints to", &local)?;
    debug!(from = %global.display(), to = %local.display(), "pulled blueprints");
    Ok(())
}

/// Clear the active pointer (and link) if they refer to `profile`
pub(crate) fn forget_active(ctx: &Context<'_>, profile: &Profile) -> Result<()> {
    let Some(active) = ctx.store.active_profile()? else {
        return Ok(());
    };
    if !names_match(&active, &profile.name) {
        return Ok(());
    }

    if link_points_at(&ctx.paths.active_link, &profile.path) {
        remove_link(&ctx.paths.active_link)?;
    }
    ctx.store.set_active_profile(None)?;
    debug!(name = %profile.name, "cleared active profile");
    Ok(())
}

/// Carry the active pointer (and link) over to a renamed or moved profile
pub(crate) fn follow_active(
    ctx: &Context<'_>,
    old_name: &str,
    old_path: &Path,
    profile: &Profile,
) -> Result<()> {
    let Some(active) = ctx.store.active_profile()? else {
        return Ok(());
    };
    if !names_match(&active, old_name) {
        return Ok(());
    }

    let link = &ctx.paths.active_link;
    if old_path != profile.path && link_points_at(link, old_path) {
        remove_link(link)?;
        ctx.links.create_link(link, &profile.path, LinkKind::Dir)?;
    }
    ctx.store.set_active_profile(Some(&profile.name))?;
    debug!(name = %profile.name, "active profile follows");
    Ok(())
}

fn link_points_at(link: &Path, path: &Path) -> bool {
    EntryKind::detect(link).target() == Some(path)
}
