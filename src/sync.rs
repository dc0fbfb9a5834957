//! Pushing a profile's blueprints back to the global profile.
//!
//! Factorio rewrites `blueprint-storage.dat` as a whole while running, so it
//! cannot be shared through a live link. Instead the active profile's file is
//! copied to the global profile after playing, and copied back in on switch.

use std::fs;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{IoContext, ProfileError, Result};
use crate::fs_utils::{remove_real_item, same_file};
use crate::lifecycle::find_profile;
use crate::profile::Profile;
use crate::settings::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The profile does not share blueprints
    NotShared,
    /// The profile's file already is the global file
    AlreadyLinked,
    Pushed,
}

/// Copy `profile`'s blueprint file over the global one
pub fn sync_blueprints(ctx: &Context<'_>, profile: &Profile) -> Result<SyncOutcome> {
    if !profile.sharing.share_blueprints {
        return Ok(SyncOutcome::NotShared);
    }

    let local = Resource::Blueprints.path_in(&profile.path);
    if !local.is_file() {
        return Err(ProfileError::Invariant(format!(
            "Profile '{}' shares blueprints but has no blueprint file at '{}'",
            profile.name,
            local.display()
        )));
    }

    let global = ctx.paths.global_resource(Resource::Blueprints.file_name());
    if same_file(&local, &global) {
        debug!(path = %local.display(), "blueprints already linked");
        return Ok(SyncOutcome::AlreadyLinked);
    }

    remove_real_item(&global)?;
    fs::create_dir_all(&ctx.paths.global_dir).at("create directory", &ctx.paths.global_dir)?;
    fs::copy(&local, &global).at("copy blueprints to", &global)?;

    info!(name = %profile.name, "pushed blueprints to global profile");
    Ok(SyncOutcome::Pushed)
}

/// Sync whichever profile the active profile pointer names
pub fn sync_active(ctx: &Context<'_>) -> Result<(Profile, SyncOutcome)> {
    let name = ctx.store.active_profile()?.ok_or_else(|| {
        ProfileError::Invariant("There is no active profile on record".to_string())
    })?;

    let profile = find_profile(ctx, &name).map_err(|e| match e {
        ProfileError::NotFound(_) => ProfileError::Invariant(format!(
            "The currently active profile on record is '{}' but it does not exist!",
            name
        )),
        other => other,
    })?;

    let outcome = sync_blueprints(ctx, &profile)?;
    Ok((profile, outcome))
}
