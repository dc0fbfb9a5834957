//! Creating, renaming, moving, re-configuring and destroying profiles.
//!
//! Every operation mutates the disk first and only then the record store,
//! so a failed filesystem step never leaves a record pointing at a folder
//! that was not moved or created.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::context::Context;
use crate::error::{IoContext, ProfileError, Result};
use crate::fs_utils::remove_real_item;
use crate::link::LinkChange;
use crate::profile::{Profile, expand_placeholders, folder_for, names_match, validate_profile_name};
use crate::prompt::{Prompter, Resolution};
use crate::reconcile::apply_settings_diff;
use crate::settings::ShareSettings;
use crate::switch::{forget_active, follow_active};

/// Where a new profile named `name` goes when no path is given
pub fn default_folder(ctx: &Context<'_>, name: &str) -> Result<PathBuf> {
    let root = expand_placeholders(&ctx.store.default_path()?);
    absolute(&folder_for(&root, name))
}

/// Expand placeholders in a user-typed path and anchor it at the working
/// directory; profile paths are always stored absolute.
pub fn resolve_input_path(raw: &str) -> Result<PathBuf> {
    absolute(&expand_placeholders(raw))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).at("resolve path", path)
}

/// Create a profile folder, link its shared resources and record it.
///
/// `path` is used verbatim (after placeholder expansion) when given. Name
/// clashes are not checked here; callers resolve them first, see
/// [`resolve_name_clash`].
pub fn create_profile(
    ctx: &Context<'_>,
    name: &str,
    path: Option<&str>,
    sharing: ShareSettings,
) -> Result<Profile> {
    validate_profile_name(name)?;
    let path = target_folder(ctx, name, path)?;
    create_profile_at(ctx, name, path, sharing)
}

/// Folder a new profile would get: `raw` expanded, or the default folder
pub fn target_folder(ctx: &Context<'_>, name: &str, raw: Option<&str>) -> Result<PathBuf> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => resolve_input_path(raw),
        _ => default_folder(ctx, name),
    }
}

/// [`create_profile`] with the folder already resolved
pub fn create_profile_at(
    ctx: &Context<'_>,
    name: &str,
    path: PathBuf,
    sharing: ShareSettings,
) -> Result<Profile> {
    validate_profile_name(name)?;
    let path = absolute(&path)?;
    check_target_path(ctx, &path)?;

    fs::create_dir_all(&path).at("create profile folder", &path)?;
    apply_settings_diff(
        ctx.links,
        &path,
        &ctx.paths.global_dir,
        ShareSettings::default(),
        sharing,
    )?;

    let profile = Profile::new(name, path, sharing);
    ctx.store.add_profile(&profile)?;

    info!(name, path = %profile.path.display(), shared = %sharing.summary(), "created profile");
    Ok(profile)
}

/// Rename a profile; its folder is renamed to the sanitised new name.
pub fn rename_profile(ctx: &Context<'_>, profile: &mut Profile, new_name: &str) -> Result<()> {
    validate_profile_name(new_name)?;
    if let Some(other) = ctx.store.profile(new_name)?
        && !names_match(&other.name, &profile.name)
    {
        return Err(ProfileError::NameTaken(new_name.to_string()));
    }

    let parent = profile.path.parent().ok_or_else(|| {
        ProfileError::Validation(format!(
            "The profile folder '{}' has no parent folder",
            profile.path.display()
        ))
    })?;
    let new_path = folder_for(parent, new_name);

    if new_path != profile.path {
        check_target_path(ctx, &new_path)?;
        fs::rename(&profile.path, &new_path).at("move profile folder", &profile.path)?;
    }

    let old_name = profile.name.clone();
    let old_path = std::mem::replace(&mut profile.path, new_path);
    ctx.store.update_profile_name(&old_name, new_name)?;
    ctx.store.update_profile_path(new_name, &profile.path)?;
    profile.name = new_name.to_string();

    follow_active(ctx, &old_name, &old_path, profile)?;
    info!(from = %old_name, to = %profile.name, "renamed profile");
    Ok(())
}

/// Move a profile's folder to `new_path`.
///
/// Parent folders are created as needed and removed again if the move fails.
pub fn move_profile(ctx: &Context<'_>, profile: &mut Profile, new_path: &Path) -> Result<()> {
    let new_path = absolute(new_path)?;
    check_target_path(ctx, &new_path)?;
    if new_path.starts_with(&profile.path) {
        return Err(ProfileError::Validation(format!(
            "Cannot move the profile folder '{}' into itself",
            profile.path.display()
        )));
    }

    let created = new_path
        .ancestors()
        .skip(1)
        .take_while(|dir| fs::symlink_metadata(dir).is_err())
        .last()
        .map(Path::to_path_buf);
    if let Some(parent) = new_path.parent() {
        fs::create_dir_all(parent).at("create directory", parent)?;
    }

    let moved = fs::rename(&profile.path, &new_path).at("move profile folder", &profile.path);
    if moved.is_err()
        && let Some(dir) = &created
        && let Err(e) = fs::remove_dir_all(dir)
    {
        warn!(path = %dir.display(), error = %e, "could not remove created folders");
    }
    moved?;

    let old_path = std::mem::replace(&mut profile.path, new_path);
    ctx.store.update_profile_path(&profile.name, &profile.path)?;

    follow_active(ctx, &profile.name, &old_path, profile)?;
    info!(name = %profile.name, from = %old_path.display(), to = %profile.path.display(), "moved profile");
    Ok(())
}

/// Link or unlink resources so the profile matches `new`, then record it.
pub fn update_sharing_settings(
    ctx: &Context<'_>,
    profile: &mut Profile,
    new: ShareSettings,
) -> Result<Vec<LinkChange>> {
    let old = profile.sharing;
    let changes = apply_settings_diff(ctx.links, &profile.path, &ctx.paths.global_dir, old, new)?;

    ctx.store.update_profile_sharing(&profile.name, new)?;
    profile.sharing = new;

    info!(name = %profile.name, shared = %new.summary(), changes = changes.len(), "updated sharing");
    Ok(changes)
}

/// Delete a profile's folder and its record.
///
/// A folder that is already gone is not an error, so a stale record can
/// always be removed.
pub fn destroy_profile(ctx: &Context<'_>, profile: &Profile) -> Result<()> {
    if fs::symlink_metadata(&profile.path).is_ok() {
        fs::remove_dir_all(&profile.path).at("delete profile folder", &profile.path)?;
    } else {
        warn!(path = %profile.path.display(), "profile folder already missing");
    }

    forget_active(ctx, profile)?;
    ctx.store.remove_profile(&profile.name)?;

    info!(name = %profile.name, "destroyed profile");
    Ok(())
}

/// Look a profile up by name, failing when it does not exist
pub fn find_profile(ctx: &Context<'_>, name: &str) -> Result<Profile> {
    ctx.store
        .profile(name)?
        .ok_or_else(|| ProfileError::NotFound(name.to_string()))
}

/// Ask until `name` no longer clashes with an existing profile.
///
/// `renaming` is the profile being renamed, which never clashes with itself.
/// Returns `None` when the user cancels.
pub fn resolve_name_clash(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    name: &str,
    renaming: Option<&str>,
) -> Result<Option<String>> {
    let mut name = name.to_string();

    loop {
        let Some(existing) = ctx.store.profile(&name)? else {
            return Ok(Some(name));
        };
        if renaming.is_some_and(|r| names_match(r, &existing.name)) {
            return Ok(Some(name));
        }

        let prompt = format!("The name '{}' is already taken. Do you want to:", name);
        match Resolution::ask(prompter, &prompt)? {
            Resolution::ProvideNew => {
                let Some(input) =
                    prompter.input(&format!("Please enter a new name which is not '{}'", name))?
                else {
                    return Ok(None);
                };
                if !input.trim().is_empty() {
                    name = input;
                }
            }
            Resolution::Overwrite => destroy_profile(ctx, &existing)?,
            Resolution::Cancel => return Ok(None),
        }
    }
}

/// Ask until `path` is free. Returns `None` when the user cancels.
///
/// A path that overlaps the global profile or belongs to another profile
/// fails before anything is offered for overwriting.
pub fn resolve_path_clash(
    ctx: &Context<'_>,
    prompter: &dyn Prompter,
    path: &Path,
) -> Result<Option<PathBuf>> {
    let mut path = absolute(path)?;

    loop {
        check_path_claim(ctx, &path)?;
        if fs::symlink_metadata(&path).is_err() {
            return Ok(Some(path));
        }

        let prompt = format!("The path '{}' already exists. Do you want to:", path.display());
        match Resolution::ask(prompter, &prompt)? {
            Resolution::ProvideNew => {
                let Some(input) = prompter.input(&format!(
                    "Please enter a new path which is not '{}'",
                    path.display()
                ))?
                else {
                    return Ok(None);
                };
                if !input.trim().is_empty() {
                    path = resolve_input_path(&input)?;
                }
            }
            Resolution::Overwrite => remove_real_item(&path)?,
            Resolution::Cancel => return Ok(None),
        }
    }
}

/// Fails when `path` overlaps the global profile or is another profile's folder
fn check_path_claim(ctx: &Context<'_>, path: &Path) -> Result<()> {
    if ctx.paths.is_in_global_dir(path) || ctx.paths.global_dir.starts_with(path) {
        return Err(ProfileError::Validation(format!(
            "The path '{}' overlaps the global profile at '{}'",
            path.display(),
            ctx.paths.global_dir.display()
        )));
    }
    if let Some(owner) = ctx.store.profiles()?.into_iter().find(|p| p.path == path) {
        return Err(ProfileError::Validation(format!(
            "The path '{}' already belongs to profile '{}'",
            path.display(),
            owner.name
        )));
    }
    Ok(())
}

/// A profile folder must be new and unclaimed
fn check_target_path(ctx: &Context<'_>, path: &Path) -> Result<()> {
    check_path_claim(ctx, path)?;
    if fs::symlink_metadata(path).is_ok() {
        return Err(ProfileError::PathExists(path.to_path_buf()));
    }
    Ok(())
}
