//! The profile record and the path rules attached to it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::settings::ShareSettings;

/// A named, isolated Factorio data folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique (case-insensitive) name
    pub name: String,
    /// Folder owned exclusively by this profile
    pub path: PathBuf,
    /// What this profile links to the global profile
    #[serde(default)]
    pub sharing: ShareSettings,
}

impl Profile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, sharing: ShareSettings) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sharing,
        }
    }

    /// Case-insensitive name comparison used for every record lookup
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Validate a profile name.
///
/// Any non-blank name is accepted; characters that cannot appear in a folder
/// name are only stripped when the name is turned into a folder leaf.
pub fn validate_profile_name(name: &str) -> crate::error::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::error::ProfileError::Validation(
            "The name cannot be blank or empty!".to_string(),
        ));
    }
    Ok(())
}

/// Strip characters that are illegal in a folder name
pub fn sanitize_folder_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '<' | '>' | ':' | '?' | '|' | '*' | '"'))
        .collect()
}

/// Folder for a profile named `name` inside `parent`
pub fn folder_for(parent: &Path, name: &str) -> PathBuf {
    parent.join(sanitize_folder_name(name))
}

/// Expand environment placeholders in a path.
///
/// Supports `%VAR%`, `$VAR`, `${VAR}` and a leading `~`. Placeholders naming
/// unset variables are left untouched.
pub fn expand_placeholders(raw: &str) -> PathBuf {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    if let Some(suffix) = rest.strip_prefix('~')
        && (suffix.is_empty() || suffix.starts_with('/') || suffix.starts_with('\\'))
        && let Some(home) = directories::BaseDirs::new()
    {
        out.push_str(&home.home_dir().to_string_lossy());
        rest = suffix;
    }

    while let Some(pos) = rest.find(['%', '$']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let (consumed, expansion) = expand_one(tail);
        out.push_str(&expansion);
        rest = &tail[consumed..];
    }
    out.push_str(rest);

    PathBuf::from(out)
}

/// Expand the placeholder at the start of `tail`, returning bytes consumed
fn expand_one(tail: &str) -> (usize, String) {
    let lookup = |name: &str, literal: &str| {
        std::env::var(name).unwrap_or_else(|_| literal.to_string())
    };

    if let Some(body) = tail.strip_prefix('%') {
        if let Some(end) = body.find('%')
            && end > 0
            && is_var_name(&body[..end])
        {
            let len = end + 2;
            return (len, lookup(&body[..end], &tail[..len]));
        }
        return (1, "%".to_string());
    }

    // '$'
    let body = &tail[1..];
    if let Some(braced) = body.strip_prefix('{') {
        if let Some(end) = braced.find('}')
            && end > 0
            && is_var_name(&braced[..end])
        {
            let len = end + 3;
            return (len, lookup(&braced[..end], &tail[..len]));
        }
        return (1, "$".to_string());
    }

    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    if end == 0 {
        return (1, "$".to_string());
    }
    let len = end + 1;
    (len, lookup(&body[..end], &tail[..len]))
}

fn is_var_name(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == ')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_name_validation() {
        assert!(validate_profile_name("vanilla").is_ok());
        assert!(validate_profile_name("modded game").is_ok());
        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name("   ").is_err());
    }

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_folder_name("modded game"), "modded game");
        assert_eq!(sanitize_folder_name(r#"a\b/c<d>e:f?g|h*i"j"#), "abcdefghij");
        assert_eq!(
            folder_for(Path::new("/profiles"), "space/age"),
            PathBuf::from("/profiles/spaceage")
        );
    }

    #[test]
    fn test_names_match_ignores_case() {
        let profile = Profile::new("Vanilla", "/p/vanilla", ShareSettings::default());
        assert!(profile.is_named("vanilla"));
        assert!(profile.is_named("VANILLA"));
        assert!(!profile.is_named("vanilla2"));
    }

    #[test]
    #[serial]
    fn test_expand_placeholders() {
        unsafe { std::env::set_var("FACPROF_TEST_ROOT", "/games") };
        assert_eq!(expand_placeholders("%FACPROF_TEST_ROOT%/p"), PathBuf::from("/games/p"));
        assert_eq!(expand_placeholders("$FACPROF_TEST_ROOT/p"), PathBuf::from("/games/p"));
        assert_eq!(expand_placeholders("${FACPROF_TEST_ROOT}/p"), PathBuf::from("/games/p"));
        unsafe { std::env::remove_var("FACPROF_TEST_ROOT") };
    }

    #[test]
    #[serial]
    fn test_expand_leaves_unknown_and_literals() {
        unsafe { std::env::remove_var("FACPROF_TEST_UNSET") };
        assert_eq!(
            expand_placeholders("%FACPROF_TEST_UNSET%/p"),
            PathBuf::from("%FACPROF_TEST_UNSET%/p")
        );
        assert_eq!(expand_placeholders("/a/100%/b"), PathBuf::from("/a/100%/b"));
        assert_eq!(expand_placeholders("/cost$/x"), PathBuf::from("/cost$/x"));
        assert_eq!(expand_placeholders("/plain/path"), PathBuf::from("/plain/path"));
    }

    #[test]
    fn test_expand_tilde() {
        let home = directories::BaseDirs::new().unwrap().home_dir().to_path_buf();
        assert_eq!(expand_placeholders("~/profiles"), home.join("profiles"));
        assert_eq!(expand_placeholders("~user/x"), PathBuf::from("~user/x"));
    }
}
