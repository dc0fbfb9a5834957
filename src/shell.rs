//! Interaction with the desktop and the running system.

use std::path::Path;

use anyhow::{Context, Result, bail};
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

/// Executable name of the game, without extension
pub const GAME_PROCESS: &str = "factorio";

/// Open `path` in the platform file browser
pub fn open_folder(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!(
            "The folder '{}' does not exist.\nHint: Run 'facprof doctor' to check your profiles.",
            path.display()
        );
    }

    debug!(path = %path.display(), "opening file browser");
    open::that(path).with_context(|| format!("Failed to open folder: {}", path.display()))
}

/// Whether a process named `name` (case-insensitive, `.exe` optional) is running
pub fn is_process_running(name: &str) -> bool {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    sys.processes()
        .values()
        .any(|process| process_name_matches(&process.name().to_string_lossy(), name))
}

fn process_name_matches(process: &str, wanted: &str) -> bool {
    let process = process.to_lowercase();
    let process = process.strip_suffix(".exe").unwrap_or(&process);
    process == wanted.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_process_name_matches() {
        assert!(process_name_matches("factorio", GAME_PROCESS));
        assert!(process_name_matches("Factorio.exe", GAME_PROCESS));
        assert!(!process_name_matches("factorio-server-manager", GAME_PROCESS));
        assert!(!process_name_matches("steam", GAME_PROCESS));
    }

    #[test]
    fn test_unlikely_process_is_not_running() {
        assert!(!is_process_running("facprof-no-such-process-name"));
    }

    #[test]
    fn test_open_missing_folder_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = open_folder(&temp_dir.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
