use std::path::{Path, PathBuf};

use agmux_providers::LOOP_FILE;

use crate::error::{Error, Result};

/// Directories a ralph-mode agent must never be pointed at
const SYSTEM_DIRS: &[&str] = &[
    "/", "/bin", "/boot", "/dev", "/etc", "/lib", "/lib64", "/opt", "/proc", "/root", "/sbin",
    "/srv", "/sys", "/usr", "/var",
];

/// Guard a ralph-mode spawn: cwd required, not $HOME or a system directory,
/// loop file present
///
/// Returns the canonicalized working directory. Runs before any agent record
/// is created, so a tripped guard leaves no trace in the store.
pub(crate) fn validate_ralph_cwd(cwd: Option<&str>) -> Result<PathBuf> {
    let cwd = cwd
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::Precondition("ralph mode requires an explicit cwd".to_string()))?;

    let resolved = std::fs::canonicalize(cwd)
        .map_err(|_| Error::Precondition(format!("cwd '{}' does not exist", cwd)))?;

    if let Some(home) = dirs::home_dir()
        && let Ok(home) = std::fs::canonicalize(&home)
        && resolved == home
    {
        return Err(Error::Precondition(format!(
            "refusing ralph mode in home directory '{}'",
            resolved.display()
        )));
    }

    if SYSTEM_DIRS.iter().any(|d| resolved == Path::new(d)) {
        return Err(Error::Precondition(format!(
            "refusing ralph mode in system directory '{}'",
            resolved.display()
        )));
    }

    if !resolved.join(LOOP_FILE).is_file() {
        return Err(Error::Precondition(format!(
            "ralph mode requires {} in '{}'",
            LOOP_FILE,
            resolved.display()
        )));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cwd_is_rejected() {
        assert!(validate_ralph_cwd(None).is_err());
        assert!(validate_ralph_cwd(Some("  ")).is_err());
    }

    #[test]
    fn nonexistent_cwd_is_rejected() {
        assert!(validate_ralph_cwd(Some("/definitely/not/a/dir")).is_err());
    }

    #[test]
    fn system_directory_is_rejected() {
        let err = validate_ralph_cwd(Some("/etc")).unwrap_err();
        assert!(err.to_string().contains("system directory"));
    }

    #[test]
    fn home_directory_is_rejected() {
        if let Some(home) = dirs::home_dir() {
            let err = validate_ralph_cwd(Some(&home.display().to_string())).unwrap_err();
            assert!(err.to_string().contains("home directory"));
        }
    }

    #[test]
    fn loop_file_is_required_then_sufficient() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().display().to_string();

        let err = validate_ralph_cwd(Some(&dir)).unwrap_err();
        assert!(err.to_string().contains(LOOP_FILE));

        std::fs::write(tmp.path().join(LOOP_FILE), b"- [ ] finish the thing\n").unwrap();
        assert!(validate_ralph_cwd(Some(&dir)).is_ok());
    }
}
