use std::path::{Path, PathBuf};

/// Environment variable overriding the store root
pub const STORE_DIR_ENV: &str = "AGMUX_STORE_DIR";

/// Candidate directories for the store root, highest priority first
///
/// Captured as plain data so resolution is testable without touching the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct RootCandidates {
    pub override_dir: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub state_home: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub temp: PathBuf,
}

impl RootCandidates {
    /// Snapshot the real process environment
    pub fn from_env() -> Self {
        Self {
            override_dir: std::env::var(STORE_DIR_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            home: dirs::home_dir(),
            state_home: std::env::var("XDG_STATE_HOME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            cwd: std::env::current_dir().ok(),
            temp: std::env::temp_dir(),
        }
    }

    /// Ordered list: override, canonical home, legacy home, state home,
    /// working directory, temp
    fn ordered(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(dir) = &self.override_dir {
            candidates.push(dir.clone());
        }
        if let Some(home) = &self.home {
            candidates.push(home.join(".agmux").join("agents"));
            candidates.push(home.join(".agent-mux").join("agents"));
        }
        if let Some(state) = &self.state_home {
            candidates.push(state.join("agmux").join("agents"));
        }
        if let Some(cwd) = &self.cwd {
            candidates.push(cwd.join(".agmux").join("agents"));
        }
        candidates.push(self.temp.join("agmux-agents"));
        candidates
    }
}

/// Pick the store root from a candidate list
///
/// A candidate that already holds agent records wins over an empty
/// higher-priority one, so prior state is never silently ignored. Among
/// equally empty candidates the first writable wins.
pub fn resolve_root(candidates: &RootCandidates) -> PathBuf {
    let ordered = candidates.ordered();

    if let Some(existing) = ordered
        .iter()
        .find(|dir| has_agent_records(dir) && is_writable(dir))
    {
        return existing.clone();
    }

    for dir in &ordered {
        if is_writable(dir) {
            return dir.clone();
        }
        tracing::warn!(dir = %dir.display(), "store root candidate not writable");
    }

    // Temp is last in the list; if even that failed we still return it and
    // let the first real write surface the error.
    ordered.last().cloned().unwrap_or_else(std::env::temp_dir)
}

/// Resolve from the real environment
pub fn resolve_store_root() -> PathBuf {
    resolve_root(&RootCandidates::from_env())
}

fn has_agent_records(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .flatten()
        .any(|entry| entry.path().join("meta.json").is_file())
}

fn is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".write-probe");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
