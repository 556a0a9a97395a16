use agmux_types::{AgentEvent, AgentKind};
use agmux_providers::normalizer_for;
use std::path::Path;

/// Run a fixture file line-by-line through the kind's normalizer
pub fn normalize_fixture(kind: AgentKind, fixture: &str) -> Vec<AgentEvent> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(fixture);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {} unreadable: {}", path.display(), e));

    let mut normalizer = normalizer_for(kind);
    let mut events = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let raw: serde_json::Value = serde_json::from_str(line).expect("fixture line is JSON");
        events.extend(normalizer.normalize(&raw));
    }
    events
}
