use agmux_types::AgentKind;

use crate::claude::ClaudeNormalizer;
use crate::codex::CodexNormalizer;
use crate::cursor::CursorNormalizer;
use crate::gemini::GeminiNormalizer;
use crate::normalizer::Normalizer;
use crate::opencode::OpencodeNormalizer;

#[derive(Debug, Clone)]
pub struct KindMetadata {
    pub kind: AgentKind,
    pub program: &'static str,
    pub description: &'static str,
}

const KINDS: &[KindMetadata] = &[
    KindMetadata {
        kind: AgentKind::Claude,
        program: "claude",
        description: "Claude Code CLI",
    },
    KindMetadata {
        kind: AgentKind::Codex,
        program: "codex",
        description: "Codex CLI",
    },
    KindMetadata {
        kind: AgentKind::Gemini,
        program: "gemini",
        description: "Gemini CLI",
    },
    KindMetadata {
        kind: AgentKind::Cursor,
        program: "cursor-agent",
        description: "Cursor Agent CLI",
    },
    KindMetadata {
        kind: AgentKind::Opencode,
        program: "opencode",
        description: "OpenCode CLI",
    },
];

pub fn all_kinds() -> &'static [KindMetadata] {
    KINDS
}

pub fn kind_metadata(kind: AgentKind) -> &'static KindMetadata {
    KINDS
        .iter()
        .find(|m| m.kind == kind)
        .expect("registry covers every AgentKind")
}

/// Environment variable that overrides the program for a kind
/// (e.g. `AGMUX_CODEX_BIN=/opt/codex/bin/codex`)
pub fn program_env_var(kind: AgentKind) -> String {
    format!("AGMUX_{}_BIN", kind.as_str().to_uppercase())
}

/// Program to execute for a kind, honoring the per-kind override
pub fn program_for(kind: AgentKind) -> String {
    std::env::var(program_env_var(kind))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| kind_metadata(kind).program.to_string())
}

/// Fresh normalizer for a kind; one per running agent
pub fn normalizer_for(kind: AgentKind) -> Box<dyn Normalizer> {
    match kind {
        AgentKind::Claude => Box::new(ClaudeNormalizer::new()),
        AgentKind::Codex => Box::new(CodexNormalizer::new()),
        AgentKind::Gemini => Box::new(GeminiNormalizer::new()),
        AgentKind::Cursor => Box::new(CursorNormalizer::new()),
        AgentKind::Opencode => Box::new(OpencodeNormalizer::new()),
    }
}
