use agmux_types::{AgentKind, Effort, Mode};

use crate::registry::program_for;

/// File that must exist in the working directory for ralph mode
pub const LOOP_FILE: &str = "LOOP.md";

/// A fully resolved child-process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Build the argument vector for a kind, selecting flags by mode and effort
///
/// The prompt is passed verbatim as a single argument; callers wrap it with
/// [`ralph_preamble`] before this point when mode is ralph.
pub fn build_command(kind: AgentKind, prompt: &str, mode: Mode, effort: Effort) -> CommandSpec {
    let program = program_for(kind);
    let args = match kind {
        AgentKind::Claude => claude_args(prompt, mode),
        AgentKind::Codex => codex_args(prompt, mode, effort),
        AgentKind::Gemini => gemini_args(prompt, mode),
        AgentKind::Cursor => cursor_args(prompt, mode),
        AgentKind::Opencode => opencode_args(prompt, mode),
    };
    CommandSpec { program, args }
}

fn claude_args(prompt: &str, mode: Mode) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        prompt.to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ];
    match mode {
        Mode::Plan => args.extend(["--permission-mode".into(), "plan".into()]),
        Mode::Edit => args.extend(["--permission-mode".into(), "acceptEdits".into()]),
        Mode::Ralph => args.push("--dangerously-skip-permissions".into()),
    }
    args
}

fn codex_args(prompt: &str, mode: Mode, effort: Effort) -> Vec<String> {
    let mut args = vec!["exec".to_string(), "--json".to_string()];
    match mode {
        Mode::Plan => args.extend(["--sandbox".into(), "read-only".into()]),
        Mode::Edit => args.push("--full-auto".into()),
        Mode::Ralph => args.push("--dangerously-bypass-approvals-and-sandbox".into()),
    }
    match effort {
        Effort::Fast => args.extend(["-c".into(), "model_reasoning_effort=low".into()]),
        Effort::Default => {}
        Effort::Detailed => args.extend(["-c".into(), "model_reasoning_effort=high".into()]),
    }
    args.push(prompt.to_string());
    args
}

fn gemini_args(prompt: &str, mode: Mode) -> Vec<String> {
    let mut args = vec![
        "--prompt".to_string(),
        prompt.to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
    ];
    match mode {
        Mode::Plan => args.extend(["--approval-mode".into(), "default".into()]),
        Mode::Edit => args.extend(["--approval-mode".into(), "auto_edit".into()]),
        Mode::Ralph => args.push("--yolo".into()),
    }
    args
}

fn cursor_args(prompt: &str, mode: Mode) -> Vec<String> {
    let mut args = vec![
        "-p".to_string(),
        prompt.to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
    ];
    match mode {
        Mode::Plan => {}
        Mode::Edit | Mode::Ralph => args.push("--force".into()),
    }
    args
}

fn opencode_args(prompt: &str, mode: Mode) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--format".to_string(),
        "json".to_string(),
    ];
    match mode {
        Mode::Plan => args.extend(["--agent".into(), "plan".into()]),
        Mode::Edit | Mode::Ralph => args.extend(["--agent".into(), "build".into()]),
    }
    args.push(prompt.to_string());
    args
}

/// Autonomy preamble wrapped around a ralph-mode prompt
///
/// References the loop file the agent is expected to keep re-reading.
pub fn ralph_preamble(prompt: &str) -> String {
    format!(
        "You are running unattended in a loop. Read {loop_file} in the current \
         directory before doing anything else; it is your persistent task list \
         and the source of truth for what remains. Work on the next unfinished \
         item, update {loop_file} to record progress, and keep going until every \
         item is done.\n\nOperator instructions:\n{prompt}",
        loop_file = LOOP_FILE,
        prompt = prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lands_in_one_slot() {
        let spec = build_command(
            AgentKind::Codex,
            "add login; fix the tests",
            Mode::Edit,
            Effort::Default,
        );
        assert_eq!(spec.program, "codex");
        assert_eq!(
            spec.args.iter().filter(|a| a.contains("add login")).count(),
            1
        );
        assert!(spec.args.contains(&"--json".to_string()));
        assert!(spec.args.contains(&"--full-auto".to_string()));
    }

    #[test]
    fn effort_maps_to_codex_reasoning_flag() {
        let spec = build_command(AgentKind::Codex, "p", Mode::Plan, Effort::Detailed);
        assert!(
            spec.args
                .contains(&"model_reasoning_effort=high".to_string())
        );
        assert!(spec.args.contains(&"read-only".to_string()));
    }

    #[test]
    fn ralph_mode_selects_autonomy_flags() {
        let spec = build_command(AgentKind::Claude, "p", Mode::Ralph, Effort::Default);
        assert!(
            spec.args
                .contains(&"--dangerously-skip-permissions".to_string())
        );

        let preamble = ralph_preamble("ship it");
        assert!(preamble.contains(LOOP_FILE));
        assert!(preamble.ends_with("ship it"));
    }
}
