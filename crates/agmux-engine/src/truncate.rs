use regex::Regex;
use std::sync::LazyLock;

/// Display bound for bash commands in API responses
pub const MAX_COMMAND_DISPLAY: usize = 120;

/// Quoted heredoc tags: `<<'EOF'`, `<< "DONE"`, `<<-'END'`
static HEREDOC_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<<(-?)\s*['"](\w+)['"]"#).unwrap());

/// Cosmetic truncation of a bash command for API responses
///
/// Heredoc bodies are dropped (only the first line survives, which names the
/// redirect target) and quoted tags lose their quotes, so
/// `cat <<'EOF' > /tmp/x\n...\nEOF` renders as `cat <<EOF > /tmp/x`.
/// Anything longer than [`MAX_COMMAND_DISPLAY`] is cut with a `...` suffix.
pub fn display_command(command: &str) -> String {
    let first_line = command.lines().next().unwrap_or(command);
    let collapsed = HEREDOC_TAG_RE.replace_all(first_line, "<<$1$2");
    truncate_chars(collapsed.trim_end(), MAX_COMMAND_DISPLAY)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
