use regex::Regex;
use std::sync::LazyLock;

/// File operation inferred from a shell command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFileOp {
    Read,
    Write,
    Create,
    Delete,
}

/// One inferred path-level effect of a shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredFileOp {
    pub op: ShellFileOp,
    pub path: String,
}

/// Redirect targets: `> path` and `>> path`, but not heredoc `<<` markers
/// and not `>&2`-style descriptor duplication. The char before `>` is
/// captured so stripping a redirect leaves the preceding word intact.
static REDIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|([^<>]))>{1,2}\s*([^\s;|&<>]+)").unwrap());

/// Segment separators for compound commands
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&&|\|\||;|\|").unwrap());

/// Infer file reads/writes/creates/deletes from common shell patterns
///
/// Covers `cat`, `>`/`>>` redirects, heredocs, `rm`, `mv`, `cp`, and `touch`.
/// Inference is best-effort text analysis; unrecognized constructs contribute
/// nothing.
pub fn infer_file_ops(command: &str) -> Vec<InferredFileOp> {
    let mut ops: Vec<InferredFileOp> = Vec::new();

    // Heredoc bodies are data, not commands; only the first line carries
    // the program and its redirect target.
    let first_line = command.lines().next().unwrap_or(command);

    for segment in SEPARATOR_RE.split(first_line) {
        let redirect_target = REDIRECT_RE
            .captures(segment)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string())
            .filter(|p| is_plausible_path(p));

        if let Some(target) = &redirect_target {
            push_op(&mut ops, ShellFileOp::Write, target);
        }

        // Strip redirects before tokenizing so targets are not re-counted
        // as positional arguments.
        let stripped = REDIRECT_RE.replace_all(segment, "${1} ");
        let tokens: Vec<&str> = stripped.split_whitespace().collect();
        let Some((program, args)) = split_program(&tokens) else {
            continue;
        };

        let heredoc = segment.contains("<<");
        let paths: Vec<&str> = args
            .iter()
            .copied()
            .filter(|a| is_plausible_path(a))
            .collect();

        match program {
            "cat" => {
                if !heredoc {
                    for path in &paths {
                        push_op(&mut ops, ShellFileOp::Read, path);
                    }
                }
            }
            "rm" => {
                for path in &paths {
                    push_op(&mut ops, ShellFileOp::Delete, path);
                }
            }
            "mv" | "cp" => {
                if let Some((dest, sources)) = paths.split_last() {
                    for src in sources {
                        push_op(&mut ops, ShellFileOp::Read, src);
                    }
                    push_op(&mut ops, ShellFileOp::Write, dest);
                }
            }
            "touch" => {
                for path in &paths {
                    push_op(&mut ops, ShellFileOp::Create, path);
                }
            }
            _ => {}
        }
    }

    ops
}

/// Skip leading env assignments and `sudo`, returning (program, args)
fn split_program<'a>(tokens: &[&'a str]) -> Option<(&'a str, Vec<&'a str>)> {
    let mut iter = tokens.iter().copied().peekable();
    while let Some(&tok) = iter.peek() {
        if tok == "sudo" || (tok.contains('=') && !tok.starts_with('-')) {
            iter.next();
        } else {
            break;
        }
    }
    let program = iter.next()?;
    let program = program.rsplit('/').next().unwrap_or(program);
    Some((program, iter.collect()))
}

fn is_plausible_path(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('-')
        && !token.starts_with('$')
        && !token.starts_with('<')
        && !token.chars().all(|c| c.is_ascii_digit())
        && token != "/dev/null"
}

fn push_op(ops: &mut Vec<InferredFileOp>, op: ShellFileOp, path: &str) {
    let candidate = InferredFileOp {
        op,
        path: path.to_string(),
    };
    if !ops.contains(&candidate) {
        ops.push(candidate);
    }
}
