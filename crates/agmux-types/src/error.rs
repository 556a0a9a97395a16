use std::fmt;

/// Result type for agmux-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// Agent kind string not in the supported set
    UnknownKind(String),

    /// Mode string not in {plan, edit, ralph}
    UnknownMode(String),

    /// Effort string not in {fast, default, detailed}
    UnknownEffort(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownKind(s) => write!(
                f,
                "unknown agent type '{}' (expected one of: claude, codex, gemini, cursor, opencode)",
                s
            ),
            Error::UnknownMode(s) => {
                write!(f, "invalid mode '{}' (expected: plan, edit, ralph)", s)
            }
            Error::UnknownEffort(s) => {
                write!(f, "invalid effort '{}' (expected: fast, default, detailed)", s)
            }
        }
    }
}

impl std::error::Error for Error {}
