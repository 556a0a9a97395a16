use std::fmt;

/// Result type for agmux-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Store layer error
    Store(agmux_store::Error),

    /// Bad spawn arguments (unknown kind, empty fields)
    Validation(String),

    /// Unmet spawn precondition (ralph guard, missing loop file)
    Precondition(String),

    /// The concurrent-agent cap was reached
    PoolExhausted(usize),

    /// The child process could not be started
    Spawn(std::io::Error),

    /// No agent with the given id
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Store(err) => write!(f, "store error: {}", err),
            Error::Validation(msg) => write!(f, "{}", msg),
            Error::Precondition(msg) => write!(f, "{}", msg),
            Error::PoolExhausted(limit) => write!(
                f,
                "agent pool exhausted: {} agents already running; stop some or wait",
                limit
            ),
            Error::Spawn(err) => write!(f, "failed to spawn agent process: {}", err),
            Error::NotFound(id) => write!(f, "agent '{}' not found", id),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            Error::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<agmux_store::Error> for Error {
    fn from(err: agmux_store::Error) -> Self {
        Error::Store(err)
    }
}
