use std::{fmt, path::PathBuf};

/// Failures that end the run with their own exit code.
///
/// Anything that isn't one of these (I/O, a failed build, a bad config file)
/// travels as a plain `anyhow::Error` and exits with [`GENERIC_EXIT_CODE`].
#[derive(Debug)]
pub enum Error {
    Usage(String),
    InvalidExecutable(PathBuf),
    EngineNotFound(String),
    InvalidTag(String),
    MissingBuildFile(PathBuf),
    NoEngine,
    MissingImageName,
}

pub const GENERIC_EXIT_CODE: i32 = 1;

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            Error::InvalidExecutable(_) => 3,
            Error::EngineNotFound(_) => 4,
            Error::InvalidTag(_) => 5,
            Error::MissingBuildFile(_) => 6,
            Error::NoEngine => 7,
            Error::MissingImageName => 8,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "Usage error: {}", msg),
            Error::InvalidExecutable(path) => write!(
                f,
                "Invalid engine executable {:?}: name must contain \"docker\" or \"podman\"",
                path
            ),
            Error::EngineNotFound(name) => write!(f, "Engine executable not found: {}", name),
            Error::InvalidTag(tag) => write!(f, "Invalid tag: {:?}", tag),
            Error::MissingBuildFile(path) => write!(f, "Build file not found: {:?}", path),
            Error::NoEngine => write!(f, "No container engine found (tried docker, podman)"),
            Error::MissingImageName => write!(f, "Missing target image name"),
        }
    }
}

impl std::error::Error for Error {}

/// Pick the process exit code for an error that reached `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>()
        .map(Error::exit_code)
        .unwrap_or(GENERIC_EXIT_CODE)
}
