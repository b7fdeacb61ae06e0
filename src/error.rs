use std::io;
use std::path::PathBuf;

/// Errors from opening, reading, writing, or sizing a gzip-compressed
/// line stream. `Usage` maps to exit code 2, everything else to 1.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Input or temp file could not be opened, or isn't a valid compressed stream.
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Read/write failure mid-stream.
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Malformed compressed input.
    #[error("malformed compressed data in {}: {source}", path.display())]
    Decode { path: PathBuf, source: io::Error },

    /// Presort buffer allocation failed.
    #[error("could not allocate {requested} bytes for the presort buffer")]
    Resource { requested: usize },

    /// Bad flags or argument count.
    #[error("{0}")]
    Usage(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            _ => 1,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Open { path: path.into(), source }
    }

    pub fn decode(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Decode { path: path.into(), source }
    }
}

/// Usage errors are built up from plain strings; this lets call sites use
/// `format!(...).into()` or `?` from a `String`-returning validator.
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Usage(msg)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
