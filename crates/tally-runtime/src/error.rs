use std::fmt;

/// Result type for tally-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Record store error
    Index(tally_index::Error),

    /// Rejected input (negative count, time moving backwards)
    Types(tally_types::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// Detector source failed to produce a sample
    Source(String),

    /// Log sink failed to accept a record
    Sink(String),

    /// A worker thread or channel peer went away
    Disconnected(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index(err) => write!(f, "Index error: {}", err),
            Error::Types(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Source(msg) => write!(f, "Source error: {}", msg),
            Error::Sink(msg) => write!(f, "Sink error: {}", msg),
            Error::Disconnected(msg) => write!(f, "Disconnected: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index(err) => Some(err),
            Error::Types(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) | Error::Source(_) | Error::Sink(_) | Error::Disconnected(_) => None,
        }
    }
}

impl From<tally_index::Error> for Error {
    fn from(err: tally_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<tally_types::Error> for Error {
    fn from(err: tally_types::Error) -> Self {
        Error::Types(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Source(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
