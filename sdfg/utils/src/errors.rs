//! Error type for the SDFG engine.

/// Convenience wrapper for results that use [`Error`].
pub type SdfgResult<T> = Result<T, Error>;

#[derive(Clone, PartialEq, Eq)]
enum ErrorKind {
    /// The graph under construction violates a structural precondition,
    /// e.g. an edge referencing a node that is not in the graph.
    MalformedStructure(String),
    /// A lookup by name or id found nothing.
    Undefined(String),
    /// A combinational loop was found during path expansion. Non-fatal:
    /// the offending branch is abandoned and the traversal continues.
    CombinationalLoop(String),
    /// The input file could not be read or is not an SDFG document.
    InvalidFile(String),
    /// The XML document is syntactically or structurally unusable.
    ParseError(String),
    /// Writing the output failed.
    WriteError(String),
}

/// Errors reported by graph construction, analysis, and serialization.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn malformed_structure<S: ToString>(msg: S) -> Self {
        Self {
            kind: ErrorKind::MalformedStructure(msg.to_string()),
        }
    }

    pub fn undefined<S: ToString>(name: S) -> Self {
        Self {
            kind: ErrorKind::Undefined(name.to_string()),
        }
    }

    pub fn combinational_loop<S: ToString>(path: S) -> Self {
        Self {
            kind: ErrorKind::CombinationalLoop(path.to_string()),
        }
    }

    pub fn invalid_file<S: ToString>(msg: S) -> Self {
        Self {
            kind: ErrorKind::InvalidFile(msg.to_string()),
        }
    }

    pub fn parse_error<S: ToString>(msg: S) -> Self {
        Self {
            kind: ErrorKind::ParseError(msg.to_string()),
        }
    }

    pub fn write_error<S: ToString>(msg: S) -> Self {
        Self {
            kind: ErrorKind::WriteError(msg.to_string()),
        }
    }

    /// True for the loop diagnostic produced by the path engine.
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, ErrorKind::CombinationalLoop(_))
    }

    /// Symbolic code for the diagnostic category.
    pub fn code(&self) -> &'static str {
        match &self.kind {
            ErrorKind::MalformedStructure(_) => "malformed-structure",
            ErrorKind::Undefined(_) => "undefined",
            ErrorKind::CombinationalLoop(_) => "combinational-loop",
            ErrorKind::InvalidFile(_) => "invalid-file",
            ErrorKind::ParseError(_) => "parse-error",
            ErrorKind::WriteError(_) => "write-error",
        }
    }

    fn message(&self) -> &str {
        match &self.kind {
            ErrorKind::MalformedStructure(m)
            | ErrorKind::Undefined(m)
            | ErrorKind::CombinationalLoop(m)
            | ErrorKind::InvalidFile(m)
            | ErrorKind::ParseError(m)
            | ErrorKind::WriteError(m) => m,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::invalid_file(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::write_error(err.to_string())
    }
}
