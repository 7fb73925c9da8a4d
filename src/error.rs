//! The core error taxonomy.
//!
//! A plain sum type makes illegal states unrepresentable without resorting
//! to out-parameters or negative sentinel values.
//!
//! Argument-parsing failures are represented by `anyhow::Error` at the CLI
//! boundary (`main.rs`) instead of as a variant here, since they only ever
//! arise while parsing flags, which already flows through `anyhow`. I/O
//! failures *are* a variant here (`Error::Io`), carrying the original
//! `std::io::Error` rather than a stringified message, so that `main`'s
//! broken-pipe detection (which downcasts to `std::io::Error`) can still
//! see through it once it's wrapped in `anyhow`.

use std::fmt;

/// An error produced by the core (format compiler, extractor, or search).
#[derive(Debug)]
pub enum Error {
    /// An `strptime`-style format string was malformed: an unterminated
    /// `%`, an unsupported `%O`/`%E` modifier, or an unknown specifier.
    MalformedFormat(String),
    /// The regex emitted by the format compiler was rejected by the regex
    /// engine.
    RegexCompile(String),
    /// The regex engine reported a failure that isn't "no match" and isn't
    /// a malformed-UTF-8 variant.
    MatcherRuntime(String),
    /// Propagated verbatim from an allocation failure.
    OutOfMemory,
    /// A read from the input or a write to standard output failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::MalformedFormat(ref msg) => {
                write!(f, "malformed format string: {msg}")
            }
            Error::RegexCompile(ref msg) => {
                write!(f, "failed to compile generated regex: {msg}")
            }
            Error::MatcherRuntime(ref msg) => {
                write!(f, "regex engine error: {msg}")
            }
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::Io(ref err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
