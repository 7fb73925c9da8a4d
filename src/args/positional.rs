//! Positional arguments: a list of log file paths. When none are given,
//! the whole of stdin is one byte stream for the streaming driver, not a
//! sequence of lines each holding their own argument.

use std::path::PathBuf;

use crate::args::Configurable;

/// The positional file path arguments: zero or more paths to search with
/// the random-access driver; zero paths means read stdin with the
/// streaming driver instead.
#[derive(Clone, Debug, Default)]
pub struct Paths(Vec<PathBuf>);

impl Paths {
    /// Returns the collected paths in the order given on the CLI.
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.0
    }
}

impl Configurable for Paths {
    fn configure(
        &mut self,
        _: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Value(ref mut v) => {
                let v = std::mem::take(v);
                self.0.push(PathBuf::from(v));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}
