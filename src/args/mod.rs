//! CLI argument parsing: a `Configurable` trait and dispatch loop built on
//! `lexopt`. This crate has a single flat command surface, so there is no
//! per-subcommand usage snipping: `-?`/`--help` always prints the full
//! flag table.

use std::fmt::{Debug, Display, Write};

use lexopt::{Arg, Parser};

pub mod flags;
pub mod positional;

/// A piece of CLI state that knows how to consume the flags/arguments
/// relevant to it.
pub trait Configurable: Debug {
    fn configure(
        &mut self,
        p: &mut Parser,
        arg: &mut Arg,
    ) -> anyhow::Result<bool>;

    fn usage(&self) -> &[Usage] {
        &[]
    }
}

/// Drives `lexopt` over every argument, dispatching each to the first
/// `Configurable` target willing to claim it. `-?`/`--help` and
/// `-v`/`--version` are handled here rather than by any target: `-h`
/// belongs to `--hours`, so help's short form moves to `-?`.
pub fn configure(
    p: &mut Parser,
    usage: &str,
    targets: &mut [&mut dyn Configurable],
) -> anyhow::Result<()> {
    loop {
        let Some(arg) = p.next()? else { break };

        match arg {
            Arg::Short('?') | Arg::Long("help") => {
                let flags = collect_usage(targets);
                let rendered =
                    usage.replace("%flags%", &Usage::long(&flags));
                return Err(anyhow::Error::from(Help(
                    rendered.trim().to_string(),
                )));
            }
            Arg::Short('v') | Arg::Long("version") => {
                return Err(anyhow::Error::from(Version));
            }
            _ => {}
        }

        let long_flag: Option<String> = match arg {
            Arg::Long(name) => Some(name.to_string()),
            _ => None,
        };
        let mut arg = match long_flag {
            Some(ref flag) => Arg::Long(flag),
            None => match arg {
                Arg::Short(c) => Arg::Short(c),
                Arg::Long(_) => unreachable!(),
                Arg::Value(value) => Arg::Value(value),
            },
        };

        let mut recognized = false;
        for t in targets.iter_mut() {
            if t.configure(p, &mut arg)? {
                recognized = true;
                break;
            }
        }
        if !recognized {
            return Err(arg.unexpected().into());
        }
    }
    Ok(())
}

fn collect_usage(targets: &[&mut dyn Configurable]) -> Vec<Usage> {
    let mut usages = vec![Help::USAGE, Version::USAGE];
    for t in targets.iter() {
        usages.extend(t.usage().iter().copied());
    }
    usages
}

/// Parses the next value as `T`, attaching `flag_name` as context on
/// failure.
pub fn parse<T>(p: &mut Parser, flag_name: &'static str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: Display + Debug + Send + Sync + 'static,
{
    use anyhow::Context;

    let osv = p.value().context(flag_name)?;
    let strv = match osv.to_str() {
        Some(strv) => strv,
        None => {
            let err = lexopt::Error::NonUnicodeValue(osv.into());
            return Err(anyhow::Error::from(err).context(flag_name));
        }
    };
    match strv.parse() {
        Err(err) => Err(anyhow::Error::msg(err).context(flag_name)),
        Ok(parsed) => Ok(parsed),
    }
}

/// Documentation for one flag, rendered by `-?`/`--help`.
#[derive(Clone, Copy, Debug)]
pub struct Usage {
    pub format: &'static str,
    pub short: &'static str,
}

impl Usage {
    pub const fn new(format: &'static str, short: &'static str) -> Usage {
        Usage { format, short }
    }

    /// A two-column table: flag format, then its short description.
    pub fn long(usages: &[Usage]) -> String {
        const MIN_SPACE: usize = 2;

        let mut result = String::new();
        let Some(max_len) = usages.iter().map(|u| u.format.len()).max()
        else {
            return result;
        };
        for usage in usages {
            let padlen = MIN_SPACE + (max_len - usage.format.len());
            let padding = " ".repeat(padlen);
            writeln!(result, "    {}{}{}", usage.format, padding, usage.short)
                .unwrap();
        }
        result
    }
}

/// Sentinel error indicating `-?`/`--help` was given; `main` prints its
/// message to stdout and exits 0.
#[derive(Debug)]
pub struct Help(String);

impl Help {
    const USAGE: Usage = Usage::new("-?, --help", "Print this help and exit.");
}

impl std::fmt::Display for Help {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Help {}

/// Sentinel error indicating `-v`/`--version` was given; `main` prints
/// its message to stdout and exits 0.
#[derive(Debug)]
pub struct Version;

impl Version {
    const USAGE: Usage =
        Usage::new("-v, --version", "Print the version and exit.");
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let semver = option_env!("CARGO_PKG_VERSION").unwrap_or("N/A");
        write!(f, "logslice {semver}")
    }
}

impl std::error::Error for Version {}
