//! The flags this crate has: `--format`/`-e`, `--start`/`-f`,
//! `--stop`/`-t`, and the three now-relative offsets `--seconds`/`-s`,
//! `--minutes`/`-m`, `--hours`/`-h`.

use jiff::fmt::strtime;

use crate::{args::{self, Configurable, Usage}, format};

/// `--format`/`-e <name-or-literal>`, default `default`.
#[derive(Clone, Debug)]
pub struct FormatArg(String);

impl Default for FormatArg {
    fn default() -> FormatArg {
        FormatArg("default".to_string())
    }
}

impl FormatArg {
    /// Resolves a named format through the alias table, or returns the
    /// value verbatim as a literal format string.
    pub fn resolve(&self) -> String {
        match format::table::resolve_named_format(&self.0) {
            Some(fmt) => fmt.to_string(),
            None => self.0.clone(),
        }
    }
}

impl Configurable for FormatArg {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('e') | lexopt::Arg::Long("format") => {
                self.0 = args::parse(p, "-e/--format")?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const FORMAT: Usage = Usage::new(
            "-e, --format <name-or-format>",
            "Named format or literal strptime-style format (default: default).",
        );
        &[FORMAT]
    }
}

/// `--start`/`-f`, `--stop`/`-t`, and the now-relative offsets.
#[derive(Clone, Debug, Default)]
pub struct RangeArgs {
    start: Option<String>,
    stop: Option<String>,
    seconds: u64,
    minutes: u64,
    hours: u64,
}

impl RangeArgs {
    /// Resolves `--start`/`--stop` to Unix timestamps, given `now` (the
    /// process start instant, or `LOGSLICE_NOW` override) and the active
    /// format's source text.
    ///
    /// Defaults: `--stop` defaults to `now`; `--start` defaults to the
    /// resolved `--stop` minus the offset accumulated from
    /// `--seconds`/`--minutes`/`--hours` (so with neither `--start` nor
    /// `--stop` given, this still yields `now` minus the offset).
    pub fn resolve(
        &self,
        now: i64,
        active_format: &str,
        local_offset_seconds: i64,
    ) -> anyhow::Result<(i64, i64)> {
        let offset = self.seconds as i64
            + self.minutes as i64 * 60
            + self.hours as i64 * 3600;
        let stop = match self.stop {
            Some(ref text) => {
                parse_datetime_arg(text, active_format, local_offset_seconds)?
            }
            None => now,
        };
        let start = match self.start {
            Some(ref text) => {
                parse_datetime_arg(text, active_format, local_offset_seconds)?
            }
            None => stop - offset,
        };
        Ok((start, stop))
    }
}

impl Configurable for RangeArgs {
    fn configure(
        &mut self,
        p: &mut lexopt::Parser,
        arg: &mut lexopt::Arg,
    ) -> anyhow::Result<bool> {
        match *arg {
            lexopt::Arg::Short('f') | lexopt::Arg::Long("start") => {
                self.start = Some(args::parse(p, "-f/--start")?);
            }
            lexopt::Arg::Short('t') | lexopt::Arg::Long("stop") => {
                self.stop = Some(args::parse(p, "-t/--stop")?);
            }
            lexopt::Arg::Short('s') | lexopt::Arg::Long("seconds") => {
                self.seconds = args::parse(p, "-s/--seconds")?;
            }
            lexopt::Arg::Short('m') | lexopt::Arg::Long("minutes") => {
                self.minutes = args::parse(p, "-m/--minutes")?;
            }
            lexopt::Arg::Short('h') | lexopt::Arg::Long("hours") => {
                self.hours = args::parse(p, "-h/--hours")?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn usage(&self) -> &[Usage] {
        const START: Usage =
            Usage::new("-f, --start <datetime>", "Inclusive lower bound (default: now - offset).");
        const STOP: Usage =
            Usage::new("-t, --stop <datetime>", "Exclusive upper bound (default: now).");
        const SECONDS: Usage =
            Usage::new("-s, --seconds <n>", "Seconds added to the now-relative offset.");
        const MINUTES: Usage =
            Usage::new("-m, --minutes <n>", "Minutes added to the now-relative offset.");
        const HOURS: Usage =
            Usage::new("-h, --hours <n>", "Hours added to the now-relative offset.");
        &[START, STOP, SECONDS, MINUTES, HOURS]
    }
}

/// The fixed fallback format list for `--start`/`--stop`: tried, in this
/// exact order, whenever the active format fails to parse the value. The
/// order is part of the observable interface and must not be reordered.
const HEURISTIC_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

/// Parses a `--start`/`--stop` value: first with the active format, then
/// with each heuristic format in the fixed order above.
fn parse_datetime_arg(
    text: &str,
    active_format: &str,
    local_offset_seconds: i64,
) -> anyhow::Result<i64> {
    if let Some(ts) =
        try_strtime(text, active_format, local_offset_seconds)
    {
        return Ok(ts);
    }
    for fmt in HEURISTIC_FORMATS {
        if let Some(ts) = try_strtime(text, fmt, local_offset_seconds) {
            return Ok(ts);
        }
    }
    anyhow::bail!(
        "`{text}` did not match the active format or any fallback datetime format",
    )
}

fn try_strtime(
    text: &str,
    fmt: &str,
    local_offset_seconds: i64,
) -> Option<i64> {
    let tm = strtime::parse(fmt.as_bytes(), text.as_bytes()).ok()?;
    if tm.offset().is_some() || tm.iana_time_zone().is_some() {
        return tm.to_zoned().ok().map(|zdt| zdt.timestamp().as_second());
    }
    let dt = tm.to_datetime().ok()?;
    let zdt = dt.to_zoned(jiff::tz::TimeZone::UTC).ok()?;
    zdt.timestamp().as_second().checked_sub(local_offset_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_prefers_earlier_formats() {
        // %Y-%m-%d is tried before %d-%m-%Y, so `2020-01-02` parses as
        // 2020-01-02, not as day=2020 (which would be invalid anyway).
        let ts = try_strtime("2020-01-02", "%Y-%m-%d", 0).unwrap();
        let expected = jiff::civil::date(2020, 1, 2)
            .to_zoned(jiff::tz::TimeZone::UTC)
            .unwrap()
            .timestamp()
            .as_second();
        assert_eq!(ts, expected);
    }
}
