use std::{
    env,
    io::Write,
    path::PathBuf,
    process::ExitCode,
    sync::LazyLock,
};

use {
    anyhow::Context,
    jiff::{Timestamp, Zoned, tz::TimeZone},
};

mod args;
mod driver;
mod error;
mod extractor;
mod format;
mod logger;
mod region;
mod search;
mod style;

use crate::{
    args::{
        Configurable,
        flags::{FormatArg, RangeArgs},
        positional::Paths,
    },
    driver::Outcome,
};

static TZ: LazyLock<TimeZone> = LazyLock::new(|| TimeZone::system());

static NOW: LazyLock<Zoned> = LazyLock::new(|| {
    let ts = match read_env_logslice_now() {
        Ok(Some(ts)) => {
            log::trace!(
                "setting current time to `{ts}` from `LOGSLICE_NOW` \
                 environment variable",
            );
            ts
        }
        Ok(None) => Timestamp::now(),
        Err(err) => {
            let now = Timestamp::now();
            log::warn!(
                "reading `LOGSLICE_NOW` failed, using current time \
                 `{now}`: {err:#}",
            );
            now
        }
    };
    ts.to_zoned(TZ.clone())
});

const USAGE: &str = "\
Usage: logslice [OPTIONS] [PATH ...]

Extract the contiguous run of lines from one or more timestamped log files
(or, with no paths, from stdin) whose embedded timestamps fall within a
half-open interval [--start, --stop).

%flags%";

/// Then, as it was, then again it will be.
fn main() -> ExitCode {
    let err = match run() {
        Ok(code) => return code,
        Err(err) => err,
    };
    if let Some(help) = err.root_cause().downcast_ref::<args::Help>() {
        writeln!(&mut std::io::stdout(), "{help}").unwrap();
        return ExitCode::SUCCESS;
    }
    if let Some(version) = err.root_cause().downcast_ref::<args::Version>() {
        writeln!(&mut std::io::stdout(), "{version}").unwrap();
        return ExitCode::SUCCESS;
    }
    // Look for a broken pipe error. In this case, we generally want
    // to exit "gracefully" with a success exit code. This matches
    // existing Unix convention. We need to handle this explicitly
    // since the Rust runtime doesn't ask for PIPE signals, and thus
    // we get an I/O error instead. Traditional C Unix applications
    // quit by getting a PIPE signal that they don't handle, and thus
    // the unhandled signal causes the process to unceremoniously
    // terminate.
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            if err.kind() == std::io::ErrorKind::BrokenPipe {
                return ExitCode::from(0);
            }
        }
    }
    if std::env::var("RUST_BACKTRACE").map_or(false, |v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(&mut std::io::stderr(), "{:?}", err).unwrap();
    } else {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
    }
    ExitCode::from(2)
}

fn run() -> anyhow::Result<ExitCode> {
    let rustlog = env::var("LOGSLICE_LOG").unwrap_or_else(|_| String::new());
    let level = match &*rustlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    log::set_max_level(level);
    // Same ordering dance as the logger's usual initialization: the
    // system time zone lookup (`TZ`, forced by `NOW` below) can itself
    // log, so the logger starts without a zone and gets one attached
    // right after.
    let logger = logger::Logger::init()?;
    logger.set_time_zone(TZ.clone());

    let mut format_arg = FormatArg::default();
    let mut range_args = RangeArgs::default();
    let mut paths = Paths::default();
    args::configure(
        &mut lexopt::Parser::from_env(),
        USAGE,
        &mut [&mut format_arg, &mut range_args, &mut paths],
    )?;

    let fmt = format_arg.resolve();
    let matcher = format::CompiledMatcher::compile(&fmt)
        .map_err(anyhow::Error::from)
        .with_context(|| format!("invalid format `{fmt}`"))?;

    let now_ts = NOW.timestamp();
    let local_offset_seconds = i64::from(NOW.offset().seconds());
    let current_utc_year = now_ts.to_zoned(TimeZone::UTC).year();

    let (start, stop) = range_args.resolve(
        now_ts.as_second(),
        matcher.source(),
        local_offset_seconds,
    )?;

    let outcome = if paths.as_slice().is_empty() {
        run_streaming(&matcher, start, stop, current_utc_year, local_offset_seconds)?
    } else {
        run_files(
            paths.as_slice(),
            &matcher,
            start,
            stop,
            current_utc_year,
            local_offset_seconds,
        )?
    };

    Ok(match outcome {
        Outcome::Emitted => ExitCode::SUCCESS,
        Outcome::NotFound => ExitCode::from(1),
    })
}

fn run_streaming(
    matcher: &format::CompiledMatcher,
    start: i64,
    stop: i64,
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> anyhow::Result<Outcome> {
    let mut stdin = std::io::stdin().lock();
    driver::streaming::run(
        &mut stdin,
        matcher,
        start,
        stop,
        current_utc_year,
        local_offset_seconds,
        driver::random_access::DEFAULT_CHUNK_SIZE,
    )
    .map_err(anyhow::Error::from)
}

/// Runs the random-access driver over each path in turn, in the order
/// given. Any one file producing output is enough for the overall exit
/// code to be 0.
fn run_files(
    paths: &[PathBuf],
    matcher: &format::CompiledMatcher,
    start: i64,
    stop: i64,
    current_utc_year: i16,
    local_offset_seconds: i64,
) -> anyhow::Result<Outcome> {
    let mut any_emitted = false;
    for path in paths {
        let source = driver::random_access::Source::open(path)
            .with_context(|| format!("failed to open `{}`", path.display()))?;
        let outcome = driver::random_access::run(
            &source,
            matcher,
            start,
            stop,
            current_utc_year,
            local_offset_seconds,
            driver::random_access::DEFAULT_CHUNK_SIZE,
        )
        .map_err(anyhow::Error::from)
        .with_context(|| format!("failed to search `{}`", path.display()))?;
        if outcome == Outcome::Emitted {
            any_emitted = true;
        }
    }
    Ok(if any_emitted { Outcome::Emitted } else { Outcome::NotFound })
}

fn read_env_logslice_now() -> anyhow::Result<Option<Timestamp>> {
    let Some(val) = std::env::var_os("LOGSLICE_NOW") else { return Ok(None) };
    let Some(val) = val.to_str() else {
        anyhow::bail!(
            "`LOGSLICE_NOW` environment variable is not valid UTF-8: {val:?}"
        )
    };
    val.parse::<Timestamp>()
        .context(
            "`LOGSLICE_NOW` environment variable is not a valid RFC 3339 timestamp",
        )
        .map(Some)
}
