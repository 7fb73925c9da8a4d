//! Black-box CLI tests covering the documented concrete scenarios and
//! boundary behaviors, run against the built `logslice` binary with
//! `std::process::Command`.

use std::{
    env::consts::EXE_SUFFIX,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

fn bin_path() -> PathBuf {
    std::env::current_exe()
        .unwrap()
        .parent()
        .expect("executable's directory")
        .parent()
        .expect("target profile directory")
        .join(format!("logslice{EXE_SUFFIX}"))
}

fn logslice() -> Command {
    Command::new(bin_path())
}

fn run_with_file(args: &[&str], contents: &str) -> (i32, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, contents).unwrap();

    let output = logslice()
        .args(args)
        .arg(&path)
        .output()
        .expect("failed to run logslice");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8(output.stdout).unwrap(),
    )
}

fn run_with_stdin(args: &[&str], input: &str) -> (i32, String) {
    let mut child = logslice()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to run logslice");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8(output.stdout).unwrap(),
    )
}

#[test]
fn minute_tail_of_common_format_log() {
    let mut contents = String::new();
    for minute in 0..60 {
        contents.push_str(&format!(
            "10.0.0.1 - - [01/Jan/2020:12:{minute:02}:00 +0000] \"GET /a\"\n"
        ));
    }
    let (code, stdout) = run_with_file(
        &[
            "--format=common",
            "--stop=2020-01-01 12:30:00",
            "--minutes=1",
        ],
        &contents,
    );
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "10.0.0.1 - - [01/Jan/2020:12:29:00 +0000] \"GET /a\"\n"
    );
}

#[test]
fn iso_with_offset_selects_second_line() {
    let contents = "2020-06-01T10:00:00+0200 a\n2020-06-01T10:30:00+0200 b\n";
    let (code, stdout) = run_with_file(
        &[
            "--format=iso",
            "--start=2020-06-01T08:15:00+0000",
            "--stop=2020-06-01T08:45:00+0000",
        ],
        contents,
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "2020-06-01T10:30:00+0200 b\n");
}

#[test]
fn epoch_seconds_tskv() {
    let contents = "unixtime=100 a\nunixtime=200 b\nunixtime=300 c\n";
    let (code, stdout) = run_with_file(
        &[
            "--format=tskv",
            "--start=1970-01-01 00:02:30",
            "--stop=1970-01-01 00:04:00",
        ],
        contents,
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "unixtime=200 b\n");
}

#[test]
fn empty_intersection_exits_one_with_no_output() {
    let contents = "2020-01-01 00:00:00 a\n2020-01-01 23:59:59 b\n";
    let (code, stdout) = run_with_file(
        &[
            "--start=2019-12-31 00:00:00",
            "--stop=2019-12-31 23:59:59",
        ],
        contents,
    );
    assert_eq!(code, 1);
    assert_eq!(stdout, "");
}

#[test]
fn streaming_with_unparseable_preamble() {
    let input = "noise a\nnoise b\nnoise c\n\
        2020-01-01 00:00:00 x\n2020-01-01 00:00:01 y\n2020-01-01 00:00:02 z\n";
    let (code, stdout) = run_with_stdin(
        &["--start=2020-01-01 00:00:01", "--stop=2020-01-01 00:00:03"],
        input,
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "2020-01-01 00:00:01 y\n2020-01-01 00:00:02 z\n");
}

#[test]
fn invalid_percent_at_end_of_format_is_exit_two() {
    let (code, stdout) =
        run_with_file(&["--format=%Y-%m-%d %"], "2020-01-01 x\n");
    assert_eq!(code, 2);
    assert_eq!(stdout, "");
}

#[test]
fn empty_file_exits_one() {
    let (code, stdout) = run_with_file(&[], "");
    assert_eq!(code, 1);
    assert_eq!(stdout, "");
}

#[test]
fn single_unterminated_line_in_range_gets_synthesized_newline() {
    let contents = "2020-01-01 00:00:00 a";
    let (code, stdout) = run_with_file(
        &["--start=2019-01-01 00:00:00", "--stop=2021-01-01 00:00:00"],
        contents,
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "2020-01-01 00:00:00 a\n");
}

#[test]
fn all_timestamps_before_start_exits_one() {
    let contents = "2020-01-01 00:00:00 a\n2020-01-01 00:00:01 b\n";
    let (code, stdout) =
        run_with_file(&["--start=2025-01-01 00:00:00"], contents);
    assert_eq!(code, 1);
    assert_eq!(stdout, "");
}
