use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_logscan")))
}

const LOG: &str = "\
--------- beginning of main
10-19 12:00:00.001  100  101 V Zygote: preloading classes
10-19 12:00:00.002  100  101 D Zygote: preloaded 4000 classes
10-19 12:00:01.000  200  201 I ActivityManager: Start proc com.example
10-19 12:00:02.000  200  202 W ActivityManager: Slow operation: 120ms
10-19 12:00:03.000  300  301 E AndroidRuntime: FATAL EXCEPTION: main
not a logcat line
10-19 12:00:04.000  300  301 F libc: Fatal signal 11
";

fn log_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(LOG.as_bytes()).unwrap();
    file
}

// -- stdin --

#[test]
fn stdin_passes_every_parseable_line() {
    let assert = cmd().write_stdin(LOG).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(output.lines().count(), 6);
    assert!(!output.contains("beginning of main"));
    assert!(!output.contains("not a logcat line"));
}

#[test]
fn min_level_filters() {
    cmd()
        .args(["--min-level", "w"])
        .write_stdin(LOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("Slow operation"))
        .stdout(predicate::str::contains("FATAL EXCEPTION"))
        .stdout(predicate::str::contains("Zygote").not())
        .stdout(predicate::str::contains("Start proc").not());
}

#[test]
fn tags_and_tag_levels() {
    cmd()
        .args(["-t", "Zygote", "-t", "ActivityManager", "-lE"])
        .args(["--tag-level", "Zygote", "D"])
        .write_stdin(LOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("preloaded 4000"))
        .stdout(predicate::str::contains("preloading").not())
        .stdout(predicate::str::contains("ActivityManager").not())
        .stdout(predicate::str::contains("libc").not());
}

#[test]
fn count_mode() {
    cmd()
        .arg("-c")
        .write_stdin(LOG)
        .assert()
        .success()
        .stdout("V\t1\nD\t1\nI\t1\nW\t1\nE\t1\nF\t1\n");
}

#[test]
fn limit_and_header() {
    let assert = cmd()
        .args(["-n", "2", "--header", "== head =="])
        .write_stdin(LOG)
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "== head ==");
    assert!(lines[2].contains("preloaded"));
}

// -- files --

#[test]
fn reads_files_and_writes_output() {
    let input = log_file();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("filtered.log");

    cmd()
        .args(["--out:output", out.to_str().unwrap(), "--scan:min-level=F"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert!(written.contains("Fatal signal 11"));
}

#[test]
fn reads_directories() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.log"), LOG).unwrap();
    std::fs::write(dir.path().join("b.txt"), LOG).unwrap();
    std::fs::write(dir.path().join("ignored.bin"), LOG).unwrap();

    cmd()
        .args(["-c", "--min-level", "F"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("F\t2"));
}

#[test]
fn unmatched_glob_warns() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.log"), LOG).unwrap();
    let missing = format!("{}/*.nothing", dir.path().display());
    let present = format!("{}/*.log", dir.path().display());

    cmd()
        .args(["-c", &missing, &present])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: no files matched"))
        .stdout(predicate::str::contains("E\t1"));
}

#[test]
fn directory_without_logs_warns() {
    let empty = TempDir::new().unwrap();
    std::fs::write(empty.path().join("notes.md"), "x").unwrap();
    let input = log_file();

    cmd()
        .arg("-c")
        .arg(empty.path())
        .arg(input.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: no log files in directory"))
        .stdout(predicate::str::contains("W\t1"));
}

// -- errors --

#[test]
fn unknown_option_exits_2() {
    cmd()
        .arg("--bogus")
        .write_stdin(LOG)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: Could not find option with name bogus"))
        .stderr(predicate::str::contains("--help"));
}

#[test]
fn bad_level_exits_2() {
    cmd()
        .args(["--min-level", "loud"])
        .write_stdin(LOG)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("loud"));
}

#[test]
fn missing_value_exits_2() {
    cmd()
        .arg("--limit")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires a 'long' argument"));
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .arg(dir.path().join("absent.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files found"));
}

#[test]
fn help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("usage: logscan"))
        .stdout(predicate::str::contains("-l, --min-level"))
        .stdout(predicate::str::contains("Valid values: [V, D, I, W, E, F]"))
        .stdout(predicate::str::contains("-o, --output"));
}
