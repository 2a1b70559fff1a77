// End-to-end tests: run /bin/sh under the launcher with the built preload
// library injected and observe which streams survive.
//
// These need the `pflog-preload` cdylib next to the launcher binary
// (target/<profile>/);
// when it is missing the tests return early instead of failing.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn preload_library() -> Option<PathBuf> {
    let bin = assert_cmd::cargo::cargo_bin("pflog");
    let library = bin.parent()?.join(pflog::launcher::LIBRARY_FILE_NAME);
    if library.is_file() {
        Some(library)
    } else {
        eprintln!("skipping: {} not built", library.display());
        None
    }
}

fn pflog(library: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.env_remove("PFLOG_FILTER")
        .env_remove("PFLOG_STDOUT_FILTER")
        .env_remove("PFLOG_STDERR_FILTER")
        .env_remove("PFLOG_LOG")
        .arg("--library")
        .arg(library);
    cmd
}

/// A program whose name is not registered keeps both streams
#[test]
fn test_unlisted_program_is_unaffected() {
    let Some(library) = preload_library() else {
        return;
    };

    pflog(&library)
        .args(["-f", "noisy", "--", "sh", "-c", "echo hello; echo oops >&2"])
        .assert()
        .success()
        .stdout("hello\n")
        .stderr("oops\n");
}

/// Naming the loaded program itself silences it before it runs
#[test]
fn test_combined_filter_silences_own_process() {
    let Some(library) = preload_library() else {
        return;
    };

    let output = pflog(&library)
        .args(["-f", "sh", "--", "sh", "-c", "echo hello; echo oops >&2"])
        .output()
        .unwrap();

    assert!(output.stdout.is_empty(), "stdout should be closed");
    assert!(output.stderr.is_empty(), "stderr should be closed");
}

/// A stderr-only filter leaves stdout intact
#[test]
fn test_stderr_filter_silences_only_stderr() {
    let Some(library) = preload_library() else {
        return;
    };

    let output = pflog(&library)
        .args(["--stderr", "sh", "--", "sh", "-c", "echo visible; echo hidden >&2"])
        .output()
        .unwrap();

    assert_eq!(String::from_utf8_lossy(&output.stdout), "visible\n");
    assert!(output.stderr.is_empty());
}

/// Exec of a registered target closes the stream before the new image runs
#[test]
fn test_exec_of_listed_target_suppresses_stderr() {
    let Some(library) = preload_library() else {
        return;
    };

    // Without a filter cat complains on stderr
    pflog(&library)
        .args(["--", "sh", "-c", "exec cat /nonexistent/pflog-missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pflog-missing"));

    // With cat on the stderr list the complaint disappears, the exec still
    // happens (cat's exit status is reported)
    pflog(&library)
        .args([
            "--stderr",
            "cat",
            "--",
            "sh",
            "-c",
            "exec cat /nonexistent/pflog-missing",
        ])
        .assert()
        .failure()
        .stderr("");
}

/// Suppression on exec is one-way: output before the exec is kept
#[test]
fn test_exec_of_listed_target_suppresses_stdout() {
    let Some(library) = preload_library() else {
        return;
    };

    let output = pflog(&library)
        .args([
            "--stdout",
            "echo",
            "--",
            "sh",
            "-c",
            "echo before; exec echo after",
        ])
        .output()
        .unwrap();

    assert_eq!(String::from_utf8_lossy(&output.stdout), "before\n");
}

/// Arguments reach the exec'd program unchanged
#[test]
fn test_exec_arguments_are_forwarded() {
    let Some(library) = preload_library() else {
        return;
    };

    pflog(&library)
        .args([
            "--stderr",
            "printf",
            "--",
            "sh",
            "-c",
            "exec printf '%s|%s\\n' first second",
        ])
        .assert()
        .success()
        .stdout("first|second\n");
}

/// Both the self-match and the intercepted exec close stderr; the second
/// close of an already-closed descriptor is harmless
#[test]
fn test_stream_closed_twice_across_exec() {
    let Some(library) = preload_library() else {
        return;
    };

    pflog(&library)
        .args([
            "--stderr",
            "sh",
            "--",
            "sh",
            "-c",
            "exec sh -c 'echo out; echo err >&2; exit 3'",
        ])
        .assert()
        .code(3)
        .stdout("out\n")
        .stderr("");
}

/// Oversized names are reported once, by the injected process, and parsing
/// stops there
#[test]
fn test_oversized_name_is_reported() {
    let Some(library) = preload_library() else {
        return;
    };

    let value = format!("other:{}:sh", "x".repeat(300));
    let output = pflog(&library)
        .env("PFLOG_FILTER", value)
        .args(["--", "sh", "-c", "echo still-running"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "still-running\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("exceeds maximum size of 256 bytes").count(),
        1,
        "stderr: {stderr}"
    );
}

/// The launcher itself neither reads the filter variables nor closes its
/// own streams
#[test]
fn test_launcher_ignores_filter_variables() {
    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.env("PFLOG_FILTER", "pflog")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));

    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.env("PFLOG_FILTER", format!("{}:pflog", "x".repeat(300)))
        .args(["-f", "a:b", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter name"))
        .stderr(predicate::str::contains("exceeds maximum size").not());
}

#[test]
fn test_invalid_filter_name_rejected() {
    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.args(["-f", "a:b", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter name"));
}

#[test]
fn test_missing_library_rejected() {
    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.args(["--library", "/nonexistent/libpflog.so", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Preload library not found"));
}

#[test]
fn test_command_required() {
    let mut cmd = Command::cargo_bin("pflog").unwrap();
    cmd.args(["-f", "cc"]).assert().failure();
}
