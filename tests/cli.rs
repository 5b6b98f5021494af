//! End-to-end tests for the `badgesheet` binary.
//!
//! Run with:
//!   cargo test --test cli

#![cfg(feature = "cli")]

use std::path::Path;
use std::process::{Command, Output};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn badgesheet(args: &[&str], rust_log: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_badgesheet"));
    cmd.args(args).env_remove("RUST_LOG");
    for (var, _) in std::env::vars().filter(|(k, _)| k.starts_with("BADGESHEET_")) {
        cmd.env_remove(var);
    }
    if let Some(filter) = rust_log {
        cmd.env("RUST_LOG", filter);
    }
    cmd.output().expect("failed to run badgesheet")
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn test_missing_input_is_reported_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let input = path_arg(&dir.path().join("nope.csv"));
    let output = path_arg(&dir.path().join("x.docx"));

    // Default filter (progress bar on) and logging switched off entirely.
    for rust_log in [None, Some("off")] {
        let out = badgesheet(
            &["-i", &input, "-o", &output, "--no-pdf", "--no-open"],
            rust_log,
        );
        let stderr = String::from_utf8_lossy(&out.stderr);

        assert_eq!(out.status.code(), Some(1), "stderr: {stderr}");
        assert!(stderr.contains("CSV file not found"), "stderr: {stderr}");
        assert!(stderr.contains("nope.csv"), "stderr: {stderr}");
    }
    assert!(!dir.path().join("x.docx").exists());
}

#[test]
fn test_quiet_still_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("attendees.csv");
    std::fs::write(&input, "Preferred,Last\nAda,Abbott\n").unwrap();
    let output = path_arg(&dir.path().join("x.docx"));

    let out = badgesheet(
        &["-i", &path_arg(&input), "-o", &output, "--quiet", "--no-pdf", "--no-open"],
        None,
    );
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr.contains("Missing required CSV columns"), "stderr: {stderr}");
}

// ── Success ──────────────────────────────────────────────────────────────────

#[test]
fn test_all_mode_creates_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("attendees.csv");
    std::fs::write(
        &input,
        "Preferred,Last,FASET Total Guest Count,\
Guest 1 Preferred Name,Guest 1 Last Name,Guest 1 Affiliations,\
Guest 2 Preferred Name,Guest 2 Last Name,Guest 2 Affiliations\n\
Ada,Abbott,0,,,,,,\n",
    )
    .unwrap();
    let out_dir = dir.path().join("out");
    let output = format!("{}/", path_arg(&out_dir));

    let out = badgesheet(
        &[
            "-i", &path_arg(&input), "-o", &output, "--badge", "all",
            "--no-pdf", "--no-open", "--no-progress", "--quiet",
        ],
        None,
    );

    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(out_dir.join("attendees_QRBadges.docx").is_file());
    assert!(out_dir.join("attendees_StudentNameBadges.docx").is_file());
    assert!(!out_dir.join("attendees_Guest1Badge.docx").exists());
}
