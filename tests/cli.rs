use assert_cmd::Command;
use predicates::prelude::*;

const SEPARATOR: &str = "========================================";

fn transcripts() -> Command {
    let mut cmd = Command::cargo_bin("transcripts").unwrap();
    cmd.env_remove("TRANSCRIPTS_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    transcripts()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn invalid_channel_exits_with_error() {
    transcripts()
        .args(["download", "https://example.com/not-a-channel"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not parse channel URL"));
}

#[test]
fn analyze_reports_transcripts() {
    let dir = tempfile::tempdir().unwrap();
    let body = "This is one sentence. Here is another! ".repeat(50);
    std::fs::write(
        dir.path().join("video_abc.md"),
        format!("Title: t\nVideo ID: abc\nURL: u\n{}\n{}\n", SEPARATOR, body),
    )
    .unwrap();

    transcripts()
        .arg("analyze")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1 transcripts"))
        .stdout(predicate::str::contains("Total words: 350"));
}

#[test]
fn config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    transcripts()
        .args(["config", "--init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(path.exists());

    transcripts()
        .args(["config", "--show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Max Retries: 5"))
        .stdout(predicate::str::contains("Languages: en, en-US, en-GB"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry:\n  max_retries: 0\n").unwrap();

    transcripts()
        .args(["download", "@somechannel", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_retries"));
}
