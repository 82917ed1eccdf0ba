//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("codebase-summarizer"));
    cmd.env_remove("OPENAI_API_KEY").env_remove("RUST_LOG");
    cmd
}

fn sample_project() -> TempDir {
    let tmp = TempDir::new().expect("temp dir");
    let root = tmp.path();
    fs::create_dir_all(root.join("src")).expect("mkdir src");
    fs::create_dir_all(root.join("build")).expect("mkdir build");
    fs::write(root.join("src/main.py"), "print('hello')\n").expect("write main");
    fs::write(root.join("README.md"), "# Sample\n").expect("write readme");
    fs::write(root.join("logo.png"), [0x89u8, b'P', b'N', b'G', 0, 0, 0xff, 0xfe]).expect("write png");
    fs::write(root.join("debug.log"), "noise\n").expect("write log");
    fs::write(root.join("build/out.txt"), "artifact\n").expect("write artifact");
    fs::write(root.join(".gitignore"), "*.log\nbuild/\n").expect("write gitignore");
    tmp
}

#[test]
fn test_cli_version() {
    cli().arg("--version").assert().success().stdout(predicate::str::contains("codebase-summarizer"));
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_summarize_help_lists_options() {
    cli()
        .args(["summarize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--max-token-limit"))
        .stdout(predicate::str::contains("--ignore-file"))
        .stdout(predicate::str::contains("--optimization-model"));
}

#[test]
fn test_summarize_missing_directory_fails() {
    let tmp = TempDir::new().expect("temp dir");
    let missing = tmp.path().join("does-not-exist");
    cli()
        .args(["summarize", missing.to_str().expect("utf8 path"), "-k", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_summarize_without_credential_fails() {
    let project = sample_project();
    let out = project.path().join("summary.json");
    cli()
        .args(["summarize", project.path().to_str().expect("utf8 path"), "--no-git", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key provided"));
    assert!(!out.exists());
}

#[test]
fn test_summarize_rejects_zero_batch_size() {
    let project = sample_project();
    cli()
        .args(["summarize", project.path().to_str().expect("utf8 path"), "-b", "0", "-k", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_summarize_missing_custom_ignore_file_fails() {
    let project = sample_project();
    cli()
        .args([
            "summarize",
            project.path().to_str().expect("utf8 path"),
            "--no-git",
            "-k",
            "sk-test",
            "-g",
            "/definitely/not/here/.summaryignore",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Custom ignore file not found"));
}

#[test]
fn test_info_lists_tree_and_exclusions() {
    let project = sample_project();
    cli()
        .args(["info", project.path().to_str().expect("utf8 path"), "--no-git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files included: 3"))
        .stdout(predicate::str::contains("logo.png"))
        .stdout(predicate::str::contains("debug.log"))
        .stdout(predicate::str::contains("build/"))
        .stdout(predicate::str::contains("main.py"))
        .stdout(predicate::str::contains("out.txt").not());
}

#[test]
fn test_info_applies_custom_ignore_file() {
    let project = sample_project();
    let elsewhere = TempDir::new().expect("temp dir");
    let ignore = elsewhere.path().join(".summaryignore");
    fs::write(&ignore, "*.md\n").expect("write ignore");
    cli()
        .args(["info", project.path().to_str().expect("utf8 path"), "--no-git", "-g"])
        .arg(&ignore)
        .assert()
        .success()
        .stdout(predicate::str::contains("Files included: 2"));
}

#[test]
fn test_info_rejects_invalid_explicit_config() {
    let project = sample_project();
    let config = project.path().join("settings.toml");
    fs::write(&config, "batch_size = \"many\"\n").expect("write config");
    cli()
        .args(["info", project.path().to_str().expect("utf8 path"), "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid TOML config"));
}

#[test]
fn test_optimize_missing_input_fails() {
    let tmp = TempDir::new().expect("temp dir");
    cli()
        .args(["optimize", tmp.path().join("nope.json").to_str().expect("utf8 path"), "-k", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_completions_bash() {
    cli()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("codebase-summarizer"));
}
