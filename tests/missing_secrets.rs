//! Runs the compiled binary without secrets and checks it refuses to start.

use std::process::Command;

fn digest_cmd(output: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_exam_news_digest"));
    cmd.env_remove("NEWSAPI_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GITHUB_TOKEN")
        .env_remove("DIGEST_CONFIG")
        .env_remove("DIGEST_STRATEGY")
        // Any request that slipped through would fail here instead of leaving the machine.
        .env("NEWSAPI_BASE_URL", "http://127.0.0.1:9")
        .env("GEMINI_BASE_URL", "http://127.0.0.1:9")
        .arg("--output")
        .arg(output);
    cmd
}

fn temp_output(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("exam_news_digest_it_{}", std::process::id()))
        .join(name)
}

#[test]
fn missing_news_key_exits_with_one() {
    let output = temp_output("news.txt");
    let out = digest_cmd(&output)
        .args(["--strategy", "keyword"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let logs = String::from_utf8_lossy(&out.stdout);
    assert!(logs.contains("NEWSAPI_KEY is missing"), "logs: {logs}");
    assert!(!output.exists());
}

#[test]
fn missing_model_key_exits_with_one() {
    let output = temp_output("model.txt");
    let out = digest_cmd(&output)
        .env("NEWSAPI_KEY", "present")
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let logs = String::from_utf8_lossy(&out.stdout);
    assert!(logs.contains("GEMINI_API_KEY is missing"), "logs: {logs}");
    assert!(!output.exists());
}

#[test]
fn unreachable_news_api_still_writes_header() {
    let output = temp_output("empty.txt");
    let out = digest_cmd(&output)
        .env("NEWSAPI_KEY", "present")
        .args(["--strategy", "keyword"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(0));
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("📢 UPSC/SSC/Bank Current Affairs\nDate: "));
    assert!(written.ends_with("No news found today.\n"));
    let _ = std::fs::remove_file(&output);
}
