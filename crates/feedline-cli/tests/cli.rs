//! CLI tests for the `feedline` binary

use assert_cmd::Command;
use tempfile::TempDir;

const FEED: &str = r#"<?xml version="1.0"?>
<rss xmlns:g="http://base.google.com/ns/1.0">
  <channel>
    <title>Store</title>
    <item>
      <g:id>1</g:id>
      <title>Shirt</title>
      <description>Blue shirt</description>
    </item>
    <item>
      <g:id>2</g:id>
      <title>Hat</title>
    </item>
  </channel>
</rss>
"#;

/// Temp dir holding `feed.xml` and an empty config file
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("feed.xml"), FEED).unwrap();
    std::fs::write(dir.path().join("feedline.toml"), "").unwrap();
    dir
}

fn feedline(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("feedline").unwrap();
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(dir.path().join("feedline.toml"));
    cmd
}

#[test]
fn report_sink_prints_one_batch() {
    let dir = workspace();
    let output = feedline(&dir)
        .args(["run", "feed.xml", "--sink", "report"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Received batch   1"));
    assert!(stdout.contains("Products:        2"));
    assert!(!stdout.contains("Received batch   2"));
}

#[test]
fn dir_sink_splits_by_threshold() {
    let dir = workspace();
    feedline(&dir)
        .args(["run", "feed.xml", "--sink", "dir", "--out", "out"])
        .args(["--threshold-bytes", "60"])
        .assert()
        .success();

    let first = std::fs::read_to_string(dir.path().join("out/batch_000001.json")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("out/batch_000002.json")).unwrap();
    assert_eq!(
        first,
        r#"[{"id":"1","title":"Shirt","description":"Blue shirt"}]"#
    );
    assert_eq!(second, r#"[{"id":"2","title":"Hat"}]"#);
    assert!(!dir.path().join("out/batch_000003.json").exists());
}

#[test]
fn queued_dir_sink_writes_same_batches() {
    let dir = workspace();
    feedline(&dir)
        .args(["run", "feed.xml", "--sink", "dir", "--out", "out", "--queue", "2"])
        .args(["--threshold-bytes", "60"])
        .assert()
        .success();

    assert!(dir.path().join("out/batch_000001.json").exists());
    assert!(dir.path().join("out/batch_000002.json").exists());
}

#[test]
fn config_file_sets_threshold() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("feedline.toml"),
        "[batch]\nthreshold_bytes = 60\n[sink]\nkind = \"dir\"\ndir = \"from-config\"\n",
    )
    .unwrap();

    feedline(&dir).args(["run", "feed.xml"]).assert().success();

    assert!(dir.path().join("from-config/batch_000002.json").exists());
}

#[test]
fn malformed_feed_fails_without_output() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("bad.xml"),
        "<rss><item><g:id>1</g:id></item><item><title>x</item></rss>",
    )
    .unwrap();

    feedline(&dir)
        .args(["run", "bad.xml", "--sink", "dir", "--out", "out"])
        .assert()
        .failure();

    assert!(!dir.path().join("out/batch_000001.json").exists());
}

#[test]
fn strict_flag_rejects_unclosed_item() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("nested.xml"),
        "<rss><item><g:id>1</g:id><item><g:id>2</g:id></item></item></rss>",
    )
    .unwrap();

    feedline(&dir)
        .args(["run", "nested.xml", "--sink", "null"])
        .assert()
        .success();
    feedline(&dir)
        .args(["run", "nested.xml", "--sink", "null", "--strict"])
        .assert()
        .failure();
}

#[test]
fn http_sink_requires_url() {
    let dir = workspace();
    feedline(&dir)
        .args(["run", "feed.xml", "--sink", "http"])
        .assert()
        .failure();
}

#[test]
fn missing_input_fails() {
    let dir = workspace();
    feedline(&dir)
        .args(["run", "missing.xml", "--sink", "null"])
        .assert()
        .failure();
}

#[test]
fn config_command_prints_table() {
    let dir = workspace();
    let output = feedline(&dir).arg("config").output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Threshold"));
    assert!(stderr.contains("5,242,880 bytes"));
}

#[test]
fn quiet_flag_silences_info_logs() {
    let dir = workspace();
    let loud = feedline(&dir)
        .env_remove("RUST_LOG")
        .args(["run", "feed.xml", "--sink", "null"])
        .output()
        .unwrap();
    assert!(String::from_utf8(loud.stderr).unwrap().contains("Reading"));

    let quiet = feedline(&dir)
        .env_remove("RUST_LOG")
        .args(["--quiet", "run", "feed.xml", "--sink", "null"])
        .output()
        .unwrap();
    assert!(quiet.status.success());
    assert!(!String::from_utf8(quiet.stderr).unwrap().contains("Reading"));
}

#[test]
fn truncated_feed_fails_without_output() {
    let dir = workspace();
    let cut = &FEED[..FEED.find("</channel>").unwrap()];
    std::fs::write(dir.path().join("cut.xml"), cut).unwrap();

    feedline(&dir)
        .args(["run", "cut.xml", "--sink", "dir", "--out", "out"])
        .assert()
        .failure();

    assert!(!dir.path().join("out/batch_000001.json").exists());
}
