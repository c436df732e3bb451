use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docdex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docdex");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create test documents
    let blobs_dir = root.join("blobs").join("docs");
    fs::create_dir_all(&blobs_dir).unwrap();
    fs::write(
        blobs_dir.join("alpha.md"),
        "---\ntitle: Alpha Guide\ndescription: Rust programming with cargo and crates\ntags: [rust, guide]\n---\n\n# Alpha\n\nBody of the alpha guide.\n",
    )
    .unwrap();
    fs::write(
        blobs_dir.join("beta.md"),
        "# Beta Notes\n\nPython and machine learning notes.\n\nDeep learning frameworks are covered.\n",
    )
    .unwrap();
    fs::write(blobs_dir.join("gamma.txt"), "Plain text, not indexed.\n").unwrap();

    // No [content_api] section: the content source degrades deterministically
    // without any network access.
    let config_content = format!(
        r#"[db]
path = "{root}/data/docdex.db"

[blobs]
binding = "fs"
prefix = "docs/"

[blobs.fs]
root = "{root}/blobs"

[server]
bind = "127.0.0.1:7832"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("docdex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docdex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docdex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docdex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_docdex(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("docdex.db").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_docdex(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_docdex(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_index_run() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    let (stdout, stderr, success) = run_docdex(&config_path, &["index"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    // gamma.txt is skipped: only the two Markdown documents count
    assert!(stdout.contains("documents seen: 2"), "got: {}", stdout);
    assert!(stdout.contains("records reconciled: 2"), "got: {}", stdout);
    assert!(stdout.contains("errors: none"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_index_idempotent_no_duplicates() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);

    let (stdout1, _, _) = run_docdex(&config_path, &["index"]);
    assert!(stdout1.contains("records reconciled: 2"));

    // Re-running reconciles the same two keys, no duplicates
    let (stdout2, _, _) = run_docdex(&config_path, &["index"]);
    assert!(stdout2.contains("records reconciled: 2"));
}

#[test]
fn test_index_with_limit() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    let (stdout, _, success) = run_docdex(&config_path, &["index", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("documents seen: 1"), "got: {}", stdout);
    assert!(stdout.contains("records reconciled: 1"), "got: {}", stdout);
}

#[test]
fn test_search_hits_index() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    let (stdout, _, success) = run_docdex(&config_path, &["search", "rust"]);
    assert!(success, "search failed");
    assert!(
        stdout.contains("alpha") && stdout.contains("Alpha Guide"),
        "Expected alpha in results, got: {}",
        stdout
    );
}

#[test]
fn test_search_unconfigured_content_source_degrades() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    // The content API is not configured: the command still succeeds, the
    // index contributes results, and the degraded source is reported.
    let (stdout, stderr, success) = run_docdex(&config_path, &["search", "machine learning"]);
    assert!(success, "search must survive a degraded source");
    assert!(stdout.contains("beta"), "got: {}", stdout);
    assert!(
        stderr.contains("content_api"),
        "Expected degraded-source warning, got: {}",
        stderr
    );
}

#[test]
fn test_search_scope_index_only() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    let (stdout, stderr, success) =
        run_docdex(&config_path, &["search", "rust", "--scope", "index"]);
    assert!(success);
    assert!(stdout.contains("alpha"));
    // Content source is out of scope, so no degradation warning either
    assert!(!stderr.contains("content_api"), "got: {}", stderr);
}

#[test]
fn test_search_empty_keywords_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    let (_, stderr, success) = run_docdex(&config_path, &["search", "  "]);
    assert!(!success, "Empty keywords should fail");
    assert!(stderr.contains("must not be empty"), "got: {}", stderr);
}

#[test]
fn test_search_unknown_scope_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    let (_, stderr, success) =
        run_docdex(&config_path, &["search", "rust", "--scope", "everything"]);
    assert!(!success, "Unknown scope should fail");
    assert!(stderr.contains("Unknown search scope"), "got: {}", stderr);
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    let (stdout1, _, _) = run_docdex(&config_path, &["search", "notes", "--scope", "index"]);
    let (stdout2, _, _) = run_docdex(&config_path, &["search", "notes", "--scope", "index"]);
    assert_eq!(stdout1, stdout2, "Search results should be deterministic");
}

#[test]
fn test_get_document() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    let (stdout, _, success) = run_docdex(&config_path, &["get", "alpha"]);
    assert!(success, "get should succeed");
    assert!(stdout.contains("Alpha Guide"));
    assert!(stdout.contains("rust, guide"));
    assert!(stdout.contains("Body of the alpha guide."));
}

#[test]
fn test_get_missing_key() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);

    let (_, stderr, success) = run_docdex(&config_path, &["get", "nonexistent"]);
    assert!(!success, "get with missing key should fail");
    assert!(
        stderr.contains("No index record"),
        "Should report the missing record, got: {}",
        stderr
    );
}

#[test]
fn test_get_stale_record_reports_missing_blob() {
    let (tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    // Delete the blob behind an indexed record
    fs::remove_file(tmp.path().join("blobs/docs/alpha.md")).unwrap();

    let (_, stderr, success) = run_docdex(&config_path, &["get", "alpha"]);
    assert!(!success, "get with a vanished blob should fail");
    assert!(
        stderr.contains("no longer exists"),
        "Should report the missing blob, got: {}",
        stderr
    );
}

#[test]
fn test_status() {
    let (_tmp, config_path) = setup_test_env();

    run_docdex(&config_path, &["init"]);
    run_docdex(&config_path, &["index"]);

    let (stdout, _, success) = run_docdex(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("blobs"));
    assert!(stdout.contains("content_api"));
    assert!(stdout.contains("NOT CONFIGURED"));
    assert!(stdout.contains("2 records"), "got: {}", stdout);
}

#[test]
fn test_missing_config_fails() {
    let (tmp, _) = setup_test_env();
    let bogus = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_docdex(&bogus, &["init"]);
    assert!(!success, "Missing config should fail");
    assert!(stderr.contains("config"), "got: {}", stderr);
}
