// End-to-end tests with directory-backed stores on both sides

use std::fs;

use munkey::fs::LocalStore;
use munkey::sync::{IgnoreMatcher, SyncOptions, Syncer};
use munkey::SyncError;
use tempfile::TempDir;

use crate::support::{local_files, write_file};

fn remote_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "index.html", "<h1>home</h1>");
    write_file(tmp.path(), "about us.html", "<h1>about</h1>");
    write_file(tmp.path(), "assets/app.js", "console.log(1)");
    write_file(tmp.path(), "assets/fonts/mono.woff", "woff");
    write_file(tmp.path(), "logs/access.log", "GET /");
    write_file(tmp.path(), ".htaccess", "Deny from all");
    write_file(tmp.path(), ".git/config", "[core]");
    tmp
}

#[test]
fn test_pull_then_push_round_trip() {
    let remote = remote_site();
    let local = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();
    let matcher = IgnoreMatcher::build("logs/").unwrap();

    let source = LocalStore::new(remote.path());
    let stats = Syncer::new(&source)
        .with_ignore(&matcher)
        .pull_dir(local.path(), "/", &SyncOptions::default())
        .unwrap();

    assert_eq!(
        local_files(local.path()),
        vec![
            ".htaccess",
            "about us.html",
            "assets/app.js",
            "assets/fonts/mono.woff",
            "index.html",
        ]
    );
    assert!(local.path().join("logs").is_dir());
    assert!(!local.path().join(".git/config").exists());
    assert_eq!(stats.files_ignored, 2);

    let target = LocalStore::new(mirror.path());
    Syncer::new(&target).push_dir(local.path(), "/").unwrap();

    // Push skips hidden entries and empty directories still get created
    assert_eq!(
        local_files(mirror.path()),
        vec!["about us.html", "assets/app.js", "assets/fonts/mono.woff", "index.html"]
    );
    assert!(mirror.path().join("logs").is_dir());
    assert_eq!(
        fs::read_to_string(mirror.path().join("about us.html")).unwrap(),
        "<h1>about</h1>"
    );
}

#[test]
fn test_pull_mirrors_remote_deletions() {
    let remote = remote_site();
    let local = TempDir::new().unwrap();
    let store = LocalStore::new(remote.path());
    let options = SyncOptions {
        delete: true,
        ..SyncOptions::default()
    };

    Syncer::new(&store).pull_dir(local.path(), "/", &options).unwrap();
    fs::remove_dir_all(remote.path().join("assets/fonts")).unwrap();
    fs::remove_file(remote.path().join("index.html")).unwrap();

    let stats = Syncer::new(&store).pull_dir(local.path(), "/", &options).unwrap();

    assert_eq!(stats.files_deleted, 2);
    assert!(!local.path().join("assets/fonts").exists());
    assert!(!local.path().join("index.html").exists());
    assert!(local.path().join("assets/app.js").exists());
}

#[test]
fn test_explicit_transfers() {
    let remote = remote_site();
    let local = TempDir::new().unwrap();
    let store = LocalStore::new(remote.path());
    let syncer = Syncer::new(&store);

    syncer
        .pull_files(local.path(), "/", ["assets/fonts/mono.woff"])
        .unwrap();
    assert_eq!(local_files(local.path()), vec!["assets/fonts/mono.woff"]);

    write_file(local.path(), "blog/2024/post.html", "<p>post</p>");
    let stats = syncer
        .push_files(local.path(), "/", ["blog/2024/post.html"])
        .unwrap();
    assert_eq!(stats.dirs_created, 2);
    assert_eq!(
        fs::read_to_string(remote.path().join("blog/2024/post.html")).unwrap(),
        "<p>post</p>"
    );

    let stats = syncer
        .remove_files("/", ["blog/2024/post.html", "blog/2024/missing.html"])
        .unwrap();
    assert_eq!(stats.files_deleted, 1);
    assert!(!remote.path().join("blog/2024/post.html").exists());
}

#[test]
fn test_missing_store_root_fails_to_connect() {
    let tmp = TempDir::new().unwrap();
    let store = LocalStore::new(tmp.path().join("gone"));

    let result = Syncer::new(&store).pull_dir(tmp.path(), "/", &SyncOptions::default());

    assert!(matches!(result, Err(SyncError::ConnectFailure { .. })));
}
