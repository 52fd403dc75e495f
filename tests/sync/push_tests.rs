// Tests for recursive push against the mock store

use munkey::sync::Syncer;
use munkey::SyncError;
use tempfile::TempDir;

use crate::support::{write_file, MockStore};

fn local_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "index.html", "<html></html>");
    write_file(tmp.path(), "css/site.css", "body {}");
    write_file(tmp.path(), "img/icons/logo.svg", "<svg/>");
    write_file(tmp.path(), ".env", "SECRET=1");
    write_file(tmp.path(), ".git/HEAD", "ref: refs/heads/main");
    tmp
}

#[test]
fn test_push_tree() {
    let store = MockStore::empty();
    let tmp = local_tree();

    let stats = Syncer::new(&store).push_dir(tmp.path(), "/").unwrap();

    assert_eq!(
        store.files(),
        vec!["/css/site.css", "/img/icons/logo.svg", "/index.html"]
    );
    assert_eq!(store.content("/img/icons/logo.svg").as_deref(), Some("<svg/>"));
    assert!(store.is_dir("/img/icons"));
    assert_eq!(stats.files_copied, 3);
    assert_eq!(stats.dirs_created, 3);
    assert_eq!(stats.bytes_transferred, 13 + 7 + 6);
    assert_eq!(store.closes(), 1);
}

#[test]
fn test_parent_directory_created_before_its_files() {
    let store = MockStore::empty();
    let tmp = local_tree();

    Syncer::new(&store).push_dir(tmp.path(), "/").unwrap();

    let calls = store.calls();
    let position = |call: &str| calls.iter().position(|c| c == call).unwrap();
    assert!(position("mkdir /img") < position("mkdir /img/icons"));
    assert!(position("mkdir /img/icons") < position("put /img/icons/logo.svg"));
}

#[test]
fn test_push_twice_tolerates_existing_dirs() {
    let store = MockStore::empty();
    let tmp = local_tree();

    Syncer::new(&store).push_dir(tmp.path(), "/").unwrap();
    write_file(tmp.path(), "css/site.css", "body { margin: 0 }");
    store.reset_calls();

    let stats = Syncer::new(&store).push_dir(tmp.path(), "/").unwrap();

    assert_eq!(stats.dirs_created, 0);
    assert_eq!(store.count("mkdir"), 3);
    assert_eq!(store.count("put"), 3);
    assert_eq!(store.content("/css/site.css").as_deref(), Some("body { margin: 0 }"));
    assert_eq!(store.closes(), 1);
}

#[test]
fn test_push_into_subdirectory() {
    let store = MockStore::empty();
    store.add_dir("/www");
    let tmp = local_tree();

    Syncer::new(&store).push_dir(tmp.path(), "/www").unwrap();

    assert!(store.is_dir("/www/css"));
    assert_eq!(store.content("/www/index.html").as_deref(), Some("<html></html>"));
}

#[test]
fn test_mkdir_permission_on_existing_dir_is_swallowed() {
    let store = MockStore::empty();
    store.add_dir("/css");
    store.deny("/css");
    let tmp = local_tree();

    Syncer::new(&store).push_dir(tmp.path(), "/").unwrap();

    assert_eq!(store.content("/css/site.css").as_deref(), Some("body {}"));
}

#[test]
fn test_upload_failure_propagates() {
    let store = MockStore::empty();
    store.deny("/index.html");
    let tmp = local_tree();

    let result = Syncer::new(&store).push_dir(tmp.path(), "/");

    assert!(matches!(result, Err(SyncError::RemotePermission { .. })));
    assert_eq!(store.closes(), 1);
}

#[test]
fn test_push_to_missing_remote_root_fails() {
    let store = MockStore::empty();
    let tmp = local_tree();

    let result = Syncer::new(&store).push_dir(tmp.path(), "/missing");

    assert!(matches!(result, Err(SyncError::RemoteNotFound { .. })));
    assert_eq!(store.closes(), 1);
}
