// Tests for ignore rule matching

use munkey::sync::{IgnoreMatcher, IgnoreRule, RootedMatcher};
use munkey::SyncError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_literal_name_rule() {
    let matcher = IgnoreMatcher::build("foo.txt").unwrap();

    assert!(matcher.ignore("foo.txt"));
    assert!(matcher.ignore("foo/foo.txt"));
    assert!(matcher.ignore("x/y/foo.txt"));
    assert!(!matcher.ignore("bar.txt"));
    assert!(!matcher.ignore("barfoo.txt"));
}

#[test]
fn test_literal_name_matches_left_boundary_only() {
    // A literal rule matches any path that continues past the name
    let matcher = IgnoreMatcher::build("doc").unwrap();

    assert!(matcher.ignore("doc"));
    assert!(matcher.ignore("docs/index.html"));
    assert!(matcher.ignore("src/doc.rs"));
    assert!(!matcher.ignore("src/mydoc.rs"));
}

#[test]
fn test_extension_glob() {
    let matcher = IgnoreMatcher::build("*.txt").unwrap();

    assert!(matcher.ignore("foo.txt"));
    assert!(matcher.ignore("nested/foo.txt"));
    assert!(!matcher.ignore("foo.jpg"));
}

#[test]
fn test_directory_prefix_rule() {
    let matcher = IgnoreMatcher::build("doc/").unwrap();

    assert!(matcher.ignore("doc/foo.txt"));
    assert!(matcher.ignore("src/doc/foo.txt"));
    assert!(!matcher.ignore("doc"));
}

#[test]
fn test_single_star_crosses_directories() {
    let matcher = IgnoreMatcher::build("doc/*").unwrap();

    assert!(matcher.ignore("doc/html"));
    assert!(matcher.ignore("doc/html/index.html"));
    assert!(!matcher.ignore("src/index.html"));
}

#[test]
fn test_double_star_glob() {
    let matcher = IgnoreMatcher::build("foo/**/*.txt").unwrap();

    assert!(matcher.ignore("foo/bar/hello.txt"));
    assert!(!matcher.ignore("foo/bar/hello.html"));
    assert!(!matcher.ignore("foo/bar"));
}

#[test]
fn test_mixed_rule_text() {
    let rules = "\
# build output
target/

*.log
   Cargo.lock
";
    let matcher = IgnoreMatcher::build(rules).unwrap();

    assert_eq!(
        matcher.rules(),
        &[
            IgnoreRule::DirectoryPrefix(".git/".into()),
            IgnoreRule::DirectoryPrefix("target/".into()),
            IgnoreRule::Glob("*.log".into()),
            IgnoreRule::LiteralName("Cargo.lock".into()),
        ]
    );
    assert!(matcher.ignore("target/debug/munkey"));
    assert!(matcher.ignore("logs/today.log"));
    assert!(matcher.ignore("Cargo.lock"));
    assert!(!matcher.ignore("# build output"));
    assert!(!matcher.ignore("src/lib.rs"));
}

#[test]
fn test_from_root_reads_gitignore() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".gitignore"), "*.log\nnode_modules/\n").unwrap();

    let matcher = IgnoreMatcher::from_root(tmp.path(), "build/").unwrap();

    assert!(matcher.ignore("server.log"));
    assert!(matcher.ignore("web/node_modules/react/index.js"));
    assert!(matcher.ignore("build/out.bin"));
    assert!(matcher.ignore(".git/HEAD"));
    assert!(!matcher.ignore("src/main.rs"));
}

#[test]
fn test_from_root_without_gitignore() {
    let tmp = TempDir::new().unwrap();

    let matcher = IgnoreMatcher::from_root(tmp.path(), "").unwrap();

    assert!(matcher.ignore(".git/config"));
    assert!(!matcher.ignore("README"));
}

#[test]
fn test_rooted_matcher() {
    let matcher = RootedMatcher::new("/home/site", IgnoreMatcher::build("doc/\n*.tmp").unwrap());

    assert!(matcher.ignore(Path::new("/home/site/doc/index.html")).unwrap());
    assert!(matcher.ignore(Path::new("/home/site/a/b/c.tmp")).unwrap());
    assert!(!matcher.ignore(Path::new("/home/site/src/lib.rs")).unwrap());
    assert!(!matcher.ignore(Path::new("/home/site")).unwrap());
}

#[test]
fn test_rooted_matcher_rejects_relative_paths() {
    let matcher = RootedMatcher::new("/home/site", IgnoreMatcher::build("doc/").unwrap());

    let result = matcher.ignore(Path::new("doc/index.html"));
    assert!(matches!(result, Err(SyncError::NotAbsolutePath { .. })));
}
