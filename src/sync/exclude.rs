//! Ignore rule matching for sync operations.
//!
//! Reads `.gitignore`-style rule text. Lines without wildcards become literal
//! name or directory rules that match anywhere in the tree; lines with
//! wildcards are compiled into one glob set matched against the whole path.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::fs::remote_rel;

/// Rules every matcher carries: repository metadata is never synced.
pub const DEFAULT_RULES: &str = ".git/\n";

/// Anything that can veto a path during a pull.
pub trait IgnorePolicy {
    /// `path` is relative to the sync root, `/`-separated.
    fn ignore(&self, path: &str) -> bool;
}

/// Ignores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnore;

impl IgnorePolicy for NoIgnore {
    fn ignore(&self, _path: &str) -> bool {
        false
    }
}

impl<F> IgnorePolicy for F
where
    F: Fn(&str) -> bool,
{
    fn ignore(&self, path: &str) -> bool {
        self(path)
    }
}

/// One parsed line of rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreRule {
    /// `name`: matches a path starting with `name` or containing `/name`.
    LiteralName(String),
    /// `dir/`: matches a path containing `dir/` anywhere.
    DirectoryPrefix(String),
    /// Anything with a wildcard.
    Glob(String),
}

impl IgnoreRule {
    /// Parse one line; blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let rule = if contains_wildcard(line) {
            IgnoreRule::Glob(line.to_string())
        } else if line.ends_with('/') {
            IgnoreRule::DirectoryPrefix(line.to_string())
        } else {
            IgnoreRule::LiteralName(line.to_string())
        };
        Some(rule)
    }
}

/// Check if a string contains wildcard characters
pub fn contains_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

/// One arm of the literal alternation.
#[derive(Debug, Clone)]
enum Alternative {
    Name { name: String, nested: String },
    Prefix(String),
}

impl Alternative {
    fn is_match(&self, path: &str) -> bool {
        match self {
            Alternative::Name { name, nested } => path.starts_with(name.as_str()) || path.contains(nested.as_str()),
            Alternative::Prefix(prefix) => path.contains(prefix.as_str()),
        }
    }
}

/// Compiled, immutable rule set.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
    alternation: Vec<Alternative>,
    glob_set: GlobSet,
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::compile(Self::parse_rules(DEFAULT_RULES)).unwrap_or_else(|_| Self::empty())
    }
}

impl IgnoreMatcher {
    /// A matcher with no rules at all, not even the defaults.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            alternation: Vec::new(),
            glob_set: GlobSet::empty(),
        }
    }

    /// Compile `rule_text` on top of [`DEFAULT_RULES`].
    pub fn build(rule_text: &str) -> Result<Self> {
        let mut rules = Self::parse_rules(DEFAULT_RULES);
        rules.extend(Self::parse_rules(rule_text));
        Self::compile(rules)
    }

    /// Build from `<root>/.gitignore`, if it exists, followed by `extra`.
    pub fn from_root(root: &Path, extra: &str) -> Result<Self> {
        let ignore_file = root.join(".gitignore");
        let mut text = String::new();
        if ignore_file.is_file() {
            text = fs::read_to_string(&ignore_file)
                .map_err(|e| SyncError::local_io(e, "reading", &ignore_file))?;
            text.push('\n');
        }
        text.push_str(extra);
        Self::build(&text)
    }

    fn parse_rules(text: &str) -> Vec<IgnoreRule> {
        text.lines().filter_map(IgnoreRule::parse).collect()
    }

    fn compile(rules: Vec<IgnoreRule>) -> Result<Self> {
        let mut alternation = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for rule in &rules {
            match rule {
                IgnoreRule::LiteralName(name) => alternation.push(Alternative::Name {
                    name: name.clone(),
                    nested: format!("/{}", name),
                }),
                IgnoreRule::DirectoryPrefix(prefix) => {
                    alternation.push(Alternative::Prefix(prefix.clone()))
                }
                IgnoreRule::Glob(pattern) => {
                    let glob = Glob::new(pattern).map_err(|e| SyncError::InvalidInput {
                        message: format!("Invalid ignore pattern '{}': {}", pattern, e),
                    })?;
                    builder.add(glob);
                }
            }
        }

        let glob_set = builder.build().map_err(|e| SyncError::InvalidInput {
            message: format!("Failed to build ignore patterns: {}", e),
        })?;

        Ok(Self {
            rules,
            alternation,
            glob_set,
        })
    }

    /// Check if a root-relative path is ignored.
    pub fn ignore(&self, path: &str) -> bool {
        self.alternation.iter().any(|alt| alt.is_match(path)) || self.glob_set.is_match(path)
    }

    /// The parsed rules, defaults first.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }
}

impl IgnorePolicy for IgnoreMatcher {
    fn ignore(&self, path: &str) -> bool {
        IgnoreMatcher::ignore(self, path)
    }
}

/// Matcher for absolute paths under a fixed base directory.
#[derive(Debug, Clone)]
pub struct RootedMatcher {
    base: PathBuf,
    matcher: IgnoreMatcher,
}

impl RootedMatcher {
    pub fn new(base: impl Into<PathBuf>, matcher: IgnoreMatcher) -> Self {
        Self {
            base: base.into(),
            matcher,
        }
    }

    /// `path` must be absolute; the base prefix is stripped before matching.
    pub fn ignore(&self, path: &Path) -> Result<bool> {
        if !path.is_absolute() {
            return Err(SyncError::NotAbsolutePath {
                path: path.to_path_buf(),
            });
        }
        let relative = match path.strip_prefix(&self.base) {
            Ok(rel) => remote_rel(rel),
            Err(_) => path.to_string_lossy().to_string(),
        };
        Ok(self.matcher.ignore(&relative))
    }

    pub fn matcher(&self) -> &IgnoreMatcher {
        &self.matcher
    }
}
