//! Exclude Rules
//!
//! Which project-relative paths never ship. The scanner applies them while
//! walking the project; deletion mode asks the same question about remote
//! paths, so a file the project leaves out on purpose is never removed from
//! the server just because it is missing locally.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use super::RelPath;

/// Per-project ignore file, gitignore syntax
pub const IGNORE_FILE: &str = ".crignore";

/// Directories never worth shipping
pub const ALWAYS_SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "htmlcov", "venv"];

/// Local files that configure this tool and stay local
pub const ALWAYS_SKIPPED_FILES: &[&str] = &[".crship.toml", IGNORE_FILE];

/// Hidden directories and the always-skipped ones
pub fn is_skipped_dir(name: &str) -> bool {
    (name.starts_with('.') && name != "." && name != "..")
        || ALWAYS_SKIPPED_DIRS.contains(&name)
}

/// Built-in skips, configured patterns and the ignore files of a project
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    /// Configured `exclude` patterns, anchored at the project root
    patterns: Option<Gitignore>,
    /// Ignore files found while walking, keyed by their directory
    /// (`None` for the project root)
    files: Vec<(Option<RelPath>, Gitignore)>,
}

impl ExcludeRules {
    /// Rules with the built-in skips only
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in skips plus configured gitignore-style patterns.
    ///
    /// Blank lines and `#` comments are ignored.
    pub fn with_patterns(patterns: &[String]) -> Result<Self, ignore::Error> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let trimmed = pattern.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            builder.add_line(None, trimmed)?;
        }
        Ok(Self {
            patterns: Some(builder.build()?),
            files: Vec::new(),
        })
    }

    /// Add a gitignore-syntax file whose patterns apply below `dir`.
    ///
    /// Lines that parse are kept even when others fail; the error reports
    /// the bad ones.
    pub fn add_ignore_file(&mut self, dir: Option<RelPath>, file: &Path) -> Result<(), ignore::Error> {
        let (matcher, error) = Gitignore::new(file);
        if !matcher.is_empty() {
            self.files.push((dir, matcher));
        }
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn ignore_file_count(&self) -> usize {
        self.files.len()
    }

    /// True when `path` would be left out of the package.
    pub fn is_excluded(&self, path: &RelPath, is_dir: bool) -> bool {
        let mut segments: Vec<&str> = path.as_str().split('/').collect();
        let Some(name) = segments.pop() else {
            return false;
        };
        if segments.iter().any(|dir| is_skipped_dir(dir)) {
            return true;
        }
        let skipped_name = if is_dir {
            is_skipped_dir(name)
        } else {
            ALWAYS_SKIPPED_FILES.contains(&name)
        };
        if skipped_name {
            return true;
        }

        if let Some(patterns) = &self.patterns {
            if patterns
                .matched_path_or_any_parents(path.as_str(), is_dir)
                .is_ignore()
            {
                return true;
            }
        }

        self.files.iter().any(|(dir, matcher)| {
            let below = match dir {
                None => Some(path.as_str()),
                Some(dir) => path
                    .as_str()
                    .strip_prefix(dir.as_str())
                    .and_then(|rest| rest.strip_prefix('/')),
            };
            below.is_some_and(|rest| matcher.matched_path_or_any_parents(rest, is_dir).is_ignore())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn builtin_rules_skip_caches_and_hidden_dirs() {
        let rules = ExcludeRules::builtin();
        assert!(rules.is_excluded(&rel("venv/lib/site.py"), false));
        assert!(rules.is_excluded(&rel("app/__pycache__/x.pyc"), false));
        assert!(rules.is_excluded(&rel(".git/HEAD"), false));
        assert!(rules.is_excluded(&rel(".crship.toml"), false));
        assert!(!rules.is_excluded(&rel(".env"), false));
        assert!(!rules.is_excluded(&rel("static/app.css"), false));
    }

    #[test]
    fn configured_patterns_match_files_below_a_dir() {
        let rules = ExcludeRules::with_patterns(&["media/".into(), "*.log".into(), "# note".into()])
            .unwrap();
        assert!(rules.is_excluded(&rel("media/upload.png"), false));
        assert!(rules.is_excluded(&rel("logs/debug.log"), false));
        assert!(!rules.is_excluded(&rel("static/media.css"), false));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(ExcludeRules::with_patterns(&["a/**[".into()]).is_err());
    }

    #[test]
    fn nested_ignore_file_applies_below_its_directory_only() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(IGNORE_FILE);
        fs::write(&file, "/drafts/\n").unwrap();

        let mut rules = ExcludeRules::builtin();
        rules.add_ignore_file(Some(rel("blog")), &file).unwrap();
        assert_eq!(rules.ignore_file_count(), 1);
        assert!(rules.is_excluded(&rel("blog/drafts/post.md"), false));
        assert!(!rules.is_excluded(&rel("drafts/post.md"), false));
        assert!(!rules.is_excluded(&rel("blogroll/drafts/post.md"), false));
    }
}
