//! Gitignore-aware collection of files to format.
//!
//! Respects .gitignore, .git/info/exclude, and the global gitignore, then
//! filters by the configured include globs and any extra ignore globs.
//! Ordering is deterministic for stable output and tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

pub struct SourceWalker {
    include: GlobSet,
    ignore: GlobSet,
}

impl SourceWalker {
    /// `include` selects the files to format (e.g. `**/*.rs`); `ignore`
    /// prunes on top of the ignore files.
    pub fn new(include: &[String], ignore: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_globset(include).context("invalid include glob")?,
            ignore: build_globset(ignore).context("invalid ignore glob")?,
        })
    }

    /// Collect matching files under `root`, sorted.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut walker = WalkBuilder::new(root);
        walker
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);

        let mut files: Vec<PathBuf> = walker
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| {
                let rel = path.strip_prefix(root).unwrap_or(path);
                self.include.is_match(rel) && !self.ignore.is_match(rel)
            })
            .collect();

        files.sort();
        files
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
