use crate::{
    error::{Error, Result},
    extract::has_source_extension,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Lists the source files under `dir`, sorted by path.
///
/// `.gitignore` and hidden files are skipped. Files are taken by known
/// source extension, or by glob when `include_patterns` is not empty.
///
/// # Errors
///
/// Returns an error for an invalid glob, a root that is not a directory,
/// or when no file matches.
pub fn collect_sources(dir: impl Into<PathBuf>, include_patterns: &[String]) -> Result<Vec<PathBuf>> {
    Scanner::new(dir, include_patterns)?.scan()
}

/// Collects the input files of a directory, honoring `.gitignore`.
///
/// Without include patterns every file with a known source extension is
/// taken. With patterns, a file is taken when its path relative to the
/// root or its bare name matches any of them.
#[derive(Debug)]
pub(crate) struct Scanner {
    root_dir: PathBuf,
    include: Option<GlobSet>,
}

impl Scanner {
    /// Creates a scanner for `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub(crate) fn new(root_dir: impl Into<PathBuf>, include_patterns: &[String]) -> Result<Self> {
        let include = if include_patterns.is_empty() {
            None
        } else {
            Some(build_globset(include_patterns)?)
        };

        Ok(Self {
            root_dir: root_dir.into(),
            include,
        })
    }

    /// Walks the root directory and returns matching files, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory or nothing matches.
    pub(crate) fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        debug!("Scanning {}", self.root_dir.display());

        let walker = WalkBuilder::new(&self.root_dir)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .hidden(true)
            .follow_links(false)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        let mut errors = 0usize;

        for result in walker {
            match result {
                Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => {
                    if self.should_take(entry.path()) {
                        trace!("Taking {}", entry.path().display());
                        files.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Walk error: {}", e);
                    errors += 1;
                }
            }
        }

        if errors > 0 {
            warn!("Encountered {} errors during scanning (non-fatal)", errors);
        }

        if files.is_empty() {
            return Err(Error::no_files(&self.root_dir));
        }

        // Sort for deterministic ordering
        files.sort();

        debug!("Found {} files", files.len());
        Ok(files)
    }

    fn should_take(&self, path: &Path) -> bool {
        match &self.include {
            Some(include) => {
                let relative = path.strip_prefix(&self.root_dir).unwrap_or(path);
                include.is_match(relative)
                    || path.file_name().is_some_and(|name| include.is_match(name))
            }
            None => has_source_extension(path),
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
}
