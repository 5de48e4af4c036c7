use crate::config::toml_config::CleanupLayout;
use crate::domain::ports::Cleanup;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Files kept when static content directories are emptied.
const STATIC_KEEP: &[&str] = &[".htaccess"];

/// Empties cache, generated code and static content directories.
#[derive(Debug, Clone)]
pub struct DirectoryCleanup {
    cache: Vec<PathBuf>,
    generated: Vec<PathBuf>,
    static_content: Vec<PathBuf>,
}

impl DirectoryCleanup {
    pub fn new(root: &Path, layout: &CleanupLayout) -> Self {
        let resolve =
            |dirs: &[String]| -> Vec<PathBuf> { dirs.iter().map(|d| root.join(d)).collect() };
        Self {
            cache: resolve(&layout.cache),
            generated: resolve(&layout.generated),
            static_content: resolve(&layout.static_content),
        }
    }
}

/// Removes everything inside `dir` except top-level entries named in `keep`.
/// A missing directory is already clean.
fn clear_directory(dir: &Path, keep: &[&str]) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if keep.iter().any(|k| entry.file_name() == *k) {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    tracing::debug!(dir = %dir.display(), removed, "Cleared directory");
    Ok(removed)
}

impl Cleanup for DirectoryCleanup {
    fn clean_cache(&self) -> Result<()> {
        for dir in &self.cache {
            clear_directory(dir, &[])?;
        }
        Ok(())
    }

    fn clear_generated_code(&self) -> Result<()> {
        for dir in &self.generated {
            clear_directory(dir, &[])?;
        }
        Ok(())
    }

    fn clear_static_content(&self) -> Result<()> {
        for dir in &self.static_content {
            clear_directory(dir, STATIC_KEEP)?;
        }
        Ok(())
    }
}
