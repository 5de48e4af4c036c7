use crate::config::toml_config::BackupLayout;
use crate::domain::model::BackupArtifact;
use crate::domain::ports::CodeBackup;
use crate::utils::error::{Result, UninstallError};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::{FileOptions, ZipWriter};

const BACKUP_SUFFIX: &str = "_filesystem_code";
const BACKUP_EXTENSION: &str = "zip";

/// Archives the application code into the backups directory.
#[derive(Debug, Clone)]
pub struct ZipCodeBackup {
    root: PathBuf,
    backups_dir: PathBuf,
    ignore_paths: Vec<PathBuf>,
}

impl ZipCodeBackup {
    pub fn new(root: &Path, layout: &BackupLayout) -> Self {
        Self {
            root: root.to_path_buf(),
            backups_dir: root.join(&layout.dir),
            ignore_paths: layout.ignore_paths.iter().map(PathBuf::from).collect(),
        }
    }

    /// Creates the archive stamped with `time` (seconds since the epoch).
    pub fn create_at(&self, time: i64) -> Result<BackupArtifact> {
        if !self.backups_dir.exists() {
            fs::create_dir_all(&self.backups_dir)?;
        }

        let filename = format!("{}{}.{}", time, BACKUP_SUFFIX, BACKUP_EXTENSION);
        let path = self.backups_dir.join(&filename);

        let mut files = Vec::new();
        self.collect_files(&self.root, &mut files)?;
        tracing::debug!(files = files.len(), path = %path.display(), "Creating code backup");

        if let Err(e) = self.write_archive(&path, &files) {
            let _ = fs::remove_file(&path);
            return Err(UninstallError::backup(e.to_string()));
        }

        Ok(BackupArtifact { filename, path })
    }

    fn is_ignored(&self, path: &Path) -> bool {
        if path.starts_with(&self.backups_dir) {
            return true;
        }
        path.strip_prefix(&self.root)
            .map(|relative| self.ignore_paths.iter().any(|p| relative.starts_with(p)))
            .unwrap_or(false)
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            if self.is_ignored(&path) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect_files(&path, files)?;
            } else if file_type.is_file() {
                files.push(path);
            }
        }
        Ok(())
    }

    fn write_archive(&self, path: &Path, files: &[PathBuf]) -> Result<()> {
        let mut zip = ZipWriter::new(BufWriter::new(File::create(path)?));

        for file in files {
            let name = archive_name(&self.root, file);
            zip.start_file::<_, ()>(name, FileOptions::default())?;
            io::copy(&mut File::open(file)?, &mut zip)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Archive entry name: path relative to the root with `/` separators.
fn archive_name(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl CodeBackup for ZipCodeBackup {
    fn create(&self) -> Result<BackupArtifact> {
        self.create_at(chrono::Utc::now().timestamp())
    }
}
