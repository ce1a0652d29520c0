//! Size-rotated log file
//!
//! Appends to a fixed path. When a write would push the file past its size
//! limit, the current file is renamed to a timestamped backup and a fresh
//! file is opened at the original path:
//!
//! ```text
//! logs/
//! ├── app.log                              # active
//! ├── app-2025-01-15T10-30-45.123.log      # backups, oldest pruned first
//! └── app-2025-01-15T11-02-07.981.log
//! ```
//!
//! Writes are never split across files: a write that does not fit goes
//! entirely to the next file, and a single write larger than the limit is
//! accepted into an empty file as-is.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::common::WriteSync;

/// Timestamp layout of backup names (filesystem-safe, sorts chronologically)
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Size-rotated file implementing `WriteSync`
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    size: u64,
    max_size: u64,
    max_backups: usize,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    ///
    /// Parent directories are created. A `max_size` of zero disables
    /// rotation; a `max_backups` of zero keeps every backup.
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            size,
            max_size,
            max_backups,
        })
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Existing backups of this file, oldest first
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let (dir, stem, ext) = self.name_parts();
        let prefix = format!("{stem}-");

        let mut backups = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&ext))
                .filter(|stamp| stamp.starts_with(|c: char| c.is_ascii_digit()))
            else {
                continue;
            };
            backups.push((backup_order(stamp), entry.path()));
        }

        backups.sort();
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Move the active file aside and start a new one
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;
        self.file = open_append(&self.path)?;
        self.size = 0;

        tracing::info!(
            path = %self.path.display(),
            backup = %backup.display(),
            "rotated log file"
        );

        if let Err(e) = self.prune() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to prune log backups");
        }
        Ok(())
    }

    /// Delete the oldest backups beyond the retention count
    fn prune(&self) -> io::Result<()> {
        if self.max_backups == 0 {
            return Ok(());
        }

        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for old in &backups[..excess] {
            fs::remove_file(old)?;
            tracing::debug!(backup = %old.display(), "removed old log backup");
        }
        Ok(())
    }

    /// Directory, stem and extension (with leading dot, or empty)
    fn name_parts(&self) -> (PathBuf, String, String) {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (dir, stem, ext)
    }

    /// Unused backup path for the current time
    fn backup_path(&self) -> PathBuf {
        let (dir, stem, ext) = self.name_parts();
        let stamp = Local::now().format(BACKUP_TIME_FORMAT);

        let candidate = dir.join(format!("{stem}-{stamp}{ext}"));
        if !candidate.exists() {
            return candidate;
        }

        // Several rotations within one millisecond
        let mut n = 1u32;
        loop {
            let candidate = dir.join(format!("{stem}-{stamp}-{n}{ext}"));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Sort key of a backup stamp: the timestamp, then the collision counter
///
/// `2025-01-15T10-30-45.123-2` orders after `2025-01-15T10-30-45.123` and
/// before `2025-01-15T10-30-45.123-10`.
fn backup_order(stamp: &str) -> (String, u32) {
    if let Some((base, n)) = stamp.rsplit_once('-')
        && let Ok(n) = n.parse::<u32>()
    {
        return (base.to_string(), n);
    }
    (stamp.to_string(), 0)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let len = data.len() as u64;
        if self.max_size > 0 && self.size > 0 && self.size + len > self.max_size {
            self.rotate()?;
        }

        self.file.write_all(data)?;
        self.size += len;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl WriteSync for RotatingFile {
    fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}
