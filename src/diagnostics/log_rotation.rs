//! Size-based rotating log file writer.
//!
//! [`RotatingFileWriter`] appends to a single active log file. When a write
//! would push the file past `max_size` bytes, the files are shifted:
//!
//! ```text
//! desktop-updater.log   -> desktop-updater.1.log
//! desktop-updater.1.log -> desktop-updater.2.log
//! ...
//! ```
//!
//! and a fresh active file is opened. At most `max_files` files exist at
//! any time, the active one included; the oldest is deleted.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A size-capped, rotating log file writer.
pub struct RotatingFileWriter {
    path: PathBuf,
    file: File,
    written: u64,
    max_size: u64,
    max_files: usize,
}

impl RotatingFileWriter {
    /// Open (or create) the log file at `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the parent directory cannot be created or
    /// the file cannot be opened.
    pub fn open(path: &Path, max_size: u64, max_files: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written,
            max_size: max_size.max(1),
            max_files: max_files.max(1),
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.max_files > 1 {
            let oldest = rotated_path(&self.path, self.max_files - 1);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for i in (1..self.max_files - 1).rev() {
                let from = rotated_path(&self.path, i);
                if from.exists() {
                    fs::rename(&from, rotated_path(&self.path, i + 1))?;
                }
            }
            fs::rename(&self.path, rotated_path(&self.path, 1))?;
            self.file = open_append(&self.path)?;
        } else {
            self.file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Every file a writer on `path` may produce, active file first.
#[must_use]
pub fn log_file_paths(path: &Path, max_files: usize) -> Vec<PathBuf> {
    let mut paths = vec![path.to_path_buf()];
    paths.extend((1..max_files.max(1)).map(|i| rotated_path(path, i)));
    paths
}

fn open_append(path: &Path) -> io::Result<File> {
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// `name.log` with index 2 becomes `name.2.log`.
fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}.{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{index}"),
    };
    path.with_file_name(name)
}
