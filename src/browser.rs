//! In-terminal file browser used to pick a sequence file.
//!
//! Lists sub-directories and files with a recognized sequence extension
//! (`.fq`, `.fastq`, `.fa`, `.fasta`, `.fas`, `.fna`, each optionally
//! gzipped). The filter does not depend on the selected format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::SequenceFormat;

#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("Cannot read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of activating an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// Still browsing (moved into a directory)
    Pending,
    Selected(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// True for files the picker offers.
pub fn is_sequence_file<P: AsRef<Path>>(path: P) -> bool {
    SequenceFormat::from_path(path).is_some()
}

#[derive(Debug, Clone)]
pub struct FileBrowser {
    dir: PathBuf,
    entries: Vec<BrowserEntry>,
    selected: usize,
}

impl FileBrowser {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, BrowseError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = list_entries(&dir)?;
        Ok(Self {
            dir,
            entries,
            selected: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[BrowserEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&BrowserEntry> {
        self.entries.get(self.selected)
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    /// Enters the selected directory or selects the selected file.
    pub fn enter(&mut self) -> Result<PickOutcome, BrowseError> {
        let Some(entry) = self.selected_entry().cloned() else {
            return Ok(PickOutcome::Cancelled);
        };
        if entry.is_dir {
            self.change_dir(entry.path)?;
            Ok(PickOutcome::Pending)
        } else {
            Ok(PickOutcome::Selected(entry.path))
        }
    }

    /// Moves to the parent directory, if there is one.
    pub fn parent(&mut self) -> Result<(), BrowseError> {
        if let Some(parent) = parent_of(&self.dir) {
            self.change_dir(parent)?;
        }
        Ok(())
    }

    fn change_dir(&mut self, dir: PathBuf) -> Result<(), BrowseError> {
        // Keep the current listing if the new one cannot be read
        let entries = list_entries(&dir)?;
        self.dir = dir;
        self.entries = entries;
        self.selected = 0;
        Ok(())
    }
}

fn parent_of(dir: &Path) -> Option<PathBuf> {
    let canonical = fs::canonicalize(dir).ok()?;
    canonical.parent().map(Path::to_path_buf)
}

/// `..` first, then directories, then sequence files; each group sorted by name.
fn list_entries(dir: &Path) -> Result<Vec<BrowserEntry>, BrowseError> {
    let read_err = |source| BrowseError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Follows symlinks; broken links are skipped
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            dirs.push(BrowserEntry {
                name,
                path,
                is_dir: true,
            });
        } else if is_sequence_file(&path) {
            files.push(BrowserEntry {
                name,
                path,
                is_dir: false,
            });
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if let Some(parent) = parent_of(dir) {
        entries.push(BrowserEntry {
            name: "..".to_string(),
            path: parent,
            is_dir: true,
        });
    }
    entries.extend(dirs);
    entries.extend(files);
    Ok(entries)
}
