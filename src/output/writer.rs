//! CSV sheet writer
//!
//! Each sheet is written to `<dir>/<stem>_<Sheet>.csv`. A file left by an
//! earlier run is renamed to `<stem>_<Sheet>_backup<timestamp>.csv` first.

use super::rows::SheetRow;
use crate::error::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file stem for exported sheets
pub const DEFAULT_STEM: &str = "vk-harvest";

/// Exported sheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Likes,
    Comments,
    Friends,
    Keywords,
    Groups,
}

impl Sheet {
    /// Name used in file names
    pub fn name(self) -> &'static str {
        match self {
            Sheet::Likes => "Likes",
            Sheet::Comments => "Comments",
            Sheet::Friends => "Friends",
            Sheet::Keywords => "Keywords",
            Sheet::Groups => "Groups",
        }
    }
}

impl std::fmt::Display for Sheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes sheets into one directory under a common stem
#[derive(Debug, Clone)]
pub struct SheetWriter {
    dir: PathBuf,
    stem: String,
}

impl Default for SheetWriter {
    fn default() -> Self {
        Self::new(".")
    }
}

impl SheetWriter {
    /// Writer into `dir` with the default stem
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stem: DEFAULT_STEM.to_string(),
        }
    }

    /// Set the file stem
    #[must_use]
    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = stem.into();
        self
    }

    /// Path a sheet is written to
    pub fn sheet_path(&self, sheet: Sheet) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", self.stem, sheet))
    }

    /// Write `rows` with a header line, backing up any previous file.
    ///
    /// Returns the path written and the number of rows.
    pub fn write<T: SheetRow>(&self, rows: &[T]) -> Result<(PathBuf, usize)> {
        fs::create_dir_all(&self.dir)?;

        let path = self.sheet_path(T::SHEET);
        if path.exists() {
            let backup = self.backup(&path, T::SHEET)?;
            info!("Moved previous {} sheet to {}", T::SHEET, backup.display());
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(T::HEADERS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok((path, rows.len()))
    }

    /// Rename `path` to a backup name that is not taken yet
    fn backup(&self, path: &Path, sheet: Sheet) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let base = format!("{}_{}_backup{stamp}", self.stem, sheet);

        let mut candidate = self.dir.join(format!("{base}.csv"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{base}_{n}.csv"));
            n += 1;
            if n > 1000 {
                return Err(Error::output(format!(
                    "no free backup name for {}",
                    path.display()
                )));
            }
        }

        fs::rename(path, &candidate)?;
        Ok(candidate)
    }
}
