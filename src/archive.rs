//! # Archive Writer
//!
//! Hourly ZIP archives holding a single `metrics.csv` member.
//!
//! Layout on disk: `<root>/<YYYY-MM-DD>/<HH-MM-SS>.zip`, named after the UTC
//! time the archive was opened. Archives are never overwritten: a second
//! archive opened within the same second gets a `-1`, `-2`, ... suffix.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{HumidityError, Result};
use crate::reading::{SensorReading, COLUMNS};

/// Name of the CSV member inside every archive
pub const MEMBER_NAME: &str = "metrics.csv";

/// Suffixes tried before giving up on a same-second archive name
const MAX_NAME_COLLISIONS: u32 = 100;

/// Default archive root, relative to the user's home directory
pub const DEFAULT_RELATIVE_ROOT: &str = ".garden/metrics/pots/humidity";

/// Default archive root: `<home>/.garden/metrics/pots/humidity`
///
/// # Errors
///
/// Returns `HomeDirUnavailable` if the home directory cannot be determined
pub fn default_root() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_RELATIVE_ROOT))
        .ok_or(HumidityError::HomeDirUnavailable)
}

/// Archive path for a bucket opened at `now`
pub fn archive_path(root: &Path, now: DateTime<Utc>) -> PathBuf {
    root.join(now.format("%Y-%m-%d").to_string())
        .join(format!("{}.zip", now.format("%H-%M-%S")))
}

fn suffixed_archive_path(root: &Path, now: DateTime<Utc>, suffix: u32) -> PathBuf {
    if suffix == 0 {
        return archive_path(root, now);
    }
    root.join(now.format("%Y-%m-%d").to_string())
        .join(format!("{}-{}.zip", now.format("%H-%M-%S"), suffix))
}

/// An open archive being filled with readings
///
/// Rows are buffered; the archive is only complete and readable by other
/// tools after [`ArchiveWriter::close`].
pub struct ArchiveWriter {
    writer: csv::Writer<ZipWriter<File>>,
    path: PathBuf,
    rows: u64,
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl ArchiveWriter {
    /// Create the archive for a bucket opened at `now` under `root`
    ///
    /// Uses [`archive_path`], or the first free suffixed name when an archive
    /// for the same second already exists.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveWriter::open`]; `AlreadyExists` once every suffix is taken
    pub fn create(root: &Path, now: DateTime<Utc>) -> Result<Self> {
        for suffix in 0..MAX_NAME_COLLISIONS {
            match Self::open(suffixed_archive_path(root, now, suffix)) {
                Err(HumidityError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Archive name taken (suffix {}), trying next", suffix);
                }
                other => return other,
            }
        }

        Err(HumidityError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("No free archive name for {}", archive_path(root, now).display()),
        )))
    }

    /// Create a new archive at `path` and write the CSV header
    ///
    /// Missing parent directories are created. An existing file at `path`
    /// is left untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created (`AlreadyExists`
    /// if `path` exists), or the member cannot be started
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(MEMBER_NAME, options)?;

        let mut writer = csv::Writer::from_writer(zip);
        writer.write_record(COLUMNS)?;

        info!("Writing to {}", path.display());

        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    /// Append one reading as a CSV row
    pub fn append(&mut self, reading: &SensorReading) -> Result<()> {
        self.writer.write_record(reading.to_record())?;
        self.rows += 1;
        Ok(())
    }

    /// Flush pending rows and finalize the ZIP container
    ///
    /// # Returns
    ///
    /// * `Result<PathBuf>` - Path of the finished archive
    pub fn close(self) -> Result<PathBuf> {
        let zip = self
            .writer
            .into_inner()
            .map_err(|e| HumidityError::Io(e.into_error()))?;

        let mut file = zip.finish()?;
        file.flush()?;
        file.sync_all()?;

        debug!("Closed {} ({} rows)", self.path.display(), self.rows);
        Ok(self.path)
    }

    /// Path of the archive on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// Read back the CSV member of an archive (test helper)
#[cfg(test)]
pub(crate) fn read_member(path: &Path) -> String {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1, "Archive must hold exactly one member");

    let mut member = archive.by_name(MEMBER_NAME).unwrap();
    assert_eq!(member.compression(), CompressionMethod::Deflated);

    let mut contents = String::new();
    member.read_to_string(&mut contents).unwrap();
    contents
}
