use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::CalibrationError;
use crate::record::CalibrationRecord;

/// Identifier of the active calibration when a device has a single camera.
pub const DEFAULT_CALIBRATION_KEY: &str = "camera_calibration_data";

/// Persistence for a single active calibration record.
///
/// Implementations must make a completed `write` visible to the next `read`, and a
/// `write` must replace the previous record atomically: readers see either the old
/// or the new record, never a mix.
pub trait CalibrationBackend: Send + Sync {
    /// Read the active record, if any.
    fn read(&self) -> Result<Option<CalibrationRecord>, CalibrationError>;

    /// Replace the active record.
    fn write(&self, record: &CalibrationRecord) -> Result<(), CalibrationError>;

    /// Remove the active record. Removing a missing record is not an error.
    fn remove(&self) -> Result<(), CalibrationError>;
}

/// Keeps the active record in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    record: RwLock<Option<CalibrationRecord>>,
}

impl InMemoryBackend {
    /// Create a backend already holding a record.
    pub fn with_record(record: CalibrationRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

impl CalibrationBackend for InMemoryBackend {
    fn read(&self) -> Result<Option<CalibrationRecord>, CalibrationError> {
        let guard = self
            .record
            .read()
            .map_err(|_| CalibrationError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn write(&self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        let mut guard = self
            .record
            .write()
            .map_err(|_| CalibrationError::LockPoisoned)?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), CalibrationError> {
        let mut guard = self
            .record
            .write()
            .map_err(|_| CalibrationError::LockPoisoned)?;
        *guard = None;
        Ok(())
    }
}

/// Keeps the active record in a JSON file, one file per device key.
///
/// Writes go to a temporary file in the same directory which is then renamed over
/// the target, so concurrent readers never observe a partial record.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Create a backend storing the record for `key` under `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the calibration files. Created on first write.
    /// * `key` - Identifier of the device or camera, used as file stem.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self::at_path(dir.as_ref().join(format!("{key}.json")))
    }

    /// Create a backend storing the record at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The path of the calibration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_error(&self, err: std::io::Error) -> CalibrationError {
        CalibrationError::FileError(self.path.clone(), err)
    }
}

impl CalibrationBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<CalibrationRecord>, CalibrationError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.file_error(e)),
        };

        let record: CalibrationRecord = serde_json::from_slice(&data)?;
        record.check_schema()?;

        Ok(Some(record))
    }

    fn write(&self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CalibrationError::LockPoisoned)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.file_error(e))?;

        let tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.file_error(e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, record)?;
            writer.flush().map_err(|e| self.file_error(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.file_error(e))?;

        tmp.persist(&self.path)
            .map_err(|e| self.file_error(e.error))?;

        log::debug!("Wrote calibration to {}", self.path.display());

        Ok(())
    }

    fn remove(&self) -> Result<(), CalibrationError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CalibrationError::LockPoisoned)?;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.file_error(e)),
        }
    }
}
