use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::config::{DEFAULT_TEMP_PREFIX, DEFAULT_TEMP_SUFFIX};
use crate::error::ErddapError;

/// A byte buffer written out to a uniquely named file in the system temp
/// directory. The file is removed by [`TempDataFile::close`] or on drop,
/// whichever comes first.
#[derive(Debug)]
pub struct TempDataFile {
    file: Option<NamedTempFile>,
}

impl TempDataFile {
    pub fn create(data: &[u8]) -> Result<Self, ErddapError> {
        Self::create_with(data, DEFAULT_TEMP_PREFIX, DEFAULT_TEMP_SUFFIX)
    }

    pub fn create_with(data: &[u8], prefix: &str, suffix: &str) -> Result<Self, ErddapError> {
        let mut file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile()
            .map_err(|err| ErddapError::Filesystem(err.to_string()))?;
        file.write_all(data)
            .map_err(|err| ErddapError::Filesystem(err.to_string()))?;
        file.flush()
            .map_err(|err| ErddapError::Filesystem(err.to_string()))?;
        tracing::debug!(path = %file.path().display(), bytes = data.len(), "created temp file");
        Ok(Self { file: Some(file) })
    }

    /// Path of the live file, or `None` once closed.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|file| file.path())
    }

    /// Delete the file now. Calling this again is a no-op.
    pub fn close(&mut self) -> Result<(), ErddapError> {
        match self.file.take() {
            Some(file) => file
                .close()
                .map_err(|err| ErddapError::Filesystem(err.to_string())),
            None => Ok(()),
        }
    }
}

/// Write `data` to a temp file, hand its path to `f`, and delete the file
/// before returning, whether `f` succeeded, failed or panicked.
pub fn with_temp_file<T, F>(data: &[u8], f: F) -> Result<T, ErddapError>
where
    F: FnOnce(&Path) -> Result<T, ErddapError>,
{
    with_temp_file_named(data, DEFAULT_TEMP_PREFIX, DEFAULT_TEMP_SUFFIX, f)
}

pub fn with_temp_file_named<T, F>(
    data: &[u8],
    prefix: &str,
    suffix: &str,
    f: F,
) -> Result<T, ErddapError>
where
    F: FnOnce(&Path) -> Result<T, ErddapError>,
{
    let mut temp = TempDataFile::create_with(data, prefix, suffix)?;
    let result = match temp.path() {
        Some(path) => f(path),
        None => Err(ErddapError::Filesystem("temp file closed early".to_string())),
    };
    let closed = temp.close();
    let value = result?;
    closed?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn file_holds_data_and_naming() {
        let seen = with_temp_file(b"CDF\x01payload", |path| {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with("erddap_fetch_"));
            assert!(name.ends_with(".nc"));
            Ok(fs::read(path).unwrap())
        })
        .unwrap();
        assert_eq!(seen, b"CDF\x01payload");
    }

    #[test]
    fn removed_after_success() {
        let path = with_temp_file(b"abc", |path| Ok(path.to_path_buf())).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn removed_after_failure() {
        let mut captured = PathBuf::new();
        let err = with_temp_file(b"abc", |path| -> Result<(), ErddapError> {
            captured = path.to_path_buf();
            assert!(captured.exists());
            Err(ErddapError::DatasetParse {
                name: "x.nc".to_string(),
                message: "bad header".to_string(),
            })
        })
        .unwrap_err();
        assert_matches!(err, ErddapError::DatasetParse { .. });
        assert!(!captured.exists());
    }

    #[test]
    fn removed_after_panic() {
        let captured = std::sync::Mutex::new(PathBuf::new());
        let outcome = std::panic::catch_unwind(|| {
            let _ = with_temp_file(b"abc", |path| -> Result<(), ErddapError> {
                *captured.lock().unwrap() = path.to_path_buf();
                panic!("reader blew up");
            });
        });
        assert!(outcome.is_err());
        let path = captured.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert!(!path.as_os_str().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn close_twice_is_safe() {
        let mut temp = TempDataFile::create(b"abc").unwrap();
        let path = temp.path().unwrap().to_path_buf();
        temp.close().unwrap();
        temp.close().unwrap();
        assert!(temp.path().is_none());
        assert!(!path.exists());
    }
}
