use std::fmt;
use std::fs;
use std::path::Path;

use reqwest::Url;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::error::ErddapError;
use crate::http::{BasicAuth, HttpTransport, default_transport};
use crate::scratch::with_temp_file_named;

/// Failure reported by a [`DatasetReader`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    /// The reader cannot open datasets from memory in this build.
    #[error("in-memory open is not supported")]
    InMemoryUnsupported,

    #[error("malformed dataset: {0}")]
    Malformed(String),

    #[error("i/o error: {0}")]
    Io(String),
}

/// Opens scientific datasets from bytes or from a file on disk.
pub trait DatasetReader: Send + Sync {
    type Dataset;

    fn open_in_memory(&self, name: &str, bytes: &[u8]) -> Result<Self::Dataset, OpenError>;

    /// Open the file at `path`, naming the dataset `name` rather than after
    /// the file.
    fn open_path(&self, name: &str, path: &Path) -> Result<Self::Dataset, OpenError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Classic,
    Offset64,
    Data64,
    NetCdf4,
}

impl DatasetFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";
        match bytes {
            [b'C', b'D', b'F', 1, ..] => Some(DatasetFormat::Classic),
            [b'C', b'D', b'F', 2, ..] => Some(DatasetFormat::Offset64),
            [b'C', b'D', b'F', 5, ..] => Some(DatasetFormat::Data64),
            _ if bytes.starts_with(HDF5_SIGNATURE) => Some(DatasetFormat::NetCdf4),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetFormat::Classic => write!(f, "netcdf3-classic"),
            DatasetFormat::Offset64 => write!(f, "netcdf3-64bit-offset"),
            DatasetFormat::Data64 => write!(f, "netcdf3-64bit-data"),
            DatasetFormat::NetCdf4 => write!(f, "netcdf4"),
        }
    }
}

/// A recognized dataset payload, fully owned and independent of any file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    name: String,
    format: DatasetFormat,
    bytes: Vec<u8>,
}

impl RawDataset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> DatasetFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Reader for the netCDF family that identifies the container by its
/// signature and keeps the payload as-is.
#[derive(Debug, Clone, Copy)]
pub struct SniffReader {
    in_memory: bool,
}

impl Default for SniffReader {
    fn default() -> Self {
        Self { in_memory: true }
    }
}

impl SniffReader {
    /// Behave like a library build without in-memory support.
    pub fn without_memory_support() -> Self {
        Self { in_memory: false }
    }

    fn recognize(name: String, bytes: Vec<u8>) -> Result<RawDataset, OpenError> {
        let format = DatasetFormat::sniff(&bytes).ok_or_else(|| {
            OpenError::Malformed(format!("{name}: unknown file signature"))
        })?;
        Ok(RawDataset {
            name,
            format,
            bytes,
        })
    }
}

impl DatasetReader for SniffReader {
    type Dataset = RawDataset;

    fn open_in_memory(&self, name: &str, bytes: &[u8]) -> Result<RawDataset, OpenError> {
        if !self.in_memory {
            return Err(OpenError::InMemoryUnsupported);
        }
        Self::recognize(name.to_string(), bytes.to_vec())
    }

    fn open_path(&self, name: &str, path: &Path) -> Result<RawDataset, OpenError> {
        let bytes = fs::read(path).map_err(|err| OpenError::Io(err.to_string()))?;
        Self::recognize(name.to_string(), bytes)
    }
}

/// Name of the virtual in-memory resource: the last non-empty path segment
/// of the url, falling back to the host, then to the url itself.
pub fn resource_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_string)
        .or_else(|| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

pub struct DatasetLoader<'a, R> {
    transport: &'a dyn HttpTransport,
    reader: R,
    temp_prefix: String,
    temp_suffix: String,
}

impl<'a, R: DatasetReader> DatasetLoader<'a, R> {
    pub fn new(transport: &'a dyn HttpTransport, reader: R) -> Self {
        Self::with_config(transport, reader, &ClientConfig::default())
    }

    pub fn with_config(
        transport: &'a dyn HttpTransport,
        reader: R,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            reader,
            temp_prefix: config.temp_prefix.clone(),
            temp_suffix: config.temp_suffix.clone(),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Fetch `url` and open it as a dataset.
    ///
    /// The payload is opened from memory first. Only when the reader reports
    /// that in-memory open is unsupported is it written to a temp file and
    /// opened from there under the same name; the file is gone by the time
    /// this returns.
    pub fn load(&self, url: &str, auth: Option<&BasicAuth>) -> Result<R::Dataset, ErddapError> {
        let bytes = self.transport.get(url, auth)?;
        self.open_bytes(&resource_name(url), &bytes)
    }

    pub fn open_bytes(&self, name: &str, bytes: &[u8]) -> Result<R::Dataset, ErddapError> {
        match self.reader.open_in_memory(name, bytes) {
            Ok(dataset) => Ok(dataset),
            Err(OpenError::InMemoryUnsupported) => {
                tracing::debug!(name, "in-memory open unsupported, using temp file");
                with_temp_file_named(bytes, &self.temp_prefix, &self.temp_suffix, |path| {
                    self.reader
                        .open_path(name, path)
                        .map_err(|err| parse_error(name, err))
                })
            }
            Err(err) => Err(parse_error(name, err)),
        }
    }
}

fn parse_error(name: &str, err: OpenError) -> ErddapError {
    ErddapError::DatasetParse {
        name: name.to_string(),
        message: err.to_string(),
    }
}

/// Fetch `url` with the process-wide transport and open it with `reader`.
pub fn load_dataset<R: DatasetReader>(
    reader: R,
    url: &str,
    auth: Option<&BasicAuth>,
) -> Result<R::Dataset, ErddapError> {
    let transport = default_transport()?;
    DatasetLoader::new(transport, reader).load(url, auth)
}
