use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use queryable_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    codec::{JsonFormat, records_from_str, records_to_string},
    error::{StoreError, StoreResult},
    record::Record,
};

/// Persists a collection as one JSON array in a file.
///
/// The whole file is read on load and rewritten on save. A missing file, or one that
/// holds only whitespace, means there is no data yet.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    create_missing: bool,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_missing: true,
        }
    }

    pub fn builder(path: impl Into<PathBuf>) -> JsonFileStoreBuilder {
        JsonFileStoreBuilder::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for JsonFileStore {
    fn read_records(&self) -> StoreResult<Option<Vec<Record>>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound && self.create_missing => {
                log::info!("{} does not exist yet", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            log::info!("{} is empty", self.path.display());
            return Ok(None);
        }

        let records = records_from_str(&text)?;
        log::info!("Read {} records from {}", records.len(), self.path.display());

        Ok(Some(records))
    }

    fn write_records(&self, records: &[Record], format: JsonFormat) -> StoreResult<()> {
        let text = records_to_string(records, format)?;

        if self.create_missing {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, text)?;
        log::info!("Wrote {} records to {}", records.len(), self.path.display());

        Ok(())
    }
}

/// Builder for [`JsonFileStore`].
pub struct JsonFileStoreBuilder {
    path: PathBuf,
    create_missing: bool,
}

impl JsonFileStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_missing: true,
        }
    }

    /// Whether a missing file (and missing parent directories on save) is created on
    /// demand. When false, loading from a missing file is an I/O error.
    pub fn create_missing(mut self, create_missing: bool) -> Self {
        self.create_missing = create_missing;
        self
    }
}

impl StoreBackendBuilder for JsonFileStoreBuilder {
    type Backend = JsonFileStore;

    fn build(self) -> StoreResult<Self::Backend> {
        if self.path.is_dir() {
            return Err(StoreError::Backend(format!(
                "{} is a directory",
                self.path.display()
            )));
        }

        Ok(JsonFileStore {
            path: self.path,
            create_missing: self.create_missing,
        })
    }
}
