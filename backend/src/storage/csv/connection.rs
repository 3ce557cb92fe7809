use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

/// Handle to the data directory all CSV repositories write under.
#[derive(Debug, Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
}

impl CsvConnection {
    /// Open (and create if needed) the data directory.
    pub fn new(base_directory: impl AsRef<Path>) -> Result<Self> {
        let base_directory = base_directory.as_ref().to_path_buf();
        fs::create_dir_all(&base_directory)
            .with_context(|| format!("Failed to create data directory {:?}", base_directory))?;
        info!("Using data directory {:?}", base_directory);
        Ok(Self { base_directory })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Path of a data file inside the base directory.
    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Write a file atomically: temp file first, then rename into place.
    pub fn write_atomic(&self, file_name: &str, content: &[u8]) -> Result<()> {
        let path = self.data_file(file_name);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move {:?} into place", temp_path))?;
        Ok(())
    }
}
