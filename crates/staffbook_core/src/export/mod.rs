//! Destinations for exported backup documents.
//!
//! # Responsibility
//! - Accept a file name plus serialized export and deliver it somewhere.
//!
//! # Invariants
//! - File names are plain names; sinks reject anything with a path component.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Delivery failure of an export sink.
#[derive(Debug)]
pub enum ExportSinkError {
    InvalidFileName(String),
    Io(std::io::Error),
}

impl Display for ExportSinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFileName(name) => write!(f, "invalid export file name `{name}`"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportSinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFileName(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportSinkError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Receives one serialized export per call.
pub trait ExportSink {
    fn write_export(&mut self, file_name: &str, contents: &str) -> Result<(), ExportSinkError>;
}

/// Writes exports as files under a directory, created on first use.
#[derive(Debug, Clone)]
pub struct DirectoryExportSink {
    dir: PathBuf,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectoryExportSink {
    fn write_export(&mut self, file_name: &str, contents: &str) -> Result<(), ExportSinkError> {
        ensure_plain_file_name(file_name)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, contents)?;
        info!(
            "event=export_write module=export status=ok bytes={} path={}",
            contents.len(),
            path.display()
        );
        Ok(())
    }
}

/// Keeps exports in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct BufferedExportSink {
    files: Vec<(String, String)>,
}

impl BufferedExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[(String, String)] {
        &self.files
    }

    /// Contents of the most recent export.
    pub fn last(&self) -> Option<&str> {
        self.files.last().map(|(_, contents)| contents.as_str())
    }
}

impl ExportSink for BufferedExportSink {
    fn write_export(&mut self, file_name: &str, contents: &str) -> Result<(), ExportSinkError> {
        ensure_plain_file_name(file_name)?;
        self.files
            .push((file_name.to_string(), contents.to_string()));
        Ok(())
    }
}

fn ensure_plain_file_name(file_name: &str) -> Result<(), ExportSinkError> {
    let is_plain = !file_name.is_empty()
        && file_name != "."
        && file_name != ".."
        && !file_name.contains(['/', '\\']);
    if is_plain {
        Ok(())
    } else {
        Err(ExportSinkError::InvalidFileName(file_name.to_string()))
    }
}
