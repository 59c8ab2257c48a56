//! Binary file endpoints used by the stream workers.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::WorkerError;

/// Write buffer for the destination file.
const SINK_BUFFER_SIZE: usize = 64 * 1024;

/// A file opened for reading in binary mode.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, WorkerError> {
        let file = File::open(path).map_err(|source| WorkerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Reads everything from the current position to EOF.
    pub fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        let hint = self.file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut buf = Vec::with_capacity(hint);
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A file created (or truncated) for writing in binary mode.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self, WorkerError> {
        let file = File::create(path).map_err(|source| WorkerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::with_capacity(SINK_BUFFER_SIZE, file),
            path: path.to_path_buf(),
        })
    }

    pub fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes)
    }

    /// Flushes buffered bytes to the file.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Flushes buffered bytes and waits until the file contents reach the
    /// storage device.
    pub fn sync(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    /// Syncs and releases the file.
    pub fn close(mut self) -> std::io::Result<()> {
        self.sync()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
