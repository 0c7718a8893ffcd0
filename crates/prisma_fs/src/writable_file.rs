// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek as _, SeekFrom, Write as _};
use std::os::fd::OwnedFd;
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::error::{Error, Result};
use crate::file_system::WritableFile;
use crate::sys;

/// How [`PrismaWritableFile::open`] treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file, or truncate it if it exists.
    Truncate,
    /// Create the file if it does not exist and write after its existing content.
    Append,
}

/// A buffered, append-only file handle.
///
/// Bytes written with [`append`](Self::append) are buffered in memory and pushed
/// to the operating system by [`flush`](Self::flush), [`sync`](Self::sync),
/// [`tell`](Self::tell) and [`close`](Self::close).
///
/// After an explicit [`close`](Self::close) every method fails with
/// [`Error::BadHandle`]. A handle dropped while still open is flushed and
/// closed on a best-effort basis; failures at that point are logged only.
///
/// Obtain a `PrismaWritableFile` from [`PrismaFileSystem`](crate::PrismaFileSystem)
/// or with [`open`](Self::open).
#[derive(Debug)]
pub struct PrismaWritableFile {
    path: PathBuf,
    stream: Option<BufWriter<File>>,
}

impl PrismaWritableFile {
    /// Opens the physical path `path` for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened, or if the end of
    /// the file cannot be located in [`WriteMode::Append`].
    pub fn open(path: impl AsRef<Path>, mode: WriteMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
        };

        let mut file = options.open(&path).map_err(|e| Error::from_io(path.display().to_string(), e))?;
        if mode == WriteMode::Append {
            // Report the end of the existing content from `tell` before the first append.
            let _ = file
                .seek(SeekFrom::End(0))
                .map_err(|e| Error::from_io(path.display().to_string(), e))?;
        }

        event!(Level::DEBUG, path = %path.display(), ?mode, "opened writable file");
        Ok(Self {
            path,
            stream: Some(BufWriter::new(file)),
        })
    }

    /// The physical path this handle was opened for.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Returns `true` until the handle is explicitly closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Appends all of `data` to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if not all bytes could be written, or [`Error::BadHandle`]
    /// if the handle is closed.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;
        let result = stream.write_all(data);
        result.map_err(|e| self.io_error(e))
    }

    /// Pushes buffered bytes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written, or
    /// [`Error::BadHandle`] if the handle is closed.
    pub fn flush(&mut self) -> Result<()> {
        let stream = self.stream_mut()?;
        let result = stream.flush();
        result.map_err(|e| self.io_error(e))
    }

    /// Same as [`flush`](Self::flush); no additional durability is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written, or
    /// [`Error::BadHandle`] if the handle is closed.
    pub fn sync(&mut self) -> Result<()> {
        self.flush()
    }

    /// Returns the current write position, counting buffered bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written or the position
    /// could not be queried, or [`Error::BadHandle`] if the handle is closed.
    pub fn tell(&mut self) -> Result<u64> {
        let stream = self.stream_mut()?;
        let result = stream.stream_position();
        result.map_err(|e| self.io_error(e))
    }

    /// Flushes buffered bytes and closes the file.
    ///
    /// The file is closed even if the flush fails; the first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written or the close
    /// failed, or [`Error::BadHandle`] if the handle is already closed.
    pub fn close(&mut self) -> Result<()> {
        let stream = self.stream.take().ok_or_else(|| self.bad_handle())?;
        close_stream(stream).map_err(|e| self.io_error(e))
    }

    fn stream_mut(&mut self) -> Result<&mut BufWriter<File>> {
        let path = &self.path;
        self.stream.as_mut().ok_or_else(|| Error::BadHandle {
            path: path.display().to_string(),
        })
    }

    fn bad_handle(&self) -> Error {
        Error::BadHandle {
            path: self.path.display().to_string(),
        }
    }

    fn io_error(&self, error: std::io::Error) -> Error {
        Error::from_io(self.path.display().to_string(), error)
    }
}

fn close_stream(mut stream: BufWriter<File>) -> std::io::Result<()> {
    let flushed = stream.flush();
    let (file, _unwritten) = stream.into_parts();
    let closed = sys::close(OwnedFd::from(file));
    flushed.and(closed)
}

impl Drop for PrismaWritableFile {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take()
            && let Err(error) = close_stream(stream)
        {
            event!(Level::WARN, path = %self.path.display(), %error, "failed to close writable file on drop");
        }
    }
}

impl WritableFile for PrismaWritableFile {
    fn name(&self) -> &Path {
        self.name()
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.append(data)
    }

    fn flush(&mut self) -> Result<()> {
        self.flush()
    }

    fn sync(&mut self) -> Result<()> {
        self.sync()
    }

    fn tell(&mut self) -> Result<u64> {
        self.tell()
    }

    fn close(&mut self) -> Result<()> {
        self.close()
    }
}
