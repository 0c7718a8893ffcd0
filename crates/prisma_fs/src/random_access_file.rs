// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::error::{Error, ReadError, Result};
use crate::file_system::RandomAccessFile;
use crate::read_primitive::ReadPrimitive;

/// Some platforms reject single read requests larger than a signed 32-bit length.
const MAX_READ_REQUEST: usize = i32::MAX as usize;

/// A read-only file handle serving reads at arbitrary offsets.
///
/// Every read goes through the handle's [`ReadPrimitive`], so the bytes may come
/// from the operating system or from an external backend; either way the handle
/// retries transient failures and accumulates partial reads until the caller's
/// buffer is full.
///
/// Obtain a `PrismaRandomAccessFile` from
/// [`PrismaFileSystem`](crate::PrismaFileSystem) or with [`open`](Self::open).
#[derive(Debug)]
pub struct PrismaRandomAccessFile {
    path: PathBuf,
    file: File,
    primitive: ReadPrimitive,
}

impl PrismaRandomAccessFile {
    /// Opens the physical path `path` in read-only mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, if the process lacks permission
    /// to read it, or due to other I/O errors.
    pub fn open(path: impl AsRef<Path>, primitive: ReadPrimitive) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::from_io(path.display().to_string(), e))?;
        event!(Level::DEBUG, path = %path.display(), ?primitive, "opened random access file");
        Ok(Self { path, file, primitive })
    }

    /// The physical path this handle was opened for.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Fills all of `buf` with the bytes of the file starting at `offset`.
    ///
    /// Partial reads are accumulated and reads interrupted by a signal or reported
    /// as would-block are retried. A read returning zero bytes before `buf` is full
    /// ends the call with [`Error::OutOfRange`].
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] on a short read or on any other I/O failure. The
    /// first [`ReadError::bytes_read`] bytes of `buf` hold the data read before
    /// the failure.
    pub fn read(&self, offset: u64, buf: &mut [u8]) -> core::result::Result<(), ReadError> {
        let mut filled = 0;
        while filled < buf.len() {
            let request = (buf.len() - filled).min(MAX_READ_REQUEST);
            let position = offset.saturating_add(filled as u64);
            match self
                .primitive
                .read(&self.file, &self.path, &mut buf[filled..filled + request], position)
            {
                Ok(0) => {
                    let error = Error::OutOfRange {
                        path: self.path.display().to_string(),
                        requested: buf.len(),
                        read: filled,
                    };
                    return Err(ReadError::new(filled, error));
                }
                Ok(n) => filled += n,
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                    event!(Level::TRACE, path = %self.path.display(), position, error = %e, "retrying transient read failure");
                }
                Err(e) => {
                    return Err(ReadError::new(filled, Error::from_io(self.path.display().to_string(), e)));
                }
            }
        }
        Ok(())
    }

    /// Reads exactly `len` bytes starting at `offset` into a new vector.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read); the partially read bytes are discarded.
    pub fn read_vec(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        RandomAccessFile::read_vec(self, offset, len)
    }
}

impl RandomAccessFile for PrismaRandomAccessFile {
    fn name(&self) -> &Path {
        self.name()
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> core::result::Result<(), ReadError> {
        self.read(offset, buf)
    }
}
