// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Whole-file copy, preferring an in-kernel transfer over a buffered loop.

use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Read as _, Seek as _, SeekFrom, Write as _};
use std::os::fd::OwnedFd;
use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};
use std::path::Path;

use tracing::{Level, event};

use crate::error::{Error, Result};
use crate::{path, sys};

/// The default size of the buffer used by the buffered copy loop.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 128 * 1024;

const PERMISSION_BITS: u32 = 0o777;

const ZERO_COPY_SUPPORTED: bool = cfg!(all(target_os = "linux", not(target_os = "android")));

/// How the bytes of a copy were moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    ZeroCopy,
    Buffered,
}

/// Copies files according to the provider's configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Copier {
    pub(crate) buffer_size: usize,
    pub(crate) zero_copy: bool,
}

impl Copier {
    /// Copies the contents and permission bits of logical name `src` to logical name `target`.
    ///
    /// Returns the number of bytes copied.
    pub(crate) fn copy(&self, src: &str, target: &str) -> Result<u64> {
        let src_path = Path::new(path::translate_name(src));
        let target_path = Path::new(path::translate_name(target));

        let metadata = fs::metadata(src_path).map_err(|e| Error::from_io(src, e))?;
        let size = metadata.len();
        let mode = metadata.permissions().mode() & PERMISSION_BITS;

        let mut src_file = File::open(src_path).map_err(|e| Error::from_io(src, e))?;
        let mut dst_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(target_path)
            .map_err(|e| Error::from_io(target, e))?;

        // The creation mode is filtered by the umask and ignored for existing targets.
        let strategy = self.strategy();
        let transferred = dst_file
            .set_permissions(Permissions::from_mode(mode))
            .and_then(|()| self.transfer(strategy, &mut src_file, &mut dst_file, size))
            .map_err(|e| Error::from_io(target, e));

        let dst_closed = sys::close(OwnedFd::from(dst_file)).map_err(|e| Error::from_io(target, e));
        let src_closed = sys::close(OwnedFd::from(src_file)).map_err(|e| Error::from_io(src, e));

        let copied = settle(transferred, dst_closed, src_closed)?;
        event!(Level::DEBUG, src, target, bytes = copied, ?strategy, "copied file");
        Ok(copied)
    }

    /// The strategy used for the next copy.
    pub(crate) const fn strategy(&self) -> Transfer {
        if self.zero_copy && ZERO_COPY_SUPPORTED {
            Transfer::ZeroCopy
        } else {
            Transfer::Buffered
        }
    }

    fn transfer(&self, strategy: Transfer, src: &mut File, dst: &mut File, size: u64) -> io::Result<u64> {
        match strategy {
            Transfer::ZeroCopy => {
                let mut offset = 0;
                match zero_copy(src, dst, &mut offset, size) {
                    Err(error) if zero_copy_unavailable(&error) => {
                        event!(Level::DEBUG, %error, offset, "zero-copy unavailable, continuing with buffered copy");
                        resume_buffered(src, dst, offset, size, self.buffer_size)
                    }
                    result => result.map(|()| offset),
                }
            }
            Transfer::Buffered => buffered(src, dst, size, self.buffer_size),
        }
    }
}

/// Combines the outcome of a transfer with the outcome of closing both files.
///
/// Both files have been closed by the time this runs; the first failure wins, so a close
/// failure never hides a transfer failure but does fail an otherwise successful copy.
fn settle(transferred: Result<u64>, dst_closed: Result<()>, src_closed: Result<()>) -> Result<u64> {
    let copied = transferred?;
    dst_closed?;
    src_closed?;
    Ok(copied)
}

/// Whether `sendfile` failed because the files involved cannot be transferred in the kernel.
fn zero_copy_unavailable(error: &io::Error) -> bool {
    matches!(error.raw_os_error(), Some(libc::EINVAL | libc::ENOSYS))
}

/// Moves `src[*offset..size]` to `dst` in the kernel, advancing `offset` past the bytes moved.
#[cfg(all(target_os = "linux", not(target_os = "android")))]
fn zero_copy(src: &File, dst: &File, offset: &mut u64, size: u64) -> io::Result<()> {
    use std::os::fd::AsFd as _;

    while *offset < size {
        let remaining = usize::try_from(size - *offset).unwrap_or(usize::MAX);
        let count = remaining.min(isize::MAX.unsigned_abs());
        if sys::sendfile(dst.as_fd(), src.as_fd(), offset, count)? == 0 {
            break;
        }
    }
    Ok(())
}

#[cfg(not(all(target_os = "linux", not(target_os = "android"))))]
fn zero_copy(_src: &File, _dst: &File, _offset: &mut u64, _size: u64) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Continues a copy with the buffered loop once `offset` bytes are already in `dst`.
fn resume_buffered(src: &mut File, dst: &mut File, offset: u64, size: u64, buffer_size: usize) -> io::Result<u64> {
    src.seek(SeekFrom::Start(offset))?;
    dst.seek(SeekFrom::Start(offset))?;
    Ok(offset + buffered(src, dst, size.saturating_sub(offset), buffer_size)?)
}

fn buffered(src: &mut File, dst: &mut File, size: u64, buffer_size: usize) -> io::Result<u64> {
    let mut buffer = vec![0_u8; buffer_size.max(1)];
    let mut copied = 0;
    while copied < size {
        let request = usize::try_from(size - copied).map_or(buffer.len(), |remaining| remaining.min(buffer.len()));
        let read = src.read(&mut buffer[..request])?;
        if read == 0 {
            break;
        }
        dst.write_all(&buffer[..read])?;
        copied += read as u64;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt as _;

    use tempfile::TempDir;

    use super::*;

    fn copier(zero_copy: bool, buffer_size: usize) -> Copier {
        Copier { buffer_size, zero_copy }
    }

    fn failure(path: &str) -> Error {
        Error::from_io(path, io::Error::other("close failed"))
    }

    #[test]
    fn buffered_copy_spans_several_chunks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let contents: Vec<u8> = (0..10_000_u32).map(|i| u8::try_from(i % 251).unwrap()).collect();
        fs::write(&src, &contents).unwrap();

        let copied = copier(false, 1000).copy(src.to_str().unwrap(), dst.to_str().unwrap()).unwrap();
        assert_eq!(copied, 10_000);
        assert_eq!(fs::read(&dst).unwrap(), contents);
    }

    #[test]
    fn copy_replaces_existing_target_and_its_mode() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::write(&src, b"short").unwrap();
        fs::set_permissions(&src, Permissions::from_mode(0o640)).unwrap();
        fs::write(&dst, b"much longer previous content").unwrap();
        fs::set_permissions(&dst, Permissions::from_mode(0o600)).unwrap();

        copier(true, DEFAULT_COPY_BUFFER_SIZE)
            .copy(src.to_str().unwrap(), dst.to_str().unwrap())
            .unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"short");
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o777, 0o640);
    }

    #[test]
    fn missing_source_names_source() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("missing");
        let src = src.to_str().unwrap();
        let dst = tmp.path().join("dst");

        let err = copier(true, DEFAULT_COPY_BUFFER_SIZE).copy(src, dst.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref path, .. } if path == src));
        assert!(!dst.exists());
    }

    #[test]
    fn strategy_follows_configuration() {
        assert_eq!(copier(false, 1).strategy(), Transfer::Buffered);
        let expected = if ZERO_COPY_SUPPORTED { Transfer::ZeroCopy } else { Transfer::Buffered };
        assert_eq!(copier(true, 1).strategy(), expected);
    }

    #[test]
    fn unsupported_kernel_transfer_falls_back() {
        assert!(zero_copy_unavailable(&io::Error::from_raw_os_error(libc::EINVAL)));
        assert!(zero_copy_unavailable(&io::Error::from_raw_os_error(libc::ENOSYS)));
        assert!(!zero_copy_unavailable(&io::Error::from_raw_os_error(libc::ENOSPC)));
        assert!(!zero_copy_unavailable(&io::Error::other("disk full")));
    }

    #[test]
    fn buffered_copy_resumes_after_partial_transfer() {
        let tmp = TempDir::new().unwrap();
        let src_path = tmp.path().join("src");
        let dst_path = tmp.path().join("dst");
        let contents: Vec<u8> = (0..5000_u32).map(|i| u8::try_from(i % 251).unwrap()).collect();
        fs::write(&src_path, &contents).unwrap();
        fs::write(&dst_path, &contents[..1234]).unwrap();

        let mut src = File::open(&src_path).unwrap();
        let mut dst = OpenOptions::new().write(true).open(&dst_path).unwrap();
        let copied = resume_buffered(&mut src, &mut dst, 1234, 5000, 700).unwrap();
        drop(dst);

        assert_eq!(copied, 5000);
        assert_eq!(fs::read(&dst_path).unwrap(), contents);
    }

    #[test]
    fn close_failure_fails_successful_transfer() {
        let err = settle(Ok(42), Err(failure("/dst")), Ok(())).unwrap_err();
        assert_eq!(err.path(), Some("/dst"));

        let err = settle(Ok(42), Ok(()), Err(failure("/src"))).unwrap_err();
        assert_eq!(err.path(), Some("/src"));
    }

    #[test]
    fn transfer_failure_wins_over_close_failures() {
        let transfer = Err(Error::from_io("/transfer", io::Error::other("disk full")));
        let err = settle(transfer, Err(failure("/dst")), Err(failure("/src"))).unwrap_err();
        assert_eq!(err.path(), Some("/transfer"));
    }

    #[test]
    fn destination_close_failure_wins_over_source() {
        let err = settle(Ok(1), Err(failure("/dst")), Err(failure("/src"))).unwrap_err();
        assert_eq!(err.path(), Some("/dst"));
        assert_eq!(settle(Ok(7), Ok(()), Ok(())).unwrap(), 7);
    }
}
