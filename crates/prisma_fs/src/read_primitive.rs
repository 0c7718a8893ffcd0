// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::fs::File;
use std::io::Result;
use std::path::Path;
use std::sync::Arc;

use crate::sys;

/// An external byte-range read backend.
///
/// Implementations fetch up to `buf.len()` bytes of the resource at `path`, starting at
/// `offset`, into `buf`, and report how many bytes they fetched:
///
/// * `Ok(n)` with `n > 0`: `buf[..n]` was filled.
/// * `Ok(0)`: no more bytes are available at `offset`.
/// * `Err(e)` where `e.kind()` is [`Interrupted`](std::io::ErrorKind::Interrupted) or
///   [`WouldBlock`](std::io::ErrorKind::WouldBlock): a transient condition, the caller retries.
/// * any other `Err`: a hard failure.
///
/// Any `Fn(&Path, &mut [u8], u64) -> std::io::Result<usize>` closure is a `RangeRead`.
pub trait RangeRead: Send + Sync + 'static {
    /// Reads bytes of `path` at `offset` into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not fetch any bytes.
    fn read_range(&self, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize>;
}

impl<F> RangeRead for F
where
    F: Fn(&Path, &mut [u8], u64) -> Result<usize> + Send + Sync + 'static,
{
    fn read_range(&self, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize> {
        self(path, buf, offset)
    }
}

/// The byte-range read strategy used by [`PrismaRandomAccessFile`](crate::PrismaRandomAccessFile).
///
/// The default strategy issues positional reads on the file handle owned by the reader.
/// A custom strategy redirects every fetch to a [`RangeRead`] backend addressed by path,
/// leaving the reader's retry and accumulation logic unchanged.
///
/// Cloning is cheap; clones of a custom strategy share the same backend.
#[derive(Clone, Default)]
pub struct ReadPrimitive {
    inner: ReadPrimitiveInner,
}

#[derive(Clone, Default)]
enum ReadPrimitiveInner {
    #[default]
    Positional,
    Custom(Arc<dyn RangeRead>),
}

impl ReadPrimitive {
    /// Reads through the operating system's positional read on the reader's own handle.
    #[must_use]
    pub fn positional() -> Self {
        Self::default()
    }

    /// Reads through the given backend.
    pub fn custom(backend: impl RangeRead) -> Self {
        Self {
            inner: ReadPrimitiveInner::Custom(Arc::new(backend)),
        }
    }

    /// Returns `true` if this is the default positional strategy.
    #[must_use]
    pub const fn is_positional(&self) -> bool {
        matches!(self.inner, ReadPrimitiveInner::Positional)
    }

    pub(crate) fn read(&self, file: &File, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize> {
        match &self.inner {
            ReadPrimitiveInner::Positional => sys::positional_read(file, buf, offset),
            ReadPrimitiveInner::Custom(backend) => backend.read_range(path, buf, offset),
        }
    }
}

impl fmt::Debug for ReadPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            ReadPrimitiveInner::Positional => "positional",
            ReadPrimitiveInner::Custom(_) => "custom",
        };
        f.debug_tuple("ReadPrimitive").field(&kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn default_is_positional() {
        assert!(ReadPrimitive::default().is_positional());
        assert_eq!(format!("{:?}", ReadPrimitive::positional()), r#"ReadPrimitive("positional")"#);
    }

    #[test]
    fn positional_reads_own_handle() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"abcdef").unwrap();

        let mut buf = [0_u8; 3];
        let n = ReadPrimitive::positional()
            .read(&file, Path::new("/ignored"), &mut buf, 2)
            .unwrap();
        assert_eq!(&buf[..n], b"cde");
    }

    #[test]
    fn custom_receives_path_and_offset() {
        let primitive = ReadPrimitive::custom(|path: &Path, buf: &mut [u8], offset: u64| -> Result<usize> {
            assert_eq!(path, Path::new("/remote/object"));
            buf[0] = u8::try_from(offset).unwrap();
            Ok(1)
        });
        assert!(!primitive.is_positional());

        let file = tempfile::tempfile().unwrap();
        let mut buf = [0_u8; 4];
        let n = primitive.read(&file, Path::new("/remote/object"), &mut buf, 7).unwrap();
        assert_eq!(n, 1);
        assert_eq!(buf[0], 7);
    }
}
