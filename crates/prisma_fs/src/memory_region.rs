// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::path::Path;

use tracing::{Level, event};

use crate::error::{Error, Result};
use crate::file_system::ReadOnlyMemoryRegion;
use crate::sys::Mapping;

/// A read-only, private view of a whole file's contents in memory.
///
/// The view is a snapshot of the file's length at creation time; it stays valid
/// until the region is dropped, even if the file is modified, truncated or removed
/// afterwards. An empty file yields an empty region that maps nothing.
#[derive(Debug)]
pub struct PrismaMemoryRegion {
    mapping: Option<Mapping>,
}

impl PrismaMemoryRegion {
    /// Maps the whole of the physical path `path` into memory.
    ///
    /// The file descriptor is released once the mapping exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, its size cannot be queried,
    /// it is too large to address, or the mapping fails.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let to_error = |e| Error::from_io(path.display().to_string(), e);

        let file = File::open(path).map_err(to_error)?;
        let length = file.metadata().map_err(to_error)?.len();
        if length == 0 {
            event!(Level::DEBUG, path = %path.display(), "empty file yields empty memory region");
            return Ok(Self { mapping: None });
        }

        let length = usize::try_from(length).map_err(|e| to_error(std::io::Error::other(e)))?;
        let mapping = Mapping::new(&file, length).map_err(to_error)?;
        event!(Level::DEBUG, path = %path.display(), length, "mapped memory region");
        Ok(Self { mapping: Some(mapping) })
    }

    /// The address of the first byte.
    ///
    /// An empty region returns a dangling, well-aligned address that must not be
    /// dereferenced.
    #[must_use]
    pub fn data(&self) -> *const u8 {
        self.mapping
            .as_ref()
            .map_or(core::ptr::NonNull::<u8>::dangling().as_ptr().cast_const(), Mapping::as_ptr)
    }

    /// The number of bytes in the region.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.mapping.as_ref().map_or(0, |m| m.len() as u64)
    }

    /// The region's contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match &self.mapping {
            // SAFETY: the mapping is readable for `len` bytes and stays mapped for as long
            // as `self`, which outlives the returned borrow. The mapping is private and
            // read-only, so nothing writes through it.
            Some(mapping) => unsafe { core::slice::from_raw_parts(mapping.as_ptr(), mapping.len()) },
            None => &[],
        }
    }
}

impl ReadOnlyMemoryRegion for PrismaMemoryRegion {
    fn data(&self) -> *const u8 {
        self.data()
    }

    fn length(&self) -> u64 {
        self.length()
    }

    fn as_slice(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn thread_safe_type() {
        assert_impl_all!(PrismaMemoryRegion: Send, Sync);
    }

    #[test]
    fn maps_whole_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("m.bin");
        std::fs::write(&path, b"hello region").unwrap();

        let region = PrismaMemoryRegion::create(&path).unwrap();
        assert_eq!(region.length(), 12);
        assert_eq!(region.as_slice(), b"hello region");
        assert!(!region.data().is_null());
    }

    #[test]
    fn survives_removal_of_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.bin");
        std::fs::write(&path, b"still here").unwrap();

        let region = PrismaMemoryRegion::create(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(region.as_slice(), b"still here");
    }

    #[test]
    fn empty_file_yields_empty_region() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let region = PrismaMemoryRegion::create(&path).unwrap();
        assert_eq!(region.length(), 0);
        assert!(region.as_slice().is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = PrismaMemoryRegion::create(tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
