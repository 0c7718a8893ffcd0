// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The interfaces a host framework uses to talk to a storage provider.
//!
//! A provider implements [`FileSystem`]; the handles it creates implement
//! [`RandomAccessFile`], [`WritableFile`] and [`ReadOnlyMemoryRegion`]. All
//! traits are object safe so that providers can be stored in a
//! [`Registry`](crate::registry::Registry) and routed to by scheme.

use std::fmt;
use std::path::Path;

use crate::error::{Error, ReadError, Result};
use crate::path;

/// A point-in-time snapshot of a path's metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStatistics {
    /// The length of the file in bytes.
    pub length: u64,
    /// The last modification time, in nanoseconds since the Unix epoch.
    pub mtime_nsec: i64,
    /// Whether the path is a directory.
    pub is_directory: bool,
}

/// A file opened for reads at arbitrary offsets.
///
/// Reads take `&self`; a single handle may serve concurrent reads from
/// several threads. Dropping the handle releases it.
pub trait RandomAccessFile: Send + Sync + fmt::Debug {
    /// The physical path this handle was opened for.
    fn name(&self) -> &Path;

    /// Fills all of `buf` with the bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] wrapping [`Error::OutOfRange`] if the file ends before `buf`
    /// is full, or another error on I/O failure. In both cases
    /// [`ReadError::bytes_read`] bytes at the start of `buf` hold valid data.
    fn read(&self, offset: u64, buf: &mut [u8]) -> core::result::Result<(), ReadError>;

    /// Reads exactly `len` bytes starting at `offset` into a new vector.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read); the partially read bytes are discarded.
    fn read_vec(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read(offset, &mut buf)?;
        Ok(buf)
    }
}

/// A file opened for sequential, append-only writes.
pub trait WritableFile: Send + fmt::Debug {
    /// The physical path this handle was opened for.
    fn name(&self) -> &Path;

    /// Appends all of `data` to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes could not all be written or the handle is closed.
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Pushes buffered bytes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written or the handle is closed.
    fn flush(&mut self) -> Result<()>;

    /// Makes previously appended bytes visible to other readers of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered bytes could not be written or the handle is closed.
    fn sync(&mut self) -> Result<()>;

    /// Returns the current write position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be determined or the handle is closed.
    fn tell(&mut self) -> Result<u64>;

    /// Closes the file. Every later call on this handle fails with [`Error::BadHandle`].
    ///
    /// # Errors
    ///
    /// Returns an error if buffered bytes could not be written, the close itself failed,
    /// or the handle was already closed.
    fn close(&mut self) -> Result<()>;
}

/// A read-only view of a whole file's contents in memory.
///
/// The address and length never change while the region is alive. Dropping
/// the region releases the view.
pub trait ReadOnlyMemoryRegion: Send + Sync + fmt::Debug {
    /// The address of the first byte.
    fn data(&self) -> *const u8;

    /// The number of bytes in the region.
    fn length(&self) -> u64;

    /// The region's contents.
    fn as_slice(&self) -> &[u8];
}

/// A storage provider, addressed through logical names.
///
/// Logical names may carry a `scheme://authority` prefix; implementations
/// translate them with [`translate_name`](Self::translate_name) before touching
/// storage, and report the logical name in errors.
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Returns the physical path for a logical name.
    fn translate_name<'a>(&self, name: &'a str) -> &'a str {
        path::translate_name(name)
    }

    /// Opens `name` for reads at arbitrary offsets.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for reading.
    fn new_random_access_file(&self, name: &str) -> Result<Box<dyn RandomAccessFile>>;

    /// Creates `name`, or truncates it if it exists, and opens it for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened.
    fn new_writable_file(&self, name: &str) -> Result<Box<dyn WritableFile>>;

    /// Opens `name` for appending, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened.
    fn new_appendable_file(&self, name: &str) -> Result<Box<dyn WritableFile>>;

    /// Maps the whole of `name` into memory, read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, queried or mapped.
    fn new_read_only_memory_region_from_file(&self, name: &str) -> Result<Box<dyn ReadOnlyMemoryRegion>>;

    /// Succeeds if `name` exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] otherwise.
    fn file_exists(&self, name: &str) -> Result<()>;

    /// Lists the names of the entries in `dir`, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be enumerated.
    fn get_children(&self, dir: &str) -> Result<Vec<String>>;

    /// Returns the logical names matching the glob `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or a directory cannot be enumerated.
    fn get_matching_paths(&self, pattern: &str) -> Result<Vec<String>>;

    /// Removes the file `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Creates the directory `name`. Its parent must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `name` is the root of the namespace, or an
    /// error if the directory cannot be created.
    fn create_dir(&self, name: &str) -> Result<()>;

    /// Removes the empty directory `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    fn delete_dir(&self, name: &str) -> Result<()>;

    /// Returns the size of `name` in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be queried.
    fn get_file_size(&self, name: &str) -> Result<u64>;

    /// Returns the metadata of `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be queried.
    fn stat(&self, name: &str) -> Result<FileStatistics>;

    /// Renames `src` to `target`, replacing `target` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename_file(&self, src: &str, target: &str) -> Result<()>;

    /// Copies the contents and permission bits of `src` to `target`, replacing `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the copy fails.
    fn copy_file(&self, src: &str, target: &str) -> Result<()>;

    /// Succeeds if `name` exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `name` exists but is not a directory, or the
    /// error reported by [`stat`](Self::stat).
    fn is_directory(&self, name: &str) -> Result<()> {
        if self.stat(name)?.is_directory {
            Ok(())
        } else {
            Err(Error::NotADirectory { path: name.to_owned() })
        }
    }

    /// Creates `name` and any missing parent directories.
    ///
    /// Succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the directories cannot be created.
    fn recursively_create_dir(&self, name: &str) -> Result<()> {
        let uri = path::parse_uri(name);

        // Walk up until an existing ancestor is found.
        let mut remaining = uri.path;
        let mut missing = Vec::new();
        while !remaining.is_empty() {
            match self.file_exists(&uri.with_path(remaining)) {
                Ok(()) => break,
                Err(Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
            let (parent, base) = path::split_last(remaining);
            if !base.is_empty() {
                missing.push(base);
            }
            remaining = parent;
        }

        let mut built = remaining.to_owned();
        for component in missing.into_iter().rev() {
            built = path::join(&built, component);
            match self.create_dir(&uri.with_path(&built)) {
                Ok(()) | Err(Error::AlreadyExists { .. }) => {}
                Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
