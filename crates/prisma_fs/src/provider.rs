// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::{DirBuilderExt as _, MetadataExt as _};
use std::path::Path;

use tracing::{Level, event};

use crate::copy::{Copier, DEFAULT_COPY_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::file_system::{FileStatistics, FileSystem, RandomAccessFile, ReadOnlyMemoryRegion, WritableFile};
use crate::{PrismaMemoryRegion, PrismaRandomAccessFile, PrismaWritableFile, ReadPrimitive, WriteMode, matcher, path};

/// The mode new directories are created with, before the umask is applied.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A storage provider backed by the local filesystem.
///
/// Logical names may carry a `scheme://authority` prefix, which is stripped before the
/// local filesystem is accessed; names without a prefix are used as they are. Errors
/// report the logical name the caller passed.
///
/// The provider holds configuration only. Every file handle it creates is independent
/// and owned by the caller.
///
/// # Examples
///
/// ```
/// use prisma_fs::{FileSystem, PrismaFileSystem};
///
/// # fn main() -> prisma_fs::Result<()> {
/// let dir = std::env::temp_dir().join(format!("prisma_fs_doc_{}", std::process::id()));
/// let dir = dir.to_str().expect("temp dir is UTF-8");
///
/// let fs = PrismaFileSystem::new();
/// fs.recursively_create_dir(dir)?;
///
/// let name = format!("prisma://local{dir}/greeting.txt");
/// let mut writer = fs.new_writable_file(&name)?;
/// writer.append(b"hello")?;
/// writer.close()?;
///
/// assert_eq!(fs.get_file_size(&name)?, 5);
/// # fs.delete_file(&name)?;
/// # fs.delete_dir(dir)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PrismaFileSystem {
    primitive: ReadPrimitive,
    copier: Copier,
    dir_mode: u32,
}

impl PrismaFileSystem {
    /// Creates a provider with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a provider.
    #[must_use]
    pub fn builder() -> PrismaFileSystemBuilder {
        PrismaFileSystemBuilder::default()
    }

    /// The byte-range read strategy given to every random access file this provider opens.
    #[must_use]
    pub const fn read_primitive(&self) -> &ReadPrimitive {
        &self.primitive
    }
}

impl Default for PrismaFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the configuration of a [`PrismaFileSystem`].
#[derive(Debug, Clone)]
pub struct PrismaFileSystemBuilder {
    primitive: ReadPrimitive,
    copy_buffer_size: usize,
    zero_copy: bool,
    dir_mode: u32,
}

impl Default for PrismaFileSystemBuilder {
    fn default() -> Self {
        Self {
            primitive: ReadPrimitive::positional(),
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            zero_copy: true,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}

impl PrismaFileSystemBuilder {
    /// Sets the byte-range read strategy for random access files.
    #[must_use]
    pub fn with_read_primitive(mut self, primitive: ReadPrimitive) -> Self {
        self.primitive = primitive;
        self
    }

    /// Sets the buffer size of the buffered copy loop. A size of zero is treated as one byte.
    #[must_use]
    pub const fn with_copy_buffer_size(mut self, size: usize) -> Self {
        self.copy_buffer_size = size;
        self
    }

    /// Enables or disables the in-kernel copy transfer.
    ///
    /// The in-kernel transfer is only available on Linux; elsewhere copies always use the
    /// buffered loop.
    #[must_use]
    pub const fn with_zero_copy(mut self, enabled: bool) -> Self {
        self.zero_copy = enabled;
        self
    }

    /// Sets the mode new directories are created with, before the umask is applied.
    #[must_use]
    pub const fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Creates the configured provider.
    #[must_use]
    pub fn build(self) -> PrismaFileSystem {
        PrismaFileSystem {
            primitive: self.primitive,
            copier: Copier {
                buffer_size: self.copy_buffer_size,
                zero_copy: self.zero_copy,
            },
            dir_mode: self.dir_mode,
        }
    }
}

fn physical(name: &str) -> &Path {
    Path::new(path::translate_name(name))
}

impl FileSystem for PrismaFileSystem {
    fn new_random_access_file(&self, name: &str) -> Result<Box<dyn RandomAccessFile>> {
        let file = PrismaRandomAccessFile::open(physical(name), self.primitive.clone()).map_err(|e| e.with_path(name))?;
        Ok(Box::new(file))
    }

    fn new_writable_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        let file = PrismaWritableFile::open(physical(name), WriteMode::Truncate).map_err(|e| e.with_path(name))?;
        Ok(Box::new(file))
    }

    fn new_appendable_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        let file = PrismaWritableFile::open(physical(name), WriteMode::Append).map_err(|e| e.with_path(name))?;
        Ok(Box::new(file))
    }

    fn new_read_only_memory_region_from_file(&self, name: &str) -> Result<Box<dyn ReadOnlyMemoryRegion>> {
        let region = PrismaMemoryRegion::create(physical(name)).map_err(|e| e.with_path(name))?;
        Ok(Box::new(region))
    }

    fn file_exists(&self, name: &str) -> Result<()> {
        if fs::metadata(physical(name)).is_ok() {
            Ok(())
        } else {
            Err(Error::NotFound {
                path: name.to_owned(),
                source: None,
            })
        }
    }

    fn get_children(&self, dir: &str) -> Result<Vec<String>> {
        let entries = fs::read_dir(physical(dir)).map_err(|e| Error::from_io(dir, e))?;
        entries
            .map(|entry| {
                let name = entry.map_err(|e| Error::from_io(dir, e))?.file_name();
                name.into_string().map_err(|raw| {
                    let message = format!("child name {} is not valid UTF-8", raw.display());
                    Error::from_io(dir, io::Error::new(io::ErrorKind::InvalidData, message))
                })
            })
            .collect()
    }

    fn get_matching_paths(&self, pattern: &str) -> Result<Vec<String>> {
        matcher::get_matching_paths(self, pattern)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(physical(name)).map_err(|e| Error::from_io(name, e))
    }

    fn create_dir(&self, name: &str) -> Result<()> {
        let translated = path::translate_name(name);
        if translated.is_empty() {
            return Err(Error::AlreadyExists { path: name.to_owned() });
        }
        DirBuilder::new()
            .mode(self.dir_mode)
            .create(translated)
            .map_err(|e| Error::from_io(name, e))?;
        event!(Level::DEBUG, path = name, mode = self.dir_mode, "created directory");
        Ok(())
    }

    fn delete_dir(&self, name: &str) -> Result<()> {
        fs::remove_dir(physical(name)).map_err(|e| Error::from_io(name, e))
    }

    fn get_file_size(&self, name: &str) -> Result<u64> {
        fs::metadata(physical(name))
            .map(|metadata| metadata.len())
            .map_err(|e| Error::from_io(name, e))
    }

    fn stat(&self, name: &str) -> Result<FileStatistics> {
        let metadata = fs::metadata(physical(name)).map_err(|e| Error::from_io(name, e))?;
        Ok(FileStatistics {
            length: metadata.len(),
            mtime_nsec: metadata
                .mtime()
                .saturating_mul(NANOS_PER_SEC)
                .saturating_add(metadata.mtime_nsec()),
            is_directory: metadata.is_dir(),
        })
    }

    fn rename_file(&self, src: &str, target: &str) -> Result<()> {
        fs::rename(physical(src), physical(target)).map_err(|e| Error::from_io(src, e))
    }

    fn copy_file(&self, src: &str, target: &str) -> Result<()> {
        self.copier.copy(src, target).map(|_| ())
    }
}
