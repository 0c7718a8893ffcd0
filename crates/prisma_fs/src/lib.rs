// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(unix)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity"))]
#![cfg_attr(test, allow(clippy::assertions_on_result_states, reason = "Tests use assert!(x.is_err()) for clarity"))]

//! A storage provider exposing the local file tree through scheme-routed logical names.
//!
//! A host framework addresses files by logical names such as `prisma://bucket/data/x.bin`.
//! [`PrismaFileSystem`] strips the `scheme://authority` prefix and serves the remaining
//! path from the local filesystem, through the [`FileSystem`] interface the host consumes.
//!
//! # Resources
//!
//! The provider hands out three kinds of owned resources:
//!
//! | Type | Created by | Access |
//! |------|-----------|--------|
//! | [`PrismaRandomAccessFile`] | [`FileSystem::new_random_access_file`] | reads at arbitrary offsets, `&self` |
//! | [`PrismaWritableFile`] | [`FileSystem::new_writable_file`], [`FileSystem::new_appendable_file`] | buffered appends, `&mut self` |
//! | [`PrismaMemoryRegion`] | [`FileSystem::new_read_only_memory_region_from_file`] | a private read-only mapping |
//!
//! Each resource owns exactly one operating system handle and releases it when dropped.
//!
//! # Pluggable reads
//!
//! Random access files fetch bytes through a [`ReadPrimitive`]. The default issues positional
//! reads on the file handle; a custom primitive routes every fetch to an external
//! [`RangeRead`] backend while keeping the retry and accumulation logic of the reader:
//!
//! ```
//! use std::path::Path;
//!
//! use prisma_fs::{PrismaFileSystem, ReadPrimitive};
//!
//! let backend = |_: &Path, buf: &mut [u8], _offset: u64| -> std::io::Result<usize> {
//!     buf.fill(b'z');
//!     Ok(buf.len())
//! };
//!
//! let fs = PrismaFileSystem::builder()
//!     .with_read_primitive(ReadPrimitive::custom(backend))
//!     .build();
//! # drop(fs);
//! ```
//!
//! # Copying
//!
//! [`FileSystem::copy_file`] copies contents and permission bits. On Linux the bytes move
//! inside the kernel with `sendfile(2)`; elsewhere, or when disabled with
//! [`PrismaFileSystemBuilder::with_zero_copy`], a buffered loop is used.
//!
//! # Routing
//!
//! The [`registry`] module maps schemes to providers for the whole process, and
//! [`matcher`] expands glob patterns over any provider.

mod copy;
mod error;
mod file_system;
mod memory_region;
mod provider;
mod random_access_file;
mod read_primitive;
mod sys;
mod writable_file;

pub mod matcher;
pub mod path;
pub mod registry;

#[cfg(test)]
mod testing;

pub use crate::copy::DEFAULT_COPY_BUFFER_SIZE;
pub use crate::error::{Error, ReadError, Result};
pub use crate::file_system::{FileStatistics, FileSystem, RandomAccessFile, ReadOnlyMemoryRegion, WritableFile};
pub use crate::memory_region::PrismaMemoryRegion;
pub use crate::provider::{DEFAULT_DIR_MODE, PrismaFileSystem, PrismaFileSystemBuilder};
pub use crate::random_access_file::PrismaRandomAccessFile;
pub use crate::read_primitive::{RangeRead, ReadPrimitive};
pub use crate::writable_file::{PrismaWritableFile, WriteMode};
