// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Thin wrappers over the system calls that `std` does not expose with the
//! semantics we need.

use core::ffi::c_void;
use core::ptr::NonNull;
use std::fs::File;
use std::io::{Error, Result};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd};

/// Reads bytes at `offset` without affecting the cursor.
pub fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

/// Closes a descriptor, reporting the result of `close(2)`.
///
/// Dropping an [`OwnedFd`] discards that result, which loses write-back errors
/// reported at close time.
pub fn close(fd: OwnedFd) -> Result<()> {
    let raw = fd.into_raw_fd();

    // SAFETY: `raw` came from an OwnedFd we consumed, so it is open and no one else will close it.
    if unsafe { libc::close(raw) } != 0 {
        return Err(Error::last_os_error());
    }
    Ok(())
}

/// Transfers up to `count` bytes from `src` at `*offset` to the current position of `dst`
/// inside the kernel, advancing `*offset` by the amount transferred.
#[cfg(all(target_os = "linux", not(target_os = "android")))]
pub fn sendfile(dst: std::os::fd::BorrowedFd<'_>, src: std::os::fd::BorrowedFd<'_>, offset: &mut u64, count: usize) -> Result<usize> {
    let mut kernel_offset = libc::off_t::try_from(*offset).map_err(Error::other)?;

    // SAFETY: both descriptors are open for the duration of the call and `kernel_offset`
    // is a valid, exclusively borrowed off_t.
    let transferred = unsafe { libc::sendfile(dst.as_raw_fd(), src.as_raw_fd(), &raw mut kernel_offset, count) };
    if transferred < 0 {
        return Err(Error::last_os_error());
    }

    *offset = u64::try_from(kernel_offset).map_err(Error::other)?;
    usize::try_from(transferred).map_err(Error::other)
}

/// A private, read-only mapping of the first `len` bytes of a file.
#[derive(Debug)]
pub struct Mapping {
    address: NonNull<u8>,
    len: usize,
}

impl Mapping {
    /// Maps `len` bytes of `file` read-only and copy-on-write. `len` must be non-zero.
    pub fn new(file: &File, len: usize) -> Result<Self> {
        // SAFETY: a null hint lets the kernel choose the address; the descriptor is open and
        // the arguments describe a read-only private mapping, which cannot alias Rust memory.
        let address = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if address == libc::MAP_FAILED {
            return Err(Error::last_os_error());
        }

        let address = NonNull::new(address.cast::<u8>()).ok_or_else(|| Error::other("mmap returned a null address"))?;
        Ok(Self { address, len })
    }

    pub const fn as_ptr(&self) -> *const u8 {
        self.address.as_ptr()
    }

    pub const fn len(&self) -> usize {
        self.len
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: address and length describe the mapping created by `new`, which is
        // released exactly once, here.
        if unsafe { libc::munmap(self.address.as_ptr().cast::<c_void>(), self.len) } != 0 {
            let error = Error::last_os_error();
            tracing::event!(tracing::Level::WARN, %error, len = self.len, "failed to unmap memory region");
        }
    }
}

// SAFETY: the mapping is read-only and owned exclusively by this value; nothing else
// can mutate or release it.
unsafe impl Send for Mapping {}

// SAFETY: shared access only ever reads through the mapping.
unsafe impl Sync for Mapping {}
