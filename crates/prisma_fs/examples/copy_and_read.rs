// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Writes a file, copies it and reads it back three ways.
//!
//! Demonstrates the [`PrismaFileSystem`] resource factories: a writable file, a
//! random access file and a memory-mapped region, plus [`FileSystem::copy_file`].

use prisma_fs::{FileSystem, PrismaFileSystem};

fn main() -> prisma_fs::Result<()> {
    let tmp = tempfile::tempdir().map_err(|e| prisma_fs::Error::from_io("tempdir", e))?;
    let root = format!("prisma://local{}", tmp.path().display());
    let fs = PrismaFileSystem::new();

    // Write a file through the sequential writer.
    let original = format!("{root}/original.txt");
    let mut writer = fs.new_writable_file(&original)?;
    writer.append(b"The quick brown fox ")?;
    writer.append(b"jumps over the lazy dog.")?;
    println!("wrote {} bytes", writer.tell()?);
    writer.close()?;

    // Copy it; on Linux the bytes never leave the kernel.
    let copy = format!("{root}/copy.txt");
    fs.copy_file(&original, &copy)?;
    println!("copied to {copy}");

    // Read a range of the copy.
    let reader = fs.new_random_access_file(&copy)?;
    let word = reader.read_vec(4, 5)?;
    println!("bytes 4..9: {}", String::from_utf8_lossy(&word));

    // Reading past the end reports how much was available.
    let mut buf = [0_u8; 64];
    if let Err(e) = reader.read(30, &mut buf) {
        println!("short read: {e}");
    }

    // Map the whole copy into memory.
    let region = fs.new_read_only_memory_region_from_file(&copy)?;
    println!("mapped {} bytes: {}", region.length(), String::from_utf8_lossy(region.as_slice()));

    let stats = fs.stat(&copy)?;
    println!("stat: {} bytes, modified at {} ns", stats.length, stats.mtime_nsec);

    Ok(())
}
