// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Routes logical names to providers by scheme.
//!
//! Demonstrates installing the default [`registry`], resolving providers for logical
//! names and expanding a glob pattern through the resolved provider.

use prisma_fs::{FileSystem, registry};

fn main() -> prisma_fs::Result<()> {
    let tmp = tempfile::tempdir().map_err(|e| prisma_fs::Error::from_io("tempdir", e))?;
    let registry = registry::init();

    let schemes = registry.schemes().collect::<Vec<_>>();
    println!("registered schemes: {schemes:?}");

    let root = format!("prisma://bucket-a{}", tmp.path().display());
    let fs = registry.resolve(&root).ok_or_else(|| prisma_fs::Error::NotFound {
        path: root.clone(),
        source: None,
    })?;

    fs.recursively_create_dir(&format!("{root}/logs/2024"))?;
    for day in ["01", "02", "03"] {
        let mut writer = fs.new_writable_file(&format!("{root}/logs/2024/{day}.log"))?;
        writer.append(format!("entries for day {day}\n").as_bytes())?;
        writer.close()?;
    }

    // The authority is not part of the physical path.
    let other_authority = format!("prisma://bucket-b{}/logs/2024/01.log", tmp.path().display());
    println!("{other_authority} -> {}", fs.translate_name(&other_authority));

    for path in fs.get_matching_paths(&format!("{root}/logs/*/0[12].log"))? {
        println!("matched {path}");
    }

    match registry.resolve("s3://bucket/object") {
        Some(_) => println!("s3 is registered"),
        None => println!("no provider for s3://"),
    }

    Ok(())
}
