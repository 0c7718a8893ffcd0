// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Glob expansion over any [`FileSystem`].
//!
//! Patterns use shell-style wildcards within a single path component:
//!
//! * `*` matches any sequence of characters.
//! * `?` matches one character.
//! * `[abc]`, `[a-z]` match one character of the class; `[!abc]` negates it.
//! * `[*]`, `[?]`, `[[]` match a wildcard character literally; `[]]` matches `]`.
//!
//! Wildcards never match `/`. A `scheme://authority` prefix is kept in the results.

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};
use crate::file_system::FileSystem;
use crate::path;

const WILDCARDS: [char; 3] = ['*', '?', '['];

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Returns the sorted logical names in `fs` that match `pattern`.
///
/// A pattern without wildcards yields itself if it exists and nothing otherwise.
/// Directories that do not exist or cannot be listed contribute no matches.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if a component cannot be parsed, or the error of a
/// directory listing that failed for another reason.
pub fn get_matching_paths<F>(fs: &F, pattern: &str) -> Result<Vec<String>>
where
    F: FileSystem + ?Sized,
{
    let uri = path::parse_uri(pattern);
    let Some(first_wildcard) = uri.path.find(WILDCARDS) else {
        return match fs.file_exists(pattern) {
            Ok(()) => Ok(vec![pattern.to_owned()]),
            Err(Error::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
    };

    let (fixed, rest) = match uri.path[..first_wildcard].rfind('/') {
        Some(0) => ("/", &uri.path[1..]),
        Some(slash) => (&uri.path[..slash], &uri.path[slash + 1..]),
        None => ("", uri.path),
    };

    let components = rest.split('/').collect::<Vec<_>>();
    let mut candidates = vec![fixed.to_owned()];
    for (index, component) in components.iter().enumerate() {
        let is_last = index + 1 == components.len();
        let mut next = Vec::new();

        if component.contains(WILDCARDS) {
            let matcher = Pattern::new(component).map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })?;
            for dir in &candidates {
                let listed = if dir.is_empty() { "." } else { dir.as_str() };
                let children = match fs.get_children(&uri.with_path(listed)) {
                    Ok(children) => children,
                    Err(Error::NotFound { .. } | Error::PermissionDenied { .. }) => continue,
                    Err(e) => return Err(e),
                };
                for child in children.iter().filter(|child| matcher.matches_with(child, OPTIONS)) {
                    let candidate = path::join(dir, child);
                    if is_last || fs.is_directory(&uri.with_path(&candidate)).is_ok() {
                        next.push(candidate);
                    }
                }
            }
        } else {
            for dir in &candidates {
                let candidate = path::join(dir, component);
                let found = if is_last {
                    fs.file_exists(&uri.with_path(&candidate))
                } else {
                    fs.is_directory(&uri.with_path(&candidate))
                };
                if found.is_ok() {
                    next.push(candidate);
                }
            }
        }

        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    let mut matches = candidates.iter().map(|candidate| uri.with_path(candidate)).collect::<Vec<_>>();
    matches.sort();
    matches.dedup();
    Ok(matches)
}
