// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation of logical names into physical filesystem paths.

/// A logical name split into its URI parts.
///
/// All three parts borrow from the parsed input. A name without a scheme has
/// an empty `scheme` and `authority` and the whole input as its `path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uri<'a> {
    /// The scheme, without the trailing `://`.
    pub scheme: &'a str,
    /// Everything between `://` and the next `/`.
    pub authority: &'a str,
    /// The remainder, including its leading `/`.
    pub path: &'a str,
}

impl Uri<'_> {
    /// Builds the logical name that has this URI's scheme and authority and the given path.
    #[must_use]
    pub fn with_path(&self, path: &str) -> String {
        if self.scheme.is_empty() {
            path.to_owned()
        } else {
            format!("{}://{}{path}", self.scheme, self.authority)
        }
    }
}

/// Splits `name` into scheme, authority and path.
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`,
/// immediately followed by `://`. If `name` does not start with one, the whole
/// input is the path. This function never fails.
#[must_use]
pub fn parse_uri(name: &str) -> Uri<'_> {
    let Some((scheme, rest)) = split_scheme(name) else {
        return Uri {
            scheme: "",
            authority: "",
            path: name,
        };
    };

    let (authority, path) = rest.find('/').map_or((rest, ""), |slash| rest.split_at(slash));
    Uri { scheme, authority, path }
}

/// Returns the physical path for a logical name: the input with any
/// `scheme://authority` prefix removed.
///
/// No normalization or symlink resolution takes place; a name without a
/// scheme is returned unchanged.
#[must_use]
pub fn translate_name(name: &str) -> &str {
    parse_uri(name).path
}

/// Joins two path fragments with exactly one `/` between them.
#[must_use]
pub fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_owned()
    } else if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

/// Splits a path into its parent and its last component.
///
/// The parent is always strictly shorter than `path` for non-empty input:
/// `"/a/b"` gives `("/a", "b")`, `"/a"` gives `("/", "a")`, `"a/"` gives
/// `("a", "")` and `"/"` gives `("", "")`.
#[must_use]
pub fn split_last(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        None => ("", path),
        Some(0) if path.len() == 1 => ("", ""),
        Some(0) => ("/", &path[1..]),
        Some(slash) => (&path[..slash], &path[slash + 1..]),
    }
}

fn split_scheme(name: &str) -> Option<(&str, &str)> {
    let end = name.find("://")?;
    let scheme = &name[..end];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, &name[end + 3..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_unchanged() {
        assert_eq!(translate_name("/data/foo/bar.txt"), "/data/foo/bar.txt");
        assert_eq!(translate_name("relative/./x/../y"), "relative/./x/../y");
        assert_eq!(translate_name(""), "");
    }

    #[test]
    fn scheme_and_authority_stripped() {
        assert_eq!(
            parse_uri("prisma://bucket/data/file"),
            Uri {
                scheme: "prisma",
                authority: "bucket",
                path: "/data/file",
            }
        );
        assert_eq!(translate_name("prisma:///tmp/x"), "/tmp/x");
    }

    #[test]
    fn authority_only_yields_empty_path() {
        let uri = parse_uri("prisma://bucket");
        assert_eq!(uri.authority, "bucket");
        assert_eq!(uri.path, "");
    }

    #[test]
    fn malformed_scheme_is_plain_path() {
        assert_eq!(translate_name("1abc://host/x"), "1abc://host/x");
        assert_eq!(translate_name("a b://host/x"), "a b://host/x");
        assert_eq!(translate_name("://host/x"), "://host/x");
        assert_eq!(translate_name("prisma:/one-slash"), "prisma:/one-slash");
    }

    #[test]
    fn translation_is_idempotent() {
        let once = translate_name("prisma://host/a/b");
        assert_eq!(translate_name(once), once);
    }

    #[test]
    fn authorities_are_indistinguishable() {
        assert_eq!(translate_name("prisma://one/x"), translate_name("prisma://two/x"));
    }

    #[test]
    fn with_path_keeps_scheme_and_authority() {
        let uri = parse_uri("prisma://host/a/b");
        assert_eq!(uri.with_path("/c"), "prisma://host/c");
        assert_eq!(parse_uri("/local/x").with_path("/y"), "/y");
    }

    #[test]
    fn join_inserts_one_separator() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/x", "a"), "/x/a");
        assert_eq!(join("prisma://h/x/", "a"), "prisma://h/x/a");
    }

    #[test]
    fn split_last_always_shrinks() {
        assert_eq!(split_last("/a/b"), ("/a", "b"));
        assert_eq!(split_last("/a"), ("/", "a"));
        assert_eq!(split_last("a/"), ("a", ""));
        assert_eq!(split_last("a"), ("", "a"));
        assert_eq!(split_last("/"), ("", ""));
    }
}
