// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;

/// Any error that may arise from the storage provider or from the file handles it creates.
///
/// Operating system failures are translated into one of these variants at the point where
/// they occur, see [`Error::from_io`]. Every variant carries the logical path of the
/// operation so that the rendered message identifies the resource involved.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The path does not exist.
    #[error("{path} not found{}", .source.as_ref().map_or_else(String::new, |e| format!(": {e}")))]
    NotFound {
        /// The logical path of the operation.
        path: String,
        /// The underlying operating system error, absent when the check itself found nothing.
        source: Option<io::Error>,
    },

    /// The process lacks permission to access the path.
    #[error("{path}: {source}")]
    PermissionDenied {
        /// The logical path of the operation.
        path: String,
        /// The underlying operating system error.
        source: io::Error,
    },

    /// The target of a directory creation is the root of the namespace.
    #[error("{path} already exists")]
    AlreadyExists {
        /// The logical path of the operation.
        path: String,
    },

    /// Fewer bytes were available than the caller requested.
    #[error("{path}: read less bytes than requested ({read} of {requested})")]
    OutOfRange {
        /// The physical path that was read.
        path: String,
        /// The number of bytes the caller asked for.
        requested: usize,
        /// The number of bytes that were actually read.
        read: usize,
    },

    /// The handle was already closed.
    #[error("{path}: bad file handle")]
    BadHandle {
        /// The physical path of the closed handle.
        path: String,
    },

    /// The path exists but is not a directory.
    #[error("{path} is not a directory")]
    NotADirectory {
        /// The logical path of the operation.
        path: String,
    },

    /// A glob pattern could not be parsed.
    #[error("invalid pattern {pattern}: {source}")]
    InvalidPattern {
        /// The pattern as given by the caller.
        pattern: String,
        /// The parse failure.
        source: glob::PatternError,
    },

    /// Any other operating system error.
    #[error("{path}: {source}")]
    Io {
        /// The logical path of the operation.
        path: String,
        /// The underlying operating system error.
        source: io::Error,
    },
}

/// A specialized `Result` for storage provider operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Translates an operating system error that occurred while operating on `path`.
    ///
    /// `NotFound` and `PermissionDenied` keep their meaning; every other error kind,
    /// including an `AlreadyExists` reported by the operating system, becomes [`Error::Io`].
    pub fn from_io(path: impl Into<String>, error: io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path,
                source: Some(error),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source: error },
            _ => Self::Io { path, source: error },
        }
    }

    /// Replaces the path reported by the error, keeping everything else.
    #[must_use]
    pub(crate) fn with_path(mut self, logical: &str) -> Self {
        match &mut self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::AlreadyExists { path }
            | Self::OutOfRange { path, .. }
            | Self::BadHandle { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => logical.clone_into(path),
            Self::InvalidPattern { .. } => {}
        }
        self
    }

    /// Returns the path the failed operation was working on, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::AlreadyExists { path }
            | Self::OutOfRange { path, .. }
            | Self::BadHandle { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => Some(path),
            Self::InvalidPattern { .. } => None,
        }
    }
}

/// Represents a storage provider error as a standard I/O error.
/// This is often used when interoperating with other libraries that expect standard I/O errors.
impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        let kind = match &value {
            Error::NotFound { .. } => io::ErrorKind::NotFound,
            Error::PermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            Error::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            Error::OutOfRange { .. } => io::ErrorKind::UnexpectedEof,
            Error::NotADirectory { .. } => io::ErrorKind::NotADirectory,
            Error::InvalidPattern { .. } => io::ErrorKind::InvalidInput,
            Error::Io { source, .. } => source.kind(),
            Error::BadHandle { .. } => io::ErrorKind::Other,
        };
        Self::new(kind, value)
    }
}

/// A failed [`read`](crate::RandomAccessFile::read) together with the number of bytes
/// that were read before the failure.
///
/// The bytes in `buf[..bytes_read]` of the failed call are valid file contents; they are
/// preserved rather than discarded.
#[derive(Debug, thiserror::Error)]
#[error("{error} after reading {bytes_read} bytes")]
pub struct ReadError {
    bytes_read: usize,
    #[source]
    error: Error,
}

impl ReadError {
    pub(crate) const fn new(bytes_read: usize, error: Error) -> Self {
        Self { bytes_read, error }
    }

    /// The number of bytes successfully read into the caller's buffer.
    #[must_use]
    pub const fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// The error that ended the read.
    #[must_use]
    pub const fn error(&self) -> &Error {
        &self.error
    }

    /// Discards the byte count and returns the error that ended the read.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl From<ReadError> for Error {
    fn from(value: ReadError) -> Self {
        value.error
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    #[test]
    fn thread_safe_type() {
        assert_impl_all!(Error: Send, Sync);
        assert_impl_all!(ReadError: Send, Sync);
    }

    #[test]
    fn from_io_maps_known_kinds() {
        let e = Error::from_io("prisma://a/x", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, Error::NotFound { ref path, source: Some(_) } if path == "prisma://a/x"));

        let e = Error::from_io("/x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, Error::PermissionDenied { .. }));

        let e = Error::from_io("/x", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(e, Error::Io { ref source, .. } if source.kind() == io::ErrorKind::AlreadyExists));
    }

    #[test]
    fn message_includes_path_and_cause() {
        let e = Error::from_io("/data/file", io::Error::other("disk on fire"));
        assert_eq!(e.to_string(), "/data/file: disk on fire");
        assert_eq!(e.path(), Some("/data/file"));
    }

    #[test]
    fn with_path_replaces_reported_path() {
        let e = Error::from_io("/tmp/x", io::Error::from(io::ErrorKind::NotFound)).with_path("prisma://h/tmp/x");
        assert_eq!(e.path(), Some("prisma://h/tmp/x"));
        assert_eq!(e.to_string(), "prisma://h/tmp/x not found: entity not found");
    }

    #[test]
    fn not_found_without_cause_names_only_path() {
        let e = Error::NotFound {
            path: "/x".into(),
            source: None,
        };
        assert_eq!(e.to_string(), "/x not found");
    }

    #[test]
    fn into_stdio_error() {
        let io_error: io::Error = Error::AlreadyExists { path: String::new() }.into();
        assert_eq!(io_error.kind(), io::ErrorKind::AlreadyExists);

        let io_error: io::Error = Error::from_io("/x", io::Error::from(io::ErrorKind::TimedOut)).into();
        assert_eq!(io_error.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn read_error_keeps_count() {
        let e = ReadError::new(
            3,
            Error::OutOfRange {
                path: "/x".into(),
                requested: 10,
                read: 3,
            },
        );
        assert_eq!(e.bytes_read(), 3);
        assert!(matches!(e.error(), Error::OutOfRange { read: 3, .. }));
        assert!(matches!(Error::from(e), Error::OutOfRange { requested: 10, .. }));
    }
}
