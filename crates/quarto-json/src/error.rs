/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for parsing, navigating and converting JSON documents.
//!
//! Every error that concerns a position inside a document carries the
//! [`Path`] from the document root, so a message like
//! `Type mismatch at .format[2].toc: expected bool, found string` can be
//! acted on without walking the document again.

use crate::Path;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for quarto-json operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while working with JSON documents.
#[derive(Debug, Error)]
pub enum Error {
    /// The input text is not an acceptable document.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Navigation or extraction against a node of incompatible shape.
    ///
    /// Also raised when a number cannot be represented exactly in the
    /// requested type (out of range, or a double that is not a safely
    /// round-trippable integer).
    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: String,
        found: String,
    },

    /// Array index outside `[0, size)`.
    #[error("Index {index} out of bounds at {path}: size is {size}")]
    OutOfBounds {
        path: Path,
        index: usize,
        size: usize,
    },

    /// A user-defined conversion failed for a reason of its own.
    ///
    /// The original error is kept as-is and is reachable through
    /// [`std::error::Error::source`].
    #[error("Conversion failed at {path}: {source}")]
    Conversion {
        path: Path,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The value cannot be written out as JSON text.
    #[error("Serialization failed at {path}: {message}")]
    Serialize { path: Path, message: String },

    /// Reading a document from disk failed.
    #[error("I/O error reading {}: {source}", .file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The document path this error refers to, if any.
    ///
    /// Parse and I/O errors happen before there is a document to navigate,
    /// so they have no path.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::TypeMismatch { path, .. }
            | Error::OutOfBounds { path, .. }
            | Error::Conversion { path, .. }
            | Error::Serialize { path, .. } => Some(path),
            Error::Parse(_) | Error::Io { .. } => None,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }

    pub(crate) fn type_mismatch(
        path: &Path,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            path: path.clone(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A document could not be parsed.
///
/// Positions are 1-based. `snippet` holds (a window of) the source line the
/// parser stopped on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    /// What went wrong, without position information
    pub message: String,

    /// Optional filename or source identifier
    pub source_name: Option<String>,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters)
    pub column: usize,

    /// The offending source text
    pub snippet: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;
        if let Some(name) = &self.source_name {
            write!(f, " in {}", name)?;
        }
        write!(
            f,
            " at line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if !self.snippet.is_empty() {
            write!(f, " (near `{}`)", self.snippet)?;
        }
        Ok(())
    }
}
