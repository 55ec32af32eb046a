//! # quarto-json
//!
//! Immutable JSON documents with path-aware, typed extraction.
//!
//! A parsed or built document is stored once in a shared arena and never
//! changes. [`Value`]s are cheap views onto its nodes: each one remembers the
//! [`Path`] it was reached by, so every error names the exact location
//! (`.format[2].toc`) that caused it.
//!
//! ## Design
//!
//! - Navigating to an absent key yields a *missing* value instead of
//!   failing. Missing values compose through further navigation and only
//!   fail when extracted, or fall back to a default with [`Value::to_or`].
//! - Extraction is type-directed: [`Value::to`] dispatches on the requested
//!   type through the [`FromValue`] trait, which applications implement for
//!   their own types.
//! - Numbers never convert lossily. A double becomes an integer only when it
//!   is integral with magnitude below 2^53.
//! - New documents are assembled with a [`ValueBuilder`] and frozen with
//!   [`ValueBuilder::extract_value`].
//!
//! ## Example
//!
//! ```rust
//! use quarto_json::parse;
//!
//! let json = parse(r#"{"format": {"html": {"toc": true}}, "nulled": null}"#).unwrap();
//!
//! let toc: bool = json.get("format")?.get("html")?.get("toc")?.to()?;
//! assert!(toc);
//!
//! // Absent and null values fall back to defaults
//! assert_eq!(json.get("nulled")?.to_or(42)?, 42);
//! assert_eq!(json.get("absent")?.get("deeper")?.to_or(7)?, 7);
//!
//! // Errors carry the path
//! let err = json.get("format")?.get("html")?.get("toc")?.to::<String>().unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Type mismatch at .format.html.toc: expected string, found bool"
//! );
//! # Ok::<(), quarto_json::Error>(())
//! ```

mod builder;
mod convert;
mod document;
mod error;
mod parser;
mod path;
mod serialize;
mod value;

pub use builder::ValueBuilder;
pub use convert::FromValue;
pub use document::{Document, NodeKind};
pub use error::{Error, ParseError, Result};
pub use parser::{
    DEFAULT_MAX_DEPTH, ParseOptions, parse, parse_file, parse_path, parse_with_options,
};
pub use path::{Path, PathSegment};
pub use value::{Elements, Members, Value};
