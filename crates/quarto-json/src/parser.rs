/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! JSON parser that builds immutable documents.
//!
//! The text grammar is handled by `serde_json`. We drive its deserializer
//! with a [`DeserializeSeed`] that writes every node straight into a
//! [`DocumentWriter`], so no intermediate tree is ever built.

use crate::document::{DocumentWriter, Node, NodeId, NodeKind};
use crate::{Error, ParseError, Result, Value};
use indexmap::IndexMap;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Longest snippet quoted in a [`ParseError`].
const SNIPPET_WIDTH: usize = 60;

/// Options controlling how a document is parsed.
///
/// ```rust
/// use quarto_json::{ParseOptions, parse_with_options};
///
/// let options = ParseOptions::default()
///     .with_source_name("_quarto.json")
///     .with_max_depth(2);
///
/// assert!(parse_with_options("[[1]]", &options).is_ok());
/// let err = parse_with_options("[[[1]]]", &options).unwrap_err();
/// assert!(err.to_string().starts_with("Parse error in _quarto.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Filename or other identifier reported in parse errors
    pub source_name: Option<String>,

    /// Maximum nesting of arrays and objects (the root counts as 1)
    ///
    /// This is the only depth guard applied while parsing. Each level costs
    /// stack, so very large limits need a correspondingly large stack.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_name: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parse a JSON document from a string.
///
/// The root must be an object or an array, and nothing but whitespace may
/// follow it.
///
/// # Example
///
/// ```rust
/// use quarto_json::parse;
///
/// let json = parse(r#"{"title": "My Document"}"#).unwrap();
/// assert!(json.is_object());
/// assert!(parse("42").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not an acceptable document.
pub fn parse(content: &str) -> Result<Value> {
    parse_with_options(content, &ParseOptions::default())
}

/// Parse a JSON document from a string with an associated filename.
///
/// The filename is included in parse errors.
///
/// # Example
///
/// ```rust
/// use quarto_json::parse_file;
///
/// let err = parse_file("{", "config.json").unwrap_err();
/// assert!(err.to_string().contains("config.json"));
/// ```
pub fn parse_file(content: &str, filename: &str) -> Result<Value> {
    parse_with_options(content, &ParseOptions::default().with_source_name(filename))
}

/// Read and parse a JSON document from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, and [`Error::Parse`]
/// if its contents are not an acceptable document.
pub fn parse_path(path: impl AsRef<std::path::Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        file: path.to_path_buf(),
        source,
    })?;
    parse_file(&content, &path.display().to_string())
}

/// Parse a JSON document with explicit [`ParseOptions`].
pub fn parse_with_options(content: &str, options: &ParseOptions) -> Result<Value> {
    match parse_impl(content, options) {
        Ok(value) => {
            tracing::debug!(
                source = options.source_name.as_deref().unwrap_or("<string>"),
                nodes = value.document().len(),
                "Parsed JSON document"
            );
            Ok(value)
        }
        Err(err) => {
            tracing::debug!(
                source = options.source_name.as_deref().unwrap_or("<string>"),
                line = err.line,
                column = err.column,
                "JSON parse failed: {}",
                err.message
            );
            Err(err.into())
        }
    }
}

fn parse_impl(content: &str, options: &ParseOptions) -> std::result::Result<Value, ParseError> {
    let mut writer = DocumentWriter::new();
    let mut de = serde_json::Deserializer::from_str(content);
    // Depth is enforced by `NodeSeed::enter` against `options.max_depth`
    de.disable_recursion_limit();

    let seed = NodeSeed {
        writer: &mut writer,
        depth: 0,
        max_depth: options.max_depth,
    };
    let root = seed
        .deserialize(&mut de)
        .map_err(|err| from_serde_error(content, &err, options))?;
    de.end()
        .map_err(|err| from_serde_error(content, &err, options))?;

    let doc = writer.finish(root);
    let kind = doc.node(doc.root_id()).kind();
    if !kind.is_container() {
        return Err(root_error(content, kind, options));
    }
    Ok(doc.root())
}

fn root_error(content: &str, kind: NodeKind, options: &ParseOptions) -> ParseError {
    let offset = content.len() - content.trim_start().len();
    let line = content[..offset].matches('\n').count() + 1;
    let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let column = content[line_start..offset].chars().count() + 1;
    ParseError {
        message: format!("root must be an object or array, found {}", kind),
        source_name: options.source_name.clone(),
        line,
        column,
        snippet: snippet(content, line, column),
    }
}

fn from_serde_error(content: &str, err: &serde_json::Error, options: &ParseOptions) -> ParseError {
    let mut message = err.to_string();
    // serde_json appends " at line X column Y"; we report those separately
    if err.line() > 0 {
        if let Some(index) = message.rfind(" at line ") {
            message.truncate(index);
        }
    }
    let line = err.line().max(1);
    let column = char_column(content, line, err.column());
    ParseError {
        message,
        source_name: options.source_name.clone(),
        line,
        column,
        snippet: snippet(content, line, column),
    }
}

/// Converts serde_json's byte column into a 1-based character column.
fn char_column(content: &str, line: usize, byte_column: usize) -> usize {
    let text = content.lines().nth(line - 1).unwrap_or("");
    text.char_indices()
        .take_while(|(offset, _)| *offset < byte_column)
        .count()
        .max(1)
}

/// A window of the source line around the (character) `column`.
fn snippet(content: &str, line: usize, column: usize) -> String {
    let Some(text) = content.lines().nth(line - 1) else {
        return String::new();
    };
    let width = text.chars().count();
    let start = if width <= SNIPPET_WIDTH {
        0
    } else {
        column
            .saturating_sub(SNIPPET_WIDTH / 2)
            .min(width - SNIPPET_WIDTH)
    };
    text.chars()
        .skip(start)
        .take(SNIPPET_WIDTH)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Deserializes one node (and its subtree) into the writer.
struct NodeSeed<'w> {
    writer: &'w mut DocumentWriter,
    depth: usize,
    max_depth: usize,
}

impl NodeSeed<'_> {
    fn child(&mut self) -> NodeSeed<'_> {
        NodeSeed {
            writer: &mut *self.writer,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }

    fn enter<E: de::Error>(&self) -> std::result::Result<(), E> {
        if self.depth + 1 > self.max_depth {
            return Err(E::custom(format!(
                "nesting depth exceeds limit of {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = NodeId;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<NodeId, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_> {
    type Value = NodeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<NodeId, E> {
        Ok(self.writer.push(Node::Bool(b)))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> std::result::Result<NodeId, E> {
        Ok(self.writer.push(Node::Int64(i)))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> std::result::Result<NodeId, E> {
        let node = match i64::try_from(u) {
            Ok(i) => Node::Int64(i),
            Err(_) => Node::Uint64(u),
        };
        Ok(self.writer.push(node))
    }

    fn visit_f64<E: de::Error>(self, d: f64) -> std::result::Result<NodeId, E> {
        if !d.is_finite() {
            return Err(E::custom("number out of range"));
        }
        Ok(self.writer.push(Node::Double(d)))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<NodeId, E> {
        Ok(self.writer.push(Node::String(s.to_owned())))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<NodeId, E> {
        Ok(self.writer.push(Node::String(s)))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<NodeId, E> {
        Ok(self.writer.push(Node::Null))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<NodeId, E> {
        self.visit_unit()
    }

    fn visit_seq<A>(mut self, mut seq: A) -> std::result::Result<NodeId, A::Error>
    where
        A: SeqAccess<'de>,
    {
        self.enter::<A::Error>()?;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(id) = seq.next_element_seed(self.child())? {
            items.push(id);
        }
        Ok(self.writer.push(Node::Array(items)))
    }

    fn visit_map<A>(mut self, mut map: A) -> std::result::Result<NodeId, A::Error>
    where
        A: MapAccess<'de>,
    {
        self.enter::<A::Error>()?;
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<String>()? {
            if entries.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key `{}`", key)));
            }
            let id = map.next_value_seed(self.child())?;
            entries.insert(key, id);
        }
        Ok(self.writer.push(Node::Object(entries)))
    }
}
