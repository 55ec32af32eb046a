/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Read-only views into a [`Document`].
//!
//! A [`Value`] is a shared reference to the document, a locator for one node
//! and the [`Path`] that led there. Navigation hands out new values over the
//! same document; nothing is copied and nothing is re-validated.
//!
//! Looking up an absent key does not fail. It yields a *missing* value,
//! which keeps composing through further navigation and only turns into an
//! error at extraction time (or is replaced by a default with
//! [`Value::to_or`]).

use crate::convert::FromValue;
use crate::document::{Document, Node, NodeId, NodeKind};
use crate::{Error, Path, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locator {
    Node(NodeId),
    /// Result of navigating to an absent object member
    Missing,
}

/// A navigable, cheaply clonable view onto one node of a document.
///
/// ## Example
///
/// ```rust
/// use quarto_json::parse;
///
/// let json = parse(r#"{"key1": 1, "key2": {"key3": "val"}}"#).unwrap();
/// assert_eq!(json.get("key1").unwrap().to::<i32>().unwrap(), 1);
///
/// let key3 = json.get("key2").unwrap().get("key3").unwrap();
/// assert_eq!(key3.to::<String>().unwrap(), "val");
/// assert_eq!(key3.path().to_string(), ".key2.key3");
/// ```
#[derive(Clone)]
pub struct Value {
    doc: Arc<Document>,
    locator: Locator,
    path: Path,
}

impl Value {
    pub(crate) fn from_root(doc: Arc<Document>) -> Self {
        let root = doc.root_id();
        Self {
            doc,
            locator: Locator::Node(root),
            path: Path::root(),
        }
    }

    fn child(&self, locator: Locator, path: Path) -> Self {
        Self {
            doc: Arc::clone(&self.doc),
            locator,
            path,
        }
    }

    pub(crate) fn node(&self) -> Option<&Node> {
        match self.locator {
            Locator::Node(id) => Some(self.doc.node(id)),
            Locator::Missing => None,
        }
    }

    pub(crate) fn node_id(&self) -> Option<NodeId> {
        match self.locator {
            Locator::Node(id) => Some(id),
            Locator::Missing => None,
        }
    }

    /// The document this value belongs to.
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    /// The node tag, or `None` for a missing value.
    pub fn kind(&self) -> Option<NodeKind> {
        self.node().map(Node::kind)
    }

    /// Path from the document root to this value.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// Kind name for diagnostics (`"missing"` for missing values).
    pub(crate) fn describe(&self) -> &'static str {
        self.kind().map_or("missing", NodeKind::name)
    }

    pub fn is_missing(&self) -> bool {
        self.locator == Locator::Missing
    }

    /// True for an explicit `null`. A missing value is not null.
    pub fn is_null(&self) -> bool {
        self.kind() == Some(NodeKind::Null)
    }

    pub fn is_bool(&self) -> bool {
        self.kind() == Some(NodeKind::Bool)
    }

    pub fn is_int64(&self) -> bool {
        self.kind() == Some(NodeKind::Int64)
    }

    pub fn is_uint64(&self) -> bool {
        self.kind() == Some(NodeKind::Uint64)
    }

    pub fn is_double(&self) -> bool {
        self.kind() == Some(NodeKind::Double)
    }

    /// True for any numeric node (int64, uint64 or double).
    pub fn is_number(&self) -> bool {
        matches!(
            self.kind(),
            Some(NodeKind::Int64 | NodeKind::Uint64 | NodeKind::Double)
        )
    }

    pub fn is_string(&self) -> bool {
        self.kind() == Some(NodeKind::String)
    }

    pub fn is_array(&self) -> bool {
        self.kind() == Some(NodeKind::Array)
    }

    pub fn is_object(&self) -> bool {
        self.kind() == Some(NodeKind::Object)
    }

    /// Returns the boolean if this is a bool node.
    pub fn as_bool(&self) -> Option<bool> {
        match self.node() {
            Some(Node::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an int64 node.
    pub fn as_i64(&self) -> Option<i64> {
        match self.node() {
            Some(Node::Int64(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns any numeric node widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self.node() {
            Some(Node::Int64(i)) => Some(*i as f64),
            Some(Node::Uint64(u)) => Some(*u as f64),
            Some(Node::Double(d)) => Some(*d),
            _ => None,
        }
    }

    /// Borrows the string if this is a string node.
    pub fn as_str(&self) -> Option<&str> {
        match self.node() {
            Some(Node::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Object member access.
    ///
    /// An absent key yields a missing value whose path includes the key.
    /// Navigating from a missing value yields another missing value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if this value is neither an object nor
    /// missing.
    pub fn get(&self, key: &str) -> Result<Value> {
        let path = self.path.key(key);
        match self.node() {
            Some(Node::Object(entries)) => {
                let locator = entries
                    .get(key)
                    .map_or(Locator::Missing, |id| Locator::Node(*id));
                Ok(self.child(locator, path))
            }
            None => Ok(self.child(Locator::Missing, path)),
            Some(_) => Err(self.type_mismatch(NodeKind::Object.name())),
        }
    }

    /// Array element access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for `index >= len`, and
    /// [`Error::TypeMismatch`] if this value is neither an array nor missing.
    pub fn at(&self, index: usize) -> Result<Value> {
        match self.node() {
            Some(Node::Array(items)) => match items.get(index) {
                Some(id) => Ok(self.child(Locator::Node(*id), self.path.index(index))),
                None => Err(Error::OutOfBounds {
                    path: self.path.clone(),
                    index,
                    size: items.len(),
                }),
            },
            None => Ok(self.child(Locator::Missing, self.path.index(index))),
            Some(_) => Err(self.type_mismatch(NodeKind::Array.name())),
        }
    }

    /// Whether an object has a member named `key`.
    ///
    /// A missing value has no members.
    pub fn has_member(&self, key: &str) -> Result<bool> {
        match self.node() {
            Some(Node::Object(entries)) => Ok(entries.contains_key(key)),
            None => Ok(false),
            Some(_) => Err(self.type_mismatch(NodeKind::Object.name())),
        }
    }

    /// Number of elements of an array or members of an object.
    pub fn len(&self) -> Result<usize> {
        match self.node() {
            Some(Node::Array(items)) => Ok(items.len()),
            Some(Node::Object(entries)) => Ok(entries.len()),
            _ => Err(self.type_mismatch("array or object")),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Iterates over the elements of an array in order.
    pub fn elements(&self) -> Result<Elements<'_>> {
        match self.node() {
            Some(Node::Array(items)) => Ok(Elements {
                parent: self,
                items: items.iter().enumerate(),
            }),
            _ => Err(self.type_mismatch(NodeKind::Array.name())),
        }
    }

    /// Iterates over the members of an object in insertion order.
    pub fn members(&self) -> Result<Members<'_>> {
        match self.node() {
            Some(Node::Object(entries)) => Ok(Members {
                parent: self,
                entries: entries.iter(),
            }),
            _ => Err(self.type_mismatch(NodeKind::Object.name())),
        }
    }

    /// Converts this value into `T`.
    ///
    /// Missing and null values only convert into types that accept them
    /// (such as `Option<T>`); use [`Value::to_or`] to substitute a default.
    pub fn to<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }

    /// Converts this value into `T`, returning `default` if the value is
    /// missing or null.
    ///
    /// Any other value goes through the same conversion as [`Value::to`] and
    /// can still fail.
    pub fn to_or<T: FromValue>(&self, default: T) -> Result<T> {
        if self.is_missing() || self.is_null() {
            Ok(default)
        } else {
            self.to()
        }
    }

    pub fn to_or_default<T: FromValue + Default>(&self) -> Result<T> {
        self.to_or_else(T::default)
    }

    pub fn to_or_else<T: FromValue, F: FnOnce() -> T>(&self, default: F) -> Result<T> {
        if self.is_missing() || self.is_null() {
            Ok(default())
        } else {
            self.to()
        }
    }

    pub fn check_not_missing(&self) -> Result<()> {
        if self.is_missing() {
            Err(self.type_mismatch("a value"))
        } else {
            Ok(())
        }
    }

    pub fn check_array_or_null(&self) -> Result<()> {
        if self.is_array() || self.is_null() {
            Ok(())
        } else {
            Err(self.type_mismatch("array or null"))
        }
    }

    pub fn check_object_or_null(&self) -> Result<()> {
        if self.is_object() || self.is_null() {
            Ok(())
        } else {
            Err(self.type_mismatch("object or null"))
        }
    }

    /// A [`Error::TypeMismatch`] at this value's path.
    ///
    /// Intended for [`FromValue`] implementations.
    pub fn type_mismatch(&self, expected: impl Into<String>) -> Error {
        Error::type_mismatch(&self.path, expected, self.describe())
    }

    /// Wraps a foreign error raised while converting this value.
    ///
    /// The error is kept verbatim as the [`std::error::Error::source`] of
    /// the returned [`Error::Conversion`].
    pub fn conversion_error(
        &self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Error {
        Error::Conversion {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("path", &self.path)
            .field("kind", &self.describe())
            .finish()
    }
}

/// Structural equality: compares contents, ignoring paths and which
/// document the values live in. Object member order is not significant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.locator, other.locator) {
            (Locator::Missing, Locator::Missing) => true,
            (Locator::Node(a), Locator::Node(b)) => nodes_equal(&self.doc, a, &other.doc, b),
            _ => false,
        }
    }
}

fn nodes_equal(left: &Document, a: NodeId, right: &Document, b: NodeId) -> bool {
    match (left.node(a), right.node(b)) {
        (Node::Array(xs), Node::Array(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| nodes_equal(left, *x, right, *y))
        }
        (Node::Object(xs), Node::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(key, x)| {
                    ys.get(key)
                        .is_some_and(|y| nodes_equal(left, *x, right, *y))
                })
        }
        (x, y) => x == y,
    }
}

/// Iterator over array elements, see [`Value::elements`].
#[derive(Debug)]
pub struct Elements<'a> {
    parent: &'a Value,
    items: std::iter::Enumerate<std::slice::Iter<'a, NodeId>>,
}

impl Iterator for Elements<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let (index, id) = self.items.next()?;
        Some(
            self.parent
                .child(Locator::Node(*id), self.parent.path.index(index)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for Elements<'_> {}

/// Iterator over object members, see [`Value::members`].
#[derive(Debug)]
pub struct Members<'a> {
    parent: &'a Value,
    entries: indexmap::map::Iter<'a, String, NodeId>,
}

impl<'a> Iterator for Members<'a> {
    type Item = (&'a str, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, id) = self.entries.next()?;
        let value = self
            .parent
            .child(Locator::Node(*id), self.parent.path.key(key.as_str()));
        Some((key.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Members<'_> {}

#[cfg(test)]
mod tests {
    use crate::parse;

    #[test]
    fn test_navigation_extends_path() {
        let json = parse(r#"{"a": [0, 1, {"b": "x"}]}"#).unwrap();
        let b = json.get("a").unwrap().at(2).unwrap().get("b").unwrap();
        assert_eq!(b.path().to_string(), ".a[2].b");
        assert_eq!(b.as_str(), Some("x"));
        assert!(json.is_root());
        assert!(!b.is_root());
    }

    #[test]
    fn test_missing_is_not_null() {
        let json = parse(r#"{"nulled": null}"#).unwrap();
        let nulled = json.get("nulled").unwrap();
        let absent = json.get("absent").unwrap();

        assert!(nulled.is_null());
        assert!(!nulled.is_missing());
        assert!(absent.is_missing());
        assert!(!absent.is_null());
        assert_eq!(absent.kind(), None);
    }

    #[test]
    fn test_missing_composes_through_navigation() {
        let json = parse(r#"{"present": {}}"#).unwrap();
        let deep = json
            .get("absent")
            .unwrap()
            .get("deeper")
            .unwrap()
            .at(3)
            .unwrap();
        assert!(deep.is_missing());
        assert_eq!(deep.path().to_string(), ".absent.deeper[3]");

        let err = deep.to::<i32>().unwrap_err();
        assert!(err.is_type_mismatch());
        assert_eq!(err.path(), Some(deep.path()));
    }

    #[test]
    fn test_navigation_on_wrong_kind_fails() {
        let json = parse(r#"{"n": 1, "list": [1]}"#).unwrap();
        let n = json.get("n").unwrap();
        assert!(n.get("x").unwrap_err().is_type_mismatch());
        assert!(n.at(0).unwrap_err().is_type_mismatch());
        assert!(json.at(0).unwrap_err().is_type_mismatch());
        assert!(json.get("list").unwrap().get("x").unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_index_out_of_bounds() {
        let json = parse("[1, 2, 3]").unwrap();
        let err = json.at(3).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert_eq!(err.to_string(), "Index 3 out of bounds at (root): size is 3");
    }

    #[test]
    fn test_predicates() {
        let json = parse(
            r#"{"b": true, "i": -1, "u": 18446744073709551615, "d": 1.5, "s": "", "a": [], "o": {}}"#,
        )
        .unwrap();
        assert!(json.get("b").unwrap().is_bool());
        assert!(json.get("i").unwrap().is_int64());
        assert!(json.get("u").unwrap().is_uint64());
        assert!(json.get("d").unwrap().is_double());
        assert!(json.get("d").unwrap().is_number());
        assert!(json.get("s").unwrap().is_string());
        assert!(json.get("a").unwrap().is_array());
        assert!(json.get("o").unwrap().is_object());
        assert!(json.is_object());
    }

    #[test]
    fn test_size_and_iteration() {
        let json = parse(r#"{"z": 1, "a": 2, "m": [true, false]}"#).unwrap();
        assert_eq!(json.len().unwrap(), 3);
        assert!(!json.is_empty().unwrap());

        let keys: Vec<&str> = json.members().unwrap().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let m = json.get("m").unwrap();
        let elements = m.elements().unwrap();
        assert_eq!(elements.len(), 2);
        let paths: Vec<String> = elements.map(|v| v.path().to_string()).collect();
        assert_eq!(paths, vec![".m[0]", ".m[1]"]);

        assert!(json.get("z").unwrap().len().unwrap_err().is_type_mismatch());
        assert!(format!("{:?}", m.elements().unwrap()).starts_with("Elements"));
        assert!(format!("{:?}", json.members().unwrap()).starts_with("Members"));
        assert!(json.elements().unwrap_err().is_type_mismatch());
        assert!(m.members().unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_has_member() {
        let json = parse(r#"{"a": null}"#).unwrap();
        assert!(json.has_member("a").unwrap());
        assert!(!json.has_member("b").unwrap());
        assert!(!json.get("b").unwrap().has_member("c").unwrap());
        assert!(json.get("a").unwrap().has_member("c").is_err());
    }

    #[test]
    fn test_checks() {
        let json = parse(r#"{"a": null, "b": [], "c": 1}"#).unwrap();
        assert!(json.get("a").unwrap().check_array_or_null().is_ok());
        assert!(json.get("b").unwrap().check_array_or_null().is_ok());
        assert!(json.get("c").unwrap().check_array_or_null().is_err());
        assert!(json.check_object_or_null().is_ok());
        assert!(json.get("zz").unwrap().check_not_missing().is_err());
        assert!(json.get("a").unwrap().check_not_missing().is_ok());
    }

    #[test]
    fn test_structural_equality() {
        let a = parse(r#"{"x": [1, 2.5, "s"], "y": null}"#).unwrap();
        let b = parse(r#"{"y": null, "x": [1, 2.5, "s"]}"#).unwrap();
        let c = parse(r#"{"x": [1, 2.5, "t"], "y": null}"#).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get("x").unwrap(), b.get("x").unwrap());
        assert_eq!(a.get("nope").unwrap(), b.get("other").unwrap());
    }

    #[test]
    fn test_value_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<crate::Value>();
    }
}
