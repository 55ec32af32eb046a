/*
 * builder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mutable construction of new documents.
//!
//! A [`ValueBuilder`] accumulates a tree and finalizes it into a fresh,
//! immutable [`Document`](crate::Document) with
//! [`ValueBuilder::extract_value`]. An undefined builder turns into an object
//! or an array on first keyed or indexed use; after that its kind is fixed.
//!
//! ```rust
//! use quarto_json::ValueBuilder;
//!
//! let mut builder = ValueBuilder::new();
//! builder.set("title", "My Document").unwrap();
//! builder.member_mut("authors").unwrap().push("Alice").unwrap();
//!
//! let value = builder.extract_value();
//! assert_eq!(value.get("title").unwrap().to::<String>().unwrap(), "My Document");
//! assert_eq!(value.get("authors").unwrap().len().unwrap(), 1);
//! ```

use crate::document::{Document, DocumentWriter, Node, NodeId};
use crate::{Error, Path, Result, Value};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Builder state.
///
/// `Scalar` only ever holds non-container nodes.
#[derive(Debug, Clone)]
enum State {
    Undefined,
    Scalar(Node),
    Array(Vec<ValueBuilder>),
    Object(IndexMap<String, ValueBuilder>),
    Consumed,
}

fn state_name(state: &State) -> &'static str {
    match state {
        State::Undefined => "undefined",
        State::Scalar(node) => node.kind().name(),
        State::Array(_) => "array",
        State::Object(_) => "object",
        State::Consumed => "consumed builder",
    }
}

/// Accumulates a JSON tree and produces an immutable [`Value`].
///
/// Builders know their own position, so errors raised deep inside a nested
/// builder name the full path. Using a builder after
/// [`extract_value`](ValueBuilder::extract_value) is a programming error and
/// panics.
#[derive(Debug, Clone)]
pub struct ValueBuilder {
    state: State,
    path: Path,
}

impl Default for ValueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueBuilder {
    /// An undefined builder. Finalizes to `null` unless it is assigned to.
    pub fn new() -> Self {
        Self::with_state(State::Undefined)
    }

    pub fn null() -> Self {
        Self::with_state(State::Scalar(Node::Null))
    }

    /// An empty object.
    pub fn object() -> Self {
        Self::with_state(State::Object(IndexMap::new()))
    }

    /// An empty array.
    pub fn array() -> Self {
        Self::with_state(State::Array(Vec::new()))
    }

    fn with_state(state: State) -> Self {
        Self {
            state,
            path: Path::root(),
        }
    }

    fn undefined_at(path: Path) -> Self {
        Self {
            state: State::Undefined,
            path,
        }
    }

    /// Position of this builder inside the tree being built.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.state, State::Consumed)
    }

    #[track_caller]
    fn ensure_live(&self) {
        if self.is_consumed() {
            panic!("ValueBuilder at {} used after extract_value()", self.path);
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(&self.path, expected, state_name(&self.state))
    }

    /// Moves this builder (and its children) under `path`.
    fn rebase(&mut self, path: Path) {
        match &mut self.state {
            State::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    item.rebase(path.index(index));
                }
            }
            State::Object(entries) => {
                for (key, entry) in entries.iter_mut() {
                    entry.rebase(path.key(key.as_str()));
                }
            }
            _ => {}
        }
        self.path = path;
    }

    #[track_caller]
    fn object_entries(&mut self) -> Result<&mut IndexMap<String, ValueBuilder>> {
        self.ensure_live();
        if let State::Undefined = self.state {
            self.state = State::Object(IndexMap::new());
        }
        let path = &self.path;
        match &mut self.state {
            State::Object(entries) => Ok(entries),
            other => Err(Error::type_mismatch(path, "object", state_name(other))),
        }
    }

    #[track_caller]
    fn array_items(&mut self) -> Result<&mut Vec<ValueBuilder>> {
        self.ensure_live();
        if let State::Undefined = self.state {
            self.state = State::Array(Vec::new());
        }
        let path = &self.path;
        match &mut self.state {
            State::Array(items) => Ok(items),
            other => Err(Error::type_mismatch(path, "array", state_name(other))),
        }
    }

    /// Sets an object member, replacing any previous value in place.
    ///
    /// The inserted builder and all of its descendants are moved under this
    /// builder's path, which walks the whole inserted subtree. Assembling a
    /// deep tree bottom-up therefore costs O(nodes x depth); building it
    /// top-down through [`member_mut`](ValueBuilder::member_mut) and
    /// [`element_mut`](ValueBuilder::element_mut) does not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if this builder already holds
    /// something other than an object.
    #[track_caller]
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ValueBuilder>) -> Result<()> {
        let key = key.into();
        let mut value = value.into();
        value.ensure_live();
        value.rebase(self.path.key(key.as_str()));
        self.object_entries()?.insert(key, value);
        Ok(())
    }

    /// Appends an array element.
    ///
    /// Like [`set`](ValueBuilder::set), this re-roots the whole inserted
    /// subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if this builder already holds
    /// something other than an array.
    #[track_caller]
    pub fn push(&mut self, value: impl Into<ValueBuilder>) -> Result<()> {
        let mut value = value.into();
        value.ensure_live();
        let path = self.path.clone();
        let items = self.array_items()?;
        value.rebase(path.index(items.len()));
        items.push(value);
        Ok(())
    }

    /// Mutable access to an object member, inserting an undefined one if
    /// absent.
    #[track_caller]
    pub fn member_mut(&mut self, key: &str) -> Result<&mut ValueBuilder> {
        let path = self.path.key(key);
        let entries = self.object_entries()?;
        Ok(entries
            .entry(key.to_owned())
            .or_insert_with(|| ValueBuilder::undefined_at(path)))
    }

    /// Mutable access to an existing array element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index` is not below the current
    /// length; use [`push`](ValueBuilder::push) or
    /// [`resize`](ValueBuilder::resize) to grow the array.
    #[track_caller]
    pub fn element_mut(&mut self, index: usize) -> Result<&mut ValueBuilder> {
        let path = self.path.clone();
        let items = self.array_items()?;
        let size = items.len();
        items
            .get_mut(index)
            .ok_or(Error::OutOfBounds { path, index, size })
    }

    /// Grows (with undefined elements) or truncates an array.
    #[track_caller]
    pub fn resize(&mut self, len: usize) -> Result<()> {
        let path = self.path.clone();
        let items = self.array_items()?;
        if len <= items.len() {
            items.truncate(len);
        } else {
            let start = items.len();
            items.extend((start..len).map(|index| ValueBuilder::undefined_at(path.index(index))));
        }
        Ok(())
    }

    /// Removes an object member, keeping the order of the remaining ones.
    #[track_caller]
    pub fn remove(&mut self, key: &str) -> Result<Option<ValueBuilder>> {
        self.ensure_live();
        match &mut self.state {
            State::Undefined => Ok(None),
            State::Object(entries) => Ok(entries.shift_remove(key).map(|mut removed| {
                removed.rebase(Path::root());
                removed
            })),
            _ => Err(self.mismatch("object")),
        }
    }

    #[track_caller]
    pub fn has_member(&self, key: &str) -> Result<bool> {
        self.ensure_live();
        match &self.state {
            State::Undefined => Ok(false),
            State::Object(entries) => Ok(entries.contains_key(key)),
            _ => Err(self.mismatch("object")),
        }
    }

    /// Number of array elements or object members (0 while undefined).
    #[track_caller]
    pub fn len(&self) -> Result<usize> {
        self.ensure_live();
        match &self.state {
            State::Undefined => Ok(0),
            State::Array(items) => Ok(items.len()),
            State::Object(entries) => Ok(entries.len()),
            _ => Err(self.mismatch("array or object")),
        }
    }

    #[track_caller]
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Finalizes the accumulated tree into a new immutable document.
    ///
    /// The builder is consumed: every later call on it panics.
    ///
    /// # Panics
    ///
    /// Panics if this builder, or any builder nested in it, was already
    /// extracted.
    #[track_caller]
    pub fn extract_value(&mut self) -> Value {
        self.ensure_live();
        let state = std::mem::replace(&mut self.state, State::Consumed);
        let builder = ValueBuilder {
            state,
            path: self.path.clone(),
        };

        let mut writer = DocumentWriter::new();
        let root = write_builder(builder, &mut writer);
        let doc = writer.finish(root);
        tracing::trace!(nodes = doc.len(), path = %self.path, "extracted built document");
        doc.root()
    }
}

#[track_caller]
fn write_builder(builder: ValueBuilder, writer: &mut DocumentWriter) -> NodeId {
    let ValueBuilder { state, path } = builder;
    match state {
        State::Undefined => writer.push(Node::Null),
        State::Scalar(node) => writer.push(node),
        State::Array(items) => {
            let ids = items
                .into_iter()
                .map(|item| write_builder(item, writer))
                .collect();
            writer.push(Node::Array(ids))
        }
        State::Object(entries) => {
            let entries = entries
                .into_iter()
                .map(|(key, entry)| (key, write_builder(entry, writer)))
                .collect();
            writer.push(Node::Object(entries))
        }
        State::Consumed => panic!("ValueBuilder at {} used after extract_value()", path),
    }
}

fn copy_node(doc: &Document, id: NodeId, path: Path) -> ValueBuilder {
    let state = match doc.node(id) {
        Node::Array(items) => State::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, child)| copy_node(doc, *child, path.index(index)))
                .collect(),
        ),
        Node::Object(entries) => State::Object(
            entries
                .iter()
                .map(|(key, child)| (key.clone(), copy_node(doc, *child, path.key(key.as_str()))))
                .collect(),
        ),
        scalar => State::Scalar(scalar.clone()),
    };
    ValueBuilder { state, path }
}

impl From<ValueBuilder> for Value {
    #[track_caller]
    fn from(mut builder: ValueBuilder) -> Self {
        builder.extract_value()
    }
}

/// Deep copy of the value's subtree. A missing value gives an undefined
/// builder.
impl From<&Value> for ValueBuilder {
    fn from(value: &Value) -> Self {
        match value.node_id() {
            Some(id) => copy_node(value.document(), id, Path::root()),
            None => ValueBuilder::new(),
        }
    }
}

impl From<Value> for ValueBuilder {
    fn from(value: Value) -> Self {
        ValueBuilder::from(&value)
    }
}

impl From<bool> for ValueBuilder {
    fn from(b: bool) -> Self {
        Self::with_state(State::Scalar(Node::Bool(b)))
    }
}

macro_rules! impl_from_narrow {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueBuilder {
                fn from(n: $ty) -> Self {
                    Self::with_state(State::Scalar(Node::Int64(i64::from(n))))
                }
            }
        )*
    };
}

impl_from_narrow!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_from_wide {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueBuilder {
                fn from(n: $ty) -> Self {
                    let node = match i64::try_from(n) {
                        Ok(i) => Node::Int64(i),
                        Err(_) => Node::Uint64(n as u64),
                    };
                    Self::with_state(State::Scalar(node))
                }
            }
        )*
    };
}

impl_from_wide!(isize, u64, usize);

impl From<f64> for ValueBuilder {
    fn from(d: f64) -> Self {
        Self::with_state(State::Scalar(Node::Double(d)))
    }
}

impl From<f32> for ValueBuilder {
    fn from(d: f32) -> Self {
        ValueBuilder::from(f64::from(d))
    }
}

impl From<String> for ValueBuilder {
    fn from(s: String) -> Self {
        Self::with_state(State::Scalar(Node::String(s)))
    }
}

impl From<&str> for ValueBuilder {
    fn from(s: &str) -> Self {
        ValueBuilder::from(s.to_owned())
    }
}

impl From<&String> for ValueBuilder {
    fn from(s: &String) -> Self {
        ValueBuilder::from(s.clone())
    }
}

impl From<char> for ValueBuilder {
    fn from(c: char) -> Self {
        ValueBuilder::from(c.to_string())
    }
}

/// `None` becomes `null`.
impl<T: Into<ValueBuilder>> From<Option<T>> for ValueBuilder {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(ValueBuilder::null, Into::into)
    }
}

fn array_of<T: Into<ValueBuilder>>(items: impl IntoIterator<Item = T>) -> ValueBuilder {
    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let mut item = item.into();
            item.ensure_live();
            item.rebase(Path::root().index(index));
            item
        })
        .collect();
    ValueBuilder::with_state(State::Array(items))
}

fn object_of<T: Into<ValueBuilder>>(
    entries: impl IntoIterator<Item = (String, T)>,
) -> ValueBuilder {
    let entries = entries
        .into_iter()
        .map(|(key, entry)| {
            let mut entry = entry.into();
            entry.ensure_live();
            entry.rebase(Path::root().key(key.as_str()));
            (key, entry)
        })
        .collect();
    ValueBuilder::with_state(State::Object(entries))
}

impl<T: Into<ValueBuilder>> From<Vec<T>> for ValueBuilder {
    fn from(items: Vec<T>) -> Self {
        array_of(items)
    }
}

impl<T: Clone + Into<ValueBuilder>> From<&[T]> for ValueBuilder {
    fn from(items: &[T]) -> Self {
        array_of(items.iter().cloned())
    }
}

impl<T: Into<ValueBuilder>, S: BuildHasher> From<HashMap<String, T, S>> for ValueBuilder {
    fn from(entries: HashMap<String, T, S>) -> Self {
        object_of(entries)
    }
}

impl<T: Into<ValueBuilder>> From<BTreeMap<String, T>> for ValueBuilder {
    fn from(entries: BTreeMap<String, T>) -> Self {
        object_of(entries)
    }
}

impl<T: Into<ValueBuilder>, S: BuildHasher> From<IndexMap<String, T, S>> for ValueBuilder {
    fn from(entries: IndexMap<String, T, S>) -> Self {
        object_of(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_scalar_builders() {
        assert_eq!(ValueBuilder::from(true).extract_value().to::<bool>().unwrap(), true);
        assert_eq!(ValueBuilder::from(-5_i8).extract_value().to::<i64>().unwrap(), -5);
        assert_eq!(ValueBuilder::from(2.5).extract_value().to::<f64>().unwrap(), 2.5);
        assert_eq!(
            ValueBuilder::from("text").extract_value().to::<String>().unwrap(),
            "text"
        );
        assert!(ValueBuilder::new().extract_value().is_null());
        assert!(ValueBuilder::null().extract_value().is_null());
        assert!(ValueBuilder::from(None::<i32>).extract_value().is_null());
    }

    #[test]
    fn test_wide_unsigned() {
        let small = ValueBuilder::from(7_u64).extract_value();
        assert!(small.is_int64());
        let big = ValueBuilder::from(u64::MAX).extract_value();
        assert!(big.is_uint64());
        assert_eq!(big.to::<u64>().unwrap(), u64::MAX);
    }

    #[test]
    fn test_nul_bytes_survive() {
        let s = "test\0test".to_string();
        let out = ValueBuilder::from(s.clone()).extract_value().to::<String>().unwrap();
        assert_eq!(out.as_bytes(), s.as_bytes());
    }

    #[test]
    fn test_set_upgrades_to_object() {
        let mut builder = ValueBuilder::new();
        builder.set("b", 1).unwrap();
        builder.set("a", 2).unwrap();
        builder.set("b", 3).unwrap();

        let value = builder.extract_value();
        assert!(value.is_object());
        let members: Vec<(String, i64)> = value
            .members()
            .unwrap()
            .map(|(key, v)| (key.to_string(), v.to().unwrap()))
            .collect();
        assert_eq!(members, vec![("b".to_string(), 3), ("a".to_string(), 2)]);
    }

    #[test]
    fn test_push_upgrades_to_array() {
        let mut builder = ValueBuilder::new();
        builder.push(1).unwrap();
        builder.push("two").unwrap();
        builder.push(ValueBuilder::null()).unwrap();

        let value = builder.extract_value();
        assert_eq!(value.len().unwrap(), 3);
        assert_eq!(value.at(1).unwrap().as_str(), Some("two"));
        assert!(value.at(2).unwrap().is_null());
    }

    #[test]
    fn test_mixing_kinds_fails() {
        let mut builder = ValueBuilder::new();
        builder.set("a", 1).unwrap();
        let err = builder.push(2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch at (root): expected array, found object"
        );

        let mut scalar = ValueBuilder::from(1);
        assert!(scalar.set("a", 1).unwrap_err().is_type_mismatch());
        assert!(scalar.member_mut("a").is_err());
    }

    #[test]
    fn test_nested_errors_carry_path() {
        let mut builder = ValueBuilder::new();
        builder
            .member_mut("format")
            .unwrap()
            .member_mut("html")
            .unwrap()
            .push(1)
            .unwrap();
        let html = builder.member_mut("format").unwrap().member_mut("html").unwrap();
        assert_eq!(html.path().to_string(), ".format.html");
        let err = html.set("toc", true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch at .format.html: expected object, found array"
        );
    }

    #[test]
    fn test_inserted_builders_are_rebased() {
        let mut inner = ValueBuilder::new();
        inner.push(1).unwrap();

        let mut outer = ValueBuilder::new();
        outer.set("list", inner).unwrap();
        let list = outer.member_mut("list").unwrap();
        assert_eq!(list.path().to_string(), ".list");
        assert_eq!(list.element_mut(0).unwrap().path().to_string(), ".list[0]");
    }

    #[test]
    fn test_bottom_up_nesting_rebases_every_level() {
        let mut inner = ValueBuilder::new();
        inner.set("leaf", 1).unwrap();
        for depth in 0..5 {
            let mut parent = ValueBuilder::new();
            if depth % 2 == 0 {
                parent.push(inner).unwrap();
            } else {
                parent.set("next", inner).unwrap();
            }
            inner = parent;
        }

        let mut cursor = &mut inner;
        cursor = cursor.element_mut(0).unwrap();
        cursor = cursor.member_mut("next").unwrap();
        cursor = cursor.element_mut(0).unwrap();
        cursor = cursor.member_mut("next").unwrap();
        cursor = cursor.element_mut(0).unwrap();
        assert_eq!(cursor.path().to_string(), "[0].next[0].next[0]");
        let leaf = cursor.member_mut("leaf").unwrap();
        assert_eq!(leaf.path().to_string(), "[0].next[0].next[0].leaf");
        let err = leaf.push(2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch at [0].next[0].next[0].leaf: expected array, found int64"
        );
    }

    #[test]
    fn test_element_mut() {
        let mut builder = ValueBuilder::array();
        builder.resize(2).unwrap();
        builder.element_mut(1).unwrap().set("k", "v").unwrap();
        let err = builder.element_mut(2).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert_eq!(err.to_string(), "Index 2 out of bounds at (root): size is 2");

        let value = builder.extract_value();
        assert!(value.at(0).unwrap().is_null());
        assert_eq!(value.at(1).unwrap().get("k").unwrap().as_str(), Some("v"));
    }

    #[test]
    fn test_resize_truncates() {
        let mut builder = ValueBuilder::from(vec![1, 2, 3]);
        builder.resize(1).unwrap();
        assert_eq!(builder.extract_value().to::<Vec<i32>>().unwrap(), vec![1]);
    }

    #[test]
    fn test_remove() {
        let mut builder = ValueBuilder::new();
        builder.set("a", 1).unwrap();
        builder.set("b", 2).unwrap();
        builder.set("c", 3).unwrap();
        let removed = builder.remove("b").unwrap().unwrap();
        assert!(removed.path().is_root());
        assert!(builder.remove("zz").unwrap().is_none());
        assert!(builder.has_member("a").unwrap());
        assert!(!builder.has_member("b").unwrap());

        let value = builder.extract_value();
        let keys: Vec<&str> = value.members().unwrap().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_copy_from_value() {
        let original = parse(r#"{"a": [1, {"b": null}], "c": "d"}"#).unwrap();
        let mut builder = ValueBuilder::from(&original);
        builder.set("c", "changed").unwrap();
        let copy = builder.extract_value();

        assert_eq!(original.get("c").unwrap().as_str(), Some("d"));
        assert_eq!(copy.get("c").unwrap().as_str(), Some("changed"));
        assert_eq!(original.get("a").unwrap(), copy.get("a").unwrap());

        let sub = ValueBuilder::from(original.get("a").unwrap().at(1).unwrap()).extract_value();
        assert!(sub.is_root());
        assert!(sub.get("b").unwrap().is_null());
    }

    #[test]
    fn test_collections() {
        let value = ValueBuilder::from(vec![vec![1, 2], vec![]]).extract_value();
        assert_eq!(value.to::<Vec<Vec<i32>>>().unwrap(), vec![vec![1, 2], vec![]]);

        let mut map = BTreeMap::new();
        map.insert("x".to_string(), 1.5);
        let value = ValueBuilder::from(map).extract_value();
        assert_eq!(value.get("x").unwrap().to::<f64>().unwrap(), 1.5);

        let slice: &[&str] = &["a", "b"];
        let value = ValueBuilder::from(slice).extract_value();
        assert_eq!(value.to::<Vec<String>>().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_consumes() {
        let mut builder = ValueBuilder::from(1);
        assert!(!builder.is_consumed());
        let _value = builder.extract_value();
        assert!(builder.is_consumed());
    }

    #[test]
    #[should_panic(expected = "used after extract_value()")]
    fn test_extract_twice_panics() {
        let mut builder = ValueBuilder::from(1);
        let _ = builder.extract_value();
        let _ = builder.extract_value();
    }

    #[test]
    #[should_panic(expected = "used after extract_value()")]
    fn test_set_after_extract_panics() {
        let mut builder = ValueBuilder::new();
        let _ = builder.extract_value();
        let _ = builder.set("a", 1);
    }

    #[test]
    #[should_panic(expected = "ValueBuilder at .inner used after extract_value()")]
    fn test_consumed_child_panics_on_finalize() {
        let mut builder = ValueBuilder::new();
        let _ = builder.member_mut("inner").unwrap().extract_value();
        let _ = builder.extract_value();
    }
}
