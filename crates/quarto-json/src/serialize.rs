/*
 * serialize.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Writing values back out as JSON text.
//!
//! [`Value`] implements [`serde::Serialize`], so it can be embedded in any
//! serde output. Object members are written in document order.

use crate::document::{Document, Node, NodeId};
use crate::{Error, Path, Result, Value};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.node_id() {
            Some(id) => NodeRef {
                doc: self.document(),
                id,
            }
            .serialize(serializer),
            None => Err(S::Error::custom(format!(
                "cannot serialize missing value at {}",
                self.path()
            ))),
        }
    }
}

struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.doc.node(self.id) {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Int64(i) => serializer.serialize_i64(*i),
            Node::Uint64(u) => serializer.serialize_u64(*u),
            Node::Double(d) if d.is_finite() => serializer.serialize_f64(*d),
            Node::Double(d) => Err(S::Error::custom(format!("non-finite number {}", d))),
            Node::String(s) => serializer.serialize_str(s),
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for id in items {
                    seq.serialize_element(&NodeRef { doc: self.doc, id: *id })?;
                }
                seq.end()
            }
            Node::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, id) in entries {
                    map.serialize_entry(key, &NodeRef { doc: self.doc, id: *id })?;
                }
                map.end()
            }
        }
    }
}

impl Value {
    /// Renders this value as compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialize`] for a missing value, or if the subtree
    /// holds a non-finite double (only possible in built documents).
    pub fn to_json_string(&self) -> Result<String> {
        self.check_serializable()?;
        serde_json::to_string(self).map_err(|err| self.serialize_error(err))
    }

    /// Renders this value as indented JSON text.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        self.check_serializable()?;
        serde_json::to_string_pretty(self).map_err(|err| self.serialize_error(err))
    }

    fn serialize_error(&self, err: serde_json::Error) -> Error {
        Error::Serialize {
            path: self.path().clone(),
            message: err.to_string(),
        }
    }

    /// Locates the first node that has no JSON text form.
    fn check_serializable(&self) -> Result<()> {
        match self.node_id() {
            Some(id) => check_node(self.document(), id, self.path()),
            None => Err(Error::Serialize {
                path: self.path().clone(),
                message: "missing value".to_string(),
            }),
        }
    }
}

fn check_node(doc: &Document, id: NodeId, path: &Path) -> Result<()> {
    match doc.node(id) {
        Node::Double(d) if !d.is_finite() => Err(Error::Serialize {
            path: path.clone(),
            message: format!("non-finite number {}", d),
        }),
        Node::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(index, child)| check_node(doc, *child, &path.index(index))),
        Node::Object(entries) => entries
            .iter()
            .try_for_each(|(key, child)| check_node(doc, *child, &path.key(key.as_str()))),
        _ => Ok(()),
    }
}
