/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Navigation paths from a document root.
//!
//! A [`Path`] is an immutable, shared list of steps. Extending a path for a
//! child value allocates one link and never copies the parent's steps, so
//! every [`Value`](crate::Value) can carry its own path cheaply.

use std::fmt;
use std::sync::Arc;

/// A step in a navigation path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// Keys that would read as something else in a rendered path.
fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key.chars().any(|c| {
            matches!(c, '.' | '[' | ']' | '"' | '\\') || c.is_whitespace() || c.is_control()
        })
}

/// Plain keys render as `.key`, others as a quoted JSON string (`["a.b"]`).
impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) if needs_quoting(key) => {
                let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                write!(f, "[{}]", quoted)
            }
            PathSegment::Key(key) => write!(f, ".{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

#[derive(Debug)]
struct Link {
    segment: PathSegment,
    parent: Option<Arc<Link>>,
    depth: usize,
}

/// Path from the document root (e.g. `.format[2].toc`).
///
/// The root path is empty and renders as `(root)`.
#[derive(Clone, Default)]
pub struct Path {
    tail: Option<Arc<Link>>,
}

impl Path {
    /// The empty path of a document root.
    pub fn root() -> Self {
        Self { tail: None }
    }

    /// This path extended by an object member step.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.push(PathSegment::Key(key.into()))
    }

    /// This path extended by an array element step.
    pub fn index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    fn push(&self, segment: PathSegment) -> Self {
        Self {
            tail: Some(Arc::new(Link {
                segment,
                parent: self.tail.clone(),
                depth: self.len() + 1,
            })),
        }
    }

    /// Number of steps from the root.
    pub fn len(&self) -> usize {
        self.tail.as_ref().map_or(0, |link| link.depth)
    }

    pub fn is_root(&self) -> bool {
        self.tail.is_none()
    }

    /// The final step, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.tail.as_deref().map(|link| &link.segment)
    }

    /// The path without its final step.
    pub fn parent(&self) -> Option<Path> {
        self.tail.as_ref().map(|link| Path {
            tail: link.parent.clone(),
        })
    }

    /// Steps in root-to-leaf order.
    pub fn segments(&self) -> Vec<PathSegment> {
        let mut segments = Vec::with_capacity(self.len());
        let mut cursor = self.tail.as_deref();
        while let Some(link) = cursor {
            segments.push(link.segment.clone());
            cursor = link.parent.as_deref();
        }
        segments.reverse();
        segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "(root)");
        }
        for segment in self.segments() {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        let (mut a, mut b) = (self.tail.as_ref(), other.tail.as_ref());
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.depth != y.depth || x.segment != y.segment {
                        return false;
                    }
                    a = x.parent.as_ref();
                    b = y.parent.as_ref();
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Path {}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Path::root(), |path, segment| path.push(segment))
    }
}
