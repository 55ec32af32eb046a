/*
 * convert.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Typed extraction from [`Value`]s.
//!
//! [`FromValue`] is the extension point behind [`Value::to`]: the requested
//! type picks its conversion at compile time, and the conversion inspects
//! the node tag at runtime to decide whether it succeeds. Implement it for
//! your own types next to their definition:
//!
//! ```rust
//! use quarto_json::{FromValue, Result, Value, parse};
//!
//! struct MyKeyValue {
//!     field1: String,
//!     field2: i32,
//! }
//!
//! impl FromValue for MyKeyValue {
//!     fn from_value(value: &Value) -> Result<Self> {
//!         Ok(MyKeyValue {
//!             field1: value.get("field1")?.to_or(String::new())?,
//!             field2: value.get("field2")?.to_or(1)?,
//!         })
//!     }
//! }
//!
//! let json = parse(r#"{"my_value": {"field1": "one"}}"#).unwrap();
//! let data: MyKeyValue = json.get("my_value").unwrap().to().unwrap();
//! assert_eq!(data.field1, "one");
//! assert_eq!(data.field2, 1);
//! ```
//!
//! ## Numbers
//!
//! Integers convert exactly or not at all. A double converts to an integer
//! type only when it holds an integral value of magnitude below 2^53, the
//! range in which every integer has an exact double representation.
//! Beyond that the stored double may already be a rounded neighbour of the
//! literal, so the conversion fails instead of guessing.

use crate::document::Node;
use crate::{Error, Result, Value};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;

/// Conversion from a document [`Value`] into a native type.
///
/// Conversions for containers call [`Value::to`] on every child, so errors
/// name the exact element that failed.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

/// 2^53: the first integer magnitude a double cannot always represent.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Returns the integer held by `d`, if it holds one exactly.
pub(crate) fn exact_integer(d: f64) -> Option<i64> {
    if d.is_finite() && d.trunc() == d && d.abs() < MAX_EXACT_INTEGER {
        Some(d as i64)
    } else {
        None
    }
}

fn out_of_range(value: &Value, expected: &str, found: impl std::fmt::Display) -> Error {
    Error::type_mismatch(
        value.path(),
        expected,
        format!("{} {} (out of range)", value.describe(), found),
    )
}

fn integer<T>(value: &Value, expected: &str) -> Result<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    match value.node() {
        Some(Node::Int64(i)) => {
            <T as TryFrom<i64>>::try_from(*i).map_err(|_| out_of_range(value, expected, i))
        }
        Some(Node::Uint64(u)) => {
            <T as TryFrom<u64>>::try_from(*u).map_err(|_| out_of_range(value, expected, u))
        }
        Some(Node::Double(d)) => {
            let i = exact_integer(*d).ok_or_else(|| {
                Error::type_mismatch(
                    value.path(),
                    expected,
                    format!("double {} (not exactly representable as an integer)", d),
                )
            })?;
            <T as TryFrom<i64>>::try_from(i).map_err(|_| out_of_range(value, expected, d))
        }
        _ => Err(value.type_mismatch(expected)),
    }
}

macro_rules! impl_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    integer(value, stringify!($ty))
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| value.type_mismatch("f64"))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        let d = value.as_f64().ok_or_else(|| value.type_mismatch("f32"))?;
        if d.abs() > f64::from(f32::MAX) {
            return Err(out_of_range(value, "f32", d));
        }
        Ok(d as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| value.type_mismatch("bool"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| value.type_mismatch("string"))
    }
}

/// The value itself, missing or not.
impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

/// Missing and null values become `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_missing() || value.is_null() {
            Ok(None)
        } else {
            value.to().map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value) -> Result<Self> {
        value.to().map(Box::new)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        value.elements()?.map(|element| element.to()).collect()
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: &Value) -> Result<Self> {
        value.elements()?.map(|element| element.to()).collect()
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, T, S> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .members()?
            .map(|(key, member)| Ok((key.to_owned(), member.to()?)))
            .collect()
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .members()?
            .map(|(key, member)| Ok((key.to_owned(), member.to()?)))
            .collect()
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for IndexMap<String, T, S> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .members()?
            .map(|(key, member)| Ok((key.to_owned(), member.to()?)))
            .collect()
    }
}
