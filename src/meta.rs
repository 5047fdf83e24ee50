// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structured metadata attached to log calls.
//!
//! [`Meta`] is a dynamically typed value tree. Values can be shared through [`SharedMeta`],
//! which also makes reference cycles possible; [`Meta::decycle`] replaces repeated references
//! with `[Circular <path>]` markers before anything is rendered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

/// Ordered key-value metadata.
pub type MetaMap = IndexMap<String, Meta>;

/// A metadata value.
#[derive(Debug, Clone, Default)]
pub enum Meta {
    /// An absent value.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// Binary data, rendered as base64.
    Bytes(Vec<u8>),
    /// A point in time.
    Date(jiff::Timestamp),
    /// A list of values.
    Array(Vec<Meta>),
    /// An ordered map of values.
    Object(MetaMap),
    /// An error with an optional stack.
    Error(ErrorMeta),
    /// A value that may be referenced from several places.
    Shared(SharedMeta),
}

/// The structural kind of a [`Meta`], looking through [`Meta::Shared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    /// `undefined` or `null`.
    Nothing,
    /// Booleans, numbers, strings, bytes and dates.
    Scalar,
    /// [`Meta::Array`].
    Array,
    /// [`Meta::Object`].
    Object,
    /// [`Meta::Error`].
    Error,
}

impl Meta {
    /// An empty object.
    pub fn object() -> Meta {
        Meta::Object(MetaMap::new())
    }

    /// Binary data.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Meta {
        Meta::Bytes(data.into())
    }

    /// Build an error value from any error, including its source chain in the stack.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Meta {
        Meta::Error(ErrorMeta::from_error(err))
    }

    /// The structural kind of this value.
    pub fn kind(&self) -> MetaKind {
        match self {
            Meta::Undefined | Meta::Null => MetaKind::Nothing,
            Meta::Bool(_) | Meta::Number(_) | Meta::String(_) | Meta::Bytes(_) | Meta::Date(_) => {
                MetaKind::Scalar
            }
            Meta::Array(_) => MetaKind::Array,
            Meta::Object(_) => MetaKind::Object,
            Meta::Error(_) => MetaKind::Error,
            Meta::Shared(shared) => shared.read().kind(),
        }
    }

    /// Whether this is `undefined` or `null`.
    pub fn is_nothing(&self) -> bool {
        self.kind() == MetaKind::Nothing
    }

    /// Return a clone of the value under `key` if this is an object.
    pub fn get(&self, key: &str) -> Option<Meta> {
        match self {
            Meta::Object(map) => map.get(key).cloned(),
            Meta::Shared(shared) => shared.read().get(key),
            _ => None,
        }
    }

    /// Return the string under `key` if this is an object holding a string there.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Meta::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number of keys if this is an object.
    pub fn key_count(&self) -> Option<usize> {
        match self {
            Meta::Object(map) => Some(map.len()),
            Meta::Shared(shared) => shared.read().key_count(),
            _ => None,
        }
    }

    /// Insert `value` under `key`, turning `undefined` into an object first.
    ///
    /// Returns `false` if this value is neither an object nor `undefined`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Meta>) -> bool {
        if matches!(self, Meta::Undefined) {
            *self = Meta::object();
        }
        match self {
            Meta::Object(map) => {
                map.insert(key.into(), value.into());
                true
            }
            Meta::Shared(shared) => shared.insert(key, value),
            _ => false,
        }
    }

    /// Return a tree without [`Meta::Shared`] nodes.
    ///
    /// A shared value seen for the second time is replaced by the string
    /// `[Circular <path>]`, where `<path>` locates its first occurrence (`$` is the root).
    pub fn decycle(&self) -> Meta {
        let mut seen = HashMap::new();
        self.decycle_at("$", &mut seen)
    }

    fn decycle_at(&self, path: &str, seen: &mut HashMap<usize, String>) -> Meta {
        match self {
            Meta::Shared(shared) => {
                let key = shared.addr();
                if let Some(first) = seen.get(&key) {
                    return Meta::String(format!("[Circular {first}]"));
                }
                seen.insert(key, path.to_string());
                let inner = shared.read();
                inner.decycle_at(path, seen)
            }
            Meta::Array(items) => Meta::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.decycle_at(&format!("{path}[{i}]"), seen))
                    .collect(),
            ),
            Meta::Object(map) => Meta::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.decycle_at(&format!("{path}.{k}"), seen)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Convert into a JSON value, decycling first.
    ///
    /// Bytes become base64 strings, dates RFC 3339 strings, errors objects with their message
    /// and stack. `undefined` members of objects are omitted, and become `null` in arrays.
    pub fn to_json(&self) -> Value {
        self.decycle().to_json_acyclic()
    }

    fn to_json_acyclic(&self) -> Value {
        match self {
            Meta::Undefined | Meta::Null => Value::Null,
            Meta::Bool(b) => Value::Bool(*b),
            Meta::Number(n) => Value::Number(n.clone()),
            Meta::String(s) => Value::String(s.clone()),
            Meta::Bytes(b) => Value::String(STANDARD.encode(b)),
            Meta::Date(ts) => Value::String(ts.to_string()),
            Meta::Array(items) => Value::Array(items.iter().map(Meta::to_json_acyclic).collect()),
            Meta::Object(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Meta::Undefined))
                    .map(|(k, v)| (k.clone(), v.to_json_acyclic()))
                    .collect(),
            ),
            Meta::Error(err) => {
                let mut obj = serde_json::Map::new();
                obj.insert("message".to_string(), Value::String(err.message.clone()));
                if let Some(stack) = &err.stack {
                    obj.insert("stack".to_string(), Value::String(stack.clone()));
                }
                Value::Object(obj)
            }
            // decycled trees hold no shared nodes
            Meta::Shared(shared) => shared.read().to_json_acyclic(),
        }
    }
}

impl Serialize for Meta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl From<Value> for Meta {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Meta::Null,
            Value::Bool(b) => Meta::Bool(b),
            Value::Number(n) => Meta::Number(n),
            Value::String(s) => Meta::String(s),
            Value::Array(items) => Meta::Array(items.into_iter().map(Meta::from).collect()),
            Value::Object(map) => {
                Meta::Object(map.into_iter().map(|(k, v)| (k, Meta::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Meta {
    fn from(value: &str) -> Self {
        Meta::String(value.to_string())
    }
}

impl From<String> for Meta {
    fn from(value: String) -> Self {
        Meta::String(value)
    }
}

impl From<bool> for Meta {
    fn from(value: bool) -> Self {
        Meta::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Meta {
                fn from(value: $t) -> Self {
                    Meta::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Meta {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Meta::Null, Meta::Number)
    }
}

impl From<jiff::Timestamp> for Meta {
    fn from(value: jiff::Timestamp) -> Self {
        Meta::Date(value)
    }
}

impl From<Vec<Meta>> for Meta {
    fn from(value: Vec<Meta>) -> Self {
        Meta::Array(value)
    }
}

impl From<MetaMap> for Meta {
    fn from(value: MetaMap) -> Self {
        Meta::Object(value)
    }
}

impl From<ErrorMeta> for Meta {
    fn from(value: ErrorMeta) -> Self {
        Meta::Error(value)
    }
}

impl From<SharedMeta> for Meta {
    fn from(value: SharedMeta) -> Self {
        Meta::Shared(value)
    }
}

/// An error captured as metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMeta {
    /// The error message.
    pub message: String,
    /// A multi-line description, rendered in place of the error when present.
    pub stack: Option<String>,
}

impl ErrorMeta {
    /// An error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = Some(format!("Error: {message}"));
        Self { message, stack }
    }

    /// Capture `err`; its source chain is listed in the stack.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = format!("Error: {message}");
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            message,
            stack: Some(stack),
        }
    }

    /// Replace the stack.
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

impl fmt::Display for ErrorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

/// A reference-counted metadata value.
///
/// Cloning a `SharedMeta` yields another reference to the same value, which is how repeated
/// and circular references are built.
#[derive(Clone, Default)]
pub struct SharedMeta(Arc<RwLock<Meta>>);

impl SharedMeta {
    /// Share `value`.
    pub fn new(value: impl Into<Meta>) -> Self {
        SharedMeta(Arc::new(RwLock::new(value.into())))
    }

    /// Insert `value` under `key` of the shared object.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Meta>) -> bool {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        match &mut *guard {
            Meta::Shared(inner) => inner.insert(key, value),
            other => other.insert(key, value),
        }
    }

    /// Read the shared value.
    pub fn read(&self) -> RwLockReadGuard<'_, Meta> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for SharedMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedMeta({:#x})", self.addr())
    }
}

/// Format a number as it reads in log text: floats without a fractional part print like
/// integers, e.g. `3` rather than `3.0`.
pub(crate) fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(value) if n.is_f64() => float_text(value),
        _ => n.to_string(),
    }
}

pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}Infinity")
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decycle_self_reference() {
        let m = SharedMeta::new(Meta::object());
        m.insert("name", "root");
        m.insert("self", m.clone());

        let decycled = Meta::Shared(m).decycle();
        assert_eq!(
            decycled.to_json(),
            json!({"name": "root", "self": "[Circular $]"})
        );
    }

    #[test]
    fn test_decycle_nested_reference() {
        let child = SharedMeta::new(json!({"id": 1}));
        let mut root = Meta::object();
        root.insert("a", child.clone());
        root.insert("list", vec![Meta::from(child.clone())]);
        assert_eq!(
            root.to_json(),
            json!({"a": {"id": 1}, "list": ["[Circular $.a]"]})
        );
    }

    #[test]
    fn test_to_json_special_values() {
        let mut meta = Meta::object();
        meta.insert("bin", Meta::bytes(b"hi".to_vec()));
        meta.insert("gone", Meta::Undefined);
        meta.insert("items", vec![Meta::Undefined, Meta::from(1)]);
        meta.insert("err", ErrorMeta::new("boom"));
        assert_eq!(
            meta.to_json(),
            json!({
                "bin": "aGk=",
                "items": [null, 1],
                "err": {"message": "boom", "stack": "Error: boom"},
            })
        );
    }

    #[test]
    fn test_error_chain_in_stack() {
        let inner = std::io::Error::other("disk gone");
        let outer = crate::Error::from_io_error(inner);
        let meta = ErrorMeta::from_error(&outer);
        let stack = meta.stack.unwrap();
        assert!(stack.starts_with("Error: failed to perform io"));
        assert!(stack.ends_with("caused by: disk gone"));
    }

    #[test]
    fn test_kind_looks_through_shared() {
        let shared = Meta::Shared(SharedMeta::new(json!({"a": 1})));
        assert_eq!(shared.kind(), MetaKind::Object);
        assert_eq!(shared.key_count(), Some(1));
        assert!(Meta::Undefined.is_nothing());
        assert_eq!(Meta::from("x").kind(), MetaKind::Scalar);
    }
}
