// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute values and attribute maps attached to every record.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
///
/// The set of shapes is closed. Anything richer than a number or a string is
/// stored as its JSON (or, failing that, descriptive) text so that a record
/// always serializes the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
	Integer(i64),
	Float(f64),
	String(String),
	/// Structured value flattened to text.
	Object(String),
}

impl AttributeValue {
	/// Builds an [`AttributeValue::Object`] from any serializable value.
	///
	/// Values that fail to serialize are represented by their type name
	/// rather than failing the capture.
	pub fn object<T: Serialize + ?Sized>(value: &T) -> Self {
		match serde_json::to_string(value) {
			Ok(json) => Self::Object(json),
			Err(_) => Self::Object(format!("<{}>", std::any::type_name::<T>())),
		}
	}

	/// Builds an [`AttributeValue::Object`] from a value's `Debug` output.
	pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
		Self::Object(format!("{value:?}"))
	}

	/// Returns the integer payload, if any.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Integer(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the textual payload of `String` and `Object` values.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) | Self::Object(s) => Some(s),
			_ => None,
		}
	}
}

impl fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Integer(v) => write!(f, "{v}"),
			Self::Float(v) => write!(f, "{v}"),
			Self::String(s) | Self::Object(s) => f.write_str(s),
		}
	}
}

macro_rules! integer_from {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for AttributeValue {
				fn from(v: $ty) -> Self {
					Self::Integer(i64::from(v))
				}
			}
		)*
	};
}

integer_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for AttributeValue {
	fn from(v: u64) -> Self {
		i64::try_from(v)
			.map(Self::Integer)
			.unwrap_or_else(|_| Self::String(v.to_string()))
	}
}

impl From<usize> for AttributeValue {
	fn from(v: usize) -> Self {
		Self::from(v as u64)
	}
}

impl From<f64> for AttributeValue {
	fn from(v: f64) -> Self {
		// JSON has no encoding for NaN or infinities.
		if v.is_finite() {
			Self::Float(v)
		} else {
			Self::String(v.to_string())
		}
	}
}

impl From<f32> for AttributeValue {
	fn from(v: f32) -> Self {
		Self::from(f64::from(v))
	}
}

impl From<bool> for AttributeValue {
	fn from(v: bool) -> Self {
		Self::String(v.to_string())
	}
}

impl From<&str> for AttributeValue {
	fn from(v: &str) -> Self {
		Self::String(v.to_string())
	}
}

impl From<String> for AttributeValue {
	fn from(v: String) -> Self {
		Self::String(v)
	}
}

impl From<&String> for AttributeValue {
	fn from(v: &String) -> Self {
		Self::String(v.clone())
	}
}

impl From<serde_json::Value> for AttributeValue {
	fn from(value: serde_json::Value) -> Self {
		use serde_json::Value;

		match value {
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Self::Integer(i)
				} else if let Some(u) = n.as_u64() {
					Self::from(u)
				} else {
					n.as_f64().map(Self::from).unwrap_or_else(|| Self::String(n.to_string()))
				}
			}
			Value::String(s) => Self::String(s),
			Value::Bool(b) => Self::from(b),
			other => Self::Object(other.to_string()),
		}
	}
}

/// A map of attribute keys to values.
///
/// Keys are unique and later inserts overwrite earlier ones. Iteration is in
/// key order, which keeps serialized records stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
	inner: BTreeMap<String, AttributeValue>,
}

impl Attributes {
	/// Creates an empty attribute map.
	pub fn new() -> Self {
		Self {
			inner: BTreeMap::new(),
		}
	}

	/// Inserts a value, returning the one it replaced.
	pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<AttributeValue>
	where
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.inner.insert(key.into(), value.into())
	}

	/// Builder-style insert.
	pub fn with<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.insert(key, value);
		self
	}

	pub fn get(&self, key: &str) -> Option<&AttributeValue> {
		self.inner.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
		self.inner.remove(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValue> {
		self.inner.iter()
	}

	/// Returns a new map holding `self` overlaid with `overlay`.
	///
	/// On key collisions the value from `overlay` wins. Neither input is
	/// modified.
	pub fn merged(&self, overlay: &Attributes) -> Attributes {
		let mut inner = self.inner.clone();
		for (k, v) in &overlay.inner {
			inner.insert(k.clone(), v.clone());
		}
		Attributes { inner }
	}
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
	K: Into<String>,
	V: Into<AttributeValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut attributes = Attributes::new();
		for (k, v) in iter {
			attributes.insert(k, v);
		}
		attributes
	}
}

impl IntoIterator for Attributes {
	type Item = (String, AttributeValue);
	type IntoIter = btree_map::IntoIter<String, AttributeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.into_iter()
	}
}

impl<'a> IntoIterator for &'a Attributes {
	type Item = (&'a String, &'a AttributeValue);
	type IntoIter = btree_map::Iter<'a, String, AttributeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.iter()
	}
}
