// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scope attributes shared by every report from a client.

use loom_capture_core::{AttributeValue, Attributes};
use parking_lot::RwLock;

/// Thread-safe map of long-lived attributes.
///
/// Shared between capture threads behind an `Arc`. Concurrent writes to the
/// same key are last-writer-wins.
#[derive(Debug, Default)]
pub struct AttributeStore {
	inner: RwLock<Attributes>,
}

impl AttributeStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store seeded with `attributes`.
	pub fn with_attributes(attributes: Attributes) -> Self {
		Self {
			inner: RwLock::new(attributes),
		}
	}

	/// Sets an attribute, returning the previous value.
	pub fn set<K, V>(&self, key: K, value: V) -> Option<AttributeValue>
	where
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.inner.write().insert(key, value)
	}

	pub fn get(&self, key: &str) -> Option<AttributeValue> {
		self.inner.read().get(key).cloned()
	}

	pub fn remove(&self, key: &str) -> Option<AttributeValue> {
		self.inner.write().remove(key)
	}

	pub fn clear(&self) {
		*self.inner.write() = Attributes::new();
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}

	/// Returns a point-in-time copy for assembly.
	pub fn snapshot(&self) -> Attributes {
		self.inner.read().clone()
	}
}
