// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembled report records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::Attributes;
use crate::error::Result;
use crate::stack::Stacktrace;
use crate::RecordId;

/// Language tag stamped on every record.
pub const LANG: &str = "rust";

/// Descriptor of the thread a report was captured on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// True when the stack belongs to a fault rather than a plain message.
	pub fault: bool,
	pub stack: Stacktrace,
}

/// One captured error event, ready for storage or delivery.
///
/// Records are built once by the assembler and then only moved or borrowed
/// between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
	pub uuid: RecordId,
	/// UTC seconds since the Unix epoch.
	pub timestamp: i64,
	pub lang: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lang_version: Option<String>,
	pub agent: String,
	pub agent_version: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_type: Option<String>,
	pub message: String,
	pub attributes: Attributes,
	/// Human-readable frames, innermost first.
	pub stack_frames: Vec<String>,
	pub main_thread: ThreadInfo,
}

impl ReportRecord {
	/// Encodes the record as JSON.
	pub fn to_json(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	/// Decodes a record previously written by [`ReportRecord::to_json`].
	pub fn from_json(bytes: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(bytes)?)
	}

	pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
		Utc.timestamp_opt(self.timestamp, 0).single()
	}

	pub fn is_exception(&self) -> bool {
		self.exception_type.is_some()
	}
}
