// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom client-side error capture.
//!
//! This crate holds the data model shared by the capture pipeline
//! (`loom-capture`) and by anything that reads records back from an offline
//! store directory.
//!
//! # Overview
//!
//! - [`Report`]: what the embedding application asks to capture, either a
//!   free-text message or an exception, plus per-report attributes
//! - [`ReportRecord`]: the assembled, serializable output handed to storage
//!   and transport
//! - [`Attributes`] / [`AttributeValue`]: contextual key/value data with a
//!   closed set of value shapes so serialization stays deterministic
//! - [`Stacktrace`] / [`Frame`]: captured call stacks
//! - [`MinidumpType`] / [`ExceptionContext`]: options for native snapshots

pub mod attribute;
pub mod error;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod stack;

pub use attribute::{AttributeValue, Attributes};
pub use error::{CaptureError, Result};
pub use record::{ReportRecord, ThreadInfo, LANG};
pub use report::{Report, ReportKind};
pub use snapshot::{ExceptionContext, MinidumpType, MINIDUMP_EXTENSION};
pub use stack::{Frame, Stacktrace};

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an assembled record.
///
/// 128 random bits. The server rejects a record whose identifier it has
/// already seen, so identifiers are never derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for RecordId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for RecordId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for RecordId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}
