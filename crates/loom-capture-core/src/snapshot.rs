// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Options for native memory snapshots (minidumps).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CaptureError;

/// File extension every generated snapshot carries.
pub const MINIDUMP_EXTENSION: &str = "dmp";

/// How much process memory a snapshot should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinidumpType {
	/// Thread stacks and module list only.
	#[default]
	Normal,
	WithDataSegments,
	WithFullMemory,
	WithHandleData,
	WithThreadInfo,
	WithIndirectlyReferencedMemory,
}

impl fmt::Display for MinidumpType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Normal => write!(f, "normal"),
			Self::WithDataSegments => write!(f, "with_data_segments"),
			Self::WithFullMemory => write!(f, "with_full_memory"),
			Self::WithHandleData => write!(f, "with_handle_data"),
			Self::WithThreadInfo => write!(f, "with_thread_info"),
			Self::WithIndirectlyReferencedMemory => write!(f, "with_indirectly_referenced_memory"),
		}
	}
}

impl FromStr for MinidumpType {
	type Err = CaptureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"normal" => Ok(Self::Normal),
			"with_data_segments" => Ok(Self::WithDataSegments),
			"with_full_memory" => Ok(Self::WithFullMemory),
			"with_handle_data" => Ok(Self::WithHandleData),
			"with_thread_info" => Ok(Self::WithThreadInfo),
			"with_indirectly_referenced_memory" => Ok(Self::WithIndirectlyReferencedMemory),
			_ => Err(CaptureError::InvalidMinidumpType(s.to_string())),
		}
	}
}

/// Whether a snapshot is taken while handling an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionContext {
	None,
	Present,
}

impl ExceptionContext {
	pub fn is_present(self) -> bool {
		matches!(self, Self::Present)
	}
}
