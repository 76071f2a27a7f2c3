// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for capture data types.

use thiserror::Error;

/// Errors that can occur when parsing or encoding capture types.
#[derive(Debug, Error)]
pub enum CaptureError {
	#[error("invalid minidump type: {0}")]
	InvalidMinidumpType(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for capture data operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
