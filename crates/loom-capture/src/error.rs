// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the capture pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for capture pipeline operations.
pub type Result<T> = std::result::Result<T, CaptureSdkError>;

/// Errors that can occur in the capture pipeline.
///
/// Admission rejections and snapshot failures are not errors; they surface
/// as return values. These variants cover construction and storage I/O.
#[derive(Debug, Error)]
pub enum CaptureSdkError {
	/// A transport was not supplied to the dispatcher builder.
	#[error("a transport is required")]
	MissingTransport,

	/// Filesystem operation failed.
	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Failed to encode or decode a record.
	#[error("record encoding error: {0}")]
	Record(#[from] loom_capture_core::CaptureError),

	/// Configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

impl CaptureSdkError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// I/O error reading config file
	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error: {0}")]
	TomlParse(#[from] toml::de::Error),

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}
