// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack frames and stack traces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single frame of a captured stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub function: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lineno: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub colno: Option<u32>,
	/// Whether the frame belongs to application code rather than the
	/// standard library or runtime.
	#[serde(default)]
	pub in_app: bool,
}

impl Frame {
	/// Creates a frame for a function with no location information.
	pub fn function(name: impl Into<String>) -> Self {
		let function = name.into();
		let module = function.rfind("::").map(|idx| function[..idx].to_string());
		Self {
			function: Some(function),
			module,
			..Default::default()
		}
	}
}

impl fmt::Display for Frame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.function.as_deref().unwrap_or("<unknown>"))?;
		if let Some(filename) = &self.filename {
			write!(f, " at {filename}")?;
			if let Some(line) = self.lineno {
				write!(f, ":{line}")?;
				if let Some(col) = self.colno {
					write!(f, ":{col}")?;
				}
			}
		}
		Ok(())
	}
}

/// An ordered stack of frames.
///
/// Frames are ordered innermost first: index 0 is the most recent call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	pub fn new(frames: Vec<Frame>) -> Self {
		Self { frames }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	pub fn len(&self) -> usize {
		self.frames.len()
	}

	/// Renders each frame to its human-readable form, preserving order.
	pub fn frame_strings(&self) -> Vec<String> {
		self.frames.iter().map(Frame::to_string).collect()
	}
}
