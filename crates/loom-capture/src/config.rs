// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture configuration.
//!
//! Values are layered: defaults, then an optional TOML document, then
//! `LOOM_CAPTURE_*` environment variables.

use std::path::{Path, PathBuf};

use loom_capture_core::MinidumpType;
use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_RATE_LIMIT: &str = "LOOM_CAPTURE_RATE_LIMIT";
pub const ENV_DATABASE_PATH: &str = "LOOM_CAPTURE_DATABASE_PATH";
pub const ENV_MINIDUMP_TYPE: &str = "LOOM_CAPTURE_MINIDUMP_TYPE";

/// Configuration consumed by the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
	/// Maximum records admitted between reconfigurations. 0 is unlimited.
	pub rate_limit: u32,
	/// Offline store directory. `None` disables the store.
	#[serde(deserialize_with = "deserialize_database_path")]
	pub database_path: Option<PathBuf>,
	/// Snapshot type used for panics captured by the panic hook.
	pub minidump_type: MinidumpType,
	/// Take a snapshot for panics captured by the panic hook.
	pub capture_snapshots: bool,
}

impl Default for CaptureConfig {
	fn default() -> Self {
		Self {
			rate_limit: 0,
			database_path: None,
			minidump_type: MinidumpType::Normal,
			capture_snapshots: false,
		}
	}
}

impl CaptureConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(s)?)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml_str(&contents)?;
		tracing::debug!(path = %path.display(), "loaded capture config");
		Ok(config)
	}

	/// Applies `LOOM_CAPTURE_*` overrides from the process environment.
	pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
		self.with_overrides(|key| std::env::var(key).ok())
	}

	/// Applies overrides from an arbitrary variable source.
	pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(raw) = lookup(ENV_RATE_LIMIT) {
			self.rate_limit = raw
				.trim()
				.parse()
				.map_err(|e| ConfigError::invalid_value(ENV_RATE_LIMIT, format!("{e}")))?;
		}

		if let Some(raw) = lookup(ENV_DATABASE_PATH) {
			self.database_path = normalize_path(raw);
		}

		if let Some(raw) = lookup(ENV_MINIDUMP_TYPE) {
			self.minidump_type = raw
				.trim()
				.parse()
				.map_err(|e| ConfigError::invalid_value(ENV_MINIDUMP_TYPE, format!("{e}")))?;
		}

		Ok(self)
	}
}

fn normalize_path(raw: String) -> Option<PathBuf> {
	if raw.trim().is_empty() {
		None
	} else {
		Some(PathBuf::from(raw))
	}
}

fn deserialize_database_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let raw: Option<String> = Option::deserialize(deserializer)?;
	Ok(raw.and_then(normalize_path))
}
