// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline store for records and memory snapshots awaiting delivery.
//!
//! # Directory layout
//!
//! - `<uuid>.dmp`: native memory snapshots
//! - `Backtrace_<unix-seconds>`: JSON-encoded records
//! - `.Backtrace_<unix-seconds>.<uuid>.claimed`: records taken by a flush
//!
//! The directory belongs to the store. Everything in it is removed when the
//! store is opened, so nothing survives a process restart.
//!
//! A store opened without a path is disabled: every operation succeeds
//! without touching the filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use loom_capture_core::{MinidumpType, Report, ReportRecord, MINIDUMP_EXTENSION};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CaptureSdkError, Result};
use crate::snapshot::{SnapshotWriter, UnavailableSnapshotWriter};

/// File name prefix for persisted records.
pub const PERSISTED_PREFIX: &str = "Backtrace_";
const CLAIMED_SUFFIX: &str = ".claimed";

/// Returns the file name a record with `timestamp` is persisted under.
pub fn persisted_file_name(timestamp: i64) -> String {
	format!("{PERSISTED_PREFIX}{timestamp}")
}

/// A record read back from the store.
#[derive(Debug, Clone)]
pub struct PersistedRecord {
	pub path: PathBuf,
	pub record: ReportRecord,
}

/// Staging directory for undelivered records and snapshots.
///
/// Operations claim uniquely named files, so the store needs no locking and
/// can be shared across capture threads.
pub struct OfflineStore {
	root: Option<PathBuf>,
	writer: Arc<dyn SnapshotWriter>,
}

impl OfflineStore {
	/// A store that never touches the filesystem.
	pub fn disabled() -> Self {
		Self {
			root: None,
			writer: Arc::new(UnavailableSnapshotWriter),
		}
	}

	/// Opens the store at `path`, clearing any previous contents.
	///
	/// A missing or empty path yields a disabled store.
	pub fn open(path: Option<&Path>, writer: Arc<dyn SnapshotWriter>) -> Result<Self> {
		let Some(root) = path.filter(|p| !p.as_os_str().is_empty()) else {
			debug!("offline store disabled");
			return Ok(Self {
				root: None,
				writer,
			});
		};

		fs::create_dir_all(root).map_err(|e| CaptureSdkError::io(root, e))?;
		clear_directory(root)?;

		info!(path = %root.display(), "offline store initialized");

		Ok(Self {
			root: Some(root.to_path_buf()),
			writer,
		})
	}

	pub fn is_enabled(&self) -> bool {
		self.root.is_some()
	}

	/// The managed directory, when enabled.
	pub fn root(&self) -> Option<&Path> {
		self.root.as_deref()
	}

	/// Writes a memory snapshot for `report`.
	///
	/// Returns the snapshot path, or `None` when the store is disabled or the
	/// writer fails. A failed write leaves no file behind.
	pub fn generate_snapshot(&self, report: &Report, dump_type: MinidumpType) -> Option<PathBuf> {
		let root = self.root.as_ref()?;
		let path = root.join(format!("{}.{MINIDUMP_EXTENSION}", Uuid::new_v4()));

		if self
			.writer
			.write_snapshot(&path, dump_type, report.exception_context())
		{
			debug!(path = %path.display(), dump_type = %dump_type, "snapshot written");
			return Some(path);
		}

		warn!(path = %path.display(), dump_type = %dump_type, "snapshot write failed");
		if let Err(e) = fs::remove_file(&path) {
			if e.kind() != ErrorKind::NotFound {
				warn!(path = %path.display(), error = %e, "failed to remove partial snapshot");
			}
		}
		None
	}

	/// Deletes a snapshot created by this store.
	///
	/// Paths that are not `.dmp` files directly inside the managed directory
	/// are ignored, as is every path when the store is disabled; both count as
	/// success. Returns false only when the deletion itself fails.
	pub fn clear_snapshot(&self, path: &Path) -> bool {
		let Some(root) = self.root.as_deref() else {
			return true;
		};

		if !is_managed_snapshot(root, path) {
			debug!(path = %path.display(), "ignoring clear for unmanaged path");
			return true;
		}

		match fs::remove_file(path) {
			Ok(()) => true,
			Err(e) => {
				warn!(path = %path.display(), error = %e, "failed to clear snapshot");
				false
			}
		}
	}

	/// Persists a record as `Backtrace_<timestamp>`.
	///
	/// A disabled store reports success without writing. Returns false on any
	/// I/O or encoding failure, including when a record with the same
	/// timestamp is already stored; an existing record is never replaced.
	pub fn persist(&self, record: &ReportRecord) -> bool {
		let Some(root) = self.root.as_deref() else {
			return true;
		};

		match write_record(root, record) {
			Ok(path) => {
				debug!(path = %path.display(), uuid = %record.uuid, "record persisted");
				true
			}
			Err(CaptureSdkError::Io { path, source }) if source.kind() == ErrorKind::AlreadyExists => {
				warn!(
					path = %path.display(),
					uuid = %record.uuid,
					"a record with this timestamp is already stored"
				);
				false
			}
			Err(e) => {
				warn!(uuid = %record.uuid, error = %e, "failed to persist record");
				false
			}
		}
	}

	/// Reads every persisted record, oldest first.
	///
	/// Files that cannot be read or decoded are skipped with a warning.
	pub fn load_persisted(&self) -> Vec<PersistedRecord> {
		let Some(root) = self.root.as_deref() else {
			return Vec::new();
		};

		let mut records: Vec<PersistedRecord> = list_files(root)
			.into_iter()
			.filter(|path| is_persisted_record(path))
			.filter_map(|path| match read_record(&path) {
				Ok(record) => Some(PersistedRecord { path, record }),
				Err(e) => {
					warn!(error = %e, "skipping unreadable persisted record");
					None
				}
			})
			.collect();

		records.sort_by_key(|p| p.record.timestamp);
		records
	}

	/// Takes ownership of a persisted record for delivery.
	///
	/// The file is renamed out of the `Backtrace_` namespace before it is
	/// read, so concurrent callers claiming the same path get it at most once.
	/// Returns `None` when the store is disabled, the path is unmanaged, the
	/// record was already claimed, or it cannot be decoded.
	pub fn claim_persisted(&self, path: &Path) -> Option<PersistedRecord> {
		let root = self.root.as_deref()?;
		if path.parent() != Some(root) || !is_persisted_record(path) {
			return None;
		}

		let name = path.file_name()?.to_str()?;
		let claimed = root.join(format!(".{name}.{}{CLAIMED_SUFFIX}", Uuid::new_v4()));
		if let Err(e) = fs::rename(path, &claimed) {
			if e.kind() == ErrorKind::NotFound {
				debug!(path = %path.display(), "record already claimed");
			} else {
				warn!(path = %path.display(), error = %e, "failed to claim persisted record");
			}
			return None;
		}

		match read_record(&claimed) {
			Ok(record) => Some(PersistedRecord {
				path: claimed,
				record,
			}),
			Err(e) => {
				warn!(error = %e, "discarding unreadable claimed record");
				let _ = fs::remove_file(&claimed);
				None
			}
		}
	}

	/// Deletes a persisted or claimed record file. Unmanaged paths are ignored.
	pub fn remove_persisted(&self, path: &Path) -> bool {
		let Some(root) = self.root.as_deref() else {
			return true;
		};

		if path.parent() != Some(root) || !(is_persisted_record(path) || is_claimed_record(path)) {
			return true;
		}

		match fs::remove_file(path) {
			Ok(()) => true,
			Err(e) => {
				warn!(path = %path.display(), error = %e, "failed to remove persisted record");
				false
			}
		}
	}

	/// Lists snapshot files currently in the store.
	pub fn snapshots(&self) -> Vec<PathBuf> {
		let Some(root) = self.root.as_deref() else {
			return Vec::new();
		};

		list_files(root)
			.into_iter()
			.filter(|path| is_managed_snapshot(root, path))
			.collect()
	}

	/// Removes everything from the managed directory.
	pub fn purge(&self) -> bool {
		let Some(root) = self.root.as_deref() else {
			return true;
		};

		match clear_directory(root) {
			Ok(()) => {
				info!(path = %root.display(), "offline store purged");
				true
			}
			Err(e) => {
				warn!(error = %e, "failed to purge offline store");
				false
			}
		}
	}
}

impl std::fmt::Debug for OfflineStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OfflineStore")
			.field("root", &self.root)
			.finish_non_exhaustive()
	}
}

fn is_managed_snapshot(root: &Path, path: &Path) -> bool {
	path.parent() == Some(root)
		&& path.extension().and_then(|e| e.to_str()) == Some(MINIDUMP_EXTENSION)
}

fn is_persisted_record(path: &Path) -> bool {
	path
		.file_name()
		.and_then(|n| n.to_str())
		.and_then(|n| n.strip_prefix(PERSISTED_PREFIX))
		.is_some_and(|ts| ts.parse::<i64>().is_ok())
}

fn is_claimed_record(path: &Path) -> bool {
	path
		.file_name()
		.and_then(|n| n.to_str())
		.and_then(|n| n.strip_prefix('.'))
		.is_some_and(|n| n.starts_with(PERSISTED_PREFIX) && n.ends_with(CLAIMED_SUFFIX))
}

fn write_record(root: &Path, record: &ReportRecord) -> Result<PathBuf> {
	let bytes = record.to_json()?;
	let path = root.join(persisted_file_name(record.timestamp));
	// Readers only ever see complete records: write aside, then link into
	// place. Linking fails with `AlreadyExists` instead of replacing.
	let tmp = root.join(format!(".{}.tmp", record.uuid));

	fs::write(&tmp, &bytes).map_err(|e| CaptureSdkError::io(&tmp, e))?;
	let linked = fs::hard_link(&tmp, &path);
	let _ = fs::remove_file(&tmp);
	linked.map_err(|e| CaptureSdkError::io(&path, e))?;

	Ok(path)
}

fn read_record(path: &Path) -> Result<ReportRecord> {
	let bytes = fs::read(path).map_err(|e| CaptureSdkError::io(path, e))?;
	Ok(ReportRecord::from_json(&bytes)?)
}

fn list_files(root: &Path) -> Vec<PathBuf> {
	match fs::read_dir(root) {
		Ok(entries) => entries
			.filter_map(|entry| entry.ok())
			.filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
			.map(|entry| entry.path())
			.collect(),
		Err(e) => {
			warn!(path = %root.display(), error = %e, "failed to list offline store");
			Vec::new()
		}
	}
}

/// Removes every file and subdirectory under `root`, keeping `root` itself.
fn clear_directory(root: &Path) -> Result<()> {
	let entries = fs::read_dir(root).map_err(|e| CaptureSdkError::io(root, e))?;

	for entry in entries {
		let entry = entry.map_err(|e| CaptureSdkError::io(root, e))?;
		let path = entry.path();
		let file_type = entry.file_type().map_err(|e| CaptureSdkError::io(&path, e))?;

		let removed = if file_type.is_dir() {
			fs::remove_dir_all(&path)
		} else {
			fs::remove_file(&path)
		};
		removed.map_err(|e| CaptureSdkError::io(&path, e))?;
	}

	Ok(())
}
