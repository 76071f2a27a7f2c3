// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Platform abstraction for native memory snapshots.

use std::path::Path;

use loom_capture_core::{ExceptionContext, MinidumpType};
use tracing::warn;

/// Writes a native memory snapshot of the current process.
///
/// Implementations wrap the platform's minidump primitive. The pipeline only
/// relies on the boolean result: `true` means a complete snapshot exists at
/// `path`.
pub trait SnapshotWriter: Send + Sync {
	fn write_snapshot(&self, path: &Path, dump_type: MinidumpType, exception: ExceptionContext)
		-> bool;
}

impl<F> SnapshotWriter for F
where
	F: Fn(&Path, MinidumpType, ExceptionContext) -> bool + Send + Sync,
{
	fn write_snapshot(
		&self,
		path: &Path,
		dump_type: MinidumpType,
		exception: ExceptionContext,
	) -> bool {
		self(path, dump_type, exception)
	}
}

/// Writer used when the embedding application supplies none.
///
/// Every request fails, so snapshot requests degrade to "no snapshot".
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSnapshotWriter;

impl SnapshotWriter for UnavailableSnapshotWriter {
	fn write_snapshot(
		&self,
		path: &Path,
		dump_type: MinidumpType,
		_exception: ExceptionContext,
	) -> bool {
		warn!(
			path = %path.display(),
			dump_type = %dump_type,
			"no snapshot writer configured for this platform"
		);
		false
	}
}
