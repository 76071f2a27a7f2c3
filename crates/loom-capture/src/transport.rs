// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery collaborator boundary.

use std::path::Path;

use loom_capture_core::ReportRecord;

/// Delivers admitted records.
///
/// Sending is fire-and-forget from the pipeline's point of view: retries and
/// failure handling belong to the implementation. `minidump` points at a
/// snapshot taken for this record, which the pipeline deletes once `send`
/// returns.
pub trait Transport: Send + Sync {
	fn send(&self, record: &ReportRecord, minidump: Option<&Path>);
}

impl<F> Transport for F
where
	F: Fn(&ReportRecord, Option<&Path>) + Send + Sync,
{
	fn send(&self, record: &ReportRecord, minidump: Option<&Path>) {
		self(record, minidump)
	}
}
