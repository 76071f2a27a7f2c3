// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture pipeline orchestration: assemble, admit, snapshot, deliver.

use std::path::PathBuf;
use std::sync::Arc;

use loom_capture_core::{RecordId, Report};
use tracing::{debug, info, warn};

use crate::assembler::{AgentInfo, ReportAssembler};
use crate::attributes::AttributeStore;
use crate::config::CaptureConfig;
use crate::error::{CaptureSdkError, Result};
use crate::panic_hook::install_panic_hook;
use crate::rate_limit::{ObserverId, RateLimiter};
use crate::snapshot::{SnapshotWriter, UnavailableSnapshotWriter};
use crate::store::OfflineStore;
use crate::transport::Transport;

/// Result of [`Dispatcher::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
	/// The record was admitted and handed to the transport.
	Sent { id: RecordId },
	/// The rate limiter dropped the record.
	LimitReached,
}

impl SendOutcome {
	pub fn is_sent(&self) -> bool {
		matches!(self, Self::Sent { .. })
	}
}

/// Result of [`Dispatcher::store_offline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
	/// The record was admitted and written to the offline store.
	Stored { id: RecordId },
	/// The rate limiter dropped the record.
	LimitReached,
	/// The record was admitted but could not be written.
	Failed { id: RecordId },
}

/// Builder for constructing a Dispatcher.
pub struct DispatcherBuilder {
	config: CaptureConfig,
	transport: Option<Arc<dyn Transport>>,
	attributes: Option<Arc<AttributeStore>>,
	snapshot_writer: Option<Arc<dyn SnapshotWriter>>,
	agent: Option<AgentInfo>,
}

impl DispatcherBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			config: CaptureConfig::default(),
			transport: None,
			attributes: None,
			snapshot_writer: None,
			agent: None,
		}
	}

	/// Replaces the whole configuration.
	pub fn config(mut self, config: CaptureConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the admission ceiling. 0 is unlimited.
	pub fn rate_limit(mut self, ceiling: u32) -> Self {
		self.config.rate_limit = ceiling;
		self
	}

	/// Sets the offline store directory. Its contents are cleared on build.
	pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		self.config.database_path = (!path.as_os_str().is_empty()).then_some(path);
		self
	}

	/// Sets the delivery transport. Required.
	pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
		self.transport = Some(Arc::new(transport));
		self
	}

	/// Shares an existing attribute store instead of creating one.
	pub fn attributes(mut self, attributes: Arc<AttributeStore>) -> Self {
		self.attributes = Some(attributes);
		self
	}

	/// Sets the platform snapshot writer.
	pub fn snapshot_writer(mut self, writer: impl SnapshotWriter + 'static) -> Self {
		self.snapshot_writer = Some(Arc::new(writer));
		self
	}

	/// Overrides the agent identity stamped on records.
	pub fn agent(mut self, agent: AgentInfo) -> Self {
		self.agent = Some(agent);
		self
	}

	/// Builds the Dispatcher, initializing the offline store.
	pub fn build(self) -> Result<Dispatcher> {
		let transport = self.transport.ok_or(CaptureSdkError::MissingTransport)?;
		let writer = self
			.snapshot_writer
			.unwrap_or_else(|| Arc::new(UnavailableSnapshotWriter));
		let store = OfflineStore::open(self.config.database_path.as_deref(), writer)?;
		let assembler = match self.agent {
			Some(agent) => ReportAssembler::with_agent(agent),
			None => ReportAssembler::new(),
		};

		info!(
			rate_limit = self.config.rate_limit,
			offline_store = store.is_enabled(),
			"capture dispatcher initialized"
		);

		Ok(Dispatcher {
			inner: Arc::new(DispatcherInner {
				attributes: self.attributes.unwrap_or_default(),
				limiter: RateLimiter::new(self.config.rate_limit),
				assembler,
				store,
				transport,
				config: self.config,
			}),
		})
	}
}

impl Default for DispatcherBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct DispatcherInner {
	attributes: Arc<AttributeStore>,
	limiter: RateLimiter,
	assembler: ReportAssembler,
	store: OfflineStore,
	transport: Arc<dyn Transport>,
	config: CaptureConfig,
}

/// Entry point for capturing reports.
///
/// Cheap to clone; clones share attributes, limiter and store. Safe to call
/// from any number of threads.
///
/// # Example
///
/// ```ignore
/// use loom_capture::{Dispatcher, Report};
///
/// let dispatcher = Dispatcher::builder()
///     .rate_limit(50)
///     .database_path("/var/lib/my-app/crashes")
///     .transport(my_transport)
///     .build()?;
///
/// dispatcher.attributes().set("release", env!("CARGO_PKG_VERSION"));
/// dispatcher.on_limit_reached(|| eprintln!("report dropped"));
/// dispatcher.install_panic_hook();
///
/// if let Err(e) = do_something() {
///     dispatcher.send_error(&e);
/// }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
	inner: Arc<DispatcherInner>,
}

impl Dispatcher {
	/// Creates a new builder for constructing a Dispatcher.
	pub fn builder() -> DispatcherBuilder {
		DispatcherBuilder::new()
	}

	/// Scope attributes inherited by every report.
	pub fn attributes(&self) -> &Arc<AttributeStore> {
		&self.inner.attributes
	}

	pub fn rate_limiter(&self) -> &RateLimiter {
		&self.inner.limiter
	}

	pub fn offline_store(&self) -> &OfflineStore {
		&self.inner.store
	}

	pub fn config(&self) -> &CaptureConfig {
		&self.inner.config
	}

	/// Sets a new admission ceiling and restarts counting. 0 is unlimited.
	pub fn change_rate_limiting(&self, ceiling: u32) {
		self.inner.limiter.configure(ceiling);
	}

	/// Registers a callback fired once for every record the limiter drops.
	pub fn on_limit_reached<F>(&self, callback: F) -> ObserverId
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.inner.limiter.on_limit_reached(callback)
	}

	pub fn remove_limit_observer(&self, id: ObserverId) -> bool {
		self.inner.limiter.remove_limit_observer(id)
	}

	/// Installs a panic hook that reports panics through this dispatcher.
	pub fn install_panic_hook(&self) {
		install_panic_hook(self.clone());
		info!("panic hook installed");
	}

	/// Captures a report and hands it to the transport if admitted.
	///
	/// A requested snapshot is taken only for admitted records and removed
	/// once the transport returns.
	pub fn send(&self, report: &Report) -> SendOutcome {
		let inner = &self.inner;
		let record = inner
			.assembler
			.assemble(report, &inner.attributes.snapshot());

		if !inner.limiter.admit_or_notify() {
			return SendOutcome::LimitReached;
		}

		let minidump = report
			.minidump
			.and_then(|dump_type| inner.store.generate_snapshot(report, dump_type));

		debug!(uuid = %record.uuid, snapshot = minidump.is_some(), "sending record");
		inner.transport.send(&record, minidump.as_deref());

		if let Some(path) = &minidump {
			inner.store.clear_snapshot(path);
		}

		SendOutcome::Sent { id: record.uuid }
	}

	/// Captures a free-text message.
	pub fn send_message(&self, message: &str) -> SendOutcome {
		self.send(&Report::message(message))
	}

	/// Captures a Rust error.
	pub fn send_error<E>(&self, error: &E) -> SendOutcome
	where
		E: std::error::Error + ?Sized,
	{
		self.send(&Report::from_error(error))
	}

	/// Captures a report into the offline store instead of sending it.
	///
	/// Admission applies exactly as for [`Dispatcher::send`]. With a disabled
	/// store the record is admitted and reported stored without being kept.
	/// A record whose timestamp second is already taken is reported
	/// [`StoreOutcome::Failed`]; the earlier record stays stored.
	pub fn store_offline(&self, report: &Report) -> StoreOutcome {
		let inner = &self.inner;
		let record = inner
			.assembler
			.assemble(report, &inner.attributes.snapshot());

		if !inner.limiter.admit_or_notify() {
			return StoreOutcome::LimitReached;
		}

		if inner.store.persist(&record) {
			StoreOutcome::Stored { id: record.uuid }
		} else {
			StoreOutcome::Failed { id: record.uuid }
		}
	}

	/// Sends every persisted record through the transport, oldest first, and
	/// deletes each one after it is sent. Returns how many were sent.
	///
	/// Persisted records were admitted when stored and are not counted again.
	/// Each record is claimed before sending, so concurrent flushes deliver
	/// every record exactly once between them.
	pub fn flush_offline(&self) -> usize {
		let inner = &self.inner;
		let mut sent = 0;

		for candidate in inner.store.load_persisted() {
			let Some(persisted) = inner.store.claim_persisted(&candidate.path) else {
				continue;
			};
			inner.transport.send(&persisted.record, None);
			sent += 1;
			if !inner.store.remove_persisted(&persisted.path) {
				warn!(uuid = %persisted.record.uuid, "sent record could not be removed from offline store");
			}
		}

		if sent > 0 {
			info!(count = sent, "flushed offline records");
		}
		sent
	}
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("limiter", &self.inner.limiter)
			.field("store", &self.inner.store)
			.finish_non_exhaustive()
	}
}
