// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side error capture for Rust applications.
//!
//! Reports (free-text messages or exceptions) are assembled into records with
//! the calling thread's stack and the current scope attributes, passed through
//! a process-wide rate limiter, optionally paired with a native memory
//! snapshot, and handed to a [`Transport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use loom_capture::{CaptureConfig, Dispatcher, Report, ReportRecord};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CaptureConfig::load("capture.toml")?.with_env_overrides()?;
//!
//!     let dispatcher = Dispatcher::builder()
//!         .config(config)
//!         .transport(|record: &ReportRecord, _minidump: Option<&Path>| {
//!             println!("{}", record.to_json().unwrap_or_default());
//!         })
//!         .build()?;
//!
//!     // Attributes inherited by every report
//!     dispatcher.attributes().set("release", env!("CARGO_PKG_VERSION"));
//!
//!     // Be told when reports are dropped
//!     dispatcher.on_limit_reached(|| eprintln!("capture limit reached"));
//!
//!     dispatcher.install_panic_hook();
//!
//!     if let Err(e) = std::fs::read("missing.txt") {
//!         dispatcher.send_error(&e);
//!     }
//!     dispatcher.send(&Report::message("startup complete").with_attribute("workers", 4));
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Rate Limiting**: A lock-free ceiling on records admitted per process,
//!   with observers notified for each dropped record
//! - **Scope Attributes**: Key/value context merged into every record, with
//!   per-report values winning on collisions
//! - **Offline Store**: A managed directory for snapshots and records that
//!   could not be delivered yet
//! - **Panic Hook**: Automatic capture of panics with full backtraces
//! - **Rust Symbol Demangling**: Automatic demangling of Rust symbols in backtraces

mod assembler;
mod attributes;
mod backtrace;
mod config;
mod dispatcher;
mod error;
mod panic_hook;
mod rate_limit;
mod snapshot;
mod store;
mod transport;

pub use assembler::{AgentInfo, ReportAssembler, AGENT_NAME, AGENT_VERSION};
pub use attributes::AttributeStore;
pub use backtrace::{capture_backtrace, parse_backtrace};
pub use config::{CaptureConfig, ENV_DATABASE_PATH, ENV_MINIDUMP_TYPE, ENV_RATE_LIMIT};
pub use dispatcher::{Dispatcher, DispatcherBuilder, SendOutcome, StoreOutcome};
pub use error::{CaptureSdkError, ConfigError, Result};
pub use panic_hook::{install_panic_hook, PANIC_EXCEPTION_TYPE, PANIC_LOCATION_ATTRIBUTE};
pub use rate_limit::{LimitCallback, LimitObservers, ObserverId, RateLimiter};
pub use snapshot::{SnapshotWriter, UnavailableSnapshotWriter};
pub use store::{persisted_file_name, OfflineStore, PersistedRecord, PERSISTED_PREFIX};
pub use transport::Transport;

// Re-export core types for convenience
pub use loom_capture_core::{
	AttributeValue, Attributes, ExceptionContext, Frame, MinidumpType, RecordId, Report,
	ReportKind, ReportRecord, Stacktrace, ThreadInfo,
};
