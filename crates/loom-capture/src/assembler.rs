// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembly of reports into records.

use chrono::Utc;
use loom_capture_core::{
	Attributes, RecordId, Report, ReportRecord, Stacktrace, ThreadInfo, LANG,
};

use crate::backtrace::capture_backtrace;

/// Agent name stamped on records.
pub const AGENT_NAME: &str = env!("CARGO_PKG_NAME");
/// Agent version stamped on records.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Minimum supported Rust version declared by this crate, if any.
const LANG_VERSION: Option<&str> = option_env!("CARGO_PKG_RUST_VERSION");

/// Identity of the reporting agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
	pub name: String,
	pub version: String,
}

impl Default for AgentInfo {
	fn default() -> Self {
		Self {
			name: AGENT_NAME.to_string(),
			version: AGENT_VERSION.to_string(),
		}
	}
}

/// Builds [`ReportRecord`]s from reports and scope attributes.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
	agent: AgentInfo,
}

impl ReportAssembler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses a custom agent identity instead of this crate's build metadata.
	pub fn with_agent(agent: AgentInfo) -> Self {
		Self { agent }
	}

	pub fn agent(&self) -> &AgentInfo {
		&self.agent
	}

	/// Assembles a record.
	///
	/// Report attributes are laid over `scope`, winning on collisions. A
	/// report without a stack gets the calling thread's stack. Only the
	/// identifier and timestamp differ between two calls with equal inputs on
	/// the same thread.
	pub fn assemble(&self, report: &Report, scope: &Attributes) -> ReportRecord {
		let attributes = scope.merged(&report.attributes);
		let stack: Stacktrace = match &report.stacktrace {
			Some(stacktrace) => stacktrace.clone(),
			None => capture_backtrace(),
		};

		ReportRecord {
			uuid: RecordId::new(),
			timestamp: Utc::now().timestamp(),
			lang: LANG.to_string(),
			lang_version: LANG_VERSION
				.filter(|v| !v.is_empty())
				.map(str::to_string),
			agent: self.agent.name.clone(),
			agent_version: self.agent.version.clone(),
			exception_type: report.exception_type().map(str::to_string),
			message: report.message_text().to_string(),
			attributes,
			stack_frames: stack.frame_strings(),
			main_thread: ThreadInfo {
				name: std::thread::current().name().map(str::to_string),
				fault: report.is_exception(),
				stack,
			},
		}
	}
}
