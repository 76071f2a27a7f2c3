// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture requests made by the embedding application.

use crate::attribute::{AttributeValue, Attributes};
use crate::snapshot::{ExceptionContext, MinidumpType};
use crate::stack::Stacktrace;

/// What is being reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportKind {
	/// A free-text message.
	Message(String),
	/// A captured error, panic or other fault.
	Exception {
		exception_type: String,
		message: String,
	},
}

/// A single capture request.
///
/// A report is the input to assembly. It carries the report-level attribute
/// overlay, which wins over scope attributes on key collisions.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
	pub kind: ReportKind,
	/// Stack to attach. `None` means the calling thread's stack is captured
	/// at assembly time.
	pub stacktrace: Option<Stacktrace>,
	pub attributes: Attributes,
	/// Request a native memory snapshot of the given type.
	pub minidump: Option<MinidumpType>,
}

impl Report {
	/// A free-text message report.
	pub fn message(message: impl Into<String>) -> Self {
		Self::new(ReportKind::Message(message.into()))
	}

	/// An exception report with an explicit type, message and stack.
	pub fn exception(
		exception_type: impl Into<String>,
		message: impl Into<String>,
		stacktrace: Stacktrace,
	) -> Self {
		Self::new(ReportKind::Exception {
			exception_type: exception_type.into(),
			message: message.into(),
		})
		.with_stacktrace(stacktrace)
	}

	/// An exception report built from a Rust error.
	///
	/// The error's `source()` chain is recorded under `error.sources`.
	pub fn from_error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		let mut report = Self::new(ReportKind::Exception {
			exception_type: std::any::type_name::<E>().to_string(),
			message: error.to_string(),
		});

		let mut sources = Vec::new();
		let mut current = error.source();
		while let Some(source) = current {
			sources.push(source.to_string());
			current = source.source();
		}
		if !sources.is_empty() {
			report
				.attributes
				.insert("error.sources", AttributeValue::object(&sources));
		}

		report
	}

	fn new(kind: ReportKind) -> Self {
		Self {
			kind,
			stacktrace: None,
			attributes: Attributes::new(),
			minidump: None,
		}
	}

	/// Adds a report-level attribute.
	pub fn with_attribute<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.attributes.insert(key, value);
		self
	}

	/// Replaces the report-level attribute overlay.
	pub fn with_attributes(mut self, attributes: Attributes) -> Self {
		self.attributes = attributes;
		self
	}

	pub fn with_stacktrace(mut self, stacktrace: Stacktrace) -> Self {
		self.stacktrace = Some(stacktrace);
		self
	}

	/// Requests a memory snapshot alongside the record.
	pub fn with_minidump(mut self, dump_type: MinidumpType) -> Self {
		self.minidump = Some(dump_type);
		self
	}

	pub fn is_exception(&self) -> bool {
		matches!(self.kind, ReportKind::Exception { .. })
	}

	/// Snapshot tagging for this report.
	pub fn exception_context(&self) -> ExceptionContext {
		if self.is_exception() {
			ExceptionContext::Present
		} else {
			ExceptionContext::None
		}
	}

	/// The message text, for either kind of report.
	pub fn message_text(&self) -> &str {
		match &self.kind {
			ReportKind::Message(message) => message,
			ReportKind::Exception { message, .. } => message,
		}
	}

	/// The exception type, for exception reports.
	pub fn exception_type(&self) -> Option<&str> {
		match &self.kind {
			ReportKind::Message(_) => None,
			ReportKind::Exception { exception_type, .. } => Some(exception_type),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stack::Frame;
	use std::fmt;

	#[derive(Debug)]
	struct Outer(Inner);

	#[derive(Debug)]
	struct Inner;

	impl fmt::Display for Outer {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "outer failed")
		}
	}

	impl fmt::Display for Inner {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "inner failed")
		}
	}

	impl std::error::Error for Outer {
		fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
			Some(&self.0)
		}
	}

	impl std::error::Error for Inner {}

	#[test]
	fn test_message_report() {
		let report = Report::message("hello");
		assert!(!report.is_exception());
		assert_eq!(report.message_text(), "hello");
		assert_eq!(report.exception_context(), ExceptionContext::None);
		assert!(report.stacktrace.is_none());
	}

	#[test]
	fn test_empty_message_is_valid() {
		let report = Report::message("").with_stacktrace(Stacktrace::empty());
		assert_eq!(report.message_text(), "");
		assert!(report.stacktrace.unwrap().is_empty());
	}

	#[test]
	fn test_exception_report() {
		let stack = Stacktrace::new(vec![Frame::function("my_app::divide")]);
		let report = Report::exception("DivideByZero", "attempt to divide by zero", stack.clone());
		assert!(report.is_exception());
		assert_eq!(report.exception_type(), Some("DivideByZero"));
		assert_eq!(report.exception_context(), ExceptionContext::Present);
		assert_eq!(report.stacktrace, Some(stack));
	}

	#[test]
	fn test_from_error_records_source_chain() {
		let report = Report::from_error(&Outer(Inner));
		assert_eq!(report.message_text(), "outer failed");
		assert!(report.exception_type().unwrap().ends_with("Outer"));
		assert_eq!(
			report.attributes.get("error.sources"),
			Some(&AttributeValue::Object("[\"inner failed\"]".to_string()))
		);
	}

	#[test]
	fn test_from_error_without_source() {
		let report = Report::from_error(&Inner);
		assert!(report.attributes.is_empty());
	}

	#[test]
	fn test_builder_methods() {
		let report = Report::message("m")
			.with_attribute("k", 1)
			.with_minidump(MinidumpType::WithFullMemory);
		assert_eq!(report.attributes.get("k"), Some(&AttributeValue::Integer(1)));
		assert_eq!(report.minidump, Some(MinidumpType::WithFullMemory));
	}
}
