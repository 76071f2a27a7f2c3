// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for automatic capture.

use std::any::Any;
use std::cell::Cell;
use std::panic::PanicHookInfo;

use loom_capture_core::Report;
use tracing::error;

use crate::backtrace::capture_backtrace;
use crate::dispatcher::Dispatcher;

/// Exception type recorded for panics.
pub const PANIC_EXCEPTION_TYPE: &str = "panic";
/// Attribute holding `file:line:column` of the panic site.
pub const PANIC_LOCATION_ATTRIBUTE: &str = "panic.location";

thread_local! {
	static IN_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Install a panic hook that sends panics through `dispatcher`.
///
/// The previously installed hook runs after the report is sent. A panic
/// raised while reporting is not reported again.
pub fn install_panic_hook(dispatcher: Dispatcher) {
	let previous_hook = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if !IN_HOOK.with(|flag| flag.replace(true)) {
			report_panic(&dispatcher, info);
			IN_HOOK.with(|flag| flag.set(false));
		}

		previous_hook(info);
	}));
}

fn report_panic(dispatcher: &Dispatcher, info: &PanicHookInfo<'_>) {
	let report = panic_report(dispatcher, info);
	error!(
		panic = report.message_text(),
		location = ?info.location().map(|l| l.to_string()),
		"panic captured"
	);
	dispatcher.send(&report);
}

fn panic_report(dispatcher: &Dispatcher, info: &PanicHookInfo<'_>) -> Report {
	let message = extract_panic_message(info.payload());
	let mut report = Report::exception(PANIC_EXCEPTION_TYPE, message, capture_backtrace());

	if let Some(location) = info.location() {
		report = report.with_attribute(
			PANIC_LOCATION_ATTRIBUTE,
			format!("{}:{}:{}", location.file(), location.line(), location.column()),
		);
	}

	let config = dispatcher.config();
	if config.capture_snapshots {
		report = report.with_minidump(config.minidump_type);
	}
	report
}

fn extract_panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
