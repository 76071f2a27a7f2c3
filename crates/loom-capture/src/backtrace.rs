// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backtrace capture and parsing.

use loom_capture_core::{Frame, Stacktrace};
use rustc_demangle::demangle;
use std::backtrace::Backtrace;

/// Frames belonging to the capture machinery or to panic dispatch; dropped
/// from the top of a freshly captured stack so it starts at the caller.
const CAPTURE_PREFIXES: &[&str] = &[
	"std::backtrace::",
	"std::backtrace_rs::",
	"backtrace::",
	"loom_capture::",
	"<loom_capture::",
	"std::panicking::",
	"core::panicking::",
	"rust_begin_unwind",
	"<alloc::boxed::Box<F,A> as core::ops::function::Fn",
];

/// Parse a Rust backtrace into a Stacktrace.
pub fn parse_backtrace(backtrace: &Backtrace) -> Stacktrace {
	let bt_string = format!("{:#}", backtrace);
	Stacktrace::new(parse_backtrace_string(&bt_string))
}

/// Parse backtrace string output into frames, innermost first.
///
/// Expects the std format: numbered function lines, each optionally
/// followed by an `at file:line:col` location line.
fn parse_backtrace_string(bt_string: &str) -> Vec<Frame> {
	let mut frames: Vec<Frame> = Vec::new();

	for line in bt_string.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		if let Some(location) = line.strip_prefix("at ") {
			if let Some(frame) = frames.last_mut() {
				apply_location(frame, location);
			}
			continue;
		}

		if let Some(frame) = parse_frame_line(line) {
			frames.push(frame);
		}
	}

	frames
}

/// Parse a numbered function line (`"  5: my_app::main"`) into a Frame.
fn parse_frame_line(line: &str) -> Option<Frame> {
	let (prefix, function_part) = line.split_once(':')?;
	prefix.trim().parse::<u32>().ok()?;

	let function_part = function_part.trim();
	if function_part.is_empty() {
		return None;
	}

	let demangled = demangle(function_part).to_string();
	let in_app = is_in_app_frame(&demangled);

	Some(Frame {
		in_app,
		..Frame::function(demangled)
	})
}

/// Parse `path:line:col` (line and column optional) onto a frame.
fn apply_location(frame: &mut Frame, location: &str) {
	let mut parts = location.trim().rsplitn(3, ':');
	let last = parts.next();
	let middle = parts.next();
	let rest = parts.next();

	match (rest, middle, last) {
		(Some(file), Some(line), Some(col)) if line.parse::<u32>().is_ok() => {
			frame.filename = Some(file.to_string());
			frame.lineno = line.parse().ok();
			frame.colno = col.parse().ok();
		}
		(_, Some(file), Some(line)) if line.parse::<u32>().is_ok() => {
			let file = match rest {
				Some(rest) => format!("{rest}:{file}"),
				None => file.to_string(),
			};
			frame.filename = Some(file);
			frame.lineno = line.parse().ok();
		}
		_ => frame.filename = Some(location.trim().to_string()),
	}
}

/// Determine if a frame is from user application code vs standard library.
fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"tracing::",
		"<tracing::",
		"backtrace::",
		"<backtrace::",
		"panic_unwind::",
		"<panic_unwind::",
		"loom_capture::",
		"<loom_capture::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
		"__libc_start",
		"_start",
	];

	const SYSTEM_CONTAINS: &[&str] = &[
		"::panic::",
		"::panicking::",
		"::rt::",
		"::sys_common::",
	];

	!SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
}

fn is_capture_frame(frame: &Frame) -> bool {
	frame
		.function
		.as_deref()
		.is_some_and(|f| CAPTURE_PREFIXES.iter().any(|p| f.starts_with(p)))
}

fn strip_capture_frames(frames: &mut Vec<Frame>) {
	let skip = frames.iter().take_while(|f| is_capture_frame(f)).count();
	frames.drain(..skip);
}

/// Capture the calling thread's stack, starting at the first frame outside
/// this crate.
pub fn capture_backtrace() -> Stacktrace {
	let backtrace = Backtrace::force_capture();
	let mut stacktrace = parse_backtrace(&backtrace);
	strip_capture_frames(&mut stacktrace.frames);
	stacktrace
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:93:5
   1: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:9
   2: my_app::handlers::process
             at ./src/handlers.rs:42:13
   3: my_app::main
             at ./src/main.rs:7:5
   4: core::ops::function::FnOnce::call_once
             at /rustc/abc/library/core/src/ops/function.rs:250:5
";

	#[test]
	fn test_is_in_app_frame_excludes_std() {
		assert!(!is_in_app_frame("std::panic::panic_any"));
		assert!(!is_in_app_frame("core::panicking::panic"));
		assert!(!is_in_app_frame("alloc::vec::Vec::push"));
		assert!(!is_in_app_frame("tokio::runtime::Runtime::block_on"));
		assert!(!is_in_app_frame("loom_capture::dispatcher::Dispatcher::send"));
	}

	#[test]
	fn test_is_in_app_frame_includes_user_code() {
		assert!(is_in_app_frame("my_app::main"));
		assert!(is_in_app_frame("foo::bar::baz"));
	}

	#[test]
	fn test_parse_frame_line_with_number() {
		let frame = parse_frame_line("  5: my_app::main").unwrap();
		assert_eq!(frame.function, Some("my_app::main".to_string()));
		assert_eq!(frame.module, Some("my_app".to_string()));
		assert!(frame.in_app);
	}

	#[test]
	fn test_parse_frame_line_requires_number() {
		assert!(parse_frame_line("unsupported backtrace").is_none());
		assert!(parse_frame_line("disabled backtrace").is_none());
		assert!(parse_frame_line("3:").is_none());
	}

	#[test]
	fn test_parse_backtrace_string_attaches_locations() {
		let frames = parse_backtrace_string(SAMPLE);
		assert_eq!(frames.len(), 5);

		let handler = &frames[2];
		assert_eq!(handler.function.as_deref(), Some("my_app::handlers::process"));
		assert_eq!(handler.filename.as_deref(), Some("./src/handlers.rs"));
		assert_eq!(handler.lineno, Some(42));
		assert_eq!(handler.colno, Some(13));
		assert!(handler.in_app);

		assert!(!frames[4].in_app);
	}

	#[test]
	fn test_apply_location_without_column() {
		let mut frame = Frame::function("f");
		apply_location(&mut frame, "C:\\src\\main.rs:10");
		assert_eq!(frame.filename.as_deref(), Some("C:\\src\\main.rs"));
		assert_eq!(frame.lineno, Some(10));
		assert_eq!(frame.colno, None);
	}

	#[test]
	fn test_apply_location_unparseable() {
		let mut frame = Frame::function("f");
		apply_location(&mut frame, "<unknown>");
		assert_eq!(frame.filename.as_deref(), Some("<unknown>"));
		assert_eq!(frame.lineno, None);
	}

	#[test]
	fn test_strip_capture_frames_starts_at_caller() {
		let trace = "   0: std::backtrace::Backtrace::force_capture
   1: loom_capture::backtrace::capture_backtrace
   2: loom_capture::assembler::ReportAssembler::assemble
   3: loom_capture::dispatcher::Dispatcher::send
   4: my_app::handlers::process
   5: loom_capture::dispatcher::Dispatcher::send_message
   6: my_app::main
";
		let mut frames = parse_backtrace_string(trace);
		strip_capture_frames(&mut frames);

		let functions: Vec<_> = frames.iter().filter_map(|f| f.function.as_deref()).collect();
		assert_eq!(
			functions,
			vec![
				"my_app::handlers::process",
				"loom_capture::dispatcher::Dispatcher::send_message",
				"my_app::main",
			]
		);
	}

	#[test]
	fn test_strip_capture_frames_skips_panic_dispatch() {
		let trace = "   0: loom_capture::backtrace::capture_backtrace
   1: loom_capture::panic_hook::install_panic_hook::{{closure}}
   2: <alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call
   3: std::panicking::rust_panic_with_hook
   4: std::panicking::begin_panic_handler::{{closure}}
   5: rust_begin_unwind
   6: core::panicking::panic_fmt
   7: my_app::parse_config
   8: my_app::main
";
		let mut frames = parse_backtrace_string(trace);
		strip_capture_frames(&mut frames);

		assert_eq!(frames[0].function.as_deref(), Some("my_app::parse_config"));
		assert_eq!(frames.len(), 2);
	}

	#[test]
	fn test_capture_backtrace_skips_capture_frames() {
		// Frame contents depend on debug info; only the trimming is checked.
		let stacktrace = capture_backtrace();
		if let Some(first) = stacktrace.frames.first() {
			assert!(!is_capture_frame(first));
		}
	}
}
