// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Capture reports using the loom-capture SDK.
//!
//! Run with:
//!   cargo run --example capture -p loom-capture
//!
//! Set `LOOM_CAPTURE_RATE_LIMIT` to see records dropped, or
//! `LOOM_CAPTURE_DATABASE_PATH` to exercise the offline store.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loom_capture::{CaptureConfig, Dispatcher, Report, ReportRecord, StoreOutcome};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loom_capture=debug")),
		)
		.init();

	let config = CaptureConfig::default().with_env_overrides()?;
	println!("Initializing capture dispatcher...");
	println!("  Rate limit: {}", config.rate_limit);
	println!("  Offline store: {:?}", config.database_path);

	let dispatcher = Dispatcher::builder()
		.config(config)
		.transport(|record: &ReportRecord, minidump: Option<&Path>| {
			println!(
				"  -> {} {:?} {:?} (snapshot: {:?})",
				record.uuid, record.exception_type, record.message, minidump
			);
		})
		.build()?;

	let dropped = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&dropped);
	dispatcher.on_limit_reached(move || {
		counter.fetch_add(1, Ordering::Relaxed);
	});

	dispatcher.attributes().set("release", "0.1.0-example");
	dispatcher.attributes().set("environment", "development");

	println!("\nSending message...");
	dispatcher.send(&Report::message("Example started").with_attribute("step", 1));

	println!("\nSending error...");
	if let Err(e) = std::fs::read("/definitely/not/here") {
		dispatcher.send_error(&e);
	}

	println!("\nStoring offline...");
	match dispatcher.store_offline(&Report::message("saved for later")) {
		StoreOutcome::Stored { id } => println!("  stored {id}"),
		StoreOutcome::LimitReached => println!("  dropped by rate limit"),
		StoreOutcome::Failed { id } => println!("  could not store {id}"),
	}
	println!("  flushed {} offline record(s)", dispatcher.flush_offline());

	println!("\nDropped by rate limit: {}", dropped.load(Ordering::Relaxed));
	Ok(())
}
