// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fs;
use std::path::Path;
use std::sync::Arc;

use loom_capture::{
	persisted_file_name, Attributes, ExceptionContext, MinidumpType, OfflineStore, Report,
	ReportAssembler, SnapshotWriter, Stacktrace, UnavailableSnapshotWriter,
};
use tempfile::TempDir;

fn unavailable() -> Arc<dyn SnapshotWriter> {
	Arc::new(UnavailableSnapshotWriter)
}

fn file_writer() -> Arc<dyn SnapshotWriter> {
	Arc::new(|path: &Path, _: MinidumpType, _: ExceptionContext| fs::write(path, b"MDMP").is_ok())
}

fn entries(dir: &Path) -> Vec<String> {
	let mut names: Vec<String> = fs::read_dir(dir)
		.unwrap()
		.map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
		.collect();
	names.sort();
	names
}

#[test]
fn test_open_clears_files_and_subdirectories() {
	let dir = TempDir::new().unwrap();
	let root = dir.path().join("store");
	fs::create_dir_all(root.join("nested/deeper")).unwrap();
	fs::write(root.join("old.dmp"), b"stale").unwrap();
	fs::write(root.join("Backtrace_1"), b"{}").unwrap();
	fs::write(root.join("nested/deeper/file"), b"x").unwrap();

	let store = OfflineStore::open(Some(&root), unavailable()).unwrap();

	assert!(store.is_enabled());
	assert!(root.is_dir());
	assert!(entries(&root).is_empty());
}

#[test]
fn test_open_creates_missing_directory() {
	let dir = TempDir::new().unwrap();
	let root = dir.path().join("a/b/c");

	let store = OfflineStore::open(Some(&root), unavailable()).unwrap();

	assert_eq!(store.root(), Some(root.as_path()));
	assert!(root.is_dir());
}

#[test]
fn test_open_fails_when_path_is_a_file() {
	let dir = TempDir::new().unwrap();
	let root = dir.path().join("occupied");
	fs::write(&root, b"not a directory").unwrap();

	assert!(OfflineStore::open(Some(&root), unavailable()).is_err());
}

#[test]
fn test_disabled_store_is_a_no_op() {
	let store = OfflineStore::open(None, file_writer()).unwrap();
	let record = ReportAssembler::new().assemble(
		&Report::message("m").with_stacktrace(Stacktrace::empty()),
		&Attributes::new(),
	);

	assert!(!store.is_enabled());
	assert!(store
		.generate_snapshot(&Report::message("m"), MinidumpType::Normal)
		.is_none());
	assert!(store.clear_snapshot(Path::new("/tmp/anything.dmp")));
	assert!(store.persist(&record));
	assert!(store.load_persisted().is_empty());
	assert!(store.snapshots().is_empty());
	assert!(store.purge());
}

#[test]
fn test_empty_path_disables_store() {
	let store = OfflineStore::open(Some(Path::new("")), unavailable()).unwrap();
	assert!(!store.is_enabled());
}

#[test]
fn test_snapshot_lifecycle() {
	let dir = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), file_writer()).unwrap();

	let path = store
		.generate_snapshot(&Report::message("m"), MinidumpType::WithFullMemory)
		.unwrap();

	assert_eq!(path.parent(), Some(dir.path()));
	assert_eq!(path.extension().and_then(|e| e.to_str()), Some("dmp"));
	assert_eq!(store.snapshots(), vec![path.clone()]);

	assert!(store.clear_snapshot(&path));
	assert!(!path.exists());
	assert!(store.snapshots().is_empty());
}

#[test]
fn test_failed_snapshot_leaves_no_file() {
	let dir = TempDir::new().unwrap();
	let writer: Arc<dyn SnapshotWriter> =
		Arc::new(|path: &Path, _: MinidumpType, _: ExceptionContext| {
			fs::write(path, b"partial").unwrap();
			false
		});
	let store = OfflineStore::open(Some(dir.path()), writer).unwrap();

	assert!(store
		.generate_snapshot(&Report::message("m"), MinidumpType::Normal)
		.is_none());
	assert!(entries(dir.path()).is_empty());
}

#[test]
fn test_writer_receives_exception_context() {
	let dir = TempDir::new().unwrap();
	let writer: Arc<dyn SnapshotWriter> =
		Arc::new(|_: &Path, _: MinidumpType, exception: ExceptionContext| exception.is_present());
	let store = OfflineStore::open(Some(dir.path()), writer).unwrap();

	let exception = Report::exception("E", "boom", Stacktrace::empty());
	assert!(store
		.generate_snapshot(&exception, MinidumpType::Normal)
		.is_some());
	assert!(store
		.generate_snapshot(&Report::message("m"), MinidumpType::Normal)
		.is_none());
}

#[test]
fn test_clear_snapshot_ignores_non_dmp_path() {
	let dir = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), unavailable()).unwrap();
	let keep = dir.path().join("notes.txt");
	fs::write(&keep, b"keep me").unwrap();

	assert!(store.clear_snapshot(&keep));
	assert!(keep.exists());
}

#[test]
fn test_clear_snapshot_ignores_paths_outside_store() {
	let dir = TempDir::new().unwrap();
	let other = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), unavailable()).unwrap();
	let foreign = other.path().join("foreign.dmp");
	fs::write(&foreign, b"MDMP").unwrap();

	assert!(store.clear_snapshot(&foreign));
	assert!(foreign.exists());
}

#[test]
fn test_persist_and_load_roundtrip() {
	let dir = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), unavailable()).unwrap();
	let scope = Attributes::new().with("release", "1.2.3");
	let record = ReportAssembler::new().assemble(
		&Report::exception("Boom", "it broke", Stacktrace::empty()),
		&scope,
	);

	assert!(store.persist(&record));
	assert_eq!(entries(dir.path()), vec![persisted_file_name(record.timestamp)]);

	let loaded = store.load_persisted();
	assert_eq!(loaded.len(), 1);
	assert_eq!(loaded[0].record, record);

	assert!(store.remove_persisted(&loaded[0].path));
	assert!(store.load_persisted().is_empty());
}

#[test]
fn test_load_persisted_orders_and_skips_garbage() {
	let dir = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), unavailable()).unwrap();
	let assembler = ReportAssembler::new();
	let report = Report::message("m").with_stacktrace(Stacktrace::empty());

	let mut newer = assembler.assemble(&report, &Attributes::new());
	newer.timestamp = 2_000;
	let mut older = assembler.assemble(&report, &Attributes::new());
	older.timestamp = 1_000;

	assert!(store.persist(&newer));
	assert!(store.persist(&older));
	fs::write(dir.path().join(persisted_file_name(3_000)), b"not json").unwrap();

	let loaded = store.load_persisted();
	let timestamps: Vec<i64> = loaded.iter().map(|p| p.record.timestamp).collect();
	assert_eq!(timestamps, vec![1_000, 2_000]);
}

#[test]
fn test_purge_empties_directory() {
	let dir = TempDir::new().unwrap();
	let store = OfflineStore::open(Some(dir.path()), file_writer()).unwrap();
	store
		.generate_snapshot(&Report::message("m"), MinidumpType::Normal)
		.unwrap();
	fs::create_dir(dir.path().join("sub")).unwrap();

	assert!(store.purge());
	assert!(entries(dir.path()).is_empty());
	assert!(dir.path().is_dir());
}
