// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admission gate bounding how many records leave the process.
//!
//! The limiter counts admission attempts since the last [`RateLimiter::configure`]
//! call and admits while the count stays within the ceiling. There is no time
//! window: the count only resets on reconfiguration.
//!
//! Ceiling and count share one `AtomicU64`, so a reconfiguration and a racing
//! admission are always ordered against each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

const COUNT_MASK: u64 = 0xFFFF_FFFF;

fn pack(ceiling: u32, count: u32) -> u64 {
	(u64::from(ceiling) << 32) | u64::from(count)
}

fn unpack(state: u64) -> (u32, u32) {
	((state >> 32) as u32, (state & COUNT_MASK) as u32)
}

/// Callback invoked when a record is dropped by the limiter.
pub type LimitCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned when registering a limit observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of limit-reached observers.
#[derive(Default)]
pub struct LimitObservers {
	next_id: AtomicU64,
	observers: RwLock<Vec<(ObserverId, LimitCallback)>>,
}

impl LimitObservers {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an observer. Observers run in registration order.
	pub fn register<F>(&self, callback: F) -> ObserverId
	where
		F: Fn() + Send + Sync + 'static,
	{
		let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.observers.write().push((id, Arc::new(callback)));
		id
	}

	/// Removes an observer. Returns false if it was not registered.
	pub fn unregister(&self, id: ObserverId) -> bool {
		let mut observers = self.observers.write();
		let before = observers.len();
		observers.retain(|(observer_id, _)| *observer_id != id);
		observers.len() != before
	}

	/// Invokes every observer once, on the calling thread.
	///
	/// The list is copied first so observers may register or unregister
	/// without deadlocking.
	pub fn notify(&self) {
		let callbacks: Vec<LimitCallback> = self
			.observers
			.read()
			.iter()
			.map(|(_, callback)| Arc::clone(callback))
			.collect();

		for callback in callbacks {
			callback();
		}
	}

	pub fn len(&self) -> usize {
		self.observers.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.observers.read().is_empty()
	}
}

impl std::fmt::Debug for LimitObservers {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LimitObservers")
			.field("len", &self.len())
			.finish()
	}
}

/// Thread-safe admission gate.
#[derive(Debug)]
pub struct RateLimiter {
	state: AtomicU64,
	observers: LimitObservers,
}

impl RateLimiter {
	/// Creates a limiter with the given ceiling. 0 means unlimited.
	pub fn new(ceiling: u32) -> Self {
		Self {
			state: AtomicU64::new(pack(ceiling, 0)),
			observers: LimitObservers::new(),
		}
	}

	/// Creates a limiter that admits everything.
	pub fn unlimited() -> Self {
		Self::new(0)
	}

	/// Sets a new ceiling and resets the attempt count to zero.
	pub fn configure(&self, ceiling: u32) {
		self.state.store(pack(ceiling, 0), Ordering::SeqCst);
		debug!(ceiling, "rate limit configured");
	}

	/// Counts one admission attempt and decides it.
	///
	/// Returns true when the ceiling is 0 or this attempt is within the
	/// ceiling. Concurrent callers never admit more than the ceiling between
	/// two `configure` calls.
	pub fn try_admit(&self) -> bool {
		let (Ok(previous) | Err(previous)) =
			self
				.state
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
					let (ceiling, count) = unpack(state);
					Some(pack(ceiling, count.saturating_add(1)))
				});

		// Deciding on the pre-increment count keeps a saturated counter
		// from admitting again.
		let (ceiling, count) = unpack(previous);
		ceiling == 0 || count < ceiling
	}

	/// Like [`RateLimiter::try_admit`], notifying observers on rejection.
	pub fn admit_or_notify(&self) -> bool {
		if self.try_admit() {
			return true;
		}

		debug!(ceiling = self.ceiling(), "record dropped by rate limit");
		self.observers.notify();
		false
	}

	/// The configured ceiling. 0 means unlimited.
	pub fn ceiling(&self) -> u32 {
		unpack(self.state.load(Ordering::SeqCst)).0
	}

	/// Admission attempts since the last reconfiguration.
	pub fn attempts(&self) -> u32 {
		unpack(self.state.load(Ordering::SeqCst)).1
	}

	/// Registers a callback fired once per rejected record.
	pub fn on_limit_reached<F>(&self, callback: F) -> ObserverId
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.observers.register(callback)
	}

	pub fn remove_limit_observer(&self, id: ObserverId) -> bool {
		self.observers.unregister(id)
	}

	pub fn observers(&self) -> &LimitObservers {
		&self.observers
	}
}

impl Default for RateLimiter {
	fn default() -> Self {
		Self::unlimited()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::atomic::AtomicUsize;
	use std::sync::Mutex;

	#[test]
	fn test_unlimited_admits_everything() {
		let limiter = RateLimiter::unlimited();
		for _ in 0..1000 {
			assert!(limiter.try_admit());
		}
		assert_eq!(limiter.attempts(), 1000);
	}

	#[test]
	fn test_ceiling_is_exact() {
		let limiter = RateLimiter::new(3);
		assert!(limiter.try_admit());
		assert!(limiter.try_admit());
		assert!(limiter.try_admit());
		assert!(!limiter.try_admit());
		assert!(!limiter.try_admit());
	}

	#[test]
	fn test_configure_resets_count() {
		let limiter = RateLimiter::new(1);
		assert!(limiter.try_admit());
		assert!(!limiter.try_admit());

		limiter.configure(2);
		assert_eq!(limiter.ceiling(), 2);
		assert_eq!(limiter.attempts(), 0);
		assert!(limiter.try_admit());
		assert!(limiter.try_admit());
		assert!(!limiter.try_admit());
	}

	#[test]
	fn test_configure_zero_disables_limit() {
		let limiter = RateLimiter::new(1);
		assert!(limiter.try_admit());
		limiter.configure(0);
		for _ in 0..10 {
			assert!(limiter.try_admit());
		}
	}

	#[test]
	fn test_saturated_counter_never_readmits() {
		let limiter = RateLimiter::new(u32::MAX);
		limiter
			.state
			.store(pack(u32::MAX, u32::MAX - 1), Ordering::SeqCst);

		assert!(limiter.try_admit());
		assert!(!limiter.try_admit());
		assert!(!limiter.try_admit());
		assert_eq!(limiter.attempts(), u32::MAX);
	}

	#[test]
	fn test_admit_or_notify_fires_once_per_rejection() {
		let limiter = RateLimiter::new(2);
		let fired = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&fired);
		limiter.on_limit_reached(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		let admitted = (0..5).filter(|_| limiter.admit_or_notify()).count();

		assert_eq!(admitted, 2);
		assert_eq!(fired.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn test_observers_run_in_registration_order() {
		let observers = LimitObservers::new();
		let calls = Arc::new(Mutex::new(Vec::new()));
		for name in ["first", "second", "third"] {
			let calls = Arc::clone(&calls);
			observers.register(move || calls.lock().unwrap().push(name));
		}

		observers.notify();

		assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
	}

	#[test]
	fn test_unregister_observer() {
		let observers = LimitObservers::new();
		let fired = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&fired);
		let id = observers.register(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		assert!(observers.unregister(id));
		assert!(!observers.unregister(id));
		observers.notify();

		assert_eq!(fired.load(Ordering::SeqCst), 0);
		assert!(observers.is_empty());
	}

	#[test]
	fn test_observer_may_register_during_notify() {
		let observers = Arc::new(LimitObservers::new());
		let inner = Arc::clone(&observers);
		observers.register(move || {
			inner.register(|| {});
		});

		observers.notify();

		assert_eq!(observers.len(), 2);
	}

	proptest! {
		#[test]
		fn sequential_admissions_match_ceiling(ceiling in 1u32..50, attempts in 0usize..100) {
			let limiter = RateLimiter::new(ceiling);
			let admitted = (0..attempts).filter(|_| limiter.try_admit()).count();
			prop_assert_eq!(admitted, attempts.min(ceiling as usize));
		}

		#[test]
		fn pack_unpack_roundtrip(ceiling in any::<u32>(), count in any::<u32>()) {
			prop_assert_eq!(unpack(pack(ceiling, count)), (ceiling, count));
		}
	}
}
