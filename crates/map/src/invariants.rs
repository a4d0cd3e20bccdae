use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::{BoundedOpenMap, Key, MutableBoundedOpenMap, Scope};

enum Session {}
impl Scope for Session {}

const THREADS: usize = 8;

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::TRACE)
		.with_test_writer()
		.try_init();
}

/// Invariant: A snapshot MUST NOT observe writes made after it was taken.
pub(crate) fn inv_snapshot_isolation() {
	let count: Key<i32, Session> = Key::new("count");
	let name: Key<String, Session> = Key::new("name");
	let map = MutableBoundedOpenMap::<Session>::new();
	map.set(&count, 5);

	let snap = map.persistent();
	map.set(&count, 6);
	map.set(&name, "late".to_string());
	map.remove(&count);

	assert_eq!(snap.get(&count), Some(&5));
	assert_eq!(snap.get(&name), None);
	assert_eq!(snap.len(), 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_snapshot_isolation() {
	inv_snapshot_isolation()
}

/// Invariant: Cells produced by `mutable()` MUST evolve independently of each other and of
/// their source snapshot.
pub(crate) fn inv_mutable_independence() {
	let count: Key<i32, Session> = Key::new("count");
	let source = BoundedOpenMap::<Session>::new().assoc(&count, 1);

	let first = source.mutable();
	let second = source.mutable();
	first.set(&count, 2);
	first.update(&count, |current| current.copied().unwrap_or(0) * 10);

	assert_eq!(first.get(&count).as_deref(), Some(&20));
	assert_eq!(second.get(&count).as_deref(), Some(&1));
	assert_eq!(source.get(&count), Some(&1));
}

#[cfg_attr(test, test)]
pub(crate) fn test_mutable_independence() {
	inv_mutable_independence()
}

/// Invariant: Racing `get_or_init` calls on an empty slot MUST install exactly one value, and
/// every caller MUST observe that value.
pub(crate) fn inv_get_or_init_single_install() {
	init_tracing();

	let slot: Key<usize, Session> = Key::new("slot");
	let map = MutableBoundedOpenMap::<Session>::new();
	let barrier = Barrier::new(THREADS);
	let init_calls = AtomicUsize::new(0);

	let observed: Vec<Arc<usize>> = thread::scope(|scope| {
		let handles: Vec<_> = (0..THREADS)
			.map(|i| {
				let (map, barrier, init_calls) = (&map, &barrier, &init_calls);
				scope.spawn(move || {
					barrier.wait();
					map.get_or_init(&slot, || {
						init_calls.fetch_add(1, Ordering::SeqCst);
						i
					})
				})
			})
			.collect();
		handles
			.into_iter()
			.map(|h| h.join().expect("worker panicked"))
			.collect()
	});

	let installed = map.get(&slot).expect("slot must be populated");
	assert!(init_calls.load(Ordering::SeqCst) >= 1);
	for value in &observed {
		assert!(Arc::ptr_eq(value, &installed), "all callers must see the installed value");
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_get_or_init_single_install() {
	inv_get_or_init_single_install()
}

/// Invariant: `update` MUST apply to the latest value; concurrent increments are never lost,
/// including while unrelated keys are being written.
pub(crate) fn inv_update_sees_latest() {
	init_tracing();

	const PER_THREAD: usize = 200;

	let counter: Key<usize, Session> = Key::new("counter");
	let noise: Vec<Key<usize, Session>> = (0..THREADS).map(|_| Key::new("noise")).collect();
	let map = MutableBoundedOpenMap::<Session>::new();
	map.get_or_init(&counter, || 0);

	thread::scope(|scope| {
		for noise_key in &noise {
			let map = &map;
			scope.spawn(move || {
				for i in 0..PER_THREAD {
					map.update(&counter, |current| current.copied().unwrap_or(0) + 1);
					map.set(noise_key, i);
				}
			});
		}
	});

	assert_eq!(map.get(&counter).as_deref(), Some(&(THREADS * PER_THREAD)));
	for noise_key in &noise {
		assert_eq!(map.get(noise_key).as_deref(), Some(&(PER_THREAD - 1)));
	}
	assert_eq!(map.len(), THREADS + 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_update_sees_latest() {
	inv_update_sees_latest()
}
