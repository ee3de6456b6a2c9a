pub(crate) mod list;
pub(crate) mod map;

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use enclose::enclose;
use smallvec::SmallVec;

use crate::batch::batch;
use crate::collections::{ListChange, MapChange, ObservableMap, ObservableVec, Subscription};
use crate::reaction::{react, ReactionOptions};
use crate::var::Var;

/// Handle that stops a monitor.
///
/// Disposal is idempotent and may happen from inside the very callback the
/// monitor is delivering; nothing is delivered afterwards. Dropping the
/// handle does not dispose.
#[derive(Clone)]
pub struct Disposer {
	inner: Rc<DisposerInner>,
}

struct DisposerInner {
	disposed: Cell<bool>,
	teardown: RefCell<SmallVec<[Box<dyn FnOnce()>; 2]>>,
}

impl Disposer {
	pub(crate) fn new() -> Self {
		Disposer {
			inner: Rc::new(DisposerInner {
				disposed: Cell::new(false),
				teardown: RefCell::new(SmallVec::new()),
			}),
		}
	}

	/// Queues `func` to run on disposal, or runs it right away when the
	/// handle is already disposed.
	pub(crate) fn on_dispose(&self, func: impl FnOnce() + 'static) {
		if self.is_disposed() {
			func();
		} else {
			self.inner.teardown.borrow_mut().push(Box::new(func));
		}
	}

	pub fn dispose(&self) {
		if self.inner.disposed.replace(true) {
			return;
		}

		let teardown = std::mem::take(&mut *self.inner.teardown.borrow_mut());
		for func in teardown {
			func();
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}
}

impl Debug for Disposer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Disposer")
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

/// Per-cycle buffer of one monitor.
///
/// `record` folds a raw change into the buffer and reports whether the
/// change was of the monitored kind; `take` empties the buffer.
pub(crate) trait Delta: 'static {
	type Change: 'static;
	type Record: 'static;

	fn record(&mut self, change: &Self::Change) -> bool;
	fn take(&mut self) -> Vec<Self::Record>;
}

/// A collection with a raw change stream.
pub(crate) trait Source {
	type Change: 'static;

	fn observe(&self, listener: impl Fn(&Self::Change) + 'static) -> Subscription;
}

impl<T: Clone + 'static> Source for ObservableVec<T> {
	type Change = ListChange<T>;

	fn observe(&self, listener: impl Fn(&Self::Change) + 'static) -> Subscription {
		ObservableVec::observe(self, listener)
	}
}

impl<K, V> Source for ObservableMap<K, V>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
{
	type Change = MapChange<K, V>;

	fn observe(&self, listener: impl Fn(&Self::Change) + 'static) -> Subscription {
		ObservableMap::observe(self, listener)
	}
}

/// Batches the raw changes of `source` that `delta` accepts and hands them
/// to `callback` once per notification wave, or once per `delay` window.
///
/// The buffer is emptied before `callback` runs, so a panicking callback
/// still counts as flushed.
pub(crate) fn monitor<S, D, F>(source: &S, name: &'static str, delta: D, callback: F, delay: Duration) -> Disposer
where
	S: Source<Change = D::Change>,
	D: Delta,
	F: Fn(Vec<D::Record>, &Disposer) + 'static,
{
	let buffer = Rc::new(RefCell::new(delta));
	let changed = Var::new(0u64);
	let disposer = Disposer::new();

	let reaction = react(
		enclose!((changed) move |cx| *changed.get(cx)),
		enclose!((buffer, disposer) move |_, _| {
			if disposer.is_disposed() {
				return;
			}
			let records = buffer.borrow_mut().take();
			tracing::debug!(monitor = name, records = records.len(), "flush");
			callback(records, &disposer);
		}),
		ReactionOptions::named(name).delay(delay),
	);

	let subscription = source.observe(enclose!((buffer, changed, disposer) move |change| {
		if disposer.is_disposed() {
			return;
		}
		batch(|| {
			if buffer.borrow_mut().record(change) {
				tracing::trace!(monitor = name, "change buffered");
				changed.update(|n| *n = n.wrapping_add(1));
			}
		})
	}));

	tracing::debug!(monitor = name, ?delay, "monitor started");

	disposer.on_dispose(move || {
		subscription.unsubscribe();
		reaction.dispose();
		tracing::debug!(monitor = name, "monitor disposed");
	});

	disposer
}
