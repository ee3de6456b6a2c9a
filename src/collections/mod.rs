mod map;
mod vec;

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use smallvec::SmallVec;

pub use map::{IntoObservableMap, MapChange, ObservableMap, WeakObservableMap};
pub use vec::{IntoObservableVec, ListChange, ObservableVec, WeakObservableVec};

type Listener<E> = Rc<dyn Fn(&E)>;

/// Raw change listeners of one collection.
pub(crate) struct Listeners<E> {
	inner: Rc<RefCell<ListenersInner<E>>>,
}

struct ListenersInner<E> {
	next: u64,
	entries: Vec<(u64, Listener<E>)>,
}

impl<E: 'static> Listeners<E> {
	pub fn new() -> Self {
		Listeners {
			inner: Rc::new(RefCell::new(ListenersInner {
				next: 0,
				entries: Vec::new(),
			})),
		}
	}

	pub fn subscribe(&self, listener: Listener<E>) -> Subscription {
		let id = {
			let mut inner = self.inner.borrow_mut();
			let id = inner.next;
			inner.next += 1;
			inner.entries.push((id, listener));
			id
		};

		let inner = Rc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = inner.upgrade() {
				inner.borrow_mut().entries.retain(|(i, _)| *i != id);
			}
		})
	}

	/// Calls every listener with `event`. The storage borrow of the
	/// collection must already be released.
	pub fn notify(&self, event: &E) {
		let snapshot: SmallVec<[(u64, Listener<E>); 4]> = self.inner.borrow().entries.iter().cloned().collect();
		for (id, listener) in snapshot {
			let live = self.inner.borrow().entries.iter().any(|(i, _)| *i == id);
			if live {
				listener(event);
			}
		}
	}
}

/// Registration of a raw change listener.
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
	cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
	fn new(cancel: impl FnOnce() + 'static) -> Self {
		Subscription {
			cancel: RefCell::new(Some(Box::new(cancel))),
		}
	}

	pub fn unsubscribe(&self) {
		let cancel = self.cancel.borrow_mut().take();
		if let Some(cancel) = cancel {
			cancel();
		}
	}

	pub fn is_active(&self) -> bool {
		self.cancel.borrow().is_some()
	}
}

impl Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}
