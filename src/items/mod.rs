pub(crate) mod list;
pub(crate) mod map;

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use fxhash::FxHashMap;

use crate::evaluation::Evaluation;
use crate::reaction::{react, Reaction, ReactionOptions};

type Selector<T, K> = Rc<dyn Fn(&T, &Evaluation) -> K>;
type Callback<T, K> = Rc<dyn Fn(K, &T, &Reaction)>;

/// One reaction per present item, keyed by `I`.
///
/// The registry is borrowed only around lookups and inserts: creating or
/// disposing a reaction may run user code, which may re-enter.
pub(crate) struct Items<I, T, K> {
	registry: RefCell<FxHashMap<I, Reaction>>,
	selector: Selector<T, K>,
	callback: Callback<T, K>,
	options: ReactionOptions,
}

impl<I, T, K> Items<I, T, K>
where
	I: Hash + Eq + Debug,
	T: 'static,
	K: Hash + 'static,
{
	pub fn new(selector: Selector<T, K>, callback: Callback<T, K>, options: ReactionOptions) -> Self {
		Items {
			registry: RefCell::new(FxHashMap::default()),
			selector,
			callback,
			options,
		}
	}

	pub fn contains(&self, id: &I) -> bool {
		self.registry.borrow().contains_key(id)
	}

	/// Starts reacting to `item`, replacing whatever was registered under
	/// `id`.
	pub fn watch(&self, id: I, item: T)
	where
		T: Clone,
	{
		tracing::debug!(name = self.options.name, item = ?id, "watching item");

		let selector = self.selector.clone();
		let callback = self.callback.clone();
		let tracked = item.clone();
		let reaction = react(
			move |cx| selector(&tracked, cx),
			move |value, reaction| callback(value, &item, reaction),
			self.options.clone(),
		);

		let previous = self.registry.borrow_mut().insert(id, reaction);
		if let Some(previous) = previous {
			previous.dispose();
		}
	}

	pub fn unwatch(&self, id: &I) {
		let reaction = self.registry.borrow_mut().remove(id);
		if let Some(reaction) = reaction {
			tracing::debug!(name = self.options.name, item = ?id, "item released");
			reaction.dispose();
		}
	}

	pub fn dispose_all(&self) {
		let registry = std::mem::take(&mut *self.registry.borrow_mut());
		tracing::debug!(name = self.options.name, items = registry.len(), "releasing all items");
		for reaction in registry.into_values() {
			reaction.dispose();
		}
	}
}
