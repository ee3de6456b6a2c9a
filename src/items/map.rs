use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use fxhash::FxHashMap;

use super::Items;
use crate::collections::{IntoObservableMap, WeakObservableMap};
use crate::delta::map::{map_added, map_removed, map_replaced};
use crate::delta::Disposer;
use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::reaction::{Reaction, ReactionOptions};

struct MapItems<K, V, D> {
	map: WeakObservableMap<K, V>,
	items: Items<K, V, D>,
	/// Map revision of the value each key's reaction watches.
	watched: RefCell<FxHashMap<K, u64>>,
}

impl<K, V, D> MapItems<K, V, D>
where
	K: Hash + Eq + Clone + Debug + 'static,
	V: Clone + 'static,
	D: Hash + 'static,
{
	/// Makes the reaction of `key` watch its current value: dropped when the
	/// key is gone, replaced when the value was written since it was
	/// created, left alone otherwise.
	fn sync(&self, key: &K) {
		let Some(map) = self.map.upgrade() else {
			return;
		};

		let Some((value, revision)) = map.get_revision(key) else {
			self.watched.borrow_mut().remove(key);
			self.items.unwatch(key);
			return;
		};

		let current = self.watched.borrow().get(key) == Some(&revision);
		if current && self.items.contains(key) {
			return;
		}

		self.items.unwatch(key);
		self.watched.borrow_mut().insert(key.clone(), revision);
		self.items.watch(key.clone(), value);
	}
}

/// Runs `callback` whenever the value `selector` derives from a value of
/// `map` changes.
///
/// Each key gets its own reaction over its current value. Adding a key
/// starts one, deleting the key disposes it, and overwriting the value
/// replaces it with a reaction over the new value.
///
/// `callback` receives the derived value, the map value and the key's
/// reaction, which it may dispose to stop watching that key alone.
pub fn map_item_changed<K, V, D, M, S, F>(map: M, selector: S, callback: F, options: ReactionOptions) -> Result<Disposer>
where
	K: Hash + Eq + Clone + Debug + 'static,
	V: Clone + 'static,
	D: Hash + 'static,
	M: IntoObservableMap<K, V>,
	S: Fn(&V, &Evaluation) -> D + 'static,
	F: Fn(D, &V, &Reaction) + 'static,
{
	let map = map.into_observable_map()?;
	let manager = Rc::new(MapItems {
		map: map.downgrade(),
		items: Items::new(Rc::new(selector), Rc::new(callback), options),
		watched: RefCell::new(FxHashMap::default()),
	});

	for key in map.keys() {
		manager.sync(&key);
	}

	let added = map_added(
		&map,
		{
			let manager = manager.clone();
			move |entries, _| {
				for entry in &entries {
					manager.sync(&entry.key);
				}
			}
		},
		Duration::ZERO,
	)?;

	let removed = map_removed(
		&map,
		{
			let manager = manager.clone();
			move |entries, _| {
				for entry in &entries {
					manager.sync(&entry.key);
				}
			}
		},
		Duration::ZERO,
	)?;

	let replaced = map_replaced(
		&map,
		{
			let manager = manager.clone();
			move |updates, _| {
				for update in &updates {
					manager.sync(&update.key);
				}
			}
		},
		Duration::ZERO,
	)?;

	let disposer = Disposer::new();
	disposer.on_dispose(move || {
		replaced.dispose();
		removed.dispose();
		added.dispose();
		manager.items.dispose_all();
	});

	Ok(disposer)
}
