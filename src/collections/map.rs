use std::any::Any;
use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use fxhash::{FxHashMap, FxHashSet};

use super::{Listeners, Subscription};
use crate::batch::batch;
use crate::error::{Error, Result};

/// One structural change of an [`ObservableMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapChange<K, V> {
	Add { key: K, value: V },
	Delete { key: K, old: V },
	Update { key: K, old: V, new: V },
}

/// An insertion-ordered map that reports every structural change to its
/// listeners.
///
/// Keys compare with their own `Eq`; wrap object keys in
/// [`RcAddr`](crate::RcAddr) to key by identity.
pub struct ObservableMap<K, V> {
	body: Rc<MapBody<K, V>>,
}

struct MapBody<K, V> {
	entries: RefCell<Entries<K, V>>,
	listeners: Listeners<MapChange<K, V>>,
}

pub struct WeakObservableMap<K, V> {
	body: Weak<MapBody<K, V>>,
}

struct Entries<K, V> {
	order: Vec<(K, V)>,
	index: FxHashMap<K, usize>,
	/// Bumped on every write of a key, so a stored value can be told apart
	/// from a later one even when `V` has no equality.
	revisions: FxHashMap<K, u64>,
	next_revision: u64,
}

impl<K: Hash + Eq + Clone, V> Entries<K, V> {
	fn get(&self, key: &K) -> Option<&V> {
		self.index.get(key).map(|&i| &self.order[i].1)
	}

	fn insert(&mut self, key: K, value: V) -> Option<V> {
		self.next_revision += 1;
		self.revisions.insert(key.clone(), self.next_revision);

		match self.index.get(&key) {
			Some(&i) => Some(std::mem::replace(&mut self.order[i].1, value)),
			None => {
				self.index.insert(key.clone(), self.order.len());
				self.order.push((key, value));
				None
			}
		}
	}

	fn remove(&mut self, key: &K) -> Option<V> {
		let position = self.index.remove(key)?;
		self.revisions.remove(key);
		let (_, value) = self.order.remove(position);
		for i in self.index.values_mut() {
			if *i > position {
				*i -= 1;
			}
		}
		Some(value)
	}
}

impl<K, V> Clone for ObservableMap<K, V> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<K, V> Clone for WeakObservableMap<K, V> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<K, V> WeakObservableMap<K, V> {
	pub fn upgrade(&self) -> Option<ObservableMap<K, V>> {
		self.body.upgrade().map(|body| ObservableMap { body })
	}
}

impl<K, V> Default for ObservableMap<K, V>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V> FromIterator<(K, V)> for ObservableMap<K, V>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut entries = Entries {
			order: Vec::new(),
			index: FxHashMap::default(),
			revisions: FxHashMap::default(),
			next_revision: 0,
		};
		for (key, value) in iter {
			entries.insert(key, value);
		}

		ObservableMap {
			body: Rc::new(MapBody {
				entries: RefCell::new(entries),
				listeners: Listeners::new(),
			}),
		}
	}
}

impl<K, V> ObservableMap<K, V>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
{
	pub fn new() -> Self {
		std::iter::empty().collect()
	}

	pub fn len(&self) -> usize {
		self.body.entries.borrow().order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get(&self, key: &K) -> Option<V> {
		self.body.entries.borrow().get(key).cloned()
	}

	/// Current value of `key` with the revision of the write that stored it.
	pub(crate) fn get_revision(&self, key: &K) -> Option<(V, u64)> {
		let entries = self.body.entries.borrow();
		let value = entries.get(key)?.clone();
		let revision = entries.revisions.get(key).copied()?;
		Some((value, revision))
	}

	pub fn contains_key(&self, key: &K) -> bool {
		self.body.entries.borrow().index.contains_key(key)
	}

	pub fn keys(&self) -> Vec<K> {
		self.body.entries.borrow().order.iter().map(|(k, _)| k.clone()).collect()
	}

	pub fn values(&self) -> Vec<V> {
		self.body.entries.borrow().order.iter().map(|(_, v)| v.clone()).collect()
	}

	/// Entries in insertion order.
	pub fn entries(&self) -> Vec<(K, V)> {
		self.body.entries.borrow().order.clone()
	}

	/// Adds `key` or overwrites its value, returning the previous one.
	pub fn insert(&self, key: K, value: V) -> Option<V> {
		let old = self.body.entries.borrow_mut().insert(key.clone(), value.clone());

		let change = match &old {
			Some(old) => MapChange::Update {
				key,
				old: old.clone(),
				new: value,
			},
			None => MapChange::Add { key, value },
		};
		batch(|| self.body.listeners.notify(&change));

		old
	}

	pub fn remove(&self, key: &K) -> Option<V> {
		let old = self.body.entries.borrow_mut().remove(key)?;

		batch(|| {
			self.body.listeners.notify(&MapChange::Delete {
				key: key.clone(),
				old: old.clone(),
			})
		});

		Some(old)
	}

	/// Inserts every entry as one batch.
	pub fn merge(&self, entries: impl IntoIterator<Item = (K, V)>) {
		batch(|| {
			for (key, value) in entries {
				self.insert(key, value);
			}
		})
	}

	/// Makes the map hold exactly `entries`: keys that are absent from
	/// `entries` are deleted, the rest merged, all in one batch.
	pub fn replace(&self, entries: impl IntoIterator<Item = (K, V)>) {
		let entries: Vec<(K, V)> = entries.into_iter().collect();
		let keep: FxHashSet<&K> = entries.iter().map(|(k, _)| k).collect();
		let stale: Vec<K> = self.keys().into_iter().filter(|k| !keep.contains(k)).collect();
		drop(keep);

		batch(|| {
			for key in &stale {
				self.remove(key);
			}
			self.merge(entries);
		})
	}

	pub fn clear(&self) {
		let keys = self.keys();
		batch(|| {
			for key in &keys {
				self.remove(key);
			}
		})
	}

	/// Registers a listener for raw changes, called synchronously during
	/// each mutation.
	pub fn observe(&self, listener: impl Fn(&MapChange<K, V>) + 'static) -> Subscription {
		self.body.listeners.subscribe(Rc::new(listener))
	}

	pub fn downgrade(&self) -> WeakObservableMap<K, V> {
		WeakObservableMap {
			body: Rc::downgrade(&self.body),
		}
	}
}

impl<K: Debug, V: Debug> Debug for ObservableMap<K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.body.entries.borrow();
		f.debug_map()
			.entries(entries.order.iter().map(|(k, v)| (k, v)))
			.finish()
	}
}

impl<K: 'static, V: 'static> From<ObservableMap<K, V>> for Rc<dyn Any> {
	fn from(map: ObservableMap<K, V>) -> Self {
		map.body
	}
}

/// Anything an entry point accepts as its map argument.
///
/// Typed handles always convert; an erased `Rc<dyn Any>` converts only when
/// it holds an `ObservableMap<K, V>`.
pub trait IntoObservableMap<K, V> {
	fn into_observable_map(self) -> Result<ObservableMap<K, V>>;
}

impl<K, V> IntoObservableMap<K, V> for ObservableMap<K, V> {
	fn into_observable_map(self) -> Result<ObservableMap<K, V>> {
		Ok(self)
	}
}

impl<K, V> IntoObservableMap<K, V> for &ObservableMap<K, V> {
	fn into_observable_map(self) -> Result<ObservableMap<K, V>> {
		Ok(self.clone())
	}
}

impl<K: 'static, V: 'static> IntoObservableMap<K, V> for Rc<dyn Any> {
	fn into_observable_map(self) -> Result<ObservableMap<K, V>> {
		Rc::downcast::<MapBody<K, V>>(self)
			.map(|body| ObservableMap { body })
			.map_err(|_| Error::ExpectedObservableMap)
	}
}
