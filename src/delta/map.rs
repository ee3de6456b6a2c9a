use std::hash::Hash;
use std::time::Duration;

use fxhash::FxHashMap;

use super::{monitor, Delta, Disposer};
use crate::collections::{IntoObservableMap, MapChange};
use crate::error::Result;

/// A key that was added (with its new value) or deleted (with the value it
/// held when deleted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry<K, V> {
	pub key: K,
	pub value: V,
}

/// A key whose value changed during one cycle: `old` is the value before the
/// first update of the cycle, `new` the value after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapUpdate<K, V> {
	pub key: K,
	pub old: V,
	pub new: V,
}

#[derive(Clone, Copy)]
enum Side {
	Added,
	Deleted,
}

struct Keyed<K, V> {
	side: Side,
	entries: Vec<MapEntry<K, V>>,
}

impl<K, V> Keyed<K, V> {
	fn new(side: Side) -> Self {
		Keyed {
			side,
			entries: Vec::new(),
		}
	}
}

impl<K: Clone + 'static, V: Clone + 'static> Delta for Keyed<K, V> {
	type Change = MapChange<K, V>;
	type Record = MapEntry<K, V>;

	fn record(&mut self, change: &MapChange<K, V>) -> bool {
		let (key, value) = match (self.side, change) {
			(Side::Added, MapChange::Add { key, value }) => (key, value),
			(Side::Deleted, MapChange::Delete { key, old }) => (key, old),
			_ => return false,
		};
		self.entries.push(MapEntry {
			key: key.clone(),
			value: value.clone(),
		});
		true
	}

	fn take(&mut self) -> Vec<MapEntry<K, V>> {
		std::mem::take(&mut self.entries)
	}
}

/// Updates coalesced per key, in the order keys were first updated.
struct Updated<K, V> {
	order: Vec<MapUpdate<K, V>>,
	index: FxHashMap<K, usize>,
}

impl<K: Hash + Eq + Clone + 'static, V: Clone + 'static> Delta for Updated<K, V> {
	type Change = MapChange<K, V>;
	type Record = MapUpdate<K, V>;

	fn record(&mut self, change: &MapChange<K, V>) -> bool {
		let MapChange::Update { key, old, new } = change else {
			return false;
		};
		match self.index.get(key) {
			Some(&i) => self.order[i].new = new.clone(),
			None => {
				self.index.insert(key.clone(), self.order.len());
				self.order.push(MapUpdate {
					key: key.clone(),
					old: old.clone(),
					new: new.clone(),
				});
			}
		}
		true
	}

	fn take(&mut self) -> Vec<MapUpdate<K, V>> {
		self.index.clear();
		std::mem::take(&mut self.order)
	}
}

/// Calls `callback` with the keys added to `map` since the previous call.
///
/// Calls happen once per notification wave, or once per `delay` window
/// when `delay` is not zero. Delayed flushes run from the [`timer`]
/// queue: outside `wasm32` nothing fires until the host drives it with
/// [`timer::advance`] or [`timer::run_until_idle`].
///
/// [`timer`]: crate::timer
/// [`timer::advance`]: crate::timer::advance
/// [`timer::run_until_idle`]: crate::timer::run_until_idle
pub fn map_added<K, V, M, F>(map: M, callback: F, delay: Duration) -> Result<Disposer>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
	M: IntoObservableMap<K, V>,
	F: Fn(Vec<MapEntry<K, V>>, &Disposer) + 'static,
{
	let map = map.into_observable_map()?;
	Ok(monitor(&map, "map_added", Keyed::new(Side::Added), callback, delay))
}

/// Calls `callback` with the keys deleted from `map` since the previous
/// call.
pub fn map_removed<K, V, M, F>(map: M, callback: F, delay: Duration) -> Result<Disposer>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
	M: IntoObservableMap<K, V>,
	F: Fn(Vec<MapEntry<K, V>>, &Disposer) + 'static,
{
	let map = map.into_observable_map()?;
	Ok(monitor(&map, "map_removed", Keyed::new(Side::Deleted), callback, delay))
}

/// Calls `callback` with the existing keys whose value was overwritten since
/// the previous call, one coalesced record per key.
pub fn map_replaced<K, V, M, F>(map: M, callback: F, delay: Duration) -> Result<Disposer>
where
	K: Hash + Eq + Clone + 'static,
	V: Clone + 'static,
	M: IntoObservableMap<K, V>,
	F: Fn(Vec<MapUpdate<K, V>>, &Disposer) + 'static,
{
	let map = map.into_observable_map()?;
	let delta = Updated {
		order: Vec::new(),
		index: FxHashMap::default(),
	};
	Ok(monitor(&map, "map_replaced", delta, callback, delay))
}

pub use self::map_replaced as map_updated;
