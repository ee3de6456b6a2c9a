use std::collections::BTreeMap;
use std::time::Duration;

use super::{monitor, Delta, Disposer};
use crate::collections::{IntoObservableVec, ListChange};
use crate::error::Result;

/// A slot overwritten during one cycle: `old` is the value before the first
/// write of the cycle, `new` the value after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced<T> {
	pub index: usize,
	pub old: T,
	pub new: T,
}

#[derive(Clone, Copy)]
enum Side {
	Added,
	Removed,
}

/// Elements of splices, in event order, duplicates included.
struct Spliced<T> {
	side: Side,
	items: Vec<T>,
}

impl<T> Spliced<T> {
	fn new(side: Side) -> Self {
		Spliced {
			side,
			items: Vec::new(),
		}
	}
}

impl<T: Clone + 'static> Delta for Spliced<T> {
	type Change = ListChange<T>;
	type Record = T;

	fn record(&mut self, change: &ListChange<T>) -> bool {
		let ListChange::Splice { added, removed, .. } = change else {
			return false;
		};
		let items = match self.side {
			Side::Added => added,
			Side::Removed => removed,
		};
		if items.is_empty() {
			return false;
		}
		self.items.extend(items.iter().cloned());
		true
	}

	fn take(&mut self) -> Vec<T> {
		std::mem::take(&mut self.items)
	}
}

/// In-place overwrites keyed by index, delivered in index order.
struct Overwritten<T> {
	slots: BTreeMap<usize, Replaced<T>>,
}

impl<T: Clone + 'static> Delta for Overwritten<T> {
	type Change = ListChange<T>;
	type Record = Replaced<T>;

	fn record(&mut self, change: &ListChange<T>) -> bool {
		let ListChange::Update { index, old, new } = change else {
			return false;
		};
		self.slots
			.entry(*index)
			.and_modify(|slot| slot.new = new.clone())
			.or_insert_with(|| Replaced {
				index: *index,
				old: old.clone(),
				new: new.clone(),
			});
		true
	}

	fn take(&mut self) -> Vec<Replaced<T>> {
		std::mem::take(&mut self.slots).into_values().collect()
	}
}

/// Calls `callback` with the elements inserted into `list` since the
/// previous call.
///
/// Calls happen once per notification wave, or once per `delay` window
/// when `delay` is not zero. Delayed flushes run from the [`timer`]
/// queue: outside `wasm32` nothing fires until the host drives it with
/// [`timer::advance`] or [`timer::run_until_idle`].
///
/// [`timer`]: crate::timer
/// [`timer::advance`]: crate::timer::advance
/// [`timer::run_until_idle`]: crate::timer::run_until_idle
pub fn list_added<T, L, F>(list: L, callback: F, delay: Duration) -> Result<Disposer>
where
	T: Clone + 'static,
	L: IntoObservableVec<T>,
	F: Fn(Vec<T>, &Disposer) + 'static,
{
	let list = list.into_observable_vec()?;
	Ok(monitor(&list, "list_added", Spliced::new(Side::Added), callback, delay))
}

/// Calls `callback` with the elements removed from `list` since the
/// previous call.
pub fn list_removed<T, L, F>(list: L, callback: F, delay: Duration) -> Result<Disposer>
where
	T: Clone + 'static,
	L: IntoObservableVec<T>,
	F: Fn(Vec<T>, &Disposer) + 'static,
{
	let list = list.into_observable_vec()?;
	Ok(monitor(&list, "list_removed", Spliced::new(Side::Removed), callback, delay))
}

/// Calls `callback` with the slots of `list` overwritten in place since the
/// previous call, one coalesced record per index.
///
/// Splices, including a whole-list `replace`, are never reported here.
pub fn list_replaced<T, L, F>(list: L, callback: F, delay: Duration) -> Result<Disposer>
where
	T: Clone + 'static,
	L: IntoObservableVec<T>,
	F: Fn(Vec<Replaced<T>>, &Disposer) + 'static,
{
	let list = list.into_observable_vec()?;
	let delta = Overwritten {
		slots: BTreeMap::new(),
	};
	Ok(monitor(&list, "list_replaced", delta, callback, delay))
}
