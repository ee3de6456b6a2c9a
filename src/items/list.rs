use std::hash::Hash;
use std::rc::Rc;
use std::time::Duration;

use fxhash::FxHashSet;

use super::Items;
use crate::addr::{Addr, Identity};
use crate::collections::{IntoObservableVec, WeakObservableVec};
use crate::delta::list::{list_added, list_removed, list_replaced};
use crate::delta::Disposer;
use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::reaction::{Reaction, ReactionOptions};

struct ListItems<T, K> {
	list: WeakObservableVec<T>,
	items: Items<Addr, T, K>,
}

impl<T, K> ListItems<T, K>
where
	T: Identity + Clone + 'static,
	K: Hash + 'static,
{
	/// Brings the registry in line with the list for the given items: an
	/// item still in the list gets a reaction, an item gone from it loses
	/// its reaction.
	fn sync<'a>(&self, touched: impl IntoIterator<Item = &'a T>) {
		let Some(list) = self.list.upgrade() else {
			return;
		};
		let present: FxHashSet<Addr> = list.with(|items| items.iter().map(Identity::identity).collect());

		for item in touched {
			let id = item.identity();
			match (present.contains(&id), self.items.contains(&id)) {
				(true, false) => self.items.watch(id, item.clone()),
				(false, true) => self.items.unwatch(&id),
				_ => {}
			}
		}
	}
}

/// Runs `callback` whenever the value `selector` derives from an item of
/// `list` changes.
///
/// Each item present in the list gets its own reaction, created right away
/// for the current items and as items are added, and disposed as items are
/// removed or overwritten. Items are told apart by [`Identity`]; the same
/// object appearing twice in the list shares one reaction.
///
/// `callback` receives the derived value, the item and the item's reaction,
/// which it may dispose to stop watching that item alone.
pub fn list_item_changed<T, K, L, S, F>(list: L, selector: S, callback: F, options: ReactionOptions) -> Result<Disposer>
where
	T: Identity + Clone + 'static,
	K: Hash + 'static,
	L: IntoObservableVec<T>,
	S: Fn(&T, &Evaluation) -> K + 'static,
	F: Fn(K, &T, &Reaction) + 'static,
{
	let list = list.into_observable_vec()?;
	let manager = Rc::new(ListItems {
		list: list.downgrade(),
		items: Items::new(Rc::new(selector), Rc::new(callback), options),
	});

	for item in list.to_vec() {
		let id = item.identity();
		if !manager.items.contains(&id) {
			manager.items.watch(id, item);
		}
	}

	let replaced = list_replaced(
		&list,
		{
			let manager = manager.clone();
			move |records, _| {
				for record in &records {
					manager.sync([&record.old, &record.new]);
				}
			}
		},
		Duration::ZERO,
	)?;

	let removed = list_removed(
		&list,
		{
			let manager = manager.clone();
			move |items, _| manager.sync(&items)
		},
		Duration::ZERO,
	)?;

	let added = list_added(
		&list,
		{
			let manager = manager.clone();
			move |items, _| manager.sync(&items)
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
