use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use observe_changes::{batch, in_batch, list_added, list_removed, list_replaced, timer, Error, ObservableVec, Replaced};
use mockall::predicate;
use proptest::prelude::*;

use crate::mock::{SharedMock, Spy};
use crate::support::{ids, init_tracing, item, items, Item, Log};

fn replaced_ids(records: Vec<Replaced<Rc<Item>>>) -> Vec<(usize, u32, u32)> {
	records
		.into_iter()
		.map(|r| (r.index, *r.old.id.get_once(), *r.new.id.get_once()))
		.collect()
}

#[test]
fn added_flushes_after_each_push() {
	init_tracing();
	let list = ObservableVec::new();
	let mock = SharedMock::new();

	let _dispose = list_added(
		&list,
		{
			let mock = mock.clone();
			move |added: Vec<Rc<Item>>, _| mock.get().flushed(ids(&added))
		},
		Duration::ZERO,
	)
	.unwrap();

	mock.get().expect_flushed().with(predicate::eq(vec![1])).times(1).return_const(());
	list.push(item(1));
	mock.get().checkpoint();

	mock.get().expect_flushed().with(predicate::eq(vec![2])).times(1).return_const(());
	list.push(item(2));
	mock.get().checkpoint();
}

#[test]
fn added_coalesces_a_batch() {
	let list = ObservableVec::from(items([1]));
	let log = Log::new();

	let _dispose = list_added(
		&list,
		{
			let log = log.clone();
			move |added, _| log.push(ids(&added))
		},
		Duration::ZERO,
	)
	.unwrap();

	batch(|| {
		list.push(item(2));
		list.insert(0, item(3)).unwrap();
		list.set(0, item(4)).unwrap();
		list.pop();
		list.extend(items([5, 5]));
	});

	assert_eq!(log.take(), vec![vec![2, 3, 5, 5]]);
}

#[test]
fn removed_reports_splices_and_whole_replacement() {
	let list = ObservableVec::from(items([1, 2, 3]));
	let removed = Log::new();
	let added = Log::new();

	let _removed = list_removed(
		&list,
		{
			let removed = removed.clone();
			move |items, _| removed.push(ids(&items))
		},
		Duration::ZERO,
	)
	.unwrap();
	let _added = list_added(
		&list,
		{
			let added = added.clone();
			move |items, _| added.push(ids(&items))
		},
		Duration::ZERO,
	)
	.unwrap();

	list.pop();
	list.remove(0).unwrap();
	list.replace(items([7, 8]));

	assert_eq!(removed.take(), vec![vec![3], vec![1], vec![2]]);
	assert_eq!(added.take(), vec![vec![7, 8]]);
}

#[test]
fn replaced_keeps_first_old_and_last_new() {
	let list = ObservableVec::from(items([1]));
	let log = Log::new();

	let _dispose = list_replaced(
		&list,
		{
			let log = log.clone();
			move |records, _| log.push(replaced_ids(records))
		},
		Duration::ZERO,
	)
	.unwrap();

	batch(|| {
		list.set(0, item(11)).unwrap();
		list.set(0, item(12)).unwrap();
	});

	assert_eq!(log.take(), vec![vec![(0, 1, 12)]]);

	list.set(0, item(13)).unwrap();
	assert_eq!(log.take(), vec![vec![(0, 12, 13)]]);
}

#[test]
fn replaced_orders_records_by_index() {
	let list = ObservableVec::from(items([1, 2, 3]));
	let log = Log::new();

	let _dispose = list_replaced(
		&list,
		{
			let log = log.clone();
			move |records, _| log.push(replaced_ids(records))
		},
		Duration::ZERO,
	)
	.unwrap();

	batch(|| {
		list.set(2, item(30)).unwrap();
		list.set(0, item(10)).unwrap();
	});

	assert_eq!(log.take(), vec![vec![(0, 1, 10), (2, 3, 30)]]);
}

#[test]
fn replaced_ignores_splices() {
	let list = ObservableVec::from(items([1, 2]));
	let log = Log::new();

	let _dispose = list_replaced(
		&list,
		{
			let log = log.clone();
			move |records: Vec<Replaced<Rc<Item>>>, _| log.push(records.len())
		},
		Duration::ZERO,
	)
	.unwrap();

	list.replace(items([3, 4]));
	list.push(item(5));
	list.pop();
	list.set(2, item(6)).unwrap();

	assert_eq!(log.len(), 0);
}

#[test]
fn dispose_from_inside_callback() {
	let list = ObservableVec::new();
	let log = Log::new();

	let dispose = list_added(
		&list,
		{
			let log = log.clone();
			move |added, dispose| {
				log.push(ids(&added));
				dispose.dispose();
				dispose.dispose();
			}
		},
		Duration::ZERO,
	)
	.unwrap();

	list.push(item(1));
	list.push(item(2));
	batch(|| list.push(item(3)));

	assert_eq!(log.take(), vec![vec![1]]);
	assert!(dispose.is_disposed());
	dispose.dispose();
}

#[test]
fn dispose_inside_batch_drops_pending_changes() {
	let list = ObservableVec::new();
	let log = Log::new();

	let dispose = list_added(
		&list,
		{
			let log = log.clone();
			move |added, _| log.push(ids(&added))
		},
		Duration::ZERO,
	)
	.unwrap();

	batch(|| {
		list.push(item(1));
		dispose.dispose();
		list.push(item(2));
	});

	assert_eq!(log.len(), 0);
}

#[test]
fn panicking_callback_spares_its_siblings() {
	let list = ObservableVec::new();
	let failing = Log::new();
	let sibling = SharedMock::new();

	let _failing = list_added(
		&list,
		{
			let failing = failing.clone();
			move |added: Vec<u32>, _| {
				failing.push(added.clone());
				if added == [1] {
					panic!("first flush fails");
				}
			}
		},
		Duration::ZERO,
	)
	.unwrap();
	let _sibling = list_added(
		&list,
		{
			let sibling = sibling.clone();
			move |added: Vec<u32>, _| sibling.get().flushed(added)
		},
		Duration::ZERO,
	)
	.unwrap();

	for id in 1..=3 {
		sibling.get().expect_flushed().with(predicate::eq(vec![id])).times(1).return_const(());
	}

	let result = panic::catch_unwind(AssertUnwindSafe(|| list.push(1)));
	assert!(result.is_err());
	assert!(!in_batch());

	list.push(2);
	list.push(3);

	assert_eq!(failing.take(), vec![vec![1], vec![2], vec![3]]);
	sibling.get().checkpoint();
}

#[test]
fn delay_collapses_a_window_into_one_flush() {
	let list = ObservableVec::new();
	let log = Log::new();

	let _dispose = list_added(
		&list,
		{
			let log = log.clone();
			move |added, _| log.push((timer::now(), ids(&added)))
		},
		Duration::from_millis(10),
	)
	.unwrap();
	let start = timer::now();

	list.push(item(1));
	timer::advance(Duration::from_millis(4));
	list.push(item(2));
	list.push(item(3));
	timer::advance(Duration::from_millis(5));
	assert_eq!(log.len(), 0);

	timer::advance(Duration::from_millis(1));
	assert_eq!(log.take(), vec![(start + Duration::from_millis(10), vec![1, 2, 3])]);

	list.push(item(4));
	timer::run_until_idle();
	assert_eq!(log.take(), vec![(start + Duration::from_millis(20), vec![4])]);
}

#[test]
fn delayed_flush_is_cancelled_by_dispose() {
	let list = ObservableVec::new();
	let log = Log::new();

	let dispose = list_removed(
		&list,
		{
			let log = log.clone();
			move |removed, _| log.push(ids(&removed))
		},
		Duration::from_millis(10),
	)
	.unwrap();

	list.push(item(1));
	list.pop();
	dispose.dispose();
	timer::run_until_idle();

	assert_eq!(log.len(), 0);
}

#[test]
fn rejects_anything_but_an_observable_list() {
	let plain: Rc<dyn Any> = Rc::new(vec![1, 2, 3]);

	let result = list_added::<i32, _, _>(plain, |_, _| {}, Duration::ZERO);
	let err = result.unwrap_err();

	assert_eq!(err, Error::ExpectedObservableList);
	assert_eq!(err.to_string(), "expected observable list as the first argument");
}

#[test]
fn accepts_an_erased_observable_list() {
	let list = ObservableVec::from(vec![1u32]);
	let erased: Rc<dyn Any> = list.clone().into();
	let log = Log::new();

	let _dispose = list_removed::<u32, _, _>(
		erased,
		{
			let log = log.clone();
			move |removed, _| log.push(removed)
		},
		Duration::ZERO,
	)
	.unwrap();

	list.clear();
	assert_eq!(log.take(), vec![vec![1]]);
}

proptest! {
	#![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

	#[test]
	fn added_delivers_every_insert_once_in_order(
		groups in prop::collection::vec(prop::collection::vec(0u32..100, 0..4), 0..8),
	) {
		let list = ObservableVec::new();
		let log = Log::new();

		let _dispose = list_added(
			&list,
			{
				let log = log.clone();
				move |added: Vec<u32>, _| log.push(added)
			},
			Duration::ZERO,
		)
		.unwrap();

		for group in &groups {
			batch(|| {
				for value in group {
					list.push(*value);
				}
			});
		}

		let flushes = log.take();
		let expected: Vec<u32> = groups.iter().flatten().copied().collect();

		prop_assert_eq!(flushes.len(), groups.iter().filter(|g| !g.is_empty()).count());
		prop_assert_eq!(flushes.into_iter().flatten().collect::<Vec<_>>(), expected);
	}
}
