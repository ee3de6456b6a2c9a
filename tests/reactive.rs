use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use observe_changes::macros::enclose;
use observe_changes::{batch, in_batch, timer, Evaluation, Reaction, ReactionOptions, Var};

use crate::mock::{SharedMock, Spy};
use crate::support::Log;

#[test]
fn check_invalidation() {
	let a = Var::new(1u64);

	let mock = SharedMock::new();

	let reaction = observe_changes::reaction!((a, mock) cx => {
		mock.get().trigger(*a.get(cx));
	});

	mock.get().expect_trigger().once().return_const(());

	reaction.update();

	mock.get().checkpoint();

	mock.get().expect_trigger().times(0).return_const(());

	batch(|| {
		a.set(1);
	});

	mock.get().checkpoint();

	mock.get().expect_trigger().with(mockall::predicate::eq(2)).once().return_const(());

	a.set(2);

	mock.get().checkpoint();
}

#[test]
fn batch_runs_reactions_once() {
	let a = Var::new(0);
	let b = Var::new(false);
	let log = Log::new();

	let reaction = observe_changes::reaction!((a, b, log) cx => {
		log.push((*a.get(cx), *b.get(cx)));
	});
	reaction.update();

	batch(|| {
		assert!(in_batch());
		a.set(1);
		a.update(|v| *v += 1);
		b.toggle();
	});
	assert!(!in_batch());

	assert_eq!(log.take(), vec![(0, false), (2, true)]);
}

#[test]
fn reaction_drops_stale_dependencies() {
	let flag = Var::new(true);
	let left = Var::new(1);
	let right = Var::new(2);
	let runs = Rc::new(Cell::new(0));

	let reaction = observe_changes::reaction!((flag, left, right, runs) cx => {
		runs.set(runs.get() + 1);
		let _ = if *flag.get(cx) { *left.get(cx) } else { *right.get(cx) };
	});
	reaction.update();

	flag.set(false);
	left.set(10);
	assert_eq!(runs.get(), 2);

	right.set(20);
	assert_eq!(runs.get(), 3);
}

#[test]
fn disposed_reaction_stays_quiet() {
	let a = Var::new(0);
	let runs = Rc::new(Cell::new(0));

	let reaction = Reaction::new(Box::new(enclose!((a, runs) move |cx: &Evaluation, _: &Reaction| {
		runs.set(runs.get() + 1);
		let _ = *a.get(cx);
	})));
	reaction.update();

	reaction.dispose();
	a.set(1);

	assert!(reaction.is_disposed());
	assert_eq!(runs.get(), 1);
}

#[test]
fn delayed_reaction_runs_once_per_window() {
	let a = Var::new(0);
	let log = Log::new();

	let reaction = Reaction::with_options(
		ReactionOptions::named("debounced").delay(Duration::from_millis(3)),
		Box::new(enclose!((a, log) move |cx: &Evaluation, _: &Reaction| log.push(*a.get(cx)))),
	);
	reaction.update();
	assert_eq!(reaction.name(), "debounced");

	a.set(1);
	a.set(2);
	assert_eq!(timer::pending(), 1);

	timer::advance(Duration::from_millis(3));
	a.set(3);
	timer::run_until_idle();

	assert_eq!(log.take(), vec![0, 2, 3]);
}
