use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::batch::{self, batch, in_batch, Reactive};
use crate::dependencies::Dependencies;
use crate::evaluation::Evaluation;
use crate::{timer, Derived};

/// How a reaction is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionOptions {
	pub name: &'static str,
	/// Debounce window. The reaction re-runs once, `delay` after the first
	/// invalidation of the window, when the [`timer`](crate::timer) queue
	/// reaches that deadline.
	pub delay: Duration,
	/// Run the effect of [`react`] once with the initial value.
	pub fire_immediately: bool,
}

impl Default for ReactionOptions {
	fn default() -> Self {
		ReactionOptions {
			name: "<unnamed>",
			delay: Duration::ZERO,
			fire_immediately: false,
		}
	}
}

impl ReactionOptions {
	pub fn named(name: &'static str) -> Self {
		ReactionOptions {
			name,
			..Default::default()
		}
	}

	pub fn delay(mut self, delay: Duration) -> Self {
		self.delay = delay;
		self
	}

	pub fn fire_immediately(mut self, fire_immediately: bool) -> Self {
		self.fire_immediately = fire_immediately;
		self
	}
}

type Func = Rc<dyn Fn(&Evaluation, &Reaction)>;

/// A tracked side effect.
///
/// The function re-runs after every batch that changed something it read
/// during its previous run. A handle to the reaction itself is passed in,
/// so the function may dispose it mid-run.
#[derive(Clone)]
pub struct Reaction {
	body: Rc<ReactionBody>,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum State {
	Valid,
	Invalid,
}

struct ReactionBody {
	name: &'static str,
	delay: Duration,
	state: Cell<State>,
	running: Cell<bool>,
	scheduled: Cell<bool>,
	disposed: Cell<bool>,
	func: RefCell<Option<Func>>,
	dependencies: RefCell<Dependencies>,
	this: Weak<ReactionBody>,
}

impl Drop for ReactionBody {
	fn drop(&mut self) {
		let refr = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.get_mut().release(&refr)
	}
}

impl Reaction {
	#[must_use]
	pub fn new(func: Box<dyn Fn(&Evaluation, &Reaction)>) -> Self {
		Self::with_options(ReactionOptions::default(), func)
	}

	#[must_use]
	pub fn with_options(options: ReactionOptions, func: Box<dyn Fn(&Evaluation, &Reaction)>) -> Self {
		Reaction {
			body: Rc::new_cyclic(|this| ReactionBody {
				name: options.name,
				delay: options.delay,
				state: Cell::new(State::Invalid),
				running: Cell::new(false),
				scheduled: Cell::new(false),
				disposed: Cell::new(false),
				func: RefCell::new(Some(Rc::from(func))),
				dependencies: RefCell::new(Dependencies::new()),
				this: this.clone(),
			}),
		}
	}

	/// Runs the reaction if something it depends on changed
	/// (or it never ran).
	pub fn update(&self) {
		self.body.run();
	}

	/// Stops the reaction for good. Safe to call repeatedly and from
	/// inside the reaction itself.
	pub fn dispose(&self) {
		self.body.dispose();
	}

	pub fn is_disposed(&self) -> bool {
		self.body.disposed.get()
	}

	pub fn name(&self) -> &'static str {
		self.body.name
	}
}

struct Running<'a>(&'a Cell<bool>);

impl Drop for Running<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl ReactionBody {
	fn run(&self) {
		if self.running.get() {
			return;
		}

		while self.state.get() == State::Invalid && !self.disposed.get() {
			let Some(this) = self.this.upgrade() else {
				return;
			};
			let Some(func) = self.func.borrow().clone() else {
				return;
			};

			self.state.set(State::Valid);
			let parent = self.this.clone() as Weak<dyn Derived>;
			let tracker = Evaluation::new(parent.clone());
			let handle = Reaction { body: this };
			{
				self.running.set(true);
				let _running = Running(&self.running);
				batch(|| func(&tracker, &handle));
			}

			let mut next = tracker.take();
			if self.disposed.get() {
				next.release(&parent);
				return;
			}
			self.dependencies.borrow_mut().swap(next, &parent);

			// delayed reactions invalidated mid-run wait for their timer
			if !self.delay.is_zero() {
				break;
			}
		}
	}

	fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}

		tracing::trace!(name = self.name, "reaction disposed");

		let parent = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.borrow_mut().release(&parent);
		let func = self.func.borrow_mut().take();
		drop(func);
	}

	fn schedule_delayed(&self) {
		if self.scheduled.replace(true) {
			return;
		}

		tracing::trace!(name = self.name, delay = ?self.delay, "reaction delayed");

		let this = self.this.clone();
		timer::schedule(self.delay, move || {
			if let Some(body) = this.upgrade() {
				body.scheduled.set(false);
				body.run();
			}
		});
	}
}

impl Reactive for ReactionBody {
	fn update(&self) {
		self.run();
	}
}

impl Derived for ReactionBody {
	fn invalidate(&self) {
		if self.disposed.get() || self.state.get() == State::Invalid {
			return;
		}

		if !in_batch() {
			panic!("Reaction was updated outside of the `batch` function");
		}

		self.state.set(State::Invalid);

		if !self.delay.is_zero() {
			self.schedule_delayed();
		} else if !self.running.get() {
			batch::schedule(self.this.clone() as Weak<dyn Reactive>);
		}
	}
}

impl std::fmt::Debug for Reaction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reaction")
			.field("name", &self.body.name)
			.field("disposed", &self.body.disposed.get())
			.finish()
	}
}

/// Watches the value produced by `expr` and calls `effect` each time
/// its hash changes.
///
/// `expr` is tracked, `effect` is not. With `fire_immediately` the effect
/// also sees the initial value.
#[must_use]
pub fn react<K, E, F>(expr: E, effect: F, options: ReactionOptions) -> Reaction
where
	K: Hash + 'static,
	E: Fn(&Evaluation) -> K + 'static,
	F: Fn(K, &Reaction) + 'static,
{
	let fire_immediately = options.fire_immediately;
	let last = Cell::new(None::<u64>);

	let reaction = Reaction::with_options(
		options,
		Box::new(move |cx, reaction| {
			let value = expr(cx);
			let hash = fxhash::hash64(&value);
			match last.replace(Some(hash)) {
				None if !fire_immediately => {}
				Some(prev) if prev == hash => {}
				_ => effect(value, reaction),
			}
		}),
	);

	reaction.update();
	reaction
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::Var;

	#[test]
	fn effect_sees_only_changes() {
		let a = Var::new(1);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let _r = react(
			{
				let a = a.clone();
				move |cx| *a.get(cx)
			},
			{
				let seen = seen.clone();
				move |v, _| seen.borrow_mut().push(v)
			},
			ReactionOptions::default(),
		);

		a.set(1);
		a.set(2);
		batch(|| {
			a.set(3);
			a.set(4);
		});

		assert_eq!(*seen.borrow(), vec![2, 4]);
	}

	#[test]
	fn dispose_inside_effect_stops_reaction() {
		let a = Var::new(0);
		let calls = Rc::new(Cell::new(0));

		let r = react(
			{
				let a = a.clone();
				move |cx| *a.get(cx)
			},
			{
				let calls = calls.clone();
				move |_, r| {
					calls.set(calls.get() + 1);
					r.dispose();
					r.dispose();
				}
			},
			ReactionOptions::default(),
		);

		a.set(1);
		a.set(2);

		assert_eq!(calls.get(), 1);
		assert!(r.is_disposed());
	}

	#[test]
	fn fire_immediately_runs_effect_on_creation() {
		let a = Var::new(7);
		let seen = Rc::new(Cell::new(0));

		let _r = react(
			{
				let a = a.clone();
				move |cx| *a.get(cx)
			},
			{
				let seen = seen.clone();
				move |v, _| seen.set(v)
			},
			ReactionOptions::default().fire_immediately(true),
		);

		assert_eq!(seen.get(), 7);
	}
}
