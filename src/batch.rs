use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Weak;

thread_local! {
	static STARTED: Cell<bool> = const { Cell::new(false) };
	static CHANGED: RefCell<Vec<Weak<dyn Reactive>>> = const { RefCell::new(Vec::new()) };
}

/// Something that re-runs when the outermost batch closes.
pub(crate) trait Reactive {
	fn update(&self);
}

pub fn in_batch() -> bool {
	STARTED.with(|s| s.get())
}

/// Runs `func` as one transaction.
///
/// Reactions invalidated inside run once, after the outermost
/// batch returns.
pub fn batch<R>(func: impl FnOnce() -> R) -> R {
	if !batch_start() {
		return func();
	}

	let root = Root;
	let result = func();
	drop(root);
	batch_run();
	result
}

/// Closes the root batch, also when `func` unwinds.
struct Root;

impl Drop for Root {
	fn drop(&mut self) {
		batch_stop();
	}
}

pub(crate) fn schedule(reactive: Weak<dyn Reactive>) {
	CHANGED.with(|c| c.borrow_mut().push(reactive));
}

fn batch_start() -> bool {
	STARTED.with(|s| !s.replace(true))
}

fn batch_stop() {
	STARTED.with(|s| s.set(false));
}

/// Drains the queue. A reaction that panics does not stop the rest of the
/// wave; the first panic is resumed once the queue is empty.
fn batch_run() {
	let mut failure = None;

	loop {
		let changed = CHANGED.with(|c| std::mem::take(&mut *c.borrow_mut()));
		if changed.is_empty() {
			break;
		}

		for reaction in changed {
			let Some(reactive) = reaction.upgrade() else {
				continue;
			};
			if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| reactive.update())) {
				if failure.is_some() {
					tracing::error!("reaction panicked while an earlier panic is pending");
				} else {
					failure = Some(payload);
				}
			}
		}
	}

	if let Some(payload) = failure {
		panic::resume_unwind(payload);
	}
}
