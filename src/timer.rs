//! Timers behind reaction debounce.
//!
//! Native targets keep a thread-local queue on a virtual clock that the
//! host advances from its event loop. On `wasm32` tasks go to the host
//! `setTimeout`.

use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use self::queue::{advance, now, pending, run_until_idle};

/// Runs `task` once, `delay` from now.
pub fn schedule(delay: Duration, task: impl FnOnce() + 'static) {
	tracing::trace!(?delay, "timer scheduled");
	imp::schedule(delay, Box::new(task))
}

#[cfg(not(target_arch = "wasm32"))]
use self::queue as imp;

#[cfg(not(target_arch = "wasm32"))]
mod queue {
	use std::cell::RefCell;
	use std::collections::BTreeMap;
	use std::time::Duration;

	type Task = Box<dyn FnOnce()>;

	#[derive(Default)]
	struct Timers {
		now: Duration,
		seq: u64,
		queue: BTreeMap<(Duration, u64), Task>,
	}

	thread_local! {
		static TIMERS: RefCell<Timers> = RefCell::new(Timers::default());
	}

	pub(super) fn schedule(delay: Duration, task: Task) {
		TIMERS.with(|t| {
			let mut t = t.borrow_mut();
			let deadline = t.now + delay;
			let seq = t.seq;
			t.seq += 1;
			t.queue.insert((deadline, seq), task);
		})
	}

	/// Time elapsed on the virtual clock of this thread.
	pub fn now() -> Duration {
		TIMERS.with(|t| t.borrow().now)
	}

	/// Number of tasks waiting for their deadline.
	pub fn pending() -> usize {
		TIMERS.with(|t| t.borrow().queue.len())
	}

	/// Moves the clock forward by `by`, running every task that falls due
	/// on the way, in deadline order. Tasks scheduled by those tasks run
	/// too when their deadline is within the window.
	pub fn advance(by: Duration) {
		let target = now() + by;
		while let Some(task) = pop_due(target) {
			task();
		}
		TIMERS.with(|t| t.borrow_mut().now = target);
	}

	/// Advances the clock until no task is left.
	pub fn run_until_idle() {
		loop {
			let next = TIMERS.with(|t| t.borrow().queue.keys().next().map(|(d, _)| *d));
			match next {
				Some(deadline) => advance(deadline.saturating_sub(now())),
				None => break,
			}
		}
	}

	fn pop_due(target: Duration) -> Option<Task> {
		TIMERS.with(|t| {
			let mut t = t.borrow_mut();
			let entry = t.queue.first_entry()?;
			let (deadline, _) = *entry.key();
			if deadline > target {
				return None;
			}
			let task = entry.remove();
			t.now = deadline;
			Some(task)
		})
	}
}

#[cfg(target_arch = "wasm32")]
mod imp {
	use std::time::Duration;

	use wasm_bindgen::prelude::*;

	#[wasm_bindgen]
	extern "C" {
		#[wasm_bindgen(js_name = setTimeout)]
		fn set_timeout(closure: &JsValue, millis: f64) -> JsValue;
	}

	pub(super) fn schedule(delay: Duration, task: Box<dyn FnOnce()>) {
		let _ = set_timeout(
			&Closure::once_into_js(move || task()),
			delay.as_secs_f64() * 1000.0,
		);
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	#[test]
	fn tasks_run_in_deadline_order() {
		let log = Rc::new(RefCell::new(Vec::new()));
		for (name, ms) in [("c", 30), ("a", 10), ("b", 10)] {
			let log = log.clone();
			schedule(Duration::from_millis(ms), move || log.borrow_mut().push((name, now())));
		}

		advance(Duration::from_millis(5));
		assert!(log.borrow().is_empty());
		assert_eq!(pending(), 3);

		advance(Duration::from_millis(5));
		assert_eq!(
			*log.borrow(),
			vec![("a", Duration::from_millis(10)), ("b", Duration::from_millis(10))]
		);

		run_until_idle();
		assert_eq!(log.borrow().len(), 3);
		assert_eq!(now(), Duration::from_millis(30));
		assert_eq!(pending(), 0);
	}

	#[test]
	fn task_can_schedule_follow_up() {
		let hits = Rc::new(RefCell::new(0));
		let outer = hits.clone();
		schedule(Duration::from_millis(1), move || {
			*outer.borrow_mut() += 1;
			let inner = outer.clone();
			schedule(Duration::from_millis(1), move || *inner.borrow_mut() += 1);
		});

		advance(Duration::from_millis(2));
		assert_eq!(*hits.borrow(), 2);
	}
}
