use std::rc::{Rc, Weak};

use crate::addr::RcAddr;
use crate::{Derived, Observable};

/// Observables a reaction read during its last run.
#[derive(Default)]
pub(crate) struct Dependencies {
	based_on: Vec<RcAddr<dyn Observable>>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn based_on(&mut self, observable: Rc<dyn Observable>) {
		let observable = RcAddr::new(observable);
		if !self.based_on.contains(&observable) {
			self.based_on.push(observable);
		}
	}

	/// Stops listening to everything.
	pub fn release(&mut self, parent: &Weak<dyn Derived>) {
		for item in self.based_on.drain(..) {
			item.not_used_by(parent)
		}
	}

	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);

		prev.iter()
			.filter(|k| !self.based_on.contains(k))
			.for_each(|k| k.not_used_by(parent));
	}
}
