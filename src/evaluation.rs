use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::dependencies::Dependencies;
use crate::{Derived, Observable};

/// Tracking context of a single reaction run.
///
/// Every tracked read made through it subscribes the running
/// reaction to the observable that was read.
pub struct Evaluation {
	inner: RefCell<EvaluationInner>,
	parent: Weak<dyn Derived>,
}

impl AsRef<Evaluation> for Evaluation {
	fn as_ref(&self) -> &Evaluation {
		self
	}
}

struct EvaluationInner {
	dependencies: Dependencies,
}

impl Evaluation {
	pub(crate) fn new(parent: Weak<dyn Derived>) -> Self {
		Evaluation {
			parent,
			inner: RefCell::new(EvaluationInner {
				dependencies: Dependencies::new(),
			}),
		}
	}

	pub(crate) fn parent(&self) -> Weak<dyn Derived> {
		self.parent.clone()
	}

	pub(crate) fn based_on(&self, observable: Rc<dyn Observable>) {
		self.inner.borrow_mut().dependencies.based_on(observable);
	}

	pub(crate) fn take(self) -> Dependencies {
		self.inner.into_inner().dependencies
	}
}
