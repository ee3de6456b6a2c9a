use std::cell::RefCell;
use std::rc::Rc;

use observe_changes::Var;

pub struct Item {
	pub id: Var<u32>,
}

pub fn item(id: u32) -> Rc<Item> {
	Rc::new(Item { id: Var::new(id) })
}

pub fn items(ids: impl IntoIterator<Item = u32>) -> Vec<Rc<Item>> {
	ids.into_iter().map(item).collect()
}

pub fn ids(items: &[Rc<Item>]) -> Vec<u32> {
	items.iter().map(|i| *i.id.get_once()).collect()
}

/// Shared list of everything a callback saw.
pub struct Log<T>(Rc<RefCell<Vec<T>>>);

impl<T> Clone for Log<T> {
	fn clone(&self) -> Self {
		Log(self.0.clone())
	}
}

impl<T> Log<T> {
	pub fn new() -> Self {
		Log(Rc::new(RefCell::new(Vec::new())))
	}

	pub fn push(&self, value: T) {
		self.0.borrow_mut().push(value)
	}

	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	pub fn take(&self) -> Vec<T> {
		std::mem::take(&mut *self.0.borrow_mut())
	}
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::TRACE)
		.with_test_writer()
		.try_init();
}
