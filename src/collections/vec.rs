use std::any::Any;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use super::{Listeners, Subscription};
use crate::batch::batch;
use crate::error::{Error, Result};

/// One structural change of an [`ObservableVec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
	/// `removed` left and `added` arrived at `index`.
	Splice {
		index: usize,
		removed: Vec<T>,
		added: Vec<T>,
	},
	/// The slot at `index` was overwritten in place.
	Update { index: usize, old: T, new: T },
}

/// A list that reports every structural change to its listeners.
///
/// Each mutating call is one batch; wrap several calls in
/// [`batch`](crate::batch) to make them one notification wave.
pub struct ObservableVec<T> {
	body: Rc<VecBody<T>>,
}

struct VecBody<T> {
	items: RefCell<Vec<T>>,
	listeners: Listeners<ListChange<T>>,
}

pub struct WeakObservableVec<T> {
	body: Weak<VecBody<T>>,
}

impl<T> Clone for ObservableVec<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Clone for WeakObservableVec<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> WeakObservableVec<T> {
	pub fn upgrade(&self) -> Option<ObservableVec<T>> {
		self.body.upgrade().map(|body| ObservableVec { body })
	}
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableVec<T> {
	fn from(items: Vec<T>) -> Self {
		ObservableVec {
			body: Rc::new(VecBody {
				items: RefCell::new(items),
				listeners: Listeners::new(),
			}),
		}
	}
}

impl<T: Clone + 'static> FromIterator<T> for ObservableVec<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self::from(iter.into_iter().collect::<Vec<_>>())
	}
}

impl<T: Clone + 'static> ObservableVec<T> {
	pub fn new() -> Self {
		Self::from(Vec::new())
	}

	pub fn len(&self) -> usize {
		self.body.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get(&self, index: usize) -> Option<T> {
		self.body.items.borrow().get(index).cloned()
	}

	pub fn to_vec(&self) -> Vec<T> {
		self.body.items.borrow().clone()
	}

	/// Borrows the current contents. Do not mutate the list from `func`.
	pub fn with<R>(&self, func: impl FnOnce(&[T]) -> R) -> R {
		func(&self.body.items.borrow())
	}

	pub fn push(&self, value: T) {
		self.splice(usize::MAX, 0, [value]);
	}

	pub fn pop(&self) -> Option<T> {
		let len = self.len();
		if len == 0 {
			return None;
		}
		self.splice(len - 1, 1, []).pop()
	}

	pub fn insert(&self, index: usize, value: T) -> Result<()> {
		self.check(index, self.len())?;
		self.splice(index, 0, [value]);
		Ok(())
	}

	pub fn remove(&self, index: usize) -> Result<T> {
		let len = self.len();
		self.check(index, len.saturating_sub(1))?;
		let mut removed = self.splice(index, 1, []);
		removed.pop().ok_or(Error::IndexOutOfBounds { index, len })
	}

	pub fn extend(&self, items: impl IntoIterator<Item = T>) {
		self.splice(usize::MAX, 0, items);
	}

	/// Swaps the whole contents, reported as one splice.
	pub fn replace(&self, items: Vec<T>) -> Vec<T> {
		self.splice(0, usize::MAX, items)
	}

	pub fn clear(&self) -> Vec<T> {
		self.splice(0, usize::MAX, [])
	}

	/// Overwrites the slot at `index` and returns the previous value.
	/// Writing one past the end appends instead.
	pub fn set(&self, index: usize, value: T) -> Result<Option<T>> {
		let len = self.len();
		if index == len {
			self.push(value);
			return Ok(None);
		}
		self.check(index, len.saturating_sub(1))?;

		let old = {
			let mut items = self.body.items.borrow_mut();
			std::mem::replace(&mut items[index], value.clone())
		};

		batch(|| {
			self.body.listeners.notify(&ListChange::Update {
				index,
				old: old.clone(),
				new: value,
			})
		});

		Ok(Some(old))
	}

	/// Removes up to `delete_count` items starting at `start` and inserts
	/// `items` in their place. Both bounds are clamped to the list.
	pub fn splice(&self, start: usize, delete_count: usize, items: impl IntoIterator<Item = T>) -> Vec<T> {
		let added: Vec<T> = items.into_iter().collect();

		let (index, removed) = {
			let mut current = self.body.items.borrow_mut();
			let index = start.min(current.len());
			let end = index.saturating_add(delete_count).min(current.len());
			let removed: Vec<T> = current.splice(index..end, added.iter().cloned()).collect();
			(index, removed)
		};

		if removed.is_empty() && added.is_empty() {
			return removed;
		}

		let change = ListChange::Splice {
			index,
			removed: removed.clone(),
			added,
		};
		batch(|| self.body.listeners.notify(&change));

		removed
	}

	/// Registers a listener for raw changes, called synchronously during
	/// each mutation.
	pub fn observe(&self, listener: impl Fn(&ListChange<T>) + 'static) -> Subscription {
		self.body.listeners.subscribe(Rc::new(listener))
	}

	pub fn downgrade(&self) -> WeakObservableVec<T> {
		WeakObservableVec {
			body: Rc::downgrade(&self.body),
		}
	}

	fn check(&self, index: usize, last: usize) -> Result<()> {
		if index > last {
			return Err(Error::IndexOutOfBounds {
				index,
				len: self.len(),
			});
		}
		Ok(())
	}
}

impl<T: Debug> Debug for ObservableVec<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.body.items.borrow().iter()).finish()
	}
}

impl<T: 'static> From<ObservableVec<T>> for Rc<dyn Any> {
	fn from(list: ObservableVec<T>) -> Self {
		list.body
	}
}

/// Anything an entry point accepts as its list argument.
///
/// Typed handles always convert; an erased `Rc<dyn Any>` converts only when
/// it holds an `ObservableVec<T>`.
pub trait IntoObservableVec<T> {
	fn into_observable_vec(self) -> Result<ObservableVec<T>>;
}

impl<T> IntoObservableVec<T> for ObservableVec<T> {
	fn into_observable_vec(self) -> Result<ObservableVec<T>> {
		Ok(self)
	}
}

impl<T> IntoObservableVec<T> for &ObservableVec<T> {
	fn into_observable_vec(self) -> Result<ObservableVec<T>> {
		Ok(self.clone())
	}
}

impl<T: 'static> IntoObservableVec<T> for Rc<dyn Any> {
	fn into_observable_vec(self) -> Result<ObservableVec<T>> {
		Rc::downcast::<VecBody<T>>(self)
			.map(|body| ObservableVec { body })
			.map_err(|_| Error::ExpectedObservableList)
	}
}
