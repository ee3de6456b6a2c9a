use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::addr::{Addr, Identity, WeakAddr};
use crate::batch::batch;
use crate::evaluation::Evaluation;
use crate::hashed::Hashed;
use crate::{Derived, Observable};

/// Shared observable cell.
///
/// Reads through an [`Evaluation`] subscribe the running reaction. Writes
/// notify subscribers when the hash of the value moves, and each write
/// is its own batch unless it happens inside an enclosing one.
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

struct VarBody<T> {
	value: RefCell<Hashed<T>>,
	inner: RefCell<VarInner<T>>,
}

struct VarInner<T> {
	used_by: Vec<WeakAddr<dyn Derived>>,
	this: Weak<VarBody<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + Hash + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		Var {
			body: Rc::new_cyclic(|this| VarBody {
				value: RefCell::new(Hashed::new(value)),
				inner: RefCell::new(VarInner {
					used_by: Vec::new(),
					this: this.clone(),
				}),
			}),
		}
	}

	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Ref<'_, T> {
		self.body.get(eval.as_ref())
	}

	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		Ref::map(self.body.value.borrow(), |v| &v.value)
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		batch(|| self.body.replace(value))
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		batch(|| self.body.update(func))
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Hash,
	{
		self.update(T::toggle)
	}
}

impl<T: 'static> VarBody<T> {
	fn get<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		let this = self.inner.borrow().this.upgrade();
		if let Some(this) = this {
			eval.based_on(this);
			self.used_by(eval.parent());
		}

		Ref::map(self.value.borrow(), |v| &v.value)
	}

	fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		let changed = {
			let mut value = self.value.borrow_mut();
			func(&mut value.value);
			value.rehash()
		};

		if changed {
			self.invalidate()
		}
	}

	fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		let new = Hashed::new(value);
		let hash = new.hash;
		let old = std::mem::replace(&mut *self.value.borrow_mut(), new);
		if old.hash != hash {
			self.invalidate();
		}

		old.value
	}

	fn invalidate(&self) {
		let used_by: SmallVec<[Rc<dyn Derived>; 4]> = self
			.inner
			.borrow()
			.used_by
			.iter()
			.filter_map(|d| d.upgrade())
			.collect();

		for item in used_by {
			item.invalidate()
		}
	}
}

impl<T: 'static> Observable for VarBody<T> {
	fn used_by(&self, derived: Weak<dyn Derived>) {
		let derived = WeakAddr::new(derived);
		let mut inner = self.inner.borrow_mut();
		if !inner.used_by.contains(&derived) {
			inner.used_by.push(derived);
		}
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		let derived = WeakAddr::new(derived.clone());
		self.inner.borrow_mut().used_by.retain(|d| *d != derived);
	}
}

impl<T> Identity for Var<T> {
	fn identity(&self) -> Addr {
		self.body.identity()
	}
}

impl<T> Hash for Var<T> {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		state.write_u64(self.body.value.borrow().hash);
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
