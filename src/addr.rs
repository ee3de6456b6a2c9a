use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Address of a heap allocation, used as an object identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Addr(usize);

impl Addr {
	fn of<T: ?Sized>(ptr: *const T) -> Self {
		Addr(ptr as *const () as usize)
	}
}

/// Types whose values have an object identity independent of their contents.
///
/// Two clones of the same `Rc` share one identity; two structurally equal
/// values in separate allocations do not.
pub trait Identity {
	fn identity(&self) -> Addr;
}

impl<T: ?Sized> Identity for Rc<T> {
	fn identity(&self) -> Addr {
		Addr::of(Rc::as_ptr(self))
	}
}

impl<T: ?Sized> Identity for RcAddr<T> {
	fn identity(&self) -> Addr {
		Addr::of(Rc::as_ptr(&self.ptr))
	}
}

/// An `Rc` compared, ordered and hashed by address.
///
/// Use it as a map key when object keys must keep their identity.
pub struct RcAddr<T: ?Sized> {
	ptr: Rc<T>,
}

impl<T: ?Sized> RcAddr<T> {
	pub fn new(ptr: Rc<T>) -> Self {
		RcAddr { ptr }
	}

	pub fn into_inner(self) -> Rc<T> {
		self.ptr
	}
}

impl<T> From<T> for RcAddr<T> {
	fn from(value: T) -> Self {
		RcAddr::new(Rc::new(value))
	}
}

impl<T: ?Sized> Clone for RcAddr<T> {
	fn clone(&self) -> Self {
		RcAddr {
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for RcAddr<T> {
	type Target = Rc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for RcAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.identity() == other.identity()
	}
}

impl<T: ?Sized> Eq for RcAddr<T> {}

impl<T: ?Sized> Hash for RcAddr<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.identity().hash(state)
	}
}

impl<T: ?Sized> Ord for RcAddr<T> {
	fn cmp(&self, other: &Self) -> Ordering {
		self.identity().cmp(&other.identity())
	}
}

impl<T: ?Sized> PartialOrd for RcAddr<T> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<T: ?Sized + Debug> Debug for RcAddr<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.ptr.fmt(f)
	}
}

pub(crate) struct WeakAddr<T: ?Sized> {
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakAddr<T> {
	pub fn new(ptr: Weak<T>) -> Self {
		WeakAddr { ptr }
	}
}

impl<T: ?Sized> Deref for WeakAddr<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		Addr::of(Weak::as_ptr(&self.ptr)) == Addr::of(Weak::as_ptr(&other.ptr))
	}
}

impl<T: ?Sized> Eq for WeakAddr<T> {}
