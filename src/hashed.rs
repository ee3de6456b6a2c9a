use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

/// A value stored next to its `fxhash`, which serves as its version.
pub(crate) struct Hashed<T> {
	pub value: T,
	pub hash: u64,
}

impl<T: Hash> Hashed<T> {
	pub fn new(value: T) -> Self {
		let hash = fxhash::hash64(&value);
		Self { value, hash }
	}

	/// Recomputes the hash, returning whether it moved.
	pub fn rehash(&mut self) -> bool {
		let hash = fxhash::hash64(&self.value);
		std::mem::replace(&mut self.hash, hash) != hash
	}
}

impl<T> Deref for Hashed<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.value
	}
}

impl<T: Debug> Debug for Hashed<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.value.fmt(f)
	}
}
