//! Batched change detection over observable lists and maps.
//!
//! The crate ships a small reactive core ([`Var`], [`Reaction`], [`batch`])
//! and two observable collections ([`ObservableVec`], [`ObservableMap`]).
//! On top of them sit the delta batchers, which turn the raw change stream
//! of a collection into one deduplicated delivery per notification wave,
//! and the per-item managers, which keep one reaction per present item.

pub mod macros;

mod addr;
mod batch;
mod collections;
mod delta;
mod dependencies;
mod error;
mod evaluation;
mod hashed;
mod items;
mod reaction;
pub mod timer;
mod var;

use std::rc::Weak;

pub use addr::{Addr, Identity, RcAddr};
pub use batch::{batch, in_batch};
pub use collections::{
	IntoObservableMap, IntoObservableVec, ListChange, MapChange, ObservableMap, ObservableVec,
	Subscription, WeakObservableMap, WeakObservableVec,
};
pub use delta::list::{list_added, list_removed, list_replaced, Replaced};
pub use delta::map::{map_added, map_removed, map_replaced, map_updated, MapEntry, MapUpdate};
pub use delta::Disposer;
pub use error::{Error, Result};
pub use evaluation::Evaluation;
pub use items::list::list_item_changed;
pub use items::map::map_item_changed;
pub use reaction::{react, Reaction, ReactionOptions};
pub use var::{Toggle, Var};

pub(crate) trait Derived: 'static {
	fn invalidate(&self);
}

pub(crate) trait Observable: 'static {
	/// Notify this observable that `derived` started
	/// to listen.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// Notify this observable that `derived` stopped
	/// to listen.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}
