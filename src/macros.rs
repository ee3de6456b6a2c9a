pub use enclose::*;

/// Builds a [`Reaction`](crate::Reaction) whose body captures clones of
/// the listed handles.
///
/// ```ignore
/// let r = reaction!((count, log) cx => log.borrow_mut().push(*count.get(cx)));
/// r.update();
/// ```
#[macro_export]
macro_rules! reaction {
    (( $($d_tt:tt)* ) $ctx:ident => $($b:tt)*) => {
        $crate::Reaction::new($crate::macros::enclose!(($( $d_tt )*) Box::new(move |$ctx: &$crate::Evaluation, _: &$crate::Reaction| { $($b)* })))
    };
    ($ctx:ident => $($b:tt)*) => {
        $crate::Reaction::new(Box::new(move |$ctx: &$crate::Evaluation, _: &$crate::Reaction| { $($b)* }))
    };
}
