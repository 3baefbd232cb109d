//! The fallible-function contract at the leaf boundary.
//!
//! Every caller-supplied parser, renderer and factory is erased into one of
//! the `Dyn*` aliases below when the mapping is built. Totally-defined
//! functions (`Fn(&str) -> V`, `Fn(&V) -> String`) and `Result`-returning
//! functions are adapted into the `Option` contract at that point, once.
//!
//! At call time the engine runs leaf functions through [`guarded`], which
//! turns a panic into an ordinary failure when the `std` feature is enabled.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;

use crate::composite::ComponentValues;

// -----------------------------------------------------------------------------
// Erased leaf functions

pub(crate) type DynParser = Arc<dyn Fn(&str) -> Option<Box<dyn Any>> + Send + Sync>;

pub(crate) type DynRenderer = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;

pub(crate) type DynCompositeParser =
    Arc<dyn Fn(&ComponentValues<'_>) -> Option<Box<dyn Any>> + Send + Sync>;

pub(crate) type DynFactory = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

pub(crate) fn erase_parser<V, F>(parser: F) -> DynParser
where
    V: 'static,
    F: Fn(&str) -> Option<V> + Send + Sync + 'static,
{
    Arc::new(move |input: &str| parser(input).map(|value| Box::new(value) as Box<dyn Any>))
}

pub(crate) fn erase_renderer<V, F>(renderer: F) -> DynRenderer
where
    V: 'static,
    F: Fn(&V) -> Option<String> + Send + Sync + 'static,
{
    Arc::new(move |value: &dyn Any| value.downcast_ref::<V>().and_then(&renderer))
}

pub(crate) fn erase_composite_parser<V, F>(parser: F) -> DynCompositeParser
where
    V: 'static,
    F: Fn(&ComponentValues<'_>) -> Option<V> + Send + Sync + 'static,
{
    Arc::new(move |components: &ComponentValues<'_>| {
        parser(components).map(|value| Box::new(value) as Box<dyn Any>)
    })
}

pub(crate) fn erase_factory<V, F>(factory: F) -> DynFactory
where
    V: 'static,
    F: Fn() -> V + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Any>)
}

// -----------------------------------------------------------------------------
// Adapters

/// Adapts a total parser: every returned value is a success.
#[inline]
pub(crate) fn total<A: ?Sized + 'static, V: 'static>(
    f: impl Fn(&A) -> V + Send + Sync + 'static,
) -> impl Fn(&A) -> Option<V> + Send + Sync + 'static {
    move |input: &A| Some(f(input))
}

/// Adapts a `Result`-returning parser: any error is a failure.
#[inline]
pub(crate) fn fallible<A: ?Sized + 'static, V: 'static, E: 'static>(
    f: impl Fn(&A) -> Result<V, E> + Send + Sync + 'static,
) -> impl Fn(&A) -> Option<V> + Send + Sync + 'static {
    move |input: &A| f(input).ok()
}

// -----------------------------------------------------------------------------
// Fault capture

/// Runs one caller-supplied leaf function.
///
/// A panic inside `f` is reported through `log` and turned into `None`.
/// `key` names the node the function belongs to.
#[cfg(feature = "std")]
pub(crate) fn guarded<R>(key: &str, f: impl FnOnce() -> Option<R>) -> Option<R> {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string panic payload>");
            log::warn!("leaf function for key `{key}` panicked and was treated as a failure: {message}");
            None
        }
    }
}

/// Runs one caller-supplied leaf function.
///
/// Without `std` panics cannot be captured and abort the call.
#[cfg(not(feature = "std"))]
#[inline(always)]
pub(crate) fn guarded<R>(_key: &str, f: impl FnOnce() -> Option<R>) -> Option<R> {
    f()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{erase_parser, erase_renderer, fallible, guarded, total};
    use alloc::string::{String, ToString};
    use core::any::Any;

    #[test]
    fn adapters() {
        let parser = erase_parser(fallible(|s: &str| s.parse::<i32>()));
        assert_eq!(
            parser("12").and_then(|v| v.downcast::<i32>().ok()).map(|v| *v),
            Some(12)
        );
        assert!(parser("twelve").is_none());

        let renderer = erase_renderer(total(|v: &i32| v.to_string()));
        assert_eq!(renderer(&7_i32 as &dyn Any), Some(String::from("7")));
        // Wrong value type is a failure, not a panic.
        assert_eq!(renderer(&7_u8 as &dyn Any), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panics_become_failures() {
        let result: Option<i32> = guarded("Name", || panic!("boom"));
        assert_eq!(result, None);

        let result = guarded("Name", || Some(3));
        assert_eq!(result, Some(3));
    }
}
