//! Interception stage.
//!
//! A [`Catch`] stage wraps its upstream pull in a loop. An error that matches
//! the stage's [`Handler`] is handed to the handler and then either replaced
//! by a substitute value or dropped, in which case the loop pulls upstream
//! again. Every cursor in this crate leaves itself past a failing element, so
//! the retry resumes with the next element instead of repeating the failed
//! one. Errors the handler does not match propagate unchanged.
//!
//! Chained catches wrap each other. The stage nearest the source sees an
//! error first, and the first matching stage consumes it.

use core::fmt;
use core::marker::PhantomData;
use core::panic::Location;
use std::sync::Arc;

use crate::cursor::{Cursor, Enumerable};
use crate::error::{Error, Exception, StageKind};
use crate::stage::raised_in;
use crate::Result;

// ============================================================
// Handler registration
// ============================================================

/// Guard type of a registration without a guard.
pub type NoGuard<X> = fn(&X) -> bool;

/// Substitute type of a registration that drops failing elements.
pub type NoSubstitute<X, T> = fn(&X) -> Result<T>;

/// Where a registration looks for its error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The root error only.
    Root,
    /// The root error and its `source()` chain.
    Chain,
}

/// What an interceptor did with a failed pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercepted<T> {
    /// The error is not for this stage.
    Unmatched,
    /// The error was handled and the element dropped.
    Dropped,
    /// The error was handled and the element replaced.
    Replaced(T),
}

/// Decides what a catch stage does with an error.
pub trait Intercept<T> {
    /// `Err` means the handler or substitute itself failed; that error
    /// propagates uncaught by the same stage.
    fn intercept(&self, err: &Error) -> Result<Intercepted<T>>;
}

/// A typed handler registration: error type `X`, scope, optional guard,
/// handler and optional substitute.
pub struct Handler<X, G, H, D> {
    scope: Scope,
    guard: Option<G>,
    on_error: H,
    substitute: Option<D>,
    _catches: PhantomData<fn() -> X>,
}

impl<X, G, H, D> Handler<X, G, H, D> {
    pub(crate) fn new(scope: Scope, guard: Option<G>, on_error: H, substitute: Option<D>) -> Self {
        Self {
            scope,
            guard,
            on_error,
            substitute,
            _catches: PhantomData,
        }
    }
}

impl<T, X, G, H, D> Intercept<T> for Handler<X, G, H, D>
where
    X: Exception,
    G: Fn(&X) -> bool,
    H: Fn(&X) -> Result<()>,
    D: Fn(&X) -> Result<T>,
{
    fn intercept(&self, err: &Error) -> Result<Intercepted<T>> {
        let caught = match self.scope {
            Scope::Root => X::try_catch(err),
            Scope::Chain => X::chain_any(err),
        };
        let Some(caught) = caught else {
            return Ok(Intercepted::Unmatched);
        };
        if let Some(guard) = &self.guard {
            if !guard(caught) {
                return Ok(Intercepted::Unmatched);
            }
        }

        (self.on_error)(caught)?;

        match &self.substitute {
            Some(substitute) => substitute(caught).map(Intercepted::Replaced),
            None => Ok(Intercepted::Dropped),
        }
    }
}

// ============================================================
// Stage
// ============================================================

pub struct Catch<S, H> {
    upstream: S,
    handler: Arc<H>,
    location: &'static Location<'static>,
}

impl<S, H> Catch<S, H> {
    pub(crate) fn new(upstream: S, handler: H, location: &'static Location<'static>) -> Self {
        Self {
            upstream,
            handler: Arc::new(handler),
            location,
        }
    }
}

impl<S: Clone, H> Clone for Catch<S, H> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            handler: Arc::clone(&self.handler),
            location: self.location,
        }
    }
}

impl<S: fmt::Debug, H> fmt::Debug for Catch<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catch")
            .field("upstream", &self.upstream)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<S, H> Enumerable for Catch<S, H>
where
    S: Enumerable,
    H: Intercept<S::Item>,
{
    type Item = S::Item;
    type Cursor = CatchCursor<S::Cursor, H>;

    fn cursor(&self) -> Self::Cursor {
        CatchCursor {
            upstream: self.upstream.cursor(),
            handler: Arc::clone(&self.handler),
            location: self.location,
        }
    }
}

pub struct CatchCursor<C, H> {
    upstream: C,
    handler: Arc<H>,
    location: &'static Location<'static>,
}

impl<C, H> Cursor for CatchCursor<C, H>
where
    C: Cursor,
    H: Intercept<C::Item>,
{
    type Item = C::Item;

    fn advance(&mut self) -> Result<Option<C::Item>> {
        loop {
            let err = match self.upstream.advance() {
                Ok(item) => return Ok(item),
                Err(err) => err,
            };

            let outcome = self
                .handler
                .intercept(&err)
                .map_err(raised_in(StageKind::Catch, self.location))?;

            match outcome {
                Intercepted::Replaced(value) => {
                    tracing::debug!(stage = %self.location, error = %err, "replaced failing element");
                    return Ok(Some(value));
                }
                Intercepted::Dropped => {
                    tracing::debug!(stage = %self.location, error = %err, "dropped failing element");
                }
                Intercepted::Unmatched => {
                    tracing::trace!(stage = %self.location, error = %err, "error not matched, propagating");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StringError;
    use crate::{result, wrap};
    use std::cell::{Cell, RefCell};
    use std::fmt;

    #[derive(Debug, Clone)]
    struct Outer(StringError);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outer: {}", self.0)
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    fn fails_on_odd(x: i32) -> Result<i32> {
        if x % 2 == 1 {
            Err(Error::msg(format!("odd {x}")))
        } else {
            Ok(x)
        }
    }

    #[test]
    fn handler_runs_once_per_failure() {
        let calls = Cell::new(0);
        let seq = wrap(0..6).map(fails_on_odd).catch(|_: &Error| calls.set(calls.get() + 1));
        assert_eq!(seq.to_vec().unwrap(), vec![0, 2, 4]);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn many_consecutive_drops_do_not_recurse() {
        let seq = wrap(0..200_000)
            .map(|x| if x < 199_999 { Err(Error::msg("skip")) } else { Ok(x) })
            .catch(|_: &Error| {});
        assert_eq!(seq.to_vec().unwrap(), vec![199_999]);
    }

    #[test]
    fn substitute_is_delivered_exactly_once() {
        let seq = wrap(0..4).map(fails_on_odd).catch_replace_with(|_: &Error| {}, || -1);
        assert_eq!(seq.to_vec().unwrap(), vec![0, -1, 2, -1]);
    }

    #[test]
    fn handler_runs_before_substitute() {
        let events = RefCell::new(Vec::new());
        let seq = wrap(0..4).map(fails_on_odd).catch_replace(
            |e: &StringError| events.borrow_mut().push(format!("handle {}", e.as_str())),
            |e| {
                events.borrow_mut().push(format!("substitute {}", e.as_str()));
                -1
            },
        );
        assert_eq!(seq.to_vec().unwrap(), vec![0, -1, 2, -1]);
        assert_eq!(
            *events.borrow(),
            vec!["handle odd 1", "substitute odd 1", "handle odd 3", "substitute odd 3"]
        );
    }

    #[test]
    fn replace_variants_call_the_handler() {
        let calls = Cell::new(0);
        let with = wrap(0..4)
            .map(fails_on_odd)
            .catch_replace_with(|_: &Error| calls.set(calls.get() + 1), || 0);
        assert_eq!(with.to_vec().unwrap(), vec![0, 0, 2, 0]);
        assert_eq!(calls.get(), 2);

        calls.set(0);
        let fallible = wrap(0..4).map(fails_on_odd).try_catch_replace(
            |_: &Error| {
                calls.set(calls.get() + 1);
                result::Ok(())
            },
            |_| result::Ok(0),
        );
        assert_eq!(fallible.to_vec().unwrap(), vec![0, 0, 2, 0]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failing_handler_skips_the_substitute() {
        let substitutes = Cell::new(0);
        let seq = wrap(0..3).map(fails_on_odd).try_catch_replace(
            |e: &StringError| Err(Error::msg(format!("handler saw {}", e.as_str()))),
            |_| {
                substitutes.set(substitutes.get() + 1);
                result::Ok(-1)
            },
        );
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance().ok(), Some(Some(0)));

        let err = cursor.advance().unwrap_err();
        assert_eq!(err.message(), "handler saw odd 1");
        assert_eq!(substitutes.get(), 0);

        assert_eq!(cursor.advance().ok(), Some(Some(2)));
        assert_eq!(cursor.advance().ok(), Some(None));
        assert_eq!(substitutes.get(), 0);
    }

    #[test]
    fn pipelines_format_with_debug() {
        let seq = wrap(vec![1, 2]).map(|x| result::Ok(x * 2)).catch(|_: &Error| {});
        let shown = format!("{seq:?}");
        for stage in ["Seq", "Catch", "Map", "Source", "[1, 2]"] {
            assert!(shown.contains(stage), "{shown}");
        }
    }

    #[test]
    fn failing_handler_propagates() {
        let seq = wrap(0..3)
            .map(fails_on_odd)
            .try_catch(|e: &StringError| Err(Error::msg(format!("handler saw {}", e.as_str()))));
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance().ok(), Some(Some(0)));

        let err = cursor.advance().unwrap_err();
        assert_eq!(err.message(), "handler saw odd 1");
        assert_eq!(err.frames().last().map(|f| f.stage), Some(StageKind::Catch));

        assert_eq!(cursor.advance().ok(), Some(Some(2)));
    }

    #[test]
    fn failing_substitute_is_not_caught_by_its_own_stage() {
        let seq = wrap(0..2)
            .map(fails_on_odd)
            .try_catch_replace(|_: &Error| result::Ok(()), |_| Err(Error::msg("no substitute")));
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance().ok(), Some(Some(0)));
        assert_eq!(cursor.advance().unwrap_err().message(), "no substitute");
        assert_eq!(cursor.advance().ok(), Some(None));
    }

    #[test]
    fn guard_decides_the_match() {
        let seq = wrap(vec![1, 3, 5])
            .map(fails_on_odd)
            .catch_if(|e: &StringError| e.as_str() != "odd 3", |_| {});
        let mut iter = seq.iter();
        let err = iter.next().and_then(|r| r.err()).map(|e| e.message());
        assert_eq!(err.as_deref(), Some("odd 3"));
        assert!(iter.next().is_none());
    }

    #[test]
    fn chain_scope_finds_wrapped_errors() {
        let items = vec![Ok(1), Err(Outer(StringError("inner".into()))), Ok(2)];

        let root_only = crate::from_results(items.clone()).catch(|_: &StringError| {});
        assert!(root_only.to_vec().is_err());

        let seen = Cell::new(false);
        let chained = crate::from_results(items).catch_any(|e: &StringError| seen.set(e.as_str() == "inner"));
        assert_eq!(chained.to_vec().unwrap(), vec![1, 2]);
        assert!(seen.get());
    }

    #[test]
    fn intercept_reports_unmatched() {
        let handler: Handler<StringError, NoGuard<StringError>, _, NoSubstitute<StringError, ()>> =
            Handler::new(Scope::Root, None, |_: &StringError| result::Ok(()), None);
        let outcome: Intercepted<()> = handler.intercept(&Error::new(std::fmt::Error)).unwrap();
        assert_eq!(outcome, Intercepted::Unmatched);
    }
}
