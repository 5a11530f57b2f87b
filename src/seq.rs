//! The sequence type that carries every pipeline operation.

use core::panic::Location;

use crate::cursor::{Enumerable, IntoCursor, Iter};
use crate::error::{Error, Exception};
use crate::stage::catch::{Handler, NoGuard, NoSubstitute, Scope};
use crate::stage::{Catch, Filter, FlatMap, FlatMapWith, Map};
use crate::Result;

/// A lazy, re-iterable sequence whose pulls may fail.
///
/// `Seq` wraps a stage and is the only type the pipeline operations are
/// defined on. Every operation consumes the sequence and returns a new one
/// around a stage that owns the old. Nothing runs until a cursor is pulled.
///
/// User callables may return any `Result<_, E>` with `E: Into<Error>`; the
/// error is converted without losing its concrete type.
///
/// `Seq` is deliberately not `IntoIterator`: iteration goes through
/// [`iter`](Seq::iter), which yields `Result` items.
#[derive(Debug, Clone)]
pub struct Seq<S>(S);

// Lifts a callable's own error type into `Error`.
#[inline]
fn erased<T, E: Into<Error>>(result: core::result::Result<T, E>) -> Result<T> {
    result.map_err(Into::into)
}

impl<S> Seq<S> {
    /// Wrap a stage.
    #[inline]
    pub fn new(stage: S) -> Self {
        Seq(stage)
    }
}

// ============================================================
// Consumption
// ============================================================

impl<S: Enumerable> Seq<S> {
    /// A fresh cursor. Independent of every other cursor of this sequence.
    #[inline]
    pub fn cursor(&self) -> S::Cursor {
        self.0.cursor()
    }

    /// Iterate with `Result` items. Stops after the first unhandled error.
    pub fn iter(&self) -> Iter<S::Cursor> {
        Iter::new(self.cursor())
    }

    /// Collect every element, or fail with the first unhandled error.
    pub fn to_vec(&self) -> Result<Vec<S::Item>> {
        self.iter().collect()
    }
}

// ============================================================
// Transformations
// ============================================================

impl<S: Enumerable> Seq<S> {
    /// Transform each element.
    #[track_caller]
    pub fn map<U, E, F>(self, transform: F) -> Seq<Map<S, impl Fn(S::Item, usize) -> Result<U>>>
    where
        F: Fn(S::Item) -> core::result::Result<U, E>,
        E: Into<Error>,
    {
        let transform = move |item: S::Item, _index: usize| erased(transform(item));
        Seq(Map::new(self.0, transform, Location::caller()))
    }

    /// Transform each element together with its zero-based pull index.
    #[track_caller]
    pub fn map_indexed<U, E, F>(self, transform: F) -> Seq<Map<S, impl Fn(S::Item, usize) -> Result<U>>>
    where
        F: Fn(S::Item, usize) -> core::result::Result<U, E>,
        E: Into<Error>,
    {
        let transform = move |item: S::Item, index: usize| erased(transform(item, index));
        Seq(Map::new(self.0, transform, Location::caller()))
    }

    /// Keep the elements the predicate accepts.
    #[track_caller]
    pub fn filter<E, P>(self, predicate: P) -> Seq<Filter<S, impl Fn(&S::Item, usize) -> Result<bool>>>
    where
        P: Fn(&S::Item) -> core::result::Result<bool, E>,
        E: Into<Error>,
    {
        let predicate = move |item: &S::Item, _index: usize| erased(predicate(item));
        Seq(Filter::new(self.0, predicate, Location::caller()))
    }

    /// Keep the elements the predicate accepts. The index is the element's
    /// position in the upstream sequence.
    #[track_caller]
    pub fn filter_indexed<E, P>(self, predicate: P) -> Seq<Filter<S, impl Fn(&S::Item, usize) -> Result<bool>>>
    where
        P: Fn(&S::Item, usize) -> core::result::Result<bool, E>,
        E: Into<Error>,
    {
        let predicate = move |item: &S::Item, index: usize| erased(predicate(item, index));
        Seq(Filter::new(self.0, predicate, Location::caller()))
    }

    /// Replace each element by the elements of the sequence the selector
    /// returns for it. Returning `None` contributes nothing.
    #[track_caller]
    pub fn flat_map<I, E, F>(self, selector: F) -> Seq<FlatMap<S, impl Fn(S::Item, usize) -> Result<I>>>
    where
        F: Fn(S::Item) -> core::result::Result<I, E>,
        E: Into<Error>,
        I: IntoCursor,
    {
        let selector = move |item: S::Item, _index: usize| erased(selector(item));
        Seq(FlatMap::new(self.0, selector, Location::caller()))
    }

    /// Like [`flat_map`](Seq::flat_map), passing the outer pull index.
    #[track_caller]
    pub fn flat_map_indexed<I, E, F>(self, selector: F) -> Seq<FlatMap<S, impl Fn(S::Item, usize) -> Result<I>>>
    where
        F: Fn(S::Item, usize) -> core::result::Result<I, E>,
        E: Into<Error>,
        I: IntoCursor,
    {
        let selector = move |item: S::Item, index: usize| erased(selector(item, index));
        Seq(FlatMap::new(self.0, selector, Location::caller()))
    }

    /// Flatten, combining every inner element with its outer element.
    ///
    /// ```
    /// use catchable::{result, wrap};
    ///
    /// let pairs = wrap(vec!['a', 'b'])
    ///     .flat_map_with(|_| result::Ok(1..3), |c, n| result::Ok(format!("{c}{n}")));
    /// assert_eq!(pairs.to_vec().unwrap(), vec!["a1", "a2", "b1", "b2"]);
    /// ```
    #[track_caller]
    pub fn flat_map_with<I, U, E1, E2, F, R>(
        self,
        selector: F,
        project: R,
    ) -> Seq<FlatMapWith<S, impl Fn(&S::Item, usize) -> Result<I>, impl Fn(&S::Item, I::Item) -> Result<U>>>
    where
        F: Fn(&S::Item) -> core::result::Result<I, E1>,
        R: Fn(&S::Item, I::Item) -> core::result::Result<U, E2>,
        E1: Into<Error>,
        E2: Into<Error>,
        I: IntoCursor,
    {
        let selector = move |item: &S::Item, _index: usize| erased(selector(item));
        let project = move |item: &S::Item, inner: I::Item| erased(project(item, inner));
        Seq(FlatMapWith::new(self.0, selector, project, Location::caller()))
    }

    /// Like [`flat_map_with`](Seq::flat_map_with), passing the outer pull
    /// index to the collection selector.
    #[track_caller]
    pub fn flat_map_indexed_with<I, U, E1, E2, F, R>(
        self,
        selector: F,
        project: R,
    ) -> Seq<FlatMapWith<S, impl Fn(&S::Item, usize) -> Result<I>, impl Fn(&S::Item, I::Item) -> Result<U>>>
    where
        F: Fn(&S::Item, usize) -> core::result::Result<I, E1>,
        R: Fn(&S::Item, I::Item) -> core::result::Result<U, E2>,
        E1: Into<Error>,
        E2: Into<Error>,
        I: IntoCursor,
    {
        let selector = move |item: &S::Item, index: usize| erased(selector(item, index));
        let project = move |item: &S::Item, inner: I::Item| erased(project(item, inner));
        Seq(FlatMapWith::new(self.0, selector, project, Location::caller()))
    }
}

// ============================================================
// Interception
// ============================================================

impl<S: Enumerable> Seq<S> {
    /// Handle errors of type `X` and drop the failing elements.
    ///
    /// Registering for [`Error`] catches everything.
    ///
    /// ```
    /// use catchable::{from_results, Error};
    ///
    /// let seq = from_results(vec![Ok(1), Err(Error::msg("bad")), Ok(3)])
    ///     .catch(|e: &Error| eprintln!("skipped: {e}"));
    /// assert_eq!(seq.to_vec().unwrap(), vec![1, 3]);
    /// ```
    #[track_caller]
    pub fn catch<X, H>(
        self,
        handler: H,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, NoSubstitute<X, S::Item>>>>
    where
        X: Exception,
        H: Fn(&X),
    {
        let on_error = move |err: &X| -> Result<()> {
            handler(err);
            Ok(())
        };
        let handler = Handler::new(Scope::Root, None, on_error, None);
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Handle errors of type `X` and replace each failing element with a
    /// value computed from the error.
    #[track_caller]
    pub fn catch_replace<X, H, D>(
        self,
        handler: H,
        substitute: D,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, impl Fn(&X) -> Result<S::Item>>>>
    where
        X: Exception,
        H: Fn(&X),
        D: Fn(&X) -> S::Item,
    {
        let on_error = move |err: &X| -> Result<()> {
            handler(err);
            Ok(())
        };
        let substitute = move |err: &X| -> Result<S::Item> { Ok(substitute(err)) };
        let handler = Handler::new(Scope::Root, None, on_error, Some(substitute));
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Handle errors of type `X` and replace each failing element with a
    /// value that does not depend on the error.
    #[track_caller]
    pub fn catch_replace_with<X, H, D>(
        self,
        handler: H,
        substitute: D,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, impl Fn(&X) -> Result<S::Item>>>>
    where
        X: Exception,
        H: Fn(&X),
        D: Fn() -> S::Item,
    {
        let on_error = move |err: &X| -> Result<()> {
            handler(err);
            Ok(())
        };
        let substitute = move |_: &X| -> Result<S::Item> { Ok(substitute()) };
        let handler = Handler::new(Scope::Root, None, on_error, Some(substitute));
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Like [`catch`](Seq::catch) with a handler that can fail. A handler
    /// error propagates past this stage.
    #[track_caller]
    pub fn try_catch<X, E, H>(
        self,
        handler: H,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, NoSubstitute<X, S::Item>>>>
    where
        X: Exception,
        H: Fn(&X) -> core::result::Result<(), E>,
        E: Into<Error>,
    {
        let on_error = move |err: &X| erased(handler(err));
        let handler = Handler::new(Scope::Root, None, on_error, None);
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Like [`catch_replace`](Seq::catch_replace) with a handler and a
    /// substitute that can fail. Either error propagates past this stage.
    #[track_caller]
    pub fn try_catch_replace<X, E1, E2, H, D>(
        self,
        handler: H,
        substitute: D,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, impl Fn(&X) -> Result<S::Item>>>>
    where
        X: Exception,
        H: Fn(&X) -> core::result::Result<(), E1>,
        D: Fn(&X) -> core::result::Result<S::Item, E2>,
        E1: Into<Error>,
        E2: Into<Error>,
    {
        let on_error = move |err: &X| erased(handler(err));
        let substitute = move |err: &X| erased(substitute(err));
        let handler = Handler::new(Scope::Root, None, on_error, Some(substitute));
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Handle errors of type `X` for which `guard` holds and drop the
    /// failing elements. Other errors propagate as if the type did not match.
    #[track_caller]
    pub fn catch_if<X, G, H>(
        self,
        guard: G,
        handler: H,
    ) -> Seq<Catch<S, Handler<X, G, impl Fn(&X) -> Result<()>, NoSubstitute<X, S::Item>>>>
    where
        X: Exception,
        G: Fn(&X) -> bool,
        H: Fn(&X),
    {
        let on_error = move |err: &X| -> Result<()> {
            handler(err);
            Ok(())
        };
        let handler = Handler::new(Scope::Root, Some(guard), on_error, None);
        Seq(Catch::new(self.0, handler, Location::caller()))
    }

    /// Handle the first error of type `X` anywhere in the cause chain and
    /// drop the failing element.
    ///
    /// The handler sees the matching cause, not the root error.
    #[track_caller]
    pub fn catch_any<X, H>(
        self,
        handler: H,
    ) -> Seq<Catch<S, Handler<X, NoGuard<X>, impl Fn(&X) -> Result<()>, NoSubstitute<X, S::Item>>>>
    where
        X: Exception,
        H: Fn(&X),
    {
        let on_error = move |err: &X| -> Result<()> {
            handler(err);
            Ok(())
        };
        let handler = Handler::new(Scope::Chain, None, on_error, None);
        Seq(Catch::new(self.0, handler, Location::caller()))
    }
}
