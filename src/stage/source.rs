//! Sources: the pass-through wrapper and the other leaves of a pipeline.

use core::marker::PhantomData;
use core::panic::Location;

use crate::cursor::{Cursor, Enumerable, Items};
use crate::error::{Error, StageKind};
use crate::seq::Seq;
use crate::stage::raised_in;
use crate::Result;

// ============================================================
// Pass-through wrapper
// ============================================================

/// Re-iterable plain sequence. Every cursor iterates a fresh clone.
#[derive(Debug, Clone)]
pub struct Source<I> {
    source: I,
}

impl<I> Enumerable for Source<I>
where
    I: IntoIterator + Clone,
{
    type Item = I::Item;
    type Cursor = Items<I::IntoIter>;

    fn cursor(&self) -> Self::Cursor {
        Items::new(self.source.clone().into_iter())
    }
}

/// Conversion into a [`Seq`].
///
/// Any `IntoIterator + Clone` (vectors, ranges, slices, cloneable iterators)
/// becomes a [`Source`] stage. A `Seq` converts into itself, so wrapping an
/// already wrapped sequence adds no layer.
pub trait IntoSeq {
    type Stage: Enumerable;

    fn into_seq(self) -> Seq<Self::Stage>;
}

impl<I> IntoSeq for I
where
    I: IntoIterator + Clone,
{
    type Stage = Source<I>;

    #[inline]
    fn into_seq(self) -> Seq<Source<I>> {
        Seq::new(Source { source: self })
    }
}

// Doesn't conflict with the blanket impl: Seq is not IntoIterator.
impl<S: Enumerable> IntoSeq for Seq<S> {
    type Stage = S;

    #[inline]
    fn into_seq(self) -> Seq<S> {
        self
    }
}

/// Move a plain sequence into the catchable context.
///
/// ```
/// use catchable::wrap;
///
/// let doubled = wrap(vec![1, 2, 3]).map(|x| catchable::result::Ok(x * 2));
/// assert_eq!(doubled.to_vec().unwrap(), vec![2, 4, 6]);
/// ```
#[inline]
pub fn wrap<Q: IntoSeq>(source: Q) -> Seq<Q::Stage> {
    source.into_seq()
}

// ============================================================
// Singleton and empty
// ============================================================

/// Sequence with exactly one element.
#[derive(Debug, Clone)]
pub struct Singleton<T> {
    value: T,
}

impl<T: Clone> Enumerable for Singleton<T> {
    type Item = T;
    type Cursor = Items<core::iter::Once<T>>;

    fn cursor(&self) -> Self::Cursor {
        Items::new(core::iter::once(self.value.clone()))
    }
}

/// A sequence yielding `value` once per iteration.
#[inline]
pub fn singleton<T: Clone>(value: T) -> Seq<Singleton<T>> {
    Seq::new(Singleton { value })
}

/// Sequence with no elements.
#[derive(Debug)]
pub struct Empty<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Enumerable for Empty<T> {
    type Item = T;
    type Cursor = Items<core::iter::Empty<T>>;

    fn cursor(&self) -> Self::Cursor {
        Items::new(core::iter::empty())
    }
}

/// A sequence with no elements.
#[inline]
pub fn empty<T>() -> Seq<Empty<T>> {
    Seq::new(Empty { _item: PhantomData })
}

// ============================================================
// Fallible source
// ============================================================

/// Re-iterable sequence of results. Each `Err` is a failed pull at its
/// position; the next pull continues with the following item.
#[derive(Debug, Clone)]
pub struct Results<I> {
    source: I,
    location: &'static Location<'static>,
}

impl<I, T, E> Enumerable for Results<I>
where
    I: IntoIterator<Item = core::result::Result<T, E>> + Clone,
    E: Into<Error>,
{
    type Item = T;
    type Cursor = ResultsCursor<I::IntoIter>;

    fn cursor(&self) -> Self::Cursor {
        ResultsCursor {
            iter: self.source.clone().into_iter(),
            location: self.location,
        }
    }
}

pub struct ResultsCursor<J> {
    iter: J,
    location: &'static Location<'static>,
}

impl<J, T, E> Cursor for ResultsCursor<J>
where
    J: Iterator<Item = core::result::Result<T, E>>,
    E: Into<Error>,
{
    type Item = T;

    fn advance(&mut self) -> Result<Option<T>> {
        match self.iter.next() {
            None => Ok(None),
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(e)) => Err(raised_in(StageKind::Source, self.location)(e.into())),
        }
    }
}

/// A sequence over results, where every `Err` item fails its pull.
///
/// ```
/// use catchable::from_results;
/// use std::num::ParseIntError;
///
/// let parsed = from_results(["1", "x", "3"].map(str::parse::<i32>))
///     .catch(|_: &ParseIntError| {});
/// assert_eq!(parsed.to_vec().unwrap(), vec![1, 3]);
/// ```
#[track_caller]
pub fn from_results<I, T, E>(source: I) -> Seq<Results<I>>
where
    I: IntoIterator<Item = core::result::Result<T, E>> + Clone,
    E: Into<Error>,
{
    Seq::new(Results {
        source,
        location: Location::caller(),
    })
}
