//! The pull contract every stage implements, and the adapters around it.

use core::iter::FusedIterator;
use core::ops::Range;

use crate::error::{Error, UsageError};
use crate::seq::Seq;
use crate::Result;

// ============================================================
// Contracts
// ============================================================

/// Single-use iteration state.
///
/// `advance` attempts to produce the next element:
///
/// - `Ok(Some(v))` - the cursor moved and `v` is the current element
/// - `Ok(None)` - the cursor is exhausted
/// - `Err(e)` - producing the element failed
///
/// A failed `advance` must leave the cursor past the failing element, so
/// calling `advance` again resumes with the next one. Calling `advance`
/// after exhaustion is allowed but the result is unspecified; every cursor
/// in this crate keeps returning `Ok(None)`.
///
/// Resources are released by dropping the cursor.
pub trait Cursor {
    type Item;

    fn advance(&mut self) -> Result<Option<Self::Item>>;

    /// Cursors never restart. Always fails with [`UsageError::Reset`].
    fn reset(&mut self) -> Result<()> {
        Err(Error::new(UsageError::Reset))
    }
}

/// Re-iterable description of a lazy computation.
///
/// Every call to [`cursor`](Enumerable::cursor) creates fresh, independent
/// iteration state; nothing mutable is shared between two cursors.
pub trait Enumerable {
    type Item;
    type Cursor: Cursor<Item = Self::Item>;

    fn cursor(&self) -> Self::Cursor;
}

/// One-shot conversion into a cursor.
///
/// This is what a flat-map collection selector returns. `Option<I>` is the
/// absent inner sequence: `None` converts into a cursor with no elements.
pub trait IntoCursor {
    type Item;
    type Cursor: Cursor<Item = Self::Item>;

    fn into_cursor(self) -> Self::Cursor;
}

// ============================================================
// Plain iterators as cursors
// ============================================================

/// Cursor over an infallible iterator.
#[derive(Debug, Clone)]
pub struct Items<I> {
    iter: I,
}

impl<I> Items<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I: Iterator> Cursor for Items<I> {
    type Item = I::Item;

    #[inline]
    fn advance(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }
}

impl<I: Iterator> IntoCursor for Items<I> {
    type Item = I::Item;
    type Cursor = Self;

    fn into_cursor(self) -> Self {
        self
    }
}

/// Wrap an iterator so a flat-map selector can return it.
pub fn items<I: IntoIterator>(iter: I) -> Items<I::IntoIter> {
    Items::new(iter.into_iter())
}

impl<T> IntoCursor for Vec<T> {
    type Item = T;
    type Cursor = Items<std::vec::IntoIter<T>>;

    fn into_cursor(self) -> Self::Cursor {
        Items::new(self.into_iter())
    }
}

impl<T, const N: usize> IntoCursor for [T; N] {
    type Item = T;
    type Cursor = Items<core::array::IntoIter<T, N>>;

    fn into_cursor(self) -> Self::Cursor {
        Items::new(self.into_iter())
    }
}

impl<A> IntoCursor for Range<A>
where
    Range<A>: Iterator<Item = A>,
{
    type Item = A;
    type Cursor = Items<Range<A>>;

    fn into_cursor(self) -> Self::Cursor {
        Items::new(self)
    }
}

// ============================================================
// Absent inner sequences
// ============================================================

/// Cursor for an `Option<I>`: empty when the sequence is absent.
#[derive(Debug, Clone)]
pub struct Maybe<C> {
    inner: Option<C>,
}

impl<C: Cursor> Cursor for Maybe<C> {
    type Item = C::Item;

    #[inline]
    fn advance(&mut self) -> Result<Option<C::Item>> {
        match self.inner.as_mut() {
            Some(cursor) => cursor.advance(),
            None => Ok(None),
        }
    }
}

impl<I: IntoCursor> IntoCursor for Option<I> {
    type Item = I::Item;
    type Cursor = Maybe<I::Cursor>;

    fn into_cursor(self) -> Self::Cursor {
        Maybe {
            inner: self.map(IntoCursor::into_cursor),
        }
    }
}

// ============================================================
// Sequences as inner sequences
// ============================================================

impl<S: Enumerable> IntoCursor for Seq<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn into_cursor(self) -> S::Cursor {
        self.cursor()
    }
}

impl<S: Enumerable> IntoCursor for &Seq<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn into_cursor(self) -> S::Cursor {
        self.cursor()
    }
}

// ============================================================
// Consumer adapter
// ============================================================

/// Iterator over a cursor, yielding `Result<T>`.
///
/// The first unhandled error ends iteration: after yielding it, `next`
/// returns `None`.
#[derive(Debug)]
pub struct Iter<C> {
    cursor: C,
    done: bool,
}

impl<C> Iter<C> {
    pub fn new(cursor: C) -> Self {
        Self { cursor, done: false }
    }

    /// Whether the iterator has stopped, by exhaustion or by an error.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Give back the underlying cursor.
    pub fn into_cursor(self) -> C {
        self.cursor
    }
}

impl<C: Cursor> Iterator for Iter<C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<C: Cursor> FusedIterator for Iter<C> {}
