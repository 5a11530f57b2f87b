//! Filter stage.

use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use crate::cursor::{Cursor, Enumerable};
use crate::error::StageKind;
use crate::stage::raised_in;
use crate::Result;

/// Keeps the upstream elements a predicate accepts.
///
/// The predicate receives the element and its source-order index: every
/// examined element counts, whether it passes, fails or makes the predicate
/// return an error.
pub struct Filter<S, P> {
    upstream: S,
    predicate: Arc<P>,
    location: &'static Location<'static>,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(upstream: S, predicate: P, location: &'static Location<'static>) -> Self {
        Self {
            upstream,
            predicate: Arc::new(predicate),
            location,
        }
    }
}

impl<S: Clone, P> Clone for Filter<S, P> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            predicate: Arc::clone(&self.predicate),
            location: self.location,
        }
    }
}

impl<S: fmt::Debug, P> fmt::Debug for Filter<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("upstream", &self.upstream)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<S, P> Enumerable for Filter<S, P>
where
    S: Enumerable,
    P: Fn(&S::Item, usize) -> Result<bool>,
{
    type Item = S::Item;
    type Cursor = FilterCursor<S::Cursor, P>;

    fn cursor(&self) -> Self::Cursor {
        FilterCursor {
            upstream: self.upstream.cursor(),
            predicate: Arc::clone(&self.predicate),
            index: 0,
            location: self.location,
        }
    }
}

pub struct FilterCursor<C, P> {
    upstream: C,
    predicate: Arc<P>,
    index: usize,
    location: &'static Location<'static>,
}

impl<C, P> Cursor for FilterCursor<C, P>
where
    C: Cursor,
    P: Fn(&C::Item, usize) -> Result<bool>,
{
    type Item = C::Item;

    fn advance(&mut self) -> Result<Option<C::Item>> {
        loop {
            let Some(item) = self.upstream.advance()? else {
                return Ok(None);
            };

            let index = self.index;
            self.index += 1;

            // A predicate error leaves the rest of upstream untouched.
            if (self.predicate)(&item, index).map_err(raised_in(StageKind::Filter, self.location))? {
                return Ok(Some(item));
            }
        }
    }
}
