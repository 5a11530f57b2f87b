//! Flattening stage.
//!
//! Both variants drive two cursors: the outer cursor over the upstream stage,
//! and an inner cursor over whatever the collection selector returned for the
//! current outer element. One `advance` keeps cycling
//!
//! 1. pull the inner cursor, if there is one; a value is the output
//! 2. otherwise drop the inner cursor and pull the outer cursor; exhaustion
//!    there exhausts the stage
//! 3. run the collection selector on the new outer element and start a new
//!    inner cursor
//!
//! until step 1 produces a value or step 2 runs dry. A selector returning
//! `None` starts an empty inner cursor, so the outer element contributes
//! nothing and the loop moves straight on to the next one.
//!
//! The inner cursor is cleared before the selector runs. If the selector
//! fails, the next `advance` resumes with the next outer element.

use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use crate::cursor::{Cursor, Enumerable, IntoCursor};
use crate::error::StageKind;
use crate::stage::raised_in;
use crate::Result;

// ============================================================
// Selector-only variant
// ============================================================

/// Flattens the sequences a selector returns for each upstream element.
///
/// The selector takes the outer element by value together with its outer
/// pull index.
pub struct FlatMap<S, F> {
    upstream: S,
    selector: Arc<F>,
    location: &'static Location<'static>,
}

impl<S, F> FlatMap<S, F> {
    pub(crate) fn new(upstream: S, selector: F, location: &'static Location<'static>) -> Self {
        Self {
            upstream,
            selector: Arc::new(selector),
            location,
        }
    }
}

impl<S: Clone, F> Clone for FlatMap<S, F> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            selector: Arc::clone(&self.selector),
            location: self.location,
        }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for FlatMap<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMap")
            .field("upstream", &self.upstream)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<S, F, I> Enumerable for FlatMap<S, F>
where
    S: Enumerable,
    F: Fn(S::Item, usize) -> Result<I>,
    I: IntoCursor,
{
    type Item = I::Item;
    type Cursor = FlatMapCursor<S::Cursor, F, I>;

    fn cursor(&self) -> Self::Cursor {
        FlatMapCursor {
            outer: self.upstream.cursor(),
            inner: None,
            selector: Arc::clone(&self.selector),
            index: 0,
            location: self.location,
        }
    }
}

pub struct FlatMapCursor<C, F, I: IntoCursor> {
    outer: C,
    inner: Option<I::Cursor>,
    selector: Arc<F>,
    index: usize,
    location: &'static Location<'static>,
}

impl<C, F, I> Cursor for FlatMapCursor<C, F, I>
where
    C: Cursor,
    F: Fn(C::Item, usize) -> Result<I>,
    I: IntoCursor,
{
    type Item = I::Item;

    fn advance(&mut self) -> Result<Option<I::Item>> {
        loop {
            if let Some(inner) = self.inner.as_mut() {
                if let Some(item) = inner.advance()? {
                    return Ok(Some(item));
                }
                self.inner = None;
            }

            let Some(outer) = self.outer.advance()? else {
                return Ok(None);
            };

            let index = self.index;
            self.index += 1;

            let inner = (self.selector)(outer, index).map_err(raised_in(StageKind::FlatMap, self.location))?;
            self.inner = Some(inner.into_cursor());
        }
    }
}

// ============================================================
// Result-projection variant
// ============================================================

/// Flattens with a result selector combining each outer element with every
/// element of its inner sequence.
///
/// The outer element is kept while its inner sequence is drained; both
/// selectors borrow it.
pub struct FlatMapWith<S, F, R> {
    upstream: S,
    selector: Arc<F>,
    project: Arc<R>,
    location: &'static Location<'static>,
}

impl<S, F, R> FlatMapWith<S, F, R> {
    pub(crate) fn new(upstream: S, selector: F, project: R, location: &'static Location<'static>) -> Self {
        Self {
            upstream,
            selector: Arc::new(selector),
            project: Arc::new(project),
            location,
        }
    }
}

impl<S: Clone, F, R> Clone for FlatMapWith<S, F, R> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            selector: Arc::clone(&self.selector),
            project: Arc::clone(&self.project),
            location: self.location,
        }
    }
}

impl<S: fmt::Debug, F, R> fmt::Debug for FlatMapWith<S, F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMapWith")
            .field("upstream", &self.upstream)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<S, F, R, I, U> Enumerable for FlatMapWith<S, F, R>
where
    S: Enumerable,
    F: Fn(&S::Item, usize) -> Result<I>,
    R: Fn(&S::Item, I::Item) -> Result<U>,
    I: IntoCursor,
{
    type Item = U;
    type Cursor = FlatMapWithCursor<S::Cursor, F, R, I>;

    fn cursor(&self) -> Self::Cursor {
        FlatMapWithCursor {
            outer: self.upstream.cursor(),
            current: None,
            inner: None,
            selector: Arc::clone(&self.selector),
            project: Arc::clone(&self.project),
            index: 0,
            location: self.location,
        }
    }
}

pub struct FlatMapWithCursor<C: Cursor, F, R, I: IntoCursor> {
    outer: C,
    current: Option<C::Item>,
    inner: Option<I::Cursor>,
    selector: Arc<F>,
    project: Arc<R>,
    index: usize,
    location: &'static Location<'static>,
}

impl<C, F, R, I, U> Cursor for FlatMapWithCursor<C, F, R, I>
where
    C: Cursor,
    F: Fn(&C::Item, usize) -> Result<I>,
    R: Fn(&C::Item, I::Item) -> Result<U>,
    I: IntoCursor,
{
    type Item = U;

    fn advance(&mut self) -> Result<Option<U>> {
        loop {
            if let (Some(outer), Some(inner)) = (self.current.as_ref(), self.inner.as_mut()) {
                if let Some(item) = inner.advance()? {
                    return (self.project)(outer, item)
                        .map(Some)
                        .map_err(raised_in(StageKind::FlatMap, self.location));
                }
            }
            self.inner = None;

            let Some(outer) = self.outer.advance()? else {
                self.current = None;
                return Ok(None);
            };

            let index = self.index;
            self.index += 1;

            let outer: &C::Item = self.current.insert(outer);
            let inner = (self.selector)(outer, index).map_err(raised_in(StageKind::FlatMap, self.location))?;
            self.inner = Some(inner.into_cursor());
        }
    }
}
