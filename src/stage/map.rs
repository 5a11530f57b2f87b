//! Projection stage.

use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use crate::cursor::{Cursor, Enumerable};
use crate::error::StageKind;
use crate::stage::raised_in;
use crate::Result;

/// Applies a transform to every upstream element.
///
/// The transform receives the element and its zero-based pull index. The
/// plain `map` ignores the index.
pub struct Map<S, F> {
    upstream: S,
    transform: Arc<F>,
    location: &'static Location<'static>,
}

impl<S, F> Map<S, F> {
    pub(crate) fn new(upstream: S, transform: F, location: &'static Location<'static>) -> Self {
        Self {
            upstream,
            transform: Arc::new(transform),
            location,
        }
    }
}

impl<S: Clone, F> Clone for Map<S, F> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            transform: Arc::clone(&self.transform),
            location: self.location,
        }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Map<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("upstream", &self.upstream)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<S, F, U> Enumerable for Map<S, F>
where
    S: Enumerable,
    F: Fn(S::Item, usize) -> Result<U>,
{
    type Item = U;
    type Cursor = MapCursor<S::Cursor, F>;

    fn cursor(&self) -> Self::Cursor {
        MapCursor {
            upstream: self.upstream.cursor(),
            transform: Arc::clone(&self.transform),
            index: 0,
            location: self.location,
        }
    }
}

pub struct MapCursor<C, F> {
    upstream: C,
    transform: Arc<F>,
    index: usize,
    location: &'static Location<'static>,
}

impl<C, F, U> Cursor for MapCursor<C, F>
where
    C: Cursor,
    F: Fn(C::Item, usize) -> Result<U>,
{
    type Item = U;

    fn advance(&mut self) -> Result<Option<U>> {
        let Some(item) = self.upstream.advance()? else {
            return Ok(None);
        };

        // Counted at the call, so a failing element still uses up its index.
        let index = self.index;
        self.index += 1;

        (self.transform)(item, index)
            .map(Some)
            .map_err(raised_in(StageKind::Map, self.location))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, StageKind};
    use crate::{result, wrap, Cursor};

    #[test]
    fn maps_every_element_in_order() {
        let seq = wrap(0..5).map(|x| result::Ok(x * 10));
        assert_eq!(seq.to_vec().unwrap(), vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn indexed_counts_pulled_elements() {
        let seq = wrap(vec!['a', 'b', 'c']).map_indexed(|c, idx| result::Ok(format!("{idx}{c}")));
        assert_eq!(seq.to_vec().unwrap(), vec!["0a", "1b", "2c"]);
    }

    #[test]
    fn failing_transform_consumes_its_element() {
        let seq = wrap(0..4).map_indexed(|x, idx| {
            if x == 1 {
                Err(Error::msg("one"))
            } else {
                Ok((x, idx))
            }
        });
        let mut cursor = seq.cursor();
        assert_eq!(cursor.advance().ok(), Some(Some((0, 0))));

        let err = cursor.advance().unwrap_err();
        assert_eq!(err.frames()[0].stage, StageKind::Map);
        assert_eq!(err.frames()[0].file, file!());

        assert_eq!(cursor.advance().ok(), Some(Some((2, 2))));
        assert_eq!(cursor.advance().ok(), Some(Some((3, 3))));
        assert_eq!(cursor.advance().ok(), Some(None));
    }

    #[test]
    fn fresh_cursor_restarts_the_index() {
        let seq = wrap(vec![7, 8]).map_indexed(|_, idx| result::Ok(idx));
        assert_eq!(seq.to_vec().unwrap(), vec![0, 1]);
        assert_eq!(seq.to_vec().unwrap(), vec![0, 1]);
    }
}
