//! Pipeline stages.
//!
//! Each stage is a pair: an immutable [`Enumerable`](crate::Enumerable) that
//! owns its upstream stage, and the [`Cursor`](crate::Cursor) it creates per
//! iteration. Stages share their callables with their cursors through an
//! `Arc`, so cursors never borrow from the sequence that made them.

use core::panic::Location;

use crate::error::{Error, Frame, StageKind};

pub mod catch;
pub mod filter;
pub mod flat_map;
pub mod map;
pub mod source;

pub use catch::{Catch, CatchCursor, Handler, Intercept, Intercepted, NoGuard, NoSubstitute};
pub use filter::{Filter, FilterCursor};
pub use flat_map::{FlatMap, FlatMapCursor, FlatMapWith, FlatMapWithCursor};
pub use map::{Map, MapCursor};
pub use source::{Empty, Results, ResultsCursor, Singleton, Source};

/// Error mapper that records the stage a callable failed in.
#[inline]
pub(crate) fn raised_in(stage: StageKind, location: &'static Location<'static>) -> impl FnOnce(Error) -> Error {
    move |e| e.raised_at(Frame::new(stage, location))
}
