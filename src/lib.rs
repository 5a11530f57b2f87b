//! catchable - Lazy sequence pipelines that catch, drop or replace failing elements
//!
//! # Overview
//!
//! `catchable` builds lazy, pull-based pipelines (map / filter / flat-map) in
//! which any element may fail. A failed element carries an [`Error`]; a catch
//! stage can intercept it by type, run a handler, and then either drop the
//! element or replace it with a substitute value. Errors no stage matches
//! reach the consumer.
//!
//! Nothing runs until a cursor is pulled, and every sequence can be iterated
//! again from the start.
//!
//! # Quick Start
//!
//! ```
//! use catchable::{result, wrap};
//! use std::num::ParseIntError;
//!
//! let numbers = wrap(vec!["1", "two", "3"])
//!     .map(|s| s.parse::<i32>())
//!     .catch_replace(|_: &ParseIntError| {}, |_| 0)
//!     .map(|n| result::Ok(n * 10));
//!
//! assert_eq!(numbers.to_vec().unwrap(), vec![10, 0, 30]);
//! ```
//!
//! # Operations
//!
//! ## Sources
//!
//! | Function | Description |
//! |----------|-------------|
//! | `wrap(iterable)` | Any `IntoIterator + Clone`; a `Seq` stays as it is |
//! | `from_results(iterable)` | Each `Err` item fails its pull |
//! | `singleton(value)` | Exactly one element |
//! | `empty()` | No elements |
//!
//! ## Transformations
//!
//! | Method | Description |
//! |--------|-------------|
//! | `.map(f)` / `.map_indexed(f)` | Transform each element |
//! | `.filter(p)` / `.filter_indexed(p)` | Keep accepted elements |
//! | `.flat_map(f)` / `.flat_map_indexed(f)` | Flatten selected sequences; `None` adds nothing |
//! | `.flat_map_with(f, r)` / `.flat_map_indexed_with(f, r)` | Flatten, combining outer and inner |
//!
//! ## Catching
//!
//! | Method | Description |
//! |--------|-------------|
//! | `.catch(\|e: &X\| ..)` | Handle `X`, drop the element |
//! | `.catch_replace(h, \|e\| v)` | Handle `X`, substitute from the error |
//! | `.catch_replace_with(h, \|\| v)` | Handle `X`, substitute a fresh value |
//! | `.try_catch(h)` / `.try_catch_replace(h, s)` | Handler and substitute may fail |
//! | `.catch_if(guard, h)` | Handle `X` only when `guard` holds |
//! | `.catch_any(h)` | Handle `X` anywhere in the cause chain |
//!
//! Catching [`Error`] itself matches every error. Chained catch stages see an
//! error in pipeline order; the first matching stage consumes it.
//!
//! ## Consuming
//!
//! | Function | Description |
//! |----------|-------------|
//! | `.cursor()` | A fresh [`Cursor`] |
//! | `.iter()` | `Iterator<Item = Result<T>>`, ends after the first error |
//! | `.to_vec()` | All elements, or the first unhandled error |
//! | `run_to_completion(seq, f)` | Drain; `f` gets every error as an [`AggregateError`] |
//! | `run_silently(seq)` | Drain, discarding errors |
//!
//! # Error traces
//!
//! When a callable fails, the stage it runs in records a [`Frame`]: the
//! stage kind and the source location where the stage was added. Format an
//! error with `{:#}` to print them.
//!
//! # Features
//!
//! - `serde`: serialize errors and their traces.

// ============================================================
// Modules
// ============================================================

pub mod cursor;
pub mod error;
mod run;
mod seq;
pub mod stage;

// ============================================================
// Re-exports
// ============================================================

pub use cursor::{items, Cursor, Enumerable, IntoCursor, Items, Iter};
pub use error::{AggregateError, Error, Exception, Frame, StageKind, StringError, UsageError, TRACE_LIMIT};
pub use run::{run_silently, run_to_completion, RunExt};
pub use seq::Seq;
pub use stage::source::{empty, from_results, singleton, wrap, IntoSeq};

// ============================================================
// Type aliases
// ============================================================

/// Result type alias.
///
/// - `Result<T>` = `core::result::Result<T, Error>` (type-erased)
/// - `Result<T, io::Error>` = keeps the concrete error type
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// `Ok` and `Err` with the error type fixed to [`Error`], for callables that
/// never fail and would otherwise leave it uninferred.
#[allow(non_snake_case)]
pub mod result {
    use super::Error;

    /// Result type alias for pipeline callables.
    pub type Result<T> = core::result::Result<T, Error>;

    /// Create an `Ok` result.
    #[inline]
    pub fn Ok<T>(v: T) -> Result<T> {
        core::result::Result::Ok(v)
    }

    /// Create an `Err` result with automatic conversion to `Error`.
    #[inline]
    pub fn Err<T>(e: impl Into<Error>) -> Result<T> {
        core::result::Result::Err(e.into())
    }
}
