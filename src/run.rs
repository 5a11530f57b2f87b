//! Drain a sequence to the end, whatever fails along the way.

use std::cell::RefCell;

use crate::cursor::Cursor;
use crate::error::{AggregateError, Error};
use crate::stage::source::IntoSeq;
use crate::Result;

/// Pull a cursor until it is exhausted, returning the number of elements.
fn drain<C: Cursor>(mut cursor: C) -> Result<usize> {
    let mut count = 0;
    while cursor.advance()?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Consume every element of `source`, collecting each error instead of
/// stopping at it.
///
/// A catch-all stage is attached, so every failing element is skipped.
/// `on_errors` runs once after the sequence is exhausted, and only if at
/// least one error occurred; it receives them in the order they happened.
///
/// ```
/// use catchable::{from_results, run_to_completion, Error};
///
/// let mut failures = 0;
/// run_to_completion(
///     from_results(vec![Ok(1), Err(Error::msg("a")), Err(Error::msg("b"))]),
///     |errors| failures = errors.len(),
/// );
/// assert_eq!(failures, 2);
/// ```
#[track_caller]
pub fn run_to_completion<Q, F>(source: Q, on_errors: F)
where
    Q: IntoSeq,
    F: FnOnce(AggregateError),
{
    let errors = RefCell::new(Vec::new());
    {
        let seq = source.into_seq().catch(|err: &Error| errors.borrow_mut().push(err.clone()));
        let drained = drain(seq.cursor());
        match drained {
            Ok(elements) => tracing::debug!(elements, errors = errors.borrow().len(), "ran sequence to completion"),
            Err(err) => errors.borrow_mut().push(err),
        }
    }

    let errors = errors.into_inner();
    if !errors.is_empty() {
        on_errors(AggregateError::new(errors));
    }
}

/// Consume every element of `source`, discarding all errors.
#[track_caller]
pub fn run_silently<Q: IntoSeq>(source: Q) {
    let seq = source.into_seq().catch(|_: &Error| {});
    match drain(seq.cursor()) {
        Ok(elements) => tracing::debug!(elements, "ran sequence silently"),
        Err(err) => tracing::warn!(error = %err, "silent run stopped early"),
    }
}

/// The runners as methods on anything that converts into a [`Seq`](crate::Seq).
pub trait RunExt: IntoSeq + Sized {
    /// See [`run_to_completion`].
    #[track_caller]
    fn run_to_completion<F: FnOnce(AggregateError)>(self, on_errors: F) {
        run_to_completion(self, on_errors)
    }

    /// See [`run_silently`].
    #[track_caller]
    fn run_silently(self) {
        run_silently(self)
    }
}

impl<Q: IntoSeq> RunExt for Q {}
