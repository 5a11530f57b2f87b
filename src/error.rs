//! Error model: the type-erased error, typed matching and the stage trace.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use smallvec::SmallVec;

// ============================================================
// Core types
// ============================================================

/// Type-erased error carried by a failed pull.
///
/// `Error` holds the value a callable or source returned without translating
/// it, so downcasting always reaches the original error. On top of that it
/// records a short trace of the pipeline stages the error was raised in.
///
/// `Error` does NOT implement `std::error::Error` itself. This keeps
/// `From<E: std::error::Error>` and the blanket [`Exception`] impl from
/// conflicting with the impls for `Error`. Use [`Error::as_dyn_error`] where
/// a trait object is needed.
///
/// Cloning is cheap: the inner error is shared.
#[derive(Debug, Clone)]
pub struct Error {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
    trace: SmallVec<[Frame; INLINE_FRAMES]>,
}

/// Frames stored without a heap allocation.
const INLINE_FRAMES: usize = 4;

/// Maximum number of frames kept in a trace. Further frames are dropped.
pub const TRACE_LIMIT: usize = 32;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StageKind {
    Source,
    Map,
    Filter,
    FlatMap,
    Catch,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Source => "source",
            StageKind::Map => "map",
            StageKind::Filter => "filter",
            StageKind::FlatMap => "flat_map",
            StageKind::Catch => "catch",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an error trace: the stage that raised the error and the
/// source location where that stage was added to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub stage: StageKind,
    pub file: Cow<'static, str>,
    pub line: u32,
    pub col: u32,
}

impl Frame {
    pub(crate) fn new(stage: StageKind, loc: &'static Location<'static>) -> Self {
        Self {
            stage,
            file: Cow::Borrowed(loc.file()),
            line: loc.line(),
            col: loc.column(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}:{}", self.stage, self.file, self.line, self.col)
    }
}

impl Error {
    /// Create from any error type.
    #[inline]
    pub fn new<E: StdError + Send + Sync + 'static>(e: E) -> Self {
        Self {
            inner: Arc::new(e),
            trace: SmallVec::new(),
        }
    }

    /// Create from a message string.
    #[inline]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(StringError(message.into()))
    }

    /// The error message of the underlying error.
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Get the inner error as a plain `dyn Error` (for `source()` chains).
    #[inline]
    pub fn as_dyn_error(&self) -> &(dyn StdError + 'static) {
        self.inner.as_ref()
    }

    /// Try to downcast the root error to a specific type.
    #[inline]
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Whether the root error is of type `T`.
    #[inline]
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Find the first error of type `T`, starting at the root and walking
    /// `std::error::Error::source()`.
    pub fn chain_any<T: StdError + 'static>(&self) -> Option<&T> {
        let mut current: Option<&(dyn StdError + 'static)> = Some(self.as_dyn_error());
        while let Some(err) = current {
            if let Some(e) = err.downcast_ref::<T>() {
                return Some(e);
            }
            current = err.source();
        }
        None
    }

    /// Frames of the stages this error was raised in, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.trace
    }

    /// Number of frames in the trace.
    pub fn depth(&self) -> usize {
        self.trace.len()
    }

    /// Record the stage that raised this error.
    #[inline]
    pub(crate) fn raised_at(mut self, frame: Frame) -> Self {
        if self.trace.len() < TRACE_LIMIT {
            self.trace.push(frame);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)?;

        // `{:#}` appends the trace.
        if f.alternate() && !self.trace.is_empty() {
            write!(f, "\n\nTrace (most recent last):")?;
            for frame in &self.trace {
                write!(f, "\n  {}", frame)?;
            }
        }
        Ok(())
    }
}

// This doesn't conflict with From<T> for T because Error doesn't implement Error
impl<E: StdError + Send + Sync + 'static> From<E> for Error {
    fn from(e: E) -> Self {
        Error::new(e)
    }
}

// ============================================================
// Exception trait - typed views into an Error
// ============================================================

/// Error types a catch stage can be registered for.
///
/// Every `std::error::Error + 'static` type matches when the failed pull
/// carries exactly that type. [`Error`] itself is the root of the hierarchy:
/// registering for it matches every error.
pub trait Exception: 'static {
    /// View of the root error as `Self`, if it is one.
    fn try_catch(err: &Error) -> Option<&Self>;

    /// First error of type `Self` anywhere in the cause chain.
    fn chain_any(err: &Error) -> Option<&Self>;
}

impl<T: StdError + 'static> Exception for T {
    #[inline]
    fn try_catch(err: &Error) -> Option<&T> {
        err.downcast_ref::<T>()
    }

    #[inline]
    fn chain_any(err: &Error) -> Option<&T> {
        err.chain_any::<T>()
    }
}

impl Exception for Error {
    #[inline]
    fn try_catch(err: &Error) -> Option<&Error> {
        Some(err)
    }

    #[inline]
    fn chain_any(err: &Error) -> Option<&Error> {
        Some(err)
    }
}

// ============================================================
// StringError helper
// ============================================================

/// Message-only error created by [`Error::msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringError(pub(crate) String);

impl StringError {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for StringError {}

// ============================================================
// Usage errors
// ============================================================

/// Misuse of the cursor protocol. Reported immediately, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsageError {
    /// A cursor was asked to restart. Request a fresh cursor instead.
    Reset,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::Reset => f.write_str("cursor cannot be reset; request a fresh cursor from the sequence"),
        }
    }
}

impl StdError for UsageError {}

// ============================================================
// AggregateError
// ============================================================

/// Every error intercepted while draining a sequence, in the order they
/// occurred.
#[derive(Debug, Clone)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no errors occurred"),
            [only] => write!(f, "1 error occurred: {}", only),
            [first, rest @ ..] => write!(f, "{} errors occurred, first: {}", rest.len() + 1, first),
        }
    }
}

impl StdError for AggregateError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors.first().map(Error::as_dyn_error)
    }
}

impl IntoIterator for AggregateError {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

// ============================================================
// Serde support
// ============================================================

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct SerializedError {
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        trace: Vec<Frame>,
    }

    impl Serialize for Error {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            SerializedError {
                message: self.message(),
                trace: self.trace.to_vec(),
            }
            .serialize(serializer)
        }
    }

    // The concrete error type is gone after a round-trip; only the message
    // and the trace survive.
    impl<'de> Deserialize<'de> for Error {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let serialized = SerializedError::deserialize(deserializer)?;
            let mut error = Error::msg(serialized.message);
            for frame in serialized.trace {
                error = error.raised_at(frame);
            }
            Ok(error)
        }
    }

    impl Serialize for AggregateError {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeStruct;
            let mut state = serializer.serialize_struct("AggregateError", 2)?;
            state.serialize_field("count", &self.errors.len())?;
            state.serialize_field("errors", &self.errors)?;
            state.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped: {}", self.0)
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn downcast_sees_original_value() {
        let err = Error::new(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.is::<io::Error>());
        assert_eq!(err.downcast_ref::<io::Error>().map(io::Error::kind), Some(io::ErrorKind::NotFound));
        assert!(err.downcast_ref::<StringError>().is_none());
        assert_eq!(err.message(), "missing");
    }

    #[test]
    fn exception_matching_root_and_chain() {
        let err = Error::new(Wrapper(io::Error::new(io::ErrorKind::Other, "inner")));
        assert!(<io::Error as Exception>::try_catch(&err).is_none());
        assert!(<io::Error as Exception>::chain_any(&err).is_some());
        assert!(<Wrapper as Exception>::try_catch(&err).is_some());
        assert!(<Error as Exception>::try_catch(&err).is_some());
    }

    #[test]
    fn trace_is_capped() {
        let loc = Location::caller();
        let mut err = Error::msg("boom");
        for _ in 0..TRACE_LIMIT + 5 {
            err = err.raised_at(Frame::new(StageKind::Map, loc));
        }
        assert_eq!(err.depth(), TRACE_LIMIT);
        assert_eq!(err.to_string(), "boom");
        assert!(format!("{:#}", err).contains("Trace (most recent last):"));
    }

    #[test]
    fn clones_share_the_inner_error() {
        let err = Error::msg("shared");
        let copy = err.clone();
        assert!(Arc::ptr_eq(&err.inner, &copy.inner));
    }

    #[test]
    fn aggregate_display_and_source() {
        let agg = AggregateError::new(vec![Error::msg("first"), Error::msg("second")]);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.to_string(), "2 errors occurred, first: first");
        assert_eq!(agg.source().map(|e| e.to_string()), Some("first".to_string()));

        let single = AggregateError::new(vec![Error::msg("only")]);
        assert_eq!(single.to_string(), "1 error occurred: only");
    }

    #[test]
    fn usage_error_message() {
        let err = Error::new(UsageError::Reset);
        assert_eq!(err.downcast_ref::<UsageError>(), Some(&UsageError::Reset));
    }
}
