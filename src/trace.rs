//! Feature-gated tracing macros.
//!
//! Decode, suppression and the full pipeline report through these macros.
//! Counters passed to `trace_event!` are still evaluated when the feature is
//! off, so they must not panic.

/// Info span for one stage: `grid_decode`, `suppress_duplicates` or
/// `postprocess`. Without the feature it yields a [`NoopSpan`], so the
/// `.entered()` guard at each stage compiles either way.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Stage summary such as kept/discarded slot counts or zeroed scores.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Per-slot decode details at debug level.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)+) => {
        tracing::debug!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)+) => {};
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Guard returned by `trace_span!` when the `tracing` feature is off.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// No-op counterpart of `tracing::Span::entered`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
