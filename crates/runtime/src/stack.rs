//! Stack growth for the recursive evaluator
//!
//! Every script call nests several evaluator frames on the host stack, so
//! the recursion points run through `ensure_sufficient_stack`. The call
//! depth limit then decides when recursion stops, not the thread's stack
//! size.

/// Grow the stack when less than this remains
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
