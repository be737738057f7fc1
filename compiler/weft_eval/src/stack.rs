//! Stack safety for nested evaluation.
//!
//! Module bodies re-enter the driver, and loader hooks can drive a whole
//! file from inside an import, so recursion depth follows the source. The
//! `stacker` crate grows the stack instead of overflowing.
//!
//! For WASM targets where stacker isn't available, the function
//! just calls the closure directly.

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (100KB red zone).
    const RED_ZONE: usize = 100 * 1024;

    /// Stack space to allocate when growing (1MB).
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
