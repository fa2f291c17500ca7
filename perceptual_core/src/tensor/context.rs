use serde::{Deserialize, Serialize};

/// Number of elements above which reductions are split across the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 16;

/// Execution handle threaded through every loss and penalty call.
///
/// Holds the settings a tensor backend would otherwise keep in ambient global
/// state. The context is read-only, so one instance can be shared between
/// threads and reused across training steps.
///
/// # Examples
///
/// ```
/// use perceptual_core::EvalContext;
///
/// let ctx = EvalContext::default();
/// assert!(ctx.should_parallelize(1 << 20));
///
/// let serial = EvalContext::sequential();
/// assert!(!serial.should_parallelize(1 << 20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalContext {
    /// Reductions over more elements than this run in parallel
    pub parallel_threshold: usize,
}

impl EvalContext {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Context that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
        }
    }

    pub fn should_parallelize(&self, len: usize) -> bool {
        len > self.parallel_threshold
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}
