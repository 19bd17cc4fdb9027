//! Rewrite pass configuration
//!
//! Controls how a [`crate::Rewriter`] schedules work and which safety checks it performs.
//! None of the options change which references are renamed.

/// Configuration of a rewrite pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriterConfig {
    /// Process selected files on the rayon thread pool instead of one after another
    pub parallel: bool,

    /// Clear the output directory before a full rebuild so outputs of deleted inputs never
    /// survive
    pub clean_on_full_rebuild: bool,

    /// Reject class files whose declared name differs from the name derived from their path
    pub verify_class_names: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            clean_on_full_rebuild: true,
            verify_class_names: true,
        }
    }
}

impl RewriterConfig {
    /// Processes files on the calling thread, in path order
    ///
    /// Useful for debugging and for reproducible log output.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Leaves existing outputs in place on full rebuilds and skips the declared-name check
    ///
    /// **Warning**: Outputs of deleted inputs survive a full rebuild with this configuration.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            parallel: true,
            clean_on_full_rebuild: false,
            verify_class_names: false,
        }
    }
}
