//! Crate-wide error type.
//!
//! Most of the core's operations are asynchronous and fire-and-forget by
//! design (see `spec.md` §7): a relay to an unknown receiver is a silent
//! drop, not an `Err`. The handful of operations that *can* fail
//! synchronously for the caller funnel through [`Error`].

/// A specialized [`Result`] type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents all error cases surfaced synchronously by the crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// `Bundle::run_scheduler` was invoked a second time on a bundle that
    /// already has a running scheduler. The second call is a logged no-op
    /// rather than a hard error, but is represented here for callers that
    /// construct a `Bundle` directly instead of going through `Universe`.
    #[error("scheduler for bundle {bundle_id} is already running")]
    SchedulerAlreadyRunning { bundle_id: u32 },

    /// `BundleSpace::spawn_fiber_in_specific_bundle` targeted a bundle id
    /// that the coordinator has no thread for.
    #[error("no such bundle: {bundle_id}")]
    UnknownBundle { bundle_id: u32 },

    /// The coordinator thread or a bundle thread has already shut down;
    /// the command could not be posted.
    #[error("transport to {target} is closed")]
    TransportClosed { target: String },

    /// CPU core count could not be determined for `inflate`.
    #[error("failed to detect available parallelism: {0}")]
    ParallelismDetection(#[from] std::io::Error),
}
