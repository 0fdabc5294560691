//! Admission errors at the pipeline boundary.

use puppet_types::InputTransaction;
use thiserror::Error;

/// Returned by [`Puppetmaster::try_enqueue`](crate::Puppetmaster::try_enqueue)
/// when the rename stage has no free in-flight slot; carries the rejected
/// transaction back to the caller.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The pipeline cannot admit more work this cycle.
    #[error("pipeline input is at capacity")]
    Backpressure(InputTransaction),
}
