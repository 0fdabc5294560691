//! Rename failure classification.

use puppet_types::{InputTransaction, ObjectAddress};
use thiserror::Error;

/// Why a per-object rename failed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RenameError {
    /// Every probed slot held a different live address.
    #[error("no rename-table slot for address {address} after {attempts} probes")]
    ProbesExhausted {
        /// The address that could not be bound.
        address: ObjectAddress,
        /// How many slots were probed.
        attempts: usize,
    },

    /// The address is bound, but its reference counter is at the ceiling.
    #[error("reference counter saturated for address {address}")]
    CounterSaturated {
        /// The saturated address.
        address: ObjectAddress,
    },
}

/// Returned by [`Renamer::try_rename`](crate::Renamer::try_rename) when no
/// in-flight slot is free; carries the rejected transaction back to the
/// caller.
#[derive(Debug, Error)]
#[error("renamer is at capacity")]
pub struct RenamerFull(pub InputTransaction);
