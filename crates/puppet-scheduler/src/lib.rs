//! # puppet-scheduler
//!
//! Tournament scheduler for the Puppetmaster pipeline.
//!
//! Given a fixed pool of transaction access sets, the scheduler selects a
//! maximal conflict-free subset by merging the pool pairwise over
//! `log2(pool)` rounds. Position 0 carries the union of the already-running
//! transactions and always survives, so winners never conflict with running
//! work.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod tournament;

pub use tournament::{SchedulerBusy, TournamentScheduler, TransactionSet};
