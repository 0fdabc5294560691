//! # puppet-renamer
//!
//! Sharded rename table for the Puppetmaster pipeline.
//!
//! Wide object addresses are bound to compact object names by a
//! reference-counted hash table split into shards, one partition per
//! address prefix. The [`Renamer`] fans per-object requests out across the
//! shards, reassembles out-of-order responses per transaction, and releases
//! names when transactions retire.
//!
//! ## Components
//!
//! - **[`Shard`]**: one partition; open addressing with a bounded linear
//!   probe, one slot examined per cycle.
//! - **[`Arbiter`]**: generic rotating-priority grant, used wherever several
//!   requesters share one port.
//! - **[`Renamer`]**: routing, reassembly, partial-failure cleanup, and
//!   delete fan-out.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arbiter;
mod error;
mod renamer;
mod shard;

pub use arbiter::Arbiter;
pub use error::{RenameError, RenamerFull};
pub use renamer::Renamer;
pub use shard::{Shard, ShardRenameRequest, ShardRenameResponse};
