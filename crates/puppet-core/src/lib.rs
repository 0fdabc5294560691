//! # puppet-core
//!
//! Top level of the Puppetmaster pipeline.
//!
//! [`Puppetmaster`] buffers renamed transactions, runs scheduling
//! tournaments against the set of already-running transactions, dispatches
//! winners to idle [`Puppet`]s, and emits a serialized stream of
//! started/finished events. The whole pipeline advances in lock-step, one
//! logical cycle per [`Puppetmaster::tick`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dispatcher;
mod error;
mod puppet;

pub use dispatcher::Puppetmaster;
pub use error::EnqueueError;
pub use puppet::Puppet;
