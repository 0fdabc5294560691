//! # puppet-types
//!
//! Core data model for the Puppetmaster transaction scheduler.
//!
//! This crate provides the types shared by every pipeline stage: identifier
//! newtypes, fixed-width name bit-vectors, transaction records in their
//! pre- and post-rename forms, the host-visible event stream, and the
//! sizing configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod access;
mod config;
mod event;
mod ids;
mod nameset;
mod transaction;

pub use access::AccessSet;
pub use config::{ConfigError, SystemConfig};
pub use event::{TransactionEvent, TransactionStatus};
pub use ids::{ObjectAddress, ObjectName, TxId};
pub use nameset::NameSet;
pub use transaction::{
    InputTransaction, Object, RenamedTransaction, TransactionError, INPUT_OBJECT_SLOTS,
    MAX_OBJECTS_PER_SET,
};

/// Logical cycle counter type.
pub type Cycle = u64;
