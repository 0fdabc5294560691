//! Host-visible event stream.

use crate::ids::TxId;
use crate::Cycle;
use std::fmt;

/// What happened to a transaction on a puppet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    /// The transaction began executing.
    Started,
    /// The transaction finished executing.
    Finished,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Started => f.write_str("Started"),
            TransactionStatus::Finished => f.write_str("Finished"),
        }
    }
}

/// One timestamped entry in the event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionEvent {
    /// Transaction identifier.
    pub tid: TxId,
    /// Edge observed on the puppet's busy flag.
    pub status: TransactionStatus,
    /// Cycle counter value when the edge was observed.
    pub timestamp: Cycle,
}

impl fmt::Display for TransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02x} at {}",
            self.status,
            self.tid.as_u64(),
            self.timestamp
        )
    }
}
