//! Transaction records in their pre- and post-rename forms.

use crate::access::AccessSet;
use crate::ids::{ObjectAddress, ObjectName, TxId};
use crate::nameset::NameSet;
use thiserror::Error;

/// Maximum read objects (and, separately, write objects) per transaction.
pub const MAX_OBJECTS_PER_SET: usize = 8;

/// Number of object slots in a submitted transaction (reads plus writes).
pub const INPUT_OBJECT_SLOTS: usize = 2 * MAX_OBJECTS_PER_SET;

/// Errors building an input transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// More read objects than the transaction format can carry.
    #[error("too many read objects: {0} (limit {MAX_OBJECTS_PER_SET})")]
    TooManyReads(usize),

    /// More write objects than the transaction format can carry.
    #[error("too many write objects: {0} (limit {MAX_OBJECTS_PER_SET})")]
    TooManyWrites(usize),
}

/// One object slot as submitted by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Object {
    /// Whether this slot carries an address at all.
    pub valid: bool,
    /// Whether the object belongs to the write set (read set otherwise).
    pub write: bool,
    /// The object address.
    pub address: ObjectAddress,
}

impl Object {
    /// A valid read slot.
    pub fn read(address: ObjectAddress) -> Self {
        Self {
            valid: true,
            write: false,
            address,
        }
    }

    /// A valid write slot.
    pub fn write(address: ObjectAddress) -> Self {
        Self {
            valid: true,
            write: true,
            address,
        }
    }
}

/// A submitted transaction: declared read and write addresses, not yet
/// renamed.
///
/// Slot ordering carries no meaning; reads and writes are distinguished
/// purely by the `write` flag of each submitted [`Object`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputTransaction {
    tid: TxId,
    reads: [ObjectAddress; MAX_OBJECTS_PER_SET],
    writes: [ObjectAddress; MAX_OBJECTS_PER_SET],
    read_count: usize,
    write_count: usize,
}

impl InputTransaction {
    /// Create a transaction with no objects.
    pub fn new(tid: TxId) -> Self {
        Self {
            tid,
            reads: [ObjectAddress::default(); MAX_OBJECTS_PER_SET],
            writes: [ObjectAddress::default(); MAX_OBJECTS_PER_SET],
            read_count: 0,
            write_count: 0,
        }
    }

    /// Build a transaction from host object slots, in any order.
    ///
    /// Invalid slots are skipped.
    pub fn from_objects(tid: TxId, objects: &[Object]) -> Result<Self, TransactionError> {
        let mut txn = Self::new(tid);
        for obj in objects.iter().filter(|obj| obj.valid) {
            if obj.write {
                txn.add_write(obj.address)?;
            } else {
                txn.add_read(obj.address)?;
            }
        }
        Ok(txn)
    }

    /// Declare a read of `address`.
    pub fn add_read(&mut self, address: ObjectAddress) -> Result<(), TransactionError> {
        if self.read_count == MAX_OBJECTS_PER_SET {
            return Err(TransactionError::TooManyReads(self.read_count + 1));
        }
        self.reads[self.read_count] = address;
        self.read_count += 1;
        Ok(())
    }

    /// Declare a write of `address`.
    pub fn add_write(&mut self, address: ObjectAddress) -> Result<(), TransactionError> {
        if self.write_count == MAX_OBJECTS_PER_SET {
            return Err(TransactionError::TooManyWrites(self.write_count + 1));
        }
        self.writes[self.write_count] = address;
        self.write_count += 1;
        Ok(())
    }

    /// Transaction identifier.
    pub fn tid(&self) -> TxId {
        self.tid
    }

    /// The valid read addresses.
    pub fn reads(&self) -> &[ObjectAddress] {
        &self.reads[..self.read_count]
    }

    /// The valid write addresses.
    pub fn writes(&self) -> &[ObjectAddress] {
        &self.writes[..self.write_count]
    }

    /// Total number of valid objects.
    pub fn object_count(&self) -> usize {
        self.read_count + self.write_count
    }
}

/// A transaction after renaming: its object addresses bound to compact
/// names.
///
/// Besides the read/write bit-sets used for conflict detection, the record
/// keeps one name entry per successful per-object rename. Deletes are issued
/// per entry, so an address renamed twice by the same transaction is also
/// released twice, keeping the rename-table reference counts balanced.
#[derive(Clone, Debug)]
pub struct RenamedTransaction {
    tid: TxId,
    read_set: NameSet,
    write_set: NameSet,
    names: Vec<ObjectName>,
}

impl RenamedTransaction {
    /// Create an empty record for `tid` over a name space of `num_names`.
    pub fn new(tid: TxId, num_names: usize) -> Self {
        Self {
            tid,
            read_set: NameSet::new(num_names),
            write_set: NameSet::new(num_names),
            names: Vec::new(),
        }
    }

    /// Record one successful per-object rename.
    pub fn record(&mut self, name: ObjectName, is_write: bool) {
        if is_write {
            self.write_set.insert(name);
        } else {
            self.read_set.insert(name);
        }
        self.names.push(name);
    }

    /// Transaction identifier.
    pub fn tid(&self) -> TxId {
        self.tid
    }

    /// Names read, as a bit-set.
    pub fn read_set(&self) -> &NameSet {
        &self.read_set
    }

    /// Names written, as a bit-set.
    pub fn write_set(&self) -> &NameSet {
        &self.write_set
    }

    /// Every recorded name, with multiplicity.
    pub fn names(&self) -> &[ObjectName] {
        &self.names
    }

    /// The read/write sets as a standalone access set.
    pub fn access_set(&self) -> AccessSet {
        AccessSet {
            reads: self.read_set.clone(),
            writes: self.write_set.clone(),
        }
    }
}
