//! Read/write access sets and conflict detection.

use crate::ids::ObjectName;
use crate::nameset::NameSet;

/// The renamed read and write sets of one or more transactions.
///
/// Two access sets conflict when one reads what the other writes or both
/// write the same name; that single check is the scheduler's merge rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessSet {
    /// Names read.
    pub reads: NameSet,
    /// Names written.
    pub writes: NameSet,
}

impl AccessSet {
    /// Create an empty access set over a name space of `num_names`.
    pub fn new(num_names: usize) -> Self {
        Self {
            reads: NameSet::new(num_names),
            writes: NameSet::new(num_names),
        }
    }

    /// Record a read of `name`.
    pub fn insert_read(&mut self, name: ObjectName) {
        self.reads.insert(name);
    }

    /// Record a write of `name`.
    pub fn insert_write(&mut self, name: ObjectName) {
        self.writes.insert(name);
    }

    /// Check for a read/write or write/write conflict with another set.
    pub fn conflicts_with(&self, other: &AccessSet) -> bool {
        self.reads.intersects(&other.writes)
            || self.writes.intersects(&other.reads)
            || self.writes.intersects(&other.writes)
    }

    /// Union another access set into this one.
    pub fn merge(&mut self, other: &AccessSet) {
        self.reads.union_with(&other.reads);
        self.writes.union_with(&other.writes);
    }

    /// Check if the access set is empty.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: u32) -> ObjectName {
        ObjectName::new(n)
    }

    #[test]
    fn test_read_read_does_not_conflict() {
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        a.insert_read(name(1));
        b.insert_read(name(1));
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
    }

    #[test]
    fn test_read_write_conflict() {
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        a.insert_read(name(1));
        b.insert_write(name(1));
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
    }

    #[test]
    fn test_write_write_conflict() {
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        a.insert_write(name(2));
        b.insert_write(name(2));
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn test_disjoint_sets_do_not_conflict() {
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        a.insert_read(name(1));
        a.insert_write(name(2));
        b.insert_read(name(3));
        b.insert_write(name(4));
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_merge() {
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        a.insert_read(name(1));
        b.insert_read(name(2));
        b.insert_write(name(3));

        a.merge(&b);
        assert!(a.reads.contains(name(1)));
        assert!(a.reads.contains(name(2)));
        assert!(a.writes.contains(name(3)));
    }

    #[test]
    fn test_merged_set_carries_conflicts() {
        // After merging b into a, anything conflicting with b conflicts with a.
        let mut a = AccessSet::new(64);
        let mut b = AccessSet::new(64);
        let mut c = AccessSet::new(64);
        a.insert_write(name(1));
        b.insert_write(name(2));
        c.insert_read(name(2));

        assert!(!a.conflicts_with(&c));
        a.merge(&b);
        assert!(a.conflicts_with(&c));
    }

    #[test]
    fn test_empty() {
        let a = AccessSet::new(64);
        assert!(a.is_empty());
        assert!(!a.conflicts_with(&a));
    }
}
