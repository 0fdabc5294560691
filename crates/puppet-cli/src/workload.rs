//! Synthetic workload generators.
//!
//! Each generated transaction declares 8 reads and 8 writes. Reads are
//! always private to the transaction; the write-set pattern decides who
//! conflicts with whom.

use puppet_types::{InputTransaction, ObjectAddress, TxId, MAX_OBJECTS_PER_SET};

/// Address distance between consecutive transactions' object blocks.
pub const DEFAULT_STRIDE: u64 = 2 * MAX_OBJECTS_PER_SET as u64;

/// Write-set pattern of a generated transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessPattern {
    /// Writes private to each transaction; nothing conflicts.
    Disjoint,
    /// Even/odd neighbors share their write set.
    EvenOddPairs,
    /// All even transactions share one write set, all odd another.
    ConflictingHalves,
    /// Every transaction writes the same hot set.
    SharedHotSet,
}

/// Generate one transaction of the given pattern.
pub fn synthetic(pattern: AccessPattern, tid: u64, stride: u64) -> InputTransaction {
    let mut txn = InputTransaction::new(TxId::new(tid));
    let write_base = match pattern {
        AccessPattern::Disjoint => stride * tid,
        AccessPattern::EvenOddPairs => stride * (tid & !1),
        AccessPattern::ConflictingHalves => stride * (tid & 1),
        AccessPattern::SharedHotSet => 2 * MAX_OBJECTS_PER_SET as u64,
    };
    for j in 0..MAX_OBJECTS_PER_SET as u64 {
        let _ = txn.add_read(ObjectAddress::new(stride * tid + 2 * j));
        let _ = txn.add_write(ObjectAddress::new(write_base + 2 * j + 1));
    }
    txn
}

/// The default workload: transaction `i` draws its pattern from `i mod 4`.
pub fn mixed(count: u64) -> Vec<InputTransaction> {
    (0..count)
        .map(|tid| {
            let pattern = match tid % 4 {
                0 => AccessPattern::Disjoint,
                1 => AccessPattern::EvenOddPairs,
                2 => AccessPattern::ConflictingHalves,
                _ => AccessPattern::SharedHotSet,
            };
            synthetic(pattern, tid, DEFAULT_STRIDE)
        })
        .collect()
}

/// A workload where every transaction uses the same pattern.
pub fn uniform(pattern: AccessPattern, count: u64) -> Vec<InputTransaction> {
    (0..count)
        .map(|tid| synthetic(pattern, tid, DEFAULT_STRIDE))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_reads_and_writes_interleave() {
        let txn = synthetic(AccessPattern::Disjoint, 1, DEFAULT_STRIDE);
        let reads: Vec<u64> = txn.reads().iter().map(|a| a.as_u64()).collect();
        let writes: Vec<u64> = txn.writes().iter().map(|a| a.as_u64()).collect();
        assert_eq!(reads, vec![16, 18, 20, 22, 24, 26, 28, 30]);
        assert_eq!(writes, vec![17, 19, 21, 23, 25, 27, 29, 31]);
    }

    #[test]
    fn test_pairs_share_writes() {
        let even = synthetic(AccessPattern::EvenOddPairs, 2, DEFAULT_STRIDE);
        let odd = synthetic(AccessPattern::EvenOddPairs, 3, DEFAULT_STRIDE);
        assert_eq!(even.writes(), odd.writes());
        assert_ne!(even.reads(), odd.reads());
    }

    #[test]
    fn test_halves_share_writes_by_parity() {
        let a = synthetic(AccessPattern::ConflictingHalves, 0, DEFAULT_STRIDE);
        let b = synthetic(AccessPattern::ConflictingHalves, 2, DEFAULT_STRIDE);
        let c = synthetic(AccessPattern::ConflictingHalves, 1, DEFAULT_STRIDE);
        assert_eq!(a.writes(), b.writes());
        assert_ne!(a.writes(), c.writes());
    }

    #[test]
    fn test_hot_set_shared_by_all() {
        let a = synthetic(AccessPattern::SharedHotSet, 0, DEFAULT_STRIDE);
        let b = synthetic(AccessPattern::SharedHotSet, 7, DEFAULT_STRIDE);
        assert_eq!(a.writes(), b.writes());
    }

    #[test]
    fn test_mixed_workload_shape() {
        let txns = mixed(32);
        assert_eq!(txns.len(), 32);
        for (i, txn) in txns.iter().enumerate() {
            assert_eq!(txn.tid().as_u64(), i as u64);
            assert_eq!(txn.reads().len(), MAX_OBJECTS_PER_SET);
            assert_eq!(txn.writes().len(), MAX_OBJECTS_PER_SET);
        }
    }
}
