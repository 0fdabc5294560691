//! One partition of the rename table.

use crate::error::RenameError;
use puppet_types::{ObjectAddress, ObjectName};

/// One reference-counted rename-table slot. `counter == 0` means free.
#[derive(Clone, Copy, Debug, Default)]
struct TableEntry {
    counter: u32,
    address: ObjectAddress,
}

/// Per-object rename request routed to a shard.
#[derive(Clone, Copy, Debug)]
pub struct ShardRenameRequest {
    /// Renamer in-flight slot that issued the request.
    pub txn_slot: usize,
    /// Address to bind.
    pub address: ObjectAddress,
    /// Whether the object belongs to the transaction's write set.
    pub is_write: bool,
}

/// Response to a rename request: the original request plus the outcome.
#[derive(Clone, Copy, Debug)]
pub struct ShardRenameResponse {
    /// The request this answers.
    pub request: ShardRenameRequest,
    /// The bound name, or why binding failed.
    pub outcome: Result<ObjectName, RenameError>,
}

#[derive(Clone, Copy, Debug)]
enum Operation {
    Rename {
        request: ShardRenameRequest,
        attempt: usize,
    },
    // Delete reads the slot one cycle and writes back the next.
    Delete {
        slot: usize,
        write_back: bool,
    },
}

/// One rename-table partition.
///
/// Accepts at most one request at a time. A rename probes one slot per
/// cycle, up to `num_hashes` slots from the address's base key: a free slot
/// allocates, a matching live slot bumps its counter (failing at
/// saturation), and exhausting the probe bound fails. A delete decrements
/// one slot's counter.
#[derive(Clone, Debug)]
pub struct Shard {
    index: u32,
    log_slots: u32,
    num_hashes: usize,
    max_refs: u32,
    entries: Box<[TableEntry]>,
    active: Option<Operation>,
    response: Option<ShardRenameResponse>,
}

impl Shard {
    /// Create shard `index` with `2^log_slots` free slots.
    pub fn new(index: u32, log_slots: u32, num_hashes: usize, max_refs: u32) -> Self {
        Self {
            index,
            log_slots,
            num_hashes,
            max_refs,
            entries: vec![TableEntry::default(); 1 << log_slots].into_boxed_slice(),
            active: None,
            response: None,
        }
    }

    fn slot_mask(&self) -> usize {
        (1 << self.log_slots) - 1
    }

    fn name_of(&self, slot: usize) -> ObjectName {
        ObjectName::new((self.index << self.log_slots) | slot as u32)
    }

    /// True when the shard can accept a request this cycle.
    pub fn ready(&self) -> bool {
        self.active.is_none() && self.response.is_none()
    }

    /// Begin a rename. The caller must have checked [`ready`](Self::ready).
    pub fn put_rename(&mut self, request: ShardRenameRequest) {
        debug_assert!(self.ready());
        self.active = Some(Operation::Rename {
            request,
            attempt: 0,
        });
    }

    /// Begin a delete of `name`'s slot. The caller must have checked
    /// [`ready`](Self::ready) and must only delete names it renamed.
    pub fn put_delete(&mut self, name: ObjectName) {
        debug_assert!(self.ready());
        self.active = Some(Operation::Delete {
            slot: name.as_usize() & self.slot_mask(),
            write_back: false,
        });
    }

    /// Clear every slot and drop any request in flight.
    pub fn reset(&mut self) {
        self.entries.fill(TableEntry::default());
        self.active = None;
        self.response = None;
    }

    /// Take the pending rename response, if any. The shard stalls until the
    /// response is consumed.
    pub fn try_take_response(&mut self) -> Option<ShardRenameResponse> {
        self.response.take()
    }

    /// Advance the in-flight operation by one cycle.
    pub fn tick(&mut self) {
        let Some(op) = self.active.take() else {
            return;
        };
        match op {
            Operation::Rename { request, attempt } => self.probe(request, attempt),
            Operation::Delete {
                slot,
                write_back: false,
            } => {
                self.active = Some(Operation::Delete {
                    slot,
                    write_back: true,
                });
            }
            Operation::Delete {
                slot,
                write_back: true,
            } => {
                let entry = &mut self.entries[slot];
                debug_assert!(entry.counter > 0, "delete on a free rename-table slot");
                entry.counter = entry.counter.saturating_sub(1);
            }
        }
    }

    fn probe(&mut self, request: ShardRenameRequest, attempt: usize) {
        let base = request.address.as_u64() as usize & self.slot_mask();
        let slot = (base + attempt) & self.slot_mask();
        let entry = &mut self.entries[slot];

        let outcome = if entry.counter == 0 {
            *entry = TableEntry {
                counter: 1,
                address: request.address,
            };
            Ok(self.name_of(slot))
        } else if entry.address == request.address {
            if entry.counter < self.max_refs {
                entry.counter += 1;
                Ok(self.name_of(slot))
            } else {
                Err(RenameError::CounterSaturated {
                    address: request.address,
                })
            }
        } else if attempt + 1 == self.num_hashes {
            Err(RenameError::ProbesExhausted {
                address: request.address,
                attempts: self.num_hashes,
            })
        } else {
            self.active = Some(Operation::Rename {
                request,
                attempt: attempt + 1,
            });
            return;
        };
        self.response = Some(ShardRenameResponse { request, outcome });
    }

    /// Reference count currently held for `name`'s slot.
    pub fn ref_count(&self, name: ObjectName) -> u32 {
        self.entries[name.as_usize() & self.slot_mask()].counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard() -> Shard {
        // 8 slots, 8 probes, like the exhaustion scenario.
        Shard::new(0, 3, 8, 1024)
    }

    fn rename(shard: &mut Shard, address: u64) -> ShardRenameResponse {
        assert!(shard.ready());
        shard.put_rename(ShardRenameRequest {
            txn_slot: 0,
            address: ObjectAddress::new(address),
            is_write: false,
        });
        loop {
            shard.tick();
            if let Some(response) = shard.try_take_response() {
                return response;
            }
        }
    }

    fn delete(shard: &mut Shard, name: ObjectName) {
        assert!(shard.ready());
        shard.put_delete(name);
        while !shard.ready() {
            shard.tick();
        }
    }

    // ==================== Rename ====================

    #[test]
    fn test_allocate_fresh_slot() {
        let mut shard = shard();
        let response = rename(&mut shard, 5);
        assert_eq!(response.outcome, Ok(ObjectName::new(5)));
        assert_eq!(shard.ref_count(ObjectName::new(5)), 1);
    }

    #[test]
    fn test_same_address_bumps_counter() {
        let mut shard = shard();
        let first = rename(&mut shard, 5).outcome.unwrap();
        let second = rename(&mut shard, 5).outcome.unwrap();
        assert_eq!(first, second);
        assert_eq!(shard.ref_count(first), 2);
    }

    #[test]
    fn test_collision_probes_to_next_slot() {
        let mut shard = shard();
        // 5 and 13 share base slot 5 in an 8-slot shard.
        let first = rename(&mut shard, 5).outcome.unwrap();
        let second = rename(&mut shard, 13).outcome.unwrap();
        assert_eq!(first, ObjectName::new(5));
        assert_eq!(second, ObjectName::new(6));
    }

    #[test]
    fn test_probe_wraps_around_shard() {
        let mut shard = shard();
        // Base slot 7: the second colliding address wraps to slot 0.
        let first = rename(&mut shard, 7).outcome.unwrap();
        let second = rename(&mut shard, 15).outcome.unwrap();
        assert_eq!(first, ObjectName::new(7));
        assert_eq!(second, ObjectName::new(0));
    }

    #[test]
    fn test_probing_exhaustion() {
        let mut shard = shard();
        // Nine distinct addresses with base slot 0 in an 8-slot shard.
        for i in 0..8 {
            assert!(rename(&mut shard, i * 8).outcome.is_ok());
        }
        let response = rename(&mut shard, 64);
        assert_eq!(
            response.outcome,
            Err(RenameError::ProbesExhausted {
                address: ObjectAddress::new(64),
                attempts: 8,
            })
        );
    }

    #[test]
    fn test_release_reopens_exhausted_shard() {
        let mut shard = shard();
        let mut names = Vec::new();
        for i in 0..8 {
            names.push(rename(&mut shard, i * 8).outcome.unwrap());
        }
        assert!(rename(&mut shard, 64).outcome.is_err());

        delete(&mut shard, names[3]);
        assert!(rename(&mut shard, 64).outcome.is_ok());
    }

    #[test]
    fn test_counter_saturation() {
        let mut shard = Shard::new(0, 3, 8, 2);
        let name = rename(&mut shard, 1).outcome.unwrap();
        assert!(rename(&mut shard, 1).outcome.is_ok());
        assert_eq!(shard.ref_count(name), 2);

        let response = rename(&mut shard, 1);
        assert_eq!(
            response.outcome,
            Err(RenameError::CounterSaturated {
                address: ObjectAddress::new(1),
            })
        );
        assert_eq!(shard.ref_count(name), 2);
    }

    #[test]
    fn test_probe_takes_one_cycle_per_slot() {
        let mut shard = shard();
        rename(&mut shard, 0);
        rename(&mut shard, 8);

        // Third colliding address: slots 0 and 1 are taken, so the rename
        // resolves on its third probe cycle.
        shard.put_rename(ShardRenameRequest {
            txn_slot: 0,
            address: ObjectAddress::new(16),
            is_write: false,
        });
        shard.tick();
        assert!(shard.try_take_response().is_none());
        shard.tick();
        assert!(shard.try_take_response().is_none());
        shard.tick();
        let response = shard.try_take_response().unwrap();
        assert_eq!(response.outcome, Ok(ObjectName::new(2)));
    }

    // ==================== Delete ====================

    #[test]
    fn test_rename_delete_restores_slot() {
        let mut shard = shard();
        let name = rename(&mut shard, 5).outcome.unwrap();
        assert_eq!(shard.ref_count(name), 1);

        delete(&mut shard, name);
        assert_eq!(shard.ref_count(name), 0);

        // The freed slot is allocatable again.
        assert_eq!(rename(&mut shard, 21).outcome, Ok(ObjectName::new(5)));
    }

    #[test]
    fn test_delete_takes_two_cycles() {
        let mut shard = shard();
        let name = rename(&mut shard, 5).outcome.unwrap();

        shard.put_delete(name);
        shard.tick();
        assert!(!shard.ready());
        assert_eq!(shard.ref_count(name), 1);
        shard.tick();
        assert!(shard.ready());
        assert_eq!(shard.ref_count(name), 0);
    }

    // ==================== Reset ====================

    #[test]
    fn test_reset_clears_all_slots() {
        let mut shard = shard();
        for i in 0..4 {
            rename(&mut shard, i);
        }
        shard.reset();
        for i in 0..4 {
            assert_eq!(shard.ref_count(ObjectName::new(i)), 0);
        }
        assert!(shard.ready());
    }

    #[test]
    fn test_name_encodes_shard_index() {
        let mut shard = Shard::new(3, 3, 8, 1024);
        let response = rename(&mut shard, 2);
        // Shard 3, slot 2: name 0b11_010.
        assert_eq!(response.outcome, Ok(ObjectName::new(26)));
    }
}
