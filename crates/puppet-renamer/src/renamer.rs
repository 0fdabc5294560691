//! Request fan-out across shards and per-transaction reassembly.

use crate::arbiter::Arbiter;
use crate::error::RenamerFull;
use crate::shard::{Shard, ShardRenameRequest};
use puppet_types::{
    InputTransaction, ObjectAddress, ObjectName, RenamedTransaction, SystemConfig,
};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug)]
struct PendingObject {
    address: ObjectAddress,
    is_write: bool,
}

/// A transaction mid-rename: objects not yet issued to a shard, responses
/// still outstanding, and the partially assembled result.
#[derive(Debug)]
struct InFlight {
    seq: u64,
    renamed: RenamedTransaction,
    pending: Vec<PendingObject>,
    outstanding: usize,
    failed: bool,
}

/// The rename stage: routes per-object requests to shards by address
/// prefix, reassembles out-of-order responses per transaction, and fans
/// deletes back out when transactions retire.
///
/// Transactions complete out of order inside the stage but retire in
/// admission order, so downstream buffering sees them as submitted. If any
/// object of a transaction fails to rename, the names that did bind are
/// released and the whole transaction is dropped; a drop does not hold up
/// the transactions admitted after it.
#[derive(Debug)]
pub struct Renamer {
    num_names: usize,
    num_shards: usize,
    log_slots: u32,
    shards: Vec<Shard>,
    slots: Vec<Option<InFlight>>,
    rename_arbiters: Vec<Arbiter>,
    delete_queues: Vec<VecDeque<ObjectName>>,
    // Reorder buffer: completions parked until every earlier admission has
    // completed. `None` marks a dropped transaction.
    completed: BTreeMap<u64, Option<RenamedTransaction>>,
    next_seq: u64,
    retire_seq: u64,
    responses: VecDeque<RenamedTransaction>,
    dropped: u64,
}

impl Renamer {
    /// Create a renamer sized by `config`.
    pub fn new(config: &SystemConfig) -> Self {
        let num_shards = config.num_shards();
        let log_slots = config.log_shard_slots();
        let shards = (0..num_shards as u32)
            .map(|index| Shard::new(index, log_slots, config.num_hashes(), config.max_refs()))
            .collect();
        let slot_count = config.max_pending_transactions;
        Self {
            num_names: config.num_names(),
            num_shards,
            log_slots,
            shards,
            slots: (0..slot_count).map(|_| None).collect(),
            rename_arbiters: vec![Arbiter::new(slot_count); num_shards],
            delete_queues: vec![VecDeque::new(); num_shards],
            completed: BTreeMap::new(),
            next_seq: 0,
            retire_seq: 0,
            responses: VecDeque::new(),
            dropped: 0,
        }
    }

    fn shard_of_name(&self, name: ObjectName) -> usize {
        (name.as_u32() >> self.log_slots) as usize
    }

    /// Admit a transaction for renaming, if an in-flight slot is free.
    pub fn try_rename(&mut self, txn: InputTransaction) -> Result<(), RenamerFull> {
        let Some(i) = self.slots.iter().position(Option::is_none) else {
            return Err(RenamerFull(txn));
        };
        let mut pending = Vec::with_capacity(txn.object_count());
        for &address in txn.reads() {
            pending.push(PendingObject {
                address,
                is_write: false,
            });
        }
        for &address in txn.writes() {
            pending.push(PendingObject {
                address,
                is_write: true,
            });
        }
        self.slots[i] = Some(InFlight {
            seq: self.next_seq,
            renamed: RenamedTransaction::new(txn.tid(), self.num_names),
            pending,
            outstanding: 0,
            failed: false,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Release every name held by a renamed transaction.
    pub fn release(&mut self, renamed: &RenamedTransaction) {
        for &name in renamed.names() {
            let shard = self.shard_of_name(name);
            self.delete_queues[shard].push_back(name);
        }
    }

    /// Take the next fully renamed transaction, if one is ready.
    pub fn try_take_response(&mut self) -> Option<RenamedTransaction> {
        self.responses.pop_front()
    }

    /// Advance the rename pipeline by one cycle.
    pub fn tick(&mut self) {
        self.issue_requests();
        for shard in &mut self.shards {
            shard.tick();
        }
        self.collect_responses();
        self.complete_transactions();
    }

    /// Offer each idle shard one request: renames ahead of deletes, and
    /// round-robin across in-flight transactions for fairness.
    fn issue_requests(&mut self) {
        let log_slots = self.log_slots;
        let shard_mask = self.num_shards - 1;
        let route = move |address: ObjectAddress| {
            (address.as_u64() >> log_slots) as usize & shard_mask
        };

        for s in 0..self.num_shards {
            if !self.shards[s].ready() {
                continue;
            }
            let granted = {
                let slots = &self.slots;
                self.rename_arbiters[s].grant(|i| {
                    slots[i]
                        .as_ref()
                        .is_some_and(|f| f.pending.iter().any(|p| route(p.address) == s))
                })
            };
            if let Some(i) = granted {
                let Some(inflight) = self.slots[i].as_mut() else {
                    continue;
                };
                let Some(pos) = inflight.pending.iter().position(|p| route(p.address) == s)
                else {
                    continue;
                };
                let object = inflight.pending.remove(pos);
                inflight.outstanding += 1;
                self.shards[s].put_rename(ShardRenameRequest {
                    txn_slot: i,
                    address: object.address,
                    is_write: object.is_write,
                });
            } else if let Some(name) = self.delete_queues[s].pop_front() {
                self.shards[s].put_delete(name);
            }
        }
    }

    fn collect_responses(&mut self) {
        for shard in &mut self.shards {
            let Some(response) = shard.try_take_response() else {
                continue;
            };
            let Some(inflight) = self.slots[response.request.txn_slot].as_mut() else {
                debug_assert!(false, "shard response for a free in-flight slot");
                continue;
            };
            inflight.outstanding -= 1;
            match response.outcome {
                Ok(name) => inflight.renamed.record(name, response.request.is_write),
                Err(err) => {
                    if !inflight.failed {
                        warn!(tid = %inflight.renamed.tid(), %err, "dropping transaction");
                    }
                    inflight.failed = true;
                    // Objects not yet issued would only create more names to
                    // clean up.
                    inflight.pending.clear();
                }
            }
        }
    }

    fn complete_transactions(&mut self) {
        for i in 0..self.slots.len() {
            let done = self.slots[i]
                .as_ref()
                .is_some_and(|f| f.outstanding == 0 && f.pending.is_empty());
            if !done {
                continue;
            }
            let Some(inflight) = self.slots[i].take() else {
                continue;
            };
            if inflight.failed {
                self.dropped += 1;
                for &name in inflight.renamed.names() {
                    let shard = self.shard_of_name(name);
                    self.delete_queues[shard].push_back(name);
                }
                self.completed.insert(inflight.seq, None);
            } else {
                debug!(
                    tid = %inflight.renamed.tid(),
                    objects = inflight.renamed.names().len(),
                    "transaction renamed"
                );
                self.completed.insert(inflight.seq, Some(inflight.renamed));
            }
        }

        // Retire in admission order; dropped admissions leave a gap that
        // closes silently.
        while let Some(entry) = self.completed.remove(&self.retire_seq) {
            if let Some(renamed) = entry {
                self.responses.push_back(renamed);
            }
            self.retire_seq += 1;
        }
    }

    /// Reference count currently held for `name`.
    pub fn ref_count(&self, name: ObjectName) -> u32 {
        self.shards[self.shard_of_name(name)].ref_count(name)
    }

    /// Transactions dropped after a rename failure.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Number of transactions currently being renamed.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when no rename or delete work remains anywhere in the stage.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(Option::is_none)
            && self.completed.is_empty()
            && self.responses.is_empty()
            && self.delete_queues.iter().all(VecDeque::is_empty)
            && self.shards.iter().all(Shard::ready)
    }

    /// Clear the rename table and drop all in-flight work.
    pub fn reset(&mut self) {
        for shard in &mut self.shards {
            shard.reset();
        }
        for slot in &mut self.slots {
            *slot = None;
        }
        for queue in &mut self.delete_queues {
            queue.clear();
        }
        self.completed.clear();
        self.retire_seq = self.next_seq;
        self.responses.clear();
    }
}
