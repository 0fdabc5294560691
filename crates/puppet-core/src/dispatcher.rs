//! Top-level pipeline state machine.

use crate::error::EnqueueError;
use crate::puppet::Puppet;
use puppet_renamer::{Arbiter, Renamer, RenamerFull};
use puppet_scheduler::{TournamentScheduler, TransactionSet};
use puppet_types::{
    AccessSet, ConfigError, Cycle, InputTransaction, ObjectName, RenamedTransaction,
    SystemConfig, TransactionEvent, TransactionStatus,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// The Puppetmaster dispatcher.
///
/// Owns the renamer, the tournament scheduler, and the puppet pool, and
/// advances them in lock-step. Per cycle it applies these rules, in order:
///
/// 1. **Intake**: move one renamed transaction into the candidate buffer.
/// 2. **Schedule launch**: when candidates are buffered and no winners are
///    pending, submit a tournament whose position 0 unions the access sets
///    of everything currently running; unfilled positions are padded with
///    empty sets.
/// 3. **Schedule receive**: turn a tournament result into a pending-winner
///    mask (dropping bit 0, the running set).
/// 4. **Dispatch**: start the lowest pending winner on the lowest idle
///    puppet; the buffer closes over the freed slot and the winner mask
///    shifts with it.
/// 5. **Event emission**: watch each puppet's busy flag; a rising edge emits
///    `Started` and releases the transaction's names back to the renamer, a
///    falling edge emits `Finished`. A round-robin arbiter serializes the
///    per-puppet edges into one stream.
///
/// Names release at start, not finish: once a transaction runs, conflict
/// tracking is carried by the sent-to-puppet access sets, which the next
/// tournament's running set is rebuilt from directly.
#[derive(Debug)]
pub struct Puppetmaster {
    config: SystemConfig,
    renamer: Renamer,
    scheduler: TournamentScheduler,
    puppets: Vec<Puppet>,
    sent: Vec<Option<RenamedTransaction>>,
    prev_busy: Vec<bool>,
    buffer: Vec<RenamedTransaction>,
    pending_flags: u32,
    event_queues: Vec<VecDeque<TransactionEvent>>,
    event_arbiter: Arbiter,
    events: VecDeque<TransactionEvent>,
    cycle: Cycle,
    started: u64,
    finished: u64,
}

impl Puppetmaster {
    /// Build the pipeline from a validated configuration.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let num_puppets = config.num_puppets();
        Ok(Self {
            renamer: Renamer::new(&config),
            scheduler: TournamentScheduler::new(&config),
            puppets: vec![Puppet::new(config.tx_duration); num_puppets],
            sent: (0..num_puppets).map(|_| None).collect(),
            prev_busy: vec![false; num_puppets],
            buffer: Vec::with_capacity(config.pool_size() - 1),
            pending_flags: 0,
            event_queues: vec![VecDeque::new(); num_puppets],
            event_arbiter: Arbiter::new(num_puppets),
            events: VecDeque::new(),
            cycle: 0,
            started: 0,
            finished: 0,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Current cycle counter.
    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    /// Submit a transaction, if the rename stage can admit it.
    pub fn try_enqueue(&mut self, txn: InputTransaction) -> Result<(), EnqueueError> {
        self.renamer
            .try_rename(txn)
            .map_err(|RenamerFull(txn)| EnqueueError::Backpressure(txn))
    }

    /// Take the next event from the serialized stream, if any.
    pub fn try_next_event(&mut self) -> Option<TransactionEvent> {
        self.events.pop_front()
    }

    /// Advance the whole pipeline by one cycle.
    pub fn tick(&mut self) {
        for puppet in &mut self.puppets {
            puppet.tick();
        }

        self.intake();
        self.launch_schedule();
        self.receive_schedule();
        self.dispatch();
        self.emit_events();

        self.renamer.tick();
        self.scheduler.tick();

        for (prev, puppet) in self.prev_busy.iter_mut().zip(&self.puppets) {
            *prev = !puppet.is_done();
        }
        self.cycle += 1;
    }

    fn intake(&mut self) {
        if self.buffer.len() < self.config.pool_size() - 1 {
            if let Some(renamed) = self.renamer.try_take_response() {
                trace!(tid = %renamed.tid(), "buffered renamed transaction");
                self.buffer.push(renamed);
            }
        }
    }

    fn launch_schedule(&mut self) {
        if self.buffer.is_empty() || self.pending_flags != 0 || self.scheduler.is_busy() {
            return;
        }
        let num_names = self.config.num_names();

        let mut running = TransactionSet::at_position(AccessSet::new(num_names), 0);
        for (puppet, sent) in self.puppets.iter().zip(&self.sent) {
            if puppet.is_done() {
                continue;
            }
            if let Some(renamed) = sent {
                running.access.reads.union_with(renamed.read_set());
                running.access.writes.union_with(renamed.write_set());
            }
        }

        let mut pool = Vec::with_capacity(self.config.pool_size());
        pool.push(running);
        for (i, renamed) in self.buffer.iter().enumerate() {
            pool.push(TransactionSet::at_position(renamed.access_set(), i + 1));
        }
        while pool.len() < self.config.pool_size() {
            pool.push(TransactionSet::empty(num_names));
        }
        trace!(candidates = self.buffer.len(), "launching tournament");
        let _ = self.scheduler.try_put(pool);
    }

    fn receive_schedule(&mut self) {
        if let Some(winners) = self.scheduler.try_take_response() {
            // Bit 0 is the running set, always present.
            self.pending_flags = winners.indices >> 1;
            trace!(flags = self.pending_flags, "tournament winners");
        }
    }

    fn dispatch(&mut self) {
        if self.pending_flags == 0 {
            return;
        }
        // A puppet that went idle this cycle dispatches next cycle, after
        // its finished event is out.
        let idle = (0..self.puppets.len())
            .find(|&p| self.puppets[p].is_done() && !self.prev_busy[p]);
        let Some(p) = idle else {
            return;
        };

        let index = self.pending_flags.trailing_zeros() as usize;
        debug_assert!(index < self.buffer.len());
        let renamed = self.buffer.remove(index);
        // The buffer closed over the freed slot; winner bits above it shift
        // down with their transactions.
        let low = self.pending_flags & ((1u32 << index) - 1);
        let high = self.pending_flags >> (index + 1);
        self.pending_flags = low | (high << index);

        debug!(tid = %renamed.tid(), puppet = p, cycle = self.cycle, "dispatching");
        self.puppets[p].start(renamed.tid());
        self.sent[p] = Some(renamed);
    }

    fn emit_events(&mut self) {
        for p in 0..self.puppets.len() {
            let busy = !self.puppets[p].is_done();
            if busy && !self.prev_busy[p] {
                let Some(renamed) = self.sent[p].as_ref() else {
                    continue;
                };
                self.event_queues[p].push_back(TransactionEvent {
                    tid: renamed.tid(),
                    status: TransactionStatus::Started,
                    timestamp: self.cycle,
                });
                self.started += 1;
                self.renamer.release(renamed);
            } else if !busy && self.prev_busy[p] {
                self.event_queues[p].push_back(TransactionEvent {
                    tid: self.puppets[p].tid(),
                    status: TransactionStatus::Finished,
                    timestamp: self.cycle,
                });
                self.finished += 1;
            }
        }

        // One event per cycle enters the host-visible stream.
        let granted = {
            let queues = &self.event_queues;
            self.event_arbiter.grant(|i| !queues[i].is_empty())
        };
        if let Some(i) = granted {
            if let Some(event) = self.event_queues[i].pop_front() {
                trace!(%event, "emitting");
                self.events.push_back(event);
            }
        }
    }

    /// Access sets of the transactions currently executing.
    pub fn running(&self) -> impl Iterator<Item = &RenamedTransaction> {
        self.puppets
            .iter()
            .zip(&self.sent)
            .filter(|(puppet, _)| !puppet.is_done())
            .filter_map(|(_, sent)| sent.as_ref())
    }

    /// Number of busy puppets.
    pub fn running_count(&self) -> usize {
        self.puppets.iter().filter(|puppet| !puppet.is_done()).count()
    }

    /// Reference count currently held for `name` in the rename table.
    pub fn ref_count(&self, name: ObjectName) -> u32 {
        self.renamer.ref_count(name)
    }

    /// Transactions dropped by the rename stage.
    pub fn dropped(&self) -> u64 {
        self.renamer.dropped()
    }

    /// Started events emitted so far.
    pub fn started_count(&self) -> u64 {
        self.started
    }

    /// Finished events emitted so far.
    pub fn finished_count(&self) -> u64 {
        self.finished
    }

    /// True when no work remains anywhere in the pipeline and every event
    /// has been drained.
    pub fn is_idle(&self) -> bool {
        self.renamer.is_idle()
            && !self.scheduler.is_busy()
            && self.buffer.is_empty()
            && self.pending_flags == 0
            && self.puppets.iter().all(Puppet::is_done)
            && self.event_queues.iter().all(VecDeque::is_empty)
            && self.events.is_empty()
    }
}
