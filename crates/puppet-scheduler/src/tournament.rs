//! Pairwise-merge tournament over transaction access sets.

use puppet_types::{AccessSet, SystemConfig};
use thiserror::Error;

/// One pool position: an access-set union plus the pool indices it
/// represents.
#[derive(Clone, Debug)]
pub struct TransactionSet {
    /// Combined read and write sets of the represented transactions.
    pub access: AccessSet,
    /// Bit per pool position folded into this set.
    pub indices: u32,
}

impl TransactionSet {
    /// An empty set representing no pool position. Merges into anything and
    /// never marks a winner.
    pub fn empty(num_names: usize) -> Self {
        Self {
            access: AccessSet::new(num_names),
            indices: 0,
        }
    }

    /// A set representing one pool position.
    pub fn at_position(access: AccessSet, position: usize) -> Self {
        Self {
            access,
            indices: 1 << position,
        }
    }
}

/// Returned by [`TournamentScheduler::try_put`] while a tournament is in
/// flight; carries the rejected pool back to the caller.
#[derive(Debug, Error)]
#[error("scheduler is busy")]
pub struct SchedulerBusy(pub Vec<TransactionSet>);

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    Merging { round: usize, pair: usize },
}

/// The tournament scheduler.
///
/// A request is a vector of `pool_size` transaction sets; position 0 holds
/// the running-set union, positions 1.. the candidates. Each round merges
/// the live prefix pairwise, `comparators` pairs per cycle; conflicting
/// pairs keep the lower-index operand, so the running set can never be
/// dropped and lower-index candidates win ties. After `log2(pool_size)`
/// rounds position 0 holds the result, whose `indices` mark the winners.
///
/// The scheduler is busy from request acceptance until the response is
/// consumed and rejects further requests in between.
#[derive(Debug)]
pub struct TournamentScheduler {
    pool_size: usize,
    rounds: usize,
    comparators: usize,
    working: Vec<TransactionSet>,
    state: State,
    response: Option<TransactionSet>,
}

impl TournamentScheduler {
    /// Create a scheduler sized by `config`.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pool_size: config.pool_size(),
            rounds: config.rounds(),
            comparators: config.comparators(),
            working: Vec::new(),
            state: State::Idle,
            response: None,
        }
    }

    /// True while a tournament is running or its response awaits pickup.
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, State::Idle) || self.response.is_some()
    }

    /// Submit a pool of `pool_size` transaction sets.
    pub fn try_put(&mut self, pool: Vec<TransactionSet>) -> Result<(), SchedulerBusy> {
        if self.is_busy() {
            return Err(SchedulerBusy(pool));
        }
        debug_assert_eq!(pool.len(), self.pool_size);
        self.working = pool;
        self.state = State::Merging { round: 0, pair: 0 };
        Ok(())
    }

    /// Take the finished tournament result, if any.
    pub fn try_take_response(&mut self) -> Option<TransactionSet> {
        self.response.take()
    }

    /// Advance the tournament by one cycle: up to `comparators` pair-merges
    /// within the current round.
    pub fn tick(&mut self) {
        let State::Merging {
            mut round,
            mut pair,
        } = self.state
        else {
            return;
        };

        let pairs = (self.pool_size >> round) / 2;
        for _ in 0..self.comparators {
            if pair == pairs {
                break;
            }
            let merged = Self::merge(&self.working[2 * pair], &self.working[2 * pair + 1]);
            self.working[pair] = merged;
            pair += 1;
        }

        if pair == pairs {
            round += 1;
            pair = 0;
            if round == self.rounds {
                self.response = self.working.drain(..1).next();
                self.working.clear();
                self.state = State::Idle;
                return;
            }
        }
        self.state = State::Merging { round, pair };
    }

    /// Merge rule: on conflict the first operand survives unchanged.
    fn merge(a: &TransactionSet, b: &TransactionSet) -> TransactionSet {
        if a.access.conflicts_with(&b.access) {
            a.clone()
        } else {
            let mut merged = a.clone();
            merged.access.merge(&b.access);
            merged.indices |= b.indices;
            merged
        }
    }
}
