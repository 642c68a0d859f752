//! Cross-worker reduction of epoch metrics
//!
//! Every worker in a group must call [`CrossWorkerSync::all_reduce_mean`] the
//! same number of times in the same order. A worker that gives up early must
//! [`LocalGroup::abort`] the group so the others stop waiting for it.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Collective operations between data-parallel workers
pub trait CrossWorkerSync: Send {
    /// Index of this worker, `0..world_size`
    fn rank(&self) -> usize;

    fn world_size(&self) -> usize;

    /// Mean of `value` over all workers, returned to every worker
    fn all_reduce_mean(&self, value: f32) -> Result<f32>;

    fn is_global_zero(&self) -> bool {
        self.rank() == 0
    }
}

/// A group of one
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleWorker;

impl CrossWorkerSync for SingleWorker {
    fn rank(&self) -> usize {
        0
    }

    fn world_size(&self) -> usize {
        1
    }

    fn all_reduce_mean(&self, value: f32) -> Result<f32> {
        Ok(value)
    }
}

/// One reduction round
#[derive(Debug)]
struct Round {
    slots: Vec<f32>,
    arrived: usize,
    /// Bumped by the last arrival of each round
    generation: u64,
    /// Result of the last completed round
    mean: f32,
}

#[derive(Debug)]
struct GroupState {
    round: Mutex<Round>,
    done: Condvar,
    aborted: AtomicBool,
}

/// Workers on threads of the same process
///
/// ```
/// use aprendiz::train::{CrossWorkerSync, LocalGroup};
///
/// let handles: Vec<_> = LocalGroup::new(2)
///     .unwrap()
///     .into_iter()
///     .map(|worker| {
///         std::thread::spawn(move || {
///             let value = worker.rank() as f32;
///             worker.all_reduce_mean(value).unwrap()
///         })
///     })
///     .collect();
///
/// for h in handles {
///     assert_eq!(h.join().unwrap(), 0.5);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LocalGroup {
    rank: usize,
    world_size: usize,
    state: Arc<GroupState>,
}

impl LocalGroup {
    /// One handle per worker, in rank order
    pub fn new(world_size: usize) -> Result<Vec<Self>> {
        if world_size == 0 {
            return Err(Error::Sync("world size must be at least 1".to_string()));
        }

        let state = Arc::new(GroupState {
            round: Mutex::new(Round {
                slots: vec![0.0; world_size],
                arrived: 0,
                generation: 0,
                mean: 0.0,
            }),
            done: Condvar::new(),
            aborted: AtomicBool::new(false),
        });

        Ok((0..world_size)
            .map(|rank| Self {
                rank,
                world_size,
                state: Arc::clone(&state),
            })
            .collect())
    }

    /// Fail every pending and later reduction in the group
    ///
    /// Returns `true` for the call that tripped the group, `false` if it was
    /// already aborted.
    pub fn abort(&self) -> bool {
        let first = !self.state.aborted.swap(true, Ordering::SeqCst);
        // a waiter holds the lock between its abort check and its wait
        drop(self.state.round.lock());
        self.state.done.notify_all();
        first
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    fn aborted_error(&self) -> Error {
        Error::Sync(format!("worker group aborted (rank {})", self.rank))
    }

    fn poisoned<T>(_: T) -> Error {
        Error::Sync("a worker panicked during reduction".to_string())
    }
}

impl CrossWorkerSync for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn all_reduce_mean(&self, value: f32) -> Result<f32> {
        let mut round = self.state.round.lock().map_err(Self::poisoned)?;
        if self.is_aborted() {
            return Err(self.aborted_error());
        }

        round.slots[self.rank] = value;
        round.arrived += 1;
        if round.arrived == self.world_size {
            round.mean = round.slots.iter().sum::<f32>() / self.world_size as f32;
            round.arrived = 0;
            round.generation = round.generation.wrapping_add(1);
            self.state.done.notify_all();
            return Ok(round.mean);
        }

        // nobody can finish the next round until this worker joins it, so
        // `mean` still holds this round's value when the wait ends
        let generation = round.generation;
        let round = self
            .state
            .done
            .wait_while(round, |r| r.generation == generation && !self.is_aborted())
            .map_err(Self::poisoned)?;

        if round.generation == generation {
            return Err(self.aborted_error());
        }
        Ok(round.mean)
    }
}
