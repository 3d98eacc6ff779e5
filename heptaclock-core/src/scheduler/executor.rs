//! Motion task scheduler
//!
//! Owns the queue of pending servo tasks and the current position of every
//! pointer. The queue is worked in rounds; one round is a traversal from
//! the head of the queue in which each eligible task moves one step:
//!
//! - a task already at its target is removed when the scan reaches it
//! - a task whose predecessor is still queued and not done ends the round,
//!   and the next round starts again from the head
//! - at most [`MAX_ROUND_ADVANCES`] tasks move per round, after which the
//!   next round starts from the head
//!
//! The caller drives the scheduler one [`Advance`] at a time so the servo
//! write and settle delay can happen outside any lock that guards it.

use heapless::Vec;

use super::graph::DependencyIndex;
use crate::layout::{Channel, ChannelMap};
use crate::motion::{MotionRequest, ServoTask, TaskError, TaskId};

/// Queue capacity
pub const MAX_QUEUE: usize = 64;

/// Tasks moved per round before restarting from the head
pub const MAX_ROUND_ADVANCES: usize = 5;

/// Delay after each servo write and after each completed round (ms)
pub const SETTLE_DELAY_MS: u64 = 15;

/// One servo write the caller must perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoStep {
    pub channel: Channel,
    pub position: u16,
}

/// Result of one scheduler advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Advance {
    /// Write this position, then settle
    Step(ServoStep),
    /// A round ended
    ///
    /// `restarted` is set when the round was cut short by the advance cap or
    /// an unfinished predecessor; only full traversals are followed by a
    /// settle delay.
    RoundEnd { restarted: bool },
    /// Queue is empty
    Drained,
}

/// Totals from a full drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrainStats {
    /// Servo writes issued
    pub steps: u32,
    /// Rounds ended, including restarts
    pub rounds: u32,
}

/// Motion task scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Tasks in enqueue order (ids strictly increasing)
    queue: Vec<ServoTask, MAX_QUEUE>,
    /// Last known position of every pointer
    positions: ChannelMap<u16>,
    index: DependencyIndex,
    next_id: u32,
    /// Queue index of the next task in the current round
    cursor: usize,
    /// Tasks moved in the current round
    round_advances: usize,
}

impl Scheduler {
    /// Create a scheduler with pointers at `initial` positions
    pub fn new(initial: ChannelMap<u16>) -> Self {
        Self {
            queue: Vec::new(),
            positions: initial,
            index: DependencyIndex::new(),
            next_id: 0,
            cursor: 0,
            round_advances: 0,
        }
    }

    /// Current position of every pointer
    pub fn positions(&self) -> &ChannelMap<u16> {
        &self.positions
    }

    /// Whether any task is still queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queued tasks in order
    pub fn tasks(&self) -> &[ServoTask] {
        &self.queue
    }

    /// Accept a request into the queue
    ///
    /// The request's `after` channel is bound to that channel's most recent
    /// task at this moment.
    pub fn enqueue(&mut self, request: MotionRequest) -> Result<TaskId, TaskError> {
        let id = TaskId(self.next_id);
        let after = self.index.predecessor(request.after);
        self.queue
            .push(ServoTask::from_request(id, &request, after))
            .map_err(|_| TaskError::QueueFull)?;
        self.next_id += 1;
        self.index.record(request.channel, id);
        Ok(id)
    }

    /// Accept a batch of requests, stopping at the first failure
    pub fn enqueue_all<'a>(
        &mut self,
        requests: impl IntoIterator<Item = &'a MotionRequest>,
    ) -> Result<usize, TaskError> {
        let mut count = 0;
        for request in requests {
            self.enqueue(*request)?;
            count += 1;
        }
        Ok(count)
    }

    /// Perform the next unit of scheduling work
    pub fn advance(&mut self) -> Advance {
        loop {
            if self.queue.is_empty() {
                self.finish();
                return Advance::Drained;
            }

            if self.round_advances >= MAX_ROUND_ADVANCES {
                self.restart_round();
                return Advance::RoundEnd { restarted: true };
            }

            if self.cursor >= self.queue.len() {
                self.restart_round();
                return Advance::RoundEnd { restarted: false };
            }

            let task = self.queue[self.cursor];
            if task.is_done() {
                self.positions[task.channel] = task.position;
                self.queue.remove(self.cursor);
                continue;
            }

            if let Some(after) = task.after {
                if self.is_unfinished(after, self.cursor) {
                    self.restart_round();
                    return Advance::RoundEnd { restarted: true };
                }
            }

            let slot = &mut self.queue[self.cursor];
            let position = slot.step();
            let channel = slot.channel;
            if slot.is_done() {
                self.positions[channel] = position;
            }

            self.cursor += 1;
            self.round_advances += 1;
            return Advance::Step(ServoStep { channel, position });
        }
    }

    /// Run every queued task to completion synchronously
    ///
    /// `write` is called for each step in order. Delays are the caller's
    /// concern.
    pub fn drain(&mut self, mut write: impl FnMut(ServoStep)) -> DrainStats {
        let mut stats = DrainStats::default();
        loop {
            match self.advance() {
                Advance::Step(step) => {
                    stats.steps += 1;
                    write(step);
                }
                Advance::RoundEnd { .. } => stats.rounds += 1,
                Advance::Drained => return stats,
            }
        }
    }

    /// Whether `id` sits before `before` in the queue and has not finished
    fn is_unfinished(&self, id: TaskId, before: usize) -> bool {
        match self.queue[..before].binary_search_by_key(&id, |t| t.id) {
            Ok(i) => !self.queue[i].is_done(),
            Err(_) => false,
        }
    }

    fn restart_round(&mut self) {
        self.cursor = 0;
        self.round_advances = 0;
    }

    fn finish(&mut self) {
        self.restart_round();
        self.index.clear();
        self.next_id = 0;
    }
}
