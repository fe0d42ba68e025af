//! Virtual game clock and deferred-task scheduler
//!
//! The host feeds wall-clock milliseconds into the simulation; frames are laid
//! on a fixed 60 Hz grid from the session start and one-shot tasks fire at
//! their due instant. Nothing here reads real time, so tests just pick
//! instants.

use serde::{Deserialize, Serialize};

use crate::consts::FRAMES_PER_SECOND;

/// Work deferred to a later instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Replace a collected coin
    RespawnCoin,
    /// Replace a collected power-up
    RespawnPowerUp,
    /// Finish the level after the key pickup
    CompleteLevel,
    /// Resume the countdown after the level announcement; stale generations are ignored
    StartCountdown { generation: u32 },
    /// One countdown second; stale generations are ignored
    CountdownTick { generation: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub due_ms: u64,
    /// Session the task was scheduled in
    pub epoch: u32,
    pub task: Task,
    seq: u64,
}

/// One-shot tasks ordered by due time, then by scheduling order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    queue: Vec<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, epoch: u32, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTask {
            due_ms,
            epoch,
            task,
            seq,
        });
    }

    /// Due time of the earliest pending task
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.iter().map(|t| t.due_ms).min()
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTask> {
        let idx = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)?;
        Some(self.queue.swap_remove(idx))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self, task: Task) -> usize {
        self.queue.iter().filter(|t| t.task == task).count()
    }
}

/// Fixed 60 Hz frame grid anchored at the session start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameClock {
    origin_ms: u64,
    /// Frames already run
    frames: u64,
    /// Last instant the simulation reached
    now_ms: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64) {
        self.origin_ms = now_ms;
        self.frames = 0;
        self.now_ms = now_ms;
    }

    fn frame_ms(&self, frame: u64) -> u64 {
        self.origin_ms + frame * 1000 / FRAMES_PER_SECOND
    }

    /// Instant of the next frame tick
    pub fn next_frame_ms(&self) -> u64 {
        self.frame_ms(self.frames + 1)
    }

    pub fn frame_done(&mut self, at_ms: u64) {
        self.frames += 1;
        self.now_ms = self.now_ms.max(at_ms);
    }

    /// Record progress to `now_ms` without running a frame
    pub fn reach(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Drop all but the latest frame due by `now_ms`; returns how many were dropped
    pub fn skip_to(&mut self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.origin_ms);
        let due = elapsed * FRAMES_PER_SECOND / 1000;
        if due > self.frames + 1 {
            let skipped = due - 1 - self.frames;
            self.frames = due - 1;
            skipped
        } else {
            0
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
