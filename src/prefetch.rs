// src/prefetch.rs

//! Single-slot prefetching between the reader and the consumer.
//!
//! Exactly one read is in flight at any time. Issuing a read and taking its
//! result are separate steps, so the reader's next minibatch is prepared
//! while the consumer works on the current one, with pipeline depth fixed at
//! one outstanding request.
//!
//! In [`ScheduleMode::Parallel`] the reader moves into a background thread
//! for the duration of one read and returns over a single-slot channel. In
//! [`ScheduleMode::OnDemand`] the read is deferred and executes inline when
//! its result is taken.

use crossbeam::channel::{bounded, Receiver};
use std::thread;

use crate::error::{Result, ShimError};
use crate::reader::{DataReader, Minibatch};

/// How issued reads execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Reads run on a background thread as soon as they are issued.
    Parallel,
    /// Reads run inline at the moment their result is taken.
    OnDemand,
}

type ReadOutcome<R> = (R, Result<Minibatch>);

enum SlotState<R> {
    /// No read issued; the reader is at rest.
    Idle(R),
    /// A background read owns the reader; its outcome arrives on the channel.
    Scheduled(Receiver<ReadOutcome<R>>),
    /// A read has been issued but will only run when taken.
    Deferred(R),
    /// A background read panicked and took the reader with it.
    Lost,
}

/// One reader, one optional in-flight read.
///
/// `issue` and `take` must alternate; violating that pairing is a bug in the
/// calling code and panics.
pub struct PrefetchSlot<R> {
    mode: ScheduleMode,
    state: SlotState<R>,
}

impl<R: DataReader> PrefetchSlot<R> {
    pub fn new(reader: R, mode: ScheduleMode) -> Self {
        Self {
            mode,
            state: SlotState::Idle(reader),
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// True while a read has been issued but not yet taken.
    pub fn in_flight(&self) -> bool {
        matches!(
            self.state,
            SlotState::Scheduled(_) | SlotState::Deferred(_)
        )
    }

    /// Schedules the next read.
    pub fn issue(&mut self) {
        self.state = match std::mem::replace(&mut self.state, SlotState::Lost) {
            SlotState::Idle(mut reader) => match self.mode {
                ScheduleMode::Parallel => {
                    let (sender, receiver) = bounded(1);
                    thread::spawn(move || {
                        let outcome = reader.read_minibatch();
                        // The receiver may have been dropped; nothing to do then.
                        let _ = sender.send((reader, outcome));
                    });
                    SlotState::Scheduled(receiver)
                }
                ScheduleMode::OnDemand => SlotState::Deferred(reader),
            },
            SlotState::Scheduled(_) | SlotState::Deferred(_) => {
                panic!("prefetch read issued while another is in flight")
            }
            SlotState::Lost => panic!("prefetch reader was lost to a panicked read"),
        };
    }

    /// Blocks until the in-flight read completes and returns its minibatch.
    pub fn take(&mut self) -> Result<Minibatch> {
        let (state, outcome) = match std::mem::replace(&mut self.state, SlotState::Lost) {
            SlotState::Scheduled(receiver) => match receiver.recv() {
                Ok((reader, outcome)) => (SlotState::Idle(reader), outcome),
                Err(_) => (
                    SlotState::Lost,
                    Err(ShimError::reader(
                        "prefetch read panicked before delivering a minibatch",
                    )),
                ),
            },
            SlotState::Deferred(mut reader) => {
                let outcome = reader.read_minibatch();
                (SlotState::Idle(reader), outcome)
            }
            SlotState::Idle(_) => panic!("no prefetch read in flight"),
            SlotState::Lost => (
                SlotState::Lost,
                Err(ShimError::reader(
                    "reader was lost to a panicked prefetch read",
                )),
            ),
        };
        self.state = state;
        outcome
    }

    /// Drains any in-flight read, discarding its result, and hands back the
    /// reader. Used at epoch boundaries, where a stale read from the
    /// previous epoch may still be pending.
    pub fn reader_mut(&mut self) -> Result<&mut R> {
        if self.in_flight() {
            let _ = self.take();
        }
        match &mut self.state {
            SlotState::Idle(reader) => Ok(reader),
            SlotState::Lost => Err(ShimError::reader(
                "reader was lost to a panicked prefetch read",
            )),
            SlotState::Scheduled(_) | SlotState::Deferred(_) => {
                unreachable!("in-flight read was just drained")
            }
        }
    }
}
