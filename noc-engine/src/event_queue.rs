// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A cycle-ordered queue of pending events.
//!
//! Events are plain values (normally an `enum` defined by the model) that are
//! scheduled a number of cycles into the future. The owner of the queue
//! advances time one cycle at a time and then drains all the events that have
//! become due:
//!
//! ```rust
//! use noc_engine::event_queue::EventQueue;
//!
//! let mut queue = EventQueue::new();
//! queue.schedule("b", 2);
//! queue.schedule("a", 1);
//!
//! queue.advance_cycle();
//! assert_eq!(queue.pop_due(), Some("a"));
//! assert_eq!(queue.pop_due(), None);
//!
//! queue.advance_cycle();
//! assert_eq!(queue.pop_due(), Some("b"));
//! ```
//!
//! Events due in the same cycle are returned in the order they were
//! scheduled, which keeps simulations deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::types::Cycle;

struct Scheduled<E> {
    cycle: Cycle,
    seq: u64,
    event: E,
}

impl<E> Scheduled<E> {
    fn key(&self) -> (Cycle, u64) {
        (self.cycle, self.seq)
    }
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// The queue of events together with the current cycle.
pub struct EventQueue<E> {
    current_cycle: Cycle,
    next_seq: u64,
    events: BinaryHeap<Reverse<Scheduled<E>>>,
}

impl<E> EventQueue<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_cycle: 0,
            next_seq: 0,
            events: BinaryHeap::new(),
        }
    }

    #[must_use]
    pub fn current_cycle(&self) -> Cycle {
        self.current_cycle
    }

    /// Schedule an event `delay` cycles after the current cycle.
    ///
    /// A `delay` of 0 makes the event due immediately, so it will be returned
    /// by the next call to [`pop_due`](Self::pop_due).
    pub fn schedule(&mut self, event: E, delay: Cycle) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Reverse(Scheduled {
            cycle: self.current_cycle + delay,
            seq,
            event,
        }));
    }

    /// Move time forward by one cycle and return the new cycle.
    pub fn advance_cycle(&mut self) -> Cycle {
        self.current_cycle += 1;
        self.current_cycle
    }

    /// Remove and return the next event that is due at or before the current
    /// cycle.
    pub fn pop_due(&mut self) -> Option<E> {
        match self.events.peek() {
            Some(Reverse(next)) if next.cycle <= self.current_cycle => {
                self.events.pop().map(|Reverse(scheduled)| scheduled.event)
            }
            _ => None,
        }
    }

    /// The cycle of the earliest pending event.
    #[must_use]
    pub fn next_event_cycle(&self) -> Option<Cycle> {
        self.events.peek().map(|Reverse(next)| next.cycle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
