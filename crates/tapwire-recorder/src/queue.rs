//! Multi-producer / single-consumer queue bounded by item cost.
//!
//! Capacity is measured by a caller-supplied cost function over the live
//! items rather than by item count: a flood of large items fills the queue
//! just as surely as many small ones, so buffered memory stays bounded no
//! matter the size distribution. For recorded packets the cost is the
//! message payload size.
//!
//! Producers never block. [`CostQueue::try_push`] either enqueues within the
//! budget or returns false; the consumer blocks in
//! [`CostQueue::pop_many_up_to`] and drains batches in FIFO order.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Outcome of [`CostQueue::pop_many_up_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopResult {
    /// At least one item was moved into the output buffer.
    Drained,
    /// The queue is closed and everything in it has been consumed.
    Consumed,
}

/// A FIFO whose capacity is the summed cost of its live items.
pub struct CostQueue<T, F> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    cost_of: F,
    max_cost: usize,
}

struct State<T> {
    items: VecDeque<(T, usize)>,
    cost: usize,
    closed: bool,
}

impl<T, F: Fn(&T) -> usize> CostQueue<T, F> {
    /// Creates a queue holding at most `max_cost` worth of items.
    pub fn new(max_cost: usize, cost_of: F) -> Self {
        Self {
            state: Mutex::new(State { items: VecDeque::new(), cost: 0, closed: false }),
            not_empty: Condvar::new(),
            cost_of,
            max_cost,
        }
    }

    /// Enqueue `item` if it fits within the cost budget and the queue is
    /// still open. Never blocks.
    ///
    /// Items are delivered to the consumer in the order `try_push` calls
    /// linearize.
    pub fn try_push(&self, item: T) -> bool {
        let cost = (self.cost_of)(&item);

        let mut state = self.state.lock();
        if state.closed || state.cost + cost > self.max_cost {
            return false;
        }

        state.cost += cost;
        state.items.push_back((item, cost));
        drop(state);

        self.not_empty.notify_one();
        true
    }

    /// Block until the queue is non-empty, then drain items into `out` in
    /// FIFO order until their summed cost reaches `budget`.
    ///
    /// At least one item is delivered per call, and the item that crosses
    /// the budget is included, so an item costing more than the whole budget
    /// still makes progress. Returns [`PopResult::Consumed`] once the queue
    /// is closed and empty.
    pub fn pop_many_up_to(&self, budget: usize, out: &mut Vec<T>) -> PopResult {
        let mut state = self.state.lock();

        while state.items.is_empty() {
            if state.closed {
                return PopResult::Consumed;
            }
            self.not_empty.wait(&mut state);
        }

        let mut drained = 0;
        while let Some((item, cost)) = state.items.pop_front() {
            state.cost -= cost;
            drained += cost;
            out.push(item);

            if drained >= budget {
                break;
            }
        }

        PopResult::Drained
    }

    /// Close the producer side.
    ///
    /// Subsequent `try_push` calls fail; the consumer drains what remains
    /// and then observes [`PopResult::Consumed`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);

        self.not_empty.notify_all();
    }

    /// Summed cost of the items currently buffered.
    pub fn buffered_cost(&self) -> usize {
        self.state.lock().cost
    }
}
