//! A priority queue specialized for push-relabel's active-node set.
//!
//! Only pushes with a priority greater than or equal to the queue's current
//! maximum minus one are allowed; push-relabel never needs more than that,
//! since a node's height only ever increases by relabeling it one step past
//! its lowest neighbor. Splitting elements by the parity of their priority
//! keeps both halves sorted by construction, so push/pop are O(1) and
//! elements sharing a priority come back out LIFO.

pub struct PriorityQueueWithRestrictedPush<Priority> {
    even_queue: Vec<(usize, Priority)>,
    odd_queue: Vec<(usize, Priority)>,
}

impl<Priority> Default for PriorityQueueWithRestrictedPush<Priority> {
    fn default() -> Self {
        Self {
            even_queue: Vec::new(),
            odd_queue: Vec::new(),
        }
    }
}

impl<Priority> PriorityQueueWithRestrictedPush<Priority>
where
    Priority: Copy + Ord + std::ops::Rem<Output = Priority> + From<u8>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.even_queue.is_empty() && self.odd_queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.even_queue.clear();
        self.odd_queue.clear();
    }

    /// Pushes `element` with the given `priority`. The priority must be
    /// greater than or equal to the highest priority currently in the
    /// queue, minus one.
    pub fn push(&mut self, element: usize, priority: Priority) {
        debug_assert!(
            self.even_queue.is_empty()
                || priority >= decrement(self.even_queue.last().unwrap().1)
        );
        debug_assert!(
            self.odd_queue.is_empty() || priority >= decrement(self.odd_queue.last().unwrap().1)
        );
        if priority % Priority::from(2u8) == Priority::from(1u8) {
            debug_assert!(self.odd_queue.is_empty() || priority >= self.odd_queue.last().unwrap().1);
            self.odd_queue.push((element, priority));
        } else {
            debug_assert!(
                self.even_queue.is_empty() || priority >= self.even_queue.last().unwrap().1
            );
            self.even_queue.push((element, priority));
        }
    }

    /// Removes and returns the element with the highest priority. Ties are
    /// broken in favor of the even-priority queue.
    pub fn pop(&mut self) -> usize {
        debug_assert!(!self.is_empty());
        if self.even_queue.is_empty() {
            return Self::pop_back(&mut self.odd_queue);
        }
        if self.odd_queue.is_empty() {
            return Self::pop_back(&mut self.even_queue);
        }
        if self.odd_queue.last().unwrap().1 > self.even_queue.last().unwrap().1 {
            Self::pop_back(&mut self.odd_queue)
        } else {
            Self::pop_back(&mut self.even_queue)
        }
    }

    fn pop_back(queue: &mut Vec<(usize, Priority)>) -> usize {
        queue.pop().expect("queue must be non-empty").0
    }
}

fn decrement<Priority>(priority: Priority) -> Priority
where
    Priority: Copy + std::ops::Sub<Output = Priority> + From<u8>,
{
    priority - Priority::from(1u8)
}
