//! Sparse, delta-encoded event scheduling.
//!
//! A `DeltaClock` stores pending events as a singly linked list of nodes,
//! each holding the gap in ticks from its predecessor and a batch of event
//! handles. Scheduling walks the list subtracting gaps; draining pops one
//! batch at a time in nondecreasing-time order without touching the empty
//! ticks in between.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

type Link<T> = Option<Rc<RefCell<Node<T>>>>;

struct Node<T> {
    delta: u64,
    events: HashSet<T>,
    link: Link<T>,
}

/// A delta queue of event handles.
///
/// Invariant: a node's absolute tick is the sum of `delta` over itself and
/// all preceding nodes, and every handle sits in at most one node (tracked
/// by the side index).
pub struct DeltaClock<T: Copy + Eq + Hash> {
    head: Link<T>,
    index: HashMap<T, Rc<RefCell<Node<T>>>>,
}

impl<T: Copy + Eq + Hash> Default for DeltaClock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> DeltaClock<T> {
    pub fn new() -> Self {
        Self {
            head: None,
            index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// True if the handle is currently scheduled.
    pub fn contains(&self, handle: T) -> bool {
        self.index.contains_key(&handle)
    }

    /// Schedules `handle` to come due `delta` ticks from now.
    ///
    /// Panics if the handle is already scheduled; reschedule by
    /// unscheduling first.
    pub fn schedule(&mut self, handle: T, delta: u64) {
        assert!(
            !self.index.contains_key(&handle),
            "handle is already scheduled"
        );

        let mut remaining = delta;
        let mut prev: Link<T> = None;
        let mut curr = self.head.clone();

        while let Some(node) = curr.clone() {
            let gap = node.borrow().delta;
            if remaining <= gap {
                break;
            }
            remaining -= gap;
            prev = Some(node.clone());
            curr = node.borrow().link.clone();
        }

        let target = match curr.clone() {
            Some(node) if node.borrow().delta == remaining => node,
            _ => {
                let node = Rc::new(RefCell::new(Node {
                    delta: remaining,
                    events: HashSet::new(),
                    link: curr.clone(),
                }));
                // The spliced-in node absorbs part of the next gap.
                if let Some(next) = curr {
                    next.borrow_mut().delta -= remaining;
                }
                match prev {
                    None => self.head = Some(node.clone()),
                    Some(prev) => prev.borrow_mut().link = Some(node.clone()),
                }
                node
            }
        };

        target.borrow_mut().events.insert(handle);
        self.index.insert(handle, target);
    }

    /// Removes a pending handle. A node emptied this way stays in the list
    /// and yields an empty batch when its tick comes up.
    pub fn unschedule(&mut self, handle: T) {
        if let Some(node) = self.index.remove(&handle) {
            node.borrow_mut().events.remove(&handle);
        }
    }

    /// Detaches and returns the next due batch.
    ///
    /// Panics when the clock is empty; draining past the last scheduled
    /// event is a programming error.
    pub fn advance(&mut self) -> HashSet<T> {
        let head = self.head.take().expect("advance called on an empty DeltaClock");
        let mut node = head.borrow_mut();
        let events = std::mem::take(&mut node.events);
        self.head = node.link.take();
        drop(node);

        for handle in &events {
            self.index.remove(handle);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_come_due_in_order() {
        let mut clock = DeltaClock::new();
        clock.schedule("a", 3);
        clock.schedule("b", 3);
        clock.schedule("c", 5);

        let first = clock.advance();
        assert_eq!(first, HashSet::from(["a", "b"]));
        let second = clock.advance();
        assert_eq!(second, HashSet::from(["c"]));
        assert!(clock.is_empty());
    }

    #[test]
    fn splicing_before_an_existing_node_preserves_gaps() {
        let mut clock = DeltaClock::new();
        clock.schedule(1u32, 10);
        clock.schedule(2u32, 4);
        clock.schedule(3u32, 7);

        assert_eq!(clock.advance(), HashSet::from([2]));
        assert_eq!(clock.advance(), HashSet::from([3]));
        assert_eq!(clock.advance(), HashSet::from([1]));
    }

    #[test]
    fn unscheduled_handles_never_come_due() {
        let mut clock = DeltaClock::new();
        clock.schedule('x', 2);
        clock.schedule('y', 2);
        clock.schedule('z', 6);
        clock.unschedule('x');
        assert!(!clock.contains('x'));

        assert_eq!(clock.advance(), HashSet::from(['y']));
        assert_eq!(clock.advance(), HashSet::from(['z']));
        assert!(clock.is_empty());
    }

    #[test]
    fn emptied_nodes_yield_an_empty_batch() {
        let mut clock = DeltaClock::new();
        clock.schedule('a', 1);
        clock.schedule('b', 2);
        clock.unschedule('a');

        assert_eq!(clock.advance(), HashSet::new());
        assert_eq!(clock.advance(), HashSet::from(['b']));
    }

    #[test]
    fn rescheduling_after_unschedule_is_allowed() {
        let mut clock = DeltaClock::new();
        clock.schedule(7u8, 5);
        clock.unschedule(7u8);
        clock.schedule(7u8, 1);
        assert_eq!(clock.advance(), HashSet::from([7]));
    }

    #[test]
    #[should_panic(expected = "already scheduled")]
    fn double_schedule_panics() {
        let mut clock = DeltaClock::new();
        clock.schedule(1u8, 1);
        clock.schedule(1u8, 2);
    }

    #[test]
    #[should_panic(expected = "empty DeltaClock")]
    fn advancing_an_empty_clock_panics() {
        let mut clock: DeltaClock<u8> = DeltaClock::new();
        clock.advance();
    }

    #[test]
    fn zero_delta_comes_due_immediately() {
        let mut clock = DeltaClock::new();
        clock.schedule('n', 3);
        clock.schedule('m', 0);
        assert_eq!(clock.advance(), HashSet::from(['m']));
        assert_eq!(clock.advance(), HashSet::from(['n']));
    }
}
