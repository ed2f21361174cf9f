#![forbid(unsafe_code)]

use super::TransactionHandle;
use std::collections::VecDeque;

/// Undo or redo stack. Holds transaction handles only; change payloads are
/// always read back from the log.
#[derive(Clone, Debug, Default)]
pub(crate) struct HistoryStack {
    entries: VecDeque<TransactionHandle>,
    /// 0 means unbounded.
    bound: usize,
}

impl HistoryStack {
    pub(crate) fn new(bound: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            bound,
        }
    }

    /// Pushes onto the top; returns the oldest entry if the bound forced it out.
    pub(crate) fn push(&mut self, handle: TransactionHandle) -> Option<TransactionHandle> {
        self.entries.push_back(handle);
        if self.bound > 0 && self.entries.len() > self.bound {
            return self.entries.pop_front();
        }
        None
    }

    pub(crate) fn pop(&mut self) -> Option<TransactionHandle> {
        self.entries.pop_back()
    }

    pub(crate) fn last(&self) -> Option<&TransactionHandle> {
        self.entries.back()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &TransactionHandle> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: i64) -> TransactionHandle {
        TransactionHandle {
            transaction_id: id,
            description: format!("txn {id}"),
            first: None,
            last: None,
            timestamp_ns: id,
        }
    }

    #[test]
    fn bounded_stack_evicts_oldest() {
        let mut stack = HistoryStack::new(2);
        assert!(stack.push(handle(1)).is_none());
        assert!(stack.push(handle(2)).is_none());
        let evicted = stack.push(handle(3)).expect("bound reached");
        assert_eq!(evicted.transaction_id, 1);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().map(|h| h.transaction_id), Some(3));
        assert_eq!(stack.last().map(|h| h.transaction_id), Some(2));
    }

    #[test]
    fn zero_bound_is_unbounded() {
        let mut stack = HistoryStack::new(0);
        for id in 0..100 {
            assert!(stack.push(handle(id)).is_none());
        }
        assert_eq!(stack.len(), 100);
        stack.clear();
        assert_eq!(stack.len(), 0);
        assert!(stack.pop().is_none());
    }
}
