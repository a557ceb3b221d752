/*!
 * Queue Iteration
 *
 * Iterator adapters so consumers can write `for item in queue.iter()`.
 * Each traversal is single-pass: it ends at end-of-stream and stays ended.
 */

use super::handoff::BlockingHandoffQueue;
use std::collections::vec_deque;
use std::iter::FusedIterator;

/// Borrowing iterator, one blocking [`receive`] per `next`
///
/// Never ends while the queue stays open; a consumer that has caught up
/// simply blocks in `next` until more items arrive or the queue is closed.
///
/// [`receive`]: BlockingHandoffQueue::receive
#[derive(Debug)]
pub struct Iter<'a, T> {
    queue: &'a BlockingHandoffQueue<T>,
    finished: bool,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        let item = self.queue.receive();
        self.finished = item.is_none();
        item
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator over the items still buffered when the queue was consumed
///
/// Nobody else can append to a queue that has been moved into this iterator,
/// so it ends once the buffer is empty whether or not the queue was closed.
#[derive(Debug)]
pub struct IntoIter<T> {
    inner: vec_deque::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> BlockingHandoffQueue<T> {
    /// Iterate by repeatedly calling [`receive`](Self::receive)
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            finished: false,
        }
    }
}

impl<'a, T> IntoIterator for &'a BlockingHandoffQueue<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T> IntoIterator for BlockingHandoffQueue<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.into_buffer().into_iter(),
        }
    }
}
