//! Cross-shard traversal of a store.
//!
//! [`Cursor`] is a bidirectional position `(shard index, offset in shard)`
//! over a borrowed shard list; the end sentinel is `(shard count, 0)`.
//! [`Iter`] drives two cursors toward each other to provide a standard
//! double-ended, exact-size iterator. Both borrow the store, so neither can
//! outlive it, and neither allows mutation.

use std::iter::FusedIterator;

use crate::shard::Shard;

/// A bidirectional position within a store's shard list.
#[derive(Debug)]
pub struct Cursor<'a, T> {
    shards: &'a [Shard<T>],
    shard_index: usize,
    offset: usize,
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<'a, T> Cursor<'a, T> {
    /// Cursor on the first element, or on the end sentinel when empty.
    pub fn begin(shards: &'a [Shard<T>]) -> Self {
        let mut cursor = Self {
            shards,
            shard_index: 0,
            offset: 0,
        };
        cursor.skip_empty_forward();
        cursor
    }

    /// Cursor on the end sentinel.
    pub fn end(shards: &'a [Shard<T>]) -> Self {
        Self {
            shards,
            shard_index: shards.len(),
            offset: 0,
        }
    }

    /// Current `(shard index, offset)` pair.
    pub const fn position(&self) -> (usize, usize) {
        (self.shard_index, self.offset)
    }

    /// Whether the cursor sits on the end sentinel.
    pub fn is_end(&self) -> bool {
        self.shard_index >= self.shards.len()
    }

    /// The element under the cursor, `None` on the end sentinel.
    pub fn get(&self) -> Option<&'a T> {
        let shards = self.shards;
        shards
            .get(self.shard_index)
            .and_then(|s| s.as_slice().get(self.offset))
    }

    /// Advances by one element. A no-op on the end sentinel.
    pub fn move_next(&mut self) {
        if self.is_end() {
            return;
        }
        self.offset += 1;
        if self.offset >= self.shards[self.shard_index].len() {
            self.offset = 0;
            self.shard_index += 1;
            self.skip_empty_forward();
        }
    }

    /// Steps back by one element. From the end sentinel this lands on the
    /// last element; on the first element it is a no-op.
    pub fn move_prev(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            return;
        }
        let mut index = self.shard_index.min(self.shards.len());
        while index > 0 {
            index -= 1;
            let len = self.shards[index].len();
            if len > 0 {
                self.shard_index = index;
                self.offset = len - 1;
                return;
            }
        }
    }

    fn skip_empty_forward(&mut self) {
        while self
            .shards
            .get(self.shard_index)
            .is_some_and(Shard::is_empty)
        {
            self.shard_index += 1;
        }
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.shards, other.shards) && self.position() == other.position()
    }
}

impl<T> Eq for Cursor<'_, T> {}

/// Iterator over the elements of a store in time order.
#[derive(Debug)]
pub struct Iter<'a, T> {
    front: Cursor<'a, T>,
    back: Cursor<'a, T>,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(shards: &'a [Shard<T>], len: usize) -> Self {
        Self {
            front: Cursor::begin(shards),
            back: Cursor::end(shards),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.front.get()?;
        self.front.move_next();
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        self.back.move_prev();
        let item = self.back.get()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use crate::element::tests::{Tick, ticks};
    use crate::store::Store;

    fn three_shards() -> Store<Tick> {
        let mut store = Store::with_shard_capacity(2);
        for t in ticks(&[1, 2, 3, 4, 5]) {
            store.append(t).unwrap();
        }
        store
    }

    #[test]
    fn test_cursor_walks_forward_across_shards() {
        let store = three_shards();
        let mut cursor = store.cursor_begin();
        let mut seen = Vec::new();
        while let Some(tick) = cursor.get() {
            seen.push(tick.0);
            cursor.move_next();
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert!(cursor.is_end());
        assert_eq!(cursor.position(), (3, 0));
        assert_eq!(cursor, store.cursor_end());

        cursor.move_next();
        assert_eq!(cursor.position(), (3, 0));
    }

    #[test]
    fn test_cursor_walks_backward_from_end() {
        let store = three_shards();
        let mut cursor = store.cursor_end();
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&Tick(5)));
        assert_eq!(cursor.position(), (2, 0));

        cursor.move_prev();
        assert_eq!(cursor.position(), (1, 1));
        assert_eq!(cursor.get(), Some(&Tick(4)));

        for _ in 0..10 {
            cursor.move_prev();
        }
        assert_eq!(cursor, store.cursor_begin());
    }

    #[test]
    fn test_iter_is_double_ended() {
        let store = three_shards();
        let mut iter = store.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(&Tick(1)));
        assert_eq!(iter.next_back(), Some(&Tick(5)));
        assert_eq!(iter.next_back(), Some(&Tick(4)));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(&Tick(2)));
        assert_eq!(iter.next(), Some(&Tick(3)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let reversed: Vec<i64> = store.iter().rev().map(|t| t.0).collect();
        assert_eq!(reversed, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_empty_store_cursor() {
        let store = Store::<Tick>::new();
        assert!(store.cursor_begin().is_end());
        assert_eq!(store.cursor_begin(), store.cursor_end());
        assert_eq!(store.iter().next(), None);
    }
}
