//! Positional state shared by every buffer: mark, position, limit and capacity.
//!
//! The cursor maintains `mark <= position <= limit <= capacity` after every
//! operation, where the mark may be unset.

use strata_common::{Result, error::Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    mark: Option<usize>,
    position: usize,
    limit: usize,
    capacity: usize,
}

impl Cursor {
    /// A cursor over `capacity` elements: position zero, limit at capacity,
    /// no mark.
    pub fn new(capacity: usize) -> Cursor {
        Cursor {
            mark: None,
            position: 0,
            limit: capacity,
            capacity,
        }
    }

    /// A cursor with explicit state, validated against the invariant.
    pub fn with_state(
        mark: Option<usize>,
        position: usize,
        limit: usize,
        capacity: usize,
    ) -> Result<Cursor> {
        let mut cursor = Cursor::new(capacity);
        cursor.set_limit(limit)?;
        cursor.set_position(position)?;
        if let Some(mark) = mark {
            if mark > position {
                return Err(Error::invalid_arg(
                    "mark",
                    format!("mark {mark} > position {position}"),
                ));
            }
            cursor.mark = Some(mark);
        }
        Ok(cursor)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The saved mark, if any.
    #[inline]
    pub fn mark_value(&self) -> Option<usize> {
        self.mark
    }

    /// Sets the position. Fails if `position > limit`; discards the mark if it
    /// lies beyond the new position.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::invalid_arg(
                "position",
                format!("new position {position} > limit {}", self.limit),
            ));
        }
        if self.mark.is_some_and(|mark| mark > position) {
            self.mark = None;
        }
        self.position = position;
        Ok(())
    }

    /// Sets the limit. Fails if `limit > capacity`; clamps the position and
    /// discards the mark when they fall beyond the new limit.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(Error::invalid_arg(
                "limit",
                format!("new limit {limit} > capacity {}", self.capacity),
            ));
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|mark| mark > limit) {
            self.mark = None;
        }
        Ok(())
    }

    /// Sets the mark at the current position.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Resets the position to the mark.
    pub fn reset(&mut self) -> Result<()> {
        let mark = self.mark.ok_or_else(Error::invalid_mark)?;
        self.position = mark;
        Ok(())
    }

    /// `position = 0`, `limit = capacity`, mark discarded.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
        self.mark = None;
    }

    /// `limit = position`, `position = 0`, mark discarded.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    /// `position = 0`, mark discarded; the limit is unchanged.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    #[inline]
    pub fn discard_mark(&mut self) {
        self.mark = None;
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Checks that `count` elements can be read at the position, advances the
    /// position past them and returns the index of the first one.
    #[inline]
    pub fn next_get_index(&mut self, count: usize) -> Result<usize> {
        let position = self.position;
        if self.limit - position < count {
            return Err(Error::underflow(count, self.limit - position));
        }
        self.position = position + count;
        Ok(position)
    }

    /// Checks that `count` elements can be written at the position, advances
    /// the position past them and returns the index of the first one.
    #[inline]
    pub fn next_put_index(&mut self, count: usize) -> Result<usize> {
        let position = self.position;
        if self.limit - position < count {
            return Err(Error::overflow(count, self.limit - position));
        }
        self.position = position + count;
        Ok(position)
    }

    /// Validates that the `count` elements starting at `index` lie within
    /// `[0, limit)`. `count` must be at least one.
    #[inline]
    pub fn check_index(&self, index: usize, count: usize) -> Result<usize> {
        debug_assert!(count > 0);
        if index >= self.limit || count > self.limit - index {
            return Err(Error::index_out_of_range(index, count, self.limit));
        }
        Ok(index)
    }

    /// Validates the range `[index, index + count)` against the limit; an empty
    /// range at the limit is allowed.
    #[inline]
    pub fn check_range(&self, index: usize, count: usize) -> Result<usize> {
        strata_common::result::verify_range(index, count, self.limit)?;
        Ok(index)
    }

    /// Cursor state after moving `remaining` elements to the front:
    /// `position = remaining`, `limit = capacity`, mark discarded.
    pub(crate) fn compacted(&mut self, remaining: usize) {
        debug_assert!(remaining <= self.capacity);
        self.limit = self.capacity;
        self.position = remaining;
        self.mark = None;
    }

    #[cfg(test)]
    pub(crate) fn is_valid(&self) -> bool {
        self.mark.is_none_or(|mark| mark <= self.position)
            && self.position <= self.limit
            && self.limit <= self.capacity
    }
}
