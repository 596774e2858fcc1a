//! LIFO evaluation stack shared by every compiler level.

use crate::error::{Error, Result};

/// A LIFO stack of symbols (or anything else a level chooses to stack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Pushes an item on top.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Pops the top item.
    pub fn pop(&mut self) -> Result<T> {
        self.items.pop().ok_or(Error::StackUnderflow)
    }

    /// Pops `n` items, returned in push order (deepest first).
    pub fn pop_many(&mut self, n: usize) -> Result<Vec<T>> {
        if n > self.items.len() {
            return Err(Error::StackUnderflow);
        }
        Ok(self.items.split_off(self.items.len() - n))
    }

    /// Returns the top item without removing it.
    pub fn peek(&self) -> Result<&T> {
        self.items.last().ok_or(Error::StackUnderflow)
    }

    /// Swaps the two topmost items.
    pub fn swap(&mut self) -> Result<()> {
        let len = self.items.len();
        if len < 2 {
            return Err(Error::StackUnderflow);
        }
        self.items.swap(len - 1, len - 2);
        Ok(())
    }

    /// Returns the number of stacked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> Stack<T> {
    /// Pushes a copy of the top item.
    pub fn duplicate(&mut self) -> Result<()> {
        let top = self.peek()?.clone();
        self.items.push(top);
        Ok(())
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
