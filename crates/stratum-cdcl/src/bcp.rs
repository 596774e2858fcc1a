//! Boolean Constraint Propagation (BCP).
//!
//! Uses watched literals for efficient propagation. A clause is listed under
//! each of its two watched literals and is revisited only when one of them
//! becomes false.

use stratum_base::Literal;

/// Result of BCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcpResult {
    /// No conflict, propagation complete.
    Ok,
    /// Conflict detected in the given clause.
    Conflict(usize),
}

/// A watched literal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    /// The clause being watched.
    pub clause_id: usize,
    /// Another literal of the clause; if it is true the clause is skipped.
    pub blocker: Literal,
}

/// Watched literal data structure.
#[derive(Debug, Default)]
pub struct WatchedLiterals {
    /// For each literal, list of clauses watching it.
    watches: Vec<Vec<Watch>>,
}

impl WatchedLiterals {
    /// Creates a new watched literals structure.
    pub fn new(num_vars: usize) -> Self {
        // 2 * num_vars for positive and negative literals
        Self {
            watches: vec![Vec::new(); num_vars * 2],
        }
    }

    /// Converts a literal to an index.
    fn lit_to_index(lit: Literal) -> usize {
        let var = lit.unsigned_abs() as usize - 1;
        if lit > 0 {
            var * 2
        } else {
            var * 2 + 1
        }
    }

    /// Adds a watch for a literal.
    pub fn add_watch(&mut self, lit: Literal, clause_id: usize, blocker: Literal) {
        let idx = Self::lit_to_index(lit);
        self.watches[idx].push(Watch { clause_id, blocker });
    }

    /// Gets watches for a literal.
    pub fn get_watches(&self, lit: Literal) -> &[Watch] {
        let idx = Self::lit_to_index(lit);
        &self.watches[idx]
    }

    /// Gets mutable watches for a literal.
    pub fn get_watches_mut(&mut self, lit: Literal) -> &mut Vec<Watch> {
        let idx = Self::lit_to_index(lit);
        &mut self.watches[idx]
    }

    /// Detaches the watch list of a literal so it can be rebuilt while other
    /// lists are modified.
    pub fn take_watches(&mut self, lit: Literal) -> Vec<Watch> {
        std::mem::take(self.get_watches_mut(lit))
    }
}

/// Propagation queue.
#[derive(Debug, Default)]
pub struct PropagationQueue {
    queue: Vec<Literal>,
    head: usize,
}

impl PropagationQueue {
    /// Creates a new propagation queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a literal for propagation.
    pub fn enqueue(&mut self, lit: Literal) {
        self.queue.push(lit);
    }

    /// Dequeues the next literal.
    pub fn dequeue(&mut self) -> Option<Literal> {
        let lit = self.queue.get(self.head).copied()?;
        self.head += 1;
        Some(lit)
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.head >= self.queue.len()
    }

    /// Clears the queue.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.head = 0;
    }
}
