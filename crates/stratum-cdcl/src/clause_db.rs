//! Clause database management.

use stratum_base::Literal;

/// A clause stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredClause {
    /// Literals in the clause. The first two are the watched ones.
    pub literals: Vec<Literal>,
    /// Whether this is a learned clause.
    pub learned: bool,
    /// Literal Block Distance (for learned clauses).
    pub lbd: Option<u32>,
}

/// Database for storing clauses.
#[derive(Debug, Default)]
pub struct ClauseDatabase {
    /// All clauses.
    clauses: Vec<StoredClause>,
    /// Number of original clauses.
    num_original: usize,
}

impl ClauseDatabase {
    /// Creates a new empty clause database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an original clause.
    pub fn add_original(&mut self, literals: Vec<Literal>) -> usize {
        self.num_original += 1;
        self.push(StoredClause {
            literals,
            learned: false,
            lbd: None,
        })
    }

    /// Adds a learned clause with LBD.
    pub fn add_learned_with_lbd(&mut self, literals: Vec<Literal>, lbd: u32) -> usize {
        self.push(StoredClause {
            literals,
            learned: true,
            lbd: Some(lbd),
        })
    }

    fn push(&mut self, clause: StoredClause) -> usize {
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    /// Gets a clause by ID.
    pub fn get(&self, id: usize) -> Option<&StoredClause> {
        self.clauses.get(id)
    }

    /// Gets a clause by ID for in-place watch reordering.
    pub fn get_mut(&mut self, id: usize) -> Option<&mut StoredClause> {
        self.clauses.get_mut(id)
    }

    /// Literals of a clause, empty for an unknown ID.
    pub fn literals(&self, id: usize) -> &[Literal] {
        self.get(id).map_or(&[], |c| c.literals.as_slice())
    }

    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of clauses that came from the input problem.
    pub fn num_original(&self) -> usize {
        self.num_original
    }

    /// Number of clauses learned from conflicts.
    pub fn num_learned(&self) -> usize {
        self.clauses.len() - self.num_original
    }
}
