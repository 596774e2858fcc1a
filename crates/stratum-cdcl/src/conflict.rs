//! Conflict analysis with 1-UIP resolution.

use stratum_base::Literal;

use crate::clause_db::ClauseDatabase;
use crate::heuristics::VsidsScores;
use crate::var_of;

/// Implication graph: the trail of assigned literals together with the
/// decision level and reason clause of every variable.
#[derive(Debug)]
pub struct ImplicationGraph {
    /// For each variable, the reason clause that implied it.
    reasons: Vec<Option<usize>>,
    /// For each variable, the decision level it was assigned at.
    levels: Vec<usize>,
    /// Trail of assigned literals.
    trail: Vec<Literal>,
    /// Trail length at the start of each decision level above zero.
    trail_lim: Vec<usize>,
}

impl ImplicationGraph {
    /// Creates a new implication graph.
    pub fn new(num_vars: usize) -> Self {
        Self {
            reasons: vec![None; num_vars],
            levels: vec![0; num_vars],
            trail: Vec::new(),
            trail_lim: Vec::new(),
        }
    }

    /// Current decision level.
    pub fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    /// Opens a new decision level.
    pub fn new_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    /// Records an assignment at the current level.
    pub fn assign(&mut self, lit: Literal, reason: Option<usize>) {
        let var = var_of(lit);
        self.reasons[var] = reason;
        self.levels[var] = self.decision_level();
        self.trail.push(lit);
    }

    /// Gets the reason for an assignment.
    pub fn reason(&self, var: usize) -> Option<usize> {
        self.reasons[var]
    }

    /// Gets the level of an assignment.
    pub fn level(&self, var: usize) -> usize {
        self.levels[var]
    }

    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    /// Undoes every assignment above `level`, returning the removed literals
    /// newest first.
    pub fn backtrack(&mut self, level: usize) -> Vec<Literal> {
        let Some(&start) = self.trail_lim.get(level) else {
            return Vec::new();
        };
        let undone: Vec<Literal> = self.trail.drain(start..).rev().collect();
        for &lit in &undone {
            self.reasons[var_of(lit)] = None;
        }
        self.trail_lim.truncate(level);
        undone
    }
}

/// Outcome of analysing one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedClause {
    /// Asserting literal first, then the literal of the backjump level.
    pub literals: Vec<Literal>,
    pub backjump_level: usize,
    pub lbd: u32,
}

/// Conflict analyzer.
#[derive(Debug)]
pub struct ConflictAnalyzer {
    /// Seen flags for variables.
    seen: Vec<bool>,
}

impl ConflictAnalyzer {
    /// Creates a new conflict analyzer.
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: vec![false; num_vars],
        }
    }

    /// Resolves the conflict clause against reasons on the trail until a
    /// single literal of the current level remains.
    ///
    /// Every variable that takes part in the resolution gets a VSIDS bump.
    pub fn analyze(
        &mut self,
        conflict: usize,
        clauses: &ClauseDatabase,
        graph: &ImplicationGraph,
        vsids: &mut VsidsScores,
    ) -> LearnedClause {
        let current = graph.decision_level();
        let trail = graph.trail();
        let mut learnt: Vec<Literal> = vec![0];
        let mut pending = 0usize;
        let mut resolved: Option<Literal> = None;
        let mut clause = conflict;
        let mut index = trail.len();

        loop {
            for &q in clauses.literals(clause) {
                if Some(q) == resolved {
                    continue;
                }
                let var = var_of(q);
                if self.seen[var] || graph.level(var) == 0 {
                    continue;
                }
                self.seen[var] = true;
                vsids.bump(var);
                if graph.level(var) >= current {
                    pending += 1;
                } else {
                    learnt.push(q);
                }
            }

            // Walk back to the most recent literal involved in the conflict
            let lit = loop {
                if index == 0 {
                    break None;
                }
                index -= 1;
                if self.seen[var_of(trail[index])] {
                    break Some(trail[index]);
                }
            };
            let Some(lit) = lit else { break };
            self.seen[var_of(lit)] = false;
            pending = pending.saturating_sub(1);
            learnt[0] = -lit;
            if pending == 0 {
                break;
            }
            match graph.reason(var_of(lit)) {
                Some(reason) => {
                    clause = reason;
                    resolved = Some(lit);
                }
                None => break,
            }
        }

        for &lit in &learnt[1..] {
            self.seen[var_of(lit)] = false;
        }

        // Put the highest remaining level second so it is watched
        let mut backjump_level = 0;
        if learnt.len() > 1 {
            let mut best = 1;
            for i in 2..learnt.len() {
                if graph.level(var_of(learnt[i])) > graph.level(var_of(learnt[best])) {
                    best = i;
                }
            }
            learnt.swap(1, best);
            backjump_level = graph.level(var_of(learnt[1]));
        }

        let mut levels: Vec<usize> = learnt.iter().map(|&l| graph.level(var_of(l))).collect();
        levels.sort_unstable();
        levels.dedup();

        LearnedClause {
            literals: learnt,
            backjump_level,
            lbd: levels.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtrack_returns_undone_newest_first() {
        let mut graph = ImplicationGraph::new(3);
        graph.assign(1, None);
        graph.new_level();
        graph.assign(-2, None);
        graph.assign(3, Some(0));
        assert_eq!(graph.decision_level(), 1);
        assert_eq!(graph.level(2), 1);
        assert_eq!(graph.backtrack(0), vec![3, -2]);
        assert_eq!(graph.trail(), &[1]);
        assert_eq!(graph.reason(2), None);
        assert_eq!(graph.decision_level(), 0);
    }

    #[test]
    fn test_first_uip_of_simple_conflict() {
        // Level 1 decides 1, level 2 decides 2; (-1 v -2 v 3) and
        // (-1 v -2 v -3) then conflict.
        let mut db = ClauseDatabase::new();
        let implies = db.add_original(vec![3, -1, -2]);
        let conflict = db.add_original(vec![-3, -1, -2]);
        let mut graph = ImplicationGraph::new(3);
        graph.new_level();
        graph.assign(1, None);
        graph.new_level();
        graph.assign(2, None);
        graph.assign(3, Some(implies));

        let mut vsids = VsidsScores::new(3, 0.95);
        let learned = ConflictAnalyzer::new(3).analyze(conflict, &db, &graph, &mut vsids);
        assert_eq!(learned.literals, vec![-2, -1]);
        assert_eq!(learned.backjump_level, 1);
        assert_eq!(learned.lbd, 2);
        assert!(vsids.score(2) > 0.0);
    }
}
