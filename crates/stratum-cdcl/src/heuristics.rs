//! Decision heuristics: VSIDS activity and saved phases.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A variable with the score it had when queued.
#[derive(Debug, Clone, Copy)]
struct VarScore {
    var: usize,
    score: f64,
}

impl PartialEq for VarScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VarScore {}

impl Ord for VarScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on score, lower index first on ties
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.var.cmp(&self.var))
    }
}

impl PartialOrd for VarScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// VSIDS (Variable State Independent Decaying Sum) scores.
///
/// The queue is updated lazily: bumping pushes a fresh entry and stale
/// entries are discarded when they surface.
#[derive(Debug)]
pub struct VsidsScores {
    /// Activity score for each variable.
    scores: Vec<f64>,
    /// Decay factor.
    decay: f64,
    /// Increment value.
    increment: f64,
    queue: BinaryHeap<VarScore>,
}

impl VsidsScores {
    /// Creates new VSIDS scores.
    pub fn new(num_vars: usize, decay: f64) -> Self {
        let queue = (0..num_vars).map(|var| VarScore { var, score: 0.0 }).collect();
        Self {
            scores: vec![0.0; num_vars],
            decay,
            increment: 1.0,
            queue,
        }
    }

    /// Bumps the activity of a variable.
    pub fn bump(&mut self, var: usize) {
        self.scores[var] += self.increment;

        // Rescale if too large
        if self.scores[var] > 1e100 {
            for score in &mut self.scores {
                *score *= 1e-100;
            }
            self.increment *= 1e-100;
            self.rebuild();
        } else {
            self.queue.push(VarScore {
                var,
                score: self.scores[var],
            });
        }
    }

    /// Decays all activities.
    pub fn decay(&mut self) {
        self.increment /= self.decay;
    }

    /// Gets the score for a variable.
    pub fn score(&self, var: usize) -> f64 {
        self.scores[var]
    }

    /// Makes an unassigned variable eligible for branching again.
    pub fn reinsert(&mut self, var: usize) {
        self.queue.push(VarScore {
            var,
            score: self.scores[var],
        });
    }

    /// Picks the unassigned variable with the highest activity.
    ///
    /// Returns None if all variables are assigned.
    pub fn pick(&mut self, assignments: &[Option<bool>]) -> Option<usize> {
        while let Some(entry) = self.queue.pop() {
            if assignments[entry.var].is_none() && entry.score == self.scores[entry.var] {
                return Some(entry.var);
            }
        }
        None
    }

    fn rebuild(&mut self) {
        self.queue = self
            .scores
            .iter()
            .enumerate()
            .map(|(var, &score)| VarScore { var, score })
            .collect();
    }
}

/// Last polarity each variable was assigned, reused on the next decision.
#[derive(Debug, Clone)]
pub struct SavedPhases {
    phases: Vec<bool>,
}

impl SavedPhases {
    /// All phases start out negative.
    pub fn new(num_vars: usize) -> Self {
        Self {
            phases: vec![false; num_vars],
        }
    }

    pub fn save(&mut self, var: usize, value: bool) {
        self.phases[var] = value;
    }

    pub fn get(&self, var: usize) -> bool {
        self.phases[var]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_prefers_bumped_unassigned() {
        let mut vsids = VsidsScores::new(3, 0.95);
        vsids.bump(2);
        vsids.bump(1);
        vsids.bump(2);
        let mut assigned = vec![None; 3];
        assert_eq!(vsids.pick(&assigned), Some(2));
        assigned[2] = Some(true);
        assert_eq!(vsids.pick(&assigned), Some(1));
        assigned[1] = Some(false);
        assert_eq!(vsids.pick(&assigned), Some(0));
        assigned[0] = Some(false);
        assert_eq!(vsids.pick(&assigned), None);
    }

    #[test]
    fn test_reinsert_after_unassign() {
        let mut vsids = VsidsScores::new(1, 0.95);
        let mut assigned = vec![None];
        assert_eq!(vsids.pick(&assigned), Some(0));
        assigned[0] = Some(true);
        assert_eq!(vsids.pick(&assigned), None);
        assigned[0] = None;
        vsids.reinsert(0);
        assert_eq!(vsids.pick(&assigned), Some(0));
    }

    #[test]
    fn test_decay_grows_increment() {
        let mut vsids = VsidsScores::new(2, 0.5);
        vsids.bump(0);
        vsids.decay();
        vsids.bump(1);
        assert!(vsids.score(1) > vsids.score(0));
    }
}
