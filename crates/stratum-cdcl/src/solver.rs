//! Core CDCL solver implementation.

use stratum_base::{Literal, Result};
use stratum_format::DimacsCnf;
use tracing::debug;

use crate::bcp::{BcpResult, PropagationQueue, Watch, WatchedLiterals};
use crate::clause_db::ClauseDatabase;
use crate::conflict::{ConflictAnalyzer, ImplicationGraph};
use crate::heuristics::{SavedPhases, VsidsScores};
use crate::var_of;

/// The result of a SAT solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatResult {
    /// Satisfiable with a model; entry `i` is the value of variable `i + 1`.
    Sat(Vec<bool>),
    /// Unsatisfiable.
    Unsat,
    /// Unknown (resource limit reached).
    Unknown(String),
}

/// Configuration for the CDCL solver.
#[derive(Debug, Clone)]
pub struct CdclConfig {
    /// Conflicts before the first restart.
    pub restart_interval: u64,
    /// Factor the restart interval grows by after each restart.
    pub restart_growth: f64,
    /// VSIDS decay factor.
    pub vsids_decay: f64,
    /// Give up with [`SatResult::Unknown`] after this many conflicts.
    pub max_conflicts: Option<u64>,
}

impl Default for CdclConfig {
    fn default() -> Self {
        Self {
            restart_interval: 100,
            restart_growth: 1.5,
            vsids_decay: 0.95,
            max_conflicts: None,
        }
    }
}

/// Solver statistics.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// Number of decisions made.
    pub decisions: u64,
    /// Number of conflicts encountered.
    pub conflicts: u64,
    /// Number of propagated literals.
    pub propagations: u64,
    /// Number of restarts.
    pub restarts: u64,
    /// Number of learned clauses.
    pub learned_clauses: u64,
}

/// The main CDCL solver.
pub struct CdclSolver {
    /// Number of variables.
    num_vars: usize,
    /// Clause database.
    clauses: ClauseDatabase,
    /// Current variable assignments (None = unassigned).
    assignments: Vec<Option<bool>>,
    graph: ImplicationGraph,
    watches: WatchedLiterals,
    queue: PropagationQueue,
    analyzer: ConflictAnalyzer,
    vsids: VsidsScores,
    phases: SavedPhases,
    /// An empty clause or contradicting units were found while loading.
    trivially_unsat: bool,
    /// Configuration.
    config: CdclConfig,
    /// Statistics.
    stats: SolverStats,
}

impl CdclSolver {
    /// Creates a new solver from a DIMACS problem.
    pub fn new(problem: &DimacsCnf) -> Self {
        Self::with_config(problem, CdclConfig::default())
    }

    /// Creates a new solver with custom configuration.
    pub fn with_config(problem: &DimacsCnf, config: CdclConfig) -> Self {
        let num_vars = problem
            .clauses
            .iter()
            .flatten()
            .map(|l| l.unsigned_abs() as usize)
            .max()
            .unwrap_or(0)
            .max(problem.num_vars);

        let mut solver = Self {
            num_vars,
            clauses: ClauseDatabase::new(),
            assignments: vec![None; num_vars],
            graph: ImplicationGraph::new(num_vars),
            watches: WatchedLiterals::new(num_vars),
            queue: PropagationQueue::new(),
            analyzer: ConflictAnalyzer::new(num_vars),
            vsids: VsidsScores::new(num_vars, config.vsids_decay),
            phases: SavedPhases::new(num_vars),
            trivially_unsat: false,
            config,
            stats: SolverStats::default(),
        };
        for clause in &problem.clauses {
            solver.add_clause(clause);
        }
        solver
    }

    /// Number of variables the solver assigns.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Returns solver statistics.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    fn add_clause(&mut self, clause: &[Literal]) {
        if self.trivially_unsat {
            return;
        }
        let mut literals: Vec<Literal> = clause.iter().copied().filter(|&l| l != 0).collect();
        literals.sort_unstable_by_key(|l| (l.unsigned_abs(), *l));
        literals.dedup();
        if literals.windows(2).any(|w| w[0] == -w[1]) {
            return;
        }

        match literals.as_slice() {
            [] => self.trivially_unsat = true,
            [unit] => match self.value(*unit) {
                Some(true) => {}
                Some(false) => self.trivially_unsat = true,
                None => self.assign(*unit, None),
            },
            [first, second, ..] => {
                let (first, second) = (*first, *second);
                let id = self.clauses.add_original(literals);
                self.watches.add_watch(first, id, second);
                self.watches.add_watch(second, id, first);
            }
        }
    }

    /// Solves the problem.
    pub fn solve(&mut self) -> Result<SatResult> {
        if self.trivially_unsat {
            return Ok(SatResult::Unsat);
        }
        let mut restart_limit = self.config.restart_interval as f64;
        let mut since_restart = 0u64;

        // Main CDCL loop
        let result = loop {
            match self.propagate() {
                BcpResult::Conflict(conflict) => {
                    self.stats.conflicts += 1;
                    since_restart += 1;

                    // At decision level 0, problem is UNSAT
                    if self.graph.decision_level() == 0 {
                        break SatResult::Unsat;
                    }
                    if self
                        .config
                        .max_conflicts
                        .is_some_and(|max| self.stats.conflicts >= max)
                    {
                        break SatResult::Unknown(format!(
                            "conflict limit of {} reached",
                            self.stats.conflicts
                        ));
                    }
                    self.learn(conflict);
                }
                BcpResult::Ok => {
                    if since_restart as f64 >= restart_limit {
                        self.stats.restarts += 1;
                        since_restart = 0;
                        restart_limit *= self.config.restart_growth;
                        self.backtrack(0);
                    }
                    match self.vsids.pick(&self.assignments) {
                        Some(var) => {
                            self.stats.decisions += 1;
                            self.graph.new_level();
                            let lit = if self.phases.get(var) {
                                var as Literal + 1
                            } else {
                                -(var as Literal + 1)
                            };
                            self.assign(lit, None);
                        }
                        // All variables assigned - SAT!
                        None => break SatResult::Sat(self.extract_model()),
                    }
                }
            }
        };

        debug!(
            vars = self.num_vars,
            clauses = self.clauses.num_original(),
            decisions = self.stats.decisions,
            conflicts = self.stats.conflicts,
            learned = self.stats.learned_clauses,
            restarts = self.stats.restarts,
            sat = matches!(result, SatResult::Sat(_)),
            "CDCL search finished"
        );
        Ok(result)
    }

    fn value(&self, lit: Literal) -> Option<bool> {
        self.assignments[var_of(lit)].map(|v| v == (lit > 0))
    }

    fn assign(&mut self, lit: Literal, reason: Option<usize>) {
        self.assignments[var_of(lit)] = Some(lit > 0);
        self.graph.assign(lit, reason);
        self.queue.enqueue(lit);
    }

    /// Propagates every queued literal, visiting the clauses that watch its
    /// negation.
    fn propagate(&mut self) -> BcpResult {
        while let Some(lit) = self.queue.dequeue() {
            self.stats.propagations += 1;
            let false_lit = -lit;
            let watches = self.watches.take_watches(false_lit);
            let mut kept = Vec::with_capacity(watches.len());
            let mut conflict = None;

            for (i, watch) in watches.iter().enumerate() {
                if conflict.is_some() {
                    kept.extend_from_slice(&watches[i..]);
                    break;
                }
                if self.value(watch.blocker) == Some(true) {
                    kept.push(*watch);
                    continue;
                }

                let Some(clause) = self.clauses.get_mut(watch.clause_id) else {
                    continue;
                };
                let literals = &mut clause.literals;
                if literals[0] == false_lit {
                    literals.swap(0, 1);
                }
                let first = literals[0];
                let first_value = self.assignments[var_of(first)].map(|v| v == (first > 0));
                if first_value == Some(true) {
                    kept.push(Watch {
                        clause_id: watch.clause_id,
                        blocker: first,
                    });
                    continue;
                }

                // Look for a replacement watch
                let assignments = &self.assignments;
                let replacement = literals[2..].iter().position(|&l| {
                    assignments[var_of(l)].map(|v| v == (l > 0)) != Some(false)
                });
                if let Some(offset) = replacement {
                    literals.swap(1, offset + 2);
                    let new_watch = literals[1];
                    self.watches.add_watch(new_watch, watch.clause_id, first);
                    continue;
                }

                kept.push(*watch);
                match first_value {
                    Some(false) => conflict = Some(watch.clause_id),
                    _ => self.assign(first, Some(watch.clause_id)),
                }
            }

            *self.watches.get_watches_mut(false_lit) = kept;
            if let Some(id) = conflict {
                self.queue.clear();
                return BcpResult::Conflict(id);
            }
        }
        BcpResult::Ok
    }

    fn learn(&mut self, conflict: usize) {
        let learned =
            self.analyzer
                .analyze(conflict, &self.clauses, &self.graph, &mut self.vsids);
        self.backtrack(learned.backjump_level);
        self.stats.learned_clauses += 1;
        self.vsids.decay();

        let asserting = learned.literals[0];
        if learned.literals.len() == 1 {
            self.assign(asserting, None);
            return;
        }
        let second = learned.literals[1];
        let id = self
            .clauses
            .add_learned_with_lbd(learned.literals, learned.lbd);
        self.watches.add_watch(asserting, id, second);
        self.watches.add_watch(second, id, asserting);
        self.assign(asserting, Some(id));
    }

    /// Backtracks to the given level.
    fn backtrack(&mut self, level: usize) {
        for lit in self.graph.backtrack(level) {
            let var = var_of(lit);
            self.phases.save(var, lit > 0);
            self.assignments[var] = None;
            self.vsids.reinsert(var);
        }
        self.queue.clear();
    }

    fn extract_model(&self) -> Vec<bool> {
        self.assignments.iter().map(|v| v.unwrap_or(false)).collect()
    }
}
