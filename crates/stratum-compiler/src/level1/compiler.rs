//! Level-1 compiler: boolean stack machine to CNF.
//!
//! Every gate gets a fresh literal and its Tseitin defining clauses; the only
//! way a constraint enters the formula is `invariant`.

use super::Instruction;
use stratum_base::{Literal, Registry, Result, Stack, Symbol, SymbolTable};
use stratum_format::{CnfWriter, CompiledProgram, Program};
use std::collections::BTreeMap;
use tracing::debug;

const TRUE_SYMBOL: &str = "$$$_L1_TRUE";
const FALSE_SYMBOL: &str = "$$$_L1_FALSE";

/// Compiles a Level-1 program into DIMACS text plus the literal table.
pub fn compile(program: Program<Instruction>) -> Result<CompiledProgram> {
    let mut compiler = Level1Compiler::new();
    for instruction in &program.instructions {
        compiler
            .execute(instruction)
            .map_err(|e| e.at_level(1, instruction))?;
    }

    debug!(
        literals = compiler.registry.max_literal(),
        clauses = compiler.cnf.num_clauses(),
        variables = compiler.variables.len(),
        "level 1 compiled"
    );

    let mut metadata = program.metadata;
    metadata.level1_variables = compiler.variables;
    Ok(CompiledProgram {
        metadata,
        dimacs: compiler.cnf.to_dimacs(),
    })
}

struct Level1Compiler {
    stack: Stack<Symbol>,
    table: SymbolTable<Literal>,
    registry: Registry,
    cnf: CnfWriter,
    variables: BTreeMap<Symbol, Literal>,
}

impl Level1Compiler {
    fn new() -> Self {
        Self {
            stack: Stack::new(),
            table: SymbolTable::new(),
            registry: Registry::new("L1"),
            cnf: CnfWriter::new(),
            variables: BTreeMap::new(),
        }
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Push { symbol } => {
                if !self.table.contains(symbol) {
                    let lit = self.registry.literal();
                    self.table.set(symbol.clone(), lit);
                    // Registers the variable even if nothing else constrains it.
                    self.cnf.add_clause([lit, -lit]);
                }
                self.stack.push(symbol.clone());
            }
            Instruction::Pop { symbol } => {
                let lit = self.pop_literal()?;
                self.table.set(symbol.clone(), lit);
            }
            Instruction::True => self.push_constant(TRUE_SYMBOL, true),
            Instruction::False => self.push_constant(FALSE_SYMBOL, false),
            Instruction::Not => {
                let a = self.pop_literal()?;
                let out = self.not(a);
                self.push_literal(out);
            }
            Instruction::And => {
                let (a, b) = self.pop_pair()?;
                let out = self.and(a, b);
                self.push_literal(out);
            }
            Instruction::Or => {
                let (a, b) = self.pop_pair()?;
                let out = self.or(a, b);
                self.push_literal(out);
            }
            Instruction::Equal => {
                let (a, b) = self.pop_pair()?;
                let out = self.equal(a, b);
                self.push_literal(out);
            }
            Instruction::If => {
                let condition = self.pop_literal()?;
                let consequent = self.pop_literal()?;
                let alternative = self.pop_literal()?;
                // (c ∧ t) ∨ (¬c ∧ f)
                let taken = self.and(condition, consequent);
                let negated = self.not(condition);
                let skipped = self.and(negated, alternative);
                let out = self.or(taken, skipped);
                self.push_literal(out);
            }
            Instruction::Duplicate => self.stack.duplicate()?,
            Instruction::Swap => self.stack.swap()?,
            Instruction::Variable { symbol } => {
                let lit = *self.table.get(symbol)?;
                self.variables.insert(symbol.clone(), lit);
            }
            Instruction::Invariant => {
                let lit = self.pop_literal()?;
                self.cnf.add_clause([lit]);
            }
        }
        Ok(())
    }

    fn push_constant(&mut self, symbol: &str, value: bool) {
        if !self.table.contains(symbol) {
            let lit = self.registry.literal();
            self.table.set(symbol, lit);
            self.cnf.add_clause([if value { lit } else { -lit }]);
        }
        self.stack.push(symbol.to_string());
    }

    fn pop_literal(&mut self) -> Result<Literal> {
        let symbol = self.stack.pop()?;
        self.table.get(&symbol).copied()
    }

    fn pop_pair(&mut self) -> Result<(Literal, Literal)> {
        let b = self.pop_literal()?;
        let a = self.pop_literal()?;
        Ok((a, b))
    }

    fn push_literal(&mut self, lit: Literal) {
        let symbol = self.registry.symbol();
        self.table.set(symbol.clone(), lit);
        self.stack.push(symbol);
    }

    fn not(&mut self, a: Literal) -> Literal {
        let out = self.registry.literal();
        self.cnf.add_clause([a, out]);
        self.cnf.add_clause([-a, -out]);
        out
    }

    fn and(&mut self, a: Literal, b: Literal) -> Literal {
        let out = self.registry.literal();
        self.cnf.add_clause([-a, -b, out]);
        self.cnf.add_clause([a, -out]);
        self.cnf.add_clause([b, -out]);
        out
    }

    fn or(&mut self, a: Literal, b: Literal) -> Literal {
        let out = self.registry.literal();
        self.cnf.add_clause([a, b, -out]);
        self.cnf.add_clause([-a, out]);
        self.cnf.add_clause([-b, out]);
        out
    }

    fn equal(&mut self, a: Literal, b: Literal) -> Literal {
        let out = self.registry.literal();
        self.cnf.add_clause([a, b, out]);
        self.cnf.add_clause([a, -b, -out]);
        self.cnf.add_clause([-a, b, -out]);
        self.cnf.add_clause([-a, -b, out]);
        out
    }
}
