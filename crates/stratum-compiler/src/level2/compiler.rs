//! Level-2 compiler: typed booleans and integers to Level-1 gates.

use super::circuit::{Bits, CircuitBuilder};
use super::{Constant, Instruction};
use crate::level1::Instruction as L1;
use stratum_base::error::type_mismatch;
use stratum_base::{Error, Registry, Result, Stack, Symbol, SymbolTable};
use stratum_format::{Level2Variable, Program, ScalarType};
use std::collections::BTreeMap;
use tracing::debug;

/// A Level-2 binding: one Level-1 symbol, or a twos-complement bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Typed {
    Boolean(Symbol),
    Integer(Bits),
}

impl Typed {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
        }
    }

    fn into_boolean(self) -> Result<Symbol> {
        match self {
            Self::Boolean(bit) => Ok(bit),
            other => Err(type_mismatch("boolean", other.type_name())),
        }
    }

    fn into_integer(self) -> Result<Bits> {
        match self {
            Self::Integer(bits) => Ok(bits),
            other => Err(type_mismatch("integer", other.type_name())),
        }
    }
}

/// Compiles a Level-2 program into a Level-1 program.
pub fn compile(program: Program<Instruction>) -> Result<Program<L1>> {
    let mut compiler = Level2Compiler::new();
    for instruction in &program.instructions {
        compiler
            .execute(instruction)
            .map_err(|e| e.at_level(2, instruction))?;
    }

    let instructions = compiler.circuit.into_instructions();
    debug!(
        instructions = instructions.len(),
        variables = compiler.variables.len(),
        "level 2 compiled"
    );

    let mut metadata = program.metadata;
    metadata.level2_variables = compiler.variables;
    Ok(Program {
        instructions,
        metadata,
    })
}

struct Level2Compiler {
    stack: Stack<Symbol>,
    table: SymbolTable<Typed>,
    circuit: CircuitBuilder,
    variables: BTreeMap<Symbol, Level2Variable>,
    scratch: Registry,
}

impl Level2Compiler {
    fn new() -> Self {
        Self {
            stack: Stack::new(),
            table: SymbolTable::new(),
            circuit: CircuitBuilder::new(),
            variables: BTreeMap::new(),
            scratch: Registry::new("L2_TMP"),
        }
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Boolean { symbol } => {
                let bits = self.circuit.declare(1);
                self.table.set(symbol.clone(), Typed::Boolean(bits[0].clone()));
            }
            Instruction::Integer { symbol, width } => {
                if *width == 0 {
                    return Err(Error::InvalidWidth(format!(
                        "integer '{symbol}' needs at least one bit"
                    )));
                }
                let bits = self.circuit.declare(*width);
                self.table.set(symbol.clone(), Typed::Integer(bits));
            }
            Instruction::Constant { value } => {
                let typed = match *value {
                    Constant::Boolean(b) => Typed::Boolean(self.circuit.constant(b)),
                    Constant::Integer(n) => Typed::Integer(self.circuit.integer(n)),
                };
                self.push_typed(typed);
            }
            Instruction::Push { symbol } => {
                self.table.get(symbol)?;
                self.stack.push(symbol.clone());
            }
            Instruction::Pop { symbol } => {
                let typed = self.pop()?;
                self.table.set(symbol.clone(), typed);
            }
            Instruction::Duplicate => self.stack.duplicate()?,
            Instruction::Swap => self.stack.swap()?,
            Instruction::Variable { symbol } => self.expose(symbol)?,
            Instruction::Invariant => {
                let bit = self.pop()?.into_boolean()?;
                self.circuit.emit(L1::push(bit));
                self.circuit.emit(L1::Invariant);
            }
            Instruction::Not => {
                let a = self.pop()?.into_boolean()?;
                let out = self.circuit.not(&a);
                self.push_typed(Typed::Boolean(out));
            }
            Instruction::And | Instruction::Or => {
                let b = self.pop()?.into_boolean()?;
                let a = self.pop()?.into_boolean()?;
                let out = if matches!(instruction, Instruction::And) {
                    self.circuit.and(&a, &b)
                } else {
                    self.circuit.or(&a, &b)
                };
                self.push_typed(Typed::Boolean(out));
            }
            Instruction::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                let out = match (a, b) {
                    (Typed::Boolean(a), Typed::Boolean(b)) => self.circuit.equal(&a, &b),
                    (Typed::Integer(a), Typed::Integer(b)) => self.circuit.equal_bits(&a, &b),
                    (a, b) => return Err(type_mismatch(a.type_name(), b.type_name())),
                };
                self.push_typed(Typed::Boolean(out));
            }
            Instruction::If => {
                let condition = self.pop()?.into_boolean()?;
                let consequent = self.pop()?;
                let alternative = self.pop()?;
                let typed = match (consequent, alternative) {
                    (Typed::Boolean(t), Typed::Boolean(f)) => {
                        Typed::Boolean(self.circuit.ite(&condition, &t, &f))
                    }
                    (Typed::Integer(t), Typed::Integer(f)) => {
                        Typed::Integer(self.circuit.ite_bits(&condition, &t, &f))
                    }
                    (t, f) => return Err(type_mismatch(t.type_name(), f.type_name())),
                };
                self.push_typed(typed);
            }
            Instruction::Add | Instruction::Subtract => {
                let (a, b) = self.pop_integers()?;
                let width = a.len().max(b.len()) + 1;
                let out = if matches!(instruction, Instruction::Add) {
                    self.circuit.add(&a, &b, width)
                } else {
                    self.circuit.subtract(&a, &b, width)
                };
                self.push_typed(Typed::Integer(out));
            }
            Instruction::Multiply => {
                let (a, b) = self.pop_integers()?;
                let out = self.circuit.multiply(&a, &b, a.len() + b.len());
                self.push_typed(Typed::Integer(out));
            }
            Instruction::Divide | Instruction::Modulo => {
                let (a, b) = self.pop_integers()?;
                let (quotient, remainder) = self.circuit.divide(&a, &b);
                // A zero divisor has no answer, so the program becomes unsatisfiable.
                let nonzero = self.circuit.or_all(&b);
                self.circuit.emit(L1::push(nonzero));
                self.circuit.emit(L1::Invariant);
                let out = if matches!(instruction, Instruction::Divide) {
                    quotient
                } else {
                    remainder
                };
                self.push_typed(Typed::Integer(out));
            }
            Instruction::Negate | Instruction::Absolute => {
                let a = self.pop()?.into_integer()?;
                let width = a.len() + 1;
                let out = if matches!(instruction, Instruction::Negate) {
                    self.circuit.negate(&a, width)
                } else {
                    self.circuit.absolute(&a, width)
                };
                self.push_typed(Typed::Integer(out));
            }
            Instruction::LessThan
            | Instruction::GreaterThan
            | Instruction::LessEqual
            | Instruction::GreaterEqual => {
                let (a, b) = self.pop_integers()?;
                let out = match instruction {
                    Instruction::LessThan => self.circuit.less_than(&a, &b),
                    Instruction::GreaterThan => self.circuit.less_than(&b, &a),
                    Instruction::LessEqual => {
                        let greater = self.circuit.less_than(&b, &a);
                        self.circuit.not(&greater)
                    }
                    _ => {
                        let less = self.circuit.less_than(&a, &b);
                        self.circuit.not(&less)
                    }
                };
                self.push_typed(Typed::Boolean(out));
            }
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Typed> {
        let symbol = self.stack.pop()?;
        self.table.get(&symbol).cloned()
    }

    /// Pops the right operand, then the left.
    fn pop_integers(&mut self) -> Result<(Bits, Bits)> {
        let b = self.pop()?.into_integer()?;
        let a = self.pop()?.into_integer()?;
        Ok((a, b))
    }

    fn push_typed(&mut self, typed: Typed) {
        let symbol = self.scratch.symbol();
        self.table.set(symbol.clone(), typed);
        self.stack.push(symbol);
    }

    fn expose(&mut self, symbol: &str) -> Result<()> {
        let (ty, symbols) = match self.table.get(symbol)?.clone() {
            Typed::Boolean(bit) => (ScalarType::Boolean, vec![bit]),
            Typed::Integer(bits) => (ScalarType::Integer, bits),
        };
        for bit in &symbols {
            self.circuit.emit(L1::variable(bit.clone()));
        }
        self.variables
            .insert(symbol.to_string(), Level2Variable { ty, symbols });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level1;
    use proptest::prelude::*;
    use stratum_base::twos_complement;
    use stratum_format::{CompiledProgram, DimacsCnf};

    /// Pins every input bit with invariants, then reads the outputs from the
    /// single model the formula admits.
    fn evaluate(
        declarations: &[(&str, usize, i64)],
        body: Vec<Instruction>,
        outputs: &[&str],
    ) -> Option<Vec<i64>> {
        let mut instructions = Vec::new();
        for &(name, width, value) in declarations {
            instructions.push(Instruction::Integer {
                symbol: name.into(),
                width,
            });
            instructions.push(Instruction::push(name));
            instructions.push(Instruction::integer(value));
            instructions.push(Instruction::Equal);
            instructions.push(Instruction::Invariant);
        }
        instructions.extend(body);
        for name in outputs {
            instructions.push(Instruction::variable(*name));
        }

        let level1 = compile(Program::new(instructions)).unwrap();
        let compiled = level1::compile(level1).unwrap();
        let model = propagate(&compiled)?;
        Some(
            outputs
                .iter()
                .map(|name| read(&compiled, &model, name))
                .collect(),
        )
    }

    /// Unit propagation is complete here: every gate output is fixed once its
    /// inputs are, and the inputs are fixed by unit clauses.
    fn propagate(compiled: &CompiledProgram) -> Option<Vec<Option<bool>>> {
        let cnf = DimacsCnf::from_str(&compiled.dimacs).unwrap();
        let mut values = vec![None; cnf.num_vars + 1];
        loop {
            let mut changed = false;
            for clause in &cnf.clauses {
                let mut open = Vec::new();
                let mut satisfied = false;
                for &lit in clause {
                    match values[lit.unsigned_abs() as usize] {
                        Some(v) if v == (lit > 0) => satisfied = true,
                        Some(_) => {}
                        None => open.push(lit),
                    }
                }
                if satisfied {
                    continue;
                }
                match open.as_slice() {
                    [] => return None,
                    [lit] => {
                        values[lit.unsigned_abs() as usize] = Some(*lit > 0);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return Some(values);
            }
        }
    }

    fn read(compiled: &CompiledProgram, model: &[Option<bool>], name: &str) -> i64 {
        let variable = &compiled.metadata.level2_variables[name];
        let bits: Vec<bool> = variable
            .symbols
            .iter()
            .map(|symbol| {
                let lit = compiled.metadata.level1_variables[symbol];
                model[lit.unsigned_abs() as usize].unwrap() == (lit > 0)
            })
            .collect();
        match variable.ty {
            ScalarType::Boolean => i64::from(bits[0]),
            ScalarType::Integer => twos_complement::decode(&bits).unwrap(),
        }
    }

    fn binary(op: Instruction, a: i64, b: i64) -> Option<i64> {
        evaluate(
            &[("a", 5, a), ("b", 4, b)],
            vec![
                Instruction::push("a"),
                Instruction::push("b"),
                op,
                Instruction::pop("out"),
            ],
            &["out"],
        )
        .map(|values| values[0])
    }

    #[test]
    fn test_add_widens() {
        assert_eq!(binary(Instruction::Add, 15, 7), Some(22));
        assert_eq!(binary(Instruction::Add, -16, -8), Some(-24));
    }

    #[test]
    fn test_divide_by_zero_is_unsatisfiable() {
        assert_eq!(binary(Instruction::Divide, 9, 0), None);
        assert_eq!(binary(Instruction::Modulo, 9, 0), None);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(Instruction::LessThan, -3, 2), Some(1));
        assert_eq!(binary(Instruction::GreaterThan, -3, 2), Some(0));
        assert_eq!(binary(Instruction::LessEqual, 2, 2), Some(1));
        assert_eq!(binary(Instruction::GreaterEqual, 1, 2), Some(0));
        assert_eq!(binary(Instruction::Equal, -1, -1), Some(1));
    }

    #[test]
    fn test_unary_and_if() {
        let values = evaluate(
            &[("a", 4, -8), ("b", 3, 3)],
            vec![
                Instruction::push("a"),
                Instruction::Negate,
                Instruction::pop("negated"),
                Instruction::push("a"),
                Instruction::Absolute,
                Instruction::pop("magnitude"),
                Instruction::push("a"),
                Instruction::push("b"),
                Instruction::boolean(false),
                Instruction::If,
                Instruction::pop("chosen"),
            ],
            &["negated", "magnitude", "chosen"],
        );
        assert_eq!(values, Some(vec![8, 8, -8]));
    }

    #[test]
    fn test_declaration_exposes_bits() {
        let level1 = compile(Program::new(vec![
            Instruction::Integer {
                symbol: "x".into(),
                width: 3,
            },
            Instruction::variable("x"),
        ]))
        .unwrap();
        assert_eq!(level1.metadata.level2_variables["x"].symbols.len(), 3);
        assert_eq!(level1.instructions.len(), 9);
    }

    #[test]
    fn test_type_errors_are_tagged() {
        let err = compile(Program::new(vec![
            Instruction::boolean(true),
            Instruction::integer(1),
            Instruction::Add,
        ]))
        .unwrap_err();
        assert_eq!(err.originating_level(), Some(2));
        assert!(matches!(err.root(), Error::TypeMismatch { .. }));

        let err = compile(Program::new(vec![Instruction::Integer {
            symbol: "x".into(),
            width: 0,
        }]))
        .unwrap_err();
        assert!(matches!(err.root(), Error::InvalidWidth(_)));
    }

    #[test]
    fn test_instruction_json() {
        let json = r#"[{"type": "integer", "symbol": "x", "width": 6},
                       {"type": "constant", "value": -3},
                       {"type": "lessthan"}]"#;
        let instructions: Vec<Instruction> = serde_json::from_str(json).unwrap();
        assert_eq!(instructions[1], Instruction::integer(-3));
        assert_eq!(instructions[2], Instruction::LessThan);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_arithmetic_matches_i64(a in -16i64..16, b in -8i64..8) {
            prop_assert_eq!(binary(Instruction::Add, a, b), Some(a + b));
            prop_assert_eq!(binary(Instruction::Subtract, a, b), Some(a - b));
            prop_assert_eq!(binary(Instruction::Multiply, a, b), Some(a * b));
            if b != 0 {
                prop_assert_eq!(binary(Instruction::Divide, a, b), Some(a / b));
                prop_assert_eq!(binary(Instruction::Modulo, a, b), Some(a % b));
            }
        }
    }
}
