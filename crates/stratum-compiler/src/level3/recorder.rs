//! Captures function bodies between `define` and its matching `return`.

use super::value::Function;
use super::Instruction;
use stratum_base::Symbol;

/// Records one definition. Nested `define`/`return` pairs are kept in the
/// body verbatim; only the `return` at depth zero ends the recording.
#[derive(Debug)]
pub struct Recorder {
    name: String,
    args: Vec<Symbol>,
    dynamic: bool,
    immutable: bool,
    depth: usize,
    body: Vec<Instruction>,
}

impl Recorder {
    pub fn start(name: &str, args: &[Symbol], dynamic: bool, immutable: bool) -> Self {
        Self {
            name: name.to_string(),
            args: args.to_vec(),
            dynamic,
            immutable,
            depth: 0,
            body: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feeds one instruction; yields the return width once the definition closes.
    pub fn record(&mut self, instruction: &Instruction) -> Option<usize> {
        match instruction {
            Instruction::Return { width } if self.depth == 0 => return Some(*width),
            Instruction::Return { .. } => self.depth -= 1,
            Instruction::Define { .. } => self.depth += 1,
            _ => {}
        }
        self.body.push(instruction.clone());
        None
    }

    pub fn finish(self, id: u64, return_width: usize) -> Function {
        Function {
            id,
            name: self.name,
            args: self.args,
            body: self.body,
            return_width,
            dynamic: self.dynamic,
            immutable: self.immutable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_definitions_stay_in_body() {
        let mut recorder = Recorder::start("outer", &["x".to_string()], false, false);
        let body = [
            Instruction::define("inner", Vec::<Symbol>::new()),
            Instruction::boolean(true),
            Instruction::Return { width: 1 },
            Instruction::push("x"),
        ];
        for instruction in &body {
            assert_eq!(recorder.record(instruction), None);
        }
        assert_eq!(recorder.record(&Instruction::Return { width: 1 }), Some(1));
        let function = recorder.finish(7, 1);
        assert_eq!(function.body, body);
        assert_eq!(function.args, ["x"]);
    }
}
