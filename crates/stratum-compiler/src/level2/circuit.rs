//! Circuit gadgets that lower integer arithmetic to Level-1 gates.
//!
//! Bit vectors are lists of Level-1 symbols, most significant bit first.
//! Every gadget works at an explicit width; operands are sign-extended by
//! repeating their MSB symbol, so no extra gates are spent on extension.

use crate::level1::Instruction as L1;
use stratum_base::{twos_complement, Registry, Symbol};

/// Level-1 symbols for one integer, MSB first.
pub type Bits = Vec<Symbol>;

/// Allocates Level-1 symbols and emits the Level-1 instructions computing them.
pub struct CircuitBuilder {
    registry: Registry,
    instructions: Vec<L1>,
}

impl CircuitBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registry: Registry::new("L2"),
            instructions: Vec::new(),
        }
    }

    /// Consumes the builder and returns the emitted instructions.
    #[must_use]
    pub fn into_instructions(self) -> Vec<L1> {
        self.instructions
    }

    /// Emits one raw Level-1 instruction.
    pub fn emit(&mut self, instruction: L1) {
        self.instructions.push(instruction);
    }

    /// Allocates a fresh Level-1 symbol.
    pub fn fresh(&mut self) -> Symbol {
        self.registry.symbol()
    }

    /// Pops the Level-1 stack top into a fresh symbol.
    fn bind_top(&mut self) -> Symbol {
        let symbol = self.fresh();
        self.emit(L1::pop(symbol.clone()));
        symbol
    }

    /// Declares `width` unconstrained bits as one group.
    pub fn declare(&mut self, width: usize) -> Bits {
        let bits: Bits = (0..width).map(|_| self.fresh()).collect();
        for bit in &bits {
            self.emit(L1::push(bit.clone()));
        }
        for bit in bits.iter().rev() {
            self.emit(L1::pop(bit.clone()));
        }
        bits
    }

    // =========================================================================
    // Single-bit gates
    // =========================================================================

    /// A constant bit.
    pub fn constant(&mut self, value: bool) -> Symbol {
        self.emit(if value { L1::True } else { L1::False });
        self.bind_top()
    }

    /// result = NOT a.
    pub fn not(&mut self, a: &Symbol) -> Symbol {
        self.emit(L1::push(a.clone()));
        self.emit(L1::Not);
        self.bind_top()
    }

    fn binary(&mut self, a: &Symbol, b: &Symbol, op: L1) -> Symbol {
        self.emit(L1::push(a.clone()));
        self.emit(L1::push(b.clone()));
        self.emit(op);
        self.bind_top()
    }

    /// result = a AND b.
    pub fn and(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        self.binary(a, b, L1::And)
    }

    /// result = a OR b.
    pub fn or(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        self.binary(a, b, L1::Or)
    }

    /// result = (a == b).
    pub fn equal(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        self.binary(a, b, L1::Equal)
    }

    /// result = a XOR b.
    pub fn xor(&mut self, a: &Symbol, b: &Symbol) -> Symbol {
        let same = self.equal(a, b);
        self.not(&same)
    }

    /// result = cond ? then : otherwise.
    pub fn ite(&mut self, cond: &Symbol, then: &Symbol, otherwise: &Symbol) -> Symbol {
        self.emit(L1::push(otherwise.clone()));
        self.emit(L1::push(then.clone()));
        self.emit(L1::push(cond.clone()));
        self.emit(L1::If);
        self.bind_top()
    }

    /// Conjunction of all bits; true when empty.
    pub fn and_all(&mut self, bits: &[Symbol]) -> Symbol {
        match bits.split_first() {
            None => self.constant(true),
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, bit| self.and(&acc, bit)),
        }
    }

    /// Disjunction of all bits; false when empty.
    pub fn or_all(&mut self, bits: &[Symbol]) -> Symbol {
        match bits.split_first() {
            None => self.constant(false),
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, bit| self.or(&acc, bit)),
        }
    }

    // =========================================================================
    // Bit vectors
    // =========================================================================

    /// The twos-complement bit pattern of `value` in its minimal width.
    pub fn integer(&mut self, value: i64) -> Bits {
        twos_complement::encode(value)
            .into_iter()
            .map(|bit| self.constant(bit))
            .collect()
    }

    /// Bitwise NOT.
    pub fn not_bits(&mut self, a: &[Symbol]) -> Bits {
        a.iter().map(|bit| self.not(bit)).collect()
    }

    /// Bitwise multiplexer over two vectors of equal width.
    pub fn ite_bits(&mut self, cond: &Symbol, then: &[Symbol], otherwise: &[Symbol]) -> Bits {
        let width = then.len().max(otherwise.len());
        let then = extend(then, width);
        let otherwise = extend(otherwise, width);
        then.iter()
            .zip(&otherwise)
            .map(|(t, e)| self.ite(cond, t, e))
            .collect()
    }

    /// result = (a == b) after sign-extending both to the wider width.
    pub fn equal_bits(&mut self, a: &[Symbol], b: &[Symbol]) -> Symbol {
        let width = a.len().max(b.len());
        let a = extend(a, width);
        let b = extend(b, width);
        let bit_eqs: Bits = a.iter().zip(&b).map(|(x, y)| self.equal(x, y)).collect();
        self.and_all(&bit_eqs)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Full adder: (sum, carry_out) = a + b + carry_in.
    fn full_adder(&mut self, a: &Symbol, b: &Symbol, carry: &Symbol) -> (Symbol, Symbol) {
        let ab_xor = self.xor(a, b);
        let sum = self.xor(&ab_xor, carry);
        // carry_out = (a AND b) OR (carry AND (a XOR b))
        let both = self.and(a, b);
        let propagated = self.and(carry, &ab_xor);
        let carry_out = self.or(&both, &propagated);
        (sum, carry_out)
    }

    /// Ripple-carry adder at `width` bits, wrapping on overflow.
    fn add_with_carry(&mut self, a: &[Symbol], b: &[Symbol], carry_in: Symbol, width: usize) -> Bits {
        let a = resize(a, width);
        let b = resize(b, width);
        let mut carry = carry_in;
        let mut sum = Vec::with_capacity(width);
        for i in (0..width).rev() {
            let (s, c) = self.full_adder(&a[i], &b[i], &carry);
            sum.push(s);
            carry = c;
        }
        sum.reverse();
        sum
    }

    /// result = a + b at `width` bits.
    pub fn add(&mut self, a: &[Symbol], b: &[Symbol], width: usize) -> Bits {
        let zero = self.constant(false);
        self.add_with_carry(a, b, zero, width)
    }

    /// result = a - b at `width` bits, computed as a + ~b + 1.
    pub fn subtract(&mut self, a: &[Symbol], b: &[Symbol], width: usize) -> Bits {
        let b = resize(b, width);
        let not_b = self.not_bits(&b);
        let one = self.constant(true);
        self.add_with_carry(a, &not_b, one, width)
    }

    /// result = -a at `width` bits.
    pub fn negate(&mut self, a: &[Symbol], width: usize) -> Bits {
        let zeros = vec![self.constant(false)];
        self.subtract(&zeros, a, width)
    }

    /// result = |a| at `width` bits.
    pub fn absolute(&mut self, a: &[Symbol], width: usize) -> Bits {
        let a = resize(a, width);
        let negated = self.negate(&a, width);
        self.ite_bits(&a[0], &negated, &a)
    }

    /// Shift-and-add multiplier at `width` bits.
    ///
    /// With both operands sign-extended to the full width, the product is
    /// exact whenever `width` covers the sum of the operand widths.
    pub fn multiply(&mut self, a: &[Symbol], b: &[Symbol], width: usize) -> Bits {
        let a = resize(a, width);
        let b = resize(b, width);
        let zero = self.constant(false);
        let mut acc: Bits = vec![zero.clone(); width];
        for k in 0..width {
            let multiplier = &b[width - 1 - k];
            // (a << k) & multiplier, MSB first
            let partial: Bits = (0..width)
                .map(|j| match a.get(j + k) {
                    Some(bit) => self.and(bit, multiplier),
                    None => zero.clone(),
                })
                .collect();
            acc = self.add(&acc, &partial, width);
        }
        acc
    }

    /// True when a < b, read from the sign of a - b one bit wider than both.
    pub fn less_than(&mut self, a: &[Symbol], b: &[Symbol]) -> Symbol {
        let width = a.len().max(b.len()) + 1;
        let difference = self.subtract(a, b, width);
        difference[0].clone()
    }

    /// Signed division truncating toward zero, plus the matching remainder.
    ///
    /// Both results are `max(width(a), width(b)) + 1` bits wide and the
    /// remainder takes the sign of the dividend. Restoring division runs on
    /// the magnitudes and the signs are fixed up afterwards.
    pub fn divide(&mut self, a: &[Symbol], b: &[Symbol]) -> (Bits, Bits) {
        let width = a.len().max(b.len()) + 1;
        let a = resize(a, width);
        let b = resize(b, width);
        let dividend = self.absolute(&a, width);
        let divisor = self.absolute(&b, width);

        // The partial remainder never exceeds the divisor, so one spare bit
        // keeps its shifted form non-negative.
        let zero = self.constant(false);
        let mut remainder: Bits = vec![zero; width + 1];
        let mut quotient = Vec::with_capacity(width);
        for bit in &dividend {
            let mut shifted: Bits = remainder[1..].to_vec();
            shifted.push(bit.clone());
            let difference = self.subtract(&shifted, &divisor, width + 1);
            let fits = self.not(&difference[0]);
            remainder = self.ite_bits(&fits, &difference, &shifted);
            quotient.push(fits);
        }
        let remainder: Bits = remainder[1..].to_vec();

        let negative_quotient = self.xor(&a[0], &b[0]);
        let negated_quotient = self.negate(&quotient, width);
        let quotient = self.ite_bits(&negative_quotient, &negated_quotient, &quotient);
        let negated_remainder = self.negate(&remainder, width);
        let remainder = self.ite_bits(&a[0], &negated_remainder, &remainder);
        (quotient, remainder)
    }
}

impl Default for CircuitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign-extends `bits` to at least `width` by repeating the MSB symbol.
#[must_use]
pub fn extend(bits: &[Symbol], width: usize) -> Bits {
    match bits.first() {
        Some(msb) if bits.len() < width => {
            let mut extended = vec![msb.clone(); width - bits.len()];
            extended.extend_from_slice(bits);
            extended
        }
        _ => bits.to_vec(),
    }
}

/// Sign-extends or truncates `bits` to exactly `width`, keeping the low bits.
#[must_use]
pub fn resize(bits: &[Symbol], width: usize) -> Bits {
    if bits.len() >= width {
        bits[bits.len() - width..].to_vec()
    } else {
        extend(bits, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_reuses_msb() {
        let bits = vec!["s".to_string(), "x".to_string()];
        assert_eq!(extend(&bits, 4), vec!["s", "s", "s", "x"]);
        assert_eq!(resize(&bits, 1), vec!["x"]);
        assert_eq!(extend(&bits, 1), bits);
    }

    #[test]
    fn test_gate_emits_push_op_pop() {
        let mut cb = CircuitBuilder::new();
        let a = cb.fresh();
        let b = cb.fresh();
        let out = cb.and(&a, &b);
        assert_eq!(
            cb.into_instructions(),
            vec![L1::push(a), L1::push(b), L1::And, L1::pop(out)]
        );
    }

    #[test]
    fn test_adder_width() {
        let mut cb = CircuitBuilder::new();
        let a = cb.declare(4);
        let b = cb.declare(2);
        assert_eq!(cb.add(&a, &b, 5).len(), 5);
        assert_eq!(cb.multiply(&a, &b, 6).len(), 6);
        let (q, r) = cb.divide(&a, &b);
        assert_eq!((q.len(), r.len()), (5, 5));
    }
}
