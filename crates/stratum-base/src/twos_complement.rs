//! Twos-complement integer codec, most significant bit first.
//!
//! Shared by the Level-2 compiler (constants) and the runtime codec
//! (assignments and results).

use crate::error::{Error, Result};

/// Encodes `n` in the fewest bits that still carry an explicit sign bit.
///
/// `0` is `[false]`, `-1` is `[true]`, `5` is `[false, true, false, true]`.
#[must_use]
pub fn encode(n: i64) -> Vec<bool> {
    let magnitude_bits = if n >= 0 {
        64 - n.leading_zeros()
    } else {
        64 - n.leading_ones()
    };
    let width = (magnitude_bits + 1).min(64);
    (0..width).rev().map(|i| (n >> i) & 1 == 1).collect()
}

/// Decodes an MSB-first twos-complement bit vector.
///
/// The first bit weighs `-2^(len-1)`, the rest count positively.
pub fn decode(bits: &[bool]) -> Result<i64> {
    let bits = strip_sign_extension(bits);
    let Some((&sign, rest)) = bits.split_first() else {
        return Ok(0);
    };
    if bits.len() > 64 {
        return Err(Error::IntegerOverflow {
            value: render(bits),
            width: 64,
        });
    }

    let mut value: i128 = if sign { -(1_i128 << (bits.len() - 1)) } else { 0 };
    for (i, &bit) in rest.iter().enumerate() {
        if bit {
            value += 1_i128 << (rest.len() - 1 - i);
        }
    }
    Ok(value as i64)
}

/// Sign-extends or left-trims `bits` to exactly `width` bits.
///
/// Fails when trimming would change the value.
pub fn pad(bits: &[bool], width: usize) -> Result<Vec<bool>> {
    if width == 0 {
        return Err(Error::InvalidWidth("integers need at least one bit".into()));
    }

    if bits.len() <= width {
        let sign = bits.first().copied().unwrap_or(false);
        let mut padded = vec![sign; width - bits.len()];
        padded.extend_from_slice(bits);
        return Ok(padded);
    }

    let cut = bits.len() - width;
    let sign = bits[cut];
    if bits[..cut].iter().any(|&b| b != sign) {
        return Err(Error::IntegerOverflow {
            value: decode(bits).map_or_else(|_| render(bits), |n| n.to_string()),
            width,
        });
    }
    Ok(bits[cut..].to_vec())
}

/// Returns whether `n` is representable in `width` bits.
#[must_use]
pub fn fits(n: i64, width: usize) -> bool {
    encode(n).len() <= width
}

fn strip_sign_extension(bits: &[bool]) -> &[bool] {
    let mut start = 0;
    while start + 1 < bits.len() && bits[start] == bits[start + 1] {
        start += 1;
    }
    &bits[start..]
}

fn render(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_minimal_encodings() {
        assert_eq!(encode(0), bits("0"));
        assert_eq!(encode(1), bits("01"));
        assert_eq!(encode(-1), bits("1"));
        assert_eq!(encode(5), bits("0101"));
        assert_eq!(encode(-5), bits("1011"));
        assert_eq!(encode(-4), bits("100"));
        assert_eq!(encode(100), bits("01100100"));
        assert_eq!(encode(i64::MIN).len(), 64);
        assert_eq!(encode(i64::MAX).len(), 64);
    }

    #[test]
    fn test_decode_weights() {
        assert_eq!(decode(&bits("1011")).unwrap(), -5);
        assert_eq!(decode(&bits("0101")).unwrap(), 5);
        assert_eq!(decode(&bits("11111011")).unwrap(), -5);
        assert_eq!(decode(&[]).unwrap(), 0);
    }

    #[test]
    fn test_pad_minus_one_to_all_ones() {
        assert_eq!(pad(&encode(-1), 8).unwrap(), vec![true; 8]);
        assert_eq!(pad(&encode(3), 5).unwrap(), bits("00011"));
    }

    #[test]
    fn test_pad_trims_redundant_sign_bits() {
        assert_eq!(pad(&bits("11101"), 3).unwrap(), bits("101"));
        assert!(matches!(
            pad(&encode(100), 7),
            Err(Error::IntegerOverflow { width: 7, .. })
        ));
        assert!(pad(&encode(1), 0).is_err());
    }

    #[test]
    fn test_fits() {
        assert!(fits(127, 8));
        assert!(!fits(128, 8));
        assert!(fits(-128, 8));
        assert!(!fits(-129, 8));
    }

    proptest! {
        #[test]
        fn prop_round_trip(n in any::<i64>()) {
            prop_assert_eq!(decode(&encode(n)).unwrap(), n);
        }

        #[test]
        fn prop_encoding_is_minimal(n in any::<i64>()) {
            let encoded = encode(n);
            if encoded.len() > 1 {
                prop_assert_ne!(encoded[0], encoded[1]);
            }
        }

        #[test]
        fn prop_pad_preserves_value(n in -1_000_000_i64..1_000_000, extra in 0_usize..16) {
            let width = encode(n).len() + extra;
            let padded = pad(&encode(n), width).unwrap();
            prop_assert_eq!(padded.len(), width);
            prop_assert_eq!(decode(&padded).unwrap(), n);
        }
    }
}
