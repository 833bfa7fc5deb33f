//! Core types for qdemo
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and validated wrappers shared by every demo. Bitstrings
//! follow the Qiskit convention: the rightmost character is classical
//! bit 0.

use crate::error::{QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Classical bit identifier (0-indexed)
pub type ClbitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Measurement counts: bitstring -> count
/// Gantree: Counts // pub type Counts = HashMap<String, u64>
pub type Counts = HashMap<String, u64>;

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // 범위 검증 구조체
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    /// Gantree: new(f64) -> Result<Self> // 생성+검증
    pub fn new(value: f64) -> QdemoResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(QdemoError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the complement (1 - p)
    #[inline]
    pub fn complement(&self) -> f64 {
        1.0 - self.0
    }

    /// Zero probability
    pub const ZERO: Self = Self(0.0);

    /// Half probability
    pub const HALF: Self = Self(0.5);
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = QdemoError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Bitstring for secrets, messages and measurement results
///
/// Stored in display order: `bits[0]` is the leftmost character, which is
/// the highest classical bit of a count key.
/// Gantree: Bitstring // 비트열 타입
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from a vector of bools (display order)
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Create from string (e.g., "0110")
    /// Gantree: parse(s) -> Self // 파싱
    pub fn parse(s: &str) -> QdemoResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(QdemoError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Parse and require an exact width
    pub fn parse_width(s: &str, expected: usize) -> QdemoResult<Self> {
        let bs = Self::parse(s)?;
        if bs.len() != expected {
            return Err(QdemoError::BitstringLength {
                bits: s.to_string(),
                len: bs.len(),
                expected,
            });
        }
        Ok(bs)
    }

    /// Create from an integer, `width` bits wide
    pub fn from_usize(value: usize, width: usize) -> Self {
        let bits = (0..width).rev().map(|i| (value >> i) & 1 == 1).collect();
        Self { bits }
    }

    /// Create zero bitstring of given length
    pub fn zeros(n: usize) -> Self {
        Self {
            bits: vec![false; n],
        }
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Check if every bit is zero
    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|&b| !b)
    }

    /// Count number of 1s (Hamming weight)
    /// Gantree: popcount() -> usize // 1 카운트
    pub fn popcount(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Odd number of 1s
    pub fn parity(&self) -> bool {
        self.popcount() % 2 == 1
    }

    /// Get character at display position (0 = leftmost)
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Get classical bit `i` (0 = rightmost character)
    pub fn bit(&self, i: usize) -> Option<bool> {
        let n = self.bits.len();
        if i >= n {
            return None;
        }
        self.bits.get(n - 1 - i).copied()
    }

    /// Iterate characters in display order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Convert to usize (leftmost character is the most significant bit)
    pub fn to_usize(&self) -> usize {
        self.bits
            .iter()
            .rev()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| 1 << i)
            .sum()
    }

    /// Number of positions at which two equal-length bitstrings differ
    pub fn hamming_distance(&self, other: &Bitstring) -> usize {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(a, b)| a != b)
            .count()
            + self.bits.len().abs_diff(other.bits.len())
    }

    /// Inner product over GF(2): parity of the bitwise AND
    pub fn dot(&self, other: &Bitstring) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(&a, &b)| a && b)
            .count()
            % 2
            == 1
    }

}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Bitstring {
    type Err = QdemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Measurement Basis
// ============================================================================

/// Measurement basis for a single qubit
/// Gantree: Basis // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// X (Hadamard) basis
    X,
    /// Y basis
    Y,
    /// Z (computational) basis
    Z,
}

impl Basis {
    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }

    /// BB84-style symbol (+ for Z, x for X)
    pub fn symbol(&self) -> char {
        match self {
            Basis::X => 'x',
            Basis::Y => 'y',
            Basis::Z => '+',
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ============================================================================
// Pauli Strings
// ============================================================================

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity
    I,
    /// Pauli-X
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
}

impl Pauli {
    /// Parse from character
    pub fn from_char(c: char) -> QdemoResult<Self> {
        match c.to_ascii_uppercase() {
            'I' => Ok(Pauli::I),
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            _ => Err(QdemoError::InvalidBasis(c.to_string())),
        }
    }

    /// Measurement basis needed to read this operator, if any
    pub fn basis(&self) -> Option<Basis> {
        match self {
            Pauli::I => None,
            Pauli::X => Some(Basis::X),
            Pauli::Y => Some(Basis::Y),
            Pauli::Z => Some(Basis::Z),
        }
    }

    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

/// Pauli string such as "XX" or "IZ"
///
/// Character `i` acts on qubit `i`.
/// Gantree: PauliString // 파울리 문자열
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PauliString {
    ops: Vec<Pauli>,
}

impl PauliString {
    /// Parse from string
    pub fn parse(s: &str) -> QdemoResult<Self> {
        let ops: Result<Vec<Pauli>, _> = s.chars().map(Pauli::from_char).collect();
        Ok(Self { ops: ops? })
    }

    /// Number of qubits covered
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operator on qubit `q`
    pub fn get(&self, q: QubitId) -> Option<Pauli> {
        self.ops.get(q).copied()
    }

    /// True if every operator is the identity
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|p| *p == Pauli::I)
    }

    /// Iterate operators by qubit
    pub fn iter(&self) -> impl Iterator<Item = &Pauli> {
        self.ops.iter()
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.ops {
            write!(f, "{}", p.to_char())?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_valid() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(0.5).is_ok());
        assert!(Probability::new(1.0).is_ok());
        assert!(Probability::new(-0.1).is_err());
        assert!(Probability::new(1.1).is_err());
    }

    #[test]
    fn test_bitstring_popcount() {
        let bs = Bitstring::parse("01101").unwrap();
        assert_eq!(bs.popcount(), 3);
        assert!(bs.parity());
        assert!(!bs.is_zero());
    }

    #[test]
    fn test_bitstring_bit_order() {
        // "110" -> clbit 0 is '0', clbit 2 is '1'
        let bs = Bitstring::parse("110").unwrap();
        assert_eq!(bs.bit(0), Some(false));
        assert_eq!(bs.bit(1), Some(true));
        assert_eq!(bs.bit(2), Some(true));
        assert_eq!(bs.bit(3), None);
        assert_eq!(bs.to_usize(), 6);
    }

    #[test]
    fn test_bitstring_from_usize() {
        assert_eq!(Bitstring::from_usize(5, 4).to_string(), "0101");
        assert_eq!(Bitstring::from_usize(0, 3).to_string(), "000");
    }

    #[test]
    fn test_bitstring_dot_and_hamming() {
        let s = Bitstring::parse("11001").unwrap();
        let y = Bitstring::parse("10100").unwrap();
        // overlap at position 0 only -> odd
        assert!(s.dot(&y));
        assert_eq!(s.hamming_distance(&y), 3);
    }

    #[test]
    fn test_parse_width() {
        assert!(Bitstring::parse_width("101", 3).is_ok());
        assert!(matches!(
            Bitstring::parse_width("10", 3),
            Err(QdemoError::BitstringLength { .. })
        ));
        assert!(Bitstring::parse("10a").is_err());
    }

    #[test]
    fn test_pauli_string() {
        let ps = PauliString::parse("XZ").unwrap();
        assert_eq!(ps.len(), 2);
        assert_eq!(ps.get(0), Some(Pauli::X));
        assert_eq!(ps.get(1), Some(Pauli::Z));
        assert!(!ps.is_identity());
        assert!(PauliString::parse("II").unwrap().is_identity());
        assert!(PauliString::parse("XQ").is_err());
    }
}
