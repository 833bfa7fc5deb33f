//! Logical inputs and injected errors
//!
//! Gantree: L5_Qec → Logical
//!
//! Shared vocabulary of the code demos: which logical state is encoded,
//! and which single-qubit Pauli error is applied between encoding and
//! correction.

use qdemo_core::{Basis, CircuitBuilder, Gate, Pauli, QdemoError, QdemoResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical input state
/// Gantree: LogicalState // 논리 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalState {
    /// |0⟩
    Zero,
    /// |1⟩
    One,
    /// |+⟩
    Plus,
    /// |−⟩
    Minus,
}

impl LogicalState {
    /// All four inputs
    pub const ALL: [LogicalState; 4] = [
        LogicalState::Zero,
        LogicalState::One,
        LogicalState::Plus,
        LogicalState::Minus,
    ];

    /// Basis in which the state is an eigenstate
    pub fn basis(&self) -> Basis {
        match self {
            LogicalState::Zero | LogicalState::One => Basis::Z,
            LogicalState::Plus | LogicalState::Minus => Basis::X,
        }
    }

    /// Bit read when measuring in `basis()`
    pub fn expected_bit(&self) -> bool {
        matches!(self, LogicalState::One | LogicalState::Minus)
    }

    /// Prepare the state on one qubit from |0⟩
    pub fn prepare(&self, builder: CircuitBuilder, qubit: QubitId) -> CircuitBuilder {
        match self {
            LogicalState::Zero => builder,
            LogicalState::One => builder.x(qubit),
            LogicalState::Plus => builder.h(qubit),
            LogicalState::Minus => builder.x(qubit).h(qubit),
        }
    }
}

impl fmt::Display for LogicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ket = match self {
            LogicalState::Zero => "|0⟩",
            LogicalState::One => "|1⟩",
            LogicalState::Plus => "|+⟩",
            LogicalState::Minus => "|−⟩",
        };
        f.write_str(ket)
    }
}

impl FromStr for LogicalState {
    type Err = QdemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "zero" => Ok(LogicalState::Zero),
            "1" | "one" => Ok(LogicalState::One),
            "+" | "plus" => Ok(LogicalState::Plus),
            "-" | "minus" => Ok(LogicalState::Minus),
            other => Err(QdemoError::InvalidParameter(format!(
                "unknown logical state '{}' (use 0, 1, plus or minus)",
                other
            ))),
        }
    }
}

/// A single-qubit Pauli error on one physical qubit
/// Gantree: InjectedError // 주입 오류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectedError {
    /// X, Y or Z
    pub pauli: Pauli,
    /// Physical qubit hit
    pub qubit: QubitId,
}

impl InjectedError {
    /// X error
    pub fn x(qubit: QubitId) -> Self {
        Self { pauli: Pauli::X, qubit }
    }

    /// Y error
    pub fn y(qubit: QubitId) -> Self {
        Self { pauli: Pauli::Y, qubit }
    }

    /// Z error
    pub fn z(qubit: QubitId) -> Self {
        Self { pauli: Pauli::Z, qubit }
    }

    /// Has an X component (flips Z-basis readout)
    pub fn flips_bit(&self) -> bool {
        matches!(self.pauli, Pauli::X | Pauli::Y)
    }

    /// Has a Z component (flips X-basis readout)
    pub fn flips_phase(&self) -> bool {
        matches!(self.pauli, Pauli::Z | Pauli::Y)
    }

    fn gate(&self) -> Option<Gate> {
        match self.pauli {
            Pauli::I => None,
            Pauli::X => Some(Gate::X(self.qubit)),
            Pauli::Y => Some(Gate::Y(self.qubit)),
            Pauli::Z => Some(Gate::Z(self.qubit)),
        }
    }

    /// Reject identity errors and qubits outside `0..data_qubits`
    pub fn validate(&self, data_qubits: usize) -> QdemoResult<()> {
        if self.pauli == Pauli::I {
            return Err(QdemoError::InvalidParameter("identity is not an error".into()));
        }
        if self.qubit >= data_qubits {
            return Err(QdemoError::QubitOutOfRange {
                qubit: self.qubit,
                max: data_qubits,
            });
        }
        Ok(())
    }
}

/// Append the error, if any, fenced by barriers
pub fn inject(builder: CircuitBuilder, error: Option<&InjectedError>) -> CircuitBuilder {
    match error.and_then(InjectedError::gate) {
        Some(gate) => builder.gate(gate).barrier(),
        None => builder,
    }
}

impl fmt::Display for InjectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on q{}", self.pauli.to_char(), self.qubit)
    }
}

/// Parses "X1", "z4", "Y0"
impl FromStr for InjectedError {
    type Err = QdemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let pauli = chars
            .next()
            .ok_or_else(|| QdemoError::InvalidParameter("empty error spec".into()))
            .and_then(Pauli::from_char)?;
        let qubit = chars
            .as_str()
            .trim_start_matches(['q', 'Q'])
            .parse::<usize>()
            .map_err(|_| QdemoError::InvalidParameter(format!("bad error spec '{}' (e.g. X1)", s)))?;
        Ok(Self { pauli, qubit })
    }
}

/// Label for an optional error
pub fn describe(error: Option<&InjectedError>) -> String {
    match error {
        Some(e) => format!("{} error on q{}", e.pauli.to_char(), e.qubit),
        None => "No error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_spec() {
        assert_eq!("X1".parse::<InjectedError>().unwrap(), InjectedError::x(1));
        assert_eq!("zq4".parse::<InjectedError>().unwrap(), InjectedError::z(4));
        assert!("W1".parse::<InjectedError>().is_err());
        assert!("X".parse::<InjectedError>().is_err());
        assert!("".parse::<InjectedError>().is_err());
    }

    #[test]
    fn test_error_components() {
        assert!(InjectedError::y(0).flips_bit() && InjectedError::y(0).flips_phase());
        assert!(!InjectedError::z(0).flips_bit());
        assert!(InjectedError::x(3).validate(3).is_err());
        assert!(InjectedError { pauli: Pauli::I, qubit: 0 }.validate(3).is_err());
    }

    #[test]
    fn test_logical_state() {
        assert_eq!("plus".parse::<LogicalState>().unwrap(), LogicalState::Plus);
        assert_eq!(LogicalState::Minus.basis(), Basis::X);
        assert!(LogicalState::One.expected_bit());
        assert_eq!(describe(Some(&InjectedError::x(1))), "X error on q1");
    }
}
