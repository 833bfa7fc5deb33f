//! Error types for qdemo
//!
//! Gantree: L0_Foundation → Errors
//!
//! Shared error type for circuit construction, execution and analysis.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for qdemo
/// Gantree: QdemoError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QdemoError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    /// Gantree: InvalidProbability(f64) // 확률 범위
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Qubit index out of range
    /// Gantree: QubitOutOfRange{{q,max}} // 큐비트 범위
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Bitstring has the wrong width for the register it targets
    #[error("Bitstring '{bits}' has length {len}, expected {expected}")]
    BitstringLength {
        bits: String,
        len: usize,
        expected: usize,
    },

    /// Invalid basis / Pauli character
    #[error("Invalid basis '{0}': must be I, X, Y, or Z")]
    InvalidBasis(String),

    /// Invalid demo parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Measurement or condition on non-existent classical bit
    #[error("Classical bit {clbit} out of range: circuit has {num_clbits} classical bits")]
    ClbitOutOfRange { clbit: usize, num_clbits: usize },

    /// Gate lists the same qubit twice
    #[error("Gate '{gate}' uses qubit {qubit} more than once")]
    DuplicateQubit { gate: String, qubit: usize },

    /// Operation cannot be inverted (measurement, reset, conditional)
    #[error("Operation '{0}' is not unitary and cannot be inverted")]
    NonUnitary(String),

    /// Circuits cannot be composed
    #[error("Cannot compose circuits: {0}")]
    ComposeMismatch(String),

    /// Topology violation (qubits not connected)
    /// Gantree: TopologyViolation{{q1,q2}} // 연결 위반
    #[error("Topology violation: qubits {q1} and {q2} are not connected")]
    TopologyViolation { q1: usize, q2: usize },

    /// Operation not expressible on the target
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // ========================================================================
    // Topology Errors
    // ========================================================================
    /// Empty coupling map
    #[error("Coupling map is empty")]
    EmptyCouplingMap,

    /// Invalid coupling
    #[error("Invalid coupling ({0}, {1}): qubits must be different")]
    InvalidCoupling(usize, usize),

    /// Path not found between qubits
    #[error("No path found between qubits {0} and {1}")]
    PathNotFound(usize, usize),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Backend execution error
    /// Gantree: BackendError(String) // 백엔드
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Backend not available
    #[error("Backend '{0}' not available")]
    BackendNotAvailable(String),

    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    /// Backend returned fewer results than circuits submitted
    #[error("Expected {expected} results, got {actual}")]
    ResultCountMismatch { expected: usize, actual: usize },

    // ========================================================================
    // Analysis Errors
    // ========================================================================
    /// Backend returned no counts to analyze
    #[error("No measurement counts to analyze")]
    NoCounts,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for qdemo operations
/// Gantree: QdemoResult<T> // type alias
pub type QdemoResult<T> = Result<T, QdemoError>;

// ============================================================================
// Error Helpers
// ============================================================================

impl QdemoError {
    /// Check if error is recoverable by retrying the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QdemoError::BackendError(_)
                | QdemoError::BackendNotAvailable(_)
                | QdemoError::NoCounts
        )
    }

    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QdemoError::InvalidProbability(_)
                | QdemoError::QubitOutOfRange { .. }
                | QdemoError::InvalidBitstring(_)
                | QdemoError::BitstringLength { .. }
                | QdemoError::InvalidBasis(_)
                | QdemoError::InvalidParameter(_)
        )
    }

    /// Check if error is a circuit error
    pub fn is_circuit_error(&self) -> bool {
        matches!(
            self,
            QdemoError::GateQubitMismatch { .. }
                | QdemoError::ClbitOutOfRange { .. }
                | QdemoError::DuplicateQubit { .. }
                | QdemoError::NonUnitary(_)
                | QdemoError::ComposeMismatch(_)
                | QdemoError::TopologyViolation { .. }
                | QdemoError::Unsupported(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QdemoError::InvalidProbability(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_clbit_out_of_range() {
        let err = QdemoError::ClbitOutOfRange {
            clbit: 4,
            num_clbits: 2,
        };
        assert!(err.to_string().contains('4'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(QdemoError::BackendError("timeout".into()).is_recoverable());
        assert!(!QdemoError::InvalidBitstring("2".into()).is_recoverable());
        assert!(QdemoError::NoCounts.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert!(QdemoError::InvalidParameter("n".into()).is_validation_error());
        assert!(!QdemoError::BackendError("x".into()).is_validation_error());
        assert!(QdemoError::NonUnitary("measure".into()).is_circuit_error());
    }
}
