//! Constants for qdemo
//!
//! Gantree: L0_Foundation → Constants
//!
//! Execution defaults, protocol thresholds and reference values used by
//! the demos' analyses.

// ============================================================================
// Execution Constants
// Gantree: execution // 실행 상수
// ============================================================================

pub mod execution {
    //! Shot counts and job polling

    /// Default shots per circuit
    /// Gantree: DEFAULT_SHOTS: u64 = 1024
    pub const DEFAULT_SHOTS: u64 = 1024;

    /// Minimum shots
    pub const MIN_SHOTS: u64 = 1;

    /// Maximum shots accepted by the reference simulator
    pub const MAX_SHOTS: u64 = 100_000;

    /// Default simulator seed
    pub const DEFAULT_SEED: u64 = 42;

    /// Job status poll interval in seconds
    /// Gantree: POLL_INTERVAL_S: u64 = 5
    pub const POLL_INTERVAL_S: u64 = 5;

    /// Job wait timeout in seconds
    pub const JOB_TIMEOUT_S: u64 = 3600;
}

// ============================================================================
// Key Distribution Constants
// Gantree: qkd // 양자 키 분배
// ============================================================================

pub mod qkd {
    //! BB84 / E91 thresholds

    /// QBER below which a sifted key is considered secure
    /// Gantree: SECURE_QBER: f64 = 0.11
    pub const SECURE_QBER: f64 = 0.11;

    /// QBER below which a key is suspicious rather than compromised
    pub const SUSPICIOUS_QBER: f64 = 0.20;

    /// QBER expected from full intercept-resend in random bases
    pub const INTERCEPT_RESEND_QBER: f64 = 0.25;

    /// Classical CHSH bound
    pub const CHSH_CLASSICAL_BOUND: f64 = 2.0;

    /// Tsirelson bound 2√2
    pub const CHSH_QUANTUM_BOUND: f64 = std::f64::consts::SQRT_2 * 2.0;

    /// Default BB84 key length in qubits
    pub const DEFAULT_BB84_BITS: usize = 8;
}

// ============================================================================
// Chemistry Constants
// Gantree: chemistry // H2 해밀토니안
// ============================================================================

pub mod chemistry {
    //! H₂ in the STO-3G basis at bond length 0.735 Å, two-qubit reduction

    /// Pauli terms and coefficients (Hartree)
    pub const H2_TERMS: [(&str, f64); 6] = [
        ("II", -1.052_373_2),
        ("IZ", 0.397_937_42),
        ("ZI", -0.397_937_42),
        ("ZZ", -0.011_280_1),
        ("XX", 0.180_931_19),
        ("YY", 0.180_931_19),
    ];

    /// Exact ground-state energy (Hartree)
    /// Gantree: H2_EXACT_ENERGY: f64 = -1.137
    pub const H2_EXACT_ENERGY: f64 = -1.137;

    /// Chemical accuracy (Hartree)
    pub const CHEMICAL_ACCURACY: f64 = 1.6e-3;
}

// ============================================================================
// Numerical Tolerances
// ============================================================================

pub mod tolerance {
    //! Floating-point tolerances

    /// Angle / amplitude comparisons
    pub const EPS: f64 = 1e-9;

    /// Probabilities considered zero when sampling
    pub const PROB_EPS: f64 = 1e-12;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ordered() {
        assert!(qkd::SECURE_QBER < qkd::SUSPICIOUS_QBER);
        assert!(qkd::SUSPICIOUS_QBER < qkd::INTERCEPT_RESEND_QBER);
        assert!((qkd::CHSH_QUANTUM_BOUND - 2.828_427).abs() < 1e-5);
    }

    #[test]
    fn test_h2_terms() {
        assert_eq!(chemistry::H2_TERMS.len(), 6);
        assert!(chemistry::H2_TERMS.iter().all(|(p, _)| p.len() == 2));
    }
}
