//! # qdemo Backend
//!
//! Execution targets for the qdemo circuits: the `Backend` trait, the
//! counts container every demo analyzes, and a seedable statevector
//! simulator with an optional noise model.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_backend // L2: Backend
//!     BackendTrait // 실행 인터페이스 + 결과
//!     NoiseModel // 탈분극/측정 노이즈
//!     StateVector // 상태 벡터 엔진
//!     SimulatorBackend // 시드 가능한 시뮬레이터
//!     Reporter // 데모 보고서 공통
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qdemo_backend::prelude::*;
//! use qdemo_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::ideal(5).with_seed(42);
//!
//! let circuit = CircuitBuilder::new(3)
//!     .h(0)
//!     .cx(0, 1)
//!     .cx(1, 2)
//!     .measure_all()
//!     .build();
//!
//! let result = backend.execute(&circuit, 1000).unwrap();
//! assert_eq!(result.total_counts(), 1000);
//! println!("Parity expectation: {:.4}", result.parity_expectation());
//! ```
//!
//! ## Noisy Simulation
//!
//! ```rust
//! use qdemo_backend::prelude::*;
//! use qdemo_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::from_depol(3, 0.02)
//!     .unwrap()
//!     .with_seed(42);
//!
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
//! let result = backend.execute(&circuit, 500).unwrap();
//! println!("P(00) = {:.3}", result.probability("00"));
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Execution types and backend trait (Gantree: L2_Backend → BackendTrait)
pub mod execution;

/// Noise model (Gantree: L2_Backend → NoiseModel)
pub mod noise;

/// Statevector engine (Gantree: L2_Backend → StateVector)
pub mod statevector;

/// Simulator backend (Gantree: L2_Backend → SimulatorBackend)
pub mod simulator;

/// Demo report helpers (Gantree: L2_Backend → Reporter)
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{check_shots, run_batch, run_single, Backend, ExecutionMetadata, ExecutionResult};
pub use report::{DemoReport, SummaryRow};
pub use noise::NoiseModel;
pub use simulator::{clbit_of, SimulatorBackend};
pub use statevector::{exact_probabilities, StateVector};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qdemo_backend::prelude::*;
    //! ```

    pub use crate::execution::{run_batch, run_single, Backend, ExecutionMetadata, ExecutionResult};
    pub use crate::noise::NoiseModel;
    pub use crate::report::DemoReport;
    pub use crate::simulator::SimulatorBackend;
    pub use crate::statevector::{exact_probabilities, StateVector};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qdemo_core::{CircuitBuilder, Gate};
    use std::f64::consts::PI;

    #[test]
    fn test_bell_state() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        let result = backend.execute(&circuit, 10000).unwrap();

        assert!((result.probability("00") - 0.5).abs() < 0.05);
        assert!((result.probability("11") - 0.5).abs() < 0.05);
        assert_eq!(result.count("01") + result.count("10"), 0);
    }

    #[test]
    fn test_ghz_state_parity() {
        // |0000⟩ and |1111⟩ both have even parity
        let backend = SimulatorBackend::ideal(4).with_seed(42);
        let circuit = CircuitBuilder::new(4).h(0).cx_chain().measure_all().build();
        let result = backend.execute(&circuit, 1000).unwrap();
        assert!((result.parity_expectation() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_parity_degradation() {
        let circuit = CircuitBuilder::new(5).h(0).cx_chain().measure_all().build();
        let ideal = SimulatorBackend::ideal(5).with_seed(42);
        let noisy = SimulatorBackend::from_depol(5, 0.02).unwrap().with_seed(42);

        let p_ideal = ideal.execute(&circuit, 1000).unwrap().parity_expectation();
        let p_noisy = noisy.execute(&circuit, 1000).unwrap().parity_expectation();
        assert!(p_noisy < p_ideal, "noise should reduce parity: {} vs {}", p_noisy, p_ideal);
    }

    #[test]
    fn test_sampling_matches_exact() {
        let circuit = CircuitBuilder::new(2).ry(0, PI / 3.0).cx(0, 1).build();
        let exact = exact_probabilities(&circuit).unwrap();
        // sin²(π/6) = 0.25 on |11⟩
        assert!((exact[3] - 0.25).abs() < 1e-12);

        let measured = CircuitBuilder::new(2)
            .ry(0, PI / 3.0)
            .cx(0, 1)
            .measure_all()
            .build();
        let result = SimulatorBackend::ideal(2)
            .with_seed(11)
            .execute(&measured, 20000)
            .unwrap();
        assert!((result.probability("11") - exact[3]).abs() < 0.02);
    }

    #[test]
    fn test_batch_preserves_order() {
        let backend = SimulatorBackend::ideal(2).with_seed(1);
        let zero = CircuitBuilder::new(1).measure_all().build();
        let one = CircuitBuilder::new(1).x(0).measure_all().build();
        let results = backend.execute_batch(&[one, zero], 10).unwrap();
        assert_eq!(results[0].count("1"), 10);
        assert_eq!(results[1].count("0"), 10);
    }

    #[test]
    fn test_deferred_vs_dynamic_teleport_agree() {
        // teleport |1⟩ both ways
        let dynamic = CircuitBuilder::with_clbits(3, 3)
            .x(0)
            .h(1)
            .cx(1, 2)
            .cx(0, 1)
            .h(0)
            .measure(0, 0)
            .measure(1, 1)
            .c_if(1, true, Gate::X(2))
            .c_if(0, true, Gate::Z(2))
            .measure(2, 2)
            .build();
        let deferred = CircuitBuilder::with_clbits(3, 1)
            .x(0)
            .h(1)
            .cx(1, 2)
            .cx(0, 1)
            .h(0)
            .cx(1, 2)
            .cz(0, 2)
            .measure(2, 0)
            .build();

        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let d = backend.execute(&dynamic, 400).unwrap();
        assert_eq!(d.marginal(&[2]).get("1"), Some(&400));
        let f = backend.execute(&deferred, 400).unwrap();
        assert_eq!(f.count("1"), 400);
    }
}
