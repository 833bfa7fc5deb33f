//! # qdemo Algorithms
//!
//! Textbook quantum algorithms as runnable demos. Every module follows
//! the same shape: a configuration with `Default` and `with_*` builders,
//! `build_circuit` producing the circuit, `analyze` turning counts into a
//! report, and `run` doing both against any [`Backend`](qdemo_backend::Backend).
//! Reports implement `Display` for the terminal and
//! [`DemoReport`](qdemo_backend::DemoReport) for pass/fail summaries.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_algorithms // L4: Algorithms
//!     Oracles // 오라클 문제
//!         Deutsch
//!         DeutschJozsa
//!         BernsteinVazirani
//!         Simon
//!     Search // 탐색
//!         Grover
//!         QuantumCounting
//!         QuantumWalk
//!     Fourier // 푸리에 기반
//!         Qft
//!         Qpe
//!         Shor
//!         AmplitudeEstimation
//!         Hhl
//!     Variational // 변분 알고리즘
//!         Qaoa
//!         Vqe
//!     SwapTest // 상태 비교
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qdemo_algorithms::prelude::*;
//! use qdemo_backend::prelude::*;
//!
//! let backend = SimulatorBackend::ideal(6).with_seed(42);
//!
//! let report = grover::run(&backend, &GroverConfig::default(), 1024).unwrap();
//! println!("{}", report);
//! assert!(report.succeeded());
//! ```
//!
//! ## Batched Sweeps
//!
//! Demos with several cases submit them as one batch, which on IBM
//! hardware is a single Sampler job:
//!
//! ```rust
//! use qdemo_algorithms::bernstein_vazirani;
//! use qdemo_backend::prelude::*;
//!
//! let backend = SimulatorBackend::ideal(6).with_seed(42);
//! let reports = bernstein_vazirani::run_sweep(&backend, &["101", "1101"], 100).unwrap();
//! println!("{}", bernstein_vazirani::sweep_summary(&reports));
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Deutsch (Gantree: L4_Algorithms → Deutsch)
pub mod deutsch;

/// Deutsch–Jozsa (Gantree: L4_Algorithms → DeutschJozsa)
pub mod deutsch_jozsa;

/// Bernstein–Vazirani (Gantree: L4_Algorithms → BernsteinVazirani)
pub mod bernstein_vazirani;

/// Simon (Gantree: L4_Algorithms → Simon)
pub mod simon;

/// Grover search (Gantree: L4_Algorithms → Grover)
pub mod grover;

/// Quantum counting (Gantree: L4_Algorithms → QuantumCounting)
pub mod quantum_counting;

/// Quantum walk (Gantree: L4_Algorithms → QuantumWalk)
pub mod quantum_walk;

/// Quantum Fourier transform (Gantree: L4_Algorithms → Qft)
pub mod qft;

/// Phase estimation (Gantree: L4_Algorithms → Qpe)
pub mod qpe;

/// Shor factoring (Gantree: L4_Algorithms → Shor)
pub mod shor;

/// Amplitude estimation (Gantree: L4_Algorithms → AmplitudeEstimation)
pub mod amplitude_estimation;

/// HHL linear solver (Gantree: L4_Algorithms → Hhl)
pub mod hhl;

/// QAOA MaxCut (Gantree: L4_Algorithms → Qaoa)
pub mod qaoa;

/// VQE for H₂ (Gantree: L4_Algorithms → Vqe)
pub mod vqe;

/// SWAP test (Gantree: L4_Algorithms → SwapTest)
pub mod swap_test;

// ============================================================================
// Re-exports
// ============================================================================

pub use amplitude_estimation::{AeConfig, AeReport};
pub use bernstein_vazirani::BernsteinVaziraniReport;
pub use deutsch::{DeutschOracle, DeutschReport};
pub use deutsch_jozsa::{DeutschJozsaConfig, DeutschJozsaReport, DjOracle};
pub use grover::{GroverConfig, GroverReport};
pub use hhl::{HhlConfig, HhlReport, LinearSystem};
pub use qaoa::{Graph, QaoaConfig, QaoaReport};
pub use qft::{QftConfig, QftMode, QftReport};
pub use qpe::{QpeConfig, QpeReport};
pub use quantum_counting::{CountingConfig, CountingReport};
pub use quantum_walk::{WalkConfig, WalkMode, WalkReport};
pub use shor::{ShorConfig, ShorOutcome, ShorReport};
pub use simon::SimonReport;
pub use swap_test::{BlochState, SwapTestCase, SwapTestReport, SwapTestVariant};
pub use vqe::{Hamiltonian, VqeConfig, VqeReport};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qdemo_algorithms::prelude::*;
    //! ```

    pub use crate::{
        amplitude_estimation, bernstein_vazirani, deutsch, deutsch_jozsa, grover, hhl, qaoa, qft,
        qpe, quantum_counting, quantum_walk, shor, simon, swap_test, vqe,
    };
    pub use crate::{
        AeConfig, CountingConfig, DeutschJozsaConfig, DeutschOracle, DjOracle, Graph,
        GroverConfig, HhlConfig, LinearSystem, QaoaConfig, QftConfig, QftMode, QpeConfig,
        ShorConfig, SwapTestVariant, VqeConfig, WalkConfig, WalkMode,
    };
    pub use qdemo_backend::DemoReport;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qdemo_backend::report::{summary_table, SummaryRow};
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_default_sweep_on_ideal_simulator() {
        let backend = SimulatorBackend::ideal(10).with_seed(42);
        let shots = 1024;

        let reports: Vec<Box<dyn DemoReport>> = vec![
            Box::new(deutsch::run(&backend, &DeutschOracle::ALL, shots).unwrap()),
            Box::new(deutsch_jozsa::run(&backend, &DeutschJozsaConfig::default(), shots).unwrap()),
            Box::new(bernstein_vazirani::run(&backend, bernstein_vazirani::DEFAULT_SECRET, shots).unwrap()),
            Box::new(simon::run(&backend, simon::DEFAULT_SECRET, shots).unwrap()),
            Box::new(grover::run(&backend, &GroverConfig::default(), shots).unwrap()),
            Box::new(qft::run(&backend, &QftConfig::default(), shots).unwrap()),
            Box::new(qpe::run(&backend, &QpeConfig::default(), shots).unwrap()),
            Box::new(shor::run(&backend, &ShorConfig::default(), shots).unwrap()),
            Box::new(amplitude_estimation::run(&backend, &AeConfig::default(), shots).unwrap()),
            Box::new(quantum_counting::run(&backend, &CountingConfig::default(), shots).unwrap()),
            Box::new(hhl::run(&backend, &HhlConfig::default(), shots).unwrap()),
            Box::new(quantum_walk::run(&backend, &WalkConfig::default(), shots).unwrap()),
        ];

        let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r.as_ref())).collect();
        let table = summary_table(&rows);
        assert!(rows.iter().all(|r| r.succeeded), "{}", table);
        assert!(table.starts_with("Summary: 12/12"));
    }

    #[test]
    fn test_reports_render() {
        let backend = SimulatorBackend::ideal(5).with_seed(1);
        let counting = quantum_counting::run(&backend, &CountingConfig::default(), 256).unwrap();
        let text = counting.to_string();
        assert!(text.contains("QUANTUM COUNTING RESULTS"));
        assert!(text.contains("Backend: "));

        let walk = quantum_walk::run(&backend, &WalkConfig::default(), 256).unwrap();
        assert!(walk.to_string().contains("Mean position: 3.00"));
    }

    #[test]
    fn test_oversized_circuit_is_rejected() {
        let small = SimulatorBackend::ideal(3).with_seed(1);
        assert!(grover::run(&small, &GroverConfig::default(), 10).is_err());
    }
}
