//! # qdemo QEC
//!
//! Quantum error-correction demos: the three-qubit bit-flip and
//! phase-flip repetition codes, Shor's nine-qubit code and Steane's
//! seven-qubit code. Each demo encodes a logical state, injects a chosen
//! Pauli error, extracts a syndrome or corrects coherently, and reports
//! how often the logical value survives.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_qec // L5: Error Correction
//!     Logical // 논리 상태, 주입 오류
//!     Repetition // 3큐비트 반복 부호
//!         BitFlip
//!         PhaseFlip
//!     ShorCode // 9큐비트
//!     Steane // 7큐비트 CSS
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qdemo_qec::prelude::*;
//! use qdemo_backend::prelude::*;
//!
//! let backend = SimulatorBackend::ideal(13).with_seed(42);
//!
//! let report = steane::run(&backend, LogicalState::Zero, &steane::default_cases(), 256).unwrap();
//! println!("{}", report);
//! assert!(report.succeeded());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Logical inputs and injected errors (Gantree: L5_Qec → Logical)
pub mod logical;

/// Bit-flip and phase-flip codes (Gantree: L5_Qec → Repetition)
pub mod repetition;

/// Shor's nine-qubit code (Gantree: L5_Qec → ShorCode)
pub mod shor_code;

/// Steane's seven-qubit code (Gantree: L5_Qec → Steane)
pub mod steane;

// ============================================================================
// Re-exports
// ============================================================================

pub use logical::{InjectedError, LogicalState};
pub use repetition::{CodeKind, RepetitionConfig, RepetitionReport};
pub use shor_code::{ShorCaseOutcome, ShorCodeReport};
pub use steane::{SteaneCaseOutcome, SteaneReport};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qdemo_qec::prelude::*;
    //! ```

    pub use crate::{repetition, shor_code, steane};
    pub use crate::{CodeKind, InjectedError, LogicalState, RepetitionConfig};
    pub use qdemo_backend::DemoReport;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qdemo_backend::report::{summary_table, SummaryRow};
    use qdemo_backend::{NoiseModel, SimulatorBackend};

    #[test]
    fn test_code_sweep_on_ideal_simulator() {
        let backend = SimulatorBackend::ideal(13).with_seed(42);
        let shots = 512;

        let reports: Vec<Box<dyn DemoReport>> = vec![
            Box::new(repetition::run(&backend, &RepetitionConfig::new(CodeKind::BitFlip), shots).unwrap()),
            Box::new(repetition::run(&backend, &RepetitionConfig::new(CodeKind::PhaseFlip), shots).unwrap()),
            Box::new(shor_code::run(&backend, LogicalState::Plus, &shor_code::default_cases(), shots).unwrap()),
            Box::new(steane::run(&backend, LogicalState::Zero, &steane::default_cases(), shots).unwrap()),
        ];

        let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r.as_ref())).collect();
        let table = summary_table(&rows);
        assert!(rows.iter().all(|r| r.succeeded), "{}", table);
        assert!(table.starts_with("Summary: 4/4"));
    }

    #[test]
    fn test_correction_beats_noise() {
        let noise = NoiseModel::new(0.0, 0.0, 0.03).unwrap();
        let backend = SimulatorBackend::new(5, noise).with_seed(9);
        let report = repetition::run(&backend, &RepetitionConfig::new(CodeKind::BitFlip), 2000).unwrap();
        assert!(report.corrected_success > 0.85);
        assert!(report.corrected_success < 1.0);
        assert!(report.succeeded());
    }

    #[test]
    fn test_reports_render() {
        let backend = SimulatorBackend::ideal(9).with_seed(1);
        let shor = shor_code::run(&backend, LogicalState::One, &shor_code::default_cases(), 64).unwrap();
        let text = shor.to_string();
        assert!(text.contains("SHOR'S 9-QUBIT CODE RESULTS"));
        assert!(text.contains("Z error on q4:"));

        let rep = repetition::run(&backend, &RepetitionConfig::new(CodeKind::PhaseFlip), 64).unwrap();
        assert!(rep.to_string().contains("11: "));
    }
}
