//! # qdemo Protocols
//!
//! Communication protocols built on shared entanglement: teleportation,
//! superdense coding, and the BB84 and E91 key distribution schemes.
//! They follow the demo shape of `qdemo_algorithms` (config, circuit,
//! analysis, report) and run on any [`Backend`](qdemo_backend::Backend).
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_protocols // L5: Protocols
//!     Teleportation // 양자 순간이동
//!         Dynamic // c_if 보정
//!         Deferred // CX/CZ 보정
//!     Superdense // 초고밀도 부호화
//!     Qkd // 양자 키 분배
//!         Bb84 // 준비-측정
//!             Eve // 가로채기-재전송
//!         E91 // 얽힘 기반, CHSH
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qdemo_protocols::prelude::*;
//! use qdemo_backend::prelude::*;
//!
//! let backend = SimulatorBackend::ideal(8).with_seed(42);
//!
//! let comparison = bb84::compare(&backend, &Bb84Config::default()).unwrap();
//! println!("{}", comparison);
//! assert_eq!(comparison.without_eve.qber, 0.0);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Teleportation (Gantree: L5_Protocols → Teleportation)
pub mod teleportation;

/// Superdense coding (Gantree: L5_Protocols → Superdense)
pub mod superdense;

/// BB84 (Gantree: L5_Protocols → Bb84)
pub mod bb84;

/// E91 (Gantree: L5_Protocols → E91)
pub mod e91;

// ============================================================================
// Re-exports
// ============================================================================

pub use bb84::{Bb84Comparison, Bb84Config, Bb84Draw, Bb84Report, EveStats, Verdict};
pub use e91::{E91Config, E91Report};
pub use superdense::{MessageOutcome, SuperdenseReport};
pub use teleportation::{CorrectionMode, TeleportConfig, TeleportReport, TeleportState};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qdemo_protocols::prelude::*;
    //! ```

    pub use crate::{bb84, e91, superdense, teleportation};
    pub use crate::{Bb84Config, CorrectionMode, E91Config, TeleportConfig, TeleportState, Verdict};
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
    fn test_protocol_sweep_on_ideal_simulator() {
        let backend = SimulatorBackend::ideal(10).with_seed(42);
        let shots = 1024;
        let deferred = TeleportConfig::default().with_mode(CorrectionMode::Deferred);

        let reports: Vec<Box<dyn DemoReport>> = vec![
            Box::new(teleportation::run(&backend, &TeleportConfig::default(), shots).unwrap()),
            Box::new(teleportation::run(&backend, &deferred, shots).unwrap()),
            Box::new(superdense::run(&backend, &superdense::ALL_MESSAGES, shots).unwrap()),
            Box::new(bb84::run(&backend, &Bb84Config::default()).unwrap()),
            Box::new(e91::run(&backend, &E91Config::default(), shots).unwrap()),
        ];

        let rows: Vec<SummaryRow> = reports.iter().map(|r| SummaryRow::from_report(r.as_ref())).collect();
        let table = summary_table(&rows);
        assert!(rows.iter().all(|r| r.succeeded), "{}", table);
        assert!(table.starts_with("Summary: 5/5"));
    }

    #[test]
    fn test_noise_degrades_but_keeps_protocols_working() {
        let noise = NoiseModel::new(0.001, 0.01, 0.01).unwrap();
        let backend = SimulatorBackend::new(3, noise).with_seed(5);
        let report = teleportation::run(&backend, &TeleportConfig::default(), 2000).unwrap();
        assert!(report.success_rate() > 0.9);
        assert!(report.success_rate() < 1.0);

        let dense = superdense::run(&backend, &["10"], 2000).unwrap();
        assert!(dense.succeeded());
    }

    #[test]
    fn test_reports_render() {
        let backend = SimulatorBackend::ideal(10).with_seed(1);
        let e91 = e91::run(&backend, &E91Config::default(), 512).unwrap();
        let text = e91.to_string();
        assert!(text.contains("S = "));
        assert!(text.contains("Agreement: 100.0%"));

        let teleport = teleportation::run(&backend, &TeleportConfig::default(), 100).unwrap();
        assert!(teleport.to_string().contains("Teleportation success rate: 100.0%"));
    }
}
