//! SWAP test
//!
//! Gantree: L4_Algorithms → SwapTest
//!
//! Estimates |⟨ψ|φ⟩|² for single-qubit states |ψ(θ, φ)⟩ = RZ(φ)RY(θ)|0⟩.
//! The ancilla version measures P(0) = (1 + |⟨ψ|φ⟩|²)/2 after
//! H–CSWAP–H; the destructive version is a Bell-basis measurement of the
//! two states whose |11⟩ rate is (1 − |⟨ψ|φ⟩|²)/2.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_batch, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, QdemoResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Bloch angles of a single-qubit state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlochState {
    /// Polar angle θ
    pub theta: f64,
    /// Azimuthal angle φ
    pub phi: f64,
}

impl BlochState {
    /// State from (θ, φ)
    pub const fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }
}

/// One pair of states to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapTestCase {
    /// |ψ⟩
    pub first: BlochState,
    /// |φ⟩
    pub second: BlochState,
    /// Human-readable label
    pub description: String,
}

/// Default comparison set
/// Gantree: default_cases() -> Vec<SwapTestCase> // 기본 5종
pub fn default_cases() -> Vec<SwapTestCase> {
    let case = |a: (f64, f64), b: (f64, f64), d: &str| SwapTestCase {
        first: BlochState::new(a.0, a.1),
        second: BlochState::new(b.0, b.1),
        description: d.to_string(),
    };
    vec![
        case((0.0, 0.0), (0.0, 0.0), "Identical states |0⟩ vs |0⟩"),
        case((PI, 0.0), (PI, 0.0), "Identical states |1⟩ vs |1⟩"),
        case((0.0, 0.0), (PI, 0.0), "Orthogonal states |0⟩ vs |1⟩"),
        case((PI / 2.0, 0.0), (PI / 2.0, 0.0), "Identical |+⟩ states"),
        case((PI / 2.0, 0.0), (PI / 2.0, PI), "Orthogonal |+⟩ vs |−⟩"),
    ]
}

/// |⟨ψ|φ⟩|² from the Bloch angles
pub fn theoretical_overlap(a: BlochState, b: BlochState) -> f64 {
    let (c1, s1) = ((a.theta / 2.0).cos(), (a.theta / 2.0).sin());
    let (c2, s2) = ((b.theta / 2.0).cos(), (b.theta / 2.0).sin());
    let overlap = (c1 * c2).powi(2) + (s1 * s2).powi(2) + 2.0 * c1 * c2 * s1 * s2 * (b.phi - a.phi).cos();
    overlap.clamp(0.0, 1.0)
}

/// Ancilla q0, states on q1 and q2, measure q0
/// Gantree: swap_test_circuit(case) -> Circuit // SWAP 테스트
pub fn swap_test_circuit(case: &SwapTestCase) -> QdemoResult<Circuit> {
    CircuitBuilder::with_clbits(3, 1)
        .name("swap_test")
        .ry(1, case.first.theta)
        .rz(1, case.first.phi)
        .ry(2, case.second.theta)
        .rz(2, case.second.phi)
        .barrier()
        .h(0)
        .cswap(0, 1, 2)
        .h(0)
        .barrier()
        .measure(0, 0)
        .try_build()
}

/// Bell-basis measurement of q0, q1 without an ancilla
pub fn destructive_circuit(case: &SwapTestCase) -> QdemoResult<Circuit> {
    CircuitBuilder::new(2)
        .name("destructive_swap_test")
        .ry(0, case.first.theta)
        .rz(0, case.first.phi)
        .ry(1, case.second.theta)
        .rz(1, case.second.phi)
        .barrier()
        .cx(0, 1)
        .h(0)
        .barrier()
        .measure_all()
        .try_build()
}

/// Which circuit family the demo runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapTestVariant {
    /// Ancilla + CSWAP
    Ancilla,
    /// Bell measurement, no ancilla
    Destructive,
}

/// Measured overlap for one case
#[derive(Debug, Clone)]
pub struct SwapTestOutcome {
    /// Case under test
    pub case: SwapTestCase,
    /// Analytic |⟨ψ|φ⟩|²
    pub theoretical: f64,
    /// Estimated |⟨ψ|φ⟩|²
    pub measured: f64,
    /// P(ancilla = 0), ancilla variant only
    pub p0: Option<f64>,
    /// Raw result
    pub result: ExecutionResult,
}

impl SwapTestOutcome {
    /// |measured − theoretical|
    pub fn error(&self) -> f64 {
        (self.measured - self.theoretical).abs()
    }
}

/// Overlap from the counts of either variant
/// Gantree: analyze(case, variant, result) -> SwapTestOutcome // 분석
pub fn analyze(case: &SwapTestCase, variant: SwapTestVariant, result: &ExecutionResult) -> SwapTestOutcome {
    let shots = result.shots.max(1) as f64;
    let (measured, p0) = match variant {
        SwapTestVariant::Ancilla => {
            let zeros: u64 = result
                .counts
                .iter()
                .filter(|(key, _)| clbit_of(key, 0) == Some(false))
                .map(|(_, &c)| c)
                .sum();
            let p0 = zeros as f64 / shots;
            (2.0 * p0 - 1.0, Some(p0))
        }
        SwapTestVariant::Destructive => {
            // eigenvalue (−1)^(a∧b): only |11⟩ is antisymmetric
            let singlet = result.count("11") as f64 / shots;
            (1.0 - 2.0 * singlet, None)
        }
    };
    SwapTestOutcome {
        case: case.clone(),
        theoretical: theoretical_overlap(case.first, case.second),
        measured,
        p0,
        result: result.clone(),
    }
}

/// SWAP test report
#[derive(Debug, Clone)]
pub struct SwapTestReport {
    /// Backend name
    pub backend: String,
    /// Variant used
    pub variant: SwapTestVariant,
    /// One outcome per case
    pub outcomes: Vec<SwapTestOutcome>,
}

/// Run every case as one batch
pub fn run(
    backend: &dyn Backend,
    cases: &[SwapTestCase],
    variant: SwapTestVariant,
    shots: u64,
) -> QdemoResult<SwapTestReport> {
    let circuits = cases
        .iter()
        .map(|c| match variant {
            SwapTestVariant::Ancilla => swap_test_circuit(c),
            SwapTestVariant::Destructive => destructive_circuit(c),
        })
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    Ok(SwapTestReport {
        backend: backend.name().to_string(),
        variant,
        outcomes: cases
            .iter()
            .zip(&results)
            .map(|(c, r)| analyze(c, variant, r))
            .collect(),
    })
}

/// Error tolerance for the pass verdict
const TOLERANCE: f64 = 0.15;

impl DemoReport for SwapTestReport {
    fn title(&self) -> String {
        match self.variant {
            SwapTestVariant::Ancilla => "SWAP test".to_string(),
            SwapTestVariant::Destructive => "Destructive SWAP test".to_string(),
        }
    }

    fn succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.error() < TOLERANCE)
    }
}

impl fmt::Display for SwapTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} RESULTS", self.title().to_uppercase())?;
        writeln!(f, "Backend: {}", self.backend)?;
        if let Some(o) = self.outcomes.first() {
            writeln!(f, "Shots per test: {}", o.result.shots)?;
        }
        for o in &self.outcomes {
            writeln!(f)?;
            writeln!(f, "{}:", o.case.description)?;
            writeln!(f, "  |ψ⟩ params: θ={:.3}, φ={:.3}", o.case.first.theta, o.case.first.phi)?;
            writeln!(f, "  |φ⟩ params: θ={:.3}, φ={:.3}", o.case.second.theta, o.case.second.phi)?;
            if let Some(p0) = o.p0 {
                writeln!(f, "  Measured P(0): {:.4}", p0)?;
            }
            writeln!(f, "  Theoretical overlap: {:.4}", o.theoretical)?;
            writeln!(f, "  Measured overlap:    {:.4}", o.measured)?;
            writeln!(f, "  {} error {:.4}", report::check(o.error() < TOLERANCE), o.error())?;
        }
        writeln!(f)?;
        match self.variant {
            SwapTestVariant::Ancilla => write!(
                f,
                "H on ancilla, CSWAP, H, measure: P(0) = (1 + |⟨ψ|φ⟩|²) / 2"
            ),
            SwapTestVariant::Destructive => write!(
                f,
                "CX then H, measure both: P(11) = (1 − |⟨ψ|φ⟩|²) / 2"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_theoretical_overlap() {
        let zero = BlochState::new(0.0, 0.0);
        let one = BlochState::new(PI, 0.0);
        let plus = BlochState::new(PI / 2.0, 0.0);
        let minus = BlochState::new(PI / 2.0, PI);
        assert_relative_eq!(theoretical_overlap(zero, zero), 1.0);
        assert_relative_eq!(theoretical_overlap(zero, one), 0.0, epsilon = 1e-12);
        assert_relative_eq!(theoretical_overlap(plus, minus), 0.0, epsilon = 1e-12);
        assert_relative_eq!(theoretical_overlap(zero, plus), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_default_cases_ancilla() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let report = run(&backend, &default_cases(), SwapTestVariant::Ancilla, 2000).unwrap();
        assert_eq!(report.outcomes.len(), 5);
        // identical states never trigger the ancilla
        assert_relative_eq!(report.outcomes[0].measured, 1.0);
        assert!(report.outcomes[2].measured.abs() < 0.1);
        assert!(report.succeeded());
    }

    #[test]
    fn test_default_cases_destructive() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let report = run(&backend, &default_cases(), SwapTestVariant::Destructive, 2000).unwrap();
        assert_relative_eq!(report.outcomes[1].measured, 1.0);
        assert!(report.outcomes[4].measured.abs() < 0.1);
        assert!(report.succeeded());
    }

    #[test]
    fn test_partial_overlap() {
        let case = SwapTestCase {
            first: BlochState::new(0.0, 0.0),
            second: BlochState::new(PI / 3.0, 0.4),
            description: "partial".into(),
        };
        let backend = SimulatorBackend::ideal(3).with_seed(3);
        let report = run(&backend, &[case], SwapTestVariant::Ancilla, 8000).unwrap();
        let o = &report.outcomes[0];
        assert_relative_eq!(o.theoretical, 0.75, epsilon = 1e-12);
        assert!(o.error() < 0.05);
    }
}
