//! Quantum teleportation
//!
//! Gantree: L5_Protocols → Teleportation
//!
//! Alice holds |ψ⟩ on q0 and shares a Bell pair q1–q2 with Bob. Her Bell
//! measurement lands in c0 (q0) and c1 (q1); Bob fixes q2 with X if c1
//! and Z if c0, then measures into c2. The dynamic variant sends those
//! corrections as real mid-circuit conditionals; the deferred variant
//! replaces them with CX/CZ before any measurement.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_single, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, Gate, QdemoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// State Alice teleports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TeleportState {
    /// |1⟩
    One,
    /// RZ(φ)·RY(θ)|0⟩
    Bloch {
        /// Polar angle θ
        theta: f64,
        /// Azimuth φ
        phi: f64,
    },
}

impl TeleportState {
    /// P(1) when Bob measures in Z
    pub fn expected_p1(&self) -> f64 {
        match self {
            TeleportState::One => 1.0,
            TeleportState::Bloch { theta, .. } => (theta / 2.0).sin().powi(2),
        }
    }

    fn prepare(&self, builder: CircuitBuilder) -> CircuitBuilder {
        match *self {
            TeleportState::One => builder.x(0),
            TeleportState::Bloch { theta, phi } => builder.ry(0, theta).rz(0, phi),
        }
    }
}

impl fmt::Display for TeleportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeleportState::One => write!(f, "|1⟩"),
            TeleportState::Bloch { theta, phi } => write!(f, "RZ({:.3})·RY({:.3})|0⟩", phi, theta),
        }
    }
}

/// How Bob's corrections are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMode {
    /// Mid-circuit measurement and classically conditioned gates
    Dynamic,
    /// Controlled gates replacing the classical channel
    Deferred,
}

/// Teleportation configuration
/// Gantree: TeleportConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleportConfig {
    /// State to send
    pub state: TeleportState,
    /// Correction mode
    pub mode: CorrectionMode,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            state: TeleportState::One,
            mode: CorrectionMode::Dynamic,
        }
    }
}

impl TeleportConfig {
    /// Set the state
    pub fn with_state(mut self, state: TeleportState) -> Self {
        self.state = state;
        self
    }

    /// Set the correction mode
    pub fn with_mode(mut self, mode: CorrectionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Teleportation circuit; c0, c1 Bell outcome, c2 Bob's qubit
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &TeleportConfig) -> QdemoResult<Circuit> {
    let builder = CircuitBuilder::with_clbits(3, 3).name("teleportation");
    let builder = config
        .state
        .prepare(builder)
        .barrier()
        .h(1)
        .cx(1, 2)
        .barrier()
        .cx(0, 1)
        .h(0)
        .barrier();
    let builder = match config.mode {
        CorrectionMode::Dynamic => builder
            .measure(0, 0)
            .measure(1, 1)
            .c_if(1, true, Gate::X(2))
            .c_if(0, true, Gate::Z(2)),
        CorrectionMode::Deferred => builder.cx(1, 2).cz(0, 2).measure(0, 0).measure(1, 1),
    };
    builder.barrier().measure(2, 2).try_build()
}

/// Teleportation report
#[derive(Debug, Clone)]
pub struct TeleportReport {
    /// Configuration
    pub config: TeleportConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// P(Bob measures 1)
    pub bob_p1: f64,
    /// Bell outcome "c1c0" → count
    pub bell_outcomes: BTreeMap<String, u64>,
}

impl TeleportReport {
    /// Fraction of shots where Bob measured the prepared basis value
    ///
    /// Only meaningful for basis states; for superpositions compare
    /// `bob_p1` with the expected P(1).
    pub fn success_rate(&self) -> f64 {
        if self.config.state.expected_p1() >= 0.5 {
            self.bob_p1
        } else {
            1.0 - self.bob_p1
        }
    }

    /// |P(1) measured − P(1) expected|
    pub fn error(&self) -> f64 {
        (self.bob_p1 - self.config.state.expected_p1()).abs()
    }
}

/// Split the counts into Bob's result and Alice's Bell outcomes
/// Gantree: analyze(config, result) -> TeleportReport // 분석
pub fn analyze(config: &TeleportConfig, result: &ExecutionResult) -> TeleportReport {
    let mut ones = 0u64;
    let mut bell_outcomes = BTreeMap::new();
    for (key, &count) in &result.counts {
        if clbit_of(key, 2) == Some(true) {
            ones += count;
        }
        let bit = |c| if clbit_of(key, c) == Some(true) { '1' } else { '0' };
        *bell_outcomes.entry(format!("{}{}", bit(1), bit(0))).or_insert(0) += count;
    }
    TeleportReport {
        config: config.clone(),
        result: result.clone(),
        bob_p1: ones as f64 / result.shots.max(1) as f64,
        bell_outcomes,
    }
}

/// Build, execute and analyze
pub fn run(backend: &dyn Backend, config: &TeleportConfig, shots: u64) -> QdemoResult<TeleportReport> {
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    Ok(analyze(config, &result))
}

impl DemoReport for TeleportReport {
    fn title(&self) -> String {
        match self.config.mode {
            CorrectionMode::Dynamic => "Teleportation (dynamic)".to_string(),
            CorrectionMode::Deferred => "Teleportation (deferred)".to_string(),
        }
    }

    fn succeeded(&self) -> bool {
        self.error() < 0.1
    }
}

impl fmt::Display for TeleportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shots = self.result.shots;
        writeln!(f, "QUANTUM TELEPORTATION RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "State teleported: {}", self.config.state)?;
        writeln!(
            f,
            "Corrections: {}",
            match self.config.mode {
                CorrectionMode::Dynamic => "dynamic circuit (c_if)",
                CorrectionMode::Deferred => "deferred measurement (CX/CZ)",
            }
        )?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Alice's Bell measurement (c1c0):")?;
        for (outcome, &count) in &self.bell_outcomes {
            writeln!(
                f,
                "  {}: {:5} ({:5.1}%) {}",
                outcome,
                count,
                report::percent(count, shots),
                report::bar(count as f64 / shots.max(1) as f64, report::BAR_WIDTH / 2)
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Bob measured 1: {:.1}% (expected {:.1}%)",
            self.bob_p1 * 100.0,
            self.config.state.expected_p1() * 100.0
        )?;
        writeln!(f, "Teleportation success rate: {:.1}%", self.success_rate() * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Steps: Bell pair q1–q2, Alice's Bell measurement on q0–q1,")?;
        writeln!(f, "two classical bits to Bob, X^c1 then Z^c0 on q2.")?;
        write!(
            f,
            "{} {}",
            report::check(self.succeeded()),
            if self.succeeded() {
                "Bob's qubit reproduces the sent state"
            } else {
                "Bob's statistics differ from the sent state"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;
    use std::f64::consts::PI;

    #[test]
    fn test_teleport_one_both_modes() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        for mode in [CorrectionMode::Dynamic, CorrectionMode::Deferred] {
            let config = TeleportConfig::default().with_mode(mode);
            let report = run(&backend, &config, 1000).unwrap();
            assert_eq!(report.bob_p1, 1.0, "{:?}", mode);
            assert_eq!(report.success_rate(), 1.0);
            assert!(report.succeeded());
        }
    }

    #[test]
    fn test_bell_outcomes_are_uniform() {
        let backend = SimulatorBackend::ideal(3).with_seed(7);
        let report = run(&backend, &TeleportConfig::default(), 4000).unwrap();
        assert_eq!(report.bell_outcomes.len(), 4);
        for count in report.bell_outcomes.values() {
            assert!((*count as f64 / 4000.0 - 0.25).abs() < 0.04);
        }
    }

    #[test]
    fn test_teleport_superposition() {
        let backend = SimulatorBackend::ideal(3).with_seed(3);
        let state = TeleportState::Bloch { theta: PI / 3.0, phi: 0.7 };
        let config = TeleportConfig::default().with_state(state);
        let report = run(&backend, &config, 8000).unwrap();
        assert!((state.expected_p1() - 0.25).abs() < 1e-12);
        assert!(report.error() < 0.03, "P(1) = {}", report.bob_p1);
    }

    #[test]
    fn test_dynamic_circuit_has_conditionals() {
        let circuit = build_circuit(&TeleportConfig::default()).unwrap();
        assert!(circuit.has_mid_circuit_measurement());
        let deferred =
            build_circuit(&TeleportConfig::default().with_mode(CorrectionMode::Deferred)).unwrap();
        assert_eq!(deferred.count_ops().get("cz"), Some(&1));
    }
}
