//! HHL linear solver
//!
//! Gantree: L4_Algorithms → Hhl
//!
//! Solves A·x = b for two 2×2 systems whose time evolution e^{iAt}
//! reduces to Clifford-plus-rotation gates, so the whole algorithm fits
//! on three or four qubits:
//!
//! - `Simple`: A = [[1, −1/3], [−1/3, 1]], one clock qubit, t = 3π/2
//!   (e^{iAt} = −X)
//! - `TwoByTwo`: A = [[3, 1], [1, 3]]/4, two clock qubits, t = π
//!   (U² = X)
//!
//! Phase estimation writes the eigenvalue into the clock, a controlled
//! RY rotates the ancilla by 2·asin(C/λ), and the estimation is undone.
//! Post-selecting the ancilla on |1⟩ leaves the vector qubit ∝ A⁻¹|b⟩.

use crate::qft::{inverse_qft, qft_circuit};
use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_single, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Which demonstration system to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinearSystem {
    /// 3 qubits: ancilla q0, clock q1, vector q2
    Simple,
    /// 4 qubits: ancilla q0, clock q1..q2, vector q3
    TwoByTwo,
}

impl LinearSystem {
    /// Matrix A
    pub fn matrix(&self) -> [[f64; 2]; 2] {
        match self {
            LinearSystem::Simple => [[1.0, -1.0 / 3.0], [-1.0 / 3.0, 1.0]],
            LinearSystem::TwoByTwo => [[0.75, 0.25], [0.25, 0.75]],
        }
    }

    /// Eigenvalues of A, smallest first
    pub fn eigenvalues(&self) -> [f64; 2] {
        let [[a, b], [_, d]] = self.matrix();
        // symmetric with equal diagonal: a ± b
        let (l1, l2) = (a - b.abs(), d + b.abs());
        [l1.min(l2), l1.max(l2)]
    }

    /// Normalization C of the inversion, the smallest eigenvalue
    pub fn scale(&self) -> f64 {
        self.eigenvalues()[0]
    }

    /// Clock register size
    pub fn clock_qubits(&self) -> usize {
        match self {
            LinearSystem::Simple => 1,
            LinearSystem::TwoByTwo => 2,
        }
    }

    /// Total qubits (ancilla + clock + vector)
    pub fn num_qubits(&self) -> usize {
        self.clock_qubits() + 2
    }

    /// Vector qubit index
    pub fn vector_qubit(&self) -> usize {
        self.clock_qubits() + 1
    }
}

/// Exact A⁻¹·b by Cramer's rule
/// Gantree: classical_solution(A, b) -> [f64; 2] // 고전 해
pub fn classical_solution(matrix: [[f64; 2]; 2], b: [f64; 2]) -> QdemoResult<[f64; 2]> {
    let [[a, bb], [c, d]] = matrix;
    let det = a * d - bb * c;
    if det.abs() < 1e-12 {
        return Err(QdemoError::InvalidParameter("singular matrix".into()));
    }
    Ok([(d * b[0] - bb * b[1]) / det, (a * b[1] - c * b[0]) / det])
}

/// HHL configuration
/// Gantree: HhlConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HhlConfig {
    /// System to solve
    pub system: LinearSystem,
    /// Right-hand side basis state: 0 → b = [1, 0], 1 → b = [0, 1]
    pub rhs: usize,
}

impl Default for HhlConfig {
    fn default() -> Self {
        Self {
            system: LinearSystem::Simple,
            rhs: 0,
        }
    }
}

impl HhlConfig {
    /// Pick the system
    pub fn with_system(mut self, system: LinearSystem) -> Self {
        self.system = system;
        self
    }

    /// Pick b = |rhs⟩
    pub fn with_rhs(mut self, rhs: usize) -> Self {
        self.rhs = rhs;
        self
    }

    /// b as a vector
    pub fn b(&self) -> [f64; 2] {
        if self.rhs == 0 {
            [1.0, 0.0]
        } else {
            [0.0, 1.0]
        }
    }

    /// Expected P(vector = 0 | ancilla = 1)
    pub fn expected_p0(&self) -> QdemoResult<f64> {
        let x = classical_solution(self.system.matrix(), self.b())?;
        Ok(x[0].powi(2) / (x[0].powi(2) + x[1].powi(2)))
    }

    /// Expected P(ancilla = 1) = C²·‖A⁻¹b‖²
    pub fn expected_success(&self) -> QdemoResult<f64> {
        let x = classical_solution(self.system.matrix(), self.b())?;
        Ok(self.system.scale().powi(2) * (x[0].powi(2) + x[1].powi(2)))
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.rhs > 1 {
            return Err(QdemoError::InvalidParameter(format!(
                "right-hand side |{}⟩ is not a single-qubit basis state",
                self.rhs
            )));
        }
        Ok(())
    }
}

/// RY angle 2·asin(C/λ)
fn inversion_angle(scale: f64, eigenvalue: f64) -> f64 {
    2.0 * (scale / eigenvalue).clamp(-1.0, 1.0).asin()
}

/// Phase estimation of e^{iAt} on the clock, vector on the last qubit
fn phase_estimation(system: LinearSystem) -> Circuit {
    let v = system.vector_qubit();
    match system {
        LinearSystem::Simple => CircuitBuilder::new(3)
            .name("QPE")
            .h(1)
            .cx(1, v)
            .z(1)
            .h(1)
            .build(),
        LinearSystem::TwoByTwo => CircuitBuilder::new(4)
            .name("QPE")
            .h(1)
            .h(2)
            // U = e^{i3π/4}·RX(−π/2) from clock bit 0, U² = X from clock bit 1
            .p(1, 3.0 * PI / 4.0)
            .crx(1, v, -PI / 2.0)
            .cx(2, v)
            .append_on(&inverse_qft(2), &[1, 2])
            .build(),
    }
}

/// Inverse of `phase_estimation`
fn uncompute_phase_estimation(system: LinearSystem) -> Circuit {
    let v = system.vector_qubit();
    match system {
        LinearSystem::Simple => CircuitBuilder::new(3)
            .name("QPE†")
            .h(1)
            .z(1)
            .cx(1, v)
            .h(1)
            .build(),
        LinearSystem::TwoByTwo => CircuitBuilder::new(4)
            .name("QPE†")
            .append_on(&qft_circuit(2, true), &[1, 2])
            .cx(2, v)
            .crx(1, v, PI / 2.0)
            .p(1, -3.0 * PI / 4.0)
            .h(1)
            .h(2)
            .build(),
    }
}

/// Prepare b, estimate, invert, uncompute, measure
///
/// Clbit 0 is the ancilla and clbit 1 the vector qubit; the 4-qubit
/// system also measures its clock into clbits 2..3 to check it returned
/// to |00⟩.
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &HhlConfig) -> QdemoResult<Circuit> {
    config.validate()?;
    let system = config.system;
    let v = system.vector_qubit();
    let scale = system.scale();
    let [small, large] = system.eigenvalues();

    let mut builder = CircuitBuilder::new(system.num_qubits()).name("hhl");
    if config.rhs == 1 {
        builder = builder.x(v);
    }
    builder = builder.append(&phase_estimation(system)).barrier();

    // clock state → eigenvalue
    builder = match system {
        // |1⟩ ↔ λ = 2/3, |0⟩ ↔ λ = 4/3
        LinearSystem::Simple => builder
            .cry(1, 0, inversion_angle(scale, small))
            .x(1)
            .cry(1, 0, inversion_angle(scale, large))
            .x(1),
        // y = 1 ↔ λ = 1/2 on clock bit 0, y = 2 ↔ λ = 1 on clock bit 1
        LinearSystem::TwoByTwo => builder
            .cry(1, 0, inversion_angle(scale, small))
            .cry(2, 0, inversion_angle(scale, large)),
    };

    builder = builder.barrier().append(&uncompute_phase_estimation(system)).barrier();
    let builder = match system {
        LinearSystem::Simple => builder.measure_qubits(&[0, v]),
        LinearSystem::TwoByTwo => builder.measure_qubits(&[0, v, 1, 2]),
    };
    builder.try_build()
}

/// HHL report
#[derive(Debug, Clone)]
pub struct HhlReport {
    /// Configuration
    pub config: HhlConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// P(ancilla = 1)
    pub success_rate: f64,
    /// P(vector = 0 | ancilla = 1), `None` without post-selected shots
    pub conditional_p0: Option<f64>,
    /// P(clock back in |0…0⟩), 4-qubit system only
    pub clock_reset_rate: Option<f64>,
    /// Expected P(vector = 0 | ancilla = 1)
    pub expected_p0: f64,
    /// Expected P(ancilla = 1)
    pub expected_success: f64,
}

impl HhlReport {
    /// |measured − expected| of the conditional distribution
    pub fn solution_error(&self) -> Option<f64> {
        self.conditional_p0.map(|p| (p - self.expected_p0).abs())
    }
}

/// Post-select on the ancilla
/// Gantree: analyze(config, result) -> HhlReport // 분석
pub fn analyze(config: &HhlConfig, result: &ExecutionResult) -> QdemoResult<HhlReport> {
    if result.shots == 0 {
        return Err(QdemoError::NoCounts);
    }
    let (mut accepted, mut accepted_zero, mut clock_clean) = (0u64, 0u64, 0u64);
    for (key, &count) in &result.counts {
        if clbit_of(key, 0) == Some(true) {
            accepted += count;
            if clbit_of(key, 1) == Some(false) {
                accepted_zero += count;
            }
        }
        if clbit_of(key, 2) != Some(true) && clbit_of(key, 3) != Some(true) {
            clock_clean += count;
        }
    }
    let shots = result.shots as f64;
    Ok(HhlReport {
        config: config.clone(),
        result: result.clone(),
        success_rate: accepted as f64 / shots,
        conditional_p0: (accepted > 0).then(|| accepted_zero as f64 / accepted as f64),
        clock_reset_rate: (config.system == LinearSystem::TwoByTwo).then(|| clock_clean as f64 / shots),
        expected_p0: config.expected_p0()?,
        expected_success: config.expected_success()?,
    })
}

/// Build, execute and analyze
pub fn run(backend: &dyn Backend, config: &HhlConfig, shots: u64) -> QdemoResult<HhlReport> {
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    analyze(config, &result)
}

impl DemoReport for HhlReport {
    fn title(&self) -> String {
        match self.config.system {
            LinearSystem::Simple => "HHL (3-qubit)".to_string(),
            LinearSystem::TwoByTwo => "HHL (4-qubit 2×2)".to_string(),
        }
    }

    fn succeeded(&self) -> bool {
        self.solution_error().map_or(false, |e| e < 0.1)
    }
}

impl fmt::Display for HhlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.config.system.matrix();
        let b = self.config.b();
        writeln!(f, "HHL ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(
            f,
            "Solving Ax = b with A = [[{:.3}, {:.3}], [{:.3}, {:.3}]], b = [{}, {}]",
            a[0][0], a[0][1], a[1][0], a[1][1], b[0], b[1]
        )?;
        writeln!(f, "Eigenvalues: {:?}", self.config.system.eigenvalues())?;
        writeln!(f, "Total shots: {}", self.result.shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts:")?;
        report::write_top_counts(f, &self.result, 16, |key| {
            if clbit_of(key, 0) == Some(true) {
                "  SUCCESS".to_string()
            } else {
                "  fail".to_string()
            }
        })?;
        writeln!(f)?;
        writeln!(
            f,
            "Success rate (ancilla=1): {:.1}% (expected {:.1}%)",
            self.success_rate * 100.0,
            self.expected_success * 100.0
        )?;
        if let Some(rate) = self.clock_reset_rate {
            writeln!(f, "Clock returned to |00⟩: {:.1}%", rate * 100.0)?;
        }
        match self.conditional_p0 {
            Some(p0) => {
                writeln!(f, "Solution qubit given ancilla=1:")?;
                writeln!(f, "  P(0) = {:.3}  (expected {:.3})", p0, self.expected_p0)?;
                writeln!(f, "  P(1) = {:.3}  (expected {:.3})", 1.0 - p0, 1.0 - self.expected_p0)?;
            }
            None => writeln!(f, "No post-selected shots")?,
        }
        writeln!(f)?;
        writeln!(f, "Steps: encode |b⟩, estimate eigenvalues, rotate ancilla by asin(C/λ),")?;
        writeln!(f, "uncompute, post-select ancilla = 1 to leave |x⟩ ∝ A⁻¹|b⟩.")?;
        writeln!(f, "Classical: O(N·s·κ·log(1/ε)); HHL: O(log(N)·s²·κ²/ε)")?;
        write!(
            f,
            "{} {}",
            report::check(self.succeeded()),
            if self.succeeded() {
                "solution amplitudes match A⁻¹b"
            } else {
                "solution amplitudes differ from A⁻¹b"
            }
        )
    }
}
