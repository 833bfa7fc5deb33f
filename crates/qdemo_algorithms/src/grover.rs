//! Grover search
//!
//! Gantree: L4_Algorithms → Grover
//!
//! Amplitude amplification over N = 2^n items with M marked states.
//! Each iteration is a phase oracle followed by the diffuser
//! H⊗n (2|0⟩⟨0| − I) H⊗n; after ⌊π/4·√(N/M)⌉ iterations a marked
//! state is measured with probability sin²((2k+1)θ), θ = asin √(M/N).

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_single, Backend, ExecutionResult};
use qdemo_core::{Bitstring, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Optimal iteration count max(1, round(π/4·√(N/M)))
/// Gantree: optimal_iterations(n, m) -> usize // 최적 반복
pub fn optimal_iterations(num_qubits: usize, num_marked: usize) -> usize {
    let n_items = (num_qubits as f64).exp2();
    let k = (PI / 4.0 * (n_items / num_marked.max(1) as f64).sqrt()).round() as usize;
    k.max(1)
}

/// Probability of measuring a marked state after `iterations`
pub fn theoretical_success(num_qubits: usize, num_marked: usize, iterations: usize) -> f64 {
    let n_items = (num_qubits as f64).exp2();
    let theta = (num_marked as f64 / n_items).sqrt().asin();
    ((2 * iterations + 1) as f64 * theta).sin().powi(2)
}

/// 2^n, saturating at u64::MAX
fn search_space(num_qubits: usize) -> u64 {
    u32::try_from(num_qubits)
        .ok()
        .and_then(|n| 1u64.checked_shl(n))
        .unwrap_or(u64::MAX)
}

/// |x⟩ → −|x⟩ for every marked x; key bit i (from the right) is qubit i
/// Gantree: phase_oracle(n, marked) -> Circuit // 위상 오라클
pub fn phase_oracle(num_qubits: usize, marked: &[Bitstring]) -> Circuit {
    let all: Vec<usize> = (0..num_qubits).collect();
    marked
        .iter()
        .fold(CircuitBuilder::new(num_qubits).name("Oracle"), |builder, target| {
            let zeros: Vec<usize> = (0..num_qubits)
                .filter(|&q| target.bit(q) != Some(true))
                .collect();
            builder.x_on(&zeros).mcz(&all).x_on(&zeros)
        })
        .build()
}

/// Inversion about the mean
/// Gantree: diffuser(n) -> Circuit // 확산 연산자
pub fn diffuser(num_qubits: usize) -> Circuit {
    let all: Vec<usize> = (0..num_qubits).collect();
    CircuitBuilder::new(num_qubits)
        .name("Diffuser")
        .h_layer()
        .x_layer()
        .mcz(&all)
        .x_layer()
        .h_layer()
        .build()
}

/// Grover search configuration
/// Gantree: GroverConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroverConfig {
    /// Search register size
    pub num_qubits: usize,
    /// Marked states as count keys
    pub marked: Vec<String>,
    /// Iterations; `None` picks the optimum
    pub iterations: Option<usize>,
}

impl Default for GroverConfig {
    fn default() -> Self {
        Self {
            num_qubits: 5,
            marked: vec!["10101".to_string()],
            iterations: None,
        }
    }
}

impl GroverConfig {
    /// Search `marked` in a register of the same width
    pub fn new(marked: &[&str]) -> Self {
        Self {
            num_qubits: marked.first().map(|m| m.len()).unwrap_or(0),
            marked: marked.iter().map(|m| m.to_string()).collect(),
            iterations: None,
        }
    }

    /// Fix the iteration count
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Iterations actually applied
    pub fn effective_iterations(&self) -> usize {
        self.iterations
            .unwrap_or_else(|| optimal_iterations(self.num_qubits, self.marked.len()))
    }

    fn marked_bits(&self) -> QdemoResult<Vec<Bitstring>> {
        if self.num_qubits == 0 || self.marked.is_empty() {
            return Err(QdemoError::InvalidParameter(
                "need a register and at least one marked state".into(),
            ));
        }
        if self.num_qubits > 16 {
            return Err(QdemoError::InvalidParameter(format!(
                "search register size {} outside 1..=16",
                self.num_qubits
            )));
        }
        self.marked
            .iter()
            .map(|m| Bitstring::parse_width(m, self.num_qubits))
            .collect()
    }
}

/// Superposition, k × (oracle, diffuser), measure
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &GroverConfig) -> QdemoResult<Circuit> {
    let marked = config.marked_bits()?;
    let n = config.num_qubits;
    let oracle = phase_oracle(n, &marked);
    let diffuser = diffuser(n);

    let mut builder = CircuitBuilder::new(n).name("grover").h_layer().barrier();
    for _ in 0..config.effective_iterations() {
        builder = builder.append(&oracle).barrier().append(&diffuser).barrier();
    }
    builder.measure_all().try_build()
}

/// Grover report
#[derive(Debug, Clone)]
pub struct GroverReport {
    /// Configuration
    pub config: GroverConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// Iterations applied
    pub iterations: usize,
    /// Fraction of shots hitting a marked state
    pub success_rate: f64,
    /// sin²((2k+1)θ)
    pub theoretical_success: f64,
    /// Most frequent outcome
    pub most_common: String,
}

/// Tally marked hits
/// Gantree: analyze(config, result) -> GroverReport // 분석
pub fn analyze(config: &GroverConfig, result: &ExecutionResult) -> QdemoResult<GroverReport> {
    config.marked_bits()?;
    let (most_common, _) = result.most_frequent().ok_or(QdemoError::NoCounts)?;
    let hits: u64 = config.marked.iter().map(|m| result.count(m)).sum();
    let iterations = config.effective_iterations();
    Ok(GroverReport {
        config: config.clone(),
        result: result.clone(),
        iterations,
        success_rate: report::percent(hits, result.shots) / 100.0,
        theoretical_success: theoretical_success(config.num_qubits, config.marked.len(), iterations),
        most_common,
    })
}

/// Build, execute and analyze
pub fn run(backend: &dyn Backend, config: &GroverConfig, shots: u64) -> QdemoResult<GroverReport> {
    let circuit = build_circuit(config)?;
    log::debug!("grover circuit depth {}", circuit.depth());
    let result = run_single(backend, &circuit, shots)?;
    analyze(config, &result)
}

impl GroverReport {
    /// Average classical queries, N/2
    pub fn classical_queries(&self) -> u64 {
        search_space(self.config.num_qubits) / 2
    }
}

impl DemoReport for GroverReport {
    fn title(&self) -> String {
        format!("Grover ({})", self.config.marked.join(","))
    }

    fn succeeded(&self) -> bool {
        self.config.marked.contains(&self.most_common)
    }
}

impl fmt::Display for GroverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.config.num_qubits;
        let shots = self.result.shots;
        writeln!(f, "GROVER'S ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Search space: {} items ({} qubits)", search_space(n), n)?;
        writeln!(f, "Target states: {:?}", self.config.marked)?;
        writeln!(f, "Grover iterations: {}", self.iterations)?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (top 10):")?;
        let marked = self.config.marked.clone();
        report::write_top_counts(f, &self.result, 10, move |key| {
            if marked.iter().any(|m| m == key) {
                " ← TARGET".to_string()
            } else {
                String::new()
            }
        })?;
        writeln!(f)?;
        writeln!(
            f,
            "Most measured: {} ({:.1}%)",
            self.most_common,
            self.result.probability(&self.most_common) * 100.0
        )?;
        writeln!(f, "Measured success rate:    {:.1}%", self.success_rate * 100.0)?;
        writeln!(f, "Theoretical success rate: {:.1}%", self.theoretical_success * 100.0)?;
        writeln!(f)?;
        let classical = self.classical_queries();
        writeln!(f, "Quantum queries (iterations): {}", self.iterations)?;
        writeln!(f, "Classical queries (average):  {}", classical)?;
        writeln!(
            f,
            "Speedup factor: ~{:.1}x",
            classical as f64 / self.iterations.max(1) as f64
        )?;
        if self.succeeded() {
            write!(f, "✓ Found target state '{}'", self.most_common)
        } else {
            write!(f, "✗ Most common result '{}' is not a target state", self.most_common)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::{exact_probabilities, SimulatorBackend};

    #[test]
    fn test_iteration_formula() {
        assert_eq!(optimal_iterations(2, 1), 2);
        assert_eq!(optimal_iterations(3, 1), 2);
        assert_eq!(optimal_iterations(5, 1), 4);
        assert_eq!(optimal_iterations(3, 2), 2);
        assert_eq!(optimal_iterations(1, 1), 1);
        // one iteration on four items is exact
        assert_relative_eq!(theoretical_success(2, 1, 1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oracle_marks_only_target() {
        let marked = vec![Bitstring::parse("101").unwrap()];
        let circuit = CircuitBuilder::new(3)
            .h_layer()
            .append(&phase_oracle(3, &marked))
            .h_layer()
            .build();
        // H·O·H|0⟩ has amplitude 1 − 2/N on |000⟩
        let probs = exact_probabilities(&circuit).unwrap();
        assert_relative_eq!(probs[0], 0.5625, epsilon = 1e-10);
    }

    #[test]
    fn test_three_qubit_search() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let config = GroverConfig::new(&["101"]);
        let report = run(&backend, &config, 2000).unwrap();
        assert_eq!(report.iterations, 2);
        assert!(report.success_rate >= 0.9, "{}", report.success_rate);
        assert_relative_eq!(report.theoretical_success, 0.9453, epsilon = 1e-3);
        assert!(report.succeeded());
    }

    #[test]
    fn test_default_five_qubit_search() {
        let backend = SimulatorBackend::ideal(5).with_seed(7);
        let report = run(&backend, &GroverConfig::default(), 1000).unwrap();
        assert_eq!(report.most_common, "10101");
        assert!(report.success_rate > 0.95);
        assert_eq!(report.classical_queries(), 16);
    }

    #[test]
    fn test_two_marked_states() {
        let backend = SimulatorBackend::ideal(3).with_seed(3);
        let config = GroverConfig::new(&["010", "110"]);
        let report = run(&backend, &config, 1000).unwrap();
        let exact = theoretical_success(3, 2, report.iterations);
        assert!((report.success_rate - exact).abs() < 0.06);
    }

    #[test]
    fn test_wide_registers() {
        let wide = GroverConfig {
            num_qubits: 64,
            marked: vec!["1".repeat(64)],
            iterations: Some(1),
        };
        assert!(matches!(build_circuit(&wide), Err(QdemoError::InvalidParameter(_))));
        let backend = SimulatorBackend::ideal(5);
        assert!(run(&backend, &GroverConfig { num_qubits: 17, ..wide }, 10).is_err());

        // 2^64 items, one marked: k = round(π/4 · 2^32)
        assert_eq!(optimal_iterations(64, 1), 3_373_259_426);
        assert!(theoretical_success(64, 1, 1) < 1e-18);
        assert_eq!(search_space(70), u64::MAX);
        assert_eq!(search_space(4), 16);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let config = GroverConfig::default().with_iterations(1);
        let bad = GroverConfig {
            marked: vec!["101".into()],
            ..config
        };
        assert!(build_circuit(&bad).is_err());
    }
}
