//! Discrete-time quantum walk on a cycle
//!
//! Gantree: L4_Algorithms → QuantumWalk
//!
//! Coin qubit q0 and n position qubits q1..q(n) holding the vertex of a
//! cycle of 2^n vertices (q1 is the least significant bit). One step is a
//! Hadamard coin followed by a shift: increment when the coin is |1⟩,
//! decrement when it is |0⟩, each a cascade of multi-controlled X gates.
//! The search variant starts uniform and flips the phase of the marked
//! vertex before every coin toss.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{exact_probabilities, run_single, Backend, ExecutionResult};
use qdemo_core::{Bitstring, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Walk flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkMode {
    /// Start at vertex 0 with coin |0⟩
    Simple,
    /// Start uniform and mark a vertex
    Search {
        /// Vertex whose phase is flipped each step
        marked: usize,
    },
}

/// Quantum walk configuration
/// Gantree: WalkConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Position register size
    pub position_qubits: usize,
    /// Walk steps
    pub steps: usize,
    /// Simple or search
    pub mode: WalkMode,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            position_qubits: 2,
            steps: 3,
            mode: WalkMode::Simple,
        }
    }
}

impl WalkConfig {
    /// Search for `marked` on 8 vertices, 6 steps
    pub fn search(marked: usize) -> Self {
        Self {
            position_qubits: 3,
            steps: 6,
            mode: WalkMode::Search { marked },
        }
    }

    /// Set the number of steps
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Set the position register size
    pub fn with_position_qubits(mut self, n: usize) -> Self {
        self.position_qubits = n;
        self
    }

    /// Vertices on the cycle
    pub fn num_positions(&self) -> usize {
        1 << self.position_qubits
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.position_qubits == 0 || self.position_qubits > 10 {
            return Err(QdemoError::InvalidParameter(format!(
                "position register {} outside 1..=10",
                self.position_qubits
            )));
        }
        if let WalkMode::Search { marked } = self.mode {
            if marked >= self.num_positions() {
                return Err(QdemoError::InvalidParameter(format!(
                    "marked vertex {} not on a cycle of {}",
                    marked,
                    self.num_positions()
                )));
            }
        }
        Ok(())
    }
}

/// Controlled ±1 on the position register (coin = q0)
/// Gantree: shift(n) -> Circuit // 이동 연산자
pub fn shift_operator(position_qubits: usize) -> Circuit {
    let pos: Vec<usize> = (1..=position_qubits).collect();
    let mut builder = CircuitBuilder::new(position_qubits + 1).name("Shift");
    // +1 when coin = 1: flip the top bits first while the carry is intact
    for k in (0..position_qubits).rev() {
        let controls: Vec<usize> = std::iter::once(0).chain(pos[..k].iter().copied()).collect();
        builder = builder.mcx(&controls, pos[k]);
    }
    // −1 when coin = 0: the increment reversed, under a negated control
    builder = builder.x(0);
    for k in 0..position_qubits {
        let controls: Vec<usize> = std::iter::once(0).chain(pos[..k].iter().copied()).collect();
        builder = builder.mcx(&controls, pos[k]);
    }
    builder.x(0).build()
}

/// Walk circuit, measuring the position register
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &WalkConfig) -> QdemoResult<Circuit> {
    config.validate()?;
    let n = config.position_qubits;
    let pos: Vec<usize> = (1..=n).collect();
    let shift = shift_operator(n);

    let mut builder = CircuitBuilder::new(n + 1).name("quantum_walk");
    let marker = match config.mode {
        WalkMode::Simple => None,
        WalkMode::Search { marked } => {
            builder = builder.h_layer().barrier();
            let zeros: Vec<usize> = (0..n)
                .filter(|&i| (marked >> i) & 1 == 0)
                .map(|i| pos[i])
                .collect();
            Some(zeros)
        }
    };
    for _ in 0..config.steps {
        if let Some(zeros) = &marker {
            builder = builder.x_on(zeros).mcz(&pos).x_on(zeros);
        }
        builder = builder.h(0).append(&shift).barrier();
    }
    builder.measure_qubits(&pos).try_build()
}

/// Noise-free position distribution
pub fn exact_distribution(config: &WalkConfig) -> QdemoResult<Vec<f64>> {
    let mut unmeasured = CircuitBuilder::new(config.position_qubits + 1);
    for gate in build_circuit(config)?.gates().iter().filter(|g| !g.is_measurement()) {
        unmeasured = unmeasured.gate(gate.clone());
    }
    let probs = exact_probabilities(&unmeasured.try_build()?)?;
    let mut positions = vec![0.0; config.num_positions()];
    for (index, p) in probs.iter().enumerate() {
        positions[index >> 1] += p;
    }
    Ok(positions)
}

/// Quantum walk report
#[derive(Debug, Clone)]
pub struct WalkReport {
    /// Configuration
    pub config: WalkConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// Measured probability per vertex
    pub distribution: Vec<f64>,
    /// Noise-free probability per vertex
    pub ideal: Vec<f64>,
    /// Mean vertex
    pub mean: f64,
    /// Standard deviation of the vertex
    pub spread: f64,
}

impl WalkReport {
    /// Total variation distance to the noise-free distribution
    pub fn distance_to_ideal(&self) -> f64 {
        0.5 * self
            .distribution
            .iter()
            .zip(&self.ideal)
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
    }

    /// Probability of the marked vertex (search only)
    pub fn marked_rate(&self) -> Option<f64> {
        match self.config.mode {
            WalkMode::Search { marked } => self.distribution.get(marked).copied(),
            WalkMode::Simple => None,
        }
    }
}

/// Tally positions
/// Gantree: analyze(config, result) -> WalkReport // 분석
pub fn analyze(config: &WalkConfig, result: &ExecutionResult) -> QdemoResult<WalkReport> {
    if result.shots == 0 {
        return Err(QdemoError::NoCounts);
    }
    let mut distribution = vec![0.0; config.num_positions()];
    for (key, &count) in &result.counts {
        let position = Bitstring::parse(key)?.to_usize();
        if let Some(slot) = distribution.get_mut(position) {
            *slot += count as f64 / result.shots as f64;
        }
    }
    let mean: f64 = distribution.iter().enumerate().map(|(x, p)| x as f64 * p).sum();
    let variance: f64 = distribution
        .iter()
        .enumerate()
        .map(|(x, p)| (x as f64 - mean).powi(2) * p)
        .sum();
    Ok(WalkReport {
        config: config.clone(),
        result: result.clone(),
        ideal: exact_distribution(config)?,
        distribution,
        mean,
        spread: variance.sqrt(),
    })
}

/// Build, execute and analyze
pub fn run(backend: &dyn Backend, config: &WalkConfig, shots: u64) -> QdemoResult<WalkReport> {
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    analyze(config, &result)
}

impl DemoReport for WalkReport {
    fn title(&self) -> String {
        match self.config.mode {
            WalkMode::Simple => format!("Quantum walk ({} steps)", self.config.steps),
            WalkMode::Search { marked } => format!("Quantum walk search (vertex {})", marked),
        }
    }

    fn succeeded(&self) -> bool {
        self.distance_to_ideal() < 0.1
    }
}

impl fmt::Display for WalkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_pos = self.config.num_positions();
        writeln!(f, "QUANTUM WALK RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        match self.config.mode {
            WalkMode::Simple => writeln!(f, "Walk type: simple")?,
            WalkMode::Search { marked } => writeln!(f, "Walk type: search (marked vertex {})", marked)?,
        }
        writeln!(f, "Cycle: {} vertices, {} steps", n_pos, self.config.steps)?;
        writeln!(f)?;
        writeln!(f, "Position distribution (measured | ideal):")?;
        for (x, (p, ideal)) in self.distribution.iter().zip(&self.ideal).enumerate() {
            writeln!(
                f,
                "  Position {} ({}): {:5.1}% | {:5.1}% {}",
                x,
                Bitstring::from_usize(x, self.config.position_qubits),
                p * 100.0,
                ideal * 100.0,
                report::bar(*p, report::BAR_WIDTH / 2)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Mean position: {:.2}", self.mean)?;
        writeln!(f, "Spread (σ): {:.2}", self.spread)?;
        writeln!(f, "Distance to ideal: {:.3}", self.distance_to_ideal())?;
        if let Some(rate) = self.marked_rate() {
            writeln!(
                f,
                "Search success rate: {:.1}% (uniform {:.1}%)",
                rate * 100.0,
                100.0 / n_pos as f64
            )?;
        }
        writeln!(f)?;
        writeln!(f, "A classical random walk spreads as O(√t); the quantum walk spreads as O(t).")?;
        write!(
            f,
            "{} {}",
            report::check(self.succeeded()),
            if self.succeeded() {
                "measured distribution matches the interference pattern"
            } else {
                "measured distribution departs from the ideal walk"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_shift_moves_both_ways() {
        // coin 1 at vertex 3 (q1 q2 set) → vertex 0; coin 0 at vertex 0 → vertex 3
        let up = CircuitBuilder::new(3).x(0).x(1).x(2).append(&shift_operator(2)).build();
        let probs = exact_probabilities(&up).unwrap();
        assert_relative_eq!(probs[0b001], 1.0, epsilon = 1e-12);
        let down = CircuitBuilder::new(3).append(&shift_operator(2)).build();
        let probs = exact_probabilities(&down).unwrap();
        assert_relative_eq!(probs[0b110], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_three_steps_on_four_vertices() {
        let ideal = exact_distribution(&WalkConfig::default()).unwrap();
        assert_relative_eq!(ideal[3], 1.0, epsilon = 1e-10);

        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let report = run(&backend, &WalkConfig::default(), 500).unwrap();
        assert_eq!(report.result.count("11"), 500);
        assert_relative_eq!(report.mean, 3.0);
        assert!(report.succeeded());
    }

    #[test]
    fn test_two_steps_split() {
        let ideal = exact_distribution(&WalkConfig::default().with_steps(2)).unwrap();
        assert_relative_eq!(ideal[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(ideal[2], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_search_amplifies_marked_vertex() {
        let config = WalkConfig::search(2);
        let ideal = exact_distribution(&config).unwrap();
        assert_relative_eq!(ideal[2], 0.25, epsilon = 1e-9);

        let backend = SimulatorBackend::ideal(4).with_seed(7);
        let report = run(&backend, &config, 4000).unwrap();
        assert!(report.marked_rate().unwrap() > 0.2);
        assert!(report.succeeded());
    }

    #[test]
    fn test_rejects_off_cycle_vertex() {
        assert!(build_circuit(&WalkConfig::search(9)).is_err());
    }
}
