//! Quantum Fourier transform
//!
//! Gantree: L4_Algorithms → Qft
//!
//! The QFT maps |x⟩ to Σ_k e^{2πi·xk/2^n}|k⟩. It is built as a ladder of
//! Hadamards and controlled phases π/2^k followed by a register reversal.
//! The demo either applies the QFT to a basis state and checks the output
//! is spread over all states, or applies QFT then QFT† and checks the
//! input comes back.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_single, Backend, ExecutionResult};
use qdemo_core::{Bitstring, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// QFT on `n` qubits; `swaps` appends the final register reversal
/// Gantree: qft_circuit(n, swaps) -> Circuit // QFT 회로
pub fn qft_circuit(n: usize, swaps: bool) -> Circuit {
    let mut builder = CircuitBuilder::new(n).name(format!("QFT({})", n));
    for target in (0..n).rev() {
        builder = builder.h(target);
        for control in (0..target).rev() {
            builder = builder.cp(control, target, PI / 2f64.powi((target - control) as i32));
        }
    }
    if swaps {
        for q in 0..n / 2 {
            builder = builder.swap(q, n - 1 - q);
        }
    }
    builder.build()
}

/// QFT† on `n` qubits: the gates of `qft_circuit` reversed and conjugated
pub fn inverse_qft(n: usize) -> Circuit {
    let mut builder = CircuitBuilder::new(n).name(format!("QFT†({})", n));
    for q in (0..n / 2).rev() {
        builder = builder.swap(q, n - 1 - q);
    }
    for target in 0..n {
        for control in 0..target {
            builder = builder.cp(control, target, -PI / 2f64.powi((target - control) as i32));
        }
        builder = builder.h(target);
    }
    builder.build()
}

/// What the demo checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QftMode {
    /// QFT alone; the output should be spread over all basis states
    Forward,
    /// QFT then QFT†; the input should be recovered
    RoundTrip,
}

/// QFT demo configuration
/// Gantree: QftConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QftConfig {
    /// Register size
    pub num_qubits: usize,
    /// Basis state fed to the transform
    pub input: usize,
    /// Forward or round trip
    pub mode: QftMode,
}

impl Default for QftConfig {
    fn default() -> Self {
        Self {
            num_qubits: 5,
            input: 0,
            mode: QftMode::RoundTrip,
        }
    }
}

impl QftConfig {
    /// Set the register size
    pub fn with_qubits(mut self, n: usize) -> Self {
        self.num_qubits = n;
        self
    }

    /// Set the input basis state
    pub fn with_input(mut self, input: usize) -> Self {
        self.input = input;
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: QftMode) -> Self {
        self.mode = mode;
        self
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.num_qubits == 0 || self.num_qubits > 16 {
            return Err(QdemoError::InvalidParameter(format!(
                "QFT register size {} outside 1..=16",
                self.num_qubits
            )));
        }
        if self.input >= 1 << self.num_qubits {
            return Err(QdemoError::InvalidParameter(format!(
                "input {} does not fit in {} qubits",
                self.input, self.num_qubits
            )));
        }
        Ok(())
    }
}

/// Prepare |input⟩, transform, measure
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &QftConfig) -> QdemoResult<Circuit> {
    config.validate()?;
    let n = config.num_qubits;
    let ones: Vec<usize> = (0..n).filter(|q| (config.input >> q) & 1 == 1).collect();

    let mut builder = CircuitBuilder::new(n)
        .name("qft_demo")
        .x_on(&ones)
        .barrier()
        .append(&qft_circuit(n, true));
    if config.mode == QftMode::RoundTrip {
        builder = builder.barrier().append(&inverse_qft(n));
    }
    builder.measure_all().try_build()
}

/// QFT demo report
#[derive(Debug, Clone)]
pub struct QftReport {
    /// Configuration
    pub config: QftConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// Fraction of shots returning the input (round trip)
    pub recovery_rate: f64,
    /// Standard deviation of observed counts around shots/2^n (forward)
    pub count_std_dev: f64,
    /// Most frequent outcome
    pub most_common: String,
}

/// Analyze the counts of `build_circuit(config)`
/// Gantree: analyze(config, result) -> QftReport // 분석
pub fn analyze(config: &QftConfig, result: &ExecutionResult) -> QdemoResult<QftReport> {
    let (most_common, _) = result.most_frequent().ok_or(QdemoError::NoCounts)?;
    let expected = Bitstring::from_usize(config.input, config.num_qubits).to_string();
    let recovery_rate = result.probability(&expected);

    let uniform = result.shots as f64 / (1u64 << config.num_qubits) as f64;
    let variance = result
        .counts
        .values()
        .map(|&c| (c as f64 - uniform).powi(2))
        .sum::<f64>()
        / result.counts.len() as f64;

    Ok(QftReport {
        config: config.clone(),
        result: result.clone(),
        recovery_rate,
        count_std_dev: variance.sqrt(),
        most_common,
    })
}

/// Build, execute and analyze
pub fn run(backend: &dyn Backend, config: &QftConfig, shots: u64) -> QdemoResult<QftReport> {
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    analyze(config, &result)
}

impl QftReport {
    fn input_key(&self) -> String {
        Bitstring::from_usize(self.config.input, self.config.num_qubits).to_string()
    }
}

impl DemoReport for QftReport {
    fn title(&self) -> String {
        match self.config.mode {
            QftMode::Forward => format!("QFT of |{}⟩", self.config.input),
            QftMode::RoundTrip => format!("QFT·QFT† on |{}⟩", self.config.input),
        }
    }

    fn succeeded(&self) -> bool {
        match self.config.mode {
            QftMode::RoundTrip => self.most_common == self.input_key(),
            // no outcome far above the uniform 1/2^n
            QftMode::Forward => {
                let n_states = (1u64 << self.config.num_qubits) as f64;
                let max_p = self
                    .result
                    .most_frequent()
                    .map(|(_, c)| c as f64 / self.result.shots as f64)
                    .unwrap_or(1.0);
                max_p < 2.0 / n_states
            }
        }
    }
}

impl fmt::Display for QftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.config.num_qubits;
        let shots = self.result.shots;
        writeln!(f, "QUANTUM FOURIER TRANSFORM")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Qubits: {}", n)?;
        writeln!(f, "Input state: |{}⟩ = |{}⟩", self.input_key(), self.config.input)?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (top 10):")?;
        report::write_top_counts(f, &self.result, 10, |key| {
            let value = Bitstring::parse(key).map(|b| b.to_usize()).unwrap_or(0);
            format!("  = |{}⟩", value)
        })?;
        writeln!(f)?;

        match self.config.mode {
            QftMode::RoundTrip => {
                writeln!(f, "Identity test (QFT followed by QFT†):")?;
                writeln!(f, "  Expected output: |{}⟩", self.input_key())?;
                writeln!(
                    f,
                    "  Correct measurements: {}/{} ({:.1}%)",
                    self.result.count(&self.input_key()),
                    shots,
                    self.recovery_rate * 100.0
                )?;
            }
            QftMode::Forward => {
                let states = 1u64 << n;
                writeln!(f, "QFT output analysis:")?;
                if self.config.input == 0 {
                    writeln!(
                        f,
                        "  Input |0⟩ gives a uniform superposition: ~{:.1}% for each of {} states",
                        100.0 / states as f64,
                        states
                    )?;
                } else {
                    writeln!(
                        f,
                        "  Input |{}⟩ is encoded in the phases; Z-basis counts stay spread out",
                        self.config.input
                    )?;
                }
                writeln!(f, "  Expected per state: {:.1}", shots as f64 / states as f64)?;
                writeln!(f, "  Standard deviation: {:.1}", self.count_std_dev)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "QFT cost for {} qubits:", n)?;
        writeln!(f, "  Transform size: {}", 1u64 << n)?;
        writeln!(f, "  Gates: O(n²) = {}", n * n)?;
        writeln!(f, "  Classical FFT: O(n·2ⁿ) = {}", n as u64 * (1u64 << n))?;
        writeln!(f)?;
        write!(
            f,
            "{} {}",
            report::check(self.succeeded()),
            match (self.config.mode, self.succeeded()) {
                (QftMode::RoundTrip, true) => "QFT · QFT† = I verified".to_string(),
                (QftMode::RoundTrip, false) =>
                    format!("most common |{}⟩ differs from the input", self.most_common),
                (QftMode::Forward, true) => "output spread across the register".to_string(),
                (QftMode::Forward, false) => "output concentrated on few states".to_string(),
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::{exact_probabilities, SimulatorBackend};
    use qdemo_core::Gate;

    #[test]
    fn test_qft_of_zero_is_uniform() {
        let probs = exact_probabilities(&qft_circuit(3, true)).unwrap();
        for p in probs {
            assert_relative_eq!(p, 0.125, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_inverse_undoes_qft() {
        for input in [0usize, 5, 6] {
            let ones: Vec<usize> = (0..3).filter(|q| (input >> q) & 1 == 1).collect();
            let circuit = CircuitBuilder::new(3)
                .x_on(&ones)
                .append(&qft_circuit(3, true))
                .append(&inverse_qft(3))
                .build();
            let probs = exact_probabilities(&circuit).unwrap();
            assert_relative_eq!(probs[input], 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_wide_register_angles() {
        let circuit = inverse_qft(40);
        let smallest = circuit
            .gates()
            .iter()
            .filter_map(|g| match g {
                Gate::Cp(0, 39, angle) => Some(*angle),
                _ => None,
            })
            .next()
            .unwrap();
        assert_relative_eq!(smallest, -PI / 2f64.powi(39), max_relative = 1e-12);
        assert_eq!(qft_circuit(40, false).count_2q(), 40 * 39 / 2);
    }

    #[test]
    fn test_round_trip_demo() {
        let backend = SimulatorBackend::ideal(5).with_seed(42);
        let config = QftConfig::default().with_input(19);
        let report = run(&backend, &config, 256).unwrap();
        assert_relative_eq!(report.recovery_rate, 1.0);
        assert_eq!(report.most_common, "10011");
        assert!(report.succeeded());
    }

    #[test]
    fn test_forward_demo() {
        let backend = SimulatorBackend::ideal(3).with_seed(7);
        let config = QftConfig::default().with_qubits(3).with_mode(QftMode::Forward);
        let report = run(&backend, &config, 4000).unwrap();
        assert_eq!(report.result.counts.len(), 8);
        assert!(report.count_std_dev < 60.0);
        assert!(report.succeeded());
        assert!(report.to_string().contains("uniform superposition"));
    }

    #[test]
    fn test_rejects_oversized_input() {
        let config = QftConfig::default().with_qubits(2).with_input(4);
        assert!(build_circuit(&config).is_err());
    }
}
