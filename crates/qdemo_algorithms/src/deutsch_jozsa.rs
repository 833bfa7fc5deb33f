//! Deutsch–Jozsa algorithm
//!
//! Gantree: L4_Algorithms → DeutschJozsa
//!
//! n input qubits and one ancilla (qubit n). A constant oracle leaves the
//! inputs in |0…0⟩ after the final Hadamards; a balanced oracle
//! f(x) = x·s mod 2 sends them to |s⟩, which is never all zeros.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_single, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Oracle family
/// Gantree: DjOracle // 상수/균형
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DjOracle {
    /// f(x) = 0
    Constant0,
    /// f(x) = 1
    Constant1,
    /// f(x) = x·pattern mod 2; `pattern[i]` weights input qubit i
    Balanced(Vec<bool>),
}

impl DjOracle {
    /// Balanced oracle from a 0/1 string, character i ↦ input qubit i
    pub fn balanced_from_str(pattern: &str) -> QdemoResult<Self> {
        let bits = pattern
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(QdemoError::InvalidBitstring(pattern.to_string())),
            })
            .collect::<QdemoResult<Vec<bool>>>()?;
        Ok(DjOracle::Balanced(bits))
    }

    /// Constant oracles
    pub fn is_constant(&self) -> bool {
        !matches!(self, DjOracle::Balanced(_))
    }

    fn label(&self) -> String {
        match self {
            DjOracle::Constant0 => "constant_0".to_string(),
            DjOracle::Constant1 => "constant_1".to_string(),
            DjOracle::Balanced(p) => {
                let s: String = p.iter().map(|&b| if b { '1' } else { '0' }).collect();
                format!("balanced({})", s)
            }
        }
    }
}

/// Deutsch–Jozsa configuration
/// Gantree: DeutschJozsaConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeutschJozsaConfig {
    /// Number of input qubits
    pub num_inputs: usize,
    /// Oracle under test
    pub oracle: DjOracle,
}

impl Default for DeutschJozsaConfig {
    fn default() -> Self {
        Self {
            num_inputs: 5,
            oracle: DjOracle::Balanced(vec![true; 5]),
        }
    }
}

impl DeutschJozsaConfig {
    /// Set the input size; an all-ones balanced pattern follows it
    pub fn with_inputs(mut self, n: usize) -> Self {
        if let DjOracle::Balanced(p) = &self.oracle {
            if p.iter().all(|&b| b) {
                self.oracle = DjOracle::Balanced(vec![true; n]);
            }
        }
        self.num_inputs = n;
        self
    }

    /// Set the oracle
    pub fn with_oracle(mut self, oracle: DjOracle) -> Self {
        self.oracle = oracle;
        self
    }

    /// Worst-case deterministic classical queries, 2^(n−1) + 1
    pub fn classical_queries(&self) -> u64 {
        u32::try_from(self.num_inputs.saturating_sub(1))
            .ok()
            .and_then(|n| 1u64.checked_shl(n))
            .map_or(u64::MAX, |half| half + 1)
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.num_inputs == 0 || self.num_inputs > 16 {
            return Err(QdemoError::InvalidParameter(format!(
                "input register size {} outside 1..=16",
                self.num_inputs
            )));
        }
        if let DjOracle::Balanced(p) = &self.oracle {
            if p.len() != self.num_inputs {
                return Err(QdemoError::BitstringLength {
                    bits: self.oracle.label(),
                    len: p.len(),
                    expected: self.num_inputs,
                });
            }
            if !p.iter().any(|&b| b) {
                return Err(QdemoError::InvalidParameter(
                    "an all-zero pattern gives a constant function".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Oracle on n inputs + ancilla
pub fn build_oracle(config: &DeutschJozsaConfig) -> Circuit {
    let n = config.num_inputs;
    let builder = CircuitBuilder::new(n + 1).name(format!("U_{}", config.oracle.label()));
    let builder = match &config.oracle {
        DjOracle::Constant0 => builder,
        DjOracle::Constant1 => builder.x(n),
        DjOracle::Balanced(pattern) => pattern
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit)
            .fold(builder, |b, (i, _)| b.cx(i, n)),
    };
    builder.build()
}

/// Full circuit, measuring the inputs
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &DeutschJozsaConfig) -> QdemoResult<Circuit> {
    config.validate()?;
    let n = config.num_inputs;
    let inputs: Vec<usize> = (0..n).collect();
    CircuitBuilder::new(n + 1)
        .name("deutsch_jozsa")
        .x(n)
        .barrier()
        .h_layer()
        .barrier()
        .append(&build_oracle(config))
        .barrier()
        .h_on(&inputs)
        .barrier()
        .measure_qubits(&inputs)
        .try_build()
}

/// Deutsch–Jozsa report
#[derive(Debug, Clone)]
pub struct DeutschJozsaReport {
    /// Configuration
    pub config: DeutschJozsaConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// Shots reading all zeros
    pub zero_count: u64,
    /// Majority verdict: all-zeros more often than not
    pub measured_constant: bool,
}

impl DeutschJozsaReport {
    /// Fraction of shots consistent with the oracle
    pub fn success_rate(&self) -> f64 {
        let shots = self.result.shots;
        let good = if self.config.oracle.is_constant() {
            self.zero_count
        } else {
            shots - self.zero_count.min(shots)
        };
        report::percent(good, shots) / 100.0
    }
}

/// Classify by the all-zeros count
/// Gantree: analyze(config, result) -> DeutschJozsaReport // 분석
pub fn analyze(config: &DeutschJozsaConfig, result: &ExecutionResult) -> DeutschJozsaReport {
    let zeros = "0".repeat(config.num_inputs);
    let zero_count = result.count(&zeros);
    DeutschJozsaReport {
        config: config.clone(),
        result: result.clone(),
        zero_count,
        measured_constant: zero_count > result.shots.saturating_sub(zero_count),
    }
}

/// Build, execute and analyze
pub fn run(
    backend: &dyn Backend,
    config: &DeutschJozsaConfig,
    shots: u64,
) -> QdemoResult<DeutschJozsaReport> {
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    Ok(analyze(config, &result))
}

impl DemoReport for DeutschJozsaReport {
    fn title(&self) -> String {
        format!("Deutsch–Jozsa ({})", self.config.oracle.label())
    }

    fn succeeded(&self) -> bool {
        self.measured_constant == self.config.oracle.is_constant()
    }
}

impl fmt::Display for DeutschJozsaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.config.num_inputs;
        let shots = self.result.shots;
        let verdict = |constant: bool| if constant { "CONSTANT" } else { "BALANCED" };

        writeln!(f, "DEUTSCH-JOZSA ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Input qubits: {}", n)?;
        writeln!(f, "Oracle: {}", self.config.oracle.label())?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (top 10):")?;
        report::write_top_counts(f, &self.result, 10, |_| String::new())?;
        writeln!(f)?;
        writeln!(
            f,
            "All zeros ({}): {} ({:.1}%)",
            "0".repeat(n),
            self.zero_count,
            report::percent(self.zero_count, shots)
        )?;
        let nonzero = shots.saturating_sub(self.zero_count);
        writeln!(f, "Non-zero outcomes: {} ({:.1}%)", nonzero, report::percent(nonzero, shots))?;
        writeln!(f)?;
        writeln!(f, "Conclusion: {}", verdict(self.measured_constant))?;
        writeln!(f, "Expected:   {}", verdict(self.config.oracle.is_constant()))?;
        writeln!(f, "Success rate: {:.1}%", self.success_rate() * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Quantum queries: 1")?;
        writeln!(
            f,
            "Classical queries (worst case): {}",
            self.config.classical_queries()
        )?;
        write!(
            f,
            "{} {}",
            report::check(self.succeeded()),
            if self.succeeded() {
                "function type identified"
            } else {
                "majority disagrees with the oracle"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_constant_oracles_always_zero() {
        let backend = SimulatorBackend::ideal(6).with_seed(42);
        for oracle in [DjOracle::Constant0, DjOracle::Constant1] {
            let config = DeutschJozsaConfig::default().with_oracle(oracle);
            let report = run(&backend, &config, 300).unwrap();
            assert_eq!(report.zero_count, 300);
            assert!(report.succeeded());
        }
    }

    #[test]
    fn test_balanced_never_zero() {
        let backend = SimulatorBackend::ideal(6).with_seed(42);
        let oracle = DjOracle::balanced_from_str("10110").unwrap();
        let config = DeutschJozsaConfig::default().with_oracle(oracle);
        let report = run(&backend, &config, 300).unwrap();
        assert_eq!(report.zero_count, 0);
        // pattern char i sits on qubit i, so the key is the pattern reversed
        assert_eq!(report.result.count("01101"), 300);
        assert!(report.succeeded());
    }

    #[test]
    fn test_classical_queries_and_validation() {
        let config = DeutschJozsaConfig::default();
        assert_eq!(config.classical_queries(), 17);
        assert_eq!(config.clone().with_inputs(3).oracle, DjOracle::Balanced(vec![true; 3]));

        let bad = DeutschJozsaConfig::default().with_oracle(DjOracle::Balanced(vec![false; 5]));
        assert!(build_circuit(&bad).is_err());
        let short = DeutschJozsaConfig::default().with_oracle(DjOracle::Balanced(vec![true; 2]));
        assert!(build_circuit(&short).is_err());
        assert!(DjOracle::balanced_from_str("1x").is_err());
    }

    #[test]
    fn test_rejects_wide_input_register() {
        for n in [0, 17, 64, 100] {
            let config = DeutschJozsaConfig::default().with_oracle(DjOracle::Constant1).with_inputs(n);
            assert!(matches!(build_circuit(&config), Err(QdemoError::InvalidParameter(_))), "{}", n);
        }
        let wide = DeutschJozsaConfig::default().with_inputs(64);
        assert_eq!(wide.classical_queries(), (1u64 << 63) + 1);
        assert_eq!(wide.with_inputs(100).classical_queries(), u64::MAX);
    }
}
