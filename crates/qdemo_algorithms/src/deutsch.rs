//! Deutsch algorithm
//!
//! Gantree: L4_Algorithms → Deutsch
//!
//! Decides whether f: {0,1} → {0,1} is constant or balanced with one
//! oracle query. Input qubit q0 and output qubit q1 start in |+⟩|−⟩; the
//! oracle kicks f's parity into the phase of q0, which a final Hadamard
//! turns into a measurable 0 (constant) or 1 (balanced).

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_batch, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four functions on one bit
/// Gantree: DeutschOracle // 오라클 4종
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeutschOracle {
    /// f(x) = 0
    Constant0,
    /// f(x) = 1
    Constant1,
    /// f(x) = x
    BalancedIdentity,
    /// f(x) = NOT x
    BalancedNegation,
}

impl DeutschOracle {
    /// All oracles in demo order
    pub const ALL: [DeutschOracle; 4] = [
        DeutschOracle::Constant0,
        DeutschOracle::Constant1,
        DeutschOracle::BalancedIdentity,
        DeutschOracle::BalancedNegation,
    ];

    /// Identifier used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            DeutschOracle::Constant0 => "constant_0",
            DeutschOracle::Constant1 => "constant_1",
            DeutschOracle::BalancedIdentity => "balanced_identity",
            DeutschOracle::BalancedNegation => "balanced_negation",
        }
    }

    /// f(0) = f(1)
    pub fn is_constant(&self) -> bool {
        matches!(self, DeutschOracle::Constant0 | DeutschOracle::Constant1)
    }

    /// |x⟩|y⟩ → |x⟩|y ⊕ f(x)⟩ on qubits 0 (x) and 1 (y)
    pub fn circuit(&self) -> Circuit {
        let builder = CircuitBuilder::new(2).name(format!("U_f({})", self.name()));
        let builder = match self {
            DeutschOracle::Constant0 => builder,
            DeutschOracle::Constant1 => builder.x(1),
            DeutschOracle::BalancedIdentity => builder.cx(0, 1),
            DeutschOracle::BalancedNegation => builder.cx(0, 1).x(1),
        };
        builder.build()
    }
}

impl fmt::Display for DeutschOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DeutschOracle {
    type Err = QdemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|o| o.name() == s.replace('-', "_"))
            .copied()
            .ok_or_else(|| QdemoError::InvalidParameter(format!("unknown Deutsch oracle '{}'", s)))
    }
}

/// Deutsch circuit for one oracle, measuring q0 into c0
/// Gantree: build_circuit(oracle) -> Circuit // 데모 회로
pub fn build_circuit(oracle: DeutschOracle) -> QdemoResult<Circuit> {
    CircuitBuilder::with_clbits(2, 1)
        .name(format!("deutsch_{}", oracle.name()))
        .x(1)
        .barrier()
        .h(0)
        .h(1)
        .barrier()
        .append(&oracle.circuit())
        .barrier()
        .h(0)
        .barrier()
        .measure(0, 0)
        .try_build()
}

/// Outcome for one oracle
#[derive(Debug, Clone)]
pub struct DeutschOutcome {
    /// Oracle queried
    pub oracle: DeutschOracle,
    /// Shots reading 0 (constant)
    pub count_0: u64,
    /// Shots reading 1 (balanced)
    pub count_1: u64,
    /// Total shots
    pub shots: u64,
    /// Majority verdict
    pub measured_constant: bool,
}

impl DeutschOutcome {
    /// Fraction of shots giving the textbook answer
    pub fn success_rate(&self) -> f64 {
        let correct = if self.oracle.is_constant() {
            self.count_0
        } else {
            self.count_1
        };
        report::percent(correct, self.shots) / 100.0
    }

    /// Majority verdict matches the oracle
    pub fn correct(&self) -> bool {
        self.measured_constant == self.oracle.is_constant()
    }
}

/// Classify one oracle's counts by majority vote
/// Gantree: analyze(oracle, result) -> DeutschOutcome // 분석
pub fn analyze(oracle: DeutschOracle, result: &ExecutionResult) -> DeutschOutcome {
    let count_0 = result.count("0");
    let count_1 = result.count("1");
    DeutschOutcome {
        oracle,
        count_0,
        count_1,
        shots: result.shots,
        measured_constant: count_0 > count_1,
    }
}

/// Deutsch demo report
#[derive(Debug, Clone)]
pub struct DeutschReport {
    /// Backend name
    pub backend: String,
    /// One outcome per oracle
    pub outcomes: Vec<DeutschOutcome>,
}

/// Run the given oracles as one batch
pub fn run(backend: &dyn Backend, oracles: &[DeutschOracle], shots: u64) -> QdemoResult<DeutschReport> {
    let circuits = oracles
        .iter()
        .map(|&o| build_circuit(o))
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    Ok(DeutschReport {
        backend: backend.name().to_string(),
        outcomes: oracles
            .iter()
            .zip(&results)
            .map(|(&o, r)| analyze(o, r))
            .collect(),
    })
}

impl DemoReport for DeutschReport {
    fn title(&self) -> String {
        "Deutsch".to_string()
    }

    fn succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(DeutschOutcome::correct)
    }
}

impl fmt::Display for DeutschReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DEUTSCH ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.backend)?;
        writeln!(f, "One query decides f(0) = f(1); classically two are needed.")?;
        for o in &self.outcomes {
            let expected = if o.oracle.is_constant() { "constant" } else { "balanced" };
            let measured = if o.measured_constant { "constant" } else { "balanced" };
            writeln!(f)?;
            writeln!(f, "Oracle: {}", o.oracle)?;
            writeln!(
                f,
                "  |0⟩ (constant): {} ({:.1}%)",
                o.count_0,
                report::percent(o.count_0, o.shots)
            )?;
            writeln!(
                f,
                "  |1⟩ (balanced): {} ({:.1}%)",
                o.count_1,
                report::percent(o.count_1, o.shots)
            )?;
            writeln!(f, "  Expected: {}  Measured: {}", expected.to_uppercase(), measured.to_uppercase())?;
            writeln!(
                f,
                "  {} success rate {:.1}%",
                report::check(o.correct()),
                o.success_rate() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_parse_oracle() {
        assert_eq!("constant_1".parse::<DeutschOracle>().unwrap(), DeutschOracle::Constant1);
        assert_eq!(
            "balanced-negation".parse::<DeutschOracle>().unwrap(),
            DeutschOracle::BalancedNegation
        );
        assert!("random".parse::<DeutschOracle>().is_err());
    }

    #[test]
    fn test_all_oracles_exact() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let report = run(&backend, &DeutschOracle::ALL, 500).unwrap();
        assert_eq!(report.outcomes.len(), 4);
        for o in &report.outcomes {
            if o.oracle.is_constant() {
                assert_eq!(o.count_0, 500, "{}", o.oracle);
            } else {
                assert_eq!(o.count_1, 500, "{}", o.oracle);
            }
            assert!((o.success_rate() - 1.0).abs() < 1e-12);
        }
        assert!(report.succeeded());
    }

    #[test]
    fn test_majority_vote_on_noisy_counts() {
        let mut counts = std::collections::HashMap::new();
        counts.insert("0".to_string(), 120);
        counts.insert("1".to_string(), 904);
        let result = ExecutionResult::from_counts(counts, "ibm_test");
        let outcome = analyze(DeutschOracle::Constant0, &result);
        assert!(!outcome.measured_constant);
        assert!(!outcome.correct());
    }
}
