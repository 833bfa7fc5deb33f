//! Bernstein–Vazirani algorithm
//!
//! Gantree: L4_Algorithms → BernsteinVazirani
//!
//! Recovers the hidden string s of f(x) = s·x mod 2 with one query.
//! Secret character i (leftmost first) is wired to input qubit n−1−i, so
//! the measured count key reads exactly as the secret.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_batch, Backend, ExecutionResult};
use qdemo_core::{Bitstring, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use std::fmt;

/// Default hidden string
pub const DEFAULT_SECRET: &str = "11001";

/// Secrets used by the sweep
pub const SWEEP_SECRETS: [&str; 3] = ["101", "1101", "10011"];

/// Oracle |x⟩|y⟩ → |x⟩|y ⊕ s·x⟩ with the ancilla on qubit n
pub fn build_oracle(secret: &Bitstring) -> Circuit {
    let n = secret.len();
    // key position i (from the right) is qubit i
    (0..n)
        .filter(|&q| secret.bit(q) == Some(true))
        .fold(
            CircuitBuilder::new(n + 1).name(format!("U_s={}", secret)),
            |b, q| b.cx(q, n),
        )
        .build()
}

/// Full circuit for one secret
/// Gantree: build_circuit(secret) -> Circuit // 데모 회로
pub fn build_circuit(secret: &str) -> QdemoResult<Circuit> {
    let secret = Bitstring::parse(secret)?;
    let n = secret.len();
    if n == 0 {
        return Err(QdemoError::InvalidParameter("secret must not be empty".into()));
    }
    let inputs: Vec<usize> = (0..n).collect();
    CircuitBuilder::new(n + 1)
        .name(format!("bernstein_vazirani_{}", secret))
        .x(n)
        .barrier()
        .h_layer()
        .barrier()
        .append(&build_oracle(&secret))
        .barrier()
        .h_on(&inputs)
        .barrier()
        .measure_qubits(&inputs)
        .try_build()
}

/// Report for one secret
#[derive(Debug, Clone)]
pub struct BernsteinVaziraniReport {
    /// Hidden string
    pub secret: String,
    /// Raw result
    pub result: ExecutionResult,
    /// Most frequent outcome
    pub most_common: String,
    /// Fraction of shots equal to the secret
    pub success_rate: f64,
    /// Hamming distance of the most frequent outcome to the secret
    pub hamming_distance: usize,
}

/// Compare the counts with the secret
/// Gantree: analyze(secret, result) -> BernsteinVaziraniReport // 분석
pub fn analyze(secret: &str, result: &ExecutionResult) -> QdemoResult<BernsteinVaziraniReport> {
    let (most_common, _) = result.most_frequent().ok_or(QdemoError::NoCounts)?;
    let hamming_distance = Bitstring::parse(&most_common)?.hamming_distance(&Bitstring::parse(secret)?);
    Ok(BernsteinVaziraniReport {
        secret: secret.to_string(),
        result: result.clone(),
        success_rate: result.probability(secret),
        hamming_distance,
        most_common,
    })
}

/// Run one secret
pub fn run(backend: &dyn Backend, secret: &str, shots: u64) -> QdemoResult<BernsteinVaziraniReport> {
    let mut reports = run_sweep(backend, &[secret], shots)?;
    reports.pop().ok_or(QdemoError::NoCounts)
}

/// Run several secrets as one batch
/// Gantree: run_sweep(backend, secrets, shots) -> Vec<Report> // 다중 비밀
pub fn run_sweep(
    backend: &dyn Backend,
    secrets: &[&str],
    shots: u64,
) -> QdemoResult<Vec<BernsteinVaziraniReport>> {
    let circuits = secrets
        .iter()
        .map(|s| build_circuit(s))
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    secrets
        .iter()
        .zip(&results)
        .map(|(s, r)| analyze(s, r))
        .collect()
}

/// One line per secret
pub fn sweep_summary(reports: &[BernsteinVaziraniReport]) -> String {
    reports
        .iter()
        .map(|r| {
            format!(
                "  Secret: {} → Measured: {} {}",
                r.secret,
                r.most_common,
                report::check(r.succeeded())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl DemoReport for BernsteinVaziraniReport {
    fn title(&self) -> String {
        format!("Bernstein–Vazirani (s={})", self.secret)
    }

    fn succeeded(&self) -> bool {
        self.most_common == self.secret
    }
}

impl fmt::Display for BernsteinVaziraniReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.secret.len();
        let shots = self.result.shots;
        writeln!(f, "BERNSTEIN-VAZIRANI ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Secret string: {} ({} bits)", self.secret, n)?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (top 10):")?;
        let secret = self.secret.clone();
        report::write_top_counts(f, &self.result, 10, move |key| {
            if key == secret {
                " ← secret".to_string()
            } else {
                String::new()
            }
        })?;
        writeln!(f)?;
        writeln!(
            f,
            "Most measured string: {} ({:.1}%)",
            self.most_common,
            self.result.probability(&self.most_common) * 100.0
        )?;
        writeln!(
            f,
            "Correct measurements: {}/{} ({:.1}%)",
            self.result.count(&self.secret),
            shots,
            self.success_rate * 100.0
        )?;
        writeln!(f)?;
        writeln!(f, "Quantum queries: 1")?;
        writeln!(f, "Classical queries: {}", n)?;
        writeln!(f, "Speedup factor: {}x", n)?;
        if self.succeeded() {
            write!(f, "✓ Found secret '{}'", self.secret)
        } else {
            write!(
                f,
                "✗ Most common '{}' differs from '{}' (Hamming distance {})",
                self.most_common, self.secret, self.hamming_distance
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_key_reads_as_secret() {
        let backend = SimulatorBackend::ideal(6).with_seed(42);
        let report = run(&backend, DEFAULT_SECRET, 256).unwrap();
        assert_eq!(report.result.count(DEFAULT_SECRET), 256);
        assert_eq!(report.most_common, DEFAULT_SECRET);
        assert_eq!(report.hamming_distance, 0);
        assert!(report.succeeded());
    }

    #[test]
    fn test_sweep_any_secret() {
        let backend = SimulatorBackend::ideal(6).with_seed(1);
        let secrets = ["101", "1101", "10011", "00001", "10000"];
        let reports = run_sweep(&backend, &secrets, 64).unwrap();
        for (r, s) in reports.iter().zip(secrets) {
            assert_eq!(r.result.count(s), 64, "secret {}", s);
        }
        assert!(sweep_summary(&reports).contains("Secret: 1101 → Measured: 1101 ✓"));
    }

    #[test]
    fn test_hamming_distance_of_wrong_answer() {
        let mut counts = std::collections::HashMap::new();
        counts.insert("10001".to_string(), 600);
        counts.insert("11001".to_string(), 424);
        let result = ExecutionResult::from_counts(counts, "ibm_test");
        let report = analyze("11001", &result).unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.hamming_distance, 1);
        assert!(report.to_string().contains("Hamming distance 1"));
    }

    #[test]
    fn test_rejects_bad_secret() {
        assert!(build_circuit("10a1").is_err());
        assert!(build_circuit("").is_err());
    }
}
