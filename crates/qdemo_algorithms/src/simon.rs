//! Simon's algorithm
//!
//! Gantree: L4_Algorithms → Simon
//!
//! f(x) = f(y) iff x ⊕ y ∈ {0, s}. Every measured y satisfies y·s = 0
//! (mod 2); n − 1 independent outcomes pin s down by elimination over
//! GF(2). As in Bernstein–Vazirani, key position i (from the right) is
//! qubit i, so outcomes and the secret share one string convention.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_batch, Backend, ExecutionResult};
use qdemo_core::{Bitstring, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use std::fmt;

/// Default hidden string
pub const DEFAULT_SECRET: &str = "11001";

/// Secrets used by the sweep
pub const SWEEP_SECRETS: [&str; 4] = ["11", "101", "1001", "11001"];

/// Outcomes shown in the report
const TOP_OUTCOMES: usize = 15;

/// Two-to-one oracle |x⟩|0⟩ → |x⟩|f(x)⟩ on 2n qubits
///
/// Copies x into the output register, then XORs s into it controlled on
/// the input bit under the leftmost `1` of s.
/// Gantree: build_oracle(secret) -> Circuit // 오라클
pub fn build_oracle(secret: &Bitstring) -> Circuit {
    let n = secret.len();
    let mut builder = CircuitBuilder::new(2 * n).name(format!("U_s={}", secret));
    for q in 0..n {
        builder = builder.cx(q, n + q);
    }
    let set: Vec<usize> = (0..n).filter(|&q| secret.bit(q) == Some(true)).collect();
    if let Some(&control) = set.last() {
        for &q in &set {
            builder = builder.cx(control, n + q);
        }
    }
    builder.build()
}

/// H on inputs, oracle, H on inputs, measure inputs
/// Gantree: build_circuit(secret) -> Circuit // 데모 회로
pub fn build_circuit(secret: &str) -> QdemoResult<Circuit> {
    let secret = Bitstring::parse(secret)?;
    let n = secret.len();
    if n == 0 {
        return Err(QdemoError::InvalidParameter("secret must not be empty".into()));
    }
    let inputs: Vec<usize> = (0..n).collect();
    CircuitBuilder::new(2 * n)
        .name(format!("simon_{}", secret))
        .h_on(&inputs)
        .barrier()
        .append(&build_oracle(&secret))
        .barrier()
        .h_on(&inputs)
        .barrier()
        .measure_qubits(&inputs)
        .try_build()
}

/// Solve y·s = 0 for every equation by Gauss–Jordan elimination
///
/// Returns the all-zero string when only the trivial solution remains,
/// the unique nonzero s when the solution space is one-dimensional, and
/// `None` when the equations leave s ambiguous.
/// Gantree: recover_secret(eqs, n) -> Option<Bitstring> // GF(2) 소거
pub fn recover_secret(equations: &[Bitstring], n: usize) -> Option<Bitstring> {
    let mut rows: Vec<Vec<bool>> = equations
        .iter()
        .filter(|e| e.len() == n && !e.is_zero())
        .map(|e| e.iter().collect())
        .collect();

    let mut pivots: Vec<usize> = Vec::new();
    for col in 0..n {
        let rank = pivots.len();
        let Some(found) = (rank..rows.len()).find(|&r| rows[r][col]) else {
            continue;
        };
        rows.swap(rank, found);
        let pivot = rows[rank].clone();
        for (r, row) in rows.iter_mut().enumerate() {
            if r != rank && row[col] {
                row.iter_mut().zip(&pivot).for_each(|(a, &b)| *a ^= b);
            }
        }
        pivots.push(col);
    }

    let free: Vec<usize> = (0..n).filter(|c| !pivots.contains(c)).collect();
    match free.as_slice() {
        [] => Some(Bitstring::zeros(n)),
        [f] => {
            let mut s = vec![false; n];
            s[*f] = true;
            for (row, &p) in rows.iter().zip(&pivots) {
                s[p] = row[*f];
            }
            Some(Bitstring::new(s))
        }
        _ => None,
    }
}

/// Report for one secret
#[derive(Debug, Clone)]
pub struct SimonReport {
    /// Hidden string
    pub secret: String,
    /// Raw result
    pub result: ExecutionResult,
    /// Fraction of shots with y·s = 0
    pub validity_rate: f64,
    /// Secret recovered from the frequent outcomes
    pub recovered: Option<String>,
}

/// Check every outcome and recover s
///
/// Only outcomes seen at least shots/2^n times enter the elimination; an
/// ideal run spreads the shots evenly over 2^(n−1) valid strings, so
/// rarer keys are readout noise.
/// Gantree: analyze(secret, result) -> SimonReport // 분석
pub fn analyze(secret: &str, result: &ExecutionResult) -> QdemoResult<SimonReport> {
    let s = Bitstring::parse(secret)?;
    let n = s.len();
    if result.shots == 0 {
        return Err(QdemoError::NoCounts);
    }
    let threshold = (result.shots >> n.min(63)).max(1);

    let mut valid = 0u64;
    let mut equations = Vec::new();
    for (key, &count) in &result.counts {
        let y = Bitstring::parse_width(key, n)?;
        if !y.dot(&s) {
            valid += count;
        }
        if count >= threshold {
            equations.push(y);
        }
    }
    log::debug!("simon {}: {} equations above {} shots", secret, equations.len(), threshold);

    Ok(SimonReport {
        secret: secret.to_string(),
        result: result.clone(),
        validity_rate: valid as f64 / result.shots as f64,
        recovered: recover_secret(&equations, n).map(|b| b.to_string()),
    })
}

/// Run one secret
pub fn run(backend: &dyn Backend, secret: &str, shots: u64) -> QdemoResult<SimonReport> {
    let mut reports = run_sweep(backend, &[secret], shots)?;
    reports.pop().ok_or(QdemoError::NoCounts)
}

/// Run several secrets as one batch
/// Gantree: run_sweep(backend, secrets, shots) -> Vec<SimonReport> // 다중 비밀
pub fn run_sweep(backend: &dyn Backend, secrets: &[&str], shots: u64) -> QdemoResult<Vec<SimonReport>> {
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
pub fn sweep_summary(reports: &[SimonReport]) -> String {
    reports
        .iter()
        .map(|r| {
            format!(
                "  Secret: {} → Recovered: {} {}",
                r.secret,
                r.recovered.as_deref().unwrap_or("ambiguous"),
                report::check(r.succeeded())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl DemoReport for SimonReport {
    fn title(&self) -> String {
        format!("Simon (s={})", self.secret)
    }

    fn succeeded(&self) -> bool {
        self.recovered.as_deref() == Some(self.secret.as_str())
    }
}

impl fmt::Display for SimonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.secret.len();
        let shots = self.result.shots;
        writeln!(f, "SIMON'S ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Secret string: {} ({} bits, {} qubits)", self.secret, n, 2 * n)?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (all outcomes should satisfy y·s = 0):")?;
        let secret = Bitstring::parse(&self.secret).unwrap_or_else(|_| Bitstring::zeros(n));
        report::write_top_counts(f, &self.result, TOP_OUTCOMES, |key| match Bitstring::parse(key) {
            Ok(y) => {
                let dot = y.dot(&secret);
                format!(" y·s={} {}", u8::from(dot), report::check(!dot))
            }
            Err(_) => String::new(),
        })?;
        writeln!(f)?;
        writeln!(f, "Equation validity:")?;
        writeln!(
            f,
            "  Measurements satisfying y·s = 0: {:.1}% (ideal 100%)",
            self.validity_rate * 100.0
        )?;
        writeln!(f)?;
        writeln!(f, "Recovering the secret by GF(2) elimination:")?;
        writeln!(f, "  Actual secret:    {}", self.secret)?;
        writeln!(
            f,
            "  Recovered secret: {}",
            self.recovered.as_deref().unwrap_or("ambiguous (too few independent outcomes)")
        )?;
        writeln!(f)?;
        writeln!(f, "Quantum queries: O(n) = O({})", n)?;
        writeln!(f, "Classical queries: O(2^(n/2)) = O({})", 1u64 << (n / 2))?;
        if self.succeeded() {
            write!(f, "✓ Recovered secret '{}'", self.secret)
        } else {
            write!(f, "✗ Recovery failed; noisy outcomes break the linear system")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;
    use std::collections::HashMap;

    fn bits(keys: &[&str]) -> Vec<Bitstring> {
        keys.iter().map(|k| Bitstring::parse(k).unwrap()).collect()
    }

    #[test]
    fn test_recover_secret() {
        // orthogonal complement of 110 is spanned by 110 and 001
        let s = recover_secret(&bits(&["110", "001"]), 3).unwrap();
        assert_eq!(s.to_string(), "110");
        assert!(recover_secret(&bits(&["001"]), 3).is_none());
        assert!(recover_secret(&bits(&["100", "010", "001"]), 3).unwrap().is_zero());
        // duplicates and zero rows change nothing
        let s = recover_secret(&bits(&["000", "110", "110", "001"]), 3).unwrap();
        assert_eq!(s.to_string(), "110");
    }

    #[test]
    fn test_default_secret() {
        let backend = SimulatorBackend::ideal(10).with_seed(42);
        let report = run(&backend, DEFAULT_SECRET, 1024).unwrap();
        assert_eq!(report.validity_rate, 1.0);
        assert_eq!(report.result.counts.len(), 16);
        assert_eq!(report.recovered.as_deref(), Some(DEFAULT_SECRET));
        assert!(report.succeeded());
    }

    #[test]
    fn test_sweep() {
        let backend = SimulatorBackend::ideal(10).with_seed(7);
        let reports = run_sweep(&backend, &SWEEP_SECRETS, 512).unwrap();
        assert!(reports.iter().all(|r| r.succeeded()));
        assert!(sweep_summary(&reports).contains("Secret: 1001 → Recovered: 1001 ✓"));
    }

    #[test]
    fn test_rare_noise_keys_are_ignored() {
        let mut counts = HashMap::new();
        for key in ["000", "001", "110", "111"] {
            counts.insert(key.to_string(), 240);
        }
        counts.insert("100".to_string(), 40);
        let result = ExecutionResult::from_counts(counts, "ibm_test");
        let report = analyze("110", &result).unwrap();
        assert_eq!(report.recovered.as_deref(), Some("110"));
        assert!(report.validity_rate < 1.0);
    }

    #[test]
    fn test_rejects_bad_secret() {
        assert!(build_circuit("").is_err());
        assert!(build_circuit("1a").is_err());
    }
}
