//! Backend execution types and traits
//!
//! Gantree: L2_Backend → BackendTrait
//!
//! Defines the interface every execution target implements, and the
//! counts container the demos analyze.

use qdemo_core::{execution, Circuit, Counts, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Result of circuit execution
/// Gantree: ExecutionResult // 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Job ID (if applicable)
    pub job_id: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Whether simulation was used
    pub simulated: bool,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                simulated: true,
                ..Default::default()
            },
        }
    }

    /// Create from counts, taking shots as their total
    pub fn from_counts(counts: Counts, backend: &str) -> Self {
        let shots = counts.values().sum();
        Self::new(counts, shots, backend)
    }

    /// Get total count (should equal shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Width of the count keys
    pub fn num_clbits(&self) -> usize {
        self.counts.keys().map(|k| k.len()).max().unwrap_or(0)
    }

    /// Get probability of a specific bitstring
    /// Gantree: probability(bs) -> f64 // 확률
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let count = self.counts.get(bitstring).copied().unwrap_or(0);
        count as f64 / self.shots as f64
    }

    /// Get count of a specific bitstring
    pub fn count(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Counts sorted by count descending, ties broken by key ascending
    /// Gantree: sorted_counts() -> Vec<(String,u64)> // 정렬
    pub fn sorted_counts(&self) -> Vec<(String, u64)> {
        let mut sorted: Vec<(String, u64)> =
            self.counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }

    /// First `k` entries of `sorted_counts`
    pub fn top_k(&self, k: usize) -> Vec<(String, u64)> {
        let mut sorted = self.sorted_counts();
        sorted.truncate(k);
        sorted
    }

    /// Get most frequent bitstring
    pub fn most_frequent(&self) -> Option<(String, u64)> {
        self.sorted_counts().into_iter().next()
    }

    /// Counts over a subset of classical bits. Bit `i` of a new key
    /// (from the right) is classical bit `clbits[i]` of the old key.
    /// Gantree: marginal(clbits) -> Counts // 주변 분포
    pub fn marginal(&self, clbits: &[usize]) -> Counts {
        let mut out: Counts = HashMap::new();
        for (key, &count) in &self.counts {
            let chars: Vec<char> = key.chars().collect();
            let width = chars.len();
            let new_key: String = clbits
                .iter()
                .rev()
                .map(|&c| {
                    if c < width {
                        chars[width - 1 - c]
                    } else {
                        '0'
                    }
                })
                .collect();
            *out.entry(new_key).or_insert(0) += count;
        }
        out
    }

    /// Parity expectation over all bits
    /// E = P_even - P_odd = Σ_b (-1)^popcount(b) * P(b)
    pub fn parity_expectation(&self) -> f64 {
        self.signed_sum(|key| key.chars().filter(|&c| c == '1').count())
    }

    /// Parity expectation restricted to the given classical bits, i.e. the
    /// expectation of Z⊗…⊗Z on the qubits measured into them
    pub fn parity_expectation_on(&self, clbits: &[usize]) -> f64 {
        self.signed_sum(|key| {
            let width = key.len();
            let bytes = key.as_bytes();
            clbits
                .iter()
                .filter(|&&c| c < width && bytes[width - 1 - c] == b'1')
                .count()
        })
    }

    fn signed_sum(&self, ones: impl Fn(&str) -> usize) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let total: f64 = self
            .counts
            .iter()
            .map(|(key, &count)| {
                let sign = if ones(key) % 2 == 0 { 1.0 } else { -1.0 };
                sign * count as f64
            })
            .sum();
        total / self.shots as f64
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(backend={}, shots={}, unique={})",
            self.metadata.backend,
            self.shots,
            self.counts.len()
        )
    }
}

/// Quantum backend trait
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Get number of qubits
    fn num_qubits(&self) -> usize;

    /// Execute a circuit
    /// Gantree: execute(circuit, shots) -> Result<ExecutionResult>
    fn execute(&self, circuit: &Circuit, shots: u64) -> QdemoResult<ExecutionResult>;

    /// Execute multiple circuits (batch); results follow input order
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QdemoResult<Vec<ExecutionResult>> {
        circuits.iter().map(|c| self.execute(c, shots)).collect()
    }

    /// Check if backend is simulator
    fn is_simulator(&self) -> bool {
        true
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        qdemo_core::execution::MAX_SHOTS
    }
}

/// Reject a shot count outside `MIN_SHOTS..=backend.max_shots()`
pub fn check_shots(backend: &(impl Backend + ?Sized), shots: u64) -> QdemoResult<()> {
    let max = backend.max_shots();
    if !(execution::MIN_SHOTS..=max).contains(&shots) {
        return Err(QdemoError::ShotsOutOfRange(shots, execution::MIN_SHOTS, max));
    }
    Ok(())
}

/// Execute circuits as one batch, checking the shot count up front and
/// that every circuit produced a result
/// Gantree: run_batch(backend, circuits, shots) -> Vec<ExecutionResult> // 일괄 실행
pub fn run_batch(
    backend: &dyn Backend,
    circuits: &[Circuit],
    shots: u64,
) -> QdemoResult<Vec<ExecutionResult>> {
    check_shots(backend, shots)?;
    log::info!(
        "Running {} circuit(s) on {} ({} shots)",
        circuits.len(),
        backend.name(),
        shots
    );
    let results = backend.execute_batch(circuits, shots)?;
    if results.len() != circuits.len() {
        return Err(QdemoError::ResultCountMismatch {
            expected: circuits.len(),
            actual: results.len(),
        });
    }
    Ok(results)
}

/// Execute one circuit
pub fn run_single(backend: &dyn Backend, circuit: &Circuit, shots: u64) -> QdemoResult<ExecutionResult> {
    run_batch(backend, std::slice::from_ref(circuit), shots)?
        .pop()
        .ok_or(QdemoError::NoCounts)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_test_counts() -> Counts {
        let mut counts = HashMap::new();
        counts.insert("000".to_string(), 400);
        counts.insert("001".to_string(), 100);
        counts.insert("010".to_string(), 100);
        counts.insert("011".to_string(), 100);
        counts.insert("100".to_string(), 100);
        counts.insert("101".to_string(), 50);
        counts.insert("110".to_string(), 100);
        counts.insert("111".to_string(), 50);
        counts
    }

    #[test]
    fn test_total_counts() {
        let result = ExecutionResult::new(make_test_counts(), 1000, "test");
        assert_eq!(result.total_counts(), 1000);
        assert_eq!(result.num_clbits(), 3);
        assert_eq!(result.metadata.backend, "test");
    }

    #[test]
    fn test_probability() {
        let result = ExecutionResult::new(make_test_counts(), 1000, "test");
        assert!((result.probability("000") - 0.4).abs() < 1e-10);
        assert!((result.probability("111") - 0.05).abs() < 1e-10);
        assert_eq!(result.probability("1111"), 0.0);
    }

    #[test]
    fn test_sorted_counts_tie_break() {
        let result = ExecutionResult::new(make_test_counts(), 1000, "test");
        let sorted = result.sorted_counts();
        assert_eq!(sorted[0], ("000".to_string(), 400));
        // five keys share 100; ascending key order
        assert_eq!(sorted[1].0, "001");
        assert_eq!(sorted[2].0, "010");
        assert_eq!(sorted[5].0, "110");
        assert_eq!(result.top_k(2).len(), 2);
        assert_eq!(result.most_frequent(), Some(("000".to_string(), 400)));
    }

    #[test]
    fn test_marginal() {
        let result = ExecutionResult::new(make_test_counts(), 1000, "test");
        // clbit 0 is the rightmost character
        let m = result.marginal(&[0]);
        assert_eq!(m.get("0"), Some(&(400 + 100 + 100 + 100)));
        assert_eq!(m.get("1"), Some(&(100 + 100 + 50 + 50)));

        // new key "ab" with a = clbit 0, b = clbit 2
        let m = result.marginal(&[2, 0]);
        // old "001": c2=0, c0=1 -> "10"
        assert_eq!(m.values().sum::<u64>(), 1000);
        assert_eq!(m.get("10"), Some(&(100 + 100)));
    }

    #[test]
    fn test_parity_expectation() {
        // Even: 400 + 100 + 50 + 100 = 650, odd: 350
        let result = ExecutionResult::new(make_test_counts(), 1000, "test");
        assert!((result.parity_expectation() - 0.3).abs() < 1e-10);

        // <Z> on clbit 2: '0' at left for 000,001,010,011 = 700
        assert!((result.parity_expectation_on(&[2]) - 0.4).abs() < 1e-10);
        assert!((result.parity_expectation_on(&[]) - 1.0).abs() < 1e-10);
    }

    /// Answers every circuit with a fixed count and records submissions
    struct FixedBackend {
        max_shots: u64,
        submitted: AtomicUsize,
    }

    impl Backend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn num_qubits(&self) -> usize {
            1
        }

        fn execute(&self, _circuit: &Circuit, shots: u64) -> QdemoResult<ExecutionResult> {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            let counts = HashMap::from([("0".to_string(), shots)]);
            Ok(ExecutionResult::new(counts, shots, "fixed"))
        }

        fn is_simulator(&self) -> bool {
            false
        }

        fn max_shots(&self) -> u64 {
            self.max_shots
        }
    }

    #[test]
    fn test_run_batch_checks_shots_before_submitting() {
        let backend = FixedBackend {
            max_shots: 500,
            submitted: AtomicUsize::new(0),
        };
        let circuit = Circuit::new(1, 1);

        for shots in [0, 501] {
            let err = run_single(&backend, &circuit, shots).unwrap_err();
            assert!(matches!(err, QdemoError::ShotsOutOfRange(s, 1, 500) if s == shots));
        }
        assert_eq!(backend.submitted.load(Ordering::SeqCst), 0);

        let results = run_batch(&backend, &[circuit.clone(), circuit], 500).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].count("0"), 500);
        assert_eq!(backend.submitted.load(Ordering::SeqCst), 2);
        assert!(check_shots(&backend, 1).is_ok());
    }

    #[test]
    fn test_from_counts() {
        let result = ExecutionResult::from_counts(make_test_counts(), "x");
        assert_eq!(result.shots, 1000);
    }
}
