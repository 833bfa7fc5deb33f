//! Shor factoring
//!
//! Gantree: L4_Algorithms → Shor
//!
//! Classical reductions first (even N, perfect powers, gcd(a, N) > 1),
//! then quantum order finding of f(x) = a^x mod N. The controlled
//! modular multiplications are the known swap/X permutations for N = 15;
//! other moduli are reported as unsupported. Measured phases y/2^m are
//! turned into a period by continued fractions with denominator ≤ N.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_single, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, Gate, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::qft::inverse_qft;

/// Modulus with hard-wired multiplication circuits
pub const SUPPORTED_MODULUS: u64 = 15;

/// Bases coprime to 15 with a known permutation circuit
pub const SUPPORTED_BASES: [u64; 6] = [2, 4, 7, 8, 11, 13];

/// Work register width for N = 15
const WORK_QUBITS: usize = 4;

// ============================================================================
// Number Theory
// Gantree: NumberTheory // 고전 수론
// ============================================================================

/// Greatest common divisor
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// a^e mod n by square-and-multiply
pub fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let m = u128::from(modulus);
    let mut b = u128::from(base) % m;
    let mut result = 1u128;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % m;
        }
        b = b * b % m;
        exp >>= 1;
    }
    result as u64
}

/// Smallest r > 0 with a^r ≡ 1 (mod n), searched up to `limit`
pub fn classical_order(a: u64, n: u64, limit: u64) -> Option<u64> {
    (1..=limit).find(|&r| mod_pow(a, r, n) == 1)
}

/// Closest fraction p/q to num/den with q ≤ max_den
/// Gantree: limit_denominator(num, den, max) -> (p, q) // 연분수
pub fn limit_denominator(num: u64, den: u64, max_den: u64) -> (u64, u64) {
    let g = gcd(num, den).max(1);
    let (num, den) = (num / g, den / g);
    if den <= max_den {
        return (num, den);
    }
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut n, mut d) = (num, den);
    loop {
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > max_den {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (n, d) = (d, n - a * d);
    }
    let k = (max_den - q0) / q1;
    let bound1 = (p0 + k * p1, q0 + k * q1);
    let bound2 = (p1, q1);
    let x = num as f64 / den as f64;
    let err = |(p, q): (u64, u64)| (p as f64 / q as f64 - x).abs();
    if err(bound2) <= err(bound1) {
        bound2
    } else {
        bound1
    }
}

/// Shortcut that factors N without the quantum step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassicalShortcut {
    /// N is even
    Even,
    /// N = root^exponent
    PerfectPower {
        /// Base of the power
        root: u64,
        /// Exponent ≥ 2
        exponent: u32,
    },
    /// gcd(a, N) is already a factor
    CommonFactor(u64),
}

/// Run the classical reductions
/// Gantree: classical_check(n, a) -> Option<ClassicalShortcut> // 고전 사전검사
pub fn classical_check(n: u64, a: u64) -> QdemoResult<Option<ClassicalShortcut>> {
    if n < 3 {
        return Err(QdemoError::InvalidParameter(format!("N = {} must be at least 3", n)));
    }
    if n % 2 == 0 {
        return Ok(Some(ClassicalShortcut::Even));
    }
    for exponent in 2..=(64 - n.leading_zeros()) {
        let root = (n as f64).powf(1.0 / f64::from(exponent)).round() as u64;
        if root > 1 && root.checked_pow(exponent) == Some(n) {
            return Ok(Some(ClassicalShortcut::PerfectPower { root, exponent }));
        }
    }
    let g = gcd(a, n);
    if g > 1 {
        return Ok(Some(ClassicalShortcut::CommonFactor(g)));
    }
    Ok(None)
}

impl ClassicalShortcut {
    /// Factors implied by the shortcut
    pub fn factors(&self, n: u64) -> Vec<u64> {
        match *self {
            ClassicalShortcut::Even => vec![2, n / 2],
            ClassicalShortcut::PerfectPower { root, .. } => vec![root],
            ClassicalShortcut::CommonFactor(g) => vec![g, n / g],
        }
    }
}

// ============================================================================
// Circuits
// Gantree: Circuits // 회로
// ============================================================================

/// |y⟩ → |a·y mod 15⟩ on four qubits, valid on the orbit of |1⟩
/// Gantree: mod15_multiplier(a) -> Circuit // 모듈러 곱셈
pub fn mod15_multiplier(a: u64) -> QdemoResult<Circuit> {
    let builder = CircuitBuilder::new(WORK_QUBITS).name(format!("×{} mod 15", a));
    let builder = match a {
        1 => builder,
        2 | 13 => builder.swap(2, 3).swap(1, 2).swap(0, 1),
        7 | 8 => builder.swap(0, 1).swap(1, 2).swap(2, 3),
        4 | 11 => builder.swap(1, 3).swap(0, 2),
        _ => {
            return Err(QdemoError::Unsupported(format!(
                "no multiplication circuit for a = {} mod 15",
                a
            )))
        }
    };
    let builder = if matches!(a, 7 | 11 | 13) {
        builder.x_layer()
    } else {
        builder
    };
    builder.try_build()
}

/// Add a control qubit to a swap/X permutation circuit
fn controlled_permutation(circuit: &Circuit, control: usize, work: &[usize]) -> QdemoResult<Circuit> {
    let n = control.max(work.iter().copied().max().unwrap_or(0)) + 1;
    let mut builder = CircuitBuilder::new(n);
    for gate in circuit.gates() {
        builder = match *gate {
            Gate::Swap(a, b) => builder.cswap(control, work[a], work[b]),
            Gate::X(q) => builder.cx(control, work[q]),
            ref other => {
                return Err(QdemoError::Unsupported(format!(
                    "cannot control '{}' in a permutation circuit",
                    other.name()
                )))
            }
        };
    }
    builder.try_build()
}

/// Shor configuration
/// Gantree: ShorConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShorConfig {
    /// Number to factor
    pub n: u64,
    /// Base a
    pub base: u64,
    /// Counting qubits
    pub counting_qubits: usize,
}

impl Default for ShorConfig {
    fn default() -> Self {
        Self {
            n: 15,
            base: 7,
            counting_qubits: 4,
        }
    }
}

impl ShorConfig {
    /// Set the number to factor
    pub fn with_n(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    /// Set the base
    pub fn with_base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    /// Set the counting register size
    pub fn with_counting_qubits(mut self, m: usize) -> Self {
        self.counting_qubits = m;
        self
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.counting_qubits == 0 || self.counting_qubits > 12 {
            return Err(QdemoError::InvalidParameter(format!(
                "counting qubits {} outside 1..=12",
                self.counting_qubits
            )));
        }
        Ok(())
    }
}

/// Order-finding circuit: counting qubits 0..m, work register m..m+4
/// Gantree: build_circuit(config) -> Circuit // 위수 찾기 회로
pub fn build_circuit(config: &ShorConfig) -> QdemoResult<Circuit> {
    if config.n != SUPPORTED_MODULUS {
        return Err(QdemoError::Unsupported(format!(
            "quantum order finding is only wired for N = {}, got {}",
            SUPPORTED_MODULUS, config.n
        )));
    }
    if !SUPPORTED_BASES.contains(&config.base) {
        return Err(QdemoError::Unsupported(format!(
            "base {} not in {:?}",
            config.base, SUPPORTED_BASES
        )));
    }
    config.validate()?;
    let m = config.counting_qubits;
    let counting: Vec<usize> = (0..m).collect();
    let work: Vec<usize> = (m..m + WORK_QUBITS).collect();

    let mut builder = CircuitBuilder::new(m + WORK_QUBITS)
        .name(format!("shor_{}_{}", config.n, config.base))
        .x(work[0])
        .barrier()
        .h_on(&counting)
        .barrier();
    for j in 0..m {
        let power = mod_pow(config.base, 1u64 << j, config.n);
        let multiplier = mod15_multiplier(power)?;
        builder = builder.append(&controlled_permutation(&multiplier, j, &work)?);
    }
    builder
        .barrier()
        .append_on(&inverse_qft(m), &counting)
        .barrier()
        .measure_qubits(&counting)
        .try_build()
}

// ============================================================================
// Analysis
// Gantree: Analysis // 분석
// ============================================================================

/// What one counting-register value says about the period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementAnalysis {
    /// Register value y
    pub value: u64,
    /// Candidate period (denominator of y/2^m), if y ≠ 0
    pub period: Option<u64>,
    /// Non-trivial factors from gcd(a^(r/2) ± 1, N)
    pub factors: Vec<u64>,
}

/// Continued-fraction post-processing of one value
/// Gantree: analyze_measurement(y, m, n, a) -> MeasurementAnalysis // 주기 추출
pub fn analyze_measurement(value: u64, counting_qubits: usize, n: u64, a: u64) -> MeasurementAnalysis {
    let scale = u32::try_from(counting_qubits)
        .ok()
        .and_then(|m| 1u64.checked_shl(m));
    let scale = match scale {
        Some(scale) if value != 0 => scale,
        _ => {
            return MeasurementAnalysis {
                value,
                period: None,
                factors: Vec::new(),
            }
        }
    };
    let (_, r) = limit_denominator(value, scale, n);
    let mut factors = Vec::new();
    if r % 2 == 0 {
        let x = mod_pow(a, r / 2, n);
        for guess in [gcd(x + n - 1, n), gcd(x + 1, n)] {
            if 1 < guess && guess < n && !factors.contains(&guess) {
                factors.push(guess);
            }
        }
    }
    MeasurementAnalysis {
        value,
        period: Some(r),
        factors,
    }
}

/// Outcome of a Shor run
#[derive(Debug, Clone)]
pub enum ShorOutcome {
    /// Factored before any circuit was built
    Classical(ClassicalShortcut),
    /// Order finding on the backend
    Quantum {
        /// Raw result
        result: ExecutionResult,
        /// Analysis of the ten most frequent values, most frequent first
        rows: Vec<(String, u64, MeasurementAnalysis)>,
        /// Periods seen without factors, weighted by counts
        period_candidates: BTreeMap<u64, u64>,
        /// Factors and cofactors found
        factors: BTreeSet<u64>,
    },
}

/// Shor report
#[derive(Debug, Clone)]
pub struct ShorReport {
    /// Configuration
    pub config: ShorConfig,
    /// Classical or quantum outcome
    pub outcome: ShorOutcome,
}

/// Post-process the counts of `build_circuit(config)`
/// Gantree: analyze(config, result) -> ShorReport // 분석
pub fn analyze(config: &ShorConfig, result: &ExecutionResult) -> QdemoResult<ShorReport> {
    config.validate()?;
    if result.counts.is_empty() {
        return Err(QdemoError::NoCounts);
    }
    let mut rows = Vec::new();
    let mut factors = BTreeSet::new();
    let mut period_candidates = BTreeMap::new();
    for (key, count) in result.top_k(10) {
        let value = u64::from_str_radix(&key, 2)
            .map_err(|_| QdemoError::InvalidBitstring(key.clone()))?;
        let analysis = analyze_measurement(value, config.counting_qubits, config.n, config.base);
        if analysis.factors.is_empty() {
            if let Some(r) = analysis.period {
                *period_candidates.entry(r).or_insert(0) += count;
            }
        }
        for &f in &analysis.factors {
            factors.insert(f);
            factors.insert(config.n / f);
        }
        rows.push((key, count, analysis));
    }
    factors.retain(|&f| f != 1 && f != config.n);
    Ok(ShorReport {
        config: config.clone(),
        outcome: ShorOutcome::Quantum {
            result: result.clone(),
            rows,
            period_candidates,
            factors,
        },
    })
}

/// Classical checks, then order finding on `backend`
pub fn run(backend: &dyn Backend, config: &ShorConfig, shots: u64) -> QdemoResult<ShorReport> {
    if let Some(shortcut) = classical_check(config.n, config.base)? {
        log::info!("N = {} factored classically: {:?}", config.n, shortcut);
        return Ok(ShorReport {
            config: config.clone(),
            outcome: ShorOutcome::Classical(shortcut),
        });
    }
    let circuit = build_circuit(config)?;
    let result = run_single(backend, &circuit, shots)?;
    analyze(config, &result)
}

impl ShorReport {
    /// Non-trivial factors found, ascending
    pub fn factors(&self) -> Vec<u64> {
        match &self.outcome {
            ShorOutcome::Classical(s) => s.factors(self.config.n),
            ShorOutcome::Quantum { factors, .. } => factors.iter().copied().collect(),
        }
    }
}

impl DemoReport for ShorReport {
    fn title(&self) -> String {
        format!("Shor (N={}, a={})", self.config.n, self.config.base)
    }

    fn succeeded(&self) -> bool {
        !self.factors().is_empty()
    }
}

impl fmt::Display for ShorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, a) = (self.config.n, self.config.base);
        let (result, rows, period_candidates, factors) = match &self.outcome {
            ShorOutcome::Classical(shortcut) => {
                return match shortcut {
                    ClassicalShortcut::Even => {
                        write!(f, "✓ N={} is even. Factors: 2 and {}", n, n / 2)
                    }
                    ClassicalShortcut::PerfectPower { root, exponent } => {
                        write!(f, "✓ N={} is a perfect power: {}^{}", n, root, exponent)
                    }
                    ClassicalShortcut::CommonFactor(g) => {
                        write!(f, "✓ Lucky! gcd({}, {}) = {} is a factor; {} = {} × {}", a, n, g, n, g, n / g)
                    }
                };
            }
            ShorOutcome::Quantum {
                result,
                rows,
                period_candidates,
                factors,
            } => (result, rows, period_candidates, factors),
        };

        writeln!(f, "SHOR'S ALGORITHM RESULTS")?;
        writeln!(f, "Backend: {}", result.metadata.backend)?;
        writeln!(f, "Number to factor: N = {}", n)?;
        writeln!(f, "Base: a = {}", a)?;
        writeln!(f, "Counting qubits: {}", self.config.counting_qubits)?;
        writeln!(f, "Total shots: {}", result.shots)?;
        writeln!(f)?;
        writeln!(f, "Measurement counts (top 10):")?;
        for (key, count, analysis) in rows {
            write!(
                f,
                "  |{}⟩ = {}: {} ({:.1}%)",
                key,
                analysis.value,
                count,
                report::percent(*count, result.shots)
            )?;
            if let Some(r) = analysis.period {
                write!(f, " [r={}]", r)?;
            }
            if !analysis.factors.is_empty() {
                write!(f, " → factors: {:?}", analysis.factors)?;
            }
            writeln!(f)?;
        }
        if result.counts.len() > rows.len() {
            writeln!(f, "  ... and {} more outcomes", result.counts.len() - rows.len())?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Period candidates without factors: {:?}",
            period_candidates.keys().collect::<Vec<_>>()
        )?;
        if let Some(r) = classical_order(a, n, 20) {
            writeln!(f, "Classical check: period r = {} (since {}^{} ≡ 1 mod {})", r, a, r, n)?;
            if r % 2 == 0 {
                let x = mod_pow(a, r / 2, n);
                writeln!(f, "  gcd({}^{} - 1, {}) = {}", a, r / 2, n, gcd(x + n - 1, n))?;
                writeln!(f, "  gcd({}^{} + 1, {}) = {}", a, r / 2, n, gcd(x + 1, n))?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Classical factoring: sub-exponential; Shor: O(n³) for n = {} bits", 64 - n.leading_zeros())?;
        let list: Vec<u64> = factors.iter().copied().collect();
        match list.as_slice() {
            [] => write!(f, "✗ No non-trivial factors in the top measurements"),
            [p, q, ..] => write!(f, "✓ Factors of {}: {:?} ({} × {} = {})", n, list, p, q, p * q),
            [p] => write!(f, "✓ Factor of {}: {}", n, p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_number_theory() {
        assert_eq!(gcd(48, 15), 3);
        assert_eq!(mod_pow(7, 4, 15), 1);
        assert_eq!(mod_pow(7, 2, 15), 4);
        assert_eq!(classical_order(7, 15, 20), Some(4));
        assert_eq!(classical_order(11, 15, 20), Some(2));
        assert_eq!(limit_denominator(4, 16, 15), (1, 4));
        assert_eq!(limit_denominator(5, 16, 15), (4, 13));
        assert_eq!(limit_denominator(11, 16, 15), (9, 13));
    }

    #[test]
    fn test_classical_shortcuts() {
        assert_eq!(classical_check(14, 3).unwrap(), Some(ClassicalShortcut::Even));
        assert_eq!(
            classical_check(27, 2).unwrap(),
            Some(ClassicalShortcut::PerfectPower { root: 3, exponent: 3 })
        );
        assert_eq!(classical_check(15, 6).unwrap(), Some(ClassicalShortcut::CommonFactor(3)));
        assert_eq!(classical_check(15, 7).unwrap(), None);
        assert!(classical_check(2, 1).is_err());
    }

    #[test]
    fn test_multipliers_permute_orbit() {
        use qdemo_backend::exact_probabilities;
        for a in SUPPORTED_BASES {
            let mut y = 1u64;
            for _ in 0..4 {
                let ones: Vec<usize> = (0..4).filter(|q| (y >> q) & 1 == 1).collect();
                let circuit = CircuitBuilder::new(4)
                    .x_on(&ones)
                    .append(&mod15_multiplier(a).unwrap())
                    .build();
                let probs = exact_probabilities(&circuit).unwrap();
                let next = (a * y) % 15;
                assert!((probs[next as usize] - 1.0).abs() < 1e-10, "a={} y={}", a, y);
                y = next;
            }
        }
    }

    #[test]
    fn test_order_finding_for_seven() {
        let backend = SimulatorBackend::ideal(8).with_seed(42);
        let report = run(&backend, &ShorConfig::default(), 1024).unwrap();
        if let ShorOutcome::Quantum { result, .. } = &report.outcome {
            // r = 4 leaves only multiples of 2^m / 4
            for key in result.counts.keys() {
                assert!(["0000", "0100", "1000", "1100"].contains(&key.as_str()), "{}", key);
            }
        } else {
            panic!("expected quantum outcome");
        }
        assert_eq!(report.factors(), vec![3, 5]);
        assert_eq!(analyze_measurement(4, 4, 15, 7).period, Some(4));
        assert!(report.succeeded());
    }

    #[test]
    fn test_rejects_wide_counting_register() {
        for m in [0, 13, 40, 64] {
            let config = ShorConfig::default().with_counting_qubits(m);
            assert!(matches!(build_circuit(&config), Err(QdemoError::InvalidParameter(_))), "{}", m);
        }
        let backend = SimulatorBackend::ideal(8);
        let config = ShorConfig::default().with_counting_qubits(64);
        assert!(matches!(run(&backend, &config, 10), Err(QdemoError::InvalidParameter(_))));

        assert_eq!(analyze_measurement(1, 64, 15, 7).period, None);
        assert_eq!(analyze_measurement(1, 200, 15, 7).period, None);
        assert_eq!(analyze_measurement(1024, 12, 15, 7).period, Some(4));
    }

    #[test]
    fn test_unsupported_modulus() {
        let config = ShorConfig::default().with_n(21).with_base(2);
        assert!(matches!(build_circuit(&config), Err(QdemoError::Unsupported(_))));
        let backend = SimulatorBackend::ideal(8);
        assert!(run(&backend, &config, 10).is_err());
    }
}
