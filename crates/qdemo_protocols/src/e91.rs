//! E91 entanglement-based key distribution
//!
//! Gantree: L5_Protocols → E91
//!
//! Alice and Bob share Bell pairs and measure at angles chosen from
//! {0, π/8, π/4} and {π/8, π/4, 3π/8}. The mismatched settings give a
//! CHSH value near 2√2, which no local hidden-variable model reaches and
//! which an eavesdropper holding copies would pull back below 2. The
//! matching settings (π/8, π/8) and (π/4, π/4) yield perfectly
//! correlated key bits.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_batch, run_single, Backend, ExecutionResult};
use qdemo_core::{qkd, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Alice's measurement angles a1, a2, a3
pub const ALICE_ANGLES: [f64; 3] = [0.0, PI / 8.0, PI / 4.0];

/// Bob's measurement angles b1, b2, b3
pub const BOB_ANGLES: [f64; 3] = [PI / 8.0, PI / 4.0, 3.0 * PI / 8.0];

/// Setting pairs entering S = E(a1,b1) − E(a1,b3) + E(a3,b1) + E(a3,b3),
/// with their signs
pub const CHSH_TERMS: [(usize, usize, f64); 4] = [(0, 0, 1.0), (0, 2, -1.0), (2, 0, 1.0), (2, 2, 1.0)];

/// Setting pairs with equal angles, used for the key
pub const KEY_SETTINGS: [(usize, usize); 2] = [(1, 0), (2, 1)];

/// E91 configuration
/// Gantree: E91Config // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct E91Config {
    /// Bell pairs spent on the key
    pub key_rounds: usize,
    /// Seed for the setting choice of each key round
    pub seed: u64,
}

impl Default for E91Config {
    fn default() -> Self {
        Self {
            key_rounds: 5,
            seed: qdemo_core::execution::DEFAULT_SEED,
        }
    }
}

impl E91Config {
    /// Set the number of key rounds
    pub fn with_key_rounds(mut self, rounds: usize) -> Self {
        self.key_rounds = rounds;
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.key_rounds == 0 || self.key_rounds > 12 {
            return Err(QdemoError::InvalidParameter(format!(
                "E91 key rounds {} outside 1..=12",
                self.key_rounds
            )));
        }
        Ok(())
    }
}

/// Bell pair measured along angle a (q0) and b (q1)
/// Gantree: correlation_circuit(a, b) -> Circuit // 상관 회로
pub fn correlation_circuit(alice_angle: f64, bob_angle: f64) -> QdemoResult<Circuit> {
    CircuitBuilder::new(2)
        .name("e91_chsh")
        .h(0)
        .cx(0, 1)
        .barrier()
        .ry(0, -2.0 * alice_angle)
        .ry(1, -2.0 * bob_angle)
        .barrier()
        .measure_all()
        .try_build()
}

/// E = (N_same − N_diff)/N between two clbits
/// Gantree: correlation(result, a, b) -> f64 // 상관값
pub fn correlation(result: &ExecutionResult, alice_clbit: usize, bob_clbit: usize) -> f64 {
    result.parity_expectation_on(&[alice_clbit, bob_clbit])
}

/// Ideal E(a, b) = cos(2(a − b)) for |Φ+⟩
pub fn ideal_correlation(alice_angle: f64, bob_angle: f64) -> f64 {
    (2.0 * (alice_angle - bob_angle)).cos()
}

/// Seeded choice of a key setting per round
pub fn key_settings(config: &E91Config) -> Vec<(usize, usize)> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    (0..config.key_rounds)
        .map(|_| KEY_SETTINGS[rng.gen_range(0..KEY_SETTINGS.len())])
        .collect()
}

/// One Bell pair per round on qubits 2i (Alice) and 2i+1 (Bob)
/// Gantree: key_circuit(settings) -> Circuit // 키 회로
pub fn key_circuit(settings: &[(usize, usize)]) -> QdemoResult<Circuit> {
    let rounds = settings.len();
    let mut builder = CircuitBuilder::new(2 * rounds).name("e91_key");
    for (i, &(a, b)) in settings.iter().enumerate() {
        let (alice, bob) = (2 * i, 2 * i + 1);
        builder = builder
            .h(alice)
            .cx(alice, bob)
            .ry(alice, -2.0 * ALICE_ANGLES[a])
            .ry(bob, -2.0 * BOB_ANGLES[b]);
    }
    builder.barrier().measure_all().try_build()
}

/// One CHSH term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTerm {
    /// Alice's setting index
    pub alice: usize,
    /// Bob's setting index
    pub bob: usize,
    /// Sign in S
    pub sign: f64,
    /// Measured E
    pub value: f64,
}

/// One key round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRound {
    /// Alice's setting index
    pub alice_setting: usize,
    /// Bob's setting index
    pub bob_setting: usize,
    /// Alice's bit
    pub alice_bit: bool,
    /// Bob's bit
    pub bob_bit: bool,
}

/// E91 report
#[derive(Debug, Clone)]
pub struct E91Report {
    /// Configuration
    pub config: E91Config,
    /// Backend name
    pub backend: String,
    /// Shots per CHSH setting
    pub shots: u64,
    /// The four CHSH correlations
    pub terms: Vec<CorrelationTerm>,
    /// S
    pub chsh: f64,
    /// Key rounds
    pub rounds: Vec<KeyRound>,
}

impl E91Report {
    /// Fraction of rounds where the bits agree
    pub fn agreement_rate(&self) -> f64 {
        if self.rounds.is_empty() {
            return 0.0;
        }
        let agree = self.rounds.iter().filter(|r| r.alice_bit == r.bob_bit).count();
        agree as f64 / self.rounds.len() as f64
    }

    /// |S| above the classical bound
    pub fn violates_bell(&self) -> bool {
        self.chsh.abs() > qkd::CHSH_CLASSICAL_BOUND
    }

    /// Alice's key
    pub fn alice_key(&self) -> String {
        self.rounds.iter().map(|r| if r.alice_bit { '1' } else { '0' }).collect()
    }

    /// Bob's key
    pub fn bob_key(&self) -> String {
        self.rounds.iter().map(|r| if r.bob_bit { '1' } else { '0' }).collect()
    }
}

/// Combine the CHSH results and the key sample
/// Gantree: analyze(config, chsh_results, settings, key_result) -> E91Report // 분석
pub fn analyze(
    config: &E91Config,
    chsh_results: &[ExecutionResult],
    settings: &[(usize, usize)],
    key_result: &ExecutionResult,
) -> QdemoResult<E91Report> {
    if chsh_results.len() != CHSH_TERMS.len() {
        return Err(QdemoError::ResultCountMismatch {
            expected: CHSH_TERMS.len(),
            actual: chsh_results.len(),
        });
    }
    let terms: Vec<CorrelationTerm> = CHSH_TERMS
        .iter()
        .zip(chsh_results)
        .map(|(&(alice, bob, sign), result)| CorrelationTerm {
            alice,
            bob,
            sign,
            value: correlation(result, 0, 1),
        })
        .collect();
    let chsh = terms.iter().map(|t| t.sign * t.value).sum();

    let (key, _) = key_result.most_frequent().ok_or(QdemoError::NoCounts)?;
    let rounds = settings
        .iter()
        .enumerate()
        .map(|(i, &(alice_setting, bob_setting))| KeyRound {
            alice_setting,
            bob_setting,
            alice_bit: clbit_of(&key, 2 * i).unwrap_or(false),
            bob_bit: clbit_of(&key, 2 * i + 1).unwrap_or(false),
        })
        .collect();
    log::debug!("e91: S = {:.3}", chsh);

    Ok(E91Report {
        config: config.clone(),
        backend: key_result.metadata.backend.clone(),
        shots: chsh_results[0].shots,
        terms,
        chsh,
        rounds,
    })
}

/// CHSH circuits as one batch at `shots`, then the key circuit for one shot
/// Gantree: run(backend, config, shots) -> E91Report // 실행
pub fn run(backend: &dyn Backend, config: &E91Config, shots: u64) -> QdemoResult<E91Report> {
    config.validate()?;
    let circuits = CHSH_TERMS
        .iter()
        .map(|&(a, b, _)| correlation_circuit(ALICE_ANGLES[a], BOB_ANGLES[b]))
        .collect::<QdemoResult<Vec<_>>>()?;
    let chsh_results = run_batch(backend, &circuits, shots)?;

    let settings = key_settings(config);
    let key_result = run_single(backend, &key_circuit(&settings)?, 1)?;
    analyze(config, &chsh_results, &settings, &key_result)
}

impl DemoReport for E91Report {
    fn title(&self) -> String {
        "E91".to_string()
    }

    fn succeeded(&self) -> bool {
        self.violates_bell()
    }
}

impl fmt::Display for E91Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "E91 ENTANGLEMENT-BASED QKD RESULTS")?;
        writeln!(f, "Backend: {}", self.backend)?;
        writeln!(f, "Shots per CHSH setting: {}", self.shots)?;
        writeln!(f)?;
        writeln!(f, "Bell inequality test (CHSH):")?;
        for term in &self.terms {
            let (a, b) = (ALICE_ANGLES[term.alice], BOB_ANGLES[term.bob]);
            writeln!(
                f,
                "  {} E(a{}={:.3}, b{}={:.3}) = {:+.3} (ideal {:+.3})",
                if term.sign < 0.0 { '-' } else { '+' },
                term.alice + 1,
                a,
                term.bob + 1,
                b,
                term.value,
                ideal_correlation(a, b)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "  S = {:.3}", self.chsh)?;
        writeln!(f, "  Classical bound: |S| ≤ {:.1}", qkd::CHSH_CLASSICAL_BOUND)?;
        writeln!(f, "  Quantum maximum: 2√2 ≈ {:.3}", qkd::CHSH_QUANTUM_BOUND)?;
        writeln!(
            f,
            "  {} {}",
            report::check(self.violates_bell()),
            if self.violates_bell() {
                "Bell inequality violated: the channel is entangled"
            } else {
                "No violation: entanglement not demonstrated"
            }
        )?;
        writeln!(f)?;
        writeln!(f, "Key generation ({} rounds):", self.rounds.len())?;
        for (i, round) in self.rounds.iter().enumerate() {
            writeln!(
                f,
                "  Round {}: a{} b{} → Alice {} Bob {} {}",
                i + 1,
                round.alice_setting + 1,
                round.bob_setting + 1,
                u8::from(round.alice_bit),
                u8::from(round.bob_bit),
                report::check(round.alice_bit == round.bob_bit)
            )?;
        }
        writeln!(f, "  Alice's key: {}", self.alice_key())?;
        writeln!(f, "  Bob's key:   {}", self.bob_key())?;
        write!(f, "  Agreement: {:.1}%", self.agreement_rate() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_ideal_chsh_is_tsirelson() {
        let s: f64 = CHSH_TERMS
            .iter()
            .map(|&(a, b, sign)| sign * ideal_correlation(ALICE_ANGLES[a], BOB_ANGLES[b]))
            .sum();
        assert_relative_eq!(s, qkd::CHSH_QUANTUM_BOUND, epsilon = 1e-12);
        for (a, b) in KEY_SETTINGS {
            assert_relative_eq!(ideal_correlation(ALICE_ANGLES[a], BOB_ANGLES[b]), 1.0);
        }
    }

    #[test]
    fn test_bell_violation_on_simulator() {
        let backend = SimulatorBackend::ideal(10).with_seed(42);
        let report = run(&backend, &E91Config::default(), 4000).unwrap();
        assert!(report.chsh > 2.6, "S = {}", report.chsh);
        assert!(report.violates_bell());
        assert!(report.succeeded());
    }

    #[test]
    fn test_key_rounds_agree() {
        let backend = SimulatorBackend::ideal(16).with_seed(3);
        let config = E91Config::default().with_key_rounds(8);
        let report = run(&backend, &config, 100).unwrap();
        assert_eq!(report.rounds.len(), 8);
        assert_eq!(report.alice_key(), report.bob_key());
        assert_eq!(report.agreement_rate(), 1.0);
    }

    #[test]
    fn test_key_settings_are_seeded() {
        let config = E91Config::default();
        assert_eq!(key_settings(&config), key_settings(&config));
        assert!(key_settings(&config).iter().all(|s| KEY_SETTINGS.contains(s)));
    }

    #[test]
    fn test_validation() {
        let backend = SimulatorBackend::ideal(2);
        assert!(run(&backend, &E91Config::default().with_key_rounds(0), 10).is_err());
    }
}
