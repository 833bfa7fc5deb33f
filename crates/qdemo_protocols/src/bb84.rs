//! BB84 quantum key distribution
//!
//! Gantree: L5_Protocols → Bb84
//!
//! Alice encodes random bits in random bases (+ or x), Bob measures in
//! his own random bases, and the two keep the positions where the bases
//! agree. One circuit carries every qubit and runs for a single shot.
//! The eavesdropper variant adds an intercept-resend attack inside the
//! circuit: Eve measures each qubit in her own basis into separate
//! clbits, and the collapse is what she passes on to Bob.

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_batch, run_single, Backend, ExecutionResult};
use qdemo_core::{qkd, Basis, Circuit, CircuitBuilder, Gate, QdemoError, QdemoResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BB84 configuration
/// Gantree: Bb84Config // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bb84Config {
    /// Qubits sent
    pub num_bits: usize,
    /// Seed for every random choice
    pub seed: u64,
    /// Intercept-resend attack
    pub eve: bool,
}

impl Default for Bb84Config {
    fn default() -> Self {
        Self {
            num_bits: qkd::DEFAULT_BB84_BITS,
            seed: qdemo_core::execution::DEFAULT_SEED,
            eve: false,
        }
    }
}

impl Bb84Config {
    /// Set the number of qubits sent
    pub fn with_num_bits(mut self, n: usize) -> Self {
        self.num_bits = n;
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable Eve
    pub fn with_eve(mut self, eve: bool) -> Self {
        self.eve = eve;
        self
    }

    fn validate(&self) -> QdemoResult<()> {
        if self.num_bits == 0 || self.num_bits > 24 {
            return Err(QdemoError::InvalidParameter(format!(
                "BB84 bits {} outside 1..=24",
                self.num_bits
            )));
        }
        Ok(())
    }
}

/// Random choices of one run
///
/// Eve's bases are drawn even without Eve so that the same seed gives
/// Alice and Bob identical choices in both variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bb84Draw {
    /// Alice's raw bits
    pub alice_bits: Vec<bool>,
    /// Alice's encoding bases
    pub alice_bases: Vec<Basis>,
    /// Bob's measurement bases
    pub bob_bases: Vec<Basis>,
    /// Eve's measurement bases
    pub eve_bases: Vec<Basis>,
}

fn random_basis(rng: &mut ChaCha8Rng) -> Basis {
    if rng.gen_bool(0.5) {
        Basis::X
    } else {
        Basis::Z
    }
}

/// Draw bits and bases from the seed
/// Gantree: draw(config) -> Bb84Draw // 난수 선택
pub fn draw(config: &Bb84Config) -> Bb84Draw {
    let n = config.num_bits;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let alice_bits = (0..n).map(|_| rng.gen_bool(0.5)).collect();
    let alice_bases = (0..n).map(|_| random_basis(&mut rng)).collect();
    let bob_bases = (0..n).map(|_| random_basis(&mut rng)).collect();
    let eve_bases = (0..n).map(|_| random_basis(&mut rng)).collect();
    Bb84Draw {
        alice_bits,
        alice_bases,
        bob_bases,
        eve_bases,
    }
}

/// Qubit i → Bob's clbit i; with Eve, her result lands in clbit n+i
/// Gantree: build_circuit(config, draw) -> Circuit // 데모 회로
pub fn build_circuit(config: &Bb84Config, draw: &Bb84Draw) -> QdemoResult<Circuit> {
    config.validate()?;
    let n = config.num_bits;
    let clbits = if config.eve { 2 * n } else { n };
    let mut builder = CircuitBuilder::with_clbits(n, clbits)
        .name(if config.eve { "bb84_eve" } else { "bb84" });

    for i in 0..n {
        if draw.alice_bits[i] {
            builder = builder.x(i);
        }
        builder = Gate::basis_transform(i, draw.alice_bases[i])
            .into_iter()
            .fold(builder, |b, g| b.gate(g));
    }
    builder = builder.barrier();

    if config.eve {
        for i in 0..n {
            let rotate = draw.eve_bases[i] == Basis::X;
            if rotate {
                builder = builder.h(i);
            }
            builder = builder.measure(i, n + i);
            if rotate {
                builder = builder.h(i);
            }
        }
        builder = builder.barrier();
    }

    for i in 0..n {
        builder = Gate::basis_transform(i, draw.bob_bases[i])
            .into_iter()
            .fold(builder, |b, g| b.gate(g));
        builder = builder.measure(i, i);
    }
    builder.try_build()
}

/// Security verdict from the QBER
/// Gantree: Verdict // 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No errors at all
    Perfect,
    /// Below the 11% threshold
    Secure,
    /// Between 11% and 20%
    Suspicious,
    /// 20% or more
    Eavesdropping,
}

impl Verdict {
    /// Classify a QBER
    pub fn from_qber(qber: f64) -> Self {
        if qber == 0.0 {
            Verdict::Perfect
        } else if qber < qkd::SECURE_QBER {
            Verdict::Secure
        } else if qber < qkd::SUSPICIOUS_QBER {
            Verdict::Suspicious
        } else {
            Verdict::Eavesdropping
        }
    }

    /// Whether the key may be kept
    pub fn is_secure(&self) -> bool {
        matches!(self, Verdict::Perfect | Verdict::Secure)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Perfect => "✓ Perfect key agreement (no errors)",
            Verdict::Secure => "✓ Secure: QBER below 11%",
            Verdict::Suspicious => "⚠ Suspicious: QBER between 11% and 20%",
            Verdict::Eavesdropping => "✗ Likely eavesdropping: QBER of 20% or more",
        };
        f.write_str(text)
    }
}

/// Eve's side of an intercept-resend run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EveStats {
    /// Bits Eve measured
    pub bits: Vec<bool>,
    /// Positions where Eve's basis differed from Alice's
    pub wrong_basis: usize,
    /// Sifted positions where Eve's basis differed from Alice's
    pub wrong_basis_sifted: usize,
    /// Half of the sifted wrong-basis fraction
    pub expected_qber: f64,
}

/// BB84 report
#[derive(Debug, Clone)]
pub struct Bb84Report {
    /// Configuration
    pub config: Bb84Config,
    /// Random choices
    pub draw: Bb84Draw,
    /// Raw result
    pub result: ExecutionResult,
    /// Bob's measured bits
    pub bob_bits: Vec<bool>,
    /// Positions where Alice's and Bob's bases agree
    pub sifted: Vec<usize>,
    /// Sifted positions where the bits differ
    pub errors: usize,
    /// errors / sifted
    pub qber: f64,
    /// Verdict from the QBER
    pub verdict: Verdict,
    /// Present when Eve was in the channel
    pub eve: Option<EveStats>,
}

fn bits_to_string(bits: impl Iterator<Item = bool>) -> String {
    bits.map(|b| if b { '1' } else { '0' }).collect()
}

impl Bb84Report {
    /// Alice's sifted key
    pub fn alice_key(&self) -> String {
        bits_to_string(self.sifted.iter().map(|&i| self.draw.alice_bits[i]))
    }

    /// Bob's sifted key
    pub fn bob_key(&self) -> String {
        bits_to_string(self.sifted.iter().map(|&i| self.bob_bits[i]))
    }

    /// QBER at or above the secure threshold
    pub fn eavesdropper_detected(&self) -> bool {
        !self.verdict.is_secure()
    }
}

/// Sift the key and compute the QBER
/// Gantree: analyze(config, draw, result) -> Bb84Report // 분석
pub fn analyze(config: &Bb84Config, draw: &Bb84Draw, result: &ExecutionResult) -> QdemoResult<Bb84Report> {
    let n = config.num_bits;
    let (key, _) = result.most_frequent().ok_or(QdemoError::NoCounts)?;
    let read = |clbit: usize| clbit_of(&key, clbit).unwrap_or(false);
    let bob_bits: Vec<bool> = (0..n).map(read).collect();

    let sifted: Vec<usize> = (0..n)
        .filter(|&i| draw.alice_bases[i] == draw.bob_bases[i])
        .collect();
    let errors = sifted
        .iter()
        .filter(|&&i| draw.alice_bits[i] != bob_bits[i])
        .count();
    let qber = if sifted.is_empty() {
        0.0
    } else {
        errors as f64 / sifted.len() as f64
    };

    let eve = config.eve.then(|| {
        let wrong = |i: usize| draw.eve_bases[i] != draw.alice_bases[i];
        let wrong_basis_sifted = sifted.iter().filter(|&&i| wrong(i)).count();
        EveStats {
            bits: (0..n).map(|i| read(n + i)).collect(),
            wrong_basis: (0..n).filter(|&i| wrong(i)).count(),
            wrong_basis_sifted,
            expected_qber: if sifted.is_empty() {
                0.0
            } else {
                0.5 * wrong_basis_sifted as f64 / sifted.len() as f64
            },
        }
    });
    log::debug!(
        "bb84 seed {}: {} sifted, {} errors{}",
        config.seed,
        sifted.len(),
        errors,
        if config.eve { " (Eve present)" } else { "" }
    );

    Ok(Bb84Report {
        config: config.clone(),
        draw: draw.clone(),
        result: result.clone(),
        bob_bits,
        sifted,
        errors,
        qber,
        verdict: Verdict::from_qber(qber),
        eve,
    })
}

/// Draw, build, run one shot and analyze
pub fn run(backend: &dyn Backend, config: &Bb84Config) -> QdemoResult<Bb84Report> {
    let choices = draw(config);
    let circuit = build_circuit(config, &choices)?;
    let result = run_single(backend, &circuit, 1)?;
    analyze(config, &choices, &result)
}

/// The same draw with and without Eve
#[derive(Debug, Clone)]
pub struct Bb84Comparison {
    /// Clean channel
    pub without_eve: Bb84Report,
    /// Intercept-resend channel
    pub with_eve: Bb84Report,
}

/// Run both variants as one batch
/// Gantree: compare(backend, config) -> Bb84Comparison // 도청 비교
pub fn compare(backend: &dyn Backend, config: &Bb84Config) -> QdemoResult<Bb84Comparison> {
    let clean = config.clone().with_eve(false);
    let attacked = config.clone().with_eve(true);
    let choices = draw(config);
    let circuits = vec![build_circuit(&clean, &choices)?, build_circuit(&attacked, &choices)?];
    let results = run_batch(backend, &circuits, 1)?;
    Ok(Bb84Comparison {
        without_eve: analyze(&clean, &choices, &results[0])?,
        with_eve: analyze(&attacked, &choices, &results[1])?,
    })
}

impl DemoReport for Bb84Report {
    fn title(&self) -> String {
        if self.config.eve {
            "BB84 (with Eve)".to_string()
        } else {
            "BB84".to_string()
        }
    }

    /// Without Eve the key must be secure; with Eve any error she could
    /// have caused must be visible
    fn succeeded(&self) -> bool {
        match &self.eve {
            None => self.verdict.is_secure(),
            Some(stats) => stats.wrong_basis_sifted == 0 || self.errors > 0,
        }
    }
}

fn basis_row(bases: &[Basis]) -> String {
    bases.iter().map(|b| b.symbol()).collect()
}

impl fmt::Display for Bb84Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.config.num_bits;
        writeln!(
            f,
            "BB84 QUANTUM KEY DISTRIBUTION{}",
            if self.config.eve { " (WITH EAVESDROPPER)" } else { "" }
        )?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Qubits sent: {} (seed {})", n, self.config.seed)?;
        writeln!(f)?;
        writeln!(f, "Alice's bits:  {}", bits_to_string(self.draw.alice_bits.iter().copied()))?;
        writeln!(f, "Alice's bases: {}", basis_row(&self.draw.alice_bases))?;
        if let Some(eve) = &self.eve {
            writeln!(f, "Eve's bases:   {}", basis_row(&self.draw.eve_bases))?;
            writeln!(f, "Eve's bits:    {}", bits_to_string(eve.bits.iter().copied()))?;
        }
        writeln!(f, "Bob's bases:   {}", basis_row(&self.draw.bob_bases))?;
        writeln!(f, "Bob's bits:    {}", bits_to_string(self.bob_bits.iter().copied()))?;
        let matches: String = (0..n)
            .map(|i| if self.sifted.contains(&i) { '|' } else { ' ' })
            .collect();
        writeln!(f, "Match:         {}", matches)?;
        writeln!(f)?;
        writeln!(f, "Sifting: {} of {} bases match", self.sifted.len(), n)?;
        writeln!(f, "  Alice's key: {}", self.alice_key())?;
        writeln!(f, "  Bob's key:   {}", self.bob_key())?;
        writeln!(f, "  Errors: {}", self.errors)?;
        writeln!(f, "  QBER: {:.1}%", self.qber * 100.0)?;
        if let Some(eve) = &self.eve {
            writeln!(f)?;
            writeln!(f, "Eve's attack:")?;
            writeln!(f, "  Wrong basis: {} of {} qubits", eve.wrong_basis, n)?;
            writeln!(
                f,
                "  Wrong basis on sifted bits: {} of {}",
                eve.wrong_basis_sifted,
                self.sifted.len()
            )?;
            writeln!(
                f,
                "  Expected QBER: {:.1}% (about {:.0}% for a long key)",
                eve.expected_qber * 100.0,
                qkd::INTERCEPT_RESEND_QBER * 100.0
            )?;
            writeln!(
                f,
                "  Detection: {}",
                if self.eavesdropper_detected() {
                    "Eve detected"
                } else {
                    "Eve not detected on this key"
                }
            )?;
        }
        writeln!(f)?;
        write!(f, "{}", self.verdict)
    }
}

impl DemoReport for Bb84Comparison {
    fn title(&self) -> String {
        "BB84 (Eve comparison)".to_string()
    }

    fn succeeded(&self) -> bool {
        self.without_eve.succeeded() && self.with_eve.succeeded()
    }
}

impl fmt::Display for Bb84Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.without_eve)?;
        writeln!(f)?;
        writeln!(f, "{}", self.with_eve)?;
        writeln!(f)?;
        writeln!(f, "COMPARISON")?;
        writeln!(f, "  {:<22} {:>10} {:>10}", "", "No Eve", "With Eve")?;
        writeln!(
            f,
            "  {:<22} {:>10} {:>10}",
            "Sifted bits",
            self.without_eve.sifted.len(),
            self.with_eve.sifted.len()
        )?;
        writeln!(
            f,
            "  {:<22} {:>10} {:>10}",
            "Errors", self.without_eve.errors, self.with_eve.errors
        )?;
        writeln!(
            f,
            "  {:<22} {:>9.1}% {:>9.1}%",
            "QBER",
            self.without_eve.qber * 100.0,
            self.with_eve.qber * 100.0
        )?;
        write!(
            f,
            "  {:<22} {:>10} {:>10}",
            "Secure",
            report::check(self.without_eve.verdict.is_secure()),
            report::check(self.with_eve.verdict.is_secure())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;
    use std::collections::HashMap;

    #[test]
    fn test_draw_is_reproducible() {
        let config = Bb84Config::default();
        assert_eq!(draw(&config), draw(&config));
        assert_eq!(draw(&config).alice_bits, draw(&config.clone().with_eve(true)).alice_bits);
        assert_ne!(draw(&config), draw(&config.clone().with_seed(7)));
    }

    #[test]
    fn test_clean_channel_has_no_errors() {
        let backend = SimulatorBackend::ideal(16).with_seed(42);
        for seed in 0..5 {
            let config = Bb84Config::default().with_num_bits(16).with_seed(seed);
            let report = run(&backend, &config).unwrap();
            assert_eq!(report.qber, 0.0);
            assert_eq!(report.verdict, Verdict::Perfect);
            assert_eq!(report.alice_key(), report.bob_key());
            assert!(report.eve.is_none());
        }
    }

    #[test]
    fn test_eve_introduces_errors() {
        let backend = SimulatorBackend::ideal(16).with_seed(42);
        let mut total_errors = 0;
        for seed in 0..6 {
            let config = Bb84Config::default().with_num_bits(16).with_seed(seed).with_eve(true);
            let report = run(&backend, &config).unwrap();
            let eve = report.eve.as_ref().unwrap();
            // Eve in Alice's basis reads Alice's bit
            for i in (0..16).filter(|&i| report.draw.eve_bases[i] == report.draw.alice_bases[i]) {
                assert_eq!(eve.bits[i], report.draw.alice_bits[i]);
            }
            // errors only where Eve guessed wrong
            assert!(report.errors <= eve.wrong_basis_sifted);
            total_errors += report.errors;
        }
        assert!(total_errors > 0);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_qber(0.0), Verdict::Perfect);
        assert_eq!(Verdict::from_qber(0.05), Verdict::Secure);
        assert_eq!(Verdict::from_qber(0.15), Verdict::Suspicious);
        assert_eq!(Verdict::from_qber(0.25), Verdict::Eavesdropping);
        assert!(!Verdict::Suspicious.is_secure());
    }

    #[test]
    fn test_analyze_counts_sifted_errors() {
        let config = Bb84Config::default().with_num_bits(4);
        let draw = Bb84Draw {
            alice_bits: vec![true, false, true, false],
            alice_bases: vec![Basis::Z, Basis::X, Basis::Z, Basis::X],
            bob_bases: vec![Basis::Z, Basis::X, Basis::X, Basis::X],
            eve_bases: vec![Basis::Z; 4],
        };
        // Bob read 1,1,0,0 (clbit 0 rightmost); position 1 is a sifted error
        let mut counts = HashMap::new();
        counts.insert("0011".to_string(), 1);
        let result = ExecutionResult::from_counts(counts, "test");
        let report = analyze(&config, &draw, &result).unwrap();
        assert_eq!(report.sifted, vec![0, 1, 3]);
        assert_eq!(report.errors, 1);
        assert!((report.qber - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.verdict, Verdict::Eavesdropping);
        assert_eq!(report.alice_key(), "100");
        assert_eq!(report.bob_key(), "110");
    }

    #[test]
    fn test_compare_shares_the_draw() {
        let backend = SimulatorBackend::ideal(8).with_seed(1);
        let comparison = compare(&backend, &Bb84Config::default()).unwrap();
        assert_eq!(comparison.without_eve.draw, comparison.with_eve.draw);
        assert_eq!(comparison.without_eve.sifted, comparison.with_eve.sifted);
        assert_eq!(comparison.without_eve.qber, 0.0);
        assert!(comparison.to_string().contains("COMPARISON"));
    }

    #[test]
    fn test_rejects_empty_key() {
        let config = Bb84Config::default().with_num_bits(0);
        assert!(build_circuit(&config, &draw(&config)).is_err());
    }
}
