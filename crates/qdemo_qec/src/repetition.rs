//! Three-qubit repetition codes
//!
//! Gantree: L5_Qec → Repetition
//!
//! The bit-flip code stores |0⟩ as |000⟩ and |1⟩ as |111⟩; two ancillas
//! record the parities s1 = q0⊕q1 and s2 = q1⊕q2, which point at the
//! flipped qubit. The phase-flip code is the same code in the Hadamard
//! frame: encoding ends with H on every data qubit, errors are Z, and a
//! second H layer turns them back into flips before the parity checks.
//! All five qubits are measured at the end; correction happens in
//! post-processing.

use crate::logical::{self, InjectedError};
use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_batch, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, Pauli, QdemoError, QdemoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Data qubits
pub const DATA_QUBITS: usize = 3;

/// Which repetition code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeKind {
    /// Protects against X errors
    BitFlip,
    /// Protects against Z errors
    PhaseFlip,
}

impl CodeKind {
    /// Error type the code corrects
    pub fn pauli(&self) -> Pauli {
        match self {
            CodeKind::BitFlip => Pauli::X,
            CodeKind::PhaseFlip => Pauli::Z,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CodeKind::BitFlip => "bit-flip",
            CodeKind::PhaseFlip => "phase-flip",
        }
    }
}

/// Qubit pointed at by a syndrome "s1s2"
/// Gantree: syndrome_target(s) -> Option<usize> // 신드롬 해석
pub fn syndrome_target(syndrome: &str) -> Option<usize> {
    match syndrome {
        "10" => Some(0),
        "11" => Some(1),
        "01" => Some(2),
        _ => None,
    }
}

/// Syndrome expected for an error on `qubit`
pub fn expected_syndrome(qubit: Option<usize>) -> &'static str {
    match qubit {
        Some(0) => "10",
        Some(1) => "11",
        Some(2) => "01",
        _ => "00",
    }
}

/// Repetition code configuration
/// Gantree: RepetitionConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepetitionConfig {
    /// Code
    pub kind: CodeKind,
    /// Logical bit encoded
    pub initial: bool,
    /// Data qubit hit by the code's error, if any
    pub error_qubit: Option<usize>,
}

impl RepetitionConfig {
    /// Logical |1⟩ with an error on the middle qubit
    pub fn new(kind: CodeKind) -> Self {
        Self {
            kind,
            initial: true,
            error_qubit: Some(1),
        }
    }

    /// Set the logical bit
    pub fn with_initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    /// Set the error location
    pub fn with_error_qubit(mut self, qubit: Option<usize>) -> Self {
        self.error_qubit = qubit;
        self
    }

    fn error(&self) -> Option<InjectedError> {
        self.error_qubit.map(|qubit| InjectedError {
            pauli: self.kind.pauli(),
            qubit,
        })
    }

    fn validate(&self) -> QdemoResult<()> {
        if let Some(e) = self.error() {
            e.validate(DATA_QUBITS)?;
        }
        Ok(())
    }
}

/// Data q0..q2, ancillas q3 (q0⊕q1) and q4 (q1⊕q2), qubit i → clbit i
/// Gantree: build_circuit(config) -> Circuit // 데모 회로
pub fn build_circuit(config: &RepetitionConfig) -> QdemoResult<Circuit> {
    config.validate()?;
    let data: Vec<usize> = (0..DATA_QUBITS).collect();
    let mut builder = CircuitBuilder::with_clbits(5, 5).name(format!("{}_code", config.kind.name()));
    if config.initial {
        builder = builder.x(0);
    }
    builder = builder.cx(0, 1).cx(0, 2);
    if config.kind == CodeKind::PhaseFlip {
        builder = builder.h_on(&data);
    }
    builder = logical::inject(builder.barrier(), config.error().as_ref());
    if config.kind == CodeKind::PhaseFlip {
        builder = builder.h_on(&data);
    }
    builder
        .cx(0, 3)
        .cx(1, 3)
        .cx(1, 4)
        .cx(2, 4)
        .barrier()
        .measure_all()
        .try_build()
}

/// Correct by syndrome, then take the majority
/// Gantree: decode(data, syndrome) -> bool // 복호
pub fn decode(data: [bool; 3], syndrome: &str) -> bool {
    let mut bits = data;
    if let Some(q) = syndrome_target(syndrome) {
        bits[q] = !bits[q];
    }
    majority(bits)
}

/// At least two of three
pub fn majority(bits: [bool; 3]) -> bool {
    bits.iter().filter(|&&b| b).count() >= 2
}

/// Repetition code report
#[derive(Debug, Clone)]
pub struct RepetitionReport {
    /// Configuration
    pub config: RepetitionConfig,
    /// Raw result
    pub result: ExecutionResult,
    /// Syndrome "s1s2" → count
    pub syndromes: BTreeMap<String, u64>,
    /// Shots where the majority of raw data bits is correct
    pub majority_success: f64,
    /// Shots where syndrome correction then majority is correct
    pub corrected_success: f64,
}

impl RepetitionReport {
    /// Most frequent syndrome
    pub fn dominant_syndrome(&self) -> Option<&str> {
        self.syndromes
            .iter()
            .max_by_key(|(_, c)| **c)
            .map(|(s, _)| s.as_str())
    }
}

/// Decode every shot
/// Gantree: analyze(config, result) -> RepetitionReport // 분석
pub fn analyze(config: &RepetitionConfig, result: &ExecutionResult) -> QdemoResult<RepetitionReport> {
    if result.shots == 0 {
        return Err(QdemoError::NoCounts);
    }
    let mut syndromes: BTreeMap<String, u64> = ["00", "01", "10", "11"]
        .iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    let (mut majority_ok, mut corrected_ok) = (0u64, 0u64);
    for (key, &count) in &result.counts {
        let bit = |c| clbit_of(key, c).unwrap_or(false);
        let data = [bit(0), bit(1), bit(2)];
        let syndrome = format!("{}{}", u8::from(bit(3)), u8::from(bit(4)));
        if majority(data) == config.initial {
            majority_ok += count;
        }
        if decode(data, &syndrome) == config.initial {
            corrected_ok += count;
        }
        *syndromes.entry(syndrome).or_insert(0) += count;
    }
    let shots = result.shots as f64;
    Ok(RepetitionReport {
        config: config.clone(),
        result: result.clone(),
        syndromes,
        majority_success: majority_ok as f64 / shots,
        corrected_success: corrected_ok as f64 / shots,
    })
}

/// Run one configuration
pub fn run(backend: &dyn Backend, config: &RepetitionConfig, shots: u64) -> QdemoResult<RepetitionReport> {
    let mut reports = run_sweep(backend, std::slice::from_ref(config), shots)?;
    reports.pop().ok_or(QdemoError::NoCounts)
}

/// Run several configurations as one batch
/// Gantree: run_sweep(backend, configs, shots) -> Vec<RepetitionReport> // 오류 위치 순회
pub fn run_sweep(
    backend: &dyn Backend,
    configs: &[RepetitionConfig],
    shots: u64,
) -> QdemoResult<Vec<RepetitionReport>> {
    let circuits = configs
        .iter()
        .map(build_circuit)
        .collect::<QdemoResult<Vec<_>>>()?;
    log::debug!("{} sweep over {} configurations", configs.first().map_or("repetition", |c| c.kind.name()), configs.len());
    let results = run_batch(backend, &circuits, shots)?;
    configs
        .iter()
        .zip(&results)
        .map(|(c, r)| analyze(c, r))
        .collect()
}

/// No error, then each data qubit in turn
pub fn all_error_cases(kind: CodeKind, initial: bool) -> Vec<RepetitionConfig> {
    std::iter::once(None)
        .chain((0..DATA_QUBITS).map(Some))
        .map(|q| RepetitionConfig::new(kind).with_initial(initial).with_error_qubit(q))
        .collect()
}

impl DemoReport for RepetitionReport {
    fn title(&self) -> String {
        let code = match self.config.kind {
            CodeKind::BitFlip => "Bit-flip code",
            CodeKind::PhaseFlip => "Phase-flip code",
        };
        match self.config.error_qubit {
            Some(q) => format!("{} ({} on q{})", code, self.config.kind.pauli().to_char(), q),
            None => format!("{} (no error)", code),
        }
    }

    fn succeeded(&self) -> bool {
        self.corrected_success > 0.5
    }
}

impl fmt::Display for RepetitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.config.kind;
        let pauli = kind.pauli().to_char();
        let initial = u8::from(self.config.initial);
        let shots = self.result.shots;
        writeln!(f, "3-QUBIT {} CODE RESULTS", kind.name().to_uppercase())?;
        writeln!(f, "Backend: {}", self.result.metadata.backend)?;
        writeln!(f, "Initial state: |{}⟩", initial)?;
        writeln!(
            f,
            "Error location: {}",
            self.config
                .error_qubit
                .map_or_else(|| "none".to_string(), |q| format!("{} on qubit {}", pauli, q))
        )?;
        writeln!(f, "Total shots: {}", shots)?;
        writeln!(f)?;
        writeln!(f, "Raw measurement results (top 10, s2 s1 d2 d1 d0):")?;
        report::write_top_counts(f, &self.result, 10, |_| String::new())?;
        writeln!(f)?;
        writeln!(f, "Syndrome distribution (s1 = q0⊕q1, s2 = q1⊕q2):")?;
        let expected = expected_syndrome(self.config.error_qubit);
        for (syndrome, &count) in &self.syndromes {
            let meaning = match syndrome_target(syndrome) {
                Some(q) => format!("Error on qubit {}", q),
                None => "No error detected".to_string(),
            };
            writeln!(
                f,
                "  {}: {:5} ({:5.1}%) - {}{}",
                syndrome,
                count,
                report::percent(count, shots),
                meaning,
                if syndrome == expected { " ✓" } else { "" }
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Error correction performance:")?;
        writeln!(f, "  Expected output: |{}⟩", initial)?;
        writeln!(f, "  Majority vote only: {:.1}%", self.majority_success * 100.0)?;
        writeln!(f, "  With syndrome correction: {:.1}%", self.corrected_success * 100.0)?;
        writeln!(f)?;
        match kind {
            CodeKind::BitFlip => writeln!(f, "Encoding: |0⟩ → |000⟩, |1⟩ → |111⟩")?,
            CodeKind::PhaseFlip => writeln!(f, "Encoding: |0⟩ → |+++⟩, |1⟩ → |−−−⟩")?,
        }
        if self.succeeded() {
            write!(f, "✓ Error correction successful")
        } else {
            write!(f, "✗ Hardware noise overwhelmed the error correction")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_decode_table() {
        assert!(decode([true, false, true], "11"));
        assert!(!decode([true, false, false], "10"));
        assert!(!decode([false, false, true], "01"));
        assert!(decode([true, true, true], "00"));
    }

    #[test]
    fn test_every_single_error_is_corrected() {
        let backend = SimulatorBackend::ideal(5).with_seed(42);
        for kind in [CodeKind::BitFlip, CodeKind::PhaseFlip] {
            for initial in [false, true] {
                let reports = run_sweep(&backend, &all_error_cases(kind, initial), 200).unwrap();
                for report in &reports {
                    assert_eq!(report.corrected_success, 1.0, "{}", report.title());
                    assert_eq!(report.majority_success, 1.0);
                    assert_eq!(
                        report.dominant_syndrome(),
                        Some(expected_syndrome(report.config.error_qubit))
                    );
                }
            }
        }
    }

    #[test]
    fn test_default_case() {
        let backend = SimulatorBackend::ideal(5).with_seed(1);
        let report = run(&backend, &RepetitionConfig::new(CodeKind::BitFlip), 100).unwrap();
        assert_eq!(report.result.counts.len(), 1);
        // d0=1 d1=0 d2=1, s1=1, s2=1
        assert_eq!(report.result.count("11101"), 100);
        assert!(report.succeeded());
    }

    #[test]
    fn test_rejects_error_outside_code() {
        let config = RepetitionConfig::new(CodeKind::PhaseFlip).with_error_qubit(Some(3));
        assert!(build_circuit(&config).is_err());
    }
}
