//! Steane's seven-qubit code
//!
//! Gantree: L5_Qec → Steane
//!
//! The [[7,1,3]] CSS code built from the Hamming [7,4,3] code. Qubit i
//! sits at Hamming position i+1; stabilizer k covers the positions whose
//! binary index has bit k set, so a three-bit syndrome read as a number
//! is the 1-based position of the faulty qubit.
//!
//! Layout: data q0..q6, X-error ancillas q7..q9 (Z-type checks),
//! Z-error ancillas q10..q12 (X-type checks). Qubit i is measured into
//! clbit i. The logical value is the parity of the data bits after the
//! syndrome-indicated bit is flipped back.

use crate::logical::{self, InjectedError, LogicalState};
use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{clbit_of, run_batch, Backend, ExecutionResult};
use qdemo_core::{Basis, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use std::collections::BTreeMap;
use std::fmt;

/// Data qubits
pub const DATA_QUBITS: usize = 7;

/// Data plus six ancillas
pub const NUM_QUBITS: usize = 13;

/// First X-error ancilla
const X_ANCILLA: usize = 7;

/// First Z-error ancilla
const Z_ANCILLA: usize = 10;

/// Supports of the three checks, each on qubits {0,2,4,6}, {1,2,5,6},
/// {3,4,5,6}
pub const STABILIZERS: [[usize; 4]; 3] = [[0, 2, 4, 6], [1, 2, 5, 6], [3, 4, 5, 6]];

/// No error, X on q2, Z on q5
pub fn default_cases() -> Vec<Option<InjectedError>> {
    vec![None, Some(InjectedError::x(2)), Some(InjectedError::z(5))]
}

/// Prepare |0⟩_L: H on the pivot qubits 0, 1, 3 and fan each out over
/// its check
/// Gantree: encoder() -> Circuit // 부호화
pub fn encoder() -> Circuit {
    let pivots = [0, 1, 3];
    let mut builder = CircuitBuilder::new(DATA_QUBITS).name("steane_encode").h_on(&pivots);
    for (&pivot, support) in pivots.iter().zip(&STABILIZERS) {
        for &q in support.iter().filter(|&&q| q != pivot) {
            builder = builder.cx(pivot, q);
        }
    }
    builder.build()
}

/// Both syndromes into six ancillas
/// Gantree: syndrome_extraction() -> Circuit // 신드롬 추출
pub fn syndrome_extraction() -> Circuit {
    let mut builder = CircuitBuilder::new(NUM_QUBITS).name("steane_syndrome");
    for (k, support) in STABILIZERS.iter().enumerate() {
        for &q in support {
            builder = builder.cx(q, X_ANCILLA + k);
        }
    }
    let z_ancillas: Vec<usize> = (Z_ANCILLA..Z_ANCILLA + 3).collect();
    builder = builder.h_on(&z_ancillas);
    for (k, support) in STABILIZERS.iter().enumerate() {
        for &q in support {
            builder = builder.cx(Z_ANCILLA + k, q);
        }
    }
    builder.h_on(&z_ancillas).build()
}

/// Encode `input`, inject, extract syndromes, read the data in the
/// input's basis
/// Gantree: build_circuit(input, error) -> Circuit // 데모 회로
pub fn build_circuit(input: LogicalState, error: Option<&InjectedError>) -> QdemoResult<Circuit> {
    if let Some(e) = error {
        e.validate(DATA_QUBITS)?;
    }
    let data: Vec<usize> = (0..DATA_QUBITS).collect();
    let mut builder = CircuitBuilder::with_clbits(NUM_QUBITS, NUM_QUBITS)
        .name("steane_code")
        .append(&encoder());
    // transversal X and H act as logical X and H
    if input.expected_bit() {
        builder = builder.x_on(&data);
    }
    if input.basis() == Basis::X {
        builder = builder.h_on(&data);
    }
    builder = logical::inject(builder.barrier(), error)
        .append(&syndrome_extraction())
        .barrier();
    if input.basis() == Basis::X {
        builder = builder.h_on(&data);
    }
    builder.measure_all().try_build()
}

/// 1-based position from three check bits (check k is bit k)
/// Gantree: syndrome_position(bits) -> Option<usize> // 위치 복호
pub fn syndrome_position(checks: [bool; 3]) -> Option<usize> {
    let position = checks
        .iter()
        .enumerate()
        .filter(|(_, &b)| b)
        .map(|(k, _)| 1 << k)
        .sum::<usize>();
    (position > 0).then_some(position)
}

/// Logical bit from data bits and the syndrome that applies to them
/// Gantree: decode(data, checks) -> bool // 복호
pub fn decode(data: [bool; DATA_QUBITS], checks: [bool; 3]) -> bool {
    let mut bits = data;
    if let Some(p) = syndrome_position(checks) {
        bits[p - 1] = !bits[p - 1];
    }
    bits.iter().filter(|&&b| b).count() % 2 == 1
}

/// Outcome of one error case
#[derive(Debug, Clone)]
pub struct SteaneCaseOutcome {
    /// Injected error
    pub error: Option<InjectedError>,
    /// Raw result
    pub result: ExecutionResult,
    /// X-error syndrome position (0 = none) → count
    pub x_syndromes: BTreeMap<usize, u64>,
    /// Z-error syndrome position (0 = none) → count
    pub z_syndromes: BTreeMap<usize, u64>,
    /// Parity of the raw data bits is correct
    pub raw_success: f64,
    /// Parity after correction is correct
    pub corrected_success: f64,
}

impl SteaneCaseOutcome {
    fn dominant(map: &BTreeMap<usize, u64>) -> usize {
        map.iter().max_by_key(|(_, c)| **c).map_or(0, |(p, _)| *p)
    }

    /// Most frequent X-error position
    pub fn dominant_x(&self) -> usize {
        Self::dominant(&self.x_syndromes)
    }

    /// Most frequent Z-error position
    pub fn dominant_z(&self) -> usize {
        Self::dominant(&self.z_syndromes)
    }
}

/// Steane code report over several error cases
#[derive(Debug, Clone)]
pub struct SteaneReport {
    /// Encoded state
    pub input: LogicalState,
    /// One entry per case
    pub cases: Vec<SteaneCaseOutcome>,
}

/// Decode every shot of one case
/// Gantree: analyze(input, error, result) -> SteaneCaseOutcome // 분석
pub fn analyze(
    input: LogicalState,
    error: Option<InjectedError>,
    result: &ExecutionResult,
) -> QdemoResult<SteaneCaseOutcome> {
    if result.shots == 0 {
        return Err(QdemoError::NoCounts);
    }
    let expected = input.expected_bit();
    let mut x_syndromes = BTreeMap::new();
    let mut z_syndromes = BTreeMap::new();
    let (mut raw_ok, mut corrected_ok) = (0u64, 0u64);

    for (key, &count) in &result.counts {
        let bit = |c| clbit_of(key, c).unwrap_or(false);
        let mut data = [false; DATA_QUBITS];
        for (q, slot) in data.iter_mut().enumerate() {
            *slot = bit(q);
        }
        let x_checks = [bit(X_ANCILLA), bit(X_ANCILLA + 1), bit(X_ANCILLA + 2)];
        let z_checks = [bit(Z_ANCILLA), bit(Z_ANCILLA + 1), bit(Z_ANCILLA + 2)];
        *x_syndromes.entry(syndrome_position(x_checks).unwrap_or(0)).or_insert(0) += count;
        *z_syndromes.entry(syndrome_position(z_checks).unwrap_or(0)).or_insert(0) += count;

        // Z-basis readout is flipped by X errors, X-basis readout by Z errors
        let checks = match input.basis() {
            Basis::X => z_checks,
            _ => x_checks,
        };
        if decode(data, [false; 3]) == expected {
            raw_ok += count;
        }
        if decode(data, checks) == expected {
            corrected_ok += count;
        }
    }
    let shots = result.shots as f64;
    Ok(SteaneCaseOutcome {
        error,
        result: result.clone(),
        x_syndromes,
        z_syndromes,
        raw_success: raw_ok as f64 / shots,
        corrected_success: corrected_ok as f64 / shots,
    })
}

/// Run every case as one batch
/// Gantree: run(backend, input, cases, shots) -> SteaneReport // 실행
pub fn run(
    backend: &dyn Backend,
    input: LogicalState,
    cases: &[Option<InjectedError>],
    shots: u64,
) -> QdemoResult<SteaneReport> {
    if cases.is_empty() {
        return Err(QdemoError::InvalidParameter("no error cases given".into()));
    }
    let circuits = cases
        .iter()
        .map(|e| build_circuit(input, e.as_ref()))
        .collect::<QdemoResult<Vec<_>>>()?;
    log::debug!(
        "steane {}: {} cases, encoded depth {}",
        input,
        circuits.len(),
        circuits.first().map_or(0, |c| c.depth())
    );
    let results = run_batch(backend, &circuits, shots)?;
    let cases = cases
        .iter()
        .zip(&results)
        .map(|(e, r)| analyze(input, *e, r))
        .collect::<QdemoResult<Vec<_>>>()?;
    Ok(SteaneReport { input, cases })
}

impl DemoReport for SteaneReport {
    fn title(&self) -> String {
        format!("Steane 7-qubit code ({})", self.input)
    }

    fn succeeded(&self) -> bool {
        self.cases.iter().all(|c| c.corrected_success > 0.5)
    }
}

fn describe_position(position: usize) -> String {
    if position == 0 {
        "none".to_string()
    } else {
        format!("q{} ({:03b})", position - 1, position)
    }
}

impl fmt::Display for SteaneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STEANE'S 7-QUBIT CODE RESULTS")?;
        if let Some(first) = self.cases.first() {
            writeln!(f, "Backend: {}", first.result.metadata.backend)?;
            writeln!(f, "Shots per test: {}", first.result.shots)?;
        }
        writeln!(
            f,
            "Input: {} (data read in the {} basis, expected parity {})",
            self.input,
            self.input.basis(),
            u8::from(self.input.expected_bit())
        )?;
        for case in &self.cases {
            writeln!(f)?;
            writeln!(f, "{}:", logical::describe(case.error.as_ref()))?;
            writeln!(f, "  X-error syndrome: {}", describe_position(case.dominant_x()))?;
            writeln!(f, "  Z-error syndrome: {}", describe_position(case.dominant_z()))?;
            writeln!(f, "  Logical readout without correction: {:.1}%", case.raw_success * 100.0)?;
            writeln!(
                f,
                "  Logical readout with correction:    {:.1}% {}",
                case.corrected_success * 100.0,
                report::check(case.corrected_success > 0.5)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Stabilizers (Z-type detect X errors, X-type detect Z errors):")?;
        for (k, support) in STABILIZERS.iter().enumerate() {
            writeln!(f, "  S{}: qubits {:?}", k + 1, support)?;
        }
        writeln!(f, "Syndrome s3s2s1 read in binary is the 1-based error position:")?;
        for position in 1..=DATA_QUBITS {
            writeln!(f, "  {:03b} → q{}", position, position - 1)?;
        }
        write!(f, "[[7,1,3]]: one logical qubit, distance 3, any single-qubit error corrected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;
    use qdemo_core::Pauli;

    #[test]
    fn test_syndrome_positions() {
        assert_eq!(syndrome_position([false, false, false]), None);
        assert_eq!(syndrome_position([true, true, false]), Some(3));
        assert_eq!(syndrome_position([false, true, true]), Some(6));
        for q in 0..DATA_QUBITS {
            let checks = [0, 1, 2].map(|k| STABILIZERS[k].contains(&q));
            assert_eq!(syndrome_position(checks), Some(q + 1));
        }
    }

    #[test]
    fn test_encoder_produces_even_codewords() {
        let probs = qdemo_backend::exact_probabilities(&encoder()).unwrap();
        let support: Vec<usize> = (0..probs.len()).filter(|&i| probs[i] > 1e-9).collect();
        assert_eq!(support.len(), 8);
        for index in support {
            assert_eq!(index.count_ones() % 2, 0);
            for check in STABILIZERS {
                assert_eq!(check.iter().filter(|&&q| (index >> q) & 1 == 1).count() % 2, 0);
            }
        }
    }

    #[test]
    fn test_default_cases() {
        let backend = SimulatorBackend::ideal(13).with_seed(42);
        let report = run(&backend, LogicalState::Zero, &default_cases(), 300).unwrap();
        let [clean, x2, z5] = &report.cases[..] else {
            panic!("three cases expected");
        };
        assert_eq!((clean.dominant_x(), clean.dominant_z()), (0, 0));
        assert_eq!((x2.dominant_x(), x2.dominant_z()), (3, 0));
        assert_eq!((z5.dominant_x(), z5.dominant_z()), (0, 6));
        assert_eq!(x2.raw_success, 0.0);
        assert!(report.cases.iter().all(|c| c.corrected_success == 1.0));
        assert!(report.succeeded());
    }

    #[test]
    fn test_all_inputs_all_errors() {
        let backend = SimulatorBackend::ideal(13).with_seed(5);
        let cases: Vec<Option<InjectedError>> = (0..DATA_QUBITS)
            .flat_map(|q| {
                [Pauli::X, Pauli::Y, Pauli::Z]
                    .into_iter()
                    .map(move |pauli| Some(InjectedError { pauli, qubit: q }))
            })
            .collect();
        for input in LogicalState::ALL {
            let report = run(&backend, input, &cases, 20).unwrap();
            for case in &report.cases {
                assert_eq!(case.corrected_success, 1.0, "{} {:?}", input, case.error);
            }
        }
    }

    #[test]
    fn test_rejects_ancilla_error() {
        assert!(build_circuit(LogicalState::Zero, Some(&InjectedError::x(7))).is_err());
    }
}
