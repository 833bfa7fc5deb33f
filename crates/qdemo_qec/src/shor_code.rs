//! Shor's nine-qubit code
//!
//! Gantree: L5_Qec → ShorCode
//!
//! A phase-flip code whose three blocks are each a bit-flip code:
//! |0⟩_L = (|000⟩+|111⟩)^⊗3 / 2√2, |1⟩_L = (|000⟩−|111⟩)^⊗3 / 2√2.
//! Correction is coherent: each block is decoded with two CX and a
//! Toffoli that flips the block head when both partners disagree with
//! it, then the same majority runs across the block heads q0, q3, q6.
//! Any single-qubit X, Y or Z error leaves q0 in the input state.

use crate::logical::{self, InjectedError, LogicalState};
use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_batch, Backend, ExecutionResult};
use qdemo_core::{Basis, Circuit, CircuitBuilder, QdemoError, QdemoResult};
use std::fmt;

/// Physical qubits
pub const NUM_QUBITS: usize = 9;

/// Block heads
const HEADS: [usize; 3] = [0, 3, 6];

/// No error, X on q1, Z on q4
pub fn default_cases() -> Vec<Option<InjectedError>> {
    vec![None, Some(InjectedError::x(1)), Some(InjectedError::z(4))]
}

/// Encode q0 into nine qubits
/// Gantree: encoder() -> Circuit // 부호화
pub fn encoder() -> Circuit {
    let mut builder = CircuitBuilder::new(NUM_QUBITS)
        .name("shor_encode")
        .cx(0, 3)
        .cx(0, 6)
        .h_on(&HEADS);
    for head in HEADS {
        builder = builder.cx(head, head + 1).cx(head, head + 2);
    }
    builder.build()
}

/// Decode with majority correction back onto q0
/// Gantree: corrector() -> Circuit // 다수결 복호
pub fn corrector() -> Circuit {
    let mut builder = CircuitBuilder::new(NUM_QUBITS).name("shor_correct");
    for head in HEADS {
        builder = builder
            .cx(head, head + 1)
            .cx(head, head + 2)
            .ccx(head + 2, head + 1, head);
    }
    builder
        .h_on(&HEADS)
        .cx(0, 3)
        .cx(0, 6)
        .ccx(6, 3, 0)
        .build()
}

/// Prepare, encode, inject, correct, measure q0 in the input's basis
/// Gantree: build_circuit(input, error) -> Circuit // 데모 회로
pub fn build_circuit(input: LogicalState, error: Option<&InjectedError>) -> QdemoResult<Circuit> {
    if let Some(e) = error {
        e.validate(NUM_QUBITS)?;
    }
    let builder = CircuitBuilder::with_clbits(NUM_QUBITS, 1).name("shor_code");
    let builder = input.prepare(builder, 0).barrier().append(&encoder()).barrier();
    let mut builder = logical::inject(builder, error).append(&corrector()).barrier();
    if input.basis() == Basis::X {
        builder = builder.h(0);
    }
    builder.measure(0, 0).try_build()
}

/// Outcome of one error case
#[derive(Debug, Clone)]
pub struct ShorCaseOutcome {
    /// Injected error
    pub error: Option<InjectedError>,
    /// Raw result
    pub result: ExecutionResult,
    /// Fraction of shots returning the input
    pub success_rate: f64,
}

/// Shor code report over several error cases
#[derive(Debug, Clone)]
pub struct ShorCodeReport {
    /// Encoded state
    pub input: LogicalState,
    /// One entry per case
    pub cases: Vec<ShorCaseOutcome>,
}

/// Score one case
pub fn analyze(input: LogicalState, error: Option<InjectedError>, result: &ExecutionResult) -> ShorCaseOutcome {
    let expected = if input.expected_bit() { "1" } else { "0" };
    ShorCaseOutcome {
        error,
        result: result.clone(),
        success_rate: result.probability(expected),
    }
}

/// Run every case as one batch
/// Gantree: run(backend, input, cases, shots) -> ShorCodeReport // 실행
pub fn run(
    backend: &dyn Backend,
    input: LogicalState,
    cases: &[Option<InjectedError>],
    shots: u64,
) -> QdemoResult<ShorCodeReport> {
    if cases.is_empty() {
        return Err(QdemoError::InvalidParameter("no error cases given".into()));
    }
    let circuits = cases
        .iter()
        .map(|e| build_circuit(input, e.as_ref()))
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    Ok(ShorCodeReport {
        input,
        cases: cases
            .iter()
            .zip(&results)
            .map(|(e, r)| analyze(input, *e, r))
            .collect(),
    })
}

impl DemoReport for ShorCodeReport {
    fn title(&self) -> String {
        format!("Shor 9-qubit code ({})", self.input)
    }

    fn succeeded(&self) -> bool {
        self.cases.iter().all(|c| c.success_rate > 0.5)
    }
}

impl fmt::Display for ShorCodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SHOR'S 9-QUBIT CODE RESULTS")?;
        if let Some(first) = self.cases.first() {
            writeln!(f, "Backend: {}", first.result.metadata.backend)?;
            writeln!(f, "Shots per test: {}", first.result.shots)?;
        }
        let expected = u8::from(self.input.expected_bit());
        writeln!(
            f,
            "Input: {} (read in the {} basis, expected {})",
            self.input,
            self.input.basis(),
            expected
        )?;
        for case in &self.cases {
            writeln!(f)?;
            writeln!(f, "{}:", logical::describe(case.error.as_ref()))?;
            for key in ["0", "1"] {
                let count = case.result.count(key);
                writeln!(
                    f,
                    "  |{}⟩: {:5} ({:5.1}%)",
                    key,
                    count,
                    report::percent(count, case.result.shots)
                )?;
            }
            writeln!(
                f,
                "  Recovered input: {:.1}% {}",
                case.success_rate * 100.0,
                report::check(case.success_rate > 0.5)
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Logical states:")?;
        writeln!(f, "  |0⟩_L = (|000⟩+|111⟩)(|000⟩+|111⟩)(|000⟩+|111⟩)/2√2")?;
        writeln!(f, "  |1⟩_L = (|000⟩−|111⟩)(|000⟩−|111⟩)(|000⟩−|111⟩)/2√2")?;
        writeln!(f, "X errors are voted out inside a block, Z errors across blocks;")?;
        write!(f, "Y = iXZ triggers both corrections.")
    }
}
