//! Dense statevector
//!
//! Gantree: L2_Backend → StateVector
//!
//! Amplitude `i` holds basis state |i⟩ with qubit `q` as bit `q` of `i`
//! (little-endian, matching the classical register order).

use num_complex::Complex64;
use qdemo_core::{Circuit, Gate, QdemoError, QdemoResult, QubitId};
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

/// Largest register the dense simulator accepts
pub const MAX_QUBITS: usize = 24;

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Complex statevector over `n` qubits
/// Gantree: StateVector // 상태 벡터
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amps: Vec<Complex64>,
}

impl StateVector {
    /// |0…0⟩ on `num_qubits` qubits
    /// Gantree: new(n) -> Result<Self> // 초기 상태
    pub fn new(num_qubits: usize) -> QdemoResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(QdemoError::QubitOutOfRange {
                qubit: num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amps = vec![ZERO; 1 << num_qubits];
        amps[0] = ONE;
        Ok(Self { num_qubits, amps })
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Raw amplitudes
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    /// Born-rule probabilities of every basis state
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Probability that `qubit` reads 1
    pub fn probability_one(&self, qubit: QubitId) -> f64 {
        let mask = 1usize << qubit;
        self.amps
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    // ========================================================================
    // Unitary Evolution
    // ========================================================================

    /// Apply a unitary gate; measurement, reset and conditionals are
    /// handled by the caller
    /// Gantree: apply(&mut, Gate) -> Result // 게이트 적용
    pub fn apply(&mut self, gate: &Gate) -> QdemoResult<()> {
        if let Some(m) = single_qubit_matrix(gate) {
            let q = gate.qubits()[0];
            self.apply_controlled(0, q, &m);
            return Ok(());
        }

        match gate {
            Gate::Cnot(c, t) => self.apply_controlled(1 << c, *t, &pauli_x()),
            Gate::Cz(c, t) => self.apply_controlled(1 << c, *t, &diag(ONE, -ONE)),
            Gate::Cy(c, t) => self.apply_controlled(1 << c, *t, &pauli_y()),
            Gate::Cp(c, t, l) => self.apply_controlled(1 << c, *t, &phase(*l)),
            Gate::Crz(c, t, a) => self.apply_controlled(1 << c, *t, &rz(*a)),
            Gate::Crx(c, t, a) => self.apply_controlled(1 << c, *t, &rx(*a)),
            Gate::Cry(c, t, a) => self.apply_controlled(1 << c, *t, &ry(*a)),
            Gate::Ccx(c1, c2, t) => self.apply_controlled((1 << c1) | (1 << c2), *t, &pauli_x()),
            Gate::Mcx(controls, t) => {
                let mask = controls.iter().fold(0usize, |m, c| m | (1 << c));
                self.apply_controlled(mask, *t, &pauli_x())
            }
            Gate::Swap(a, b) => self.apply_controlled_swap(0, *a, *b),
            Gate::Cswap(c, a, b) => self.apply_controlled_swap(1 << c, *a, *b),
            Gate::Rzz(a, b, theta) => self.apply_rzz(*a, *b, *theta),
            Gate::Barrier(_) => {}
            Gate::Measure(_, _) | Gate::Reset(_) | Gate::CIf { .. } => {
                return Err(QdemoError::NonUnitary(gate.name().to_string()))
            }
            // single-qubit gates are handled above
            _ => return Err(QdemoError::InternalError(format!("no matrix for {}", gate))),
        }
        Ok(())
    }

    /// Apply a 2×2 matrix to `target` on every basis state whose bits in
    /// `control_mask` are all set
    fn apply_controlled(&mut self, control_mask: usize, target: QubitId, m: &Matrix2) {
        let tmask = 1usize << target;
        for i in 0..self.amps.len() {
            if i & tmask == 0 && i & control_mask == control_mask {
                let j = i | tmask;
                let (a, b) = (self.amps[i], self.amps[j]);
                self.amps[i] = m[0][0] * a + m[0][1] * b;
                self.amps[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_controlled_swap(&mut self, control_mask: usize, a: QubitId, b: QubitId) {
        let (ma, mb) = (1usize << a, 1usize << b);
        for i in 0..self.amps.len() {
            // visit each pair once, from the |..1_a..0_b..⟩ side
            if i & control_mask == control_mask && i & ma != 0 && i & mb == 0 {
                self.amps.swap(i, i ^ ma ^ mb);
            }
        }
    }

    fn apply_rzz(&mut self, a: QubitId, b: QubitId, theta: f64) {
        let same = Complex64::from_polar(1.0, -theta / 2.0);
        let diff = Complex64::from_polar(1.0, theta / 2.0);
        let (ma, mb) = (1usize << a, 1usize << b);
        for (i, amp) in self.amps.iter_mut().enumerate() {
            let parity = ((i & ma != 0) as u8) ^ ((i & mb != 0) as u8);
            *amp *= if parity == 0 { same } else { diff };
        }
    }

    // ========================================================================
    // Non-Unitary Operations
    // ========================================================================

    /// Projective Z measurement of `qubit`; collapses the state
    /// Gantree: measure(&mut, q, rng) -> bool // 측정 붕괴
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: QubitId, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.gen::<f64>() < p1;
        let norm = if outcome { p1 } else { 1.0 - p1 };
        let scale = if norm > 0.0 { 1.0 / norm.sqrt() } else { 0.0 };
        let mask = 1usize << qubit;
        for (i, amp) in self.amps.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp *= scale;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset `qubit` to |0⟩ (measure, flip if 1)
    pub fn reset<R: Rng + ?Sized>(&mut self, qubit: QubitId, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_controlled(0, qubit, &pauli_x());
        }
    }
}

/// Exact measurement-free distribution of a circuit's qubits.
///
/// Terminal measurements and barriers are skipped; reset, conditionals and
/// operations after a measurement are rejected.
/// Gantree: exact_probabilities(&Circuit) -> Result<Vec<f64>> // 정확 분포
pub fn exact_probabilities(circuit: &Circuit) -> QdemoResult<Vec<f64>> {
    if circuit.has_mid_circuit_measurement() {
        return Err(QdemoError::Unsupported(
            "exact probabilities of a dynamic circuit".into(),
        ));
    }
    let mut state = StateVector::new(circuit.num_qubits())?;
    for gate in circuit.gates() {
        if !gate.is_measurement() {
            state.apply(gate)?;
        }
    }
    Ok(state.probabilities())
}

// ============================================================================
// Gate Matrices
// ============================================================================

fn diag(a: Complex64, b: Complex64) -> Matrix2 {
    [[a, ZERO], [ZERO, b]]
}

fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn pauli_y() -> Matrix2 {
    [[ZERO, -I], [I, ZERO]]
}

fn phase(lambda: f64) -> Matrix2 {
    diag(ONE, Complex64::from_polar(1.0, lambda))
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    diag(
        Complex64::from_polar(1.0, -theta / 2.0),
        Complex64::from_polar(1.0, theta / 2.0),
    )
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
        ],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// Exact matrix of a single-qubit gate (global phase included)
fn single_qubit_matrix(gate: &Gate) -> Option<Matrix2> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let sx_a = Complex64::new(0.5, 0.5);
    let sx_b = Complex64::new(0.5, -0.5);
    let m = match gate {
        Gate::H(_) => [[h, h], [h, -h]],
        Gate::X(_) => pauli_x(),
        Gate::Y(_) => pauli_y(),
        Gate::Z(_) => diag(ONE, -ONE),
        Gate::S(_) => diag(ONE, I),
        Gate::Sdg(_) => diag(ONE, -I),
        Gate::T(_) => phase(FRAC_PI_4),
        Gate::Tdg(_) => phase(-FRAC_PI_4),
        Gate::Sx(_) => [[sx_a, sx_b], [sx_b, sx_a]],
        Gate::Sxdg(_) => [[sx_b, sx_a], [sx_a, sx_b]],
        Gate::Id(_) => diag(ONE, ONE),
        Gate::Rx(_, a) => rx(*a),
        Gate::Ry(_, a) => ry(*a),
        Gate::Rz(_, a) => rz(*a),
        Gate::P(_, l) => phase(*l),
        Gate::U(_, t, p, l) => u(*t, *p, *l),
        _ => return None,
    };
    Some(m)
}

// ============================================================================
// Tests
// ============================================================================
