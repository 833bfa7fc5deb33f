//! Quantum gate definitions for qdemo
//!
//! Gantree: L1_Circuit → Gate
//!
//! Gate enum covering the textbook gate set used by the demos, plus
//! measurement into classical bits, reset and classically conditioned
//! gates for dynamic circuits.

use crate::error::{QdemoError, QdemoResult};
use crate::types::{Angle, Basis, ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // 게이트 enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    /// Gantree: H(QubitId) // 하다마드
    H(QubitId),

    /// Pauli-X gate (NOT)
    /// Gantree: X(QubitId) // 파울리 X
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    /// Gantree: Z(QubitId) // 파울리 Z
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// SX-dagger gate
    Sxdg(QubitId),

    /// Identity gate
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    /// Gantree: Ry(QubitId, Angle) // Y 회전
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    /// Gantree: P(QubitId, Angle) // 위상
    P(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (control, target)
    /// Gantree: Cnot(QubitId, QubitId) // ctrl, tgt
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// Controlled-Y
    Cy(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Controlled phase (control, target, λ)
    /// Gantree: Cp(QubitId, QubitId, Angle) // 제어 위상
    Cp(QubitId, QubitId, Angle),

    /// Controlled-Rz
    Crz(QubitId, QubitId, Angle),

    /// Controlled-Rx
    Crx(QubitId, QubitId, Angle),

    /// Controlled-Ry
    Cry(QubitId, QubitId, Angle),

    /// ZZ interaction exp(-iθ/2 Z⊗Z)
    Rzz(QubitId, QubitId, Angle),

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================
    /// Toffoli (CCX)
    Ccx(QubitId, QubitId, QubitId),

    /// Controlled-SWAP (Fredkin)
    Cswap(QubitId, QubitId, QubitId),

    /// Multi-controlled X (controls, target)
    /// Gantree: Mcx(Vec<QubitId>, QubitId) // 다중 제어 X
    Mcx(Vec<QubitId>, QubitId),

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Measure qubit into classical bit
    /// Gantree: Measure(QubitId, ClbitId) // 측정
    Measure(QubitId, ClbitId),

    /// Reset qubit to |0⟩
    Reset(QubitId),

    /// Barrier (visual / scheduling fence)
    Barrier(Vec<QubitId>),

    /// Gate applied only when a classical bit equals `value`
    /// Gantree: CIf{{clbit,value,gate}} // 조건부 게이트
    CIf {
        /// Classical bit tested
        clbit: ClbitId,
        /// Required bit value
        value: bool,
        /// Conditioned unitary
        gate: Box<Gate>,
    },
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    /// Gantree: qubits(&self) -> Vec<QubitId> // 관련 큐비트
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Sxdg(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::P(q, _)
            | Gate::U(q, _, _, _)
            | Gate::Measure(q, _)
            | Gate::Reset(q) => vec![*q],

            Gate::Cnot(a, b)
            | Gate::Cz(a, b)
            | Gate::Cy(a, b)
            | Gate::Swap(a, b)
            | Gate::Cp(a, b, _)
            | Gate::Crz(a, b, _)
            | Gate::Crx(a, b, _)
            | Gate::Cry(a, b, _)
            | Gate::Rzz(a, b, _) => vec![*a, *b],

            Gate::Ccx(a, b, c) | Gate::Cswap(a, b, c) => vec![*a, *b, *c],

            Gate::Mcx(controls, target) => {
                let mut qs = controls.clone();
                qs.push(*target);
                qs
            }

            Gate::Barrier(qs) => qs.clone(),
            Gate::CIf { gate, .. } => gate.qubits(),
        }
    }

    /// Classical bits read or written by this gate
    pub fn clbits(&self) -> Vec<ClbitId> {
        match self {
            Gate::Measure(_, c) => vec![*c],
            Gate::CIf { clbit, .. } => vec![*clbit],
            _ => vec![],
        }
    }

    /// Check if gate is single-qubit unitary
    /// Gantree: is_single_qubit(&self) -> bool // 1Q 판별
    pub fn is_single_qubit(&self) -> bool {
        matches!(
            self,
            Gate::H(_)
                | Gate::X(_)
                | Gate::Y(_)
                | Gate::Z(_)
                | Gate::S(_)
                | Gate::Sdg(_)
                | Gate::T(_)
                | Gate::Tdg(_)
                | Gate::Sx(_)
                | Gate::Sxdg(_)
                | Gate::Id(_)
                | Gate::Rx(_, _)
                | Gate::Ry(_, _)
                | Gate::Rz(_, _)
                | Gate::P(_, _)
                | Gate::U(_, _, _, _)
        )
    }

    /// Check if gate is two-qubit unitary
    /// Gantree: is_two_qubit(&self) -> bool // 2Q 판별
    pub fn is_two_qubit(&self) -> bool {
        matches!(
            self,
            Gate::Cnot(_, _)
                | Gate::Cz(_, _)
                | Gate::Cy(_, _)
                | Gate::Swap(_, _)
                | Gate::Cp(_, _, _)
                | Gate::Crz(_, _, _)
                | Gate::Crx(_, _, _)
                | Gate::Cry(_, _, _)
                | Gate::Rzz(_, _, _)
        )
    }

    /// Check if gate acts on three or more qubits
    pub fn is_multi_qubit(&self) -> bool {
        matches!(self, Gate::Ccx(_, _, _) | Gate::Cswap(_, _, _) | Gate::Mcx(_, _))
    }

    /// Check if gate is parameterized
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self,
            Gate::Rx(_, _)
                | Gate::Ry(_, _)
                | Gate::Rz(_, _)
                | Gate::P(_, _)
                | Gate::U(_, _, _, _)
                | Gate::Cp(_, _, _)
                | Gate::Crz(_, _, _)
                | Gate::Crx(_, _, _)
                | Gate::Cry(_, _, _)
                | Gate::Rzz(_, _, _)
        )
    }

    /// Check if gate is a measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_, _))
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Check if gate is classically conditioned
    pub fn is_conditional(&self) -> bool {
        matches!(self, Gate::CIf { .. })
    }

    /// Check if gate is a unitary operation (barriers count as unitary)
    pub fn is_unitary(&self) -> bool {
        !matches!(self, Gate::Measure(_, _) | Gate::Reset(_) | Gate::CIf { .. })
    }

    /// Get gate name
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Sxdg(_) => "sxdg",
            Gate::Id(_) => "id",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::P(_, _) => "p",
            Gate::U(_, _, _, _) => "u",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Cy(_, _) => "cy",
            Gate::Swap(_, _) => "swap",
            Gate::Cp(_, _, _) => "cp",
            Gate::Crz(_, _, _) => "crz",
            Gate::Crx(_, _, _) => "crx",
            Gate::Cry(_, _, _) => "cry",
            Gate::Rzz(_, _, _) => "rzz",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Cswap(_, _, _) => "cswap",
            Gate::Mcx(_, _) => "mcx",
            Gate::Measure(_, _) => "measure",
            Gate::Reset(_) => "reset",
            Gate::Barrier(_) => "barrier",
            Gate::CIf { .. } => "if_else",
        }
    }

    // ========================================================================
    // Algebra
    // ========================================================================

    /// Inverse of a unitary gate
    /// Gantree: inverse(&self) -> Result<Gate> // 역연산
    pub fn inverse(&self) -> QdemoResult<Gate> {
        let inv = match self {
            Gate::H(_)
            | Gate::X(_)
            | Gate::Y(_)
            | Gate::Z(_)
            | Gate::Id(_)
            | Gate::Cnot(_, _)
            | Gate::Cz(_, _)
            | Gate::Cy(_, _)
            | Gate::Swap(_, _)
            | Gate::Ccx(_, _, _)
            | Gate::Cswap(_, _, _)
            | Gate::Mcx(_, _)
            | Gate::Barrier(_) => self.clone(),

            Gate::S(q) => Gate::Sdg(*q),
            Gate::Sdg(q) => Gate::S(*q),
            Gate::T(q) => Gate::Tdg(*q),
            Gate::Tdg(q) => Gate::T(*q),
            Gate::Sx(q) => Gate::Sxdg(*q),
            Gate::Sxdg(q) => Gate::Sx(*q),

            Gate::Rx(q, a) => Gate::Rx(*q, -a),
            Gate::Ry(q, a) => Gate::Ry(*q, -a),
            Gate::Rz(q, a) => Gate::Rz(*q, -a),
            Gate::P(q, a) => Gate::P(*q, -a),
            Gate::U(q, theta, phi, lambda) => Gate::U(*q, -theta, -lambda, -phi),

            Gate::Cp(c, t, a) => Gate::Cp(*c, *t, -a),
            Gate::Crz(c, t, a) => Gate::Crz(*c, *t, -a),
            Gate::Crx(c, t, a) => Gate::Crx(*c, *t, -a),
            Gate::Cry(c, t, a) => Gate::Cry(*c, *t, -a),
            Gate::Rzz(a, b, theta) => Gate::Rzz(*a, *b, -theta),

            Gate::Measure(_, _) | Gate::Reset(_) | Gate::CIf { .. } => {
                return Err(QdemoError::NonUnitary(self.name().to_string()))
            }
        };
        Ok(inv)
    }

    /// Euler angles (θ, φ, λ) of a single-qubit gate, equal to the gate
    /// up to a global phase
    /// Gantree: u3_params(&self) -> Option<(θ,φ,λ)> // 오일러 각
    pub fn u3_params(&self) -> Option<(Angle, Angle, Angle)> {
        let params = match self {
            Gate::H(_) => (FRAC_PI_2, 0.0, PI),
            Gate::X(_) => (PI, 0.0, PI),
            Gate::Y(_) => (PI, FRAC_PI_2, FRAC_PI_2),
            Gate::Z(_) => (0.0, 0.0, PI),
            Gate::S(_) => (0.0, 0.0, FRAC_PI_2),
            Gate::Sdg(_) => (0.0, 0.0, -FRAC_PI_2),
            Gate::T(_) => (0.0, 0.0, FRAC_PI_4),
            Gate::Tdg(_) => (0.0, 0.0, -FRAC_PI_4),
            Gate::Sx(_) => (FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2),
            Gate::Sxdg(_) => (FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2),
            Gate::Id(_) => (0.0, 0.0, 0.0),
            Gate::Rx(_, a) => (*a, -FRAC_PI_2, FRAC_PI_2),
            Gate::Ry(_, a) => (*a, 0.0, 0.0),
            Gate::Rz(_, a) | Gate::P(_, a) => (0.0, 0.0, *a),
            Gate::U(_, theta, phi, lambda) => (*theta, *phi, *lambda),
            _ => return None,
        };
        Some(params)
    }

    /// Same gate acting on remapped qubits
    pub fn remap(&self, map: impl Fn(QubitId) -> QubitId + Copy) -> Gate {
        match self {
            Gate::H(q) => Gate::H(map(*q)),
            Gate::X(q) => Gate::X(map(*q)),
            Gate::Y(q) => Gate::Y(map(*q)),
            Gate::Z(q) => Gate::Z(map(*q)),
            Gate::S(q) => Gate::S(map(*q)),
            Gate::Sdg(q) => Gate::Sdg(map(*q)),
            Gate::T(q) => Gate::T(map(*q)),
            Gate::Tdg(q) => Gate::Tdg(map(*q)),
            Gate::Sx(q) => Gate::Sx(map(*q)),
            Gate::Sxdg(q) => Gate::Sxdg(map(*q)),
            Gate::Id(q) => Gate::Id(map(*q)),
            Gate::Rx(q, a) => Gate::Rx(map(*q), *a),
            Gate::Ry(q, a) => Gate::Ry(map(*q), *a),
            Gate::Rz(q, a) => Gate::Rz(map(*q), *a),
            Gate::P(q, a) => Gate::P(map(*q), *a),
            Gate::U(q, t, p, l) => Gate::U(map(*q), *t, *p, *l),
            Gate::Cnot(a, b) => Gate::Cnot(map(*a), map(*b)),
            Gate::Cz(a, b) => Gate::Cz(map(*a), map(*b)),
            Gate::Cy(a, b) => Gate::Cy(map(*a), map(*b)),
            Gate::Swap(a, b) => Gate::Swap(map(*a), map(*b)),
            Gate::Cp(a, b, l) => Gate::Cp(map(*a), map(*b), *l),
            Gate::Crz(a, b, t) => Gate::Crz(map(*a), map(*b), *t),
            Gate::Crx(a, b, t) => Gate::Crx(map(*a), map(*b), *t),
            Gate::Cry(a, b, t) => Gate::Cry(map(*a), map(*b), *t),
            Gate::Rzz(a, b, t) => Gate::Rzz(map(*a), map(*b), *t),
            Gate::Ccx(a, b, c) => Gate::Ccx(map(*a), map(*b), map(*c)),
            Gate::Cswap(a, b, c) => Gate::Cswap(map(*a), map(*b), map(*c)),
            Gate::Mcx(cs, t) => Gate::Mcx(cs.iter().map(|&c| map(c)).collect(), map(*t)),
            Gate::Measure(q, c) => Gate::Measure(map(*q), *c),
            Gate::Reset(q) => Gate::Reset(map(*q)),
            Gate::Barrier(qs) => Gate::Barrier(qs.iter().map(|&q| map(q)).collect()),
            Gate::CIf { clbit, value, gate } => Gate::CIf {
                clbit: *clbit,
                value: *value,
                gate: Box::new(gate.remap(map)),
            },
        }
    }

    // ========================================================================
    // OpenQASM 3
    // ========================================================================

    /// Convert to an OpenQASM 3 statement over register `q` / `c`
    /// Gantree: to_qasm3(&self) -> String // QASM3 변환
    pub fn to_qasm3(&self) -> String {
        match self {
            Gate::Rx(q, a) | Gate::Ry(q, a) | Gate::Rz(q, a) | Gate::P(q, a) => {
                format!("{}({}) q[{}];", self.name(), a, q)
            }
            Gate::U(q, theta, phi, lambda) => {
                format!("U({}, {}, {}) q[{}];", theta, phi, lambda, q)
            }
            Gate::Cp(a, b, t)
            | Gate::Crz(a, b, t)
            | Gate::Crx(a, b, t)
            | Gate::Cry(a, b, t)
            | Gate::Rzz(a, b, t) => format!("{}({}) q[{}], q[{}];", self.name(), t, a, b),
            Gate::Mcx(controls, target) => {
                let mut operands: Vec<String> =
                    controls.iter().map(|c| format!("q[{}]", c)).collect();
                operands.push(format!("q[{}]", target));
                format!("ctrl({}) @ x {};", controls.len(), operands.join(", "))
            }
            Gate::Measure(q, c) => format!("c[{}] = measure q[{}];", c, q),
            Gate::Barrier(qs) => {
                if qs.is_empty() {
                    "barrier q;".to_string()
                } else {
                    let operands: Vec<String> = qs.iter().map(|q| format!("q[{}]", q)).collect();
                    format!("barrier {};", operands.join(", "))
                }
            }
            Gate::CIf { clbit, value, gate } => {
                let cond = if *value {
                    format!("c[{}]", clbit)
                } else {
                    format!("!c[{}]", clbit)
                };
                format!("if ({}) {{ {} }}", cond, gate.to_qasm3())
            }
            _ => {
                let operands: Vec<String> =
                    self.qubits().iter().map(|q| format!("q[{}]", q)).collect();
                format!("{} {};", self.name(), operands.join(", "))
            }
        }
    }

    // ========================================================================
    // Basis Transformation Helpers
    // ========================================================================

    /// Gates rotating `basis` onto the computational basis before measurement
    /// X basis: H
    /// Y basis: Sdg, H
    /// Z basis: (none)
    pub fn basis_transform(qubit: QubitId, basis: Basis) -> Vec<Gate> {
        match basis {
            Basis::X => vec![Gate::H(qubit)],
            Basis::Y => vec![Gate::Sdg(qubit), Gate::H(qubit)],
            Basis::Z => vec![],
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm3())
    }
}

// ============================================================================
// Tests
// ============================================================================
