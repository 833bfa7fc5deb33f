//! Circuit builder for qdemo
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent builder for demo circuits. Invalid operations do not panic
//! mid-chain; the first error is kept and reported by `try_build`.

use crate::circuit::Circuit;
use crate::error::{QdemoError, QdemoResult};
use crate::gate::Gate;
use crate::types::{Angle, ClbitId, PauliString, QubitId};

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // 빌더 패턴
pub struct CircuitBuilder {
    /// Internal circuit being built
    /// Gantree: circuit: Circuit // 내부 회로
    circuit: Circuit,

    /// First error raised while building
    error: Option<QdemoError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a builder with no classical bits
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits, 0),
            error: None,
        }
    }

    /// Create a builder with a classical register of `num_clbits`
    pub fn with_clbits(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits, num_clbits),
            error: None,
        }
    }

    /// Set circuit name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.circuit.set_name(name);
        self
    }

    /// Append an arbitrary gate
    /// Gantree: gate(self, Gate) -> Self // 게이트 추가
    pub fn gate(mut self, gate: Gate) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.add_gate(gate) {
                self.error = Some(e);
            }
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    /// Gantree: h(self, q) -> Self // H 추가
    pub fn h(self, qubit: QubitId) -> Self {
        self.gate(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    /// Gantree: x(self, q) -> Self // X 추가
    pub fn x(self, qubit: QubitId) -> Self {
        self.gate(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.gate(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.gate(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.gate(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sdg(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.gate(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Tdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sx(qubit))
    }

    /// Add SX-dagger gate
    pub fn sxdg(self, qubit: QubitId) -> Self {
        self.gate(Gate::Sxdg(qubit))
    }

    /// Add identity gate
    pub fn id(self, qubit: QubitId) -> Self {
        self.gate(Gate::Id(qubit))
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    /// Gantree: ry(self, q, a) -> Self // Ry 추가
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rz(qubit, angle))
    }

    /// Add phase gate
    pub fn p(self, qubit: QubitId, lambda: Angle) -> Self {
        self.gate(Gate::P(qubit, lambda))
    }

    /// Add U gate (general single-qubit)
    pub fn u(self, qubit: QubitId, theta: Angle, phi: Angle, lambda: Angle) -> Self {
        self.gate(Gate::U(qubit, theta, phi, lambda))
    }

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    /// Gantree: cx(self, c, t) -> Self // CNOT 추가
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cnot(control, target))
    }

    /// Alias for cx
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.cx(control, target)
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cz(control, target))
    }

    /// Add CY gate
    pub fn cy(self, control: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Cy(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.gate(Gate::Swap(qubit1, qubit2))
    }

    /// Add controlled phase
    /// Gantree: cp(self, c, t, λ) -> Self // CP 추가
    pub fn cp(self, control: QubitId, target: QubitId, lambda: Angle) -> Self {
        self.gate(Gate::Cp(control, target, lambda))
    }

    /// Add controlled Rz
    pub fn crz(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Crz(control, target, angle))
    }

    /// Add controlled Rx
    pub fn crx(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Crx(control, target, angle))
    }

    /// Add controlled Ry
    pub fn cry(self, control: QubitId, target: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Cry(control, target, angle))
    }

    /// Add ZZ rotation
    pub fn rzz(self, a: QubitId, b: QubitId, angle: Angle) -> Self {
        self.gate(Gate::Rzz(a, b, angle))
    }

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================

    /// Add Toffoli (CCX) gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.gate(Gate::Ccx(c1, c2, target))
    }

    /// Add Fredkin (CSWAP) gate
    pub fn cswap(self, control: QubitId, t1: QubitId, t2: QubitId) -> Self {
        self.gate(Gate::Cswap(control, t1, t2))
    }

    /// Add multi-controlled X, picking X / CX / CCX for small control sets
    /// Gantree: mcx(self, cs, t) -> Self // 다중 제어 X
    pub fn mcx(self, controls: &[QubitId], target: QubitId) -> Self {
        match controls {
            [] => self.x(target),
            [c] => self.cx(*c, target),
            [c1, c2] => self.ccx(*c1, *c2, target),
            _ => self.gate(Gate::Mcx(controls.to_vec(), target)),
        }
    }

    /// Phase flip on |1…1⟩ of `qubits` (Z / CZ / H·MCX·H on the last)
    /// Gantree: mcz(self, qs) -> Self // 다중 제어 Z
    pub fn mcz(self, qubits: &[QubitId]) -> Self {
        match qubits {
            [] => self,
            [q] => self.z(*q),
            [a, b] => self.cz(*a, *b),
            [controls @ .., target] => self.h(*target).mcx(controls, *target).h(*target),
        }
    }

    // ========================================================================
    // Measurement and Control
    // ========================================================================

    /// Measure `qubit` into classical bit `clbit`
    /// Gantree: measure(self, q, c) -> Self // 측정 추가
    pub fn measure(self, qubit: QubitId, clbit: ClbitId) -> Self {
        self.gate(Gate::Measure(qubit, clbit))
    }

    /// Measure every qubit, q_i → c_i, growing the register to n bits
    /// Gantree: measure_all(self) -> Self // 전체 측정
    pub fn measure_all(mut self) -> Self {
        let n = self.circuit.num_qubits();
        self.circuit.ensure_clbits(n);
        (0..n).fold(self, |b, q| b.measure(q, q))
    }

    /// Measure `qubits[i]` → c_i, growing the register as needed
    pub fn measure_qubits(mut self, qubits: &[QubitId]) -> Self {
        self.circuit.ensure_clbits(qubits.len());
        qubits
            .iter()
            .enumerate()
            .fold(self, |b, (c, &q)| b.measure(q, c))
    }

    /// Apply `gate` only when classical bit `clbit` equals `value`
    /// Gantree: c_if(self, c, v, Gate) -> Self // 조건부 게이트
    pub fn c_if(self, clbit: ClbitId, value: bool, gate: Gate) -> Self {
        self.gate(Gate::CIf {
            clbit,
            value,
            gate: Box::new(gate),
        })
    }

    /// Add reset
    pub fn reset(self, qubit: QubitId) -> Self {
        self.gate(Gate::Reset(qubit))
    }

    /// Add barrier across all qubits
    /// Gantree: barrier(self) -> Self // 배리어
    pub fn barrier(self) -> Self {
        let qubits: Vec<QubitId> = (0..self.circuit.num_qubits()).collect();
        self.gate(Gate::Barrier(qubits))
    }

    /// Add barrier on specific qubits
    pub fn barrier_on(self, qubits: &[QubitId]) -> Self {
        self.gate(Gate::Barrier(qubits.to_vec()))
    }

    // ========================================================================
    // Layer Operations
    // ========================================================================

    /// Add Hadamard on every qubit
    pub fn h_layer(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self, |b, q| b.h(q))
    }

    /// Add Hadamard on listed qubits
    pub fn h_on(self, qubits: &[QubitId]) -> Self {
        qubits.iter().fold(self, |b, &q| b.h(q))
    }

    /// Add X on every qubit
    pub fn x_layer(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self, |b, q| b.x(q))
    }

    /// Add X on listed qubits
    pub fn x_on(self, qubits: &[QubitId]) -> Self {
        qubits.iter().fold(self, |b, &q| b.x(q))
    }

    /// Add Ry rotation on qubit i for each `angles[i]`
    pub fn ry_layer(self, angles: &[Angle]) -> Self {
        let n = self.circuit.num_qubits().min(angles.len());
        (0..n).fold(self, |b, q| b.ry(q, angles[q]))
    }

    /// Add CX(i, i+1) chain
    pub fn cx_chain(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n.saturating_sub(1)).fold(self, |b, q| b.cx(q, q + 1))
    }

    /// Rotate each qubit so that measuring Z reads the Pauli on it;
    /// character i of `pauli` acts on qubit i
    /// Gantree: apply_pauli_basis(self, PauliString) -> Self // 기저 변환
    pub fn apply_pauli_basis(self, pauli: &PauliString) -> Self {
        pauli
            .iter()
            .enumerate()
            .filter_map(|(q, p)| p.basis().map(|b| (q, b)))
            .flat_map(|(q, b)| Gate::basis_transform(q, b))
            .fold(self, |b, g| b.gate(g))
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Append a sub-circuit on the same qubit indices
    /// Gantree: append(self, &Circuit) -> Self // 서브회로
    pub fn append(mut self, other: &Circuit) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.compose(other) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Append a sub-circuit, its qubit i placed on `qubits[i]`
    pub fn append_on(mut self, other: &Circuit, qubits: &[QubitId]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.circuit.compose_on(other, qubits) {
                self.error = Some(e);
            }
        }
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build, discarding any recorded error
    /// Gantree: build(self) -> Circuit // 빌드
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Build, returning the first error raised while building
    pub fn try_build(self) -> QdemoResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Get reference to current circuit state
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }
}

// ============================================================================
// Tests
// ============================================================================
