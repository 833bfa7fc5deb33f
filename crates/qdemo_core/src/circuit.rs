//! Quantum circuit structure for qdemo
//!
//! Gantree: L1_Circuit → Circuit
//!
//! Gate sequence over a quantum register `q` and a classical register
//! `c`, with validation, composition, inversion and OpenQASM 3 output.

use crate::error::{QdemoError, QdemoResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Quantum circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    /// Gantree: num_qubits: usize // 큐비트 수
    num_qubits: usize,

    /// Number of classical bits
    /// Gantree: num_clbits: usize // 고전 비트 수
    num_clbits: usize,

    /// Gate sequence
    /// Gantree: gates: Vec<Gate> // 게이트 목록
    gates: Vec<Gate>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit
    /// Gantree: new(n, m) -> Self // 생성자
    pub fn new(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, num_clbits: usize, name: impl Into<String>) -> Self {
        Self {
            num_qubits,
            num_clbits,
            gates: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, num_clbits: usize, gates: Vec<Gate>) -> QdemoResult<Self> {
        let mut circuit = Self::new(num_qubits, num_clbits);
        circuit.add_gates(gates)?;
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Add a gate to the circuit
    /// Gantree: add_gate(&mut, Gate) -> Result // 게이트 추가
    pub fn add_gate(&mut self, gate: Gate) -> QdemoResult<()> {
        self.check_gate(&gate)?;
        self.gates.push(gate);
        Ok(())
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> QdemoResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    /// Grow the classical register to at least `n` bits
    pub fn ensure_clbits(&mut self, n: usize) {
        self.num_clbits = self.num_clbits.max(n);
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get number of classical bits
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Append `other` onto this circuit, qubit i → qubit i
    /// Gantree: compose(&mut, &Circuit) -> Result // 합성
    pub fn compose(&mut self, other: &Circuit) -> QdemoResult<()> {
        if other.num_qubits > self.num_qubits {
            return Err(QdemoError::ComposeMismatch(format!(
                "{} qubits into {}",
                other.num_qubits, self.num_qubits
            )));
        }
        self.ensure_clbits(other.num_clbits);
        self.add_gates(other.gates.iter().cloned())
    }

    /// Append `other` with its qubit i placed on `qubits[i]`
    pub fn compose_on(&mut self, other: &Circuit, qubits: &[QubitId]) -> QdemoResult<()> {
        if qubits.len() != other.num_qubits {
            return Err(QdemoError::ComposeMismatch(format!(
                "mapping lists {} qubits, circuit has {}",
                qubits.len(),
                other.num_qubits
            )));
        }
        self.ensure_clbits(other.num_clbits);
        for gate in &other.gates {
            let mapped = gate.remap(|q| qubits.get(q).copied().unwrap_or(usize::MAX));
            self.add_gate(mapped)?;
        }
        Ok(())
    }

    /// Inverse circuit (reversed order, each gate inverted)
    /// Gantree: inverse(&self) -> Result<Circuit> // 역회로
    pub fn inverse(&self) -> QdemoResult<Circuit> {
        let gates = self
            .gates
            .iter()
            .rev()
            .map(Gate::inverse)
            .collect::<QdemoResult<Vec<_>>>()?;
        Ok(Circuit {
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            gates,
            name: self.name.as_ref().map(|n| format!("{}_dg", n)),
        })
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (longest path); barriers are not counted
    /// Gantree: depth(&self) -> usize // 깊이 계산
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];
        let mut clbit_depths = vec![0usize; self.num_clbits];

        for gate in self.gates.iter().filter(|g| !g.is_barrier()) {
            let qubits = gate.qubits();
            let clbits = gate.clbits();
            let level = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .chain(clbits.iter().filter_map(|&c| clbit_depths.get(c)))
                .max()
                .copied()
                .unwrap_or(0)
                + 1;
            for q in qubits {
                if let Some(d) = qubit_depths.get_mut(q) {
                    *d = level;
                }
            }
            for c in clbits {
                if let Some(d) = clbit_depths.get_mut(c) {
                    *d = level;
                }
            }
        }

        qubit_depths
            .into_iter()
            .chain(clbit_depths)
            .max()
            .unwrap_or(0)
    }

    /// Get total gate count
    /// Gantree: gate_count(&self) -> usize // 게이트 수
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Count single-qubit gates
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count gates acting on three or more qubits
    pub fn count_multi(&self) -> usize {
        self.gates.iter().filter(|g| g.is_multi_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Operation counts by name, sorted by name
    pub fn count_ops(&self) -> BTreeMap<&'static str, usize> {
        let mut ops = BTreeMap::new();
        for gate in &self.gates {
            *ops.entry(gate.name()).or_insert(0) += 1;
        }
        ops
    }

    /// Get qubits used in the circuit
    pub fn used_qubits(&self) -> HashSet<QubitId> {
        self.gates.iter().flat_map(|g| g.qubits()).collect()
    }

    /// True if any qubit is operated on after being measured, or any
    /// gate is classically conditioned
    /// Gantree: has_mid_circuit_measurement(&self) -> bool // 중간 측정
    pub fn has_mid_circuit_measurement(&self) -> bool {
        let mut measured: HashSet<QubitId> = HashSet::new();
        for gate in &self.gates {
            match gate {
                Gate::CIf { .. } => return true,
                Gate::Measure(q, _) => {
                    measured.insert(*q);
                }
                Gate::Barrier(_) => {}
                other => {
                    if other.qubits().iter().any(|q| measured.contains(q)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn check_gate(&self, gate: &Gate) -> QdemoResult<()> {
        let qubits = gate.qubits();
        for (i, &qubit) in qubits.iter().enumerate() {
            if qubit >= self.num_qubits {
                return Err(QdemoError::GateQubitMismatch {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
            if !gate.is_barrier() && qubits[..i].contains(&qubit) {
                return Err(QdemoError::DuplicateQubit {
                    gate: gate.name().to_string(),
                    qubit,
                });
            }
        }
        for clbit in gate.clbits() {
            if clbit >= self.num_clbits {
                return Err(QdemoError::ClbitOutOfRange {
                    clbit,
                    num_clbits: self.num_clbits,
                });
            }
        }
        if let Gate::CIf { gate: body, .. } = gate {
            if !body.is_unitary() || body.is_barrier() {
                return Err(QdemoError::Unsupported(format!(
                    "conditional body '{}'",
                    body.name()
                )));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Convert to an OpenQASM 3 program over virtual registers
    /// Gantree: to_qasm3(&self) -> String // QASM3 출력
    pub fn to_qasm3(&self) -> String {
        let mut lines = vec![
            "OPENQASM 3.0;".to_string(),
            "include \"stdgates.inc\";".to_string(),
        ];

        let ops = self.count_ops();
        let conditional_names: HashSet<&str> = self
            .gates
            .iter()
            .filter_map(|g| match g {
                Gate::CIf { gate, .. } => Some(gate.name()),
                _ => None,
            })
            .collect();
        let uses = |name: &str| ops.contains_key(name) || conditional_names.contains(name);
        if uses("rzz") {
            lines.push("gate rzz(theta) a, b { cx a, b; rz(theta) b; cx a, b; }".to_string());
        }
        if uses("sxdg") {
            lines.push("gate sxdg a { h a; sdg a; h a; }".to_string());
        }

        lines.push(format!("qubit[{}] q;", self.num_qubits));
        if self.num_clbits > 0 {
            lines.push(format!("bit[{}] c;", self.num_clbits));
        }

        lines.extend(self.gates.iter().map(Gate::to_qasm3));
        lines.join("\n")
    }

    /// Textual listing: one line per operation, numbered
    /// Gantree: draw(&self) -> String // 텍스트 출력
    pub fn draw(&self) -> String {
        let mut out = format!(
            "{} [{} qubits, {} clbits, depth {}]\n",
            self.name.as_deref().unwrap_or("circuit"),
            self.num_qubits,
            self.num_clbits,
            self.depth()
        );
        for (i, gate) in self.gates.iter().enumerate() {
            out.push_str(&format!("{:>4}: {}\n", i, gate.to_qasm3()));
        }
        out
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} clbits, {} gates)",
            self.num_qubits,
            self.num_clbits,
            self.gates.len()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_new() {
        let circuit = Circuit::new(5, 2);
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 2);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_add_gate_validation() {
        let mut circuit = Circuit::new(3, 1);
        assert!(circuit.add_gate(Gate::H(0)).is_ok());
        assert!(matches!(
            circuit.add_gate(Gate::H(5)),
            Err(QdemoError::GateQubitMismatch { .. })
        ));
        assert!(matches!(
            circuit.add_gate(Gate::Measure(0, 1)),
            Err(QdemoError::ClbitOutOfRange { .. })
        ));
        assert!(matches!(
            circuit.add_gate(Gate::Cnot(1, 1)),
            Err(QdemoError::DuplicateQubit { .. })
        ));
        assert!(circuit
            .add_gate(Gate::CIf {
                clbit: 0,
                value: true,
                gate: Box::new(Gate::Measure(1, 0)),
            })
            .is_err());
    }

    #[test]
    fn test_circuit_depth() {
        let circuit = Circuit::from_gates(
            3,
            0,
            vec![Gate::H(0), Gate::H(1), Gate::Cnot(0, 1), Gate::H(2)],
        )
        .unwrap();
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_depth_tracks_classical_dependency() {
        let circuit = Circuit::from_gates(
            2,
            1,
            vec![
                Gate::Measure(0, 0),
                Gate::CIf {
                    clbit: 0,
                    value: true,
                    gate: Box::new(Gate::X(1)),
                },
            ],
        )
        .unwrap();
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_inverse() {
        let circuit =
            Circuit::from_gates(2, 0, vec![Gate::H(0), Gate::Cp(0, 1, 0.5), Gate::S(1)]).unwrap();
        let inv = circuit.inverse().unwrap();
        assert_eq!(
            inv.gates(),
            &[Gate::Sdg(1), Gate::Cp(0, 1, -0.5), Gate::H(0)]
        );

        let measured = Circuit::from_gates(1, 1, vec![Gate::Measure(0, 0)]).unwrap();
        assert!(measured.inverse().is_err());
    }

    #[test]
    fn test_compose_on() {
        let sub = Circuit::from_gates(2, 0, vec![Gate::Cnot(0, 1)]).unwrap();
        let mut circuit = Circuit::new(4, 0);
        circuit.compose_on(&sub, &[3, 1]).unwrap();
        assert_eq!(circuit.gates(), &[Gate::Cnot(3, 1)]);

        let mut small = Circuit::new(1, 0);
        assert!(small.compose(&sub).is_err());
    }

    #[test]
    fn test_mid_circuit_measurement() {
        let terminal = Circuit::from_gates(
            2,
            2,
            vec![Gate::H(0), Gate::Measure(0, 0), Gate::Measure(1, 1)],
        )
        .unwrap();
        assert!(!terminal.has_mid_circuit_measurement());

        let mid = Circuit::from_gates(1, 1, vec![Gate::Measure(0, 0), Gate::H(0)]).unwrap();
        assert!(mid.has_mid_circuit_measurement());
    }

    #[test]
    fn test_to_qasm3() {
        let circuit = Circuit::from_gates(
            2,
            2,
            vec![
                Gate::H(0),
                Gate::Rzz(0, 1, 0.5),
                Gate::Measure(0, 0),
                Gate::Measure(1, 1),
            ],
        )
        .unwrap();

        let qasm = circuit.to_qasm3();
        assert!(qasm.starts_with("OPENQASM 3.0;"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("gate rzz(theta)"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn test_count_ops() {
        let circuit =
            Circuit::from_gates(2, 0, vec![Gate::H(0), Gate::H(1), Gate::Cnot(0, 1)]).unwrap();
        let ops = circuit.count_ops();
        assert_eq!(ops.get("h"), Some(&2));
        assert_eq!(ops.get("cx"), Some(&1));
        assert!(circuit.draw().contains("cx q[0], q[1];"));
    }
}
