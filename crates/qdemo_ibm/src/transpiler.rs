//! ISA lowering for IBM backends
//!
//! Gantree: L3_Ibm → Transpiler
//!
//! IBM only accepts circuits already expressed in a backend's instruction
//! set. This pass places virtual qubits on a connected chain, inserts SWAPs
//! along shortest paths for non-adjacent pairs, rewrites every gate into
//! `rz`/`sx`/`x` plus the native entangler, and prints OpenQASM 3 over
//! physical qubits. It does not optimize.

use crate::client::BackendConfig;
use qdemo_core::{tolerance, Angle, Circuit, ClbitId, Gate, QdemoError, QdemoResult, QubitId, Topology};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write;

/// Default basis when a backend reports none
pub const IBM_BASIS_GATES: &[&str] = &["id", "rz", "sx", "x", "cx"];

/// Native two-qubit gate
/// Gantree: Entangler // 네이티브 2큐비트 게이트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entangler {
    /// CNOT (older Falcon devices)
    Cx,
    /// Controlled-Z (Heron)
    Cz,
    /// Echoed cross-resonance (Eagle)
    Ecr,
}

impl Entangler {
    /// Gate name in the basis list
    pub fn name(&self) -> &'static str {
        match self {
            Entangler::Cx => "cx",
            Entangler::Cz => "cz",
            Entangler::Ecr => "ecr",
        }
    }

    /// Pick the entangler from a basis list, preferring cx, then cz, then ecr
    pub fn from_basis(basis: &[String]) -> QdemoResult<Self> {
        [Entangler::Cx, Entangler::Cz, Entangler::Ecr]
            .into_iter()
            .find(|e| basis.iter().any(|g| g == e.name()))
            .ok_or_else(|| {
                QdemoError::Unsupported(format!("no supported entangler in basis {:?}", basis))
            })
    }
}

/// Transpiler configuration
#[derive(Debug, Clone)]
pub struct TranspilerConfig {
    /// Target basis gates
    pub basis_gates: Vec<String>,

    /// Directed couplings; `None` means all-to-all
    pub coupling_map: Option<Vec<(QubitId, QubitId)>>,

    /// Physical qubits on the target
    pub num_qubits: usize,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            basis_gates: IBM_BASIS_GATES.iter().map(|s| s.to_string()).collect(),
            coupling_map: None,
            num_qubits: 127,
        }
    }
}

impl TranspilerConfig {
    /// Config for a backend with a known coupling map
    pub fn for_backend(num_qubits: usize, coupling_map: Vec<(QubitId, QubitId)>) -> Self {
        Self {
            num_qubits,
            coupling_map: Some(coupling_map),
            ..Default::default()
        }
    }

    /// Replace the basis gates
    pub fn with_basis(mut self, basis: &[&str]) -> Self {
        self.basis_gates = basis.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Derive from a backend's configuration
    pub fn from_backend_config(config: &BackendConfig) -> Self {
        let mut out = Self::default();
        if let Some(n) = config.n_qubits {
            out.num_qubits = n;
        }
        if let Some(basis) = &config.basis_gates {
            if !basis.is_empty() {
                out.basis_gates = basis.clone();
            }
        }
        out.coupling_map = config.coupling_map.as_ref().map(|edges| {
            edges
                .iter()
                .filter_map(|pair| match pair.as_slice() {
                    [a, b, ..] => Some((*a, *b)),
                    _ => None,
                })
                .collect()
        });
        out
    }
}

// ============================================================================
// Native operations
// ============================================================================

/// One instruction of a lowered circuit, on physical qubits
/// Gantree: NativeOp // ISA 명령
#[derive(Debug, Clone, PartialEq)]
pub enum NativeOp {
    /// Z rotation
    Rz(QubitId, Angle),
    /// √X
    Sx(QubitId),
    /// X
    X(QubitId),
    /// Native two-qubit gate
    Two(Entangler, QubitId, QubitId),
    /// Measurement into a classical bit
    Measure(QubitId, ClbitId),
    /// Reset to |0⟩
    Reset(QubitId),
    /// Barrier
    Barrier(Vec<QubitId>),
    /// Classically conditioned block
    IfElse {
        /// Condition bit
        clbit: ClbitId,
        /// Required value
        value: bool,
        /// Body
        body: Vec<NativeOp>,
    },
}

impl NativeOp {
    /// Instruction name
    pub fn name(&self) -> &'static str {
        match self {
            NativeOp::Rz(..) => "rz",
            NativeOp::Sx(_) => "sx",
            NativeOp::X(_) => "x",
            NativeOp::Two(e, ..) => e.name(),
            NativeOp::Measure(..) => "measure",
            NativeOp::Reset(_) => "reset",
            NativeOp::Barrier(_) => "barrier",
            NativeOp::IfElse { .. } => "if_else",
        }
    }

    fn write_qasm(&self, out: &mut String, indent: &str) {
        // writing to a String cannot fail
        let _ = match self {
            NativeOp::Rz(q, a) => writeln!(out, "{}rz({}) ${};", indent, a, q),
            NativeOp::Sx(q) => writeln!(out, "{}sx ${};", indent, q),
            NativeOp::X(q) => writeln!(out, "{}x ${};", indent, q),
            NativeOp::Two(e, a, b) => writeln!(out, "{}{} ${}, ${};", indent, e.name(), a, b),
            NativeOp::Measure(q, c) => writeln!(out, "{}c[{}] = measure ${};", indent, c, q),
            NativeOp::Reset(q) => writeln!(out, "{}reset ${};", indent, q),
            NativeOp::Barrier(qs) => {
                let args: Vec<String> = qs.iter().map(|q| format!("${}", q)).collect();
                writeln!(out, "{}barrier {};", indent, args.join(", "))
            }
            NativeOp::IfElse { clbit, value, body } => {
                let cond = if *value {
                    format!("c[{}]", clbit)
                } else {
                    format!("!c[{}]", clbit)
                };
                let _ = writeln!(out, "{}if ({}) {{", indent, cond);
                let inner = format!("{}  ", indent);
                for op in body {
                    op.write_qasm(out, &inner);
                }
                writeln!(out, "{}}}", indent)
            }
        };
    }
}

/// Result of lowering one circuit
#[derive(Debug, Clone)]
pub struct TranspiledCircuit {
    /// Lowered instructions
    pub ops: Vec<NativeOp>,

    /// Classical register width
    pub num_clbits: usize,

    /// Physical qubit of each virtual qubit at the start
    pub initial_layout: Vec<QubitId>,

    /// Physical qubit of each virtual qubit at the end
    pub final_layout: Vec<QubitId>,

    /// SWAPs inserted by routing
    pub num_swaps: usize,
}

impl TranspiledCircuit {
    /// OpenQASM 3 source over physical qubits
    /// Gantree: to_qasm3() -> String // QASM 출력
    pub fn to_qasm3(&self) -> String {
        let mut out = String::from("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n");
        if self.num_clbits > 0 {
            out.push_str(&format!("bit[{}] c;\n", self.num_clbits));
        }
        for op in &self.ops {
            op.write_qasm(&mut out, "");
        }
        out
    }

    /// Instruction histogram, conditional bodies included
    pub fn count_ops(&self) -> BTreeMap<&'static str, usize> {
        fn walk(ops: &[NativeOp], counts: &mut BTreeMap<&'static str, usize>) {
            for op in ops {
                *counts.entry(op.name()).or_insert(0) += 1;
                if let NativeOp::IfElse { body, .. } = op {
                    walk(body, counts);
                }
            }
        }
        let mut counts = BTreeMap::new();
        walk(&self.ops, &mut counts);
        counts
    }

    /// Native two-qubit gate count
    pub fn two_qubit_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, NativeOp::Two(..)))
            .count()
    }
}

// ============================================================================
// Transpiler
// ============================================================================

/// Circuit lowering for one backend
/// Gantree: Transpiler // ISA 변환기
#[derive(Debug, Clone)]
pub struct Transpiler {
    config: TranspilerConfig,
    topology: Option<Topology>,
    entangler: Entangler,
}

impl Transpiler {
    /// Create a transpiler; fails if the basis has no known entangler or
    /// the coupling map is invalid
    pub fn new(config: TranspilerConfig) -> QdemoResult<Self> {
        let entangler = Entangler::from_basis(&config.basis_gates)?;
        let topology = match &config.coupling_map {
            Some(map) => Some(Topology::from_coupling_map(map.clone(), config.num_qubits)?),
            None => None,
        };
        Ok(Self {
            config,
            topology,
            entangler,
        })
    }

    /// Configuration
    pub fn config(&self) -> &TranspilerConfig {
        &self.config
    }

    /// Chosen entangler
    pub fn entangler(&self) -> Entangler {
        self.entangler
    }

    /// Lower a circuit
    /// Gantree: transpile(circuit) -> TranspiledCircuit // 변환
    pub fn transpile(&self, circuit: &Circuit) -> QdemoResult<TranspiledCircuit> {
        let n = circuit.num_qubits();
        if n > self.config.num_qubits {
            return Err(QdemoError::QubitOutOfRange {
                qubit: n.saturating_sub(1),
                max: self.config.num_qubits.saturating_sub(1),
            });
        }

        let mut gates = Vec::with_capacity(circuit.gate_count() * 2);
        for gate in circuit.gates() {
            decompose(gate, &mut gates)?;
        }

        // Registerless circuits are measured in full, like the simulator does
        let mut num_clbits = circuit.num_clbits();
        if num_clbits == 0 {
            gates.extend((0..n).map(|q| Gate::Measure(q, q)));
            num_clbits = n;
        }

        let initial_layout = self.initial_layout(n);
        let mut router = Router::new(self, initial_layout.clone());
        for gate in &gates {
            router.route(gate)?;
        }

        log::debug!(
            "Transpiled {} gates into {} native ops ({} swaps, entangler {})",
            circuit.gate_count(),
            router.ops.len(),
            router.num_swaps,
            self.entangler.name()
        );

        Ok(TranspiledCircuit {
            ops: router.ops,
            num_clbits,
            final_layout: router.v2p,
            initial_layout,
            num_swaps: router.num_swaps,
        })
    }

    /// Lower a circuit straight to OpenQASM 3
    pub fn to_qasm3(&self, circuit: &Circuit) -> QdemoResult<String> {
        Ok(self.transpile(circuit)?.to_qasm3())
    }

    fn initial_layout(&self, n: usize) -> Vec<QubitId> {
        self.topology
            .as_ref()
            .and_then(|topo| topo.find_linear_chain(n))
            .unwrap_or_else(|| (0..n).collect())
    }

    fn allows(&self, control: QubitId, target: QubitId) -> bool {
        self.topology
            .as_ref()
            .map_or(true, |topo| topo.has_directed_edge(control, target))
    }
}

// ============================================================================
// Decomposition (virtual qubits)
// ============================================================================

/// Rewrite a gate into single-qubit gates, CX, CZ and non-unitary ops
fn decompose(gate: &Gate, out: &mut Vec<Gate>) -> QdemoResult<()> {
    match gate {
        Gate::Cnot(..) | Gate::Cz(..) => out.push(gate.clone()),
        Gate::Cy(c, t) => out.extend([Gate::Sdg(*t), Gate::Cnot(*c, *t), Gate::S(*t)]),
        Gate::Swap(a, b) => out.extend([Gate::Cnot(*a, *b), Gate::Cnot(*b, *a), Gate::Cnot(*a, *b)]),
        Gate::Cp(c, t, lambda) => out.extend([
            Gate::P(*c, lambda / 2.0),
            Gate::Cnot(*c, *t),
            Gate::P(*t, -lambda / 2.0),
            Gate::Cnot(*c, *t),
            Gate::P(*t, lambda / 2.0),
        ]),
        Gate::Crz(c, t, theta) => out.extend([
            Gate::Rz(*t, theta / 2.0),
            Gate::Cnot(*c, *t),
            Gate::Rz(*t, -theta / 2.0),
            Gate::Cnot(*c, *t),
        ]),
        Gate::Cry(c, t, theta) => out.extend([
            Gate::Ry(*t, theta / 2.0),
            Gate::Cnot(*c, *t),
            Gate::Ry(*t, -theta / 2.0),
            Gate::Cnot(*c, *t),
        ]),
        Gate::Crx(c, t, theta) => {
            out.push(Gate::S(*t));
            decompose(&Gate::Cry(*c, *t, *theta), out)?;
            out.push(Gate::Sdg(*t));
        }
        Gate::Rzz(a, b, theta) => {
            out.extend([Gate::Cnot(*a, *b), Gate::Rz(*b, *theta), Gate::Cnot(*a, *b)])
        }
        Gate::Ccx(a, b, t) => toffoli(*a, *b, *t, out),
        Gate::Cswap(c, a, b) => {
            out.push(Gate::Cnot(*b, *a));
            toffoli(*c, *a, *b, out);
            out.push(Gate::Cnot(*b, *a));
        }
        Gate::Mcx(controls, t) => match controls.as_slice() {
            [] => out.push(Gate::X(*t)),
            [c] => out.push(Gate::Cnot(*c, *t)),
            [a, b] => toffoli(*a, *b, *t, out),
            _ => {
                let mut qubits = controls.clone();
                qubits.push(*t);
                out.push(Gate::H(*t));
                multi_controlled_phase(&qubits, PI, out);
                out.push(Gate::H(*t));
            }
        },
        Gate::CIf { gate: body, .. } => {
            if !body.is_single_qubit() {
                return Err(QdemoError::Unsupported(format!(
                    "conditional {} on {} qubits",
                    body.name(),
                    body.qubits().len()
                )));
            }
            out.push(gate.clone());
        }
        other => out.push(other.clone()),
    }
    Ok(())
}

fn toffoli(a: QubitId, b: QubitId, t: QubitId, out: &mut Vec<Gate>) {
    out.extend([
        Gate::H(t),
        Gate::Cnot(b, t),
        Gate::Tdg(t),
        Gate::Cnot(a, t),
        Gate::T(t),
        Gate::Cnot(b, t),
        Gate::Tdg(t),
        Gate::Cnot(a, t),
        Gate::T(b),
        Gate::T(t),
        Gate::H(t),
        Gate::Cnot(a, b),
        Gate::T(a),
        Gate::Tdg(b),
        Gate::Cnot(a, b),
    ]);
}

/// Phase `lambda` on |1…1⟩ of `qubits`, as phases on every parity:
/// x1·…·xm = 2^(1−m) Σ_{S≠∅} (−1)^(|S|+1) ⊕_{i∈S} xi
fn multi_controlled_phase(qubits: &[QubitId], lambda: Angle, out: &mut Vec<Gate>) {
    let m = qubits.len();
    let scale = lambda / f64::from(1u32 << (m - 1));
    for mask in 1usize..(1 << m) {
        let subset: Vec<QubitId> = (0..m).filter(|i| (mask >> i) & 1 == 1).map(|i| qubits[i]).collect();
        let sign = if subset.len() % 2 == 1 { 1.0 } else { -1.0 };
        let (&last, rest) = match subset.split_last() {
            Some(split) => split,
            None => continue,
        };
        out.extend(rest.iter().map(|&q| Gate::Cnot(q, last)));
        out.push(Gate::P(last, sign * scale));
        out.extend(rest.iter().rev().map(|&q| Gate::Cnot(q, last)));
    }
}

// ============================================================================
// Routing and emission (physical qubits)
// ============================================================================

struct Router<'a> {
    transpiler: &'a Transpiler,
    v2p: Vec<QubitId>,
    ops: Vec<NativeOp>,
    num_swaps: usize,
}

impl<'a> Router<'a> {
    fn new(transpiler: &'a Transpiler, layout: Vec<QubitId>) -> Self {
        Self {
            transpiler,
            v2p: layout,
            ops: Vec::new(),
            num_swaps: 0,
        }
    }

    fn route(&mut self, gate: &Gate) -> QdemoResult<()> {
        match gate {
            Gate::Cnot(a, b) | Gate::Cz(a, b) => {
                self.bring_adjacent(*a, *b)?;
                let (pa, pb) = (self.v2p[*a], self.v2p[*b]);
                if matches!(gate, Gate::Cnot(..)) {
                    self.emit_cx(pa, pb);
                } else {
                    self.emit_cz(pa, pb);
                }
            }
            Gate::Measure(q, c) => self.ops.push(NativeOp::Measure(self.v2p[*q], *c)),
            Gate::Reset(q) => self.ops.push(NativeOp::Reset(self.v2p[*q])),
            Gate::Barrier(qs) => {
                let physical = qs.iter().map(|q| self.v2p[*q]).collect();
                self.ops.push(NativeOp::Barrier(physical));
            }
            Gate::CIf { clbit, value, gate } => {
                let mut body = Vec::new();
                let q = gate.qubits().first().copied().ok_or_else(|| {
                    QdemoError::Unsupported("conditional without qubits".into())
                })?;
                single_qubit(gate, self.v2p[q], &mut body)?;
                self.ops.push(NativeOp::IfElse {
                    clbit: *clbit,
                    value: *value,
                    body,
                });
            }
            g if g.is_single_qubit() => {
                let q = self.v2p[g.qubits()[0]];
                single_qubit(g, q, &mut self.ops)?;
            }
            other => {
                return Err(QdemoError::InternalError(format!(
                    "{} survived decomposition",
                    other.name()
                )))
            }
        }
        Ok(())
    }

    /// Swap `a` toward `b` along a shortest path until they share an edge
    fn bring_adjacent(&mut self, a: QubitId, b: QubitId) -> QdemoResult<()> {
        let transpiler = self.transpiler;
        let topo = match &transpiler.topology {
            Some(topo) => topo,
            None => return Ok(()),
        };
        let (pa, pb) = (self.v2p[a], self.v2p[b]);
        if topo.is_connected(pa, pb) {
            return Ok(());
        }
        let path = topo.shortest_path(pa, pb).ok_or(QdemoError::PathNotFound(pa, pb))?;
        for hop in path.windows(2).take(path.len().saturating_sub(2)) {
            let (p, q) = (hop[0], hop[1]);
            self.emit_cx(p, q);
            self.emit_cx(q, p);
            self.emit_cx(p, q);
            for slot in self.v2p.iter_mut() {
                if *slot == p {
                    *slot = q;
                } else if *slot == q {
                    *slot = p;
                }
            }
            self.num_swaps += 1;
        }
        Ok(())
    }

    fn emit_cx(&mut self, c: QubitId, t: QubitId) {
        let allowed = self.transpiler.allows(c, t);
        match self.transpiler.entangler {
            Entangler::Cx if allowed => self.ops.push(NativeOp::Two(Entangler::Cx, c, t)),
            Entangler::Ecr if allowed => {
                self.ops.push(NativeOp::X(c));
                self.ops.push(NativeOp::Two(Entangler::Ecr, c, t));
                self.ops.push(NativeOp::Rz(c, FRAC_PI_2));
                self.ops.push(NativeOp::Sx(t));
            }
            Entangler::Cz => {
                self.hadamard(t);
                self.emit_cz(c, t);
                self.hadamard(t);
            }
            // only the reverse edge exists: H⊗H · CX(t, c) · H⊗H
            Entangler::Cx | Entangler::Ecr => {
                self.hadamard(c);
                self.hadamard(t);
                self.emit_cx(t, c);
                self.hadamard(c);
                self.hadamard(t);
            }
        }
    }

    fn emit_cz(&mut self, a: QubitId, b: QubitId) {
        if self.transpiler.entangler == Entangler::Cz {
            // symmetric; use whichever direction the map lists
            let (x, y) = if self.transpiler.allows(a, b) { (a, b) } else { (b, a) };
            self.ops.push(NativeOp::Two(Entangler::Cz, x, y));
        } else {
            self.hadamard(b);
            self.emit_cx(a, b);
            self.hadamard(b);
        }
    }

    fn hadamard(&mut self, q: QubitId) {
        // H = rz(π/2) sx rz(π/2) up to global phase
        self.ops.push(NativeOp::Rz(q, FRAC_PI_2));
        self.ops.push(NativeOp::Sx(q));
        self.ops.push(NativeOp::Rz(q, FRAC_PI_2));
    }
}

/// Lower a single-qubit gate to rz/sx/x on physical qubit `q`
fn single_qubit(gate: &Gate, q: QubitId, out: &mut Vec<NativeOp>) -> QdemoResult<()> {
    match gate {
        Gate::X(_) => out.push(NativeOp::X(q)),
        Gate::Sx(_) => out.push(NativeOp::Sx(q)),
        Gate::Id(_) => {}
        g => {
            let (theta, phi, lambda) = g.u3_params().ok_or_else(|| {
                QdemoError::Unsupported(format!("{} is not a single-qubit unitary", g.name()))
            })?;
            zsx(q, theta, phi, lambda, out);
        }
    }
    Ok(())
}

/// U(θ, φ, λ) = RZ(φ+π)·SX·RZ(θ+π)·SX·RZ(λ) up to global phase, with
/// shorter forms for θ = 0 and θ = π/2
fn zsx(q: QubitId, theta: Angle, phi: Angle, lambda: Angle, out: &mut Vec<NativeOp>) {
    let theta = wrap_angle(theta);
    let rz = |angle: Angle, out: &mut Vec<NativeOp>| {
        let angle = wrap_angle(angle);
        if angle.abs() > tolerance::EPS {
            out.push(NativeOp::Rz(q, angle));
        }
    };

    if theta.abs() < tolerance::EPS {
        rz(phi + lambda, out);
    } else if (theta - FRAC_PI_2).abs() < tolerance::EPS {
        rz(lambda - FRAC_PI_2, out);
        out.push(NativeOp::Sx(q));
        rz(phi + FRAC_PI_2, out);
    } else {
        rz(lambda, out);
        out.push(NativeOp::Sx(q));
        rz(theta + PI, out);
        out.push(NativeOp::Sx(q));
        rz(phi + PI, out);
    }
}

/// Map an angle into (−π, π]
fn wrap_angle(angle: Angle) -> Angle {
    let wrapped = angle - TAU * (angle / TAU).round();
    if wrapped <= -PI + tolerance::EPS {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::exact_probabilities;
    use qdemo_core::CircuitBuilder;

    fn heavy_hex_7() -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (a, b) in [(0, 1), (1, 2), (1, 3), (3, 5), (4, 5), (5, 6)] {
            edges.push((a, b));
            edges.push((b, a));
        }
        edges
    }

    fn all_native(circuit: &TranspiledCircuit, basis: &[&str]) -> bool {
        circuit
            .count_ops()
            .keys()
            .all(|name| basis.contains(name) || ["measure", "reset", "barrier", "if_else"].contains(name))
    }

    /// Native ops as core gates on the physical register; ECR is expanded
    /// as rzx(π/4) · x(c) · rzx(−π/4) with rzx(θ) = H(t) · rzz(θ) · H(t)
    fn replay(out: &TranspiledCircuit, num_physical: usize) -> Circuit {
        let mut gates = Vec::new();
        for op in &out.ops {
            match op {
                NativeOp::Rz(q, angle) => gates.push(Gate::Rz(*q, *angle)),
                NativeOp::Sx(q) => gates.push(Gate::Sx(*q)),
                NativeOp::X(q) => gates.push(Gate::X(*q)),
                NativeOp::Two(Entangler::Cx, c, t) => gates.push(Gate::Cnot(*c, *t)),
                NativeOp::Two(Entangler::Cz, a, b) => gates.push(Gate::Cz(*a, *b)),
                NativeOp::Two(Entangler::Ecr, c, t) => gates.extend([
                    Gate::H(*t),
                    Gate::Rzz(*c, *t, PI / 4.0),
                    Gate::H(*t),
                    Gate::X(*c),
                    Gate::H(*t),
                    Gate::Rzz(*c, *t, -PI / 4.0),
                    Gate::H(*t),
                ]),
                NativeOp::Measure(..) | NativeOp::Barrier(_) => {}
                other => panic!("unexpected op {:?}", other),
            }
        }
        Circuit::from_gates(num_physical, 0, gates).unwrap()
    }

    /// Distribution over the classical register of a lowered circuit
    fn lowered_distribution(out: &TranspiledCircuit, num_physical: usize) -> Vec<f64> {
        let probs = exact_probabilities(&replay(out, num_physical)).unwrap();
        let reads: Vec<(QubitId, ClbitId)> = out
            .ops
            .iter()
            .filter_map(|op| match op {
                NativeOp::Measure(p, c) => Some((*p, *c)),
                _ => None,
            })
            .collect();
        let mut dist = vec![0.0; 1 << out.num_clbits];
        for (state, p) in probs.iter().enumerate() {
            let key = reads.iter().fold(0, |key, &(q, c)| key | (((state >> q) & 1) << c));
            dist[key] += p;
        }
        dist
    }

    fn mixed_circuit() -> Circuit {
        CircuitBuilder::new(4)
            .u(0, 0.4, 1.3, -0.7)
            .ry(1, 1.1)
            .rx(2, -0.9)
            .u(3, 2.2, -0.5, 0.8)
            .cy(0, 1)
            .cp(1, 2, 1.3)
            .crx(2, 3, 0.7)
            .rzz(0, 3, 1.1)
            .ccx(0, 1, 2)
            .cswap(3, 0, 1)
            .mcx(&[0, 1, 2], 3)
            .swap(0, 2)
            .crz(1, 3, -0.6)
            .cry(3, 0, 0.9)
            .cx(3, 0)
            .h(0)
            .ry(1, 0.5)
            .sx(2)
            .u(3, 0.3, 0.2, 0.1)
            .measure_all()
            .build()
    }

    #[test]
    fn test_ecr_kernel_is_cx() {
        for input in 0..4usize {
            let ones: Vec<usize> = (0..2).filter(|q| (input >> q) & 1 == 1).collect();
            let circuit = CircuitBuilder::new(2).x_on(&ones).h(0).ry(1, 0.8).cx(0, 1).h(0).build();
            let config = TranspilerConfig::for_backend(2, vec![(0, 1)]).with_basis(&["rz", "sx", "x", "ecr"]);
            let out = Transpiler::new(config).unwrap().transpile(&circuit).unwrap();
            assert_eq!(out.count_ops().get("ecr"), Some(&1));

            let expected = exact_probabilities(&circuit).unwrap();
            for (got, want) in lowered_distribution(&out, 2).iter().zip(&expected) {
                assert_relative_eq!(*got, *want, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_lowering_preserves_distribution() {
        let circuit = mixed_circuit();
        let expected = exact_probabilities(&circuit).unwrap();
        // one-way line 0→1→2→3→4: routing swaps and reversed edges
        let line = vec![(0, 1), (1, 2), (2, 3), (3, 4)];

        for basis in [
            &["rz", "sx", "x", "cx"][..],
            &["rz", "sx", "x", "cz"][..],
            &["rz", "sx", "x", "ecr"][..],
        ] {
            let configs = [
                (TranspilerConfig { num_qubits: 4, ..Default::default() }.with_basis(basis), 4),
                (TranspilerConfig::for_backend(5, line.clone()).with_basis(basis), 5),
                (TranspilerConfig::for_backend(7, heavy_hex_7()).with_basis(basis), 7),
            ];
            for (config, num_physical) in configs {
                let routed = config.coupling_map.is_some();
                let out = Transpiler::new(config).unwrap().transpile(&circuit).unwrap();
                if routed {
                    assert!(out.num_swaps > 0, "{:?}", basis);
                }
                let got = lowered_distribution(&out, num_physical);
                assert_eq!(got.len(), expected.len());
                for (g, e) in got.iter().zip(&expected) {
                    assert_relative_eq!(*g, *e, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_entangler_choice() {
        let basis = |b: &[&str]| b.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(Entangler::from_basis(&basis(&["cz", "rz", "sx"])).unwrap(), Entangler::Cz);
        assert_eq!(Entangler::from_basis(&basis(&["ecr", "rz"])).unwrap(), Entangler::Ecr);
        assert_eq!(Entangler::from_basis(&basis(&["cx", "ecr"])).unwrap(), Entangler::Cx);
        assert!(Entangler::from_basis(&basis(&["rz", "sx"])).is_err());
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(TAU + 0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-0.5), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bell_qasm_on_line() {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
        let transpiler = Transpiler::new(TranspilerConfig::default()).unwrap();
        let qasm = transpiler.to_qasm3(&circuit).unwrap();

        assert!(qasm.starts_with("OPENQASM 3.0;"));
        assert!(qasm.contains("bit[2] c;"));
        assert!(qasm.contains("sx $0;"));
        assert!(qasm.contains("cx $0, $1;"));
        assert!(qasm.contains("c[1] = measure $1;"));
        assert!(!qasm.contains("h $0"));
        assert!(!qasm.contains("qubit["));
    }

    #[test]
    fn test_only_basis_gates_for_each_entangler() {
        let circuit = CircuitBuilder::new(4)
            .h(0)
            .cy(0, 1)
            .cp(1, 2, 0.3)
            .crx(2, 3, 0.7)
            .rzz(0, 3, 1.1)
            .ccx(0, 1, 2)
            .cswap(3, 0, 1)
            .mcx(&[0, 1, 2], 3)
            .swap(0, 2)
            .measure_all()
            .build();

        for basis in [
            &["rz", "sx", "x", "cx"][..],
            &["rz", "sx", "x", "cz"][..],
            &["rz", "sx", "x", "ecr"][..],
        ] {
            let config = TranspilerConfig::for_backend(7, heavy_hex_7()).with_basis(basis);
            let out = Transpiler::new(config).unwrap().transpile(&circuit).unwrap();
            assert!(all_native(&out, basis), "{:?}: {:?}", basis, out.count_ops());
            assert_eq!(out.count_ops().get("measure"), Some(&4));
        }
    }

    #[test]
    fn test_routing_inserts_swaps() {
        // linear 0-1-2-3: CX between the ends needs two swaps
        let map = vec![(0, 1), (1, 2), (2, 3)];
        let config = TranspilerConfig::for_backend(4, map);
        let transpiler = Transpiler::new(config).unwrap();
        let circuit = CircuitBuilder::new(4).cx(0, 3).measure_all().build();
        let out = transpiler.transpile(&circuit).unwrap();

        assert_eq!(out.initial_layout, vec![0, 1, 2, 3]);
        assert_eq!(out.num_swaps, 2);
        assert_eq!(out.final_layout[0], 2);
        // every native two-qubit gate sits on a coupling edge
        let topo = Topology::linear(4);
        for op in &out.ops {
            if let NativeOp::Two(_, a, b) = op {
                assert!(topo.is_connected(*a, *b));
            }
        }
        // measurement of virtual qubit 0 reads its final location
        assert!(out.ops.contains(&NativeOp::Measure(2, 0)));
    }

    #[test]
    fn test_reverse_direction_gets_hadamards() {
        let config = TranspilerConfig::for_backend(2, vec![(1, 0)]);
        let out = Transpiler::new(config)
            .unwrap()
            .transpile(&CircuitBuilder::new(2).cx(0, 1).build())
            .unwrap();
        assert!(out.ops.contains(&NativeOp::Two(Entangler::Cx, 1, 0)));
        assert!(!out.ops.contains(&NativeOp::Two(Entangler::Cx, 0, 1)));
        assert_eq!(out.count_ops().get("sx"), Some(&4));
    }

    #[test]
    fn test_layout_uses_chain() {
        let config = TranspilerConfig::for_backend(7, heavy_hex_7());
        let transpiler = Transpiler::new(config).unwrap();
        let circuit = CircuitBuilder::new(3).h(0).cx(0, 1).cx(1, 2).measure_all().build();
        let out = transpiler.transpile(&circuit).unwrap();
        let topo = Topology::from_coupling_map(heavy_hex_7(), 7).unwrap();
        assert!(topo.is_connected(out.initial_layout[0], out.initial_layout[1]));
        assert!(topo.is_connected(out.initial_layout[1], out.initial_layout[2]));
        assert_eq!(out.num_swaps, 0);
    }

    #[test]
    fn test_dynamic_circuit_conditionals() {
        let circuit = CircuitBuilder::with_clbits(3, 3)
            .h(1)
            .cx(1, 2)
            .measure(0, 0)
            .c_if(0, true, Gate::Z(2))
            .c_if(1, false, Gate::X(2))
            .build();
        let transpiler = Transpiler::new(TranspilerConfig::default()).unwrap();
        let qasm = transpiler.to_qasm3(&circuit).unwrap();
        assert!(qasm.contains("if (c[0]) {\n  rz("));
        assert!(qasm.contains("if (!c[1]) {\n  x $2;\n}"));
    }

    #[test]
    fn test_registerless_circuit_measures_all() {
        let circuit = CircuitBuilder::new(2).x(1).build();
        let out = Transpiler::new(TranspilerConfig::default())
            .unwrap()
            .transpile(&circuit)
            .unwrap();
        assert_eq!(out.num_clbits, 2);
        assert!(out.to_qasm3().contains("c[1] = measure $1;"));
    }

    #[test]
    fn test_single_qubit_shortcuts() {
        let mut ops = Vec::new();
        single_qubit(&Gate::Z(0), 0, &mut ops).unwrap();
        assert_eq!(ops, vec![NativeOp::Rz(0, PI)]);

        ops.clear();
        single_qubit(&Gate::H(0), 0, &mut ops).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1], NativeOp::Sx(0));

        ops.clear();
        single_qubit(&Gate::Ry(0, 0.4), 0, &mut ops).unwrap();
        assert_eq!(ops.iter().filter(|op| **op == NativeOp::Sx(0)).count(), 2);

        ops.clear();
        single_qubit(&Gate::Id(0), 0, &mut ops).unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_rejects_oversized_and_two_qubit_conditionals() {
        let config = TranspilerConfig::for_backend(2, vec![(0, 1)]);
        let transpiler = Transpiler::new(config).unwrap();
        assert!(transpiler.transpile(&CircuitBuilder::new(3).build()).is_err());

        let mut gates = Vec::new();
        let cond = Gate::CIf {
            clbit: 0,
            value: true,
            gate: Box::new(Gate::Cnot(0, 1)),
        };
        assert!(matches!(decompose(&cond, &mut gates), Err(QdemoError::Unsupported(_))));
    }

    #[test]
    fn test_from_backend_config() {
        let config = BackendConfig {
            n_qubits: Some(5),
            basis_gates: Some(vec!["ecr".into(), "rz".into(), "sx".into(), "x".into()]),
            coupling_map: Some(vec![vec![0, 1], vec![1, 2], vec![3]]),
            ..Default::default()
        };
        let tc = TranspilerConfig::from_backend_config(&config);
        assert_eq!(tc.num_qubits, 5);
        assert_eq!(tc.coupling_map, Some(vec![(0, 1), (1, 2)]));
        assert_eq!(Transpiler::new(tc).unwrap().entangler(), Entangler::Ecr);
    }
}
