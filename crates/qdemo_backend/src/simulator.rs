//! Simulator backend for qdemo
//!
//! Gantree: L2_Backend → SimulatorBackend
//!
//! Seedable reference simulator. Circuits whose measurements are all
//! terminal are evolved once and sampled; dynamic circuits (mid-circuit
//! measurement, reset, classical conditionals) and noisy runs are
//! re-executed shot by shot.

use crate::execution::{check_shots, Backend, ExecutionMetadata, ExecutionResult};
use crate::noise::NoiseModel;
use crate::statevector::StateVector;
use log::debug;
use qdemo_core::{Circuit, ClbitId, Counts, Gate, QdemoError, QdemoResult, QubitId};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::time::Instant;

/// Simulator backend with optional noise model
/// Gantree: SimulatorBackend // 시뮬레이터 구현
pub struct SimulatorBackend {
    /// Backend name
    name: String,

    /// Number of qubits
    num_qubits: usize,

    /// Noise model
    noise_model: NoiseModel,

    /// Random seed
    seed: Option<u64>,
}

impl SimulatorBackend {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new simulator backend
    pub fn new(num_qubits: usize, noise_model: NoiseModel) -> Self {
        Self {
            name: "qdemo_simulator".to_string(),
            num_qubits,
            noise_model,
            seed: None,
        }
    }

    /// Create ideal (noiseless) simulator
    /// Gantree: ideal(n) -> Self // 이상적 시뮬레이터
    pub fn ideal(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ideal())
    }

    /// Create simulator with IBM-typical error rates
    pub fn ibm_typical(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ibm_typical()).with_name("qdemo_noisy_simulator")
    }

    /// Create from depolarizing error rate
    pub fn from_depol(num_qubits: usize, p_depol: f64) -> QdemoResult<Self> {
        Ok(Self::new(num_qubits, NoiseModel::from_depol(p_depol)?))
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Noise model in use
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    fn new_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Evolve once, then sample every shot from the final distribution
    /// Gantree: sample_terminal(circuit, shots) -> Counts // 고속 경로
    fn sample_terminal(
        &self,
        circuit: &Circuit,
        shots: u64,
        rng: &mut StdRng,
    ) -> QdemoResult<Counts> {
        let mut state = StateVector::new(circuit.num_qubits())?;
        // clbit -> qubit it was last written from
        let mut sources: Vec<Option<QubitId>> = vec![None; circuit.num_clbits()];
        for gate in circuit.gates() {
            match gate {
                Gate::Measure(q, c) => sources[*c] = Some(*q),
                other => state.apply(other)?,
            }
        }

        let probs = state.probabilities();
        let dist = WeightedIndex::new(&probs)
            .map_err(|e| QdemoError::BackendError(format!("invalid distribution: {}", e)))?;

        let mut tally: HashMap<usize, u64> = HashMap::new();
        for _ in 0..shots {
            *tally.entry(dist.sample(rng)).or_insert(0) += 1;
        }

        let mut counts: Counts = HashMap::new();
        for (index, count) in tally {
            let key = if circuit.num_clbits() == 0 {
                format_index(index, circuit.num_qubits())
            } else {
                register_key(sources.iter().map(|s| s.is_some_and(|q| (index >> q) & 1 == 1)))
            };
            *counts.entry(key).or_insert(0) += count;
        }
        Ok(counts)
    }

    /// Run one shot of a dynamic or noisy circuit
    /// Gantree: run_shot(circuit, prefix) -> String // 단일 샷
    fn run_shot(
        &self,
        circuit: &Circuit,
        start: &StateVector,
        skip: usize,
        rng: &mut StdRng,
    ) -> QdemoResult<String> {
        let mut state = start.clone();
        let mut clbits = vec![false; circuit.num_clbits()];

        for gate in &circuit.gates()[skip..] {
            match gate {
                Gate::Measure(q, c) => {
                    clbits[*c] = self.read_out(state.measure(*q, rng), rng);
                }
                Gate::Reset(q) => state.reset(*q, rng),
                Gate::CIf { clbit, value, gate } => {
                    if clbits[*clbit] == *value {
                        self.apply_noisy(&mut state, gate, rng)?;
                    }
                }
                other => self.apply_noisy(&mut state, other, rng)?,
            }
        }

        if circuit.num_clbits() == 0 {
            let bits: Vec<bool> = (0..circuit.num_qubits())
                .map(|q| {
                    let b = state.measure(q, rng);
                    self.read_out(b, rng)
                })
                .collect();
            return Ok(register_key(bits.into_iter()));
        }
        Ok(register_key(clbits.into_iter()))
    }

    /// Apply a gate followed by a depolarizing error with the gate's rate
    fn apply_noisy(&self, state: &mut StateVector, gate: &Gate, rng: &mut StdRng) -> QdemoResult<()> {
        state.apply(gate)?;
        if gate.is_barrier() {
            return Ok(());
        }
        let qubits = gate.qubits();
        let p = self.noise_model.gate_error(qubits.len());
        if p > 0.0 && rng.gen::<f64>() < p {
            // uniformly random non-identity Pauli string on the gate's qubits
            let k = qubits.len().min(8) as u32;
            let code = rng.gen_range(1..4usize.pow(k));
            for (i, &q) in qubits.iter().take(k as usize).enumerate() {
                let pauli = match (code >> (2 * i)) & 3 {
                    1 => Some(Gate::X(q)),
                    2 => Some(Gate::Y(q)),
                    3 => Some(Gate::Z(q)),
                    _ => None,
                };
                if let Some(p) = pauli {
                    state.apply(&p)?;
                }
            }
        }
        Ok(())
    }

    fn read_out(&self, bit: bool, rng: &mut StdRng) -> bool {
        let p = self.noise_model.readout_error();
        if p > 0.0 && rng.gen::<f64>() < p {
            !bit
        } else {
            bit
        }
    }

    /// Simulate circuit and return counts
    fn simulate(&self, circuit: &Circuit, shots: u64, rng: &mut StdRng) -> QdemoResult<Counts> {
        let dynamic = circuit.has_mid_circuit_measurement()
            || circuit.gates().iter().any(|g| matches!(g, Gate::Reset(_)));

        if !dynamic && self.noise_model.is_ideal() {
            debug!("{}: sampling terminal distribution", self.name);
            return self.sample_terminal(circuit, shots, rng);
        }

        // Without noise the unitary prefix is shared by every shot
        let mut prefix = StateVector::new(circuit.num_qubits())?;
        let mut skip = 0;
        if self.noise_model.is_ideal() {
            for gate in circuit.gates() {
                if !gate.is_unitary() {
                    break;
                }
                prefix.apply(gate)?;
                skip += 1;
            }
        }
        debug!(
            "{}: per-shot simulation, {} of {} gates shared",
            self.name,
            skip,
            circuit.gate_count()
        );

        let mut counts: Counts = HashMap::new();
        for _ in 0..shots {
            let key = self.run_shot(circuit, &prefix, skip, rng)?;
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Key for a register given bits in clbit order (clbit 0 first)
fn register_key(bits: impl DoubleEndedIterator<Item = bool>) -> String {
    bits.rev().map(|b| if b { '1' } else { '0' }).collect()
}

fn format_index(index: usize, width: usize) -> String {
    format!("{:0width$b}", index, width = width)
}

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QdemoResult<ExecutionResult> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(QdemoError::QubitOutOfRange {
                qubit: circuit.num_qubits(),
                max: self.num_qubits,
            });
        }
        check_shots(self, shots)?;

        let started = Instant::now();
        let mut rng = self.new_rng();
        let counts = self.simulate(circuit, shots, &mut rng)?;

        Ok(ExecutionResult {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                execution_time_ms: Some(started.elapsed().as_millis() as u64),
                simulated: true,
                seed: self.seed,
                ..Default::default()
            },
        })
    }

    fn is_simulator(&self) -> bool {
        true
    }
}

/// Classical bit index helper for tests and analyses
pub fn clbit_of(key: &str, clbit: ClbitId) -> Option<bool> {
    let width = key.len();
    if clbit >= width {
        return None;
    }
    key.as_bytes().get(width - 1 - clbit).map(|&b| b == b'1')
}

// ============================================================================
// Tests
// ============================================================================
