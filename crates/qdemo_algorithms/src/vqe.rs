//! Variational quantum eigensolver for H₂
//!
//! Gantree: L4_Algorithms → Vqe
//!
//! Two-qubit H₂ Hamiltonian as a sum of Pauli terms. A hardware-efficient
//! ansatz (RY layer + CX chain per layer, closing RY layer) prepares the
//! trial state; each non-identity term is measured in its own basis and
//! the energies are summed. One iteration submits all term circuits as a
//! single batch.

use qdemo_backend::report::DemoReport;
use qdemo_backend::{run_batch, Backend, ExecutionResult, StateVector};
use qdemo_core::constants::chemistry::{CHEMICAL_ACCURACY, H2_EXACT_ENERGY, H2_TERMS};
use qdemo_core::constants::execution::DEFAULT_SEED;
use qdemo_core::{Circuit, CircuitBuilder, Pauli, PauliString, QdemoError, QdemoResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Weighted Pauli sum
/// Gantree: Hamiltonian // 해밀토니안
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hamiltonian {
    /// (Pauli string, coefficient); character i acts on qubit i
    pub terms: Vec<(PauliString, f64)>,
}

impl Hamiltonian {
    /// Build from string terms
    pub fn from_terms(terms: &[(&str, f64)]) -> QdemoResult<Self> {
        let terms = terms
            .iter()
            .map(|&(p, c)| Ok((PauliString::parse(p)?, c)))
            .collect::<QdemoResult<Vec<_>>>()?;
        let width = terms.first().map(|(p, _)| p.len()).unwrap_or(0);
        if width == 0 || terms.iter().any(|(p, _)| p.len() != width) {
            return Err(QdemoError::InvalidParameter(
                "Hamiltonian terms must share a non-zero width".into(),
            ));
        }
        Ok(Self { terms })
    }

    /// H₂ at 0.735 Å, STO-3G, two-qubit reduction
    pub fn h2() -> Self {
        Self {
            terms: H2_TERMS
                .iter()
                .filter_map(|&(p, c)| PauliString::parse(p).ok().map(|ps| (ps, c)))
                .collect(),
        }
    }

    /// Qubits the terms act on
    pub fn num_qubits(&self) -> usize {
        self.terms.first().map(|(p, _)| p.len()).unwrap_or(0)
    }

    /// Sum of identity coefficients
    pub fn constant(&self) -> f64 {
        self.terms
            .iter()
            .filter(|(p, _)| p.is_identity())
            .map(|(_, c)| c)
            .sum()
    }

    /// Terms that need a measurement
    pub fn measured_terms(&self) -> impl Iterator<Item = &(PauliString, f64)> {
        self.terms.iter().filter(|(p, _)| !p.is_identity())
    }
}

/// Parameters needed by the ansatz
pub fn num_parameters(num_qubits: usize, layers: usize) -> usize {
    num_qubits * (layers + 1)
}

/// Hardware-efficient ansatz
/// Gantree: ansatz(n, params, layers) -> Circuit // 안사츠
pub fn ansatz(num_qubits: usize, params: &[f64], layers: usize) -> QdemoResult<Circuit> {
    let needed = num_parameters(num_qubits, layers);
    if params.len() != needed {
        return Err(QdemoError::InvalidParameter(format!(
            "ansatz needs {} parameters, got {}",
            needed,
            params.len()
        )));
    }
    let mut builder = CircuitBuilder::new(num_qubits).name("ansatz");
    for (layer, chunk) in params.chunks(num_qubits).enumerate() {
        builder = builder.ry_layer(chunk);
        if layer < layers {
            builder = builder.cx_chain();
        }
    }
    builder.try_build()
}

/// Ansatz, basis change for `pauli`, measure all
pub fn term_circuit(ansatz: &Circuit, pauli: &PauliString) -> QdemoResult<Circuit> {
    CircuitBuilder::new(ansatz.num_qubits())
        .name(format!("vqe_{}", pauli))
        .append(ansatz)
        .apply_pauli_basis(pauli)
        .measure_all()
        .try_build()
}

/// ⟨P⟩ from the counts of `term_circuit(_, pauli)`
pub fn term_expectation(result: &ExecutionResult, pauli: &PauliString) -> f64 {
    let support: Vec<usize> = (0..pauli.len())
        .filter(|&q| pauli.get(q).is_some_and(|p| p != Pauli::I))
        .collect();
    result.parity_expectation_on(&support)
}

/// Noise-free ⟨ψ(θ)|H|ψ(θ)⟩
/// Gantree: exact_energy(h, params, layers) -> f64 // 정확 에너지
pub fn exact_energy(hamiltonian: &Hamiltonian, params: &[f64], layers: usize) -> QdemoResult<f64> {
    let trial = ansatz(hamiltonian.num_qubits(), params, layers)?;
    let mut energy = hamiltonian.constant();
    for (pauli, coeff) in hamiltonian.measured_terms() {
        let mut state = StateVector::new(trial.num_qubits())?;
        for gate in term_circuit(&trial, pauli)?.gates().iter().filter(|g| !g.is_measurement()) {
            state.apply(gate)?;
        }
        let expectation: f64 = state
            .probabilities()
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let odd = (0..pauli.len())
                    .filter(|&q| pauli.get(q).is_some_and(|op| op != Pauli::I))
                    .filter(|&q| (index >> q) & 1 == 1)
                    .count()
                    % 2
                    == 1;
                if odd {
                    -p
                } else {
                    *p
                }
            })
            .sum();
        energy += coeff * expectation;
    }
    Ok(energy)
}

/// VQE configuration
/// Gantree: VqeConfig // 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VqeConfig {
    /// Hamiltonian to minimize
    pub hamiltonian: Hamiltonian,
    /// Entangling layers
    pub layers: usize,
    /// Energy evaluations
    pub iterations: usize,
    /// Standard deviation of the perturbation
    pub step: f64,
    /// Search seed
    pub seed: u64,
}

impl Default for VqeConfig {
    fn default() -> Self {
        Self {
            hamiltonian: Hamiltonian::h2(),
            layers: 1,
            iterations: 3,
            step: 0.1,
            seed: DEFAULT_SEED,
        }
    }
}

impl VqeConfig {
    /// Set the number of evaluations
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the perturbation scale
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the search seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of entangling layers
    pub fn with_layers(mut self, layers: usize) -> Self {
        self.layers = layers;
        self
    }
}

/// Estimate the energy at `params` with one batched submission
/// Gantree: estimate_energy(backend, config, params, shots) -> f64 // 에너지 측정
pub fn estimate_energy(
    backend: &dyn Backend,
    config: &VqeConfig,
    params: &[f64],
    shots: u64,
) -> QdemoResult<f64> {
    let h = &config.hamiltonian;
    let trial = ansatz(h.num_qubits(), params, config.layers)?;
    let terms: Vec<&(PauliString, f64)> = h.measured_terms().collect();
    let circuits = terms
        .iter()
        .map(|(p, _)| term_circuit(&trial, p))
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    Ok(terms
        .iter()
        .zip(&results)
        .fold(h.constant(), |e, ((p, c), r)| e + c * term_expectation(r, p)))
}

/// VQE report
#[derive(Debug, Clone)]
pub struct VqeReport {
    /// Configuration
    pub config: VqeConfig,
    /// Backend name
    pub backend: String,
    /// Energy per evaluation (Hartree)
    pub history: Vec<f64>,
    /// Lowest energy seen
    pub best_energy: f64,
    /// Parameters of `best_energy`
    pub best_params: Vec<f64>,
}

impl VqeReport {
    /// |best − reference|
    pub fn error(&self) -> f64 {
        (self.best_energy - H2_EXACT_ENERGY).abs()
    }
}

/// Seeded random search
/// Gantree: run(backend, config, shots) -> VqeReport // 최적화 루프
pub fn run(backend: &dyn Backend, config: &VqeConfig, shots: u64) -> QdemoResult<VqeReport> {
    let n = config.hamiltonian.num_qubits();
    if n == 0 || config.iterations == 0 {
        return Err(QdemoError::InvalidParameter(
            "need a Hamiltonian and at least one iteration".into(),
        ));
    }
    let n_params = num_parameters(n, config.layers);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut params: Vec<f64> = (0..n_params).map(|_| rng.gen_range(0.0..2.0 * PI)).collect();

    let mut history = Vec::with_capacity(config.iterations);
    let mut best_energy = f64::INFINITY;
    let mut best_params = params.clone();
    for iteration in 0..config.iterations {
        let energy = estimate_energy(backend, config, &params, shots)?;
        log::info!(
            "VQE iteration {}/{}: energy {:.6} Ha",
            iteration + 1,
            config.iterations,
            energy
        );
        history.push(energy);
        if energy < best_energy {
            best_energy = energy;
            best_params = params.clone();
        }
        params = best_params
            .iter()
            .map(|&x| {
                let z: f64 = rng.sample(StandardNormal);
                x + config.step * z
            })
            .collect();
    }

    Ok(VqeReport {
        config: config.clone(),
        backend: backend.name().to_string(),
        history,
        best_energy,
        best_params,
    })
}

impl DemoReport for VqeReport {
    fn title(&self) -> String {
        "VQE (H₂)".to_string()
    }

    /// Energy below the bare identity term, so the search found binding
    fn succeeded(&self) -> bool {
        self.best_energy < self.config.hamiltonian.constant()
    }
}

impl fmt::Display for VqeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VQE RESULTS")?;
        writeln!(f, "Backend: {}", self.backend)?;
        writeln!(f, "Qubits: {}", self.config.hamiltonian.num_qubits())?;
        writeln!(f, "Hamiltonian:")?;
        for (p, c) in &self.config.hamiltonian.terms {
            writeln!(f, "  {:+.8} · {}", c, p)?;
        }
        writeln!(f)?;
        writeln!(f, "Optimization history:")?;
        for (i, e) in self.history.iter().enumerate() {
            writeln!(f, "  Iteration {}: {:.6} Hartree", i + 1, e)?;
        }
        writeln!(f)?;
        writeln!(f, "Best energy: {:.6} Hartree", self.best_energy)?;
        writeln!(f, "Best parameters: {:.4?}", self.best_params)?;
        writeln!(f, "Exact H₂ ground state: {:.6} Hartree", H2_EXACT_ENERGY)?;
        writeln!(f, "Error: {:.6} Hartree", self.error())?;
        if self.error() < CHEMICAL_ACCURACY {
            writeln!(f, "Within chemical accuracy ({} Ha)", CHEMICAL_ACCURACY)?;
        }
        writeln!(f)?;
        writeln!(f, "Prepare |ψ(θ)⟩, measure ⟨H⟩ term by term, let the classical loop update θ.")?;
        if self.succeeded() {
            write!(f, "✓ Energy lowered below the identity offset")
        } else {
            write!(f, "✗ Search did not lower the energy below the identity offset")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_h2_hamiltonian() {
        let h = Hamiltonian::h2();
        assert_eq!(h.terms.len(), 6);
        assert_eq!(h.num_qubits(), 2);
        assert_relative_eq!(h.constant(), -1.052_373_2);
        assert_eq!(h.measured_terms().count(), 5);
        assert!(Hamiltonian::from_terms(&[("XX", 1.0), ("Z", 1.0)]).is_err());
    }

    #[test]
    fn test_ansatz_shape() {
        assert_eq!(num_parameters(2, 1), 4);
        let circuit = ansatz(2, &[0.1, 0.2, 0.3, 0.4], 1).unwrap();
        assert_eq!(circuit.count_ops().get("cx"), Some(&1));
        assert!(ansatz(2, &[0.1], 1).is_err());
    }

    #[test]
    fn test_exact_energy_of_basis_state() {
        // RY(π) on qubit 1 only: |q1 q0⟩ = |10⟩, ⟨IZ⟩ = −1, ⟨ZI⟩ = +1, ⟨ZZ⟩ = −1
        let h = Hamiltonian::h2();
        let energy = exact_energy(&h, &[0.0, 0.0, 0.0, PI], 1).unwrap();
        let expected = -1.052_373_2 - 0.397_937_42 - 0.397_937_42 + 0.011_280_1;
        assert_relative_eq!(energy, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_sampled_energy_tracks_exact() {
        let backend = SimulatorBackend::ideal(2).with_seed(5);
        let config = VqeConfig::default();
        let params = [0.3, 1.1, -0.4, 2.0];
        let sampled = estimate_energy(&backend, &config, &params, 20_000).unwrap();
        let exact = exact_energy(&config.hamiltonian, &params, 1).unwrap();
        assert!((sampled - exact).abs() < 0.03, "{} vs {}", sampled, exact);
    }

    #[test]
    fn test_search_is_reproducible_and_descends() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let config = VqeConfig::default().with_iterations(40).with_step(1.0);
        let a = run(&backend, &config, 1024).unwrap();
        let b = run(&backend, &config, 1024).unwrap();
        assert_eq!(a.history, b.history);
        assert!(a.best_energy < -1.0, "best {}", a.best_energy);
        assert!(a.succeeded());

        let short = run(&backend, &VqeConfig::default(), 1024).unwrap();
        assert_eq!(short.history.len(), 3);
        let min = short.history.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_relative_eq!(short.best_energy, min);
    }
}
