//! Noise model for the reference simulator
//!
//! Gantree: L2_Backend → NoiseModel
//!
//! Depolarizing gate errors and symmetric readout flips, enough to show
//! how hardware noise smears the demos' ideal distributions.

use qdemo_core::{Probability, QdemoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate and readout error rates
/// Gantree: NoiseModel // 노이즈 모델
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Single-qubit gate error rate
    /// Gantree: gate_error_1q: f64 // 1Q 에러
    gate_error_1q: f64,

    /// Error rate for gates on two or more qubits
    /// Gantree: gate_error_2q: f64 // 2Q 에러
    gate_error_2q: f64,

    /// Readout bit-flip probability
    /// Gantree: readout_error: f64 // 측정 에러
    readout_error: f64,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new noise model with validation
    /// Gantree: new(e1,e2,ro) -> Result<Self> // 생성+검증
    pub fn new(gate_error_1q: f64, gate_error_2q: f64, readout_error: f64) -> QdemoResult<Self> {
        Ok(Self {
            gate_error_1q: Probability::new(gate_error_1q)?.value(),
            gate_error_2q: Probability::new(gate_error_2q)?.value(),
            readout_error: Probability::new(readout_error)?.value(),
        })
    }

    /// Noiseless model
    /// Gantree: ideal() -> Self // 이상적
    pub fn ideal() -> Self {
        Self {
            gate_error_1q: 0.0,
            gate_error_2q: 0.0,
            readout_error: 0.0,
        }
    }

    /// Typical IBM Eagle/Heron error rates
    /// Gantree: ibm_typical() -> Self // IBM 전형
    pub fn ibm_typical() -> Self {
        Self {
            gate_error_1q: 0.0003,
            gate_error_2q: 0.01,
            readout_error: 0.015,
        }
    }

    /// Single depolarizing knob: 1Q = p, 2Q = 10p, readout = p/4
    pub fn from_depol(p_depol: f64) -> QdemoResult<Self> {
        Self::new(p_depol, (p_depol * 10.0).min(1.0), p_depol / 4.0)
    }

    /// Set readout error
    pub fn with_readout_error(mut self, p: f64) -> QdemoResult<Self> {
        self.readout_error = Probability::new(p)?.value();
        Ok(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Single-qubit gate error rate
    pub fn gate_error_1q(&self) -> f64 {
        self.gate_error_1q
    }

    /// Multi-qubit gate error rate
    pub fn gate_error_2q(&self) -> f64 {
        self.gate_error_2q
    }

    /// Readout error rate
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Error rate for a gate touching `num_qubits` qubits
    pub fn gate_error(&self, num_qubits: usize) -> f64 {
        match num_qubits {
            0 => 0.0,
            1 => self.gate_error_1q,
            _ => self.gate_error_2q,
        }
    }

    /// True if every rate is zero
    pub fn is_ideal(&self) -> bool {
        self.gate_error_1q == 0.0 && self.gate_error_2q == 0.0 && self.readout_error == 0.0
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::ideal()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseModel(1q={:.2e}, 2q={:.2e}, readout={:.2e})",
            self.gate_error_1q, self.gate_error_2q, self.readout_error
        )
    }
}
