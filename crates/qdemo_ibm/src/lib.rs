//! # qdemo IBM
//!
//! IBM Quantum Platform integration for the qdemo circuits.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_ibm // L3: IBM Quantum
//!     Auth // 토큰, 인스턴스, IAM 교환
//!     Client // REST API v1
//!     Sampler // Sampler V2 PUB 인코딩/디코딩
//!     Job // 제출, 폴링, 결과
//!     Transpiler // ISA 변환 + 라우팅
//!     IbmBackend // Backend 구현
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qdemo_backend::Backend;
//! use qdemo_core::CircuitBuilder;
//! use qdemo_ibm::prelude::*;
//!
//! // Least busy device with at least 5 qubits
//! let backend = IbmBackend::least_busy(IbmCredentials::auto_load()?, 5)?;
//!
//! let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).measure_all().build();
//! let result = backend.execute(&circuit, 1024)?;
//!
//! println!("Counts: {:?}", result.counts);
//! ```
//!
//! ## Environment Variables
//!
//! ```bash
//! export IBM_QUANTUM_TOKEN="your-api-token"
//! export IBM_QUANTUM_INSTANCE="crn:v1:bluemix:public:quantum-computing:..."  # Optional
//! ```
//!
//! Without them, credentials are read from `~/.qiskit/qiskit-ibm.json`.
//!
//! ## Offline Lowering
//!
//! ```rust
//! use qdemo_core::CircuitBuilder;
//! use qdemo_ibm::{Transpiler, TranspilerConfig};
//!
//! let config = TranspilerConfig::for_backend(3, vec![(0, 1), (1, 2)]);
//! let transpiler = Transpiler::new(config).unwrap();
//!
//! let circuit = CircuitBuilder::new(3).h(0).cx(0, 2).measure_all().build();
//! let qasm = transpiler.to_qasm3(&circuit).unwrap();
//! assert!(qasm.contains("bit[3] c;"));
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Authentication (Gantree: L3_Ibm → Auth)
pub mod auth;

/// REST API client (Gantree: L3_Ibm → Client)
pub mod client;

/// Sampler V2 payloads (Gantree: L3_Ibm → Sampler)
pub mod sampler;

/// Job management (Gantree: L3_Ibm → Job)
pub mod job;

/// ISA lowering and routing (Gantree: L3_Ibm → Transpiler)
pub mod transpiler;

/// IBM backend implementation (Gantree: L3_Ibm → IbmBackend)
pub mod backend;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AuthError, CredentialSource, IbmCredentials, TokenType};
pub use backend::{list_backends, select_least_busy, IbmBackend, IbmBackendError};
pub use client::{BackendConfig, BackendInfo, BackendStatus, ClientError, IbmClient};
pub use job::{IbmJob, JobError, JobManager, JobResponse, JobStatus, JobSubmission};
pub use sampler::{hex_to_bits, BitArray, SamplerError, SamplerPub, SamplerResult};
pub use transpiler::{
    Entangler, NativeOp, TranspiledCircuit, Transpiler, TranspilerConfig, IBM_BASIS_GATES,
};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::auth::IbmCredentials;
    pub use crate::backend::{list_backends, select_least_busy, IbmBackend};
    pub use crate::client::IbmClient;
    pub use crate::job::{JobManager, JobStatus};
    pub use crate::transpiler::{Transpiler, TranspilerConfig};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::{Backend, SimulatorBackend};
    use qdemo_core::CircuitBuilder;

    #[test]
    fn test_credentials_header() {
        let creds = IbmCredentials::new("test_token_12345678901234567890123456789012");
        assert_eq!(creds.token_type(), TokenType::detect(creds.token()));
        let header = tokio_test::block_on(creds.auth_header()).unwrap();
        assert!(header.starts_with("Bearer "));
    }

    #[test]
    fn test_ghz_submission_payload() {
        let mut builder = CircuitBuilder::new(5).h(0);
        for i in 0..4 {
            builder = builder.cx(i, i + 1);
        }
        let circuit = builder.measure_all().build();

        let transpiler = Transpiler::new(TranspilerConfig::default()).unwrap();
        let isa = transpiler.transpile(&circuit).unwrap();
        assert_eq!(isa.two_qubit_count(), 4);
        assert_eq!(isa.num_swaps, 0);

        let submission = JobSubmission::sampler("ibm_fez", vec![SamplerPub::new(isa.to_qasm3(), 2048)]);
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["params"]["pubs"][0][2], 2048);
        assert!(json["params"]["pubs"][0][1].is_null());
        let qasm = json["params"]["pubs"][0][0].as_str().unwrap();
        assert!(qasm.contains("bit[5] c;"));
        assert_eq!(qasm.matches("cx $").count(), 4);
    }

    #[test]
    fn test_sampler_decoding_matches_simulator_keys() {
        // Simulated counts re-encoded the way the service packs them
        let circuit = CircuitBuilder::new(3).x(0).x(2).measure_all().build();
        let simulated = SimulatorBackend::ideal(3)
            .with_seed(7)
            .execute(&circuit, 16)
            .unwrap();
        assert_eq!(simulated.count("101"), 16);

        let samples: Vec<String> = (0..16).map(|_| "0x5".to_string()).collect();
        let body = serde_json::json!({
            "results": [{"data": {"c": {"samples": samples, "num_bits": 3}}}]
        });
        let result: SamplerResult = serde_json::from_value(body).unwrap();
        let counts = result.counts("c", 1).unwrap();
        assert_eq!(counts[0], simulated.counts);
    }

    #[test]
    fn test_routed_circuit_on_line() {
        let map: Vec<(usize, usize)> = (0..4).map(|i| (i, i + 1)).collect();
        let transpiler = Transpiler::new(TranspilerConfig::for_backend(5, map)).unwrap();
        let circuit = CircuitBuilder::new(5).h(0).cx(0, 4).measure_all().build();
        let isa = transpiler.transpile(&circuit).unwrap();

        assert!(isa.num_swaps >= 3);
        assert!(isa
            .count_ops()
            .keys()
            .all(|op| ["rz", "sx", "x", "cx", "measure", "barrier"].contains(op)));
    }
}
