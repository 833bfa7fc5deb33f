//! # qdemo Core
//!
//! Core types, gates, circuits and topology for the qdemo quantum
//! algorithm demos.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qdemo_core // L0+L1: Foundation + Circuit
//!     L0_Foundation // 기반 타입/상수/에러
//!         CoreTypes // 핵심 타입, 비트열, 파울리 문자열
//!         Constants // 실행/QKD/화학 상수
//!         Errors // 에러 타입
//!     L1_Circuit // 회로 구조
//!         Gate // 게이트 enum (측정, 조건부 포함)
//!         Circuit // 회로 구조체
//!         CircuitBuilder // 빌더 패턴
//!         Topology // 큐비트 토폴로지
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qdemo_core::prelude::*;
//!
//! // Bell pair measured into two classical bits
//! let circuit = CircuitBuilder::new(2)
//!     .h(0)
//!     .cx(0, 1)
//!     .measure_all()
//!     .try_build()
//!     .unwrap();
//!
//! assert_eq!(circuit.num_clbits(), 2);
//! println!("{}", circuit.to_qasm3());
//! ```
//!
//! ## Dynamic Circuits
//!
//! ```rust
//! use qdemo_core::prelude::*;
//!
//! let circuit = CircuitBuilder::with_clbits(2, 2)
//!     .h(0)
//!     .measure(0, 0)
//!     .c_if(0, true, Gate::X(1))
//!     .measure(1, 1)
//!     .try_build()
//!     .unwrap();
//!
//! assert!(circuit.has_mid_circuit_measurement());
//! ```
//!
//! ## Bit Order
//!
//! Count keys print the classical register with the highest bit on the
//! left, so classical bit 0 is the rightmost character:
//!
//! ```rust
//! use qdemo_core::prelude::*;
//!
//! let key = Bitstring::parse("10").unwrap();
//! assert_eq!(key.bit(0), Some(false));
//! assert_eq!(key.bit(1), Some(true));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Qubit topology (Gantree: L1_Circuit → Topology)
pub mod topology;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use constants::{chemistry, execution, qkd, tolerance};
pub use error::{QdemoError, QdemoResult};
pub use gate::Gate;
pub use topology::Topology;
pub use types::{
    Angle, Basis, Bitstring, ClbitId, Counts, Pauli, PauliString, Probability, QubitId,
};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qdemo_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::constants::{chemistry, execution, qkd, tolerance};
    pub use crate::error::{QdemoError, QdemoResult};
    pub use crate::gate::Gate;
    pub use crate::topology::Topology;
    pub use crate::types::{
        Angle, Basis, Bitstring, ClbitId, Counts, Pauli, PauliString, Probability,
        QubitId,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================
