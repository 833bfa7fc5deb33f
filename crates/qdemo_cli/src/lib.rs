//! qdemo CLI
//!
//! Command-line front end for the demo crates. Every demo is a
//! subcommand; the global options pick where circuits run.
//!
//! # Usage
//!
//! ```bash
//! # Grover on the ideal simulator
//! qdemo --backend simulator grover --marked 101
//!
//! # BB84 with and without an eavesdropper on the noisy simulator
//! qdemo --backend noisy bb84 --compare
//!
//! # Steane code on the least busy IBM device
//! qdemo --backend ibm steane --input plus
//!
//! # Every demo on the simulator, then a summary table
//! qdemo all
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use qdemo_core::constants::execution::{DEFAULT_SEED, DEFAULT_SHOTS};

pub mod backend;
pub mod demos;

/// qdemo Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "qdemo")]
#[command(author, version, about = "Textbook quantum algorithm demos for IBM Quantum hardware")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Execution options shared by every demo
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Demo to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where circuits are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Ideal seeded statevector simulator
    Simulator,
    /// Simulator with IBM-typical depolarizing and readout noise
    Noisy,
    /// IBM Quantum hardware through Sampler V2
    Ibm,
}

/// Global options
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Execution backend (defaults to ibm when credentials are found)
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// IBM device name; the least busy device is used when omitted
    #[arg(long, global = true)]
    pub ibm_backend: Option<String>,

    /// Shots per circuit
    #[arg(long, default_value_t = DEFAULT_SHOTS, global = true)]
    pub shots: u64,

    /// Seed for the simulator and for seeded demo choices
    #[arg(long, default_value_t = DEFAULT_SEED, global = true)]
    pub seed: u64,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Logical input for the error-correction demos
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputState {
    /// |0⟩
    Zero,
    /// |1⟩
    One,
    /// |+⟩
    Plus,
    /// |−⟩
    Minus,
}

/// SWAP test circuit family
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwapVariant {
    /// Ancilla with a controlled SWAP
    Ancilla,
    /// Bell-basis measurement without ancilla
    Destructive,
}

/// Demo subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deutsch's algorithm on all four one-bit oracles
    Deutsch {
        /// Single oracle (constant_0, constant_1, balanced_identity, balanced_negation)
        #[arg(long)]
        oracle: Option<String>,
    },

    /// Deutsch–Jozsa: constant or balanced in one query
    DeutschJozsa {
        /// Input qubits
        #[arg(short, long, default_value_t = 5)]
        inputs: usize,

        /// Constant oracle returning this bit instead of a balanced one
        #[arg(long, conflicts_with = "pattern")]
        constant: Option<u8>,

        /// Balanced pattern, character i weights input qubit i
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Bernstein–Vazirani: recover a hidden bitstring in one query
    BernsteinVazirani {
        /// Secret bitstring
        #[arg(long, default_value = qdemo_algorithms::bernstein_vazirani::DEFAULT_SECRET)]
        secret: String,

        /// Run the secret sweep instead
        #[arg(long)]
        sweep: bool,
    },

    /// Grover search for marked states
    Grover {
        /// Marked states, all of the same width
        #[arg(long, num_args = 1.., default_values_t = ["10101".to_string()])]
        marked: Vec<String>,

        /// Iterations (optimal when omitted)
        #[arg(long)]
        iterations: Option<usize>,
    },

    /// Quantum Fourier transform
    Qft {
        /// Register size
        #[arg(short = 'n', long, default_value_t = 5)]
        qubits: usize,

        /// Input basis state
        #[arg(long, default_value_t = 0)]
        input: usize,

        /// Apply only the forward transform
        #[arg(long)]
        forward: bool,
    },

    /// Quantum phase estimation of a phase gate
    Qpe {
        /// Counting qubits
        #[arg(short, long, default_value_t = 3)]
        counting: usize,

        /// Phase in [0, 1)
        #[arg(long, default_value_t = 0.25)]
        phase: f64,
    },

    /// Shor's algorithm for N = 15
    Shor {
        /// Number to factor
        #[arg(short = 'n', long, default_value_t = 15)]
        number: u64,

        /// Base a
        #[arg(short, long, default_value_t = 7)]
        base: u64,

        /// Counting qubits
        #[arg(long, default_value_t = 4)]
        counting: usize,
    },

    /// QAOA MaxCut on a ring graph
    Qaoa {
        /// Ring size
        #[arg(long, default_value_t = 4)]
        nodes: usize,

        /// Cost/mixer layers
        #[arg(short = 'p', long, default_value_t = 1)]
        layers: usize,

        /// Parameter evaluations
        #[arg(long, default_value_t = 3)]
        iterations: usize,
    },

    /// VQE for the H₂ ground state
    Vqe {
        /// Entangling layers
        #[arg(long, default_value_t = 1)]
        layers: usize,

        /// Energy evaluations
        #[arg(long, default_value_t = 3)]
        iterations: usize,
    },

    /// SWAP test overlap estimation
    SwapTest {
        /// Circuit family
        #[arg(long, value_enum, default_value_t = SwapVariant::Ancilla)]
        variant: SwapVariant,
    },

    /// Discrete-time quantum walk on a cycle
    QuantumWalk {
        /// Steps (3 for the plain walk, 6 when searching)
        #[arg(long)]
        steps: Option<usize>,

        /// Search for this vertex on 8 vertices instead
        #[arg(long)]
        search: Option<usize>,
    },

    /// Amplitude estimation
    AmplitudeEstimation {
        /// Amplitude to estimate
        #[arg(short, long, default_value_t = 0.25)]
        amplitude: f64,

        /// Counting qubits
        #[arg(short, long, default_value_t = 3)]
        counting: usize,
    },

    /// Quantum counting of marked search states
    QuantumCounting {
        /// Marked states as integers
        #[arg(long, num_args = 1.., default_values_t = [3usize])]
        marked: Vec<usize>,

        /// Search qubits
        #[arg(long, default_value_t = 2)]
        search: usize,

        /// Counting qubits
        #[arg(short, long, default_value_t = 3)]
        counting: usize,
    },

    /// HHL linear solver
    Hhl {
        /// Solve the two-clock-qubit system
        #[arg(long)]
        two_by_two: bool,

        /// Right-hand side basis state (0 or 1)
        #[arg(long, default_value_t = 0)]
        rhs: usize,
    },

    /// Simon's period finding
    Simon {
        /// Secret bitstring
        #[arg(long, default_value = qdemo_algorithms::simon::DEFAULT_SECRET)]
        secret: String,

        /// Run the secret sweep instead
        #[arg(long)]
        sweep: bool,
    },

    /// Quantum teleportation
    Teleportation {
        /// Deferred measurement instead of dynamic corrections
        #[arg(long)]
        deferred: bool,

        /// Send RZ(φ)·RY(θ)|0⟩ with this θ instead of |1⟩
        #[arg(long)]
        theta: Option<f64>,

        /// Azimuth φ of the sent state
        #[arg(long, default_value_t = 0.0, requires = "theta")]
        phi: f64,
    },

    /// Superdense coding of two classical bits
    Superdense {
        /// Messages to send (all four when omitted)
        #[arg(long, num_args = 1..)]
        messages: Vec<String>,
    },

    /// BB84 quantum key distribution
    Bb84 {
        /// Qubits sent
        #[arg(long, default_value_t = qdemo_core::constants::qkd::DEFAULT_BB84_BITS)]
        bits: usize,

        /// Insert an intercept-resend eavesdropper
        #[arg(long)]
        eve: bool,

        /// Run with and without Eve and compare
        #[arg(long, conflicts_with = "eve")]
        compare: bool,
    },

    /// E91 entanglement-based key distribution with a CHSH test
    E91 {
        /// Bell pairs spent on the key
        #[arg(long, default_value_t = 5)]
        rounds: usize,
    },

    /// Three-qubit bit-flip code
    BitFlip {
        /// Encoded bit
        #[arg(long, default_value_t = 1)]
        initial: u8,

        /// Data qubit hit by X (0..=2)
        #[arg(long, default_value_t = 1, conflicts_with = "no_error")]
        error_qubit: usize,

        /// Skip error injection
        #[arg(long)]
        no_error: bool,

        /// Run every error position
        #[arg(long)]
        sweep: bool,
    },

    /// Three-qubit phase-flip code
    PhaseFlip {
        /// Encoded bit
        #[arg(long, default_value_t = 1)]
        initial: u8,

        /// Data qubit hit by Z (0..=2)
        #[arg(long, default_value_t = 1, conflicts_with = "no_error")]
        error_qubit: usize,

        /// Skip error injection
        #[arg(long)]
        no_error: bool,

        /// Run every error position
        #[arg(long)]
        sweep: bool,
    },

    /// Shor's nine-qubit code
    ShorCode {
        /// Logical input
        #[arg(long, value_enum, default_value_t = InputState::Zero)]
        input: InputState,

        /// Errors to inject, e.g. X1 Z4 (default cases when omitted)
        #[arg(long, num_args = 1..)]
        errors: Vec<String>,
    },

    /// Steane's seven-qubit code
    Steane {
        /// Logical input
        #[arg(long, value_enum, default_value_t = InputState::Zero)]
        input: InputState,

        /// Errors to inject, e.g. X2 Z5 (default cases when omitted)
        #[arg(long, num_args = 1..)]
        errors: Vec<String>,
    },

    /// List IBM Quantum devices visible to the credentials
    ListBackends,

    /// Run every demo on the simulator and print a summary
    All,
}

impl Commands {
    /// Qubits the demo needs, used to pick an IBM device
    pub fn min_qubits(&self) -> usize {
        match self {
            Commands::Deutsch { .. } => 2,
            Commands::DeutschJozsa { inputs, .. } => inputs + 1,
            Commands::BernsteinVazirani { secret, sweep } => {
                if *sweep {
                    6
                } else {
                    secret.len() + 1
                }
            }
            Commands::Grover { marked, .. } => marked.first().map(|m| m.len()).unwrap_or(1),
            Commands::Qft { qubits, .. } => *qubits,
            Commands::Qpe { counting, .. } => counting + 1,
            Commands::Shor { counting, .. } => counting + 4,
            Commands::Qaoa { nodes, .. } => *nodes,
            Commands::Vqe { .. } => 2,
            Commands::SwapTest { .. } => 3,
            Commands::QuantumWalk { search, .. } => {
                if search.is_some() {
                    4
                } else {
                    3
                }
            }
            Commands::AmplitudeEstimation { counting, .. } => counting + 1,
            Commands::QuantumCounting { search, counting, .. } => search + counting,
            Commands::Hhl { two_by_two, .. } => {
                if *two_by_two {
                    4
                } else {
                    3
                }
            }
            Commands::Simon { secret, sweep } => {
                if *sweep {
                    10
                } else {
                    2 * secret.len()
                }
            }
            Commands::Teleportation { .. } => 3,
            Commands::Superdense { .. } => 2,
            Commands::Bb84 { bits, .. } => 2 * bits,
            Commands::E91 { rounds } => (2 * rounds).max(2),
            Commands::BitFlip { .. } | Commands::PhaseFlip { .. } => 5,
            Commands::ShorCode { .. } => 9,
            Commands::Steane { .. } => 13,
            Commands::ListBackends | Commands::All => 0,
        }
    }
}
