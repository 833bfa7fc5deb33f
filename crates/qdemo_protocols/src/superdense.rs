//! Superdense coding
//!
//! Gantree: L5_Protocols → Superdense
//!
//! One shared Bell pair carries two classical bits in one qubit. Alice
//! applies X for the left message bit and Z for the right one; Bob's
//! CX then H on q0 turns the four Bell states back into the message,
//! read as the key "q1q0".

use qdemo_backend::report::{self, DemoReport};
use qdemo_backend::{run_batch, Backend, ExecutionResult};
use qdemo_core::{Circuit, CircuitBuilder, QdemoError, QdemoResult};
use std::fmt;

/// The four two-bit messages
pub const ALL_MESSAGES: [&str; 4] = ["00", "01", "10", "11"];

/// Operation Alice applies for a message
pub fn encoding_label(message: &str) -> &'static str {
    match message {
        "00" => "I",
        "01" => "Z",
        "10" => "X",
        "11" => "ZX",
        _ => "?",
    }
}

fn validate(message: &str) -> QdemoResult<()> {
    if message.len() != 2 || !message.chars().all(|c| c == '0' || c == '1') {
        return Err(QdemoError::InvalidBitstring(format!(
            "superdense message must be two bits, got '{}'",
            message
        )));
    }
    Ok(())
}

/// Bell pair, Alice's encoding on q0, Bob's decoding, measure both
/// Gantree: build_circuit(message) -> Circuit // 데모 회로
pub fn build_circuit(message: &str) -> QdemoResult<Circuit> {
    validate(message)?;
    let mut builder = CircuitBuilder::new(2)
        .name(format!("superdense_{}", message))
        .h(0)
        .cx(0, 1)
        .barrier();
    if message.starts_with('1') {
        builder = builder.x(0);
    }
    if message.ends_with('1') {
        builder = builder.z(0);
    }
    builder.barrier().cx(0, 1).h(0).barrier().measure_all().try_build()
}

/// Outcome for one message
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    /// Message sent
    pub message: String,
    /// Raw result
    pub result: ExecutionResult,
    /// Most frequent decoded key
    pub decoded: String,
    /// Fraction of shots decoding to the message
    pub success_rate: f64,
}

/// Superdense coding report over several messages
#[derive(Debug, Clone)]
pub struct SuperdenseReport {
    /// Per-message outcomes in submission order
    pub outcomes: Vec<MessageOutcome>,
}

impl SuperdenseReport {
    /// Mean success rate over all messages
    pub fn average_success(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.outcomes.iter().map(|o| o.success_rate).sum::<f64>() / self.outcomes.len() as f64
    }
}

/// Decode one message's counts
/// Gantree: analyze(message, result) -> MessageOutcome // 분석
pub fn analyze(message: &str, result: &ExecutionResult) -> QdemoResult<MessageOutcome> {
    let (decoded, _) = result.most_frequent().ok_or(QdemoError::NoCounts)?;
    Ok(MessageOutcome {
        message: message.to_string(),
        result: result.clone(),
        decoded,
        success_rate: result.probability(message),
    })
}

/// Send every message as one batch
/// Gantree: run(backend, messages, shots) -> SuperdenseReport // 실행
pub fn run(backend: &dyn Backend, messages: &[&str], shots: u64) -> QdemoResult<SuperdenseReport> {
    let circuits = messages
        .iter()
        .map(|m| build_circuit(m))
        .collect::<QdemoResult<Vec<_>>>()?;
    let results = run_batch(backend, &circuits, shots)?;
    let outcomes = messages
        .iter()
        .zip(&results)
        .map(|(m, r)| analyze(m, r))
        .collect::<QdemoResult<Vec<_>>>()?;
    Ok(SuperdenseReport { outcomes })
}

impl DemoReport for SuperdenseReport {
    fn title(&self) -> String {
        "Superdense coding".to_string()
    }

    fn succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.decoded == o.message)
    }
}

impl fmt::Display for SuperdenseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SUPERDENSE CODING RESULTS")?;
        if let Some(first) = self.outcomes.first() {
            writeln!(f, "Backend: {}", first.result.metadata.backend)?;
            writeln!(f, "Shots per message: {}", first.result.shots)?;
        }
        writeln!(f)?;
        for outcome in &self.outcomes {
            writeln!(
                f,
                "Message '{}' (Alice applies {}):",
                outcome.message,
                encoding_label(&outcome.message)
            )?;
            report::write_top_counts(f, &outcome.result, 4, |key| {
                if key == outcome.message {
                    " ← sent".to_string()
                } else {
                    String::new()
                }
            })?;
            writeln!(
                f,
                "  Decoded: {}  success {:.1}% {}",
                outcome.decoded,
                outcome.success_rate * 100.0,
                report::check(outcome.decoded == outcome.message)
            )?;
            writeln!(f)?;
        }
        writeln!(f, "Average success: {:.1}%", self.average_success() * 100.0)?;
        write!(f, "Two classical bits sent with one qubit plus one shared Bell pair")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdemo_backend::SimulatorBackend;

    #[test]
    fn test_every_message_decodes_exactly() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let report = run(&backend, &ALL_MESSAGES, 500).unwrap();
        assert_eq!(report.outcomes.len(), 4);
        for outcome in &report.outcomes {
            assert_eq!(outcome.decoded, outcome.message);
            assert_eq!(outcome.success_rate, 1.0);
        }
        assert!(report.succeeded());
        assert_eq!(report.average_success(), 1.0);
    }

    #[test]
    fn test_encoding_gates() {
        let ops = build_circuit("11").unwrap().count_ops();
        assert_eq!(ops.get("x"), Some(&1));
        assert_eq!(ops.get("z"), Some(&1));
        assert_eq!(build_circuit("00").unwrap().count_ops().get("x"), None);
        assert_eq!(encoding_label("01"), "Z");
    }

    #[test]
    fn test_rejects_bad_message() {
        assert!(build_circuit("1").is_err());
        assert!(build_circuit("012").is_err());
        assert!(build_circuit("a1").is_err());
    }
}
