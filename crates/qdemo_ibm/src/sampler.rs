//! Sampler V2 payloads
//!
//! Gantree: L3_Ibm → Sampler
//!
//! A primitive unified bloc (PUB) is `[circuit, parameter_values, shots]`.
//! Results come back per PUB as packed hex samples for each classical
//! register; decoding expands them into zero-padded bit strings and
//! tallies counts.

use qdemo_core::Counts;
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Register name used by the emitted OpenQASM
pub const DEFAULT_REGISTER: &str = "c";

/// Sampler primitive version
pub const SAMPLER_VERSION: u32 = 2;

/// Decoding errors
#[derive(Debug, Error, PartialEq)]
pub enum SamplerError {
    /// Result has fewer PUBs than submitted
    #[error("expected {expected} PUB results, got {actual}")]
    ResultCountMismatch {
        /// Submitted PUBs
        expected: usize,
        /// Returned PUB results
        actual: usize,
    },

    /// PUB result has no such register
    #[error("register '{0}' missing from PUB result")]
    MissingRegister(String),

    /// Sample is not a hex literal
    #[error("invalid sample '{0}'")]
    InvalidSample(String),
}

/// One PUB: an ISA circuit and its shot count
/// Gantree: SamplerPub // PUB
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerPub {
    /// OpenQASM 3 source
    pub qasm: String,
    /// Shots
    pub shots: u64,
}

impl SamplerPub {
    /// Create a PUB
    pub fn new(qasm: impl Into<String>, shots: u64) -> Self {
        Self {
            qasm: qasm.into(),
            shots,
        }
    }
}

impl Serialize for SamplerPub {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // [qasm, null, shots]; no circuit parameters
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.qasm)?;
        tuple.serialize_element(&Option::<()>::None)?;
        tuple.serialize_element(&self.shots)?;
        tuple.end()
    }
}

/// `params` block of a sampler job
#[derive(Debug, Clone, Serialize)]
pub struct SamplerParams {
    /// PUBs in submission order
    pub pubs: Vec<SamplerPub>,
    /// Primitive version
    pub version: u32,
}

impl SamplerParams {
    /// Wrap PUBs
    pub fn new(pubs: Vec<SamplerPub>) -> Self {
        Self {
            pubs,
            version: SAMPLER_VERSION,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// `GET /jobs/{id}/results` body
#[derive(Debug, Clone, Deserialize)]
pub struct SamplerResult {
    /// One entry per PUB
    pub results: Vec<PubResult>,

    /// Job-level metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Data of one PUB
#[derive(Debug, Clone, Deserialize)]
pub struct PubResult {
    /// Register name → samples
    pub data: HashMap<String, BitArray>,

    /// PUB metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Packed shot outcomes for one classical register
#[derive(Debug, Clone, Deserialize)]
pub struct BitArray {
    /// One hex literal per shot, e.g. `"0x5"`
    pub samples: Vec<String>,
    /// Register width
    pub num_bits: usize,
}

impl BitArray {
    /// Per-shot bit strings, clbit 0 rightmost
    pub fn bitstrings(&self) -> Result<Vec<String>, SamplerError> {
        self.samples
            .iter()
            .map(|s| hex_to_bits(s, self.num_bits))
            .collect()
    }

    /// Tally of the shot outcomes
    /// Gantree: counts() -> Counts // 집계
    pub fn counts(&self) -> Result<Counts, SamplerError> {
        let mut counts: Counts = HashMap::new();
        for bits in self.bitstrings()? {
            *counts.entry(bits).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

impl SamplerResult {
    /// Counts for register `register` of every PUB, checking the PUB count
    pub fn counts(&self, register: &str, expected: usize) -> Result<Vec<Counts>, SamplerError> {
        if self.results.len() != expected {
            return Err(SamplerError::ResultCountMismatch {
                expected,
                actual: self.results.len(),
            });
        }
        self.results
            .iter()
            .map(|pub_result| {
                pub_result
                    .data
                    .get(register)
                    .ok_or_else(|| SamplerError::MissingRegister(register.to_string()))?
                    .counts()
            })
            .collect()
    }
}

/// Expand a hex sample into a `width`-bit string, most significant first.
/// Bits above `width` are dropped.
/// Gantree: hex_to_bits(hex, width) -> String // 16진 디코딩
pub fn hex_to_bits(sample: &str, width: usize) -> Result<String, SamplerError> {
    let digits = sample
        .strip_prefix("0x")
        .or_else(|| sample.strip_prefix("0X"))
        .unwrap_or(sample);
    if digits.is_empty() {
        return Err(SamplerError::InvalidSample(sample.to_string()));
    }

    let mut bits = String::with_capacity(digits.len() * 4);
    for ch in digits.chars() {
        let nibble = ch
            .to_digit(16)
            .ok_or_else(|| SamplerError::InvalidSample(sample.to_string()))?;
        bits.push_str(&format!("{:04b}", nibble));
    }

    Ok(if bits.len() >= width {
        bits[bits.len() - width..].to_string()
    } else {
        format!("{}{}", "0".repeat(width - bits.len()), bits)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pub_serialization() {
        let params = SamplerParams::new(vec![SamplerPub::new("OPENQASM 3.0;", 1024)]);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pubs": [["OPENQASM 3.0;", null, 1024]], "version": 2})
        );
    }

    #[test]
    fn test_hex_to_bits() {
        assert_eq!(hex_to_bits("0x5", 3).unwrap(), "101");
        assert_eq!(hex_to_bits("0x0", 5).unwrap(), "00000");
        assert_eq!(hex_to_bits("0x1f", 5).unwrap(), "11111");
        assert_eq!(hex_to_bits("0xA", 6).unwrap(), "001010");
        // wider than u128
        let wide = format!("0x1{}", "0".repeat(40));
        let bits = hex_to_bits(&wide, 161).unwrap();
        assert_eq!(bits.len(), 161);
        assert!(bits.starts_with('1'));
        assert_eq!(bits.matches('1').count(), 1);

        assert!(hex_to_bits("0x", 2).is_err());
        assert!(hex_to_bits("0xz1", 2).is_err());
    }

    #[test]
    fn test_decode_results() {
        let body = r#"{
            "results": [
                {"data": {"c": {"samples": ["0x0", "0x3", "0x3", "0x1"], "num_bits": 2}},
                 "metadata": {"circuit_metadata": {}}},
                {"data": {"c": {"samples": ["0x1"], "num_bits": 1}}}
            ],
            "metadata": {"version": 2}
        }"#;
        let result: SamplerResult = serde_json::from_str(body).unwrap();
        let counts = result.counts(DEFAULT_REGISTER, 2).unwrap();
        assert_eq!(counts[0].get("11"), Some(&2));
        assert_eq!(counts[0].get("00"), Some(&1));
        assert_eq!(counts[0].get("01"), Some(&1));
        assert_eq!(counts[1].get("1"), Some(&1));

        assert_eq!(
            result.counts(DEFAULT_REGISTER, 3).unwrap_err(),
            SamplerError::ResultCountMismatch { expected: 3, actual: 2 }
        );
        assert_eq!(
            result.counts("meas", 2).unwrap_err(),
            SamplerError::MissingRegister("meas".into())
        );
    }
}
