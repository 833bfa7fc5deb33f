//! Backend selection from the global options

use crate::{BackendKind, GlobalOpts};
use anyhow::{bail, Context, Result};
use qdemo_backend::statevector::MAX_QUBITS;
use qdemo_backend::{Backend, SimulatorBackend};
use qdemo_ibm::{IbmBackend, IbmCredentials};

/// Backend kind after applying the credential default
pub fn resolve_kind(requested: Option<BackendKind>) -> Result<BackendKind> {
    match requested {
        Some(kind) => Ok(kind),
        None => match IbmCredentials::auto_load() {
            Ok(_) => Ok(BackendKind::Ibm),
            Err(e) => {
                log::debug!("No IBM credentials: {}", e);
                bail!("no IBM Quantum credentials found; pass --backend simulator to run locally")
            }
        },
    }
}

/// Local simulator for `kind`, seeded from the options
pub fn simulator(kind: BackendKind, seed: u64) -> SimulatorBackend {
    match kind {
        BackendKind::Noisy => SimulatorBackend::ibm_typical(MAX_QUBITS).with_seed(seed),
        _ => SimulatorBackend::ideal(MAX_QUBITS).with_seed(seed),
    }
}

/// Build the backend a demo runs on
///
/// For IBM, a named device is opened directly; otherwise the least busy
/// operational device with at least `min_qubits` qubits is chosen.
pub fn select(opts: &GlobalOpts, min_qubits: usize) -> Result<Box<dyn Backend>> {
    let kind = resolve_kind(opts.backend)?;
    let backend: Box<dyn Backend> = match kind {
        BackendKind::Simulator | BackendKind::Noisy => Box::new(simulator(kind, opts.seed)),
        BackendKind::Ibm => {
            let credentials = IbmCredentials::auto_load().context("loading IBM Quantum credentials")?;
            let backend = match &opts.ibm_backend {
                Some(name) => IbmBackend::new(name.clone(), credentials)
                    .with_context(|| format!("connecting to IBM backend '{}'", name))?,
                None => IbmBackend::least_busy(credentials, min_qubits)
                    .with_context(|| format!("selecting a device with at least {} qubits", min_qubits))?,
            };
            Box::new(backend)
        }
    };
    if backend.num_qubits() < min_qubits {
        bail!(
            "backend {} has {} qubits, the demo needs {}",
            backend.name(),
            backend.num_qubits(),
            min_qubits
        );
    }
    tracing::info!(backend = backend.name(), qubits = backend.num_qubits(), "backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(kind: BackendKind) -> GlobalOpts {
        GlobalOpts {
            backend: Some(kind),
            ibm_backend: None,
            shots: 100,
            seed: 7,
            verbose: false,
        }
    }

    #[test]
    fn test_explicit_kind_wins() {
        assert_eq!(resolve_kind(Some(BackendKind::Noisy)).unwrap(), BackendKind::Noisy);
    }

    #[test]
    fn test_simulators_cover_every_demo() {
        let ideal = select(&opts(BackendKind::Simulator), 13).unwrap();
        assert!(ideal.is_simulator());
        assert_eq!(ideal.num_qubits(), MAX_QUBITS);

        let noisy = select(&opts(BackendKind::Noisy), 5).unwrap();
        assert!(noisy.is_simulator());
    }

    #[test]
    fn test_rejects_oversized_demo() {
        assert!(select(&opts(BackendKind::Simulator), MAX_QUBITS + 1).is_err());
    }
}
