//! IBM Quantum backend
//!
//! Gantree: L3_Ibm → IbmBackend
//!
//! Blocking `Backend` implementation: lower circuits to the device ISA,
//! submit them as Sampler V2 PUBs of one job, wait, and decode counts.

use crate::auth::{AuthError, IbmCredentials};
use crate::client::{BackendConfig, BackendInfo, ClientError, IbmClient};
use crate::job::{JobError, JobManager, JobSubmission};
use crate::sampler::{SamplerError, SamplerPub, DEFAULT_REGISTER};
use crate::transpiler::{Transpiler, TranspilerConfig};
use qdemo_backend::{check_shots, Backend, ExecutionMetadata, ExecutionResult};
use qdemo_core::{execution, Circuit, QdemoError, QdemoResult};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Runtime;

/// IBM backend errors
#[derive(Debug, Error)]
pub enum IbmBackendError {
    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Client error
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Job error
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Result decoding error
    #[error("Result decoding error: {0}")]
    Sampler(#[from] SamplerError),

    /// Lowering failed
    #[error("Transpilation error: {0}")]
    Transpilation(#[from] QdemoError),

    /// No backend satisfies the request
    #[error("No backend available: {0}")]
    NotAvailable(String),

    /// Runtime construction failed
    #[error("Async runtime error: {0}")]
    Runtime(String),
}

impl From<IbmBackendError> for QdemoError {
    fn from(err: IbmBackendError) -> Self {
        match err {
            IbmBackendError::NotAvailable(msg) => QdemoError::BackendNotAvailable(msg),
            IbmBackendError::Transpilation(inner) => inner,
            other => QdemoError::BackendError(other.to_string()),
        }
    }
}

fn new_runtime() -> Result<Runtime, IbmBackendError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| IbmBackendError::Runtime(e.to_string()))
}

/// IBM Quantum backend
/// Gantree: IbmBackend // IBM 하드웨어 백엔드
pub struct IbmBackend {
    name: String,
    client: IbmClient,
    jobs: JobManager,
    transpiler: Transpiler,
    config: BackendConfig,
    runtime: Runtime,
    timeout: Duration,
}

impl IbmBackend {
    /// Connect to a named backend and load its configuration
    pub fn new(name: impl Into<String>, credentials: IbmCredentials) -> Result<Self, IbmBackendError> {
        let name = name.into();
        let runtime = new_runtime()?;
        let client = IbmClient::new(credentials)?;

        let config = runtime.block_on(client.get_backend_config(&name))?;
        let transpiler = Transpiler::new(TranspilerConfig::from_backend_config(&config))?;
        log::info!(
            "Using {} ({} qubits, entangler {})",
            name,
            transpiler.config().num_qubits,
            transpiler.entangler().name()
        );

        Ok(Self {
            jobs: JobManager::new(client.clone()),
            name,
            client,
            transpiler,
            config,
            runtime,
            timeout: Duration::from_secs(execution::JOB_TIMEOUT_S),
        })
    }

    /// Connect with auto-detected credentials
    pub fn auto_load(name: impl Into<String>) -> Result<Self, IbmBackendError> {
        Self::new(name, IbmCredentials::auto_load()?)
    }

    /// Connect to the least busy operational device with at least
    /// `min_qubits` qubits
    /// Gantree: least_busy(min_qubits) -> Self // 최소 대기열
    pub fn least_busy(credentials: IbmCredentials, min_qubits: usize) -> Result<Self, IbmBackendError> {
        let runtime = new_runtime()?;
        let client = IbmClient::new(credentials.clone())?;
        let backends = runtime.block_on(client.list_backends())?;
        let choice = select_least_busy(&backends, min_qubits)?;
        log::info!(
            "Least busy backend: {} (queue {})",
            choice.name,
            choice.queue_length.unwrap_or(0)
        );
        Self::new(choice.name.clone(), credentials)
    }

    /// Set the job wait timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backend configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Transpiler bound to this backend
    pub fn transpiler(&self) -> &Transpiler {
        &self.transpiler
    }

    /// Operational and pending-job status
    pub fn status(&self) -> Result<(bool, u64), IbmBackendError> {
        let status = self.runtime.block_on(self.client.get_backend_status(&self.name))?;
        Ok((status.operational, status.pending_jobs.unwrap_or(0)))
    }

    fn pubs(&self, circuits: &[Circuit], shots: u64) -> Result<Vec<SamplerPub>, IbmBackendError> {
        circuits
            .iter()
            .map(|circuit| {
                let isa = self.transpiler.transpile(circuit)?;
                log::debug!(
                    "{}: {} native ops, {} two-qubit, {} swaps",
                    circuit.name().unwrap_or("circuit"),
                    isa.ops.len(),
                    isa.two_qubit_count(),
                    isa.num_swaps
                );
                Ok(SamplerPub::new(isa.to_qasm3(), shots))
            })
            .collect()
    }

    /// Run circuits as one sampler job and return counts in input order
    /// Gantree: run_sampler(circuits, shots) -> Vec<ExecutionResult> // 샘플러 실행
    pub fn run_sampler(
        &self,
        circuits: &[Circuit],
        shots: u64,
    ) -> Result<Vec<ExecutionResult>, IbmBackendError> {
        let pubs = self.pubs(circuits, shots)?;
        let submission = JobSubmission::sampler(&self.name, pubs);
        let started = Instant::now();

        let (job_id, result) = self.runtime.block_on(async {
            let mut job = self.jobs.submit(&submission).await?;
            log::info!("Job ID: {}", job.id());
            job.wait(self.timeout).await?;
            let result = job.result().await?;
            Ok::<_, JobError>((job.id().to_string(), result))
        })?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let counts = result.counts(DEFAULT_REGISTER, circuits.len())?;

        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(index, counts)| {
                let mut extra = HashMap::new();
                extra.insert("pub_index".to_string(), index.to_string());
                ExecutionResult {
                    counts,
                    shots,
                    metadata: ExecutionMetadata {
                        backend: self.name.clone(),
                        job_id: Some(job_id.clone()),
                        execution_time_ms: Some(elapsed_ms),
                        simulated: false,
                        seed: None,
                        extra,
                    },
                }
            })
            .collect())
    }
}

impl Backend for IbmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.transpiler.config().num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QdemoResult<ExecutionResult> {
        check_shots(self, shots)?;
        self.run_sampler(std::slice::from_ref(circuit), shots)?
            .pop()
            .ok_or(QdemoError::NoCounts)
    }

    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QdemoResult<Vec<ExecutionResult>> {
        check_shots(self, shots)?;
        if circuits.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.run_sampler(circuits, shots)?)
    }

    fn is_simulator(&self) -> bool {
        false
    }

    fn max_shots(&self) -> u64 {
        self.config.max_shots.unwrap_or(execution::MAX_SHOTS)
    }
}

/// Operational hardware with enough qubits and the shortest queue; ties go
/// to the name that sorts first
pub fn select_least_busy(backends: &[BackendInfo], min_qubits: usize) -> Result<&BackendInfo, IbmBackendError> {
    backends
        .iter()
        .filter(|b| b.operational && !b.simulator && b.num_qubits.unwrap_or(0) >= min_qubits)
        .min_by(|a, b| {
            a.queue_length
                .unwrap_or(u64::MAX)
                .cmp(&b.queue_length.unwrap_or(u64::MAX))
                .then_with(|| a.name.cmp(&b.name))
        })
        .ok_or_else(|| {
            IbmBackendError::NotAvailable(format!(
                "no operational device with at least {} qubits",
                min_qubits
            ))
        })
}

/// Names, sizes and queues of every visible backend
pub fn list_backends(credentials: IbmCredentials) -> Result<Vec<BackendInfo>, IbmBackendError> {
    let runtime = new_runtime()?;
    let client = IbmClient::new(credentials)?;
    let mut backends = runtime.block_on(client.list_backends())?;
    backends.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, qubits: usize, queue: u64, operational: bool, simulator: bool) -> BackendInfo {
        BackendInfo {
            name: name.to_string(),
            num_qubits: Some(qubits),
            simulator,
            operational,
            queue_length: Some(queue),
            processor_type: None,
        }
    }

    #[test]
    fn test_select_least_busy() {
        let backends = vec![
            info("ibm_brisbane", 127, 40, true, false),
            info("ibm_fez", 156, 12, true, false),
            info("ibm_offline", 156, 0, false, false),
            info("simulator_stabilizer", 5000, 0, true, true),
            info("ibm_small", 5, 1, true, false),
        ];
        assert_eq!(select_least_busy(&backends, 7).unwrap().name, "ibm_fez");
        assert_eq!(select_least_busy(&backends, 2).unwrap().name, "ibm_small");
        assert!(matches!(
            select_least_busy(&backends, 500),
            Err(IbmBackendError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_least_busy_tie_break() {
        let backends = vec![info("ibm_torino", 133, 5, true, false), info("ibm_kyiv", 127, 5, true, false)];
        assert_eq!(select_least_busy(&backends, 100).unwrap().name, "ibm_kyiv");
    }

    #[test]
    fn test_error_conversion() {
        let err: QdemoError = IbmBackendError::NotAvailable("none".into()).into();
        assert!(matches!(err, QdemoError::BackendNotAvailable(_)));

        let err: QdemoError = IbmBackendError::Auth(AuthError::MissingToken).into();
        match err {
            QdemoError::BackendError(msg) => assert!(msg.contains("IBM_QUANTUM_TOKEN")),
            other => panic!("unexpected {:?}", other),
        }
    }

    // Requires IBM credentials and network access
    #[test]
    #[ignore]
    fn test_list_backends_live() {
        let backends = list_backends(IbmCredentials::auto_load().unwrap()).unwrap();
        assert!(!backends.is_empty());
    }
}
