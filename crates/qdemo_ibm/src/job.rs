//! IBM Quantum job management
//!
//! Gantree: L3_Ibm → Job
//!
//! Submit sampler jobs, poll their state until terminal and fetch results.

use crate::client::{ClientError, IbmClient};
use crate::sampler::{SamplerParams, SamplerPub, SamplerResult};
use chrono::{DateTime, Utc};
use qdemo_core::execution;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Client error
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Rejected at submission
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Failed on the service
    #[error("Job {id} failed: {reason}")]
    ExecutionFailed {
        /// Job ID
        id: String,
        /// Reason reported by the service
        reason: String,
    },

    /// Cancelled
    #[error("Job {0} was cancelled")]
    Cancelled(String),

    /// Not terminal before the deadline
    #[error("Job {id} timed out after {seconds} seconds")]
    Timeout {
        /// Job ID
        id: String,
        /// Timeout in seconds
        seconds: u64,
    },

    /// Results requested too early
    #[error("Job results not yet available")]
    ResultsNotReady,
}

/// Job status
/// Gantree: JobStatus // 작업 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the queue
    Queued,
    /// Being validated
    Validating,
    /// Running
    Running,
    /// Completed successfully
    Completed,
    /// Failed
    Failed,
    /// Cancelled
    Cancelled,
}

impl JobStatus {
    /// Parse the service's status string (case-insensitive, with aliases)
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "VALIDATING" => JobStatus::Validating,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" | "DONE" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed,
            "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
            _ => JobStatus::Queued,
        }
    }

    /// Completed, failed or cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Sampler job submission body
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmission {
    /// Runtime program
    pub program_id: String,

    /// Target backend
    pub backend: String,

    /// Sampler parameters
    pub params: SamplerParams,
}

impl JobSubmission {
    /// Sampler job over the given PUBs
    pub fn sampler(backend: &str, pubs: Vec<SamplerPub>) -> Self {
        Self {
            program_id: "sampler".to_string(),
            backend: backend.to_string(),
            params: SamplerParams::new(pubs),
        }
    }
}

/// `POST /jobs` and `GET /jobs/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    /// Job ID
    pub id: String,

    /// Backend
    #[serde(default)]
    pub backend: Option<String>,

    /// Legacy top-level status
    #[serde(default)]
    pub status: Option<String>,

    /// Current state
    #[serde(default)]
    pub state: Option<JobState>,

    /// Creation time
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// Job state block
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Status string
    pub status: Option<String>,
    /// Failure or cancellation reason
    pub reason: Option<String>,
}

impl JobResponse {
    /// Status from `state.status`, else `status`; a fresh job is queued
    pub fn effective_status(&self) -> JobStatus {
        self.state
            .as_ref()
            .and_then(|s| s.status.as_deref())
            .or(self.status.as_deref())
            .map(JobStatus::parse)
            .unwrap_or(JobStatus::Queued)
    }

    /// Failure reason, if reported
    pub fn reason(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.reason.as_deref())
    }
}

/// Handle to one submitted job
/// Gantree: IbmJob // 작업 핸들
pub struct IbmJob {
    id: String,
    client: IbmClient,
    status: JobStatus,
    backend: String,
    created: Option<DateTime<Utc>>,
    poll_interval: Duration,
}

impl IbmJob {
    pub(crate) fn new(response: JobResponse, client: IbmClient) -> Self {
        Self {
            status: response.effective_status(),
            id: response.id,
            backend: response.backend.unwrap_or_default(),
            created: response.created,
            client,
            poll_interval: Duration::from_secs(execution::POLL_INTERVAL_S),
        }
    }

    /// Override the polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Job ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backend name
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Last observed status
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Creation time reported by the service
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Fetch the current status
    pub async fn refresh(&mut self) -> Result<JobStatus, JobError> {
        let response: JobResponse = self.client.get_with_retry(&format!("jobs/{}", self.id), 3).await?;
        self.status = response.effective_status();
        match self.status {
            JobStatus::Failed => Err(JobError::ExecutionFailed {
                id: self.id.clone(),
                reason: response.reason().unwrap_or("unknown error").to_string(),
            }),
            JobStatus::Cancelled => Err(JobError::Cancelled(self.id.clone())),
            status => Ok(status),
        }
    }

    /// Poll until completed, failing on error, cancellation or timeout
    /// Gantree: wait(timeout) -> Result<()> // 완료 대기
    pub async fn wait(&mut self, timeout: Duration) -> Result<(), JobError> {
        let started = Instant::now();
        let mut last = None;
        loop {
            let status = self.refresh().await?;
            if last != Some(status) {
                log::info!("Job {} status: {:?}", self.id, status);
                last = Some(status);
            }
            if status.is_success() {
                return Ok(());
            }
            if started.elapsed() > timeout {
                return Err(JobError::Timeout {
                    id: self.id.clone(),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Sampler results of a completed job
    pub async fn result(&self) -> Result<SamplerResult, JobError> {
        if !self.status.is_success() {
            return Err(JobError::ResultsNotReady);
        }
        Ok(self
            .client
            .get_with_retry(&format!("jobs/{}/results", self.id), 3)
            .await?)
    }

    /// Cancel the job
    pub async fn cancel(&mut self) -> Result<(), JobError> {
        self.client.delete(&format!("jobs/{}", self.id)).await?;
        self.status = JobStatus::Cancelled;
        Ok(())
    }
}

/// Submits jobs and reattaches to existing ones
pub struct JobManager {
    client: IbmClient,
}

impl JobManager {
    /// Create a job manager
    pub fn new(client: IbmClient) -> Self {
        Self { client }
    }

    /// Submit a job
    /// Gantree: submit(submission) -> IbmJob // 제출
    pub async fn submit(&self, submission: &JobSubmission) -> Result<IbmJob, JobError> {
        let response: JobResponse = self.client.post_with_retry("jobs", submission, 3).await?;
        if response.effective_status() == JobStatus::Failed {
            return Err(JobError::SubmissionFailed(
                response.reason().unwrap_or("unknown error").to_string(),
            ));
        }
        log::info!("Submitted job {} to {}", response.id, submission.backend);
        Ok(IbmJob::new(response, self.client.clone()))
    }

    /// Reattach to a job by ID
    pub async fn get_job(&self, job_id: &str) -> Result<IbmJob, JobError> {
        let response: JobResponse = self.client.get_with_retry(&format!("jobs/{}", job_id), 3).await?;
        Ok(IbmJob::new(response, self.client.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(JobStatus::parse("QUEUED"), JobStatus::Queued);
        assert_eq!(JobStatus::parse("Running"), JobStatus::Running);
        assert_eq!(JobStatus::parse("DONE"), JobStatus::Completed);
        assert_eq!(JobStatus::parse("canceled"), JobStatus::Cancelled);
        assert_eq!(JobStatus::parse("ERROR"), JobStatus::Failed);
        assert_eq!(JobStatus::parse("something-new"), JobStatus::Queued);
    }

    #[test]
    fn test_status_predicates() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_success());
        assert!(!JobStatus::Failed.is_success());
    }

    #[test]
    fn test_submission_body() {
        let submission =
            JobSubmission::sampler("ibm_fez", vec![SamplerPub::new("OPENQASM 3.0;", 1024)]);
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "program_id": "sampler",
                "backend": "ibm_fez",
                "params": {"pubs": [["OPENQASM 3.0;", null, 1024]], "version": 2}
            })
        );
    }

    #[test]
    fn test_job_response_status() {
        let fresh: JobResponse =
            serde_json::from_str(r#"{"id": "d4lnn12v0j9c73e5h490", "backend": "ibm_fez"}"#).unwrap();
        assert_eq!(fresh.effective_status(), JobStatus::Queued);

        let legacy: JobResponse =
            serde_json::from_str(r#"{"id": "job_1", "status": "Completed"}"#).unwrap();
        assert_eq!(legacy.effective_status(), JobStatus::Completed);

        let failed: JobResponse = serde_json::from_str(
            r#"{"id": "job_2", "created": "2025-03-01T12:00:00Z",
                "state": {"status": "Failed", "reason": "circuit not ISA"}}"#,
        )
        .unwrap();
        assert_eq!(failed.effective_status(), JobStatus::Failed);
        assert_eq!(failed.reason(), Some("circuit not ISA"));
        assert!(failed.created.is_some());
    }
}
