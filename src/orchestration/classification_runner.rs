use crate::config::ClassificationConfig;
use crate::events::NotificationPublisher;
use crate::jobs::{JobRecord, JobState, JobSystem};
use crate::orchestration::errors::{ClassificationError, OrchestrationResult};
use crate::orchestration::request::{ClassificationRequest, ConceptDefinition};
use crate::orchestration::result_registry::{ClassificationOutcome, ResultRegistry};
use crate::scheduling::{AdmissionController, TargetKey};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Caller-supplied cancellation token, checked at every poll boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Pluggable extraction of a finished run's results. The concrete processor
/// decides what "results" means for its use case; the runner only promises
/// to call it exactly once, on the finished path.
#[async_trait]
pub trait ResultProcessor: Send + Sync {
    type Output: Send;

    async fn process_results(&self, run_id: Uuid) -> OrchestrationResult<Self::Output>;
}

/// Default processor: pull the registered outcome from the result registry.
pub struct RegistryResultProcessor {
    registry: Arc<ResultRegistry>,
}

impl RegistryResultProcessor {
    pub fn new(registry: Arc<ResultRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ResultProcessor for RegistryResultProcessor {
    type Output = Arc<ClassificationOutcome>;

    async fn process_results(&self, run_id: Uuid) -> OrchestrationResult<Self::Output> {
        self.registry
            .get(run_id)
            .ok_or(ClassificationError::ResultsUnavailable { run_id })
    }
}

/// Caller-facing inputs for one classification run.
#[derive(Debug, Clone)]
pub struct ClassifyParams {
    pub user_id: String,
    pub target: TargetKey,
    pub classifier_id: Option<String>,
    pub additional_concepts: Vec<ConceptDefinition>,
    pub parent_lock_context: String,
}

impl ClassifyParams {
    pub fn new(user_id: impl Into<String>, target: TargetKey) -> Self {
        Self {
            user_id: user_id.into(),
            target,
            classifier_id: None,
            additional_concepts: Vec::new(),
            parent_lock_context: "classification".to_string(),
        }
    }
}

/// Blocking facade over the asynchronous classification protocol.
///
/// `run` submits exactly one job, consumes at most one terminal
/// notification, and deletes the job record exactly once on every observed
/// terminal path, whatever the outcome.
pub struct ClassificationRunner<J: JobSystem, P: ResultProcessor> {
    job_system: Arc<J>,
    notifications: NotificationPublisher,
    processor: Arc<P>,
    admission: AdmissionController,
    poll_interval: Duration,
    default_classifier_id: String,
}

impl<J: JobSystem + 'static, P: ResultProcessor> ClassificationRunner<J, P> {
    pub fn new(
        job_system: Arc<J>,
        notifications: NotificationPublisher,
        processor: Arc<P>,
        admission: AdmissionController,
        config: &ClassificationConfig,
    ) -> Self {
        Self {
            job_system,
            notifications,
            processor,
            admission,
            poll_interval: config.poll_interval,
            default_classifier_id: config.default_classifier_id.clone(),
        }
    }

    /// Run one classification to a terminal outcome.
    ///
    /// Blocks until the submitted job finishes, fails or is cancelled, or
    /// until `cancel` fires. Caller cancellation abandons observation only:
    /// the remote job keeps running and cancelling it is a separate,
    /// explicit action against the job system.
    pub async fn run(
        &self,
        params: ClassifyParams,
        cancel: &CancellationToken,
    ) -> OrchestrationResult<P::Output> {
        let run_id = Uuid::new_v4();
        let request = ClassificationRequest::builder()
            .run_id(run_id)
            .user_id(params.user_id)
            .target(params.target.clone())
            .additional_concepts(params.additional_concepts)
            .parent_lock_context(params.parent_lock_context)
            .maybe_classifier_id(
                params
                    .classifier_id
                    .or_else(|| Some(self.default_classifier_id.clone())),
            )
            .build()?;

        // Single-slot handoff between the one-shot listener and the poll
        // loop below. A clone of the sender stays in scope so an exited
        // listener cannot close the channel under a still-polling caller.
        let (record_tx, mut record_rx) = mpsc::channel::<JobRecord>(1);
        let _channel_guard = record_tx.clone();
        let listener = self.spawn_terminal_listener(run_id, record_tx);

        let rule = self.admission.create_rule(&params.target);
        debug!(%run_id, slot = rule.slot(), target = %params.target, "Submitting classification job");
        if let Err(error) = self.job_system.submit(&request, rule).await {
            listener.abort();
            return Err(error.into());
        }

        let outcome = self.await_terminal_record(run_id, &mut record_rx, cancel).await;

        // Scoped subscription: whatever the outcome, the listener dies with
        // this call.
        listener.abort();
        outcome
    }

    /// One-shot subscription: the first terminal notification for `run_id`
    /// triggers a fetch of the authoritative record, hands it to the poll
    /// loop, and ends the subscription. At most one record is ever
    /// delivered.
    fn spawn_terminal_listener(
        &self,
        run_id: Uuid,
        record_tx: mpsc::Sender<JobRecord>,
    ) -> tokio::task::JoinHandle<()> {
        let mut events = self.notifications.subscribe();
        let job_system = Arc::clone(&self.job_system);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.job_id == run_id && event.state.is_terminal() => {
                        match job_system.fetch(run_id).await {
                            Ok(record) => {
                                let _ = record_tx.send(record).await;
                            }
                            Err(error) => {
                                warn!(%run_id, %error, "Failed to fetch job record after terminal notification");
                            }
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%run_id, skipped, "Notification listener lagged; continuing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn await_terminal_record(
        &self,
        run_id: Uuid,
        record_rx: &mut mpsc::Receiver<JobRecord>,
        cancel: &CancellationToken,
    ) -> OrchestrationResult<P::Output> {
        loop {
            if cancel.is_cancelled() {
                // The job is left running; reconciling it is the job
                // system's cleanup concern.
                info!(%run_id, "Classification cancelled by caller");
                return Err(ClassificationError::Cancelled);
            }

            let record = match timeout(self.poll_interval, record_rx.recv()).await {
                Err(_) => continue,
                Ok(None) => {
                    return Err(ClassificationError::illegal_state(
                        "handoff channel closed before a job record arrived",
                    ))
                }
                Ok(Some(record)) => record,
            };

            match record.state {
                JobState::Scheduled | JobState::Running | JobState::CancelRequested => {
                    // The filter admitted a premature event; treat it as
                    // spurious and keep polling.
                    debug!(%run_id, state = %record.state, "Ignoring non-terminal job record");
                    continue;
                }
                JobState::Finished => {
                    let processed = self.processor.process_results(run_id).await;
                    self.delete_job(run_id).await;
                    return processed;
                }
                JobState::Cancelled => {
                    self.delete_job(run_id).await;
                    return Err(ClassificationError::RemoteCancelled);
                }
                JobState::Failed => {
                    self.delete_job(run_id).await;
                    return Err(ClassificationError::remote_failed(
                        record
                            .error
                            .unwrap_or_else(|| "classification job failed".to_string()),
                    ));
                }
            }
        }
    }

    /// Unconditional cleanup on every observed terminal path. Deletion
    /// failures are logged, not surfaced: the run's outcome has already
    /// been decided.
    async fn delete_job(&self, run_id: Uuid) {
        if let Err(error) = self.job_system.delete(run_id).await {
            warn!(%run_id, %error, "Failed to delete classification job record");
        }
    }
}
