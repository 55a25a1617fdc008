use crate::events::{JobChangedEvent, NotificationPublisher};
use crate::jobs::job_system::{JobRecord, JobState, JobSystem, JobSystemError};
use crate::orchestration::request::ClassificationRequest;
use crate::scheduling::SchedulingRule;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// In-memory job system backend.
///
/// Holds job records in a concurrent map and publishes state changes to the
/// notification bus. Scheduling rules of live jobs are retained so embedders
/// can ask whether a submission would conflict with a running
/// classification; the store itself accepts conflicting submissions and
/// leaves them scheduled, the way an external queue would.
pub struct InMemoryJobSystem {
    records: DashMap<Uuid, JobRecord>,
    requests: DashMap<Uuid, ClassificationRequest>,
    rules: Mutex<Vec<(Uuid, SchedulingRule)>>,
    notifications: NotificationPublisher,
}

impl InMemoryJobSystem {
    pub fn new(notifications: NotificationPublisher) -> Self {
        Self {
            records: DashMap::new(),
            requests: DashMap::new(),
            rules: Mutex::new(Vec::new()),
            notifications,
        }
    }

    /// The retained request for a submitted job. Workers embedding the
    /// in-memory store use this to pick up the work a submission describes.
    pub fn request_for(&self, run_id: Uuid) -> Option<ClassificationRequest> {
        self.requests.get(&run_id).map(|request| request.clone())
    }

    /// Requests whose jobs are still scheduled, oldest submission first.
    pub fn scheduled_requests(&self) -> Vec<ClassificationRequest> {
        let mut scheduled: Vec<(chrono::DateTime<Utc>, ClassificationRequest)> = self
            .records
            .iter()
            .filter(|record| record.state == JobState::Scheduled)
            .filter_map(|record| {
                self.requests
                    .get(&record.id)
                    .map(|request| (record.submitted_at, request.clone()))
            })
            .collect();
        scheduled.sort_by_key(|(submitted_at, _)| *submitted_at);
        scheduled.into_iter().map(|(_, request)| request).collect()
    }

    /// Whether `rule` conflicts with any job currently in the store.
    pub fn has_conflict(&self, rule: &SchedulingRule) -> bool {
        self.rules
            .lock()
            .iter()
            .any(|(_, existing)| existing.conflicts_with(rule))
    }

    /// Move a job to `state` and notify observers. Drives job progress in
    /// embeddings without an external scheduler.
    pub fn update_state(&self, run_id: Uuid, state: JobState) -> Result<(), JobSystemError> {
        {
            let mut record = self
                .records
                .get_mut(&run_id)
                .ok_or(JobSystemError::NotFound { run_id })?;
            record.state = state;
            if state.is_terminal() {
                record.finished_at = Some(Utc::now());
            }
        }

        if state.is_terminal() {
            self.rules.lock().retain(|(id, _)| *id != run_id);
        }

        debug!(%run_id, %state, "Job state updated");
        self.notifications.publish(JobChangedEvent::new(run_id, state));
        Ok(())
    }

    /// Like [`Self::update_state`] with a failure message attached.
    pub fn fail_job(&self, run_id: Uuid, error: impl Into<String>) -> Result<(), JobSystemError> {
        if let Some(mut record) = self.records.get_mut(&run_id) {
            record.error = Some(error.into());
        }
        self.update_state(run_id, JobState::Failed)
    }

    pub fn job_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl JobSystem for InMemoryJobSystem {
    async fn submit(
        &self,
        request: &ClassificationRequest,
        rule: SchedulingRule,
    ) -> Result<(), JobSystemError> {
        let record = JobRecord::scheduled(request);
        info!(run_id = %record.id, target = %request.target(), "📋 Classification job accepted");
        self.rules.lock().push((record.id, rule));
        self.requests.insert(record.id, request.clone());
        self.records.insert(record.id, record);
        Ok(())
    }

    async fn fetch(&self, run_id: Uuid) -> Result<JobRecord, JobSystemError> {
        self.records
            .get(&run_id)
            .map(|record| record.clone())
            .ok_or(JobSystemError::NotFound { run_id })
    }

    async fn delete(&self, run_id: Uuid) -> Result<(), JobSystemError> {
        self.rules.lock().retain(|(id, _)| *id != run_id);
        self.requests.remove(&run_id);
        self.records
            .remove(&run_id)
            .map(|_| ())
            .ok_or(JobSystemError::NotFound { run_id })
    }
}
