use crate::jobs::JobState;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A job's state changed.
#[derive(Debug, Clone)]
pub struct JobChangedEvent {
    pub job_id: Uuid,
    pub state: JobState,
    pub occurred_at: DateTime<Utc>,
}

impl JobChangedEvent {
    pub fn new(job_id: Uuid, state: JobState) -> Self {
        Self {
            job_id,
            state,
            occurred_at: Utc::now(),
        }
    }
}

/// High-throughput publisher for job lifecycle notifications.
#[derive(Debug, Clone)]
pub struct NotificationPublisher {
    sender: broadcast::Sender<JobChangedEvent>,
}

impl NotificationPublisher {
    /// Create a new publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a job-changed event.
    pub fn publish(&self, event: JobChangedEvent) {
        // For broadcast channels, send() fails only when no subscriber is
        // listening, which is acceptable here: publishing is fire-and-forget.
        let _ = self.sender.send(event);
    }

    /// Subscribe to job-changed events
    pub fn subscribe(&self) -> broadcast::Receiver<JobChangedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::NOTIFICATION_CAPACITY)
    }
}
