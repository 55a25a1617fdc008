use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

enum Command {
    Schedule {
        id: u64,
        deadline: Instant,
        task: BoxFuture<'static, ()>,
    },
    Cancel {
        id: u64,
    },
}

/// One clock, many cancellable deadlines.
///
/// A single background loop holds every pending eviction; firing and
/// cancellation are serialized through its command channel, so a cancelled
/// task can never run and a fired task can never be cancelled.
pub(crate) struct EvictionScheduler {
    tx: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EvictionScheduler {
    /// Spawns the scheduler loop. Must be called within a Tokio runtime.
    pub fn start() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();

        let worker = tokio::spawn(async move {
            let mut pending: HashMap<u64, (Instant, BoxFuture<'static, ()>)> = HashMap::new();
            loop {
                let next_deadline = pending.values().map(|(deadline, _)| *deadline).min();
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(Command::Schedule { id, deadline, task }) => {
                            pending.insert(id, (deadline, task));
                        }
                        Some(Command::Cancel { id }) => {
                            pending.remove(&id);
                        }
                        None => break,
                    },
                    () = deadline_elapsed(next_deadline) => {
                        let now = Instant::now();
                        let due: Vec<u64> = pending
                            .iter()
                            .filter(|(_, (deadline, _))| *deadline <= now)
                            .map(|(id, _)| *id)
                            .collect();
                        for id in due {
                            if let Some((_, task)) = pending.remove(&id) {
                                task.await;
                            }
                        }
                    }
                }
            }
        });

        Self {
            tx,
            next_id: AtomicU64::new(0),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Schedule `task` to run after `delay`. The builder receives the task's
    /// id so the task can recognize itself when it fires.
    pub fn schedule(
        &self,
        delay: Duration,
        build: impl FnOnce(u64) -> BoxFuture<'static, ()>,
    ) -> EvictionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + delay;
        let task = build(id);
        if self
            .tx
            .send(Command::Schedule { id, deadline, task })
            .is_err()
        {
            debug!(id, "eviction scheduler stopped; task dropped");
        }
        EvictionHandle {
            id,
            tx: self.tx.clone(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop the scheduler loop, dropping all pending tasks unfired.
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.abort();
            let _ = worker.await;
        }
    }
}

/// Handle to one scheduled eviction, used to cancel it when the shared
/// session is reclaimed before expiry.
#[derive(Debug)]
pub(crate) struct EvictionHandle {
    id: u64,
    tx: mpsc::UnboundedSender<Command>,
    cancelled: Arc<AtomicBool>,
}

impl EvictionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the pending eviction. Returns `true` on the first call,
    /// `false` on every later one.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.tx.send(Command::Cancel { id: self.id });
        true
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
