use crate::classifier::interfaces::OntologyClassifier;
use crate::classifier::registry::ClassifierRegistry;
use crate::orchestration::request::ClassificationRequest;
use crate::pool::{PoolError, ServiceFactory};
use crate::scheduling::TargetKey;
use crate::state_machine::SessionStateMachine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// One live classifier session, bound to a target branch.
///
/// Sessions are the expensive objects managed by the resource pool: they
/// wrap a constructed classifier instance plus the lifecycle state machine
/// orchestration consults between runs.
pub struct ReasonerSession {
    classifier_id: String,
    target: TargetKey,
    shared: bool,
    state: SessionStateMachine,
    classifier: Option<Box<dyn OntologyClassifier>>,
    created_at: DateTime<Utc>,
}

impl ReasonerSession {
    pub fn new(
        classifier_id: impl Into<String>,
        target: TargetKey,
        shared: bool,
        classifier: Box<dyn OntologyClassifier>,
    ) -> Self {
        Self {
            classifier_id: classifier_id.into(),
            target,
            shared,
            state: SessionStateMachine::new(),
            classifier: Some(classifier),
            created_at: Utc::now(),
        }
    }

    pub fn classifier_id(&self) -> &str {
        &self.classifier_id
    }

    pub fn target(&self) -> &TargetKey {
        &self.target
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &SessionStateMachine {
        &self.state
    }

    /// The wrapped classifier. Panics only if called after [`Self::dispose`],
    /// which the pool never does.
    pub fn classifier(&self) -> &dyn OntologyClassifier {
        self.classifier
            .as_deref()
            .expect("session classifier accessed after dispose")
    }

    /// Mark the session's last result invalidated by external edits.
    pub fn set_stale(&self) {
        // A cached shared session is never mid-classification, so the
        // precondition cannot fire here; a violation elsewhere is a bug
        // worth surfacing in logs rather than panicking over.
        if let Err(error) = self.state.set_stale() {
            tracing::warn!(%error, target = %self.target, "ignored stale marker");
        }
    }

    /// Tear down the session and release classifier resources. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut classifier) = self.classifier.take() {
            classifier.dispose();
        }
        self.state.unload();
    }
}

impl std::fmt::Debug for ReasonerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerSession")
            .field("classifier_id", &self.classifier_id)
            .field("target", &self.target)
            .field("shared", &self.shared)
            .field("state", &self.state.current_state())
            .finish()
    }
}

/// Pool hook that constructs and retires reasoner sessions.
///
/// Classifier implementations are resolved through the registry; requests
/// that do not name one fall back to the configured default.
pub struct ReasonerSessionFactory {
    registry: Arc<ClassifierRegistry>,
    default_classifier_id: String,
}

impl ReasonerSessionFactory {
    pub fn new(registry: Arc<ClassifierRegistry>, default_classifier_id: impl Into<String>) -> Self {
        Self {
            registry,
            default_classifier_id: default_classifier_id.into(),
        }
    }

    fn effective_classifier_id<'a>(&'a self, request: &'a ClassificationRequest) -> &'a str {
        request
            .classifier_id()
            .unwrap_or(&self.default_classifier_id)
    }
}

#[async_trait]
impl ServiceFactory for ReasonerSessionFactory {
    type Service = ReasonerSession;
    type Params = ClassificationRequest;

    async fn create(
        &self,
        target: &TargetKey,
        shared: bool,
        params: &ClassificationRequest,
    ) -> Result<ReasonerSession, PoolError> {
        let classifier_id = self.effective_classifier_id(params);
        info!(%target, %classifier_id, "Creating reasoner session");

        let classifier = self
            .registry
            .create(classifier_id, params)
            .map_err(|e| PoolError::create_failed(e.to_string()))?;

        Ok(ReasonerSession::new(
            classifier_id,
            target.clone(),
            shared,
            classifier,
        ))
    }

    async fn retire(&self, mut service: ReasonerSession) -> Result<(), PoolError> {
        info!(target = %service.target(), "Retiring reasoner session");
        service.dispose();
        Ok(())
    }

    fn matches_params(&self, service: &ReasonerSession, params: &ClassificationRequest) -> bool {
        service.classifier_id() == self.effective_classifier_id(params)
    }
}
