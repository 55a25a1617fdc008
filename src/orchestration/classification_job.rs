use crate::classifier::{ConceptMapper, ConceptResolver, ReasonerSession, ReasonerSessionFactory};
use crate::orchestration::errors::OrchestrationResult;
use crate::orchestration::request::ClassificationRequest;
use crate::orchestration::result_registry::{ClassificationOutcome, ResultRegistry};
use crate::pool::ServicePool;
use crate::scheduling::TargetKey;
use crate::taxonomy::{Taxonomy, TaxonomyInferrer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The unit of work executed inside an admitted classification job.
///
/// Leases a reasoner session (shared, so back-to-back runs on the same
/// target reuse it), drives the session state machine around the taxonomy
/// walk, registers the outcome, and returns the lease on every path.
pub struct ClassificationJob {
    pool: Arc<ServicePool<ReasonerSessionFactory>>,
    results: Arc<ResultRegistry>,
    mapper: Arc<dyn ConceptMapper>,
    resolver: Arc<dyn ConceptResolver>,
}

impl ClassificationJob {
    pub fn new(
        pool: Arc<ServicePool<ReasonerSessionFactory>>,
        results: Arc<ResultRegistry>,
        mapper: Arc<dyn ConceptMapper>,
        resolver: Arc<dyn ConceptResolver>,
    ) -> Self {
        Self {
            pool,
            results,
            mapper,
            resolver,
        }
    }

    /// Run one classification to completion.
    pub async fn execute(&self, request: &ClassificationRequest) -> OrchestrationResult<()> {
        let started = Instant::now();
        info!(
            run_id = %request.run_id(),
            target = %request.target(),
            "🚀 Starting classification job"
        );

        let mut lease = self.pool.take_lease(request.target(), true, request).await?;
        let classified = self.classify(lease.service_mut());
        if classified.is_err() {
            // A failed session is retired rather than parked for reuse.
            lease.demote_to_exclusive();
        }
        let released = self.pool.release_lease(lease).await;

        let taxonomy = classified?;
        if let Err(error) = released {
            // The taxonomy is complete; a release hiccup only costs a slot
            // until the pool recovers it.
            warn!(run_id = %request.run_id(), %error, "Failed to release classification lease");
        }

        let elapsed = started.elapsed();
        info!(
            run_id = %request.run_id(),
            concepts = taxonomy.concept_count(),
            elapsed_millis = elapsed.as_millis() as u64,
            "✅ Classification job finished"
        );
        self.results.put(Arc::new(ClassificationOutcome::new(
            request.run_id(),
            request.target().clone(),
            taxonomy,
            elapsed,
        )));
        Ok(())
    }

    fn classify(&self, session: &mut ReasonerSession) -> OrchestrationResult<Taxonomy> {
        session.state().begin_classification()?;

        let inferrer = TaxonomyInferrer::new(
            session.classifier(),
            self.mapper.as_ref(),
            self.resolver.as_ref(),
        );

        match inferrer.infer() {
            Ok(taxonomy) => {
                session.state().end_classification()?;
                Ok(taxonomy)
            }
            Err(error) => {
                session.state().fail();
                Err(error.into())
            }
        }
    }

    /// Propagate an external edit on `target`: retained outcomes and the
    /// cached shared session both drop their synchronized status.
    pub fn mark_target_stale(&self, target: &TargetKey) {
        let marked = self.results.set_stale(target);
        self.pool
            .with_shared_service(target, |session| session.set_stale());
        debug!(%target, marked, "Marked classification state stale");
    }

    /// Whether a classification could start without waiting for a session
    /// slot.
    pub fn can_start_immediately(&self) -> bool {
        self.pool.has_available_capacity()
    }

    pub fn results(&self) -> &Arc<ResultRegistry> {
        &self.results
    }
}
