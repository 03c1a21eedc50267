//! Entry point for single and bulk credential checks.

use std::sync::Arc;

use crate::batch::{BatchPipeline, BatchResult, CancelToken, LineSource};
use crate::config::{AppCredentials, BatchConfig, IntrospectConfig};
use crate::introspect::{GraphIntrospector, Introspector};
use crate::outcome::{FailureReason, Outcome};
use crate::{Error, Result};

/// Validates credentials one at a time or in bulk.
///
/// Cheap to clone; clones share the introspector and its HTTP client.
#[derive(Clone)]
pub struct Validator {
    introspector: Arc<dyn Introspector>,
    pipeline: BatchPipeline,
}

impl Validator {
    pub fn new(introspector: Arc<dyn Introspector>, batch: BatchConfig) -> Self {
        let pipeline = BatchPipeline::new(Arc::clone(&introspector), batch);
        Self {
            introspector,
            pipeline,
        }
    }

    /// Validator backed by a [`GraphIntrospector`].
    pub fn graph(
        credentials: AppCredentials,
        introspect: IntrospectConfig,
        batch: BatchConfig,
    ) -> Result<Self> {
        let introspector = GraphIntrospector::new(Arc::new(credentials), &introspect)?;
        Ok(Self::new(Arc::new(introspector), batch))
    }

    pub fn batch_config(&self) -> &BatchConfig {
        self.pipeline.config()
    }

    /// Validate a single credential.
    ///
    /// Surrounding whitespace is ignored. A blank credential is rejected with
    /// [`Error::MissingCredential`] before any remote call is made; every other
    /// problem is reported inside the returned [`Outcome`].
    pub async fn validate_one(&self, credential: &str) -> Result<Outcome> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(Error::MissingCredential);
        }

        let deadline = self.batch_config().item_timeout;
        match tokio::time::timeout(deadline, self.introspector.introspect(credential)).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => Ok(Outcome::invalid(credential, FailureReason::Timeout)),
        }
    }

    /// Validate every non-empty line of `source`, in order.
    pub async fn validate_batch<S: LineSource>(&self, source: S) -> Result<BatchResult> {
        self.pipeline.run(source).await
    }

    /// Like [`validate_batch`](Self::validate_batch), but stops dispatching once
    /// `cancel` fires.
    pub async fn validate_batch_with_cancel<S: LineSource>(
        &self,
        source: S,
        cancel: CancelToken,
    ) -> Result<BatchResult> {
        self.pipeline.run_with_cancel(source, cancel).await
    }
}
