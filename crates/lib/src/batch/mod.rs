//! Bounded-concurrency batch validation.
//!
//! [`BatchPipeline`] reads credentials from a [`LineSource`], keeps at most `W`
//! introspections in flight on a [`JoinSet`], and returns a [`BatchResult`]
//! whose order matches the input order of the non-empty lines.
//!
//! Each dispatched call is tagged with the index of its line. Calls complete in
//! any order; the outcome is written into the slot for its index, and the
//! result is only handed back once every slot is filled. A new line is read
//! only when a slot in the window frees up, so the input is consumed
//! incrementally.
//!
//! Per-credential failures never abort a batch. The only errors are an
//! unreadable source ([`Error::Source`]) and a worker task that panicked
//! ([`Error::Worker`]).

mod cancel;
mod source;

pub use cancel::CancelToken;
pub use source::{
    IterLines, LineSource, ReaderLines, decode_line, lines_from_iter, lines_from_reader,
};

use std::sync::Arc;

use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::introspect::{Introspector, redact};
use crate::outcome::{FailureReason, Outcome};
use crate::{Error, Result};

/// Ordered outcomes of one batch, one per non-empty input line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    outcomes: Vec<Outcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.outcomes.iter()
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    pub fn valid_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.len() - self.valid_count()
    }
}

impl IntoIterator for BatchResult {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

/// Drives introspections for a stream of lines under a concurrency cap.
#[derive(Clone)]
pub struct BatchPipeline {
    introspector: Arc<dyn Introspector>,
    config: BatchConfig,
}

impl BatchPipeline {
    pub fn new(introspector: Arc<dyn Introspector>, config: BatchConfig) -> Self {
        Self {
            introspector,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Validate every non-empty line of `source`.
    pub async fn run<S: LineSource>(&self, source: S) -> Result<BatchResult> {
        self.run_with_cancel(source, CancelToken::new()).await
    }

    /// Validate every non-empty line of `source`, stopping new dispatches once
    /// `cancel` fires.
    ///
    /// After cancellation the remaining lines are still read so that the
    /// result keeps one slot per line; undispatched slots are
    /// [`FailureReason::Cancelled`]. Calls already in flight run to completion
    /// or to their deadline.
    pub async fn run_with_cancel<S: LineSource>(
        &self,
        source: S,
        cancel: CancelToken,
    ) -> Result<BatchResult> {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "batch",
            %batch_id,
            concurrency = self.config.concurrency()
        );
        self.drive(source, cancel).instrument(span).await
    }

    async fn drive<S: LineSource>(
        &self,
        mut source: S,
        cancel: CancelToken,
    ) -> Result<BatchResult> {
        let window = self.config.concurrency();
        let mut slots: Vec<Option<Outcome>> = Vec::new();
        let mut in_flight: JoinSet<(usize, Outcome)> = JoinSet::new();

        loop {
            while in_flight.len() >= window {
                if let Some(joined) = in_flight.join_next().await {
                    settle(&mut slots, joined)?;
                }
            }

            let Some(line) = source.next_line().await.map_err(Error::Source)? else {
                break;
            };
            let credential = line.trim();
            if credential.is_empty() {
                continue;
            }

            let index = slots.len();
            if cancel.is_cancelled() {
                slots.push(Some(Outcome::invalid(credential, FailureReason::Cancelled)));
                continue;
            }
            slots.push(None);

            tracing::debug!(index, credential = %redact(credential), "Dispatching credential");
            in_flight.spawn(introspect_with_deadline(
                Arc::clone(&self.introspector),
                credential.to_string(),
                index,
                self.config.item_timeout,
            ));
        }

        while let Some(joined) = in_flight.join_next().await {
            settle(&mut slots, joined)?;
        }

        let outcomes = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::Worker(format!("no outcome recorded for line {index}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let result = BatchResult { outcomes };

        tracing::info!(
            total = result.len(),
            valid = result.valid_count(),
            invalid = result.invalid_count(),
            cancelled = cancel.is_cancelled(),
            "Batch complete"
        );
        Ok(result)
    }
}

async fn introspect_with_deadline(
    introspector: Arc<dyn Introspector>,
    credential: String,
    index: usize,
    deadline: std::time::Duration,
) -> (usize, Outcome) {
    let result = tokio::time::timeout(deadline, introspector.introspect(&credential)).await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(index, credential = %redact(&credential), "Introspection timed out");
            Outcome::invalid(credential, FailureReason::Timeout)
        }
    };
    (index, outcome)
}

fn settle(
    slots: &mut [Option<Outcome>],
    joined: std::result::Result<(usize, Outcome), JoinError>,
) -> Result<()> {
    let (index, outcome) = joined.map_err(|e| Error::Worker(e.to_string()))?;
    match slots.get_mut(index) {
        Some(slot) => {
            *slot = Some(outcome);
            Ok(())
        }
        None => Err(Error::Worker(format!("outcome for unknown line {index}"))),
    }
}
