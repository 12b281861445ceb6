//! Subscription execution: poll, classify, serialize, deliver.
//!
//! The watermark is the only mutable state. It is read at the start of an
//! execution and written at the end, under a per-subscription lock: a trigger
//! that arrives while an execution is in flight is skipped, not queued.
//! Readers ([`Subscription::watermark`], [`Subscription::record`]) see the
//! last committed value and never contend with that lock.
//!
//! | Step | Failure | Watermark |
//! |------|---------|-----------|
//! | poll | [`ExecutionOutcome::QueryFailed`] | unchanged |
//! | classify empty, `report_if_empty = false` | - ([`ExecutionOutcome::Suppressed`]) | advanced |
//! | serialize | [`ExecutionOutcome::SerializationFailed`] | unchanged |
//! | deliver | [`ExecutionOutcome::DeliveryFailed`] | unchanged |
//! | deliver, any status | - ([`ExecutionOutcome::Delivered`]) | advanced |

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info_span, warn, Instrument};
use url::Url;

use crate::classify::is_empty;
use crate::clock::{Clock, SystemClock};
use crate::config::SubscriptionConfig;
use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::engine::QueryEngine;
use crate::error::{DeliveryError, QueryError, SerializationError, SubscriptionError};
use crate::model::{EventCounts, QueryDocument, QueryParam, QueryResult, TIME_FILTER_PARAM};
use crate::serialize::ResultSerializer;

mod record;

pub use record::SubscriptionRecord;


/// External capabilities a subscription executes against.
#[derive(Clone)]
pub struct Collaborators {
    engine: Arc<dyn QueryEngine>,
    serializer: Arc<dyn ResultSerializer>,
    delivery: Arc<dyn DeliveryClient>,
    clock: Arc<dyn Clock>,
    config: SubscriptionConfig,
}

impl Collaborators {
    /// Wall clock, default timeouts.
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        serializer: Arc<dyn ResultSerializer>,
        delivery: Arc<dyn DeliveryClient>,
    ) -> Self {
        Self {
            engine,
            serializer,
            delivery,
            clock: Arc::new(SystemClock),
            config: SubscriptionConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: SubscriptionConfig) -> Self {
        self.config = config;
        self
    }
}

/// What one trigger did.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Results were sent; the destination answered `status_code`.
    Delivered {
        status_code: u16,
        counts: EventCounts,
        watermark: DateTime<Utc>,
    },

    /// Nothing new and the subscriber did not ask for empty reports.
    Suppressed { watermark: DateTime<Utc> },

    QueryFailed(QueryError),

    SerializationFailed(SerializationError),

    DeliveryFailed(DeliveryError),

    /// Another execution of this subscription was still running.
    Busy,
}

impl ExecutionOutcome {
    /// Whether the watermark moved, i.e. the record should be persisted.
    pub fn advanced_watermark(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Suppressed { .. })
    }

    /// Watermark after a successful execution.
    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Delivered { watermark, .. } | Self::Suppressed { watermark } => Some(*watermark),
            _ => None,
        }
    }
}

/// A standing query with an advancing `GE_recordTime` filter.
pub struct Subscription {
    id: String,
    query_name: String,
    base_params: Vec<QueryParam>,
    destination: Url,
    /// Destination without credentials, for logs.
    destination_label: String,
    report_if_empty: bool,
    initial_record_time: DateTime<Utc>,
    /// Held for the whole of an execution.
    running: Mutex<()>,
    /// Last committed watermark.
    watermark: watch::Sender<DateTime<Utc>>,
    collaborators: Collaborators,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("query_name", &self.query_name)
            .field("base_params", &self.base_params)
            .field("destination", &self.destination_label)
            .field("report_if_empty", &self.report_if_empty)
            .field("initial_record_time", &self.initial_record_time)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Materialize a subscription from its stored record.
    ///
    /// The watermark starts at `last_time_executed`, or `initial_record_time`
    /// if it was never executed, whichever is later.
    pub fn new(
        record: SubscriptionRecord,
        collaborators: Collaborators,
    ) -> Result<Self, SubscriptionError> {
        let SubscriptionRecord {
            subscription_id,
            query_name,
            query_params,
            destination,
            report_if_empty,
            initial_record_time,
            last_time_executed,
        } = record;

        if subscription_id.trim().is_empty() {
            return Err(SubscriptionError::EmptyId);
        }
        if query_name.trim().is_empty() {
            return Err(SubscriptionError::EmptyQueryName);
        }
        validate_params(&query_params)?;
        collaborators.config.validate()?;
        let destination = parse_destination(&destination)?;

        let watermark = last_time_executed
            .map_or(initial_record_time, |last| last.max(initial_record_time));

        Ok(Self {
            id: subscription_id,
            query_name,
            base_params: query_params,
            destination_label: redact(&destination),
            destination,
            report_if_empty,
            initial_record_time,
            running: Mutex::new(()),
            watermark: watch::channel(watermark).0,
            collaborators,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Parameters supplied at subscribe time, without the time filter.
    pub fn base_params(&self) -> &[QueryParam] {
        &self.base_params
    }

    pub fn destination(&self) -> &Url {
        &self.destination
    }

    pub fn report_if_empty(&self) -> bool {
        self.report_if_empty
    }

    /// Time from which events were reported on the first execution.
    pub fn initial_record_time(&self) -> DateTime<Utc> {
        self.initial_record_time
    }

    /// Watermark as of the last successful execution.
    pub fn watermark(&self) -> DateTime<Utc> {
        *self.watermark.borrow()
    }

    /// Parameters the next poll will send.
    pub fn effective_params(&self) -> Vec<QueryParam> {
        self.params_at(self.watermark())
    }

    /// Snapshot for the external store, with the watermark as
    /// `last_time_executed`.
    pub fn record(&self) -> SubscriptionRecord {
        SubscriptionRecord {
            subscription_id: self.id.clone(),
            query_name: self.query_name.clone(),
            query_params: self.base_params.clone(),
            destination: self.destination.to_string(),
            report_if_empty: self.report_if_empty,
            initial_record_time: self.initial_record_time,
            last_time_executed: Some(self.watermark()),
        }
    }

    /// Run one execution. Never fails: errors are logged and reported in the
    /// outcome, and the next trigger retries with the same watermark.
    pub async fn execute_query(&self) -> ExecutionOutcome {
        let span = info_span!(
            "subscription.execute",
            subscription.id = %self.id,
            query.name = %self.query_name,
        );
        self.execute().instrument(span).await
    }

    async fn execute(&self) -> ExecutionOutcome {
        let Ok(_running) = self.running.try_lock() else {
            warn!("previous execution still in flight, skipping trigger");
            return ExecutionOutcome::Busy;
        };

        // Taken before polling: the next window must not start past what this
        // poll covered.
        let executed_at = self.collaborators.clock.now();
        let watermark = self.watermark();
        let params = self.params_at(watermark);

        debug!(
            watermark = %watermark,
            engine = self.collaborators.engine.engine_name(),
            "running subscribed query"
        );
        let mut result = match self.poll(&params).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "subscribed query failed, watermark unchanged");
                return ExecutionOutcome::QueryFailed(e);
            }
        };
        result.subscription_id = Some(self.id.clone());

        let counts = result.counts();
        debug!(
            aggregation = counts.aggregation,
            object = counts.object,
            quantity = counts.quantity,
            transaction = counts.transaction,
            "subscribed query returned {counts}"
        );

        if !self.report_if_empty && is_empty(&result) {
            debug!("query returned no results, nothing to report");
            let watermark = self.advance(executed_at);
            return ExecutionOutcome::Suppressed { watermark };
        }

        let payload = match self.serialize(result, executed_at) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "serializing results failed, watermark unchanged");
                return ExecutionOutcome::SerializationFailed(e);
            }
        };

        debug!(
            destination = %self.destination_label,
            bytes = payload.len(),
            "sending results of subscribed query"
        );
        match self.deliver(&payload).await {
            Ok(outcome) => {
                if outcome.is_success() {
                    debug!(status = outcome.status_code, "results delivered");
                } else {
                    warn!(
                        status = outcome.status_code,
                        destination = %self.destination_label,
                        "destination answered with non-success status"
                    );
                }
                let watermark = self.advance(executed_at);
                ExecutionOutcome::Delivered {
                    status_code: outcome.status_code,
                    counts,
                    watermark,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    kind = e.kind(),
                    destination = %self.destination_label,
                    "delivering results failed, watermark unchanged"
                );
                ExecutionOutcome::DeliveryFailed(e)
            }
        }
    }

    /// Move the watermark forward to `to`, never backward.
    fn advance(&self, to: DateTime<Utc>) -> DateTime<Utc> {
        self.watermark.send_if_modified(|watermark| {
            if to > *watermark {
                *watermark = to;
                true
            } else {
                false
            }
        });
        self.watermark()
    }

    fn params_at(&self, watermark: DateTime<Utc>) -> Vec<QueryParam> {
        let mut params = Vec::with_capacity(self.base_params.len() + 1);
        params.extend(self.base_params.iter().cloned());
        params.push(QueryParam::time_filter(watermark));
        params
    }

    async fn poll(&self, params: &[QueryParam]) -> Result<QueryResult, QueryError> {
        let after = self.collaborators.config.poll_timeout();
        with_timeout(
            after,
            self.collaborators.engine.poll(&self.query_name, params),
        )
        .await
        .unwrap_or(Err(QueryError::Timeout { after }))
    }

    fn serialize(
        &self,
        result: QueryResult,
        created: DateTime<Utc>,
    ) -> Result<Vec<u8>, SerializationError> {
        let doc = QueryDocument::new(result, created);
        self.collaborators.serializer.serialize(&doc)
    }

    async fn deliver(&self, payload: &[u8]) -> Result<DeliveryOutcome, DeliveryError> {
        let after = self.collaborators.config.delivery_timeout();
        with_timeout(
            after,
            self.collaborators.delivery.deliver(&self.destination, payload),
        )
        .await
        .unwrap_or(Err(DeliveryError::Timeout { after }))
    }
}

/// `None` if the future did not complete within `after`.
async fn with_timeout<F: Future>(after: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(after, fut).await.ok()
}

fn validate_params(params: &[QueryParam]) -> Result<(), SubscriptionError> {
    let mut seen = HashSet::with_capacity(params.len());
    for param in params {
        if param.name == TIME_FILTER_PARAM {
            return Err(SubscriptionError::ReservedParameter {
                name: param.name.clone(),
            });
        }
        if !seen.insert(param.name.as_str()) {
            return Err(SubscriptionError::DuplicateParameter {
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Mask userinfo: a bare username is usually a token.
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    // http(s) URLs always have a base, so these cannot fail.
    if !url.username().is_empty() {
        let _ = url.set_username("***");
    }
    if url.password().is_some() {
        let _ = url.set_password(Some("***"));
    }
    url.to_string()
}

fn parse_destination(destination: &str) -> Result<Url, SubscriptionError> {
    let url = Url::parse(destination).map_err(|e| SubscriptionError::InvalidDestination {
        destination: destination.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(SubscriptionError::InvalidDestination {
            destination: destination.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}
