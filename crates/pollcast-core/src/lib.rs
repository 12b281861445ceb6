//! Recurring query subscriptions with incremental result delivery.
//!
//! A client registers a named, parameterized query once. On every trigger
//! from an external scheduler the [`Subscription`] re-executes the query
//! against a [`QueryEngine`], restricted to events recorded since the last
//! successful execution, and hands anything new to a [`DeliveryClient`].
//!
//! - Advancing `GE_recordTime` watermark, moved only on success
//! - Emptiness classification across the four event categories
//! - Suppression of empty results unless `report_if_empty` is set
//! - Failures are logged and retried on the next trigger, never propagated
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use pollcast_core::{
//!     Collaborators, DeliveryClient, JsonResultSerializer, QueryEngine, QueryParam,
//!     Subscription, SubscriptionRecord,
//! };
//!
//! # async fn example(
//! #     engine: Arc<dyn QueryEngine>,
//! #     delivery: Arc<dyn DeliveryClient>,
//! # ) -> anyhow::Result<()> {
//! let record = SubscriptionRecord {
//!     subscription_id: "sub-1".to_string(),
//!     query_name: "SimpleEventQuery".to_string(),
//!     query_params: vec![QueryParam::text("EQ_bizStep", "shipping")],
//!     destination: "http://subscriber.example/capture".to_string(),
//!     report_if_empty: false,
//!     initial_record_time: Utc::now(),
//!     last_time_executed: None,
//! };
//! let collaborators = Collaborators::new(engine, Arc::new(JsonResultSerializer::new()), delivery);
//! let subscription = Subscription::new(record, collaborators)?;
//!
//! let outcome = subscription.execute_query().await;
//! if outcome.advanced_watermark() {
//!     let stored = subscription.record();
//!     println!("{}", stored.to_yaml()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `POLLCAST_POLL_TIMEOUT` | Query engine call timeout in seconds (default: 30) |
//! | `POLLCAST_DELIVERY_TIMEOUT` | Delivery call timeout in seconds (default: 30) |

pub mod classify;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod model;
pub mod serialize;
pub mod subscription;

// Re-export main types
pub use classify::is_empty;
pub use clock::{Clock, SystemClock};
pub use config::SubscriptionConfig;
pub use delivery::{DeliveryClient, DeliveryOutcome};
pub use engine::QueryEngine;
pub use error::{DeliveryError, QueryError, SerializationError, SubscriptionError};
pub use model::{
    Event, EventCounts, ParamValue, QueryDocument, QueryParam, QueryResult,
    QUERY_DOCUMENT_SCHEMA_VERSION, TIME_FILTER_PARAM,
};
pub use serialize::{JsonResultSerializer, ResultSerializer};
pub use subscription::{Collaborators, ExecutionOutcome, Subscription, SubscriptionRecord};
