//! HTTP adapters for pollcast subscriptions.
//!
//! - [`HttpDeliveryClient`]: POSTs serialized results to subscriber destinations
//! - [`HttpQueryEngine`]: runs named queries against a JSON query service
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pollcast_core::{Collaborators, JsonResultSerializer, SubscriptionConfig};
//! use pollcast_http::{HttpDeliveryClient, HttpQueryEngine};
//!
//! # fn example() -> anyhow::Result<()> {
//! let collaborators = Collaborators::new(
//!     Arc::new(HttpQueryEngine::from_env()?),
//!     Arc::new(JsonResultSerializer::new()),
//!     Arc::new(HttpDeliveryClient::from_env()?),
//! )
//! .with_config(SubscriptionConfig::from_env());
//! # let _ = collaborators;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `POLLCAST_QUERY_URL` | Query service base URL (default: `http://localhost:8080/epcis/query`) |
//! | `POLLCAST_QUERY_TIMEOUT` | Query request timeout in seconds (default: 30) |
//! | `POLLCAST_DELIVERY_TIMEOUT` | Delivery request timeout in seconds (default: 30) |
//! | `POLLCAST_CONNECT_TIMEOUT` | Delivery connect timeout in seconds (default: 10) |
//! | `POLLCAST_CONTENT_TYPE` | Delivered payload content type (default: `text/plain`) |

pub mod config;
pub mod delivery;
pub mod query;

pub use config::{DeliveryConfig, QueryEngineConfig};
pub use delivery::HttpDeliveryClient;
pub use query::HttpQueryEngine;

/// User agent for outbound requests.
pub const USER_AGENT_VALUE: &str = concat!("pollcast/", env!("CARGO_PKG_VERSION"));
