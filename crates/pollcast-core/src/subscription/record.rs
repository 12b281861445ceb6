//! Stored form of a subscription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SubscriptionError;
use crate::model::QueryParam;

/// Everything needed to recreate a [`super::Subscription`].
///
/// Produced by [`super::Subscription::record`] after each successful
/// execution and handed back to [`super::Subscription::new`] on restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Unique id, stamped on every delivered result.
    pub subscription_id: String,

    /// Named query executed on every trigger.
    pub query_name: String,

    /// Base parameters, never including `GE_recordTime`.
    #[serde(default)]
    pub query_params: Vec<QueryParam>,

    /// Where results are POSTed. May carry basic-auth userinfo.
    pub destination: String,

    /// Deliver even when every event category is empty.
    #[serde(default)]
    pub report_if_empty: bool,

    /// Lower bound of the first execution's time filter.
    pub initial_record_time: DateTime<Utc>,

    /// Watermark as of the last successful execution.
    #[serde(default)]
    pub last_time_executed: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    pub fn from_yaml(yaml: &str) -> Result<Self, SubscriptionError> {
        serde_yaml::from_str(yaml).map_err(|e| SubscriptionError::Record {
            message: e.to_string(),
        })
    }

    pub fn to_yaml(&self) -> Result<String, SubscriptionError> {
        serde_yaml::to_string(self).map_err(|e| SubscriptionError::Record {
            message: e.to_string(),
        })
    }
}
