//! Query parameters, poll results and the delivered envelope.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the parameter carrying the watermark on every poll.
pub const TIME_FILTER_PARAM: &str = "GE_recordTime";

/// Schema version stamped on every [`QueryDocument`].
pub const QUERY_DOCUMENT_SCHEMA_VERSION: &str = "1.0";

/// A single named query parameter.
///
/// The engine interprets the value by naming convention: `GE_<field>` is a
/// greater-or-equal filter on `<field>`, `EQ_<field>` an equality filter.
///
/// On the wire the value carries its type next to it,
/// `{"name": "EQ_bizStep", "type": "text", "value": "shipping"}`, so a text
/// value that happens to look like a timestamp stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    /// Parameter name, e.g. `EQ_bizStep`.
    pub name: String,

    /// Typed value, flattened into `type` and `value` keys.
    #[serde(flatten)]
    pub value: ParamValue,
}

/// Parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    List(Vec<String>),
    Text(String),
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParamValue::Text(value.into()))
    }

    pub fn time(name: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(name, ParamValue::Time(value))
    }

    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ParamValue::Int(value))
    }

    pub fn list<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ParamValue::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// The time filter parameter for a given watermark.
    pub fn time_filter(watermark: DateTime<Utc>) -> Self {
        Self::time(TIME_FILTER_PARAM, watermark)
    }
}

/// An event record. Opaque to the subscription; only counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(pub serde_json::Value);

impl From<serde_json::Value> for Event {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Result of one poll.
///
/// Each category may be absent or empty; both mean "no events" (see
/// [`crate::classify::is_empty`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Echoed by the engine. Not every engine sends it.
    #[serde(default)]
    pub query_name: String,

    /// Stamped by the subscription, never by the engine.
    #[serde(default, rename = "subscriptionID", skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_events: Option<Vec<Event>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_events: Option<Vec<Event>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_events: Option<Vec<Event>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_events: Option<Vec<Event>>,
}

impl QueryResult {
    /// A result with every category absent.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            ..Default::default()
        }
    }

    pub fn with_aggregation_events(mut self, events: Vec<Event>) -> Self {
        self.aggregation_events = Some(events);
        self
    }

    pub fn with_object_events(mut self, events: Vec<Event>) -> Self {
        self.object_events = Some(events);
        self
    }

    pub fn with_quantity_events(mut self, events: Vec<Event>) -> Self {
        self.quantity_events = Some(events);
        self
    }

    pub fn with_transaction_events(mut self, events: Vec<Event>) -> Self {
        self.transaction_events = Some(events);
        self
    }

    /// Per-category event counts.
    pub fn counts(&self) -> EventCounts {
        EventCounts::of(self)
    }
}

/// Number of events per category. Diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    /// Aggregation events.
    pub aggregation: usize,

    /// Object events.
    pub object: usize,

    /// Quantity events.
    pub quantity: usize,

    /// Transaction events.
    pub transaction: usize,
}

impl EventCounts {
    pub fn of(result: &QueryResult) -> Self {
        fn len(events: &Option<Vec<Event>>) -> usize {
            events.as_ref().map_or(0, Vec::len)
        }

        Self {
            aggregation: len(&result.aggregation_events),
            object: len(&result.object_events),
            quantity: len(&result.quantity_events),
            transaction: len(&result.transaction_events),
        }
    }

    pub fn total(&self) -> usize {
        self.aggregation + self.object + self.quantity + self.transaction
    }
}

impl fmt::Display for EventCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} aggregation, {} object, {} quantity, {} transaction",
            self.aggregation, self.object, self.quantity, self.transaction
        )
    }
}

/// Response envelope handed to the serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDocument {
    /// Envelope schema version, [`QUERY_DOCUMENT_SCHEMA_VERSION`].
    pub schema_version: String,

    /// When the execution that produced this document started.
    pub creation_date: DateTime<Utc>,

    /// The poll result, stamped with the subscription id.
    pub body: QueryResult,
}

impl QueryDocument {
    pub fn new(body: QueryResult, creation_date: DateTime<Utc>) -> Self {
        Self {
            schema_version: QUERY_DOCUMENT_SCHEMA_VERSION.to_string(),
            creation_date,
            body,
        }
    }
}
