//! Emptiness classification of poll results.
//!
//! Whether an engine omits a category or returns it with zero elements is an
//! engine detail; both classify the same way.

use crate::model::{Event, QueryResult};

/// True iff no category holds at least one event.
pub fn is_empty(result: &QueryResult) -> bool {
    [
        &result.aggregation_events,
        &result.object_events,
        &result.quantity_events,
        &result.transaction_events,
    ]
    .into_iter()
    .all(category_is_empty)
}

fn category_is_empty(events: &Option<Vec<Event>>) -> bool {
    events.as_deref().unwrap_or_default().is_empty()
}
