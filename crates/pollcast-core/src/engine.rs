//! Query engine capability.
//!
//! The subscription only needs "run this named query with these parameters".
//! Transport bindings (HTTP, RPC, in-process) implement [`QueryEngine`].

use async_trait::async_trait;

use crate::error::QueryError;
use crate::model::{QueryParam, QueryResult};

/// Executes named queries.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Run `query_name` with `params` and return every matching event.
    async fn poll(&self, query_name: &str, params: &[QueryParam])
        -> Result<QueryResult, QueryError>;

    /// Engine name for logging.
    fn engine_name(&self) -> &str {
        "unknown"
    }
}
