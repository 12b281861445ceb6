//! Delivery capability: ship a serialized payload to a destination.

use async_trait::async_trait;
use url::Url;

use crate::error::DeliveryError;

/// Status returned by the destination for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub status_code: u16,
}

impl DeliveryOutcome {
    pub fn new(status_code: u16) -> Self {
        Self { status_code }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Sends payloads to subscriber destinations.
///
/// One call is one attempt: implementations must not retry. Any status code
/// the destination answers with is an `Ok`; `Err` means no status was
/// obtained.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(
        &self,
        destination: &Url,
        payload: &[u8],
    ) -> Result<DeliveryOutcome, DeliveryError>;
}
