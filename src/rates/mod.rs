//! Live carrier-rate collection.
//!
//! The selector consumes whatever quotes are available; this helper is
//! the collaborator that makes them available. Each source is queried
//! concurrently under a per-source timeout, and a courier that fails or
//! times out is simply absent from the result, not an error. Retry and
//! backoff belong to the caller.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::domain::shipping::courier::RateQuote;

/// One carrier integration (HTTP client, marketplace adapter, fixture).
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn courier_id(&self) -> &str;

    /// Fetch this carrier's offer for a parcel of `weight` kg into the
    /// given zone. Failures are collaborator errors; the collector logs
    /// and drops them.
    async fn fetch_quote(&self, zone_code: &str, weight: Decimal) -> anyhow::Result<RateQuote>;
}

/// Query every source concurrently, bounding each with `timeout`.
/// Returns the quotes that arrived in time, in no particular order.
pub async fn gather_quotes(
    sources: Vec<Arc<dyn QuoteSource>>,
    zone_code: &str,
    weight: Decimal,
    timeout: Duration,
) -> Vec<RateQuote> {
    let mut set = JoinSet::new();
    for source in sources {
        let zone = zone_code.to_string();
        set.spawn(async move {
            let courier = source.courier_id().to_string();
            match tokio::time::timeout(timeout, source.fetch_quote(&zone, weight)).await {
                Ok(Ok(quote)) => Some(quote),
                Ok(Err(err)) => {
                    tracing::warn!(%courier, error = %err, "rate source failed");
                    None
                }
                Err(_) => {
                    tracing::warn!(%courier, ?timeout, "rate source timed out");
                    None
                }
            }
        });
    }

    let mut quotes = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "rate fetch task panicked"),
        }
    }
    quotes
}
