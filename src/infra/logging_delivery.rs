use crate::app::ports::RouteDeliveryPort;
use crate::error::Result;
use crate::types::RouteDelivery;
use async_trait::async_trait;
use tracing::info;

/// Dry-run delivery: logs each payload instead of posting it
pub struct LoggingDelivery;

#[async_trait]
impl RouteDeliveryPort for LoggingDelivery {
    async fn deliver(&self, delivery: &RouteDelivery) -> Result<u16> {
        info!(
            source = %delivery.source,
            start_node = %delivery.start_node,
            end_node = %delivery.end_node,
            start_time = %delivery.start_time,
            end_time = %delivery.end_time,
            "dry run: route not posted"
        );
        Ok(200)
    }
}
