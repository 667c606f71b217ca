//! # Prometheus Metrics
//!
//! Operational metrics for the devnet, registered in a dedicated
//! [`prometheus::Registry`] with the `nexus` prefix and served at
//! `/metrics` on the metrics port.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use nexus_contracts::network::DeliveryReport;

/// Metric handles for the node. Cheap to clone.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Deposits accepted on any chain.
    pub deposits_total: IntCounter,
    /// Withdrawals accepted on any chain.
    pub withdrawals_total: IntCounter,
    /// Delivered legs by outcome: delivered, reverted, aborted, stranded.
    pub legs_total: IntCounterVec,
    /// Refund claims paid out on the hub chain.
    pub refunds_claimed_total: IntCounter,
    /// Legs sent and not yet delivered.
    pub pending_legs: IntGauge,
    /// Entries on the hub's refund ledger.
    pub refund_entries: IntGauge,
    /// Wall time of one relayer flush.
    pub delivery_seconds: Histogram,
}

fn register<T: prometheus::core::Collector + Clone + 'static>(
    registry: &Registry,
    metric: T,
) -> Result<T, prometheus::Error> {
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("nexus".into()), None)?;

        let deposits_total = register(
            &registry,
            IntCounter::new("deposits_total", "Deposits accepted on any chain")?,
        )?;
        let withdrawals_total = register(
            &registry,
            IntCounter::new("withdrawals_total", "Withdrawals accepted on any chain")?,
        )?;
        let legs_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("legs_total", "Cross-chain legs delivered, by outcome"),
                &["outcome"],
            )?,
        )?;
        let refunds_claimed_total = register(
            &registry,
            IntCounter::new("refunds_claimed_total", "Refund claims paid on the hub chain")?,
        )?;
        let pending_legs = register(
            &registry,
            IntGauge::new("pending_legs", "Legs sent and not yet delivered")?,
        )?;
        let refund_entries = register(
            &registry,
            IntGauge::new("refund_entries", "Outstanding entries on the refund ledger")?,
        )?;
        let delivery_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new("delivery_seconds", "Wall time of one relayer flush")
                    .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            )?,
        )?;

        Ok(Self {
            registry,
            deposits_total,
            withdrawals_total,
            legs_total,
            refunds_claimed_total,
            pending_legs,
            refund_entries,
            delivery_seconds,
        })
    }

    /// Counts each report under its outcome label.
    pub fn record_deliveries(&self, reports: &[DeliveryReport]) {
        for report in reports {
            self.legs_total
                .with_label_values(&[report.outcome.label()])
                .inc();
        }
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

/// Router serving `/metrics` alone, bound to the metrics port.
pub fn router(metrics: SharedMetrics) -> axum::Router {
    axum::Router::new()
        .route("/metrics", axum::routing::get(metrics_handler))
        .with_state(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_contracts::network::DeliveryOutcome;
    use nexus_protocol::types::{ChainId, DispatchId};

    fn report(outcome: DeliveryOutcome) -> DeliveryReport {
        DeliveryReport {
            dispatch: DispatchId::new(),
            origin: ChainId(1),
            destination: ChainId(7000),
            operation: None,
            amount: 10,
            outcome,
        }
    }

    #[test]
    fn deliveries_are_counted_by_outcome() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_deliveries(&[
            report(DeliveryOutcome::Delivered),
            report(DeliveryOutcome::Delivered),
            report(DeliveryOutcome::Reverted {
                reason: "paused".into(),
            }),
        ]);

        assert_eq!(metrics.legs_total.with_label_values(&["delivered"]).get(), 2);
        assert_eq!(metrics.legs_total.with_label_values(&["reverted"]).get(), 1);
        assert_eq!(metrics.legs_total.with_label_values(&["aborted"]).get(), 0);
    }

    #[test]
    fn encoded_output_carries_the_prefix() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.deposits_total.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("nexus_deposits_total 1"));
    }
}
