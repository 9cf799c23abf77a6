//! Business metrics for ticket purchases.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `reelmint_purchases_total{status}` - attempts by outcome (opened,
//!   rejected, cancelled, completed, failed)
//! - `reelmint_payments_total{method,status}` - payment legs by method and
//!   outcome (settled, failed)
//! - `reelmint_payment_volume_lamports_total{method}` - settled amounts
//! - `reelmint_tickets_issued_total` - ticket tokens issued
//! - `reelmint_paid_unissued_total` - buyers charged without a ticket
//!
//! ## Gauges
//! - `reelmint_active_purchases` - attempts in flight
//!
//! ## Histograms
//! - `reelmint_purchase_duration_seconds` - time from opening to completion
//!
//! No exporter is installed here; the embedding application picks the
//! recorder.

use crate::error::PurchaseError;
use crate::types::{Lamports, PaymentMethod};
use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register descriptions for every business metric.
///
/// Call once at startup, before anything is recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "reelmint_purchases_total",
        "Purchase attempts by status (opened, rejected, cancelled, completed, failed)"
    );
    describe_gauge!(
        "reelmint_active_purchases",
        "Purchase attempts currently in flight"
    );
    describe_histogram!(
        "reelmint_purchase_duration_seconds",
        "Time from opening a purchase to issuing its ticket"
    );

    describe_counter!(
        "reelmint_payments_total",
        "Payment legs by method and status (settled, failed)"
    );
    describe_counter!(
        "reelmint_payment_volume_lamports_total",
        "Lamports settled by method"
    );

    describe_counter!(
        "reelmint_tickets_issued_total",
        "Ticket tokens issued"
    );
    describe_counter!(
        "reelmint_paid_unissued_total",
        "Purchases that were paid for but never issued a ticket"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record an opened attempt.
pub fn record_purchase_opened() {
    metrics::counter!("reelmint_purchases_total", "status" => "opened").increment(1);
    metrics::gauge!("reelmint_active_purchases").increment(1.0);
}

/// Record a refused command.
pub fn record_purchase_rejected(error: &PurchaseError) {
    metrics::counter!(
        "reelmint_purchases_total",
        "status" => "rejected",
        "reason" => error.kind()
    )
    .increment(1);
}

/// Record a cancelled attempt.
pub fn record_purchase_cancelled() {
    metrics::counter!("reelmint_purchases_total", "status" => "cancelled").increment(1);
    metrics::gauge!("reelmint_active_purchases").decrement(1.0);
}

/// Record a settled payment leg.
pub fn record_payment_settled(method: PaymentMethod, amount: Lamports) {
    let method = method.to_string();
    metrics::counter!("reelmint_payments_total", "method" => method.clone(), "status" => "settled")
        .increment(1);
    metrics::counter!("reelmint_payment_volume_lamports_total", "method" => method)
        .increment(amount.get());
}

/// Record a completed purchase and its issued ticket.
///
/// # Arguments
///
/// * `duration_secs` - Time from opening to completion in seconds
pub fn record_purchase_completed(duration_secs: f64) {
    metrics::counter!("reelmint_purchases_total", "status" => "completed").increment(1);
    metrics::counter!("reelmint_tickets_issued_total").increment(1);
    metrics::gauge!("reelmint_active_purchases").decrement(1.0);
    metrics::histogram!("reelmint_purchase_duration_seconds").record(duration_secs);
    tracing::debug!(duration_secs, "Recorded purchase_completed metric");
}

/// Record a failed attempt.
///
/// Failed payment legs and paid-but-unissued purchases are counted on
/// their own as well.
pub fn record_purchase_failed(method: Option<PaymentMethod>, error: &PurchaseError) {
    metrics::counter!("reelmint_purchases_total", "status" => "failed").increment(1);
    metrics::gauge!("reelmint_active_purchases").decrement(1.0);

    if let (PurchaseError::PaymentFailed { .. }, Some(method)) = (error, method) {
        metrics::counter!(
            "reelmint_payments_total",
            "method" => method.to_string(),
            "status" => "failed"
        )
        .increment(1);
    }
    if error.paid_but_unissued() {
        metrics::counter!("reelmint_paid_unissued_total").increment(1);
    }
    tracing::debug!(kind = error.kind(), "Recorded purchase_failed metric");
}
