//! Business metrics for the ticketing ledger.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticketing_events_created_total` - events created
//! - `ticketing_tickets_minted_total{channel}` - tickets minted, `channel` is `mint` or `purchase`
//! - `ticketing_payment_volume_total` - currency units paid to organizers
//! - `ticketing_transfers_total` - ticket transfers
//! - `ticketing_events_deactivated_total` - deactivation commands committed
//! - `ticketing_organizer_changes_total{change}` - `authorized` or `revoked`
//! - `ticketing_rejections_total{command, code}` - rejected commands by error code

use crate::service::LedgerEvent;
use metrics::{counter, describe_counter};
use ticket_ledger_core::journal::Committed;

/// Register all business metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!("ticketing_events_created_total", "Total number of events created");
    describe_counter!(
        "ticketing_tickets_minted_total",
        "Total number of tickets minted, by channel (mint, purchase)"
    );
    describe_counter!(
        "ticketing_payment_volume_total",
        "Total currency units paid to organizers for tickets"
    );
    describe_counter!("ticketing_transfers_total", "Total number of ticket transfers");
    describe_counter!(
        "ticketing_events_deactivated_total",
        "Total number of event deactivations"
    );
    describe_counter!(
        "ticketing_organizer_changes_total",
        "Total organizer authorization changes, by change (authorized, revoked)"
    );
    describe_counter!(
        "ticketing_rejections_total",
        "Total rejected commands, by command and error code"
    );

    tracing::info!("Business metrics registered");
}

/// Record business metrics for committed journal entries
pub fn record_committed(entries: &[Committed<LedgerEvent>]) {
    for entry in entries {
        match &entry.event {
            LedgerEvent::OrganizerAuthorized { .. } => {
                counter!("ticketing_organizer_changes_total", "change" => "authorized").increment(1);
            }
            LedgerEvent::OrganizerRevoked { .. } => {
                counter!("ticketing_organizer_changes_total", "change" => "revoked").increment(1);
            }
            LedgerEvent::EventCreated { .. } => {
                counter!("ticketing_events_created_total").increment(1);
            }
            LedgerEvent::PaymentSettled { amount, .. } => {
                counter!("ticketing_payment_volume_total").increment(amount.units());
            }
            LedgerEvent::TicketMinted { paid, .. } => {
                let channel = if *paid { "purchase" } else { "mint" };
                counter!("ticketing_tickets_minted_total", "channel" => channel).increment(1);
            }
            LedgerEvent::TicketTransferred { .. } => {
                counter!("ticketing_transfers_total").increment(1);
            }
            LedgerEvent::EventDeactivated { .. } => {
                counter!("ticketing_events_deactivated_total").increment(1);
            }
        }
    }
}

/// Record a rejected command
pub fn record_rejection(command: &'static str, code: u32) {
    counter!("ticketing_rejections_total", "command" => command, "code" => code.to_string())
        .increment(1);
}
