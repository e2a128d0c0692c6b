use async_trait::async_trait;

use crate::domain::payment::{EventProperties, PaymentInstruction, PaymentOutcome};
use crate::domain::ports::{PaymentGateway, TelemetrySink};
use crate::error::Result;

/// Dry-run gateway: prints each instruction instead of moving money, and
/// always reports success. Used by the binary when no real provider is
/// wired in.
#[derive(Default, Clone)]
pub struct ConsoleGateway;

#[async_trait]
impl PaymentGateway for ConsoleGateway {
    async fn pay(&self, instruction: &PaymentInstruction) -> Result<PaymentOutcome> {
        let contact = instruction
            .email
            .as_deref()
            .or(instruction.phone.as_deref())
            .unwrap_or("<no contact>");
        println!("paid {} to {}", instruction.amount, contact);
        Ok(PaymentOutcome::Sent)
    }
}

/// Telemetry sink that prints events to stdout.
#[derive(Default, Clone)]
pub struct ConsoleTelemetry;

#[async_trait]
impl TelemetrySink for ConsoleTelemetry {
    async fn track(&self, user_id: &str, event: &str, properties: EventProperties) -> Result<()> {
        println!(
            "track user={} event={:?} revenue={} recipient={}",
            user_id, event, properties.revenue, properties.recipient
        );
        Ok(())
    }
}
