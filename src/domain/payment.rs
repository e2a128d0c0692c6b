use serde::Serialize;

/// Telemetry event name recorded for every successful payment.
pub const SENT_MONEY: &str = "Sent Money";

/// A recipient handle resolved to contact info and a payment account.
///
/// "Handle not found" is not a zero-value `Recipient`; the directory port
/// returns `Ok(None)` in that case.
#[derive(Debug, PartialEq, Clone)]
pub struct Recipient {
    pub handle: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub account_token: String,
}

/// One payment to one recipient.
///
/// Built once per recipient per job; `amount` is the job's single parsed
/// amount and `note` is the original post text. Absent contact fields are
/// dropped from the serialized form rather than sent as nulls.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PaymentInstruction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub access_token: String,
    pub amount: u64,
    pub note: String,
}

/// Result of one dispatch attempt. Failure drives the per-job requeue path.
#[derive(Debug, PartialEq, Clone)]
pub enum PaymentOutcome {
    Sent,
    Failed { reason: String },
}

/// Properties attached to a completed-payment telemetry event.
#[derive(Debug, PartialEq, Clone)]
pub struct EventProperties {
    pub revenue: u64,
    pub recipient: String,
}
