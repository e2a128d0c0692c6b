use async_trait::async_trait;
use std::sync::Arc;

use super::job::Job;
use super::payment::{EventProperties, PaymentInstruction, PaymentOutcome, Recipient};
use crate::error::Result;

pub type RecipientDirectoryBox = Box<dyn RecipientDirectory>;
pub type AccessTokenSourceBox = Box<dyn AccessTokenSource>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type TelemetrySinkBox = Box<dyn TelemetrySink>;
/// The queue is shared between the consumer loop and the processor's
/// requeue/dead-letter paths, so it travels as an `Arc`.
pub type JobQueueRef = Arc<dyn JobQueue>;

/// Resolves a bare handle to contact info and a payment account.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// `Ok(None)` means the handle maps to no known account.
    async fn lookup(&self, handle: &str) -> Result<Option<Recipient>>;
}

/// Maps a job's originating user id to a payment authorization token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self, user_id: &str) -> Result<Option<String>>;
}

/// Executes one payment instruction.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// A provider-side decline is `Ok(PaymentOutcome::Failed { .. })`;
    /// `Err` is reserved for transport failures. The processor treats both
    /// as a failed dispatch.
    async fn pay(&self, instruction: &PaymentInstruction) -> Result<PaymentOutcome>;
}

/// Records a completed-payment event. Fire-and-forget from the processor's
/// point of view.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn track(&self, user_id: &str, event: &str, properties: EventProperties) -> Result<()>;
}

/// A job pulled off the queue, awaiting acknowledgment.
#[derive(Debug, PartialEq, Clone)]
pub struct Delivery {
    pub tag: u64,
    pub job: Job,
}

/// Deliver-with-ack job queue.
///
/// `publish` serves both the upstream producer and the retry policy's
/// resubmission; `dead_letter` routes poison jobs aside. A delivered job
/// stays in flight until `ack` removes it for good.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn publish(&self, job: Job) -> Result<()>;

    async fn dead_letter(&self, job: Job, reason: &str) -> Result<()>;

    /// Next delivery, or `None` once the queue has drained: nothing ready
    /// and nothing in flight that could still requeue.
    async fn next(&self) -> Result<Option<Delivery>>;

    async fn ack(&self, tag: u64) -> Result<()>;
}
