use crate::domain::job::Job;
use crate::domain::parse::{extract_handles, parse_amount};
use crate::domain::payment::{EventProperties, PaymentInstruction, PaymentOutcome, SENT_MONEY};
use crate::domain::ports::{
    AccessTokenSourceBox, JobQueueRef, PaymentGatewayBox, RecipientDirectoryBox, TelemetrySinkBox,
};
use crate::error::{Result, WorkerError};

/// Terminal outcome of one processing pass. Every variant is followed by an
/// acknowledgment of the original delivery; the consumer owns that ack.
#[derive(Debug, PartialEq, Clone)]
pub enum JobDisposition {
    /// Dispatch loop ran to completion over every resolved recipient.
    Completed {
        paid: usize,
        skipped: usize,
        requeued: bool,
    },
    /// Retry budget was already spent on entry; the job is abandoned.
    RetriesExhausted,
    /// Parsed amount exceeds the ceiling; nothing was dispatched.
    OverCeiling { amount: u64 },
    /// Poison job (no amount, or no access token) routed aside.
    DeadLettered { reason: String },
}

/// Runs one job through the dispatch pipeline.
///
/// All collaborators are injected; the processor keeps no state of its own
/// beyond the policy knobs, so one instance can serve any number of
/// concurrent job tasks. Within a single job every external call is awaited
/// before the next one starts.
pub struct JobProcessor {
    directory: RecipientDirectoryBox,
    tokens: AccessTokenSourceBox,
    gateway: PaymentGatewayBox,
    telemetry: TelemetrySinkBox,
    queue: JobQueueRef,
    retry_bound: u32,
    amount_ceiling: u64,
}

impl JobProcessor {
    pub fn new(
        directory: RecipientDirectoryBox,
        tokens: AccessTokenSourceBox,
        gateway: PaymentGatewayBox,
        telemetry: TelemetrySinkBox,
        queue: JobQueueRef,
        retry_bound: u32,
        amount_ceiling: u64,
    ) -> Self {
        Self {
            directory,
            tokens,
            gateway,
            telemetry,
            queue,
            retry_bound,
            amount_ceiling,
        }
    }

    /// Processes a single job.
    ///
    /// Pipeline order: retry budget, token fetch, recipient resolution,
    /// amount threshold, then one sequential dispatch per recipient. A
    /// failed dispatch resubmits the job (at most once per pass) and the
    /// loop keeps going; every recipient gets exactly one attempt.
    ///
    /// `Err` is reserved for infrastructure failures (a resubmission or
    /// dead-letter publish that itself failed); every policy outcome is a
    /// `JobDisposition`.
    pub async fn process(&self, job: Job) -> Result<JobDisposition> {
        if job.retry_count >= self.retry_bound {
            tracing::warn!(
                user = %job.user.id,
                retries = job.retry_count,
                "retry budget exhausted, abandoning job"
            );
            return Ok(JobDisposition::RetriesExhausted);
        }

        tracing::debug!(text = %job.text, "starting job");

        let access_token = match self.tokens.access_token(&job.user.id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                let reason = WorkerError::MissingAccessToken(job.user.id.clone()).to_string();
                return self.reject(job, &reason).await;
            }
            Err(e) => {
                return self.reject(job, &format!("token fetch failed: {e}")).await;
            }
        };

        let handles = extract_handles(&job.text);
        tracing::debug!(count = handles.len(), "extracted recipient handles");

        let mut recipients = Vec::with_capacity(handles.len());
        for handle in &handles {
            match self.directory.lookup(handle).await {
                Ok(Some(recipient)) => recipients.push(recipient),
                Ok(None) => {
                    tracing::warn!(%handle, "recipient not found, skipping");
                }
                Err(e) => {
                    tracing::warn!(%handle, error = %e, "recipient lookup failed, skipping");
                }
            }
        }
        let skipped = handles.len() - recipients.len();

        let amount = match parse_amount(&job.text) {
            Ok(amount) => amount,
            Err(e) => return self.reject(job, &e.to_string()).await,
        };
        tracing::debug!(amount, "parsed amount");

        if amount > self.amount_ceiling {
            tracing::warn!(
                amount,
                ceiling = self.amount_ceiling,
                "amount exceeds ceiling, abandoning job"
            );
            return Ok(JobDisposition::OverCeiling { amount });
        }

        let mut paid = 0;
        let mut requeued = false;
        for recipient in &recipients {
            let load = PaymentInstruction {
                email: recipient.email.clone(),
                phone: recipient.phone.clone(),
                access_token: access_token.clone(),
                amount,
                note: job.text.clone(),
            };

            let outcome = match self.gateway.pay(&load).await {
                Ok(outcome) => outcome,
                Err(e) => PaymentOutcome::Failed {
                    reason: e.to_string(),
                },
            };

            match outcome {
                PaymentOutcome::Sent => {
                    paid += 1;
                    tracing::debug!(handle = %recipient.handle, amount, "payment sent");
                    let properties = EventProperties {
                        revenue: amount,
                        recipient: recipient.handle.clone(),
                    };
                    if let Err(e) = self
                        .telemetry
                        .track(&job.user.id, SENT_MONEY, properties)
                        .await
                    {
                        tracing::warn!(error = %e, "telemetry emit failed");
                    }
                }
                PaymentOutcome::Failed { reason } => {
                    tracing::warn!(handle = %recipient.handle, %reason, "payment failed");
                    // One resubmission per pass; remaining recipients still
                    // get their attempt.
                    if !requeued {
                        self.queue.publish(job.retried()).await?;
                        requeued = true;
                    }
                }
            }
        }

        tracing::debug!(paid, skipped, requeued, "job complete");
        Ok(JobDisposition::Completed {
            paid,
            skipped,
            requeued,
        })
    }

    /// Routes a poison job to the dead-letter path.
    async fn reject(&self, job: Job, reason: &str) -> Result<JobDisposition> {
        tracing::error!(user = %job.user.id, %reason, "dead-lettering job");
        self.queue.dead_letter(job, reason).await?;
        Ok(JobDisposition::DeadLettered {
            reason: reason.to_string(),
        })
    }
}
