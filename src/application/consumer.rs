use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::processor::JobProcessor;
use crate::domain::ports::JobQueueRef;
use crate::error::Result;

/// Pulls jobs off the queue and runs them through the processor under a
/// fixed concurrency cap.
///
/// Each delivery gets its own task; a semaphore permit held for the task's
/// lifetime keeps at most `prefetch` jobs in flight. The consumer owns
/// acknowledgment: every delivery is acked exactly once after its pass
/// finishes, whatever the disposition was.
pub struct QueueConsumer {
    queue: JobQueueRef,
    processor: Arc<JobProcessor>,
    prefetch: usize,
}

impl QueueConsumer {
    pub fn new(queue: JobQueueRef, processor: Arc<JobProcessor>, prefetch: usize) -> Self {
        Self {
            queue,
            processor,
            prefetch,
        }
    }

    /// Runs the consume loop until the queue drains or the token cancels.
    ///
    /// Cancellation stops intake only; jobs already in flight run to
    /// completion and are acked before this returns.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.prefetch));
        let mut tasks = JoinSet::new();

        loop {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => {
                    let Ok(permit) = permit else { break };
                    permit
                }
            };

            let delivery = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                delivery = self.queue.next() => delivery?,
            };
            let Some(delivery) = delivery else { break };

            let processor = self.processor.clone();
            let queue = self.queue.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let tag = delivery.tag;

                match processor.process(delivery.job).await {
                    Ok(disposition) => {
                        tracing::debug!(?disposition, tag, "pass finished");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, tag, "job processing failed");
                    }
                }

                // Unconditional ack, even after a failed pass; retries go
                // through resubmission, never through redelivery.
                if let Err(e) = queue.ack(tag).await {
                    tracing::error!(error = %e, tag, "ack failed");
                }
            });
        }

        while tasks.join_next().await.is_some() {}
        Ok(())
    }
}
