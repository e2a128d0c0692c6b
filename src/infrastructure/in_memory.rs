use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use crate::domain::job::Job;
use crate::domain::payment::{EventProperties, PaymentInstruction, PaymentOutcome, Recipient};
use crate::domain::ports::{
    AccessTokenSource, Delivery, JobQueue, PaymentGateway, RecipientDirectory, TelemetrySink,
};
use crate::error::Result;

/// One entry in the user directory, as loaded from the directory file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub handle: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub account_token: String,
    pub access_token: String,
}

/// In-memory user directory backing both resolution ports.
///
/// The same record set answers handle lookups and access-token fetches, so
/// one directory is typically cloned and boxed once per port.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    by_handle: Arc<HashMap<String, UserRecord>>,
    by_id: Arc<HashMap<String, UserRecord>>,
}

impl InMemoryDirectory {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let records: Vec<UserRecord> = records.into_iter().collect();
        let by_handle = records
            .iter()
            .map(|r| (r.handle.clone(), r.clone()))
            .collect();
        let by_id = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            by_handle: Arc::new(by_handle),
            by_id: Arc::new(by_id),
        }
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn lookup(&self, handle: &str) -> Result<Option<Recipient>> {
        Ok(self.by_handle.get(handle).map(|r| Recipient {
            handle: r.handle.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
            account_token: r.account_token.clone(),
        }))
    }
}

#[async_trait]
impl AccessTokenSource for InMemoryDirectory {
    async fn access_token(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.by_id.get(user_id).map(|r| r.access_token.clone()))
    }
}

/// Payment gateway double that records every instruction it receives.
///
/// By default every payment succeeds; [`failing_for`](Self::failing_for)
/// scripts declines by recipient email or phone.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    payments: Arc<Mutex<Vec<PaymentInstruction>>>,
    failing: HashSet<String>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declines payments whose email or phone matches any given contact.
    pub fn failing_for<'a>(mut self, contacts: impl IntoIterator<Item = &'a str>) -> Self {
        self.failing = contacts.into_iter().map(str::to_string).collect();
        self
    }

    /// Instructions received so far, in dispatch order.
    pub async fn payments(&self) -> Vec<PaymentInstruction> {
        self.payments.lock().await.clone()
    }

    fn declines(&self, instruction: &PaymentInstruction) -> bool {
        let email_hit = instruction
            .email
            .as_deref()
            .is_some_and(|e| self.failing.contains(e));
        let phone_hit = instruction
            .phone
            .as_deref()
            .is_some_and(|p| self.failing.contains(p));
        email_hit || phone_hit
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn pay(&self, instruction: &PaymentInstruction) -> Result<PaymentOutcome> {
        self.payments.lock().await.push(instruction.clone());
        if self.declines(instruction) {
            Ok(PaymentOutcome::Failed {
                reason: "payment declined".to_string(),
            })
        } else {
            Ok(PaymentOutcome::Sent)
        }
    }
}

/// A recorded telemetry event.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    pub user_id: String,
    pub event: String,
    pub properties: EventProperties,
}

/// Telemetry sink double collecting events in order.
#[derive(Default, Clone)]
pub struct InMemoryTelemetry {
    events: Arc<Mutex<Vec<TrackedEvent>>>,
}

impl InMemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<TrackedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl TelemetrySink for InMemoryTelemetry {
    async fn track(&self, user_id: &str, event: &str, properties: EventProperties) -> Result<()> {
        self.events.lock().await.push(TrackedEvent {
            user_id: user_id.to_string(),
            event: event.to_string(),
            properties,
        });
        Ok(())
    }
}

/// A job routed to the dead-letter path, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadJob {
    pub job: Job,
    pub reason: String,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Job>,
    in_flight: HashMap<u64, Job>,
    dead: Vec<DeadJob>,
    published: Vec<Job>,
    next_tag: u64,
}

/// In-memory deliver-with-ack queue.
///
/// `next` drains `ready` and parks the job in flight until `ack`; it
/// resolves `None` only when nothing is ready and nothing is in flight, so
/// resubmissions from a job still being processed are never missed. Broker
/// redelivery of un-acked jobs is the real broker's concern, not this
/// adapter's.
#[derive(Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the queue without recording the jobs as resubmissions.
    pub async fn seed(&self, jobs: impl IntoIterator<Item = Job>) {
        let mut state = self.state.lock().await;
        state.ready.extend(jobs);
        drop(state);
        self.notify.notify_one();
    }

    /// Jobs published after seeding, i.e. the resubmission history.
    pub async fn published(&self) -> Vec<Job> {
        self.state.lock().await.published.clone()
    }

    pub async fn dead_letters(&self) -> Vec<DeadJob> {
        self.state.lock().await.dead.clone()
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn publish(&self, job: Job) -> Result<()> {
        let mut state = self.state.lock().await;
        state.published.push(job.clone());
        state.ready.push_back(job);
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    async fn dead_letter(&self, job: Job, reason: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.dead.push(DeadJob {
            job,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn next(&self) -> Result<Option<Delivery>> {
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(job) = state.ready.pop_front() {
                    let tag = state.next_tag;
                    state.next_tag += 1;
                    state.in_flight.insert(tag, job.clone());
                    return Ok(Some(Delivery { tag, job }));
                }
                if state.in_flight.is_empty() {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn ack(&self, tag: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.in_flight.remove(&tag);
        drop(state);
        self.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_lookup_and_token() {
        let directory = InMemoryDirectory::new([UserRecord {
            id: "1".to_string(),
            handle: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            account_token: "acct".to_string(),
            access_token: "tok".to_string(),
        }]);

        let recipient = directory.lookup("alice").await.unwrap().unwrap();
        assert_eq!(recipient.email.as_deref(), Some("alice@example.com"));
        assert_eq!(recipient.account_token, "acct");
        assert!(directory.lookup("bob").await.unwrap().is_none());

        assert_eq!(
            directory.access_token("1").await.unwrap().as_deref(),
            Some("tok")
        );
        assert!(directory.access_token("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_record_deserialization() {
        let json = r#"{"id": "1", "handle": "alice", "email": "a@x.com",
                       "accountToken": "acct", "accessToken": "tok"}"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.handle, "alice");
        assert_eq!(record.phone, None);
        assert_eq!(record.account_token, "acct");
    }

    #[tokio::test]
    async fn test_queue_delivers_in_fifo_order() {
        let queue = InMemoryQueue::new();
        queue
            .seed([Job::new("$1 @a", "1"), Job::new("$2 @b", "1")])
            .await;

        let first = queue.next().await.unwrap().unwrap();
        let second = queue.next().await.unwrap().unwrap();
        assert_eq!(first.job.text, "$1 @a");
        assert_eq!(second.job.text, "$2 @b");

        queue.ack(first.tag).await.unwrap();
        queue.ack(second.tag).await.unwrap();
        assert!(queue.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_queue_waits_for_in_flight_resubmission() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.seed([Job::new("$1 @a", "1")]).await;

        let delivery = queue.next().await.unwrap().unwrap();

        // A resubmission published while the first delivery is still in
        // flight must be seen before the queue reports drained.
        let publisher = queue.clone();
        let tag = delivery.tag;
        tokio::spawn(async move {
            publisher.publish(delivery.job.retried()).await.unwrap();
            publisher.ack(tag).await.unwrap();
        });

        let redelivery = queue.next().await.unwrap().unwrap();
        assert_eq!(redelivery.job.retry_count, 1);
        queue.ack(redelivery.tag).await.unwrap();
        assert!(queue.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dead_letter_does_not_redeliver() {
        let queue = InMemoryQueue::new();
        queue
            .dead_letter(Job::new("broken", "1"), "no amount")
            .await
            .unwrap();

        assert!(queue.next().await.unwrap().is_none());
        let dead = queue.dead_letters().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].reason, "no amount");
    }

    #[tokio::test]
    async fn test_gateway_scripted_decline() {
        let gateway = InMemoryGateway::new().failing_for(["bad@example.com"]);
        let load = PaymentInstruction {
            email: Some("bad@example.com".to_string()),
            phone: None,
            access_token: "tok".to_string(),
            amount: 5,
            note: "note".to_string(),
        };

        let outcome = gateway.pay(&load).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Failed { .. }));
        assert_eq!(gateway.payments().await.len(), 1);
    }
}
