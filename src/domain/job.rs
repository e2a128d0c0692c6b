use serde::{Deserialize, Serialize};

/// One queued unit of work: a social-media post carrying an embedded
/// payment instruction.
///
/// The wire schema is `{"text", "user": {"id"}, "retryCount"}`. A job on its
/// first delivery has no `retryCount` field, which deserializes to zero; the
/// retry policy is the only writer of that field.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Job {
    /// Raw post content; source of both the amount and the recipients.
    pub text: String,
    /// Originating account, used to fetch the payment authorization token.
    pub user: JobUser,
    /// Number of times this job has already been reprocessed.
    #[serde(rename = "retryCount", default)]
    pub retry_count: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct JobUser {
    pub id: String,
}

impl Job {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user: JobUser { id: user_id.into() },
            retry_count: 0,
        }
    }

    /// Copy of this job with the retry count bumped, ready for resubmission.
    pub fn retried(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserialization_defaults_retry_count() {
        let json = r#"{"text": "$5 @eve", "user": {"id": "42"}}"#;
        let job: Job = serde_json::from_str(json).unwrap();

        assert_eq!(job.text, "$5 @eve");
        assert_eq!(job.user.id, "42");
        assert_eq!(job.retry_count, 0);
    }

    #[test]
    fn test_job_deserialization_reads_retry_count() {
        let json = r#"{"text": "$5 @eve", "user": {"id": "42"}, "retryCount": 2}"#;
        let job: Job = serde_json::from_str(json).unwrap();

        assert_eq!(job.retry_count, 2);
    }

    #[test]
    fn test_job_roundtrip_for_resubmission() {
        let job = Job::new("$5 @eve", "42").retried();
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();

        assert_eq!(back, job);
        assert_eq!(back.retry_count, 1);
    }
}
