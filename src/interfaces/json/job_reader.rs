use std::io::BufRead;

use crate::domain::job::Job;
use crate::error::{Result, WorkerError};

/// Reads jobs from a JSON-lines source, one job object per line.
///
/// Wraps any `BufRead` and yields `Result<Job>` lazily, so a large backlog
/// file can be fed to the queue without loading it whole. Blank lines are
/// skipped.
pub struct JobReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> JobReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Returns an iterator that lazily reads and deserializes jobs.
    pub fn jobs(self) -> impl Iterator<Item = Result<Job>> {
        self.source
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line).map_err(WorkerError::from)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = concat!(
            r#"{"text": "$5 @alice", "user": {"id": "1"}}"#,
            "\n\n",
            r#"{"text": "$7 @bob", "user": {"id": "2"}, "retryCount": 1}"#,
            "\n",
        );
        let reader = JobReader::new(data.as_bytes());
        let results: Vec<Result<Job>> = reader.jobs().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.text, "$5 @alice");
        assert_eq!(first.retry_count, 0);
        let second = results[1].as_ref().unwrap();
        assert_eq!(second.retry_count, 1);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "{\"text\": \"$5\"\nnot json at all";
        let reader = JobReader::new(data.as_bytes());
        let results: Vec<Result<Job>> = reader.jobs().collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }
}
