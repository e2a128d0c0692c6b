/// Maximum number of times a job may be reprocessed before it is abandoned.
pub const DEFAULT_RETRY_BOUND: u32 = 2;

/// Maximum payment amount per job; anything above it blocks all dispatch.
pub const DEFAULT_AMOUNT_CEILING: u64 = 20;

/// Maximum number of jobs in flight at once.
pub const DEFAULT_PREFETCH: usize = 5;

/// Runtime configuration for the worker.
///
/// The broker endpoint comes from the environment (`CLOUDAMQP_URL`); the
/// remaining knobs have fixed defaults and can be overridden from the CLI.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Broker connection endpoint.
    pub broker_url: String,
    /// Queue the worker consumes from and resubmits to.
    pub queue: String,
    /// Concurrency cap for in-flight jobs.
    pub prefetch: usize,
    /// Retry budget per job.
    pub retry_bound: u32,
    /// Per-job payment amount ceiling.
    pub amount_ceiling: u64,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            broker_url: std::env::var("CLOUDAMQP_URL")
                .unwrap_or_else(|_| "amqp://localhost".to_string()),
            ..Self::default()
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            broker_url: "amqp://localhost".to_string(),
            queue: "jobs".to_string(),
            prefetch: DEFAULT_PREFETCH,
            retry_bound: DEFAULT_RETRY_BOUND,
            amount_ceiling: DEFAULT_AMOUNT_CEILING,
        }
    }
}
