use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tipjar::application::consumer::QueueConsumer;
use tipjar::application::processor::JobProcessor;
use tipjar::config::WorkerConfig;
use tipjar::domain::ports::JobQueueRef;
use tipjar::infrastructure::console::{ConsoleGateway, ConsoleTelemetry};
use tipjar::infrastructure::in_memory::{InMemoryDirectory, InMemoryQueue, UserRecord};
use tipjar::interfaces::json::job_reader::JobReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Job backlog file, one JSON job per line
    jobs: PathBuf,

    /// User directory file (JSON array of user records)
    #[arg(long)]
    users: PathBuf,

    /// Concurrency cap for in-flight jobs
    #[arg(long, default_value_t = tipjar::config::DEFAULT_PREFETCH)]
    prefetch: usize,

    /// Retry budget per job
    #[arg(long, default_value_t = tipjar::config::DEFAULT_RETRY_BOUND)]
    retry_bound: u32,

    /// Per-job payment amount ceiling
    #[arg(long, default_value_t = tipjar::config::DEFAULT_AMOUNT_CEILING)]
    ceiling: u64,

    /// Broker endpoint (unused in dry-run mode, kept for parity with the
    /// deployed worker)
    #[arg(long, env = "CLOUDAMQP_URL", default_value = "amqp://localhost")]
    broker_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = WorkerConfig {
        broker_url: cli.broker_url,
        prefetch: cli.prefetch,
        retry_bound: cli.retry_bound,
        amount_ceiling: cli.ceiling,
        ..WorkerConfig::default()
    };

    let users: Vec<UserRecord> = {
        let file = File::open(&cli.users).into_diagnostic()?;
        serde_json::from_reader(BufReader::new(file)).into_diagnostic()?
    };
    let directory = InMemoryDirectory::new(users);

    let queue = Arc::new(InMemoryQueue::new());

    let mut seeded = 0usize;
    let file = File::open(&cli.jobs).into_diagnostic()?;
    let reader = JobReader::new(BufReader::new(file));
    for job_result in reader.jobs() {
        match job_result {
            Ok(job) => {
                queue.seed([job]).await;
                seeded += 1;
            }
            Err(e) => {
                eprintln!("Error reading job: {}", e);
            }
        }
    }

    let processor = Arc::new(JobProcessor::new(
        Box::new(directory.clone()),
        Box::new(directory),
        Box::new(ConsoleGateway),
        Box::new(ConsoleTelemetry),
        queue.clone() as JobQueueRef,
        config.retry_bound,
        config.amount_ceiling,
    ));

    let consumer = QueueConsumer::new(queue.clone() as JobQueueRef, processor, config.prefetch);
    consumer.run(CancellationToken::new()).await.into_diagnostic()?;

    let dead = queue.dead_letters().await;
    for entry in &dead {
        eprintln!("dead-letter: {} ({})", entry.job.text, entry.reason);
    }
    println!(
        "drained: {} jobs seeded, {} resubmissions, {} dead-lettered",
        seeded,
        queue.published().await.len(),
        dead.len()
    );

    Ok(())
}
