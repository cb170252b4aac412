//! Jobs over real CSV files, driven through a shared registry.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline_core::CsvFileSource;
use pretty_assertions::assert_eq;
use pipeline_jobs::{Job, JobRegistry, JobStatus, SimulatedLatency};

const MAX_DELAY: Duration = Duration::from_millis(50);

fn csv_file(rows: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..rows {
        writeln!(file, "{i},name-{i},\"note, with comma\"").unwrap();
    }
    file.flush().unwrap();
    file
}

fn csv_job(id: &str, file: &tempfile::NamedTempFile) -> Arc<Job> {
    Job::new(
        id,
        CsvFileSource::new(file.path()),
        Arc::new(SimulatedLatency::new(MAX_DELAY)),
    )
}

async fn wait_for(job: &Job, status: JobStatus, within: Duration) {
    tokio::time::timeout(within, async {
        while job.status() != status {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} stuck at {}", job.id(), job.status()));
}

#[tokio::test]
async fn three_record_file_finishes_within_bound() {
    let file = csv_file(3);
    let registry = JobRegistry::new();
    let job = csv_job("three", &file);
    registry.insert(Arc::clone(&job)).unwrap();

    let start = Instant::now();
    job.run();
    assert_eq!(registry.lookup("three").unwrap().status(), JobStatus::Running);

    // 3 records at < MAX_DELAY each, plus scheduling slack.
    wait_for(&job, JobStatus::Finished, 3 * MAX_DELAY + Duration::from_millis(500)).await;
    assert!(start.elapsed() < 3 * MAX_DELAY + Duration::from_millis(500));
    assert_eq!(job.processed(), 3);
}

#[tokio::test]
async fn concurrent_jobs_do_not_interfere() {
    let long_file = csv_file(10_000);
    let short_file = csv_file(5);
    let registry = Arc::new(JobRegistry::new());

    let long = csv_job("long", &long_file);
    let short = csv_job("short", &short_file);
    registry.insert(Arc::clone(&long)).unwrap();
    registry.insert(Arc::clone(&short)).unwrap();
    long.run();
    short.run();

    let paused = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.lookup("long").unwrap().pause().await })
    };
    assert!(paused.await.unwrap());

    wait_for(&short, JobStatus::Finished, Duration::from_secs(5)).await;
    assert_eq!(long.status(), JobStatus::Paused);

    assert!(registry.lookup("long").unwrap().terminate().await);
    assert_eq!(long.status(), JobStatus::Terminated);
    assert_eq!(short.status(), JobStatus::Finished);
    assert_eq!(short.processed(), 5);

    let statuses: Vec<_> = registry
        .snapshots()
        .into_iter()
        .map(|s| (s.id, s.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("long".to_string(), JobStatus::Terminated),
            ("short".to_string(), JobStatus::Finished),
        ]
    );
    assert!(registry.active().is_empty());
}

#[tokio::test]
async fn nonexistent_input_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let job = Job::new(
        "ghost",
        CsvFileSource::new(dir.path().join("ghost.csv")),
        Arc::new(SimulatedLatency::new(MAX_DELAY)),
    );
    job.run();

    wait_for(&job, JobStatus::GotError, Duration::from_secs(2)).await;
    assert_eq!(job.processed(), 0);
    assert!(job.last_error().is_some());

    // Terminal: later control calls change nothing.
    assert!(!job.terminate().await);
    assert_eq!(job.status(), JobStatus::GotError);
}
