// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the job tracker.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rp_core::{ExtractedData, JobStatus};
use tokio::time::Instant;

use super::test_helpers::{snapshot, transport_error, MockRemote};
use super::tracker::*;

fn fast_config(max_attempts: u32) -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_secs(1),
        interval: Duration::from_secs(2),
        max_attempts,
    }
}

fn tracker_with(remote: &Arc<MockRemote>, max_attempts: u32) -> JobTracker {
    JobTracker::new(remote.clone(), fast_config(max_attempts))
}

// PollMachine

#[test]
fn test_machine_start_enters_polling_with_initial_delay() {
    let mut machine = PollMachine::new("job-1", fast_config(3));
    assert_eq!(machine.phase(), PollPhase::Initiated);
    assert_eq!(machine.start(), Duration::from_secs(1));
    assert_eq!(machine.phase(), PollPhase::Polling);
}

#[test]
fn test_machine_ignores_observation_before_start() {
    let mut machine = PollMachine::new("job-1", fast_config(3));
    assert_eq!(machine.observe(Ok(snapshot("job-1", "COMPLETED"))), PollStep::Ignored);
    assert_eq!(machine.attempts(), 0);
}

#[test]
fn test_machine_continue_then_complete() {
    let mut machine = PollMachine::new("job-1", fast_config(10));
    machine.start();

    match machine.observe(Ok(snapshot("job-1", "PROCESSING"))) {
        PollStep::Continue {
            update,
            next_check_in,
        } => {
            assert_eq!(update.attempt, 1);
            assert_eq!(update.status, JobStatus::Processing);
            assert!(update.progress < 100);
            assert_eq!(next_check_in, Duration::from_secs(2));
        }
        other => panic!("expected Continue, got {other:?}"),
    }

    match machine.observe(Ok(snapshot("job-1", "PROCESSED").with_storage_path("receipts/a.png"))) {
        PollStep::Finished {
            result,
            final_update,
        } => {
            let job = result.unwrap();
            assert_eq!(job.storage_path.as_deref(), Some("receipts/a.png"));
            assert_eq!(final_update.unwrap().progress, 100);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(machine.phase(), PollPhase::Completed);
    assert_eq!(machine.observe(Ok(snapshot("job-1", "PENDING"))), PollStep::Ignored);
}

#[test]
fn test_machine_failed_status() {
    let mut machine = PollMachine::new("job-1", fast_config(10));
    machine.start();
    match machine.observe(Ok(snapshot("job-1", "FAILED"))) {
        PollStep::Finished {
            result,
            final_update,
        } => {
            assert_eq!(
                result,
                Err(TrackError::RemoteProcessingFailed {
                    job_id: "job-1".into()
                })
            );
            let update = final_update.unwrap();
            assert_eq!(update.status, JobStatus::Failed);
            assert_eq!(update.attempt, 1);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(machine.phase(), PollPhase::Failed);
}

#[test]
fn test_machine_transport_error_is_terminal() {
    let mut machine = PollMachine::new("job-1", fast_config(10));
    machine.start();
    match machine.observe(Err(transport_error())) {
        PollStep::Finished {
            result: Err(TrackError::PollingTransport { job_id, .. }),
            ..
        } => assert_eq!(job_id, "job-1"),
        other => panic!("expected PollingTransport, got {other:?}"),
    }
}

#[test]
fn test_machine_unknown_status_keeps_polling() {
    let mut machine = PollMachine::new("job-1", fast_config(10));
    machine.start();
    assert!(matches!(
        machine.observe(Ok(snapshot("job-1", "QUEUED_FOR_OCR"))),
        PollStep::Continue { .. }
    ));
}

#[test]
fn test_machine_times_out_after_max_attempts() {
    let mut machine = PollMachine::new("job-1", fast_config(3));
    machine.start();
    for _ in 0..2 {
        assert!(matches!(
            machine.observe(Ok(snapshot("job-1", "PENDING"))),
            PollStep::Continue { .. }
        ));
    }
    match machine.observe(Ok(snapshot("job-1", "PENDING"))) {
        PollStep::Finished {
            result,
            final_update,
        } => {
            assert_eq!(
                result,
                Err(TrackError::ProcessingTimeout {
                    job_id: "job-1".into(),
                    attempts: 3
                })
            );
            let update = final_update.unwrap();
            assert_eq!(update.attempt, 3);
            assert!(update.progress <= MAX_IN_PROGRESS);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(machine.phase(), PollPhase::TimedOut);
}

#[test]
fn test_machine_progress_is_monotonic_and_capped() {
    let mut machine = PollMachine::new("job-1", fast_config(5));
    machine.start();
    let mut last = 0;
    for _ in 0..4 {
        if let PollStep::Continue { update, .. } = machine.observe(Ok(snapshot("job-1", "PROCESSING"))) {
            assert!(update.progress >= last);
            assert!(update.progress <= MAX_IN_PROGRESS);
            last = update.progress;
        } else {
            panic!("expected Continue");
        }
    }
    assert!(last > 0);
}

#[test]
fn test_machine_cancel_ignores_later_results() {
    let mut machine = PollMachine::new("job-1", fast_config(5));
    machine.start();
    machine.cancel();
    assert_eq!(machine.phase(), PollPhase::Cancelled);
    assert_eq!(machine.observe(Ok(snapshot("job-1", "COMPLETED"))), PollStep::Ignored);
}

#[test]
fn test_config_ceiling() {
    let config = PollConfig::default();
    assert_eq!(config.ceiling(), Duration::from_secs(1 + 59 * 2));
}

// JobTracker

#[tokio::test(start_paused = true)]
async fn test_track_completes_after_processing() {
    let remote = Arc::new(MockRemote::new());
    remote.push_status(Ok(snapshot("job-1", "PENDING")));
    remote.push_status(Ok(snapshot("job-1", "PROCESSING")));
    let data = ExtractedData {
        vendor: Some("Mercado Central".into()),
        amount: Some(42.5),
        category: Some("Verduras".into()),
        ..Default::default()
    };
    remote.push_status(Ok(snapshot("job-1", "COMPLETED")
        .with_storage_path("receipts/job-1.jpg")
        .with_extracted_data(data.clone())));

    let tracker = tracker_with(&remote, 10);
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let started = Instant::now();

    let result = tracker
        .track("job-1", move |u| sink.lock().unwrap().push(u.clone()))
        .await
        .unwrap();

    assert_eq!(result.job_id, "job-1");
    assert_eq!(result.extracted_data, Some(data));
    assert_eq!(result.storage_path.as_deref(), Some("receipts/job-1.jpg"));
    assert_eq!(remote.status_calls(), 3);
    // 1s initial delay, then two 2s intervals.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_secs(6));

    let updates = updates.lock().unwrap();
    let progress: Vec<u8> = updates.iter().map(|u| u.progress).collect();
    assert_eq!(progress.len(), 3);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));
    assert!(!tracker.is_tracking("job-1"));
}

#[tokio::test(start_paused = true)]
async fn test_track_times_out() {
    let remote = Arc::new(MockRemote::new());
    remote.set_fallback_status(Ok(snapshot("job-1", "PENDING")));
    let tracker = tracker_with(&remote, 4);
    let started = Instant::now();

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    let err = tracker
        .track("job-1", move |u| sink.lock().unwrap().push(u.attempt))
        .await
        .unwrap_err();

    assert_eq!(*updates.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(
        err,
        TrackError::ProcessingTimeout {
            job_id: "job-1".into(),
            attempts: 4
        }
    );
    assert_eq!(remote.status_calls(), 4);
    let elapsed = started.elapsed();
    assert!(elapsed >= tracker.config().ceiling());
    assert!(elapsed < tracker.config().ceiling() + Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_track_remote_failure() {
    let remote = Arc::new(MockRemote::new());
    remote.push_status(Ok(snapshot("job-1", "PROCESSING")));
    remote.push_status(Ok(snapshot("job-1", "failed")));
    let tracker = tracker_with(&remote, 10);

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    let err = tracker
        .track("job-1", move |u| sink.lock().unwrap().push(u.status.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackError::RemoteProcessingFailed { .. }));
    assert_eq!(remote.status_calls(), 2);
    assert_eq!(
        *updates.lock().unwrap(),
        vec![JobStatus::Processing, JobStatus::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_track_transport_error_does_not_retry() {
    let remote = Arc::new(MockRemote::new());
    remote.push_status(Err(transport_error()));
    remote.set_fallback_status(Ok(snapshot("job-1", "COMPLETED")));
    let tracker = tracker_with(&remote, 10);

    let err = tracker.track("job-1", |_| {}).await.unwrap_err();
    assert!(matches!(err, TrackError::PollingTransport { .. }));
    assert_eq!(remote.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_track_rejects_duplicate_job() {
    let remote = Arc::new(MockRemote::new());
    remote.set_fallback_status(Ok(snapshot("job-1", "PENDING")));
    let tracker = tracker_with(&remote, 10);

    let handle = tracker
        .start_tracking("job-1", |_| {}, |_| {})
        .unwrap();
    assert!(tracker.is_tracking("job-1"));

    let err = tracker.track("job-1", |_| {}).await.unwrap_err();
    assert_eq!(err, TrackError::AlreadyTracking("job-1".into()));

    assert!(tracker.cancel("job-1"));
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_start_tracking_calls_terminal_once() {
    let remote = Arc::new(MockRemote::new());
    remote.push_status(Ok(snapshot("job-1", "PROCESSING")));
    remote.push_status(Ok(snapshot("job-1", "COMPLETED")));
    let tracker = tracker_with(&remote, 10);

    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    let handle = tracker
        .start_tracking("job-1", |_| {}, move |r| sink.lock().unwrap().push(r))
        .unwrap();
    handle.await.unwrap();

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert!(tracker.active_jobs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_suppresses_terminal_callback() {
    let remote = Arc::new(MockRemote::new());
    remote.set_fallback_status(Ok(snapshot("job-1", "PROCESSING")));
    let tracker = tracker_with(&remote, 10);

    let terminal_calls = Arc::new(Mutex::new(0));
    let sink = terminal_calls.clone();
    let handle = tracker
        .start_tracking("job-1", |_| {}, move |_| *sink.lock().unwrap() += 1)
        .unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let checks_before_cancel = remote.status_calls();
    assert_eq!(checks_before_cancel, 2);

    assert!(tracker.cancel("job-1"));
    handle.await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(*terminal_calls.lock().unwrap(), 0);
    assert_eq!(remote.status_calls(), checks_before_cancel);
    assert!(!tracker.is_tracking("job-1"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_unknown_job() {
    let remote = Arc::new(MockRemote::new());
    let tracker = tracker_with(&remote, 10);
    assert!(!tracker.cancel("nope"));
}

#[tokio::test(start_paused = true)]
async fn test_job_can_be_tracked_again_after_finishing() {
    let remote = Arc::new(MockRemote::new());
    remote.push_status(Ok(snapshot("job-1", "COMPLETED")));
    remote.push_status(Ok(snapshot("job-1", "COMPLETED")));
    let tracker = tracker_with(&remote, 10);

    tracker.track("job-1", |_| {}).await.unwrap();
    tracker.track("job-1", |_| {}).await.unwrap();
    assert_eq!(remote.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_active_jobs_sorted() {
    let remote = Arc::new(MockRemote::new());
    remote.set_fallback_status(Ok(snapshot("x", "PENDING")));
    let tracker = tracker_with(&remote, 10);

    let b = tracker.start_tracking("job-b", |_| {}, |_| {}).unwrap();
    let a = tracker.start_tracking("job-a", |_| {}, |_| {}).unwrap();
    assert_eq!(tracker.active_jobs(), vec!["job-a".to_string(), "job-b".to_string()]);

    tracker.cancel("job-a");
    tracker.cancel("job-b");
    a.await.unwrap();
    b.await.unwrap();
    assert!(tracker.active_jobs().is_empty());
}
