//! Tests for `wait_until`: notices, ceilings and fetch failures.
//!
//! Run on tokio's paused clock, so multi-day polls finish instantly.

#![allow(clippy::expect_used)]

use std::cell::Cell;
use std::time::Duration;

use linode_prep::application::services::poll::{
    DEFAULT_POLL_INTERVAL, PollError, PollPolicy, wait_until,
};
use linode_prep::domain::{DiskStatus, NodeStatus};
use tokio::time::Instant;

use crate::mocks::RecordingReporter;

/// Yields `pending` statuses first, then `last` forever.
fn script<S: Clone>(pending: Vec<S>, last: S) -> impl FnMut() -> S {
    let mut queue = pending.into_iter();
    move || queue.next().unwrap_or_else(|| last.clone())
}

#[tokio::test(start_paused = true)]
async fn returns_immediately_when_already_stable() {
    let reporter = RecordingReporter::default();
    let calls = Cell::new(0);
    let status = wait_until(
        "linode",
        &NodeStatus::STABLE,
        &PollPolicy::default(),
        &reporter,
        || {
            calls.set(calls.get() + 1);
            async { Ok::<_, anyhow::Error>(NodeStatus::Offline) }
        },
    )
    .await
    .expect("stable");
    assert_eq!(status, NodeStatus::Offline);
    assert_eq!(calls.get(), 1);
    assert!(reporter.waits.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reports_once_per_pending_status() {
    let reporter = RecordingReporter::default();
    let mut next = script(
        vec![NodeStatus::Provisioning, NodeStatus::Provisioning, NodeStatus::Booting],
        NodeStatus::Running,
    );
    let started = Instant::now();
    let status = wait_until(
        "linode",
        &NodeStatus::STABLE,
        &PollPolicy::default(),
        &reporter,
        || {
            let s = next();
            async move { Ok::<_, anyhow::Error>(s) }
        },
    )
    .await
    .expect("stable");
    assert_eq!(status, NodeStatus::Running);
    assert_eq!(
        *reporter.waits.borrow(),
        vec![
            "waiting on linode status... (provisioning)",
            "waiting on linode status... (provisioning)",
            "waiting on linode status... (booting)",
        ]
    );
    assert_eq!(started.elapsed(), DEFAULT_POLL_INTERVAL * 3);
}

#[tokio::test(start_paused = true)]
async fn propagates_fetch_error_without_retry() {
    let reporter = RecordingReporter::default();
    let calls = Cell::new(0);
    let err = wait_until(
        "disk 'Boot'",
        &[DiskStatus::Ready],
        &PollPolicy::default(),
        &reporter,
        || {
            calls.set(calls.get() + 1);
            async { Err::<DiskStatus, _>(anyhow::anyhow!("connection reset")) }
        },
    )
    .await
    .expect_err("fetch failure");
    assert_eq!(calls.get(), 1);
    assert!(matches!(err, PollError::Fetch { .. }));
    let chain = format!("{:#}", anyhow::Error::from(err));
    assert!(chain.contains("connection reset"), "got: {chain}");
    assert!(reporter.waits.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn has_no_hidden_timeout() {
    let reporter = RecordingReporter::default();
    let calls = Cell::new(0u32);
    let accepted = NodeStatus::STABLE;
    let policy = PollPolicy::default();
    let poll = wait_until("linode", &accepted, &policy, &reporter, || {
        calls.set(calls.get() + 1);
        async { Ok::<_, anyhow::Error>(NodeStatus::Provisioning) }
    });
    // A full day of virtual time, far beyond any plausible built-in limit.
    let outcome = tokio::time::timeout(Duration::from_secs(86_400), poll).await;
    assert!(outcome.is_err(), "poll returned early");
    assert!(calls.get() >= 17_000, "only {} checks", calls.get());
    assert_eq!(reporter.waits.borrow().len(), calls.get() as usize);
}

#[tokio::test(start_paused = true)]
async fn max_attempts_times_out_with_last_status() {
    let reporter = RecordingReporter::default();
    let policy = PollPolicy::default().with_max_attempts(Some(3));
    let err = wait_until("disk 'Swap'", &[DiskStatus::Ready], &policy, &reporter, || async {
        Ok::<_, anyhow::Error>(DiskStatus::NotReady)
    })
    .await
    .expect_err("ceiling");
    match err {
        PollError::TimedOut {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_status, "not ready");
        }
        PollError::Fetch { .. } => panic!("expected TimedOut"),
    }
    assert_eq!(reporter.waits.borrow().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn max_wait_times_out() {
    let reporter = RecordingReporter::default();
    let policy = PollPolicy::default().with_max_wait(Some(Duration::from_secs(12)));
    let err = wait_until("linode", &NodeStatus::STABLE, &policy, &reporter, || async {
        Ok::<_, anyhow::Error>(NodeStatus::Booting)
    })
    .await
    .expect_err("ceiling");
    let msg = err.to_string();
    assert!(msg.contains("still 'booting'"), "got: {msg}");
    // Checks at 0s, 5s, 10s, 15s: the fourth is past the 12s ceiling.
    assert!(msg.contains("after 4 checks"), "got: {msg}");
}
