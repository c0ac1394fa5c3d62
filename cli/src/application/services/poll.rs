//! Poll-until-ready: synchronise with provider-side state transitions.
//!
//! The provider has no callback channel, so the only way to learn that a
//! Linode or disk has settled is to re-read it. A poll is a small state
//! machine, `Pending → Stable | Failed`, driven by [`wait_until`].
//!
//! Imports only from `crate::application::ports`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::Instant;

use crate::application::ports::ProgressReporter;

/// Interval between status checks of a Linode or a disk.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often to poll and when to give up.
///
/// Both ceilings default to `None`: a poll waits for as long as the
/// provider takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Maximum number of status checks, including the first.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first check.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    /// Poll every `interval`, without limit.
    #[must_use]
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            max_wait: None,
        }
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.max_wait.is_none()
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::every(DEFAULT_POLL_INTERVAL)
    }
}

/// Why a poll stopped without reaching an accepted status.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to read {subject} status")]
    Fetch {
        subject: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{subject} still '{last_status}' after {attempts} checks ({}s)", elapsed.as_secs())]
    TimedOut {
        subject: String,
        attempts: u32,
        elapsed: Duration,
        last_status: String,
    },
}

/// Outcome of one observation.
#[derive(Debug)]
pub enum PollState<S> {
    /// Not there yet; holds the status just observed.
    Pending(S),
    /// Reached an accepted status.
    Stable(S),
    /// Fetch failed or a ceiling was hit.
    Failed(PollError),
}

/// Transition function for a single poll.
pub struct Poller<'a> {
    subject: &'a str,
    policy: &'a PollPolicy,
    attempts: u32,
}

impl<'a> Poller<'a> {
    #[must_use]
    pub fn new(subject: &'a str, policy: &'a PollPolicy) -> Self {
        Self {
            subject,
            policy,
            attempts: 0,
        }
    }

    /// Number of status checks observed so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Feed one fetch result into the machine.
    ///
    /// Ceilings are checked only after a non-accepted status, so an
    /// accepted status on the last allowed check still succeeds.
    pub fn observe<S>(
        &mut self,
        fetched: Result<S>,
        accepted: &[S],
        elapsed: Duration,
    ) -> PollState<S>
    where
        S: PartialEq + fmt::Display,
    {
        self.attempts += 1;
        let status = match fetched {
            Ok(status) => status,
            Err(source) => {
                return PollState::Failed(PollError::Fetch {
                    subject: self.subject.to_string(),
                    source,
                });
            }
        };
        if accepted.contains(&status) {
            return PollState::Stable(status);
        }
        let out_of_attempts = self.policy.max_attempts.is_some_and(|max| self.attempts >= max);
        let out_of_time = self.policy.max_wait.is_some_and(|max| elapsed >= max);
        if out_of_attempts || out_of_time {
            return PollState::Failed(PollError::TimedOut {
                subject: self.subject.to_string(),
                attempts: self.attempts,
                elapsed,
                last_status: status.to_string(),
            });
        }
        PollState::Pending(status)
    }
}

/// Re-run `fetch` until it yields a status in `accepted`.
///
/// Each non-accepted status produces exactly one `wait` notice naming the
/// observed status, then the poll sleeps `policy.interval`. A failing
/// `fetch` ends the poll at once; nothing is retried.
///
/// # Errors
///
/// Returns `PollError::Fetch` if `fetch` fails, or `PollError::TimedOut`
/// if the policy has a ceiling and it is reached.
pub async fn wait_until<S, F, Fut>(
    subject: &str,
    accepted: &[S],
    policy: &PollPolicy,
    reporter: &impl ProgressReporter,
    mut fetch: F,
) -> Result<S, PollError>
where
    S: PartialEq + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S>>,
{
    let started = Instant::now();
    let mut poller = Poller::new(subject, policy);
    loop {
        let fetched = fetch().await;
        match poller.observe(fetched, accepted, started.elapsed()) {
            PollState::Stable(status) => {
                tracing::debug!(subject, %status, attempts = poller.attempts(), "poll settled");
                return Ok(status);
            }
            PollState::Failed(err) => return Err(err),
            PollState::Pending(status) => {
                tracing::debug!(subject, %status, attempts = poller.attempts(), "poll pending");
                reporter.wait(&format!("waiting on {subject} status... ({status})"));
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
