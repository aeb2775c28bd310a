use std::sync::Arc;
use std::time::Duration;

use quiz_core::session::QuizSession;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::attempt_service::{AttemptService, SubmittedAttempt};
use crate::error::AttemptError;

/// Drives a timed session's countdown from a background task.
///
/// The session engine never sleeps or spawns; this ticker owns the
/// once-per-second cadence and forwards each beat through
/// `AttemptService::tick`, which persists the result when the timer
/// expires. The task ends on expiry, on manual submission by another
/// holder of the session, or when the returned handle is aborted.
pub struct AttemptTicker {
    service: AttemptService,
    period: Duration,
}

impl AttemptTicker {
    #[must_use]
    pub fn new(service: AttemptService) -> Self {
        Self {
            service,
            period: Duration::from_secs(1),
        }
    }

    /// Override the beat period. Tests shrink it so expiry arrives quickly;
    /// each beat still counts down one full second of quiz time.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Spawn the countdown task for `session`.
    ///
    /// Untimed sessions get no task at all: the first tick would be a no-op
    /// and so would every one after it, so the loop exits immediately.
    ///
    /// The task resolves with `Ok(Some(_))` when the timer expired and the
    /// attempt was persisted, `Ok(None)` when the session was finished some
    /// other way, and `Err` if persisting an expired attempt failed.
    pub fn spawn(
        &self,
        session: Arc<Mutex<QuizSession>>,
    ) -> JoinHandle<Result<Option<SubmittedAttempt>, AttemptError>> {
        let service = self.service.clone();
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; skip it
            // so the session keeps its full first second.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut guard = session.lock().await;
                if guard.is_submitted() {
                    return Ok(None);
                }
                if !guard.is_timed() {
                    return Ok(None);
                }
                if let Some(submitted) = service.tick(&mut guard).await? {
                    return Ok(Some(submitted));
                }
            }
        })
    }
}
