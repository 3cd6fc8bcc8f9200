use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::analysis::client::AnalysisApi;
use crate::analysis::errors::TriggerError;
use crate::analysis::types::AnalysisState;
use crate::entities::AnalysisStatus;

/// Polling parameters. The defaults mirror the production dashboard: a 5 s
/// interval with a 24-attempt ceiling (120 s) and tolerance for 5 consecutive
/// failed attempts.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 24,
            max_consecutive_errors: 5,
        }
    }
}

/// Why a session gave up without a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    /// The attempt ceiling was reached while the job was still running
    /// remotely. The job may yet finish; the UI should offer a refresh.
    AttemptCeiling,
    /// Too many consecutive poll attempts failed; the job's fate could not be
    /// determined. Distinct from an engine-reported failure.
    ErrorBudget,
    /// A poll failed in a way that retrying cannot heal (listing gone,
    /// credentials rejected). The session ends on the first such error.
    NonTransientError,
}

/// The single notification a session emits when it ends on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Ready(crate::analysis::types::AnalysisReport),
    /// The store authoritatively reported analysis failure.
    Failed,
    /// Polling gave up; `last_status` is the last server-confirmed value and
    /// is never forced to `failed`.
    Undetermined {
        last_status: AnalysisStatus,
        reason: GiveUpReason,
    },
}

/// Caller's view of one polling session.
pub struct SessionHandle {
    listing_id: Uuid,
    status_rx: watch::Receiver<AnalysisStatus>,
    outcome_rx: oneshot::Receiver<SessionOutcome>,
    token: CancellationToken,
}

impl SessionHandle {
    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }

    /// Last server-confirmed status (initially `analyzing` after a successful
    /// trigger). Never optimistically mutated.
    pub fn status(&self) -> AnalysisStatus {
        *self.status_rx.borrow()
    }

    /// Live status feed for UI re-renders.
    pub fn status_updates(&self) -> watch::Receiver<AnalysisStatus> {
        self.status_rx.clone()
    }

    /// Wait for the session's single terminal notification. Returns `None`
    /// when the session was cancelled (teardown or re-trigger).
    pub async fn outcome(self) -> Option<SessionOutcome> {
        self.outcome_rx.await.ok()
    }

    /// Stop polling immediately. No further poll calls will be dispatched.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

struct SessionEntry {
    session_id: Uuid,
    token: CancellationToken,
}

/// Owns the client-observable lifecycle of per-listing analysis jobs: at most
/// one polling session per listing id, each driven by a single cancellable
/// timer.
pub struct AnalysisTracker<A: AnalysisApi> {
    api: Arc<A>,
    config: PollConfig,
    sessions: Arc<DashMap<Uuid, SessionEntry>>,
}

impl<A: AnalysisApi> AnalysisTracker<A> {
    pub fn new(api: A) -> Self {
        Self::with_config(api, PollConfig::default())
    }

    pub fn with_config(api: A, config: PollConfig) -> Self {
        Self {
            api: Arc::new(api),
            config,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Request that analysis begin and start a polling session on success.
    ///
    /// Any prior session for the same listing is cancelled first, so two
    /// timers can never write conflicting status for one listing. On failure
    /// no session starts and the error is returned for the caller to surface.
    pub async fn trigger(&self, listing_id: Uuid) -> Result<SessionHandle, TriggerError> {
        self.cancel(listing_id);

        let accepted = self.api.start_analysis(listing_id).await?;
        info!(%listing_id, status = ?accepted.status, "analysis trigger accepted");

        let token = CancellationToken::new();
        let session_id = Uuid::new_v4();
        self.sessions.insert(
            listing_id,
            SessionEntry {
                session_id,
                token: token.clone(),
            },
        );

        let (status_tx, status_rx) = watch::channel(AnalysisStatus::Analyzing);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let api = self.api.clone();
        let config = self.config.clone();
        let sessions = self.sessions.clone();
        let session_token = token.clone();
        tokio::spawn(
            async move {
                let outcome =
                    run_session(api, config, listing_id, session_token, status_tx).await;
                // Only remove our own entry; a re-trigger may have replaced it.
                sessions.remove_if(&listing_id, |_, entry| entry.session_id == session_id);
                if let Some(outcome) = outcome {
                    let _ = outcome_tx.send(outcome);
                }
            }
            .instrument(info_span!("analysis_session", listing_id = %listing_id)),
        );

        Ok(SessionHandle {
            listing_id,
            status_rx,
            outcome_rx,
            token,
        })
    }

    /// Cancel the active session for a listing, if any. Mandatory on UI
    /// teardown so no orphaned timer keeps polling into a disposed surface.
    pub fn cancel(&self, listing_id: Uuid) {
        if let Some((_, entry)) = self.sessions.remove(&listing_id) {
            entry.token.cancel();
            debug!(%listing_id, "polling session cancelled");
        }
    }

    pub fn has_active_session(&self, listing_id: Uuid) -> bool {
        self.sessions.contains_key(&listing_id)
    }
}

/// One bounded polling session. Exactly one poll is in flight at a time; the
/// cancellation token is raced against both the inter-poll sleep and the
/// in-flight request. Returns `None` when cancelled.
async fn run_session<A: AnalysisApi>(
    api: Arc<A>,
    config: PollConfig,
    listing_id: Uuid,
    token: CancellationToken,
    status_tx: watch::Sender<AnalysisStatus>,
) -> Option<SessionOutcome> {
    let mut attempts: u32 = 0;
    let mut consecutive_errors: u32 = 0;
    let mut last_status = AnalysisStatus::Analyzing;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(%listing_id, attempts, "session cancelled before next poll");
                return None;
            }
            _ = sleep(config.interval) => {}
        }

        attempts += 1;

        let polled = tokio::select! {
            _ = token.cancelled() => {
                debug!(%listing_id, attempts, "session cancelled mid-poll");
                return None;
            }
            polled = api.poll_once(listing_id) => polled,
        };

        match polled {
            Ok(state) => {
                consecutive_errors = 0;
                last_status = state.status();
                let _ = status_tx.send(last_status);
                match state {
                    AnalysisState::Ready(report) => {
                        info!(%listing_id, attempts, "analysis ready");
                        return Some(SessionOutcome::Ready(report));
                    }
                    AnalysisState::Failed => {
                        info!(%listing_id, attempts, "analysis failed (engine-reported)");
                        return Some(SessionOutcome::Failed);
                    }
                    _ => {}
                }
            }
            Err(err) => {
                consecutive_errors += 1;
                warn!(
                    %listing_id,
                    attempts,
                    consecutive_errors,
                    error = %err,
                    "poll attempt failed"
                );
                if !err.is_transient() {
                    return Some(SessionOutcome::Undetermined {
                        last_status,
                        reason: GiveUpReason::NonTransientError,
                    });
                }
                if consecutive_errors > config.max_consecutive_errors {
                    return Some(SessionOutcome::Undetermined {
                        last_status,
                        reason: GiveUpReason::ErrorBudget,
                    });
                }
            }
        }

        // The ceiling applies as soon as the final attempt resolves
        // non-terminal; no extra interval is waited out first.
        if attempts >= config.max_attempts {
            warn!(
                %listing_id,
                max_attempts = config.max_attempts,
                ?last_status,
                "poll ceiling reached; job still running remotely"
            );
            return Some(SessionOutcome::Undetermined {
                last_status,
                reason: GiveUpReason::AttemptCeiling,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::client::AnalysisApi;
    use crate::analysis::errors::ClientError;
    use crate::analysis::types::{
        AnalysisReport, AnalysisState, AnalysisStatusResponse, OnePagerResponse,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report() -> AnalysisReport {
        AnalysisReport {
            commercial_score: 7,
            executive_summary: "summary".to_string(),
            strengths: vec!["hook".to_string()],
            improvements: vec![],
            comparables: vec![],
            target_audience: None,
            budget_range: None,
        }
    }

    /// Fake store whose poll responses are scripted. Once the script is
    /// exhausted it keeps answering `analyzing`.
    #[derive(Clone)]
    struct ScriptedApi {
        polls: Arc<Mutex<VecDeque<Result<AnalysisState, ClientError>>>>,
        poll_count: Arc<AtomicUsize>,
        trigger_ok: bool,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<AnalysisState, ClientError>>) -> Self {
            Self {
                polls: Arc::new(Mutex::new(script.into_iter().collect())),
                poll_count: Arc::new(AtomicUsize::new(0)),
                trigger_ok: true,
            }
        }

        fn rejecting() -> Self {
            let mut api = Self::new(vec![]);
            api.trigger_ok = false;
            api
        }

        fn polls_issued(&self) -> usize {
            self.poll_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisApi for ScriptedApi {
        async fn start_analysis(
            &self,
            listing_id: Uuid,
        ) -> Result<AnalysisStatusResponse, ClientError> {
            if !self.trigger_ok {
                return Err(ClientError::Http {
                    status: reqwest::StatusCode::CONFLICT,
                    retriable: false,
                });
            }
            Ok(AnalysisStatusResponse {
                listing_id,
                status: AnalysisStatus::Analyzing,
                analysis: None,
                message: "started".to_string(),
            })
        }

        async fn poll_once(&self, _listing_id: Uuid) -> Result<AnalysisState, ClientError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(AnalysisState::Analyzing))
        }

        async fn request_one_pager(
            &self,
            _listing_id: Uuid,
        ) -> Result<OnePagerResponse, ClientError> {
            Err(ClientError::Unknown("not scripted".to_string()))
        }

        async fn fetch_one_pager(
            &self,
            _listing_id: Uuid,
        ) -> Result<OnePagerResponse, ClientError> {
            Err(ClientError::Unknown("not scripted".to_string()))
        }
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(5),
            max_attempts: 24,
            max_consecutive_errors: 5,
        }
    }

    fn transient() -> Result<AnalysisState, ClientError> {
        Err(ClientError::RequestTimeout)
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_notification_after_fourth_poll() {
        let api = ScriptedApi::new(vec![
            Ok(AnalysisState::Analyzing),
            Ok(AnalysisState::Analyzing),
            Ok(AnalysisState::Analyzing),
            Ok(AnalysisState::Ready(report())),
        ]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());

        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        let outcome = handle.outcome().await;

        assert_eq!(outcome, Some(SessionOutcome::Ready(report())));
        assert_eq!(api.polls_issued(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_reported_failure_is_terminal() {
        let api = ScriptedApi::new(vec![
            Ok(AnalysisState::Analyzing),
            Ok(AnalysisState::Failed),
        ]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());
        let listing_id = Uuid::new_v4();

        let handle = tracker.trigger(listing_id).await.unwrap();
        let outcome = handle.outcome().await;

        assert_eq!(outcome, Some(SessionOutcome::Failed));
        assert_eq!(api.polls_issued(), 2);
        assert!(!tracker.has_active_session(listing_id));
    }

    #[tokio::test(start_paused = true)]
    async fn six_consecutive_errors_exhaust_the_budget() {
        // One over the tolerance of five: the session must end as
        // undetermined, never as an analysis failure.
        let api = ScriptedApi::new(vec![
            transient(),
            transient(),
            transient(),
            transient(),
            transient(),
            transient(),
        ]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());

        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        let outcome = handle.outcome().await.unwrap();

        assert_eq!(
            outcome,
            SessionOutcome::Undetermined {
                last_status: AnalysisStatus::Analyzing,
                reason: GiveUpReason::ErrorBudget,
            }
        );
        assert_ne!(outcome, SessionOutcome::Failed);
        assert_eq!(api.polls_issued(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn error_streak_resets_on_successful_poll() {
        // 5 errors, a success, 5 more errors, then ready: both error runs stay
        // inside the budget because the streak resets.
        let mut script: Vec<Result<AnalysisState, ClientError>> = Vec::new();
        script.extend((0..5).map(|_| transient()));
        script.push(Ok(AnalysisState::Analyzing));
        script.extend((0..5).map(|_| transient()));
        script.push(Ok(AnalysisState::Ready(report())));

        let api = ScriptedApi::new(script);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());

        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        let outcome = handle.outcome().await;

        assert_eq!(outcome, Some(SessionOutcome::Ready(report())));
        assert_eq!(api.polls_issued(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_ceiling_preserves_last_observed_status() {
        // 24 non-terminal polls with no errors: give up without forcing
        // `failed`, right after the 24th response lands rather than one
        // interval later.
        let api = ScriptedApi::new(vec![]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());

        let started = tokio::time::Instant::now();
        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        let outcome = handle.outcome().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(24 * 5));

        match outcome {
            SessionOutcome::Undetermined {
                last_status,
                reason,
            } => {
                assert_eq!(last_status, AnalysisStatus::Analyzing);
                assert!(!last_status.is_terminal());
                assert_eq!(reason, GiveUpReason::AttemptCeiling);
            }
            other => panic!("expected undetermined outcome, got {:?}", other),
        }
        assert_eq!(api.polls_issued(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_poll_error_ends_the_session() {
        let api = ScriptedApi::new(vec![Err(ClientError::Http {
            status: reqwest::StatusCode::NOT_FOUND,
            retriable: false,
        })]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());

        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        let outcome = handle.outcome().await.unwrap();

        // One 404 is enough; the error budget never enters into it.
        assert!(matches!(
            outcome,
            SessionOutcome::Undetermined {
                reason: GiveUpReason::NonTransientError,
                ..
            }
        ));
        assert_eq!(api.polls_issued(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retrigger_cancels_prior_session() {
        let api = ScriptedApi::new(vec![]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());
        let listing_id = Uuid::new_v4();

        let first = tracker.trigger(listing_id).await.unwrap();
        let second = tracker.trigger(listing_id).await.unwrap();

        // The first session ends with no outcome; its timer is gone.
        assert_eq!(first.outcome().await, None);
        assert!(tracker.has_active_session(listing_id));

        // Stop the second session and verify no orphaned timer keeps polling.
        second.cancel();
        tokio::task::yield_now().await;
        let frozen = api.polls_issued();
        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.polls_issued(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_before_first_poll_dispatches_nothing() {
        let api = ScriptedApi::new(vec![]);
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());
        let listing_id = Uuid::new_v4();

        let handle = tracker.trigger(listing_id).await.unwrap();
        tracker.cancel(listing_id);

        assert_eq!(handle.outcome().await, None);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.polls_issued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trigger_starts_no_session() {
        let api = ScriptedApi::rejecting();
        let tracker = AnalysisTracker::with_config(api.clone(), fast_config());
        let listing_id = Uuid::new_v4();

        let result = tracker.trigger(listing_id).await;
        assert!(matches!(result, Err(TriggerError::Rejected { .. })));
        assert!(!tracker.has_active_session(listing_id));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.polls_issued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_feed_reflects_server_confirmed_values() {
        let api = ScriptedApi::new(vec![
            Ok(AnalysisState::Pending),
            Ok(AnalysisState::Analyzing),
            Ok(AnalysisState::Ready(report())),
        ]);
        let tracker = AnalysisTracker::with_config(api, fast_config());

        let handle = tracker.trigger(Uuid::new_v4()).await.unwrap();
        assert_eq!(handle.status(), AnalysisStatus::Analyzing);

        let mut updates = handle.status_updates();
        let outcome = handle.outcome().await;
        assert_eq!(outcome, Some(SessionOutcome::Ready(report())));
        assert_eq!(*updates.borrow_and_update(), AnalysisStatus::Ready);
    }
}
