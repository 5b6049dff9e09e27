//! Polling controller for the watched station.
//!
//! Owns the refresh lifecycle of one station board: the initial fetch when
//! a station is selected, manual refreshes, and a fixed-interval background
//! refresh. Consumers only ever see immutable snapshots; every completed
//! cycle replaces the snapshot wholesale.
//!
//! Cycles are sequence-numbered at the moment they start. A completed
//! cycle may only apply its result while its sequence number is at or
//! above the controller's floor, and applying raises the floor, so a slow
//! fetch that is overtaken by a newer one is discarded instead of rolling
//! the board back. Selecting a new station raises the floor immediately,
//! which orphans every cycle still in flight for the old one.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{BoardError, StationCode, StationInfo};
use crate::feed::StatusFetcher;

/// Default interval between background refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Polling configuration.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Time between background refreshes of the watched station.
    pub interval: Duration,
}

impl PollConfig {
    /// Create a configuration with the given refresh interval.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Anything that can answer "what is happening at this station".
///
/// [`StatusFetcher`] is the production implementation; tests substitute
/// providers with scripted completion order.
pub trait StationProvider: Send + Sync + 'static {
    /// Fetch the current snapshot for a station.
    fn platform_status(
        &self,
        code: &StationCode,
    ) -> impl Future<Output = Result<StationInfo, BoardError>> + Send;
}

impl StationProvider for StatusFetcher {
    fn platform_status(
        &self,
        code: &StationCode,
    ) -> impl Future<Output = Result<StationInfo, BoardError>> + Send {
        self.fetch(code)
    }
}

/// Lifecycle phase of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardPhase {
    /// No station has been selected yet.
    Idle,
    /// A fetch cycle is in flight.
    Loading,
    /// Showing a current snapshot.
    Ready,
    /// The last cycle failed. Any earlier snapshot is retained.
    Error,
}

/// Observable state of the controller.
///
/// `snapshot` survives both `Loading` and `Error`, so a consumer that has
/// shown a board once never regresses to an empty one.
#[derive(Debug, Clone)]
pub struct BoardState {
    pub phase: BoardPhase,
    pub station: Option<StationCode>,
    pub snapshot: Option<Arc<StationInfo>>,
    pub error: Option<String>,
    /// Sequence number of the last cycle that applied.
    pub applied_seq: u64,
}

struct Core {
    phase: BoardPhase,
    station: Option<StationCode>,
    snapshot: Option<Arc<StationInfo>>,
    error: Option<String>,
    /// Next cycle takes this plus one.
    next_seq: u64,
    /// Smallest sequence number still allowed to apply.
    floor_seq: u64,
    applied_seq: u64,
    closed: bool,
}

fn state_of(core: &Core) -> BoardState {
    BoardState {
        phase: core.phase,
        station: core.station.clone(),
        snapshot: core.snapshot.clone(),
        error: core.error.clone(),
        applied_seq: core.applied_seq,
    }
}

struct Shared<P> {
    provider: P,
    core: Mutex<Core>,
}

impl<P: StationProvider> Shared<P> {
    /// Lock the core. Held sections are brief and never panic, so a
    /// poisoned lock cannot occur in practice.
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap()
    }

    /// Run one fetch cycle: fetch, then apply under the sequence guard.
    async fn run_cycle(&self, code: StationCode, seq: u64) {
        let result = self.provider.platform_status(&code).await;
        self.apply(seq, &code, result);
    }

    /// Apply a completed cycle's result unless it has been superseded.
    fn apply(&self, seq: u64, code: &StationCode, result: Result<StationInfo, BoardError>) {
        let mut core = self.lock();

        if core.closed || seq < core.floor_seq {
            debug!(
                station = %code,
                seq,
                floor = core.floor_seq,
                closed = core.closed,
                "discarding superseded cycle"
            );
            return;
        }

        core.floor_seq = seq;
        core.applied_seq = seq;
        match result {
            Ok(snapshot) => {
                info!(station = %code, seq, trains = snapshot.trains.len(), "applied snapshot");
                core.phase = BoardPhase::Ready;
                core.snapshot = Some(Arc::new(snapshot));
                core.error = None;
            }
            Err(e) => {
                warn!(station = %code, seq, error = %e, "refresh cycle failed");
                core.phase = BoardPhase::Error;
                core.error = Some(e.to_string());
                // The last good snapshot stays in place
            }
        }
    }

    /// Refresh the currently selected station, if there is one.
    async fn refresh_cycle(&self) {
        let work = {
            let mut core = self.lock();
            match (core.station.clone(), core.closed) {
                (Some(code), false) => {
                    core.next_seq += 1;
                    core.phase = BoardPhase::Loading;
                    Some((code, core.next_seq))
                }
                _ => None,
            }
        };

        if let Some((code, seq)) = work {
            self.run_cycle(code, seq).await;
        }
    }
}

/// Controller for the watched station board.
///
/// Construction starts a background task that refreshes the selection on
/// a fixed interval; the first tick fires immediately and is skipped, so
/// the first background refresh lands one full interval after startup.
/// [`BoardController::close`] stops the task and freezes the state. A
/// controller dropped without closing aborts the task instead.
pub struct BoardController<P: StationProvider> {
    shared: Arc<Shared<P>>,
    shutdown: watch::Sender<bool>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: StationProvider> BoardController<P> {
    /// Create a controller and start its background poll task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(provider: P, config: PollConfig) -> Self {
        let shared = Arc::new(Shared {
            provider,
            core: Mutex::new(Core {
                phase: BoardPhase::Idle,
                station: None,
                snapshot: None,
                error: None,
                next_seq: 0,
                floor_seq: 0,
                applied_seq: 0,
                closed: false,
            }),
        });

        let (shutdown, shutdown_recv) = watch::channel(false);
        let poll_task = spawn_poll_task(Arc::clone(&shared), config.interval, shutdown_recv);

        Self {
            shared,
            shutdown,
            poll_task: Mutex::new(Some(poll_task)),
        }
    }

    /// Select a station and fetch its board.
    ///
    /// The floor is raised before the fetch starts, so cycles still in
    /// flight for a previously selected station can no longer apply, even
    /// if they complete before this one.
    pub async fn search(&self, code: StationCode) -> BoardState {
        let seq = {
            let mut core = self.shared.lock();
            if core.closed {
                return state_of(&core);
            }
            core.next_seq += 1;
            core.floor_seq = core.next_seq;
            core.station = Some(code.clone());
            core.phase = BoardPhase::Loading;
            core.next_seq
        };

        self.shared.run_cycle(code, seq).await;
        self.state()
    }

    /// Refresh the currently selected station.
    ///
    /// With no station selected this does nothing.
    pub async fn refresh(&self) -> BoardState {
        self.shared.refresh_cycle().await;
        self.state()
    }

    /// Current observable state.
    pub fn state(&self) -> BoardState {
        state_of(&self.shared.lock())
    }

    /// Current snapshot, if any cycle has ever succeeded.
    pub fn snapshot(&self) -> Option<Arc<StationInfo>> {
        self.shared.lock().snapshot.clone()
    }

    /// Sequence number of the last cycle that applied.
    pub fn applied_seq(&self) -> u64 {
        self.shared.lock().applied_seq
    }

    /// Whether [`BoardController::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Tear the controller down.
    ///
    /// Stops the background task and closes the state: cycles still in
    /// flight are discarded when they complete, and later calls to
    /// [`BoardController::search`] or [`BoardController::refresh`] do
    /// nothing. Idempotent.
    pub async fn close(&self) {
        self.shared.lock().closed = true;

        // Err here means the task is already gone
        let _ = self.shutdown.send(true);

        let task = self.poll_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl<P: StationProvider> Drop for BoardController<P> {
    fn drop(&mut self) {
        // A controller dropped without close() must not leak its task
        if let Some(task) = self.poll_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

fn spawn_poll_task<P: StationProvider>(
    shared: Arc<Shared<P>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // First tick is immediate, skip it

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    shared.refresh_cycle().await;
                }
                changed = shutdown.changed() => {
                    // Err means the controller is gone; stop either way
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("poll task stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::{mpsc, oneshot};

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn board(station: &str, name: &str) -> StationInfo {
        StationInfo {
            code: code(station),
            name: name.to_string(),
            city: "Testville".to_string(),
            trains: vec![],
            last_updated: Utc::now(),
        }
    }

    fn board_name(state: &BoardState) -> String {
        state.snapshot.as_ref().expect("no snapshot").name.clone()
    }

    /// Long enough that the background task never interferes.
    fn manual_only() -> PollConfig {
        PollConfig::new(Duration::from_secs(3600))
    }

    /// Provider whose responses the test feeds in by hand, which makes
    /// completion order fully scriptable.
    struct ScriptedProvider {
        requests: mpsc::UnboundedSender<PendingFetch>,
    }

    struct PendingFetch {
        code: StationCode,
        respond: oneshot::Sender<Result<StationInfo, BoardError>>,
    }

    impl StationProvider for ScriptedProvider {
        fn platform_status(
            &self,
            code: &StationCode,
        ) -> impl Future<Output = Result<StationInfo, BoardError>> + Send {
            let (respond, response) = oneshot::channel();
            let request = PendingFetch {
                code: code.clone(),
                respond,
            };
            let requests = self.requests.clone();
            async move {
                requests.send(request).expect("request receiver dropped");
                response.await.expect("responder dropped")
            }
        }
    }

    fn scripted() -> (ScriptedProvider, mpsc::UnboundedReceiver<PendingFetch>) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (ScriptedProvider { requests }, receiver)
    }

    /// Provider that answers immediately and counts calls.
    struct CountingProvider {
        calls: Arc<AtomicU64>,
    }

    impl StationProvider for CountingProvider {
        fn platform_status(
            &self,
            code: &StationCode,
        ) -> impl Future<Output = Result<StationInfo, BoardError>> + Send {
            let calls = Arc::clone(&self.calls);
            let station = code.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(board(station.as_str(), &format!("fetch-{n}")))
            }
        }
    }

    fn counting() -> (CountingProvider, Arc<AtomicU64>) {
        let calls = Arc::new(AtomicU64::new(0));
        (
            CountingProvider {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    async fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !done() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {what}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, manual_only());

        let state = controller.state();
        assert_eq!(state.phase, BoardPhase::Idle);
        assert!(state.station.is_none());
        assert!(state.snapshot.is_none());
        assert_eq!(state.applied_seq, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_applies_a_snapshot() {
        let (provider, _) = counting();
        let controller = BoardController::new(provider, manual_only());

        let state = controller.search(code("NDLS")).await;
        assert_eq!(state.phase, BoardPhase::Ready);
        assert_eq!(state.station, Some(code("NDLS")));
        assert_eq!(board_name(&state), "fetch-1");
        assert_eq!(state.applied_seq, 1);
    }

    #[tokio::test]
    async fn refresh_without_station_does_nothing() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, manual_only());

        let state = controller.refresh().await;
        assert_eq!(state.phase, BoardPhase::Idle);
        assert_eq!(state.applied_seq, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, manual_only());

        controller.search(code("NDLS")).await;
        let state = controller.refresh().await;

        assert_eq!(state.phase, BoardPhase::Ready);
        assert_eq!(board_name(&state), "fetch-2");
        assert_eq!(state.applied_seq, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn loading_keeps_the_previous_snapshot() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let searching = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        let pending = requests.recv().await.unwrap();
        pending.respond.send(Ok(board("NDLS", "first"))).unwrap();
        searching.await.unwrap();

        let refreshing = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let pending = requests.recv().await.unwrap();

        let state = controller.state();
        assert_eq!(state.phase, BoardPhase::Loading);
        assert_eq!(board_name(&state), "first");

        pending.respond.send(Ok(board("NDLS", "second"))).unwrap();
        let state = refreshing.await.unwrap();
        assert_eq!(state.phase, BoardPhase::Ready);
        assert_eq!(board_name(&state), "second");
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let searching = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        requests
            .recv()
            .await
            .unwrap()
            .respond
            .send(Ok(board("NDLS", "initial")))
            .unwrap();
        searching.await.unwrap();

        // Two refreshes in flight at once
        let slow = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let slow_pending = requests.recv().await.unwrap();

        let fast = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let fast_pending = requests.recv().await.unwrap();

        // The later cycle completes first and applies
        fast_pending
            .respond
            .send(Ok(board("NDLS", "newer")))
            .unwrap();
        fast.await.unwrap();
        assert_eq!(controller.applied_seq(), 3);

        // The earlier cycle straggles in and must not roll the board back
        slow_pending
            .respond
            .send(Ok(board("NDLS", "older")))
            .unwrap();
        let state = slow.await.unwrap();

        assert_eq!(board_name(&state), "newer");
        assert_eq!(state.applied_seq, 3);
        assert_eq!(state.phase, BoardPhase::Ready);
    }

    #[tokio::test]
    async fn in_order_completions_both_apply() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let searching = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        requests
            .recv()
            .await
            .unwrap()
            .respond
            .send(Ok(board("NDLS", "initial")))
            .unwrap();
        searching.await.unwrap();

        let earlier = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let earlier_pending = requests.recv().await.unwrap();

        let later = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let later_pending = requests.recv().await.unwrap();

        earlier_pending
            .respond
            .send(Ok(board("NDLS", "older")))
            .unwrap();
        earlier.await.unwrap();
        assert_eq!(controller.applied_seq(), 2);

        later_pending
            .respond
            .send(Ok(board("NDLS", "newer")))
            .unwrap();
        let state = later.await.unwrap();
        assert_eq!(board_name(&state), "newer");
        assert_eq!(state.applied_seq, 3);
    }

    #[tokio::test]
    async fn selecting_a_new_station_discards_the_old_inflight_fetch() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let old_search = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        let old_pending = requests.recv().await.unwrap();
        assert_eq!(old_pending.code, code("NDLS"));

        let new_search = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("BCT")).await })
        };
        let new_pending = requests.recv().await.unwrap();
        assert_eq!(new_pending.code, code("BCT"));

        // The superseded station answers first; it must not apply
        old_pending
            .respond
            .send(Ok(board("NDLS", "stale-ndls")))
            .unwrap();
        let state = old_search.await.unwrap();
        assert_eq!(state.station, Some(code("BCT")));
        assert_eq!(state.phase, BoardPhase::Loading);
        assert!(state.snapshot.is_none());

        new_pending
            .respond
            .send(Ok(board("BCT", "fresh-bct")))
            .unwrap();
        let state = new_search.await.unwrap();
        assert_eq!(state.station, Some(code("BCT")));
        assert_eq!(board_name(&state), "fresh-bct");
        assert_eq!(state.phase, BoardPhase::Ready);
    }

    #[tokio::test]
    async fn error_keeps_the_last_good_snapshot() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let searching = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        requests
            .recv()
            .await
            .unwrap()
            .respond
            .send(Ok(board("NDLS", "good")))
            .unwrap();
        searching.await.unwrap();

        let refreshing = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        requests
            .recv()
            .await
            .unwrap()
            .respond
            .send(Err(BoardError::DuplicateTrainNumber {
                train_number: "12951".to_string(),
            }))
            .unwrap();
        let state = refreshing.await.unwrap();

        assert_eq!(state.phase, BoardPhase::Error);
        assert!(state.error.as_deref().unwrap().contains("12951"));
        assert_eq!(board_name(&state), "good");
        assert_eq!(state.applied_seq, 2);
    }

    #[tokio::test]
    async fn close_discards_the_inflight_refresh() {
        let (provider, mut requests) = scripted();
        let controller = Arc::new(BoardController::new(provider, manual_only()));

        let searching = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.search(code("NDLS")).await })
        };
        requests
            .recv()
            .await
            .unwrap()
            .respond
            .send(Ok(board("NDLS", "good")))
            .unwrap();
        searching.await.unwrap();

        let refreshing = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        let pending = requests.recv().await.unwrap();

        controller.close().await;
        assert!(controller.is_closed());

        // The straggler completes after teardown and must change nothing
        pending.respond.send(Ok(board("NDLS", "late"))).unwrap();
        let state = refreshing.await.unwrap();

        assert_eq!(board_name(&state), "good");
        assert_eq!(state.applied_seq, 1);
        assert_eq!(controller.applied_seq(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (provider, _) = counting();
        let controller = BoardController::new(provider, manual_only());
        controller.close().await;
        controller.close().await;
        assert!(controller.is_closed());
    }

    #[tokio::test]
    async fn closed_controller_ignores_requests() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, manual_only());

        controller.search(code("NDLS")).await;
        controller.close().await;

        let state = controller.search(code("BCT")).await;
        assert_eq!(state.station, Some(code("NDLS")));
        let state = controller.refresh().await;
        assert_eq!(state.applied_seq, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn background_poll_refreshes_periodically() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, PollConfig::new(Duration::from_millis(25)));

        controller.search(code("NDLS")).await;
        wait_until("three applied cycles", || controller.applied_seq() >= 3).await;

        controller.close().await;
        let after_close = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_close);
    }

    #[tokio::test]
    async fn background_poll_needs_a_selected_station() {
        let (provider, calls) = counting();
        let controller = BoardController::new(provider, PollConfig::new(Duration::from_millis(25)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state().phase, BoardPhase::Idle);

        controller.close().await;
    }
}
