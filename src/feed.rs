//! Room feed: one owned task per open room.
//!
//! DESIGN
//! ======
//! `RoomFeed::open` spawns a single task that owns everything a room view
//! needs: the reveal state, the poll deadline, the reveal ticker, and the
//! in-flight fetch. The task multiplexes them with `tokio::select!` and
//! publishes a [`FeedView`] through a watch channel after every step.
//! Consumers never touch the state directly; imperative operations are
//! sent as commands.
//!
//! LIFECYCLE
//! =========
//! Dropping the `RoomFeed` aborts the task. The pending timer and any
//! in-flight fetch future are dropped with it, so nothing is published
//! after disposal. Switching rooms is close-then-open; feeds share nothing.
//!
//! POLLING
//! =======
//! After each successful fetch the next poll is scheduled from
//! [`PollPolicy::interval`]. A failed fetch parks polling until `refetch`
//! or a re-enable. Disabled or backgrounded feeds do not poll; coming back
//! fetches immediately. `refetch` always fetches, even in the background.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::fetch::{FetchError, MessageSource};
use crate::message::Message;
use crate::polling::{PollPolicy, now_unix_ms};
use crate::reveal::{Phase, RevealState, SnapshotChange};

type InflightFetch = Pin<Box<dyn Future<Output = Result<Vec<Message>, FetchError>> + Send>>;

// =============================================================================
// VIEW
// =============================================================================

/// Read-only state of a room feed as seen by its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    /// Revealed prefix of the latest snapshot.
    pub messages: Vec<Message>,
    /// No fetch has completed yet.
    pub is_loading: bool,
    /// A fetch is in flight.
    pub is_fetching: bool,
    /// Last fetch failure. Cleared by the next successful fetch.
    pub error: Option<FetchError>,
    pub has_more: bool,
    pub is_loading_more: bool,
    pub total_messages: usize,
    pub displayed_count: usize,
    pub phase: Phase,
}

impl FeedView {
    fn initial(enabled: bool) -> Self {
        Self {
            messages: Vec::new(),
            is_loading: enabled,
            is_fetching: false,
            error: None,
            has_more: false,
            is_loading_more: false,
            total_messages: 0,
            displayed_count: 0,
            phase: Phase::Empty,
        }
    }
}

/// What a command asks of the fetch side of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Idle,
    /// Poll now, subject to enabled/visible.
    Poll,
    /// Fetch now regardless of visibility.
    Fetch,
}

#[derive(Debug)]
enum Command {
    LoadMore,
    ShowAll,
    SetEnabled(bool),
    SetVisible(bool),
    Refetch,
}

// =============================================================================
// ROOM FEED
// =============================================================================

/// Handle to a live room feed. Dropping it cancels the feed.
pub struct RoomFeed {
    room_id: String,
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<FeedView>,
    task: JoinHandle<()>,
}

impl RoomFeed {
    /// Start following `room_id`. Must be called inside a tokio runtime.
    ///
    /// A feed for an empty room id starts disabled.
    pub fn open(source: Arc<dyn MessageSource>, room_id: impl Into<String>, config: &FeedConfig) -> Self {
        let room_id = room_id.into();
        let enabled = !room_id.is_empty();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(FeedView::initial(enabled));

        let task = FeedTask {
            source,
            room_id: room_id.clone(),
            poll: config.poll,
            reveal: RevealState::new(config.reveal),
            enabled,
            visible: true,
            fetching: false,
            has_loaded: false,
            error: None,
            view: view_tx,
        };
        let task = tokio::spawn(task.run(command_rx, config.display_delay));

        info!(%room_id, enabled, "room feed opened");
        Self { room_id, commands, view, task }
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Current view.
    #[must_use]
    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    /// Independent receiver for view updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    /// Wait for the next published change. `None` once the feed task ended.
    pub async fn changed(&mut self) -> Option<FeedView> {
        self.view.changed().await.ok()?;
        Some(self.view.borrow_and_update().clone())
    }

    /// Reveal the next batch immediately.
    pub fn load_more(&self) {
        self.send(Command::LoadMore);
    }

    /// Reveal the whole snapshot immediately.
    pub fn show_all(&self) {
        self.send(Command::ShowAll);
    }

    /// Enable or disable polling. Re-enabling fetches immediately and
    /// clears a previous error.
    pub fn set_enabled(&self, enabled: bool) {
        self.send(Command::SetEnabled(enabled));
    }

    /// Mark the consuming view as foreground or background. Returning to
    /// the foreground fetches immediately.
    pub fn set_visible(&self, visible: bool) {
        self.send(Command::SetVisible(visible));
    }

    /// Fetch now, clearing any previous error. Works in the background too;
    /// automatic polling still follows enabled/visible.
    pub fn refetch(&self) {
        self.send(Command::Refetch);
    }

    /// Stop the feed.
    pub fn close(self) {
        info!(room_id = %self.room_id, "room feed closed");
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(room_id = %self.room_id, "command dropped; feed task has ended");
        }
    }
}

impl Drop for RoomFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// FEED TASK
// =============================================================================

struct FeedTask {
    source: Arc<dyn MessageSource>,
    room_id: String,
    poll: PollPolicy,
    reveal: RevealState,
    enabled: bool,
    visible: bool,
    fetching: bool,
    has_loaded: bool,
    error: Option<FetchError>,
    view: watch::Sender<FeedView>,
}

impl FeedTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, display_delay: Duration) {
        let mut ticker = tokio::time::interval(display_delay.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut inflight: Option<InflightFetch> = None;
        let mut next_poll = Some(Instant::now());

        loop {
            let poll_at = next_poll.filter(|_| inflight.is_none() && self.polling_armed());
            let revealing = self.reveal.phase() == Phase::Revealing;

            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else { break };
                    match self.apply(command).await {
                        Wake::Fetch if inflight.is_none() => {
                            inflight = Some(self.start_fetch());
                            next_poll = None;
                        }
                        Wake::Poll if inflight.is_none() => next_poll = Some(Instant::now()),
                        _ => {}
                    }
                }
                result = async {
                    match inflight.as_mut() {
                        Some(fetch) => fetch.await,
                        None => std::future::pending().await,
                    }
                }, if inflight.is_some() => {
                    inflight = None;
                    self.fetching = false;
                    next_poll = self.on_fetched(result, &mut ticker);
                }
                _ = ticker.tick(), if revealing => {
                    self.reveal.tick();
                }
                () = tokio::time::sleep_until(poll_at.unwrap_or_else(Instant::now)), if poll_at.is_some() => {
                    inflight = Some(self.start_fetch());
                    next_poll = None;
                }
            }

            self.publish();
        }

        debug!(room_id = %self.room_id, "feed task finished");
    }

    fn polling_armed(&self) -> bool {
        self.enabled && self.visible && self.error.is_none()
    }

    /// Apply a consumer command.
    async fn apply(&mut self, command: Command) -> Wake {
        match command {
            Command::LoadMore => {
                if self.reveal.begin_load_more() {
                    self.publish();
                    // Watchers get a turn to see the in-progress batch before it lands.
                    tokio::task::yield_now().await;
                    self.reveal.complete_load_more();
                }
                Wake::Idle
            }
            Command::ShowAll => {
                self.reveal.show_all();
                Wake::Idle
            }
            Command::SetEnabled(enabled) => {
                let resume = enabled && (!self.enabled || self.error.is_some());
                self.enabled = enabled;
                if resume {
                    self.error = None;
                }
                if resume && self.polling_armed() { Wake::Poll } else { Wake::Idle }
            }
            Command::SetVisible(visible) => {
                let foregrounded = visible && !self.visible;
                self.visible = visible;
                if foregrounded && self.polling_armed() { Wake::Poll } else { Wake::Idle }
            }
            Command::Refetch => {
                self.error = None;
                Wake::Fetch
            }
        }
    }

    fn start_fetch(&mut self) -> InflightFetch {
        self.fetching = true;
        let source = Arc::clone(&self.source);
        let room_id = self.room_id.clone();
        Box::pin(async move { source.fetch_messages(&room_id).await })
    }

    /// Fold a fetch result into the state. Returns the next poll deadline,
    /// or `None` when polling is parked on an error.
    fn on_fetched(&mut self, result: Result<Vec<Message>, FetchError>, ticker: &mut Interval) -> Option<Instant> {
        self.has_loaded = true;
        match result {
            Ok(snapshot) => {
                self.error = None;
                let interval = self.poll.interval(snapshot.last(), now_unix_ms());
                match self.reveal.observe(snapshot) {
                    SnapshotChange::Seeded { shown, total } => {
                        debug!(room_id = %self.room_id, shown, total, "snapshot seeded");
                        ticker.reset();
                    }
                    SnapshotChange::Cleared => {
                        debug!(room_id = %self.room_id, "snapshot emptied; reveal cleared");
                    }
                    SnapshotChange::Unchanged => {}
                }
                debug!(room_id = %self.room_id, interval = ?interval, "next poll scheduled");
                Some(Instant::now() + interval)
            }
            Err(e) => {
                warn!(room_id = %self.room_id, error = %e, "message fetch failed; polling paused");
                self.error = Some(e);
                None
            }
        }
    }

    fn publish(&self) {
        let next = FeedView {
            messages: self.reveal.messages().to_vec(),
            is_loading: self.enabled && !self.has_loaded,
            is_fetching: self.fetching,
            error: self.error.clone(),
            has_more: self.reveal.has_more(),
            is_loading_more: self.reveal.is_loading_more(),
            total_messages: self.reveal.total_messages(),
            displayed_count: self.reveal.displayed_count(),
            phase: self.reveal.phase(),
        };
        self.view.send_if_modified(|view| {
            if *view == next {
                false
            } else {
                *view = next;
                true
            }
        });
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
