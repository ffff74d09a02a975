// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Timer-driven replay on the Tokio runtime.
//!
//! [`ReplayPlayer`] owns one [`Playback`] behind a mutex and spawns a single
//! driver task per run. Every control call bumps an epoch under the same lock
//! the driver takes before appending, so once `stop`/`reset`/`play` returns, a
//! tick scheduled by an earlier run can no longer touch the text.

use crate::config::PlayerConfig;
use crate::playback::{Playback, PlaybackSnapshot, PlaybackStatus, Step};
use sr_dump::{DumpError, StreamEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct Inner {
    playback: Playback,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl Inner {
    /// Invalidate any in-flight driver and return the new epoch.
    fn invalidate(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.epoch
    }
}

struct Shared {
    inner: Mutex<Inner>,
    updates: watch::Sender<PlaybackSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.playback.snapshot());
    }
}

/// Replay service for one loaded dump.
///
/// `play` spawns onto the current Tokio runtime and must be called from
/// within one.
pub struct ReplayPlayer {
    shared: Arc<Shared>,
}

impl ReplayPlayer {
    pub fn new(events: impl Into<Arc<[StreamEvent]>>, config: PlayerConfig) -> Self {
        let playback = Playback::new(events, config);
        let (updates, _) = watch::channel(playback.snapshot());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    playback,
                    epoch: 0,
                    task: None,
                }),
                updates,
            }),
        }
    }

    /// Parse `raw` and, if it holds any events, replace the current dump.
    ///
    /// On failure the loaded events and playback state are left as they were.
    pub fn load(&self, raw: &str) -> Result<usize, DumpError> {
        let events = sr_dump::load_str(raw)?;
        let count = events.len();

        let mut inner = self.shared.lock();
        inner.invalidate();
        inner.playback.replace_events(events);
        self.shared.publish(&inner);
        info!(events = count, "Replaced replay dump");
        Ok(count)
    }

    /// Start or resume streaming. Returns whether a run was started.
    pub fn play(&self) -> bool {
        let mut inner = self.shared.lock();
        if !inner.playback.play() {
            return false;
        }
        let epoch = inner.invalidate();
        inner.task = Some(tokio::spawn(drive(Arc::clone(&self.shared), epoch)));
        self.shared.publish(&inner);
        true
    }

    /// Pause; no append happens after this returns.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        inner.invalidate();
        if inner.playback.stop() {
            self.shared.publish(&inner);
        }
    }

    /// Clear text and rewind from any state.
    pub fn reset(&self) {
        let mut inner = self.shared.lock();
        inner.invalidate();
        inner.playback.reset();
        self.shared.publish(&inner);
    }

    /// Takes effect from the next scheduled tick. Returns the clamped value in effect.
    pub fn set_speed_multiplier(&self, requested: f64) -> f64 {
        let mut inner = self.shared.lock();
        let applied = inner.playback.set_speed_multiplier(requested);
        self.shared.publish(&inner);
        applied
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.lock().playback.status()
    }

    pub fn current_text(&self) -> String {
        self.shared.lock().playback.text().to_string()
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.shared.lock().playback.speed_multiplier()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.lock().playback.snapshot()
    }

    pub fn event_count(&self) -> usize {
        self.shared.lock().playback.events().len()
    }

    /// Observe every state change. The current state is available immediately.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Wait until playback is no longer streaming (finished, failed or stopped).
    pub async fn wait_until_settled(&self) -> PlaybackSnapshot {
        let mut updates = self.subscribe();
        let settled = match updates
            .wait_for(|snapshot| snapshot.status != PlaybackStatus::Streaming)
            .await
        {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}

impl Drop for ReplayPlayer {
    fn drop(&mut self) {
        self.shared.lock().invalidate();
    }
}

async fn drive(shared: Arc<Shared>, epoch: u64) {
    loop {
        let delay = {
            let inner = shared.lock();
            if inner.epoch != epoch {
                return;
            }
            match inner.playback.next_delay() {
                Some(delay) => delay,
                None => return,
            }
        };

        tokio::time::sleep(delay).await;

        let step = {
            let mut inner = shared.lock();
            if inner.epoch != epoch {
                debug!(epoch, "Dropping stale replay tick");
                return;
            }
            let step = inner.playback.advance();
            shared.publish(&inner);
            if let Step::Finished(status) = step {
                info!(
                    %status,
                    events = inner.playback.cursor(),
                    bytes = inner.playback.text().len(),
                    "Replay run finished"
                );
            }
            step
        };

        if step != Step::Continue {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn deltas(parts: &[&str]) -> Vec<StreamEvent> {
        parts.iter().enumerate().map(|(i, text)| StreamEvent::delta(i, *text)).collect()
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn play_runs_to_done() {
        let player = ReplayPlayer::new(deltas(&["Hel", "lo", "!"]), PlayerConfig::default());
        assert!(player.play());
        assert_eq!(player.status(), PlaybackStatus::Streaming);

        let settled = player.wait_until_settled().await;
        assert_eq!(settled.status, PlaybackStatus::Done);
        assert_eq!(settled.text, "Hello!");
        assert_eq!(player.current_text(), "Hello!");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn ticks_follow_the_default_interval() {
        let player = ReplayPlayer::new(deltas(&["a", "b", "c"]), PlayerConfig::default());
        player.play();

        tokio::time::sleep(Duration::from_millis(45)).await;
        assert_eq!(player.current_text(), "a");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(player.current_text(), "ab");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn load_failure_keeps_current_dump() {
        let player = ReplayPlayer::new(deltas(&["a", "b"]), PlayerConfig::default());
        player.play();
        player.wait_until_settled().await;

        let err = player.load("not json\n{\"type\":\"mystery\"}").unwrap_err();
        assert!(matches!(err, DumpError::NoEvents));
        assert_eq!(player.status(), PlaybackStatus::Done);
        assert_eq!(player.current_text(), "ab");
        assert_eq!(player.event_count(), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn load_success_resets_and_swaps() {
        let player = ReplayPlayer::new(deltas(&["old"]), PlayerConfig::default());
        player.play();
        player.wait_until_settled().await;

        let count = player
            .load("{\"type\":\"delta\",\"text\":\"new\"}\n{\"type\":\"done\"}")
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(player.status(), PlaybackStatus::Idle);
        assert_eq!(player.current_text(), "");

        player.play();
        assert_eq!(player.wait_until_settled().await.text, "new");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn subscribers_see_monotonic_text() {
        let player = ReplayPlayer::new(deltas(&["a", "b", "c", "d"]), PlayerConfig::default());
        let mut updates = player.subscribe();
        player.play();

        let mut last_len = 0;
        loop {
            let snapshot = updates.borrow_and_update().clone();
            assert!(snapshot.text.len() >= last_len);
            last_len = snapshot.text.len();
            if snapshot.status == PlaybackStatus::Done {
                break;
            }
            updates.changed().await.unwrap();
        }
        assert_eq!(last_len, 4);
    }
}
