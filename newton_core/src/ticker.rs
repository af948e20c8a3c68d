//! Shared session handle and the one-second countdown task.
//!
//! The handle is the single owner of the [`SessionManager`]; clones share it.
//! Every intent goes through the handle, which publishes a fresh
//! [`SessionSnapshot`] on a watch channel and spawns a ticker task whenever
//! a new rest period begins.
//!
//! A ticker only applies a tick while the manager's timer generation still
//! matches the one it was spawned for, so a cancelled rest never receives a
//! late tick. Requires a running tokio runtime.

use crate::session::{SessionManager, SessionPhase, SessionSnapshot};
use crate::{DataStore, Routine};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

const TICK: Duration = Duration::from_secs(1);

/// Cloneable handle to the application's session manager
#[derive(Clone)]
pub struct SessionHandle {
    manager: Arc<Mutex<SessionManager>>,
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionHandle {
    pub fn new(manager: SessionManager) -> Self {
        let (tx, _rx) = watch::channel(manager.snapshot());
        Self {
            manager: Arc::new(Mutex::new(manager)),
            snapshots: Arc::new(tx),
        }
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, SessionManager> {
        // A panic while holding the lock cannot leave the manager half-updated
        // in a way later calls rely on, so keep going with the inner value.
        self.manager.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the manager, then broadcast and start a ticker if needed
    fn apply<R>(&self, f: impl FnOnce(&mut SessionManager) -> R) -> R {
        let (out, snapshot, spawn_for) = {
            let mut manager = self.lock();
            let before = manager.timer_generation();
            let out = f(&mut manager);
            let after = manager.timer_generation();
            let spawn_for = (after != before && manager.is_resting()).then_some(after);
            (out, manager.snapshot(), spawn_for)
        };

        self.snapshots.send_replace(snapshot);
        if let Some(generation) = spawn_for {
            self.spawn_ticker(generation);
        }
        out
    }

    // ========================================================================
    // Intents
    // ========================================================================

    pub fn needs_confirmation(&self, routine: &Routine) -> bool {
        self.lock().needs_confirmation(routine)
    }

    pub fn start_workout(&self, routine: &Routine) -> bool {
        self.apply(|m| m.start_workout(routine))
    }

    pub fn end_workout(&self) {
        self.apply(|m| m.end_workout())
    }

    pub fn handle_set_completion(
        &self,
        store: &DataStore,
        exercise_id: Uuid,
        set_index: usize,
        completed: bool,
    ) {
        self.apply(|m| m.handle_set_completion(store, exercise_id, set_index, completed))
    }

    pub fn is_completed(&self, exercise_id: Uuid, set_index: usize) -> bool {
        self.lock().is_completed(exercise_id, set_index)
    }

    pub fn skip_current_period(&self) {
        self.apply(|m| m.skip_current_period())
    }

    pub fn extend_current_period(&self, seconds: u32) {
        self.apply(|m| m.extend_current_period(seconds))
    }

    pub fn on_routine_deleted(&self, routine_id: Uuid) {
        self.apply(|m| m.on_routine_deleted(routine_id))
    }

    // ========================================================================
    // Ticker
    // ========================================================================

    /// Apply one tick if the rest period `generation` is still current
    ///
    /// Returns false once the ticker should stop.
    fn tick_generation(&self, generation: u64) -> bool {
        let (resting, snapshot) = {
            let mut manager = self.lock();
            if manager.timer_generation() != generation || !manager.is_resting() {
                return false;
            }
            let phase = manager.tick();
            (phase == SessionPhase::Resting, manager.snapshot())
        };
        self.snapshots.send_replace(snapshot);
        resting
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let handle = self.clone();
        tracing::debug!("Spawning rest ticker (generation {})", generation);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if !handle.tick_generation(generation) {
                    break;
                }
            }
            tracing::debug!("Rest ticker {} stopped", generation);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixture(rest_seconds: u32) -> (DataStore, Uuid, Uuid, SessionHandle) {
        let mut store = DataStore::new();
        let routine = store.add_routine("Push Day", Utc::now());
        let bench = store.add_template("Bench Press", "Chest").unwrap();
        let ohp = store.add_template("Overhead Press", "Shoulders").unwrap();
        let first = store.add_exercise(routine, bench, rest_seconds).unwrap();
        let last = store.add_exercise(routine, ohp, rest_seconds).unwrap();
        store.add_set(first, 135.0, 5).unwrap();
        store.add_set(last, 95.0, 5).unwrap();

        let handle = SessionHandle::new(SessionManager::default());
        handle.start_workout(store.routine(routine).unwrap());
        (store, routine, first, handle)
    }

    #[tokio::test]
    async fn test_rest_expires_on_its_own() {
        let (store, _, first, handle) = fixture(1);
        let mut rx = handle.subscribe();

        handle.handle_set_completion(&store, first, 0, true);
        assert_eq!(handle.snapshot().phase, SessionPhase::Resting);

        let done = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if rx.borrow_and_update().phase == SessionPhase::WorkoutActive {
                    break;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        assert!(done.is_ok(), "rest period never finished");
        assert_eq!(handle.snapshot().phase, SessionPhase::WorkoutActive);
    }

    #[tokio::test]
    async fn test_cancelled_ticker_stops() {
        let (store, _, first, handle) = fixture(60);

        handle.handle_set_completion(&store, first, 0, true);
        let generation = handle.lock().timer_generation();
        let ticker = handle.spawn_ticker(generation);

        handle.skip_current_period();

        let stopped = tokio::time::timeout(Duration::from_secs(3), ticker).await;
        assert!(stopped.is_ok(), "ticker kept running after skip");
        assert_eq!(handle.snapshot().phase, SessionPhase::WorkoutActive);
    }

    #[tokio::test]
    async fn test_stale_generation_never_ticks() {
        let (store, _, first, handle) = fixture(60);

        handle.handle_set_completion(&store, first, 0, true);
        let stale = handle.lock().timer_generation();
        handle.handle_set_completion(&store, first, 0, false);
        handle.handle_set_completion(&store, first, 0, true);

        assert!(!handle.tick_generation(stale));
        assert_eq!(handle.snapshot().phase, SessionPhase::Resting);
    }

    #[tokio::test]
    async fn test_snapshots_broadcast_on_intents() {
        let (store, routine, first, handle) = fixture(60);
        let rx = handle.subscribe();

        handle.handle_set_completion(&store, first, 0, true);
        assert_eq!(rx.borrow().phase, SessionPhase::Resting);
        assert_eq!(rx.borrow().remaining_seconds, 60);

        handle.on_routine_deleted(routine);
        assert_eq!(rx.borrow().phase, SessionPhase::Idle);
    }
}
