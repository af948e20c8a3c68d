//! Workout session state machine and rest timer.
//!
//! ```text
//! Idle --start_workout--> WorkoutActive --set completed--> Resting
//!   ^                        ^  |                            |
//!   |                        |  +--------end_workout---------+--> Idle
//!   |                        +--expired / skipped / undone---+
//! ```
//!
//! Remaining rest time is always derived from an absolute end time, so a
//! missed or late tick corrects itself on the next one.

use crate::clock::{Clock, SystemClock};
use crate::live::{LiveSnapshot, LiveStatus, NoopLiveStatus};
use crate::{ordering, DataStore, Error, Exercise, Result, Routine};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// Where the workout currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    WorkoutActive,
    Resting,
}

/// Identity of one set slot: the exercise plus the set's position in it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SetKey {
    pub exercise_id: Uuid,
    pub set_index: usize,
}

/// State handed to the display layer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub routine_id: Option<Uuid>,
    pub routine_name: Option<String>,
    pub remaining_seconds: u32,
    pub active_set: Option<SetKey>,
    pub active_label: Option<String>,
    pub ends_at: Option<DateTime<Utc>>,
    pub completed_sets: usize,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            routine_id: None,
            routine_name: None,
            remaining_seconds: 0,
            active_set: None,
            active_label: None,
            ends_at: None,
            completed_sets: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct ActiveRoutine {
    id: Uuid,
    name: String,
}

#[derive(Clone, Debug)]
struct RestPeriod {
    key: SetKey,
    label: String,
    ends_at: DateTime<Utc>,
    remaining: u32,
    last_renewal: DateTime<Utc>,
}

/// Owner of the in-progress workout and its rest timer
pub struct SessionManager {
    clock: Box<dyn Clock>,
    live: Box<dyn LiveStatus>,
    routine: Option<ActiveRoutine>,
    completed: HashSet<SetKey>,
    rest: Option<RestPeriod>,
    generation: u64,
    renew_every: Duration,
    live_degraded: bool,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Box::new(SystemClock), Box::new(NoopLiveStatus))
    }
}

impl SessionManager {
    pub fn new(clock: Box<dyn Clock>, live: Box<dyn LiveStatus>) -> Self {
        Self {
            clock,
            live,
            routine: None,
            completed: HashSet::new(),
            rest: None,
            generation: 0,
            renew_every: Duration::seconds(25),
            live_degraded: false,
        }
    }

    /// Set how often the background-execution grant is renewed while resting
    pub fn with_renew_interval(mut self, seconds: u32) -> Self {
        self.renew_every = Duration::seconds(i64::from(seconds.max(1)));
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn phase(&self) -> SessionPhase {
        match (&self.routine, &self.rest) {
            (None, _) => SessionPhase::Idle,
            (Some(_), Some(_)) => SessionPhase::Resting,
            (Some(_), None) => SessionPhase::WorkoutActive,
        }
    }

    pub fn is_resting(&self) -> bool {
        self.rest.is_some()
    }

    pub fn active_routine_id(&self) -> Option<Uuid> {
        self.routine.as_ref().map(|r| r.id)
    }

    pub fn is_completed(&self, exercise_id: Uuid, set_index: usize) -> bool {
        self.completed.contains(&SetKey {
            exercise_id,
            set_index,
        })
    }

    pub fn completed_sets(&self) -> &HashSet<SetKey> {
        &self.completed
    }

    /// Changes whenever a rest period starts or is cancelled
    pub fn timer_generation(&self) -> u64 {
        self.generation
    }

    /// True when a different routine is already in progress
    ///
    /// The caller should confirm with the user before starting `routine`.
    pub fn needs_confirmation(&self, routine: &Routine) -> bool {
        self.routine.as_ref().map_or(false, |r| r.id != routine.id)
    }

    /// Current state, with remaining time computed from the clock
    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let Some(routine) = &self.routine else {
            return SessionSnapshot::idle();
        };

        SessionSnapshot {
            phase: self.phase(),
            routine_id: Some(routine.id),
            routine_name: Some(routine.name.clone()),
            remaining_seconds: self
                .rest
                .as_ref()
                .map_or(0, |rest| remaining_secs(rest.ends_at, now)),
            active_set: self.rest.as_ref().map(|rest| rest.key),
            active_label: self.rest.as_ref().map(|rest| rest.label.clone()),
            ends_at: self.rest.as_ref().map(|rest| rest.ends_at),
            completed_sets: self.completed.len(),
        }
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Begin a workout on `routine`
    ///
    /// Returns false (and changes nothing) if that routine is already active.
    /// Any other in-progress workout is replaced.
    pub fn start_workout(&mut self, routine: &Routine) -> bool {
        if self.active_routine_id() == Some(routine.id) {
            tracing::debug!("Workout {:?} already in progress", routine.name);
            return false;
        }

        if let Some(previous) = &self.routine {
            tracing::info!(
                "Replacing workout {:?} with {:?}",
                previous.name,
                routine.name
            );
        }

        self.cancel_rest();
        self.completed.clear();
        self.live_degraded = false;
        self.routine = Some(ActiveRoutine {
            id: routine.id,
            name: routine.name.clone(),
        });

        tracing::info!("Started workout {:?}", routine.name);
        true
    }

    pub fn end_workout(&mut self) {
        self.cancel_rest();
        self.completed.clear();
        self.live_degraded = false;
        if let Some(routine) = self.routine.take() {
            tracing::info!("Ended workout {:?}", routine.name);
        }
    }

    /// Mark a set done (or not done) and start or cancel rest accordingly
    ///
    /// `set_index` is the set's position in display order. The routine is
    /// read from `store` so the "last set of the last exercise" check sees
    /// the current ordering.
    pub fn handle_set_completion(
        &mut self,
        store: &DataStore,
        exercise_id: Uuid,
        set_index: usize,
        completed: bool,
    ) {
        let Some(routine_id) = self.active_routine_id() else {
            tracing::debug!("Ignoring set completion with no workout in progress");
            return;
        };

        let Some(routine) = store.routine(routine_id) else {
            tracing::warn!("Active routine {} no longer exists, ending workout", routine_id);
            self.end_workout();
            return;
        };

        let Some(exercise) = routine.exercises.iter().find(|e| e.id == exercise_id) else {
            tracing::warn!(
                "Exercise {} is not part of routine {:?}",
                exercise_id,
                routine.name
            );
            return;
        };

        if set_index >= exercise.sets.len() {
            tracing::warn!(
                "Set {} out of range for {} ({} sets)",
                set_index + 1,
                store.exercise_name(exercise),
                exercise.sets.len()
            );
            return;
        }

        let key = SetKey {
            exercise_id,
            set_index,
        };

        if completed {
            self.completed.insert(key);

            if is_final_set(routine, exercise, set_index) {
                tracing::info!("Final set of {:?} completed", routine.name);
                return;
            }
            if exercise.rest_time == 0 {
                return;
            }

            let label = store.exercise_name(exercise).to_string();
            self.start_rest(key, label, exercise.rest_time);
        } else {
            self.completed.remove(&key);
            if self.rest.as_ref().map_or(false, |rest| rest.key == key) {
                tracing::debug!("Set {} un-checked, cancelling its rest", set_index + 1);
                self.cancel_rest();
            }
        }
    }

    /// End the running rest period now; a no-op when none is running
    pub fn skip_current_period(&mut self) {
        if self.rest.is_some() {
            tracing::info!("Rest period skipped");
            self.cancel_rest();
        }
    }

    /// Push the running rest period's end time back
    pub fn extend_current_period(&mut self, seconds: u32) {
        let now = self.clock.now();
        let Some(rest) = self.rest.as_mut() else {
            return;
        };
        rest.ends_at += Duration::seconds(i64::from(seconds));
        rest.remaining = remaining_secs(rest.ends_at, now);
        tracing::info!("Rest extended by {}s", seconds);
        self.publish();
    }

    /// Apply one countdown tick
    ///
    /// Called once per second while resting. Ends the rest period when its
    /// end time has passed.
    pub fn tick(&mut self) -> SessionPhase {
        let now = self.clock.now();
        let renew_every = self.renew_every;
        let Some(rest) = self.rest.as_mut() else {
            return self.phase();
        };

        let remaining = remaining_secs(rest.ends_at, now);
        if remaining == 0 {
            tracing::info!("Rest period for {} finished", rest.label);
            self.cancel_rest();
            return self.phase();
        }

        let changed = remaining != rest.remaining;
        rest.remaining = remaining;

        let renew = now - rest.last_renewal >= renew_every;
        if renew {
            rest.last_renewal = now;
            let result = self.live.renew_background_run();
            self.report("renew background run", result);
        }

        if changed {
            self.publish();
        }
        self.phase()
    }

    /// Keep the session consistent when a routine is deleted from the store
    pub fn on_routine_deleted(&mut self, routine_id: Uuid) {
        if self.active_routine_id() == Some(routine_id) {
            tracing::info!("Active routine deleted, ending workout");
            self.end_workout();
        }
    }

    // ========================================================================
    // Rest period plumbing
    // ========================================================================

    fn start_rest(&mut self, key: SetKey, label: String, seconds: u32) {
        self.cancel_rest();

        let now = self.clock.now();
        self.generation += 1;
        tracing::info!("Resting {}s after {} set {}", seconds, label, key.set_index + 1);
        self.rest = Some(RestPeriod {
            key,
            label,
            ends_at: now + Duration::seconds(i64::from(seconds)),
            remaining: seconds,
            last_renewal: now,
        });

        let result = self.live.request_background_run();
        self.report("request background run", result);
        self.publish();
    }

    fn cancel_rest(&mut self) {
        if self.rest.take().is_none() {
            return;
        }
        self.generation += 1;

        if !self.live_degraded {
            let result = self.live.end_live_status();
            self.report("end live status", result);
        }
        let result = self.live.end_background_run();
        self.report("end background run", result);
    }

    fn publish(&mut self) {
        if self.live_degraded {
            return;
        }
        let (Some(routine), Some(rest)) = (&self.routine, &self.rest) else {
            return;
        };
        let snapshot = LiveSnapshot {
            routine_name: routine.name.clone(),
            label: rest.label.clone(),
            ends_at: rest.ends_at,
            remaining_seconds: rest.remaining,
        };
        let result = self.live.publish_live_status(&snapshot);
        self.report("publish live status", result);
    }

    fn report(&mut self, action: &str, result: Result<()>) {
        match result {
            Ok(()) => {}
            Err(Error::Permission(reason)) => {
                if !self.live_degraded {
                    tracing::warn!(
                        "Live status unavailable ({}): {}. Timer continues without it.",
                        action,
                        reason
                    );
                }
                self.live_degraded = true;
            }
            Err(e) => tracing::warn!("Failed to {}: {}", action, e),
        }
    }
}

/// Whole seconds left until `ends_at`, rounded up
fn remaining_secs(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let millis = (ends_at - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        u32::try_from((millis + 999) / 1000).unwrap_or(u32::MAX)
    }
}

/// Last set (by position) of the last exercise (by sort order)
fn is_final_set(routine: &Routine, exercise: &Exercise, set_index: usize) -> bool {
    let last_exercise = ordering::sorted(&routine.exercises).last().map(|e| e.id);
    last_exercise == Some(exercise.id) && set_index + 1 == exercise.sets.len()
}
