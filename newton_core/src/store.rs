//! In-memory data store for routines, templates and analytics logs.
//!
//! The store owns the whole object graph and is the only place that mutates
//! it, so the ordering and reference invariants hold after every call:
//! - sort orders are contiguous from zero in every ordered collection
//! - template names are unique and every exercise references a live template
//! - deleting a routine cascades to its exercises and sets

use crate::ordering;
use crate::{AnalyticsLog, Error, Exercise, ExerciseSet, ExerciseTemplate, Result, Routine};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The complete user data model
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataStore {
    pub(crate) routines: Vec<Routine>,
    pub(crate) templates: Vec<ExerciseTemplate>,
    pub(crate) logs: Vec<AnalyticsLog>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded records, repairing sort orders
    pub(crate) fn from_parts(
        mut routines: Vec<Routine>,
        templates: Vec<ExerciseTemplate>,
        logs: Vec<AnalyticsLog>,
    ) -> Self {
        ordering::normalize(&mut routines);
        for routine in &mut routines {
            ordering::normalize(&mut routine.exercises);
            for exercise in &mut routine.exercises {
                ordering::normalize(&mut exercise.sets);
            }
        }
        Self {
            routines,
            templates,
            logs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty() && self.templates.is_empty() && self.logs.is_empty()
    }

    /// Remove every routine, template and log
    pub fn delete_all(&mut self) {
        tracing::info!(
            "Deleting all data ({} routines, {} templates, {} logs)",
            self.routines.len(),
            self.templates.len(),
            self.logs.len()
        );
        self.routines.clear();
        self.templates.clear();
        self.logs.clear();
    }

    // ========================================================================
    // Routines
    // ========================================================================

    /// Routines in display order
    pub fn routines(&self) -> Vec<&Routine> {
        ordering::sorted(&self.routines)
    }

    pub fn routine(&self, id: Uuid) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    pub fn routine_by_name(&self, name: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name)
    }

    pub fn add_routine(&mut self, name: &str, created_at: DateTime<Utc>) -> Uuid {
        let routine = Routine::new(name, created_at);
        let id = routine.id;
        ordering::push(&mut self.routines, routine);
        tracing::debug!("Added routine {:?} ({})", name, id);
        id
    }

    pub(crate) fn insert_routine(&mut self, mut routine: Routine) -> Uuid {
        let id = routine.id;
        ordering::normalize(&mut routine.exercises);
        for exercise in &mut routine.exercises {
            ordering::normalize(&mut exercise.sets);
        }
        ordering::push(&mut self.routines, routine);
        id
    }

    pub fn rename_routine(&mut self, id: Uuid, name: &str) -> Result<()> {
        let routine = self.routine_mut(id)?;
        routine.name = name.to_string();
        Ok(())
    }

    /// Delete a routine together with its exercises and sets
    pub fn delete_routine(&mut self, id: Uuid) -> Result<Routine> {
        let index = self
            .routines
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("routine {}", id)))?;
        let removed = ordering::remove(&mut self.routines, index)?;
        tracing::debug!(
            "Deleted routine {:?} with {} exercises",
            removed.name,
            removed.exercises.len()
        );
        Ok(removed)
    }

    /// Move the routine at display position `from` to `to` (zero-based)
    pub fn move_routine(&mut self, from: usize, to: usize) -> Result<()> {
        ordering::move_item(&mut self.routines, from, to)
    }

    fn routine_mut(&mut self, id: Uuid) -> Result<&mut Routine> {
        self.routines
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("routine {}", id)))
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Templates sorted by name
    pub fn templates(&self) -> Vec<&ExerciseTemplate> {
        let mut templates: Vec<&ExerciseTemplate> = self.templates.iter().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    pub fn template(&self, id: Uuid) -> Option<&ExerciseTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn template_by_name(&self, name: &str) -> Option<&ExerciseTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Insert a new template; names are unique
    pub fn add_template(&mut self, name: &str, category: &str) -> Result<Uuid> {
        if self.template_by_name(name).is_some() {
            return Err(Error::Store(format!(
                "an exercise template named {:?} already exists",
                name
            )));
        }
        let template = ExerciseTemplate::new(name, category);
        let id = template.id;
        self.templates.push(template);
        tracing::debug!("Added template {:?} ({})", name, category);
        Ok(id)
    }

    /// Return the id of the template called `name`, creating it if needed
    pub fn find_or_create_template(&mut self, name: &str, category: &str) -> Uuid {
        if let Some(existing) = self.template_by_name(name) {
            return existing.id;
        }
        let template = ExerciseTemplate::new(name, category);
        let id = template.id;
        self.templates.push(template);
        id
    }

    /// Number of exercises built on the template
    pub fn template_usage(&self, id: Uuid) -> usize {
        self.routines
            .iter()
            .flat_map(|r| r.exercises.iter())
            .filter(|e| e.template_id == id)
            .count()
    }

    /// Delete an unused template
    pub fn delete_template(&mut self, id: Uuid) -> Result<ExerciseTemplate> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("exercise template {}", id)))?;

        let usage = self.template_usage(id);
        if usage > 0 {
            return Err(Error::Store(format!(
                "exercise template {:?} is used by {} exercise(s)",
                self.templates[index].name, usage
            )));
        }
        Ok(self.templates.remove(index))
    }

    /// Display name of the template behind an exercise
    pub fn exercise_name(&self, exercise: &Exercise) -> &str {
        self.template(exercise.template_id)
            .map(|t| t.name.as_str())
            .unwrap_or("Unknown exercise")
    }

    // ========================================================================
    // Exercises
    // ========================================================================

    /// Find an exercise and the routine that owns it
    pub fn exercise(&self, id: Uuid) -> Option<(&Routine, &Exercise)> {
        self.routines.iter().find_map(|routine| {
            routine
                .exercises
                .iter()
                .find(|e| e.id == id)
                .map(|exercise| (routine, exercise))
        })
    }

    fn exercise_mut(&mut self, id: Uuid) -> Result<&mut Exercise> {
        self.routines
            .iter_mut()
            .flat_map(|r| r.exercises.iter_mut())
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))
    }

    /// Append an exercise built on `template_id` to a routine
    pub fn add_exercise(&mut self, routine_id: Uuid, template_id: Uuid, rest_time: u32) -> Result<Uuid> {
        if self.template(template_id).is_none() {
            return Err(Error::NotFound(format!("exercise template {}", template_id)));
        }
        let routine = self.routine_mut(routine_id)?;
        let exercise = Exercise::new(template_id, rest_time);
        let id = exercise.id;
        ordering::push(&mut routine.exercises, exercise);
        Ok(id)
    }

    pub fn remove_exercise(&mut self, routine_id: Uuid, exercise_id: Uuid) -> Result<Exercise> {
        let routine = self.routine_mut(routine_id)?;
        let index = routine
            .exercises
            .iter()
            .position(|e| e.id == exercise_id)
            .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))?;
        ordering::remove(&mut routine.exercises, index)
    }

    /// Move an exercise within its routine (zero-based positions)
    pub fn move_exercise(&mut self, routine_id: Uuid, from: usize, to: usize) -> Result<()> {
        let routine = self.routine_mut(routine_id)?;
        ordering::move_item(&mut routine.exercises, from, to)
    }

    pub fn set_rest_time(&mut self, exercise_id: Uuid, seconds: u32) -> Result<()> {
        self.exercise_mut(exercise_id)?.rest_time = seconds;
        Ok(())
    }

    // ========================================================================
    // Sets
    // ========================================================================

    pub fn add_set(&mut self, exercise_id: Uuid, weight: f64, reps: u32) -> Result<Uuid> {
        let exercise = self.exercise_mut(exercise_id)?;
        let set = ExerciseSet::new(weight, reps);
        let id = set.id;
        ordering::push(&mut exercise.sets, set);
        Ok(id)
    }

    pub fn update_set(&mut self, exercise_id: Uuid, set_id: Uuid, weight: f64, reps: u32) -> Result<()> {
        let exercise = self.exercise_mut(exercise_id)?;
        let set = exercise
            .sets
            .iter_mut()
            .find(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("set {}", set_id)))?;
        set.weight = weight;
        set.reps = reps;
        Ok(())
    }

    pub fn remove_set(&mut self, exercise_id: Uuid, set_id: Uuid) -> Result<ExerciseSet> {
        let exercise = self.exercise_mut(exercise_id)?;
        let index = exercise
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("set {}", set_id)))?;
        ordering::remove(&mut exercise.sets, index)
    }

    /// Move a set to the end of another exercise
    pub fn move_set(&mut self, from_exercise: Uuid, set_id: Uuid, to_exercise: Uuid) -> Result<()> {
        // Validate the target first so a failed move leaves the source alone
        self.exercise_mut(to_exercise)?;
        let set = self.remove_set(from_exercise, set_id)?;
        let target = self.exercise_mut(to_exercise)?;
        ordering::push(&mut target.sets, set);
        Ok(())
    }

    // ========================================================================
    // Analytics logs
    // ========================================================================

    /// Logs ordered by timestamp, oldest first
    pub fn logs(&self) -> Vec<&AnalyticsLog> {
        let mut logs: Vec<&AnalyticsLog> = self.logs.iter().collect();
        logs.sort_by_key(|l| l.timestamp);
        logs
    }

    pub fn add_log(&mut self, log: AnalyticsLog) -> Uuid {
        let id = log.id;
        self.logs.push(log);
        id
    }

    pub fn delete_log(&mut self, id: Uuid) -> Result<AnalyticsLog> {
        let index = self
            .logs
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("analytics log {}", id)))?;
        Ok(self.logs.remove(index))
    }
}
