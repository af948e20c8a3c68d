//! Core domain types for Newton Notes.
//!
//! This module defines the fundamental types used throughout the system:
//! - Routines, exercises and sets (the workout plan)
//! - Exercise templates (shared movement definitions)
//! - Analytics logs (free-form progress tracking)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rest time given to an exercise when none is specified
pub const DEFAULT_REST_SECONDS: u32 = 90;

// ============================================================================
// Templates
// ============================================================================

/// Reusable definition of a movement. `name` is the natural key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseTemplate {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

impl ExerciseTemplate {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: category.into(),
        }
    }
}

// ============================================================================
// Routine Types
// ============================================================================

/// One logged unit of weight x reps
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    pub id: Uuid,
    pub weight: f64,
    pub reps: u32,
    pub sort_order: u32,
}

impl ExerciseSet {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            weight,
            reps,
            sort_order: 0,
        }
    }
}

/// An instance of a template inside a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub template_id: Uuid,
    pub sets: Vec<ExerciseSet>,
    pub rest_time: u32,
    pub sort_order: u32,
}

impl Exercise {
    pub fn new(template_id: Uuid, rest_time: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            sets: Vec::new(),
            rest_time,
            sort_order: 0,
        }
    }
}

/// A named, ordered workout plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
    pub sort_order: u32,
}

impl Routine {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises: Vec::new(),
            created_at,
            sort_order: 0,
        }
    }

    /// Total number of sets across all exercises
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// A timestamped data point for progress tracking
///
/// Logs are never edited in place; they are inserted or deleted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsLog {
    pub id: Uuid,
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Same-day entries under one name are summed toward `daily_goal`
    #[serde(default)]
    pub is_cumulative: Option<bool>,
    #[serde(default)]
    pub daily_goal: Option<f64>,
}

impl AnalyticsLog {
    pub fn new(name: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            value,
            timestamp,
            unit: None,
            is_cumulative: None,
            daily_goal: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn cumulative(mut self, daily_goal: Option<f64>) -> Self {
        self.is_cumulative = Some(true);
        self.daily_goal = daily_goal;
        self
    }

    pub fn is_cumulative(&self) -> bool {
        self.is_cumulative.unwrap_or(false)
    }
}
