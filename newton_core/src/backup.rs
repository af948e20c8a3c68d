//! JSON backup export and import.
//!
//! The backup document is a self-contained snapshot of routines (with their
//! exercises and sets), exercise templates and analytics logs. Import merges
//! a document into an existing store by natural key:
//! - templates by name (first writer wins, fields are never merged)
//! - routines by exact name
//! - logs by name plus exact timestamp

use crate::{ordering, AnalyticsLog, DataStore, Error, Exercise, ExerciseSet, Result, Routine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Document format
// ============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub routines: Vec<RoutineRecord>,
    pub exercise_templates: Vec<TemplateRecord>,
    pub analytics_logs: Vec<LogRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub template: TemplateRecord,
    pub sets: Vec<SetRecord>,
    pub rest_time: u32,
    pub sort_order: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub sort_order: u32,
    pub weight: f64,
    pub reps: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TemplateRecord {
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cumulative: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<f64>,
}

impl BackupDocument {
    /// Decode a document, mapping any parse failure to a readable message
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| {
            Error::Decode(format!(
                "the file is not a valid backup ({} at line {}, column {})",
                describe(&e),
                e.line(),
                e.column()
            ))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn describe(e: &serde_json::Error) -> String {
    use serde_json::error::Category;
    match e.classify() {
        Category::Syntax => "malformed JSON".to_string(),
        Category::Eof => "unexpected end of file".to_string(),
        Category::Data => e.to_string().split(" at line").next().unwrap_or("").to_string(),
        Category::Io => "read error".to_string(),
    }
}

// ============================================================================
// Export
// ============================================================================

/// Snapshot the whole store
pub fn export(store: &DataStore) -> BackupDocument {
    let routines = store
        .routines()
        .into_iter()
        .map(|routine| RoutineRecord {
            name: routine.name.clone(),
            created_at: routine.created_at,
            exercises: ordering::sorted(&routine.exercises)
                .into_iter()
                .map(|exercise| export_exercise(store, exercise))
                .collect(),
        })
        .collect();

    let exercise_templates = store
        .templates()
        .into_iter()
        .map(|t| TemplateRecord {
            name: t.name.clone(),
            category: t.category.clone(),
        })
        .collect();

    let analytics_logs = store
        .logs()
        .into_iter()
        .map(|log| LogRecord {
            name: log.name.clone(),
            value: log.value,
            unit: log.unit.clone(),
            timestamp: log.timestamp,
            is_cumulative: log.is_cumulative,
            daily_goal: log.daily_goal,
        })
        .collect();

    BackupDocument {
        routines,
        exercise_templates,
        analytics_logs,
    }
}

fn export_exercise(store: &DataStore, exercise: &Exercise) -> ExerciseRecord {
    let template = store
        .template(exercise.template_id)
        .map(|t| TemplateRecord {
            name: t.name.clone(),
            category: t.category.clone(),
        })
        .unwrap_or_else(|| {
            tracing::warn!("Exercise {} references a missing template", exercise.id);
            TemplateRecord {
                name: store.exercise_name(exercise).to_string(),
                category: "Other".to_string(),
            }
        });

    ExerciseRecord {
        template,
        sets: ordering::sorted(&exercise.sets)
            .into_iter()
            .map(|set| SetRecord {
                sort_order: set.sort_order,
                weight: set.weight,
                reps: set.reps,
            })
            .collect(),
        rest_time: exercise.rest_time,
        sort_order: exercise.sort_order,
    }
}

/// Backup file name embedding an ISO-8601 (basic format) timestamp
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("fitness_data_{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

/// Write an export of `store` into `dir`, returning the file path
pub fn export_to_dir(store: &DataStore, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(at));
    let contents = export(store).to_json()?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(&path).map_err(|e| e.error)?;

    tracing::info!("Exported backup to {:?}", path);
    Ok(path)
}

// ============================================================================
// Import
// ============================================================================

/// Counts of what an import inserted and what it skipped as duplicates
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub routines_added: usize,
    pub routines_skipped: usize,
    pub templates_added: usize,
    pub templates_skipped: usize,
    pub logs_added: usize,
    pub logs_skipped: usize,
}

impl ImportReport {
    pub fn added(&self) -> usize {
        self.routines_added + self.templates_added + self.logs_added
    }

    /// Single user-facing completion message
    pub fn message(&self) -> String {
        format!(
            "Import complete: {} routines, {} exercise templates, {} log entries added",
            self.routines_added, self.templates_added, self.logs_added
        )
    }
}

/// Merge a decoded document into the store
pub fn import(store: &mut DataStore, doc: &BackupDocument) -> ImportReport {
    let mut report = ImportReport::default();
    // Templates created during this pass, by name
    let mut inserted: HashMap<String, Uuid> = HashMap::new();

    for template in &doc.exercise_templates {
        if store.template_by_name(&template.name).is_some() {
            report.templates_skipped += 1;
            continue;
        }
        let id = store.find_or_create_template(&template.name, &template.category);
        inserted.insert(template.name.clone(), id);
        report.templates_added += 1;
    }

    for record in &doc.routines {
        if store.routine_by_name(&record.name).is_some() {
            tracing::debug!("Skipping routine {:?}: name already exists", record.name);
            report.routines_skipped += 1;
            continue;
        }

        let mut routine = Routine::new(&record.name, record.created_at);
        let mut exercises: Vec<&ExerciseRecord> = record.exercises.iter().collect();
        exercises.sort_by_key(|e| e.sort_order);

        for exercise in exercises {
            let template_id =
                resolve_template(store, &mut inserted, &exercise.template, &mut report);

            let mut sets: Vec<&SetRecord> = exercise.sets.iter().collect();
            sets.sort_by_key(|s| s.sort_order);

            let mut imported = Exercise::new(template_id, exercise.rest_time);
            for set in sets {
                ordering::push(&mut imported.sets, ExerciseSet::new(set.weight, set.reps));
            }
            ordering::push(&mut routine.exercises, imported);
        }

        store.insert_routine(routine);
        report.routines_added += 1;
    }

    // Natural key of every log, updated as entries are inserted
    let mut seen: HashMap<String, HashSet<DateTime<Utc>>> = HashMap::new();
    for log in &store.logs {
        seen.entry(log.name.clone()).or_default().insert(log.timestamp);
    }

    for record in &doc.analytics_logs {
        let fresh = seen
            .entry(record.name.clone())
            .or_default()
            .insert(record.timestamp);
        if !fresh {
            report.logs_skipped += 1;
            continue;
        }

        store.add_log(AnalyticsLog {
            id: Uuid::new_v4(),
            name: record.name.clone(),
            value: record.value,
            timestamp: record.timestamp,
            unit: record.unit.clone(),
            is_cumulative: record.is_cumulative,
            daily_goal: record.daily_goal,
        });
        report.logs_added += 1;
    }

    tracing::info!("{}", report.message());
    report
}

/// This pass first, then the existing store, then create
fn resolve_template(
    store: &mut DataStore,
    inserted: &mut HashMap<String, Uuid>,
    template: &TemplateRecord,
    report: &mut ImportReport,
) -> Uuid {
    if let Some(id) = inserted.get(&template.name) {
        return *id;
    }
    if let Some(existing) = store.template_by_name(&template.name) {
        return existing.id;
    }
    let id = store.find_or_create_template(&template.name, &template.category);
    inserted.insert(template.name.clone(), id);
    report.templates_added += 1;
    id
}

/// Decode `contents` and merge it; nothing is inserted if decoding fails
pub fn import_json(store: &mut DataStore, contents: &str) -> Result<ImportReport> {
    let doc = BackupDocument::from_json(contents)?;
    Ok(import(store, &doc))
}

pub fn import_from_path(store: &mut DataStore, path: &Path) -> Result<ImportReport> {
    let contents = std::fs::read_to_string(path)?;
    import_json(store, &contents)
}
