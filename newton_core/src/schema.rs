//! Versioned store file records and the migrations between them.
//!
//! - v1: exercises embedded name/category directly, no ordering, no rest time
//! - v2: templates split out, exercises carry rest time and sort order
//! - v3: routines carry sort order, logs carry cumulative flag and daily goal
//!
//! Files without a `version` field are v1.

use crate::{
    AnalyticsLog, DataStore, Error, Exercise, ExerciseSet, ExerciseTemplate, Result, Routine,
    DEFAULT_REST_SECONDS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const CURRENT_VERSION: u32 = 3;

// ============================================================================
// v1
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StoreFileV1 {
    #[serde(default)]
    pub routines: Vec<RoutineV1>,
    #[serde(default)]
    pub logs: Vec<LogV1>,
}

#[derive(Debug, Deserialize)]
pub struct RoutineV1 {
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<ExerciseV1>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseV1 {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub sets: Vec<SetV1>,
}

#[derive(Debug, Deserialize)]
pub struct SetV1 {
    pub weight: f64,
    pub reps: u32,
}

#[derive(Debug, Deserialize)]
pub struct LogV1 {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// v2
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StoreFileV2 {
    #[serde(default)]
    pub routines: Vec<RoutineV2>,
    #[serde(default)]
    pub templates: Vec<ExerciseTemplate>,
    #[serde(default)]
    pub logs: Vec<LogV2>,
}

#[derive(Debug, Deserialize)]
pub struct RoutineV2 {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Deserialize)]
pub struct LogV2 {
    pub id: Uuid,
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub unit: Option<String>,
}

// ============================================================================
// v3 (current)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreFileV3 {
    pub version: u32,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub templates: Vec<ExerciseTemplate>,
    #[serde(default)]
    pub logs: Vec<AnalyticsLog>,
}

impl From<&DataStore> for StoreFileV3 {
    fn from(store: &DataStore) -> Self {
        StoreFileV3 {
            version: CURRENT_VERSION,
            routines: store.routines.clone(),
            templates: store.templates.clone(),
            logs: store.logs.clone(),
        }
    }
}

impl From<StoreFileV3> for DataStore {
    fn from(file: StoreFileV3) -> Self {
        DataStore::from_parts(file.routines, file.templates, file.logs)
    }
}

// ============================================================================
// Migrations
// ============================================================================

/// Split embedded exercises into shared templates
pub fn migrate_v1_to_v2(v1: StoreFileV1) -> StoreFileV2 {
    let mut templates: Vec<ExerciseTemplate> = Vec::new();
    let mut by_name: HashMap<String, Uuid> = HashMap::new();

    let routines = v1
        .routines
        .into_iter()
        .map(|routine| {
            let exercises = routine
                .exercises
                .into_iter()
                .enumerate()
                .map(|(idx, exercise)| {
                    let template_id = *by_name.entry(exercise.name.clone()).or_insert_with(|| {
                        let template = ExerciseTemplate::new(&exercise.name, &exercise.category);
                        let id = template.id;
                        templates.push(template);
                        id
                    });

                    let sets = exercise
                        .sets
                        .into_iter()
                        .enumerate()
                        .map(|(set_idx, set)| ExerciseSet {
                            id: Uuid::new_v4(),
                            weight: set.weight,
                            reps: set.reps,
                            sort_order: set_idx as u32,
                        })
                        .collect();

                    Exercise {
                        id: Uuid::new_v4(),
                        template_id,
                        sets,
                        rest_time: DEFAULT_REST_SECONDS,
                        sort_order: idx as u32,
                    }
                })
                .collect();

            RoutineV2 {
                id: Uuid::new_v4(),
                name: routine.name,
                created_at: routine.created_at,
                exercises,
            }
        })
        .collect();

    let logs = v1
        .logs
        .into_iter()
        .map(|log| LogV2 {
            id: Uuid::new_v4(),
            name: log.name,
            value: log.value,
            timestamp: log.timestamp,
            unit: None,
        })
        .collect();

    tracing::info!("Migrated store file v1 -> v2 ({} templates)", templates.len());

    StoreFileV2 {
        routines,
        templates,
        logs,
    }
}

/// Give routines an explicit order (by creation time) and extend logs
pub fn migrate_v2_to_v3(v2: StoreFileV2) -> StoreFileV3 {
    let mut routines = v2.routines;
    routines.sort_by_key(|r| r.created_at);

    let routines = routines
        .into_iter()
        .enumerate()
        .map(|(idx, routine)| Routine {
            id: routine.id,
            name: routine.name,
            exercises: routine.exercises,
            created_at: routine.created_at,
            sort_order: idx as u32,
        })
        .collect();

    let logs = v2
        .logs
        .into_iter()
        .map(|log| AnalyticsLog {
            id: log.id,
            name: log.name,
            value: log.value,
            timestamp: log.timestamp,
            unit: log.unit,
            is_cumulative: None,
            daily_goal: None,
        })
        .collect();

    tracing::info!("Migrated store file v2 -> v3");

    StoreFileV3 {
        version: CURRENT_VERSION,
        routines,
        templates: v2.templates,
        logs,
    }
}

/// Decode a store file of any known version into the current model
pub fn decode(contents: &str) -> Result<DataStore> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    // Files written before versioning carry no version key
    let version = match value.get("version") {
        None => 1,
        Some(v) => v.as_u64().ok_or_else(|| {
            Error::Store(format!("store file version must be an integer, found {}", v))
        })?,
    };

    let current = match version {
        1 => migrate_v2_to_v3(migrate_v1_to_v2(serde_json::from_value(value)?)),
        2 => migrate_v2_to_v3(serde_json::from_value(value)?),
        3 => serde_json::from_value(value)?,
        other if other > u64::from(CURRENT_VERSION) => {
            return Err(Error::Store(format!(
                "store file version {} is newer than supported version {}",
                other, CURRENT_VERSION
            )))
        }
        other => return Err(Error::Store(format!("unknown store file version {}", other))),
    };

    Ok(current.into())
}

/// Encode the store as the current file version
pub fn encode(store: &DataStore) -> Result<String> {
    Ok(serde_json::to_string(&StoreFileV3::from(store))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::is_contiguous;

    const V1_FILE: &str = r#"{
        "routines": [
            {
                "name": "Pull Day",
                "created_at": "2024-11-08T10:00:00Z",
                "exercises": [
                    {"name": "Row", "category": "Back", "sets": [{"weight": 95.0, "reps": 8}, {"weight": 105.0, "reps": 6}]},
                    {"name": "Curl", "category": "Arms"}
                ]
            },
            {
                "name": "Push Day",
                "created_at": "2024-11-07T10:00:00Z",
                "exercises": [
                    {"name": "Bench Press", "category": "Chest", "sets": [{"weight": 135.0, "reps": 5}]},
                    {"name": "Curl", "category": "Arms"}
                ]
            }
        ],
        "logs": [{"name": "Bodyweight", "value": 180.5, "timestamp": "2024-11-07T08:00:00Z"}]
    }"#;

    #[test]
    fn test_decode_v1_migrates_to_current() {
        let store = decode(V1_FILE).unwrap();

        // Shared templates deduplicated by name
        assert_eq!(store.templates().len(), 3);

        // Routines ordered by creation time
        let routines = store.routines();
        assert_eq!(routines[0].name, "Push Day");
        assert_eq!(routines[1].name, "Pull Day");
        assert!(is_contiguous(&store.routines));

        let pull = routines[1];
        assert_eq!(pull.exercises.len(), 2);
        assert_eq!(store.exercise_name(&pull.exercises[0]), "Row");
        assert_eq!(pull.exercises[0].rest_time, DEFAULT_REST_SECONDS);
        assert_eq!(pull.exercises[0].sets[1].weight, 105.0);
        assert_eq!(pull.exercises[0].sets[1].sort_order, 1);

        // Both routines reference the same Curl template
        let curl = store.template_by_name("Curl").unwrap().id;
        assert_eq!(store.template_usage(curl), 2);

        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].unit, None);
        assert_eq!(logs[0].is_cumulative, None);
    }

    #[test]
    fn test_decode_v2() {
        let template_id = Uuid::new_v4();
        let contents = format!(
            r#"{{
                "version": 2,
                "routines": [{{
                    "id": "{routine}",
                    "name": "Legs",
                    "created_at": "2024-11-07T10:00:00Z",
                    "exercises": [{{
                        "id": "{exercise}",
                        "template_id": "{template_id}",
                        "sets": [],
                        "rest_time": 120,
                        "sort_order": 0
                    }}]
                }}],
                "templates": [{{"id": "{template_id}", "name": "Squat", "category": "Legs"}}],
                "logs": [{{"id": "{log}", "name": "Water", "value": 2.0, "timestamp": "2024-11-07T08:00:00Z", "unit": "L"}}]
            }}"#,
            routine = Uuid::new_v4(),
            exercise = Uuid::new_v4(),
            template_id = template_id,
            log = Uuid::new_v4(),
        );

        let store = decode(&contents).unwrap();
        let legs = store.routine_by_name("Legs").unwrap();
        assert_eq!(legs.sort_order, 0);
        assert_eq!(legs.exercises[0].rest_time, 120);
        assert_eq!(store.exercise_name(&legs.exercises[0]), "Squat");
        assert_eq!(store.logs()[0].unit.as_deref(), Some("L"));
    }

    #[test]
    fn test_encode_decode_current() {
        let mut store = DataStore::new();
        let routine = store.add_routine("Legs", Utc::now());
        let squat = store.add_template("Squat", "Legs").unwrap();
        let exercise = store.add_exercise(routine, squat, 120).unwrap();
        store.add_set(exercise, 135.0, 5).unwrap();
        store.add_log(AnalyticsLog::new("Water", 0.5, Utc::now()).cumulative(Some(3.0)));

        let encoded = encode(&store).unwrap();
        assert!(encoded.contains("\"version\":3"));

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, store);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = decode(r#"{"version": 99, "routines": []}"#);
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_version_zero_rejected_as_unknown() {
        match decode(r#"{"version": 0, "routines": []}"#) {
            Err(Error::Store(msg)) => {
                assert!(msg.contains("unknown store file version 0"));
                assert!(!msg.contains("newer"));
            }
            other => panic!("expected store error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_integer_version_rejected() {
        for version in [r#""3""#, "2.5", "-1", "null"] {
            let contents = format!(r#"{{"version": {}, "routines": []}}"#, version);
            match decode(&contents) {
                Err(Error::Store(msg)) => assert!(msg.contains("must be an integer"), "{}", msg),
                other => panic!("{}: expected store error, got {:?}", version, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_missing_version_reads_as_v1() {
        let store = decode(r#"{"routines": [{"name": "Legs", "created_at": "2024-11-07T09:00:00Z"}]}"#).unwrap();
        assert_eq!(store.routines().len(), 1);
    }
}
