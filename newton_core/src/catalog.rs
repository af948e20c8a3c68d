//! Built-in exercise categories and templates.

use crate::DataStore;
use once_cell::sync::Lazy;

/// Categories offered when creating a template
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Chest", "Back", "Legs", "Shoulders", "Arms", "Core", "Cardio", "Other",
];

/// A built-in template definition
#[derive(Clone, Debug)]
pub struct TemplateSeed {
    pub name: &'static str,
    pub category: &'static str,
}

/// Cached default templates, built once
static DEFAULT_TEMPLATES: Lazy<Vec<TemplateSeed>> = Lazy::new(build_default_templates);

/// Get a reference to the built-in templates
pub fn default_templates() -> &'static [TemplateSeed] {
    &DEFAULT_TEMPLATES
}

fn build_default_templates() -> Vec<TemplateSeed> {
    let seeds: &[(&'static str, &'static str)] = &[
        // Chest
        ("Bench Press", "Chest"),
        ("Incline Dumbbell Press", "Chest"),
        ("Dips", "Chest"),
        // Back
        ("Deadlift", "Back"),
        ("Barbell Row", "Back"),
        ("Pull-up", "Back"),
        ("Lat Pulldown", "Back"),
        // Legs
        ("Squat", "Legs"),
        ("Romanian Deadlift", "Legs"),
        ("Leg Press", "Legs"),
        ("Walking Lunge", "Legs"),
        // Shoulders
        ("Overhead Press", "Shoulders"),
        ("Lateral Raise", "Shoulders"),
        // Arms
        ("Barbell Curl", "Arms"),
        ("Triceps Pushdown", "Arms"),
        // Core
        ("Plank", "Core"),
        ("Hanging Leg Raise", "Core"),
        // Cardio
        ("Rowing Machine", "Cardio"),
        ("Running", "Cardio"),
    ];

    seeds
        .iter()
        .map(|&(name, category)| TemplateSeed { name, category })
        .collect()
}

/// Match a user-entered category against the defaults, case-insensitively
///
/// Unknown categories are kept as entered.
pub fn normalize_category(input: &str) -> String {
    let trimmed = input.trim();
    DEFAULT_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(trimmed))
        .map(|c| c.to_string())
        .unwrap_or_else(|| {
            if trimmed.is_empty() {
                "Other".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

/// Insert any built-in templates whose names are not already taken
///
/// Returns the number of templates added.
pub fn seed_default_templates(store: &mut DataStore) -> usize {
    let mut added = 0;
    for seed in default_templates() {
        if store.template_by_name(seed.name).is_none() {
            store.find_or_create_template(seed.name, seed.category);
            added += 1;
        }
    }
    tracing::info!("Seeded {} default exercise templates", added);
    added
}
