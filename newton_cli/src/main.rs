use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use newton_core::analytics::{self, TimeRange};
use newton_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod workout;

#[derive(Parser)]
#[command(name = "newton")]
#[command(about = "Workout routines, rest timers and progress logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage routines
    #[command(subcommand)]
    Routine(RoutineCommand),

    /// Manage the exercises in a routine
    #[command(subcommand)]
    Exercise(ExerciseCommand),

    /// Manage the sets of an exercise
    #[command(subcommand)]
    Set(SetCommand),

    /// Manage exercise templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Record and review analytics logs
    #[command(subcommand)]
    Log(LogCommand),

    /// Write a JSON backup of all data
    Export {
        /// Directory for the backup file (defaults to the configured backup directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Merge a JSON backup into the current data
    Import {
        /// Backup file to read
        path: PathBuf,
    },

    /// Delete every routine, template and log
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Plates per side for a target barbell weight
    Plates {
        /// Total weight including the bar
        target: f64,

        /// Bar weight (defaults to the standard bar for the weight unit)
        #[arg(long)]
        bar: Option<f64>,

        /// Available plate sizes, comma separated
        #[arg(long, value_delimiter = ',')]
        plates: Vec<f64>,
    },

    /// Show or change preferences
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Run a workout with rest timers
    Workout {
        /// Routine name or position
        routine: String,
    },
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// List routines in order
    List,
    /// Show a routine with its exercises and sets
    Show { routine: String },
    /// Create an empty routine
    Add { name: String },
    /// Rename a routine
    Rename { routine: String, name: String },
    /// Delete a routine and everything in it
    Delete { routine: String },
    /// Move a routine to a new position
    Move { from: usize, to: usize },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Add an exercise to a routine, creating the template if needed
    Add {
        routine: String,
        template: String,
        /// Category for a newly created template
        #[arg(long)]
        category: Option<String>,
        /// Rest after each set, in seconds
        #[arg(long)]
        rest: Option<u32>,
    },
    /// Remove an exercise from a routine
    Remove { routine: String, exercise: usize },
    /// Move an exercise to a new position
    Move {
        routine: String,
        from: usize,
        to: usize,
    },
    /// Change the rest time of an exercise
    Rest {
        routine: String,
        exercise: usize,
        seconds: u32,
    },
}

#[derive(Subcommand)]
enum SetCommand {
    /// Append a set to an exercise
    Add {
        routine: String,
        exercise: usize,
        weight: f64,
        reps: u32,
    },
    /// Change the weight and reps of a set
    Update {
        routine: String,
        exercise: usize,
        set: usize,
        weight: f64,
        reps: u32,
    },
    /// Remove a set
    Remove {
        routine: String,
        exercise: usize,
        set: usize,
    },
    /// Move a set to the end of another exercise in the same routine
    Move {
        routine: String,
        exercise: usize,
        set: usize,
        to_exercise: usize,
    },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List templates by name
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a template
    Add {
        name: String,
        #[arg(long, default_value = "Other")]
        category: String,
    },
    /// Delete a template that no exercise uses
    Delete { name: String },
    /// Add the built-in templates that are missing
    Seed,
    /// List the default categories
    Categories,
}

#[derive(Subcommand)]
enum LogCommand {
    /// List log entries, oldest first
    List {
        #[arg(long, default_value = "all")]
        range: TimeRange,
        #[arg(long)]
        name: Option<String>,
    },
    /// Record a value
    Add {
        name: String,
        value: f64,
        #[arg(long)]
        unit: Option<String>,
        /// Values add up per day instead of replacing each other
        #[arg(long)]
        cumulative: bool,
        /// Daily target for a cumulative series
        #[arg(long, requires = "cumulative")]
        goal: Option<f64>,
        /// When the value was taken (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Delete the entry at a position in the list
    Delete { position: usize },
    /// Latest value and change for each series
    Summary {
        #[arg(long, default_value = "week")]
        range: TimeRange,
    },
    /// Write log entries to a CSV file
    Export {
        path: PathBuf,
        #[arg(long, default_value = "all")]
        range: TimeRange,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Change a preference (units.weight, units.distance, appearance.theme,
    /// session.default_rest_seconds)
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let mut config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        tracing::info!("No config file found at {:?}, using defaults", config_path);
        Config::default()
    };
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }

    match cli.command {
        Commands::Routine(cmd) => cmd_routine(&config, cmd),
        Commands::Exercise(cmd) => cmd_exercise(&config, cmd),
        Commands::Set(cmd) => cmd_set(&config, cmd),
        Commands::Template(cmd) => cmd_template(&config, cmd),
        Commands::Log(cmd) => cmd_log(&config, cmd),
        Commands::Export { dir } => cmd_export(&config, dir),
        Commands::Import { path } => cmd_import(&config, &path),
        Commands::DeleteAll { yes } => cmd_delete_all(&config, yes),
        Commands::Plates { target, bar, plates } => cmd_plates(&config, target, bar, plates),
        Commands::Config(cmd) => cmd_config(config, &config_path, cmd),
        Commands::Workout { routine } => {
            let sink = JsonFileSink::new(config.store_path());
            let store = sink.load()?;
            let routine_id = find_routine(&store, &routine)?;
            workout::run(&config, store, routine_id)
        }
    }
}

/// Load the store, apply `f`, and commit the result
fn with_store<T>(config: &Config, f: impl FnOnce(&mut DataStore) -> Result<T>) -> Result<T> {
    let mut sink = JsonFileSink::new(config.store_path());
    let mut store = sink.load()?;
    let out = f(&mut store)?;
    sink.commit(&store)?;
    Ok(out)
}

fn load_store(config: &Config) -> Result<DataStore> {
    JsonFileSink::new(config.store_path()).load()
}

// ============================================================================
// Lookups (positions are 1-based on the command line)
// ============================================================================

fn index(position: usize, what: &str) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| Error::NotFound(format!("{} positions start at 1", what)))
}

/// Routine by exact name, falling back to its position in the list
fn find_routine(store: &DataStore, key: &str) -> Result<Uuid> {
    if let Some(routine) = store.routine_by_name(key) {
        return Ok(routine.id);
    }
    key.parse::<usize>()
        .ok()
        .and_then(|pos| pos.checked_sub(1))
        .and_then(|i| store.routines().get(i).map(|r| r.id))
        .ok_or_else(|| Error::NotFound(format!("routine '{}'", key)))
}

fn find_exercise(store: &DataStore, routine_id: Uuid, position: usize) -> Result<Uuid> {
    let i = index(position, "exercise")?;
    let routine = store
        .routine(routine_id)
        .ok_or_else(|| Error::NotFound(format!("routine {}", routine_id)))?;
    ordering::sorted(&routine.exercises)
        .get(i)
        .map(|e| e.id)
        .ok_or_else(|| Error::NotFound(format!("exercise {} in '{}'", position, routine.name)))
}

fn find_set(store: &DataStore, exercise_id: Uuid, position: usize) -> Result<Uuid> {
    let i = index(position, "set")?;
    let (_, exercise) = store
        .exercise(exercise_id)
        .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))?;
    ordering::sorted(&exercise.sets)
        .get(i)
        .map(|s| s.id)
        .ok_or_else(|| Error::NotFound(format!("set {}", position)))
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_routine(config: &Config, cmd: RoutineCommand) -> Result<()> {
    match cmd {
        RoutineCommand::List => {
            let store = load_store(config)?;
            let routines = store.routines();
            if routines.is_empty() {
                println!("No routines yet.");
            }
            for (i, routine) in routines.iter().enumerate() {
                println!(
                    "{}. {} ({} exercises, {} sets)",
                    i + 1,
                    routine.name,
                    routine.exercises.len(),
                    routine.set_count()
                );
            }
        }
        RoutineCommand::Show { routine } => {
            let store = load_store(config)?;
            let id = find_routine(&store, &routine)?;
            if let Some(routine) = store.routine(id) {
                print_routine(&store, routine, config.units.weight);
            }
        }
        RoutineCommand::Add { name } => {
            with_store(config, |store| Ok(store.add_routine(&name, Utc::now())))?;
            println!("✓ Created routine '{}'", name);
        }
        RoutineCommand::Rename { routine, name } => {
            with_store(config, |store| {
                let id = find_routine(store, &routine)?;
                store.rename_routine(id, &name)
            })?;
            println!("✓ Renamed to '{}'", name);
        }
        RoutineCommand::Delete { routine } => {
            let removed = with_store(config, |store| {
                let id = find_routine(store, &routine)?;
                store.delete_routine(id)
            })?;
            println!("✓ Deleted routine '{}'", removed.name);
        }
        RoutineCommand::Move { from, to } => {
            let (from, to) = (index(from, "routine")?, index(to, "routine")?);
            with_store(config, |store| store.move_routine(from, to))?;
            println!("✓ Moved routine");
        }
    }
    Ok(())
}

fn print_routine(store: &DataStore, routine: &Routine, unit: WeightUnit) {
    println!("{}", routine.name);
    for (i, exercise) in ordering::sorted(&routine.exercises).iter().enumerate() {
        let category = store
            .template(exercise.template_id)
            .map(|t| t.category.as_str())
            .unwrap_or("Other");
        println!(
            "  {}. {} [{}] rest {}s",
            i + 1,
            store.exercise_name(exercise),
            category,
            exercise.rest_time
        );
        for (j, set) in ordering::sorted(&exercise.sets).iter().enumerate() {
            println!("     {}) {}{} x {}", j + 1, set.weight, unit.label(), set.reps);
        }
    }
}

fn cmd_exercise(config: &Config, cmd: ExerciseCommand) -> Result<()> {
    match cmd {
        ExerciseCommand::Add {
            routine,
            template,
            category,
            rest,
        } => {
            let rest = rest.unwrap_or(config.session.default_rest_seconds);
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let category = catalog::normalize_category(category.as_deref().unwrap_or(""));
                let template_id = store.find_or_create_template(&template, &category);
                store.add_exercise(routine_id, template_id, rest)
            })?;
            println!("✓ Added {} (rest {}s)", template, rest);
        }
        ExerciseCommand::Remove { routine, exercise } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let exercise_id = find_exercise(store, routine_id, exercise)?;
                store.remove_exercise(routine_id, exercise_id)
            })?;
            println!("✓ Removed exercise {}", exercise);
        }
        ExerciseCommand::Move { routine, from, to } => {
            let (from, to) = (index(from, "exercise")?, index(to, "exercise")?);
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                store.move_exercise(routine_id, from, to)
            })?;
            println!("✓ Moved exercise");
        }
        ExerciseCommand::Rest {
            routine,
            exercise,
            seconds,
        } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let exercise_id = find_exercise(store, routine_id, exercise)?;
                store.set_rest_time(exercise_id, seconds)
            })?;
            println!("✓ Rest time set to {}s", seconds);
        }
    }
    Ok(())
}

fn cmd_set(config: &Config, cmd: SetCommand) -> Result<()> {
    let unit = config.units.weight.label();
    match cmd {
        SetCommand::Add {
            routine,
            exercise,
            weight,
            reps,
        } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let exercise_id = find_exercise(store, routine_id, exercise)?;
                store.add_set(exercise_id, weight, reps)
            })?;
            println!("✓ Added set {}{} x {}", weight, unit, reps);
        }
        SetCommand::Update {
            routine,
            exercise,
            set,
            weight,
            reps,
        } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let exercise_id = find_exercise(store, routine_id, exercise)?;
                let set_id = find_set(store, exercise_id, set)?;
                store.update_set(exercise_id, set_id, weight, reps)
            })?;
            println!("✓ Set {} is now {}{} x {}", set, weight, unit, reps);
        }
        SetCommand::Remove {
            routine,
            exercise,
            set,
        } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let exercise_id = find_exercise(store, routine_id, exercise)?;
                let set_id = find_set(store, exercise_id, set)?;
                store.remove_set(exercise_id, set_id)
            })?;
            println!("✓ Removed set {}", set);
        }
        SetCommand::Move {
            routine,
            exercise,
            set,
            to_exercise,
        } => {
            with_store(config, |store| {
                let routine_id = find_routine(store, &routine)?;
                let from = find_exercise(store, routine_id, exercise)?;
                let to = find_exercise(store, routine_id, to_exercise)?;
                let set_id = find_set(store, from, set)?;
                store.move_set(from, set_id, to)
            })?;
            println!("✓ Moved set to exercise {}", to_exercise);
        }
    }
    Ok(())
}

fn cmd_template(config: &Config, cmd: TemplateCommand) -> Result<()> {
    match cmd {
        TemplateCommand::List { category } => {
            let store = load_store(config)?;
            for template in store.templates() {
                if category.as_deref().is_some_and(|c| c != template.category) {
                    continue;
                }
                let usage = store.template_usage(template.id);
                println!("{} [{}] used by {}", template.name, template.category, usage);
            }
        }
        TemplateCommand::Add { name, category } => {
            let category = catalog::normalize_category(&category);
            with_store(config, |store| store.add_template(&name, &category))?;
            println!("✓ Created template '{}' [{}]", name, category);
        }
        TemplateCommand::Delete { name } => {
            with_store(config, |store| {
                let id = store
                    .template_by_name(&name)
                    .map(|t| t.id)
                    .ok_or_else(|| Error::NotFound(format!("template '{}'", name)))?;
                store.delete_template(id)
            })?;
            println!("✓ Deleted template '{}'", name);
        }
        TemplateCommand::Seed => {
            let added = with_store(config, |store| Ok(catalog::seed_default_templates(store)))?;
            println!("✓ Added {} built-in templates", added);
        }
        TemplateCommand::Categories => {
            for category in catalog::DEFAULT_CATEGORIES {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

fn format_value(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{:.1} {}", value, unit),
        None => format!("{:.1}", value),
    }
}

fn cmd_log(config: &Config, cmd: LogCommand) -> Result<()> {
    let now = Utc::now();
    match cmd {
        LogCommand::List { range, name } => {
            let store = load_store(config)?;
            let logs = store.logs();
            for (i, log) in logs.iter().enumerate() {
                if !range.contains(now, log.timestamp)
                    || name.as_deref().is_some_and(|n| n != log.name)
                {
                    continue;
                }
                println!(
                    "{}. {}  {}  {}",
                    i + 1,
                    log.timestamp.format("%Y-%m-%d %H:%M"),
                    log.name,
                    format_value(log.value, log.unit.as_deref())
                );
            }
        }
        LogCommand::Add {
            name,
            value,
            unit,
            cumulative,
            goal,
            at,
        } => {
            let mut log = AnalyticsLog::new(&name, value, at.unwrap_or(now));
            if let Some(unit) = unit {
                log = log.with_unit(unit);
            }
            if cumulative {
                log = log.cumulative(goal);
            }
            with_store(config, |store| Ok(store.add_log(log)))?;
            println!("✓ Logged {} = {}", name, value);
        }
        LogCommand::Delete { position } => {
            let i = index(position, "log")?;
            let removed = with_store(config, |store| {
                let id = store
                    .logs()
                    .get(i)
                    .map(|l| l.id)
                    .ok_or_else(|| Error::NotFound(format!("log entry {}", position)))?;
                store.delete_log(id)
            })?;
            println!("✓ Deleted {} entry", removed.name);
        }
        LogCommand::Summary { range } => {
            let store = load_store(config)?;
            let logs = analytics::filter_logs(&store.logs(), range, now);
            if logs.is_empty() {
                println!("No entries in this range.");
            }
            for name in analytics::unique_names(&logs) {
                let Some(summary) = analytics::summarize(&logs, &name) else {
                    continue;
                };
                let mut line = format!(
                    "{}: latest {}",
                    name,
                    format_value(summary.latest, summary.unit.as_deref())
                );
                if let Some(change) = summary.change {
                    let arrow = if change >= 0.0 { "↑" } else { "↓" };
                    line.push_str(&format!(" ({}{:.1})", arrow, change.abs()));
                }
                println!("{}", line);

                if let Some(today) = analytics::daily_totals(&logs, &name)
                    .into_iter()
                    .find(|d| d.date == now.date_naive())
                {
                    match today.goal {
                        Some(goal) => println!("  today: {:.1} of {:.1}", today.total, goal),
                        None => println!("  today: {:.1}", today.total),
                    }
                }
            }
        }
        LogCommand::Export { path, range } => {
            let store = load_store(config)?;
            let logs = analytics::filter_logs(&store.logs(), range, now);
            let count = csv_export::export_logs(&path, &logs)?;
            println!("✓ Wrote {} entries to {}", count, path.display());
        }
    }
    Ok(())
}

fn cmd_export(config: &Config, dir: Option<PathBuf>) -> Result<()> {
    let store = load_store(config)?;
    let dir = dir.unwrap_or_else(|| config.backup_dir());
    let path = backup::export_to_dir(&store, &dir, Utc::now())?;
    println!("✓ Exported backup to {}", path.display());
    Ok(())
}

fn cmd_import(config: &Config, path: &Path) -> Result<()> {
    let report = with_store(config, |store| backup::import_from_path(store, path))?;
    println!("✓ {}", report.message());
    let skipped = report.routines_skipped + report.templates_skipped + report.logs_skipped;
    if skipped > 0 {
        println!("  {} records already present were skipped", skipped);
    }
    Ok(())
}

fn cmd_delete_all(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        print!("Delete all routines, templates and logs? Type 'yes' to confirm: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim() != "yes" {
            println!("Aborted.");
            return Ok(());
        }
    }

    with_store(config, |store| {
        store.delete_all();
        Ok(())
    })?;
    println!("✓ All data deleted");
    Ok(())
}

fn cmd_plates(config: &Config, target: f64, bar: Option<f64>, plates: Vec<f64>) -> Result<()> {
    let unit = config.units.weight;
    let bar = bar.unwrap_or_else(|| unit.default_bar());
    let available = if plates.is_empty() {
        unit.default_plates().to_vec()
    } else {
        plates
    };

    let result = calculate_plates(target, bar, &available);
    if result.is_empty() {
        println!("No plates needed or weight not achievable");
        return Ok(());
    }

    println!("Per side:");
    for plate in &result {
        println!("  {}x {}{}", plate.count, plate.weight, unit.label());
    }
    Ok(())
}

fn cmd_config(mut config: Config, path: &Path, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Set { key, value } => {
            match key.as_str() {
                "units.weight" => config.units.weight = value.parse()?,
                "units.distance" => config.units.distance = value.parse()?,
                "appearance.theme" => config.appearance.theme = value.parse()?,
                "session.default_rest_seconds" => {
                    config.session.default_rest_seconds = value
                        .parse()
                        .map_err(|_| Error::Config(format!("'{}' is not a number of seconds", value)))?
                }
                other => return Err(Error::Config(format!("Unknown setting '{}'", other))),
            }
            config.save_to(path)?;
            println!("✓ {} = {}", key, value);
        }
    }
    Ok(())
}

