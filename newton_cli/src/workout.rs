//! Interactive workout session driven from stdin.

use newton_core::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

const DEFAULT_EXTEND_SECONDS: u32 = 30;

enum Intent {
    Done { exercise: usize, set: usize },
    Undo { exercise: usize, set: usize },
    Skip,
    Extend(u32),
    Status,
    End,
    Help,
}

fn parse_intent(line: &str) -> std::result::Result<Intent, String> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("").to_lowercase();
    let numbers: Vec<&str> = parts.collect();

    let position = |i: usize, what: &str| -> std::result::Result<usize, String> {
        numbers
            .get(i)
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("expected a {} number", what))
    };

    match command.as_str() {
        "done" | "d" => Ok(Intent::Done {
            exercise: position(0, "exercise")?,
            set: position(1, "set")?,
        }),
        "undo" | "u" => Ok(Intent::Undo {
            exercise: position(0, "exercise")?,
            set: position(1, "set")?,
        }),
        "skip" | "s" => Ok(Intent::Skip),
        "extend" | "e" => match numbers.first() {
            Some(n) => n
                .parse()
                .map(Intent::Extend)
                .map_err(|_| format!("'{}' is not a number of seconds", n)),
            None => Ok(Intent::Extend(DEFAULT_EXTEND_SECONDS)),
        },
        "status" | "" => Ok(Intent::Status),
        "end" | "quit" | "q" => Ok(Intent::End),
        "help" | "?" => Ok(Intent::Help),
        other => Err(format!("unknown command '{}' (try 'help')", other)),
    }
}

/// Run a workout for `routine_id` until `end` or end of input
pub fn run(config: &Config, store: DataStore, routine_id: Uuid) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_session(config, store, routine_id))
}

async fn run_session(config: &Config, store: DataStore, routine_id: Uuid) -> Result<()> {
    let routine = store
        .routine(routine_id)
        .ok_or_else(|| Error::NotFound(format!("routine {}", routine_id)))?;

    let manager = SessionManager::new(
        Box::new(SystemClock),
        Box::new(LoggingLiveStatus::default()),
    )
    .with_renew_interval(config.session.background_renew_seconds);
    let handle = SessionHandle::new(manager);
    handle.start_workout(routine);

    println!("Started {}", routine.name);
    print_status(&store, &handle, config.units.weight);
    println!("Type 'help' for commands.");

    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = snapshots.borrow_and_update().clone();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("Input closed, ending workout");
                    break;
                };
                match parse_intent(&line) {
                    Ok(Intent::End) => break,
                    Ok(intent) => apply(&store, &handle, intent, config.units.weight)?,
                    Err(message) => println!("{}", message),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = snapshots.borrow_and_update().clone();
                report_countdown(&last, &current);
                last = current;
            }
        }
    }

    handle.end_workout();
    println!("Workout ended.");
    Ok(())
}

fn apply(store: &DataStore, handle: &SessionHandle, intent: Intent, unit: WeightUnit) -> Result<()> {
    match intent {
        Intent::Done { exercise, set } | Intent::Undo { exercise, set } => {
            let completed = matches!(intent, Intent::Done { .. });
            let Some(exercise_id) = exercise_at(store, handle, exercise) else {
                println!("No exercise {}", exercise);
                return Ok(());
            };
            handle.handle_set_completion(store, exercise_id, set - 1, completed);

            let snapshot = handle.snapshot();
            if !completed {
                println!("Set {} of exercise {} unchecked", set, exercise);
            } else if snapshot.phase == SessionPhase::Resting
                && snapshot.active_set.is_some_and(|k| k.exercise_id == exercise_id)
            {
                println!(
                    "Rest {} ({})",
                    format_clock(snapshot.remaining_seconds),
                    snapshot.active_label.unwrap_or_default()
                );
            } else if handle.is_completed(exercise_id, set - 1) {
                println!("Set {} of exercise {} done", set, exercise);
            }
        }
        Intent::Skip => {
            if handle.snapshot().phase == SessionPhase::Resting {
                handle.skip_current_period();
                println!("Rest skipped");
            } else {
                println!("No rest running");
            }
        }
        Intent::Extend(seconds) => {
            handle.extend_current_period(seconds);
            let snapshot = handle.snapshot();
            if snapshot.phase == SessionPhase::Resting {
                println!("Rest {}", format_clock(snapshot.remaining_seconds));
            } else {
                println!("No rest running");
            }
        }
        Intent::Status => print_status(store, handle, unit),
        Intent::Help => {
            println!("  done <exercise> <set>   mark a set complete");
            println!("  undo <exercise> <set>   unmark a set");
            println!("  skip                    end the current rest");
            println!("  extend [seconds]        add time to the current rest");
            println!("  status                  show progress");
            println!("  end                     finish the workout");
        }
        Intent::End => {}
    }
    Ok(())
}

fn exercise_at(store: &DataStore, handle: &SessionHandle, position: usize) -> Option<Uuid> {
    let routine = store.routine(handle.snapshot().routine_id?)?;
    ordering::sorted(&routine.exercises)
        .get(position.checked_sub(1)?)
        .map(|e| e.id)
}

fn print_status(store: &DataStore, handle: &SessionHandle, unit: WeightUnit) {
    let snapshot = handle.snapshot();
    let Some(routine) = snapshot.routine_id.and_then(|id| store.routine(id)) else {
        println!("No workout in progress");
        return;
    };

    for (i, exercise) in ordering::sorted(&routine.exercises).iter().enumerate() {
        println!("{}. {}", i + 1, store.exercise_name(exercise));
        for (j, set) in ordering::sorted(&exercise.sets).iter().enumerate() {
            let mark = if handle.is_completed(exercise.id, j) { "x" } else { " " };
            println!("   [{}] {}) {}{} x {}", mark, j + 1, set.weight, unit.label(), set.reps);
        }
    }

    if snapshot.phase == SessionPhase::Resting {
        println!(
            "Resting: {} remaining ({})",
            format_clock(snapshot.remaining_seconds),
            snapshot.active_label.unwrap_or_default()
        );
    }
}

/// Print countdown milestones and the end of a rest period
fn report_countdown(last: &SessionSnapshot, current: &SessionSnapshot) {
    match (last.phase, current.phase) {
        (SessionPhase::Resting, SessionPhase::WorkoutActive) if last.remaining_seconds <= 1 => {
            println!("Rest complete");
        }
        (_, SessionPhase::Resting) if current.remaining_seconds != last.remaining_seconds => {
            let secs = current.remaining_seconds;
            if secs <= 5 || secs % 15 == 0 {
                println!("  {}", format_clock(secs));
            }
        }
        _ => {}
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intents() {
        assert!(matches!(
            parse_intent("done 2 3"),
            Ok(Intent::Done { exercise: 2, set: 3 })
        ));
        assert!(matches!(parse_intent("extend"), Ok(Intent::Extend(30))));
        assert!(matches!(parse_intent("e 45"), Ok(Intent::Extend(45))));
        assert!(matches!(parse_intent(""), Ok(Intent::Status)));
        assert!(parse_intent("done 0 1").is_err());
        assert!(parse_intent("done 1").is_err());
        assert!(parse_intent("jump").is_err());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(5), "0:05");
    }
}
