use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use repset_core::generation::{build_prompt, TextResponse};
use repset_core::config::GenerationConfig;
use repset_core::*;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "repset")]
#[command(about = "Strength workout builder and session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved workouts
    #[command(subcommand)]
    Workout(WorkoutCommand),

    /// Print the instructions that would be sent to the generation service
    Prompt {
        /// What kind of workout to build
        request: String,

        /// Restrict to this equipment (defaults to the equipment in preferences)
        #[arg(long = "equipment", short = 'e')]
        equipment: Vec<String>,
    },

    /// Parse generated exercise text into workout entries
    Suggest {
        /// Read the text from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Save the parsed exercises as a new workout
        #[arg(long)]
        save_as: Option<String>,
    },

    /// Perform a saved workout
    Start {
        /// Workout id, id prefix, or name
        workout: String,

        /// Auto-complete (for testing) - mark every set done and finish each exercise
        #[arg(long, conflicts_with = "auto_skip")]
        auto_complete: bool,

        /// Auto-skip (for testing) - skip every exercise
        #[arg(long, conflicts_with = "auto_complete")]
        auto_skip: bool,
    },

    /// Browse or export workout history
    #[command(subcommand)]
    History(HistoryCommand),

    /// View or change preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// List saved workouts
    List,

    /// Show a workout's exercises
    Show { workout: String },

    /// Create a workout from exercise specs
    Create {
        name: String,

        /// Exercise as name:reps:sets, with an optional :bw suffix for bodyweight
        #[arg(long = "exercise", short = 'e', required = true)]
        exercises: Vec<String>,
    },

    /// Rename a workout or replace its exercises
    Edit {
        workout: String,

        #[arg(long)]
        name: Option<String>,

        /// Replacement exercises as name:reps:sets[:bw]; omit to keep the current ones
        #[arg(long = "exercise", short = 'e')]
        exercises: Vec<String>,
    },

    /// Delete a workout
    Delete { workout: String },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List completed sessions, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Append history to a CSV file
    Export { csv: PathBuf },
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Show all preferences
    Show,

    /// Set the reps and sets used when a suggestion omits them
    Defaults(DefaultsArgs),

    /// Toggle dark mode
    DarkMode,

    /// Manage owned equipment
    #[command(subcommand)]
    Equipment(EquipmentCommand),

    /// Manage personal records
    #[command(subcommand)]
    Pr(PrCommand),
}

#[derive(Args)]
struct DefaultsArgs {
    #[arg(long)]
    reps: Option<u32>,

    #[arg(long)]
    sets: Option<u32>,
}

#[derive(Subcommand)]
enum EquipmentCommand {
    Add { name: String },
    Remove { name: String },
}

#[derive(Subcommand)]
enum PrCommand {
    Add {
        exercise: String,
        weight: f64,
        reps: u32,
    },
    /// Change a record by id or unique id prefix
    Edit {
        id: String,

        #[arg(long)]
        exercise: Option<String>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        reps: Option<u32>,
    },
    /// Remove by id or unique id prefix
    Remove { id: String },
}

fn main() {
    // Keep interactive output clean unless RUST_LOG asks for more
    repset_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Workout(cmd) => cmd_workout(&paths, cmd),
        Commands::Prompt { request, equipment } => {
            cmd_prompt(&paths, &config.generation, &request, equipment)
        }
        Commands::Suggest { file, save_as } => cmd_suggest(&paths, file.as_deref(), save_as),
        Commands::Start {
            workout,
            auto_complete,
            auto_skip,
        } => {
            let mode = if auto_complete {
                SessionMode::AutoComplete
            } else if auto_skip {
                SessionMode::AutoSkip
            } else {
                SessionMode::Interactive
            };
            cmd_start(&paths, &workout, mode)
        }
        Commands::History(cmd) => cmd_history(&paths, cmd),
        Commands::Prefs(cmd) => cmd_prefs(&paths, cmd),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn cmd_workout(paths: &DataPaths, cmd: WorkoutCommand) -> Result<()> {
    match cmd {
        WorkoutCommand::List => {
            let library = WorkoutLibrary::load(&paths.workouts)?;
            if library.workouts.is_empty() {
                println!("No workouts saved yet.");
                return Ok(());
            }
            for workout in &library.workouts {
                println!(
                    "{}  {}  ({} exercises)",
                    short_id(&workout.id),
                    workout.name,
                    workout.exercises.len()
                );
            }
        }

        WorkoutCommand::Show { workout } => {
            let library = WorkoutLibrary::load(&paths.workouts)?;
            let workout = library.find(&workout)?;
            println!("{} ({})", workout.name, workout.id);
            for (i, exercise) in workout.exercises.iter().enumerate() {
                print_exercise_line(i + 1, exercise);
            }
        }

        WorkoutCommand::Create { name, exercises } => {
            let exercises = exercises
                .iter()
                .map(|spec| parse_exercise_spec(spec))
                .collect::<Result<Vec<_>>>()?;
            let (_, workout) =
                WorkoutLibrary::update(&paths.workouts, |lib| lib.add(&name, exercises))?;
            println!(
                "✓ Created workout '{}' ({})",
                workout.name,
                short_id(&workout.id)
            );
        }

        WorkoutCommand::Edit {
            workout,
            name,
            exercises,
        } => {
            let exercises = exercises
                .iter()
                .map(|spec| parse_exercise_spec(spec))
                .collect::<Result<Vec<_>>>()?;
            let (_, updated) = WorkoutLibrary::update(&paths.workouts, |lib| {
                let current = lib.find(&workout)?.clone();
                let name = name.unwrap_or(current.name);
                let exercises = if exercises.is_empty() {
                    current.exercises
                } else {
                    exercises
                };
                lib.update_workout(current.id, &name, exercises).cloned()
            })?;
            println!(
                "✓ Updated workout '{}' ({} exercises)",
                updated.name,
                updated.exercises.len()
            );
        }

        WorkoutCommand::Delete { workout } => {
            let (_, name) = WorkoutLibrary::update(&paths.workouts, |lib| {
                let found = lib.find(&workout)?;
                let (id, name) = (found.id, found.name.clone());
                lib.remove(id);
                Ok(name)
            })?;
            println!("✓ Deleted workout '{}'", name);
        }
    }

    Ok(())
}

fn print_exercise_line(position: usize, exercise: &Exercise) {
    let marker = if exercise.is_bodyweight {
        " [bodyweight]"
    } else {
        ""
    };
    println!(
        "  {}. {} - {} reps, {} sets{}",
        position, exercise.name, exercise.reps, exercise.sets, marker
    );
}

fn cmd_prompt(
    paths: &DataPaths,
    generation: &GenerationConfig,
    request: &str,
    equipment: Vec<String>,
) -> Result<()> {
    if request.trim().is_empty() {
        return Err(Error::Validation("request cannot be empty".into()));
    }

    let equipment = if equipment.is_empty() {
        Preferences::load(&paths.preferences)?.equipment
    } else {
        equipment
    };

    println!(
        "Model: {} (timeout {}s)",
        generation.model, generation.timeout_seconds
    );
    println!(
        "API key: ${} ({})",
        generation.api_key_env,
        if generation.api_key_present() { "set" } else { "not set" }
    );
    println!();
    println!("{}", build_prompt(request, &equipment));
    Ok(())
}

fn cmd_suggest(paths: &DataPaths, file: Option<&Path>, save_as: Option<String>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let prefs = Preferences::load(&paths.preferences)?;
    let service = TextResponse::new(text);
    let exercises = suggest_exercises(&service, "", &prefs.equipment, prefs.defaults())?;

    if exercises.is_empty() {
        println!("No usable exercises found");
        return Ok(());
    }

    for (i, exercise) in exercises.iter().enumerate() {
        print_exercise_line(i + 1, exercise);
    }

    if let Some(name) = save_as {
        let (_, workout) =
            WorkoutLibrary::update(&paths.workouts, |lib| lib.add(&name, exercises))?;
        println!(
            "✓ Saved workout '{}' ({})",
            workout.name,
            short_id(&workout.id)
        );
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SessionMode {
    Interactive,
    AutoComplete,
    AutoSkip,
}

/// A line typed during a session
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Toggle(usize),
    Reps(usize, u32),
    Weight(usize, Weight),
    Finish,
    Skip,
    Quit,
}

fn parse_session_command(line: &str) -> Option<SessionCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let set_index = |s: &str| s.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1);

    match parts.as_slice() {
        ["f"] => Some(SessionCommand::Finish),
        ["s"] => Some(SessionCommand::Skip),
        ["q"] => Some(SessionCommand::Quit),
        ["r", n, reps] => Some(SessionCommand::Reps(set_index(*n)?, reps.parse().ok()?)),
        ["w", n, weight] => Some(SessionCommand::Weight(
            set_index(*n)?,
            Weight::from_input(weight),
        )),
        [n] => set_index(*n).map(SessionCommand::Toggle),
        _ => None,
    }
}

fn cmd_start(paths: &DataPaths, query: &str, mode: SessionMode) -> Result<()> {
    let library = WorkoutLibrary::load(&paths.workouts)?;
    let workout = library.find(query)?.clone();

    let mut engine = SessionEngine::new();
    let mut sink = JsonlHistorySink::new(&paths.history);
    engine.start_session(workout)?;

    if mode == SessionMode::Interactive {
        show_tips_if_due(paths)?;
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        display_current(&engine);

        let command = match mode {
            SessionMode::AutoComplete => {
                for index in 0..engine.tracked_sets().len() {
                    engine.toggle_set_completed(index)?;
                }
                SessionCommand::Finish
            }
            SessionMode::AutoSkip => SessionCommand::Skip,
            SessionMode::Interactive => {
                print!("> ");
                io::stdout().flush()?;
                match lines.next() {
                    None => SessionCommand::Quit,
                    Some(line) => match parse_session_command(line?.trim()) {
                        Some(command) => command,
                        None => {
                            println!("Commands: <n> toggle set, r <n> <reps>, w <n> <weight>, f finish, s skip, q quit");
                            continue;
                        }
                    },
                }
            }
        };

        let step = match command {
            SessionCommand::Toggle(index) => {
                report(engine.toggle_set_completed(index).map(|_| ()));
                continue;
            }
            SessionCommand::Reps(index, reps) => {
                report(engine.update_set(index, SetField::Reps(reps)));
                continue;
            }
            SessionCommand::Weight(index, weight) => {
                report(engine.update_set(index, SetField::Weight(weight)));
                continue;
            }
            SessionCommand::Quit => {
                engine.abandon();
                println!("Session abandoned. Nothing was saved.");
                return Ok(());
            }
            SessionCommand::Finish => engine.finish_exercise(&mut sink),
            SessionCommand::Skip => engine.skip_exercise(&mut sink),
        };

        // A failed history write leaves the engine on the final exercise
        let step = match step {
            Ok(step) => step,
            Err(e) if mode == SessionMode::Interactive => {
                eprintln!("Could not save workout history: {}", e);
                println!("The session is still open. Enter f or s to retry, or q to quit.");
                continue;
            }
            Err(e) => return Err(e),
        };

        if let SessionStep::Completed(record) = step {
            println!();
            println!("✓ Workout complete: {}", record.workout_name);
            println!("  Duration: {}", format_duration(record.duration));
            return Ok(());
        }
    }
}

/// Session controls, shown at most once per cooldown period
fn show_tips_if_due(paths: &DataPaths) -> Result<()> {
    let now = Utc::now();
    if !Preferences::load(&paths.preferences)?.should_show_splash(now) {
        return Ok(());
    }

    Preferences::update(&paths.preferences, |p| {
        p.mark_splash_shown(now);
        Ok(())
    })?;

    println!("Tip: enter a set number to tick it off, 'r <n> <reps>' or 'w <n> <weight>' to");
    println!("     correct a set, 'f' to finish the exercise, 's' to skip it, 'q' to quit.");
    Ok(())
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("{}", e);
    }
}

fn display_current(engine: &SessionEngine) {
    let Some(session) = engine.active() else {
        return;
    };
    let exercise = session.current_exercise();

    println!();
    println!(
        "Exercise {} of {} ({:.0}%)",
        session.exercise_index + 1,
        session.workout.exercises.len(),
        session.progress_percent()
    );
    println!(
        "  {} - target {} reps x {} sets",
        exercise.name, exercise.reps, exercise.sets
    );
    for set in &session.tracked_sets {
        let mark = if set.completed { "x" } else { " " };
        println!(
            "  [{}] Set {}: {} reps @ {}",
            mark, set.set_number, set.reps, set.weight
        );
    }
}

fn cmd_history(paths: &DataPaths, cmd: HistoryCommand) -> Result<()> {
    let records = read_history(&paths.history)?;

    match cmd {
        HistoryCommand::List { limit } => {
            if records.is_empty() {
                println!("No workout history yet.");
                return Ok(());
            }
            let limit = limit.unwrap_or(records.len());
            for record in records.iter().take(limit) {
                let done: usize = record.exercises.iter().map(|e| e.completed_sets()).sum();
                println!(
                    "{}  {}  {}  {} sets done  ({})",
                    record.completed_at.format("%Y-%m-%d %H:%M"),
                    short_id(&record.id),
                    record.workout_name,
                    done,
                    format_duration(record.duration)
                );
            }
        }

        HistoryCommand::Export { csv } => {
            let rows = export_csv(&records, &csv)?;
            println!(
                "✓ Exported {} rows from {} sessions to {}",
                rows,
                records.len(),
                csv.display()
            );
        }
    }

    Ok(())
}

fn cmd_prefs(paths: &DataPaths, cmd: PrefsCommand) -> Result<()> {
    let path = &paths.preferences;

    match cmd {
        PrefsCommand::Show => {
            let prefs = Preferences::load(path)?;
            println!("Dark mode: {}", if prefs.dark_mode { "on" } else { "off" });
            println!("Default reps: {}", prefs.default_reps);
            println!("Default sets: {}", prefs.default_sets);
            if prefs.equipment.is_empty() {
                println!("Equipment: none");
            } else {
                println!("Equipment: {}", prefs.equipment.join(", "));
            }
            if !prefs.personal_records.is_empty() {
                println!("Personal records:");
                for pr in &prefs.personal_records {
                    println!(
                        "  {}  {} - {} x {} ({})",
                        short_id(&pr.id),
                        pr.exercise_name,
                        pr.weight,
                        pr.reps,
                        pr.date.format("%Y-%m-%d")
                    );
                }
            }
        }

        PrefsCommand::Defaults(args) => {
            let (prefs, _) = Preferences::update(path, |p| {
                if let Some(reps) = args.reps {
                    p.set_default_reps(reps)?;
                }
                if let Some(sets) = args.sets {
                    p.set_default_sets(sets)?;
                }
                Ok(())
            })?;
            println!(
                "Defaults: {} reps, {} sets",
                prefs.default_reps, prefs.default_sets
            );
        }

        PrefsCommand::DarkMode => {
            let (_, on) = Preferences::update(path, |p| Ok(p.toggle_dark_mode()))?;
            println!("Dark mode {}", if on { "on" } else { "off" });
        }

        PrefsCommand::Equipment(EquipmentCommand::Add { name }) => {
            let (_, added) = Preferences::update(path, |p| Ok(p.add_equipment(&name)))?;
            if added {
                println!("✓ Added {}", name.trim());
            } else {
                println!("{} is already listed", name.trim());
            }
        }

        PrefsCommand::Equipment(EquipmentCommand::Remove { name }) => {
            let (_, removed) = Preferences::update(path, |p| Ok(p.remove_equipment(&name)))?;
            if !removed {
                return Err(Error::NotFound(format!("equipment '{}'", name.trim())));
            }
            println!("✓ Removed {}", name.trim());
        }

        PrefsCommand::Pr(PrCommand::Add {
            exercise,
            weight,
            reps,
        }) => {
            let (_, pr) =
                Preferences::update(path, |p| p.add_personal_record(&exercise, weight, reps))?;
            println!(
                "✓ Recorded {} - {} x {} ({})",
                pr.exercise_name,
                pr.weight,
                pr.reps,
                short_id(&pr.id)
            );
        }

        PrefsCommand::Pr(PrCommand::Edit {
            id,
            exercise,
            weight,
            reps,
        }) => {
            let (_, pr) = Preferences::update(path, |p| {
                let current = p.find_personal_record(&id)?.clone();
                let name = exercise.unwrap_or(current.exercise_name);
                p.update_personal_record(
                    current.id,
                    &name,
                    weight.unwrap_or(current.weight),
                    reps.unwrap_or(current.reps),
                )?;
                p.find_personal_record(&current.id.to_string()).cloned()
            })?;
            println!(
                "✓ Updated {} - {} x {} ({})",
                pr.exercise_name,
                pr.weight,
                pr.reps,
                short_id(&pr.id)
            );
        }

        PrefsCommand::Pr(PrCommand::Remove { id }) => {
            let (_, name) = Preferences::update(path, |p| {
                let found = p.find_personal_record(&id)?;
                let (pr_id, name) = (found.id, found.exercise_name.clone());
                p.remove_personal_record(pr_id);
                Ok(name)
            })?;
            println!("✓ Removed personal record for {}", name);
        }
    }

    Ok(())
}
