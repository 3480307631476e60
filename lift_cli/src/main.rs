use chrono::{FixedOffset, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use lift_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// User whose workouts to act on (defaults to $LIFTLOG_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new workout
    Start {
        /// Start time as RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change fields of a workout; omitted fields stay as they are
    Update {
        id: Uuid,

        #[arg(long)]
        started_at: Option<String>,

        #[arg(long)]
        completed_at: Option<String>,

        /// Duration in seconds
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,

        /// New notes; an empty string clears them
        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a workout completed now and record its duration
    Finish { id: Uuid },

    /// Show one workout
    Show { id: Uuid },

    /// List workouts started on a calendar day (defaults to today)
    Day { date: Option<NaiveDate> },

    /// List workouts, most recent first
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete a workout with all of its exercises and sets
    Delete { id: Uuid },

    /// List exercises you can log
    Exercises,

    /// Create a private exercise
    NewExercise {
        name: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        muscle_group: Option<String>,

        #[arg(long)]
        equipment: Option<String>,
    },

    /// Append an exercise to a workout
    AddExercise {
        workout: Uuid,

        /// Exercise name (case-insensitive)
        exercise: String,

        #[arg(long)]
        order: Option<i32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Append a set to a workout exercise
    AddSet {
        /// Workout exercise id (printed by add-exercise and show)
        entry: Uuid,

        #[arg(long)]
        reps: u32,

        #[arg(long, default_value_t = 0.0)]
        weight: f64,

        #[arg(long)]
        rpe: Option<f64>,

        /// Reps in reserve
        #[arg(long)]
        rir: Option<u32>,

        #[arg(long)]
        warmup: bool,

        #[arg(long)]
        drop_set: bool,

        #[arg(long)]
        set_number: Option<i32>,

        #[arg(long)]
        notes: Option<String>,
    },
}

/// Everything a command needs, resolved once from flags and config
struct Context {
    store: FileStore,
    config: Config,
    offset: FixedOffset,
    user: UserId,
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose == 0 {
        lift_core::logging::init();
    } else {
        lift_core::logging::init_with_level(lift_core::logging::level_for_verbosity(cli.verbose));
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::NotFound { entity, id }) => {
            eprintln!("{} {} not found", entity, id);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Needs neither a user nor a loadable config
    if let Commands::InitConfig { force } = &cli.command {
        return cmd_init_config(cli.config.as_deref(), *force);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli
        .user
        .clone()
        .or_else(|| std::env::var("LIFTLOG_USER").ok())
        .ok_or_else(|| Error::Config("no user given; pass --user or set LIFTLOG_USER".into()))?;

    let ctx = Context {
        store: FileStore::in_dir(&data_dir),
        offset: config.time.utc_offset()?,
        config,
        user: UserId::new(user),
        json: cli.json,
    };
    tracing::debug!("Using store at {:?} for {}", ctx.store.path(), ctx.user);

    match cli.command {
        Commands::Start { at, notes } => cmd_start(&ctx, at, notes),
        Commands::Update {
            id,
            started_at,
            completed_at,
            duration,
            notes,
        } => cmd_update(
            &ctx,
            id,
            UpdateWorkout {
                started_at,
                completed_at,
                duration_seconds: duration,
                notes,
            },
        ),
        Commands::Finish { id } => cmd_finish(&ctx, id),
        Commands::Show { id } => {
            let tree = queries(&ctx).get_by_id(id, &ctx.user)?;
            print_trees(&ctx, &[tree])
        }
        Commands::Day { date } => {
            let date = date.unwrap_or_else(|| Utc::now().with_timezone(&ctx.offset).date_naive());
            let trees = queries(&ctx).get_by_date(&ctx.user, date)?;
            if trees.is_empty() && !ctx.json {
                println!("No workouts on {}", date);
                return Ok(());
            }
            print_trees(&ctx, &trees)
        }
        Commands::Recent { limit } => {
            let limit = limit.or(ctx.config.query.default_recent_limit);
            let trees = queries(&ctx).list_recent(&ctx.user, limit)?;
            if trees.is_empty() && !ctx.json {
                println!("No workouts yet");
                return Ok(());
            }
            print_trees(&ctx, &trees)
        }
        Commands::Delete { id } => {
            let report = mutations(&ctx).delete_workout(id, &ctx.user)?;
            if ctx.json {
                print_json(&report)
            } else {
                println!(
                    "✓ Deleted workout {} ({} exercises, {} sets)",
                    id, report.workout_exercises, report.sets
                );
                Ok(())
            }
        }
        Commands::Exercises => cmd_exercises(&ctx),
        Commands::NewExercise {
            name,
            category,
            muscle_group,
            equipment,
        } => {
            let exercise = Catalog::new(&ctx.store).create_exercise(
                &ctx.user,
                NewExercise {
                    name,
                    category,
                    muscle_group,
                    equipment,
                },
            )?;
            if ctx.json {
                print_json(&exercise)
            } else {
                println!("✓ Created exercise {} ({})", exercise.name, exercise.id);
                Ok(())
            }
        }
        Commands::AddExercise {
            workout,
            exercise,
            order,
            notes,
        } => cmd_add_exercise(&ctx, workout, &exercise, order, notes),
        // Handled before config and user are resolved
        Commands::InitConfig { .. } => Ok(()),
        Commands::AddSet {
            entry,
            reps,
            weight,
            rpe,
            rir,
            warmup,
            drop_set,
            set_number,
            notes,
        } => {
            let set = mutations(&ctx).add_set(
                entry,
                &ctx.user,
                AddSet {
                    set_number,
                    reps,
                    weight,
                    rpe,
                    reps_in_reserve: rir,
                    is_warmup: warmup,
                    is_drop_set: drop_set,
                    notes,
                },
            )?;
            if ctx.json {
                print_json(&set)
            } else {
                println!("✓ Logged set {}", set);
                Ok(())
            }
        }
    }
}

fn queries(ctx: &Context) -> QueryEngine<'_, FileStore> {
    QueryEngine::new(&ctx.store).with_utc_offset(ctx.offset)
}

fn mutations(ctx: &Context) -> MutationService<'_, FileStore> {
    MutationService::new(&ctx.store).with_limits(ctx.config.validation.clone())
}

fn cmd_start(ctx: &Context, at: Option<String>, notes: Option<String>) -> Result<()> {
    let started_at = at.unwrap_or_else(|| Utc::now().to_rfc3339());
    let tree = mutations(ctx).create_workout(&ctx.user, CreateWorkout { started_at, notes })?;

    if ctx.json {
        return print_json(&tree);
    }
    println!("✓ Workout started: {}", tree.id());
    Ok(())
}

fn cmd_update(ctx: &Context, id: Uuid, update: UpdateWorkout) -> Result<()> {
    let tree = mutations(ctx).update_workout(id, &ctx.user, update)?;
    if ctx.json {
        return print_json(&tree);
    }
    println!("✓ Workout updated");
    print_tree(ctx, &tree);
    Ok(())
}

fn cmd_finish(ctx: &Context, id: Uuid) -> Result<()> {
    let current = queries(ctx).get_by_id(id, &ctx.user)?;
    let now = Utc::now();
    let elapsed = (now - current.workout.started_at).num_seconds();

    let update = UpdateWorkout {
        completed_at: Some(now.to_rfc3339()),
        // A workout started in the future has no meaningful duration yet
        duration_seconds: (elapsed > 0).then_some(elapsed),
        ..Default::default()
    };
    cmd_update(ctx, id, update)
}

fn cmd_exercises(ctx: &Context) -> Result<()> {
    let catalog = Catalog::new(&ctx.store);
    catalog.seed_defaults()?;
    let exercises = catalog.visible_exercises(&ctx.user)?;

    if ctx.json {
        return print_json(&exercises);
    }
    for exercise in &exercises {
        let scope = match exercise.owner {
            ExerciseOwner::Shared => "",
            ExerciseOwner::Owned(_) => " (private)",
        };
        println!(
            "  {}{}  [{}]",
            exercise.name,
            scope,
            exercise.muscle_group.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_add_exercise(
    ctx: &Context,
    workout: Uuid,
    name: &str,
    order: Option<i32>,
    notes: Option<String>,
) -> Result<()> {
    let catalog = Catalog::new(&ctx.store);
    catalog.seed_defaults()?;
    let exercise = catalog.find_by_name(&ctx.user, name)?;

    let entry = mutations(ctx).add_exercise(
        workout,
        &ctx.user,
        AddExercise {
            exercise_id: exercise.id,
            order,
            notes,
        },
    )?;

    if ctx.json {
        return print_json(&entry);
    }
    println!(
        "✓ Added {} at position {} (entry {})",
        entry.exercise.name, entry.entry.order, entry.entry.id
    );
    Ok(())
}

fn cmd_init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_config_path);
    if target.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to overwrite",
            target.display()
        )));
    }

    let config = Config::default();
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    println!("✓ Wrote default config to {}", target.display());
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| Error::Output(e.to_string()))?;
    println!("{}", out);
    Ok(())
}

fn print_trees(ctx: &Context, trees: &[WorkoutTree]) -> Result<()> {
    if ctx.json {
        return print_json(trees);
    }
    for tree in trees {
        print_tree(ctx, tree);
    }
    Ok(())
}

fn print_tree(ctx: &Context, tree: &WorkoutTree) {
    let workout = &tree.workout;
    let summary = &tree.summary;
    let local = |t: chrono::DateTime<Utc>| t.with_timezone(&ctx.offset).format("%Y-%m-%d %H:%M");

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  Workout {}", workout.id);
    println!("╰─────────────────────────────────────────╯");
    println!("  Started:   {}", local(workout.started_at));
    if let Some(completed_at) = workout.completed_at {
        println!("  Completed: {}", local(completed_at));
    }
    if let Some(duration) = workout.duration_seconds {
        println!("  Duration:  {} min", duration / 60);
    }
    if let Some(ref notes) = workout.notes {
        println!("  Notes:     {}", notes);
    }
    println!(
        "  {} exercises, {} sets ({} working, {} warmup)",
        summary.exercise_count, summary.total_sets, summary.working_sets, summary.warmup_sets
    );

    for (exercise, line) in tree.exercises.iter().zip(&summary.exercises) {
        println!();
        println!("  {}. {}  [{}]", exercise.entry.order, line, exercise.entry.id);
        for set in &exercise.sets {
            println!("     {}", set);
        }
    }
    println!();
}
