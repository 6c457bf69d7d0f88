use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use fourfit_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fourfit")]
#[command(about = "FourFitness goal, workout and BMI tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Work against local storage only
    #[arg(long, global = true)]
    offline: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of goals and workouts (default)
    Dashboard,

    /// Body-mass index calculator
    Bmi {
        #[command(subcommand)]
        command: BmiCommand,
    },

    /// Manage goals
    Goals {
        #[command(subcommand)]
        command: GoalCommand,
    },

    /// Manage workouts
    Workouts {
        #[command(subcommand)]
        command: WorkoutCommand,
    },
}

#[derive(Subcommand)]
enum BmiCommand {
    /// Compute and store BMI (height in metres, or centimetres if above 3)
    Calc {
        /// Weight in kilograms
        #[arg(allow_negative_numbers = true)]
        weight: f64,
        /// Height in metres or centimetres
        #[arg(allow_negative_numbers = true)]
        height: f64,
    },
    /// Show the last stored BMI
    Show,
    /// Show BMI history
    History,
}

#[derive(Subcommand)]
enum GoalCommand {
    /// List goals
    List {
        /// Only goals whose target is not reached yet
        #[arg(long)]
        active: bool,
    },
    /// Create a goal
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        target: f64,
        #[arg(long, default_value_t = 0.0)]
        current: f64,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        description: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Show a goal
    Show { id: String },
    /// Edit a goal
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Delete a goal
    Delete { id: String },
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// List workouts
    List {
        /// all, completed or pending
        #[arg(long, default_value = "all")]
        filter: WorkoutFilter,
    },
    /// Create a workout
    Add {
        #[arg(long)]
        name: String,
        /// Duration in minutes
        #[arg(long)]
        duration: u32,
        /// Exercise name (repeatable)
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a workout
    Show { id: String },
    /// Edit a workout
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Flip the completed flag
    Toggle { id: String },
    /// Delete a workout
    Delete { id: String },
}

/// Shared handles for one invocation
struct Context {
    remote: Box<dyn RemoteApi>,
    store: FileStore,
    user_id: String,
    json: bool,
}

impl Context {
    fn goals(&self) -> GoalRepository<'_> {
        GoalRepository::new(self.remote.as_ref(), &self.store, self.user_id.clone())
    }

    fn workouts(&self) -> WorkoutRepository<'_> {
        WorkoutRepository::new(self.remote.as_ref(), &self.store, self.user_id.clone())
    }

    fn bmi(&self) -> BmiService<'_> {
        BmiService::new(self.remote.as_ref(), &self.store, self.user_id.clone())
    }
}

fn main() -> ExitCode {
    fourfit_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if cli.offline {
        config.api.offline = true;
    }
    config.validate()?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = FileStore::new(data_dir);

    let remote: Box<dyn RemoteApi> = if config.api.offline {
        tracing::debug!("Offline mode, using local storage only");
        Box::new(OfflineRemote)
    } else {
        Box::new(HttpRemote::from_config(&config.api)?)
    };

    let user_id = current_user_id(&store, &config.user.id);
    let ctx = Context {
        remote,
        store,
        user_id,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Bmi { command }) => cmd_bmi(&ctx, command),
        Some(Commands::Goals { command }) => cmd_goals(&ctx, command),
        Some(Commands::Workouts { command }) => cmd_workouts(&ctx, command),
        Some(Commands::Dashboard) | None => cmd_dashboard(&ctx),
    }
}

fn cmd_bmi(ctx: &Context, command: BmiCommand) -> Result<()> {
    let service = ctx.bmi();
    match command {
        BmiCommand::Calc { weight, height } => {
            let record = service.record(weight, height)?;
            if ctx.json {
                return print_json(&record);
            }
            display_bmi(&record);
        }
        BmiCommand::Show => {
            let latest = service.latest()?;
            if ctx.json {
                return print_json(&latest);
            }
            match latest {
                Some(record) => display_bmi(&record),
                None => println!("No BMI recorded yet."),
            }
        }
        BmiCommand::History => {
            let history = service.history();
            if ctx.json {
                return print_json(&history);
            }
            if history.is_empty() {
                println!("No BMI recorded yet.");
            }
            for record in &history {
                display_bmi(record);
            }
        }
    }
    Ok(())
}

fn cmd_goals(ctx: &Context, command: GoalCommand) -> Result<()> {
    let repo = ctx.goals();
    match command {
        GoalCommand::List { active } => {
            let goals: Vec<Goal> = repo
                .list()
                .into_iter()
                .filter(|g| !active || g.is_active())
                .collect();
            if ctx.json {
                return print_json(&goals);
            }
            if goals.is_empty() {
                println!("No goals yet.");
            }
            for goal in &goals {
                display_goal(goal);
            }
        }
        GoalCommand::Add {
            title,
            target,
            current,
            unit,
            description,
            deadline,
        } => {
            let goal = repo.create(NewGoal {
                title,
                description,
                target,
                current,
                unit,
                deadline,
            })?;
            report(ctx, "Goal created", &goal, display_goal)?;
        }
        GoalCommand::Show { id } => {
            let goal = repo.get(&id)?;
            report(ctx, "", &goal, display_goal)?;
        }
        GoalCommand::Edit {
            id,
            title,
            target,
            current,
            unit,
            description,
            deadline,
        } => {
            let patch = GoalPatch {
                title,
                description,
                target,
                current,
                unit,
                deadline,
            };
            let goal = repo.update(&id, &patch)?;
            report(ctx, "Goal updated", &goal, display_goal)?;
        }
        GoalCommand::Delete { id } => {
            repo.delete(&id)?;
            if !ctx.json {
                println!("✓ Goal {} deleted", id);
            }
        }
    }
    Ok(())
}

fn cmd_workouts(ctx: &Context, command: WorkoutCommand) -> Result<()> {
    let repo = ctx.workouts();
    match command {
        WorkoutCommand::List { filter } => {
            let workouts = repo.filtered(filter);
            if ctx.json {
                return print_json(&workouts);
            }
            if workouts.is_empty() {
                println!("No workouts yet.");
            }
            for workout in &workouts {
                display_workout(workout);
            }
        }
        WorkoutCommand::Add {
            name,
            duration,
            exercises,
            description,
            date,
        } => {
            let workout = repo.create(NewWorkout {
                name,
                description,
                duration_minutes: duration,
                exercises,
                completed: false,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
            })?;
            report(ctx, "Workout created", &workout, display_workout)?;
        }
        WorkoutCommand::Show { id } => {
            let workout = repo.get(&id)?;
            report(ctx, "", &workout, display_workout)?;
        }
        WorkoutCommand::Edit {
            id,
            name,
            duration,
            exercises,
            description,
            date,
        } => {
            let patch = WorkoutPatch {
                name,
                description,
                duration_minutes: duration,
                exercises: (!exercises.is_empty()).then_some(exercises),
                completed: None,
                date,
            };
            let workout = repo.update(&id, &patch)?;
            report(ctx, "Workout updated", &workout, display_workout)?;
        }
        WorkoutCommand::Toggle { id } => {
            let workout = repo.toggle_complete(&id)?;
            report(ctx, "Workout status changed", &workout, display_workout)?;
        }
        WorkoutCommand::Delete { id } => {
            repo.delete(&id)?;
            if !ctx.json {
                println!("✓ Workout {} deleted", id);
            }
        }
    }
    Ok(())
}

fn cmd_dashboard(ctx: &Context) -> Result<()> {
    let goals = ctx.goals().list();
    let workouts = ctx.workouts().list();
    let summary = DashboardSummary::summarize(&goals, &workouts, Local::now().date_naive());

    if ctx.json {
        return print_json(&summary);
    }

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  FOURFITNESS");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Active goals:      {}", summary.active_goals);
    println!("  Workouts:          {}", summary.total_workouts);
    println!("  This week:         {}", summary.workouts_this_week);
    println!("  Completed:         {}", summary.completed_workouts);
    println!("  Average progress:  {}%", summary.average_progress_percent);

    if let Some(record) = ctx.bmi().latest()? {
        println!();
        display_bmi(&record);
    }
    println!();
    Ok(())
}

fn report<T: serde::Serialize>(ctx: &Context, heading: &str, value: &T, display: fn(&T)) -> Result<()> {
    if ctx.json {
        return print_json(value);
    }
    if !heading.is_empty() {
        println!("✓ {}", heading);
    }
    display(value);
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_bmi(record: &BmiRecord) {
    println!("  BMI: {:.2} ({})", record.bmi, record.category);
    println!("  Weight: {} kg  Height: {:.2} m", record.weight, record.height);
}

fn display_goal(goal: &Goal) {
    let status = if goal.is_active() { " " } else { "✓" };
    println!(
        "  [{}] {}  {}  {}/{} {} ({:.0}%)",
        status,
        goal.id,
        goal.title,
        goal.current,
        goal.target,
        goal.unit,
        goal.progress_percent()
    );
    if let Some(ref description) = goal.description {
        println!("      {}", description);
    }
    if let Some(deadline) = goal.deadline {
        println!("      Deadline: {}", deadline);
    }
}

fn display_workout(workout: &Workout) {
    let status = if workout.completed { "✓" } else { " " };
    println!(
        "  [{}] {}  {}  {} min  {}",
        status, workout.id, workout.name, workout.duration_minutes, workout.date
    );
    if let Some(ref description) = workout.description {
        println!("      {}", description);
    }
    if !workout.exercises.is_empty() {
        println!("      → {}", workout.exercises.join(", "));
    }
}
