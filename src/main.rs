use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use echo_core::ai::{ApiKeyManager, AssistantClient, Vendor};
use echo_core::config::{load_env_api_keys, EchoConfig};
use echo_core::db::Database;
use echo_core::models::*;
use echo_core::pomodoro::{PomodoroState, PomodoroTimer};
use echo_core::store::EchoStore;

#[derive(Parser)]
#[command(name = "echo")]
#[command(about = "Goals, tasks, time blocks and mood tracking with an AI focus companion")]
struct Cli {
    /// Database file (overrides config and ECHO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// AI vendor to use: claude or gemini
    #[arg(long, global = true, value_parser = parse_vendor)]
    vendor: Option<Vendor>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and sample data if needed
    Init,
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage time blocks
    #[command(subcommand)]
    Block(BlockCommand),
    /// Track mood and energy
    #[command(subcommand)]
    Mood(MoodCommand),
    /// Show what Echo is focused on and completion stats
    Status,
    /// Print a greeting based on open tasks (no network)
    Greet,
    /// Ask the assistant for advice
    Chat {
        /// Message to send
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Ask the assistant to reflect on mood and energy entries
    Reflect,
    /// Run one Pomodoro work session
    Focus,
}

#[derive(Subcommand)]
enum GoalCommand {
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    List,
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New deadline (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Remove the deadline
        #[arg(long, conflicts_with = "end")]
        no_end: bool,
    },
    Done { id: Uuid },
    Undo { id: Uuid },
    Delete { id: Uuid },
}

#[derive(Args)]
struct BlockWindow {
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_clock_time)]
    start: Option<NaiveTime>,
    /// End time (HH:MM)
    #[arg(long, value_parser = parse_clock_time)]
    end: Option<NaiveTime>,
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task, optionally with a time block in the same transaction
    Add {
        #[arg(long)]
        goal: Uuid,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, value_parser = parse_priority, default_value = "medium")]
        priority: TaskPriority,
        #[command(flatten)]
        window: BlockWindow,
    },
    List {
        #[arg(long)]
        goal: Option<Uuid>,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
    },
    Done { id: Uuid },
    Undo { id: Uuid },
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum BlockCommand {
    Add {
        #[arg(long)]
        task: Uuid,
        #[command(flatten)]
        window: BlockWindow,
    },
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Done { id: Uuid },
    Undo { id: Uuid },
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum MoodCommand {
    Add {
        #[arg(long, value_parser = parse_mood)]
        mood: MoodLevel,
        #[arg(long, value_parser = parse_energy)]
        energy: EnergyLevel,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete { id: Uuid },
}

fn parse_vendor(s: &str) -> Result<Vendor, String> {
    Vendor::from_str(s).ok_or_else(|| format!("unknown vendor '{s}' (claude, gemini)"))
}

fn parse_priority(s: &str) -> Result<TaskPriority, String> {
    TaskPriority::from_str(s).ok_or_else(|| format!("unknown priority '{s}' (low, medium, high)"))
}

fn parse_mood(s: &str) -> Result<MoodLevel, String> {
    MoodLevel::from_str(s)
        .ok_or_else(|| format!("unknown mood '{s}' (very_bad, bad, neutral, good, very_good)"))
}

fn parse_energy(s: &str) -> Result<EnergyLevel, String> {
    EnergyLevel::from_str(s)
        .ok_or_else(|| format!("unknown energy '{s}' (very_low, low, medium, high, very_high)"))
}

/// Initialize tracing on stderr so command output on stdout stays clean
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "echo_core=info,echo=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(db_path: Option<PathBuf>, config: &EchoConfig) -> anyhow::Result<EchoStore> {
    let db = match db_path.or_else(|| config.database_path.clone()) {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let store = EchoStore::new(db);
    store.initialize()?;
    Ok(store)
}

fn assistant(vendor: Option<Vendor>, config: &EchoConfig) -> anyhow::Result<AssistantClient> {
    let keys = Arc::new(ApiKeyManager::new());
    let vendor = vendor.unwrap_or(config.vendor);
    keys.select_vendor(vendor);

    load_env_api_keys(&keys);

    let client = AssistantClient::with_timeout(
        config.profile(keys.selected_vendor()),
        keys,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    Ok(client)
}

fn window_block(task_id: Uuid, window: &BlockWindow) -> anyhow::Result<Option<TimeBlock>> {
    let date = window.date.unwrap_or_else(|| Local::now().date_naive());
    let block = TimeBlock::from_window(task_id, date, window.start, window.end)?;
    Ok(block)
}

fn check(mark: bool) -> &'static str {
    if mark {
        "[x]"
    } else {
        "[ ]"
    }
}

fn print_goal(goal: &Goal) {
    let end = goal
        .end_date
        .map(|d| format!(" → {d}"))
        .unwrap_or_default();
    println!(
        "{} {}  {}  ({}{})",
        check(goal.is_completed),
        goal.id,
        goal.title,
        goal.start_date,
        end
    );
}

fn print_task(task: &Task) {
    println!(
        "{} {}  {} [{}]",
        check(task.is_completed),
        task.id,
        task.title,
        task.priority
    );
}

fn print_block(block: &TimeBlock) {
    println!(
        "{} {}  {} {}-{}  task {}",
        check(block.is_completed),
        block.id,
        block.date,
        block.start_time.format("%H:%M"),
        block.end_time.format("%H:%M"),
        block.task_id
    );
}

fn print_mood(entry: &MoodEnergyEntry) {
    let note = if entry.note.is_empty() {
        String::new()
    } else {
        format!("  \"{}\"", entry.note)
    };
    println!(
        "{}  {} {}  {} {}  {} {}{}",
        entry.id,
        entry.date,
        entry.time.format("%H:%M"),
        entry.mood.icon(),
        entry.mood.label(),
        entry.energy.icon(),
        entry.energy.label(),
        note
    );
}

fn not_found(kind: &str, id: Uuid) -> anyhow::Error {
    anyhow::anyhow!("{kind} not found: {id}")
}

fn run_goal(store: &EchoStore, command: GoalCommand) -> anyhow::Result<()> {
    match command {
        GoalCommand::Add {
            title,
            description,
            start,
            end,
        } => {
            let start = start.unwrap_or_else(|| Local::now().date_naive());
            let goal = store.add_goal(Goal::new(title, description, start, end))?;
            print_goal(&goal);
        }
        GoalCommand::List => store.current_goals().iter().for_each(print_goal),
        GoalCommand::Update {
            id,
            title,
            description,
            end,
            no_end,
        } => {
            let mut goal = store
                .current_goals()
                .iter()
                .find(|g| g.id == id)
                .cloned()
                .ok_or_else(|| not_found("Goal", id))?;
            goal.apply(GoalChanges {
                title,
                description,
                end_date: if no_end { Some(None) } else { end.map(Some) },
            });
            print_goal(&store.update_goal(&goal)?);
        }
        GoalCommand::Done { id } => print_goal(&store.set_goal_completed(id, true)?),
        GoalCommand::Undo { id } => print_goal(&store.set_goal_completed(id, false)?),
        GoalCommand::Delete { id } => {
            if !store.delete_goal(id)? {
                return Err(not_found("Goal", id));
            }
            println!("Deleted goal {id}");
        }
    }
    Ok(())
}

fn run_task(store: &EchoStore, command: TaskCommand) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add {
            goal,
            title,
            description,
            priority,
            window,
        } => {
            let task = Task::new(goal, title, description, priority);
            match window_block(task.id, &window)? {
                Some(block) => {
                    let (task, block) = store.add_task_with_time_block(task, block)?;
                    print_task(&task);
                    print_block(&block);
                }
                None => print_task(&store.add_task(task)?),
            }
        }
        TaskCommand::List { goal } => store
            .current_tasks()
            .iter()
            .filter(|t| goal.map_or(true, |g| t.goal_id == g))
            .for_each(print_task),
        TaskCommand::Update {
            id,
            title,
            description,
            priority,
        } => {
            let mut task = store
                .current_tasks()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| not_found("Task", id))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            print_task(&store.update_task(&task)?);
        }
        TaskCommand::Done { id } => print_task(&store.set_task_completed(id, true)?),
        TaskCommand::Undo { id } => print_task(&store.set_task_completed(id, false)?),
        TaskCommand::Delete { id } => {
            if !store.delete_task(id)? {
                return Err(not_found("Task", id));
            }
            println!("Deleted task {id}");
        }
    }
    Ok(())
}

fn run_block(store: &EchoStore, command: BlockCommand) -> anyhow::Result<()> {
    match command {
        BlockCommand::Add { task, window } => {
            let block = window_block(task, &window)?
                .context("--start and --end are required for a time block")?;
            print_block(&store.add_time_block(block)?);
        }
        BlockCommand::List { date } => store
            .current_time_blocks()
            .iter()
            .filter(|b| date.map_or(true, |d| b.date == d))
            .for_each(print_block),
        BlockCommand::Done { id } => print_block(&store.set_time_block_completed(id, true)?),
        BlockCommand::Undo { id } => print_block(&store.set_time_block_completed(id, false)?),
        BlockCommand::Delete { id } => {
            if !store.delete_time_block(id)? {
                return Err(not_found("Time block", id));
            }
            println!("Deleted time block {id}");
        }
    }
    Ok(())
}

fn run_mood(store: &EchoStore, command: MoodCommand) -> anyhow::Result<()> {
    match command {
        MoodCommand::Add { mood, energy, note } => {
            let now = Local::now();
            let entry = MoodEnergyEntry::new(mood, energy, note, now.date_naive(), now.time());
            print_mood(&store.add_mood_entry(entry)?);
        }
        MoodCommand::List { date: Some(date) } => {
            store.mood_entries_on(date)?.iter().for_each(print_mood)
        }
        MoodCommand::List { date: None } => store.current_mood_entries().iter().for_each(print_mood),
        MoodCommand::Delete { id } => {
            if !store.delete_mood_entry(id)? {
                return Err(not_found("Mood entry", id));
            }
            println!("Deleted mood entry {id}");
        }
    }
    Ok(())
}

async fn run_focus(config: &EchoConfig) -> anyhow::Result<()> {
    let mut timer = PomodoroTimer::new(config.pomodoro.clone());
    timer.start();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;

    loop {
        print!("\r{} {}  ", timer.state().label(), timer.format_remaining());
        std::io::stdout().flush()?;

        tokio::select! {
            _ = interval.tick() => {
                if let Some(next) = timer.tick(Duration::from_secs(1)) {
                    println!();
                    match next {
                        PomodoroState::LongBreak => println!("Session complete. Take a long break."),
                        _ => println!("Session complete. Take a short break."),
                    }
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("Focus session stopped at {}", timer.format_remaining());
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        db,
        vendor,
        command,
    } = Cli::parse();
    init_tracing();

    let config = EchoConfig::load();
    let store = open_store(db, &config)?;

    match command {
        Commands::Init => {
            println!(
                "Echo is ready: {} goals, {} tasks, {} time blocks",
                store.current_goals().len(),
                store.current_tasks().len(),
                store.current_time_blocks().len()
            );
        }
        Commands::Goal(command) => run_goal(&store, command)?,
        Commands::Task(command) => run_task(&store, command)?,
        Commands::Block(command) => run_block(&store, command)?,
        Commands::Mood(command) => run_mood(&store, command)?,
        Commands::Status => {
            let status = store.focus_status();
            println!("{}", status.message);
            if let Some(block) = &status.current_time_block {
                print_block(block);
            }
            println!("{}", store.focus_reflection().message);
            println!();
            let today = Local::now().date_naive();
            let stats = store.completion_stats(today);
            println!("Tasks completed today:     {}", stats.today);
            println!("Tasks completed this week: {}", stats.this_week);
            println!("Total tasks completed:     {}", stats.total);
            println!("{}", store.motivation_reflection(today).message);
        }
        Commands::Greet => {
            let client = assistant(vendor, &config)?;
            let greeting =
                client.generate_greeting_for(config.user_name.as_deref(), &store.current_tasks());
            println!("{greeting}");
        }
        Commands::Chat { message } => {
            let client = assistant(vendor, &config)?;
            let reply = client
                .send_message(&message.join(" "), &store.current_tasks())
                .await?;
            println!("{}", reply.text());
        }
        Commands::Reflect => {
            let client = assistant(vendor, &config)?;
            let reply = client
                .generate_reflection(&store.current_mood_entries())
                .await?;
            if reply.is_content() {
                store.add_reflection(Reflection::new(reply.text(), ReflectionType::EndOfDay));
            }
            println!("{}", reply.text());
        }
        Commands::Focus => run_focus(&config).await?,
    }

    store.shutdown();
    Ok(())
}
