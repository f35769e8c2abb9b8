mod calendar;
mod config;
mod db;
mod error;
mod tasks;
mod theme;
mod ui;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crossterm::tty::IsTty;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use calendar::{parse_date, Clock, FixedClock, SystemClock};
use config::AppConfig;
use db::{Database, Difficulty, NewSubject, NewTask, Planner, SubjectPatch, TaskPatch, TaskStatus, TaskType};
use error::ValidationError;
use tasks::filter::{filter_tasks, StatusFilter, TaskFilter};
use tasks::stats::{calculate_stats, calculate_time_summary, subject_breakdown};
use ui::View;

#[derive(Parser, Debug)]
#[command(name = "sp", version, about = "Study planner: subjects, dated tasks, priorities and progress")]
struct Cli {
    /// Treat this day as today (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Plain output without colors
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks, highest priority first (the default)
    List(ListArgs),
    /// Progress dashboard
    Stats {
        /// Print the numbers as JSON
        #[arg(long)]
        json: bool,
    },
    /// List subjects with their open/done counts
    Subjects,
    /// Create a subject
    AddSubject {
        name: String,
        /// Hex color, e.g. #3b82f6
        color: Option<String>,
    },
    /// Rename or recolor a subject
    EditSubject {
        /// Subject name or id prefix
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a subject together with its tasks
    RmSubject {
        /// Subject name or id prefix
        id: String,
    },
    /// Create a task
    AddTask {
        /// Subject name or id prefix
        subject: String,
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: NaiveDate,
        /// homework, exam or project (default: homework)
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        /// 1 to 5 (default: 3)
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Estimated minutes (default: 60)
        #[arg(long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of a task
    EditTask {
        /// Task id prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Move to another subject (name or id prefix)
        #[arg(long)]
        subject: Option<String>,
        #[arg(long = "type")]
        task_type: Option<TaskType>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task as in progress
    Start { id: String },
    /// Mark a task as done
    Done { id: String },
    /// Set a task back to open and clear its completion time
    Reopen { id: String },
    /// Delete a task
    RmTask { id: String },
}

#[derive(Args, Debug, Default)]
struct ListArgs {
    /// all, open, done, today or overdue (default from config, else open)
    filter: Option<StatusFilter>,
    /// Subject name or id prefix
    #[arg(long)]
    subject: Option<String>,
    /// homework, exam or project
    #[arg(long = "type")]
    task_type: Option<TaskType>,
}

type Store = Database;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e)  => {
            eprintln!("warning: ignoring unreadable config: {e}");
            AppConfig::default()
        }
    };
    let _guard = init_logging(&cfg)?;

    let clock: Box<dyn Clock> = match cli.date {
        Some(d) => Box::new(FixedClock::on(d)),
        None    => Box::new(SystemClock),
    };
    let color = cfg.color() && !cli.no_color && std::io::stdout().is_tty();

    let db = Database::connect(&cfg.db_path()).await?;
    db.migrate().await?;
    let mut planner = Planner::load(db.clone(), clock).await?;

    let command = cli.command.unwrap_or_else(|| Command::List(ListArgs::default()));
    tracing::info!(?command, "running command");

    let result = run(&mut planner, command, &cfg, color).await;
    if let Err(e) = &result {
        tracing::error!("command failed: {e:#}");
    }
    db.close().await;
    result
}

async fn run(planner: &mut Planner<Store>, command: Command, cfg: &AppConfig, color: bool) -> Result<()> {
    match command {
        Command::List(args) => {
            let filter = task_filter(planner, &args, cfg.default_filter());
            let tasks  = filter_tasks(planner.tasks(), &filter, planner.today());
            println!("{}", view(planner, color).task_list(&tasks).trim_end());
        }
        Command::Stats { json } => {
            let stats = calculate_stats(planner.tasks(), planner.today());
            let time  = calculate_time_summary(planner.tasks());
            let rows  = subject_breakdown(planner.subjects(), planner.tasks());
            if json {
                let out = serde_json::json!({ "stats": stats, "time": time, "subjects": rows });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", view(planner, color).dashboard(&stats, &time, &rows).trim_end());
            }
        }
        Command::Subjects => {
            let rows = subject_breakdown(planner.subjects(), planner.tasks());
            println!("{}", view(planner, color).subject_list(&rows).trim_end());
        }
        Command::AddSubject { name, color: hex } => {
            let mut new = NewSubject::new(&name);
            if let Some(c) = &hex { new = new.with_color(c); }
            let s = planner.add_subject(new).await?;
            println!("Added subject {} ({})", s.name, ui::short_id(&s.id));
        }
        Command::EditSubject { id, name, color } => {
            let id = find_subject(planner, &id)?;
            let patch = SubjectPatch { name, color };
            if patch.is_empty() {
                bail!("nothing to change: pass --name and/or --color");
            }
            let s = planner.update_subject(&id, patch).await?;
            println!("Updated subject {} ({})", s.name, ui::short_id(&s.id));
        }
        Command::RmSubject { id } => {
            let id = find_subject(planner, &id)?;
            let name = planner.subject(&id).map(|s| s.name.clone()).unwrap_or_default();
            let removed = planner.delete_subject(&id).await?;
            println!("Deleted subject {name} and {removed} task(s)");
        }
        Command::AddTask { subject, title, due, task_type, difficulty, minutes, description } => {
            let subject_id = find_subject(planner, &subject)?;
            let mut new = NewTask::new(&subject_id, &title, due);
            if let Some(t) = task_type          { new = new.task_type(t); }
            if let Some(d) = difficulty         { new = new.difficulty(d); }
            if let Some(m) = minutes            { new = new.minutes(m); }
            if let Some(d) = &description       { new = new.description(d); }
            let t = planner.add_task(new).await?;
            println!("Added task {} ({})", t.title, ui::short_id(&t.id));
        }
        Command::EditTask { id, title, subject, task_type, difficulty, due, minutes, description } => {
            let id = planner.resolve_task_id(&id)?;
            let subject_id = match subject {
                Some(s) => Some(find_subject(planner, &s)?),
                None    => None,
            };
            let patch = TaskPatch {
                subject_id,
                title,
                description: description.map(Some),
                task_type,
                difficulty,
                due_date: due,
                estimated_time_minutes: minutes,
                ..Default::default()
            };
            let t = planner.update_task(&id, patch).await?;
            println!("Updated task {} ({})", t.title, ui::short_id(&t.id));
        }
        Command::Start { id }  => set_status(planner, &id, TaskPatch::status(TaskStatus::InProgress)).await?,
        Command::Done { id }   => set_status(planner, &id, TaskPatch::status(TaskStatus::Done)).await?,
        Command::Reopen { id } => set_status(planner, &id, TaskPatch::reopen()).await?,
        Command::RmTask { id } => {
            let id = planner.resolve_task_id(&id)?;
            let t  = planner.delete_task(&id).await?;
            println!("Deleted task {}", t.title);
        }
    }
    Ok(())
}

// ─── Logging ──────────────────────────────────────────────────────────────────

fn init_logging(cfg: &AppConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("studyplanner");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "studyplanner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Ok(guard)
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn view(planner: &Planner<Store>, color: bool) -> View<'_> {
    View { subjects: planner.subjects(), today: planner.today(), color }
}

/// Accepts a subject name (case-insensitive) or an id prefix.
fn find_subject(planner: &Planner<Store>, needle: &str) -> Result<String> {
    if let Some(s) = planner.subjects().iter().find(|s| s.name.eq_ignore_ascii_case(needle)) {
        return Ok(s.id.clone());
    }
    Ok(planner.resolve_subject_id(needle)?)
}

/// An unknown subject only narrows the list to nothing.
fn task_filter(planner: &Planner<Store>, args: &ListArgs, default: StatusFilter) -> TaskFilter {
    let subject_id = args.subject.as_deref().map(|needle| {
        find_subject(planner, needle).unwrap_or_else(|e| {
            tracing::warn!(subject = needle, "{e:#}");
            needle.to_owned()
        })
    });
    TaskFilter { status: args.filter.unwrap_or(default), subject_id, task_type: args.task_type }
}

async fn set_status(planner: &mut Planner<Store>, id: &str, patch: TaskPatch) -> Result<()> {
    let id = planner.resolve_task_id(id)?;
    let t  = planner.update_task(&id, patch).await?;
    println!("{} → {}", t.title, t.status);
    Ok(())
}

/// Minutes from the command line; zero is left to task validation.
fn parse_minutes(s: &str) -> Result<u32, ValidationError> {
    s.trim().parse::<u32>().map_err(|_| ValidationError::NonPositiveEstimate)
}
