#![forbid(unsafe_code)]

pub mod menu;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};
use unicode_width::UnicodeWidthChar as _;

use crate::config::{self, Config};
use crate::error::TodoError;
use crate::output::table::{Table, visible_width};
use crate::task::model::{Priority, Status, Task};
use crate::task::stats::Statistics;
use crate::task::storage::{Backend, JsonFileBackend};
use crate::task::store::{TaskEdit, TaskStore};

#[derive(Debug, Parser)]
#[command(name = "todolist", version, about = "Personal task tracker")]
pub struct Cli {
    /// Task file to use instead of the configured one
    #[arg(long = "file", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add(AddArgs),
    /// List tasks ordered by priority
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show one task in detail
    Show(IdArgs),
    /// Remove a task
    #[command(alias = "rm")]
    Remove(IdArgs),
    /// Set the status of a task
    Status(StatusArgs),
    /// Mark a task completed
    Done(IdArgs),
    /// Mark a task in progress
    Start(IdArgs),
    /// Change description, priority, or category
    Edit(EditArgs),
    /// Search descriptions and categories
    Search(SearchArgs),
    /// Show task statistics
    Stats(StatsArgs),
    /// Interactive menu (default)
    Menu,
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Task description
    #[arg(required = true)]
    pub description: Vec<String>,
    /// low, medium, or high
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<Priority>,
    #[arg(short = 'c', long = "category")]
    pub category: Option<String>,
    /// Due date (YYYY-MM-DD); ignored if malformed
    #[arg(short = 'd', long = "due")]
    pub due: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only tasks with this status
    #[arg(short = 's', long = "status")]
    pub status: Option<Status>,
    /// Only tasks in this category (case-insensitive)
    #[arg(short = 'c', long = "category")]
    pub category: Option<String>,
    /// Show timestamps
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct IdArgs {
    pub id: u32,
}

#[derive(Debug, Parser)]
pub struct StatusArgs {
    pub id: u32,
    /// pending, in-progress, or completed
    pub status: Status,
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    pub id: u32,
    #[arg(short = 't', long = "description")]
    pub description: Option<String>,
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<Priority>,
    #[arg(short = 'c', long = "category")]
    pub category: Option<String>,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    pub keyword: String,
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct StatsArgs {
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
    /// Print the config and task file locations
    Path,
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging() {
    // Quiet by default; RUST_LOG=debug shows store activity.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let file = cli.file;
    match cli.cmd {
        None | Some(Commands::Menu) => with_store(file, |cfg, store, out| {
            menu::run(cfg, store, io::stdin().lock(), out)
        }),
        Some(Commands::Add(args)) => {
            with_store(file, |cfg, store, out| cmd_add(cfg, store, args, out))
        }
        Some(Commands::List(args)) => {
            with_store(file, |cfg, store, out| cmd_list(cfg, store, &args, out))
        }
        Some(Commands::Show(args)) => with_store(file, |_cfg, store, out| {
            print_task_details(store.get(args.id)?, out)
        }),
        Some(Commands::Remove(args)) => with_store(file, |cfg, store, out| {
            let task = store.remove(args.id)?;
            writeln!(
                out,
                "{}",
                decorate(cfg, "❌", &format!("Task removed: #{} {}", task.id, task.description))
            )?;
            Ok(())
        }),
        Some(Commands::Status(args)) => with_store(file, |cfg, store, out| {
            cmd_set_status(cfg, store, args.id, args.status, out)
        }),
        Some(Commands::Done(args)) => with_store(file, |cfg, store, out| {
            cmd_set_status(cfg, store, args.id, Status::Completed, out)
        }),
        Some(Commands::Start(args)) => with_store(file, |cfg, store, out| {
            cmd_set_status(cfg, store, args.id, Status::InProgress, out)
        }),
        Some(Commands::Edit(args)) => {
            with_store(file, |cfg, store, out| cmd_edit(cfg, store, args, out))
        }
        Some(Commands::Search(args)) => {
            with_store(file, |cfg, store, out| cmd_search(cfg, store, &args, out))
        }
        Some(Commands::Stats(args)) => with_store(file, |_cfg, store, out| {
            let stats = store.statistics();
            if args.json {
                print_json(&statistics_json(&stats), out)
            } else {
                print_statistics(&stats, out)
            }
        }),
        Some(Commands::Config(args)) => cmd_config(args, file),
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "todolist", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Version) => Ok(cmd_version()),
    }
}

fn with_store<F>(file: Option<PathBuf>, f: F) -> anyhow::Result<ExitCode>
where
    F: FnOnce(
        &Config,
        &mut TaskStore<JsonFileBackend>,
        &mut io::StdoutLock<'static>,
    ) -> anyhow::Result<()>,
{
    let cfg = load_cfg()?;
    let mut store = open_store(&cfg, file)?;
    report_load_warning(&cfg, &store, &mut io::stderr().lock())?;
    let mut out = io::stdout().lock();
    f(&cfg, &mut store, &mut out)?;
    Ok(ExitCode::SUCCESS)
}

fn load_cfg() -> anyhow::Result<Config> {
    let (cfg, _doc, _paths) = config::load()?;
    Ok(cfg)
}

fn open_store(
    cfg: &Config,
    file: Option<PathBuf>,
) -> anyhow::Result<TaskStore<JsonFileBackend>> {
    let path = cfg.store_path(file.as_deref())?;
    tracing::debug!(path = %path.display(), "opening task store");
    Ok(TaskStore::open(JsonFileBackend::new(path)))
}

/// Tells the user the task file was unreadable before a later save replaces it.
fn report_load_warning<B: Backend>(
    cfg: &Config,
    store: &TaskStore<B>,
    err: &mut impl Write,
) -> io::Result<()> {
    if let Some(warning) = store.load_warning() {
        writeln!(
            err,
            "{}",
            decorate(
                cfg,
                "⚠️",
                &format!("{warning}; starting with an empty task list")
            )
        )?;
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs, file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    match args.cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml()?);
        }
        ConfigCmd::Set(set) => {
            config::set_value_string(&set.key, &set.value)?;
            println!("Set {} = {}", set.key, set.value);
        }
        ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
            Some(v) => println!("{v}"),
            None => anyhow::bail!(
                "configuration key '{}' not found - use 'todolist config list' to see available keys",
                get.key
            ),
        },
        ConfigCmd::Path => {
            let (cfg, _doc, paths) = config::load()?;
            let store = cfg.store_path(file.as_deref())?;
            println!(
                "config: {}",
                config::tilde_path(&paths.config_file.to_string_lossy())
            );
            println!("tasks:  {}", config::tilde_path(&store.to_string_lossy()));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_add<B: Backend>(
    cfg: &Config,
    store: &mut TaskStore<B>,
    args: AddArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let description = args.description.join(" ");
    let priority = args.priority.unwrap_or(cfg.defaults.priority);
    let category = args
        .category
        .unwrap_or_else(|| cfg.defaults.category.clone());
    let task = store.add(&description, priority, &category, args.due.as_deref())?;
    if args.due.is_some() && task.due_date.is_none() {
        tracing::info!("due date ignored: expected YYYY-MM-DD");
    }
    writeln!(
        out,
        "{}",
        decorate(cfg, "✅", &format!("Task added: #{} {}", task.id, task.description))
    )?;
    Ok(())
}

fn cmd_list<B: Backend>(
    cfg: &Config,
    store: &TaskStore<B>,
    args: &ListArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let tasks = store.list(args.status, args.category.as_deref());

    if args.json {
        return print_json(&tasks, out);
    }
    if args.csv {
        let mut t = Table::new([
            "id",
            "task",
            "priority",
            "status",
            "category",
            "created",
            "due_date",
            "completed_date",
        ]);
        for task in &tasks {
            t.row([
                task.id.to_string(),
                task.description.clone(),
                task.priority.to_string(),
                task.status.to_string(),
                task.category.clone(),
                task.created.clone(),
                task.due_date.clone().unwrap_or_default(),
                task.completed_date.clone().unwrap_or_default(),
            ]);
        }
        t.write_csv_to(out)?;
        return Ok(());
    }

    print_task_table(cfg, &tasks, args.verbose, out)
}

fn cmd_set_status<B: Backend>(
    cfg: &Config,
    store: &mut TaskStore<B>,
    id: u32,
    status: Status,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let task = store.update_status(id, status)?;
    writeln!(
        out,
        "{}",
        decorate(
            cfg,
            task.status.icon(),
            &format!("Task #{} is now {}", task.id, task.status)
        )
    )?;
    Ok(())
}

fn cmd_edit<B: Backend>(
    cfg: &Config,
    store: &mut TaskStore<B>,
    args: EditArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let edit = TaskEdit {
        description: args.description,
        priority: args.priority,
        category: args.category,
    };
    if edit.is_empty() {
        return Err(TodoError::Validation(
            "nothing to edit: pass --description, --priority, or --category".to_owned(),
        )
        .into());
    }
    let task = store.edit(args.id, edit)?;
    writeln!(
        out,
        "{}",
        decorate(cfg, "✏️", &format!("Task updated: #{} {}", task.id, task.description))
    )?;
    Ok(())
}

fn cmd_search<B: Backend>(
    cfg: &Config,
    store: &TaskStore<B>,
    args: &SearchArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let found = store.search(&args.keyword)?;
    if args.json {
        return print_json(&found, out);
    }
    print_task_table(cfg, &found, false, out)
}

fn cmd_version() -> ExitCode {
    println!("todolist version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}

fn print_json(value: &impl serde::Serialize, out: &mut impl Write) -> anyhow::Result<()> {
    let mut s = serde_json::to_string_pretty(value)?;
    s.push('\n');
    out.write_all(s.as_bytes()).context("failed to write output")?;
    Ok(())
}

pub(crate) fn decorate(cfg: &Config, icon: &str, msg: &str) -> String {
    if cfg.ui.icons {
        format!("{icon} {msg}")
    } else {
        msg.to_owned()
    }
}

pub(crate) fn print_task_table(
    cfg: &Config,
    tasks: &[&Task],
    verbose: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if tasks.is_empty() {
        writeln!(out, "{}", decorate(cfg, "📭", "No tasks found."))?;
        return Ok(());
    }

    let mut t = if verbose {
        Table::new([
            "ID", "TASK", "PRIORITY", "STATUS", "CATEGORY", "DUE", "CREATED", "COMPLETED",
        ])
    } else {
        Table::new(["ID", "TASK", "PRIORITY", "STATUS", "CATEGORY", "DUE"])
    };
    for task in tasks {
        let (id, priority) = if cfg.ui.icons {
            (
                format!("{} {}", task.status.icon(), task.id),
                format!("{} {}", task.priority.icon(), task.priority),
            )
        } else {
            (task.id.to_string(), task.priority.to_string())
        };
        let due = task.due_date.clone().unwrap_or_else(|| "-".to_owned());
        if verbose {
            t.row([
                id,
                task.description.clone(),
                priority,
                task.status.to_string(),
                task.category.clone(),
                due,
                task.created.clone(),
                task.completed_date.clone().unwrap_or_else(|| "-".to_owned()),
            ]);
        } else {
            t.row([
                id,
                truncate(&task.description, 50),
                priority,
                task.status.to_string(),
                task.category.clone(),
                due,
            ]);
        }
    }
    t.write_to(out)?;
    Ok(())
}

pub(crate) fn print_task_details(task: &Task, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Task #{}: {}", task.id, task.description)?;
    writeln!(out, "Status: {}", task.status)?;
    writeln!(out, "Priority: {}", task.priority)?;
    writeln!(out, "Category: {}", task.category)?;
    writeln!(out, "Created: {}", task.created)?;
    if let Some(due) = task.due_date.as_deref() {
        writeln!(out, "Due: {due}")?;
    }
    if let Some(done) = task.completed_date.as_deref() {
        writeln!(out, "Completed: {done}")?;
    }
    Ok(())
}

pub(crate) fn print_statistics(stats: &Statistics, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Total tasks: {}", stats.total)?;

    writeln!(out, "\nBy status:")?;
    for status in Status::ALL {
        let count = stats.status_count(status);
        match stats.status_percentage(status) {
            Some(pct) => writeln!(out, "  {:<12} {count} ({pct:.1}%)", status.as_str())?,
            None => writeln!(out, "  {:<12} {count}", status.as_str())?,
        }
    }

    writeln!(out, "\nBy priority:")?;
    for priority in Priority::ALL {
        writeln!(
            out,
            "  {:<12} {}",
            priority.as_str(),
            stats.priority_count(priority)
        )?;
    }

    if !stats.categories.is_empty() {
        writeln!(out, "\nBy category:")?;
        for (category, count) in &stats.categories {
            writeln!(out, "  {category:<12} {count}")?;
        }
    }
    Ok(())
}

fn statistics_json(stats: &Statistics) -> serde_json::Value {
    let mut status = serde_json::Map::new();
    for s in Status::ALL {
        status.insert(
            s.as_str().to_owned(),
            serde_json::json!({
                "count": stats.status_count(s),
                "percentage": stats.status_percentage(s),
            }),
        );
    }
    serde_json::json!({
        "total": stats.total,
        "status": status,
        "priority": {
            "High": stats.high,
            "Medium": stats.medium,
            "Low": stats.low,
        },
        "categories": stats.categories,
    })
}

/// Cuts `s` to at most `max` terminal columns, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if visible_width(s) <= max {
        return s.to_owned();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
