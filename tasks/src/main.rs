//! Yunie - conversational todo capture from the command line.
//!
//! # Commands
//!
//! - `yunie add <text>`: Add a task by hand
//! - `yunie done <id>`: Mark a pending task finished
//! - `yunie list` / `yunie finished`: Show the task lists
//! - `yunie clear-finished`: Drop every finished task
//! - `yunie remove-finished <id>`: Drop one finished task
//! - `yunie parse <text>`: Show what would be captured from a message
//! - `yunie chat`: Capture tasks from messages read on stdin
//!
//! # Environment Variables
//!
//! See the [`config`](yunie_tasks::config) module for available configuration options.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use yunie_tasks::{open_board, Config, MessageOrigin, Task, TaskId, TaskPipeline, TodoBoard};

/// Yunie - conversational todo capture.
///
/// Keeps a pending/finished todo list in the data directory and captures
/// tasks from chat messages.
#[derive(Parser, Debug)]
#[command(name = "yunie")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    YUNIE_DATA_DIR    Directory holding the task lists (default: ~/.yunie)
    RUST_LOG          Log filter (default: warn)

EXAMPLES:
    # Add a task with a due date
    yunie add \"pay rent\" --due friday

    # Finish it
    yunie done 1

    # See what a message would turn into
    yunie parse --companion \"- buy milk
    - walk dog\"

    # Capture tasks from a transcript
    yunie chat < notes.txt
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Add a pending task.
    Add {
        /// Task text.
        text: String,

        /// Free-text due date stored alongside the task.
        #[arg(short, long)]
        due: Option<String>,
    },

    /// Mark a pending task finished.
    Done {
        /// Id shown by `yunie list`.
        id: TaskId,
    },

    /// List pending tasks.
    List,

    /// List finished tasks, most recent first.
    Finished,

    /// Remove every finished task.
    ClearFinished {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove one finished task.
    RemoveFinished {
        /// Id shown by `yunie finished`.
        id: TaskId,
    },

    /// Print the candidates extracted from a message without storing them.
    Parse {
        /// Treat the message as a companion reply (no whole-message fallback).
        #[arg(short, long)]
        companion: bool,

        /// Message text.
        text: String,
    },

    /// Read user messages from stdin, one per line, and capture tasks.
    ///
    /// The whole run is a single conversation: a task captured once is not
    /// captured again even after it is finished and cleared.
    Chat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    match cli.command {
        Command::Parse { companion, text } => run_parse(&text, companion),
        command => {
            let board = load_board()?;
            run_board_command(command, board)
        }
    }
}

/// Opens the persisted board from the configured data directory.
fn load_board() -> Result<TodoBoard> {
    let config = Config::from_env().context("Failed to load configuration")?;
    debug!(data_dir = %config.data_dir.display(), "Opening task store");

    open_board(&config)
        .with_context(|| format!("Failed to open task store at {}", config.data_dir.display()))
}

fn run_board_command(command: Command, mut board: TodoBoard) -> Result<()> {
    match command {
        Command::Add { text, due } => match board.add_item_with_due(&text, due.as_deref()) {
            Some(task) => println!("added {}", format_task(&task)),
            None => bail!("task is empty or already on the list"),
        },
        Command::Done { id } => {
            if !board.complete_item(id) {
                bail!("no pending task with id {id}");
            }
            println!("finished {id}");
        }
        Command::List => print_tasks(board.pending(), "no pending tasks"),
        Command::Finished => print_tasks(board.finished(), "no finished tasks"),
        Command::ClearFinished { yes } => {
            if board.finished().is_empty() {
                println!("no finished tasks");
                return Ok(());
            }
            if !yes && !confirm(&format!("Remove {} finished task(s)?", board.finished().len()))? {
                eprintln!("Aborted.");
                return Ok(());
            }
            let removed = board.clear_finished();
            println!("removed {removed} finished task(s)");
        }
        Command::RemoveFinished { id } => {
            if !board.remove_finished(id) {
                bail!("no finished task with id {id}");
            }
            println!("removed {id}");
        }
        Command::Chat => run_chat(board)?,
        Command::Parse { companion, text } => run_parse(&text, companion)?,
    }

    Ok(())
}

/// Runs the parse command, printing one candidate per line.
fn run_parse(text: &str, companion: bool) -> Result<()> {
    let origin = if companion {
        MessageOrigin::Companion
    } else {
        MessageOrigin::User
    };

    for candidate in yunie_tasks::extract(text, origin) {
        println!("{candidate}");
    }
    Ok(())
}

/// Runs the chat command over stdin.
fn run_chat(board: TodoBoard) -> Result<()> {
    let mut pipeline = TaskPipeline::new(board);
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        for task in pipeline.ingest(&line, MessageOrigin::User) {
            println!("added {}", format_task(&task));
        }
    }

    Ok(())
}

fn print_tasks(tasks: &[Task], empty_message: &str) {
    if tasks.is_empty() {
        println!("{empty_message}");
        return;
    }
    for task in tasks {
        println!("{}", format_task(task));
    }
}

fn format_task(task: &Task) -> String {
    let mut line = format!("[{}] {}", task.id(), task.text());
    if let Some(due) = task.due() {
        line.push_str(&format!(" (due {due})"));
    }
    if let Some(done_at) = task.done_at() {
        line.push_str(&format!(" - done {}", done_at.format("%Y-%m-%d %H:%M")));
    }
    line
}

/// Asks a yes/no question on stderr, defaulting to no.
fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Initializes the tracing subscriber on stderr so command output stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
