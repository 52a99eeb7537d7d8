//! # neondo
//!
//! Terminal to-do list with a command line, calendar-style views, undo/redo
//! and recurring tasks.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! neondo
//! # or explicitly
//! neondo ui
//! ```
//!
//! Type commands into the input line, e.g.
//! `add "Pay rent" --time 01.05.2025 --repeat monthly`, then `complete 1`.
//! Type `help` for the full command list.
//!
//! ### One-shot and REPL
//!
//! ```bash
//! neondo run add "Write report" -d 12.12 -p high
//! neondo run today
//! neondo shell
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG=info` for more detail.

use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

use neondo::config::Config;
use neondo::models::{format_ddmm, format_hhmm};
use neondo::session::{LogLevel, Session};
use neondo::storage::Storage;
use neondo::store::TaskStore;
use neondo::theme::Theme;
use neondo::tui::run_tui;
use neondo::view::Row;

#[derive(Parser)]
#[command(name = "neondo")]
#[command(about = "Terminal to-do list with a command line", long_about = None)]
struct Cli {
    /// Directory holding tasks.json and stats.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Colour theme (cyber, toxic, ember)
    #[arg(long, global = true)]
    theme: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one command line, e.g. `run add "Pay rent" -d 01.05`
    Run {
        /// Command words
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Read command lines from stdin until EOF
    Shell,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir, cli.theme);

    let result = match cli.command {
        Some(Commands::Run { words }) => {
            init_logging(None);
            run_once(&config, &words)
        }
        Some(Commands::Shell) => {
            init_logging(None);
            run_shell(&config)
        }
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "neondo", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => {
            init_logging(Some(config.log_path()));
            run_tui(open_session(&config))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }
}

/// Installs the tracing subscriber. Defaults to WARN; use RUST_LOG to raise it.
/// The TUI owns the terminal, so it logs to a file instead of stderr.
fn init_logging(file: Option<PathBuf>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let opened = file.and_then(|p| OpenOptions::new().create(true).append(true).open(p).ok());
    match opened {
        Some(f) => builder.with_ansi(false).with_writer(Mutex::new(f)).init(),
        None => builder.with_writer(io::stderr).init(),
    }
}

fn open_session(config: &Config) -> Session {
    let store = TaskStore::open(Storage::new(&config.data_dir));
    Session::new(store, config.theme)
}

fn run_once(config: &Config, words: &[String]) -> Result<(), Box<dyn Error>> {
    let line = shlex::try_join(words.iter().map(String::as_str))?;
    let mut session = open_session(config);
    session.execute(&line);
    print_log(&mut session);
    print_view(&session);
    Ok(())
}

fn run_shell(config: &Config) -> Result<(), Box<dyn Error>> {
    let mut session = open_session(config);
    let stdin = io::stdin();
    print!("neondo> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            "exit" | "quit" => break,
            "" => {}
            l => {
                session.execute(l);
                session.tick(0);
                print_log(&mut session);
                print_view(&session);
            }
        }
        print!("neondo> ");
        io::stdout().flush()?;
    }
    Ok(())
}

fn print_log(session: &mut Session) {
    for line in session.drain_log() {
        match line.level {
            LogLevel::Cmd => {}
            LogLevel::Error => eprintln!("{}", line.message),
            _ => println!("{}", line.message),
        }
    }
}

fn color(c: ratatui::style::Color) -> Color {
    let (r, g, b) = Theme::rgb(c);
    Color::Rgb { r, g, b }
}

/// Prints the current view as a table, coloured with the session theme.
fn print_view(session: &Session) {
    let theme = &session.theme;
    let rows = session.rows();
    println!("{}", session.view.title());
    if rows.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Tag").add_attribute(Attribute::Bold),
            Cell::new("Prio").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Repeat").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let today = session.today();
    for row in rows {
        match row {
            Row::CategoryHeader(name) => {
                table.add_row(vec![
                    Cell::new(""),
                    Cell::new(format!("[ {} ]", name))
                        .fg(color(theme.blue))
                        .add_attribute(Attribute::Bold),
                ]);
            }
            Row::Task { number, task } => {
                let fg = if task.is_completed() {
                    color(theme.dim)
                } else if task.is_overdue(today) {
                    color(theme.error)
                } else {
                    color(theme.green)
                };
                let status = if task.is_completed() { "Done" } else { "Pending" };
                let tag = task.tag.clone().unwrap_or_default();
                let tag_fg = task.tag.as_deref().map(|t| color(theme.tag_color(t))).unwrap_or(fg);
                table.add_row(vec![
                    Cell::new(number),
                    Cell::new(&task.name).fg(fg),
                    Cell::new(tag).fg(tag_fg),
                    Cell::new(task.priority),
                    Cell::new(task.due.map(format_ddmm).unwrap_or_else(|| "--.--".into())),
                    Cell::new(task.time.map(format_hhmm).unwrap_or_else(|| "--:--".into())),
                    Cell::new(task.recurrence.map(|r| r.to_string()).unwrap_or_default()),
                    Cell::new(status).fg(fg),
                ]);
            }
        }
    }

    println!("{table}");
    println!("{}", session.status_line());
}
