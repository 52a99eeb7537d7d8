//! # neondo
//!
//! A terminal to-do list driven by a one-line command language. Tasks live
//! in memory, every change is written back to a flat JSON file, and the
//! session keeps a linear undo/redo history.
//!
//! ## Modules
//!
//! *   [`store`]: the task collection, its mutations and undo/redo.
//! *   [`view`]: pure filtering and sorting into display rows.
//! *   [`commands`]: parses a command line into a [`commands::Command`].
//! *   [`session`]: executes commands and reports results as log lines.
//! *   [`tui`]: the interactive terminal front end.
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/neondo/tasks.json`
//! *   macOS: `~/Library/Application Support/neondo/tasks.json`
//! *   Windows: `%APPDATA%\neondo\tasks.json`
//!
//! Completion history and the daily goal go to `stats.json` next to it, and
//! both files are mirrored into `autosync/` after every save. Override the
//! directory with `--data-dir` or the `NEONDO_DIR` environment variable.

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pomodoro;
pub mod session;
pub mod storage;
pub mod store;
pub mod theme;
pub mod tui;
pub mod view;

pub use error::{Error, Result};
pub use session::Session;
pub use store::TaskStore;
