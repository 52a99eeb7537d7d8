use std::fs;
use std::path::PathBuf;

use crate::theme::ThemeName;

const APP_NAME: &str = "neondo";

/// Runtime configuration resolved from CLI flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `tasks.json`, `stats.json` and the `autosync/` mirror.
    pub data_dir: PathBuf,
    pub theme: ThemeName,
}

impl Config {
    /// Resolves the configuration.
    ///
    /// The data directory is determined in the following order:
    /// 1. `data_dir` argument (the `--data-dir` flag).
    /// 2. `NEONDO_DIR` environment variable.
    /// 3. `~/.local/share/neondo` (on Linux).
    /// 4. `.` (fallback).
    ///
    /// The theme follows the same pattern with `--theme` and `NEONDO_THEME`,
    /// defaulting to `cyber`. Unknown theme names fall back to the default.
    pub fn resolve(data_dir: Option<PathBuf>, theme: Option<String>) -> Config {
        let data_dir = data_dir
            .or_else(|| std::env::var("NEONDO_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push(APP_NAME);
                p
            });
        if !data_dir.exists() {
            let _ = fs::create_dir_all(&data_dir);
        }

        let theme = theme
            .or_else(|| std::env::var("NEONDO_THEME").ok())
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();

        Config { data_dir, theme }
    }

    /// Log file used by the TUI, where stderr is not visible.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("neondo.log")
    }
}
