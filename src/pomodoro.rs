/// Default session length in minutes.
pub const DEFAULT_MINUTES: u32 = 25;

/// Countdown attached to one task, advanced by the front end's tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pomodoro {
    running: Option<Running>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Running {
    task_id: u64,
    task_name: String,
    remaining_secs: u64,
}

impl Pomodoro {
    /// Starts (or restarts) a countdown for a task.
    pub fn start(&mut self, task_id: u64, task_name: impl Into<String>, minutes: u32) {
        self.running = Some(Running {
            task_id,
            task_name: task_name.into(),
            remaining_secs: u64::from(minutes) * 60,
        });
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn task_id(&self) -> Option<u64> {
        self.running.as_ref().map(|r| r.task_id)
    }

    /// Remaining time as `(minutes, seconds)`, or `None` when idle.
    pub fn remaining(&self) -> Option<(u64, u64)> {
        self.running
            .as_ref()
            .map(|r| (r.remaining_secs / 60, r.remaining_secs % 60))
    }

    /// Advances the countdown. Returns the task name once it reaches zero.
    pub fn tick(&mut self, secs: u64) -> Option<String> {
        let running = self.running.as_mut()?;
        running.remaining_secs = running.remaining_secs.saturating_sub(secs);
        if running.remaining_secs > 0 {
            return None;
        }
        self.running.take().map(|r| r.task_name)
    }

    pub fn label(&self) -> String {
        match self.remaining() {
            Some((m, s)) => format!("POMO {:02}:{:02}", m, s),
            None => "POMO --:--".to_string(),
        }
    }
}
