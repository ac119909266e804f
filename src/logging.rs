//! Console logging
//!
//! `ConsoleLog` is the `log` sink for the whole crate. Every record is echoed
//! to stderr and the most recent lines are kept so an on-screen console can
//! show them.

use std::collections::VecDeque;
use std::sync::OnceLock;

use parking_lot::Mutex;

/// Log levels, most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Most verbose `log` level that passes at this setting
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Nothing => log::LevelFilter::Off,
            LogLevel::User | LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::All => log::LevelFilter::Trace,
        }
    }
}

/// Stderr sink that remembers the last `max_lines` lines
#[derive(Debug)]
pub struct ConsoleLog {
    lines: Mutex<VecDeque<String>>,
    max_lines: usize,
    level: log::LevelFilter,
    echo: bool,
}

impl ConsoleLog {
    pub fn new(max_lines: usize, level: LogLevel) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(max_lines)),
            max_lines,
            level: level.to_level_filter(),
            echo: true,
        }
    }

    /// Keep lines without printing them
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Stored lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    fn push(&self, line: String) {
        if self.max_lines == 0 {
            return;
        }
        let mut lines = self.lines.lock();
        while lines.len() >= self.max_lines {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}

impl log::Log for ConsoleLog {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = match record.level() {
            log::Level::Info => record.args().to_string(),
            level => format!("[{}] {}", level, record.args()),
        };
        if self.echo {
            eprintln!("{}", line);
        }
        self.push(line);
    }

    fn flush(&self) {}
}

static CONSOLE: OnceLock<ConsoleLog> = OnceLock::new();

/// Install the console log as the global logger
///
/// Later calls return the already installed console.
pub fn log_init(max_lines: usize, level: LogLevel) -> &'static ConsoleLog {
    let mut installed = false;
    let console = CONSOLE.get_or_init(|| {
        installed = true;
        ConsoleLog::new(max_lines, level)
    });
    if installed {
        match log::set_logger(console) {
            Ok(()) => log::set_max_level(console.level),
            Err(e) => eprintln!("Console log not installed: {}", e),
        }
    }
    console
}

/// Lines kept by the global console, empty before `log_init`
pub fn recent_lines() -> Vec<String> {
    CONSOLE.get().map(ConsoleLog::recent_lines).unwrap_or_default()
}
