//! Structured logging for the 3RBAI service.
//!
//! Writes timestamped, categorized lines to stdout and to a daily log file:
//! - FEDERATION: coalition forming, personality evolution, agent toggles
//! - CHAT: provider dispatch and responses
//! - ANALYSIS: file analyzer requests
//! - ANALYTICS: tracked events
//! - CONVERSATION: conversation lifecycle
//! - ERROR: errors surfaced to callers

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Federation,
    Chat,
    Analysis,
    Analytics,
    Conversation,
    Error,
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Federation => "FEDERATION",
            LogCategory::Chat => "CHAT",
            LogCategory::Analysis => "ANALYSIS",
            LogCategory::Analytics => "ANALYTICS",
            LogCategory::Conversation => "CONVERSATION",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Log directory, set once at startup. Unset (e.g. in tests) falls back to
/// console-only output.
static LOG_DIR: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

fn get_log_file_path() -> Option<PathBuf> {
    let dir = LOG_DIR.lock().unwrap().clone()?;
    let today = Local::now().format("%Y-%m-%d").to_string();
    Some(dir.join(format!("arbai-{}.log", today)))
}

/// Create the log directory and remember it for the process lifetime.
pub fn init_logging(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    *LOG_DIR.lock().unwrap() = Some(log_dir.to_path_buf());

    log(LogCategory::Conversation, "3RBAI logging initialized");

    Ok(())
}

pub fn log(category: LogCategory, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let log_line = format!("[{}] [{}] {}\n", timestamp, category.as_str(), message);

    // Always print to console (for dev)
    print!("{}", log_line);

    if let Some(log_path) = get_log_file_path() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_line.as_bytes());
        }
    }
}

pub fn log_federation(message: &str) {
    log(LogCategory::Federation, message);
}

pub fn log_chat(message: &str) {
    log(LogCategory::Chat, message);
}

pub fn log_analysis(message: &str) {
    log(LogCategory::Analysis, message);
}

pub fn log_analytics(message: &str) {
    log(LogCategory::Analytics, message);
}

pub fn log_conversation(message: &str) {
    log(LogCategory::Conversation, message);
}

pub fn log_error(message: &str) {
    log(LogCategory::Error, message);
}

/// Clean up old log files (keep last 7 days).
pub fn cleanup_old_logs() -> Result<usize, Box<dyn std::error::Error>> {
    let Some(log_dir) = LOG_DIR.lock().unwrap().clone() else {
        return Ok(0);
    };
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}
