//! Activity logging
//!
//! Records tree results, ability events and console output for debugging and
//! post-run analysis.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityEvent, AbilityEventKind, TimelineEvent};
use crate::console::{ConsoleEntry, ConsoleEntryType};

/// Default file written by [`ActivityLog::save_to_file`]
pub const DEFAULT_ACTIVITY_PATH: &str = "activity_log.json";

/// A single entry in the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Seconds since the log was last cleared
    pub timestamp: f32,
    pub event_type: ActivityEventType,
    pub message: String,
}

/// Types of activity for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityEventType {
    /// A behaviour tree root settled
    TreeResult,
    AbilityStarted,
    AbilityUnleashed,
    /// Any other timeline event of a cast
    AbilityPhase,
    AbilityFinished,
    /// Cancelled or force-interrupted
    AbilityInterrupted,
    Cooldown,
    /// Console input and output
    Console,
}

/// The activity log resource
#[derive(Resource, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    /// All entries in chronological order
    pub entries: Vec<ActivityEntry>,
    /// Current log time
    pub elapsed: f32,
}

impl ActivityLog {
    /// Clear the log and restart its clock
    pub fn clear(&mut self) {
        self.entries.clear();
        self.elapsed = 0.0;
    }

    pub fn advance(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
    }

    /// Add a new entry stamped with the current log time
    pub fn log(&mut self, event_type: ActivityEventType, message: String) {
        self.entries.push(ActivityEntry {
            timestamp: self.elapsed,
            event_type,
            message,
        });
    }

    /// Log an ability controller event, labelled with its owner
    pub fn log_ability_event(&mut self, owner: &str, event: &AbilityEvent) {
        let (event_type, what) = match event.kind {
            AbilityEventKind::Started => (ActivityEventType::AbilityStarted, "started".to_string()),
            AbilityEventKind::Recast => (ActivityEventType::AbilityStarted, "recast".to_string()),
            AbilityEventKind::Timeline(TimelineEvent::Unleashed) => {
                (ActivityEventType::AbilityUnleashed, "unleashed".to_string())
            }
            AbilityEventKind::Timeline(phase) => {
                (ActivityEventType::AbilityPhase, format!("{:?}", phase))
            }
            AbilityEventKind::CooldownStarted => {
                (ActivityEventType::Cooldown, "cooldown started".to_string())
            }
            AbilityEventKind::Finished => {
                (ActivityEventType::AbilityFinished, "finished".to_string())
            }
            AbilityEventKind::Discarded => {
                (ActivityEventType::AbilityFinished, "discarded".to_string())
            }
            AbilityEventKind::Cancelled => {
                (ActivityEventType::AbilityInterrupted, "cancelled".to_string())
            }
            AbilityEventKind::Interrupted => {
                (ActivityEventType::AbilityInterrupted, "interrupted".to_string())
            }
        };
        self.log(
            event_type,
            format!(
                "{}: {} {} (slot {}) {}",
                owner, event.ability, event.cast, event.slot, what
            ),
        );
    }

    pub fn log_console_entry(&mut self, entry: &ConsoleEntry) {
        if entry.entry_type == ConsoleEntryType::UserInput {
            self.log(ActivityEventType::Console, format!("> {}", entry.message));
        } else {
            self.log(
                ActivityEventType::Console,
                format!("[{}] {}", entry.entry_type.as_str(), entry.message),
            );
        }
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: ActivityEventType) -> Vec<&ActivityEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&ActivityEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Write the log as JSON. Returns the path written.
    pub fn save_to_file(&self, path: Option<&str>) -> Result<String, String> {
        let path = path.unwrap_or(DEFAULT_ACTIVITY_PATH).to_string();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize activity log: {}", e))?;
        std::fs::write(&path, contents)
            .map_err(|e| format!("Failed to write {}: {}", path, e))?;
        info!("Saved {} activity entries to {}", self.entries.len(), path);
        Ok(path)
    }
}
