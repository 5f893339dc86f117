//! The debug console: a command registry plus a bounded log
//!
//! `submit` takes one line of user input, echoes it, dispatches it and appends
//! whatever comes back. Dispatch failures never escape as errors; they become
//! `Warning`/`Error` entries in the log. When the log is full the oldest entry
//! is dropped.

use std::collections::VecDeque;

use bevy::prelude::*;

use super::command::{CommandArgs, CommandOutput, ParamSpec};
use super::entry::{ConsoleEntry, ConsoleEntryType};
use super::registry::CommandRegistry;
use crate::error::DispatchError;
use crate::settings::ConsoleSettings;

/// Commands the console answers itself because they act on the console.
const BUILTINS: [(&str, &str); 5] = [
    ("help", "Lists every command"),
    ("showAll", "Lists every command"),
    ("usage", "Shows how to call a command"),
    ("clear", "Clears the console log"),
    ("clearConsole", "Clears the console log"),
];

pub struct Console<Ctx> {
    registry: CommandRegistry<Ctx>,
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
    echo_input: bool,
}

impl<Ctx> Default for Console<Ctx> {
    fn default() -> Self {
        Self::from_settings(&ConsoleSettings::default())
    }
}

impl<Ctx> std::fmt::Debug for Console<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("registry", &self.registry)
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<Ctx> Console<Ctx> {
    /// A console keeping at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: CommandRegistry::new(),
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            echo_input: true,
        }
    }

    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        let mut console = Self::new(settings.log_buffer_size);
        console.echo_input = settings.echo_input;
        console
    }

    pub fn registry(&self) -> &CommandRegistry<Ctx> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry<Ctx> {
        &mut self.registry
    }

    /// See [`CommandRegistry::register`]. Built-in ids can't be overridden.
    pub fn register<F, O>(
        &mut self,
        id: impl Into<String>,
        description: impl Into<String>,
        params: Vec<ParamSpec>,
        handler: F,
    ) -> bool
    where
        F: Fn(&mut Ctx, &CommandArgs) -> O + Send + Sync + 'static,
        O: Into<CommandOutput>,
    {
        let id = id.into();
        if is_builtin(&id) {
            warn!(
                "Command Signature Collision with Id: {}. Latest Command will be ignored.",
                id
            );
            return false;
        }
        self.registry.register(id, description, params, handler)
    }

    /// Run one line of input. Returns the entries it added, echo included.
    pub fn submit(&mut self, ctx: &mut Ctx, line: &str) -> Vec<ConsoleEntry> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let mut added = Vec::new();
        if self.echo_input {
            added.push(ConsoleEntry::new(line, ConsoleEntryType::UserInput));
        }

        let mut parts = line.split_whitespace();
        let Some(id) = parts.next() else {
            return added;
        };
        let args: Vec<&str> = parts.collect();

        if is_builtin(id) {
            let cleared = matches!(id, "clear" | "clearConsole");
            added.extend(self.run_builtin(id, &args));
            if cleared {
                self.entries.clear();
                return added;
            }
        } else {
            match self.registry.invoke(ctx, id, &args) {
                Ok(CommandOutput::Entry(entry)) => added.push(entry),
                Ok(CommandOutput::None) => {}
                Err(err @ DispatchError::UnknownCommand(_)) => {
                    added.push(ConsoleEntry::error(err.to_string()))
                }
                Err(err @ DispatchError::BadArguments { .. }) => {
                    added.push(ConsoleEntry::warning(err.to_string()))
                }
            }
        }

        for entry in &added {
            self.push(entry.clone());
        }
        added
    }

    fn run_builtin(&self, id: &str, args: &[&str]) -> Vec<ConsoleEntry> {
        match id {
            "help" | "showAll" => {
                let mut listed: Vec<(&str, &str)> = BUILTINS.to_vec();
                listed.extend(self.registry.describe());
                listed
                    .into_iter()
                    .map(|(id, description)| {
                        ConsoleEntry::message(format!("{} - {}", id, description))
                    })
                    .collect()
            }
            "usage" => {
                let Some(target) = args.first() else {
                    return vec![ConsoleEntry::warning(
                        "Correct Usage: usage id \nParameter Info:\n\t - id: string",
                    )];
                };
                let text = if is_builtin(target) {
                    Some(format!("Usage: {} ", target))
                } else {
                    self.registry.usage(target)
                };
                match text {
                    Some(text) => vec![ConsoleEntry::message(text)],
                    None => vec![ConsoleEntry::warning(format!(
                        "Command <{}> don't exist",
                        target
                    ))],
                }
            }
            _ => Vec::new(),
        }
    }

    /// Append an entry, dropping the oldest one when full.
    pub fn push(&mut self, entry: ConsoleEntry) {
        match entry.entry_type {
            ConsoleEntryType::Warning | ConsoleEntryType::Error => warn!("console: {}", entry),
            _ => debug!("console: {}", entry),
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConsoleEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

fn is_builtin(id: &str) -> bool {
    BUILTINS.iter().any(|(builtin, _)| *builtin == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i64,
    }

    fn console() -> Console<Counter> {
        let mut console = Console::new(8);
        console.register(
            "inc",
            "Increment the counter",
            vec![ParamSpec::int("by")],
            |c: &mut Counter, args: &CommandArgs| {
                c.value += args.int(0).unwrap_or(0);
                format!("value: {}", c.value)
            },
        );
        console.register(
            "silent",
            "Does nothing",
            Vec::new(),
            |_: &mut Counter, _: &CommandArgs| (),
        );
        console
    }

    #[test]
    fn test_submit_echoes_and_logs_result() {
        let mut console = console();
        let mut counter = Counter::default();
        let added = console.submit(&mut counter, "inc 3");

        assert_eq!(counter.value, 3);
        assert_eq!(
            added,
            vec![
                ConsoleEntry::new("inc 3", ConsoleEntryType::UserInput),
                ConsoleEntry::message("value: 3"),
            ]
        );
        assert_eq!(console.len(), 2);
    }

    #[test]
    fn test_empty_line_is_ignored() {
        let mut console = console();
        assert!(console.submit(&mut Counter::default(), "   ").is_empty());
        assert!(console.is_empty());
    }

    #[test]
    fn test_unit_output_adds_only_echo() {
        let mut console = console();
        let added = console.submit(&mut Counter::default(), "silent");
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn test_unknown_command_is_an_error_entry() {
        let mut console = console();
        console.submit(&mut Counter::default(), "launch rockets");
        assert_eq!(console.last(), Some(&ConsoleEntry::error("Unknown Command: launch")));
    }

    #[test]
    fn test_bad_argument_is_a_warning_and_state_is_untouched() {
        let mut console = console();
        let mut counter = Counter::default();
        console.submit(&mut counter, "inc lots");
        assert_eq!(counter.value, 0);
        let last = console.last().unwrap();
        assert_eq!(last.entry_type, ConsoleEntryType::Warning);
        assert!(last.message.starts_with("Correct Usage: inc by"));
    }

    #[test]
    fn test_log_drops_oldest_entries() {
        let mut console = console();
        let mut counter = Counter::default();
        for _ in 0..10 {
            console.submit(&mut counter, "inc 1");
        }
        assert_eq!(console.len(), 8);
        assert_eq!(console.last(), Some(&ConsoleEntry::message("value: 10")));
        assert_eq!(
            console.entries().next(),
            Some(&ConsoleEntry::new("inc 1", ConsoleEntryType::UserInput))
        );
    }

    #[test]
    fn test_clear_builtin_empties_log() {
        let mut console = console();
        let mut counter = Counter::default();
        console.submit(&mut counter, "inc 1");
        console.submit(&mut counter, "clear");
        assert!(console.is_empty());
    }

    #[test]
    fn test_show_all_lists_commands() {
        let mut console = console();
        let added = console.submit(&mut Counter::default(), "showAll");
        assert!(added.contains(&ConsoleEntry::message("inc - Increment the counter")));
        assert!(added.contains(&ConsoleEntry::message("usage - Shows how to call a command")));
    }

    #[test]
    fn test_usage_builtin() {
        let mut console = console();
        let mut counter = Counter::default();
        console.submit(&mut counter, "usage inc");
        assert_eq!(
            console.last(),
            Some(&ConsoleEntry::message("Usage: inc by \nParameter Info:\n\t - by: int"))
        );

        console.submit(&mut counter, "usage warp");
        assert_eq!(console.last(), Some(&ConsoleEntry::warning("Command <warp> don't exist")));
    }

    #[test]
    fn test_builtin_ids_cannot_be_registered() {
        let mut console = console();
        let accepted =
            console.register("clear", "Nope", Vec::new(), |_: &mut Counter, _: &CommandArgs| ());
        assert!(!accepted);
    }

    #[test]
    fn test_echo_can_be_disabled() {
        let mut console: Console<Counter> = Console::from_settings(&ConsoleSettings {
            log_buffer_size: 4,
            echo_input: false,
        });
        console.submit(&mut Counter::default(), "nothing");
        assert_eq!(console.len(), 1);
        assert_eq!(console.capacity(), 4);
    }
}
